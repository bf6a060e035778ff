//! Display label derivation.

use palette_page_dom::ElementText;
use palette_siteinfo::CommandDef;

pub const LABEL_MAX_CHARS: usize = 100;
pub const FALLBACK_LABEL: &str = "Command";

/// Label and secondary text for one command row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub label: String,
    pub description: String,
}

/// Text the element itself offers, trimmed; empty when it offers none.
///
/// Rendered text first (raw text content when nothing renders), then the
/// first non-empty of value, placeholder, aria-label, title and alt.
pub fn dom_text(text: &ElementText) -> String {
    let primary = if text.inner_text.is_empty() {
        text.text_content.as_str()
    } else {
        text.inner_text.as_str()
    };
    if !primary.trim().is_empty() {
        return primary.trim().to_string();
    }
    [
        &text.value,
        &text.placeholder,
        &text.aria_label,
        &text.title,
        &text.alt,
    ]
    .into_iter()
    .filter_map(|candidate| candidate.as_deref())
    .find(|candidate| !candidate.is_empty())
    .map(|candidate| candidate.trim().to_string())
    .unwrap_or_default()
}

/// Resolve `(label, description)` for an element and its definition.
///
/// `element` is `None` when the element could not be read; the definition
/// title then stands in.
pub fn resolve_label(element: Option<&ElementText>, def: &CommandDef) -> ResolvedLabel {
    let from_dom = element.map(dom_text).unwrap_or_default();
    let title = def.title.as_deref().unwrap_or_default().trim();

    let label = if !from_dom.is_empty() {
        from_dom
    } else if !title.is_empty() {
        title.to_string()
    } else {
        FALLBACK_LABEL.to_string()
    };
    let description = if !title.is_empty() && title != label {
        title.to_string()
    } else {
        String::new()
    };

    ResolvedLabel {
        label: truncate_chars(&label, LABEL_MAX_CHARS),
        description,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> CommandDef {
        CommandDef {
            title: Some(title.into()),
            selector: Some("#btn".into()),
            ..CommandDef::default()
        }
    }

    fn rendered(text: &str) -> ElementText {
        ElementText {
            inner_text: text.into(),
            text_content: text.into(),
            ..ElementText::default()
        }
    }

    #[test]
    fn dom_text_wins_and_title_becomes_description() {
        let resolved = resolve_label(Some(&rendered("Submit")), &titled("Save"));
        assert_eq!(resolved.label, "Submit");
        assert_eq!(resolved.description, "Save");
    }

    #[test]
    fn title_fills_in_for_empty_element() {
        let resolved = resolve_label(Some(&ElementText::default()), &titled("  Save "));
        assert_eq!(resolved.label, "Save");
        assert_eq!(resolved.description, "");
    }

    #[test]
    fn identical_title_is_not_repeated() {
        let resolved = resolve_label(Some(&rendered(" Save ")), &titled("Save"));
        assert_eq!(resolved.label, "Save");
        assert_eq!(resolved.description, "");
    }

    #[test]
    fn literal_fallback_when_nothing_is_available() {
        let resolved = resolve_label(None, &CommandDef::default());
        assert_eq!(resolved.label, "Command");
        assert_eq!(resolved.description, "");
    }

    #[test]
    fn attribute_chain_order() {
        let mut text = ElementText {
            inner_text: "   ".into(),
            value: Some(String::new()),
            placeholder: Some("Search".into()),
            aria_label: Some("Find".into()),
            ..ElementText::default()
        };
        assert_eq!(dom_text(&text), "Search");
        text.placeholder = None;
        assert_eq!(dom_text(&text), "Find");
        text.aria_label = None;
        text.alt = Some("logo".into());
        assert_eq!(dom_text(&text), "logo");
    }

    #[test]
    fn text_content_used_when_nothing_renders() {
        let text = ElementText {
            text_content: " hidden words ".into(),
            title: Some("ignored".into()),
            ..ElementText::default()
        };
        assert_eq!(dom_text(&text), "hidden words");
    }

    #[test]
    fn whitespace_only_attribute_yields_empty_text() {
        let text = ElementText {
            value: Some("  ".into()),
            placeholder: Some("later".into()),
            ..ElementText::default()
        };
        assert_eq!(dom_text(&text), "");
    }

    #[test]
    fn labels_are_truncated_to_one_hundred_chars() {
        let long = "é".repeat(150);
        let resolved = resolve_label(Some(&rendered(&long)), &titled("t"));
        assert_eq!(resolved.label.chars().count(), 100);
        assert_eq!(resolved.description, "t");

        let exact = "x".repeat(100);
        assert_eq!(resolve_label(Some(&rendered(&exact)), &titled("")).label, exact);
    }

    #[test]
    fn resolution_is_deterministic() {
        let text = rendered("Open menu");
        let def = titled("Menu");
        assert_eq!(resolve_label(Some(&text), &def), resolve_label(Some(&text), &def));
    }
}
