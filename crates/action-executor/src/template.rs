//! SITEINFO template for the current page.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use url::Url;

use crate::errors::ExecError;

const REGEX_SPECIALS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Backslash-escape regex metacharacters.
pub fn escape_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if REGEX_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Serialize)]
struct TemplateEntry<'a> {
    name: &'a str,
    url: String,
    commands: Vec<serde_json::Value>,
}

/// One-definition template matching this page (origin + path, no query).
///
/// Pretty-printed with four-space indentation.
pub fn site_template(location: &str, title: &str) -> Result<String, ExecError> {
    let parsed = Url::parse(location).map_err(|_| ExecError::Template(location.to_string()))?;
    let page = format!("{}{}", parsed.origin().ascii_serialization(), parsed.path());
    let name = if title.is_empty() { "New Site" } else { title };
    let entries = [TemplateEntry {
        name,
        url: format!("^{}", escape_regex(&page)),
        commands: Vec::new(),
    }];

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries
        .serialize(&mut serializer)
        .map_err(|_| ExecError::Template(location.to_string()))?;
    String::from_utf8(buf).map_err(|_| ExecError::Template(location.to_string()))
}

/// Debug panel text shown after the template lands on the clipboard.
pub fn copied_notice(template: &str) -> String {
    format!("Copied SITEINFO template to clipboard!\n\n{template}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_metacharacter() {
        assert_eq!(
            escape_regex(r"a.b*c+d?e^f$g{h}i(j)k|l[m]n\o"),
            r"a\.b\*c\+d\?e\^f\$g\{h\}i\(j\)k\|l\[m\]n\\o"
        );
        assert_eq!(escape_regex("/plain-path_1"), "/plain-path_1");
    }

    #[test]
    fn template_uses_origin_and_path_only() {
        let json = site_template("https://a.com:8443/x/y.html?q=1#top", "My Page").unwrap();
        assert_eq!(
            json,
            "[\n    {\n        \"name\": \"My Page\",\n        \"url\": \"^https://a\\\\.com:8443/x/y\\\\.html\",\n        \"commands\": []\n    }\n]"
        );
    }

    #[test]
    fn untitled_page_gets_default_name() {
        let json = site_template("https://a.com/", "").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "New Site");
        assert_eq!(value[0]["url"], "^https://a\\.com/");
        assert!(value[0]["commands"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unparseable_location_is_an_error() {
        assert!(matches!(
            site_template("not a url", "t"),
            Err(ExecError::Template(_))
        ));
    }
}
