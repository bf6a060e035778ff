//! Expansion of matched definitions into concrete commands.

use std::collections::HashSet;
use std::sync::Arc;

use palette_core_types::{random_suffix, Command, CommandId, ElementRef};
use palette_page_dom::PageQuery;
use palette_siteinfo::{CommandDef, ElementQuery, SiteDefinition};
use tracing::{debug, error};

use crate::errors::QueryError;
use crate::label::resolve_label;
use crate::matcher::UrlMatcher;

/// Run the command's query against the page.
///
/// `Ok(vec![])` for a command without a usable query.
pub fn resolve_elements<P>(page: &P, def: &CommandDef) -> Result<Vec<ElementRef>, QueryError>
where
    P: PageQuery + ?Sized,
{
    Ok(match def.query() {
        Some(ElementQuery::XPath(expression)) => page.evaluate_xpath(expression)?,
        Some(ElementQuery::Selector(selector)) => page.query_selector_all(selector)?,
        None => Vec::new(),
    })
}

/// Id prefix: the definition name with whitespace runs turned into `-`,
/// else the URL pattern.
pub fn id_prefix(def: &SiteDefinition) -> String {
    match def.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => {
            let mut out = String::with_capacity(name.len());
            let mut in_space = false;
            for c in name.chars() {
                if c.is_whitespace() {
                    if !in_space {
                        out.push('-');
                    }
                    in_space = true;
                } else {
                    out.push(c);
                    in_space = false;
                }
            }
            out
        }
        None => def.url_pattern.clone(),
    }
}

/// Hands out `{prefix}-{index}-{suffix}` ids that are unique in one batch.
#[derive(Debug, Default)]
struct IdAllocator {
    issued: HashSet<String>,
}

impl IdAllocator {
    fn allocate(&mut self, prefix: &str, index: usize) -> CommandId {
        loop {
            let candidate = format!("{prefix}-{index}-{}", random_suffix());
            if self.issued.insert(candidate.clone()) {
                return CommandId(candidate);
            }
        }
    }
}

pub struct CommandExtractor {
    matcher: Arc<UrlMatcher>,
}

impl CommandExtractor {
    pub fn new(matcher: Arc<UrlMatcher>) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    /// Match `definitions` against the page address and extract.
    pub fn extract<P>(&self, page: &P, definitions: &[SiteDefinition]) -> Vec<Command>
    where
        P: PageQuery + ?Sized,
    {
        let matched = self.matcher.matching(definitions, page.location());
        self.extract_matched(page, &matched)
    }

    /// Extract from definitions already known to match.
    ///
    /// Output order is definition order, then command order, then element
    /// order. A failing query contributes nothing for its command.
    pub fn extract_matched<P>(&self, page: &P, matched: &[&SiteDefinition]) -> Vec<Command>
    where
        P: PageQuery + ?Sized,
    {
        let mut ids = IdAllocator::default();
        let mut commands = Vec::new();

        for site in matched {
            let prefix = id_prefix(site);
            for def in &site.commands {
                let elements = match resolve_elements(page, def) {
                    Ok(elements) => elements,
                    Err(err) => {
                        error!(definition = %site.url_pattern, "element query failed: {err}");
                        continue;
                    }
                };
                debug!(
                    definition = %site.url_pattern,
                    found = elements.len(),
                    "resolved command elements"
                );
                for (index, element) in elements.into_iter().enumerate() {
                    let text = page.element_text(&element);
                    let resolved = resolve_label(text.as_ref(), def);
                    commands.push(Command {
                        id: ids.allocate(&prefix, index),
                        label: resolved.label,
                        description: resolved.description,
                        target: Some(element),
                        action: def.action_or_default(),
                        definition_id: Some(site.url_pattern.clone()),
                        source_url: Some(site.source_url.clone()),
                    });
                }
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_collapses_whitespace_runs() {
        let def = SiteDefinition::new("^x").named(" My \t Site ");
        assert_eq!(id_prefix(&def), "-My-Site-");
        assert_eq!(id_prefix(&SiteDefinition::new("^x")), "^x");
        assert_eq!(id_prefix(&SiteDefinition::new("^x").named("")), "^x");
    }

    #[test]
    fn allocator_never_repeats() {
        let mut ids = IdAllocator::default();
        let first = ids.allocate("p", 0);
        let second = ids.allocate("p", 0);
        assert_ne!(first, second);
        assert!(first.0.starts_with("p-0-"));
        assert_eq!(first.0.len(), "p-0-".len() + 9);
    }
}
