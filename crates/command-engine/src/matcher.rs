//! URL pattern matching over the ordered definition list.

use std::collections::HashMap;

use palette_siteinfo::SiteDefinition;
use parking_lot::Mutex;
use regex::Regex;
use tracing::warn;

use crate::errors::QueryError;

/// Compiles URL patterns on first use and remembers the outcome.
///
/// A pattern that fails to compile is a non-match for its own definition
/// only, and is reported once per matcher rather than on every open.
#[derive(Debug, Default)]
pub struct UrlMatcher {
    compiled: Mutex<HashMap<String, Option<Regex>>>,
}

impl UrlMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile without touching the cache.
    pub fn compile(pattern: &str) -> Result<Regex, QueryError> {
        Regex::new(pattern).map_err(|err| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })
    }

    /// Unanchored search of `pattern` in `address`.
    pub fn is_match(&self, pattern: &str, address: &str) -> bool {
        let mut compiled = self.compiled.lock();
        let entry = compiled.entry(pattern.to_string()).or_insert_with(|| {
            match Self::compile(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            }
        });
        entry.as_ref().is_some_and(|regex| regex.is_match(address))
    }

    /// True when any of `patterns` matches. Blank entries are ignored.
    pub fn any_match<S: AsRef<str>>(&self, patterns: &[S], address: &str) -> bool {
        patterns
            .iter()
            .map(AsRef::as_ref)
            .filter(|pattern| !pattern.trim().is_empty())
            .any(|pattern| self.is_match(pattern, address))
    }

    /// Every definition whose pattern matches, in store order.
    pub fn matching<'a>(
        &self,
        definitions: &'a [SiteDefinition],
        address: &str,
    ) -> Vec<&'a SiteDefinition> {
        definitions
            .iter()
            .filter(|def| self.is_match(&def.url_pattern, address))
            .collect()
    }

    /// Number of distinct patterns seen so far that failed to compile.
    pub fn invalid_patterns(&self) -> usize {
        self.compiled
            .lock()
            .values()
            .filter(|entry| entry.is_none())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(patterns: &[&str]) -> Vec<SiteDefinition> {
        patterns.iter().map(|p| SiteDefinition::new(*p)).collect()
    }

    #[test]
    fn returns_every_match_in_store_order() {
        let matcher = UrlMatcher::new();
        let list = defs(&["^https://a\\.com", "example", "a\\.com/x", "^http://"]);
        let found: Vec<_> = matcher
            .matching(&list, "https://a.com/x")
            .into_iter()
            .map(|d| d.url_pattern.as_str())
            .collect();
        assert_eq!(found, vec!["^https://a\\.com", "a\\.com/x"]);
    }

    #[test]
    fn matching_is_a_subsequence_for_many_addresses() {
        let matcher = UrlMatcher::new();
        let list = defs(&[".*", "^https://", "b", "(", "^$", "a|b"]);
        for address in ["", "https://a", "http://b", "ftp://c"] {
            let found = matcher.matching(&list, address);
            let expected: Vec<_> = list
                .iter()
                .filter(|d| Regex::new(&d.url_pattern).is_ok_and(|re| re.is_match(address)))
                .collect();
            assert_eq!(found, expected, "{address}");
        }
    }

    #[test]
    fn invalid_pattern_only_skips_its_definition() {
        let matcher = UrlMatcher::new();
        let list = defs(&["[unclosed", ".*"]);
        assert_eq!(matcher.matching(&list, "https://x").len(), 1);
        assert_eq!(matcher.matching(&list, "https://y").len(), 1);
        assert_eq!(matcher.invalid_patterns(), 1);
    }

    #[test]
    fn any_match_skips_blank_patterns() {
        let matcher = UrlMatcher::new();
        assert!(!matcher.any_match(&["", "   "], "https://x"));
        assert!(matcher.any_match(&["", "x$"], "https://x"));
        let empty: [&str; 0] = [];
        assert!(!matcher.any_match(&empty, "https://x"));
    }
}
