use std::fmt;

use palette_siteinfo::SiteDefinition;
use serde::Serialize;

/// Diagnostics shown in the palette's debug panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DebugReport {
    pub url: String,
    /// Name (or pattern) of each matched definition, in match order.
    pub matched: Vec<String>,
    pub total_loaded: usize,
    pub click_allowed: bool,
    pub shortcut: String,
}

impl DebugReport {
    pub fn new(
        url: &str,
        matched: &[&SiteDefinition],
        total_loaded: usize,
        click_allowed: bool,
        shortcut: String,
    ) -> Self {
        Self {
            url: url.to_string(),
            matched: matched
                .iter()
                .map(|def| def.display_name().to_string())
                .collect(),
            total_loaded,
            click_allowed,
            shortcut,
        }
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matched = if self.matched.is_empty() {
            "None".to_string()
        } else {
            self.matched.join(", ")
        };
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Matched SITEINFO: {matched}")?;
        writeln!(f, "Total SITEINFO loaded: {}", self.total_loaded)?;
        writeln!(f, "Click Allowed: {}", self.click_allowed)?;
        write!(f, "Shortcut: {}", self.shortcut)
    }
}
