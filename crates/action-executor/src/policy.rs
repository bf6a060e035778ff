use palette_command_engine::UrlMatcher;
use palette_core_types::ActionKind;
use palette_page_dom::HighlightPulse;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Execution policy for element-targeted actions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClickPolicy {
    /// Page patterns where `click` is allowed; everywhere else it becomes `focus`.
    pub allowed_click_patterns: Vec<String>,
    /// Skip the highlight pulse.
    pub reduced_motion: bool,
    pub pulse: HighlightPulse,
}

impl ClickPolicy {
    pub fn new(allowed_click_patterns: Vec<String>) -> Self {
        Self {
            allowed_click_patterns,
            ..Self::default()
        }
    }

    pub fn click_allowed(&self, matcher: &UrlMatcher, address: &str) -> bool {
        matcher.any_match(&self.allowed_click_patterns, address)
    }

    /// Action to actually perform for `declared` on the page at `address`.
    pub fn effective_action(
        &self,
        matcher: &UrlMatcher,
        declared: ActionKind,
        address: &str,
    ) -> ActionKind {
        if declared == ActionKind::Click && !self.click_allowed(matcher, address) {
            warn!(
                address,
                "'click' action demoted to 'focus'; add the page to the allowed click URLs to enable it"
            );
            return ActionKind::Focus;
        }
        declared
    }
}
