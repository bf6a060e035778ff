use palette_core_types::ActionKind;
use serde::{Deserialize, Serialize};

/// Provenance tag for definitions authored on the settings surface.
pub const LOCAL_SOURCE: &str = "local";

fn local_source() -> String {
    LOCAL_SOURCE.to_string()
}

/// One command inside a site definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
}

/// Which query a command resolves its elements with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementQuery<'a> {
    XPath(&'a str),
    Selector(&'a str),
}

impl CommandDef {
    /// XPath wins when both are present; empty strings count as absent.
    pub fn query(&self) -> Option<ElementQuery<'_>> {
        fn usable(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }
        usable(&self.xpath)
            .map(ElementQuery::XPath)
            .or_else(|| usable(&self.selector).map(ElementQuery::Selector))
    }

    pub fn action_or_default(&self) -> ActionKind {
        self.action.unwrap_or_default()
    }
}

/// A SITEINFO entry: a page address pattern plus the commands it offers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Regular expression source matched against the full page address.
    #[serde(rename = "url")]
    pub url_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub commands: Vec<CommandDef>,
    #[serde(rename = "sourceUrl", default = "local_source")]
    pub source_url: String,
}

impl SiteDefinition {
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            name: None,
            commands: Vec::new(),
            source_url: local_source(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_command(mut self, command: CommandDef) -> Self {
        self.commands.push(command);
        self
    }

    /// Name when set and non-empty, else the URL pattern.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.url_pattern)
    }

    pub fn is_local(&self) -> bool {
        self.source_url == LOCAL_SOURCE
    }
}
