//! Subcommand implementations.
//!
//! Each command returns a serializable summary; `main` renders it in the
//! requested output format.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use palette_action_executor::{site_template, ClickPolicy, ExecutionReport, MemoryHost};
use palette_command_engine::{DebugReport, UrlMatcher};
use palette_core_types::{ActionKind, KeyInput, ShortcutSpec};
use palette_page_dom::{DomEffect, HtmlPage, PageQuery};
use palette_runtime::{PaletteConfig, PaletteSession, TriggerOutcome};
use palette_siteinfo::{
    load_file, merge_files, InMemoryDefinitionStore, MergeReport, SiteDefinition, SourceFailure,
};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::errors::CliError;

#[derive(Clone, Debug, Serialize)]
pub struct FileCheck {
    pub path: String,
    pub definitions: usize,
    pub commands: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidationSummary {
    pub files: Vec<FileCheck>,
}

impl ValidationSummary {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|file| file.error.is_some()).count()
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            match &file.error {
                Some(error) => writeln!(f, "FAIL {}: {}", file.path, error)?,
                None => writeln!(
                    f,
                    "OK   {} ({} definitions, {} commands)",
                    file.path, file.definitions, file.commands
                )?,
            }
        }
        write!(f, "{} checked, {} failed", self.files.len(), self.failed())
    }
}

/// Validate each SITEINFO file on its own.
pub fn validate_files(paths: &[PathBuf]) -> ValidationSummary {
    let files = paths
        .iter()
        .map(|path| {
            let display = path.display().to_string();
            match load_file(path) {
                Ok(definitions) => FileCheck {
                    path: display,
                    commands: definitions.iter().map(|def| def.commands.len()).sum(),
                    definitions: definitions.len(),
                    error: None,
                },
                Err(err) => FileCheck {
                    path: display,
                    definitions: 0,
                    commands: 0,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();
    ValidationSummary { files }
}

#[derive(Clone, Debug, Serialize)]
pub struct DefinitionRow {
    pub name: String,
    pub url: String,
    pub source: String,
    pub commands: usize,
}

impl From<&SiteDefinition> for DefinitionRow {
    fn from(def: &SiteDefinition) -> Self {
        Self {
            name: def.display_name().to_string(),
            url: def.url_pattern.clone(),
            source: def.source_url.clone(),
            commands: def.commands.len(),
        }
    }
}

impl fmt::Display for DefinitionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) from {}, {} commands",
            self.name, self.url, self.source, self.commands
        )
    }
}

/// Merge the configured external sources and the local file.
pub fn merge_definitions(config: &PaletteConfig) -> MergeReport {
    merge_files(&config.sources, config.local_siteinfo.as_deref())
}

#[derive(Clone, Debug, Serialize)]
pub struct MergeSummary {
    pub total: usize,
    pub external: usize,
    pub last_updated: String,
    pub definitions: Vec<DefinitionRow>,
    pub failures: Vec<SourceFailure>,
}

impl From<&MergeReport> for MergeSummary {
    fn from(report: &MergeReport) -> Self {
        Self {
            total: report.total(),
            external: report.external_count(),
            last_updated: report.last_updated.to_rfc3339(),
            definitions: report.definitions.iter().map(DefinitionRow::from).collect(),
            failures: report.failures.clone(),
        }
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loaded {} SITEINFO definitions ({} external)",
            self.total, self.external
        )?;
        for row in &self.definitions {
            writeln!(f, "  {row}")?;
        }
        for failure in &self.failures {
            writeln!(f, "  failed {}: {}", failure.source, failure.reason)?;
        }
        write!(f, "Last updated: {}", self.last_updated)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchSummary {
    pub excluded: bool,
    pub report: DebugReport,
    pub matched: Vec<DefinitionRow>,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)?;
        if self.excluded {
            write!(f, "\nExcluded: the palette is disabled on this page")?;
        }
        for row in &self.matched {
            write!(f, "\n  {row}")?;
        }
        Ok(())
    }
}

/// Which definitions apply to `url`, plus the debug panel text for it.
pub fn match_url(config: &PaletteConfig, definitions: &[SiteDefinition], url: &str) -> MatchSummary {
    let matcher = UrlMatcher::new();
    let policy = ClickPolicy::new(config.allowed_click_urls.patterns().to_vec());
    let matched = matcher.matching(definitions, url);
    let report = DebugReport::new(
        url,
        &matched,
        definitions.len(),
        policy.click_allowed(&matcher, url),
        config.shortcut.display(),
    );
    MatchSummary {
        excluded: matcher.any_match(config.excluded_urls.patterns(), url),
        matched: matched.into_iter().map(DefinitionRow::from).collect(),
        report,
    }
}

/// Load an HTML document as the page at `url`.
pub async fn read_page(url: &str, html: &Path) -> Result<HtmlPage, CliError> {
    let source = fs::read_to_string(html)
        .await
        .map_err(|err| CliError::PageUnreadable {
            path: html.display().to_string(),
            reason: err.to_string(),
        })?;
    debug!(bytes = source.len(), "page source read");
    Ok(HtmlPage::parse(url, &source))
}

#[derive(Clone, Debug, Serialize)]
pub struct CommandRow {
    pub id: String,
    pub label: String,
    pub description: String,
    pub action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExtractSummary {
    pub url: String,
    pub commands: Vec<CommandRow>,
}

impl fmt::Display for ExtractSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} commands on {}", self.commands.len(), self.url)?;
        for (index, cmd) in self.commands.iter().enumerate() {
            write!(f, "\n{:>3}. {} [{}]", index + 1, cmd.label, cmd.action)?;
            if !cmd.description.is_empty() {
                write!(f, " {}", cmd.description)?;
            }
            if let Some(element) = &cmd.element {
                write!(f, " <{element}>")?;
            }
        }
        Ok(())
    }
}

fn session_for(
    config: PaletteConfig,
    definitions: Vec<SiteDefinition>,
) -> PaletteSession<MemoryHost> {
    let store = Arc::new(InMemoryDefinitionStore::new(definitions));
    PaletteSession::new(config, store, MemoryHost::new())
}

/// The command list the palette would show on `page`, built-ins included.
pub async fn extract_commands(
    config: PaletteConfig,
    definitions: Vec<SiteDefinition>,
    page: &HtmlPage,
) -> ExtractSummary {
    let mut session = session_for(config, definitions);
    session.open(page).await;
    let commands = session
        .palette()
        .all_commands()
        .iter()
        .map(|cmd| CommandRow {
            id: cmd.id.to_string(),
            label: cmd.label.clone(),
            description: cmd.description.clone(),
            action: cmd.action,
            element: cmd.target.and_then(|target| page.describe(&target)),
        })
        .collect();
    ExtractSummary {
        url: page.location().to_string(),
        commands,
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub query: String,
    /// Row of the filtered list to confirm.
    pub row: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub trigger: &'static str,
    pub commands: usize,
    pub executed: Vec<ExecutionReport>,
    pub effects: Vec<DomEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_panel: Option<String>,
    pub palette_open: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trigger: {} ({} commands)", self.trigger, self.commands)?;
        if self.executed.is_empty() {
            write!(f, "\nNothing executed")?;
        }
        for report in &self.executed {
            write!(
                f,
                "\nExecuted {} as {} ({:?})",
                report.command, report.effective, report.outcome
            )?;
            if report.demoted() {
                write!(f, ", demoted from {}", report.requested)?;
            }
        }
        for effect in &self.effects {
            write!(f, "\n  {effect:?}")?;
        }
        if let Some(clipboard) = &self.clipboard {
            write!(f, "\nClipboard:\n{clipboard}")?;
        }
        if let Some(panel) = &self.debug_panel {
            write!(f, "\nDebug panel:\n{panel}")?;
        }
        Ok(())
    }
}

/// The key press that fires `shortcut`.
pub fn shortcut_input(shortcut: &ShortcutSpec) -> KeyInput {
    KeyInput {
        key: shortcut.key.clone(),
        code: shortcut.code.clone(),
        ctrl_key: shortcut.ctrl_key,
        shift_key: shortcut.shift_key,
        alt_key: shortcut.alt_key,
        meta_key: shortcut.meta_key,
    }
}

fn trigger_label(outcome: TriggerOutcome) -> &'static str {
    match outcome {
        TriggerOutcome::NotShortcut => "not-shortcut",
        TriggerOutcome::Excluded => "excluded",
        TriggerOutcome::Opened(_) => "opened",
        TriggerOutcome::Closed => "closed",
    }
}

/// Press the shortcut on `page`, type the query and confirm a row.
pub async fn run_palette(
    config: PaletteConfig,
    definitions: Vec<SiteDefinition>,
    page: &HtmlPage,
    options: &RunOptions,
) -> RunSummary {
    let input = shortcut_input(&config.shortcut);
    let mut session = session_for(config, definitions);
    let trigger = session.handle_shortcut(page, &input).await;

    let mut executed = Vec::new();
    if let TriggerOutcome::Opened(count) = trigger {
        session.set_query(&options.query);
        executed = session.click_row(page, options.row);
        info!(count, executed = executed.len(), "palette run finished");
    }

    let palette = session.palette();
    RunSummary {
        trigger: trigger_label(trigger),
        commands: palette.all_commands().len(),
        executed,
        effects: page.effects(),
        clipboard: session.host().clipboard(),
        debug_panel: palette
            .is_debug_visible()
            .then(|| palette.debug_info().to_string()),
        palette_open: palette.is_open(),
    }
}

/// A starter SITEINFO entry for `url`.
pub fn template(url: &str, title: &str) -> Result<String, CliError> {
    site_template(url, title).map_err(|err| CliError::Template(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_siteinfo::CommandDef;

    fn shop() -> Vec<SiteDefinition> {
        vec![
            SiteDefinition::new("^https://shop\\.example").named("Shop").with_command(CommandDef {
                selector: Some("button".into()),
                ..CommandDef::default()
            }),
            SiteDefinition::new("^https://news\\.example"),
        ]
    }

    #[test]
    fn match_reports_exclusion_and_click_policy() {
        let config = PaletteConfig::from_yaml_str(
            "excluded_urls: [\"^https://shop\\\\.example/admin\"]\nallowed_click_urls: [\"shop\"]\n",
        )
        .unwrap();
        let summary = match_url(&config, &shop(), "https://shop.example/admin");
        assert!(summary.excluded);
        assert!(summary.report.click_allowed);
        assert_eq!(summary.matched.len(), 1);
        assert_eq!(summary.matched[0].name, "Shop");

        let summary = match_url(&config, &shop(), "https://other.example/");
        assert!(!summary.excluded);
        assert!(summary.to_string().contains("Matched SITEINFO: None"));
    }

    #[test]
    fn shortcut_input_fires_its_own_shortcut() {
        let spec = ShortcutSpec::default();
        assert!(spec.matches(&shortcut_input(&spec)));
    }

    #[tokio::test]
    async fn run_confirms_the_filtered_row() {
        let page = HtmlPage::parse(
            "https://shop.example/cart",
            "<button id=\"buy\">Buy</button><button>Share</button>",
        );
        let options = RunOptions {
            query: "share".into(),
            row: 0,
        };
        let summary = run_palette(PaletteConfig::default(), shop(), &page, &options).await;
        assert_eq!(summary.trigger, "opened");
        assert_eq!(summary.commands, 4);
        assert_eq!(summary.executed.len(), 1);
        assert_eq!(summary.executed[0].effective, ActionKind::Focus);
        assert!(!summary.palette_open);
        assert!(summary.debug_panel.is_none());
    }

    #[test]
    fn template_rejects_unparseable_addresses() {
        assert!(matches!(template("not a url", ""), Err(CliError::Template(_))));
        assert!(template("https://a.example/x", "").unwrap().contains("New Site"));
    }
}
