//! One page's palette: trigger, open pipeline and execution.

use std::sync::Arc;

use palette_action_executor::{execute, ClickPolicy, ExecDeps, ExecutionReport, FollowUp, HostPort};
use palette_command_engine::{builtin_commands, CommandExtractor, DebugReport, UrlMatcher};
use palette_core_types::{KeyInput, PaletteError, SessionId};
use palette_page_dom::Page;
use palette_siteinfo::DefinitionStore;
use palette_state::{EventReceiver, KeyOutcome, PaletteEvent, PaletteState};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::config::PaletteConfig;

/// What the trigger shortcut did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Not the configured shortcut; let the page have it.
    NotShortcut,
    /// Shortcut pressed on an excluded page.
    Excluded,
    /// Palette opened with this many commands, built-ins included.
    Opened(usize),
    Closed,
}

/// Result of routing a key to the open palette.
#[derive(Debug)]
pub struct KeyResult {
    pub outcome: KeyOutcome,
    pub executed: Vec<ExecutionReport>,
}

pub struct PaletteSession<H: HostPort> {
    id: SessionId,
    config: PaletteConfig,
    config_updates: Option<watch::Receiver<PaletteConfig>>,
    policy: ClickPolicy,
    store: Arc<dyn DefinitionStore>,
    extractor: CommandExtractor,
    palette: PaletteState,
    events: EventReceiver,
    host: H,
    failures: Vec<PaletteError>,
}

fn policy_for(config: &PaletteConfig) -> ClickPolicy {
    ClickPolicy {
        allowed_click_patterns: config.allowed_click_urls.patterns().to_vec(),
        reduced_motion: config.reduced_motion,
        ..ClickPolicy::default()
    }
}

impl<H: HostPort> PaletteSession<H> {
    pub fn new(config: PaletteConfig, store: Arc<dyn DefinitionStore>, host: H) -> Self {
        let (palette, events) = PaletteState::new();
        Self {
            id: SessionId::new(),
            policy: policy_for(&config),
            config,
            config_updates: None,
            store,
            extractor: CommandExtractor::new(Arc::new(UrlMatcher::new())),
            palette,
            events,
            host,
            failures: Vec::new(),
        }
    }

    /// Pick up config changes from `updates` the next time the palette is used.
    pub fn watch_config(&mut self, updates: watch::Receiver<PaletteConfig>) {
        self.config_updates = Some(updates);
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PaletteConfig) {
        self.policy = policy_for(&config);
        self.config = config;
        debug!(session = %self.id.0, "config replaced");
    }

    pub fn palette(&self) -> &PaletteState {
        &self.palette
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Commands that failed to execute in this session, oldest first.
    pub fn failures(&self) -> &[PaletteError] {
        &self.failures
    }

    pub fn matcher(&self) -> &UrlMatcher {
        self.extractor.matcher()
    }

    pub fn is_excluded(&self, address: &str) -> bool {
        self.matcher()
            .any_match(self.config.excluded_urls.patterns(), address)
    }

    pub fn click_allowed(&self, address: &str) -> bool {
        self.policy.click_allowed(self.matcher(), address)
    }

    fn refresh_config(&mut self) {
        let changed = match self.config_updates.as_mut() {
            Some(updates) if updates.has_changed().unwrap_or(false) => {
                Some(updates.borrow_and_update().clone())
            }
            _ => None,
        };
        if let Some(config) = changed {
            info!(session = %self.id.0, "config updated");
            self.set_config(config);
        }
    }

    /// Global key listener: toggles the palette on the configured shortcut.
    pub async fn handle_shortcut(&mut self, page: &dyn Page, input: &KeyInput) -> TriggerOutcome {
        self.refresh_config();
        if !self.config.shortcut.matches(input) {
            return TriggerOutcome::NotShortcut;
        }
        if self.is_excluded(page.location()) {
            info!(url = page.location(), "url is excluded; palette not opened");
            return TriggerOutcome::Excluded;
        }
        if self.palette.is_open() {
            self.palette.cancel();
            self.drain(page);
            return TriggerOutcome::Closed;
        }
        TriggerOutcome::Opened(self.open(page).await)
    }

    /// Build a fresh command list from the current definitions and open.
    #[instrument(skip_all, fields(session = %self.id.0, url = page.location()))]
    pub async fn open(&mut self, page: &dyn Page) -> usize {
        self.refresh_config();
        let snapshot = self.store.snapshot().await;
        let address = page.location();
        let matched = self.matcher().matching(&snapshot.definitions, address);
        let mut commands = self.extractor.extract_matched(page, &matched);
        let extracted = commands.len();
        commands.extend(builtin_commands());

        let report = DebugReport::new(
            address,
            &matched,
            snapshot.len(),
            self.click_allowed(address),
            self.config.shortcut.display(),
        );
        self.palette.set_debug_info(report.to_string());

        let total = commands.len();
        self.palette.open(commands);
        info!(
            rev = snapshot.rev,
            matched = matched.len(),
            extracted,
            "palette opened"
        );
        self.drain(page);
        total
    }

    pub fn set_query(&mut self, text: &str) {
        self.palette.set_query(text);
    }

    /// Keys typed into the palette input.
    pub fn handle_palette_key(&mut self, page: &dyn Page, input: &KeyInput) -> KeyResult {
        let outcome = self.palette.handle_key(input);
        KeyResult {
            outcome,
            executed: self.drain(page),
        }
    }

    pub fn click_row(&mut self, page: &dyn Page, row: usize) -> Vec<ExecutionReport> {
        self.palette.click_row(row);
        self.drain(page)
    }

    pub fn backdrop_click(&mut self, page: &dyn Page) {
        self.palette.backdrop_click();
        self.drain(page);
    }

    pub fn blur(&mut self, page: &dyn Page) {
        self.palette.blur();
        self.drain(page);
    }

    /// Handle everything the palette has emitted so far.
    fn drain(&mut self, page: &dyn Page) -> Vec<ExecutionReport> {
        let mut executed = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            match event {
                PaletteEvent::Execute(command) => {
                    let deps = ExecDeps {
                        page,
                        host: &self.host,
                        matcher: self.extractor.matcher(),
                        policy: &self.policy,
                    };
                    match execute(&command, deps) {
                        Ok(report) => {
                            for follow_up in &report.follow_ups {
                                self.apply_follow_up(follow_up);
                            }
                            executed.push(report);
                        }
                        Err(err) => {
                            let err = PaletteError::from(err);
                            error!(command = %command.id, "command failed: {err}");
                            self.failures.push(err);
                        }
                    }
                }
                PaletteEvent::FocusInput => debug!("focus palette input"),
                PaletteEvent::Closed(reason) => debug!(?reason, "palette closed"),
            }
        }
        executed
    }

    fn apply_follow_up(&mut self, follow_up: &FollowUp) {
        match follow_up {
            FollowUp::ToggleDebug => self.palette.toggle_debug(),
            FollowUp::ShowDebug => self.palette.show_debug(),
            FollowUp::SetDebugInfo(info) => self.palette.set_debug_info(info.clone()),
            FollowUp::Reopen => self.palette.reopen(),
        }
    }
}
