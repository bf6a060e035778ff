use chrono::{DateTime, Utc};
use palette_command_engine::{dom_text, UrlMatcher};
use palette_core_types::{ActionKind, Command, CommandId, ElementRef};
use palette_page_dom::Page;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::ExecError;
use crate::policy::ClickPolicy;
use crate::ports::HostPort;
use crate::template::{copied_notice, site_template};

/// Palette-side work the host must do after an action ran.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FollowUp {
    ToggleDebug,
    ShowDebug,
    SetDebugInfo(String),
    /// Open the palette again with its last command list.
    Reopen,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The effect was applied to the target element.
    Applied,
    /// A host-level effect ran.
    Host,
    /// Target missing or detached; nothing happened.
    Stale,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExecutionReport {
    pub command: CommandId,
    pub requested: ActionKind,
    pub effective: ActionKind,
    pub outcome: Outcome,
    pub follow_ups: Vec<FollowUp>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReport {
    fn new(command: &Command, effective: ActionKind, outcome: Outcome) -> Self {
        Self {
            command: command.id.clone(),
            requested: command.action,
            effective,
            outcome,
            follow_ups: Vec::new(),
            executed_at: Utc::now(),
        }
    }

    pub fn demoted(&self) -> bool {
        self.requested != self.effective
    }
}

pub struct ExecDeps<'a> {
    pub page: &'a dyn Page,
    pub host: &'a dyn HostPort,
    pub matcher: &'a UrlMatcher,
    pub policy: &'a ClickPolicy,
}

/// Perform a confirmed command.
///
/// Stale targets are a warning and an `Ok` no-op. Errors are host failures
/// (clipboard, settings surface) and DOM faults other than staleness.
#[instrument(skip_all, fields(command = %command.id, action = %command.action))]
pub fn execute(command: &Command, deps: ExecDeps<'_>) -> Result<ExecutionReport, ExecError> {
    match command.action {
        ActionKind::OpenSettings => {
            deps.host.open_settings()?;
            info!("settings surface opened");
            Ok(ExecutionReport::new(command, command.action, Outcome::Host))
        }
        ActionKind::ToggleDebug => {
            let mut report = ExecutionReport::new(command, command.action, Outcome::Host);
            report.follow_ups = vec![FollowUp::ToggleDebug, FollowUp::Reopen];
            Ok(report)
        }
        ActionKind::CopyTemplate => {
            let template = site_template(deps.page.location(), deps.page.title())?;
            deps.host.write_clipboard(&template)?;
            info!("siteinfo template copied");
            let mut report = ExecutionReport::new(command, command.action, Outcome::Host);
            report.follow_ups = vec![
                FollowUp::SetDebugInfo(copied_notice(&template)),
                FollowUp::ShowDebug,
                FollowUp::Reopen,
            ];
            Ok(report)
        }
        ActionKind::Click | ActionKind::Focus | ActionKind::CopyText => {
            let effective =
                deps.policy
                    .effective_action(deps.matcher, command.action, deps.page.location());
            let target = match command.target {
                Some(target) if deps.page.is_connected(&target) => target,
                _ => {
                    warn!("target element not found for command '{}'", command.label);
                    return Ok(ExecutionReport::new(command, effective, Outcome::Stale));
                }
            };
            let outcome = match apply(command, target, effective, &deps) {
                Ok(()) => Outcome::Applied,
                Err(ExecError::Dom(err)) if err.is_stale() => {
                    warn!("target element went away mid-action: {err}");
                    Outcome::Stale
                }
                Err(err) => return Err(err),
            };
            Ok(ExecutionReport::new(command, effective, outcome))
        }
    }
}

fn apply(
    command: &Command,
    target: ElementRef,
    effective: ActionKind,
    deps: &ExecDeps<'_>,
) -> Result<(), ExecError> {
    let page = deps.page;
    page.scroll_into_view(&target)?;
    if !deps.policy.reduced_motion {
        page.pulse_highlight(&target, deps.policy.pulse)?;
    }
    match effective {
        ActionKind::Focus => page.focus(&target)?,
        ActionKind::CopyText => {
            let text = page
                .element_text(&target)
                .map(|text| dom_text(&text))
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| command.label.clone());
            deps.host.write_clipboard(&text)?;
        }
        _ => {
            page.click(&target)?;
            page.focus(&target)?;
        }
    }
    debug!(element = %target, action = %effective, "command applied");
    Ok(())
}

