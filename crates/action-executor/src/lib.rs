//! Executes confirmed palette commands.
//!
//! Element actions pass through [`ClickPolicy`] first: `click` runs only on
//! pages the user allowed and is otherwise demoted to `focus`. Reserved
//! actions (`options`, `debug`, `copy-template`) act on the host through
//! [`HostPort`] and hand palette follow-ups back to the caller.

pub mod errors;
pub mod policy;
pub mod ports;
pub mod runner;
pub mod template;

pub use errors::ExecError;
pub use policy::ClickPolicy;
pub use ports::{HostPort, MemoryHost};
pub use runner::{execute, ExecDeps, ExecutionReport, FollowUp, Outcome};
pub use template::{copied_notice, escape_regex, site_template};
