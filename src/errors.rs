use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{failed} of {total} SITEINFO files failed validation")]
    InvalidSources { failed: usize, total: usize },
    #[error("failed to read page {path}: {reason}")]
    PageUnreadable { path: String, reason: String },
    #[error("could not build template: {0}")]
    Template(String),
}
