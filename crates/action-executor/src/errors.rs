use thiserror::Error;

use palette_core_types::PaletteError;
use palette_page_dom::DomError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("clipboard write failed: {0}")]
    Clipboard(String),
    #[error("settings surface unavailable: {0}")]
    Settings(String),
    #[error("cannot build template for '{0}'")]
    Template(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<ExecError> for PaletteError {
    fn from(err: ExecError) -> Self {
        PaletteError::new(err.to_string())
    }
}
