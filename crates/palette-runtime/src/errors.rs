use palette_action_executor::ExecError;
use palette_core_types::PaletteError;
use palette_siteinfo::SiteInfoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    SiteInfo(#[from] SiteInfoError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl From<RuntimeError> for PaletteError {
    fn from(value: RuntimeError) -> Self {
        PaletteError::new(value.to_string())
    }
}
