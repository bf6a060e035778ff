use std::path::PathBuf;

use anyhow::{Context, Result};
use palette_runtime::PaletteConfig;
use tokio::fs;
use tracing::{info, warn};

pub const APP_DIR: &str = "webpalette";

/// `<config dir>/webpalette/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push(APP_DIR);
    path.push("config.yaml");
    Ok(path)
}

/// Load the palette config, falling back to defaults when the file is absent.
/// Environment overlays are applied last.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<PaletteConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let config = PaletteConfig::from_yaml_str(&content).context("Failed to parse config file")?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        PaletteConfig::default()
    };
    config.apply_env_overlays();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = load_config(Some(&path)).await.unwrap();
        assert_eq!(config.shortcut, PaletteConfig::default().shortcut);
        assert!(config.sources.is_empty());
    }

    #[tokio::test]
    async fn explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "reduced_motion: true\nsources: [a.json, b.yaml]\n").unwrap();
        let config = load_config(Some(&path)).await.unwrap();
        assert!(config.reduced_motion);
        assert_eq!(config.sources, vec!["a.json", "b.yaml"]);
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sources: [unterminated").unwrap();
        let err = load_config(Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
