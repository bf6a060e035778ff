use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::SiteInfoError;
use crate::model::SiteDefinition;
use crate::validate::validate_siteinfo;

/// Text encodings a SITEINFO batch may arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Pick the format from a file extension, JSON unless it says YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }
}

/// Validate an already-decoded batch and turn it into definitions.
pub fn parse_value(value: Value) -> Result<Vec<SiteDefinition>, SiteInfoError> {
    validate_siteinfo(&value)?;
    serde_json::from_value(value).map_err(|err| SiteInfoError::Parse(format!("{}", err)))
}

pub fn parse_str(content: &str, format: SourceFormat) -> Result<Vec<SiteDefinition>, SiteInfoError> {
    let value: Value = match format {
        SourceFormat::Json => serde_json::from_str(content)
            .map_err(|err| SiteInfoError::Parse(format!("{}", err)))?,
        SourceFormat::Yaml => {
            let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)
                .map_err(|err| SiteInfoError::Parse(format!("{}", err)))?;
            serde_json::to_value(yaml_value)
                .map_err(|err| SiteInfoError::Parse(format!("{}", err)))?
        }
    };
    parse_value(value)
}

/// Read, validate and decode one SITEINFO file.
///
/// A `file://` prefix is accepted so configured source locators can be
/// passed through unchanged.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<SiteDefinition>, SiteInfoError> {
    let raw = path.as_ref();
    let path = raw
        .to_str()
        .and_then(|text| text.strip_prefix("file://"))
        .map(Path::new)
        .unwrap_or(raw);
    let content =
        fs::read_to_string(path).map_err(|err| SiteInfoError::Io(format!("{}: {}", path.display(), err)))?;
    let definitions = parse_str(&content, SourceFormat::from_path(path))?;
    debug!(path = %path.display(), count = definitions.len(), "loaded siteinfo file");
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use palette_core_types::ActionKind;

    #[test]
    fn json_batch_decodes_with_local_default_source() {
        let defs = parse_str(
            r##"[{"url": "^https://a\\.com", "name": "A", "commands": [
                {"selector": "#btn", "title": "Save"},
                {"xpath": "//a", "action": "focus"}
            ]}]"##,
            SourceFormat::Json,
        )
        .unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].url_pattern, "^https://a\\.com");
        assert_eq!(defs[0].source_url, "local");
        assert_eq!(defs[0].commands[1].action, Some(ActionKind::Focus));
        assert_eq!(defs[0].commands[0].action_or_default(), ActionKind::Click);
    }

    #[test]
    fn yaml_batch_goes_through_the_same_validation() {
        let err = parse_str("- url: foo\n  commands: nope\n", SourceFormat::Yaml).unwrap_err();
        assert!(matches!(
            err,
            SiteInfoError::Invalid(ValidationError::CommandsNotArray { item: 0 })
        ));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(matches!(
            parse_str("[{", SourceFormat::Json),
            Err(SiteInfoError::Parse(_))
        ));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/site.YML")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("site.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("siteinfo")), SourceFormat::Json);
    }
}
