use std::str::FromStr;

use palette_core_types::ActionKind;
use serde_json::Value;

use crate::errors::ValidationError;

/// Check the shape of a raw SITEINFO batch.
///
/// The batch is rejected as a whole on the first problem; nothing from an
/// invalid batch ever reaches the store.
pub fn validate_siteinfo(root: &Value) -> Result<(), ValidationError> {
    let items = root.as_array().ok_or(ValidationError::RootNotArray)?;
    for (item, entry) in items.iter().enumerate() {
        if !present(entry.get("url")) {
            return Err(ValidationError::MissingUrl { item });
        }
        let commands = entry
            .get("commands")
            .and_then(Value::as_array)
            .ok_or(ValidationError::CommandsNotArray { item })?;
        for (command, def) in commands.iter().enumerate() {
            if !present(def.get("xpath")) && !present(def.get("selector")) {
                return Err(ValidationError::MissingQuery { item, command });
            }
            match def.get("action") {
                None | Some(Value::Null) => {}
                Some(Value::String(tag)) if ActionKind::from_str(tag).is_ok() => {}
                Some(Value::String(tag)) => {
                    return Err(ValidationError::UnknownAction {
                        item,
                        command,
                        tag: tag.clone(),
                    })
                }
                Some(other) => {
                    return Err(ValidationError::UnknownAction {
                        item,
                        command,
                        tag: other.to_string(),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Absent, null, false, zero and empty strings all count as missing.
fn present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_batch() {
        let batch = json!([
            {"url": "^https://a\\.com", "commands": [{"selector": "#btn"}]},
            {"url": ".*", "name": "Any", "commands": []}
        ]);
        assert_eq!(validate_siteinfo(&batch), Ok(()));
    }

    #[test]
    fn reports_root_and_item_shapes() {
        assert_eq!(
            validate_siteinfo(&json!({"url": "x"})).unwrap_err().to_string(),
            "Root must be an array"
        );
        assert_eq!(
            validate_siteinfo(&json!([{"commands": []}]))
                .unwrap_err()
                .to_string(),
            "Item 0: Missing 'url'"
        );
        assert_eq!(
            validate_siteinfo(&json!([{"url": "a", "commands": []}, {"url": "", "commands": []}]))
                .unwrap_err()
                .to_string(),
            "Item 1: Missing 'url'"
        );
        assert_eq!(
            validate_siteinfo(&json!([{"url": "a", "commands": {}}]))
                .unwrap_err()
                .to_string(),
            "Item 0: 'commands' must be an array"
        );
    }

    #[test]
    fn reports_command_problems_with_positions() {
        let batch = json!([
            {"url": "a", "commands": [{"selector": "#x"}]},
            {"url": "b", "commands": [{"xpath": "//a"}, {"title": "no query", "selector": ""}]}
        ]);
        assert_eq!(
            validate_siteinfo(&batch).unwrap_err(),
            ValidationError::MissingQuery {
                item: 1,
                command: 1
            }
        );
        assert_eq!(
            validate_siteinfo(&batch).unwrap_err().to_string(),
            "Item 1, Command 1: Missing 'xpath' or 'selector'"
        );
    }

    #[test]
    fn rejects_unknown_action_tags() {
        let batch = json!([
            {"url": "a", "commands": [{"selector": "#x", "action": "submit"}]}
        ]);
        assert_eq!(
            validate_siteinfo(&batch).unwrap_err().to_string(),
            "Item 0, Command 0: Unknown action 'submit'"
        );
        let numeric = json!([
            {"url": "a", "commands": [{"selector": "#x", "action": 3}]}
        ]);
        assert!(matches!(
            validate_siteinfo(&numeric),
            Err(ValidationError::UnknownAction { .. })
        ));
    }

    #[test]
    fn accepts_every_known_action() {
        for kind in ActionKind::ALL {
            let batch = json!([
                {"url": "a", "commands": [{"selector": "#x", "action": kind.as_str()}]}
            ]);
            assert_eq!(validate_siteinfo(&batch), Ok(()), "{kind}");
        }
    }
}
