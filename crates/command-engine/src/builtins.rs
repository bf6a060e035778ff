use palette_core_types::{ActionKind, Command};

pub const BUILTIN_DEBUG_ID: &str = "builtin-debug";
pub const BUILTIN_COPY_TEMPLATE_ID: &str = "builtin-copy-template";

/// Host commands appended after the extracted ones on every open.
pub fn builtin_commands() -> Vec<Command> {
    vec![
        Command::builtin(BUILTIN_DEBUG_ID, "Debug: Toggle Info", ActionKind::ToggleDebug),
        Command::builtin(
            BUILTIN_COPY_TEMPLATE_ID,
            "Debug: Copy SITEINFO Template",
            ActionKind::CopyTemplate,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_no_target_and_reserved_actions() {
        let builtins = builtin_commands();
        assert_eq!(builtins.len(), 2);
        assert_eq!(builtins[0].id.0, "builtin-debug");
        assert_eq!(builtins[1].label, "Debug: Copy SITEINFO Template");
        assert!(builtins
            .iter()
            .all(|cmd| cmd.target.is_none() && cmd.action.is_reserved()));
    }
}
