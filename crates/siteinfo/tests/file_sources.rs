use std::fs;

use palette_siteinfo::{load_file, merge_files, SiteInfoError, ValidationError};

#[test]
fn merge_files_reads_sources_in_order_and_skips_broken_ones() {
    let dir = tempfile::tempdir().unwrap();
    let shared = dir.path().join("shared.json");
    fs::write(
        &shared,
        r##"[{"url": "^https://docs\\.example", "name": "Docs", "commands": [{"selector": "nav a"}]}]"##,
    )
    .unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, r#"{"url": "not an array"}"#).unwrap();
    let local = dir.path().join("local.yaml");
    fs::write(
        &local,
        "- url: \"^https://docs\\\\.example/guide\"\n  commands:\n    - xpath: //h2\n      action: focus\n",
    )
    .unwrap();

    let sources = vec![
        shared.display().to_string(),
        broken.display().to_string(),
        dir.path().join("missing.json").display().to_string(),
    ];
    let report = merge_files(&sources, Some(&local));

    assert_eq!(report.total(), 2);
    assert_eq!(report.definitions[0].source_url, sources[0]);
    assert_eq!(report.definitions[1].source_url, "local");
    assert_eq!(report.definitions[1].url_pattern, "^https://docs\\.example/guide");
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].reason, "Root must be an array");
    assert!(report.failures[1].reason.starts_with("io error"));
}

#[test]
fn file_scheme_prefix_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    fs::write(&path, r#"[{"url": ".*", "commands": []}]"#).unwrap();
    let defs = load_file(format!("file://{}", path.display())).unwrap();
    assert_eq!(defs.len(), 1);
}

#[test]
fn unknown_action_rejects_the_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    fs::write(
        &path,
        r##"[{"url": ".*", "commands": [{"selector": "#ok"}, {"selector": "#x", "action": "hover"}]}]"##,
    )
    .unwrap();
    match load_file(&path) {
        Err(SiteInfoError::Invalid(ValidationError::UnknownAction { item, command, tag })) => {
            assert_eq!((item, command, tag.as_str()), (0, 1, "hover"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}
