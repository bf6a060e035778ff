use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;

const SITEINFO: &str = r##"[
  {
    "name": "Shop",
    "url": "^https://shop\\.example/",
    "commands": [
      { "selector": "#pay", "title": "Pay for the order", "action": "click" },
      { "xpath": "//input[@name='coupon']", "action": "copy-text" }
    ]
  }
]"##;

const PAGE: &str = r#"<html><head><title>Checkout</title></head><body>
<button id="pay">Pay now</button>
<input name="coupon" value="SPRING24">
</body></html>"#;

fn palette(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("webpalette"));
    cmd.env_remove("RUST_LOG")
        .env_remove("WEBPALETTE_ALLOWED_CLICK_URLS")
        .env_remove("WEBPALETTE_EXCLUDED_URLS")
        .arg("--config")
        .arg(dir.join("config.yaml"));
    cmd
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shop.json"), SITEINFO).unwrap();
    fs::write(dir.path().join("checkout.html"), PAGE).unwrap();
    dir
}

fn stdout_json(output: std::process::Output) -> Value {
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn validate_reports_each_file() {
    let dir = fixture();
    fs::write(dir.path().join("broken.json"), r#"[{"commands": []}]"#).unwrap();

    let assert = palette(dir.path())
        .arg("validate")
        .arg(dir.path().join("shop.json"))
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("1 definitions, 2 commands"));

    let assert = palette(dir.path())
        .arg("validate")
        .arg(dir.path().join("shop.json"))
        .arg(dir.path().join("broken.json"))
        .assert()
        .failure();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("Item 0: Missing 'url'"));
}

#[test]
fn extract_lists_commands_then_builtins() {
    let dir = fixture();
    let output = palette(dir.path())
        .args(["--output", "json", "extract", "--url", "https://shop.example/checkout"])
        .arg("--html")
        .arg(dir.path().join("checkout.html"))
        .arg("--local")
        .arg(dir.path().join("shop.json"))
        .output()
        .unwrap();

    let json = stdout_json(output);
    let labels: Vec<&str> = json["commands"]
        .as_array()
        .unwrap()
        .iter()
        .map(|cmd| cmd["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Pay now",
            "SPRING24",
            "Debug: Toggle Info",
            "Debug: Copy SITEINFO Template"
        ]
    );
    assert_eq!(json["commands"][0]["description"], "Pay for the order");
    assert_eq!(json["commands"][0]["element"], "button#pay");
}

#[test]
fn run_demotes_click_and_copies_text() {
    let dir = fixture();
    let run = |query: &str| {
        palette(dir.path())
            .args(["--output", "json", "run", "--url", "https://shop.example/checkout"])
            .arg("--html")
            .arg(dir.path().join("checkout.html"))
            .arg("--local")
            .arg(dir.path().join("shop.json"))
            .args(["--query", query])
            .output()
            .unwrap()
    };

    let json = stdout_json(run("pay"));
    assert_eq!(json["trigger"], "opened");
    assert_eq!(json["executed"][0]["requested"], "click");
    assert_eq!(json["executed"][0]["effective"], "focus");
    assert!(json["effects"]
        .as_array()
        .unwrap()
        .iter()
        .all(|effect| effect["effect"] != "click"));

    let json = stdout_json(run("spring"));
    assert_eq!(json["clipboard"], "SPRING24");
}

#[test]
fn run_on_excluded_page_does_nothing() {
    let dir = fixture();
    fs::write(
        dir.path().join("config.yaml"),
        "excluded_urls: |\n  ^https://shop\\.example/\n",
    )
    .unwrap();

    let output = palette(dir.path())
        .args(["--output", "json", "run", "--url", "https://shop.example/checkout"])
        .arg("--html")
        .arg(dir.path().join("checkout.html"))
        .arg("--local")
        .arg(dir.path().join("shop.json"))
        .output()
        .unwrap();
    let json = stdout_json(output);
    assert_eq!(json["trigger"], "excluded");
    assert_eq!(json["executed"], Value::Array(Vec::new()));
}

#[test]
fn template_prints_escaped_entry() {
    let dir = fixture();
    let output = palette(dir.path())
        .args(["template", "https://a.example/x.html?q=1", "--title", "A"])
        .output()
        .unwrap();
    let json = stdout_json(output);
    assert_eq!(json[0]["name"], "A");
    assert_eq!(json[0]["url"], "^https://a\\.example/x\\.html");
    assert_eq!(json[0]["commands"], Value::Array(Vec::new()));
}

#[test]
fn match_merges_sources_and_reports_click_policy() {
    let dir = fixture();
    let output = palette(dir.path())
        .env("WEBPALETTE_ALLOWED_CLICK_URLS", "^https://shop")
        .args(["match", "https://shop.example/checkout", "--source"])
        .arg(dir.path().join("shop.json"))
        .arg("--source")
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Matched SITEINFO: Shop"));
    assert!(text.contains("Total SITEINFO loaded: 1"));
    assert!(text.contains("Click Allowed: true"));
}
