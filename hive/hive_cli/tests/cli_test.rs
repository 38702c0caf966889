use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DEMO: &str = r#"// demo services
{
    "Context": { "Port": 9001 },
    "Components": [
        { "Name": "logger", "Options": { "Level": "info", "Output": "" } },
        { "Name": "eventsystem", "UUID": "ev" },
        { "Name": "auth", "Refs": { "EventSystem": "ev", "HTTPServer": "http" } },
        { "Name": "users", "Refs": { "EventSystem": "ev", "HTTPServer": "http" } },
        { "Name": "httpserver", "UUID": "http", "Options": { "Addr": ":{{ .Port }}" } }
    ]
}
"#;

fn write(dir: &TempDir, name: &str, text: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

fn hive() -> Command {
    let mut cmd = Command::cargo_bin("hive").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version() {
    hive()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("hive_cli 0.1.0"));
}

#[test]
fn test_list() {
    hive()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("httpserver").and(predicate::str::contains("blockexit")));
}

#[test]
fn test_missing_config() {
    hive()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration given"));
}

#[test]
fn test_print_expands_templates() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "demo.json", DEMO);

    hive()
        .args(["-T", "-p", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Addr\": \":9001\""));

    hive()
        .args(["-p", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("{{ .Port }}"));
}

#[test]
fn test_print_as_toml() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "demo.json", DEMO);

    hive()
        .args(["-T", "-p", "-f", "toml", &path])
        .assert()
        .failure();

    let toml = "[[Components]]\nName = \"logger\"\n\n[[Components]]\nName = \"blockexit\"\n";
    let path = write(&dir, "demo.toml", toml);
    hive()
        .args(["-p", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("[[Components]]"));
}

#[test]
fn test_print_as_yaml() {
    let dir = TempDir::new().unwrap();
    let yaml = "Components:\n  - Name: logger\n    Options:\n      Level: debug\n  - Name: blockexit\n";
    let path = write(&dir, "demo.yaml", yaml);
    hive()
        .args(["-p", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Name: logger").and(predicate::str::contains("Level: debug")));

    hive()
        .args(["-p", "-f", "json", &write(&dir, "demo.json", r#"{ "Components": [{ "Name": "blockexit" }] }"#)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Name\": \"blockexit\""));
}

#[test]
fn test_validates_references() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "demo.json", DEMO);
    hive()
        .args(["-T", "-t", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration OK: 5 component(s)"));

    let broken = DEMO.replace("\"UUID\": \"http\"", "\"UUID\": \"web\"");
    let path = write(&dir, "broken.json", &broken);
    hive()
        .args(["-T", "-t", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("targets unknown UUID \"http\""));
}

#[test]
fn test_unknown_component() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "app.json", r#"{ "Components": [{ "Name": "mailer" }] }"#);
    hive()
        .args(["-t", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"mailer\" is not registered"));
}

#[test]
fn test_config_from_stdin() {
    hive()
        .args(["-t", "-"])
        .write_stdin(r#"{ "Components": [{ "Name": "eventsystem" }] }"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 component(s)"));
}

#[test]
fn test_run_without_blocking_component_exits() {
    let dir = TempDir::new().unwrap();
    let text = r#"{
        "Components": [
            { "Name": "eventsystem", "UUID": "ev" },
            { "Name": "httpserver", "UUID": "http", "Options": { "Addr": "127.0.0.1:0" } }
        ]
    }"#;
    let path = write(&dir, "app.json", text);
    hive().arg(&path).assert().success();
}

#[test]
fn test_start_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let text = r#"{ "Components": [{ "Name": "logger", "Options": { "Output": "syslog" } }] }"#;
    let path = write(&dir, "app.json", text);
    hive()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("init logger failed").and(predicate::str::contains("unsupported output")));
}

#[test]
fn test_shipped_configs_validate() {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs");
    hive()
        .args(["-T", "-t", &format!("{root}/demo.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 component(s)"));
    hive()
        .args(["-t", &format!("{root}/demo.toml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 component(s)"));
    hive()
        .args(["-t", &format!("{root}/demo.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 component(s)"));
}
