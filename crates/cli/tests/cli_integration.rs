//! CLI integration tests for every subcommand.
//!
//! Uses `assert_cmd` to spawn the `civicnav` binary and verify exit
//! codes, stdout content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to `fixtures/` resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CATALOG: &str = "fixtures/uk_catalog.json";

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `civicnav` binary, rooted at workspace.
fn civicnav() -> Command {
    let mut cmd = cargo_bin_cmd!("civicnav");
    cmd.current_dir(workspace_root());
    cmd.env_remove("CIVICNAV_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write temp file");
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    civicnav()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Government service navigator"));
}

#[test]
fn version_exits_0() {
    civicnav()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("civicnav"));
}

// ──────────────────────────────────────────────
// 2. check
// ──────────────────────────────────────────────

#[test]
fn check_valid_catalog_text() {
    civicnav()
        .args(["check", CATALOG])
        .assert()
        .success()
        .stdout(predicate::str::contains("Catalog uk-services (version 2026.10): OK"))
        .stdout(predicate::str::contains("Services:    12 (1 gated, 3 proactive)"));
}

#[test]
fn check_valid_catalog_json() {
    let output = civicnav()
        .args(["--output", "json", "check", CATALOG])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["valid"], true);
    assert_eq!(json["services"], 12);
    assert_eq!(json["edges"], 7);
    assert_eq!(json["life_events"], 3);
}

#[test]
fn check_reports_every_defect() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "broken.json",
        r#"{
            "id": "broken",
            "services": [
                { "id": "a", "rules": [
                    { "kind": "dependency", "label": "needs ghost", "service": "ghost", "condition": "receiving" },
                    { "kind": "comparison", "label": "adult", "field": "age", "op": ">=", "value": 18 }
                ] }
            ],
            "edges": [ { "from": "a", "to": "nowhere", "kind": "REQUIRES" } ]
        }"#,
    );
    let output = civicnav()
        .args(["--output", "json", "check"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["valid"], false);
    let messages: Vec<String> = json["defects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["message"].as_str().unwrap().to_string())
        .collect();
    assert!(messages.iter().any(|m| m.contains("unknown service 'ghost'")));
    assert!(messages.iter().any(|m| m.contains("unknown fact 'age'")));
    assert!(messages.iter().any(|m| m.contains("unknown service 'nowhere'")));
}

#[test]
fn check_missing_file_fails() {
    civicnav()
        .args(["check", "fixtures/no_such_catalog.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read catalog"));
}

#[test]
fn check_without_catalog_fails() {
    civicnav()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no catalog given"));
}

// ──────────────────────────────────────────────
// 3. events
// ──────────────────────────────────────────────

#[test]
fn events_lists_life_events() {
    civicnav()
        .args(["events", CATALOG])
        .assert()
        .success()
        .stdout(predicate::str::contains("having-a-baby"))
        .stdout(predicate::str::contains("entry: gro-death-certificate"));
}

// ──────────────────────────────────────────────
// 4. evaluate
// ──────────────────────────────────────────────

#[test]
fn evaluate_empty_snapshot_text() {
    civicnav()
        .args(["evaluate", CATALOG, "--event", "having-a-baby", "--today", "2026-10-18"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Having a baby (2026-10-18)"))
        .stdout(predicate::str::contains("hmrc-child-benefit (after gro-register-birth)"))
        .stdout(predicate::str::contains("? What is your baby's date of birth?"))
        .stdout(predicate::str::contains("hmcts-divorce").not());
}

#[test]
fn evaluate_with_facts_and_statuses_json() {
    let dir = TempDir::new().unwrap();
    let facts = write(
        &dir,
        "facts.json",
        r#"{ "baby_born_on": "2026-10-08", "lives_in_uk": true, "employed": true }"#,
    );
    let statuses = write(
        &dir,
        "statuses.json",
        r#"{ "gro-register-birth": "completed", "dwp-universal-credit": "receiving" }"#,
    );
    let output = civicnav()
        .args(["--output", "json", "evaluate", CATALOG, "--event", "having-a-baby"])
        .args(["--today", "2026-10-18", "--facts"])
        .arg(&facts)
        .arg("--statuses")
        .arg(&statuses)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    let state = |id: &str| {
        json["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["service"] == id)
            .map(|n| n["state"].as_str().unwrap().to_string())
    };
    assert_eq!(state("gro-register-birth").as_deref(), Some("SATISFIED"));
    assert_eq!(state("hmrc-child-benefit").as_deref(), Some("ACTIONABLE"));
    assert_eq!(state("dwp-sure-start-grant").as_deref(), Some("ACTIONABLE"));
    assert_eq!(state("hmrc-tax-free-childcare").as_deref(), Some("HIDDEN_GATED"));
    assert_eq!(json["summary"]["actionable"], 2);
}

#[test]
fn evaluate_suggests_proactive_services() {
    let dir = TempDir::new().unwrap();
    let facts = write(&dir, "facts.json", r#"{ "age": 70, "lives_in_uk": true }"#);
    let output = civicnav()
        .args(["--output", "json", "evaluate", CATALOG, "--event", "having-a-baby"])
        .args(["--today", "2026-10-18", "--suggest", "--facts"])
        .arg(&facts)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["suggestions"][0]["service"], "dwp-pension-credit");
}

#[test]
fn evaluate_unknown_event_fails() {
    civicnav()
        .args(["evaluate", CATALOG, "--event", "moving-house", "--today", "2026-10-18"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown life event: moving-house"));
}

#[test]
fn evaluate_undeclared_fact_fails() {
    let dir = TempDir::new().unwrap();
    let facts = write(&dir, "facts.json", r#"{ "income": 1000 }"#);
    civicnav()
        .args(["evaluate", CATALOG, "--event", "having-a-baby", "--facts"])
        .arg(&facts)
        .assert()
        .failure()
        .stderr(predicate::str::contains("undeclared fact: income"));
}

#[test]
fn evaluate_bad_status_json_error() {
    let dir = TempDir::new().unwrap();
    let statuses = write(&dir, "statuses.json", r#"{ "hmrc-child-benefit": "claimed" }"#);
    let output = civicnav()
        .args(["--output", "json", "evaluate", CATALOG, "--event", "having-a-baby", "--statuses"])
        .arg(&statuses)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(err["error"].as_str().unwrap().contains("invalid status 'claimed'"));
}

#[test]
fn evaluate_bad_date_fails() {
    civicnav()
        .args(["evaluate", CATALOG, "--event", "having-a-baby", "--today", "18/10/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn quiet_suppresses_output() {
    civicnav()
        .args(["--quiet", "evaluate", CATALOG, "--event", "having-a-baby", "--today", "2026-10-18"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 5. Config file
// ──────────────────────────────────────────────

#[test]
fn config_supplies_catalog_event_and_date() {
    let dir = TempDir::new().unwrap();
    let catalog = workspace_root().join(CATALOG);
    let config = write(
        &dir,
        "civicnav.toml",
        &format!(
            "catalog = {:?}\nlife_event = \"bereavement\"\ntoday = \"2026-10-18\"\n",
            catalog.display().to_string()
        ),
    );
    civicnav()
        .arg("--config")
        .arg(&config)
        .arg("evaluate")
        .assert()
        .success()
        .stdout(predicate::str::contains("When someone dies (2026-10-18)"))
        .stdout(predicate::str::contains("hmcts-probate (after gro-death-certificate)"));
}

#[test]
fn flags_override_config() {
    let dir = TempDir::new().unwrap();
    let catalog = workspace_root().join(CATALOG);
    let config = write(
        &dir,
        "civicnav.toml",
        &format!(
            "catalog = {:?}\nlife_event = \"bereavement\"\n",
            catalog.display().to_string()
        ),
    );
    civicnav()
        .arg("--config")
        .arg(&config)
        .args(["evaluate", "--event", "separation", "--today", "2026-10-18"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Separating or divorcing"));
}

#[test]
fn malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "civicnav.toml", "catalog = [\n");
    civicnav()
        .arg("--config")
        .arg(&config)
        .args(["check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}
