//! Basic CLI E2E tests.
//!
//! Tests invoke the CLI binary against a throwaway data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with `home` as the data directory.
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_lorekeeper-cli"))
        .env("LOREKEEPER_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {:?}\n{}", args, stderr);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_node_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let added = run_json(
        home.path(),
        &["node", "add", "--layer", "era", "era-1", "--start", "2020-01-01", "--end", "2020-12-31"],
    );
    assert_eq!(added["id"], "era-1");
    assert_eq!(added["layer"], "era");

    let listed = run_json(home.path(), &["node", "list"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn test_unknown_layer_is_reported_as_such() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["node", "add", "--layer", "galaxy", "g", "--start", "2020-01-01"],
    );
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Unknown timeline layer: 'galaxy'"), "stderr: {stderr}");
    assert!(!stderr.contains("Data fetch failed"), "stderr: {stderr}");
}

#[test]
fn test_node_add_rejects_bad_dates() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["node", "add", "--layer", "arc", "a", "--start", "someday"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "stderr: {stderr}");

    let (code, _, _) = run_cli(
        home.path(),
        &["node", "add", "--layer", "arc", "a", "--start", "2021-05-01", "--end", "2021-01-01"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_insight_show_reports_gaps() {
    let home = tempfile::tempdir().unwrap();
    run_json(
        home.path(),
        &["node", "add", "--layer", "era", "era-1", "--start", "2020-01-01", "--end", "2020-12-31"],
    );
    run_json(
        home.path(),
        &[
            "node", "add", "--layer", "saga", "saga-1", "--start", "2020-03-01", "--end",
            "2020-06-01", "--parent", "era-1",
        ],
    );

    let insight = run_json(home.path(), &["insight", "show", "--layer", "era", "era-1"]);
    let gaps = insight["hierarchyGaps"].as_array().unwrap();
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0]["size"], "medium");
    assert_eq!(gaps[1]["size"], "long");
    assert_eq!(insight["parallels"]["implicit"], serde_json::json!([]));
}

#[test]
fn test_insight_chat_counts_parallels() {
    let home = tempfile::tempdir().unwrap();
    run_json(
        home.path(),
        &["node", "add", "--layer", "arc", "A", "--start", "2021-01-01", "--end", "2021-06-01"],
    );
    run_json(
        home.path(),
        &["node", "add", "--layer", "arc", "B", "--start", "2021-05-01", "--end", "2021-09-01"],
    );
    run_json(
        home.path(),
        &["relation", "add", "--from-layer", "arc", "--from", "B", "--to-layer", "arc", "--to", "A"],
    );

    let chat = run_json(home.path(), &["insight", "chat", "--layer", "arc", "A"]);
    assert_eq!(chat["parallelSummary"]["explicitCount"], 1);
    assert_eq!(chat["parallelSummary"]["implicitCount"], 1);
}

#[test]
fn test_insight_for_missing_node_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["insight", "show", "--layer", "saga", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("node not found"), "stderr: {stderr}");
}

#[test]
fn test_config_get_and_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "insight.timeout_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2000");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "insight.timeout_ms", "500"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "insight.timeout_ms"]);
    assert_eq!(stdout.trim(), "500");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "insight.unknown", "1"]);
    assert_ne!(code, 0);
}
