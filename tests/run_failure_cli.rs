/// End-to-end behavior of the binary when a reading cannot be fetched
///
/// Every outbound request is routed through a proxy on a closed loopback
/// port, so the first fetch (geocoding) fails immediately without touching
/// the network. The run must:
/// 1. Exit non-zero
/// 2. Report the failure exactly once, tagged with its source
/// 3. Leave the odds log untouched
///
/// Run with: cargo test --test run_failure_cli

use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const CLOSED_PROXY: &str = "http://127.0.0.1:9";

fn run_with_unreachable_network(dir: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_catfish_odds"))
        .current_dir(dir.path())
        .env_clear()
        .env("HTTPS_PROXY", CLOSED_PROXY)
        .env("https_proxy", CLOSED_PROXY)
        .env("HTTP_PROXY", CLOSED_PROXY)
        .env("http_proxy", CLOSED_PROXY)
        .env("ODDS_CONFIG", dir.path().join("missing.toml"))
        .env("LOG_FILE_PATH", dir.path().join("odds_log.json"))
        .env("REQUEST_TIMEOUT_SECS", "5")
        .env("LOG_LEVEL", "info")
        .output()
        .expect("binary should start")
}

fn diagnostic_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_fetch_failure_exits_non_zero_without_writing_log() {
    let dir = TempDir::new().unwrap();
    let output = run_with_unreachable_network(&dir);

    assert!(!output.status.success());
    assert!(!dir.path().join("odds_log.json").exists());
    assert!(!dir.path().join("odds_log.json.tmp").exists());
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
}

#[test]
fn test_fetch_failure_is_reported_once_with_its_source() {
    let dir = TempDir::new().unwrap();
    let output = run_with_unreachable_network(&dir);

    let lines = diagnostic_lines(&output);
    assert_eq!(lines.len(), 1, "expected one diagnostic line, got {:#?}", lines);
    assert!(lines[0].contains("GEO"), "line should name the source: {}", lines[0]);
    assert!(lines[0].contains("Geocode failed"), "line should name the operation: {}", lines[0]);
}
