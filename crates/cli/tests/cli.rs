//! Runs the `newsalpha` binary against temporary config and data directories.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn newsalpha(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_newsalpha"))
        .arg("--config-dir")
        .arg(config_dir)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run newsalpha")
}

fn configured(dir: &TempDir) -> std::path::PathBuf {
    let config_dir = dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("Config.toml"),
        format!("[storage]\ndata_dir = {:?}\n", dir.path().join("data").display().to_string()),
    )
    .unwrap();
    config_dir
}

#[test]
fn unparseable_config_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Config.toml"), "[storage\n").unwrap();

    let output = newsalpha(dir.path(), &["summary"]);
    assert!(!output.status.success());
}

#[test]
fn optimize_without_results_reports_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let config_dir = configured(&dir);

    let output = newsalpha(&config_dir, &["optimize", "--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No backtest results"), "{stdout}");
}

#[test]
fn adjust_prints_weighted_prediction() {
    let dir = TempDir::new().unwrap();
    let config_dir = configured(&dir);

    let output = newsalpha(
        &config_dir,
        &["adjust", "--symbol", "600519", "--direction", "up", "--source", "weekly_analysis"],
    );
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["adjusted_direction"], "up");
    assert!(json["should_trade"].is_boolean());
}

#[test]
fn summary_works_on_a_fresh_data_directory() {
    let dir = TempDir::new().unwrap();
    let config_dir = configured(&dir);

    let output = newsalpha(&config_dir, &["summary"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No backtest summary yet"));
}
