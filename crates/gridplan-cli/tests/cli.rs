//! Integration tests for the `gridplan` binary

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const NETWORK: &str = r#"{
  "nodes": [
    { "code": "ELNY", "demand": 0.0, "unserved_cost": 1000.0 },
    { "code": "ELPA", "demand": 10.0, "unserved_cost": 1000.0 }
  ],
  "arcs": [
    { "from": "XXNY", "to": "ELNY", "op_cost": 5.0, "op_max": 0.0,
      "inv_cost": 100.0, "metrics": { "CO2": 0.5 } },
    { "from": "ELNY", "to": "ELPA", "op_cost": 1.0, "op_max": 0.0, "inv_cost": 50.0 },
    { "from": "ELPA", "to": "ELNY", "op_cost": 1.0, "op_max": 0.0, "inv_cost": 50.0 }
  ]
}"#;

const CONFIG: &str = r#"
use_benders = true
metrics = ["CO2"]

[horizon]
levels = [{ name = "Y", length = 2 }, { name = "B", length = 1 }]
step_hours = [1.0]
"#;

fn write_inputs(dir: &Path) {
    std::fs::write(dir.join("network.json"), NETWORK).unwrap();
    std::fs::write(dir.join("plan.toml"), CONFIG).unwrap();
}

fn objectives(path: &Path) -> Vec<f64> {
    let text = std::fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Cost/CO2"));
    lines.map(|l| l.parse().unwrap()).collect()
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("gridplan");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("post"));
}

#[test]
fn test_build_writes_model_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let models = dir.path().join("models");

    let mut cmd = cargo_bin_cmd!("gridplan");
    cmd.current_dir(dir.path())
        .args(["build", "--network", "network.json", "--config", "plan.toml", "--out", "models"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 years"));

    for file in ["plan.mps", "bend_0.mps", "bend_1.mps", "bend_2.mps", "idx_cap.csv", "bend_events.json"] {
        assert!(models.join(file).exists(), "{file} missing");
    }
}

#[test]
fn test_solve_writes_results_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args(["solve", "--network", "network.json", "--config", "plan.toml", "--out", "out"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["termination"], "converged");
    assert_eq!(summary["converged"], true);
    let cost = summary["objectives"][0].as_f64().unwrap();
    assert!((cost - 1620.0).abs() < 1620.0 * 5e-3, "cost {cost}");

    let out = dir.path().join("out");
    let header = std::fs::read_to_string(out.join("post_arc_cap.csv")).unwrap();
    assert!(header.starts_with("% Capacity\n"));
    for file in ["post_arc_inv.csv", "post_emissions.csv", "post_arc_flow.csv", "post_node_ud.csv"] {
        assert!(out.join(file).exists(), "{file} missing");
    }
    assert!(!out.join("post_node_rm.csv").exists());
    let goals = objectives(&out.join("FinalObjectives.csv"));
    assert_eq!(goals.len(), 2);
    assert!((goals[1] - 10.0).abs() < 0.05);
}

#[test]
fn test_post_solves_saved_models() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args(["build", "--network", "network.json", "--config", "plan.toml", "--out", "models"])
        .assert()
        .success();
    cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args(["post", "--dir", "models", "--config", "plan.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"termination\": \"converged\""));

    let goals = objectives(&dir.path().join("models").join("FinalObjectives.csv"));
    assert!((goals[0] - 1620.0).abs() < 1620.0 * 5e-3);
}

#[test]
fn test_iteration_limit_exits_with_status_two() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let limited = format!("{}\n[decomposition]\nmax_iterations = 1\n", CONFIG);
    std::fs::write(dir.path().join("plan.toml"), limited).unwrap();

    let output = cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args(["solve", "--network", "network.json", "--config", "plan.toml", "--out", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["converged"], false);
    assert_eq!(summary["termination"], "iteration_limit");
    assert!(dir.path().join("out").join("FinalObjectives.csv").exists());
}

#[test]
fn test_min_investment_length_mismatch_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    std::fs::write(dir.path().join("min.csv"), "1.0\n").unwrap();

    cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args([
            "solve",
            "--network",
            "network.json",
            "--config",
            "plan.toml",
            "--min-investment",
            "min.csv",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimum investments"));
}

#[test]
fn test_unknown_config_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    std::fs::write(dir.path().join("plan.yaml"), CONFIG).unwrap();

    cargo_bin_cmd!("gridplan")
        .current_dir(dir.path())
        .args(["build", "--network", "network.json", "--config", "plan.yaml", "--out", "models"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}
