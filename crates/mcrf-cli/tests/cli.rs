//! Integration tests for the `mcrf` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// depot -- c0 (3) -- c1 (4) -- c2 (5); capacity = 12 / 5
const PATH_TXT: &str = "4 1 3\n1\n0\n0 0\n1 0\n2 0\n3 0\n1 2 3\n2 3 4\n3 4 5\n";

// 3x3 coordinate grid, spacing 10
fn write_grid_tsp(path: &Path) {
    let mut content = String::from("NAME : grid9\nTYPE : TSP\nNODE_COORD_SECTION\n");
    for i in 0..9 {
        content.push_str(&format!("{} {} {}\n", i + 1, 10 * (i % 3), 10 * (i / 3)));
    }
    content.push_str("EOF\n");
    fs::write(path, content).unwrap();
}

fn mcrf() -> Command {
    Command::cargo_bin("mcrf").unwrap()
}

#[test]
fn test_help_lists_commands() {
    mcrf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_solve_two_step_prints_objective() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("path.txt");
    fs::write(&path, PATH_TXT).unwrap();
    mcrf()
        .args(["solve", path.to_str().unwrap(), "--method", "two-step"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path_1 two-step obj 0"));
}

#[test]
fn test_solve_hm_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("path.txt");
    fs::write(&path, PATH_TXT).unwrap();
    let output = mcrf()
        .args(["solve", path.to_str().unwrap(), "-m", "hm", "--json", "--utilization"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let objective = value["objective_value"].as_f64().unwrap();
    // nothing fits within 2.4 units, the relaxation still covers a fraction
    assert!((0.0..=1.0).contains(&objective));
    assert!(value["utilization"]["customers"].is_array());
}

#[test]
fn test_solve_without_depots_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grid9.tsp");
    write_grid_tsp(&path);
    mcrf()
        .args(["solve", path.to_str().unwrap(), "-m", "two-step"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no depots"));
}

#[test]
fn test_inspect_places_depots() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grid9.tsp");
    write_grid_tsp(&path);
    mcrf()
        .args(["inspect", path.to_str().unwrap(), "--depots", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grid9_1"))
        .stdout(predicate::str::contains("Depots        : 1"))
        .stdout(predicate::str::contains("Edges         : 36"));
}

#[test]
fn test_convert_then_preprocess() {
    let dir = tempdir().unwrap();
    let tsp = dir.path().join("grid9.tsp");
    write_grid_tsp(&tsp);
    let txt = dir.path().join("grid9.2.txt");
    mcrf()
        .args(["convert", tsp.to_str().unwrap(), txt.to_str().unwrap(), "--depots", "2"])
        .assert()
        .success();
    assert!(txt.exists());

    mcrf()
        .args(["preprocess", txt.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Preprocessing grid9_2"))
        .stdout(predicate::str::contains("Removed by Dijkstra"));
}

#[test]
fn test_batch_writes_json_lines() {
    let dir = tempdir().unwrap();
    let instances = dir.path().join("instances");
    fs::create_dir(&instances).unwrap();
    write_grid_tsp(&instances.join("grid9.tsp"));
    fs::write(instances.join("path.txt"), PATH_TXT).unwrap();
    fs::write(instances.join("notes.md"), "ignored").unwrap();

    let out = dir.path().join("results").join("two-step.jsonl");
    mcrf()
        .args([
            "batch",
            instances.to_str().unwrap(),
            "-m",
            "two-step",
            "--depots",
            "1,2",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 results"));

    let content = fs::read_to_string(&out).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    let names: Vec<&str> = records.iter().map(|r| r["instance"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["grid9_1", "grid9_2", "path_1"]);
    assert!(records.iter().all(|r| r["method"] == "two-step"));
    assert!(records.iter().all(|r| r["objective_value"].is_number()));
}

#[test]
fn test_config_file_sets_results_dir() {
    let dir = tempdir().unwrap();
    let instances = dir.path().join("instances");
    fs::create_dir(&instances).unwrap();
    fs::write(instances.join("path.txt"), PATH_TXT).unwrap();
    let results = dir.path().join("from-config");
    let config = dir.path().join("mcrf.toml");
    fs::write(
        &config,
        format!("[output]\nresults_dir = {:?}\n", results.to_str().unwrap()),
    )
    .unwrap();

    mcrf()
        .args([
            "batch",
            instances.to_str().unwrap(),
            "-m",
            "two-step",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(results.join("two-step.jsonl").exists());
}
