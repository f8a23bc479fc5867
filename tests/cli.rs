//! CLI-driven integration tests. These touch `config::CONFIG` indirectly (it
//! parses real process argv), so they run the compiled binary end-to-end
//! instead of calling crate internals directly.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const PROBLEM: &str = "\
depot 0.0 0.0
Customers 3
number_drone 1
trucks_count 1
1.0 1.0 2.0 0 60.0 30.0
2.0 2.0 1.0 1 60.0 30.0
-1.0 1.0 1.5 0 60.0 30.0
";

const TRUCK_CONFIG: &str = r#"{
  "V_max (m/s)": 10.0,
  "M_t (kg)": 500.0,
  "T (hour)": [1.0]
}"#;

const DRONE_CONFIG: &str = r#"[
  {
    "speed_type": "high",
    "range_type": "high",
    "capacity [kg]": 5.0,
    "FixedTime (s)": 1200.0,
    "FixedDistance (m)": 5000.0,
    "Drone_speed (m/s)": 15.0
  }
]"#;

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let problem = dir.join("problem.txt");
    let truck_cfg = dir.join("truck.json");
    let drone_cfg = dir.join("drone.json");
    fs::write(&problem, PROBLEM).unwrap();
    fs::write(&truck_cfg, TRUCK_CONFIG).unwrap();
    fs::write(&drone_cfg, DRONE_CONFIG).unwrap();
    (problem, truck_cfg, drone_cfg)
}

#[test]
fn run_produces_a_feasible_pareto_front() {
    let dir = tempdir().unwrap();
    let (problem, truck_cfg, drone_cfg) = write_fixtures(dir.path());
    let outputs = dir.path().join("outputs");

    Command::cargo_bin("d2d-pareto-tabu")
        .unwrap()
        .args([
            "run",
            problem.to_str().unwrap(),
            "--truck-cfg",
            truck_cfg.to_str().unwrap(),
            "--drone-cfg",
            drone_cfg.to_str().unwrap(),
            "--iterations-count",
            "3",
            "--tabu-size",
            "5",
            "--max-propagation",
            "2",
            "--outputs",
            outputs.to_str().unwrap(),
            "--disable-logging",
        ])
        .assert()
        .success();

    let dump = fs::read_dir(&outputs)
        .unwrap()
        .filter_map(Result::ok)
        .find(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.ends_with(".json") && !name.contains("-config")
        })
        .expect("run JSON dump should exist");

    let contents = fs::read_to_string(dump.path()).unwrap();
    assert!(contents.contains("\"solutions\""));
}

#[test]
fn dry_run_skips_the_search() {
    let dir = tempdir().unwrap();
    let (problem, truck_cfg, drone_cfg) = write_fixtures(dir.path());
    let outputs = dir.path().join("outputs");

    Command::cargo_bin("d2d-pareto-tabu")
        .unwrap()
        .args([
            "run",
            problem.to_str().unwrap(),
            "--truck-cfg",
            truck_cfg.to_str().unwrap(),
            "--drone-cfg",
            drone_cfg.to_str().unwrap(),
            "--dry-run",
            "--outputs",
            outputs.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("dry run"));

    assert!(!outputs.join("placeholder").exists());
}

#[test]
fn evaluate_round_trips_a_dumped_solution() {
    let dir = tempdir().unwrap();
    let (problem, truck_cfg, drone_cfg) = write_fixtures(dir.path());
    let outputs = dir.path().join("outputs");

    Command::cargo_bin("d2d-pareto-tabu")
        .unwrap()
        .args([
            "run",
            problem.to_str().unwrap(),
            "--truck-cfg",
            truck_cfg.to_str().unwrap(),
            "--drone-cfg",
            drone_cfg.to_str().unwrap(),
            "--iterations-count",
            "2",
            "--tabu-size",
            "3",
            "--max-propagation",
            "2",
            "--outputs",
            outputs.to_str().unwrap(),
            "--disable-logging",
        ])
        .assert()
        .success();

    let config_dump = fs::read_dir(&outputs)
        .unwrap()
        .filter_map(Result::ok)
        .find(|entry| entry.file_name().to_string_lossy().contains("-config.json"))
        .expect("config JSON dump should exist");

    let run_dump = fs::read_dir(&outputs)
        .unwrap()
        .filter_map(Result::ok)
        .find(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.ends_with(".json") && !name.contains("-config")
        })
        .expect("run JSON dump should exist");

    let run_json: serde_json::Value = serde_json::from_str(&fs::read_to_string(run_dump.path()).unwrap()).unwrap();
    let first_solution = run_json["solutions"][0].clone();

    let solution_path = dir.path().join("solution.json");
    fs::write(&solution_path, serde_json::to_string(&first_solution).unwrap()).unwrap();

    Command::cargo_bin("d2d-pareto-tabu")
        .unwrap()
        .args(["evaluate", solution_path.to_str().unwrap(), config_dump.path().to_str().unwrap()])
        .assert()
        .success();
}
