use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn cli_runs_sample_batch_and_writes_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("out").join("samples.csv");
    let json_path = dir.path().join("run.json");

    Command::cargo_bin("trajsim")
        .expect("trajsim bin")
        .args([
            "--data",
            "configs",
            "--flights",
            "configs/flights.yaml",
            "--simulation",
            "configs/simulation.yaml",
            "--threads",
            "2",
            "--csv",
            csv_path.to_str().unwrap(),
            "--json",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("total 3, ignored 1, valid 2"))
        .stdout(predicate::str::contains("ignored UAL9"))
        .stdout(predicate::str::contains("SWA1"))
        .stdout(predicate::str::contains("(landed)"));

    let mut reader = csv::Reader::from_path(&csv_path).expect("csv");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert!(rows.iter().any(|r| &r[0] == "SWA1"));
    assert!(rows.iter().any(|r| &r[0] == "AAL22"));
    assert!(rows.iter().all(|r| &r[0] != "UAL9"));

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(doc["metadata"]["status"], "ENDED");
    assert_eq!(doc["flights"].as_array().unwrap().len(), 2);
}

#[test]
fn cli_duration_limits_the_run() {
    Command::cargo_bin("trajsim")
        .expect("trajsim bin")
        .args([
            "--flights",
            "configs/flights.yaml",
            "--duration",
            "60",
            "--csv",
            "-",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("callsign,tick,time_s"))
        .stdout(predicate::str::contains("ORIGIN_GATE"))
        .stdout(predicate::str::contains("RAMP_ARRIVING").not());
}

#[test]
fn cli_reports_missing_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("trajsim")
        .expect("trajsim bin")
        .args([
            "--data",
            dir.path().to_str().unwrap(),
            "--flights",
            "configs/flights.yaml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading catalogs"));
}
