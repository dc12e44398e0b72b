use assert_cmd::Command;
use compass_connectome::ExperimentConfig;
use predicates::prelude::*;
use std::error::Error;
use tempfile::tempdir;

fn compass() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compass")?;
    cmd.env_remove("COMPASS_EXPERIMENT").env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn init_writes_default_experiment() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let path = tmp.path().join("experiment.toml");

    compass()?
        .args(["init", "--out"])
        .arg(&path)
        .assert()
        .success();
    let written = ExperimentConfig::load_from_file(&path)?;
    assert_eq!(written, ExperimentConfig::default());

    // refuses to overwrite without --force
    compass()?
        .args(["init", "--out"])
        .arg(&path)
        .assert()
        .failure();
    compass()?
        .args(["init", "--force", "--out"])
        .arg(&path)
        .assert()
        .success();
    Ok(())
}

#[test]
fn inspect_prints_topology() -> Result<(), Box<dyn Error>> {
    compass()?
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Clusters: 73"))
        .stdout(predicate::str::contains("PEN_EIP"))
        .stdout(predicate::str::contains("Override PEN_EIP"));
    Ok(())
}

#[test]
fn inspect_rejects_missing_experiment() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    compass()?
        .args(["inspect", "--config"])
        .arg(tmp.path().join("missing.toml"))
        .assert()
        .failure();
    Ok(())
}

#[test]
fn run_then_summary() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let config = tmp.path().join("experiment.toml");
    let archive = tmp.path().join("out").join("results.cspk");
    let traces = tmp.path().join("traces.json");

    let mut experiment = ExperimentConfig::default();
    experiment.cluster_size = 2;
    experiment.simulation.dt = 1e-4;
    experiment.simulation.end_time = 0.005;
    experiment.save_to_file(&config)?;

    compass()?
        .arg("--config")
        .arg(&config)
        .args(["run", "--no-progress", "--probe-voltage", "EIP5", "--out"])
        .arg(&archive)
        .arg("--traces")
        .arg(&traces)
        .assert()
        .success()
        .stdout(predicate::str::contains("50 steps"));
    assert!(archive.exists());

    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&traces)?)?;
    assert_eq!(document["times"].as_array().map(Vec::len), Some(50));
    assert_eq!(document["traces"]["V(EIP5)"].as_array().map(Vec::len), Some(50));

    compass()?
        .args(["summary", "--cluster", "EB-L1_input", "--input"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("EB-L1_input"))
        .stdout(predicate::str::contains("50 steps"));

    compass()?
        .args(["summary", "--json", "--input"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"steps\": 50"));
    Ok(())
}

#[test]
fn run_steps_override() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let archive = tmp.path().join("short.cspk");
    compass()?
        .args(["run", "--no-progress", "--no-compression", "--steps", "20", "--out"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("20 steps"));
    Ok(())
}

#[test]
fn summary_rejects_corrupt_archive() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let path = tmp.path().join("bad.cspk");
    std::fs::write(&path, b"not an archive at all, definitely not")?;
    compass()?
        .args(["summary", "--input"])
        .arg(&path)
        .assert()
        .failure();
    Ok(())
}
