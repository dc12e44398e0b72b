use compass_connectome::{build_heading_network, Atlas, DataWarning, ExperimentConfig};
use compass_runtime::{run_fixed, Probe, RecordingParams};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// 20 ms at 0.1 ms steps with the default landmark cue
fn short_experiment() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.cluster_size = 4;
    config.simulation.end_time = 0.02;
    config.simulation.dt = 1e-4;
    config
}

#[test]
fn test_landmark_drives_covering_eips() {
    init_logging();
    let (net, _) = build_heading_network(&short_experiment(), &Atlas::su_2017()).unwrap();
    let recording = RecordingParams::default()
        .with_stride(10)
        .with_probe(Probe::mean_voltage("EIP5"));
    let result = run_fixed(net, recording).unwrap();

    assert_eq!(result.steps_executed, 200);
    assert_eq!(result.spikes_for("EB-L1_input").unwrap()[0], 0);
    for eip in ["EIP4", "EIP5", "EIP13"] {
        assert!(result.spike_count(eip).unwrap() > 0, "{} never fired", eip);
    }
    // uncued landmarks stay silent
    assert!(result.spikes_for("EB-R4_input").unwrap().is_empty());

    let voltage = result.trace(&Probe::mean_voltage("EIP5")).unwrap();
    assert_eq!(voltage.len(), 20);
    assert!(voltage.iter().all(|v| v.is_finite()));
}

#[test]
fn test_build_is_deterministic() {
    let config = short_experiment();
    let atlas = Atlas::su_2017();
    let run = || {
        let (net, _) = build_heading_network(&config, &atlas).unwrap();
        run_fixed(net, RecordingParams::default()).unwrap().firing
    };
    assert_eq!(run(), run());
}

#[test]
fn test_config_file_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experiments").join("landmark.toml");
    short_experiment().save_to_file(&path).unwrap();

    let loaded = ExperimentConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, short_experiment());
    let (net, report) = build_heading_network(&loaded, &Atlas::su_2017()).unwrap();
    assert_eq!(net.cluster_count(), 73);
    for warning in &report.warnings {
        match warning {
            DataWarning::ZeroOverlap { table, .. } => assert!(table.ends_with("_EIP")),
        }
    }
}

#[test]
fn test_removing_overrides_changes_edge_conductance() {
    let mut config = short_experiment();
    config.overrides = compass_connectome::OverlapOverrides::none();
    let (net, report) = build_heading_network(&config, &Atlas::su_2017()).unwrap();
    assert!(report.overrides.is_empty());
    assert_eq!(net.synapse("PEN7", "EIP0").unwrap().max_conductance(), 6.0);
}
