//! End-to-end sweep tests against the structured mock

use rcm_anneal::qubo::{load_coo, Vartype};
use rcm_anneal::sampler::{Sampler, StructuredMock};
use rcm_anneal::search::{EmbeddingOracle, GreedyChainOracle, SearchParams};
use rcm_anneal::sweep::*;
use rcm_anneal::topology::SolverProfile;
use std::path::Path;

const PROBLEM: &str = "\
# vartype=BINARY
0 0 -1.0
1 1 -1.0
2 2 -1.0
3 3 -1.0
0 1 2.0
1 2 2.0
2 3 2.0
0 3 2.0
0 2 0.5
";

fn mock() -> StructuredMock {
    let profile = SolverProfile::resolve("chimera_4").unwrap();
    StructuredMock::new(profile.name.clone(), profile.topology().unwrap()).with_seed(17)
}

/// Problem, embedding and configuration inside `dir`
fn setup(dir: &Path, sampler: &StructuredMock) -> ExperimentConfig {
    let input_file = dir.join("problem.coo");
    std::fs::write(&input_file, PROBLEM).unwrap();

    let bqm = load_coo(&input_file, Vartype::Binary).unwrap();
    let params = SearchParams {
        tries: 4,
        threads: 1,
        seed: Some(5),
    };
    let embedding = GreedyChainOracle::new()
        .find_embedding(&bqm.interaction_graph(), sampler.adjacency(), &params)
        .unwrap();
    let embedding_file = dir.join("embedding.json");
    embedding.to_file(&embedding_file).unwrap();

    ExperimentConfig {
        solver_name: "chimera_4".to_string(),
        input_file,
        embedding_file,
        output_dir: dir.join("experiment"),
        chain_strength_scales: vec![0.5, 1.0],
        annealing_times: vec![10],
        batch_size: 100,
        num_batches: 2,
    }
}

fn runner(config: &ExperimentConfig) -> ExperimentRunner {
    ExperimentRunner::new(config.clone()).unwrap().with_progress(false)
}

#[test]
fn test_full_sweep_writes_one_csv_per_point() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = mock();
    let config = setup(dir.path(), &sampler);

    let summary = runner(&config).run(&mut sampler).unwrap();

    assert_eq!(summary.points, 2);
    assert_eq!(summary.batches_sampled, 4);
    assert_eq!(sampler.calls(), 4);

    let results = config.output_dir.join("outputs");
    assert_eq!(
        summary.outputs,
        vec![
            results.join("output_at_10_css_0.5.csv"),
            results.join("output_at_10_css_1.0.csv"),
        ]
    );

    for path in &summary.outputs {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            header,
            vec!["0", "1", "2", "3", "energy", "num_occurrences", "chain_break_fraction"]
        );
        assert_eq!(reader.records().count(), 200);
    }

    let raw = config.output_dir.join("raw_outputs");
    for css in ["0.5", "1.0"] {
        for batch in 0..2 {
            let name = format!("output_raw_part_{}_at_10_css_{}.json", batch, css);
            assert!(raw.join(name).exists());
        }
    }
}

#[test]
fn test_rerun_loads_everything_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = mock();
    let config = setup(dir.path(), &sampler);

    let first = runner(&config).run(&mut sampler).unwrap();
    let before: Vec<Vec<u8>> = first.outputs.iter().map(|p| std::fs::read(p).unwrap()).collect();

    let mut fresh = mock();
    let second = runner(&config).run(&mut fresh).unwrap();
    let after: Vec<Vec<u8>> = second.outputs.iter().map(|p| std::fs::read(p).unwrap()).collect();

    assert_eq!(fresh.calls(), 0);
    assert_eq!(second.batches_sampled, 0);
    assert_eq!(second.batches_loaded, 4);
    assert_eq!(before, after);
}

#[test]
fn test_missing_batch_is_resampled_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = mock();
    let config = setup(dir.path(), &sampler);
    runner(&config).run(&mut sampler).unwrap();

    let raw = config.output_dir.join("raw_outputs");
    std::fs::remove_file(raw.join("output_raw_part_1_at_10_css_1.0.json")).unwrap();
    std::fs::write(raw.join("output_raw_part_0_at_10_css_0.5.json"), "not json").unwrap();

    let mut fresh = mock();
    let summary = runner(&config).run(&mut fresh).unwrap();
    assert_eq!(fresh.calls(), 2);
    assert_eq!(summary.batches_sampled, 2);
    assert_eq!(summary.batches_loaded, 2);
}

#[test]
fn test_unreadable_cache_entry_stops_the_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = mock();
    let config = setup(dir.path(), &sampler);

    let raw = config.output_dir.join("raw_outputs");
    std::fs::create_dir_all(raw.join("output_raw_part_0_at_10_css_0.5.json")).unwrap();

    assert!(runner(&config).run(&mut sampler).is_err());
    assert_eq!(sampler.calls(), 0);
}

#[test]
fn test_existing_output_directory_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = mock();
    let config = setup(dir.path(), &sampler);
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let summary = runner(&config).run(&mut sampler).unwrap();
    assert_eq!(summary.outputs.len(), 2);
}

#[test]
fn test_run_experiment_with_mock_solver() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), &mock());
    let config_file = dir.path().join("experiment.yaml");
    config.to_file(&config_file).unwrap();

    let loaded = ExperimentConfig::from_file(&config_file).unwrap();
    let summary = run_experiment(loaded, true).unwrap();
    assert_eq!(summary.points, 2);
    assert!(summary.outputs.iter().all(|p| p.exists()));
}

#[test]
fn test_unknown_solver_fails_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path(), &mock());
    config.solver_name = "no_such_solver".to_string();

    assert!(run_experiment(config.clone(), true).is_err());
    assert!(!config.output_dir.exists());
}
