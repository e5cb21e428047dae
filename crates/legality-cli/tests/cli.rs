use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use legality_sampler::table::{read_material_table, read_observation_table, read_rows};

fn legality(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_legality"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to spawn legality")
}

#[test]
fn test_missing_input_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = legality(&["sample", "--input", "absent.jsonl"], dir.path());

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("absent.jsonl"), "stderr: {stderr}");
}

#[test]
fn test_missing_material_table_fails_analyze() {
    let dir = tempfile::tempdir().unwrap();
    let out = legality(&["analyze", "--material-file", "absent.jsonl"], dir.path());
    assert!(!out.status.success());
}

#[test]
fn test_enumerate_sample_merge_analyze() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path();
    fs::write(
        cwd.join("sampling.toml"),
        "initial_sizes = [50, 100]\nmax_sample = 400\nrel_std_threshold = 0.5\n",
    )
    .unwrap();

    let out = legality(
        &["enumerate", "--output", "classes.jsonl", "--limits", "K1Q1", "--max-classes", "3"],
        cwd,
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let classes = read_material_table(cwd.join("classes.jsonl")).unwrap();
    assert_eq!(classes.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    let out = legality(
        &[
            "sample",
            "--input",
            "classes.jsonl",
            "--output",
            "results.jsonl",
            "--work-dir",
            "parts",
            "--shards",
            "2",
            "--workers",
            "2",
            "--seed",
            "5",
            "--config",
            "sampling.toml",
        ],
        cwd,
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let results = read_observation_table(cwd.join("results.jsonl")).unwrap();
    assert!(results.len() >= 6);
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.legal_ratio)));
    assert!(cwd.join("parts/legality_0.jsonl").exists());
    assert!(cwd.join("parts/legality_1.jsonl").exists());

    let out = legality(
        &["merge", "--input-dir", "parts", "--output", "merged.jsonl"],
        cwd,
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(read_observation_table(cwd.join("merged.jsonl")).unwrap(), results);

    let out = legality(
        &[
            "analyze",
            "--material-file",
            "classes.jsonl",
            "--results-file",
            "merged.jsonl",
            "--output",
            "analysis.jsonl",
        ],
        cwd,
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let rows: Vec<serde_json::Value> = read_rows(cwd.join("analysis.jsonl")).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["best_sample_size"].as_u64() >= Some(100)));
    assert!(!out.stdout.is_empty());
}
