use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
}

impl TestContext {
    /// A study directory with a small config.json the binary picks up.
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("config.json"),
            r#"{
                "experiment_id": "CLI-SMOKE",
                "lengths": [6, 8, 10],
                "pilot_trials_per_algorithm": 3,
                "trials_per_algorithm": 4,
                "mc": { "max_steps": 150, "temperature": 1.0 },
                "fe": { "pop_size": 5, "forget_rate": 0.3, "max_gen": 6 }
            }"#,
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn results(&self) -> PathBuf {
        self.path().join("results")
    }
}

fn hpfold(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hpfold"))
        .args(args)
        .output()
        .expect("Failed to execute hpfold")
}

fn final_energy(stdout: &str) -> i32 {
    let re = Regex::new(r#""final_energy":\s*(-?\d+)"#).unwrap();
    let caps = re
        .captures(stdout)
        .unwrap_or_else(|| panic!("No final_energy in output:\n{}", stdout));
    caps[1].parse().unwrap()
}

#[test]
fn test_trial_prints_json() {
    let args = [
        "trial",
        "--algorithm",
        "MC",
        "--sequence",
        "HPHPPHHPHH",
        "--seed",
        "7",
        "--mc-max-steps",
        "500",
    ];
    let out = hpfold(&args);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["algorithm"], "MC");
    assert_eq!(json["sequence"], "HPHPPHHPHH");
    assert_eq!(json["convergence_generation"], 500);
    assert!(final_energy(&stdout) <= 0);

    // Same seed, same answer.
    let again = hpfold(&args);
    assert_eq!(
        final_energy(&stdout),
        final_energy(&String::from_utf8_lossy(&again.stdout))
    );
}

#[test]
fn test_trial_fe_reports_retention() {
    let out = hpfold(&[
        "trial",
        "--algorithm",
        "FE",
        "--sequence",
        "hhphphph",
        "--fe-pop-size",
        "10",
        "--fe-max-gen",
        "20",
    ]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["sequence"], "HHPHPHPH");
    assert_eq!(json["convergence_generation"], 20);
    assert!(json["retained_count"].is_u64());
}

#[test]
fn test_trial_rejects_bad_input() {
    let out = hpfold(&["trial", "--sequence", "HPXH"]);
    assert!(!out.status.success());

    let out = hpfold(&["trial", "--sequence", "HPPH", "--fe-pop-size", "0"]);
    assert!(!out.status.success());

    let out = hpfold(&["trial", "--algorithm", "SA", "--sequence", "HPPH"]);
    assert!(!out.status.success());
}

#[test]
fn test_pipeline_through_cli() {
    let ctx = TestContext::new();
    let wd = ctx.path().to_str().unwrap();

    let out = hpfold(&["pilot", "--workdir", wd]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(ctx.results().join("pilot_thresholds.json").exists());
    assert!(ctx.results().join("phase_A_L8.csv").exists());
    assert!(ctx.path().join("instances").join("sequence_L10.txt").exists());

    let out = hpfold(&["main", "--workdir", wd, "--length", "8"]);
    assert!(out.status.success());
    assert!(ctx.results().join("phase_B_L8.csv").exists());
    assert!(!ctx.results().join("phase_B_L6.csv").exists());

    let out = hpfold(&["main", "--workdir", wd]);
    assert!(out.status.success());

    let out = hpfold(&["analyze", "--workdir", wd, "--phase", "B"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let banner = Regex::new(r"SCALING ANALYSIS: CLI-SMOKE \(phase B\)").unwrap();
    assert!(banner.is_match(&stdout), "stdout: {}", stdout);

    let outputs = ctx.path().join("manuscript_outputs");
    assert!(outputs.join("scaling_table.csv").exists());
    assert!(outputs.join("stats_summary.json").exists());
}

#[test]
fn test_main_without_pilot_fails() {
    let ctx = TestContext::new();
    let out = hpfold(&["main", "--workdir", ctx.path().to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn test_cli_flag_overrides_config_file() {
    let ctx = TestContext::new();
    let wd = ctx.path().to_str().unwrap();

    let out = hpfold(&["pilot", "--workdir", wd, "--lengths", "6"]);
    assert!(out.status.success());
    assert!(ctx.results().join("phase_A_L6.csv").exists());
    assert!(!ctx.results().join("phase_A_L8.csv").exists());
}
