pub mod output;
pub mod records;
pub mod workspace;

pub use self::records::{read_records, write_records, TrialRecord};
pub use self::workspace::{sequence_seed, Phase, Thresholds, Workspace};

use crate::config::ExperimentConfig;
use crate::error::{HpError, HpResult};
use crate::lattice::Sequence;
use crate::optimizer::{forgetting_engine, monte_carlo, Algorithm, TrialResult};
use crate::stats::{self, LengthSummary, TrendResult, DEFAULT_PERMUTATIONS, PERMUTATION_SEED};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Offset of the Phase B seed block inside each length's seed range.
pub const MAIN_SEED_OFFSET: usize = 5000;

/// Deterministic trial seed: unique per (length, trial) while trial < 10000.
pub fn make_seed(length: usize, trial: usize) -> u64 {
    (length * 10_000 + trial) as u64
}

/// Runs a single trial of `algorithm` with the configured parameters.
pub fn run_trial(
    algorithm: Algorithm,
    sequence: &Sequence,
    seed: u64,
    config: &ExperimentConfig,
) -> HpResult<TrialResult> {
    match algorithm {
        Algorithm::MC => monte_carlo(sequence, config.mc, seed),
        Algorithm::FE => forgetting_engine(sequence, config.fe, seed),
    }
}

/// `trials` independent runs of one arm, in parallel, returned in trial order.
fn run_arm<F>(
    algorithm: Algorithm,
    sequence: &Sequence,
    config: &ExperimentConfig,
    trials: usize,
    seed_of: F,
) -> HpResult<Vec<TrialRecord>>
where
    F: Fn(usize) -> u64 + Sync,
{
    let length = sequence.len();
    let start = Instant::now();

    let records = (0..trials)
        .into_par_iter()
        .map(|trial_id| {
            let seed = seed_of(trial_id);
            let result = run_trial(algorithm, sequence, seed, config)?;
            Ok(TrialRecord::new(length, algorithm, trial_id, seed, &result))
        })
        .collect::<HpResult<Vec<_>>>()?;

    info!(
        "L={} {}: {} trials in {:.2?}",
        length,
        algorithm,
        trials,
        start.elapsed()
    );
    Ok(records)
}

/// Resolves the lengths to process: the configured ones, or just `only` if
/// it is one of them.
pub fn select_lengths(config: &ExperimentConfig, only: Option<usize>) -> HpResult<Vec<usize>> {
    match only {
        None => Ok(config.study.lengths.clone()),
        Some(l) if config.study.lengths.contains(&l) => Ok(vec![l]),
        Some(l) => Err(HpError::Config(format!(
            "Length {} is not part of the study {:?}",
            l, config.study.lengths
        ))),
    }
}

/// Phase A: runs the pilot trials and locks E*(L) = min(0, best pilot
/// energy) for every length that has no locked threshold yet.
pub fn run_pilot(ws: &Workspace, config: &ExperimentConfig, lengths: &[usize]) -> HpResult<Thresholds> {
    config.validate()?;
    ws.ensure_dirs()?;
    let mut thresholds = ws.load_thresholds()?;
    let trials = config.study.pilot_trials_per_algorithm;

    for &length in lengths {
        if let Some(e_star) = thresholds.get(&length) {
            info!("L={}: threshold already locked at {}, skipping pilot", length, e_star);
            continue;
        }
        info!("Phase A, L={} ({} trials per algorithm)", length, trials);
        let sequence = ws.sequence(length, config.study.h_probability)?;

        let mut records = run_arm(Algorithm::MC, &sequence, config, trials, |i| {
            make_seed(length, i)
        })?;
        records.extend(run_arm(Algorithm::FE, &sequence, config, trials, |i| {
            make_seed(length, trials + i)
        })?);

        let best = records.iter().map(|r| r.final_energy).min().unwrap_or(0);
        let e_star = best.min(0) as f64;

        write_records(ws.csv_path(Phase::A, length), &records)?;
        thresholds.insert(length, e_star);
        ws.save_thresholds(&thresholds)?;
        info!("L={}: locked E* = {}", length, e_star);
    }

    Ok(thresholds)
}

/// Phase B: runs the main trials and scores each against the locked E*(L).
pub fn run_main(ws: &Workspace, config: &ExperimentConfig, lengths: &[usize]) -> HpResult<()> {
    config.validate()?;
    ws.ensure_dirs()?;
    let thresholds = ws.load_thresholds()?;
    let trials = config.study.trials_per_algorithm;

    for &length in lengths {
        let e_star = *thresholds.get(&length).ok_or_else(|| {
            HpError::Config(format!(
                "No locked threshold for L={}; run the pilot phase first",
                length
            ))
        })?;
        info!("Phase B, L={} ({} trials per algorithm, E* = {})", length, trials, e_star);
        let sequence = ws.sequence(length, config.study.h_probability)?;

        let mut records = run_arm(Algorithm::MC, &sequence, config, trials, |i| {
            make_seed(length, MAIN_SEED_OFFSET + i)
        })?;
        records.extend(run_arm(Algorithm::FE, &sequence, config, trials, |i| {
            make_seed(length, MAIN_SEED_OFFSET + trials + i)
        })?);

        for rec in &mut records {
            rec.lock_success(e_star);
        }
        let successes = records.iter().filter(|r| r.is_success()).count();
        info!("L={}: {}/{} trials reached E*", length, successes, records.len());

        write_records(ws.csv_path(Phase::B, length), &records)?;
    }

    Ok(())
}

/// Per-length comparisons plus the scaling trend over the lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub phase: String,
    pub per_length: Vec<LengthSummary>,
    /// Fitted on Δ in percentage points.
    pub trend: TrendResult,
}

/// MC is the baseline, FE the challenger. Lengths without a results file
/// are skipped with a warning.
pub fn analyze(ws: &Workspace, phase: Phase, lengths: &[usize]) -> HpResult<Analysis> {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut per_length = Vec::with_capacity(sorted.len());
    for length in sorted {
        let path = ws.csv_path(phase, length);
        if !path.exists() {
            warn!("Missing {}; skipping L={}", path.display(), length);
            continue;
        }
        let records = read_records(&path)?;
        let outcomes_for = |alg: Algorithm| -> Vec<stats::Outcome> {
            records
                .iter()
                .filter(|r| r.algorithm == alg)
                .map(TrialRecord::outcome)
                .collect()
        };
        let baseline = outcomes_for(Algorithm::MC);
        let challenger = outcomes_for(Algorithm::FE);
        per_length.push(stats::summarize_length(length, &baseline, &challenger));
    }

    if per_length.is_empty() {
        return Err(HpError::Validation(format!(
            "No phase {} data found in {}",
            phase,
            ws.results_dir().display()
        )));
    }

    let xs: Vec<f64> = per_length.iter().map(|s| s.length as f64).collect();
    let deltas_pp: Vec<f64> = per_length.iter().map(|s| s.delta * 100.0).collect();
    let trend = stats::trend_test(&xs, &deltas_pp, DEFAULT_PERMUTATIONS, PERMUTATION_SEED);
    if !trend.sufficient_data {
        warn!("{}", trend.interpretation);
    }

    Ok(Analysis {
        phase: phase.to_string(),
        per_length,
        trend,
    })
}
