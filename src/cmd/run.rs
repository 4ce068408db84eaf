use super::analyze;
use crate::reports;
use clap::Args;
use hpfold::config::ExperimentConfig;
use hpfold::error::HpResult;
use hpfold::experiment::{self, Phase, Workspace};
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ExperimentConfig,

    /// Only process this sequence length (must be one of --lengths)
    #[arg(long)]
    pub length: Option<usize>,
}

pub fn pilot(ws: &Workspace, config: &ExperimentConfig, length: Option<usize>) -> HpResult<()> {
    let lengths = experiment::select_lengths(config, length)?;
    let start = Instant::now();
    info!(
        "🔥 Phase A: {} pilot trials per algorithm over L={:?}",
        config.study.pilot_trials_per_algorithm, lengths
    );

    let thresholds = experiment::run_pilot(ws, config, &lengths)?;
    reports::print_thresholds(&thresholds);
    info!("Phase A finished in {:.2?}", start.elapsed());
    Ok(())
}

pub fn main_phase(ws: &Workspace, config: &ExperimentConfig, length: Option<usize>) -> HpResult<()> {
    let lengths = experiment::select_lengths(config, length)?;
    let start = Instant::now();
    info!(
        "🔥 Phase B: {} trials per algorithm over L={:?}",
        config.study.trials_per_algorithm, lengths
    );

    experiment::run_main(ws, config, &lengths)?;
    for &l in &lengths {
        info!("  -> {}", ws.csv_path(Phase::B, l).display());
    }
    info!("Phase B finished in {:.2?}", start.elapsed());
    Ok(())
}

pub fn all(ws: &Workspace, config: &ExperimentConfig, length: Option<usize>) -> HpResult<()> {
    pilot(ws, config, length)?;
    main_phase(ws, config, length)?;
    analyze::run(ws, config, Phase::B)
}
