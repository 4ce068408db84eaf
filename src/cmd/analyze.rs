use crate::reports;
use clap::Args;
use hpfold::config::ExperimentConfig;
use hpfold::error::HpResult;
use hpfold::experiment::{self, output, Phase, Workspace};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub config: ExperimentConfig,

    /// Which phase's CSV files to analyze (A or B)
    #[arg(long, default_value = "B")]
    pub phase: Phase,
}

pub fn run(ws: &Workspace, config: &ExperimentConfig, phase: Phase) -> HpResult<()> {
    println!("\n📊 === SCALING ANALYSIS: {} (phase {}) === 📊", config.study.experiment_id, phase);

    let analysis = experiment::analyze(ws, phase, &config.study.lengths)?;
    reports::print_scaling_report(&analysis.per_length);
    reports::print_trend_report(&analysis.trend);

    let (table, summary) = output::write_outputs(ws, &analysis, config)?;
    info!("💾 Wrote {}", table.display());
    info!("💾 Wrote {}", summary.display());
    Ok(())
}
