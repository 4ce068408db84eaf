use clap::Args;
use hpfold::config::ExperimentConfig;
use hpfold::error::HpResult;
use hpfold::experiment;
use hpfold::lattice::Sequence;
use hpfold::optimizer::{Algorithm, TrialResult};
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct TrialArgs {
    #[command(flatten)]
    pub config: ExperimentConfig,

    /// MC or FE
    #[arg(long, default_value = "FE")]
    pub algorithm: Algorithm,

    /// HP string, e.g. HPHPPHHPHH
    #[arg(long)]
    pub sequence: String,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Serialize)]
struct TrialReport<'a> {
    algorithm: Algorithm,
    sequence: &'a str,
    seed: u64,
    #[serde(flatten)]
    result: TrialResult,
}

pub fn run(args: &TrialArgs, config: &ExperimentConfig) -> HpResult<()> {
    let sequence = Sequence::parse(&args.sequence)?;
    let result = experiment::run_trial(args.algorithm, &sequence, args.seed, config)?;

    let text = sequence.to_string();
    let report = TrialReport {
        algorithm: args.algorithm,
        sequence: &text,
        seed: args.seed,
        result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
