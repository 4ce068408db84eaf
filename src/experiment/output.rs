use super::{Analysis, Workspace};
use crate::config::ExperimentConfig;
use crate::error::HpResult;
use crate::stats::LengthSummary;
use serde::Serialize;
use std::fs::{self, File};
use std::path::PathBuf;

/// One row of `scaling_table.csv`. Rates and deltas are percentages.
#[derive(Debug, Clone, Serialize)]
struct ScalingRow {
    #[serde(rename = "L")]
    length: usize,
    mc_success_pct: f64,
    mc_ci_low_pct: f64,
    mc_ci_high_pct: f64,
    fe_success_pct: f64,
    fe_ci_low_pct: f64,
    fe_ci_high_pct: f64,
    delta_pp: f64,
    ratio: String,
    cohens_d: f64,
    mann_whitney_p: f64,
    mc_mean_energy: f64,
    fe_mean_energy: f64,
}

fn pct(x: f64) -> f64 {
    (x * 10_000.0).round() / 100.0
}

fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

impl From<&LengthSummary> for ScalingRow {
    fn from(s: &LengthSummary) -> Self {
        Self {
            length: s.length,
            mc_success_pct: pct(s.baseline.rate),
            mc_ci_low_pct: pct(s.baseline.ci_95.0),
            mc_ci_high_pct: pct(s.baseline.ci_95.1),
            fe_success_pct: pct(s.challenger.rate),
            fe_ci_low_pct: pct(s.challenger.ci_95.0),
            fe_ci_high_pct: pct(s.challenger.ci_95.1),
            delta_pp: pct(s.delta),
            ratio: match s.ratio {
                Some(r) => format!("{:.2}", r),
                None => "inf".to_string(),
            },
            cohens_d: round_to(s.cohens_d, 3),
            mann_whitney_p: s.mann_whitney_p,
            mc_mean_energy: round_to(s.baseline.mean_energy, 3),
            fe_mean_energy: round_to(s.challenger.mean_energy, 3),
        }
    }
}

#[derive(Serialize)]
struct StatsSummary<'a> {
    experiment_id: &'a str,
    phase: &'a str,
    per_length: &'a [LengthSummary],
    trend_test: &'a crate::stats::TrendResult,
    config: &'a ExperimentConfig,
}

/// Writes `scaling_table.csv` and `stats_summary.json` under the outputs
/// directory and returns their paths.
pub fn write_outputs(
    ws: &Workspace,
    analysis: &Analysis,
    config: &ExperimentConfig,
) -> HpResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(ws.outputs_dir())?;

    let table_path = ws.outputs_dir().join("scaling_table.csv");
    let mut wtr = csv::Writer::from_writer(File::create(&table_path)?);
    for summary in &analysis.per_length {
        wtr.serialize(ScalingRow::from(summary))?;
    }
    wtr.flush()?;

    let summary_path = ws.outputs_dir().join("stats_summary.json");
    let summary = StatsSummary {
        experiment_id: &config.study.experiment_id,
        phase: &analysis.phase,
        per_length: &analysis.per_length,
        trend_test: &analysis.trend,
        config,
    };
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    Ok((table_path, summary_path))
}
