use crate::error::HpResult;
use crate::optimizer::{Algorithm, TrialResult};
use crate::stats::Outcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// One CSV row per trial. `success_flag` is empty until a threshold is locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub length: usize,
    pub algorithm: Algorithm,
    pub trial_id: usize,
    pub seed: u64,
    pub final_energy: i32,
    pub success_flag: Option<u8>,
    pub convergence_gen: usize,
    pub runtime_ms: f64,
    pub paradox_activity: usize,
}

impl TrialRecord {
    pub fn new(
        length: usize,
        algorithm: Algorithm,
        trial_id: usize,
        seed: u64,
        result: &TrialResult,
    ) -> Self {
        Self {
            length,
            algorithm,
            trial_id,
            seed,
            final_energy: result.final_energy,
            success_flag: None,
            convergence_gen: result.convergence_generation,
            runtime_ms: (result.computation_time_ms * 100.0).round() / 100.0,
            paradox_activity: result.retained_count,
        }
    }

    /// Success means reaching the locked threshold: `final_energy <= e_star`.
    pub fn lock_success(&mut self, e_star: f64) {
        self.success_flag = Some(u8::from(self.final_energy as f64 <= e_star));
    }

    pub fn is_success(&self) -> bool {
        self.success_flag == Some(1)
    }

    pub fn outcome(&self) -> Outcome {
        Outcome {
            energy: self.final_energy as f64,
            success: self.is_success(),
            runtime_ms: self.runtime_ms,
        }
    }
}

pub fn write_records<P: AsRef<Path>>(path: P, records: &[TrialRecord]) -> HpResult<()> {
    let file = File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_records<P: AsRef<Path>>(path: P) -> HpResult<Vec<TrialRecord>> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
