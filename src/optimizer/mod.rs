pub mod forgetting;
pub mod monte_carlo;
pub mod mutation;

pub use self::forgetting::{forgetting_engine, ForgettingEngine, PARADOX_RETENTION_RATE};
pub use self::monte_carlo::{monte_carlo, MonteCarlo};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The two arms of the comparison.
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Algorithm {
    /// Single-trajectory Metropolis Monte Carlo.
    MC,
    /// Forgetting Engine population search.
    FE,
}

/// Outcome of one optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Lowest energy seen during the run (more negative is better).
    pub final_energy: i32,
    /// Steps (MC) or generations (FE) executed.
    pub convergence_generation: usize,
    /// Wall clock of the search loop; reporting only.
    pub computation_time_ms: f64,
    /// Culled states sampled into the paradox buffer (always 0 for MC).
    pub retained_count: usize,
}

#[inline(always)]
pub(crate) fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
