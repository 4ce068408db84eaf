use super::mutation::perturb_residue;
use super::{elapsed_ms, TrialResult};
use crate::config::McParams;
use crate::error::HpResult;
use crate::lattice::{Conformation, Coord, HpLattice, Sequence};
use fastrand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A single Metropolis trajectory over one lattice model.
pub struct MonteCarlo {
    pub lattice: Arc<HpLattice>,
    pub current: Conformation,
    pub best: Conformation,
    pub temperature: f64,
    pub rng: fastrand::Rng,

    // Reused proposal buffer
    proposal: Vec<Coord>,
}

impl MonteCarlo {
    /// Starts from `random_walk(seed)`; the acceptance stream is an
    /// independent RNG with the same seed.
    pub fn new(lattice: Arc<HpLattice>, temperature: f64, seed: u64) -> HpResult<Self> {
        let current = lattice.random_walk(seed)?;
        let best = current.clone();
        let proposal = Vec::with_capacity(current.len());

        Ok(Self {
            lattice,
            current,
            best,
            temperature,
            rng: Rng::with_seed(seed),
            proposal,
        })
    }

    /// Runs `steps` proposals. Self-colliding proposals are dropped but still
    /// count as a step. Returns `(accepted, steps)`.
    pub fn evolve(&mut self, steps: usize) -> (usize, usize) {
        let mut accepted = 0;

        for _ in 0..steps {
            self.proposal.clone_from(&self.current.positions);
            if !perturb_residue(&mut self.rng, &mut self.proposal) {
                continue;
            }
            if !self.lattice.is_valid(&self.proposal) {
                continue;
            }

            let new_energy = self.lattice.energy(&self.proposal);
            let delta_e = (new_energy - self.current.energy) as f64;

            // Metropolis Criterion
            if delta_e < 0.0 || self.rng.f64() < (-delta_e / self.temperature).exp() {
                std::mem::swap(&mut self.current.positions, &mut self.proposal);
                self.current.energy = new_energy;
                accepted += 1;

                if new_energy < self.best.energy {
                    self.best.positions.clone_from(&self.current.positions);
                    self.best.energy = new_energy;
                }
            }
        }
        (accepted, steps)
    }
}

/// One Monte Carlo trial: `max_steps` proposals at fixed temperature.
pub fn monte_carlo(sequence: &Sequence, params: McParams, seed: u64) -> HpResult<TrialResult> {
    params.validate()?;
    let lattice = Arc::new(HpLattice::new(sequence.clone()));
    let mut mc = MonteCarlo::new(lattice, params.temperature, seed)?;

    let start = Instant::now();
    let (accepted, steps) = mc.evolve(params.max_steps);
    let computation_time_ms = elapsed_ms(start);

    debug!(
        "MC L={} seed={} | best={} | accepted {}/{}",
        sequence.len(),
        seed,
        mc.best.energy,
        accepted,
        steps
    );

    Ok(TrialResult {
        final_energy: mc.best.energy,
        convergence_generation: params.max_steps,
        computation_time_ms,
        retained_count: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_never_worse_than_start() {
        let lattice = Arc::new(HpLattice::new(Sequence::parse("HPHPPHHPHH").unwrap()));
        let mut mc = MonteCarlo::new(lattice.clone(), 1.0, 3).unwrap();
        let start = mc.current.energy;
        mc.evolve(500);
        assert!(mc.best.energy <= start);
        assert!(mc.best.energy <= mc.current.energy);
        assert_eq!(lattice.energy(&mc.current.positions), mc.current.energy);
        assert_eq!(lattice.energy(&mc.best.positions), mc.best.energy);
    }

    #[test]
    fn test_accepted_states_stay_self_avoiding() {
        let lattice = Arc::new(HpLattice::new(Sequence::parse("HHHHHHHHHHHH").unwrap()));
        let mut mc = MonteCarlo::new(lattice.clone(), 2.0, 11).unwrap();
        for _ in 0..20 {
            mc.evolve(50);
            assert!(lattice.is_valid(&mc.current.positions));
        }
    }

    #[test]
    fn test_zero_temperature_rejected() {
        let seq = Sequence::parse("HPH").unwrap();
        let params = McParams {
            max_steps: 10,
            temperature: 0.0,
        };
        assert!(monte_carlo(&seq, params, 1).is_err());
    }
}
