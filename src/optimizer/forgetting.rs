use super::mutation::perturb_residue;
use super::{elapsed_ms, TrialResult};
use crate::config::FeParams;
use crate::error::HpResult;
use crate::lattice::{Conformation, Coord, HpLattice, Sequence};
use fastrand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Chance that a culled member is copied into the paradox buffer.
pub const PARADOX_RETENTION_RATE: f64 = 0.1;

/// Fixed-capacity arena of conformations.
///
/// `order` is the logical population list: `order[..live]` are the current
/// members, `order[live..]` are free slots whose contents are stale.
struct Population {
    members: Vec<Conformation>,
    order: Vec<usize>,
    live: usize,
}

impl Population {
    fn new(members: Vec<Conformation>) -> Self {
        let n = members.len();
        Self {
            members,
            order: (0..n).collect(),
            live: n,
        }
    }

    // Stable: ties keep their list order.
    fn sort_by_energy(&mut self) {
        let members = &self.members;
        self.order[..self.live].sort_by_key(|&i| members[i].energy);
    }

    fn get(&self, k: usize) -> &Conformation {
        &self.members[self.order[k]]
    }

    fn best(&self) -> &Conformation {
        let mut best = self.get(0);
        for k in 1..self.live {
            let c = self.get(k);
            if c.energy < best.energy {
                best = c;
            }
        }
        best
    }
}

/// Truncation-selection population search with a telemetry-only paradox buffer.
pub struct ForgettingEngine {
    pub lattice: Arc<HpLattice>,
    pub params: FeParams,
    pub rng: fastrand::Rng,
    pub best: Conformation,
    seed: u64,
    generation: usize,
    population: Population,
    paradox_buffer: Vec<Conformation>,
    scratch: Vec<Coord>,
}

impl ForgettingEngine {
    /// Seeds member `i` with `random_walk(seed + i)`.
    pub fn new(lattice: Arc<HpLattice>, params: FeParams, seed: u64) -> HpResult<Self> {
        params.validate()?;

        let members = (0..params.pop_size)
            .map(|i| lattice.random_walk(seed.wrapping_add(i as u64)))
            .collect::<HpResult<Vec<_>>>()?;
        let population = Population::new(members);
        let best = population.best().clone();
        let scratch = Vec::with_capacity(lattice.len());

        Ok(Self {
            lattice,
            params,
            rng: Rng::with_seed(seed),
            best,
            seed,
            generation: 0,
            population,
            paradox_buffer: Vec::new(),
            scratch,
        })
    }

    /// One generation: sort, cull the worst tail, sample culled members into
    /// the paradox buffer, refill to `pop_size`, update `best`.
    pub fn step_generation(&mut self) -> HpResult<()> {
        let pop_size = self.params.pop_size;
        let cutoff = self.params.retained_len().min(pop_size);

        self.population.sort_by_energy();

        for k in cutoff..pop_size {
            if self.rng.f64() < PARADOX_RETENTION_RATE {
                let culled = self.population.get(k).clone();
                self.paradox_buffer.push(culled);
            }
        }
        self.population.live = cutoff;

        while self.population.live < pop_size {
            let live = self.population.live;
            let slot = self.population.order[live];

            let mut regenerated = false;
            if live > 0 {
                let parent = self.population.order[self.rng.usize(0..live)];
                self.scratch
                    .clone_from(&self.population.members[parent].positions);

                if perturb_residue(&mut self.rng, &mut self.scratch)
                    && self.lattice.is_valid(&self.scratch)
                {
                    let energy = self.lattice.energy(&self.scratch);
                    let child = &mut self.population.members[slot];
                    child.positions.clone_from(&self.scratch);
                    child.energy = energy;
                    regenerated = true;
                }
            }

            if !regenerated {
                let walk_seed = self
                    .seed
                    .wrapping_add((self.generation * pop_size) as u64)
                    .wrapping_add(live as u64);
                self.population.members[slot] = self.lattice.random_walk(walk_seed)?;
            }

            self.population.live += 1;
        }

        let current_best = self.population.best();
        if current_best.energy < self.best.energy {
            self.best = current_best.clone();
        }

        self.generation += 1;
        Ok(())
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population_len(&self) -> usize {
        self.population.live
    }

    pub fn members(&self) -> impl Iterator<Item = &Conformation> {
        (0..self.population.live).map(move |k| self.population.get(k))
    }

    pub fn paradox_buffer(&self) -> &[Conformation] {
        &self.paradox_buffer
    }

    pub fn retained_count(&self) -> usize {
        self.paradox_buffer.len()
    }
}

/// One Forgetting Engine trial of `params.max_gen` generations.
pub fn forgetting_engine(sequence: &Sequence, params: FeParams, seed: u64) -> HpResult<TrialResult> {
    let lattice = Arc::new(HpLattice::new(sequence.clone()));
    let mut fe = ForgettingEngine::new(lattice, params, seed)?;

    let start = Instant::now();
    for _ in 0..params.max_gen {
        fe.step_generation()?;
    }
    let computation_time_ms = elapsed_ms(start);

    debug!(
        "FE L={} seed={} | best={} | retained {}",
        sequence.len(),
        seed,
        fe.best.energy,
        fe.retained_count()
    );

    Ok(TrialResult {
        final_energy: fe.best.energy,
        convergence_generation: params.max_gen,
        computation_time_ms,
        retained_count: fe.retained_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(forget_rate: f64) -> ForgettingEngine {
        let lattice = Arc::new(HpLattice::new(Sequence::parse("HPHHPPHPHH").unwrap()));
        let params = FeParams {
            pop_size: 12,
            forget_rate,
            max_gen: 10,
        };
        ForgettingEngine::new(lattice, params, 21).unwrap()
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let confs: Vec<Conformation> = [0, -1, 0, -1]
            .iter()
            .enumerate()
            .map(|(i, &e)| Conformation {
                positions: vec![[i as i32, 0, 0]],
                energy: e,
            })
            .collect();
        let mut pop = Population::new(confs);
        pop.sort_by_energy();
        assert_eq!(pop.order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_full_forgetting_regrows_from_fresh_walks() {
        let mut fe = engine(1.0);
        for _ in 0..3 {
            fe.step_generation().unwrap();
            assert_eq!(fe.population_len(), 12);
        }
    }

    #[test]
    fn test_zero_forgetting_retains_nothing() {
        let mut fe = engine(0.0);
        let before: Vec<i32> = fe.members().map(|c| c.energy).collect();
        fe.step_generation().unwrap();
        assert_eq!(fe.retained_count(), 0);
        let mut after: Vec<i32> = fe.members().map(|c| c.energy).collect();
        let mut sorted = before.clone();
        sorted.sort();
        after.sort();
        assert_eq!(after, sorted);
    }
}
