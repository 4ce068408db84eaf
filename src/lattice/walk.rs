use super::{step, Conformation, Coord, HpLattice, MOVES};
use crate::error::{HpError, HpResult};
use fastrand::Rng;
use fnv::FnvHashSet;
use tracing::{debug, warn};

/// Candidate steps tried before a partial walk is abandoned.
pub const MAX_STEP_ATTEMPTS: usize = 100;

/// Full restarts (seed, seed+1, ...) before construction gives up.
pub const MAX_WALK_RESTARTS: usize = 1000;

impl HpLattice {
    /// Grows a self-avoiding walk from the origin.
    ///
    /// A walk that gets stuck is thrown away and rebuilt from scratch with the
    /// next seed; it is never resumed. Fails with `ConstructionFailed` once
    /// `MAX_WALK_RESTARTS` restarts have been spent.
    pub fn random_walk(&self, seed: u64) -> HpResult<Conformation> {
        self.random_walk_with(seed, MAX_STEP_ATTEMPTS, MAX_WALK_RESTARTS)
    }

    pub(crate) fn random_walk_with(
        &self,
        seed: u64,
        max_attempts: usize,
        max_restarts: usize,
    ) -> HpResult<Conformation> {
        let length = self.len();
        let mut positions = Vec::with_capacity(length);
        let mut occupied = FnvHashSet::with_capacity_and_hasher(length, Default::default());

        for restart in 0..=max_restarts {
            let attempt_seed = seed.wrapping_add(restart as u64);
            if try_grow(length, attempt_seed, max_attempts, &mut positions, &mut occupied) {
                if restart > 0 {
                    debug!(
                        "Walk for L={} needed {} restart(s) (seed {} -> {})",
                        length, restart, seed, attempt_seed
                    );
                }
                return Ok(self.conformation(positions));
            }
        }

        warn!(
            "Giving up on L={} walk from seed {} after {} restarts",
            length, seed, max_restarts
        );
        Err(HpError::ConstructionFailed {
            length,
            restarts: max_restarts,
        })
    }
}

fn try_grow(
    length: usize,
    seed: u64,
    max_attempts: usize,
    positions: &mut Vec<Coord>,
    occupied: &mut FnvHashSet<Coord>,
) -> bool {
    let mut rng = Rng::with_seed(seed);
    positions.clear();
    occupied.clear();

    if length == 0 {
        return true;
    }

    let origin = [0, 0, 0];
    positions.push(origin);
    occupied.insert(origin);

    for _ in 1..length {
        let tail = positions[positions.len() - 1];
        let mut placed = false;
        for _ in 0..max_attempts {
            let candidate = step(tail, MOVES[rng.usize(0..MOVES.len())]);
            if occupied.insert(candidate) {
                positions.push(candidate);
                placed = true;
                break;
            }
        }
        if !placed {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Sequence;

    #[test]
    fn test_try_grow_is_reproducible() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        let mut occ = FnvHashSet::default();
        assert!(try_grow(15, 99, MAX_STEP_ATTEMPTS, &mut a, &mut occ));
        assert!(try_grow(15, 99, MAX_STEP_ATTEMPTS, &mut b, &mut occ));
        assert_eq!(a, b);
        assert_eq!(a[0], [0, 0, 0]);
    }

    #[test]
    fn test_single_residue_walk() {
        let model = HpLattice::new(Sequence::parse("H").unwrap());
        let conf = model.random_walk(1).unwrap();
        assert_eq!(conf.positions, vec![[0, 0, 0]]);
        assert_eq!(conf.energy, 0);
    }

    #[test]
    fn test_exhausted_budget_gives_up() {
        let model = HpLattice::new(Sequence::parse("HPHPH").unwrap());
        // No candidate steps at all: every attempt stalls at the second residue.
        let err = model.random_walk_with(11, 0, 3).unwrap_err();
        assert!(matches!(
            err,
            HpError::ConstructionFailed {
                length: 5,
                restarts: 3
            }
        ));
    }

    #[test]
    fn test_default_budget_reports_restart_cap() {
        let model = HpLattice::new(Sequence::parse("HH").unwrap());
        let err = model.random_walk_with(0, 0, MAX_WALK_RESTARTS).unwrap_err();
        assert!(matches!(
            err,
            HpError::ConstructionFailed {
                length: 2,
                restarts: MAX_WALK_RESTARTS
            }
        ));
    }

    #[test]
    fn test_restart_rebuilds_from_next_seed() {
        // One try per step makes a 12-residue walk stall often enough that
        // some seed in the scan needs at least one restart.
        const LENGTH: usize = 12;
        let model = HpLattice::new(Sequence::parse(&"HP".repeat(LENGTH / 2)).unwrap());
        let mut occ = FnvHashSet::default();
        let mut scratch = Vec::new();

        let (seed, restarts) = (0..500u64)
            .find_map(|seed| {
                if try_grow(LENGTH, seed, 1, &mut scratch, &mut occ) {
                    return None;
                }
                (1..=200u64)
                    .find(|k| try_grow(LENGTH, seed + k, 1, &mut scratch, &mut occ))
                    .map(|k| (seed, k))
            })
            .expect("no seed needed a restart");
        assert!(restarts > 0);

        let mut expected = Vec::new();
        assert!(try_grow(LENGTH, seed + restarts, 1, &mut expected, &mut occ));

        let conf = model.random_walk_with(seed, 1, 200).unwrap();
        assert_eq!(conf.positions, expected);
        assert!(model.is_valid(&conf.positions));
        assert_eq!(conf.energy, model.energy(&conf.positions));
    }
}
