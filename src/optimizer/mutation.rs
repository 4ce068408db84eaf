use crate::lattice::{step, Coord, MOVES};
use fastrand::Rng;

/// Translates one interior residue of `positions` by a random unit step.
///
/// The first and last residues are never moved. Returns false (and leaves
/// `positions` untouched, with no RNG draws) when the chain has no interior.
/// The result is not checked for self-avoidance.
#[inline(always)]
pub fn perturb_residue(rng: &mut Rng, positions: &mut [Coord]) -> bool {
    let len = positions.len();
    if len < 3 {
        return false;
    }
    let idx = rng.usize(1..len - 1);
    let mv = MOVES[rng.usize(0..MOVES.len())];
    positions[idx] = step(positions[idx], mv);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::manhattan;

    #[test]
    fn test_moves_exactly_one_interior_residue() {
        let mut rng = Rng::with_seed(5);
        let base: Vec<Coord> = (0..6).map(|x| [x, 0, 0]).collect();
        for _ in 0..200 {
            let mut p = base.clone();
            assert!(perturb_residue(&mut rng, &mut p));
            let changed: Vec<usize> = (0..p.len()).filter(|&i| p[i] != base[i]).collect();
            assert_eq!(changed.len(), 1);
            let i = changed[0];
            assert!(i > 0 && i < p.len() - 1);
            assert_eq!(manhattan(p[i], base[i]), 1);
        }
    }

    #[test]
    fn test_short_chains_are_left_alone() {
        let mut rng = Rng::with_seed(5);
        let mut p = vec![[0, 0, 0], [1, 0, 0]];
        assert!(!perturb_residue(&mut rng, &mut p));
        assert_eq!(p, vec![[0, 0, 0], [1, 0, 0]]);
    }
}
