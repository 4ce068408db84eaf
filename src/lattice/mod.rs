pub mod sequence;
pub mod walk;

pub use self::sequence::{generate_sequence, Residue, Sequence};
pub use self::walk::{MAX_STEP_ATTEMPTS, MAX_WALK_RESTARTS};

use fnv::FnvHashSet;

/// Integer lattice point (x, y, z).
pub type Coord = [i32; 3];

/// The six axis-aligned unit steps.
pub const MOVES: [Coord; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

#[inline(always)]
pub fn step(from: Coord, mv: Coord) -> Coord {
    [from[0] + mv[0], from[1] + mv[1], from[2] + mv[2]]
}

#[inline(always)]
pub fn manhattan(a: Coord, b: Coord) -> i32 {
    (a[0] - b[0]).abs() + (a[1] - b[1]).abs() + (a[2] - b[2]).abs()
}

/// A placed chain and the energy of exactly these positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conformation {
    pub positions: Vec<Coord>,
    pub energy: i32,
}

impl Conformation {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// 3D HP lattice energy model for one sequence.
#[derive(Debug, Clone)]
pub struct HpLattice {
    sequence: Sequence,
    // Indices of H residues, ascending.
    hydrophobic: Vec<usize>,
}

impl HpLattice {
    pub fn new(sequence: Sequence) -> Self {
        let hydrophobic = sequence
            .residues()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_hydrophobic())
            .map(|(i, _)| i)
            .collect();

        Self {
            sequence,
            hydrophobic,
        }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// -1 for every topological H-H contact (|i - j| >= 2, unit L1 distance).
    pub fn energy(&self, positions: &[Coord]) -> i32 {
        let mut energy = 0;
        for (a, &i) in self.hydrophobic.iter().enumerate() {
            if i >= positions.len() {
                break;
            }
            for &j in &self.hydrophobic[a + 1..] {
                if j >= positions.len() {
                    break;
                }
                if j < i + 2 {
                    continue;
                }
                if manhattan(positions[i], positions[j]) == 1 {
                    energy -= 1;
                }
            }
        }
        energy
    }

    /// Self-avoidance only; chain adjacency is not checked here.
    pub fn is_valid(&self, positions: &[Coord]) -> bool {
        let mut seen = FnvHashSet::with_capacity_and_hasher(positions.len(), Default::default());
        positions.iter().all(|p| seen.insert(*p))
    }

    pub fn is_chain_connected(&self, positions: &[Coord]) -> bool {
        positions.windows(2).all(|w| manhattan(w[0], w[1]) == 1)
    }

    pub fn conformation(&self, positions: Vec<Coord>) -> Conformation {
        let energy = self.energy(&positions);
        Conformation { positions, energy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(s: &str) -> HpLattice {
        HpLattice::new(Sequence::parse(s).unwrap())
    }

    #[test]
    fn test_bonded_neighbours_do_not_count() {
        let model = lattice("HH");
        assert_eq!(model.energy(&[[0, 0, 0], [1, 0, 0]]), 0);
    }

    #[test]
    fn test_square_contact() {
        // 0 and 3 close the square.
        let model = lattice("HPPH");
        let square = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]];
        assert_eq!(model.energy(&square), -1);

        let model = lattice("HPPP");
        assert_eq!(model.energy(&square), 0);
    }

    #[test]
    fn test_is_valid_detects_collision() {
        let model = lattice("HPH");
        assert!(model.is_valid(&[[0, 0, 0], [1, 0, 0], [2, 0, 0]]));
        assert!(!model.is_valid(&[[0, 0, 0], [1, 0, 0], [0, 0, 0]]));
    }
}
