use crate::error::{HpError, HpResult};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Residue {
    H,
    P,
}

impl Residue {
    #[inline(always)]
    pub fn is_hydrophobic(self) -> bool {
        self == Residue::H
    }

    pub fn as_char(self) -> char {
        match self {
            Residue::H => 'H',
            Residue::P => 'P',
        }
    }
}

/// An immutable HP sequence. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    residues: Vec<Residue>,
}

impl Sequence {
    pub fn parse(s: &str) -> HpResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HpError::Validation("HP sequence is empty".to_string()));
        }

        let residues = s
            .chars()
            .enumerate()
            .map(|(i, c)| match c.to_ascii_uppercase() {
                'H' => Ok(Residue::H),
                'P' => Ok(Residue::P),
                other => Err(HpError::Validation(format!(
                    "Invalid residue '{}' at position {} (expected H or P)",
                    other, i
                ))),
            })
            .collect::<HpResult<Vec<_>>>()?;

        Ok(Self { residues })
    }

    /// Independent per-residue draw: H with probability `h_probability`.
    pub fn generate(length: usize, seed: u64, h_probability: f64) -> HpResult<Self> {
        if length == 0 {
            return Err(HpError::Validation(
                "Sequence length must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&h_probability) {
            return Err(HpError::Validation(format!(
                "H probability {} is outside [0, 1]",
                h_probability
            )));
        }

        let mut rng = Rng::with_seed(seed);
        let residues = (0..length)
            .map(|_| {
                if rng.f64() < h_probability {
                    Residue::H
                } else {
                    Residue::P
                }
            })
            .collect();

        Ok(Self { residues })
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn hydrophobic_count(&self) -> usize {
        self.residues.iter().filter(|r| r.is_hydrophobic()).count()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.residues {
            write!(f, "{}", r.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Sequence {
    type Err = HpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sequence::parse(s)
    }
}

/// The per-length study sequence: balanced H/P draw.
pub fn generate_sequence(length: usize, seed: u64) -> HpResult<Sequence> {
    Sequence::generate(length, seed, 0.5)
}
