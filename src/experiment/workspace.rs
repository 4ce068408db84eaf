use crate::error::{HpError, HpResult};
use crate::lattice::Sequence;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use tracing::{debug, info};

/// Locked success thresholds E*(L), keyed by length.
pub type Thresholds = BTreeMap<usize, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Phase {
    /// Pilot runs that lock E*(L).
    A,
    /// Main runs scored against the locked thresholds.
    B,
}

/// Seed of the study sequence for length `L`.
pub fn sequence_seed(length: usize) -> u64 {
    1337 + length as u64
}

/// On-disk layout of one study.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("manuscript_outputs")
    }

    pub fn ensure_dirs(&self) -> HpResult<()> {
        fs::create_dir_all(self.results_dir())?;
        fs::create_dir_all(self.instances_dir())?;
        fs::create_dir_all(self.outputs_dir())?;
        Ok(())
    }

    pub fn csv_path(&self, phase: Phase, length: usize) -> PathBuf {
        self.results_dir()
            .join(format!("phase_{}_L{}.csv", phase, length))
    }

    pub fn thresholds_path(&self) -> PathBuf {
        self.results_dir().join("pilot_thresholds.json")
    }

    fn sequence_path(&self, length: usize) -> PathBuf {
        self.instances_dir()
            .join(format!("sequence_L{}.txt", length))
    }

    /// The study sequence for `length`: read from the instance cache, or
    /// generated from `sequence_seed(length)` and cached.
    pub fn sequence(&self, length: usize, h_probability: f64) -> HpResult<Sequence> {
        let path = self.sequence_path(length);
        if path.exists() {
            debug!("Reading cached sequence {}", path.display());
            let text = fs::read_to_string(&path)?;
            let seq = Sequence::parse(&text)?;
            if seq.len() != length {
                return Err(HpError::Validation(format!(
                    "Cached sequence {} has length {}, expected {}",
                    path.display(),
                    seq.len(),
                    length
                )));
            }
            return Ok(seq);
        }

        let seq = Sequence::generate(length, sequence_seed(length), h_probability)?;
        fs::create_dir_all(self.instances_dir())?;
        fs::write(&path, seq.to_string())?;
        info!("Generated sequence for L={} -> {}", length, path.display());
        Ok(seq)
    }

    /// Empty map when nothing has been locked yet.
    pub fn load_thresholds(&self) -> HpResult<Thresholds> {
        let path = self.thresholds_path();
        if !path.exists() {
            return Ok(Thresholds::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_thresholds(&self, thresholds: &Thresholds) -> HpResult<()> {
        fs::create_dir_all(self.results_dir())?;
        let json = serde_json::to_string_pretty(thresholds)?;
        fs::write(self.thresholds_path(), json)?;
        Ok(())
    }
}
