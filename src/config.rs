use crate::error::{HpError, HpResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExperimentConfig {
    #[command(flatten)]
    #[serde(flatten)]
    pub study: StudyParams,
    #[command(flatten)]
    #[serde(default)]
    pub mc: McParams,
    #[command(flatten)]
    #[serde(default)]
    pub fe: FeParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudyParams {
    #[arg(long, default_value = "FE-HP3D-SCALING")]
    pub experiment_id: String,

    #[arg(long, value_delimiter = ',', default_values_t = [10usize, 15, 20, 25, 30])]
    pub lengths: Vec<usize>,

    #[arg(id = "pilot_trials_per_algorithm", long = "pilot-trials", default_value_t = 200)]
    pub pilot_trials_per_algorithm: usize,

    #[arg(id = "trials_per_algorithm", long = "trials", default_value_t = 2000)]
    pub trials_per_algorithm: usize,

    // Probability of drawing H when generating a study sequence
    #[arg(long, default_value_t = 0.5)]
    pub h_probability: f64,
}

impl Default for StudyParams {
    fn default() -> Self {
        Self {
            experiment_id: "FE-HP3D-SCALING".to_string(),
            lengths: vec![10, 15, 20, 25, 30],
            pilot_trials_per_algorithm: 200,
            trials_per_algorithm: 2000,
            h_probability: 0.5,
        }
    }
}

/// Metropolis Monte Carlo parameters.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct McParams {
    #[arg(id = "mc_max_steps", long = "mc-max-steps", default_value_t = 10_000)]
    pub max_steps: usize,
    #[arg(id = "mc_temperature", long = "mc-temperature", default_value_t = 1.0)]
    pub temperature: f64,
}

impl Default for McParams {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            temperature: 1.0,
        }
    }
}

/// Forgetting Engine parameters.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeParams {
    #[arg(id = "fe_pop_size", long = "fe-pop-size", default_value_t = 50)]
    pub pop_size: usize,
    #[arg(id = "fe_forget_rate", long = "fe-forget-rate", default_value_t = 0.3)]
    pub forget_rate: f64,
    #[arg(id = "fe_max_gen", long = "fe-max-gen", default_value_t = 200)]
    pub max_gen: usize,
}

impl Default for FeParams {
    fn default() -> Self {
        Self {
            pop_size: 50,
            forget_rate: 0.3,
            max_gen: 200,
        }
    }
}

impl McParams {
    pub fn validate(&self) -> HpResult<()> {
        if self.max_steps == 0 {
            return Err(HpError::Config("mc.max_steps must be positive".into()));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(HpError::Config(format!(
                "mc.temperature must be a positive number, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

impl FeParams {
    /// Generation count that spends `total_steps` evaluations at `pop_size`
    /// per generation (integer division).
    pub fn from_step_budget(total_steps: usize, pop_size: usize, forget_rate: f64) -> HpResult<Self> {
        if pop_size == 0 {
            return Err(HpError::Config("fe.pop_size must be positive".into()));
        }
        let params = Self {
            pop_size,
            forget_rate,
            max_gen: total_steps / pop_size,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> HpResult<()> {
        if self.pop_size == 0 {
            return Err(HpError::Config("fe.pop_size must be positive".into()));
        }
        if self.max_gen == 0 {
            return Err(HpError::Config("fe.max_gen must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.forget_rate) {
            return Err(HpError::Config(format!(
                "fe.forget_rate must lie in [0, 1], got {}",
                self.forget_rate
            )));
        }
        Ok(())
    }

    /// Size of the head that survives truncation.
    #[inline(always)]
    pub fn retained_len(&self) -> usize {
        ((self.pop_size as f64) * (1.0 - self.forget_rate)).floor() as usize
    }
}

impl ExperimentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> HpResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HpError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> HpResult<()> {
        if self.study.lengths.is_empty() {
            return Err(HpError::Config("No sequence lengths configured".into()));
        }
        if let Some(&bad) = self.study.lengths.iter().find(|&&l| l < 3) {
            return Err(HpError::Config(format!(
                "Sequence length {} is too short (minimum 3)",
                bad
            )));
        }
        if !(0.0..=1.0).contains(&self.study.h_probability) {
            return Err(HpError::Config(format!(
                "h_probability must lie in [0, 1], got {}",
                self.study.h_probability
            )));
        }
        self.mc.validate()?;
        self.fe.validate()
    }

    /// Copies every value the user typed on the command line over `self`,
    /// leaving file-provided values alone where the CLI only has defaults.
    pub fn merge_from_cli(&mut self, cli: &ExperimentConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(study.experiment_id, "experiment_id");
        update_if_present!(study.lengths, "lengths");
        update_if_present!(study.pilot_trials_per_algorithm, "pilot_trials_per_algorithm");
        update_if_present!(study.trials_per_algorithm, "trials_per_algorithm");
        update_if_present!(study.h_probability, "h_probability");

        update_if_present!(mc.max_steps, "mc_max_steps");
        update_if_present!(mc.temperature, "mc_temperature");

        update_if_present!(fe.pop_size, "fe_pop_size");
        update_if_present!(fe.forget_rate, "fe_forget_rate");
        update_if_present!(fe.max_gen, "fe_max_gen");
    }
}
