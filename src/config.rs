//! Pipeline configuration
//!
//! Defaults cover a normal run; `INTERACTOME_*` environment variables override them.
//! Without a configured release the pipeline embeds the current BioGRID release.

use crate::graph::SelfLoopPolicy;
use crate::trainer::Hyperparameters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_RELEASE: &str = "INTERACTOME_RELEASE";
pub const ENV_DATA_DIR: &str = "INTERACTOME_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "INTERACTOME_OUTPUT_DIR";
pub const ENV_TRAINER: &str = "INTERACTOME_TRAINER";
pub const ENV_DIMENSIONS: &str = "INTERACTOME_DIMENSIONS";
pub const ENV_SELF_LOOPS: &str = "INTERACTOME_SELF_LOOPS";

/// Configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// BioGRID release identifier, e.g. `4.4.229`; `None` follows the current release
    pub release: Option<String>,
    /// Where release archives are kept
    pub data_dir: PathBuf,
    /// Where per-release outputs are written
    pub output_dir: PathBuf,
    /// External node2vec program
    pub trainer_program: String,
    /// Arguments passed to the trainer before the generated flags
    pub trainer_args: Vec<String>,
    pub hyperparameters: Hyperparameters,
    pub self_loops: SelfLoopPolicy,
    /// Vectors file name; `.gz` compresses
    pub vectors_file: String,
    /// Vocabulary file name; `.gz` compresses
    pub vocab_file: String,
    pub plot_file: String,
    pub summary_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            release: None,
            data_dir: PathBuf::from("./data/biogrid"),
            output_dir: PathBuf::from("./output"),
            trainer_program: "node2vec".to_string(),
            trainer_args: Vec::new(),
            hyperparameters: Hyperparameters::default(),
            self_loops: SelfLoopPolicy::Keep,
            vectors_file: "vectors.tsv".to_string(),
            vocab_file: "vocab.tsv".to_string(),
            plot_file: "embedding.svg".to_string(),
            summary_file: "summary.json".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(release) = lookup(ENV_RELEASE) {
            let release = release.trim().to_string();
            if release.is_empty() {
                return Err(invalid(ENV_RELEASE, release, "must not be empty"));
            }
            config.release = Some(release);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(command) = lookup(ENV_TRAINER) {
            let mut words = command.split_whitespace().map(str::to_string);
            let Some(program) = words.next() else {
                return Err(invalid(ENV_TRAINER, command.clone(), "must name a program"));
            };
            config.trainer_program = program;
            config.trainer_args = words.collect();
        }
        if let Some(value) = lookup(ENV_DIMENSIONS) {
            match value.trim().parse::<usize>() {
                Ok(d) if d > 0 => config.hyperparameters.dimensions = d,
                _ => return Err(invalid(ENV_DIMENSIONS, value, "expected a positive integer")),
            }
        }
        if let Some(value) = lookup(ENV_SELF_LOOPS) {
            config.self_loops = match value.trim().to_ascii_lowercase().as_str() {
                "keep" => SelfLoopPolicy::Keep,
                "drop" => SelfLoopPolicy::Drop,
                _ => return Err(invalid(ENV_SELF_LOOPS, value, "expected `keep` or `drop`")),
            };
        }

        Ok(config)
    }

    /// Working directory of the external trainer
    pub fn trainer_dir(&self) -> PathBuf {
        self.output_dir.join("trainer")
    }
}

fn invalid(key: &'static str, value: String, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value,
        reason: reason.to_string(),
    }
}
