//! Embedding trainer seam
//!
//! Random-walk sampling and skip-gram training happen outside this crate. A
//! trainer takes the reduced interaction graph and returns one vector and one
//! frequency per node.

pub mod command;

pub use command::CommandTrainer;

use crate::graph::InteractionGraph;
use crate::vectors::{KeyedVectors, VectorsError};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Trainer errors
#[derive(Error, Debug)]
pub enum TrainError {
    /// I/O error (including a missing trainer program)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Hyperparameter out of range
    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    /// External trainer exited unsuccessfully
    #[error("Trainer {program} failed with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Trainer output could not be parsed
    #[error("Malformed trainer output in {file} at line {line}: {message}")]
    MalformedOutput {
        file: String,
        line: usize,
        message: String,
    },

    /// A graph node has no vector in the trained model
    #[error("Trained model has no vector for node {0}")]
    MissingNode(String),

    /// Trained vectors are inconsistent
    #[error("Vector table error: {0}")]
    Vectors(#[from] VectorsError),
}

pub type TrainResult<T> = Result<T, TrainError>;

/// Walk and skip-gram settings passed to the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Embedding dimensionality
    pub dimensions: usize,
    /// Nodes per random walk
    pub walk_length: usize,
    /// Walks started from every node
    pub epochs: usize,
    /// Return parameter
    pub p: f64,
    /// In-out parameter
    pub q: f64,
    /// Skip-gram context window
    pub window: usize,
    /// Negative samples per positive pair
    pub negative: usize,
    /// Skip-gram passes over the walk corpus
    pub iterations: usize,
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            dimensions: 64,
            walk_length: 30,
            epochs: 10,
            p: 1.0,
            q: 1.0,
            window: 10,
            negative: 5,
            iterations: 5,
            seed: 42,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> TrainResult<()> {
        let counts = [
            ("dimensions", self.dimensions),
            ("walk_length", self.walk_length),
            ("epochs", self.epochs),
            ("window", self.window),
            ("negative", self.negative),
            ("iterations", self.iterations),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(TrainError::InvalidParameter(format!("{name} must be positive")));
            }
        }
        for (name, value) in [("p", self.p), ("q", self.q)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrainError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Produces vectors for every node of a graph
pub trait EmbeddingTrainer {
    /// Train on `graph`. The result must cover every node.
    fn fit(&self, graph: &InteractionGraph, params: &Hyperparameters) -> TrainResult<KeyedVectors>;
}

/// Check a trained model against the graph it was trained on
pub fn check_coverage(
    graph: &InteractionGraph,
    params: &Hyperparameters,
    model: &KeyedVectors,
) -> TrainResult<()> {
    model.validate()?;
    if !model.is_empty() && model.dimensions() != params.dimensions {
        return Err(TrainError::Vectors(VectorsError::DimensionMismatch {
            accession: String::from("<model>"),
            expected: params.dimensions,
            got: model.dimensions(),
        }));
    }
    if let Some(missing) = graph.accessions().find(|a| !model.contains(a)) {
        return Err(TrainError::MissingNode(missing.to_string()));
    }
    Ok(())
}
