//! Trained per-accession vectors
//!
//! `KeyedVectors` pairs a vocabulary (accession -> row index and frequency)
//! with a dense row-major matrix, one row per vocabulary entry.

pub mod tabbed;

pub use tabbed::{load_tabbed, open_reader, open_writer, save_tabbed, Sink};

use indexmap::IndexMap;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Vector table errors
#[derive(Error, Debug)]
pub enum VectorsError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Tab-delimited read/write error
    #[error("Tabular format error: {0}")]
    Csv(#[from] csv::Error),

    /// Vocabulary size differs from the number of vector rows
    #[error("Vocabulary has {vocab} entries but there are {vectors} vector rows")]
    CountMismatch { vocab: usize, vectors: usize },

    /// A vector has the wrong number of components
    #[error("Vector for {accession} has {got} components, expected {expected}")]
    DimensionMismatch {
        accession: String,
        expected: usize,
        got: usize,
    },

    /// Vocabulary entry points past the last vector row
    #[error("Vocabulary entry {accession} points at row {index} of {rows}")]
    RowOutOfRange {
        accession: String,
        index: usize,
        rows: usize,
    },

    /// Accession listed twice
    #[error("Duplicate accession: {0}")]
    DuplicateAccession(String),

    /// Vectors and vocabulary files disagree
    #[error("Vocabulary file does not match vectors file at line {line}")]
    VocabMismatch { line: u64 },

    /// Unparseable field
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Vectors file without its size header
    #[error("Vectors file is missing its header row")]
    MissingHeader,
}

pub type VectorsResult<T> = Result<T, VectorsError>;

/// Vocabulary entry of one accession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Row in the vector matrix
    pub index: usize,
    /// Occurrences counted by the trainer
    pub count: u64,
}

/// Accession-keyed embedding vectors
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedVectors {
    vocab: IndexMap<String, VocabEntry>,
    vectors: Array2<f32>,
}

impl KeyedVectors {
    /// Wrap a vocabulary and matrix as-is. See [`KeyedVectors::validate`].
    pub fn new(vocab: IndexMap<String, VocabEntry>, vectors: Array2<f32>) -> Self {
        Self { vocab, vectors }
    }

    /// Build from `(accession, count, vector)` rows; row order becomes matrix order
    pub fn from_rows<I>(dimensions: usize, rows: I) -> VectorsResult<Self>
    where
        I: IntoIterator<Item = (String, u64, Vec<f32>)>,
    {
        let mut vocab = IndexMap::new();
        let mut data = Vec::new();

        for (accession, count, vector) in rows {
            if vector.len() != dimensions {
                return Err(VectorsError::DimensionMismatch {
                    accession,
                    expected: dimensions,
                    got: vector.len(),
                });
            }
            if vocab.contains_key(&accession) {
                return Err(VectorsError::DuplicateAccession(accession));
            }
            let index = vocab.len();
            vocab.insert(accession, VocabEntry { index, count });
            data.extend(vector);
        }

        let vectors = Array2::from_shape_vec((vocab.len(), dimensions), data)
            .map_err(|e| VectorsError::Parse {
                line: 0,
                message: e.to_string(),
            })?;
        Ok(Self { vocab, vectors })
    }

    /// Check that vocabulary and matrix agree
    pub fn validate(&self) -> VectorsResult<()> {
        let rows = self.vectors.nrows();
        if self.vocab.len() != rows {
            return Err(VectorsError::CountMismatch {
                vocab: self.vocab.len(),
                vectors: rows,
            });
        }
        for (accession, entry) in &self.vocab {
            if entry.index >= rows {
                return Err(VectorsError::RowOutOfRange {
                    accession: accession.clone(),
                    index: entry.index,
                    rows,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn vocab(&self) -> &IndexMap<String, VocabEntry> {
        &self.vocab
    }

    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.vocab.contains_key(accession)
    }

    pub fn count(&self, accession: &str) -> Option<u64> {
        self.vocab.get(accession).map(|e| e.count)
    }

    pub fn get(&self, accession: &str) -> Option<ArrayView1<'_, f32>> {
        let entry = self.vocab.get(accession)?;
        (entry.index < self.vectors.nrows()).then(|| self.vectors.row(entry.index))
    }

    /// Vocabulary ordered by descending count; ties keep vocabulary order
    pub fn sorted_by_count(&self) -> Vec<(&str, VocabEntry)> {
        let mut items: Vec<_> = self
            .vocab
            .iter()
            .map(|(accession, entry)| (accession.as_str(), *entry))
            .collect();
        items.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        items
    }

    /// `(accession, count, vector)` rows in vocabulary order. Expects a validated table.
    pub fn rows(&self) -> impl Iterator<Item = (&str, u64, ArrayView1<'_, f32>)> + '_ {
        self.vocab
            .iter()
            .map(|(accession, entry)| (accession.as_str(), entry.count, self.vectors.row(entry.index)))
    }
}
