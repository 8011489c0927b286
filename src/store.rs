//! Per-release embedding store
//!
//! One bincode artifact per dataset release at `<root>/<release>/embeddings.bin`.
//! Saving replaces the previous artifact for that release; nothing is evicted.

use crate::vectors::{KeyedVectors, VectorsError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the artifact inside a release directory
pub const ARTIFACT_NAME: &str = "embeddings.bin";

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Artifact written for another release
    #[error("Artifact at {path} belongs to release {found}, expected {expected}")]
    ReleaseMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// Release string cannot be used as a directory name
    #[error("Invalid release identifier: {0:?}")]
    InvalidRelease(String),

    /// Stored vectors are inconsistent
    #[error("Stored vectors are invalid: {0}")]
    Vectors(#[from] VectorsError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored accession
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub accession: String,
    pub count: u64,
    pub vector: Vec<f32>,
}

/// Serialized embedding table for one release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEmbeddings {
    pub release: String,
    pub dimensions: usize,
    pub entries: Vec<CachedEntry>,
}

impl CachedEmbeddings {
    pub fn from_vectors(release: impl Into<String>, kv: &KeyedVectors) -> Self {
        Self {
            release: release.into(),
            dimensions: kv.dimensions(),
            entries: kv
                .rows()
                .map(|(accession, count, vector)| CachedEntry {
                    accession: accession.to_string(),
                    count,
                    vector: vector.to_vec(),
                })
                .collect(),
        }
    }

    pub fn into_vectors(self) -> StoreResult<KeyedVectors> {
        let rows = self
            .entries
            .into_iter()
            .map(|e| (e.accession, e.count, e.vector));
        Ok(KeyedVectors::from_rows(self.dimensions, rows)?)
    }
}

/// Release-keyed artifact directory
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    root: PathBuf,
}

impl EmbeddingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every output of a release
    pub fn release_dir(&self, release: &str) -> StoreResult<PathBuf> {
        check_release(release)?;
        Ok(self.root.join(release))
    }

    pub fn path_for(&self, release: &str) -> StoreResult<PathBuf> {
        Ok(self.release_dir(release)?.join(ARTIFACT_NAME))
    }

    pub fn contains(&self, release: &str) -> bool {
        self.path_for(release).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Artifact for `release`, if one was saved
    pub fn load(&self, release: &str) -> StoreResult<Option<CachedEmbeddings>> {
        let path = self.path_for(release)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cached: CachedEmbeddings = bincode::deserialize_from(BufReader::new(file))?;
        if cached.release != release {
            return Err(StoreError::ReleaseMismatch {
                path: path.display().to_string(),
                expected: release.to_string(),
                found: cached.release,
            });
        }
        debug!(release, entries = cached.entries.len(), "Loaded cached embeddings");
        Ok(Some(cached))
    }

    /// Write the artifact for its release, replacing any previous one
    pub fn save(&self, cached: &CachedEmbeddings) -> StoreResult<PathBuf> {
        let path = self.path_for(&cached.release)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("bin.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(&mut writer, cached)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;

        info!(
            release = %cached.release,
            entries = cached.entries.len(),
            path = %path.display(),
            "Saved embeddings"
        );
        Ok(path)
    }
}

fn check_release(release: &str) -> StoreResult<()> {
    let valid = !release.is_empty()
        && release != "."
        && release != ".."
        && release
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidRelease(release.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cached(release: &str, value: f32) -> CachedEmbeddings {
        CachedEmbeddings {
            release: release.to_string(),
            dimensions: 2,
            entries: vec![
                CachedEntry {
                    accession: "P1".to_string(),
                    count: 4,
                    vector: vec![value, 1.0],
                },
                CachedEntry {
                    accession: "P2".to_string(),
                    count: 2,
                    vector: vec![0.0, -value],
                },
            ],
        }
    }

    #[test]
    fn test_missing_release_is_none() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddingStore::new(dir.path());

        assert!(!store.contains("4.4.229"));
        assert!(store.load("4.4.229").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddingStore::new(dir.path());

        let path = store.save(&cached("4.4.229", 0.5)).unwrap();

        assert_eq!(path, dir.path().join("4.4.229").join(ARTIFACT_NAME));
        assert!(store.contains("4.4.229"));
        assert_eq!(store.load("4.4.229").unwrap(), Some(cached("4.4.229", 0.5)));
        assert!(store.load("4.4.230").unwrap().is_none());
    }

    #[test]
    fn test_one_artifact_per_release() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddingStore::new(dir.path());

        store.save(&cached("4.4.229", 0.5)).unwrap();
        store.save(&cached("4.4.229", 2.0)).unwrap();

        assert_eq!(store.load("4.4.229").unwrap(), Some(cached("4.4.229", 2.0)));
        let files: Vec<_> = fs::read_dir(dir.path().join("4.4.229")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_rejects_path_like_release() {
        let store = EmbeddingStore::new("/tmp/unused");

        assert!(matches!(store.path_for("../x"), Err(StoreError::InvalidRelease(_))));
        assert!(matches!(store.path_for(""), Err(StoreError::InvalidRelease(_))));
    }

    #[test]
    fn test_release_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let path = store.save(&cached("4.4.229", 0.5)).unwrap();
        fs::create_dir_all(dir.path().join("4.4.230")).unwrap();
        fs::copy(&path, store.path_for("4.4.230").unwrap()).unwrap();

        assert!(matches!(
            store.load("4.4.230"),
            Err(StoreError::ReleaseMismatch { .. })
        ));
    }

    #[test]
    fn test_vectors_conversion() {
        let kv = cached("r1", 0.5).into_vectors().unwrap();

        assert_eq!(kv.count("P1"), Some(4));
        assert_eq!(kv.get("P2").unwrap().to_vec(), vec![0.0, -0.5]);
        assert_eq!(CachedEmbeddings::from_vectors("r1", &kv), cached("r1", 0.5));
    }
}
