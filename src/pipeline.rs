//! End-to-end run: release archive -> human interactome -> giant component -> embeddings
//!
//! Outputs of a release go to `<output_dir>/<release>/`: tabbed vectors and
//! vocabulary, the cached binary artifact, the scatter plot and a run summary.

use crate::config::PipelineConfig;
use crate::fetch::{archive_member, open_archive, ArchiveFetcher, FetchError};
use crate::graph::{giant_component, InteractionGraph};
use crate::source::{HumanInteractions, SourceError};
use crate::store::{CachedEmbeddings, EmbeddingStore, StoreError};
use crate::trainer::{EmbeddingTrainer, TrainError};
use crate::vectors::{save_tabbed, KeyedVectors, VectorsError};
use crate::visualize::plot_embeddings;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use zip::result::ZipError;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Vectors(#[from] VectorsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not write run summary: {0}")]
    Summary(#[from] serde_json::Error),

    /// No interaction survived filtering
    #[error("No human-human interactions found in release {0}")]
    EmptyGraph(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Graph sizes seen during a full run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub interactions_read: u64,
    pub pairs_kept: u64,
    pub nodes: usize,
    pub edges: usize,
    pub giant_nodes: usize,
    pub giant_edges: usize,
}

/// Files produced (or reused) by a run; cached runs list the tabbed files
/// of the earlier trained run when they are still present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutputs {
    pub artifact: PathBuf,
    pub vectors: Option<PathBuf>,
    pub vocab: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub release: String,
    /// Embeddings came from the store rather than training
    pub cached: bool,
    /// Absent on cached runs
    pub graph: Option<GraphSummary>,
    pub vocabulary_size: usize,
    pub dimensions: usize,
    pub outputs: RunOutputs,
}

/// Embedding pipeline over one BioGRID release
pub struct Pipeline<T> {
    config: PipelineConfig,
    trainer: T,
    store: EmbeddingStore,
    fetcher: ArchiveFetcher,
}

impl<T: EmbeddingTrainer> Pipeline<T> {
    pub fn new(config: PipelineConfig, trainer: T) -> PipelineResult<Self> {
        let store = EmbeddingStore::new(&config.output_dir);
        let fetcher = ArchiveFetcher::new(&config.data_dir)?;
        Ok(Self {
            config,
            trainer,
            store,
            fetcher,
        })
    }

    /// Replace the archive fetcher (e.g. to use a mirror)
    pub fn with_fetcher(mut self, fetcher: ArchiveFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Configured release, or the current one from the latest-release listing
    pub async fn release(&self) -> PipelineResult<String> {
        match &self.config.release {
            Some(release) => Ok(release.clone()),
            None => Ok(self.fetcher.latest_release().await?),
        }
    }

    /// Embeddings stored for `release`, if any
    pub fn load_cached(&self, release: &str) -> PipelineResult<Option<KeyedVectors>> {
        match self.store.load(release)? {
            Some(cached) => Ok(Some(cached.into_vectors()?)),
            None => Ok(None),
        }
    }

    /// Full run. Unless `force` is set, stored embeddings for the release
    /// short-circuit download and training.
    pub async fn run(&self, force: bool) -> PipelineResult<RunSummary> {
        let release = self.release().await?;
        if force {
            info!(%release, "Forced rebuild, ignoring stored embeddings");
        } else if let Some(kv) = self.load_cached(&release)? {
            info!(%release, entries = kv.len(), "Using stored embeddings");
            return self.cached_summary(&release, &kv);
        }

        let archive = self.fetcher.ensure(&release).await?;
        self.run_archive(&release, &archive)
    }

    fn cached_summary(&self, release: &str, kv: &KeyedVectors) -> PipelineResult<RunSummary> {
        let release_dir = self.store.release_dir(release)?;
        let existing = |name: &str| {
            let path = release_dir.join(name);
            path.is_file().then_some(path)
        };
        Ok(RunSummary {
            release: release.to_string(),
            cached: true,
            graph: None,
            vocabulary_size: kv.len(),
            dimensions: kv.dimensions(),
            outputs: RunOutputs {
                artifact: self.store.path_for(release)?,
                vectors: existing(&self.config.vectors_file),
                vocab: existing(&self.config.vocab_file),
                plot: self.plot(kv, release, &release_dir),
                summary: None,
            },
        })
    }

    /// Run on a local archive of `release`
    pub fn run_archive(&self, release: &str, path: &Path) -> PipelineResult<RunSummary> {
        let mut archive = open_archive(path)?;
        let name = archive_member(release);
        let member = archive.by_name(&name).map_err(|e| match e {
            ZipError::FileNotFound => FetchError::MissingMember(name.clone()),
            other => FetchError::from(other),
        })?;
        info!(archive = %path.display(), member = %name, "Reading interactions");
        self.run_reader(release, member)
    }

    /// Run on an already-opened tab3 stream of `release`
    pub fn run_reader<R: Read>(&self, release: &str, input: R) -> PipelineResult<RunSummary> {
        let release_dir = self.store.release_dir(release)?;
        fs::create_dir_all(&release_dir)?;

        let mut interactions = HumanInteractions::new(input)?;
        let graph = InteractionGraph::from_pairs(&mut interactions, self.config.self_loops)?;
        let stats = interactions.stats();
        if graph.is_empty() {
            return Err(PipelineError::EmptyGraph(release.to_string()));
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built interaction graph"
        );

        let giant = giant_component(&graph);
        let graph_summary = GraphSummary {
            interactions_read: stats.lines_read,
            pairs_kept: stats.pairs_kept,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            giant_nodes: giant.node_count(),
            giant_edges: giant.edge_count(),
        };
        drop(graph);

        let kv = self.trainer.fit(&giant, &self.config.hyperparameters)?;

        let vectors_path = release_dir.join(&self.config.vectors_file);
        let vocab_path = release_dir.join(&self.config.vocab_file);
        save_tabbed(&kv, &vectors_path, &vocab_path)?;
        let artifact = self.store.save(&CachedEmbeddings::from_vectors(release, &kv))?;
        let plot = self.plot(&kv, release, &release_dir);

        let summary_path = release_dir.join(&self.config.summary_file);
        let summary = RunSummary {
            release: release.to_string(),
            cached: false,
            graph: Some(graph_summary),
            vocabulary_size: kv.len(),
            dimensions: kv.dimensions(),
            outputs: RunOutputs {
                artifact,
                vectors: Some(vectors_path),
                vocab: Some(vocab_path),
                plot,
                summary: Some(summary_path.clone()),
            },
        };
        write_summary(&summary, &summary_path)?;

        info!(
            release = %summary.release,
            vocabulary = summary.vocabulary_size,
            dimensions = summary.dimensions,
            output = %release_dir.display(),
            "Finished embedding run"
        );
        Ok(summary)
    }

    fn plot(&self, kv: &KeyedVectors, release: &str, release_dir: &Path) -> Option<PathBuf> {
        let path = release_dir.join(&self.config.plot_file);
        if let Err(e) = fs::create_dir_all(release_dir) {
            warn!(error = %e, "Skipping embedding plot");
            return None;
        }
        let title = format!("BioGRID {release} human interactome");
        match plot_embeddings(kv, &path, &title) {
            Ok(_) => Some(path),
            Err(e) => {
                warn!(error = %e, "Skipping embedding plot");
                None
            }
        }
    }
}

fn write_summary(summary: &RunSummary, path: &Path) -> PipelineResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
