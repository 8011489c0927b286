//! BioGRID release archives
//!
//! Archives live at `<data_dir>/<release>/BIOGRID-ALL-<release>.tab3.zip` and are
//! downloaded only when that file is absent. Downloads stream into a `.part`
//! file that is renamed once complete. The current release is read off
//! BioGRID's latest-release listing when no release is configured.

use regex::Regex;
use reqwest::Client;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// Release archive location on the BioGRID download server
pub const DEFAULT_BASE_URL: &str = "https://downloads.thebiogrid.org/Download/BioGRID/Release-Archive";

/// Listing of the files of the current release
pub const DEFAULT_LATEST_URL: &str = "https://downloads.thebiogrid.org/BioGRID/Latest-Release/";

const RELEASE_PATTERN: &str = r"BIOGRID-ALL-(\d+(?:\.\d+)+)\.tab3\.zip";

/// Fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Download of {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be read
    #[error("Archive error: {0}")]
    Zip(ZipError),

    /// Expected member absent from the archive
    #[error("Archive has no member named {0}")]
    MissingMember(String),

    /// Latest-release page names no release archive
    #[error("No release archive listed at {0}")]
    UnknownLatest(String),

    /// Release name pattern failed to compile
    #[error("Release pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<ZipError> for FetchError {
    fn from(e: ZipError) -> Self {
        match e {
            ZipError::Io(io) => FetchError::Io(io),
            other => FetchError::Zip(other),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Archive file name of a release
pub fn archive_name(release: &str) -> String {
    format!("BIOGRID-ALL-{release}.tab3.zip")
}

/// Name of the tab3 text member inside the archive
pub fn archive_member(release: &str) -> String {
    format!("BIOGRID-ALL-{release}.tab3.txt")
}

/// Download URL of a release archive under `base_url`
pub fn archive_url(base_url: &str, release: &str) -> String {
    format!(
        "{}/BIOGRID-{release}/{}",
        base_url.trim_end_matches('/'),
        archive_name(release)
    )
}

/// Highest release named by a `BIOGRID-ALL-<release>.tab3.zip` link in `page`
pub fn parse_latest_release(page: &str) -> FetchResult<Option<String>> {
    let pattern = Regex::new(RELEASE_PATTERN)?;
    let numeric = |release: &str| -> Vec<u64> {
        release.split('.').map(|part| part.parse().unwrap_or(0)).collect()
    };
    Ok(pattern
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .max_by_key(|release| numeric(release))
        .map(str::to_string))
}

/// Ask the latest-release listing at `url` which release is current
pub async fn latest_release(client: &Client, url: &str) -> FetchResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let page = response.text().await?;
    let release = parse_latest_release(&page)?.ok_or_else(|| FetchError::UnknownLatest(url.to_string()))?;
    info!(%release, "Resolved current BioGRID release");
    Ok(release)
}

/// Open a release archive for reading
pub fn open_archive(path: impl AsRef<Path>) -> FetchResult<ZipArchive<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Ensures release archives are present locally
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: Client,
    data_dir: PathBuf,
    base_url: String,
    latest_url: String,
}

impl ArchiveFetcher {
    pub fn new(data_dir: impl Into<PathBuf>) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            data_dir: data_dir.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            latest_url: DEFAULT_LATEST_URL.to_string(),
        })
    }

    /// Download from a mirror instead of the BioGRID server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the current release from another listing page
    pub fn with_latest_url(mut self, latest_url: impl Into<String>) -> Self {
        self.latest_url = latest_url.into();
        self
    }

    /// Current BioGRID release
    pub async fn latest_release(&self) -> FetchResult<String> {
        latest_release(&self.client, &self.latest_url).await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Local path of a release archive, whether or not it exists yet
    pub fn archive_path(&self, release: &str) -> PathBuf {
        self.data_dir.join(release).join(archive_name(release))
    }

    /// Path of the release archive, downloading it first if absent
    pub async fn ensure(&self, release: &str) -> FetchResult<PathBuf> {
        let path = self.archive_path(release);
        if path.is_file() {
            debug!(path = %path.display(), "Using cached archive");
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let url = archive_url(&self.base_url, release);
        info!(%url, "Downloading BioGRID release");
        let mut response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let part = path.with_extension("zip.part");
        let mut file = tokio::fs::File::create(&part).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&part, &path).await?;

        info!(bytes, path = %path.display(), "Downloaded archive");
        Ok(path)
    }
}
