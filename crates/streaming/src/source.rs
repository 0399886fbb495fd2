//! Byte sources for dataset resources.
//!
//! A [`ResourceSource`] turns an opaque source reference (a relative path
//! from the options manifest) into bytes:
//! - [`FilesystemSource`] resolves references under a data root.
//! - [`HttpSource`] resolves references against a base URL.
//! - [`MemorySource`] serves fixed byte blobs, mostly for tests.
//!
//! Sources are shared by every load worker, so implementations must be
//! `Send + Sync` and must not hold per-request state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SourceError;

pub trait ResourceSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Fetches the full contents of `reference`.
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, reference: &str) -> PathBuf {
        let trimmed = reference.trim_start_matches("./");
        let path = Path::new(trimmed);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ResourceSource for FilesystemSource {
    fn describe(&self) -> String {
        format!("filesystem:{}", self.root.display())
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(reference);
        std::fs::read(&path).map_err(|e| {
            SourceError::with_source(format!("failed to read {}", path.display()), e)
        })
    }
}

pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| SourceError::with_source("failed to build HTTP client", e))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn url_for(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            reference.trim_start_matches("./").trim_start_matches('/')
        )
    }
}

impl ResourceSource for HttpSource {
    fn describe(&self) -> String {
        format!("http:{}", self.base_url)
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let url = self.url_for(reference);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::with_source("HTTP request failed", e))?;

        if !resp.status().is_success() {
            return Err(SourceError::new(format!(
                "HTTP error {} for {url}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| SourceError::with_source("failed to read response", e))?;
        Ok(bytes.to_vec())
    }
}

/// In-memory source. Records every fetch so tests can observe dispatch order.
#[derive(Debug, Default)]
pub struct MemorySource {
    blobs: BTreeMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(reference, bytes);
        self
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.insert(reference.into(), bytes.into());
    }

    /// References fetched so far, in fetch order.
    pub fn fetched(&self) -> Vec<String> {
        match self.fetched.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ResourceSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{} blobs", self.blobs.len())
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        match self.fetched.lock() {
            Ok(mut log) => log.push(reference.to_string()),
            Err(poisoned) => poisoned.into_inner().push(reference.to_string()),
        }
        self.blobs
            .get(reference)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("no such resource: {reference}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{FilesystemSource, HttpSource, MemorySource, ResourceSource};

    #[test]
    fn filesystem_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data/noise")).unwrap();
        std::fs::write(dir.path().join("data/noise/a.csv"), b"1,2,3\n").unwrap();

        let source = FilesystemSource::new(dir.path());
        assert_eq!(source.fetch("./data/noise/a.csv").unwrap(), b"1,2,3\n");
        assert_eq!(source.fetch("data/noise/a.csv").unwrap(), b"1,2,3\n");
    }

    #[test]
    fn filesystem_source_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilesystemSource::new(dir.path());
        let err = source.fetch("missing.csv").unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn http_urls_join_base_and_reference() {
        let source = HttpSource::new("http://localhost:8080/").unwrap();
        assert_eq!(
            source.url_for("./data/wind/cells.csv"),
            "http://localhost:8080/data/wind/cells.csv"
        );
        assert_eq!(source.url_for("https://cdn/x.stl"), "https://cdn/x.stl");
    }

    #[test]
    fn memory_source_logs_fetch_order() {
        let source = MemorySource::new().with("a", b"1".to_vec()).with("b", b"2".to_vec());
        source.fetch("b").unwrap();
        source.fetch("a").unwrap();
        assert!(source.fetch("c").is_err());
        assert_eq!(source.fetched(), vec!["b", "a", "c"]);
    }
}
