//! Archive-backed downloader for deterministic, offline use.
//!
//! A snapshot is a JSON file capturing a set of image resources keyed by
//! their original URLs:
//!
//! ```json
//! { "resources": [ { "url": "https://…/v.gif", "data": "<base64>" } ] }
//! ```
//!
//! Fetches resolve against the in-memory map; a URL absent from the
//! snapshot fails with [`DownloadError::NotFound`], the same way a live
//! fetch of a vanished image would fail.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use super::error::DownloadError;
use super::SmileyDownloader;

/// Errors loading an archive snapshot file.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid base64 data for {url}: {source}")]
    Data {
        url: String,
        source: base64::DecodeError,
    },
}

#[derive(Deserialize)]
struct Snapshot {
    resources: Vec<SnapshotResource>,
}

#[derive(Deserialize)]
struct SnapshotResource {
    url: String,
    /// Base64-encoded image bytes.
    data: String,
}

/// Downloader that serves image data from a previously captured snapshot.
#[derive(Debug)]
pub struct ArchiveSmileyDownloader {
    resources: HashMap<String, Vec<u8>>,
}

impl ArchiveSmileyDownloader {
    /// Build directly from a URL → bytes map.
    pub fn new(resources: HashMap<String, Vec<u8>>) -> Self {
        Self { resources }
    }

    /// Load a snapshot file from disk.
    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let raw = std::fs::read(path).map_err(|e| ArchiveError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot: Snapshot = serde_json::from_slice(&raw).map_err(|e| ArchiveError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut resources = HashMap::with_capacity(snapshot.resources.len());
        for resource in snapshot.resources {
            let data = BASE64
                .decode(&resource.data)
                .map_err(|e| ArchiveError::Data {
                    url: resource.url.clone(),
                    source: e,
                })?;
            resources.insert(resource.url, data);
        }

        Ok(Self { resources })
    }

    /// Number of archived resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl SmileyDownloader for ArchiveSmileyDownloader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        match self.resources.get(url) {
            Some(data) => Ok(data.clone()),
            None => Err(DownloadError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_snapshot(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("smiley_sync_archive_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fetch_hit_returns_bytes() {
        let mut resources = HashMap::new();
        resources.insert("http://x/v.gif".to_string(), vec![0x47, 0x49, 0x46]);
        let downloader = ArchiveSmileyDownloader::new(resources);

        let data = downloader.fetch("http://x/v.gif").await.unwrap();
        assert_eq!(data, vec![0x47, 0x49, 0x46]);
    }

    #[tokio::test]
    async fn test_fetch_miss_is_not_found() {
        let downloader = ArchiveSmileyDownloader::new(HashMap::new());
        let result = downloader.fetch("http://x/absent.gif").await;
        assert!(matches!(result, Err(DownloadError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_snapshot_file() {
        // "R0lG" is base64 for the GIF magic bytes 47 49 46.
        let path = tmp_snapshot(
            "ok.json",
            r#"{"resources": [{"url": "http://x/v.gif", "data": "R0lG"}]}"#,
        );
        let downloader = ArchiveSmileyDownloader::load(&path).unwrap();
        assert_eq!(downloader.len(), 1);

        let data = downloader.fetch("http://x/v.gif").await.unwrap();
        assert_eq!(data, vec![0x47, 0x49, 0x46]);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let path = std::env::temp_dir()
            .join("smiley_sync_archive_tests")
            .join("nonexistent.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            ArchiveSmileyDownloader::load(&path),
            Err(ArchiveError::Read { .. })
        ));
    }

    #[test]
    fn test_load_malformed_json_is_parse_error() {
        let path = tmp_snapshot("bad.json", "{not json");
        assert!(matches!(
            ArchiveSmileyDownloader::load(&path),
            Err(ArchiveError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_bad_base64_is_data_error() {
        let path = tmp_snapshot(
            "bad_data.json",
            r#"{"resources": [{"url": "http://x/v.gif", "data": "!!!"}]}"#,
        );
        assert!(matches!(
            ArchiveSmileyDownloader::load(&path),
            Err(ArchiveError::Data { .. })
        ));
    }
}
