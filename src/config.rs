use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// One week.
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 7 * 24 * 3600;

/// 128 KiB, served for the first request against a file.
pub const DEFAULT_FIRST_CHUNK_SIZE: u64 = 128 * 1024;

/// 4 MiB, served for every request that does not start at offset zero.
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Matches desktop and iOS Safari, which refuse a 206 for the initial probe
/// of a video. Matched case-insensitively.
pub const DEFAULT_LEGACY_BROWSER_PATTERN: &str =
    r"(\s|^)AppleWebKit/[\d.]+\s+\(.+\)\s+Version/(1[0-9]|[2-9][0-9]|\d{3,})(\.|$|\s)";

/// Static settings for a [`StreamVideo`](crate::StreamVideo) service.
///
/// Every field has a default, so a config file only needs to name what it
/// changes:
///
/// ```toml
/// storage_root = "/srv/media"
/// allowed_mime_types = ["video/mp4", "video/webm"]
/// chunk_size = 2097152
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Directory holding the media files, outside the public document root.
    pub storage_root: PathBuf,
    /// MIME types, as sniffed from file content, that may be served.
    pub allowed_mime_types: BTreeSet<String>,
    /// Used for both `Cache-Control: max-age` and `Expires`.
    pub cache_duration_secs: u64,
    pub first_chunk_size: u64,
    pub chunk_size: u64,
    /// User agents matching this pattern get the whole file with a 200 on
    /// their first request.
    pub legacy_browser_pattern: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            storage_root: PathBuf::from("/var/www/videos"),
            allowed_mime_types: ["video/mp4", "video/quicktime", "video/webm"]
                .into_iter()
                .map(String::from)
                .collect(),
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
            first_chunk_size: DEFAULT_FIRST_CHUNK_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            legacy_browser_pattern: DEFAULT_LEGACY_BROWSER_PATTERN.to_string(),
        }
    }
}

impl StreamConfig {
    /// Default settings serving files from `storage_root`.
    pub fn with_root(storage_root: impl Into<PathBuf>) -> Self {
        StreamConfig {
            storage_root: storage_root.into(),
            ..StreamConfig::default()
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: StreamConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            path = %path.display(),
            root = %config.storage_root.display(),
            "loaded stream config"
        );
        Ok(config)
    }

    /// Checks the invariants the planner relies on.
    ///
    /// Does not touch the filesystem; the storage root is probed when the
    /// service is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize("first_chunk_size"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize("chunk_size"));
        }
        if !self.storage_root.is_absolute() {
            return Err(ConfigError::RelativeStorageRoot(self.storage_root.clone()));
        }
        crate::browser::PatternClassifier::new(&self.legacy_browser_pattern)?;
        Ok(())
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(mime_type)
    }
}
