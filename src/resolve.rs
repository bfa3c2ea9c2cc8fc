use std::path::{Path, PathBuf};
use std::time::SystemTime;

use percent_encoding::percent_decode_str;

use crate::error::StreamError;
use crate::sniff::sniff_file;

/// Server-side facts about the file a request targets.
///
/// Built once per request and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Sanitized client path, always starting with a single `/`.
    pub relative_path: String,
    /// Canonical location on disk, guaranteed to be under the storage root.
    pub absolute_path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub modified_at: SystemTime,
    pub size: u64,
}

/// Normalizes a client supplied path.
///
/// Decodes percent escapes once, drops every `../`, then trims leading and
/// trailing dots and slashes. This alone does not confine the path; see
/// [`resolve_file`].
pub fn sanitize_relative_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let stripped = decoded.replace("../", "");
    let trimmed = stripped.trim_matches(|c| c == '.' || c == '/');
    format!("/{trimmed}")
}

/// Maps a client path onto a regular file under `storage_root`.
///
/// `storage_root` must already be canonical. Symlinks are followed, and a
/// target that ends up outside the root is reported as not found.
pub async fn resolve_file(
    storage_root: &Path,
    raw_path: &str,
) -> Result<FileDescriptor, StreamError> {
    let relative_path = sanitize_relative_path(raw_path);
    let not_found = || StreamError::NotFound(relative_path.clone());

    let joined = storage_root.join(relative_path.trim_start_matches('/'));
    let absolute_path = tokio::fs::canonicalize(&joined).await.map_err(|_| not_found())?;

    if !absolute_path.starts_with(storage_root) {
        tracing::warn!(
            path = %relative_path,
            resolved = %absolute_path.display(),
            "resolved path escapes storage root"
        );
        return Err(not_found());
    }

    let metadata = tokio::fs::metadata(&absolute_path).await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let mime_type = sniff_file(&absolute_path)
        .await
        .map_err(|source| StreamError::Internal {
            path: absolute_path.clone(),
            source,
        })?;

    let name = absolute_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileDescriptor {
        relative_path,
        name,
        mime_type,
        modified_at: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        size: metadata.len(),
        absolute_path,
    })
}
