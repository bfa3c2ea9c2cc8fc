use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::ContentRange;
use axum_extra::TypedHeader;
use thiserror::Error;

/// Terminal outcome of a request that cannot be served.
///
/// Every variant maps to exactly one status code and an empty body. Nothing
/// here is retried; the client is expected to issue a fresh request.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The `Range` header is missing or is not a single `bytes=<start>-<end>` value.
    #[error("missing or malformed Range header: {0:?}")]
    BadRequest(Option<String>),

    /// The sanitized path does not name a regular file under the storage root.
    #[error("no regular file at {0}")]
    NotFound(String),

    /// The sniffed MIME type is not in the allow-list.
    #[error("unsupported media type {0}")]
    UnsupportedMediaType(String),

    /// The requested start offset lies at or beyond the end of the file.
    #[error("range start {start} is beyond file size {size}")]
    RangeNotSatisfiable { start: u64, size: u64 },

    /// The source could not be read after validation succeeded.
    #[error("failed to read {}: {source}", path.display())]
    Internal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
            StreamError::UnsupportedMediaType(_) => StatusCode::BAD_REQUEST,
            StreamError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            StreamError::RangeNotSatisfiable { size, .. } => {
                let header = TypedHeader(ContentRange::unsatisfied_bytes(size));
                (status, header, ()).into_response()
            }
            _ => (status, ()).into_response(),
        }
    }
}

/// Errors raised while loading or validating a [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be greater than zero")]
    ZeroChunkSize(&'static str),

    #[error("storage root {} must be an absolute path", .0.display())]
    RelativeStorageRoot(PathBuf),

    #[error("storage root {} is not accessible: {source}", path.display())]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid legacy browser pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StatusCode::BAD_REQUEST, StreamError::BadRequest(None).status());
        assert_eq!(StatusCode::NOT_FOUND, StreamError::NotFound("/a.mov".into()).status());
        assert_eq!(
            StatusCode::BAD_REQUEST,
            StreamError::UnsupportedMediaType("text/plain".into()).status()
        );
        assert_eq!(
            StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::RangeNotSatisfiable { start: 600, size: 500 }.status()
        );
        let internal = StreamError::Internal {
            path: PathBuf::from("/var/www/videos/a.mov"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, internal.status());
    }

    #[test]
    fn test_unsatisfiable_response_carries_size() {
        let response = StreamError::RangeNotSatisfiable { start: 600, size: 500 }.into_response();
        assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status());
        assert_eq!("bytes */500", response.headers()[header::CONTENT_RANGE]);
    }

    #[test]
    fn test_error_responses_have_no_content_type() {
        let response = StreamError::NotFound("/missing.mov".into()).into_response();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
