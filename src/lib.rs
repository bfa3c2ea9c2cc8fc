//! # axum-stream-video
//!
//! Chunked HTTP range streaming of video files for [`axum`][1].
//!
//! Players seek and buffer by asking for byte ranges. Rather than honoring
//! the requested window as-is, every response delivers a single chunk: a
//! small one for the first request against a file (so playback starts fast)
//! and a larger one afterwards. Browsers that cannot handle a `206` to their
//! initial probe get the whole file with a plain `200` instead.
//!
//! Each request runs through four stages, any of which can end it with an
//! error status:
//!
//! 1. [`resolve_file`] and [`RequestedRange`] turn the client path and
//!    `Range` header into a [`FileDescriptor`].
//! 2. [`validate`] rejects disallowed media types and unsatisfiable ranges.
//! 3. [`Planner`] picks the byte window and builds the headers.
//! 4. [`RangedStream`] copies exactly that window to the client.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::Router;
//! use axum_stream_video::{router, StreamConfig, StreamVideo};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = StreamVideo::new(StreamConfig::with_root("/var/www/videos")).unwrap();
//!     let app = Router::new().nest("/videos", router(Arc::new(service)));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! [1]: https://docs.rs/axum

mod browser;
mod config;
mod error;
mod file;
mod handler;
mod plan;
mod range;
mod resolve;
mod sniff;
mod stream;
mod validate;

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::SystemTime;

use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncRead, AsyncSeek};

pub use browser::{BrowserClassifier, PatternClassifier};
pub use config::{
    StreamConfig, DEFAULT_CACHE_DURATION_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_FIRST_CHUNK_SIZE,
    DEFAULT_LEGACY_BROWSER_PATTERN,
};
pub use error::{ConfigError, StreamError};
pub use file::KnownSize;
pub use handler::{router, stream_video};
pub use plan::{DeliveryPlan, Planner};
pub use range::RequestedRange;
pub use resolve::{resolve_file, sanitize_relative_path, FileDescriptor};
pub use sniff::{sniff_file, sniff_mime};
pub use stream::RangedStream;
pub use validate::validate;

/// [`AsyncSeek`] narrowed to only allow seeking from start.
pub trait AsyncSeekStart {
    /// Same semantics as [`AsyncSeek::start_seek`], always passing position as the `SeekFrom::Start` variant.
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()>;

    /// Same semantics as [`AsyncSeek::poll_complete`], returning `()` instead of the new stream position.
    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>>;
}

impl<T: AsyncSeek> AsyncSeekStart for T {
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()> {
        AsyncSeek::start_seek(self, io::SeekFrom::Start(position))
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncSeek::poll_complete(self, cx).map_ok(|_| ())
    }
}

/// An [`AsyncRead`] and [`AsyncSeekStart`] with a fixed known byte size.
pub trait RangeBody: AsyncRead + AsyncSeekStart {
    /// The total size of the underlying file.
    ///
    /// This should not change for the lifetime of the object once queried.
    /// Behaviour is not guaranteed if it does change.
    fn byte_size(&self) -> u64;
}

/// What the HTTP layer hands over for one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoRequest<'a> {
    /// Path relative to the storage root, still percent-encoded.
    pub path: &'a str,
    /// Raw `Range` header value.
    pub range: Option<&'a str>,
    /// Raw `User-Agent` header value.
    pub user_agent: Option<&'a str>,
}

/// A request that passed resolution and validation, with its plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub file: FileDescriptor,
    pub range: RequestedRange,
    pub plan: DeliveryPlan,
}

/// The streaming service: immutable configuration plus the browser
/// classifier, shared by all requests.
pub struct StreamVideo {
    config: StreamConfig,
    storage_root: PathBuf,
    classifier: Box<dyn BrowserClassifier>,
}

impl std::fmt::Debug for StreamVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamVideo")
            .field("config", &self.config)
            .field("storage_root", &self.storage_root)
            .finish()
    }
}

impl StreamVideo {
    /// Builds the service, classifying browsers with the configured pattern.
    pub fn new(config: StreamConfig) -> Result<Self, ConfigError> {
        let classifier = PatternClassifier::new(&config.legacy_browser_pattern)?;
        Self::with_classifier(config, classifier)
    }

    /// Builds the service with a custom browser classifier.
    ///
    /// Fails if the config is invalid or the storage root cannot be
    /// canonicalized.
    pub fn with_classifier(
        config: StreamConfig,
        classifier: impl BrowserClassifier + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let storage_root = std::fs::canonicalize(&config.storage_root).map_err(|source| {
            ConfigError::StorageRoot {
                path: config.storage_root.clone(),
                source,
            }
        })?;

        Ok(StreamVideo {
            config,
            storage_root,
            classifier: Box::new(classifier),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Runs resolution, validation and planning without opening the file for
    /// streaming.
    pub async fn prepare(
        &self,
        request: &VideoRequest<'_>,
        now: SystemTime,
    ) -> Result<PreparedRequest, StreamError> {
        let range = RequestedRange::parse(request.range)?;
        let file = resolve_file(&self.storage_root, request.path).await?;
        validate(&self.config, &file, &range)?;

        let planner = Planner::new(&self.config, self.classifier.as_ref());
        let plan = planner.plan(&file, &range, request.user_agent, now);
        Ok(PreparedRequest { file, range, plan })
    }

    /// Runs the whole pipeline and opens the source for streaming.
    pub async fn respond(
        &self,
        request: &VideoRequest<'_>,
    ) -> Result<VideoResponse<KnownSize<tokio::fs::File>>, StreamError> {
        let prepared = self.prepare(request, SystemTime::now()).await?;
        self.open(prepared).await
    }

    /// Opens the file of a prepared request.
    ///
    /// Nothing has been sent when this returns, so a file that vanished or
    /// became unreadable since validation still maps to a clean `500`.
    pub async fn open(
        &self,
        prepared: PreparedRequest,
    ) -> Result<VideoResponse<KnownSize<tokio::fs::File>>, StreamError> {
        let PreparedRequest { file, plan, .. } = prepared;

        let body = KnownSize::open(&file.absolute_path).await.map_err(|source| {
            tracing::error!(
                path = %file.absolute_path.display(),
                error = %source,
                "failed to open validated file"
            );
            StreamError::Internal {
                path: file.absolute_path.clone(),
                source,
            }
        })?;

        Ok(VideoResponse::new(plan, body))
    }
}

/// Headers, status and body for a planned response. Implements [`IntoResponse`].
#[derive(Debug)]
pub struct VideoResponse<B> {
    plan: DeliveryPlan,
    stream: RangedStream<B>,
}

impl<B: RangeBody + Send + 'static> VideoResponse<B> {
    pub fn new(plan: DeliveryPlan, body: B) -> Self {
        let stream = RangedStream::new(body, plan.stream_from, plan.content_length());
        VideoResponse { plan, stream }
    }

    pub fn plan(&self) -> &DeliveryPlan {
        &self.plan
    }

    pub fn into_parts(self) -> (DeliveryPlan, RangedStream<B>) {
        (self.plan, self.stream)
    }
}

impl<B: RangeBody + Send + 'static> IntoResponse for VideoResponse<B> {
    fn into_response(self) -> Response {
        let status = self.plan.status();
        (status, self.plan.headers, self.stream).into_response()
    }
}
