use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::StreamError;
use crate::{StreamVideo, VideoRequest};

/// Serves every file under the storage root at `/{*path}`.
///
/// Nest it to mount it under a prefix; the handler only sees the part of the
/// path after the nesting point.
pub fn router(service: Arc<StreamVideo>) -> Router {
    Router::new()
        .route("/{*path}", get(stream_video))
        .with_state(service)
}

/// Axum handler for one video request.
///
/// The path is taken from the raw request URI so that it is percent-decoded
/// exactly once, by the resolver.
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
pub async fn stream_video(
    State(service): State<Arc<StreamVideo>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = VideoRequest {
        path: uri.path(),
        range: header_str(&headers, header::RANGE),
        user_agent: header_str(&headers, header::USER_AGENT),
    };

    match service.respond(&request).await {
        Ok(response) => {
            let plan = response.plan();
            tracing::debug!(
                status = %plan.status(),
                from = plan.stream_from,
                till = plan.stream_till,
                "streaming"
            );
            response.into_response()
        }
        Err(err @ StreamError::Internal { .. }) => err.into_response(),
        Err(err) => {
            tracing::warn!(error = %err, range = ?request.range, "rejected video request");
            err.into_response()
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
