use std::time::{Duration, SystemTime};

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use httpdate::fmt_http_date;

use crate::browser::BrowserClassifier;
use crate::config::StreamConfig;
use crate::range::RequestedRange;
use crate::resolve::FileDescriptor;
use crate::sniff::OCTET_STREAM;

/// The byte window one response delivers, with its headers.
///
/// `stream_from..=stream_till` is always inside the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub stream_from: u64,
    pub stream_till: u64,
    /// `206 Partial Content` with a `Content-Range`, or a plain `200`.
    pub is_partial: bool,
    pub headers: HeaderMap,
}

impl DeliveryPlan {
    pub fn content_length(&self) -> u64 {
        self.stream_till - self.stream_from + 1
    }

    pub fn status(&self) -> StatusCode {
        if self.is_partial {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        }
    }
}

/// Chooses how much of a file to send and how to frame it.
pub struct Planner<'a> {
    config: &'a StreamConfig,
    classifier: &'a dyn BrowserClassifier,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a StreamConfig, classifier: &'a dyn BrowserClassifier) -> Self {
        Planner { config, classifier }
    }

    /// Plans the response for a validated request.
    ///
    /// `file.size` must be non-zero and `range.start` below it, which
    /// [`validate`](crate::validate::validate) guarantees. `now` anchors the
    /// `Expires` header.
    pub fn plan(
        &self,
        file: &FileDescriptor,
        range: &RequestedRange,
        user_agent: Option<&str>,
        now: SystemTime,
    ) -> DeliveryPlan {
        let size = file.size;
        let stream_from = range.start;
        let mut headers = self.common_headers(file, now);
        let first_request = stream_from == 0 && range.is_probe();

        if first_request {
            let legacy = user_agent.is_some_and(|ua| self.classifier.is_legacy_safari(ua));
            if legacy {
                // these clients stall on a 206 to their first request
                tracing::debug!(file = %file.name, size, "serving whole file to legacy browser");
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
                return DeliveryPlan {
                    stream_from: 0,
                    stream_till: size - 1,
                    is_partial: false,
                    headers,
                };
            }
        }

        let stream_till = if first_request {
            self.config.first_chunk_size.min(size).max(1) - 1
        } else {
            let quantum = if stream_from == 0 {
                self.config.first_chunk_size
            } else {
                self.config.chunk_size
            };
            stream_from.saturating_add(quantum).min(size - 1)
        };

        let mut plan = DeliveryPlan {
            stream_from,
            stream_till,
            is_partial: true,
            headers,
        };
        let content_length = plan.content_length();
        plan.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
        plan.headers.insert(
            header::CONTENT_RANGE,
            text_value(format!("bytes {stream_from}-{stream_till}/{size}")),
        );

        tracing::debug!(
            file = %file.name,
            from = stream_from,
            till = stream_till,
            size,
            "planned partial response"
        );
        plan
    }

    fn common_headers(&self, file: &FileDescriptor, now: SystemTime) -> HeaderMap {
        let cache = self.config.cache_duration_secs;
        let expires = now + Duration::from_secs(cache);

        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&file.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::CACHE_CONTROL, text_value(format!("max-age={cache}, public")));
        headers.insert(header::EXPIRES, text_value(fmt_http_date(expires)));
        headers.insert(header::LAST_MODIFIED, text_value(fmt_http_date(file.modified_at)));
        headers.insert(
            header::ACCEPT_RANGES,
            text_value(format!("0-{}", file.size.saturating_sub(1))),
        );
        headers
    }
}

// numbers, separators and HTTP dates only
fn text_value(value: String) -> HeaderValue {
    HeaderValue::try_from(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}
