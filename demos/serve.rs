//! Serves a video directory on `STREAM_VIDEO_ADDR` (default `0.0.0.0:3000`).
//!
//! ```text
//! cargo run --example serve -- stream.toml
//! curl -H 'Range: bytes=0-' http://localhost:3000/videos/clip.mov -o /dev/null -D -
//! ```

use std::sync::Arc;

use axum::Router;
use axum_stream_video::{router, StreamConfig, StreamVideo};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STREAM_VIDEO_CONFIG").ok());
    let config = match config_path {
        Some(path) => StreamConfig::load(path).await?,
        None => StreamConfig::default(),
    };

    let service = StreamVideo::new(config)?;
    tracing::info!(root = %service.config().storage_root.display(), "serving videos");

    let app = Router::new().nest("/videos", router(Arc::new(service)));

    let addr = std::env::var("STREAM_VIDEO_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
