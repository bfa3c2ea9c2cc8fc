use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum_stream_video::{router, StreamConfig, StreamVideo};
use reqwest::{header, StatusCode};

const SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

const LARGE: usize = 10_000_000;

fn movie(size: usize) -> Vec<u8> {
    let mut content = vec![0x00, 0x00, 0x00, 0x14];
    content.extend_from_slice(b"ftypqt  \x00\x00\x00\x00qt  ");
    content.extend((content.len()..size).map(|i| (i % 251) as u8));
    content
}

struct Server {
    addr: SocketAddr,
    client: reqwest::Client,
    large: Vec<u8>,
    _dir: tempfile::TempDir,
}

impl Server {
    async fn start() -> Server {
        let dir = tempfile::tempdir().unwrap();
        let large = movie(LARGE);
        tokio::fs::create_dir(dir.path().join("trips")).await.unwrap();
        tokio::fs::write(dir.path().join("large.mov"), &large).await.unwrap();
        tokio::fs::write(dir.path().join("trips/small clip.mov"), movie(100_000)).await.unwrap();
        tokio::fs::write(dir.path().join("tiny.mov"), movie(500)).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "not a video").await.unwrap();

        let service = StreamVideo::new(StreamConfig::with_root(dir.path())).unwrap();
        let app = Router::new().nest("/videos", router(Arc::new(service)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Server {
            addr,
            client: reqwest::Client::new(),
            large,
            _dir: dir,
        }
    }

    async fn get(&self, path: &str, range: Option<&str>, user_agent: &str) -> reqwest::Response {
        let mut request = self
            .client
            .get(format!("http://{}/videos/{}", self.addr, path))
            .header(header::USER_AGENT, user_agent);
        if let Some(range) = range {
            request = request.header(header::RANGE, range);
        }
        request.send().await.unwrap()
    }
}

fn header_str<'a>(response: &'a reqwest::Response, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).map(|value| value.to_str().unwrap())
}

#[tokio::test]
async fn test_missing_range_is_bad_request() {
    let server = Server::start().await;

    let response = server.get("large.mov", None, FIREFOX).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());

    let response = server.get("large.mov", Some("items=0-"), FIREFOX).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_request_small_file() {
    let server = Server::start().await;

    let response = server.get("trips/small%20clip.mov", Some("bytes=0-"), FIREFOX).await;
    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 0-99999/100000"), header_str(&response, header::CONTENT_RANGE));
    assert_eq!(Some("100000"), header_str(&response, header::CONTENT_LENGTH));
    assert_eq!(Some("video/quicktime"), header_str(&response, header::CONTENT_TYPE));
    assert_eq!(Some("max-age=604800, public"), header_str(&response, header::CACHE_CONTROL));
    assert_eq!(Some("0-99999"), header_str(&response, header::ACCEPT_RANGES));
    assert!(header_str(&response, header::EXPIRES).unwrap().ends_with(" GMT"));
    assert!(header_str(&response, header::LAST_MODIFIED).unwrap().ends_with(" GMT"));

    let body = response.bytes().await.unwrap();
    assert_eq!(movie(100_000), body);
}

#[tokio::test]
async fn test_legacy_safari_first_request() {
    let server = Server::start().await;

    let response = server.get("large.mov", Some("bytes=0-"), SAFARI).await;
    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some("10000000"), header_str(&response, header::CONTENT_LENGTH));
    assert_eq!(None, header_str(&response, header::CONTENT_RANGE));

    let body = response.bytes().await.unwrap();
    assert_eq!(server.large.len(), body.len());
    assert!(server.large == body);
}

#[tokio::test]
async fn test_subsequent_request() {
    let server = Server::start().await;

    for user_agent in [SAFARI, FIREFOX] {
        let response = server.get("large.mov", Some("bytes=500000-"), user_agent).await;
        assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
        assert_eq!(
            Some("bytes 500000-4694304/10000000"),
            header_str(&response, header::CONTENT_RANGE)
        );
        assert_eq!(Some("4194305"), header_str(&response, header::CONTENT_LENGTH));

        let body = response.bytes().await.unwrap();
        assert!(server.large[500_000..=4_694_304] == body[..]);
    }
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let server = Server::start().await;

    let response = server.get("tiny.mov", Some("bytes=600-"), FIREFOX).await;
    assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status());
    assert_eq!(Some("bytes */500"), header_str(&response, header::CONTENT_RANGE));
}

#[tokio::test]
async fn test_disallowed_media_type() {
    let server = Server::start().await;

    let response = server.get("notes.txt", Some("bytes=0-"), FIREFOX).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());

    let response = server.get("notes.txt", Some("bytes=9999-"), FIREFOX).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}

#[tokio::test]
async fn test_not_found() {
    let server = Server::start().await;

    let response = server.get("missing.mov", Some("bytes=0-"), FIREFOX).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let response = server.get("trips", Some("bytes=0-"), FIREFOX).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let response = server.get("..%2F..%2Fetc%2Fpasswd", Some("bytes=0-"), FIREFOX).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status());
}
