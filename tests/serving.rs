use std::time::{Duration, SystemTime};

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Response, StatusCode};

use optserve::config::ServeConfig;
use optserve::http::{fingerprint, RequestSignal, ResponseDescriptor};
use optserve::serve::{DirFs, FileServer, MemoryFs, Payload, Pipeline};

async fn body(resp: Response<Full<Bytes>>) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

fn signal(pairs: &[(header::HeaderName, &'static str)]) -> RequestSignal {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(name.clone(), HeaderValue::from_static(value));
    }
    RequestSignal::from_parts(&Method::GET, &headers)
}

fn stylesheet() -> String {
    ".button { padding: 4px 8px; border-radius: 2px; }\n".repeat(64)
}

fn asset_server() -> FileServer<MemoryFs> {
    let mut fs = MemoryFs::new();
    fs.insert(
        "css/site.css",
        stylesheet(),
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
    );

    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.resize(2048, 0);
    fs.insert("img/logo.png", png, None);

    FileServer::new(fs, Pipeline::new(ServeConfig::default()))
}

#[test]
fn fingerprint_tracks_every_byte() {
    let base = stylesheet().into_bytes();
    let etag = fingerprint(&base);
    assert_eq!(etag, fingerprint(&base));

    for i in (0..base.len()).step_by(97) {
        let mut changed = base.clone();
        changed[i] ^= 0x01;
        assert_ne!(fingerprint(&changed), etag, "byte {i}");
    }
}

#[tokio::test]
async fn revalidation_round_trip() {
    let server = asset_server();

    let first = server.serve("/css/site.css", &signal(&[(header::ACCEPT_ENCODING, "gzip, deflate, br")]));
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get(header::CONTENT_ENCODING).unwrap(), "br");
    assert_eq!(
        first.headers().get(header::LAST_MODIFIED).unwrap(),
        "Tue, 14 Nov 2023 22:13:20 GMT"
    );
    let etag = first.headers().get(header::ETAG).unwrap().to_str().unwrap().to_string();
    assert_eq!(etag, fingerprint(stylesheet().as_bytes()));

    let mut headers = HeaderMap::new();
    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap());
    let second = server.serve("/css/site.css", &RequestSignal::from_parts(&Method::GET, &headers));
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(second.headers().get(header::CONTENT_TYPE).is_none());
    assert!(second.headers().get(header::CONTENT_ENCODING).is_none());
    assert!(body(second).await.is_empty());
}

#[tokio::test]
async fn stale_if_match_fails_precondition() {
    let server = asset_server();
    let resp = server.serve(
        "css/site.css",
        &signal(&[
            (header::IF_MATCH, "\"0123456789abcdef\""),
            (header::ACCEPT_ENCODING, "zstd"),
        ]),
    );
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
    assert!(body(resp).await.is_empty());

    let wildcard = server.serve("css/site.css", &signal(&[(header::IF_MATCH, "*")]));
    assert_eq!(wildcard.status(), StatusCode::OK);
}

#[tokio::test]
async fn zstd_body_decodes_to_original() {
    let server = asset_server();
    let resp = server.serve("css/site.css", &signal(&[(header::ACCEPT_ENCODING, "br, zstd")]));
    assert_eq!(resp.headers().get(header::CONTENT_ENCODING).unwrap(), "zstd");
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );

    let encoded = body(resp).await;
    let decoded = zstd::stream::decode_all(encoded.as_ref()).unwrap();
    assert_eq!(decoded, stylesheet().into_bytes());
}

#[tokio::test]
async fn exempt_image_keeps_range_support() {
    let server = asset_server();
    let resp = server.serve(
        "img/logo.png",
        &signal(&[(header::ACCEPT_ENCODING, "zstd, br"), (header::RANGE, "bytes=0-7")]),
    );
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(resp.headers().get(header::CONTENT_RANGE).unwrap(), "bytes 0-7/2048");
    assert!(resp.headers().get(header::LAST_MODIFIED).is_none());
    assert_eq!(body(resp).await.as_ref(), b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn unknown_path_is_bare_404() {
    let server = asset_server();
    let resp = server.serve("css/missing.css", &signal(&[(header::ACCEPT_ENCODING, "zstd")]));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    for name in [header::ETAG, header::LAST_MODIFIED, header::CACHE_CONTROL] {
        assert!(resp.headers().get(&name).is_none(), "{name}");
    }
    assert!(body(resp).await.is_empty());
}

#[tokio::test]
async fn uncached_pipeline_ignores_validators() {
    let pipeline = Pipeline::new(ServeConfig::default());
    let payload = Payload::new("report.json", "{\"ok\":true}");
    let etag = fingerprint(&payload.data);

    let mut headers = HeaderMap::new();
    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap());
    let request = RequestSignal::from_parts(&Method::GET, &headers);

    let resp = pipeline.serve(&request, &payload, ResponseDescriptor::new(), false);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    assert!(resp.headers().get(header::ETAG).is_none());
    assert_eq!(body(resp).await.as_ref(), b"{\"ok\":true}");
}

#[tokio::test]
async fn serves_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("js")).unwrap();
    std::fs::write(dir.path().join("js/app.js"), "console.log(1);\n".repeat(100)).unwrap();

    let server = FileServer::new(DirFs::new(dir.path()), Pipeline::new(ServeConfig::default()));
    let resp = server.serve("/js/app.js", &signal(&[]));
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::LAST_MODIFIED).is_some());
    assert_eq!(body(resp).await.len(), 1600);

    let escaped = server.serve("/../../etc/passwd", &signal(&[]));
    assert_eq!(escaped.status(), StatusCode::NOT_FOUND);
}
