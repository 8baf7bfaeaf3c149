//! Round-trip and framing tests for the response codec.

use bytes::Bytes;
use futures::stream;
use http::header::HeaderValue;
use http::{Response, StatusCode, Version};
use http_body::Frame;
use http_body_util::{Full, StreamBody};
use urlstash_core::FramingError;
use urlstash_http::{StashBody, codec};

type ChunkStream = StreamBody<
    futures::stream::Iter<std::vec::IntoIter<Result<Frame<Bytes>, std::io::Error>>>,
>;

fn chunked_body(chunks: &[&'static [u8]]) -> StashBody<ChunkStream> {
    let frames: Vec<Result<Frame<Bytes>, std::io::Error>> = chunks
        .iter()
        .map(|chunk| Ok(Frame::data(Bytes::from_static(chunk))))
        .collect();
    StashBody::Passthrough(StreamBody::new(stream::iter(frames)))
}

#[tokio::test]
async fn round_trip_preserves_status_version_headers_and_body() {
    let mut response = Response::new(StashBody::Passthrough(Full::new(Bytes::from_static(
        b"hello world",
    ))));
    *response.status_mut() = StatusCode::NON_AUTHORITATIVE_INFORMATION;
    *response.version_mut() = Version::HTTP_11;
    let headers = response.headers_mut();
    headers.insert("content-type", HeaderValue::from_static("text/plain"));
    headers.insert("content-length", HeaderValue::from_static("11"));
    headers.append("set-cookie", HeaderValue::from_static("a=1"));
    headers.append("set-cookie", HeaderValue::from_static("b=2"));
    let expected_headers = headers.clone();

    let entry = codec::drain(response).await.unwrap();
    assert_eq!(entry.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    assert_eq!(entry.version(), Version::HTTP_11);
    assert!(!entry.chunked());
    assert_eq!(entry.body().as_ref(), b"hello world");

    let rehydrated = codec::rehydrate::<Full<Bytes>>(entry);
    assert_eq!(
        rehydrated.status(),
        StatusCode::NON_AUTHORITATIVE_INFORMATION
    );
    assert_eq!(rehydrated.version(), Version::HTTP_11);

    let original: Vec<_> = expected_headers.iter().collect();
    let restored: Vec<_> = rehydrated.headers().iter().collect();
    assert_eq!(original, restored);

    let body = rehydrated.into_body().collect().await.unwrap();
    assert_eq!(body.as_ref(), b"hello world");
}

#[tokio::test]
async fn chunked_and_fixed_length_drain_to_identical_bytes() {
    let mut chunked = Response::new(chunked_body(&[b"hel", b"lo, ", b"world"]));
    chunked
        .headers_mut()
        .insert("transfer-encoding", HeaderValue::from_static("chunked"));

    let mut fixed = Response::new(StashBody::Passthrough(Full::new(Bytes::from_static(
        b"hello, world",
    ))));
    fixed
        .headers_mut()
        .insert("content-length", HeaderValue::from_static("12"));

    let chunked_entry = codec::drain(chunked).await.unwrap();
    let fixed_entry = codec::drain(fixed).await.unwrap();

    assert!(chunked_entry.chunked());
    assert!(!fixed_entry.chunked());
    assert_eq!(chunked_entry.body(), fixed_entry.body());
}

#[tokio::test]
async fn empty_body_round_trips() {
    let response = Response::new(StashBody::<Full<Bytes>>::Complete(None));
    let entry = codec::drain(response).await.unwrap();
    assert!(entry.body().is_empty());

    let rehydrated = codec::rehydrate::<Full<Bytes>>(entry);
    let body = rehydrated.into_body().collect().await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn mid_stream_failure_surfaces_as_framing_error() {
    let frames: Vec<Result<Frame<Bytes>, std::io::Error>> = vec![
        Ok(Frame::data(Bytes::from_static(b"partial"))),
        Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection reset mid-chunk",
        )),
    ];
    let body: StashBody<ChunkStream> = StashBody::Passthrough(StreamBody::new(stream::iter(frames)));
    let response = Response::new(body);

    let result = codec::drain(response).await;
    assert!(matches!(result, Err(FramingError::Read(_))));
}

#[test]
fn transfer_encoding_detection_is_case_insensitive() {
    let mut headers = http::HeaderMap::new();
    headers.insert("transfer-encoding", HeaderValue::from_static("Chunked"));
    assert!(codec::is_chunked(&headers));

    let mut combined = http::HeaderMap::new();
    combined.insert(
        "transfer-encoding",
        HeaderValue::from_static("gzip, chunked"),
    );
    assert!(codec::is_chunked(&combined));

    assert!(!codec::is_chunked(&http::HeaderMap::new()));
}
