use bytes::Bytes;
use flate2::read::GzDecoder;
use rask_loki_forwarder::sender::{ClientConfig, DeliveryError, HttpClient};
use std::io::Read;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUSH_PATH: &str = "/loki/api/v1/push";
const PAYLOAD: &str = r#"{"streams":[{"stream":{"app":"web"},"values":[["0","hello",{}]]}]}"#;

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(ClientConfig {
        endpoint: format!("{}{PUSH_PATH}", server.uri()),
        ..ClientConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_no_content_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("content-type", "application/json"))
        .and(body_string(PAYLOAD))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server)
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap();

    assert_eq!(report.status_code, 204);
    assert_eq!(report.bytes_sent, PAYLOAD.len());
    assert!(!report.compressed);
}

#[tokio::test]
async fn test_ok_status_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(200));
}

#[tokio::test]
async fn test_server_error_carries_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("ingester unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap_err();

    match err {
        DeliveryError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "ingester unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_gzip_body_when_compression_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("content-encoding", "gzip"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(ClientConfig {
        endpoint: format!("{}{PUSH_PATH}", server.uri()),
        enable_compression: true,
        ..ClientConfig::default()
    })
    .unwrap();

    let report = client
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap();
    assert!(report.compressed);

    let requests = server.received_requests().await.unwrap();
    let mut decoded = String::new();
    GzDecoder::new(requests[0].body.as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, PAYLOAD);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let client = HttpClient::new(ClientConfig {
        endpoint: "http://127.0.0.1:1/loki/api/v1/push".to_string(),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Transport(_)));
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_request_timeout_applies_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = HttpClient::new(ClientConfig {
        endpoint: format!("{}{PUSH_PATH}", server.uri()),
        timeout: Some(Duration::from_millis(100)),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client
        .push(Bytes::from_static(PAYLOAD.as_bytes()))
        .await
        .unwrap_err();

    match err {
        DeliveryError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_endpoint_is_rejected_at_construction() {
    let result = HttpClient::new(ClientConfig {
        endpoint: "not a url".to_string(),
        ..ClientConfig::default()
    });

    assert!(matches!(result, Err(DeliveryError::InvalidConfiguration(_))));
}
