//! HttpTransport against a local stub server

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Router;
use drift_client::{ApiRequest, HttpTransport, Transport, TransportError};
use drift_config::Authentication;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as the stub server saw it
#[derive(Debug)]
struct Recorded {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone)]
struct Stub {
    responses: Arc<Mutex<VecDeque<(u16, &'static str, &'static str)>>>,
    requests: mpsc::UnboundedSender<Recorded>,
}

async fn respond(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _ = stub.requests.send(Recorded {
        method,
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let next = stub.responses.lock().unwrap().pop_front();
    let Some((status, content_type, body)) = next else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let x_stub = HeaderName::from_static("x-stub");
    (
        StatusCode::from_u16(status).unwrap(),
        AppendHeaders([
            (header::CONTENT_TYPE, content_type),
            (x_stub.clone(), "a"),
            (x_stub, "b"),
        ]),
        body,
    )
        .into_response()
}

/// Serves `responses` in order and reports each request
async fn stub_server(
    responses: Vec<(u16, &'static str, &'static str)>,
) -> (String, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = Stub {
        responses: Arc::new(Mutex::new(responses.into())),
        requests: tx,
    };
    let app = Router::new().fallback(respond).with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), rx)
}

#[tokio::test]
async fn test_post_with_basic_auth() {
    let (base, mut requests) =
        stub_server(vec![(200, "application/json", r#"{"status":"ok"}"#)]).await;
    let auth = Authentication {
        token_url: None,
        client_id: Some("user".to_string()),
        client_secret: Some("pass".to_string()),
    };
    let transport = HttpTransport::new(Some(&auth)).unwrap();

    let response = transport
        .send(
            &ApiRequest::new("post", format!("{}/api/accounts", base))
                .header("Content-Type", "application/json")
                .body(r#"{"id":1}"#),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"status":"ok"}"#);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("x-stub"), Some("a, b"));

    let seen = requests.recv().await.unwrap();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/api/accounts");
    // base64("user:pass")
    assert_eq!(seen.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert_eq!(seen.body, r#"{"id":1}"#);

    assert_eq!(transport.auth_descriptor()["username"], "user");
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let (base, _requests) = stub_server(vec![(503, "text/html", "<html>down</html>")]).await;
    let transport = HttpTransport::new(None).unwrap();

    let response = transport
        .send(&ApiRequest::new("GET", format!("{}/health", base)))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert!(!response.is_success());
    assert_eq!(response.body, "<html>down</html>");
}

#[tokio::test]
async fn test_oauth_token_fetched_once_and_reused() {
    let (base, mut requests) = stub_server(vec![
        (
            200,
            "application/json",
            r#"{"access_token":"tok-1","expires_in":3600}"#,
        ),
        (200, "application/json", "{}"),
        (200, "application/json", "{}"),
    ])
    .await;
    let auth = Authentication {
        token_url: Some(format!("{}/oauth/token", base)),
        client_id: Some("cid".to_string()),
        client_secret: Some("secret".to_string()),
    };
    let transport = HttpTransport::new(Some(&auth)).unwrap();

    for _ in 0..2 {
        let response = transport
            .send(&ApiRequest::new("GET", format!("{}/data", base)))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    let token_request = requests.recv().await.unwrap();
    assert_eq!(token_request.method, Method::POST);
    assert_eq!(token_request.path, "/oauth/token");
    assert!(token_request.body.contains("grant_type=client_credentials"));
    assert!(token_request.body.contains("client_id=cid"));

    for _ in 0..2 {
        let call = requests.recv().await.unwrap();
        assert_eq!(call.method, Method::GET);
        assert_eq!(call.path, "/data");
        assert_eq!(call.header("authorization"), Some("Bearer tok-1"));
    }
}

#[tokio::test]
async fn test_rejected_token_request_is_error() {
    let (base, _requests) = stub_server(vec![(401, "application/json", r#"{"error":"nope"}"#)]).await;
    let auth = Authentication {
        token_url: Some(format!("{}/oauth/token", base)),
        client_id: Some("cid".to_string()),
        client_secret: None,
    };
    let transport = HttpTransport::new(Some(&auth)).unwrap();

    let err = transport
        .send(&ApiRequest::new("GET", format!("{}/data", base)))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::TokenRejected { status: 401, .. }));
}

#[tokio::test]
async fn test_invalid_method_is_error() {
    let transport = HttpTransport::new(None).unwrap();
    let err = transport
        .send(&ApiRequest::new("NOT A METHOD", "http://127.0.0.1:1/"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidMethod(_)));
}
