//! Route-level tests against the fully layered router, with stub generators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode};
use tower::ServiceExt;

use sub_gateway::config::Environment;
use sub_gateway::{ConfigGenerator, GatewayConfig, GeneratorError, GeneratorResult, GeneratorSet, HttpServer, RequestDescriptor};

/// Answers with a fixed body and a set of upstream-looking headers.
struct Stub {
    body: &'static str,
    calls: AtomicUsize,
}

impl Stub {
    fn new(body: &'static str) -> Arc<Self> {
        Arc::new(Self { body, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigGenerator for Stub {
    async fn generate(&self, _descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut headers = HeaderMap::new();
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert("subscription-userinfo", HeaderValue::from_static("upload=0; download=1; total=2"));
        Ok(GeneratorResult {
            status: None,
            headers,
            data: self.body.into(),
        })
    }
}

struct Failing;

#[async_trait]
impl ConfigGenerator for Failing {
    async fn generate(&self, _descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError> {
        Err(GeneratorError::UnknownTemplate("9.99".into()))
    }
}

struct Harness {
    server: HttpServer,
    v2ray: Arc<Stub>,
    singbox: Arc<Stub>,
}

fn harness(environment: Environment) -> Harness {
    let v2ray = Stub::new("dm1lc3M6Ly8=");
    let singbox = Stub::new(r#"{"outbounds":[{"tag":"hk"}]}"#);
    let generators = GeneratorSet {
        v2ray: v2ray.clone(),
        mihomo: Arc::new(Failing),
        singbox: singbox.clone(),
    };
    let config = GatewayConfig { environment, ..GatewayConfig::default() };
    Harness {
        server: HttpServer::with_generators(config, generators),
        v2ray,
        singbox,
    }
}

async fn get(server: &HttpServer, target: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(target)
        .header(header::HOST, "sub.example.com")
        .body(Body::empty())
        .unwrap();
    server.router().oneshot(request).await.unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_landing_page_without_links() {
    let h = harness(Environment::Development);
    for target in ["/", "/?singbox=true", "/?url=", "/?url=%20"] {
        let response = get(&h.server, target).await;
        assert_eq!(response.status(), StatusCode::OK, "{target}");
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"), "{target}");
        assert!(body_text(response).await.contains("<form"));
    }
    assert_eq!(h.singbox.calls() + h.v2ray.calls(), 0);
}

#[tokio::test]
async fn test_missing_format_is_400() {
    let h = harness(Environment::Development);
    let response = get(&h.server, "/?url=https%3A%2F%2Fprovider.example%2Fs&udp=true").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("singbox, mihomo or v2ray"));
    assert_eq!(h.singbox.calls() + h.v2ray.calls(), 0);
}

#[tokio::test]
async fn test_generated_response_headers() {
    let h = harness(Environment::Development);
    let response = get(&h.server, "/?url=a%2Cb&singbox=true&v2ray=true").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.singbox.calls(), 1);
    assert_eq!(h.v2ray.calls(), 0);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(headers["profile-web-page-url"], "http://sub.example.com");
    assert_eq!(headers["subscription-userinfo"], "upload=0; download=1; total=2");
    assert!(headers.get(header::TRANSFER_ENCODING).is_none());
    assert!(headers.get(header::CONTENT_ENCODING).is_none());
    assert!(headers.get(header::CONNECTION).is_none());
    assert!(headers.get("x-request-id").is_some());

    assert_eq!(body_text(response).await, r#"{"outbounds":[{"tag":"hk"}]}"#);
}

#[tokio::test]
async fn test_generator_failure_trace_by_environment() {
    let dev = harness(Environment::Development);
    let response = get(&dev.server, "/?url=a&mihomo=true").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("9.99"));
    assert!(json["trace"].is_array());

    let prod = harness(Environment::Production);
    let response = get(&prod.server, "/?url=a&mihomo=true").await;
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].is_string());
    assert!(json.get("trace").is_none());
}

#[tokio::test]
async fn test_health() {
    let h = harness(Environment::Production);
    let response = get(&h.server, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let h = harness(Environment::Development);
    let response = get(&h.server, "/admin").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
