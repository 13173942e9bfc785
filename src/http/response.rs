//! Response assembly.
//!
//! # Responsibilities
//! - Landing page → 200 HTML
//! - Generator result → copy headers minus the ones the HTTP layer owns,
//!   force the JSON content type, stamp the origin header
//! - Pipeline error → 400 JSON, with the source chain outside production
//!
//! # Design Decisions
//! - Framing headers from upstream are never forwarded; hyper recomputes them
//! - Content type is always JSON on success, whatever the generator set

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::generators::GeneratorResult;
use crate::pipeline::PipelineError;

/// Headers that describe the upstream connection, not the payload.
pub const FILTERED_HEADERS: [HeaderName; 4] = [
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
    header::CONNECTION,
];

/// Carries the gateway origin so clients can link back to the landing page.
pub const PAGE_URL_HEADER: &str = "profile-web-page-url";

const JSON_UTF8: &str = "application/json; charset=utf-8";
const HTML_UTF8: &str = "text/html; charset=utf-8";

pub fn landing_page(html: String) -> Response<Body> {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8))],
        html,
    )
        .into_response()
}

pub fn generated(result: GeneratorResult, origin: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(result.data));
    *response.status_mut() = result.status.unwrap_or(StatusCode::OK);

    let headers = response.headers_mut();
    for (name, value) in result.headers.iter() {
        // HeaderName is stored lowercase, so this is a case-insensitive match.
        if !FILTERED_HEADERS.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    match HeaderValue::from_str(origin) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(PAGE_URL_HEADER), value);
        }
        Err(_) => tracing::warn!(origin = %origin, "Origin is not a valid header value"),
    }

    response
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<String>>,
}

/// `verbose` adds the error's source chain to the body.
pub fn error(err: &PipelineError, verbose: bool) -> Response<Body> {
    let body = ErrorBody {
        error: err.to_string(),
        trace: verbose.then(|| err.trace()),
    };
    (err.status(), Json(body)).into_response()
}
