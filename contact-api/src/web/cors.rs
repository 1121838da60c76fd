//! Cross-origin headers.
//!
//! The allow-list only decides whether `Access-Control-Allow-Origin` is
//! emitted. Requests from other origins are still handled; the browser is
//! what refuses to expose the response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::Config;

/// Middleware adding CORS headers to every response, errors included.
pub async fn cors(State(config): State<Arc<Config>>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), &config, origin.as_deref());
    response
}

/// Set the CORS headers for a request from `origin`.
pub fn apply_cors_headers(headers: &mut HeaderMap, config: &Config, origin: Option<&str>) {
    if let Some(origin) = origin {
        if config.is_allowed_origin(origin) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            }
        } else {
            debug!(origin = %origin, "cors_origin_not_allowed");
        }
    }

    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(config.profile.allowed_methods()),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    #[test]
    fn test_allowed_origin_is_echoed() {
        let config = Config::for_profile(Profile::Service);
        let mut headers = HeaderMap::new();

        apply_cors_headers(&mut headers, &config, Some("http://localhost:4321"));

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:4321"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET, POST, OPTIONS"
        );
        assert_eq!(headers.get(header::VARY).unwrap(), "Origin");
    }

    #[test]
    fn test_unknown_origin_gets_no_allow_origin() {
        let config = Config::for_profile(Profile::Function);
        let mut headers = HeaderMap::new();

        apply_cors_headers(&mut headers, &config, Some("https://evil.example"));

        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "POST, OPTIONS"
        );
    }

    #[test]
    fn test_no_origin_header() {
        let config = Config::for_profile(Profile::Service);
        let mut headers = HeaderMap::new();

        apply_cors_headers(&mut headers, &config, None);

        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "Content-Type"
        );
    }
}
