//! CORS preflight for the `/topics` endpoints.
//!
//! The requested method is echoed into `Access-Control-Allow-Methods`
//! and each requested header is canonicalized (title-case per
//! hyphenated token) before being echoed into
//! `Access-Control-Allow-Headers`.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub async fn preflight(headers: HeaderMap) -> Response {
    let mut allowed: Vec<String> = Vec::new();
    for value in headers.get_all("access-control-request-headers") {
        let Ok(list) = value.to_str() else { continue };
        for requested in list.split(',') {
            let canonical = canonical_header(requested.trim());
            if !canonical.is_empty() {
                allowed.push(canonical);
            }
        }
    }

    let method = headers
        .get("access-control-request-method")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let mut response = StatusCode::OK.into_response();
    let out = response.headers_mut();
    if !allowed.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            out.insert("access-control-allow-headers", value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(method) {
        out.insert("access-control-allow-methods", value);
    }
    response
}

/// `x-sizes` → `X-Sizes`, `CONTENT-type` → `Content-Type`.
fn canonical_header(name: &str) -> String {
    name.split('-')
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_header_names() {
        assert_eq!(canonical_header("x-sizes"), "X-Sizes");
        assert_eq!(canonical_header("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_header("accept"), "Accept");
        assert_eq!(canonical_header(""), "");
    }
}
