use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
    middleware::Next,
};

/// API responses are JSON, PDFs and uploaded images. Nothing here should
/// ever run script or be framed by another origin.
const CSP: &str = "default-src 'none'; img-src 'self' https:; style-src 'self'; object-src 'none'; base-uri 'none'; form-action 'self'; frame-ancestors 'none'";

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", CSP),
    ("referrer-policy", "no-referrer"),
    ("x-content-type-options", "nosniff"),
];

/// Adds the security headers to every response that doesn't already set them.
pub async fn csp_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let mut res = next.run(req).await;

    for (name, value) in SECURITY_HEADERS {
        if res.headers().get(*name).is_none() {
            res.headers_mut().insert(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }
    }

    res
}
