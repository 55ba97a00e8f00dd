//! Per-request CSP nonce and the Content-Security-Policy it feeds.
//!
//! Pages load HTMX from unpkg and carry a small inline script for the
//! payment method toggle. The inline script is allowed through a nonce that
//! changes on every request.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Origin HTMX is served from.
pub const HTMX_CDN: &str = "https://unpkg.com";

/// A CSP nonce value for inline scripts (128-bit, base64-encoded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The `Content-Security-Policy` header value for a page using this nonce.
    ///
    /// Product images come from wherever the backend stores them, and custom
    /// order references are `data:` URLs, so images are the one relaxed
    /// directive.
    #[must_use]
    pub fn policy(&self) -> String {
        format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{nonce}' {HTMX_CDN}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' data: https: http:; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
            nonce = self.0
        )
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must run before `security_headers_middleware` so the nonce is available
/// when building the CSP header.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}
