//! Drops a rejected bearer token from the session.
//!
//! Handlers that see [`ApiError::Unauthorized`](crate::api::ApiError) return
//! [`AppError::SessionExpired`](crate::error::AppError), which marks the
//! response with [`SessionExpired`]. This middleware runs inside the session
//! layer, clears the token and profile, and sends the visitor to the login
//! page. The cart survives.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header::LOCATION},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use super::auth::{clear_signed_in, is_htmx};

/// Response extension set when the backend refused the visitor's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Where expired visitors are sent.
pub const EXPIRED_LOGIN_PATH: &str = "/auth/login?expired=1";

/// Middleware that clears the session's token when a handler reports it expired.
pub async fn session_expiry_middleware(request: Request, next: Next) -> Response {
    let htmx = is_htmx(request.headers());
    let session = request.extensions().get::<Session>().cloned();

    let mut response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    if let Some(session) = session {
        if let Err(e) = clear_signed_in(&session).await {
            tracing::error!(error = %e, "failed to clear expired token from session");
        }
    }
    tracing::info!("backend rejected session token, sending visitor to login");

    let location = HeaderValue::from_static(EXPIRED_LOGIN_PATH);
    if htmx {
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().remove(LOCATION);
        response.headers_mut().insert("HX-Redirect", location);
    } else {
        *response.status_mut() = StatusCode::SEE_OTHER;
        response.headers_mut().insert(LOCATION, location);
    }
    response
}
