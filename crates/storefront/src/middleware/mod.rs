//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and Sentry scope)
//! 4. CSP nonce (per-request nonce for the inline script)
//! 5. Security headers (CSP built from the nonce)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//! 7. Session expiry (clears a token the backend refused)
//! 8. Rate limiting on form posts (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_expiry;

pub use auth::{
    AuthRejection, LOGIN_PATH, OptionalAuth, RequireAdmin, RequireAuth, clear_signed_in, is_htmx,
    redirect, set_signed_in,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{auth_rate_limiter, order_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
pub use session_expiry::{EXPIRED_LOGIN_PATH, SessionExpired, session_expiry_middleware};
