//! Client for the shop's REST backend.
//!
//! # Architecture
//!
//! - [`HttpTransport`] is the seam to the network; [`ReqwestTransport`] is the
//!   production implementation and tests substitute a mock
//! - [`BackendClient`] has one typed method per endpoint and caches the
//!   catalogue and category list with `moka`
//! - The backend is the source of truth for products, orders and users; the
//!   storefront keeps only the cart, the bearer token and the user profile in
//!   the visitor's session
//!
//! # Errors
//!
//! Non-2xx responses become [`ApiError`]. The backend reports failures as a
//! plain string, an object with a `detail` field, or a list of validation
//! errors; [`extract_error_message`] turns any of these into one line of text
//! that can be shown next to the form that caused it.
//!
//! # Example
//!
//! ```rust,ignore
//! use origami_storefront::api::{BackendClient, ProductQuery};
//!
//! let client = BackendClient::from_config(&config.api)?;
//! let token = client.login("ana@papel.co", "grulla123").await?;
//! let profile = client.me(&token).await?;
//! let page = client.list_products(&ProductQuery::default()).await?;
//! ```

mod client;
mod transport;
pub mod types;

pub use client::{BackendClient, EnrollmentOutcome, ProductPage, ProductQuery};
#[cfg(test)]
pub use transport::MockHttpTransport;
pub use transport::{
    ApiRequest, ApiResponse, AuthToken, HttpTransport, ReqwestTransport, RequestBody,
    TransportError,
};
pub use types::*;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the shop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A request carrying a bearer token was refused with 401.
    #[error("Session token rejected")]
    Unauthorized,

    /// The user is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request with a message for the user.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request body could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Text to show the visitor next to the form or list that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Forbidden(message) | Self::NotFound(message) | Self::Rejected { message, .. } => {
                message.clone()
            }
            Self::Unauthorized => "Tu sesión expiró. Inicia sesión nuevamente.".to_string(),
            Self::Transport(_) => {
                "No pudimos conectar con la tienda. Intenta de nuevo en unos segundos.".to_string()
            }
            Self::Encode(_) | Self::Decode { .. } => {
                "La tienda respondió de forma inesperada. Intenta de nuevo.".to_string()
            }
        }
    }

    /// HTTP status reported by the backend, when there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(_) | Self::Encode(_) | Self::Decode { .. } => None,
        }
    }

    /// Whether this is a server-side failure worth reporting to Sentry.
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Encode(_) | Self::Decode { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Unauthorized | Self::Forbidden(_) | Self::NotFound(_) => false,
        }
    }
}

/// Turn a backend error payload into a single user-facing line.
///
/// - a list of `{loc, msg}` entries becomes `loc→path: msg, ...`
/// - an object with a string `detail` yields that string
/// - an object whose `detail` is a list is formatted like a bare list
/// - a string is returned as is
/// - anything else is rendered as JSON
#[must_use]
pub fn extract_error_message(data: &Value) -> String {
    match data {
        Value::Array(errors) => format_validation_errors(errors),
        Value::Object(fields) => match fields.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            Some(Value::Array(errors)) => format_validation_errors(errors),
            _ => data.to_string(),
        },
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Extract a message from a raw response body, using `fallback` when the
/// body is empty or not JSON.
#[must_use]
pub fn message_from_body(body: &str, fallback: &str) -> String {
    if body.trim().is_empty() {
        return fallback.to_string();
    }
    serde_json::from_str::<Value>(body)
        .map_or_else(|_| fallback.to_string(), |data| extract_error_message(&data))
}

fn format_validation_errors(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|error| {
            let location = error
                .get("loc")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .map(|part| match part {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join("→")
                })
                .filter(|joined| !joined.is_empty())
                .unwrap_or_else(|| "campo".to_string());
            let message = match error.get("msg") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            format!("{location}: {message}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_list() {
        let data = json!([
            {"loc": ["body", "precio"], "msg": "must be greater than 0"},
            {"loc": ["body", "items", 0, "cantidad"], "msg": "field required"},
        ]);
        assert_eq!(
            extract_error_message(&data),
            "body→precio: must be greater than 0, body→items→0→cantidad: field required"
        );
    }

    #[test]
    fn test_validation_list_without_location() {
        let data = json!([{"msg": "invalid"}, {"loc": [], "msg": "empty"}]);
        assert_eq!(extract_error_message(&data), "campo: invalid, campo: empty");
    }

    #[test]
    fn test_detail_string() {
        let data = json!({"detail": "Correo ya registrado"});
        assert_eq!(extract_error_message(&data), "Correo ya registrado");
    }

    #[test]
    fn test_detail_list() {
        let data = json!({"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email"}]});
        assert_eq!(
            extract_error_message(&data),
            "body→email: value is not a valid email"
        );
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(extract_error_message(&json!("Sin stock")), "Sin stock");
    }

    #[test]
    fn test_fallback_is_json() {
        assert_eq!(
            extract_error_message(&json!({"error": "boom"})),
            r#"{"error":"boom"}"#
        );
        assert_eq!(extract_error_message(&json!({"detail": ""})), r#"{"detail":""}"#);
        assert_eq!(extract_error_message(&json!(42)), "42");
    }

    #[test]
    fn test_message_from_body() {
        assert_eq!(
            message_from_body(r#"{"detail":"No autorizado"}"#, "Error"),
            "No autorizado"
        );
        assert_eq!(message_from_body("", "Error al crear pedido"), "Error al crear pedido");
        assert_eq!(
            message_from_body("<html>502</html>", "Error al crear pedido"),
            "Error al crear pedido"
        );
    }

    #[test]
    fn test_user_message_and_status() {
        let err = ApiError::Rejected {
            status: 422,
            message: "campo: requerido".to_string(),
        };
        assert_eq!(err.user_message(), "campo: requerido");
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_server_fault());

        let err = ApiError::Rejected {
            status: 500,
            message: "Error creando pedido".to_string(),
        };
        assert!(err.is_server_fault());
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
    }
}
