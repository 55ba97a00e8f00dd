//! HTTP transport abstraction for testability.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Bearer token issued by `/auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A request to the backend, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without a leading slash, e.g. `pedidos/mis-pedidos`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<AuthToken>,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(mut self, token: &AuthToken) -> Self {
        self.bearer = Some(token.clone());
        self
    }

    /// Attach a bearer token when the visitor has one.
    #[must_use]
    pub fn maybe_bearer(mut self, token: Option<&AuthToken>) -> Self {
        self.bearer = token.cloned();
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Send `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `body` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send `pairs` as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }
}

/// Response status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors raised before a response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request path {path}: {message}")]
    InvalidPath { path: String, message: String },
    #[error("{method} {path} timed out")]
    Timeout { method: Method, path: String },
    #[error("{method} {path} failed: {message}")]
    Request {
        method: Method,
        path: String,
        message: String,
    },
}

/// Abstraction over the HTTP client for dependency injection.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the status and body, whatever the status.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the TLS backend cannot be initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("origami-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidPath {
                path: request.path.clone(),
                message: e.to_string(),
            })?;

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request)?;
        tracing::debug!(method = %request.method, path = %request.path, "backend request");

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.expose());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method: request.method.clone(),
                    path: request.path.clone(),
                }
            } else {
                TransportError::Request {
                    method: request.method.clone(),
                    path: request.path.clone(),
                    message: e.to_string(),
                }
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            bytes = body.len(),
            "backend response"
        );
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn transport(base: &str) -> ReqwestTransport {
        ReqwestTransport::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn url_keeps_api_prefix_and_encodes_query() {
        let transport = transport("http://localhost:8000/api/");
        let request = ApiRequest::get("/productos/")
            .query("q", "grulla roja")
            .query("limit", 12);
        let url = transport.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/productos/?q=grulla+roja&limit=12"
        );
    }

    #[test]
    fn builder_sets_body_and_token() {
        let token = AuthToken::new("abc");
        let request = ApiRequest::post("auth/login")
            .form(&[("username", "ana@papel.co"), ("password", "secreto")])
            .bearer(&token);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.bearer, Some(token));
        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("username".to_string(), "ana@papel.co".to_string()),
                ("password".to_string(), "secreto".to_string()),
            ])
        );
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("eyJhbGciOi");
        assert!(!format!("{token:?}").contains("eyJ"));
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_error() {
        // Port 1 is reserved and unbound.
        let transport = transport("http://127.0.0.1:1/api/");
        let err = transport
            .send(ApiRequest::get("categorias/"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, TransportError::Request { ref path, .. } if path == "categorias/"),
            "{err}"
        );
    }
}
