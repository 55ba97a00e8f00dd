//! Shared fixtures for unit and route tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use origami_core::DiscountRate;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

use crate::api::{ApiRequest, ApiResponse, BackendClient, MockHttpTransport};
use crate::config::{ApiConfig, PaymentConfig, ShopConfig, StorefrontConfig};
use crate::middleware::session_layer;
use crate::state::AppState;

/// Configuration pointing at a local backend that is never contacted.
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        api: ApiConfig {
            base_url: Url::parse("http://localhost:8000/api/").unwrap(),
            timeout: Duration::from_secs(1),
        },
        shop: ShopConfig {
            loyalty_discount: "0.10".parse::<DiscountRate>().unwrap(),
            search_debounce_ms: 300,
            products_per_page: 12,
        },
        payment: PaymentConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

pub fn json_response(status: u16, body: &Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

/// Answers for the endpoints most pages touch; anything else is a 404.
///
/// `ana@papel.co` / `grulla123` is a customer, `admin@papel.co` / `admin123`
/// an admin. Neither is a loyalty member.
pub fn default_backend(req: &ApiRequest) -> ApiResponse {
    let form_value = |key: &str| match &req.body {
        crate::api::RequestBody::Form(pairs) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    match (req.method.as_str(), req.path.as_str()) {
        ("POST", "auth/login") => match (form_value("username").as_str(), form_value("password").as_str()) {
            ("ana@papel.co", "grulla123") => json_response(200, &json!({"access_token": "tok-ana"})),
            ("admin@papel.co", "admin123") => json_response(200, &json!({"access_token": "tok-admin"})),
            _ => json_response(401, &json!({"detail": "Credenciales incorrectas"})),
        },
        ("GET", "auth/me") => match req.bearer.as_ref().map(|t| t.expose().to_string()).as_deref() {
            Some("tok-ana") => json_response(
                200,
                &json!({"id": 1, "username": "ana", "email": "ana@papel.co", "is_admin": false}),
            ),
            Some("tok-admin") => json_response(
                200,
                &json!({"id": 2, "username": "admin", "email": "admin@papel.co", "is_admin": true}),
            ),
            _ => ApiResponse::new(401, ""),
        },
        ("GET", "productos/") => json_response(200, &products()),
        ("GET", "categorias/") => json_response(
            200,
            &json!([{"id": 1, "slug": "animales", "nombre": "Animales"}]),
        ),
        _ => json_response(404, &json!({"detail": "No encontrado"})),
    }
}

/// Two products: a crane at 12.50 and a dragon at 40.
pub fn products() -> Value {
    json!([
        {"id": 1, "nombre": "Grulla", "precio": 12.5, "stock": 10, "imagen_url": "https://img.example/grulla.png"},
        {"id": 2, "nombre": "Dragón", "precio": 40, "stock": 3, "color": "Rojo"}
    ])
}

/// The storefront router over a scripted backend and an in-memory session
/// store, with a cookie jar of one session.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    /// Every request the backend received, in order
    pub requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl TestApp {
    pub fn new(backend: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(move |req| {
            log.lock().unwrap().push(req.clone());
            let response = backend(&req);
            Box::pin(async move { Ok(response) })
        });

        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/test")
            .unwrap();
        let state = AppState::new(test_config(), pool, BackendClient::new(Arc::new(mock)));
        let router = crate::app(state, session_layer(MemoryStore::default(), false));

        Self {
            router,
            cookie: None,
            requests,
        }
    }

    /// Send a request with the session cookie and a client address, and keep
    /// any new session cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        let headers = request.headers_mut();
        headers.insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn htmx_get(&mut self, uri: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header("hx-request", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        self.send(form_request(uri, body, false)).await
    }

    pub async fn htmx_post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        self.send(form_request(uri, body, true)).await
    }

    /// Sign in through the login form.
    pub async fn login(&mut self, email: &str, password: &str) {
        let body = format!(
            "email={}&password={}",
            urlencoding::encode(email),
            urlencoding::encode(password)
        );
        let response = self.post_form("/auth/login", &body).await;
        assert_eq!(response.status(), 303, "login failed");
    }

    /// Requests sent to `path`.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.method.as_str() == method && req.path == path)
            .cloned()
            .collect()
    }
}

fn form_request(uri: &str, body: &str, htmx: bool) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
