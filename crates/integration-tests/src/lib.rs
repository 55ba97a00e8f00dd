//! End-to-end harness for the Origami storefront.
//!
//! [`FakeShop`] is an in-memory stand-in for the shop's REST API: it keeps
//! accounts, products, orders and loyalty members, and answers the same
//! paths and payloads the storefront's client sends. [`Browser`] drives the
//! real router with a cookie jar of one session, so tests exercise the
//! handlers, middleware, templates and session store together.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p origami-integration-tests
//! ```
//!
//! No database or network is needed; sessions live in a `MemoryStore`.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use origami_core::DiscountRate;
use origami_storefront::api::{
    ApiRequest, ApiResponse, BackendClient, HttpTransport, RequestBody, TransportError,
};
use origami_storefront::config::{ApiConfig, PaymentConfig, ShopConfig, StorefrontConfig};
use origami_storefront::middleware::session_layer;
use origami_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

// =============================================================================
// Fake shop API
// =============================================================================

struct Account {
    id: i64,
    username: String,
    email: String,
    password: String,
    is_admin: bool,
}

#[derive(Default)]
struct ShopData {
    accounts: Vec<Account>,
    products: Vec<Value>,
    categories: Vec<Value>,
    orders: Vec<Value>,
    members: Vec<Value>,
    requests: Vec<ApiRequest>,
    next_id: i64,
}

impl ShopData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account_for(&self, req: &ApiRequest) -> Option<&Account> {
        let token = req.bearer.as_ref()?.expose();
        let id: i64 = token.strip_prefix("tok-")?.parse().ok()?;
        self.accounts.iter().find(|account| account.id == id)
    }

    fn product(&self, id: i64) -> Option<&Value> {
        self.products.iter().find(|p| p["id"] == id)
    }
}

/// In-memory shop API.
///
/// Seeded with a customer (`ana@papel.co` / `grulla123`), an admin
/// (`admin@papel.co` / `admin123`), two categories and three products.
#[derive(Clone)]
pub struct FakeShop {
    data: Arc<Mutex<ShopData>>,
}

impl Default for FakeShop {
    fn default() -> Self {
        Self::new()
    }
}

fn ok(body: &Value) -> ApiResponse {
    ApiResponse::new(200, body.to_string())
}

fn created(body: &Value) -> ApiResponse {
    ApiResponse::new(201, body.to_string())
}

fn refuse(status: u16, detail: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "detail": detail }).to_string())
}

fn form_value(req: &ApiRequest, key: &str) -> String {
    match &req.body {
        RequestBody::Form(pairs) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn json_body(req: &ApiRequest) -> Value {
    match &req.body {
        RequestBody::Json(value) => value.clone(),
        _ => Value::Null,
    }
}

fn query_value<'a>(req: &'a ApiRequest, key: &str) -> Option<&'a str> {
    req.query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl FakeShop {
    #[must_use]
    pub fn new() -> Self {
        let mut data = ShopData::default();
        data.accounts.push(Account {
            id: 1,
            username: "ana".to_string(),
            email: "ana@papel.co".to_string(),
            password: "grulla123".to_string(),
            is_admin: false,
        });
        data.accounts.push(Account {
            id: 2,
            username: "admin".to_string(),
            email: "admin@papel.co".to_string(),
            password: "admin123".to_string(),
            is_admin: true,
        });
        data.categories = vec![
            json!({"id": 1, "slug": "animales", "nombre": "Animales"}),
            json!({"id": 2, "slug": "modular", "nombre": "Modular"}),
        ];
        data.products = vec![
            json!({"id": 1, "nombre": "Grulla", "descripcion": "Grulla clásica de papel washi", "precio": 12.5, "stock": 10, "activo": true, "categoria": "Animales"}),
            json!({"id": 2, "nombre": "Dragón", "descripcion": "Dragón de una sola hoja", "precio": 40, "stock": 3, "activo": true, "categoria": "Animales", "color": "Rojo"}),
            json!({"id": 3, "nombre": "Kusudama", "descripcion": "Esfera modular de 30 piezas", "precio": 55.25, "stock": 0, "activo": true, "categoria": "Modular"}),
        ];
        data.next_id = 100;
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.data.lock().unwrap().requests.clone()
    }

    /// Requests to one method and path.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|req| req.method.as_str() == method && req.path == path)
            .collect()
    }

    /// Stored orders, as the admin endpoint returns them.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.data.lock().unwrap().orders.clone()
    }

    /// Stored products, including inactive ones.
    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        self.data.lock().unwrap().products.clone()
    }

    /// Enroll an email directly, as if it joined in an earlier visit.
    pub fn add_member(&self, email: &str, name: &str) {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        data.members.push(json!({
            "id": id,
            "correo": email,
            "nombre_completo": name,
            "puntos": 120,
            "tutoriales": ["Grulla básica"],
            "proximo_regalo": "Papel washi"
        }));
    }

    /// Answer one request.
    pub fn handle(&self, req: &ApiRequest) -> ApiResponse {
        let mut data = self.data.lock().unwrap();
        data.requests.push(req.clone());

        let segments: Vec<&str> = req.path.trim_end_matches('/').split('/').collect();
        match (req.method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "login"]) => {
                let username = form_value(req, "username");
                let password = form_value(req, "password");
                data.accounts
                    .iter()
                    .find(|a| a.email == username && a.password == password)
                    .map_or_else(
                        || refuse(401, "Credenciales incorrectas"),
                        |a| ok(&json!({"access_token": format!("tok-{}", a.id), "token_type": "bearer"})),
                    )
            }
            ("POST", ["auth", "register"]) => {
                let body = json_body(req);
                let email = body["email"].as_str().unwrap_or_default().to_string();
                if data.accounts.iter().any(|a| a.email == email) {
                    return refuse(400, "El correo ya está registrado");
                }
                let id = data.next_id();
                data.accounts.push(Account {
                    id,
                    username: body["username"].as_str().unwrap_or_default().to_string(),
                    email,
                    password: body["password"].as_str().unwrap_or_default().to_string(),
                    is_admin: false,
                });
                created(&json!({"id": id}))
            }
            ("GET", ["auth", "me"]) => data.account_for(req).map_or_else(
                || ApiResponse::new(401, ""),
                |a| {
                    ok(&json!({
                        "id": a.id,
                        "username": a.username,
                        "email": a.email,
                        "is_admin": a.is_admin
                    }))
                },
            ),

            ("GET", ["productos"]) => {
                let q = query_value(req, "q").map(str::to_lowercase);
                let categoria = query_value(req, "categoria");
                let offset: usize = query_value(req, "offset")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let limit: usize = query_value(req, "limit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100);
                let category_name = categoria.and_then(|slug| {
                    data.categories
                        .iter()
                        .find(|c| c["slug"] == slug)
                        .map(|c| c["nombre"].clone())
                });
                let matches: Vec<Value> = data
                    .products
                    .iter()
                    .filter(|p| p["activo"] != false)
                    .filter(|p| {
                        q.as_deref().is_none_or(|q| {
                            p["nombre"].as_str().unwrap_or_default().to_lowercase().contains(q)
                                || p["descripcion"]
                                    .as_str()
                                    .unwrap_or_default()
                                    .to_lowercase()
                                    .contains(q)
                        })
                    })
                    .filter(|p| categoria.is_none() || Some(&p["categoria"]) == category_name.as_ref())
                    .cloned()
                    .collect();
                let page: Vec<Value> = matches.iter().skip(offset).take(limit).cloned().collect();
                ok(&json!({"data": page, "total": matches.len()}))
            }
            ("POST", ["productos"]) => {
                if !data.account_for(req).is_some_and(|a| a.is_admin) {
                    return refuse(403, "No autorizado");
                }
                let mut product = json_body(req);
                let id = data.next_id();
                product["id"] = json!(id);
                data.products.push(product.clone());
                created(&product)
            }
            ("PATCH", ["productos", id]) | ("DELETE", ["productos", id]) => {
                if !data.account_for(req).is_some_and(|a| a.is_admin) {
                    return refuse(403, "No autorizado");
                }
                let id: i64 = id.parse().unwrap_or_default();
                let Some(index) = data.products.iter().position(|p| p["id"] == id) else {
                    return refuse(404, "Producto no encontrado");
                };
                if req.method.as_str() == "DELETE" {
                    data.products.remove(index);
                    return ok(&json!({"status": "ok"}));
                }
                let update = json_body(req);
                if let (Some(product), Some(fields)) =
                    (data.products[index].as_object_mut(), update.as_object())
                {
                    for (key, value) in fields {
                        product.insert(key.clone(), value.clone());
                    }
                }
                ok(&data.products[index])
            }

            ("GET", ["categorias"]) => ok(&Value::Array(data.categories.clone())),
            ("POST", ["categorias"]) => {
                let mut category = json_body(req);
                if data.categories.iter().any(|c| c["slug"] == category["slug"]) {
                    return refuse(400, "La categoría ya existe");
                }
                let id = data.next_id();
                category["id"] = json!(id);
                data.categories.push(category.clone());
                created(&category)
            }

            ("POST", ["pedidos"]) => {
                if data.account_for(req).is_none() {
                    return ApiResponse::new(401, "");
                }
                let body = json_body(req);
                let mut total = 0.0;
                let mut items = Vec::new();
                for item in body["items"].as_array().into_iter().flatten() {
                    let id = item["producto_id"].as_i64().unwrap_or_default();
                    let Some(product) = data.product(id) else {
                        return refuse(400, "Producto no disponible");
                    };
                    let price = product["precio"].as_f64().unwrap_or_default();
                    let quantity = item["cantidad"].as_u64().unwrap_or(1);
                    #[allow(clippy::cast_precision_loss)]
                    {
                        total += price * quantity as f64;
                    }
                    items.push(json!({
                        "producto_nombre": product["nombre"],
                        "cantidad": quantity,
                        "precio_unitario": price
                    }));
                }
                let id = data.next_id();
                data.orders.push(json!({
                    "id": id,
                    "estado": "pendiente",
                    "tipo": "estandar",
                    "total": total,
                    "contacto": body["contacto"],
                    "direccion": body["direccion"],
                    "metodo_pago": body["metodo_pago"],
                    "created_at": "2026-10-19T09:00:00",
                    "items": items
                }));
                created(&json!({"status": "ok", "pedido_id": id, "message": "Pedido creado"}))
            }
            ("POST", ["pedidos", "guest"]) => {
                let body = json_body(req);
                let info = &body["guestInfo"];
                let id = data.next_id();
                let number = format!("GUEST-{id}");
                let items: Vec<Value> = body["items"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|item| {
                        json!({
                            "producto_nombre": item["nombre"],
                            "cantidad": item["cantidad"],
                            "precio_unitario": item["precio"]
                        })
                    })
                    .collect();
                data.orders.push(json!({
                    "id": number,
                    "estado": "pendiente",
                    "tipo": "estandar",
                    "total": body["total"],
                    "contacto_nombre": info["nombreCompleto"],
                    "contacto_email": info["email"],
                    "contacto_telefono": info["whatsapp"],
                    "direccion": info["direccion"],
                    "metodo_pago": info["metodoPago"],
                    "items": items
                }));
                created(&json!({"order_id": number, "message": "Pedido recibido"}))
            }
            ("POST", ["pedidos", "personalizado"]) => {
                let body = json_body(req);
                let id = data.next_id();
                data.orders.push(json!({
                    "id": id,
                    "estado": "pendiente",
                    "tipo": "personalizado",
                    "contacto": body["contacto"],
                    "descripcion": body["descripcion"],
                    "imagen_referencia": body["imagen_referencia"],
                    "items": []
                }));
                created(&json!({"id": id}))
            }
            ("GET", ["pedidos", "mis-pedidos"]) => {
                let Some(email) = data.account_for(req).map(|a| a.email.clone()) else {
                    return ApiResponse::new(401, "");
                };
                let mine: Vec<Value> = data
                    .orders
                    .iter()
                    .filter(|o| o["contacto"]["email"] == email.as_str())
                    .cloned()
                    .collect();
                ok(&Value::Array(mine))
            }
            ("GET", ["pedidos"]) => {
                if !data.account_for(req).is_some_and(|a| a.is_admin) {
                    return refuse(403, "No autorizado");
                }
                ok(&Value::Array(data.orders.clone()))
            }
            ("PUT", ["pedidos", id, "estado"]) | ("PATCH", ["pedidos", id, "personalizado"]) => {
                if !data.account_for(req).is_some_and(|a| a.is_admin) {
                    return refuse(403, "No autorizado");
                }
                let id = urlencoding::decode(id).map(|id| id.into_owned()).unwrap_or_default();
                let update = json_body(req);
                let Some(order) = data
                    .orders
                    .iter_mut()
                    .find(|o| o["id"].to_string().trim_matches('"') == id)
                else {
                    return refuse(404, "Pedido no encontrado");
                };
                if let (Some(order), Some(fields)) = (order.as_object_mut(), update.as_object()) {
                    for (key, value) in fields {
                        order.insert(key.clone(), value.clone());
                    }
                }
                ok(&json!({"status": "ok"}))
            }

            ("POST", ["fidelizacion"]) => {
                let mut body = json_body(req);
                if data.members.iter().any(|m| m["correo"] == body["correo"]) {
                    return refuse(409, "El correo ya está registrado en el programa");
                }
                let id = data.next_id();
                body["id"] = json!(id);
                body["puntos"] = json!(0);
                data.members.push(body.clone());
                created(&body)
            }
            ("GET", ["fidelizacion", email]) => {
                let email = urlencoding::decode(email)
                    .map(|e| e.into_owned())
                    .unwrap_or_default();
                data.members
                    .iter()
                    .find(|m| m["correo"] == email.as_str())
                    .map_or_else(|| refuse(404, "No inscrito"), ok)
            }

            _ => refuse(404, "No encontrado"),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeShop {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(self.handle(&request))
    }
}

// =============================================================================
// Browser
// =============================================================================

/// Configuration for a storefront that never leaves the process.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/origami_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        api: ApiConfig {
            base_url: Url::parse("http://shop.test/api/").unwrap(),
            timeout: Duration::from_secs(1),
        },
        shop: ShopConfig {
            loyalty_discount: "0.10".parse::<DiscountRate>().unwrap(),
            search_debounce_ms: 300,
            products_per_page: 2,
        },
        payment: PaymentConfig {
            nequi_account_name: Some("Papel y Pliegue".to_string()),
            nequi_account_number: Some("3001234567".to_string()),
            nequi_whatsapp: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// One visitor: a router over a [`FakeShop`] plus the visitor's session cookie.
pub struct Browser {
    router: Router,
    cookie: Option<String>,
    address: &'static str,
}

impl Browser {
    /// A new visitor on a fresh storefront.
    #[must_use]
    pub fn new(shop: &FakeShop) -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/origami_test")
            .unwrap();
        let backend = BackendClient::new(Arc::new(shop.clone()));
        let state = AppState::new(test_config(), pool, backend);
        Self {
            router: origami_storefront::app(state, session_layer(MemoryStore::default(), false)),
            cookie: None,
            address: "198.51.100.20",
        }
    }

    /// A second visitor on the same storefront, with its own session and IP.
    #[must_use]
    pub fn another(&self, address: &'static str) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
            address,
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        let headers = request.headers_mut();
        headers.insert("x-forwarded-for", self.address.parse().unwrap());
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

    /// GET and return the body, asserting a 200.
    pub async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), 200, "GET {uri}");
        body_text(response).await
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

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        self.send(form_request(uri, fields, false)).await
    }

    pub async fn htmx_post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        self.send(form_request(uri, fields, true)).await
    }

    /// POST a `multipart/form-data` body of text fields and an optional file.
    pub async fn post_multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response<Body> {
        const BOUNDARY: &str = "origami-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"ref.png\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Sign in through the login form.
    pub async fn login(&mut self, email: &str, password: &str) {
        let response = self
            .post_form("/auth/login", &[("email", email), ("password", password)])
            .await;
        assert_eq!(response.status(), 303, "login as {email} failed");
    }

    /// Units in the cart, read from the header badge fragment.
    pub async fn cart_count(&mut self) -> u64 {
        let body = body_text(self.htmx_get("/cart/count").await).await;
        body.rsplit_once("\">")
            .and_then(|(_, rest)| rest.split_once("</span>"))
            .and_then(|(count, _)| count.trim().parse().ok())
            .unwrap()
    }
}

fn form_request(uri: &str, fields: &[(&str, &str)], htmx: bool) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder =
        Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[must_use]
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
