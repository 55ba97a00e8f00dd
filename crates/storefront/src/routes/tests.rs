//! Router tests over a scripted backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;

use crate::api::{ApiRequest, ApiResponse, RequestBody};
use crate::test_support::{TestApp, body_text, default_backend, json_response, location};

fn with_guest_orders(req: &ApiRequest) -> ApiResponse {
    if req.method.as_str() == "POST" && req.path == "pedidos/guest" {
        return json_response(
            201,
            &json!({"order_id": "GUEST-7F3A", "message": "Pedido creado"}),
        );
    }
    default_backend(req)
}

const GUEST_FORM: &str = "nombre_completo=Luisa+Rojas&email=luisa%40correo.com\
&telefono=300+123+4567&direccion=Calle+10+%23+4-20&metodo_pago=nequi";

#[tokio::test]
async fn home_shows_featured_products() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/").await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Grulla"));
    assert!(body.contains("Dragón"));
}

#[tokio::test]
async fn search_fragment_forwards_query_and_reports_no_results() {
    let mut app = TestApp::new(|req| {
        if req.path == "productos/" && req.query.iter().any(|(k, _)| k == "q") {
            return json_response(200, &json!([]));
        }
        default_backend(req)
    });

    let response = app.htmx_get("/products/results?q=ballena").await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Sin resultados"));
    assert!(!body.contains("<html"), "fragment must not carry the layout");

    let sent = app.requests_to("GET", "productos/");
    assert!(
        sent.iter()
            .any(|req| req.query.contains(&("q".to_string(), "ballena".to_string())))
    );
}

#[tokio::test]
async fn htmx_add_to_cart_returns_badge_and_trigger() {
    let mut app = TestApp::new(default_backend);

    let response = app.htmx_post_form("/cart/add", "product_id=1&quantity=2").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["hx-trigger"], "cart-updated");
    assert!(body_text(response).await.contains(">2</span>"));

    let response = app.htmx_post_form("/cart/add", "product_id=1").await;
    assert!(body_text(response).await.contains(">3</span>"));

    let body = body_text(app.get("/cart").await).await;
    assert!(body.contains("Grulla"));
    assert!(body.contains("$37.50"));
}

#[tokio::test]
async fn huge_quantity_is_capped_and_renders() {
    let mut app = TestApp::new(default_backend);
    app.post_form("/cart/add", "product_id=1").await;

    let response = app
        .htmx_post_form("/cart/update", "product_id=1&quantity=4294967295")
        .await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("<span>999</span>"));
    assert!(body.contains("name=\"quantity\" value=\"999\""));
    assert!(body.contains("name=\"quantity\" value=\"998\""));

    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">999</span>"));
}

#[tokio::test]
async fn plain_add_to_cart_redirects_to_cart() {
    let mut app = TestApp::new(default_backend);
    let response = app.post_form("/cart/add", "product_id=2").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let mut app = TestApp::new(default_backend);
    let response = app.post_form("/cart/add", "product_id=99").await;
    assert_eq!(response.status(), 404);

    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">0</span>"));
}

#[tokio::test]
async fn removing_a_line_empties_the_cart() {
    let mut app = TestApp::new(default_backend);
    app.post_form("/cart/add", "product_id=1").await;

    let response = app.htmx_post_form("/cart/remove", "product_id=1").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["hx-trigger"], "cart-updated");

    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">0</span>"));
}

#[tokio::test]
async fn customer_checkout_requires_login() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/checkout").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/auth/login");

    let response = app.htmx_get("/checkout").await;
    assert_eq!(response.headers()["hx-redirect"], "/auth/login");
}

#[tokio::test]
async fn guest_checkout_with_empty_cart_goes_back_to_cart() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/checkout/guest").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn guest_checkout_rerenders_with_validation_message() {
    let mut app = TestApp::new(with_guest_orders);
    app.post_form("/cart/add", "product_id=1").await;

    let response = app
        .post_form("/checkout/guest", "nombre_completo=Luisa&email=luisa%40correo.com")
        .await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Todos los campos son obligatorios"));
    assert!(body.contains("value=\"Luisa\""));
    assert!(app.requests_to("POST", "pedidos/guest").is_empty());
}

#[tokio::test]
async fn guest_checkout_places_order_and_clears_cart() {
    let mut app = TestApp::new(with_guest_orders);
    app.post_form("/cart/add", "product_id=1").await;

    let response = app.post_form("/checkout/guest", GUEST_FORM).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/checkout/confirmation");

    let sent = app.requests_to("POST", "pedidos/guest");
    assert_eq!(sent.len(), 1);
    let RequestBody::Json(body) = &sent[0].body else {
        panic!("guest order must be JSON");
    };
    assert_eq!(body["guestInfo"]["email"], "luisa@correo.com");
    assert_eq!(body["guestInfo"]["metodoPago"], "nequi");
    assert_eq!(body["items"][0]["cantidad"], 1);

    let body = body_text(app.get("/checkout/confirmation").await).await;
    assert!(body.contains("GUEST-7F3A"));
    assert!(body.contains("$12.50"));

    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">0</span>"));
}

#[tokio::test]
async fn confirmation_without_order_redirects_home() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/checkout/confirmation").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn wrong_password_shows_backend_message() {
    let mut app = TestApp::new(default_backend);
    let response = app
        .post_form("/auth/login", "email=ana%40papel.co&password=nope")
        .await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Credenciales incorrectas"));
    assert!(body.contains("value=\"ana@papel.co\""));
}

#[tokio::test]
async fn logout_keeps_the_cart() {
    let mut app = TestApp::new(default_backend);
    app.login("ana@papel.co", "grulla123").await;
    app.post_form("/cart/add", "product_id=2").await;

    let response = app.post_form("/auth/logout", "").await;
    assert_eq!(response.status(), 303);

    let response = app.get("/checkout").await;
    assert_eq!(location(&response), "/auth/login");
    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">1</span>"));
}

#[tokio::test]
async fn back_office_is_for_admins_only() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/admin").await;
    assert_eq!(location(&response), "/auth/login");

    app.login("ana@papel.co", "grulla123").await;
    let response = app.get("/admin").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");

    let mut admin = TestApp::new(default_backend);
    admin.login("admin@papel.co", "admin123").await;
    let response = admin.get("/admin").await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Grulla"));
    assert!(body.contains("/admin/products/2/edit"));
}

#[tokio::test]
async fn rejected_token_signs_the_visitor_out() {
    let mut app = TestApp::new(|req| {
        if req.path == "pedidos/mis-pedidos" {
            return ApiResponse::new(401, "");
        }
        default_backend(req)
    });
    app.login("ana@papel.co", "grulla123").await;
    app.post_form("/cart/add", "product_id=1").await;

    let response = app.get("/account/orders").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/auth/login?expired=1");

    let response = app.get("/account/orders").await;
    assert_eq!(location(&response), "/auth/login");

    let body = body_text(app.get("/auth/login?expired=1").await).await;
    assert!(body.contains("Tu sesión expiró"));

    let response = app.htmx_get("/cart/count").await;
    assert!(body_text(response).await.contains(">1</span>"));
}

#[tokio::test]
async fn order_history_lists_lines() {
    let mut app = TestApp::new(|req| {
        if req.path == "pedidos/mis-pedidos" {
            return json_response(
                200,
                &json!([{
                    "id": 41,
                    "estado": "enviado",
                    "total": 25.0,
                    "items": [{"producto_nombre": "Grulla", "cantidad": 2, "precio_unitario": 12.5}]
                }]),
            );
        }
        default_backend(req)
    });
    app.login("ana@papel.co", "grulla123").await;

    let response = app.get("/account/orders").await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("Pedido 41"));
    assert!(body.contains("Grulla x 2 - $12.50"));
    assert!(body.contains("status-enviado"));
}

#[tokio::test]
async fn health_check() {
    let mut app = TestApp::new(default_backend);
    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);
}
