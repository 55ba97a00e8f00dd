//! A registered customer browses, joins the loyalty programme, checks out
//! and finds the order in their history.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use origami_integration_tests::{Browser, FakeShop, body_text, location};
use serde_json::Value;

#[tokio::test]
async fn catalogue_pages_search_and_filters() {
    let shop = FakeShop::new();
    let mut browser = Browser::new(&shop);

    let first = browser.page("/products").await;
    assert!(first.contains("Grulla"));
    assert!(first.contains("Dragón"));
    assert!(!first.contains("Kusudama"));
    assert!(first.contains("3 resultados"));
    assert!(first.contains("/products?page=2"));

    let second = browser.page("/products?page=2").await;
    assert!(second.contains("Kusudama"));
    assert!(second.contains("Agotado"));

    let response = browser.htmx_get("/products/results?q=drag").await;
    let results = body_text(response).await;
    assert!(results.contains("Dragón"));
    assert!(!results.contains("Grulla"));

    let response = browser.htmx_get("/products/results?categoria=modular").await;
    let results = body_text(response).await;
    assert!(results.contains("Kusudama"));
    assert!(!results.contains("Dragón"));
}

#[tokio::test]
async fn loyal_customer_checks_out_with_discount() {
    let shop = FakeShop::new();
    let mut browser = Browser::new(&shop);
    browser.login("ana@papel.co", "grulla123").await;

    browser
        .htmx_post_form("/cart/add", &[("product_id", "1"), ("quantity", "2")])
        .await;
    browser.htmx_post_form("/cart/add", &[("product_id", "2")]).await;
    assert_eq!(browser.cart_count().await, 3);
    assert!(browser.page("/cart").await.contains("$65.00"));

    let enrolled = browser
        .post_form(
            "/loyalty",
            &[
                ("nombre_completo", "Ana Torres"),
                ("correo", "ana@papel.co"),
                ("fecha_nacimiento", "1994-03-08"),
                ("redes", "@ana.pliega, @anatorres"),
            ],
        )
        .await;
    assert_eq!(enrolled.status(), 200);
    let body = body_text(enrolled).await;
    assert!(body.contains("Tu descuento de 10%"));

    let cart = browser.page("/cart").await;
    assert!(cart.contains("Descuento fidelización (10%)"));
    assert!(cart.contains("$6.50"));
    assert!(cart.contains("$58.50"));

    let checkout = browser.page("/checkout").await;
    assert!(checkout.contains("value=\"ana@papel.co\""));

    let placed = browser
        .post_form(
            "/checkout",
            &[
                ("nombre", "Ana Torres"),
                ("email", "ana@papel.co"),
                ("telefono", "3001112233"),
                ("direccion", "Carrera 7 # 12-30, Bogotá"),
                ("metodo_pago", "contraentrega"),
            ],
        )
        .await;
    assert_eq!(placed.status(), 303);
    assert_eq!(location(&placed), "/checkout/confirmation");

    let sent = shop.requests_to("POST", "pedidos");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].bearer.is_some());

    let confirmation = browser.page("/checkout/confirmation").await;
    assert!(confirmation.contains("Contraentrega"));
    assert!(confirmation.contains("$58.50"));
    assert!(confirmation.contains("Carrera 7 # 12-30, Bogotá"));
    assert_eq!(browser.cart_count().await, 0);

    let orders = shop.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["metodo_pago"], "contraentrega");
    assert_eq!(orders[0]["contacto"]["email"], "ana@papel.co");

    let history = browser.page("/account/orders").await;
    assert!(history.contains("Grulla x 2 - $12.50"));
    assert!(history.contains("Dragón x 1 - $40.00"));
    assert!(history.contains("Pendiente"));
}

#[tokio::test]
async fn member_discount_is_restored_on_next_login() {
    let shop = FakeShop::new();
    shop.add_member("ana@papel.co", "Ana Torres");

    let mut browser = Browser::new(&shop);
    browser.login("ana@papel.co", "grulla123").await;
    browser.post_form("/cart/add", &[("product_id", "1")]).await;

    let cart = browser.page("/cart").await;
    assert!(cart.contains("Descuento fidelización (10%)"));
    assert!(cart.contains("$11.25"));

    let loyalty = browser.page("/loyalty").await;
    assert!(loyalty.contains("Puntos acumulados: <strong>120</strong>"));
    assert!(loyalty.contains("Grulla básica"));

    let lookups = shop.requests_to("GET", "fidelizacion/ana%40papel.co");
    assert!(!lookups.is_empty());
}

#[tokio::test]
async fn second_enrollment_still_grants_discount() {
    let shop = FakeShop::new();
    shop.add_member("luisa@correo.com", "Luisa Rojas");

    let mut browser = Browser::new(&shop);
    let response = browser
        .post_form(
            "/loyalty",
            &[("nombre_completo", "Luisa Rojas"), ("correo", "luisa@correo.com")],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert!(body_text(response).await.contains("Tu descuento de 10%"));
}

#[tokio::test]
async fn registration_signs_in_and_rejects_duplicates() {
    let shop = FakeShop::new();
    let mut browser = Browser::new(&shop);

    let response = browser
        .post_form(
            "/auth/register",
            &[
                ("username", "tomas"),
                ("email", "tomas@correo.com"),
                ("password", "papiroflexia"),
                ("confirm", "papiroflexia"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert!(browser.page("/account/orders").await.contains("No tienes pedidos aún"));

    let mut other = browser.another("198.51.100.21");
    let response = other
        .post_form(
            "/auth/register",
            &[
                ("username", "tomas2"),
                ("email", "tomas@correo.com"),
                ("password", "papiroflexia"),
                ("confirm", "papiroflexia"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert!(body_text(response).await.contains("El correo ya está registrado"));

    let registered: Vec<Value> = shop
        .requests_to("POST", "auth/register")
        .iter()
        .map(|req| match &req.body {
            origami_storefront::api::RequestBody::Json(value) => value.clone(),
            _ => Value::Null,
        })
        .collect();
    assert_eq!(registered.len(), 2);
    assert!(registered[0].get("confirm").is_none());
}
