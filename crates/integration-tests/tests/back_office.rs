//! The administrator's product, order and category management.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use origami_integration_tests::{Browser, FakeShop, body_text, location};

async fn admin(shop: &FakeShop) -> Browser {
    let mut browser = Browser::new(shop);
    browser.login("admin@papel.co", "admin123").await;
    browser
}

#[tokio::test]
async fn customers_cannot_reach_the_back_office() {
    let shop = FakeShop::new();
    let mut browser = Browser::new(&shop);
    browser.login("ana@papel.co", "grulla123").await;

    let response = browser.get("/admin?tab=pedidos").await;
    assert_eq!(location(&response), "/");
    let response = browser
        .post_form("/admin/products/1/delete", &[])
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(shop.products().len(), 3);
}

#[tokio::test]
async fn admin_creates_edits_and_deletes_a_product() {
    let shop = FakeShop::new();
    let mut browser = admin(&shop).await;

    let response = browser
        .post_form(
            "/admin/products/new",
            &[
                ("nombre", "Mariposa"),
                ("descripcion", "Mariposa de papel kami"),
                ("precio", "8.75"),
                ("stock", "25"),
                ("categoria", "Animales"),
                ("activo", "on"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/admin?tab=productos&aviso=producto-creado");

    let dashboard = browser.page("/admin?tab=productos&aviso=producto-creado").await;
    assert!(dashboard.contains("Producto creado"));
    assert!(dashboard.contains("Mariposa"));

    let created = shop
        .products()
        .into_iter()
        .find(|p| p["nombre"] == "Mariposa")
        .unwrap();
    assert_eq!(created["precio"], 8.75);
    let id = created["id"].as_i64().unwrap();

    let edit = browser.page(&format!("/admin/products/{id}/edit")).await;
    assert!(edit.contains("value=\"8.75\""));

    let response = browser
        .post_form(
            &format!("/admin/products/{id}/edit"),
            &[("nombre", "Mariposa monarca"), ("precio", "9.50"), ("stock", "20"), ("activo", "on")],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert!(browser.page("/admin").await.contains("Mariposa monarca"));

    let response = browser
        .htmx_post_form(&format!("/admin/products/{id}/delete"), &[])
        .await;
    assert_eq!(
        response.headers()["hx-redirect"],
        "/admin?tab=productos&aviso=producto-eliminado"
    );
    assert!(shop.products().iter().all(|p| p["id"] != id));
}

#[tokio::test]
async fn invalid_product_form_is_shown_again() {
    let shop = FakeShop::new();
    let mut browser = admin(&shop).await;

    let response = browser
        .post_form("/admin/products/new", &[("nombre", "Rana"), ("precio", "gratis")])
        .await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("alert error"));
    assert!(body.contains("value=\"Rana\""));
    assert!(shop.requests_to("POST", "productos").is_empty());
}

#[tokio::test]
async fn admin_moves_an_order_through_statuses_and_quotes_custom_work() {
    let shop = FakeShop::new();

    let mut visitor = Browser::new(&shop);
    visitor.post_form("/cart/add", &[("product_id", "1")]).await;
    visitor
        .post_form(
            "/checkout/guest",
            &[
                ("nombre_completo", "Luisa Rojas"),
                ("email", "luisa@correo.com"),
                ("telefono", "3105550101"),
                ("direccion", "Calle 45 # 8-12"),
            ],
        )
        .await;
    visitor
        .post_multipart(
            "/custom-order",
            &[
                ("descripcion", "Un zorro de papel kraft"),
                ("nombre", "Luisa Rojas"),
                ("email", "luisa@correo.com"),
                ("telefono", "3105550101"),
            ],
            None,
        )
        .await;
    let orders = shop.orders();
    let guest_number = orders[0]["id"].as_str().unwrap().to_string();
    let custom_number = orders[1]["id"].as_i64().unwrap();

    let mut browser = admin(&shop).await;
    let all = browser.page("/admin?tab=pedidos").await;
    assert!(all.contains(&guest_number));
    assert!(all.contains("Luisa Rojas"));

    let response = browser
        .post_form(
            &format!("/admin/orders/{guest_number}/status"),
            &[("estado", "Enviado")],
        )
        .await;
    assert_eq!(location(&response), "/admin?tab=pedidos&aviso=estado-actualizado");
    assert_eq!(shop.orders()[0]["estado"], "Enviado");
    assert!(browser.page("/admin?tab=pedidos").await.contains("status-enviado"));

    let custom = browser.page("/admin?tab=personalizados").await;
    assert!(custom.contains("Un zorro de papel kraft"));
    assert!(!custom.contains(&guest_number));

    let response = browser
        .post_form(
            &format!("/admin/orders/{custom_number}/quote"),
            &[
                ("nombre_personalizado", "Zorro kraft"),
                ("precio_personalizado", "35000"),
                ("comentario_vendedor", "Listo en una semana"),
            ],
        )
        .await;
    assert_eq!(
        location(&response),
        "/admin?tab=personalizados&aviso=cotizacion-guardada"
    );
    let quoted = &shop.orders()[1];
    assert_eq!(quoted["nombre_personalizado"], "Zorro kraft");
    assert_eq!(quoted["precio_personalizado"], 35000.0);
}

#[tokio::test]
async fn unknown_status_is_refused_without_calling_the_api() {
    let shop = FakeShop::new();
    let mut browser = admin(&shop).await;

    let response = browser
        .post_form("/admin/orders/7/status", &[("estado", "Perdido")])
        .await;
    assert_eq!(response.status(), 200);
    assert!(body_text(response).await.contains("alert error"));
    assert!(shop.requests().iter().all(|req| req.method.as_str() != "PUT"));
}

#[tokio::test]
async fn admin_creates_a_category() {
    let shop = FakeShop::new();
    let mut browser = admin(&shop).await;

    let response = browser
        .post_form("/admin/categories", &[("slug", "Flores Modulares"), ("nombre", "Flores")])
        .await;
    assert_eq!(response.status(), 303);

    let page = browser.page("/admin?tab=categorias").await;
    assert!(page.contains("flores-modulares"));

    let response = browser
        .post_form("/admin/categories", &[("slug", "animales"), ("nombre", "Animales")])
        .await;
    assert_eq!(response.status(), 200);
    let body = body_text(response).await;
    assert!(body.contains("La categoría ya existe"));
}
