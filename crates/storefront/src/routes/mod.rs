//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//!
//! # Catalogue
//! GET  /products               - Product listing with search and category filter
//! GET  /products/results       - Result list fragment (HTMX, debounced search)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Customer checkout (requires auth)
//! POST /checkout               - Place customer order
//! GET  /checkout/guest         - Guest checkout
//! POST /checkout/guest         - Place guest order
//! GET  /checkout/confirmation  - Summary of the last order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account/orders         - Order history
//!
//! # Custom orders and loyalty
//! GET  /custom-order           - Custom piece request form
//! POST /custom-order           - Send request (multipart, optional image)
//! GET  /loyalty                - Loyalty programme
//! POST /loyalty                - Enroll
//!
//! # Back-office (requires admin)
//! see [`admin`]
//! ```
//!
//! Form posts that reach the backend's write endpoints are rate limited per
//! client IP.

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod custom_order;
pub mod home;
pub mod loyalty;
pub mod products;
pub mod views;

#[cfg(test)]
mod tests;

use std::convert::Infallible;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{auth_rate_limiter, order_rate_limiter};
use crate::services::custom_order::MAX_REFERENCE_IMAGE_BYTES;
use crate::state::AppState;

/// Room for the text fields around the largest accepted image.
const CUSTOM_ORDER_BODY_LIMIT: usize = MAX_REFERENCE_IMAGE_BYTES + 1024 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/results", get(products::results))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes(orders: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).merge(post(checkout::submit).layer(orders.clone())),
        )
        .route(
            "/guest",
            get(checkout::guest_show).merge(post(checkout::guest_submit).layer(orders.clone())),
        )
        .route("/confirmation", get(checkout::confirmation))
}

/// Create the auth routes router.
pub fn auth_routes(logins: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(logins.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(logins.clone())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/orders", get(account::orders))
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route(
            "/products/new",
            get(admin::new_product).post(admin::create_product),
        )
        .route(
            "/products/{id}/edit",
            get(admin::edit_product).post(admin::update_product),
        )
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/orders/{id}/status", post(admin::update_status))
        .route("/orders/{id}/quote", post(admin::update_quote))
        .route("/categories", post(admin::create_category))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let logins = auth_rate_limiter();
    let orders = order_rate_limiter();

    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalogue
        .nest("/products", product_routes())
        // Cart
        .nest("/cart", cart_routes())
        // Checkout
        .nest("/checkout", checkout_routes(&orders))
        // Auth routes
        .nest("/auth", auth_routes(&logins))
        // Account routes
        .nest("/account", account_routes())
        // Custom orders
        .route(
            "/custom-order",
            get(custom_order::show).merge(
                post(custom_order::submit)
                    .layer::<_, Infallible>(DefaultBodyLimit::max(CUSTOM_ORDER_BODY_LIMIT))
                    .layer(orders.clone()),
            ),
        )
        // Loyalty
        .route(
            "/loyalty",
            get(loyalty::show).merge(post(loyalty::enroll).layer(orders)),
        )
        // Back-office
        .nest("/admin", admin_routes())
}
