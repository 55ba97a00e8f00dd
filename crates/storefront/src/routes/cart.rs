//! Cart route handlers.
//!
//! The cart lives in the session (see [`CartSession`]). HTMX requests get the
//! updated fragment back along with a `cart-updated` trigger so the header
//! badge refreshes; plain form posts are redirected to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use origami_core::{NewCartLine, ProductId};
use serde::Deserialize;
use tracing::instrument;

use super::views::{CartView, PageContext};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{is_htmx, redirect};
use crate::services::CartSession;
use crate::state::AppState;

/// Event fired after every cart change.
pub const CART_UPDATED: &str = "cart-updated";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i64,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub logged_in: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Display cart page.
#[instrument(skip(cart, ctx))]
pub async fn show(cart: CartSession, ctx: PageContext) -> Result<impl IntoResponse> {
    let snapshot = cart.snapshot().await?;
    Ok(CartShowTemplate {
        ctx,
        cart: CartView::from(&snapshot),
    })
}

/// Add a product to the cart.
///
/// Name, price and image come from the catalogue, never from the form.
#[instrument(skip(state, cart, headers))]
pub async fn add(
    State(state): State<AppState>,
    cart: CartSession,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let product = state
        .backend()
        .find_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let line = NewCartLine {
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        image_url: product.imagen_url,
    };
    let (updated, ()) = cart
        .update(|cart| cart.add(line, form.quantity.unwrap_or(1)))
        .await?;
    tracing::info!(%product_id, items = updated.item_count(), "added to cart");

    if !is_htmx(&headers) {
        return Ok(redirect("/cart", false));
    }
    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartCountTemplate {
            count: updated.item_count(),
        },
    )
        .into_response())
}

/// Change a line's quantity. Quantities below one are raised to one.
#[instrument(skip(cart, ctx))]
pub async fn update(
    cart: CartSession,
    ctx: PageContext,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let (_, found) = cart
        .update(|cart| cart.set_quantity(product_id, form.quantity))
        .await?;
    if !found {
        tracing::debug!(%product_id, "update for a product not in the cart");
    }
    items_response(&cart, &ctx).await
}

/// Remove a line.
#[instrument(skip(cart, ctx))]
pub async fn remove(
    cart: CartSession,
    ctx: PageContext,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    cart.update(|cart| cart.remove(product_id)).await?;
    items_response(&cart, &ctx).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(cart: CartSession) -> Result<impl IntoResponse> {
    Ok(CartCountTemplate {
        count: cart.cart().await?.item_count(),
    })
}

async fn items_response(cart: &CartSession, ctx: &PageContext) -> Result<Response> {
    if !ctx.htmx {
        return Ok(redirect("/cart", false));
    }
    let snapshot = cart.snapshot().await?;
    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartItemsTemplate {
            cart: CartView::from(&snapshot),
            logged_in: ctx.is_logged_in(),
        },
    )
        .into_response())
}
