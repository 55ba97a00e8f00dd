//! Checkout for customers and guests.
//!
//! Both forms post back to themselves. A valid order is sent to the backend
//! once; on success the cart is emptied, a summary is kept in the session and
//! the visitor is redirected to the confirmation page, so reloading it never
//! places a second order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use origami_core::PaymentMethod;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CartView, PageContext, format_money};
use crate::api::{ApiError, OrderReceipt};
use crate::config::PaymentConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, redirect};
use crate::models::{OrderConfirmation, session_keys};
use crate::services::CartSession;
use crate::services::checkout::{CheckoutForm, GuestCheckoutForm};
use crate::state::AppState;

const CONFIRMATION_PATH: &str = "/checkout/confirmation";

/// A payment method radio button.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Radio buttons for every method, with `selected` (or the default) checked.
fn payment_options(selected: &str) -> Vec<PaymentOption> {
    let current = selected.parse::<PaymentMethod>().unwrap_or_default();
    PaymentMethod::ALL
        .iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            selected: *method == current,
        })
        .collect()
}

/// Checkout page for a logged-in customer.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub nequi: PaymentConfig,
    pub error: Option<String>,
}

/// Checkout page for a guest.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/guest.html")]
pub struct GuestCheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: GuestCheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub nequi: PaymentConfig,
    pub error: Option<String>,
}

/// Confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub ctx: PageContext,
    pub order_number: Option<String>,
    pub payment_label: &'static str,
    pub is_nequi: bool,
    pub message: Option<String>,
    pub address: String,
    pub email: String,
    pub total: String,
    pub nequi: PaymentConfig,
}

// =============================================================================
// Customer checkout
// =============================================================================

/// Display the checkout form, prefilled from the profile.
#[instrument(skip(state, signed_in, cart, ctx))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(signed_in): RequireAuth,
    cart: CartSession,
    ctx: PageContext,
) -> Result<Response> {
    let snapshot = cart.snapshot().await?;
    if snapshot.cart.is_empty() {
        return Ok(redirect("/cart", ctx.htmx));
    }

    let form = CheckoutForm::for_user(&signed_in.user.username, &signed_in.user.email);
    Ok(CheckoutTemplate {
        payment_options: payment_options(&form.metodo_pago),
        nequi: state.config().payment.clone(),
        cart: CartView::from(&snapshot),
        ctx,
        form,
        error: None,
    }
    .into_response())
}

/// Validate and place a customer order.
#[instrument(skip(state, signed_in, cart, session, ctx, form))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(signed_in): RequireAuth,
    cart: CartSession,
    session: Session,
    ctx: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let snapshot = cart.snapshot().await?;
    if snapshot.cart.is_empty() {
        return Ok(redirect("/cart", ctx.htmx));
    }

    let rerender = |ctx: PageContext, form: CheckoutForm, error: String| {
        CheckoutTemplate {
            payment_options: payment_options(&form.metodo_pago),
            nequi: state.config().payment.clone(),
            cart: CartView::from(&snapshot),
            ctx,
            form,
            error: Some(error),
        }
        .into_response()
    };

    let order = match form.to_order(&snapshot.cart) {
        Ok(order) => order,
        Err(e) => return Ok(rerender(ctx, form, e.to_string())),
    };

    let receipt = match state.backend().create_order(&signed_in.token, &order).await {
        Ok(receipt) => receipt,
        Err(ApiError::Unauthorized) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "order refused");
            return Ok(rerender(ctx, form, e.user_message()));
        }
    };

    let confirmation = OrderConfirmation {
        order_number: receipt.order_number().map(ToString::to_string),
        payment_method: order.metodo_pago,
        message: receipt.message,
        address: order.address,
        email: order.contact.email,
        total: snapshot.totals().total,
    };
    complete(&cart, &session, confirmation, ctx.htmx).await
}

// =============================================================================
// Guest checkout
// =============================================================================

/// Display the guest checkout form.
#[instrument(skip(state, cart, ctx))]
pub async fn guest_show(
    State(state): State<AppState>,
    cart: CartSession,
    ctx: PageContext,
) -> Result<Response> {
    let snapshot = cart.snapshot().await?;
    if snapshot.cart.is_empty() {
        return Ok(redirect("/cart", ctx.htmx));
    }

    let form = GuestCheckoutForm::default();
    Ok(GuestCheckoutTemplate {
        payment_options: payment_options(&form.metodo_pago),
        nequi: state.config().payment.clone(),
        cart: CartView::from(&snapshot),
        ctx,
        form,
        error: None,
    }
    .into_response())
}

/// Validate and place a guest order.
#[instrument(skip(state, cart, session, ctx, form))]
pub async fn guest_submit(
    State(state): State<AppState>,
    cart: CartSession,
    session: Session,
    ctx: PageContext,
    Form(form): Form<GuestCheckoutForm>,
) -> Result<Response> {
    let snapshot = cart.snapshot().await?;
    if snapshot.cart.is_empty() {
        return Ok(redirect("/cart", ctx.htmx));
    }

    let rerender = |ctx: PageContext, form: GuestCheckoutForm, error: String| {
        GuestCheckoutTemplate {
            payment_options: payment_options(&form.metodo_pago),
            nequi: state.config().payment.clone(),
            cart: CartView::from(&snapshot),
            ctx,
            form,
            error: Some(error),
        }
        .into_response()
    };

    let order = match form.to_order(&snapshot.cart, snapshot.discount) {
        Ok(order) => order,
        Err(e) => return Ok(rerender(ctx, form, e.to_string())),
    };

    let receipt: OrderReceipt = match state.backend().create_guest_order(&order).await {
        Ok(receipt) => receipt,
        Err(e) => {
            tracing::warn!(error = %e, "guest order refused");
            return Ok(rerender(ctx, form, e.user_message()));
        }
    };

    let confirmation = OrderConfirmation {
        order_number: receipt.order_number().map(ToString::to_string),
        payment_method: order.guest_info.metodo_pago,
        message: receipt.message,
        address: order.guest_info.direccion,
        email: order.guest_info.email,
        total: order.total,
    };
    complete(&cart, &session, confirmation, ctx.htmx).await
}

/// Empty the cart, remember the order and send the visitor to the summary.
async fn complete(
    cart: &CartSession,
    session: &Session,
    confirmation: OrderConfirmation,
    htmx: bool,
) -> Result<Response> {
    add_breadcrumb(
        "checkout",
        "order placed",
        Some(&[("payment", confirmation.payment_method.as_str())][..]),
    );
    tracing::info!(
        order_number = confirmation.order_number.as_deref().unwrap_or("-"),
        payment = %confirmation.payment_method,
        "order placed"
    );

    cart.clear().await?;
    session
        .insert(session_keys::LAST_ORDER, &confirmation)
        .await?;
    Ok(redirect(CONFIRMATION_PATH, htmx))
}

// =============================================================================
// Confirmation
// =============================================================================

/// Summary of the last order placed in this session.
#[instrument(skip(state, session, ctx))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    let Some(order) = session
        .get::<OrderConfirmation>(session_keys::LAST_ORDER)
        .await?
    else {
        return Ok(redirect("/", ctx.htmx));
    };

    Ok(ConfirmationTemplate {
        ctx,
        order_number: order.order_number,
        payment_label: order.payment_method.label(),
        is_nequi: order.payment_method == PaymentMethod::Nequi,
        message: order.message,
        address: order.address,
        email: order.email,
        total: format_money(order.total),
        nequi: state.config().payment.clone(),
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_options_default_to_nequi() {
        let options = payment_options("");
        assert_eq!(options.len(), PaymentMethod::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().map(|o| o.value), Some("nequi"));
    }

    #[test]
    fn payment_options_keep_choice() {
        let options = payment_options("contraentrega");
        assert!(
            options
                .iter()
                .any(|o| o.value == "contraentrega" && o.selected)
        );
    }
}
