//! Loyalty programme (fidelización).
//!
//! Enrolling, or trying to enroll with an email that is already a member,
//! grants the configured discount to the visitor's cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::views::PageContext;
use crate::api::{EnrollmentOutcome, Membership};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::CartSession;
use crate::services::loyalty::EnrollmentForm;
use crate::state::AppState;

pub const ENROLLED_MESSAGE: &str = "¡Bienvenido al programa de fidelización! Tu descuento ya está activo.";
pub const ALREADY_ENROLLED_MESSAGE: &str = "Ya eras parte del programa. Tu descuento ya está activo.";

/// Loyalty page template.
#[derive(Template, WebTemplate)]
#[template(path = "loyalty.html")]
pub struct LoyaltyTemplate {
    pub ctx: PageContext,
    /// Active discount, e.g. `10%`
    pub discount: Option<String>,
    /// Discount members get
    pub programme_rate: String,
    pub membership: Option<Membership>,
    pub form: EnrollmentForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the programme page and, for customers, their membership.
#[instrument(skip(state, auth, cart, ctx))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    cart: CartSession,
    ctx: PageContext,
) -> impl IntoResponse {
    let discount = cart.discount().await;

    let (membership, form) = match auth {
        Some(signed_in) => {
            let membership = state
                .backend()
                .loyalty_membership(&signed_in.user.email)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "loyalty lookup failed");
                    None
                });
            let form = EnrollmentForm::for_user(&signed_in.user.username, &signed_in.user.email);
            (membership, form)
        }
        None => (None, EnrollmentForm::default()),
    };

    LoyaltyTemplate {
        ctx,
        discount: (!discount.is_zero()).then(|| discount.to_string()),
        programme_rate: state.config().shop.loyalty_discount.to_string(),
        membership,
        form,
        error: None,
        success: None,
    }
}

/// Enroll and grant the discount.
#[instrument(skip(state, cart, ctx, form))]
pub async fn enroll(
    State(state): State<AppState>,
    cart: CartSession,
    ctx: PageContext,
    Form(form): Form<EnrollmentForm>,
) -> Result<Response> {
    let programme_rate = state.config().shop.loyalty_discount;
    let current = cart.discount().await;

    let rerender = |ctx: PageContext, form: EnrollmentForm, error: String| {
        LoyaltyTemplate {
            ctx,
            discount: (!current.is_zero()).then(|| current.to_string()),
            programme_rate: programme_rate.to_string(),
            membership: None,
            form,
            error: Some(error),
            success: None,
        }
        .into_response()
    };

    let enrollment = match form.to_enrollment() {
        Ok(enrollment) => enrollment,
        Err(e) => return Ok(rerender(ctx, form, e.to_string())),
    };

    let (membership, message) = match state.backend().enroll_loyalty(&enrollment).await {
        Ok(EnrollmentOutcome::Enrolled(membership)) => (Some(membership), ENROLLED_MESSAGE),
        Ok(EnrollmentOutcome::AlreadyEnrolled) => (None, ALREADY_ENROLLED_MESSAGE),
        Err(e) => {
            tracing::warn!(error = %e, "loyalty enrollment refused");
            return Ok(rerender(ctx, form, e.user_message()));
        }
    };

    cart.set_discount(programme_rate).await?;
    tracing::info!(correo = %enrollment.correo, rate = %programme_rate, "loyalty discount granted");

    Ok(LoyaltyTemplate {
        ctx,
        discount: (!programme_rate.is_zero()).then(|| programme_rate.to_string()),
        programme_rate: programme_rate.to_string(),
        membership,
        form: EnrollmentForm::default(),
        error: None,
        success: Some(message.to_string()),
    }
    .into_response())
}
