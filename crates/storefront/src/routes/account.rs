//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::views::{OrderView, PageContext};
use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderView>,
    pub error: Option<String>,
}

/// The signed-in customer's orders, newest as the backend sorts them.
///
/// A refused token ends the session; any other failure is shown inline.
#[instrument(skip(state, signed_in, ctx), fields(user_id = %signed_in.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(signed_in): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (orders, error) = match state.backend().my_orders(&signed_in.token).await {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(ApiError::Unauthorized) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load orders");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(OrdersTemplate { ctx, orders, error })
}
