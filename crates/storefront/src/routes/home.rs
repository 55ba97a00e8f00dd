//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::views::{PageContext, ProductCard};
use crate::api::ProductQuery;
use crate::filters;
use crate::state::AppState;

/// Products shown on the home page.
const FEATURED_COUNT: u32 = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<ProductCard>,
    pub loyalty_rate: String,
}

/// Display the home page with the first products of the catalogue.
///
/// The page still renders when the backend is down, just without products.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let query = ProductQuery {
        limit: FEATURED_COUNT,
        ..ProductQuery::default()
    };
    let featured = match state.backend().list_products(&query).await {
        Ok(page) => page.products.iter().map(ProductCard::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load featured products");
            Vec::new()
        }
    };

    HomeTemplate {
        ctx,
        featured,
        loyalty_rate: state.config().shop.loyalty_discount.to_string(),
    }
}
