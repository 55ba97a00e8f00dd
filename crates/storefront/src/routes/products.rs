//! Catalogue and search.
//!
//! The search box re-requests only the result list. HTMX waits for the
//! configured debounce after the last keystroke and replaces any request
//! still in flight, so results never arrive out of order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use super::views::{PageContext, ProductCard};
use crate::api::ProductQuery;
use crate::filters;
use crate::state::AppState;

/// Catalogue query string. Everything is optional and blank means unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogueQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub categoria: String,
    /// Kept as text so `page=` or `page=abc` fall back to the first page
    #[serde(default)]
    pub page: String,
}

impl CatalogueQuery {
    fn search(&self) -> Option<String> {
        let q = self.q.trim();
        (!q.is_empty()).then(|| q.to_string())
    }

    fn category(&self) -> Option<String> {
        let slug = self.categoria.trim();
        (!slug.is_empty()).then(|| slug.to_string())
    }

    fn page(&self) -> u32 {
        self.page.trim().parse().unwrap_or(1).max(1)
    }

    fn backend_query(&self, per_page: u32) -> ProductQuery {
        ProductQuery {
            q: self.search(),
            categoria: self.category(),
            offset: (self.page() - 1).saturating_mul(per_page),
            limit: per_page,
        }
    }

    /// Link to another page of the same search.
    fn page_href(&self, page: u32) -> String {
        let mut href = format!("/products?page={page}");
        if let Some(q) = self.search() {
            href.push_str("&q=");
            href.push_str(&urlencoding::encode(&q));
        }
        if let Some(slug) = self.category() {
            href.push_str("&categoria=");
            href.push_str(&urlencoding::encode(&slug));
        }
        href
    }
}

/// Category filter option.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub slug: String,
    pub name: String,
    pub selected: bool,
}

/// The result list and its header.
#[derive(Debug, Clone, Default)]
pub struct ProductResults {
    pub products: Vec<ProductCard>,
    pub count: u64,
    pub error: Option<String>,
    pub page: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Catalogue page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub q: String,
    pub categories: Vec<CategoryOption>,
    pub debounce_ms: u32,
    pub results: ProductResults,
}

/// Result list fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_results.html")]
pub struct ProductResultsTemplate {
    pub results: ProductResults,
}

/// Fetch one page of results. A backend failure becomes an inline error with
/// an empty list.
pub(crate) async fn load_results(state: &AppState, query: &CatalogueQuery) -> ProductResults {
    let per_page = state.config().shop.products_per_page;
    let page = query.page();

    match state
        .backend()
        .list_products(&query.backend_query(per_page))
        .await
    {
        Ok(found) => ProductResults {
            count: found.total.unwrap_or(found.products.len() as u64),
            products: found.products.iter().map(ProductCard::from).collect(),
            error: None,
            page,
            prev_href: (page > 1).then(|| query.page_href(page - 1)),
            next_href: found.has_more.then(|| query.page_href(page + 1)),
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to load products");
            ProductResults {
                error: Some(e.user_message()),
                page,
                ..ProductResults::default()
            }
        }
    }
}

/// Display the catalogue page.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogueQuery>,
) -> impl IntoResponse {
    let selected = query.category();
    let categories = match state.backend().list_categories().await {
        Ok(categories) => categories
            .into_iter()
            .map(|category| CategoryOption {
                selected: selected.as_deref() == Some(category.slug.as_str()),
                slug: category.slug,
                name: category.name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load categories");
            Vec::new()
        }
    };
    let results = load_results(&state, &query).await;

    ProductsIndexTemplate {
        ctx,
        q: query.q.trim().to_string(),
        categories,
        debounce_ms: state.config().shop.search_debounce_ms,
        results,
    }
}

/// Result list only, for the search box (HTMX).
#[instrument(skip(state))]
pub async fn results(
    State(state): State<AppState>,
    Query(query): Query<CatalogueQuery>,
) -> impl IntoResponse {
    ProductResultsTemplate {
        results: load_results(&state, &query).await,
    }
}
