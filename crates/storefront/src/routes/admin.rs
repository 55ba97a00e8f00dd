//! Back-office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /admin?tab=productos|pedidos|personalizados|categorias
//! GET  /admin/products/new          POST /admin/products/new
//! GET  /admin/products/{id}/edit    POST /admin/products/{id}/edit
//! POST /admin/products/{id}/delete
//! POST /admin/orders/{id}/status
//! POST /admin/orders/{id}/quote
//! POST /admin/categories
//! ```
//!
//! Every handler takes [`RequireAdmin`]. Successful mutations redirect back
//! to the dashboard tab with a notice code; refusals re-render the page with
//! the backend's message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use origami_core::{OrderNumber, ProductId};
use serde::Deserialize;
use tracing::instrument;

use super::views::{OrderView, PageContext, ProductCard, status_options};
use crate::api::{ApiError, AuthToken, Category, Product, ProductQuery};
use crate::config::MAX_PRODUCTS_PER_PAGE;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, redirect};
use crate::services::admin::{CategoryForm, ProductForm, QuoteForm, StatusForm};
use crate::state::AppState;

// =============================================================================
// Tabs and notices
// =============================================================================

/// Dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Products,
    Orders,
    CustomOrders,
    Categories,
}

impl Tab {
    pub const ALL: [Self; 4] = [
        Self::Products,
        Self::Orders,
        Self::CustomOrders,
        Self::Categories,
    ];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Products => "productos",
            Self::Orders => "pedidos",
            Self::CustomOrders => "personalizados",
            Self::Categories => "categorias",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Products => "Productos",
            Self::Orders => "Pedidos",
            Self::CustomOrders => "Personalizados",
            Self::Categories => "Categorías",
        }
    }

    /// Unknown or missing slugs open the products tab.
    #[must_use]
    pub fn from_slug(slug: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| Some(tab.slug()) == slug)
            .unwrap_or_default()
    }

    fn href(self) -> String {
        format!("/admin?tab={}", self.slug())
    }
}

/// Text for a notice code carried in the redirect after a mutation.
fn notice_text(code: &str) -> Option<&'static str> {
    Some(match code {
        "producto-creado" => "Producto creado",
        "producto-actualizado" => "Producto actualizado",
        "producto-eliminado" => "Producto eliminado",
        "estado-actualizado" => "Estado del pedido actualizado",
        "cotizacion-guardada" => "Cotización guardada",
        "categoria-creada" => "Categoría creada",
        _ => return None,
    })
}

fn done(tab: Tab, notice: &str, htmx: bool) -> Response {
    redirect(&format!("{}&aviso={notice}", tab.href()), htmx)
}

/// A refused token ends the session; other failures are shown on the page.
fn refusal(error: ApiError) -> Result<String> {
    match error {
        ApiError::Unauthorized => Err(AppError::SessionExpired),
        other => {
            tracing::warn!(error = %other, "back-office request refused");
            Ok(other.user_message())
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard query string.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub aviso: Option<String>,
}

/// Tab link in the dashboard header.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// An order row with its status choices.
#[derive(Debug, Clone)]
pub struct AdminOrderRow {
    pub order: OrderView,
    pub status_options: Vec<(&'static str, bool)>,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub tab: &'static str,
    pub tabs: Vec<TabLink>,
    pub products: Vec<ProductCard>,
    pub orders: Vec<AdminOrderRow>,
    pub categories: Vec<Category>,
    pub category_form: CategoryForm,
    pub notice: Option<&'static str>,
    pub error: Option<String>,
}

/// Every active product, walking the catalogue a full page at a time.
async fn all_products(state: &AppState) -> std::result::Result<Vec<Product>, ApiError> {
    let mut query = ProductQuery {
        limit: MAX_PRODUCTS_PER_PAGE,
        ..ProductQuery::default()
    };
    let mut products = Vec::new();
    loop {
        let page = state.backend().list_products(&query).await?;
        let last = !page.has_more || page.products.is_empty();
        products.extend(page.products);
        if last {
            return Ok(products);
        }
        query.offset += MAX_PRODUCTS_PER_PAGE;
    }
}

/// Load what `tab` shows and build the page.
async fn dashboard(
    state: &AppState,
    token: &AuthToken,
    ctx: PageContext,
    tab: Tab,
    notice: Option<&'static str>,
    error: Option<String>,
    category_form: CategoryForm,
) -> Result<DashboardTemplate> {
    let mut page = DashboardTemplate {
        ctx,
        tab: tab.slug(),
        tabs: Tab::ALL
            .into_iter()
            .map(|t| TabLink {
                href: t.href(),
                label: t.label(),
                active: t == tab,
            })
            .collect(),
        products: Vec::new(),
        orders: Vec::new(),
        categories: Vec::new(),
        category_form,
        notice,
        error,
    };

    let load_error = match tab {
        Tab::Products => match all_products(state).await {
            Ok(products) => {
                page.products = products.iter().map(ProductCard::from).collect();
                None
            }
            Err(e) => Some(e),
        },
        Tab::Orders | Tab::CustomOrders => match state.backend().all_orders(token).await {
            Ok(orders) => {
                page.orders = orders
                    .iter()
                    .filter(|order| tab == Tab::Orders || order.is_custom())
                    .map(|order| {
                        let view = OrderView::from(order);
                        AdminOrderRow {
                            status_options: status_options(&view.status),
                            order: view,
                        }
                    })
                    .collect();
                None
            }
            Err(e) => Some(e),
        },
        Tab::Categories => match state.backend().list_categories().await {
            Ok(categories) => {
                page.categories = categories;
                None
            }
            Err(e) => Some(e),
        },
    };

    if let Some(e) = load_error {
        let message = refusal(e)?;
        page.error.get_or_insert(message);
    }
    Ok(page)
}

/// Display the dashboard.
#[instrument(skip(state, signed_in, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse> {
    let tab = Tab::from_slug(query.tab.as_deref());
    let notice = query.aviso.as_deref().and_then(notice_text);
    dashboard(
        &state,
        &signed_in.token,
        ctx,
        tab,
        notice,
        None,
        CategoryForm::default(),
    )
    .await
}

// =============================================================================
// Products
// =============================================================================

/// Product form page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub title: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

async fn categories(state: &AppState) -> Vec<Category> {
    state.backend().list_categories().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load categories");
        Vec::new()
    })
}

async fn product_form(
    state: &AppState,
    ctx: PageContext,
    product: Option<ProductId>,
    form: ProductForm,
    error: Option<String>,
) -> ProductFormTemplate {
    let (title, action) = match product {
        Some(id) => ("Editar producto", format!("/admin/products/{id}/edit")),
        None => ("Nuevo producto", "/admin/products/new".to_string()),
    };
    ProductFormTemplate {
        ctx,
        title,
        action,
        form,
        categories: categories(state).await,
        error,
    }
}

/// Blank product form.
#[instrument(skip(state, _admin, ctx))]
pub async fn new_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
) -> impl IntoResponse {
    product_form(&state, ctx, None, ProductForm::new_product(), None).await
}

/// Create a product.
#[instrument(skip(state, signed_in, ctx, form))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            return Ok(product_form(&state, ctx, None, form, Some(e.to_string()))
                .await
                .into_response());
        }
    };

    match state.backend().create_product(&signed_in.token, &draft).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, name = %product.name, "product created");
            Ok(done(Tab::Products, "producto-creado", ctx.htmx))
        }
        Err(e) => {
            let message = refusal(e)?;
            Ok(product_form(&state, ctx, None, form, Some(message))
                .await
                .into_response())
        }
    }
}

/// Product form filled with the current values.
///
/// Only products the catalogue lists can be edited.
#[instrument(skip(state, _admin, ctx))]
pub async fn edit_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state
        .backend()
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(product_form(&state, ctx, Some(id), ProductForm::from(&product), None).await)
}

/// Save changes to a product.
#[instrument(skip(state, signed_in, ctx, form))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            return Ok(product_form(&state, ctx, Some(id), form, Some(e.to_string()))
                .await
                .into_response());
        }
    };

    match state
        .backend()
        .update_product(&signed_in.token, id, &draft)
        .await
    {
        Ok(_) => {
            tracing::info!(product_id = %id, "product updated");
            Ok(done(Tab::Products, "producto-actualizado", ctx.htmx))
        }
        Err(e) => {
            let message = refusal(e)?;
            Ok(product_form(&state, ctx, Some(id), form, Some(message))
                .await
                .into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip(state, signed_in, ctx))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<i64>,
) -> Result<Response> {
    let id = ProductId::new(id);
    match state.backend().delete_product(&signed_in.token, id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "product deleted");
            Ok(done(Tab::Products, "producto-eliminado", ctx.htmx))
        }
        Err(e) => {
            let message = refusal(e)?;
            Ok(dashboard(
                &state,
                &signed_in.token,
                ctx,
                Tab::Products,
                None,
                Some(message),
                CategoryForm::default(),
            )
            .await?
            .into_response())
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Move an order to another status.
#[instrument(skip(state, signed_in, ctx))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Path(number): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let number = OrderNumber::new(number);
    let result = match form.status() {
        Ok(status) => state
            .backend()
            .update_order_status(&signed_in.token, &number, status)
            .await
            .map_err(refusal),
        Err(e) => Err(Ok(e.to_string())),
    };

    match result {
        Ok(()) => {
            tracing::info!(order_number = %number, estado = %form.estado, "order status updated");
            Ok(done(Tab::Orders, "estado-actualizado", ctx.htmx))
        }
        Err(message) => Ok(dashboard(
            &state,
            &signed_in.token,
            ctx,
            Tab::Orders,
            None,
            Some(message?),
            CategoryForm::default(),
        )
        .await?
        .into_response()),
    }
}

/// Save the seller's quote on a custom order.
#[instrument(skip(state, signed_in, ctx, form))]
pub async fn update_quote(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Path(number): Path<String>,
    Form(form): Form<QuoteForm>,
) -> Result<Response> {
    let number = OrderNumber::new(number);
    let result = match form.to_quote() {
        Ok(quote) => state
            .backend()
            .update_custom_order(&signed_in.token, &number, &quote)
            .await
            .map_err(refusal),
        Err(e) => Err(Ok(e.to_string())),
    };

    match result {
        Ok(()) => {
            tracing::info!(order_number = %number, "custom order quoted");
            Ok(done(Tab::CustomOrders, "cotizacion-guardada", ctx.htmx))
        }
        Err(message) => Ok(dashboard(
            &state,
            &signed_in.token,
            ctx,
            Tab::CustomOrders,
            None,
            Some(message?),
            CategoryForm::default(),
        )
        .await?
        .into_response()),
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Create a category.
#[instrument(skip(state, signed_in, ctx, form))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(signed_in): RequireAdmin,
    ctx: PageContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let result = match form.to_category() {
        Ok(category) => state
            .backend()
            .create_category(&signed_in.token, &category)
            .await
            .map(|created| tracing::info!(slug = %created.slug, "category created"))
            .map_err(refusal),
        Err(e) => Err(Ok(e.to_string())),
    };

    match result {
        Ok(()) => Ok(done(Tab::Categories, "categoria-creada", ctx.htmx)),
        Err(message) => Ok(dashboard(
            &state,
            &signed_in.token,
            ctx,
            Tab::Categories,
            None,
            Some(message?),
            form,
        )
        .await?
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_from_slug() {
        assert_eq!(Tab::from_slug(Some("pedidos")), Tab::Orders);
        assert_eq!(Tab::from_slug(Some("personalizados")), Tab::CustomOrders);
        assert_eq!(Tab::from_slug(Some("nada")), Tab::Products);
        assert_eq!(Tab::from_slug(None), Tab::Products);
    }

    #[test]
    fn notices_are_fixed_text() {
        assert_eq!(notice_text("producto-creado"), Some("Producto creado"));
        assert_eq!(notice_text("<script>"), None);
    }
}
