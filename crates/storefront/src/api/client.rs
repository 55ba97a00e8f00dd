//! Typed client for the shop REST API.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use origami_core::{OrderNumber, OrderStatus, ProductId};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::transport::{ApiRequest, ApiResponse, AuthToken, HttpTransport, ReqwestTransport};
use super::types::{
    Category, CustomOrderRequest, CustomQuote, GuestOrderRequest, LoyaltyEnrollment, Membership,
    NewCategory, Order, OrderReceipt, OrderRequest, Product, ProductDraft, ProductListing,
    RegisterRequest, StatusUpdate, TokenResponse, UserProfile,
};
use super::{ApiError, message_from_body};
use crate::config::{ApiConfig, MAX_PRODUCTS_PER_PAGE};

const CATEGORIES_TTL: Duration = Duration::from_secs(300);
const PRODUCTS_TTL: Duration = Duration::from_secs(60);
const CATEGORIES_KEY: &str = "categories";

/// Catalogue filter and page window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Free-text search over name and description
    pub q: Option<String>,
    /// Category slug
    pub categoria: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

impl ProductQuery {
    fn cache_key(&self) -> String {
        format!(
            "products:q={}:cat={}:offset={}:limit={}",
            self.q.as_deref().unwrap_or_default(),
            self.categoria.as_deref().unwrap_or_default(),
            self.offset,
            self.limit
        )
    }
}

/// One page of the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total matches, when the backend reports it
    pub total: Option<u64>,
    /// Whether a full page came back, so another may follow
    pub has_more: bool,
}

/// Result of a loyalty enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Enrolled(Membership),
    /// The email was already in the programme.
    AlreadyEnrolled,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the shop REST API.
///
/// Category lists are cached for 5 minutes and catalogue pages for one
/// minute. Admin product and category mutations invalidate the caches.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    transport: Arc<dyn HttpTransport>,
    categories: Cache<&'static str, Vec<Category>>,
    products: Cache<String, ProductPage>,
}

impl BackendClient {
    /// Create a client over any transport.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORIES_TTL)
            .build();
        let products = Cache::builder()
            .max_capacity(500)
            .time_to_live(PRODUCTS_TTL)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                transport,
                categories,
                products,
            }),
        }
    }

    /// Create a client that talks to the configured backend over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Send a request and map non-2xx statuses to [`ApiError`].
    async fn send(&self, request: ApiRequest, fallback: &str) -> Result<ApiResponse, ApiError> {
        let authenticated = request.bearer.is_some();
        let path = request.path.clone();
        let response = self.inner.transport.send(request).await?;

        if response.is_success() {
            return Ok(response);
        }

        let message = message_from_body(&response.body, fallback);
        tracing::warn!(
            path = %path,
            status = response.status,
            message = %message,
            "backend rejected request"
        );

        Err(match response.status {
            401 if authenticated => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            status => ApiError::Rejected { status, message },
        })
    }

    /// Send a request and decode the JSON body.
    async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.send(request, fallback).await?;
        serde_json::from_str(&response.body).map_err(|source| {
            tracing::error!(
                path = %path,
                error = %source,
                body = %response.body.chars().take(500).collect::<String>(),
                "failed to decode backend response"
            );
            ApiError::Decode { path, source }
        })
    }

    fn json<T: serde::Serialize>(request: ApiRequest, body: &T) -> Result<ApiRequest, ApiError> {
        request.json(body).map_err(ApiError::Encode)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Wrong credentials come back as [`ApiError::Rejected`] with the
    /// backend's message.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let request =
            ApiRequest::post("auth/login").form(&[("username", email), ("password", password)]);
        let token: TokenResponse = self.call(request, "Error de autenticación").await?;
        Ok(AuthToken::new(token.access_token))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the username or email is taken.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let request = Self::json(ApiRequest::post("auth/register"), request)?;
        self.send(request, "Error al registrarse").await?;
        Ok(())
    }

    /// Fetch the profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token has expired.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &AuthToken) -> Result<UserProfile, ApiError> {
        self.call(
            ApiRequest::get("auth/me").bearer(token),
            "Error al obtener usuario",
        )
        .await
    }

    // =========================================================================
    // Catalogue
    // =========================================================================

    /// List active products matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; failures are not cached.
    #[instrument(skip(self), fields(q = ?query.q, categoria = ?query.categoria))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let cache_key = query.cache_key();
        if let Some(page) = self.inner.products.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let limit = query.limit.clamp(1, MAX_PRODUCTS_PER_PAGE);
        let mut request = ApiRequest::get("productos/")
            .query("offset", query.offset)
            .query("limit", limit);
        if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
            request = request.query("q", q);
        }
        if let Some(categoria) = query.categoria.as_deref().filter(|c| !c.is_empty()) {
            request = request.query("categoria", categoria);
        }

        let listing: ProductListing = self.call(request, "Error al cargar productos").await?;
        let (products, total) = match listing {
            ProductListing::Bare(products) => (products, None),
            ProductListing::Paged { data, total } => (data, total),
        };
        let has_more = match total {
            Some(total) => u64::from(query.offset) + (products.len() as u64) < total,
            None => products.len() >= limit as usize,
        };
        let page = ProductPage {
            products,
            total,
            has_more,
        };

        self.inner.products.insert(cache_key, page.clone()).await;
        Ok(page)
    }

    /// Find one product by id by walking the unfiltered catalogue.
    ///
    /// The backend has no single-product endpoint; pages are served from the
    /// catalogue cache when warm.
    ///
    /// # Errors
    ///
    /// Returns an error if a page request fails.
    #[instrument(skip(self))]
    pub async fn find_product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let mut query = ProductQuery {
            limit: MAX_PRODUCTS_PER_PAGE,
            ..ProductQuery::default()
        };
        loop {
            let page = self.list_products(&query).await?;
            if let Some(product) = page.products.iter().find(|p| p.id == id) {
                return Ok(Some(product.clone()));
            }
            if !page.has_more || page.products.is_empty() {
                return Ok(None);
            }
            query.offset += MAX_PRODUCTS_PER_PAGE;
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's validation message.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &AuthToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let request = Self::json(ApiRequest::post("productos").bearer(token), draft)?;
        let product = self.call(request, "Error al crear producto").await?;
        self.inner.products.invalidate_all();
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product no longer exists.
    #[instrument(skip(self, token, draft))]
    pub async fn update_product(
        &self,
        token: &AuthToken,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let request = Self::json(
            ApiRequest::patch(format!("productos/{id}")).bearer(token),
            draft,
        )?;
        let product = self.call(request, "Error al actualizar producto").await?;
        self.inner.products.invalidate_all();
        Ok(product)
    }

    /// Deactivate a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product no longer exists.
    #[instrument(skip(self, token))]
    pub async fn delete_product(&self, token: &AuthToken, id: ProductId) -> Result<(), ApiError> {
        let request = ApiRequest::delete(format!("productos/{id}")).bearer(token);
        self.send(request, "Error al eliminar producto").await?;
        self.inner.products.invalidate_all();
        Ok(())
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(categories) = self.inner.categories.get(&CATEGORIES_KEY).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .call(ApiRequest::get("categorias/"), "Error al cargar categorías")
            .await?;
        self.inner
            .categories
            .insert(CATEGORIES_KEY, categories.clone())
            .await;
        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with status 409 if the slug exists.
    #[instrument(skip(self, token, category), fields(slug = %category.slug))]
    pub async fn create_category(
        &self,
        token: &AuthToken,
        category: &NewCategory,
    ) -> Result<Category, ApiError> {
        let request = Self::json(ApiRequest::post("categorias/").bearer(token), category)?;
        let created = self.call(request, "Error al crear categoría").await?;
        self.inner.categories.invalidate_all();
        Ok(created)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order for the authenticated customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token expired.
    #[instrument(skip(self, token, order), fields(items = order.items.len()))]
    pub async fn create_order(
        &self,
        token: &AuthToken,
        order: &OrderRequest,
    ) -> Result<OrderReceipt, ApiError> {
        let request = Self::json(ApiRequest::post("pedidos").bearer(token), order)?;
        self.call(request, "Error al crear pedido").await
    }

    /// Place an order without an account.
    ///
    /// # Errors
    ///
    /// Returns an error with the backend's message if the order is refused.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create_guest_order(
        &self,
        order: &GuestOrderRequest,
    ) -> Result<OrderReceipt, ApiError> {
        let request = Self::json(ApiRequest::post("pedidos/guest"), order)?;
        self.call(request, "Error al crear pedido").await
    }

    /// Request a custom piece.
    ///
    /// # Errors
    ///
    /// Returns an error with the backend's message if the request is refused.
    #[instrument(skip_all)]
    pub async fn create_custom_order(
        &self,
        token: Option<&AuthToken>,
        order: &CustomOrderRequest,
    ) -> Result<OrderReceipt, ApiError> {
        let request = Self::json(
            ApiRequest::post("pedidos/personalizado").maybe_bearer(token),
            order,
        )?;
        self.call(request, "Error al crear pedido personalizado")
            .await
    }

    /// Orders placed with the authenticated user's email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token expired.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &AuthToken) -> Result<Vec<Order>, ApiError> {
        self.call(
            ApiRequest::get("pedidos/mis-pedidos").bearer(token),
            "Error al cargar pedidos",
        )
        .await
    }

    /// Every order in the shop (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] for non-admin tokens.
    #[instrument(skip_all)]
    pub async fn all_orders(&self, token: &AuthToken) -> Result<Vec<Order>, ApiError> {
        self.call(
            ApiRequest::get("pedidos/").bearer(token),
            "Error al cargar pedidos",
        )
        .await
    }

    /// Move an order to a new status (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token, order), fields(order = %order))]
    pub async fn update_order_status(
        &self,
        token: &AuthToken,
        order: &OrderNumber,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let path = format!("pedidos/{}/estado", urlencoding::encode(order.as_str()));
        let request = Self::json(
            ApiRequest::put(path).bearer(token),
            &StatusUpdate { estado: status },
        )?;
        self.send(request, "Error al actualizar estado").await?;
        Ok(())
    }

    /// Record the seller's quote on a custom order (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token, order, quote), fields(order = %order))]
    pub async fn update_custom_order(
        &self,
        token: &AuthToken,
        order: &OrderNumber,
        quote: &CustomQuote,
    ) -> Result<(), ApiError> {
        let path = format!(
            "pedidos/{}/personalizado",
            urlencoding::encode(order.as_str())
        );
        let request = Self::json(ApiRequest::patch(path).bearer(token), quote)?;
        self.send(request, "Error al actualizar pedido personalizado")
            .await?;
        Ok(())
    }

    // =========================================================================
    // Loyalty
    // =========================================================================

    /// Join the loyalty programme.
    ///
    /// An email that is already enrolled is reported as
    /// [`EnrollmentOutcome::AlreadyEnrolled`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error for any other refusal.
    #[instrument(skip(self, enrollment), fields(correo = %enrollment.correo))]
    pub async fn enroll_loyalty(
        &self,
        enrollment: &LoyaltyEnrollment,
    ) -> Result<EnrollmentOutcome, ApiError> {
        let request = Self::json(ApiRequest::post("fidelizacion/"), enrollment)?;
        match self.call(request, "Error al registrar fidelización").await {
            Ok(membership) => Ok(EnrollmentOutcome::Enrolled(membership)),
            Err(ApiError::Rejected { status: 409, .. }) => Ok(EnrollmentOutcome::AlreadyEnrolled),
            Err(err) => Err(err),
        }
    }

    /// Look up a member by email, `None` when not enrolled.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason other than 404.
    #[instrument(skip(self))]
    pub async fn loyalty_membership(&self, email: &str) -> Result<Option<Membership>, ApiError> {
        let path = format!("fidelizacion/{}", urlencoding::encode(email));
        match self
            .call(ApiRequest::get(path), "Error al consultar fidelización")
            .await
        {
            Ok(membership) => Ok(Some(membership)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
