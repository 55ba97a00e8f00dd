//! Shop API connectivity check.
//!
//! Calls the public catalogue endpoints the storefront depends on and
//! reports what came back, so a deploy can fail fast on a wrong
//! `ORIGAMI_API_URL`.
//!
//! ```bash
//! origami-cli check-api
//! ```

use origami_storefront::api::{ApiError, BackendClient, ProductQuery};
use origami_storefront::config::{ApiConfig, ConfigError};

/// Errors from the connectivity check.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{endpoint} failed: {source}")]
    Endpoint {
        endpoint: &'static str,
        #[source]
        source: ApiError,
    },
}

/// What the backend returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub categories: usize,
    pub first_page: usize,
}

/// Load the API settings from the environment and run [`check`].
///
/// # Errors
///
/// Returns the first configuration or endpoint failure.
pub async fn run() -> Result<CheckReport, CheckError> {
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;
    tracing::info!(api = %config.base_url, "Checking shop API");

    let report = check(&BackendClient::from_config(&config)?).await?;
    tracing::info!(
        categories = report.categories,
        products = report.first_page,
        "Shop API reachable"
    );
    Ok(report)
}

/// List categories and the first catalogue page.
///
/// # Errors
///
/// Returns [`CheckError::Endpoint`] naming the endpoint that failed.
pub async fn check(client: &BackendClient) -> Result<CheckReport, CheckError> {
    let categories = client
        .list_categories()
        .await
        .map_err(|source| CheckError::Endpoint {
            endpoint: "GET categorias/",
            source,
        })?;

    let page = client
        .list_products(&ProductQuery {
            limit: 12,
            ..ProductQuery::default()
        })
        .await
        .map_err(|source| CheckError::Endpoint {
            endpoint: "GET productos/",
            source,
        })?;

    Ok(CheckReport {
        categories: categories.len(),
        first_page: page.products.len(),
    })
}
