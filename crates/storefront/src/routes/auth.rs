//! Login, registration and logout.
//!
//! The backend issues the bearer token; the storefront stores it with the
//! profile from `/auth/me` in the session. Signing in also checks whether the
//! email belongs to a loyalty member so the cart discount applies right away.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::PageContext;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_signed_in, redirect, set_signed_in};
use crate::models::SignedIn;
use crate::services::CartSession;
use crate::services::account::{LoginForm, RegisterForm};
use crate::state::AppState;

/// Where visitors land after signing in.
const AFTER_LOGIN_PATH: &str = "/products";

/// Shown on the login page after the backend refused a stored token.
pub const EXPIRED_NOTICE: &str = "Tu sesión expiró. Inicia sesión nuevamente.";

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub expired: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

/// Exchange credentials for a token, load the profile and store both.
///
/// A loyalty lookup failure is logged and ignored.
async fn sign_in(
    state: &AppState,
    session: &Session,
    email: &str,
    password: &str,
) -> std::result::Result<SignedIn, SignInError> {
    let backend = state.backend();
    let token = backend.login(email, password).await?;
    let profile = backend.me(&token).await?;

    let signed_in = SignedIn {
        token,
        user: profile.into(),
    };
    set_signed_in(session, &signed_in).await?;
    set_sentry_user(&signed_in.user.id, Some(&signed_in.user.email));

    match backend.loyalty_membership(&signed_in.user.email).await {
        Ok(Some(_)) => {
            CartSession::new(session.clone())
                .set_discount(state.config().shop.loyalty_discount)
                .await?;
            tracing::info!(user_id = %signed_in.user.id, "loyalty discount applied");
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "loyalty lookup failed"),
    }

    tracing::info!(user_id = %signed_in.user.id, admin = signed_in.user.is_admin, "signed in");
    Ok(signed_in)
}

#[derive(Debug, thiserror::Error)]
enum SignInError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(ctx))]
pub async fn login_page(ctx: PageContext, Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        email: String::new(),
        error: None,
        notice: query
            .expired
            .is_some_and(|flag| flag == "1")
            .then(|| EXPIRED_NOTICE.to_string()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, ctx, form), fields(email = %form.email.trim()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rerender = |ctx: PageContext, error: String| {
        LoginTemplate {
            ctx,
            email: form.email.trim().to_string(),
            error: Some(error),
            notice: None,
        }
        .into_response()
    };

    let (email, password) = match form.credentials() {
        Ok(credentials) => credentials,
        Err(e) => return Ok(rerender(ctx, e.to_string())),
    };

    match sign_in(&state, &session, email, password).await {
        Ok(_) => Ok(redirect(AFTER_LOGIN_PATH, ctx.htmx)),
        Err(SignInError::Api(e)) => {
            tracing::warn!(error = %e, "login failed");
            Ok(rerender(ctx, e.user_message()))
        }
        Err(SignInError::Session(e)) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(ctx))]
pub async fn register_page(ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        username: String::new(),
        email: String::new(),
        error: None,
    }
}

/// Create the account, then sign in with the same credentials.
#[instrument(skip(state, session, ctx, form), fields(username = %form.username.trim()))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let rerender = |ctx: PageContext, error: String| {
        RegisterTemplate {
            ctx,
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            error: Some(error),
        }
        .into_response()
    };

    let request = match form.to_request() {
        Ok(request) => request,
        Err(e) => return Ok(rerender(ctx, e.to_string())),
    };

    if let Err(e) = state.backend().register(&request).await {
        tracing::warn!(error = %e, "registration failed");
        return Ok(rerender(ctx, e.user_message()));
    }
    tracing::info!(username = %request.username, "account created");

    match sign_in(&state, &session, &request.email, &request.password).await {
        Ok(_) => Ok(redirect(AFTER_LOGIN_PATH, ctx.htmx)),
        Err(SignInError::Api(e)) => {
            tracing::warn!(error = %e, "login after registration failed");
            Ok(rerender(ctx, e.user_message()))
        }
        Err(SignInError::Session(e)) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Forget the token and profile. The cart stays.
#[instrument(skip(session, ctx))]
pub async fn logout(session: Session, ctx: PageContext) -> Result<Response> {
    clear_signed_in(&session).await?;
    clear_sentry_user();
    Ok(redirect("/", ctx.htmx))
}
