//! Authentication extractors.
//!
//! The bearer token and profile of a logged-in visitor live in the session
//! under [`session_keys::SIGNED_IN`]. These extractors read them back and
//! turn away visitors who are not allowed on a page.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{SignedIn, session_keys};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires a logged-in visitor.
///
/// If nobody is logged in, redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(signed_in): RequireAuth) -> impl IntoResponse {
///     format!("Hola, {}!", signed_in.user.username)
/// }
/// ```
pub struct RequireAuth(pub SignedIn);

/// Extractor that requires a logged-in administrator.
///
/// Anonymous visitors go to the login page, everyone else to the home page.
pub struct RequireAdmin(pub SignedIn);

/// Error returned when a visitor may not see a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Nobody is logged in.
    RedirectToLogin { htmx: bool },
    /// Logged in, but not an administrator.
    RedirectHome { htmx: bool },
    /// The session layer is missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { htmx } => redirect(LOGIN_PATH, htmx),
            Self::RedirectHome { htmx } => redirect("/", htmx),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Redirect that HTMX follows as a full page navigation.
///
/// A plain 303 on an HTMX request would swap the login page into whatever
/// fragment asked for it.
#[must_use]
pub fn redirect(to: &str, htmx: bool) -> Response {
    if htmx {
        ([("HX-Redirect", to)], StatusCode::OK).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

async fn signed_in(parts: &Parts) -> Result<Option<SignedIn>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    Ok(session
        .get::<SignedIn>(session_keys::SIGNED_IN)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let htmx = is_htmx(&parts.headers);
        signed_in(parts)
            .await?
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin { htmx })
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let htmx = is_htmx(&parts.headers);
        match signed_in(parts).await? {
            Some(signed_in) if signed_in.user.is_admin => Ok(Self(signed_in)),
            Some(signed_in) => {
                tracing::warn!(user_id = %signed_in.user.id, "non-admin tried to open the back-office");
                Err(AuthRejection::RedirectHome { htmx })
            }
            None => Err(AuthRejection::RedirectToLogin { htmx }),
        }
    }
}

/// Extractor that optionally gets the logged-in visitor.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<SignedIn>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(signed_in(parts).await.ok().flatten()))
    }
}

/// Store the logged-in visitor in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_signed_in(
    session: &Session,
    signed_in: &SignedIn,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::SIGNED_IN, signed_in).await
}

/// Remove the token and profile from the session (logout or expired token).
///
/// The cart and discount are kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_signed_in(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<SignedIn>(session_keys::SIGNED_IN)
        .await?;
    Ok(())
}
