//! Session guard
//!
//! Resolves the session principal from the signed session cookie.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, verify_session_token};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// Where unauthenticated requests to protected routes are sent
pub const LOGIN_PATH: &str = "/login/google";

/// Load the user a request's session cookie points at.
///
/// Missing, invalid, or expired cookies and sessions whose user no longer
/// exists all yield `None`.
async fn load_session_user(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Option<User>, AppError> {
    let jar = CookieJar::from_headers(headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let session = match verify_session_token(cookie.value(), &state.config.auth.session_secret) {
        Ok(session) => session,
        Err(_) => {
            tracing::debug!("Ignoring invalid session cookie");
            return Ok(None);
        }
    };

    state.db.get_user(session.user_id).await
}

/// Extractor for routes that require a logged-in user
///
/// Rejects with a redirect to [`LOGIN_PATH`] when there is no session
/// principal.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        match load_session_user(&parts.headers, &state).await {
            Ok(Some(user)) => {
                parts.extensions.insert(user.clone());
                Ok(CurrentUser(user))
            }
            Ok(None) => Err(Redirect::to(LOGIN_PATH).into_response()),
            Err(error) => Err(error.into_response()),
        }
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of redirecting.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let state = AppState::from_ref(state);
        let user = load_session_user(&parts.headers, &state).await?;
        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
