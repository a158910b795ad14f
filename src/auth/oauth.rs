//! Google OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with Google.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::callback::{LoginError, google_logged_in};
use crate::AppState;
use crate::error::AppError;

const STATE_COOKIE: &str = "oauth_state";

/// Where the browser lands after a completed login
const AFTER_LOGIN_PATH: &str = "/google";

/// Create authentication router
///
/// Routes:
/// - GET /login/google - Redirect to Google
/// - GET /login/google/authorized - OAuth callback
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login/google", get(google_redirect))
        .route("/login/google/authorized", get(google_authorized))
}

// =============================================================================
// Google OAuth
// =============================================================================

/// GET /login/google
///
/// Stores a CSRF state in a cookie and redirects to Google's consent page.
async fn google_redirect(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (authorize_url, csrf_state) = state.google.authorize_url();

    let cookie = Cookie::build((STATE_COOKIE, csrf_state.secret().clone()))
        .path("/login/google")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .build();

    (jar.add(cookie), Redirect::to(authorize_url.as_str()))
}

/// Query parameters from Google callback
#[derive(Debug, Deserialize)]
struct GoogleCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Error reported by Google, e.g. `access_denied`
    error: Option<String>,
}

/// GET /login/google/authorized
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for a token
/// 3. Hand the token to the login callback handler
/// 4. Redirect to `/google` on success, `/` otherwise
async fn google_authorized(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    verify_csrf_state(query.state.as_deref(), &jar)?;
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/login/google"));

    let token = match (query.code, query.error) {
        (_, Some(error)) => {
            tracing::warn!(%error, "Google returned an authorization error");
            None
        }
        (None, None) => None,
        (Some(code), None) => match state.google.exchange_code(code).await {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::warn!(%error, "Google token exchange failed");
                None
            }
        },
    };

    match google_logged_in(&state, jar.clone(), token.as_ref()).await {
        Ok((jar, _)) => Ok((jar, Redirect::to(AFTER_LOGIN_PATH))),
        Err(LoginError::TokenMissing | LoginError::ProfileFetch(_)) => {
            Ok((jar, Redirect::to("/")))
        }
        Err(LoginError::App(error)) => Err(error),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(state: Option<&str>, jar: &CookieJar) -> Result<(), AppError> {
    let expected = jar.get(STATE_COOKIE).map(|cookie| cookie.value());

    match (state, expected) {
        (Some(state), Some(expected)) if !state.is_empty() && state == expected => Ok(()),
        _ => {
            tracing::warn!("OAuth state mismatch");
            Err(AppError::Unauthorized)
        }
    }
}
