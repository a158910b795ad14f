//! Entry, post-login and logout pages

use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::AppState;
use crate::auth::session::session_removal_cookie;
use crate::auth::{CurrentUser, LOGIN_PATH, MaybeUser, google};
use crate::data::User;
use crate::error::AppError;

/// Create page router
///
/// Routes:
/// - GET / - Entry page
/// - GET /google - Start login, or show who is logged in
/// - GET /logout - Clear the session (requires login)
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/google", get(google_page))
        .route("/logout", get(logout))
}

/// GET /
async fn index() -> Html<&'static str> {
    Html("<a href='/google'> <h1> Log In </h1> </a>")
}

/// GET /google
///
/// Unauthenticated visitors are sent through the Google login. Logged-in
/// users see their Google email and a freshly generated API key.
async fn google_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let email = current_email(&state, &user).await?;
    let api_key = generate_api_key();

    Ok(Html(format!(
        "<h1> You are logged in as {}. Here's your API key: {} </h1>",
        html_escape::encode_text(&email),
        api_key
    ))
    .into_response())
}

/// GET /logout
async fn logout(CurrentUser(user): CurrentUser, jar: CookieJar) -> (CookieJar, Redirect) {
    crate::metrics::LOGOUTS_TOTAL.inc();
    tracing::info!(user_id = user.id, "User logged out, redirecting to homepage");

    (jar.remove(session_removal_cookie()), Redirect::to("/"))
}

/// Email reported by Google for the user's stored token.
///
/// Falls back to the email recorded at sign-up when the token is absent or
/// Google rejects it.
async fn current_email(state: &AppState, user: &User) -> Result<String, AppError> {
    let access_token = state
        .db
        .find_oauth_link_for_user(user.id, google::PROVIDER)
        .await?
        .and_then(|link| link.access_token());

    let Some(access_token) = access_token else {
        return Ok(user.email.clone());
    };

    match state.google.fetch_profile(&access_token).await {
        Ok(profile) => Ok(profile.email),
        Err(error) => {
            tracing::warn!(%error, user_id = user.id, "Falling back to stored email");
            Ok(user.email.clone())
        }
    }
}

/// 32 random bytes, URL-safe base64 without padding
fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_keys_are_url_safe_and_distinct() {
        let first = generate_api_key();
        let second = generate_api_key();

        assert_eq!(first.len(), 43);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(first, second);
    }
}
