//! Login callback handler
//!
//! Runs once the code exchange has finished. Resolves the provider identity
//! to a local user, provisioning one on first sight, and marks that user as
//! the session principal.
//!
//! All rows are written here. The route that invokes the handler never
//! stores the token on its own.

use axum_extra::extract::CookieJar;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use thiserror::Error;

use super::google::{self, ProviderError};
use super::session::{Session, create_session_token, session_cookie};
use crate::AppState;
use crate::data::{Database, NewUser, OAuthLink, User};
use crate::error::AppError;
use crate::metrics::{self, outcome};

/// Reasons a login callback stops before a session is established
#[derive(Debug, Error)]
pub enum LoginError {
    /// The exchange produced no usable token
    #[error("OAuth token missing")]
    TokenMissing,

    /// The userinfo endpoint could not be reached successfully
    #[error("Failed to fetch user info from provider: {0}")]
    ProfileFetch(#[source] ProviderError),

    /// Store failures propagate to the caller unchanged
    #[error(transparent)]
    App(#[from] AppError),
}

/// A user resolved from a provider identity
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Whether the user was provisioned by this login
    pub created: bool,
}

/// Complete a Google login.
///
/// On success the returned jar carries a session cookie for the resolved
/// user. On `TokenMissing` or `ProfileFetch` nothing has been written.
pub async fn google_logged_in(
    state: &AppState,
    jar: CookieJar,
    token: Option<&BasicTokenResponse>,
) -> Result<(CookieJar, LoginOutcome), LoginError> {
    let result = complete_login(state, token).await;

    let login = match result {
        Ok(login) => login,
        Err(error) => {
            let label = match &error {
                LoginError::TokenMissing => outcome::TOKEN_MISSING,
                LoginError::ProfileFetch(_) => outcome::PROFILE_FETCH_FAILED,
                LoginError::App(_) => outcome::ERROR,
            };
            metrics::observe_login(google::PROVIDER, label);
            return Err(error);
        }
    };

    let session = Session::for_user(&login.user, state.config.auth.session_max_age);
    let session_token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(
        session_token,
        state.config.should_use_secure_cookies(),
    ));

    metrics::observe_login(
        google::PROVIDER,
        if login.created {
            outcome::CREATED
        } else {
            outcome::LINKED
        },
    );
    tracing::info!(
        user_id = login.user.id,
        username = %login.user.username,
        created = login.created,
        "Successfully signed in with Google"
    );

    Ok((jar, login))
}

async fn complete_login(
    state: &AppState,
    token: Option<&BasicTokenResponse>,
) -> Result<LoginOutcome, LoginError> {
    let Some(token) = token.filter(|token| !token.access_token().secret().is_empty()) else {
        tracing::warn!("OAuth token missing, aborting login");
        return Err(LoginError::TokenMissing);
    };

    let profile = state
        .google
        .fetch_profile(token.access_token().secret())
        .await
        .map_err(|error| {
            tracing::warn!(%error, "Failed to fetch user info from Google");
            LoginError::ProfileFetch(error)
        })?;

    let token_json = serde_json::to_string(token).map_err(|e| AppError::Internal(e.into()))?;

    let login = resolve_user(
        &state.db,
        google::PROVIDER,
        &profile.id,
        &profile.email,
        token_json,
    )
    .await?;

    Ok(login)
}

/// Resolve a provider identity to a local user.
///
/// A returning identity reuses its linked user and has its stored token
/// replaced. Otherwise a user is created with username = provider user id
/// and linked to the identity in a single transaction.
pub async fn resolve_user(
    db: &Database,
    provider: &str,
    provider_user_id: &str,
    email: &str,
    token_json: String,
) -> Result<LoginOutcome, AppError> {
    let mut link = match db.find_oauth_link(provider, provider_user_id).await? {
        Some(link) => link,
        None => OAuthLink::new(provider, provider_user_id, token_json.clone()),
    };
    link.token = token_json;

    if let (Some(link_id), Some(user_id)) = (link.id, link.user_id) {
        if let Some(user) = db.get_user(user_id).await? {
            db.update_oauth_token(link_id, &link.token).await?;
            return Ok(LoginOutcome {
                user,
                created: false,
            });
        }
    }

    tracing::info!(provider, provider_user_id, "Creating user in database");
    let new_user = NewUser::from_provider_identity(provider_user_id, email);
    let (user, _) = db.create_user_with_link(&new_user, &link).await?;
    metrics::USERS_CREATED_TOTAL.inc();

    Ok(LoginOutcome {
        user,
        created: true,
    })
}
