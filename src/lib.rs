//! google-login - Google OAuth2 login with local account linking
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - Entry / post-login / logout pages                        │
//! │  - Google OAuth redirect and callback                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Auth Layer                             │
//! │  - Code exchange (oauth2 crate)                             │
//! │  - Identity linking                                         │
//! │  - Signed session cookies                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx): users, oauth                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: Page handlers and metrics endpoint
//! - `auth`: Google OAuth flow, account linking, sessions
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Google OAuth client
    pub google: Arc<auth::GoogleProvider>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to the database and run migrations
    /// 2. Build the HTTP client used for provider calls
    /// 3. Build the Google OAuth client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.url).await?;
        tracing::info!("Database connected");

        // The token endpoint must never be followed through a redirect.
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("google-login/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let google = auth::GoogleProvider::new(
            &config.google,
            config.google_redirect_uri(),
            http_client,
        )
        .map_err(|e| error::AppError::Config(e.to_string()))?;
        tracing::info!(redirect_uri = %config.google_redirect_uri(), "Google OAuth client ready");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            google: Arc::new(google),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::pages_router())
        .merge(auth::auth_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    async fn test_state() -> (AppState, tempfile::TempDir) {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("test.db").display());

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { url: db_url },
            auth: config::AuthConfig {
                session_secret: "unit-test-secret-that-is-32-bytes".to_string(),
                session_max_age: 3600,
            },
            google: config::GoogleOAuthConfig {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                auth_url: config::GOOGLE_AUTH_URL.to_string(),
                token_url: config::GOOGLE_TOKEN_URL.to_string(),
                userinfo_url: config::GOOGLE_USERINFO_URL.to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        (AppState::new(config).await.unwrap(), temp_dir)
    }

    #[tokio::test]
    async fn index_links_to_google_login() {
        let (state, _temp_dir) = test_state().await;
        let response = build_router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("href='/google'"));
    }

    #[tokio::test]
    async fn google_page_without_session_redirects_to_login() {
        let (state, _temp_dir) = test_state().await;
        let response = build_router(state)
            .oneshot(Request::get("/google").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            auth::LOGIN_PATH
        );
    }

    #[tokio::test]
    async fn missing_token_creates_nothing() {
        let (state, _temp_dir) = test_state().await;

        let result = auth::google_logged_in(
            &state,
            axum_extra::extract::CookieJar::new(),
            None,
        )
        .await;

        assert!(matches!(result, Err(auth::LoginError::TokenMissing)));
        assert_eq!(state.db.count_users().await.unwrap(), 0);
        assert_eq!(state.db.count_oauth_links().await.unwrap(), 0);
    }
}
