//! Google OAuth2 client
//!
//! The authorization-code exchange is delegated to the `oauth2` crate; this
//! module only wires it to the configured endpoints and fetches the
//! userinfo profile with the issued token.

use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RequestTokenError, Scope, TokenUrl,
};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleOAuthConfig;

/// Provider name stored on every link created by this client
pub const PROVIDER: &str = "google";

const SCOPES: [&str; 2] = ["profile", "email"];

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Userinfo request returned status {0}")]
    Status(u16),
}

/// Profile returned by the v1 userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account id
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

pub struct GoogleProvider {
    client: GoogleClient,
    http_client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleProvider {
    /// Build a client for the configured endpoints.
    ///
    /// `http_client` must not follow redirects; the token endpoint is only
    /// ever called directly.
    pub fn new(
        config: &GoogleOAuthConfig,
        redirect_uri: String,
        http_client: reqwest::Client,
    ) -> Result<Self, ProviderError> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone())?)
            .set_token_uri(TokenUrl::new(config.token_url.clone())?)
            .set_redirect_uri(RedirectUrl::new(redirect_uri)?);

        Ok(Self {
            client,
            http_client,
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    /// Authorization URL to send the browser to, with its CSRF state
    pub fn authorize_url(&self) -> (oauth2::url::Url, CsrfToken) {
        self.client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            .url()
    }

    /// Exchange an authorization code for a token
    pub async fn exchange_code(&self, code: String) -> Result<BasicTokenResponse, ProviderError> {
        self.client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| {
                let message = match &e {
                    RequestTokenError::ServerResponse(response) => {
                        format!("server responded with {}", response.error())
                    }
                    RequestTokenError::Parse(_, body) => {
                        format!("unparseable token response ({} bytes)", body.len())
                    }
                    RequestTokenError::Request(error) => format!("request failed: {error}"),
                    RequestTokenError::Other(message) => message.clone(),
                };
                ProviderError::TokenExchange(message)
            })
    }

    /// Fetch the userinfo profile for `access_token`
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, ProviderError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        Ok(response.json::<GoogleProfile>().await?)
    }
}
