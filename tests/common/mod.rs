//! Common test utilities for E2E tests
#![allow(dead_code)]

pub mod mock_google;

use google_login::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance backed by a mock Google provider
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub google: mock_google::MockGoogle,
    pub _temp_dir: TempDir,
    /// Client that never follows redirects and keeps no cookies
    pub client: reqwest::Client,
}

/// Response of a completed OAuth callback
pub struct CallbackResult {
    pub status: reqwest::StatusCode,
    pub location: Option<String>,
    /// Value of the session cookie, if one was set
    pub session: Option<String>,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let google = mock_google::MockGoogle::start().await;

        let temp_dir = TempDir::new().unwrap();
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            temp_dir.path().join("test.db").display()
        );

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { url: db_url },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            google: config::GoogleOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                auth_url: google.url("/o/oauth2/auth"),
                token_url: google.url("/token"),
                userinfo_url: google.url("/oauth2/v1/userinfo"),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = google_login::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            google,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET `path`, optionally sending a session cookie
    pub async fn get(&self, path: &str, session: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(session) = session {
            request = request.header("Cookie", format!("session={session}"));
        }
        request.send().await.expect("request succeeds")
    }

    /// Start a login and return `(state, oauth_state cookie value)`
    pub async fn begin_login(&self) -> (String, String) {
        let response = self.get("/login/google", None).await;
        assert!(response.status().is_redirection());

        let location = location(&response).expect("location header");
        let url = url::Url::parse(&location).expect("authorize url");
        let state = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter");

        let cookie = cookie_value(&response, "oauth_state").expect("oauth_state cookie");
        (state, cookie)
    }

    /// Hit the callback with a query string and the state cookie
    pub async fn callback(&self, query: &str, state_cookie: &str) -> CallbackResult {
        let response = self
            .client
            .get(self.url(&format!("/login/google/authorized?{query}")))
            .header("Cookie", format!("oauth_state={state_cookie}"))
            .send()
            .await
            .expect("request succeeds");

        CallbackResult {
            status: response.status(),
            location: location(&response),
            session: cookie_value(&response, "session"),
        }
    }

    /// Run the full login flow for a mock authorization code
    pub async fn login(&self, code: &str) -> CallbackResult {
        let (state, cookie) = self.begin_login().await;
        self.callback(&format!("code={code}&state={state}"), &cookie)
            .await
    }
}

pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Non-empty value of cookie `name` from the response's Set-Cookie headers
pub fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix(&prefix))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        .find(|value| !value.is_empty())
}

/// Whether the response removes cookie `name`
pub fn removes_cookie(response: &reqwest::Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix(&prefix))
        .any(|rest| rest.starts_with(';') || rest.is_empty())
}
