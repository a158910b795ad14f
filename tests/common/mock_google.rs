//! In-process stand-in for Google's token and userinfo endpoints
//!
//! Authorization codes select the behaviour:
//! - `alice`, `bob`: issue a token whose userinfo returns that profile
//! - `broken`: issue a token whose userinfo request fails with 500
//! - `bad-code`: the token endpoint answers `invalid_grant`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

const TOKEN_PREFIX: &str = "token-for-";

#[derive(Default)]
struct Counters {
    token_requests: AtomicUsize,
    userinfo_requests: AtomicUsize,
}

pub struct MockGoogle {
    addr: String,
    counters: Arc<Counters>,
}

impl MockGoogle {
    pub async fn start() -> Self {
        let counters = Arc::new(Counters::default());

        let app = Router::new()
            .route("/token", post(token))
            .route("/oauth2/v1/userinfo", get(userinfo))
            .with_state(counters.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, counters }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub fn token_requests(&self) -> usize {
        self.counters.token_requests.load(Ordering::SeqCst)
    }

    pub fn userinfo_requests(&self) -> usize {
        self.counters.userinfo_requests.load(Ordering::SeqCst)
    }
}

/// Google account id and email for a mock code
pub fn profile_for(code: &str) -> Option<(&'static str, &'static str)> {
    match code {
        "alice" => Some(("109876543210", "alice@example.com")),
        "bob" => Some(("200000000001", "bob@example.com")),
        _ => None,
    }
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
}

async fn token(State(counters): State<Arc<Counters>>, Form(form): Form<TokenForm>) -> Response {
    counters.token_requests.fetch_add(1, Ordering::SeqCst);

    if form.grant_type != "authorization_code" || form.code == "bad-code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": format!("{TOKEN_PREFIX}{}", form.code),
        "token_type": "bearer",
        "expires_in": 3599,
        "scope": "profile email",
    }))
    .into_response()
}

async fn userinfo(State(counters): State<Arc<Counters>>, headers: HeaderMap) -> Response {
    counters.userinfo_requests.fetch_add(1, Ordering::SeqCst);

    let code = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| token.strip_prefix(TOKEN_PREFIX));

    match code {
        Some("broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some(code) => match profile_for(code) {
            Some((id, email)) => Json(json!({
                "id": id,
                "email": email,
                "verified_email": true,
                "name": code,
            }))
            .into_response(),
            None => StatusCode::UNAUTHORIZED.into_response(),
        },
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}
