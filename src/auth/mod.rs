//! Google OAuth authentication
//!
//! Handles:
//! - Google OAuth flow
//! - Linking provider identities to local users
//! - Session management
//! - Session guard extractors

pub mod callback;
pub mod google;
mod middleware;
mod oauth;
pub mod session;

pub use callback::{LoginError, LoginOutcome, google_logged_in, resolve_user};
pub use google::{GoogleProfile, GoogleProvider, ProviderError};
pub use middleware::{CurrentUser, LOGIN_PATH, MaybeUser};
pub use oauth::auth_router;
pub use session::{Session, create_session_token, verify_session_token};
