//! Authentication module
//!
//! Supports: Bearer token, OAuth2 refresh token, service account JWT
//!
//! The `Authenticator` applies credentials to outgoing requests and caches
//! access tokens for the auth types that require refresh.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, ServiceAccountKey, DEFAULT_SCOPES, GOOGLE_TOKEN_URL};
