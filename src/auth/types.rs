//! Auth configuration types

use crate::error::{Error, Result};
use crate::types::JwtAlgorithm;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Google token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes needed by every entity the crate pulls or syncs
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/admin.directory.orgunit",
    "https://www.googleapis.com/auth/admin.reports.usage.readonly",
    "https://www.googleapis.com/auth/admin.reports.audit.readonly",
    "https://www.googleapis.com/auth/classroom.announcements.readonly",
    "https://www.googleapis.com/auth/classroom.courses",
    "https://www.googleapis.com/auth/classroom.coursework.students",
    "https://www.googleapis.com/auth/classroom.guardianlinks.students",
    "https://www.googleapis.com/auth/classroom.profile.emails",
    "https://www.googleapis.com/auth/classroom.rosters",
    "https://www.googleapis.com/auth/classroom.student-submissions.students.readonly",
    "https://www.googleapis.com/auth/classroom.topics",
];

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Static access token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Refresh Token flow (installed-app credentials)
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
    },

    /// Service account JWT exchanged for an access token
    ServiceAccount {
        /// Service account email (iss claim)
        client_email: String,
        /// Private key for signing (PEM format)
        private_key: String,
        /// Token endpoint, also the aud claim
        token_url: String,
        /// Requested scopes
        scopes: Vec<String>,
        /// Delegated user (sub claim) for domain-wide delegation
        subject: Option<String>,
        /// Signing algorithm
        algorithm: JwtAlgorithm,
        /// Assertion lifetime in seconds
        token_lifetime_seconds: u64,
    },
}

impl AuthConfig {
    /// Service account auth from a downloaded key file
    pub fn from_service_account_file(
        path: impl AsRef<Path>,
        scopes: Vec<String>,
        subject: Option<String>,
    ) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        Ok(key.into_auth(scopes, subject))
    }
}

/// The fields of a Google service account key file that signing needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email
    pub client_email: String,
    /// PEM private key
    pub private_key: String,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl ServiceAccountKey {
    /// Read a key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse key file contents
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::auth(format!("Invalid key file: {e}")))
    }

    /// Build the auth config for this key
    pub fn into_auth(self, scopes: Vec<String>, subject: Option<String>) -> AuthConfig {
        let scopes = if scopes.is_empty() {
            DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
        } else {
            scopes
        };
        AuthConfig::ServiceAccount {
            client_email: self.client_email,
            private_key: self.private_key,
            token_url: self.token_uri,
            scopes,
            subject,
            algorithm: JwtAlgorithm::RS256,
            token_lifetime_seconds: 3600,
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
