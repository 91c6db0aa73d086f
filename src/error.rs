//! Error types for classroom-sync
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for classroom-sync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("JWT generation failed: {message}")]
    JwtGeneration { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Batch submission failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    // ============================================================================
    // Batch Protocol Errors
    // ============================================================================
    #[error("Malformed request id '{id}': {message}")]
    RequestId { id: String, message: String },

    #[error("Malformed response for {entity}: {message}")]
    MalformedResponse { entity: String, message: String },

    // ============================================================================
    // Normalization Errors
    // ============================================================================
    #[error("Normalization failed for {entity}: {message}")]
    Normalize { entity: String, message: String },

    #[error("Cannot coerce '{value}' in column '{column}' to a timestamp")]
    DateCoercion { column: String, value: String },

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Warehouse error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Warehouse error on table '{table}': {message}")]
    Sink { table: String, message: String },

    // ============================================================================
    // Sync Errors
    // ============================================================================
    #[error("Sync input error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sync failed for {entity}: {message}")]
    Sync { entity: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a request id decode error
    pub fn request_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a normalization error
    pub fn normalize(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Normalize {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a date coercion error
    pub fn date_coercion(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DateCoercion {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Create a warehouse error scoped to a table
    pub fn sink(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a sync error
    pub fn sync(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sync {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Check if this error is retryable at the batch level
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for classroom-sync
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
