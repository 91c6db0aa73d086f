//! Request and response envelope types

use crate::types::Method;
use serde_json::Value;

/// Google API a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiService {
    /// Classroom API v1
    Classroom,
    /// Admin SDK Reports API v1
    Reports,
    /// Admin SDK Directory API v1
    Directory,
}

impl ApiService {
    /// Production base URL
    pub fn default_base_url(self) -> &'static str {
        match self {
            ApiService::Classroom => "https://classroom.googleapis.com/v1",
            ApiService::Reports => "https://admin.googleapis.com/admin/reports/v1",
            ApiService::Directory => "https://admin.googleapis.com/admin/directory/v1",
        }
    }
}

/// An unexecuted API request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Target service
    pub service: ApiService,
    /// HTTP method
    pub method: Method,
    /// Path relative to the service base URL
    pub path: String,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request
    pub fn new(service: ApiService, method: Method, path: impl Into<String>) -> Self {
        Self {
            service,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(service: ApiService, path: impl Into<String>) -> Self {
        Self::new(service, Method::GET, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter when a value is present
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Per-request failure reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Error body or message
    pub message: String,
}

impl ApiError {
    /// Create an API error
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Quota exhausted
    pub fn is_quota_exceeded(&self) -> bool {
        self.status == 429
    }

    /// Internal server error
    pub fn is_internal(&self) -> bool {
        self.status == 500
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

/// One resolved request of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    /// Request id it answers
    pub id: String,
    /// Response body or failure
    pub result: std::result::Result<Value, ApiError>,
}

impl BatchResponse {
    /// Successful response
    pub fn ok(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            result: Ok(body),
        }
    }

    /// Failed response
    pub fn err(id: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: Err(ApiError::new(status, message)),
        }
    }
}
