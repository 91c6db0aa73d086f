//! HTTP batch transport
//!
//! Executes each request of a batch as an individual HTTP call, with a
//! bounded number in flight, and folds every reply into a `BatchResponse`.

use super::types::{ApiRequest, ApiService, BatchResponse};
use super::BatchTransport;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::debug;

/// Base URLs for each service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    /// Classroom API base
    pub classroom: String,
    /// Reports API base
    pub reports: String,
    /// Directory API base
    pub directory: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            classroom: ApiService::Classroom.default_base_url().to_string(),
            reports: ApiService::Reports.default_base_url().to_string(),
            directory: ApiService::Directory.default_base_url().to_string(),
        }
    }
}

impl ServiceUrls {
    /// Route every service to one host (used against a mock server)
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        Self {
            classroom: format!("{base}/classroom"),
            reports: format!("{base}/reports"),
            directory: format!("{base}/directory"),
        }
    }

    /// Base URL for a service
    pub fn base(&self, service: ApiService) -> &str {
        match service {
            ApiService::Classroom => &self.classroom,
            ApiService::Reports => &self.reports,
            ApiService::Directory => &self.directory,
        }
    }

    /// Absolute URL of a request
    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!(
            "{}/{}",
            self.base(request.service).trim_end_matches('/'),
            request.path.trim_start_matches('/')
        )
    }
}

/// Batch transport on top of `HttpClient`
#[derive(Debug)]
pub struct HttpTransport {
    client: HttpClient,
    urls: ServiceUrls,
    concurrency: usize,
}

impl HttpTransport {
    /// Default number of requests in flight per batch
    pub const DEFAULT_CONCURRENCY: usize = 16;

    /// Create a transport against the production endpoints
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            urls: ServiceUrls::default(),
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    /// Override service URLs
    #[must_use]
    pub fn with_urls(mut self, urls: ServiceUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Set the number of requests in flight
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Service URLs in use
    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    async fn execute(&self, id: String, request: ApiRequest) -> Result<BatchResponse> {
        let url = self.urls.url_for(&request);
        let mut config = RequestConfig::new();
        config.query.clone_from(&request.query);
        config.body = request.body;

        let response = self
            .client
            .request(request.method.into(), &url, &config)
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let body = if text.trim().is_empty() {
                Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&text).map_err(|e| Error::MalformedResponse {
                    entity: id.clone(),
                    message: e.to_string(),
                })?
            };
            Ok(BatchResponse::ok(id, body))
        } else {
            debug!("Request {} failed with {}", id, status.as_u16());
            Ok(BatchResponse::err(id, status.as_u16(), text))
        }
    }
}

#[async_trait]
impl BatchTransport for HttpTransport {
    async fn submit_batch(
        &self,
        requests: Vec<(String, ApiRequest)>,
    ) -> Result<Vec<BatchResponse>> {
        let results: Vec<Result<BatchResponse>> = stream::iter(requests)
            .map(|(id, request)| self.execute(id, request))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }
}
