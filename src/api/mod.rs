//! Remote API boundary
//!
//! Unexecuted request envelopes and the batch submission seam.
//!
//! # Overview
//!
//! The api module provides:
//! - `ApiRequest` - method, service-relative path, query and optional JSON body
//! - `ApiService` - which Google API a request targets
//! - `BatchTransport` - submits a bounded batch and returns one outcome per id
//! - `HttpTransport` - concurrent HTTP implementation on top of `HttpClient`

mod transport;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use transport::{HttpTransport, ServiceUrls};
pub use types::{ApiError, ApiRequest, ApiService, BatchResponse};

use crate::error::Result;
use async_trait::async_trait;

/// Submits batches of identified requests.
///
/// Every submitted id yields exactly one `BatchResponse`, in any order.
/// `Err` is reserved for failures of the batch submission as a whole.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Execute all requests and wait until every one has resolved
    async fn submit_batch(&self, requests: Vec<(String, ApiRequest)>)
        -> Result<Vec<BatchResponse>>;
}
