//! HTTP client module
//!
//! Provides the HTTP client, request pacing and the whole-batch retry policy.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Batch Retry**: Exponential backoff around whole-batch submission
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;
