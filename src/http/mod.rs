//! HTTP client module
//!
//! Provides HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Transient failures retried in place
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff**: Exponential backoff with full jitter
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
