use std::sync::Arc;

use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;

use crate::{
    config::HttpRetryConfig,
    http_client::{HttpClientPool, create_retryable_http_client},
};

/// Creates an HTTP client with the retry middleware in place but no retries,
/// so mocked error responses surface immediately.
pub fn create_test_http_client() -> Arc<ClientWithMiddleware> {
    let retry_policy = HttpRetryConfig { max_retries: 0, ..Default::default() };
    Arc::new(create_retryable_http_client(&retry_policy, Client::new()))
}

/// Creates a test HTTP client from the http client pool.
/// Currently used for integration tests
pub async fn get_http_client_from_http_pool() -> Arc<ClientWithMiddleware> {
    let pool = HttpClientPool::default();
    let retry_policy = HttpRetryConfig { max_retries: 0, ..Default::default() };
    pool.get_or_create(&retry_policy).await.unwrap()
}
