//! A reusable pool of HTTP clients keyed by retry policy.
//!
//! The metrics backend, the snapshot renderer and the Telegram API each carry
//! their own retry policy. Services with equal policies share one client and
//! therefore one connection pool.

use std::{collections::HashMap, sync::Arc};

use reqwest::Client as ReqwestClient;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tokio::sync::RwLock;

use super::client::create_retryable_http_client;
use crate::config::{BaseHttpClientConfig, HttpRetryConfig};

/// Errors that can occur within the `HttpClientPool`.
#[derive(Debug, Error)]
pub enum HttpClientPoolError {
    /// An error occurred while building the underlying `reqwest::Client`.
    #[error("Failed to create HTTP client: {0}")]
    HttpClientBuildError(String),
}

/// A pool for managing and reusing HTTP clients.
pub struct HttpClientPool {
    base_config: BaseHttpClientConfig,
    clients: RwLock<HashMap<String, Arc<ClientWithMiddleware>>>,
}

impl HttpClientPool {
    /// Creates a new, empty pool whose clients use `base_config`.
    pub fn new(base_config: BaseHttpClientConfig) -> Self {
        Self { base_config, clients: RwLock::new(HashMap::new()) }
    }

    /// Gets the client for `retry_policy`, creating it on first use.
    pub async fn get_or_create(
        &self,
        retry_policy: &HttpRetryConfig,
    ) -> Result<Arc<ClientWithMiddleware>, HttpClientPoolError> {
        let key = format!("{retry_policy:?}");

        if let Some(client) = self.clients.read().await.get(&key) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        // Another task may have created it while we waited for the write lock.
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let new_client = Arc::new(create_retryable_http_client(retry_policy, self.plain_client()?));
        clients.insert(key, new_client.clone());
        tracing::debug!(retry_policy = ?retry_policy, "Created pooled HTTP client.");

        Ok(new_client)
    }

    /// Builds a client without retry middleware, for requests whose body
    /// cannot be replayed (multipart uploads).
    pub fn plain_client(&self) -> Result<ReqwestClient, HttpClientPoolError> {
        ReqwestClient::builder()
            .pool_max_idle_per_host(self.base_config.max_idle_per_host)
            .pool_idle_timeout(Some(self.base_config.idle_timeout))
            .connect_timeout(self.base_config.connect_timeout)
            .timeout(self.base_config.request_timeout)
            .build()
            .map_err(|e| HttpClientPoolError::HttpClientBuildError(e.to_string()))
    }

    /// Returns the number of active HTTP clients in the pool.
    #[cfg(test)]
    pub async fn get_active_client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for HttpClientPool {
    fn default() -> Self {
        Self::new(BaseHttpClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_init_empty() {
        let pool = HttpClientPool::default();
        assert_eq!(pool.get_active_client_count().await, 0, "Pool should be empty initially");
    }

    #[tokio::test]
    async fn test_pool_returns_same_client() {
        let pool = HttpClientPool::default();
        let retry_config = HttpRetryConfig::default();
        let client1 = pool.get_or_create(&retry_config).await.unwrap();
        let client2 = pool.get_or_create(&retry_config).await.unwrap();

        assert!(Arc::ptr_eq(&client1, &client2), "Should return the same client instance");
        assert_eq!(pool.get_active_client_count().await, 1);
    }

    #[tokio::test]
    async fn test_pool_concurrent_access() {
        let pool = Arc::new(HttpClientPool::default());
        let mut tasks = tokio::task::JoinSet::new();

        for _ in 0..10 {
            let pool = Arc::clone(&pool);
            tasks.spawn(async move { pool.get_or_create(&HttpRetryConfig::default()).await });
        }

        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok(), "Should successfully create or get HTTP client");
        }
        assert_eq!(pool.get_active_client_count().await, 1);
    }

    #[tokio::test]
    async fn test_pool_returns_different_clients_for_different_policies() {
        let pool = HttpClientPool::default();
        let default_policy = HttpRetryConfig::default();
        let eager_policy = HttpRetryConfig { max_retries: 5, ..Default::default() };

        let client1 = pool.get_or_create(&default_policy).await.unwrap();
        let client2 = pool.get_or_create(&eager_policy).await.unwrap();

        assert!(!Arc::ptr_eq(&client1, &client2));
        assert_eq!(pool.get_active_client_count().await, 2);

        let client1_again = pool.get_or_create(&default_policy).await.unwrap();
        assert!(Arc::ptr_eq(&client1, &client1_again));
        assert_eq!(pool.get_active_client_count().await, 2);
    }

    #[test]
    fn test_plain_client_builds() {
        assert!(HttpClientPool::default().plain_client().is_ok());
    }
}
