//! Shared connection pool management
//!
//! The pool is created lazily on first demand and memoized for the lifetime of
//! the manager. Creation goes through a once-guard, so concurrent first callers
//! wait on a single connection attempt instead of racing to build two pools.
//! A failed attempt is not cached; the next caller retries.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::debug_log;
use crate::errors::DataAccessError;
use config::DatabaseConfig;

/// Something that can open a connection pool
#[async_trait]
pub trait PoolConnector: Send + Sync {
    type Pool: Send + Sync;

    async fn connect(&self) -> Result<Self::Pool, DataAccessError>;
}

#[async_trait]
impl PoolConnector for DatabaseConfig {
    type Pool = PgPool;

    async fn connect(&self) -> Result<PgPool, DataAccessError> {
        let mut pool_options = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds));

        // Set max lifetime if specified
        pool_options = if self.max_lifetime_seconds > 0 {
            pool_options.max_lifetime(Duration::from_secs(self.max_lifetime_seconds))
        } else {
            pool_options.max_lifetime(None)
        };

        tracing::info!(
            host = %self.host,
            port = self.port,
            database = %self.database,
            max_connections = self.max_connections,
            "Connecting database pool"
        );

        Ok(pool_options.connect(&self.connection_string()).await?)
    }
}

/// Lazily created, process-lifetime connection pool
pub struct PoolManager<C: PoolConnector = DatabaseConfig> {
    connector: C,
    pool: OnceCell<C::Pool>,
}

impl<C: PoolConnector> std::fmt::Debug for PoolManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl<C: PoolConnector> PoolManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            pool: OnceCell::new(),
        }
    }

    /// Return the shared pool, creating it on first call
    pub async fn get_pool(&self) -> Result<&C::Pool, DataAccessError> {
        self.pool
            .get_or_try_init(|| async {
                debug_log!("Creating shared connection pool");
                self.connector.connect().await
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Hands out numbered "pools" and can fail on chosen attempts
    struct CountingConnector {
        attempts: AtomicUsize,
        fail_first: usize,
    }

    impl CountingConnector {
        fn new(fail_first: usize) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl PoolConnector for CountingConnector {
        type Pool = Arc<usize>;

        async fn connect(&self) -> Result<Arc<usize>, DataAccessError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            // Widen the window in which a second caller could race
            tokio::time::sleep(Duration::from_millis(20)).await;
            if attempt <= self.fail_first {
                return Err(DataAccessError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(Arc::new(attempt))
        }
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_pool() {
        let manager = Arc::new(PoolManager::new(CountingConnector::new(0)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { Arc::clone(manager.get_pool().await.unwrap()) })
            })
            .collect();

        let mut pools = Vec::new();
        for handle in handles {
            pools.push(handle.await.unwrap());
        }

        assert_eq!(manager.connector().attempts.load(Ordering::SeqCst), 1);
        for pool in &pools {
            assert!(Arc::ptr_eq(pool, &pools[0]));
        }
    }

    #[tokio::test]
    async fn subsequent_calls_reuse_without_reconnecting() {
        let manager = PoolManager::new(CountingConnector::new(0));
        assert!(!manager.is_initialized());

        let first = Arc::clone(manager.get_pool().await.unwrap());
        let second = Arc::clone(manager.get_pool().await.unwrap());

        assert!(manager.is_initialized());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.connector().attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_creation_is_not_cached() {
        let manager = PoolManager::new(CountingConnector::new(1));

        let err = manager.get_pool().await.unwrap_err();
        assert!(matches!(err, DataAccessError::Database(sqlx::Error::PoolTimedOut)));
        assert!(!manager.is_initialized());

        let pool = manager.get_pool().await.unwrap();
        assert_eq!(**pool, 2);
        assert_eq!(manager.connector().attempts.load(Ordering::SeqCst), 2);
    }
}
