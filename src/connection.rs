// Connection acquisition shared by every mounted route

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Source of database connections for mounted routes
///
/// `connect` is called once per request. It must be idempotent: calling it
/// again after a successful connect returns the existing connection instead of
/// opening another one.
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Handle given to route handlers through the request extensions
    type Connection: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Connection>;

    /// Verify that an established connection still answers queries
    async fn ping(&self, _connection: &Self::Connection) -> Result<()> {
        Ok(())
    }
}

/// Object-safe view of a provider, used by the health endpoint
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<()>;
}

#[async_trait]
impl<P: ConnectionProvider> HealthProbe for P {
    async fn probe(&self) -> Result<()> {
        let connection = self.connect().await?;
        self.ping(&connection).await
    }
}

/// Lazily established connection shared by all requests
///
/// Concurrent callers wait on a single connect attempt. A failed attempt leaves
/// the slot empty, so the next caller tries again.
#[derive(Debug)]
pub struct SharedConnection<C> {
    slot: OnceCell<C>,
}

impl<C> Default for SharedConnection<C> {
    fn default() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }
}

impl<C: Clone> SharedConnection<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_connect<F, Fut>(&self, connect: F) -> Result<C>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C>>,
    {
        let connection = self.slot.get_or_try_init(connect).await?;
        Ok(connection.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.slot.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_twice_yields_single_connection() {
        let shared = SharedConnection::new();
        let attempts = AtomicUsize::new(0);

        let first = shared
            .get_or_connect(|| async {
                Ok(attempts.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap();
        let second = shared
            .get_or_connect(|| async {
                Ok(attempts.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(shared.is_connected());
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_one_attempt() {
        let shared = Arc::new(SharedConnection::new());
        let attempts = Arc::new(AtomicUsize::new(0));

        let connect = |shared: Arc<SharedConnection<usize>>, attempts: Arc<AtomicUsize>| async move {
            shared
                .get_or_connect(|| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(attempts.fetch_add(1, Ordering::SeqCst))
                })
                .await
        };

        let (a, b) = tokio::join!(
            tokio::spawn(connect(shared.clone(), attempts.clone())),
            tokio::spawn(connect(shared.clone(), attempts.clone())),
        );

        assert_eq!(a.unwrap().unwrap(), 0);
        assert_eq!(b.unwrap().unwrap(), 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried_by_next_caller() {
        let shared: SharedConnection<&'static str> = SharedConnection::new();

        let result = shared
            .get_or_connect(|| async { Err(anyhow::anyhow!("database unreachable")) })
            .await;
        assert!(result.is_err());
        assert!(!shared.is_connected());

        let connection = shared
            .get_or_connect(|| async { Ok("connected") })
            .await
            .unwrap();
        assert_eq!(connection, "connected");
        assert!(shared.is_connected());
    }

    struct CountingProvider {
        shared: SharedConnection<u32>,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ConnectionProvider for CountingProvider {
        type Connection = u32;

        async fn connect(&self) -> Result<u32> {
            self.shared
                .get_or_connect(|| async {
                    self.attempts.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_probe_connects_through_provider() {
        let provider = CountingProvider {
            shared: SharedConnection::new(),
            attempts: AtomicUsize::new(0),
        };

        provider.probe().await.unwrap();
        provider.probe().await.unwrap();

        assert_eq!(provider.attempts.load(Ordering::SeqCst), 1);
    }
}
