use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::info;
use web3::types::Log;

use crate::error::{Operation, Result, TransportError, WatchError};
use crate::models::filter::FilterSpec;
use crate::utils::timeout::with_timeout;

/// Releases a live subscription. Calling it more than once is a no-op.
pub trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self);
}

/// A live log subscription: matching logs arrive on `events`, and `errors`
/// fires once if the node or the connection ends the subscription.
pub struct LogSubscription {
    pub events: mpsc::Receiver<Log>,
    pub errors: oneshot::Receiver<TransportError>,
    pub handle: Box<dyn Unsubscribe>,
}

/// Connection to a node able to stream and query logs.
#[async_trait]
pub trait LogTransport: Send + Sync {
    async fn subscribe(&self, filter: &FilterSpec) -> Result<LogSubscription, TransportError>;

    async fn query(&self, filter: &FilterSpec) -> Result<Vec<Log>, TransportError>;
}

/// Owns a subscription handle and releases it when dropped.
pub struct SubscriptionGuard {
    handle: Box<dyn Unsubscribe>,
}

impl SubscriptionGuard {
    pub fn new(handle: Box<dyn Unsubscribe>) -> Self {
        Self { handle }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

/// Dials `endpoint` with `dial`, bounded by `timeout`.
pub async fn connect<T, F, Fut>(endpoint: &str, timeout: Duration, dial: F) -> Result<T>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let endpoint = endpoint.to_string();
    let transport = with_timeout(Operation::Connect, timeout, async move {
        dial(endpoint.clone()).await.map_err(|source| WatchError::Connect { endpoint, source })
    })
    .await?;

    info!("Connected");
    Ok(transport)
}
