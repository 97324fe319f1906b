use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use web3::api::SubscriptionStream;
use web3::transports::WebSocket;
use web3::types::{Filter, Log};
use web3::Web3;

use crate::error::TransportError;
use crate::models::filter::FilterSpec;
use crate::services::transport::{LogSubscription, LogTransport, Unsubscribe};

/// Node connection over a WebSocket, used for both subscriptions and queries.
pub struct Web3Transport {
    web3: Web3<WebSocket>,
}

impl Web3Transport {
    pub async fn connect(endpoint: String) -> Result<Self, TransportError> {
        let transport = WebSocket::new(&endpoint).await?;
        Ok(Self { web3: Web3::new(transport) })
    }
}

#[async_trait]
impl LogTransport for Web3Transport {
    async fn subscribe(&self, filter: &FilterSpec) -> Result<LogSubscription, TransportError> {
        let stream = self.web3.eth_subscribe().subscribe_logs(Filter::from(filter)).await?;
        debug!("Subscription id {:?}", stream.id());
        Ok(spawn_pump(stream))
    }

    async fn query(&self, filter: &FilterSpec) -> Result<Vec<Log>, TransportError> {
        Ok(self.web3.eth().logs(Filter::from(filter)).await?)
    }
}

/// Moves logs from the web3 stream into the subscription channels until the
/// stream fails or the handle is released, then unsubscribes on the node.
fn spawn_pump(mut stream: SubscriptionStream<WebSocket, Log>) -> LogSubscription {
    let (events_tx, events) = mpsc::channel(1);
    let (errors_tx, errors) = oneshot::channel();
    let (release_tx, mut release_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let failure: Option<TransportError> = loop {
            tokio::select! {
                _ = &mut release_rx => break None,
                item = stream.next() => {
                    match item {
                        Some(Ok(log)) => {
                            tokio::select! {
                                _ = &mut release_rx => break None,
                                sent = events_tx.send(log) => {
                                    if sent.is_err() {
                                        break None;
                                    }
                                }
                            }
                        }
                        Some(Err(e)) => break Some(e.into()),
                        None => break Some("subscription stream ended by the remote side".into()),
                    }
                }
            }
        };

        if let Some(failure) = failure {
            let _ = errors_tx.send(failure);
        }

        if let Err(e) = stream.unsubscribe().await {
            debug!("eth_unsubscribe failed: {:?}", e);
        }
    });

    let handle = Box::new(ReleaseHandle(Mutex::new(Some(release_tx))));
    LogSubscription { events, errors, handle }
}

struct ReleaseHandle(Mutex<Option<oneshot::Sender<()>>>);

impl Unsubscribe for ReleaseHandle {
    fn unsubscribe(&self) {
        let sender = match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }
}
