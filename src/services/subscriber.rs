use tokio::sync::mpsc;
use tracing::{debug, info};
use web3::types::Log;

use crate::error::{Operation, Result, TransportError, WatchError};
use crate::models::filter::FilterSpec;
use crate::services::transport::{LogSubscription, LogTransport, SubscriptionGuard};
use crate::utils::config::Config;
use crate::utils::timeout::with_timeout;

/// Subscribes to the logs of `config.address` and forwards each one to `out`
/// as it arrives.
///
/// Never returns `Ok` while both the subscription and `out` are alive. A failed
/// setup or an error from the subscription is returned as a fatal error; the
/// subscription is released on every exit path. Returns `Ok(())` once the
/// receiving side of `out` is dropped.
pub async fn subscribe_logs<T>(transport: &T, config: &Config, out: mpsc::Sender<Log>) -> Result<()>
where
    T: LogTransport + ?Sized,
{
    let filter = FilterSpec::live(config.address);
    debug!("Subscribing with {}", filter);

    let LogSubscription { mut events, mut errors, handle } =
        with_timeout(Operation::Subscribe, config.timeout, async {
            transport
                .subscribe(&filter)
                .await
                .map_err(|source| WatchError::Subscribe { filter: filter.clone(), source })
        })
        .await?;
    let _guard = SubscriptionGuard::new(handle);

    info!("Subscription successful, waiting for logs");

    loop {
        tokio::select! {
            failure = &mut errors => {
                // Logs handed over before the failure still reach the caller.
                while let Ok(log) = events.try_recv() {
                    if !forward(log, &out).await {
                        return Ok(());
                    }
                }
                return Err(stream_error(failure.ok()));
            }
            log = events.recv() => {
                match log {
                    Some(log) => {
                        if !forward(log, &out).await {
                            return Ok(());
                        }
                    }
                    None => return Err(stream_error(errors.try_recv().ok())),
                }
            }
        }
    }
}

async fn forward(log: Log, out: &mpsc::Sender<Log>) -> bool {
    info!("Msg received: {:?}", log);
    if out.send(log).await.is_err() {
        info!("Log receiver dropped, leaving subscription");
        return false;
    }
    true
}

fn stream_error(failure: Option<TransportError>) -> WatchError {
    match failure {
        Some(source) => WatchError::Stream(source),
        None => WatchError::StreamClosed,
    }
}
