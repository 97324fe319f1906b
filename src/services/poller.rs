use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Operation, Result, WatchError};
use crate::models::filter::{BlockWindow, FilterSpec};
use crate::models::LogBatch;
use crate::services::transport::LogTransport;
use crate::utils::config::Config;
use crate::utils::timeout::with_timeout;

/// Pause between two attempts at the same window.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Queries the logs of `config.address` window by window, starting at
/// `config.start_block`, and sends one batch per window to `out`.
///
/// A failed query is logged and the same window is tried again; the offset
/// only moves, by exactly one page, after a successful query. Returns
/// `Ok(())` once the receiving side of `out` is dropped.
pub async fn poll_logs<T>(transport: &T, config: &Config, out: mpsc::Sender<LogBatch>) -> Result<()>
where
    T: LogTransport + ?Sized,
{
    if config.page_size == 0 {
        return Err(WatchError::InvalidPageSize(0));
    }

    let mut window = BlockWindow::new(config.start_block, config.page_size);

    loop {
        let filter = FilterSpec::window(config.address, window);
        info!("Query: {}", filter);

        let result = with_timeout(Operation::Query(window), config.timeout, async {
            transport.query(&filter).await.map_err(|source| WatchError::Query { window, source })
        })
        .await;

        let logs = match result {
            Ok(logs) => logs,
            Err(e) if !e.is_fatal() => {
                warn!(offset = window.offset, "ERROR: {}", e);
                if !config.retry_delay.is_zero() {
                    tokio::time::sleep(config.retry_delay).await;
                }
                continue;
            }
            Err(e) => return Err(e),
        };

        info!("Logs received ({}) in {}", logs.len(), window);
        debug!("Logs: {:?}", logs);

        if out.send(LogBatch { window, logs }).await.is_err() {
            info!("Batch receiver dropped, stopping at offset {}", window.offset);
            return Ok(());
        }

        window = window.advance();
    }
}
