use std::future::Future;
use std::time::Duration;

use crate::error::{Operation, Result, WatchError};

/// Runs `future` under a deadline of `duration`.
///
/// The deadline is dropped as soon as the future resolves, so it never
/// outlives the call it guards. Errors from the future are returned unchanged;
/// an expired deadline becomes [`WatchError::Timeout`]. Retrying is left to
/// the caller.
pub async fn with_timeout<T, F>(operation: Operation, duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(WatchError::Timeout { operation, after: duration }),
    }
}
