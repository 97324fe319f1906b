use std::time::Duration;

use logwatch::error::{Operation, TransportError, WatchError};
use logwatch::services::transport::connect;

#[tokio::test(start_paused = true)]
async fn slow_connect_reports_deadline_exceeded() {
    let result = connect("ws://slow:8546", Duration::from_secs(60), |_endpoint| async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok::<_, TransportError>(())
    })
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, WatchError::Timeout { operation: Operation::Connect, .. }));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("deadline exceeded"));
}

#[tokio::test]
async fn dial_failure_is_fatal_and_names_the_endpoint() {
    let result = connect("ws://unreachable:8546", Duration::from_secs(1), |_endpoint| async {
        Err::<(), TransportError>("connection refused".into())
    })
    .await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "failed to connect to ws://unreachable:8546: connection refused");
}

#[tokio::test]
async fn dial_receives_the_endpoint() {
    let transport = connect("ws://node:8546", Duration::from_secs(1), |endpoint| async move {
        Ok::<_, TransportError>(endpoint)
    })
    .await
    .unwrap();

    assert_eq!(transport, "ws://node:8546");
}
