use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::oneshot;

use crate::error::ClientError;

/// Handle to one background operation.
///
/// Dropping the handle does not abort the operation; it keeps running and
/// its events keep flowing to the sink. Cancellation is cooperative:
/// [`cancel`](OperationHandle::cancel) raises a flag the operation checks
/// at its next safe point, and cancelled operations discard their partial
/// output.
pub struct OperationHandle<T> {
    receiver: oneshot::Receiver<Result<T, ClientError>>,
    cancel: Arc<AtomicBool>,
}

impl<T> OperationHandle<T> {
    pub(crate) fn new(
        receiver: oneshot::Receiver<Result<T, ClientError>>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self { receiver, cancel }
    }

    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Waits for the operation to finish.
    pub async fn wait(self) -> Result<T, ClientError> {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Background(
                "operation task was dropped".to_string(),
            )),
        }
    }

    /// Waits up to `timeout` for the operation to finish.
    ///
    /// On timeout the operation is asked to cancel and keeps running only
    /// until its next cancellation check; the result is discarded.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<T, ClientError> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::Background(
                "operation task was dropped".to_string(),
            )),
            Err(_) => {
                self.cancel.store(true, Ordering::SeqCst);
                Err(ClientError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_op<T, F>(
        fut: F,
    ) -> (OperationHandle<T>, Arc<AtomicBool>)
    where
        T: Send + 'static,
        F: std::future::Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
        (OperationHandle::new(rx, cancel.clone()), cancel)
    }

    #[tokio::test]
    async fn test_wait_returns_result() {
        let (handle, _) = spawn_op(async { Ok(42u32) });
        assert_eq!(handle.wait().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_wait_timeout_cancels_slow_operation() {
        let (handle, cancel) = spawn_op(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1u32)
        });

        let err = handle.wait_timeout(Duration::from_millis(10)).await;
        assert!(matches!(err, Err(ClientError::Timeout(_))));
        assert!(cancel.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropped_task_reports_background_failure() {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel::<Result<u32, ClientError>>();
        drop(tx);

        let handle = OperationHandle::new(rx, cancel);
        assert!(matches!(
            handle.wait().await,
            Err(ClientError::Background(_))
        ));
    }
}
