//! Cooperative cancellation
//!
//! A [`CancelHandle`] is kept by whoever issued an operation; the paired
//! [`CancelToken`] is threaded into every protocol call. Built on a
//! `tokio::sync::watch` channel so any number of tokens observe one flag.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{MemtuiError, Result};

/// Owner side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observer side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Signal cancellation to every token cloned from this pair.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Race `fut` against cancellation and a deadline.
pub async fn run_with_deadline<T, F>(cancel: &CancelToken, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(MemtuiError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MemtuiError::Cancelled),
        res = tokio::time::timeout(deadline, fut) => match res {
            Ok(inner) => inner,
            Err(_) => Err(MemtuiError::Timeout(deadline)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });
        handle.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_with_deadline_ok() {
        let token = CancelToken::never();
        let value = run_with_deadline(&token, Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_with_deadline_timeout() {
        let token = CancelToken::never();
        let err = run_with_deadline(&token, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, MemtuiError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_run_with_deadline_cancelled() {
        let (handle, token) = cancel_pair();
        handle.cancel();
        let err = run_with_deadline(&token, Duration::from_secs(5), async { Ok(()) })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_token_does_not_fire() {
        let token = CancelToken::never();
        let res = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(res.is_err());
    }
}
