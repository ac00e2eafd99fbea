//! Cancellation scopes for endpoint calls.
//!
//! A [`CancelScope`] is attached to a call with
//! [`with_context`](crate::options::with_context). The endpoint refuses to
//! dispatch through a scope that is already cancelled or expired, and the
//! transport races the in-flight request against [`CancelScope::cancelled`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a scope stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`CancelScope::cancel`] was called on the scope or one of its parents.
    Cancelled,
    /// The scope's deadline passed.
    DeadlineExceeded,
}

/// A clonable cancellation handle with an optional deadline.
///
/// Clones share the same cancellation state. A [`child`](CancelScope::child)
/// is cancelled together with its parent but can be cancelled on its own
/// without affecting the parent.
///
/// # Examples
///
/// ```
/// use esapi::CancelScope;
/// use std::time::Duration;
///
/// let scope = CancelScope::new();
/// let call_scope = scope.child().with_timeout(Duration::from_secs(5));
///
/// assert!(!call_scope.is_cancelled());
/// scope.cancel();
/// assert!(call_scope.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelScope {
    state: Arc<watch::Sender<bool>>,
    parent: Option<Box<CancelScope>>,
    deadline: Option<Instant>,
}

impl CancelScope {
    /// Creates a scope with no deadline.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
            parent: None,
            deadline: None,
        }
    }

    /// Creates a child scope that inherits this scope's deadline and
    /// cancellation.
    pub fn child(&self) -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
            parent: Some(Box::new(self.clone())),
            deadline: self.deadline,
        }
    }

    /// Sets a deadline `timeout` from now. An existing earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline. An existing earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this scope and every child derived from it.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Returns `true` if this scope or any parent was cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow() || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Returns `true` if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns an error if the scope is cancelled or expired.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(CancelReason::Cancelled.into())
        } else if self.is_expired() {
            Err(CancelReason::DeadlineExceeded.into())
        } else {
            Ok(())
        }
    }

    /// Completes once the scope is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                () = self.wait_cancelled() => CancelReason::Cancelled,
                () = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.wait_cancelled().await;
                CancelReason::Cancelled
            }
        }
    }

    fn wait_cancelled(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut rx = self.state.subscribe();
            let own = async move {
                loop {
                    let cancelled = *rx.borrow_and_update();
                    if cancelled {
                        return;
                    }
                    // The sender lives as long as `self`.
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            };
            match &self.parent {
                Some(parent) => tokio::select! {
                    () = own => {}
                    () = parent.wait_cancelled() => {}
                },
                None => own.await,
            }
        })
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let scope = CancelScope::new();
        let clone = scope.clone();
        clone.cancel();
        assert!(scope.is_cancelled());
        assert!(matches!(scope.check(), Err(crate::Error::Cancelled)));
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = CancelScope::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let short = CancelScope::new().with_timeout(Duration::from_secs(1));
        let deadline = short.deadline().unwrap();
        let widened = short.with_timeout(Duration::from_secs(60));
        assert_eq!(widened.deadline(), Some(deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let scope = CancelScope::new().with_timeout(Duration::from_millis(50));
        assert!(scope.check().is_ok());
        assert_eq!(scope.cancelled().await, CancelReason::DeadlineExceeded);
        assert!(matches!(scope.check(), Err(crate::Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_parent_cancel_wakes_child_waiter() {
        let parent = CancelScope::new();
        let child = parent.child();
        let waiter = tokio::spawn(async move { child.cancelled().await });
        tokio::task::yield_now().await;
        parent.cancel();
        assert_eq!(waiter.await.unwrap(), CancelReason::Cancelled);
    }
}
