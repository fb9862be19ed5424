//! Lazy, race-safe backend initialization.
//!
//! State machine: Uninitialized → Initializing → Ready | Failed.
//! Callers that arrive while an attempt is in flight await that same attempt
//! through a watch channel instead of starting their own. A failed attempt
//! is not fatal: the next call starts a fresh one.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::backend::BackendError;
use crate::error::StoreError;

enum InitState<T> {
    Uninitialized,
    /// An attempt is in flight; the receiver resolves when it settles.
    Initializing(watch::Receiver<bool>),
    Ready(Arc<T>),
    /// Last attempt failed with this message; the next call retries.
    Failed(String),
}

enum Action {
    Wait(watch::Receiver<bool>),
    Attempt(watch::Sender<bool>),
}

/// Shared handle to a lazily-initialized value.
///
/// Exactly one connector future runs at a time; concurrent callers queue on
/// the in-flight attempt and all observe its outcome.
pub struct InitCell<T> {
    state: Mutex<InitState<T>>,
}

impl<T> InitCell<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    /// Pre-seed a Ready cell with an already-constructed value.
    pub fn ready(value: T) -> Self {
        Self {
            state: Mutex::new(InitState::Ready(Arc::new(value))),
        }
    }

    /// The value, if initialization has completed.
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.state.lock() {
            InitState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Error message from the last failed attempt, if the cell is parked
    /// in the Failed state.
    pub fn last_error(&self) -> Option<String> {
        match &*self.state.lock() {
            InitState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Return the value, initializing it via `connect` if necessary.
    ///
    /// Callers arriving during an in-flight attempt await that attempt and
    /// share its outcome; a caller arriving at a Failed cell starts a fresh
    /// attempt (lazy retry-on-next-use).
    pub async fn get_or_init<F, Fut>(&self, connect: F) -> Result<Arc<T>, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut waited = false;
        loop {
            // Decide under the lock; never await while holding it.
            let action = {
                let mut state = self.state.lock();
                match &*state {
                    InitState::Ready(value) => return Ok(value.clone()),
                    InitState::Failed(message) if waited => {
                        return Err(StoreError::Initialization(message.clone()));
                    }
                    InitState::Initializing(rx) => Action::Wait(rx.clone()),
                    InitState::Uninitialized | InitState::Failed(_) => {
                        let (tx, rx) = watch::channel(false);
                        *state = InitState::Initializing(rx);
                        Action::Attempt(tx)
                    }
                }
            };

            match action {
                Action::Wait(mut rx) => {
                    // Err means the initiating call was dropped mid-attempt;
                    // its guard has reset the state, so just re-check.
                    let _ = rx.changed().await;
                    waited = true;
                }
                Action::Attempt(tx) => return self.run_attempt(connect, tx).await,
            }
        }
    }

    async fn run_attempt<F, Fut>(
        &self,
        connect: F,
        tx: watch::Sender<bool>,
    ) -> Result<Arc<T>, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let guard = AbandonGuard { cell: self };
        let result = connect().await;
        std::mem::forget(guard);

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                *self.state.lock() = InitState::Ready(value.clone());
                let _ = tx.send(true);
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "backend initialization failed");
                *self.state.lock() = InitState::Failed(message.clone());
                let _ = tx.send(true);
                Err(StoreError::Initialization(message))
            }
        }
    }
}

impl<T> Default for InitCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resets Initializing back to Uninitialized if the initiating future is
/// dropped before it settles, so waiters do not hang on a dead attempt.
struct AbandonGuard<'a, T> {
    cell: &'a InitCell<T>,
}

impl<T> Drop for AbandonGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.cell.state.lock();
        if matches!(&*state, InitState::Initializing(_)) {
            *state = InitState::Uninitialized;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn initializes_once() {
        let cell = InitCell::new();
        let value = cell
            .get_or_init(|| async { Ok::<u32, BackendError>(42) })
            .await
            .unwrap();
        assert_eq!(*value, 42);
        assert!(cell.get().is_some());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_attempt() {
        let cell = InitCell::new();
        let calls = AtomicUsize::new(0);
        let connect = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<u32, BackendError>(42)
            }
        };

        let (a, b, c) = tokio::join!(
            cell.get_or_init(connect),
            cell.get_or_init(connect),
            cell.get_or_init(connect),
        );
        assert_eq!(*a.unwrap(), 42);
        assert_eq!(*b.unwrap(), 42);
        assert_eq!(*c.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_attempt_retries_on_next_call() {
        let cell = InitCell::new();
        let succeed = AtomicBool::new(false);
        let connect = || {
            let ok = succeed.load(Ordering::SeqCst);
            async move {
                if ok {
                    Ok(7u32)
                } else {
                    Err(BackendError::Unavailable("offline".into()))
                }
            }
        };

        let err = cell.get_or_init(connect).await.unwrap_err();
        assert!(matches!(err, StoreError::Initialization(_)));
        assert_eq!(cell.last_error().as_deref(), Some("Backend unavailable: offline"));

        succeed.store(true, Ordering::SeqCst);
        let value = cell.get_or_init(connect).await.unwrap();
        assert_eq!(*value, 7);
        assert!(cell.last_error().is_none());
    }

    #[tokio::test]
    async fn ready_cell_never_runs_connector() {
        let cell = InitCell::ready(9u32);
        let calls = AtomicUsize::new(0);
        let value = cell
            .get_or_init(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<u32, BackendError>(0) }
            })
            .await
            .unwrap();
        assert_eq!(*value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
