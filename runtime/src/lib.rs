//! # fitlog runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer, executes returned effects
//! - **`EffectHandle`**: lets a caller await the effects spawned for one action
//! - **Feedback loop**: actions produced by effects are sent back through the store
//!
//! ## Example
//!
//! ```ignore
//! use fitlog_runtime::Store;
//!
//! let store = Store::new(TrainingsState::new(week), TrainingsReducer::new(), env);
//!
//! let mut handle = store.send(TrainingsAction::FetchTrainings).await?;
//! handle.wait().await;
//!
//! let count = store.state(|s| s.count()).await;
//! ```

use fitlog_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Waiting on an [`EffectHandle`](crate::EffectHandle) exceeded its deadline
        #[error("Timed out waiting for effects")]
        Timeout,
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Awaiting it returns once every effect
/// spawned for that action has finished and any action it produced has been
/// reduced. Effects spawned by those feedback actions are not tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(TrainingsAction::DeleteTraining { id }).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            // Sender lives as long as any tracked effect does
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete, giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the effects are still running when
    /// the timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared between a handle and the effects it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the effect counter on drop, including on panic
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: decrements the store-wide pending counter on drop
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        AtomicBool, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle, EffectTracking,
        Ordering, PendingGuard, Reducer, RwLock, StoreError,
    };
    use std::sync::Arc;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the reducer runs under the write lock, so
    ///    every reduction is atomic with respect to other reads and writes)
    /// 2. Reducer
    /// 3. Environment
    /// 4. Effect execution, feeding produced actions back through [`Store::send`]
    ///
    /// Cloning a store is cheap and every clone shares the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Actions produced by effects, for observers
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a store whose action broadcast keeps up to `capacity`
        /// unread actions per subscriber
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Releases the lock and spawns the returned effects
        ///
        /// Returns once the reducer has run; effects keep running in the
        /// background. Await the returned handle to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            Ok(handle)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Subscribe to actions produced by effects
        ///
        /// The action passed to [`Store::send`] by a caller is not broadcast;
        /// only the feedback actions are.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// Feedback actions from effects that complete after this call are
        /// rejected, so their results are dropped.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shutdown.store(true, Ordering::Release);
            tracing::info!("Store shutdown initiated");

            let drained = tokio::time::timeout(timeout, async {
                while self.pending_effects.load(Ordering::SeqCst) > 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await;

            match drained {
                Ok(()) => Ok(()),
                Err(_) => {
                    let remaining = self.pending_effects();
                    tracing::warn!(remaining, "Store shutdown timed out");
                    Err(StoreError::ShutdownTimeout(remaining))
                },
            }
        }

        /// Execute an effect, counting it against `tracking` until it finishes
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);

                    let guard = DecrementGuard(tracking.clone());
                    let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect produced an action, sending to store");
                            let _ = store.action_broadcast.send(action.clone());
                            if let Err(error) = store.send(action).await {
                                tracing::warn!(%error, "Dropped action produced by effect");
                            }
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use fitlog_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

    // Running total of kilometres, fed by effects that simulate remote results
    #[derive(Debug, Clone, Default)]
    struct DistanceLog {
        total_km: f64,
        entries: usize,
    }

    #[derive(Debug, Clone)]
    enum LogAction {
        Logged(f64),
        ImportOne(f64),
        ImportMany(Vec<f64>),
        ImportSlowly(f64),
        ImportNothing,
        Crash,
    }

    #[derive(Debug, Clone)]
    struct LogReducer;

    impl Reducer for LogReducer {
        type State = DistanceLog;
        type Action = LogAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                LogAction::Logged(km) => {
                    state.total_km += km;
                    state.entries += 1;
                    smallvec![Effect::None]
                },
                LogAction::ImportOne(km) => {
                    smallvec![Effect::future(async move { Some(LogAction::Logged(km)) })]
                },
                LogAction::ImportMany(distances) => smallvec![Effect::merge(
                    distances
                        .into_iter()
                        .map(|km| Effect::future(async move { Some(LogAction::Logged(km)) }))
                        .collect(),
                )],
                LogAction::ImportSlowly(km) => smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Some(LogAction::Logged(km))
                })],
                LogAction::ImportNothing => smallvec![Effect::future(async { None })],
                LogAction::Crash => smallvec![Effect::future(async {
                    let imported: Option<LogAction> = None;
                    assert!(imported.is_some(), "effect blew up");
                    imported
                })],
            }
        }
    }

    fn store() -> Store<DistanceLog, LogAction, (), LogReducer> {
        Store::new(DistanceLog::default(), LogReducer, ())
    }

    #[tokio::test]
    async fn test_send_applies_state_synchronously() {
        let store = store();
        let _ = store.send(LogAction::Logged(5.5)).await;

        let (total, entries) = store.state(|s| (s.total_km, s.entries)).await;
        assert!((total - 5.5).abs() < f64::EPSILON);
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_effect_feeds_action_back() {
        let store = store();
        let Ok(mut handle) = store.send(LogAction::ImportOne(3.0)).await else {
            unreachable!("store is running");
        };
        handle.wait().await;

        let entries = store.state(|s| s.entries).await;
        assert_eq!(entries, 1);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn test_parallel_effects_all_complete() {
        let store = store();
        let Ok(mut handle) = store.send(LogAction::ImportMany(vec![1.0, 2.0, 3.5])).await else {
            unreachable!("store is running");
        };
        handle.wait().await;

        let (total, entries) = store.state(|s| (s.total_km, s.entries)).await;
        assert!((total - 6.5).abs() < 1e-9);
        assert_eq!(entries, 3);
    }

    #[tokio::test]
    async fn test_effect_producing_nothing_completes() {
        let store = store();
        let Ok(mut handle) = store.send(LogAction::ImportNothing).await else {
            unreachable!("store is running");
        };
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());
        assert_eq!(store.state(|s| s.entries).await, 0);
    }

    #[tokio::test]
    async fn test_state_is_visible_before_slow_effect_finishes() {
        let store = store();
        let _ = store.send(LogAction::Logged(1.0)).await;
        let Ok(mut handle) = store.send(LogAction::ImportSlowly(2.0)).await else {
            unreachable!("store is running");
        };

        assert_eq!(store.state(|s| s.entries).await, 1);
        assert_eq!(store.pending_effects(), 1);

        handle.wait().await;
        assert_eq!(store.state(|s| s.entries).await, 2);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_wait_with_timeout_expires() {
        let store = store();
        let Ok(mut handle) = store.send(LogAction::ImportSlowly(1.0)).await else {
            unreachable!("store is running");
        };

        let result = handle.wait_with_timeout(Duration::from_millis(1)).await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_panicking_effect_still_completes_handle() {
        let store = store();
        let Ok(mut handle) = store.send(LogAction::Crash).await else {
            unreachable!("store is running");
        };
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_feedback_actions_are_broadcast() {
        let store = store();
        let mut rx = store.subscribe_actions();
        let _ = store.send(LogAction::ImportOne(4.2)).await;

        let received = rx.recv().await;
        assert!(matches!(received, Ok(LogAction::Logged(km)) if (km - 4.2).abs() < f64::EPSILON));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = store();
        assert!(store.shutdown(Duration::from_secs(1)).await.is_ok());

        let result = store.send(LogAction::Logged(1.0)).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn test_shutdown_times_out_with_running_effects() {
        let store = store();
        let _ = store.send(LogAction::ImportSlowly(1.0)).await;

        let result = store.shutdown(Duration::from_millis(1)).await;
        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = store();
        let other = store.clone();
        let _ = other.send(LogAction::Logged(2.0)).await;

        assert_eq!(store.state(|s| s.entries).await, 1);
    }

    #[tokio::test]
    async fn test_completed_handle_returns_immediately() {
        let mut handle = EffectHandle::completed();
        assert!(handle.wait_with_timeout(Duration::from_millis(10)).await.is_ok());
    }
}
