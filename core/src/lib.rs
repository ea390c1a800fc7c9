//! # fitlog core
//!
//! Core traits and types for the fitlog training tracker.
//!
//! The client keeps all of its state in a single reducer-managed store.
//! This crate holds the pieces every feature builds on:
//!
//! - **State**: plain owned data describing what the user sees
//! - **Action**: every input to a reducer (commands from the UI, results fed back from effects)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of side work (remote calls, notifications), executed by the runtime
//! - **Environment**: injected dependencies behind traits
//!
//! ## Example
//!
//! ```
//! use fitlog_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Default)]
//! struct Laps {
//!     count: u32,
//! }
//!
//! enum LapAction {
//!     Completed,
//! }
//!
//! struct LapReducer;
//!
//! impl Reducer for LapReducer {
//!     type State = Laps;
//!     type Action = LapAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Laps,
//!         action: LapAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<LapAction>; 4]> {
//!         match action {
//!             LapAction::Completed => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut laps = Laps::default();
//! LapReducer.reduce(&mut laps, LapAction::Completed, &());
//! assert_eq!(laps.count, 1);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the trait that owns all state transitions
///
/// Reducers are pure: they mutate the state they are handed and describe
/// any further work as [`Effect`](crate::effect::Effect) values. They never
/// perform I/O themselves.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for client state
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects the runtime
        /// should execute. Most actions produce no effects, so the result
        /// is stored inline for up to four effects.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. The reducer returns them, the runtime executes them
/// and feeds any resulting action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Resolves to `Option<Action>`; `Some` is fed back into the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Futures are opaque, so Debug is written by hand
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Wrap an async block that produces at most one follow-up action
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns `true` for [`Effect::None`] and for empty or all-`None` parallel groups
        #[must_use]
        pub fn is_noop(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) => effects.iter().all(Effect::is_noop),
                Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// Everything a reducer needs from the outside world is reached through a
/// trait object stored in its environment, so tests can swap in fakes.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time for testability
    ///
    /// The trainings store uses it to pick the default chart week.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
