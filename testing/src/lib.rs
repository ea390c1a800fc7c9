//! # fitlog testing
//!
//! Testing utilities for fitlog reducers.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`assertions`]: checks over returned effects
//! - [`effects`]: runs effect descriptions without a store and collects the actions they produce
//! - [`FixedClock`]: deterministic time
//!
//! ## Example
//!
//! ```ignore
//! use fitlog_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(TrainingsReducer::new())
//!     .with_env(env)
//!     .given_state(TrainingsState::new(week))
//!     .when_action(TrainingsAction::WorkoutFilterChanged { filter: WorkoutFilter::All })
//!     .then_state(|state| assert_eq!(state.workout_type_filter, WorkoutFilter::All))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use fitlog_core::environment::Clock;

pub mod effects;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use fitlog_testing::mocks::FixedClock;
    /// use fitlog_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Clock pinned to noon UTC on the given calendar day
        ///
        /// Returns `None` for an invalid date.
        #[must_use]
        pub fn on_date(year: i32, month: u32, day: u32) -> Option<Self> {
            let time = NaiveDate::from_ymd_opt(year, month, day)?
                .and_hms_opt(12, 0, 0)?
                .and_utc();
            Some(Self::new(time))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests: Wednesday 2021-02-03 12:00 UTC (ISO week 2021-W05)
    ///
    /// # Panics
    ///
    /// Never in practice; the date is hardcoded and valid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::on_date(2021, 2, 3).expect("hardcoded date should always be valid")
    }
}

pub use mocks::{FixedClock, test_clock};
