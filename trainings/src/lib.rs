//! Training log: optimistic CRUD over a REST collection plus weekly charts.
//!
//! The store holds the user's trainings, the table filter and the chart
//! week. It demonstrates:
//!
//! - Optimistic create, update and delete with rollback on failure
//! - Temporary ids reconciled with server ids
//! - Form validation with per-field messages
//! - Weekly distance aggregation per workout type
//! - Testing with `ReducerTest` and mock collaborators
//!
//! # Quick Start
//!
//! ```no_run
//! use fitlog_core::environment::SystemClock;
//! use fitlog_runtime::Store;
//! use fitlog_trainings::{
//!     HttpTrainingsApi, TracingNotifier, TrainingsAction, TrainingsEnvironment, TrainingsReducer,
//!     TrainingsState,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpTrainingsApi::new("http://localhost:3000")?;
//! let env = TrainingsEnvironment::new(Arc::new(api), Arc::new(TracingNotifier), Arc::new(SystemClock));
//! let state = TrainingsState::starting_at(env.clock.as_ref());
//! let store = Store::new(state, TrainingsReducer::new(), env);
//!
//! let mut handle = store.send(TrainingsAction::FetchTrainings).await?;
//! handle.wait().await;
//!
//! let chart = store.state(TrainingsState::week_chart).await;
//! println!("{} km this week", chart.total());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod mocks;
pub mod notify;
pub mod optimistic;
pub mod reducer;
pub mod selectors;
pub mod types;
pub mod validation;
pub mod week;

// Re-export commonly used types
pub use api::{ApiError, HttpTrainingsApi, TrainingsApi};
pub use chart::{WeekChart, build_week_chart};
pub use config::Config;
pub use notify::{Notifier, Severity, TracingNotifier};
pub use reducer::{TrainingsEnvironment, TrainingsReducer};
pub use selectors::{SortColumn, SortOrder, TableSort, filter_trainings, sort_trainings};
pub use types::{
    Training, TrainingFields, TrainingId, TrainingsAction, TrainingsState, WorkoutFilter, WorkoutType,
};
pub use validation::{TrainingForm, ValidationErrors};
pub use week::IsoWeek;
