//! Optimistic commands
//!
//! A command changes the store before the server answers. It keeps a copy of
//! the items taken when it was issued; if the remote call fails, that copy
//! is fed back as [`TrainingsAction::TrainingsReplaced`], undoing the change.

use crate::api::ApiResult;
use crate::notify::{Notifier, report_remote_failure};
use crate::types::{Training, TrainingId, TrainingsAction, TrainingsState};
use fitlog_core::effect::Effect;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of temporary ids: -1, -2, -3, …
///
/// Shared by every clone of the environment that owns it.
#[derive(Debug, Default)]
pub struct TemporaryIds {
    last: AtomicI64,
}

impl TemporaryIds {
    /// A counter whose first id is -1
    #[must_use]
    pub const fn new() -> Self {
        Self { last: AtomicI64::new(0) }
    }

    /// Allocate the next id
    pub fn allocate(&self) -> TrainingId {
        TrainingId::Number(self.last.fetch_sub(1, Ordering::SeqCst) - 1)
    }
}

/// Remote operation behind an optimistic command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Create
    Create,
    /// Update
    Update,
    /// Delete
    Delete,
}

impl Operation {
    /// Message shown to the user when the remote call fails
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Could not save the training.",
            Self::Update => "Could not update the training.",
            Self::Delete => "Could not delete the training.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Snapshot, forward change and compensation of one command
#[derive(Clone, Debug)]
pub struct OptimisticCommand {
    operation: Operation,
    snapshot: Vec<Training>,
    forward: TrainingsAction,
}

impl OptimisticCommand {
    /// Capture the current items before `forward` is applied
    #[must_use]
    pub fn capture(state: &TrainingsState, operation: Operation, forward: TrainingsAction) -> Self {
        Self { operation, snapshot: state.items.clone(), forward }
    }

    /// Operation kind
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Event applied immediately
    #[must_use]
    pub const fn forward(&self) -> &TrainingsAction {
        &self.forward
    }

    /// Event restoring the captured items
    #[must_use]
    pub fn compensation(&self) -> TrainingsAction {
        TrainingsAction::TrainingsReplaced { items: self.snapshot.clone() }
    }

    /// Effect that awaits the remote call
    ///
    /// On success `on_success` decides the follow-up action. On failure the
    /// error is logged, the user is told, and the compensation is fed back.
    pub fn into_effect<T, F, S>(
        self,
        notifier: Arc<dyn Notifier>,
        remote: F,
        on_success: S,
    ) -> Effect<TrainingsAction>
    where
        T: Send + 'static,
        F: Future<Output = ApiResult<T>> + Send + 'static,
        S: FnOnce(T) -> Option<TrainingsAction> + Send + 'static,
    {
        let Self { operation, snapshot, .. } = self;
        Effect::future(async move {
            match remote.await {
                Ok(value) => {
                    tracing::debug!(%operation, "Server confirmed change");
                    on_success(value)
                },
                Err(error) => {
                    report_remote_failure(notifier.as_ref(), operation.failure_message(), &error);
                    tracing::info!(%operation, restored = snapshot.len(), "Rolling back");
                    Some(TrainingsAction::TrainingsReplaced { items: snapshot })
                },
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::mocks::RecordingNotifier;
    use crate::types::{TrainingFields, WorkoutType};
    use crate::week::IsoWeek;
    use chrono::NaiveDate;
    use fitlog_testing::effects::collect_actions;

    fn state_with_one() -> TrainingsState {
        let mut state = TrainingsState::new(IsoWeek::new(2021, 5).unwrap());
        state.items.push(Training::from_fields(
            TrainingId::from(1),
            TrainingFields {
                date: NaiveDate::from_ymd_opt(2021, 2, 2).unwrap(),
                workout_type: WorkoutType::Running,
                distance_in_km: 5.0,
                comment: String::new(),
            },
        ));
        state
    }

    #[test]
    fn test_temporary_ids_count_down() {
        let ids = TemporaryIds::new();
        let allocated: Vec<_> = (0..3).map(|_| ids.allocate()).collect();
        assert_eq!(allocated, vec![TrainingId::from(-1), TrainingId::from(-2), TrainingId::from(-3)]);
        assert!(allocated.iter().all(TrainingId::is_temporary));
    }

    #[test]
    fn test_shared_counter_and_fresh_counter() {
        let shared = Arc::new(TemporaryIds::new());
        let clone = Arc::clone(&shared);
        assert_eq!(shared.allocate(), TrainingId::from(-1));
        assert_eq!(clone.allocate(), TrainingId::from(-2));
        assert_eq!(TemporaryIds::new().allocate(), TrainingId::from(-1));
    }

    #[test]
    fn test_compensation_restores_snapshot() {
        let state = state_with_one();
        let command = OptimisticCommand::capture(
            &state,
            Operation::Delete,
            TrainingsAction::TrainingDeleted { id: TrainingId::from(1) },
        );
        assert_eq!(command.operation(), Operation::Delete);
        assert_eq!(
            command.forward(),
            &TrainingsAction::TrainingDeleted { id: TrainingId::from(1) }
        );
        assert_eq!(command.compensation(), TrainingsAction::TrainingsReplaced { items: state.items });
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_notifies() {
        let state = state_with_one();
        let notifier = RecordingNotifier::new();
        let command = OptimisticCommand::capture(
            &state,
            Operation::Delete,
            TrainingsAction::TrainingDeleted { id: TrainingId::from(1) },
        );
        let compensation = command.compensation();

        let effect = command.into_effect(
            Arc::new(notifier.clone()),
            async { Err::<(), _>(ApiError::from_status(500, "boom")) },
            |()| None,
        );

        assert_eq!(collect_actions([effect]).await, vec![compensation]);
        assert_eq!(notifier.errors(), vec!["Could not delete the training.".to_string()]);
    }

    #[tokio::test]
    async fn test_success_uses_continuation() {
        let state = state_with_one();
        let notifier = RecordingNotifier::new();
        let command = OptimisticCommand::capture(
            &state,
            Operation::Create,
            TrainingsAction::FetchTrainings,
        );

        let effect = command.into_effect(
            Arc::new(notifier.clone()),
            async { Ok(TrainingId::from(9)) },
            |id| Some(TrainingsAction::TrainingDeleted { id }),
        );

        assert_eq!(
            collect_actions([effect]).await,
            vec![TrainingsAction::TrainingDeleted { id: TrainingId::from(9) }]
        );
        assert!(notifier.notifications().is_empty());
    }
}
