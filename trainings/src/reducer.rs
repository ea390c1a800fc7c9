//! Reducer logic for the training log.
//!
//! Events change state and nothing else. Commands apply their event right
//! away and return the effect that talks to the server; that effect feeds
//! back either the confirmation or the rollback.

use crate::api::TrainingsApi;
use crate::notify::{Notifier, Severity, report_remote_failure};
use crate::optimistic::{Operation, OptimisticCommand, TemporaryIds};
use crate::types::{Training, TrainingFields, TrainingId, TrainingsAction, TrainingsState};
use crate::validation::TrainingForm;
use fitlog_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Message shown when a form submission is rejected
pub const INVALID_FORM_MESSAGE: &str = "Some of the entered values are invalid!";
/// Message shown when a form submission is accepted
pub const SAVED_MESSAGE: &str = "Saved!";
/// Message shown when loading the collection fails
pub const LOAD_FAILED_MESSAGE: &str = "Could not load trainings.";

type Effects = SmallVec<[Effect<TrainingsAction>; 4]>;

/// Environment dependencies for the trainings reducer
#[derive(Clone)]
pub struct TrainingsEnvironment {
    /// Remote collection
    pub api: Arc<dyn TrainingsApi>,
    /// User notifications
    pub notifier: Arc<dyn Notifier>,
    /// Temporary id source, shared by every clone of this environment
    pub temporary_ids: Arc<TemporaryIds>,
    /// Clock for picking the current week
    pub clock: Arc<dyn Clock>,
}

impl TrainingsEnvironment {
    /// Creates a new `TrainingsEnvironment` with a fresh temporary id counter
    #[must_use]
    pub fn new(api: Arc<dyn TrainingsApi>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            notifier,
            temporary_ids: Arc::new(TemporaryIds::new()),
            clock,
        }
    }
}

/// Reducer for the training log
#[derive(Clone, Debug)]
pub struct TrainingsReducer;

impl TrainingsReducer {
    /// Creates a new `TrainingsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies an event to state
    fn apply_event(state: &mut TrainingsState, action: TrainingsAction) {
        match action {
            TrainingsAction::TrainingsReplaced { items } => {
                state.items = items;
            },
            TrainingsAction::TrainingCreated { item } => {
                if state.exists(&item.id) {
                    tracing::warn!(id = %item.id, "Ignoring created training with a taken id");
                    return;
                }
                state.items.push(item);
            },
            TrainingsAction::TrainingUpdated { item } => {
                if let Some(stored) = state.items.iter_mut().find(|stored| stored.id == item.id) {
                    stored.assign_fields(&item);
                }
            },
            TrainingsAction::TrainingDeleted { id } => {
                state.items.retain(|item| item.id != id);
            },
            TrainingsAction::TrainingIdReassigned { old_id, new_id } => {
                Self::reassign_id(state, &old_id, new_id);
            },
            TrainingsAction::WorkoutFilterChanged { filter } => {
                state.workout_type_filter = filter;
            },
            TrainingsAction::ChartWeekChanged { week } => {
                state.chart_week = week;
            },
            TrainingsAction::ChartWeekShifted { weeks } => match state.chart_week.shifted(weeks) {
                Some(week) => state.chart_week = week,
                None => tracing::warn!(weeks, week = %state.chart_week, "Chart week out of range"),
            },
            TrainingsAction::FormValidationFailed { errors } => {
                state.form_errors = Some(errors);
            },
            // Commands are not applied to state
            TrainingsAction::FetchTrainings
            | TrainingsAction::SubmitTrainingForm { .. }
            | TrainingsAction::CreateTraining { .. }
            | TrainingsAction::UpdateTraining { .. }
            | TrainingsAction::DeleteTraining { .. } => {},
        }
    }

    fn reassign_id(state: &mut TrainingsState, old_id: &TrainingId, new_id: TrainingId) {
        if old_id != &new_id && state.exists(&new_id) {
            // The server copy is already present; keep ids unique
            tracing::warn!(%old_id, %new_id, "Server id already present, dropping local copy");
            state.items.retain(|item| &item.id != old_id);
            return;
        }
        match state.items.iter_mut().find(|item| &item.id == old_id) {
            Some(item) => item.id = new_id,
            None => tracing::debug!(%old_id, "Confirmed training no longer in store"),
        }
    }

    fn fetch(env: &TrainingsEnvironment) -> Effects {
        let api = Arc::clone(&env.api);
        let notifier = Arc::clone(&env.notifier);

        smallvec![Effect::future(async move {
            match api.list().await {
                Ok(items) => {
                    tracing::debug!(count = items.len(), "Loaded trainings");
                    Some(TrainingsAction::TrainingsReplaced { items })
                },
                Err(error) => {
                    report_remote_failure(notifier.as_ref(), LOAD_FAILED_MESSAGE, &error);
                    None
                },
            }
        })]
    }

    /// Applies the forward event of `command`
    fn begin(state: &mut TrainingsState, command: &OptimisticCommand) {
        tracing::debug!(operation = %command.operation(), "Applying optimistic change");
        Self::apply_event(state, command.forward().clone());
    }

    fn create(state: &mut TrainingsState, fields: TrainingFields, env: &TrainingsEnvironment) -> Effects {
        let temporary_id = env.temporary_ids.allocate();
        let item = Training::from_fields(temporary_id.clone(), fields.clone());

        let command =
            OptimisticCommand::capture(state, Operation::Create, TrainingsAction::TrainingCreated { item });
        Self::begin(state, &command);
        let remote = env.api.create(&fields);

        smallvec![command.into_effect(Arc::clone(&env.notifier), remote, move |created: Training| {
            Some(TrainingsAction::TrainingIdReassigned { old_id: temporary_id, new_id: created.id })
        })]
    }

    fn update(state: &mut TrainingsState, training: Training, env: &TrainingsEnvironment) -> Effects {
        let command = OptimisticCommand::capture(
            state,
            Operation::Update,
            TrainingsAction::TrainingUpdated { item: training.clone() },
        );
        Self::begin(state, &command);
        let remote = env.api.update(&training);

        smallvec![command.into_effect(Arc::clone(&env.notifier), remote, |()| None)]
    }

    fn delete(state: &mut TrainingsState, id: TrainingId, env: &TrainingsEnvironment) -> Effects {
        let command = OptimisticCommand::capture(
            state,
            Operation::Delete,
            TrainingsAction::TrainingDeleted { id: id.clone() },
        );
        Self::begin(state, &command);
        let remote = env.api.delete(&id);

        smallvec![command.into_effect(Arc::clone(&env.notifier), remote, |()| None)]
    }

    fn submit_form(
        state: &mut TrainingsState,
        form: &TrainingForm,
        editing: Option<TrainingId>,
        env: &TrainingsEnvironment,
    ) -> Effects {
        match form.validate() {
            Err(errors) => {
                tracing::debug!(failed = errors.len(), "Form rejected");
                Self::apply_event(state, TrainingsAction::FormValidationFailed { errors });
                smallvec![notify(env, Severity::Warning, INVALID_FORM_MESSAGE)]
            },
            Ok(fields) => {
                state.form_errors = None;
                let mut effects: Effects = smallvec![notify(env, Severity::Success, SAVED_MESSAGE)];
                effects.extend(match editing {
                    Some(id) => Self::update(state, Training::from_fields(id, fields), env),
                    None => Self::create(state, fields, env),
                });
                effects
            },
        }
    }
}

/// Effect delivering a notification without feeding anything back
fn notify(env: &TrainingsEnvironment, severity: Severity, message: &'static str) -> Effect<TrainingsAction> {
    let notifier = Arc::clone(&env.notifier);
    Effect::future(async move {
        notifier.notify(severity, message);
        None
    })
}

impl Default for TrainingsReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TrainingsReducer {
    type State = TrainingsState;
    type Action = TrainingsAction;
    type Environment = TrainingsEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TrainingsAction::FetchTrainings => Self::fetch(env),
            TrainingsAction::SubmitTrainingForm { form, editing } => {
                Self::submit_form(state, &form, editing, env)
            },
            TrainingsAction::CreateTraining { fields } => Self::create(state, fields, env),
            TrainingsAction::UpdateTraining { training } => Self::update(state, training, env),
            TrainingsAction::DeleteTraining { id } => Self::delete(state, id, env),

            // ========== Events ==========
            event @ (TrainingsAction::TrainingsReplaced { .. }
            | TrainingsAction::TrainingCreated { .. }
            | TrainingsAction::TrainingUpdated { .. }
            | TrainingsAction::TrainingDeleted { .. }
            | TrainingsAction::TrainingIdReassigned { .. }
            | TrainingsAction::WorkoutFilterChanged { .. }
            | TrainingsAction::ChartWeekChanged { .. }
            | TrainingsAction::ChartWeekShifted { .. }
            | TrainingsAction::FormValidationFailed { .. }) => {
                Self::apply_event(state, event);
                SmallVec::new()
            },
        }
    }
}
