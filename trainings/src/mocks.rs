//! Mock collaborators for testing.
//!
//! Public so integration tests and downstream crates can drive the store
//! without a server.

use crate::api::{ApiError, ApiFuture, ApiResult, TrainingsApi};
use crate::notify::{Notifier, Severity};
use crate::types::{Training, TrainingFields, TrainingId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// A call received by [`MockTrainingsApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// `list`
    List,
    /// `get`
    Get(TrainingId),
    /// `create`
    Create(TrainingFields),
    /// `update`
    Update(Training),
    /// `delete`
    Delete(TrainingId),
}

#[derive(Debug)]
struct MockServerState {
    items: Vec<Training>,
    next_id: i64,
    fail_next: Option<ApiError>,
    fail_all: Option<ApiError>,
    calls: Vec<ApiCall>,
}

/// In-memory trainings server
///
/// Assigns ids 1, 2, 3, … to created trainings. Failures can be injected for
/// the next call or for every call, and a gated mock holds each response
/// until [`MockTrainingsApi::release`] lets it through.
#[derive(Debug, Clone)]
pub struct MockTrainingsApi {
    state: Arc<Mutex<MockServerState>>,
    gate: Option<Arc<Semaphore>>,
}

impl Default for MockTrainingsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTrainingsApi {
    /// Empty server answering immediately
    #[must_use]
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Server holding `items`
    #[must_use]
    pub fn with_items(items: Vec<Training>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockServerState {
                items,
                next_id: 1,
                fail_next: None,
                fail_all: None,
                calls: Vec::new(),
            })),
            gate: None,
        }
    }

    /// Hold every response until released
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `responses` held responses complete
    pub fn release(&self, responses: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(responses);
        }
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: ApiError) {
        self.lock().fail_next = Some(error);
    }

    /// Fail every call with `error` until [`MockTrainingsApi::recover`]
    pub fn fail_all(&self, error: ApiError) {
        self.lock().fail_all = Some(error);
    }

    /// Stop failing
    pub fn recover(&self) {
        let mut state = self.lock();
        state.fail_next = None;
        state.fail_all = None;
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Trainings the server currently holds
    #[must_use]
    pub fn items(&self) -> Vec<Training> {
        self.lock().items.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` now, answer with `respond` once the gate opens
    fn respond<T, F>(&self, call: ApiCall, respond: F) -> ApiFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut MockServerState) -> ApiResult<T> + Send + 'static,
    {
        self.lock().calls.push(call);
        let state = Arc::clone(&self.state);
        let gate = self.gate.clone();

        Box::pin(async move {
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire_owned().await {
                    permit.forget();
                }
            }

            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = state.fail_next.take().or_else(|| state.fail_all.clone()) {
                return Err(error);
            }
            respond(&mut state)
        })
    }
}

fn not_found(id: &TrainingId) -> ApiError {
    ApiError::Client { status: 404, message: format!("training {id} not found") }
}

impl TrainingsApi for MockTrainingsApi {
    fn list(&self) -> ApiFuture<Vec<Training>> {
        self.respond(ApiCall::List, |state| Ok(state.items.clone()))
    }

    fn get(&self, id: &TrainingId) -> ApiFuture<Training> {
        let id = id.clone();
        self.respond(ApiCall::Get(id.clone()), move |state| {
            state.items.iter().find(|item| item.id == id).cloned().ok_or_else(|| not_found(&id))
        })
    }

    fn create(&self, fields: &TrainingFields) -> ApiFuture<Training> {
        let fields = fields.clone();
        self.respond(ApiCall::Create(fields.clone()), move |state| {
            let training = Training::from_fields(TrainingId::Number(state.next_id), fields);
            state.next_id += 1;
            state.items.push(training.clone());
            Ok(training)
        })
    }

    fn update(&self, training: &Training) -> ApiFuture<()> {
        let training = training.clone();
        self.respond(ApiCall::Update(training.clone()), move |state| {
            let stored = state
                .items
                .iter_mut()
                .find(|item| item.id == training.id)
                .ok_or_else(|| not_found(&training.id))?;
            stored.assign_fields(&training);
            Ok(())
        })
    }

    fn delete(&self, id: &TrainingId) -> ApiFuture<()> {
        let id = id.clone();
        self.respond(ApiCall::Delete(id.clone()), move |state| {
            let before = state.items.len();
            state.items.retain(|item| item.id != id);
            if state.items.len() == before { Err(not_found(&id)) } else { Ok(()) }
        })
    }
}

/// Notifier that remembers every message
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification, in delivery order
    #[must_use]
    pub fn notifications(&self) -> Vec<(Severity, String)> {
        self.lock().clone()
    }

    /// Messages delivered as errors
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.with_severity(Severity::Error)
    }

    /// Messages delivered as warnings
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.with_severity(Severity::Warning)
    }

    /// Messages delivered as successes
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        self.with_severity(Severity::Success)
    }

    fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(kind, _)| *kind == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Severity, String)>> {
        self.notifications.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.lock().push((severity, message.to_string()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::types::WorkoutType;
    use chrono::NaiveDate;

    fn fields() -> TrainingFields {
        TrainingFields {
            date: NaiveDate::from_ymd_opt(2021, 2, 2).unwrap(),
            workout_type: WorkoutType::Walking,
            distance_in_km: 3.0,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_assigns_sequential_ids() {
        let api = MockTrainingsApi::new();
        assert_eq!(api.create(&fields()).await.unwrap().id, TrainingId::from(1));
        assert_eq!(api.create(&fields()).await.unwrap().id, TrainingId::from(2));
        assert_eq!(api.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_next_only_affects_one_call() {
        let api = MockTrainingsApi::new();
        api.fail_next(ApiError::Transport("down".to_string()));
        assert!(api.list().await.is_err());
        assert!(api.list().await.is_ok());
        assert_eq!(api.calls(), vec![ApiCall::List, ApiCall::List]);
    }

    #[tokio::test]
    async fn test_gate_holds_responses() {
        let api = MockTrainingsApi::new().gated();
        let pending = tokio::spawn(api.create(&fields()));
        tokio::task::yield_now().await;
        assert!(api.items().is_empty());
        assert_eq!(api.calls().len(), 1);

        api.release(1);
        let created = pending.await.unwrap().unwrap();
        assert_eq!(api.items(), vec![created]);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let api = MockTrainingsApi::new();
        let error = api.delete(&TrainingId::from(3)).await.unwrap_err();
        assert_eq!(error.status(), Some(404));
    }
}
