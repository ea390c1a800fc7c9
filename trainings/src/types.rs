//! Domain types for the training log.
//!
//! A training is one recorded workout. The store keeps every training the
//! server returned plus the ones created locally that the server has not
//! confirmed yet, together with the table filter and the week shown in the
//! chart.

use crate::chart::{self, WeekChart};
use crate::selectors;
use crate::validation::{TrainingForm, ValidationErrors};
use crate::week::IsoWeek;
use chrono::NaiveDate;
use fitlog_core::environment::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a training
///
/// Server ids are opaque: a number or a string. Ids allocated locally for
/// trainings awaiting confirmation are negative numbers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainingId {
    /// Numeric id
    Number(i64),
    /// String id
    Text(String),
}

impl TrainingId {
    /// Whether this id was allocated locally and still awaits a server id
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Number(n) if *n < 0)
    }
}

impl From<i64> for TrainingId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for TrainingId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for TrainingId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl fmt::Display for TrainingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Error for a workout type name outside the known set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workout type: {0:?}")]
pub struct UnknownWorkoutType(pub String);

/// Kind of workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    /// Walking
    Walking,
    /// Running
    Running,
    /// Cycling
    Cycling,
    /// Skiing
    Skiing,
}

impl WorkoutType {
    /// Every workout type, in display order
    pub const ALL: [Self; 4] = [Self::Walking, Self::Running, Self::Cycling, Self::Skiing];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Cycling => "cycling",
            Self::Skiing => "skiing",
        }
    }

    /// Human-readable name, also used as the chart series name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Walking => "Walking",
            Self::Running => "Running",
            Self::Cycling => "Cycling",
            Self::Skiing => "Skiing",
        }
    }

    /// Position in [`WorkoutType::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = UnknownWorkoutType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownWorkoutType(s.to_string()))
    }
}

/// Table filter: a single workout type or everything
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WorkoutFilter {
    /// No filtering
    #[default]
    All,
    /// Only trainings of this type
    Only(WorkoutType),
}

impl WorkoutFilter {
    /// Whether a training of `kind` passes the filter
    #[must_use]
    pub fn matches(self, kind: WorkoutType) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == kind,
        }
    }

    /// Filter choices with their labels, "All" last
    #[must_use]
    pub fn options() -> Vec<(Self, &'static str)> {
        WorkoutType::ALL
            .into_iter()
            .map(|kind| (Self::Only(kind), kind.label()))
            .chain(std::iter::once((Self::All, "All")))
            .collect()
    }
}

impl fmt::Display for WorkoutFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for WorkoutFilter {
    type Err = UnknownWorkoutType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Editable fields of a training, as sent to the server on create
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingFields {
    /// Day of the workout
    pub date: NaiveDate,
    /// Kind of workout
    pub workout_type: WorkoutType,
    /// Distance covered
    #[serde(rename = "distanceInKM")]
    pub distance_in_km: f64,
    /// Free text
    #[serde(default)]
    pub comment: String,
}

/// One recorded workout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    /// Server id, or a temporary id until the server confirms
    pub id: TrainingId,
    /// Day of the workout
    pub date: NaiveDate,
    /// Kind of workout
    pub workout_type: WorkoutType,
    /// Distance covered
    #[serde(rename = "distanceInKM")]
    pub distance_in_km: f64,
    /// Free text
    #[serde(default)]
    pub comment: String,
}

impl Training {
    /// Attach an id to a set of fields
    #[must_use]
    pub fn from_fields(id: TrainingId, fields: TrainingFields) -> Self {
        let TrainingFields { date, workout_type, distance_in_km, comment } = fields;
        Self { id, date, workout_type, distance_in_km, comment }
    }

    /// The editable fields, without the id
    #[must_use]
    pub fn fields(&self) -> TrainingFields {
        TrainingFields {
            date: self.date,
            workout_type: self.workout_type,
            distance_in_km: self.distance_in_km,
            comment: self.comment.clone(),
        }
    }

    /// Copy the editable fields of `other`, keeping this id
    pub fn assign_fields(&mut self, other: &Self) {
        self.date = other.date;
        self.workout_type = other.workout_type;
        self.distance_in_km = other.distance_in_km;
        self.comment.clone_from(&other.comment);
    }
}

/// State of the training log
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingsState {
    /// Trainings in insertion order; ids are unique
    pub items: Vec<Training>,
    /// Filter applied to the table
    pub workout_type_filter: WorkoutFilter,
    /// Week shown in the chart
    pub chart_week: IsoWeek,
    /// Field errors from the last rejected form submission
    pub form_errors: Option<ValidationErrors>,
}

impl TrainingsState {
    /// Empty state showing `chart_week`
    #[must_use]
    pub const fn new(chart_week: IsoWeek) -> Self {
        Self {
            items: Vec::new(),
            workout_type_filter: WorkoutFilter::All,
            chart_week,
            form_errors: None,
        }
    }

    /// Empty state showing the current week
    #[must_use]
    pub fn starting_at(clock: &dyn Clock) -> Self {
        Self::new(IsoWeek::containing(clock.now().date_naive()))
    }

    /// Returns the number of trainings
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns a training by id
    #[must_use]
    pub fn get(&self, id: &TrainingId) -> Option<&Training> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Checks if a training exists
    #[must_use]
    pub fn exists(&self, id: &TrainingId) -> bool {
        self.get(id).is_some()
    }

    /// Trainings passing the current filter, in store order
    #[must_use]
    pub fn filtered(&self) -> Vec<&Training> {
        selectors::filter_trainings(&self.items, self.workout_type_filter)
    }

    /// Chart data for the selected week
    #[must_use]
    pub fn week_chart(&self) -> WeekChart {
        chart::build_week_chart(&self.items, self.chart_week)
    }
}

/// Actions representing commands and events for the training log
///
/// Commands start remote work and mutate state optimistically. Events only
/// change state; they are also what effects feed back when remote work ends.
#[derive(Clone, Debug, PartialEq)]
pub enum TrainingsAction {
    // ========== Commands ==========
    /// Command: Load every training from the server
    FetchTrainings,

    /// Command: Validate a form and save it as a new or edited training
    SubmitTrainingForm {
        /// Raw form input
        form: TrainingForm,
        /// Id of the training being edited; `None` creates a new one
        editing: Option<TrainingId>,
    },

    /// Command: Create a training
    CreateTraining {
        /// Fields of the new training
        fields: TrainingFields,
    },

    /// Command: Replace the fields of a training
    UpdateTraining {
        /// Training with its id and new fields
        training: Training,
    },

    /// Command: Delete a training
    DeleteTraining {
        /// Training to delete
        id: TrainingId,
    },

    // ========== Events ==========
    /// Event: The whole collection was replaced (load or rollback)
    TrainingsReplaced {
        /// New collection
        items: Vec<Training>,
    },

    /// Event: A training was added under a temporary id
    TrainingCreated {
        /// The new training
        item: Training,
    },

    /// Event: The fields of a training changed
    TrainingUpdated {
        /// Training with its new fields
        item: Training,
    },

    /// Event: A training was removed
    TrainingDeleted {
        /// Removed training
        id: TrainingId,
    },

    /// Event: The server confirmed a created training under its own id
    TrainingIdReassigned {
        /// Temporary id
        old_id: TrainingId,
        /// Server id
        new_id: TrainingId,
    },

    /// Event: The table filter changed
    WorkoutFilterChanged {
        /// New filter
        filter: WorkoutFilter,
    },

    /// Event: A different chart week was picked
    ChartWeekChanged {
        /// New week
        week: IsoWeek,
    },

    /// Event: The chart moved by a number of weeks
    ChartWeekShifted {
        /// Signed number of weeks
        weeks: i64,
    },

    /// Event: A form submission was rejected
    FormValidationFailed {
        /// Errors per field
        errors: ValidationErrors,
    },
}
