//! Field validation for the training form
//!
//! A form is checked as a whole: every failing field reports its messages
//! so the form can show them all at once.

use crate::types::{TrainingFields, WorkoutType};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Smallest distance that can be recorded
pub const MIN_DISTANCE_KM: f64 = 0.1;

/// Longest comment, in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Date format accepted by the form
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Form field a validation message belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// `date`
    Date,
    /// `workoutType`
    WorkoutType,
    /// `distanceInKM`
    DistanceInKm,
    /// `comment`
    Comment,
}

impl Field {
    /// Name of the field on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::WorkoutType => "workoutType",
            Self::DistanceInKm => "distanceInKM",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation messages grouped by field
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<Field, Vec<String>>,
}

impl ValidationErrors {
    /// Record a message for `field`
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// No field failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages for one field, empty if it passed
    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Fields that failed, in form order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    /// Total number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw input of the add/edit training form
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingForm {
    /// Date as typed, `YYYY-MM-DD`
    pub date: String,
    /// Workout type name
    pub workout_type: String,
    /// Distance as entered
    pub distance_in_km: f64,
    /// Free text
    pub comment: String,
}

impl Default for TrainingForm {
    fn default() -> Self {
        Self {
            date: String::new(),
            workout_type: WorkoutType::Running.as_str().to_string(),
            distance_in_km: 0.0,
            comment: String::new(),
        }
    }
}

impl TrainingForm {
    /// Form prefilled from an existing training, for editing
    #[must_use]
    pub fn for_fields(fields: &TrainingFields) -> Self {
        Self {
            date: fields.date.format(DATE_FORMAT).to_string(),
            workout_type: fields.workout_type.as_str().to_string(),
            distance_in_km: fields.distance_in_km,
            comment: fields.comment.clone(),
        }
    }

    /// Check every field
    ///
    /// # Errors
    ///
    /// Returns all failing fields with their messages.
    pub fn validate(&self) -> Result<TrainingFields, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let date = parse_date(&self.date);
        if date.is_none() {
            errors.add(Field::Date, "Invalid value for date field");
        }

        let workout_type = self.workout_type.parse::<WorkoutType>().ok();
        if workout_type.is_none() {
            errors.add(
                Field::WorkoutType,
                "workoutType must be one of the following values: walking, running, cycling, skiing",
            );
        }

        check_distance(self.distance_in_km, &mut errors);

        if self.comment.chars().count() > MAX_COMMENT_CHARS {
            errors.add(
                Field::Comment,
                format!("The length of a comment cannot be longer than {MAX_COMMENT_CHARS} characters"),
            );
        }

        match (date, workout_type) {
            (Some(date), Some(workout_type)) if errors.is_empty() => Ok(TrainingFields {
                date,
                workout_type,
                distance_in_km: self.distance_in_km,
                comment: self.comment.clone(),
            }),
            _ => Err(errors),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // %Y alone would also take 5-digit years and unpadded parts
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

fn check_distance(distance: f64, errors: &mut ValidationErrors) {
    if !distance.is_finite() || decimal_places(distance) > 1 {
        errors.add(
            Field::DistanceInKm,
            "Value of distanceInKM must be a number and contain no more than 1 decimal place",
        );
    }
    if distance.is_finite() && distance < MIN_DISTANCE_KM {
        errors.add(
            Field::DistanceInKm,
            format!("Value for distanceInKM cannot be less than {MIN_DISTANCE_KM}"),
        );
    }
}

/// Digits after the decimal point in the shortest representation
fn decimal_places(value: f64) -> usize {
    value
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}
