//! Table views over the store
//!
//! Filtering and sorting never change the store; they return borrowed views.

use crate::types::{Training, WorkoutFilter};
use std::cmp::Ordering;

/// Trainings passing `filter`, in store order
#[must_use]
pub fn filter_trainings(items: &[Training], filter: WorkoutFilter) -> Vec<&Training> {
    items.iter().filter(|item| filter.matches(item.workout_type)).collect()
}

/// Sortable table column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortColumn {
    /// Date
    Date,
    /// Workout type, by wire name
    WorkoutType,
    /// Distance
    DistanceInKm,
    /// Comment
    Comment,
}

impl SortColumn {
    /// Every column, in table order
    pub const ALL: [Self; 4] = [Self::Date, Self::WorkoutType, Self::DistanceInKm, Self::Comment];

    /// Column heading
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::WorkoutType => "Workout Type",
            Self::DistanceInKm => "Distance (KM)",
            Self::Comment => "Comment",
        }
    }

    /// Field name, as used in configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::WorkoutType => "workoutType",
            Self::DistanceInKm => "distanceInKM",
            Self::Comment => "comment",
        }
    }

    /// Column for a field name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == name)
    }

    fn compare(self, a: &Training, b: &Training) -> Ordering {
        match self {
            Self::Date => a.date.cmp(&b.date),
            Self::WorkoutType => a.workout_type.as_str().cmp(b.workout_type.as_str()),
            Self::DistanceInKm => a.distance_in_km.total_cmp(&b.distance_in_km),
            Self::Comment => a.comment.cmp(&b.comment),
        }
    }
}

/// Sort direction; clicking a heading cycles through them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
    /// Store order
    #[default]
    Unsorted,
}

impl SortOrder {
    /// Next order in the asc, desc, unsorted cycle
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Unsorted,
            Self::Unsorted => Self::Asc,
        }
    }
}

/// Sort state of the table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TableSort {
    column: Option<SortColumn>,
    order: SortOrder,
}

impl TableSort {
    /// Sort by `column` in `order`
    #[must_use]
    pub const fn by(column: SortColumn, order: SortOrder) -> Self {
        Self { column: Some(column), order }
    }

    /// Heading clicked: a new column starts ascending, the same column cycles
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.order = self.order.next();
        } else {
            self.column = Some(column);
            self.order = SortOrder::Asc;
        }
    }

    /// Column last clicked
    #[must_use]
    pub const fn column(&self) -> Option<SortColumn> {
        self.column
    }

    /// Current order
    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }
}

/// Sort a view; stable, so equal rows keep store order
#[must_use]
pub fn sort_trainings(mut items: Vec<&Training>, sort: TableSort) -> Vec<&Training> {
    let Some(column) = sort.column else {
        return items;
    };
    match sort.order {
        SortOrder::Asc => items.sort_by(|a, b| column.compare(a, b)),
        SortOrder::Desc => items.sort_by(|a, b| column.compare(b, a)),
        SortOrder::Unsorted => {},
    }
    items
}
