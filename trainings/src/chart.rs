//! Weekly distance chart
//!
//! Distances are summed per day and workout type over the seven days of an
//! ISO week. Each step is a plain function so they can be checked on their
//! own; [`build_week_chart`] runs them in order.

use crate::types::{Training, WorkoutType};
use crate::week::{DAYS_PER_WEEK, IsoWeek};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Kilometres per workout type for one day
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistanceByType([f64; 4]);

impl DistanceByType {
    /// Distance recorded for `kind`
    #[must_use]
    pub const fn get(&self, kind: WorkoutType) -> f64 {
        self.0[kind.index()]
    }

    /// Add `km` to `kind`
    pub fn add(&mut self, kind: WorkoutType, km: f64) {
        self.0[kind.index()] += km;
    }

    /// Sum over all types
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Per-day accumulators keyed by date
pub type DailyDistances = BTreeMap<NaiveDate, DistanceByType>;

/// One bar series of the chart
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    /// Workout type the series shows
    pub workout_type: WorkoutType,
    /// Series name, the workout type label
    pub name: String,
    /// Kilometres per day, in week order
    pub data: Vec<f64>,
}

/// Chart data for one week
#[derive(Clone, Debug, PartialEq)]
pub struct WeekChart {
    /// Week shown
    pub week: IsoWeek,
    /// Dates of the week, Monday first
    pub dates: [NaiveDate; DAYS_PER_WEEK],
    /// Day-of-week labels, `Mon` to `Sun`
    pub categories: Vec<String>,
    /// One series per workout type
    pub series: Vec<ChartSeries>,
}

impl WeekChart {
    /// Series for one workout type
    #[must_use]
    pub fn series_for(&self, kind: WorkoutType) -> Option<&ChartSeries> {
        self.series.iter().find(|series| series.workout_type == kind)
    }

    /// Kilometres of `kind` on `date`, `None` outside the week
    #[must_use]
    pub fn value(&self, kind: WorkoutType, date: NaiveDate) -> Option<f64> {
        let day = self.dates.iter().position(|d| *d == date)?;
        self.series_for(kind)?.data.get(day).copied()
    }

    /// Kilometres over the whole week
    #[must_use]
    pub fn total(&self) -> f64 {
        self.series.iter().flat_map(|series| series.data.iter()).sum()
    }
}

/// The seven dates of `week`, Monday first
#[must_use]
pub fn week_dates(week: IsoWeek) -> [NaiveDate; DAYS_PER_WEEK] {
    week.days()
}

/// A zeroed accumulator for every date
#[must_use]
pub fn empty_buckets(dates: &[NaiveDate]) -> DailyDistances {
    dates.iter().map(|date| (*date, DistanceByType::default())).collect()
}

/// Sum distances of the trainings falling on `dates`
///
/// `dates` is a contiguous range; trainings outside its first and last date
/// are ignored.
pub fn sum_distances<'a, I>(trainings: I, dates: &[NaiveDate]) -> DailyDistances
where
    I: IntoIterator<Item = &'a Training>,
{
    let mut buckets = empty_buckets(dates);
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return buckets;
    };

    for training in trainings {
        if training.date < *first || training.date > *last {
            continue;
        }
        if let Some(bucket) = buckets.get_mut(&training.date) {
            bucket.add(training.workout_type, training.distance_in_km);
        }
    }
    buckets
}

/// One series per workout type with the daily sums in `dates` order
#[must_use]
pub fn generate_series(dates: &[NaiveDate], sums: &DailyDistances) -> Vec<ChartSeries> {
    WorkoutType::ALL
        .into_iter()
        .map(|kind| ChartSeries {
            workout_type: kind,
            name: kind.label().to_string(),
            data: dates
                .iter()
                .map(|date| sums.get(date).map_or(0.0, |bucket| bucket.get(kind)))
                .collect(),
        })
        .collect()
}

/// Short weekday names for `dates`
#[must_use]
pub fn day_labels(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|date| date.format("%a").to_string()).collect()
}

/// Chart data for `week` from every training in the store
pub fn build_week_chart<'a, I>(trainings: I, week: IsoWeek) -> WeekChart
where
    I: IntoIterator<Item = &'a Training>,
{
    let dates = week_dates(week);
    let sums = sum_distances(trainings, &dates);

    WeekChart {
        week,
        dates,
        categories: day_labels(&dates),
        series: generate_series(&dates, &sums),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)] // Test code; sums of exact inputs
mod tests {
    use super::*;
    use crate::types::TrainingId;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn training(id: i64, on: NaiveDate, kind: WorkoutType, km: f64) -> Training {
        Training {
            id: TrainingId::from(id),
            date: on,
            workout_type: kind,
            distance_in_km: km,
            comment: String::new(),
        }
    }

    fn week_five() -> IsoWeek {
        IsoWeek::new(2021, 5).unwrap()
    }

    #[test]
    fn test_single_training_fills_one_cell() {
        let items = [training(1, date(2021, 2, 2), WorkoutType::Cycling, 15.5)];
        let chart = build_week_chart(&items, week_five());

        assert_eq!(chart.value(WorkoutType::Cycling, date(2021, 2, 2)), Some(15.5));
        for series in &chart.series {
            for (day, value) in chart.dates.iter().zip(&series.data) {
                if series.workout_type != WorkoutType::Cycling || *day != date(2021, 2, 2) {
                    assert_eq!(*value, 0.0, "{} on {day}", series.name);
                }
            }
        }
    }

    #[test]
    fn test_week_edges() {
        let items = [
            training(1, date(2021, 1, 31), WorkoutType::Running, 1.0),
            training(2, date(2021, 2, 1), WorkoutType::Running, 2.0),
            training(3, date(2021, 2, 7), WorkoutType::Running, 3.0),
            training(4, date(2021, 2, 8), WorkoutType::Running, 4.0),
        ];
        let chart = build_week_chart(&items, week_five());

        let running = chart.series_for(WorkoutType::Running).unwrap();
        assert_eq!(running.data, vec![2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0]);
        assert_eq!(chart.total(), 5.0);
    }

    #[test]
    fn test_same_day_same_type_adds_up() {
        let items = [
            training(1, date(2021, 2, 3), WorkoutType::Walking, 1.5),
            training(2, date(2021, 2, 3), WorkoutType::Walking, 2.5),
            training(3, date(2021, 2, 3), WorkoutType::Skiing, 10.0),
        ];
        let sums = sum_distances(&items, &week_dates(week_five()));
        let wednesday = sums[&date(2021, 2, 3)];

        assert_eq!(wednesday.get(WorkoutType::Walking), 4.0);
        assert_eq!(wednesday.get(WorkoutType::Skiing), 10.0);
        assert_eq!(wednesday.total(), 14.0);
    }

    #[test]
    fn test_layout() {
        let chart = build_week_chart(std::iter::empty(), week_five());

        assert_eq!(chart.categories, vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Walking", "Running", "Cycling", "Skiing"]);
        assert!(chart.series.iter().all(|s| s.data == vec![0.0; DAYS_PER_WEEK]));
        assert_eq!(chart.value(WorkoutType::Walking, date(2021, 2, 8)), None);
    }

    #[test]
    fn test_empty_date_range() {
        let items = [training(1, date(2021, 2, 3), WorkoutType::Walking, 1.0)];
        assert!(sum_distances(&items, &[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_week_total_matches_in_week_distances(
            entries in prop::collection::vec((0u64..28, 0usize..4, 1u32..500), 0..40)
        ) {
            let start = date(2021, 1, 18);
            let items: Vec<Training> = entries
                .iter()
                .enumerate()
                .map(|(i, (offset, kind, tenths))| {
                    training(
                        i64::try_from(i).unwrap(),
                        start + chrono::Days::new(*offset),
                        WorkoutType::ALL[*kind],
                        f64::from(*tenths) / 10.0,
                    )
                })
                .collect();

            let week = week_five();
            let chart = build_week_chart(&items, week);
            let expected: f64 = items
                .iter()
                .filter(|t| week.contains(t.date))
                .map(|t| t.distance_in_km)
                .sum();

            prop_assert!((chart.total() - expected).abs() < 1e-6);
        }
    }
}
