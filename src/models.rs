use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::DashError;
use crate::units;

/// Disciplines the dashboard reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    LapSwimming,
    Cycling,
    Running,
    /// Any other activity type (walking, strength, ...)
    Unrecognized,
}

impl Discipline {
    /// The three triathlon disciplines in race order
    pub const TRIATHLON: [Discipline; 3] =
        [Discipline::LapSwimming, Discipline::Cycling, Discipline::Running];

    /// Map a resolved type key onto a discipline
    pub fn from_type_key(type_key: &TypeKey) -> Self {
        match type_key {
            TypeKey::Known(key) => match key.as_str() {
                "running" => Discipline::Running,
                "cycling" => Discipline::Cycling,
                "lap_swimming" => Discipline::LapSwimming,
                _ => Discipline::Unrecognized,
            },
            TypeKey::Unknown => Discipline::Unrecognized,
        }
    }

    pub fn is_triathlon(&self) -> bool {
        !matches!(self, Discipline::Unrecognized)
    }

    /// Short label used in tables
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::LapSwimming => "Swim",
            Discipline::Cycling => "Bike",
            Discipline::Running => "Run",
            Discipline::Unrecognized => "Other",
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discipline::LapSwimming => write!(f, "lap_swimming"),
            Discipline::Cycling => write!(f, "cycling"),
            Discipline::Running => write!(f, "running"),
            Discipline::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Outcome of resolving the activity type of one raw row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "key", rename_all = "snake_case")]
pub enum TypeKey {
    Known(String),
    Unknown,
}

impl TypeKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypeKey::Known(key) => Some(key.as_str()),
            TypeKey::Unknown => None,
        }
    }
}

/// One exercise session as loaded from the activity cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Local start time as recorded by the device
    pub start_time: NaiveDateTime,

    /// Resolved activity type
    pub type_key: TypeKey,

    /// Distance in meters
    pub distance_m: Option<f64>,

    /// Duration in seconds
    pub duration_s: Option<f64>,

    /// Average heart rate in beats per minute
    pub avg_heart_rate: Option<f64>,

    /// Average speed in meters per second
    pub avg_speed_ms: Option<f64>,

    pub calories: Option<f64>,
}

impl Activity {
    pub fn discipline(&self) -> Discipline {
        Discipline::from_type_key(&self.type_key)
    }

    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_m.map(|m| m / 1000.0)
    }

    /// Session speed in km/h, undefined without a positive duration
    pub fn speed_kmh(&self) -> Option<f64> {
        units::speed_kmh(self.distance_m?, self.duration_s?)
    }

    /// Seconds per kilometer, or per 100 m for swims
    pub fn pace_seconds(&self) -> Option<f64> {
        let distance = self.distance_m?;
        let duration = self.duration_s?;
        match self.discipline() {
            Discipline::LapSwimming => units::pace_per_unit(duration, distance / 100.0),
            _ => units::pace_per_unit(duration, distance / 1000.0),
        }
    }
}

/// Inclusive date range selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashError> {
        if start > end {
            return Err(DashError::Configuration(format!(
                "Invalid date range: {} is after {}",
                start, end
            )));
        }
        Ok(DateRange { start, end })
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }

    /// Build a range from optional CLI bounds, each clamped into `bounds`.
    /// Only an explicit `from` after an explicit `to` is rejected.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        bounds: &DateRange,
    ) -> Result<Self, DashError> {
        if let (Some(from), Some(to)) = (from, to) {
            DateRange::new(from, to)?;
        }
        let start = from.map_or(bounds.start, |d| d.clamp(bounds.start, bounds.end));
        let end = to.map_or(bounds.end, |d| d.clamp(bounds.start, bounds.end));
        DateRange::new(start, end)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%d.%m.%Y"),
            self.end.format("%d.%m.%Y")
        )
    }
}

/// One labeled value of a daily or weekly series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        SeriesPoint { date, value }
    }
}

/// The immutable activity table for one render pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySet {
    activities: Vec<Activity>,
}

impl ActivitySet {
    /// Build a set, ordering sessions by start time
    pub fn new(mut activities: Vec<Activity>) -> Self {
        activities.sort_by_key(|a| a.start_time);
        ActivitySet { activities }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// First and last triathlon session dates, the implicit range bounds
    pub fn date_bounds(&self) -> Option<DateRange> {
        let mut triathlon = self.iter().filter(|a| a.discipline().is_triathlon());
        let first = triathlon.next()?.date();
        let last = triathlon.last().map(|a| a.date()).unwrap_or(first);
        Some(DateRange {
            start: first,
            end: last,
        })
    }

    /// Sessions of one discipline
    pub fn of_discipline(&self, discipline: Discipline) -> impl Iterator<Item = &Activity> {
        self.iter().filter(move |a| a.discipline() == discipline)
    }

    /// Sessions of one discipline within an inclusive range
    pub fn in_range(
        &self,
        discipline: Discipline,
        range: DateRange,
    ) -> impl Iterator<Item = &Activity> {
        self.of_discipline(discipline)
            .filter(move |a| range.contains(&a.date()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(date: &str, key: &str, distance: f64, duration: f64) -> Activity {
        Activity {
            start_time: NaiveDateTime::parse_from_str(
                &format!("{} 07:30:00", date),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap(),
            type_key: TypeKey::Known(key.to_string()),
            distance_m: Some(distance),
            duration_s: Some(duration),
            avg_heart_rate: None,
            avg_speed_ms: None,
            calories: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_discipline_from_type_key() {
        assert_eq!(
            Discipline::from_type_key(&TypeKey::Known("lap_swimming".into())),
            Discipline::LapSwimming
        );
        assert_eq!(
            Discipline::from_type_key(&TypeKey::Known("walking".into())),
            Discipline::Unrecognized
        );
        assert_eq!(Discipline::from_type_key(&TypeKey::Unknown), Discipline::Unrecognized);
    }

    #[test]
    fn test_cycling_speed_is_exact() {
        let ride = activity("2024-06-01", "cycling", 20000.0, 3600.0);
        assert_eq!(ride.speed_kmh(), Some(20.0));
    }

    #[test]
    fn test_speed_undefined_without_duration() {
        let mut run = activity("2024-06-01", "running", 5000.0, 0.0);
        assert_eq!(run.speed_kmh(), None);
        run.duration_s = None;
        assert_eq!(run.speed_kmh(), None);
    }

    #[test]
    fn test_swim_pace_per_100m() {
        let swim = activity("2024-06-01", "lap_swimming", 1000.0, 1200.0);
        assert_eq!(swim.pace_seconds(), Some(120.0));
    }

    #[test]
    fn test_activity_set_sorted_and_bounded() {
        let set = ActivitySet::new(vec![
            activity("2024-03-01", "running", 5000.0, 1500.0),
            activity("2024-01-15", "walking", 3000.0, 1800.0),
            activity("2024-02-01", "cycling", 20000.0, 3600.0),
        ]);

        assert_eq!(set.activities()[0].date(), date("2024-01-15"));
        let bounds = set.date_bounds().unwrap();
        assert_eq!(bounds.start, date("2024-02-01"));
        assert_eq!(bounds.end, date("2024-03-01"));
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        assert!(DateRange::new(date("2024-02-01"), date("2024-01-01")).is_err());
    }

    #[test]
    fn test_date_range_resolve_clamps() {
        let bounds = DateRange::new(date("2024-01-01"), date("2024-06-30")).unwrap();
        let range = DateRange::resolve(Some(date("2023-01-01")), None, &bounds).unwrap();
        assert_eq!(range, bounds);

        let range =
            DateRange::resolve(Some(date("2024-02-01")), Some(date("2024-03-01")), &bounds)
                .unwrap();
        assert_eq!(range.days(), 30);
        assert!(range.contains(&date("2024-03-01")));
        assert!(!range.contains(&date("2024-03-02")));
    }

    #[test]
    fn test_date_range_resolve_from_after_last_session() {
        let bounds = DateRange::new(date("2024-01-01"), date("2024-06-30")).unwrap();

        let range = DateRange::resolve(Some(date("2024-09-01")), None, &bounds).unwrap();
        assert_eq!(range.start, date("2024-06-30"));
        assert_eq!(range.end, date("2024-06-30"));

        let range = DateRange::resolve(None, Some(date("2023-05-01")), &bounds).unwrap();
        assert_eq!(range.start, date("2024-01-01"));
        assert_eq!(range.end, date("2024-01-01"));

        assert!(
            DateRange::resolve(Some(date("2024-03-01")), Some(date("2024-02-01")), &bounds)
                .is_err()
        );
    }
}
