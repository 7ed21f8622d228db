//! Race results, upcoming races and per-leg paces
//!
//! The race book is static reference data. It is read from a TOML file with
//! `[[results]]` and `[[upcoming]]` tables, or taken from the copy compiled
//! into the binary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::units;

const BUILTIN_RACE_BOOK: &str = include_str!("../data/races.toml");

/// Race distance category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistanceCategory {
    Sprint,
    Olympic,
    Half,
    Full,
    FiveK,
    TenK,
    HalfMarathon,
    Marathon,
    /// Anything without a fixed distance table entry
    Other(String),
}

/// Leg distances of a triathlon category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegDistances {
    pub swim_m: f64,
    pub bike_km: f64,
    pub run_km: f64,
}

impl DistanceCategory {
    /// Triathlon categories in display order
    pub const TRIATHLON: [DistanceCategory; 4] = [
        DistanceCategory::Sprint,
        DistanceCategory::Olympic,
        DistanceCategory::Half,
        DistanceCategory::Full,
    ];

    /// Running categories in display order
    pub const RUNNING: [DistanceCategory; 4] = [
        DistanceCategory::FiveK,
        DistanceCategory::TenK,
        DistanceCategory::HalfMarathon,
        DistanceCategory::Marathon,
    ];

    pub fn legs(&self) -> Option<LegDistances> {
        let (swim_m, bike_km, run_km) = match self {
            DistanceCategory::Sprint => (500.0, 20.0, 5.0),
            DistanceCategory::Olympic => (1500.0, 40.0, 10.0),
            DistanceCategory::Half => (1900.0, 90.0, 21.1),
            DistanceCategory::Full => (3800.0, 180.0, 42.2),
            _ => return None,
        };
        Some(LegDistances {
            swim_m,
            bike_km,
            run_km,
        })
    }

    /// Distance of a running category in km
    pub fn run_distance_km(&self) -> Option<f64> {
        match self {
            DistanceCategory::FiveK => Some(5.0),
            DistanceCategory::TenK => Some(10.0),
            DistanceCategory::HalfMarathon => Some(21.1),
            DistanceCategory::Marathon => Some(42.2),
            _ => None,
        }
    }

    pub fn is_triathlon(&self) -> bool {
        self.legs().is_some()
    }
}

impl From<String> for DistanceCategory {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "sprint" | "sprintdistanz" => DistanceCategory::Sprint,
            "olympic" | "olympische distanz" => DistanceCategory::Olympic,
            "half" | "middle" | "mitteldistanz" => DistanceCategory::Half,
            "full" | "long" | "langdistanz" => DistanceCategory::Full,
            "5 km" | "5k" | "5 kilometer" => DistanceCategory::FiveK,
            "10 km" | "10k" | "10 kilometer" => DistanceCategory::TenK,
            "half marathon" | "halbmarathon" => DistanceCategory::HalfMarathon,
            "marathon" => DistanceCategory::Marathon,
            _ => DistanceCategory::Other(value.trim().to_string()),
        }
    }
}

impl From<DistanceCategory> for String {
    fn from(category: DistanceCategory) -> Self {
        category.to_string()
    }
}

impl std::fmt::Display for DistanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceCategory::Sprint => write!(f, "Sprint"),
            DistanceCategory::Olympic => write!(f, "Olympic"),
            DistanceCategory::Half => write!(f, "Half"),
            DistanceCategory::Full => write!(f, "Full"),
            DistanceCategory::FiveK => write!(f, "5 km"),
            DistanceCategory::TenK => write!(f, "10 km"),
            DistanceCategory::HalfMarathon => write!(f, "Half marathon"),
            DistanceCategory::Marathon => write!(f, "Marathon"),
            DistanceCategory::Other(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Swim,
    Bike,
    Run,
    Finish,
}

/// One finished race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub event: String,
    pub year: i32,
    pub category: DistanceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swim_delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_delta: Option<String>,
}

impl RaceResult {
    fn split(&self, leg: Leg) -> Option<&str> {
        match leg {
            Leg::Swim => self.swim.as_deref(),
            Leg::Bike => self.bike.as_deref(),
            Leg::Run => self.run.as_deref(),
            Leg::Finish => self.finish.as_deref(),
        }
    }

    fn delta(&self, leg: Leg) -> Option<&str> {
        match leg {
            Leg::Swim => self.swim_delta.as_deref(),
            Leg::Bike => self.bike_delta.as_deref(),
            Leg::Run => self.run_delta.as_deref(),
            Leg::Finish => self.finish_delta.as_deref(),
        }
    }

    /// Split time in seconds; the `--:--:--` sentinel and blanks are `None`
    pub fn split_seconds(&self, leg: Leg) -> Option<u32> {
        self.split(leg).and_then(units::time_to_seconds)
    }

    /// Split as shown in tables
    pub fn split_text(&self, leg: Leg) -> String {
        match self.split_seconds(leg) {
            Some(secs) => units::format_seconds(Some(f64::from(secs))),
            None => units::TIME_PLACEHOLDER.to_string(),
        }
    }

    /// Signed change against the previous result in seconds
    pub fn delta_seconds(&self, leg: Leg) -> Option<i64> {
        self.delta(leg).and_then(units::parse_signed_delta)
    }

    /// Seconds per 100 m in the swim leg
    pub fn swim_pace(&self) -> Option<f64> {
        let legs = self.category.legs()?;
        units::pace_per_unit(f64::from(self.split_seconds(Leg::Swim)?), legs.swim_m / 100.0)
    }

    /// Average bike speed in km/h
    pub fn bike_speed(&self) -> Option<f64> {
        let legs = self.category.legs()?;
        units::speed_kmh(legs.bike_km * 1000.0, f64::from(self.split_seconds(Leg::Bike)?))
    }

    /// Seconds per km; from the run split in a triathlon, from the finish
    /// time in a running race
    pub fn run_pace(&self) -> Option<f64> {
        if let Some(legs) = self.category.legs() {
            return units::pace_per_unit(f64::from(self.split_seconds(Leg::Run)?), legs.run_km);
        }
        let km = self.category.run_distance_km()?;
        units::pace_per_unit(f64::from(self.split_seconds(Leg::Finish)?), km)
    }

    pub fn paces(&self) -> RacePaces {
        RacePaces {
            swim_per_100m: units::seconds_to_pace(self.swim_pace()),
            bike_kmh: units::format_speed(self.bike_speed()),
            run_per_km: units::seconds_to_pace(self.run_pace()),
        }
    }
}

/// Formatted paces of one result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacePaces {
    pub swim_per_100m: String,
    pub bike_kmh: String,
    pub run_per_km: String,
}

/// A race still to come
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingRace {
    pub name: String,
    pub date: NaiveDate,
    pub category: DistanceCategory,
}

impl UpcomingRace {
    /// Days until race day; negative once it has passed
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }
}

/// Results of one category, in book order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: DistanceCategory,
    pub results: Vec<&'a RaceResult>,
}

impl CategoryGroup<'_> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceBook {
    #[serde(default)]
    pub results: Vec<RaceResult>,
    #[serde(default)]
    pub upcoming: Vec<UpcomingRace>,
}

impl RaceBook {
    /// Parse a race book from TOML text; `origin` names the source in errors
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let book: RaceBook = toml::from_str(text).map_err(|e| ImportError::RaceBook {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            results = book.results.len(),
            upcoming = book.upcoming.len(),
            "Parsed race book"
        );
        Ok(book)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path)?;
        let book = Self::from_toml_str(&text, path)?;
        info!(file = %path.display(), results = book.results.len(), "Loaded race book");
        Ok(book)
    }

    /// The race book compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RACE_BOOK, Path::new("<builtin>"))
    }

    /// Load `path` when given, else the built-in book
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::builtin(),
        }
    }

    /// One group per requested category, empty groups included
    pub fn group<'a>(&'a self, categories: &[DistanceCategory]) -> Vec<CategoryGroup<'a>> {
        categories
            .iter()
            .map(|category| CategoryGroup {
                category: category.clone(),
                results: self
                    .results
                    .iter()
                    .filter(|r| &r.category == category)
                    .collect(),
            })
            .collect()
    }

    /// Results whose category has no distance table entry
    pub fn uncategorized(&self) -> Vec<&RaceResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.category, DistanceCategory::Other(_)))
            .collect()
    }

    /// Upcoming races by date with the days left until each
    pub fn countdown(&self, today: NaiveDate) -> Vec<(&UpcomingRace, i64)> {
        let mut races: Vec<(&UpcomingRace, i64)> = self
            .upcoming
            .iter()
            .map(|race| (race, race.days_remaining(today)))
            .collect();
        races.sort_by_key(|(race, _)| race.date);
        races
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn result(category: &str, swim: &str, bike: &str, run: &str, finish: &str) -> RaceResult {
        RaceResult {
            event: "Test".to_string(),
            year: 2024,
            category: DistanceCategory::from(category.to_string()),
            swim: Some(swim.to_string()),
            swim_delta: None,
            bike: Some(bike.to_string()),
            bike_delta: None,
            run: Some(run.to_string()),
            run_delta: None,
            finish: Some(finish.to_string()),
            finish_delta: None,
        }
    }

    #[test]
    fn test_sprint_paces() {
        let race = result("Sprint", "00:11:06", "00:35:19", "00:23:44", "01:15:44");
        let paces = race.paces();
        // 666 s over 5 x 100 m
        assert_eq!(paces.swim_per_100m, "02:13");
        // 20 km in 2119 s
        assert_eq!(paces.bike_kmh, "34.0");
        // 1424 s over 5 km
        assert_eq!(paces.run_per_km, "04:44");
    }

    #[test]
    fn test_missing_splits_use_placeholders() {
        let race = result("Sprintdistanz", "--:--:--", "--:--:--", "--:--:--", "--:--:--");
        let paces = race.paces();
        assert_eq!(paces.swim_per_100m, "--:--");
        assert_eq!(paces.bike_kmh, "--");
        assert_eq!(paces.run_per_km, "--:--");
        assert_eq!(race.split_text(Leg::Finish), "--:--:--");
    }

    #[test]
    fn test_running_pace_from_finish() {
        let race = result("Halbmarathon", "", "", "", "01:45:22");
        assert_eq!(race.category, DistanceCategory::HalfMarathon);
        // 6322 s over 21.1 km
        assert_eq!(race.paces().run_per_km, "04:59");
        assert_eq!(race.paces().bike_kmh, "--");
    }

    #[test]
    fn test_free_form_category() {
        let race = result("Trail 25 km", "", "", "", "02:30:00");
        assert_eq!(race.category, DistanceCategory::Other("Trail 25 km".to_string()));
        assert_eq!(race.run_pace(), None);
        assert_eq!(race.category.to_string(), "Trail 25 km");
    }

    #[test]
    fn test_builtin_book() {
        let book = RaceBook::builtin().unwrap();
        assert_eq!(book.results.len(), 10);

        let groups = book.group(&DistanceCategory::TRIATHLON);
        assert_eq!(groups[0].results.len(), 3);
        assert!(groups[1].is_empty());

        let running = book.group(&DistanceCategory::RUNNING);
        assert_eq!(running[0].results.len(), 2);
        assert!(running[1].is_empty());
        assert_eq!(running[2].results.len(), 4);

        let willich_2024 = groups[0].results[1];
        assert_eq!(willich_2024.delta_seconds(Leg::Run), Some(-63));
        assert_eq!(willich_2024.delta_seconds(Leg::Swim), Some(57));
    }

    #[test]
    fn test_countdown() {
        let book = RaceBook::builtin().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let countdown = book.countdown(today);
        assert_eq!(countdown[0].1, 6);
        assert!(countdown[1].1 > 0);

        let later = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        assert_eq!(book.countdown(later)[0].1, -3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[results]]\nevent = \"Stadtlauf\"\nyear = 2023\ncategory = \"10 km\"\nfinish = \"00:45:00\"\n"
        )
        .unwrap();

        let book = RaceBook::load_from_file(file.path()).unwrap();
        assert_eq!(book.results[0].paces().run_per_km, "04:30");
        assert!(book.upcoming.is_empty());
    }

    #[test]
    fn test_invalid_book_is_reported() {
        let err = RaceBook::from_toml_str("[[results]]\nyear = \"x\"", Path::new("races.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("races.toml"));
        assert!(RaceBook::load_from_file("/nonexistent/races.toml").is_err());
    }
}
