//! Assembles every dashboard section for one render pass
//!
//! Each section is computed independently from the same immutable
//! `ActivitySet`. A section that cannot be computed carries an informational
//! message instead of a value and never affects the other sections.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

use crate::aggregation::{self, PeriodTotals};
use crate::analysis::{self, Correlation, EfficiencyTrend, HeartRateSpeedSummary, RunSample};
use crate::calendar::{self, Bucket, Granularity};
use crate::config::AppConfig;
use crate::error::{CalculationError, DashError};
use crate::forecast::{self, TrendForecast};
use crate::models::{ActivitySet, DateRange, Discipline};
use crate::races::{CategoryGroup, DistanceCategory, Leg, RaceBook, RacePaces, RaceResult};
use crate::zones::ZoneTable;

/// A report section: a value, or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    Unavailable(String),
}

impl<T> Section<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Unavailable(_) => None,
        }
    }

    fn from_result(name: &str, result: Result<T, CalculationError>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => {
                let error = DashError::Calculation(e);
                error.log(name);
                Section::Unavailable(error.user_message())
            }
        }
    }
}

/// Tunables for one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub forecast_weeks: u32,
    pub efficiency_horizon_days: u32,
    pub trailing_months: u32,
    pub zones: ZoneTable,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            forecast_weeks: forecast::DEFAULT_FORECAST_PERIODS,
            efficiency_horizon_days: 0,
            trailing_months: 12,
            zones: ZoneTable::default(),
        }
    }
}

impl From<&AppConfig> for ReportOptions {
    fn from(config: &AppConfig) -> Self {
        ReportOptions {
            forecast_weeks: config.analysis.forecast_weeks,
            efficiency_horizon_days: config.analysis.efficiency_horizon_days,
            trailing_months: config.analysis.trailing_months,
            zones: config.zones.clone(),
        }
    }
}

/// Running distance by calendar bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    pub yearly: Vec<Bucket>,
    pub monthly: Vec<Bucket>,
    pub weekly: Vec<Bucket>,
    /// Calendar months ending with the anchor month, gaps as zero
    pub trailing: Vec<Bucket>,
}

/// One race result with derived paces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceLine {
    pub event: String,
    pub year: i32,
    pub category: String,
    pub swim: String,
    pub swim_delta: Option<String>,
    pub bike: String,
    pub bike_delta: Option<String>,
    pub run: String,
    pub run_delta: Option<String>,
    pub finish: String,
    pub finish_delta: Option<String>,
    pub paces: RacePaces,
}

impl From<&RaceResult> for RaceLine {
    fn from(result: &RaceResult) -> Self {
        RaceLine {
            event: result.event.clone(),
            year: result.year,
            category: result.category.to_string(),
            swim: result.split_text(Leg::Swim),
            swim_delta: result.swim_delta.clone().filter(|d| !d.trim().is_empty()),
            bike: result.split_text(Leg::Bike),
            bike_delta: result.bike_delta.clone().filter(|d| !d.trim().is_empty()),
            run: result.split_text(Leg::Run),
            run_delta: result.run_delta.clone().filter(|d| !d.trim().is_empty()),
            finish: result.split_text(Leg::Finish),
            finish_delta: result.finish_delta.clone().filter(|d| !d.trim().is_empty()),
            paces: result.paces(),
        }
    }
}

/// Results of one category; empty when no race was run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub races: Vec<RaceLine>,
}

impl From<CategoryGroup<'_>> for CategoryReport {
    fn from(group: CategoryGroup<'_>) -> Self {
        CategoryReport {
            category: group.category.to_string(),
            races: group.results.into_iter().map(RaceLine::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingLine {
    pub name: String,
    pub date: NaiveDate,
    pub category: String,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceReport {
    pub triathlon: Vec<CategoryReport>,
    pub running: Vec<CategoryReport>,
    pub other: Vec<RaceLine>,
    pub upcoming: Vec<UpcomingLine>,
}

/// Zone table with the share of runs per zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub test_date: Option<NaiveDate>,
    pub runs: usize,
    pub zones: Vec<ZoneLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneLine {
    pub name: String,
    pub intensity: String,
    pub heart_rate: String,
    pub hr_percent: String,
    pub pace: String,
    pub sessions: usize,
    pub percent: f64,
}

pub fn totals_section(set: &ActivitySet, range: DateRange) -> Section<PeriodTotals> {
    Section::from_result("totals", aggregation::period_totals(set, range))
}

/// Calendar volume over the whole history; the trailing window ends with
/// the month of `anchor`.
pub fn volume_section(set: &ActivitySet, anchor: NaiveDate, months: u32) -> Section<VolumeReport> {
    let runs: Vec<_> = set.of_discipline(Discipline::Running).collect();
    let monthly = calendar::bucket_distance(runs.iter().copied(), Granularity::Month);
    if monthly.is_empty() {
        return Section::from_result("volume", Err(CalculationError::no_data("running volume")));
    }

    Section::Ready(VolumeReport {
        yearly: calendar::bucket_distance(runs.iter().copied(), Granularity::Year),
        weekly: calendar::bucket_distance(runs.iter().copied(), Granularity::Week),
        trailing: calendar::trailing_months(&monthly, anchor, months),
        monthly,
    })
}

pub fn races_section(book: Option<&RaceBook>, today: NaiveDate) -> Section<RaceReport> {
    let Some(book) = book else {
        return Section::Unavailable("No race book available.".to_string());
    };

    Section::Ready(RaceReport {
        triathlon: book
            .group(&DistanceCategory::TRIATHLON)
            .into_iter()
            .map(CategoryReport::from)
            .collect(),
        running: book
            .group(&DistanceCategory::RUNNING)
            .into_iter()
            .map(CategoryReport::from)
            .collect(),
        other: book.uncategorized().into_iter().map(RaceLine::from).collect(),
        upcoming: book
            .countdown(today)
            .into_iter()
            .map(|(race, days_remaining)| UpcomingLine {
                name: race.name.clone(),
                date: race.date,
                category: race.category.to_string(),
                days_remaining,
            })
            .collect(),
    })
}

pub fn heart_rate_speed_section(samples: &[RunSample]) -> Section<HeartRateSpeedSummary> {
    Section::from_result("heart rate and speed", analysis::summarize(samples))
}

pub fn correlation_section(samples: &[RunSample]) -> Section<Correlation> {
    Section::from_result("correlation", analysis::correlation(samples))
}

pub fn efficiency_section(samples: &[RunSample], horizon_days: u32) -> Section<EfficiencyTrend> {
    Section::from_result("efficiency", analysis::efficiency_trend(samples, horizon_days))
}

pub fn forecast_section(set: &ActivitySet, range: DateRange, weeks: u32) -> Section<TrendForecast> {
    Section::from_result("forecast", forecast::weekly_volume_forecast(set, range, weeks))
}

pub fn zones_section(samples: &[RunSample], table: &ZoneTable) -> Section<ZoneReport> {
    if let Err(e) = table.validate() {
        return Section::Unavailable(e.user_message());
    }

    let distribution = table.distribution(samples);
    Section::Ready(ZoneReport {
        test_date: table.test_date,
        runs: samples.len(),
        zones: table
            .zones
            .iter()
            .zip(distribution)
            .enumerate()
            .map(|(i, (zone, count))| ZoneLine {
                name: zone.name.clone(),
                intensity: zone.intensity.clone(),
                heart_rate: table.range_text(i),
                hr_percent: zone.hr_percent.clone(),
                pace: zone.pace.clone(),
                sessions: count.sessions,
                percent: count.percent,
            })
            .collect(),
    })
}

/// Every section of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generated_on: NaiveDate,
    pub range: DateRange,
    pub activities: usize,
    pub totals: Section<PeriodTotals>,
    pub volume: Section<VolumeReport>,
    pub races: Section<RaceReport>,
    pub heart_rate_speed: Section<HeartRateSpeedSummary>,
    pub correlation: Section<Correlation>,
    pub efficiency: Section<EfficiencyTrend>,
    pub forecast: Section<TrendForecast>,
    pub zones: Section<ZoneReport>,
}

impl DashboardReport {
    #[instrument(skip_all, fields(range = %range, activities = set.len()))]
    pub fn build(
        set: &ActivitySet,
        book: Option<&RaceBook>,
        range: DateRange,
        today: NaiveDate,
        options: &ReportOptions,
    ) -> Self {
        let samples = analysis::qualifying_runs(set, range);
        info!(qualifying_runs = samples.len(), "Building dashboard report");

        DashboardReport {
            generated_on: today,
            range,
            activities: set.len(),
            totals: totals_section(set, range),
            volume: volume_section(set, range.end, options.trailing_months),
            races: races_section(book, today),
            heart_rate_speed: heart_rate_speed_section(&samples),
            correlation: correlation_section(&samples),
            efficiency: efficiency_section(&samples, options.efficiency_horizon_days),
            forecast: forecast_section(set, range, options.forecast_weeks),
            zones: zones_section(&samples, &options.zones),
        }
    }

    /// Number of sections with a value
    pub fn ready_sections(&self) -> usize {
        [
            self.totals.is_ready(),
            self.volume.is_ready(),
            self.races.is_ready(),
            self.heart_rate_speed.is_ready(),
            self.correlation.is_ready(),
            self.efficiency.is_ready(),
            self.forecast.is_ready(),
            self.zones.is_ready(),
        ]
        .iter()
        .filter(|ready| **ready)
        .count()
    }
}
