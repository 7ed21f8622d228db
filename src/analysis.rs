//! Heart rate versus speed analysis of running sessions
//!
//! Only qualifying runs take part: running sessions with an average heart
//! rate, a distance and a positive duration. Correlation and efficiency are
//! computed from the same samples but reported independently.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::Granularity;
use crate::error::CalculationError;
use crate::forecast::TrendForecast;
use crate::models::{ActivitySet, DateRange, Discipline, SeriesPoint};
use crate::stats::{self, CorrelationBand};

/// Heart rate and speed of one qualifying run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    pub start_time: NaiveDateTime,
    pub heart_rate: f64,
    pub speed_kmh: f64,
}

impl RunSample {
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }
}

/// Qualifying runs in `range`, chronological
pub fn qualifying_runs(set: &ActivitySet, range: DateRange) -> Vec<RunSample> {
    set.in_range(Discipline::Running, range)
        .filter_map(|activity| {
            let heart_rate = activity.avg_heart_rate.filter(|hr| *hr > 0.0)?;
            let speed_kmh = activity.speed_kmh()?;
            Some(RunSample {
                start_time: activity.start_time,
                heart_rate,
                speed_kmh,
            })
        })
        .collect()
}

/// One run on the shared 0..1 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub start_time: NaiveDateTime,
    pub heart_rate: f64,
    pub speed: f64,
}

impl NormalizedSample {
    /// Speed gained relative to heart rate
    pub fn efficiency(&self) -> f64 {
        self.speed - self.heart_rate
    }
}

/// Raw and normalized heart rate and speed series with their means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSpeedSummary {
    pub samples: Vec<RunSample>,
    pub mean_heart_rate: f64,
    pub mean_speed_kmh: f64,
    pub normalized: Vec<NormalizedSample>,
}

pub fn normalize(samples: &[RunSample]) -> Vec<NormalizedSample> {
    let hr: Vec<f64> = samples.iter().map(|s| s.heart_rate).collect();
    let speed: Vec<f64> = samples.iter().map(|s| s.speed_kmh).collect();
    let hr = stats::min_max_normalize(&hr);
    let speed = stats::min_max_normalize(&speed);

    samples
        .iter()
        .zip(hr.into_iter().zip(speed))
        .map(|(sample, (heart_rate, speed))| NormalizedSample {
            start_time: sample.start_time,
            heart_rate,
            speed,
        })
        .collect()
}

pub fn summarize(samples: &[RunSample]) -> Result<HeartRateSpeedSummary, CalculationError> {
    let hr: Vec<f64> = samples.iter().map(|s| s.heart_rate).collect();
    let speed: Vec<f64> = samples.iter().map(|s| s.speed_kmh).collect();

    let (Some(mean_heart_rate), Some(mean_speed_kmh)) = (stats::mean(&hr), stats::mean(&speed))
    else {
        return Err(CalculationError::no_data("heart rate and speed"));
    };

    Ok(HeartRateSpeedSummary {
        samples: samples.to_vec(),
        mean_heart_rate,
        mean_speed_kmh,
        normalized: normalize(samples),
    })
}

/// Pearson correlation between heart rate and speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub band: CorrelationBand,
    pub samples: usize,
}

pub fn correlation(samples: &[RunSample]) -> Result<Correlation, CalculationError> {
    if samples.len() < 2 {
        return Err(CalculationError::insufficient(
            "heart rate correlation",
            2,
            samples.len(),
        ));
    }

    let hr: Vec<f64> = samples.iter().map(|s| s.heart_rate).collect();
    let speed: Vec<f64> = samples.iter().map(|s| s.speed_kmh).collect();
    let coefficient = stats::pearson(&hr, &speed).ok_or_else(|| CalculationError::Degenerate {
        calculation: "heart rate correlation".to_string(),
        reason: "heart rate or speed is constant".to_string(),
    })?;

    Ok(Correlation {
        coefficient,
        band: CorrelationBand::from_coefficient(coefficient),
        samples: samples.len(),
    })
}

/// Per-day mean efficiency score
pub fn daily_efficiency(samples: &[RunSample]) -> Vec<SeriesPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for sample in normalize(samples) {
        let day = days.entry(sample.start_time.date()).or_insert((0.0, 0));
        day.0 += sample.efficiency();
        day.1 += 1;
    }

    days.into_iter()
        .map(|(date, (sum, count))| SeriesPoint::new(date, sum / count as f64))
        .collect()
}

/// Daily efficiency series and, given enough days, its trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTrend {
    pub daily: Vec<SeriesPoint>,
    pub trend: Option<TrendForecast>,
    /// Why no trend was fitted
    pub trend_note: Option<String>,
}

pub fn efficiency_trend(
    samples: &[RunSample],
    horizon_days: u32,
) -> Result<EfficiencyTrend, CalculationError> {
    let daily = daily_efficiency(samples);
    if daily.is_empty() {
        return Err(CalculationError::no_data("efficiency"));
    }

    let (trend, trend_note) =
        match TrendForecast::fit("efficiency trend", &daily, Granularity::Day, horizon_days) {
            Ok(trend) => (Some(trend), None),
            Err(e) => (None, Some(e.to_string())),
        };

    Ok(EfficiencyTrend {
        daily,
        trend,
        trend_note,
    })
}
