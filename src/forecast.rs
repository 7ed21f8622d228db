//! Linear trends over dated series and the weekly volume forecast

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{self, Granularity};
use crate::error::CalculationError;
use crate::models::{ActivitySet, DateRange, Discipline, SeriesPoint};
use crate::stats::LinearFit;

/// Periods extrapolated when nothing else is configured
pub const DEFAULT_FORECAST_PERIODS: u32 = 4;

const FLAT_SLOPE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

/// A fitted line over a dated series plus its extrapolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub granularity: Granularity,
    pub fit: LinearFit,
    pub observed: Vec<SeriesPoint>,
    /// Line values at the observed dates
    pub fitted: Vec<SeriesPoint>,
    /// Line values for the periods after the last observation
    pub projected: Vec<SeriesPoint>,
}

impl TrendForecast {
    /// Fit `series` against periods elapsed since its first point.
    pub fn fit(
        calculation: &str,
        series: &[SeriesPoint],
        granularity: Granularity,
        horizon: u32,
    ) -> Result<Self, CalculationError> {
        let Some(first) = series.first() else {
            return Err(CalculationError::no_data(calculation));
        };

        let index = |date: NaiveDate| granularity.periods_between(first.date, date) as f64;
        let points: Vec<(f64, f64)> = series.iter().map(|p| (index(p.date), p.value)).collect();
        let fit = LinearFit::fit(calculation, &points)?;

        let fitted = series
            .iter()
            .map(|p| SeriesPoint::new(p.date, fit.predict(index(p.date))))
            .collect();

        let mut projected = Vec::with_capacity(horizon as usize);
        let mut date = series.last().map(|p| p.date).unwrap_or(first.date);
        for _ in 0..horizon {
            let Some(next) = granularity.next(date) else {
                break;
            };
            date = next;
            projected.push(SeriesPoint::new(date, fit.predict(index(date))));
        }

        debug!(
            calculation,
            slope = fit.slope,
            intercept = fit.intercept,
            points = fit.points,
            "Fitted linear trend"
        );

        Ok(TrendForecast {
            granularity,
            fit,
            observed: series.to_vec(),
            fitted,
            projected,
        })
    }

    pub fn direction(&self) -> TrendDirection {
        if self.fit.slope > FLAT_SLOPE {
            TrendDirection::Rising
        } else if self.fit.slope < -FLAT_SLOPE {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        }
    }
}

/// Weekly running distance in `range` with its trend `horizon` weeks ahead.
///
/// Weeks without a run count as zero distance.
pub fn weekly_volume_forecast(
    set: &ActivitySet,
    range: DateRange,
    horizon: u32,
) -> Result<TrendForecast, CalculationError> {
    let weekly = calendar::bucket_distance(set.in_range(Discipline::Running, range), Granularity::Week);
    if weekly.is_empty() {
        return Err(CalculationError::no_data("weekly volume forecast"));
    }

    let series = calendar::to_series(&calendar::contiguous(&weekly, Granularity::Week));
    TrendForecast::fit("weekly volume forecast", &series, Granularity::Week, horizon)
}
