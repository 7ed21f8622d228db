//! Per-period totals for the three triathlon disciplines

use serde::{Deserialize, Serialize};

use crate::error::CalculationError;
use crate::models::{ActivitySet, DateRange, Discipline};
use crate::units;

/// Session count, distance and time of one discipline within a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub discipline: Discipline,
    pub sessions: usize,
    pub distance_km: f64,
    pub duration_s: f64,
}

impl PeriodAggregate {
    pub fn empty(discipline: Discipline) -> Self {
        PeriodAggregate {
            discipline,
            sessions: 0,
            distance_km: 0.0,
            duration_s: 0.0,
        }
    }

    /// Total time as `HH:MM:SS`
    pub fn duration_text(&self) -> String {
        units::format_seconds(Some(self.duration_s))
    }

    /// Distance with the precision shown on the dashboard
    pub fn distance_text(&self) -> String {
        match self.discipline {
            Discipline::LapSwimming => format!("{:.1} km", self.distance_km),
            _ => format!("{:.0} km", self.distance_km),
        }
    }
}

/// Sum one discipline over an inclusive date range
pub fn aggregate(set: &ActivitySet, discipline: Discipline, range: DateRange) -> PeriodAggregate {
    set.in_range(discipline, range)
        .fold(PeriodAggregate::empty(discipline), |mut acc, activity| {
            acc.sessions += 1;
            acc.distance_km += activity.distance_km().unwrap_or(0.0);
            acc.duration_s += activity.duration_s.unwrap_or(0.0);
            acc
        })
}

/// Totals of swim, bike and run for one range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub range: DateRange,
    pub disciplines: Vec<PeriodAggregate>,
}

impl PeriodTotals {
    pub fn get(&self, discipline: Discipline) -> Option<&PeriodAggregate> {
        self.disciplines.iter().find(|a| a.discipline == discipline)
    }

    pub fn total_sessions(&self) -> usize {
        self.disciplines.iter().map(|a| a.sessions).sum()
    }

    pub fn total_duration_s(&self) -> f64 {
        self.disciplines.iter().map(|a| a.duration_s).sum()
    }
}

/// Compute the three triathlon disciplines independently.
///
/// Fails with `NoData` when the range holds no triathlon session at all.
pub fn period_totals(
    set: &ActivitySet,
    range: DateRange,
) -> Result<PeriodTotals, CalculationError> {
    let totals = PeriodTotals {
        range,
        disciplines: Discipline::TRIATHLON
            .iter()
            .map(|d| aggregate(set, *d, range))
            .collect(),
    };

    if totals.total_sessions() == 0 {
        return Err(CalculationError::no_data("period totals"));
    }
    Ok(totals)
}
