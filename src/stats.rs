//! Descriptive statistics used across the report
//!
//! Min-max normalization, Pearson correlation and ordinary least squares.
//! Degenerate input never panics: constant series normalize to 0.5, and
//! correlation or regression over too few points is reported to the caller.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::CalculationError;

/// Minimum number of distinct index values before a trend is fitted
pub const MIN_TREND_POINTS: usize = 3;

/// Value assigned to every element of a constant series
pub const CONSTANT_SERIES_VALUE: f64 = 0.5;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Scale a series to [0, 1]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = Statistics::min(values.iter());
    let max = Statistics::max(values.iter());
    let span = max - min;

    if span == 0.0 || !span.is_finite() {
        return vec![CONSTANT_SERIES_VALUE; values.len()];
    }

    values.iter().map(|v| (v - min) / span).collect()
}

/// Pearson correlation coefficient.
///
/// `None` when the series differ in length, have fewer than two points, or
/// either has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let sx = xs.iter().std_dev();
    let sy = ys.iter().std_dev();
    if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
        return None;
    }

    let r = xs.iter().covariance(ys.iter()) / (sx * sy);
    Some(r.clamp(-1.0, 1.0))
}

/// Presentation band of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationBand {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationBand {
    /// Band by absolute value: strong from 0.7, moderate from 0.4
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r >= 0.7 {
            CorrelationBand::Strong
        } else if r >= 0.4 {
            CorrelationBand::Moderate
        } else {
            CorrelationBand::Weak
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CorrelationBand::Strong => "strong",
            CorrelationBand::Moderate => "moderate",
            CorrelationBand::Weak => "weak",
        }
    }
}

/// Ordinary least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the line was fitted on
    pub points: usize,
}

impl LinearFit {
    /// Fit a line through `(x, y)` points.
    ///
    /// Needs at least [`MIN_TREND_POINTS`] distinct x values.
    pub fn fit(calculation: &str, points: &[(f64, f64)]) -> Result<Self, CalculationError> {
        let mut distinct: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();

        if distinct.len() < MIN_TREND_POINTS {
            return Err(CalculationError::insufficient(
                calculation,
                MIN_TREND_POINTS,
                distinct.len(),
            ));
        }

        let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        let x_mean = xs.iter().mean();
        let y_mean = ys.iter().mean();

        let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
            let dx = x - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

        if den == 0.0 {
            return Err(CalculationError::Degenerate {
                calculation: calculation.to_string(),
                reason: "zero variance in time index".to_string(),
            });
        }

        let slope = num / den;
        Ok(LinearFit {
            slope,
            intercept: y_mean - slope * x_mean,
            points: points.len(),
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_range() {
        let norm = min_max_normalize(&[140.0, 150.0, 160.0]);
        assert_eq!(norm, vec![0.0, 0.5, 1.0]);
        assert_eq!(min_max_normalize(&[5.0, -5.0, 0.0]), vec![1.0, 0.0, 0.5]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_normalize_constant_series() {
        assert_eq!(min_max_normalize(&[7.0]), vec![0.5]);
        assert_eq!(min_max_normalize(&[3.0, 3.0, 3.0, 3.0]), vec![0.5; 4]);
    }

    #[test]
    fn test_linear_fit_recovers_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let fit = LinearFit::fit("test", &points).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept - 1.0).abs() < EPS);
        assert!((fit.predict(12.0) - 25.0).abs() < EPS);
        assert_eq!(fit.points, 10);
    }

    #[test]
    fn test_linear_fit_needs_three_distinct_points() {
        let err = LinearFit::fit("trend", &[(0.0, 1.0), (1.0, 2.0)]).unwrap_err();
        assert_eq!(err, CalculationError::insufficient("trend", 3, 2));

        // Repeated x values do not count twice
        let err = LinearFit::fit("trend", &[(0.0, 1.0), (0.0, 2.0), (1.0, 3.0), (1.0, 4.0)])
            .unwrap_err();
        assert!(matches!(err, CalculationError::InsufficientData { actual: 2, .. }));

        assert!(LinearFit::fit("trend", &[]).is_err());
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let r = pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((r - 1.0).abs() < EPS);

        let r = pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!((r + 1.0).abs() < EPS);

        assert_eq!(pearson(&xs, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&xs, &[1.0, 2.0]), None);
    }

    #[test]
    fn test_correlation_bands() {
        assert_eq!(CorrelationBand::from_coefficient(0.7), CorrelationBand::Strong);
        assert_eq!(CorrelationBand::from_coefficient(-0.85), CorrelationBand::Strong);
        assert_eq!(CorrelationBand::from_coefficient(0.4), CorrelationBand::Moderate);
        assert_eq!(CorrelationBand::from_coefficient(-0.39), CorrelationBand::Weak);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[140.0, 150.0]), Some(145.0));
    }

    proptest! {
        #[test]
        fn test_normalized_values_in_unit_interval(values in proptest::collection::vec(-1000.0f64..1000.0, 1..50)) {
            for v in min_max_normalize(&values) {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        #[test]
        fn test_constant_series_any_length(value in -500.0f64..500.0, len in 1usize..40) {
            let norm = min_max_normalize(&vec![value; len]);
            prop_assert_eq!(norm, vec![0.5; len]);
        }

        #[test]
        fn test_fit_recovers_slope(slope in -5.0f64..5.0, intercept in -50.0f64..50.0) {
            let points: Vec<(f64, f64)> = (0..8).map(|x| (x as f64, slope * x as f64 + intercept)).collect();
            let fit = LinearFit::fit("prop", &points).unwrap();
            prop_assert!((fit.slope - slope).abs() < 1e-6);
            prop_assert!((fit.intercept - intercept).abs() < 1e-6);
        }
    }
}
