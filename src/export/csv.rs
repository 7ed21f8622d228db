use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;
use std::io;
use std::path::Path;

use super::ExportError;
use crate::calendar::Bucket;
use crate::models::SeriesPoint;
use crate::report::{DashboardReport, Section};

/// One value of a labeled series in long format
#[derive(Debug, Serialize)]
struct SeriesRow<'a> {
    series: &'a str,
    date: NaiveDate,
    label: String,
    value: f64,
}

/// Export every numeric series of the report as `series,date,label,value`
pub fn export_series<P: AsRef<Path>>(
    report: &DashboardReport,
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(output_path)?;
    write_series(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

/// Same as [`export_series`] into any writer
pub fn write_series<W: io::Write>(
    writer: &mut Writer<W>,
    report: &DashboardReport,
) -> Result<(), ExportError> {
    if let Section::Ready(totals) = &report.totals {
        for aggregate in &totals.disciplines {
            writer.serialize(SeriesRow {
                series: "total_distance_km",
                date: totals.range.end,
                label: aggregate.discipline.to_string(),
                value: aggregate.distance_km,
            })?;
            writer.serialize(SeriesRow {
                series: "total_duration_s",
                date: totals.range.end,
                label: aggregate.discipline.to_string(),
                value: aggregate.duration_s,
            })?;
        }
    }

    if let Section::Ready(volume) = &report.volume {
        write_buckets(writer, "volume_yearly_km", &volume.yearly)?;
        write_buckets(writer, "volume_monthly_km", &volume.monthly)?;
        write_buckets(writer, "volume_weekly_km", &volume.weekly)?;
        write_buckets(writer, "volume_trailing_km", &volume.trailing)?;
    }

    if let Section::Ready(summary) = &report.heart_rate_speed {
        for sample in &summary.samples {
            let label = sample.start_time.format("%H:%M").to_string();
            writer.serialize(SeriesRow {
                series: "run_heart_rate",
                date: sample.date(),
                label: label.clone(),
                value: sample.heart_rate,
            })?;
            writer.serialize(SeriesRow {
                series: "run_speed_kmh",
                date: sample.date(),
                label,
                value: sample.speed_kmh,
            })?;
        }
    }

    if let Section::Ready(efficiency) = &report.efficiency {
        write_points(writer, "efficiency_daily", &efficiency.daily)?;
        if let Some(trend) = &efficiency.trend {
            write_points(writer, "efficiency_fitted", &trend.fitted)?;
            write_points(writer, "efficiency_projected", &trend.projected)?;
        }
    }

    if let Section::Ready(forecast) = &report.forecast {
        write_points(writer, "forecast_observed_km", &forecast.observed)?;
        write_points(writer, "forecast_fitted_km", &forecast.fitted)?;
        write_points(writer, "forecast_projected_km", &forecast.projected)?;
    }

    Ok(())
}

fn write_buckets<W: io::Write>(
    writer: &mut Writer<W>,
    series: &str,
    buckets: &[Bucket],
) -> Result<(), ExportError> {
    for bucket in buckets {
        writer.serialize(SeriesRow {
            series,
            date: bucket.start,
            label: bucket.label.clone(),
            value: bucket.distance_km,
        })?;
    }
    Ok(())
}

fn write_points<W: io::Write>(
    writer: &mut Writer<W>,
    series: &str,
    points: &[SeriesPoint],
) -> Result<(), ExportError> {
    for point in points {
        writer.serialize(SeriesRow {
            series,
            date: point.date,
            label: point.date.format("%d.%m.%Y").to_string(),
            value: point.value,
        })?;
    }
    Ok(())
}
