//! Terminal rendering of the dashboard
//!
//! Tables are laid out with `tabled`; headings and classification labels are
//! colored with `colored` when `styled` is set. File exports are unstyled.

use colored::*;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::ExportError;
use crate::aggregation::PeriodTotals;
use crate::analysis::{Correlation, EfficiencyTrend, HeartRateSpeedSummary};
use crate::calendar::Bucket;
use crate::forecast::{TrendDirection, TrendForecast};
use crate::report::{
    CategoryReport, DashboardReport, RaceLine, RaceReport, Section, VolumeReport, ZoneReport,
};
use crate::stats::CorrelationBand;
use crate::units;

type Out<'a> = &'a mut dyn std::fmt::Write;

/// Export the full report as plain text
pub fn export_report<P: AsRef<Path>>(
    report: &DashboardReport,
    output_path: P,
) -> Result<(), ExportError> {
    let text = render_report(report, false)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Render every section
pub fn render_report(report: &DashboardReport, styled: bool) -> Result<String, ExportError> {
    let mut out = String::new();
    writeln!(out, "{}", heading("TRIATHLON DASHBOARD", styled))?;
    writeln!(out, "Period: {}", report.range)?;
    writeln!(out, "Activities loaded: {}", report.activities)?;
    writeln!(out)?;

    render_totals(&mut out, &report.totals, styled)?;
    render_volume(&mut out, &report.volume, styled)?;
    render_races(&mut out, &report.races, styled)?;
    render_heart_rate_speed(&mut out, &report.heart_rate_speed, styled)?;
    render_correlation(&mut out, &report.correlation, styled)?;
    render_efficiency(&mut out, &report.efficiency, styled)?;
    render_forecast(&mut out, &report.forecast, styled)?;
    render_zones(&mut out, &report.zones, styled)?;
    Ok(out)
}

fn heading(text: &str, styled: bool) -> String {
    if styled {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn section_heading(out: Out<'_>, title: &str, styled: bool) -> std::fmt::Result {
    writeln!(out, "{}", heading(title, styled))?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))
}

/// The section value, or `None` after printing why it is missing
fn ready<'s, T>(
    out: Out<'_>,
    section: &'s Section<T>,
    styled: bool,
) -> Result<Option<&'s T>, std::fmt::Error> {
    match section {
        Section::Ready(value) => Ok(Some(value)),
        Section::Unavailable(message) => {
            let message = if styled {
                message.yellow().to_string()
            } else {
                message.clone()
            };
            writeln!(out, "  {}", message)?;
            writeln!(out)?;
            Ok(None)
        }
    }
}

fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct TotalsRow {
    #[tabled(rename = "Discipline")]
    discipline: &'static str,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Time")]
    time: String,
}

pub fn render_totals(
    out: Out<'_>,
    section: &Section<PeriodTotals>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "TRAINING TOTALS", styled)?;
    let Some(totals) = ready(out, section, styled)? else {
        return Ok(());
    };

    let rows = totals.disciplines.iter().map(|a| TotalsRow {
        discipline: a.discipline.label(),
        sessions: a.sessions,
        distance: a.distance_text(),
        time: a.duration_text(),
    });
    writeln!(out, "{}", table(rows))?;
    writeln!(
        out,
        "Total: {} sessions, {}",
        totals.total_sessions(),
        units::format_seconds(Some(totals.total_duration_s()))
    )?;
    writeln!(out)
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Runs")]
    sessions: usize,
    #[tabled(rename = "Distance (km)")]
    distance: String,
}

fn bucket_table(buckets: &[Bucket]) -> String {
    table(buckets.iter().map(|b| BucketRow {
        period: b.label.clone(),
        sessions: b.sessions,
        distance: format!("{:.1}", b.distance_km),
    }))
}

pub fn render_volume(
    out: Out<'_>,
    section: &Section<VolumeReport>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "RUNNING VOLUME", styled)?;
    let Some(volume) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(out, "By year")?;
    writeln!(out, "{}", bucket_table(&volume.yearly))?;
    writeln!(out, "Last {} months", volume.trailing.len())?;
    writeln!(out, "{}", bucket_table(&volume.trailing))?;

    let recent_weeks = volume.weekly.len().saturating_sub(8);
    writeln!(out, "Recent weeks")?;
    writeln!(out, "{}", bucket_table(&volume.weekly[recent_weeks..]))?;
    writeln!(out)
}

fn delta_text(delta: &Option<String>) -> String {
    delta.clone().unwrap_or_default()
}

fn render_category(
    out: Out<'_>,
    category: &CategoryReport,
    triathlon: bool,
    styled: bool,
) -> std::fmt::Result {
    let title = format!("{} ({})", category.category, category.races.len());
    writeln!(out, "{}", if styled { title.bold().to_string() } else { title })?;
    if category.races.is_empty() {
        writeln!(out, "  No races.")?;
        return Ok(());
    }
    writeln!(out, "{}", race_table(&category.races, triathlon))
}

fn race_table(races: &[RaceLine], triathlon: bool) -> String {
    let mut builder = Builder::default();
    if triathlon {
        builder.push_record([
            "Event", "Year", "Swim", "Bike", "Run", "Finish", "Swim /100 m", "Bike km/h", "Run /km",
        ]);
    } else {
        builder.push_record(["Event", "Year", "Finish", "Run /km"]);
    }

    for race in races {
        let split = |time: &str, delta: &Option<String>| {
            let delta = delta_text(delta);
            if delta.is_empty() {
                time.to_string()
            } else {
                format!("{} ({})", time, delta)
            }
        };

        if triathlon {
            builder.push_record([
                race.event.clone(),
                race.year.to_string(),
                split(&race.swim, &race.swim_delta),
                split(&race.bike, &race.bike_delta),
                split(&race.run, &race.run_delta),
                split(&race.finish, &race.finish_delta),
                race.paces.swim_per_100m.clone(),
                race.paces.bike_kmh.clone(),
                race.paces.run_per_km.clone(),
            ]);
        } else {
            builder.push_record([
                race.event.clone(),
                race.year.to_string(),
                split(&race.finish, &race.finish_delta),
                race.paces.run_per_km.clone(),
            ]);
        }
    }

    builder.build().with(Style::rounded()).to_string()
}

pub fn render_races(out: Out<'_>, section: &Section<RaceReport>, styled: bool) -> std::fmt::Result {
    section_heading(out, "RACES", styled)?;
    let Some(races) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(out, "Triathlon")?;
    for category in &races.triathlon {
        render_category(out, category, true, styled)?;
    }
    writeln!(out)?;
    writeln!(out, "Running")?;
    for category in &races.running {
        render_category(out, category, false, styled)?;
    }
    if !races.other.is_empty() {
        writeln!(out, "Other")?;
        writeln!(out, "{}", race_table(&races.other, false))?;
    }
    writeln!(out)?;

    writeln!(out, "Upcoming")?;
    if races.upcoming.is_empty() {
        writeln!(out, "  No upcoming races.")?;
    }
    for race in &races.upcoming {
        let countdown = match race.days_remaining {
            d if d > 0 => format!("{} days to go", d),
            0 => "race day".to_string(),
            d => format!("{} days ago", -d),
        };
        let countdown = if styled { countdown.green().to_string() } else { countdown };
        writeln!(
            out,
            "  {} - {} ({}): {}",
            race.date.format("%d.%m.%Y"),
            race.name,
            race.category,
            countdown
        )?;
    }
    writeln!(out)
}

pub fn render_heart_rate_speed(
    out: Out<'_>,
    section: &Section<HeartRateSpeedSummary>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "HEART RATE AND SPEED", styled)?;
    let Some(summary) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(out, "Runs: {}", summary.samples.len())?;
    writeln!(out, "Mean heart rate: {:.0} bpm", summary.mean_heart_rate)?;
    writeln!(out, "Mean speed: {:.2} km/h", summary.mean_speed_kmh)?;

    let mut builder = Builder::default();
    builder.push_record(["Date", "HR (bpm)", "Speed (km/h)", "HR norm", "Speed norm"]);
    for (sample, norm) in summary.samples.iter().zip(&summary.normalized).rev().take(10) {
        builder.push_record([
            sample.start_time.format("%d.%m.%Y").to_string(),
            format!("{:.0}", sample.heart_rate),
            format!("{:.2}", sample.speed_kmh),
            format!("{:.2}", norm.heart_rate),
            format!("{:.2}", norm.speed),
        ]);
    }
    writeln!(out, "{}", builder.build().with(Style::rounded()))?;
    writeln!(out)
}

fn band_text(band: CorrelationBand, styled: bool) -> String {
    let text = band.description();
    if !styled {
        return text.to_string();
    }
    match band {
        CorrelationBand::Strong => text.green().bold().to_string(),
        CorrelationBand::Moderate => text.yellow().bold().to_string(),
        CorrelationBand::Weak => text.red().bold().to_string(),
    }
}

pub fn render_correlation(
    out: Out<'_>,
    section: &Section<Correlation>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "CORRELATION", styled)?;
    let Some(correlation) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(
        out,
        "Pearson r (heart rate vs. speed): {:.2}, {} ({} runs)",
        correlation.coefficient,
        band_text(correlation.band, styled),
        correlation.samples
    )?;
    writeln!(out)
}

fn direction_text(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Rising => "rising",
        TrendDirection::Falling => "falling",
        TrendDirection::Flat => "flat",
    }
}

pub fn render_efficiency(
    out: Out<'_>,
    section: &Section<EfficiencyTrend>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "EFFICIENCY", styled)?;
    let Some(efficiency) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(out, "Days with qualifying runs: {}", efficiency.daily.len())?;
    if let Some(last) = efficiency.daily.last() {
        writeln!(out, "Latest score: {:+.3} ({})", last.value, last.date.format("%d.%m.%Y"))?;
    }
    match (&efficiency.trend, &efficiency.trend_note) {
        (Some(trend), _) => writeln!(
            out,
            "Trend: {} ({:+.4} per day)",
            direction_text(trend.direction()),
            trend.fit.slope
        )?,
        (None, Some(note)) => writeln!(out, "Trend: {}", note)?,
        (None, None) => {}
    }
    writeln!(out)
}

pub fn render_forecast(
    out: Out<'_>,
    section: &Section<TrendForecast>,
    styled: bool,
) -> std::fmt::Result {
    section_heading(out, "WEEKLY VOLUME FORECAST", styled)?;
    let Some(forecast) = ready(out, section, styled)? else {
        return Ok(());
    };

    writeln!(
        out,
        "Trend over {} weeks: {} ({:+.2} km per week)",
        forecast.observed.len(),
        direction_text(forecast.direction()),
        forecast.fit.slope
    )?;

    let mut builder = Builder::default();
    builder.push_record(["Week starting", "Projected km"]);
    for point in &forecast.projected {
        builder.push_record([
            point.date.format("%d.%m.%Y").to_string(),
            format!("{:.1}", point.value.max(0.0)),
        ]);
    }
    writeln!(out, "{}", builder.build().with(Style::rounded()))?;
    writeln!(out)
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "HR (bpm)")]
    heart_rate: String,
    #[tabled(rename = "HR %")]
    hr_percent: String,
    #[tabled(rename = "Pace (min/km)")]
    pace: String,
    #[tabled(rename = "Runs")]
    sessions: usize,
    #[tabled(rename = "Share")]
    share: String,
}

pub fn render_zones(out: Out<'_>, section: &Section<ZoneReport>, styled: bool) -> std::fmt::Result {
    section_heading(out, "HEART RATE ZONES", styled)?;
    let Some(zones) = ready(out, section, styled)? else {
        return Ok(());
    };

    if let Some(date) = zones.test_date {
        writeln!(out, "Performance test: {}", date.format("%d.%m.%Y"))?;
    }
    let rows = zones.zones.iter().map(|z| ZoneRow {
        name: z.name.clone(),
        intensity: z.intensity.clone(),
        heart_rate: z.heart_rate.clone(),
        hr_percent: z.hr_percent.clone(),
        pace: z.pace.clone(),
        sessions: z.sessions,
        share: format!("{:.0} %", z.percent),
    });
    writeln!(out, "{}", table(rows))?;
    writeln!(out, "Runs classified: {}", zones.runs)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivitySet, DateRange};
    use crate::races::RaceBook;
    use crate::report::{races_section, ReportOptions};
    use chrono::NaiveDate;

    #[test]
    fn test_unavailable_section_prints_reason() {
        let mut out = String::new();
        let section: Section<PeriodTotals> = Section::Unavailable("No data available for period totals.".to_string());
        render_totals(&mut out, &section, false).unwrap();
        assert!(out.contains("TRAINING TOTALS"));
        assert!(out.contains("No data available for period totals."));
    }

    #[test]
    fn test_races_render_paces_and_empty_categories() {
        let book = RaceBook::builtin().unwrap();
        let section = races_section(Some(&book), NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        let mut out = String::new();
        render_races(&mut out, &section, false).unwrap();

        assert!(out.contains("27. Willicher Triathlon"));
        assert!(out.contains("00:11:06 (+ 00:00:57)"));
        assert!(out.contains("34.0"));
        assert!(out.contains("No races."));
        assert!(out.contains("6 days to go"));
    }

    #[test]
    fn test_render_report_without_styling() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = DashboardReport::build(
            &ActivitySet::default(),
            None,
            DateRange::new(day, day).unwrap(),
            day,
            &ReportOptions::default(),
        );
        let text = render_report(&report, false).unwrap();
        assert!(text.contains("TRIATHLON DASHBOARD"));
        assert!(text.contains("No race book available."));
        assert!(!text.contains('\u{1b}'));
    }
}
