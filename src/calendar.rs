//! Calendar bucketing of training distance
//!
//! Activities are summed into fixed calendar buckets (year, month, ISO week
//! or day). Each bucket is keyed by its first day so series of different
//! granularity share one representation and sort chronologically.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Activity, SeriesPoint};

/// Calendar bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    /// ISO week, Monday start
    Week,
    Day,
}

impl Granularity {
    /// First day of the bucket containing `date`
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Year => NaiveDate::from_yo_opt(date.year(), 1).unwrap_or(date),
            Granularity::Month => date.with_day(1).unwrap_or(date),
            Granularity::Week => {
                let offset = date.weekday().num_days_from_monday() as u64;
                date.checked_sub_days(Days::new(offset)).unwrap_or(date)
            }
            Granularity::Day => date,
        }
    }

    /// First day of the bucket after the one starting at `start`
    pub fn next(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Year => start.checked_add_months(Months::new(12)),
            Granularity::Month => start.checked_add_months(Months::new(1)),
            Granularity::Week => start.checked_add_days(Days::new(7)),
            Granularity::Day => start.checked_add_days(Days::new(1)),
        }
    }

    /// First day of the bucket `count` buckets before the one starting at `start`
    pub fn back(&self, start: NaiveDate, count: u32) -> Option<NaiveDate> {
        match self {
            Granularity::Year => start.checked_sub_months(Months::new(12 * count)),
            Granularity::Month => start.checked_sub_months(Months::new(count)),
            Granularity::Week => start.checked_sub_days(Days::new(7 * count as u64)),
            Granularity::Day => start.checked_sub_days(Days::new(count as u64)),
        }
    }

    /// Whole buckets between two bucket starts
    pub fn periods_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        match self {
            Granularity::Year => (to.year() - from.year()) as i64,
            Granularity::Month => {
                (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64
            }
            Granularity::Week => (to - from).num_days().div_euclid(7),
            Granularity::Day => (to - from).num_days(),
        }
    }

    /// Display label of the bucket starting at `start`
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Granularity::Year => start.year().to_string(),
            Granularity::Month => start.format("%b %Y").to_string(),
            Granularity::Week => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Granularity::Day => start.format("%d.%m.%Y").to_string(),
        }
    }
}

/// Summed distance of one calendar bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: NaiveDate,
    pub label: String,
    pub distance_km: f64,
    pub sessions: usize,
}

impl Bucket {
    fn empty(granularity: Granularity, start: NaiveDate) -> Self {
        Bucket {
            start,
            label: granularity.label(start),
            distance_km: 0.0,
            sessions: 0,
        }
    }
}

/// Sum distance per bucket; sessions without a distance are left out.
///
/// Only buckets with at least one session appear, in chronological order.
pub fn bucket_distance<'a, I>(activities: I, granularity: Granularity) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for activity in activities {
        let Some(km) = activity.distance_km() else {
            continue;
        };
        let start = granularity.bucket_start(activity.date());
        let bucket = buckets
            .entry(start)
            .or_insert_with(|| Bucket::empty(granularity, start));
        bucket.distance_km += km;
        bucket.sessions += 1;
    }

    buckets.into_values().collect()
}

/// Reindex `buckets` onto `count` consecutive buckets starting at `first`,
/// filling missing ones with zero distance.
pub fn reindex(
    buckets: &[Bucket],
    granularity: Granularity,
    first: NaiveDate,
    count: usize,
) -> Vec<Bucket> {
    let by_start: BTreeMap<NaiveDate, &Bucket> = buckets.iter().map(|b| (b.start, b)).collect();

    let mut result = Vec::with_capacity(count);
    let mut current = Some(granularity.bucket_start(first));
    while result.len() < count {
        let Some(start) = current else {
            break;
        };
        let bucket = by_start
            .get(&start)
            .map(|b| (*b).clone())
            .unwrap_or_else(|| Bucket::empty(granularity, start));
        result.push(bucket);
        current = granularity.next(start);
    }

    result
}

/// The `months` calendar months ending with the month of `anchor`.
pub fn trailing_months(monthly: &[Bucket], anchor: NaiveDate, months: u32) -> Vec<Bucket> {
    if months == 0 {
        return Vec::new();
    }
    let last = Granularity::Month.bucket_start(anchor);
    let first = Granularity::Month.back(last, months - 1).unwrap_or(last);
    reindex(monthly, Granularity::Month, first, months as usize)
}

/// Contiguous series from the first to the last bucket, gaps as zero.
pub fn contiguous(buckets: &[Bucket], granularity: Granularity) -> Vec<Bucket> {
    match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => {
            let count = granularity.periods_between(first.start, last.start) + 1;
            reindex(buckets, granularity, first.start, count.max(0) as usize)
        }
        _ => Vec::new(),
    }
}

/// Distance values of a bucket series as labeled points
pub fn to_series(buckets: &[Bucket]) -> Vec<SeriesPoint> {
    buckets
        .iter()
        .map(|b| SeriesPoint::new(b.start, b.distance_km))
        .collect()
}
