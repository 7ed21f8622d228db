use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::RunSample;
use crate::error::{DashError, Result};

/// One heart-rate training band from a performance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZone {
    pub name: String,
    pub intensity: String,
    /// Highest bpm in this zone (inclusive); `None` for the top zone
    pub max_bpm: Option<u16>,
    /// Share of maximum heart rate, as printed on the test sheet
    pub hr_percent: String,
    /// Running pace band in min/km
    pub pace: String,
}

impl HeartRateZone {
    fn new(
        name: &str,
        intensity: &str,
        max_bpm: Option<u16>,
        hr_percent: &str,
        pace: &str,
    ) -> Self {
        HeartRateZone {
            name: name.to_string(),
            intensity: intensity.to_string(),
            max_bpm,
            hr_percent: hr_percent.to_string(),
            pace: pace.to_string(),
        }
    }
}

/// Ordered zone table, lowest zone first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable {
    /// Date of the performance test the zones come from
    pub test_date: Option<NaiveDate>,
    pub zones: Vec<HeartRateZone>,
}

impl Default for ZoneTable {
    fn default() -> Self {
        ZoneTable {
            test_date: NaiveDate::from_ymd_opt(2024, 8, 28),
            zones: vec![
                HeartRateZone::new("ReKom", "Very easy", Some(132), "50 - 77 %", "> 05:53"),
                HeartRateZone::new("GA 1", "Easy", Some(138), "78 - 80 %", "05:53 - 05:33"),
                HeartRateZone::new("GA 1/2", "Moderate", Some(148), "81 - 86 %", "05:32 - 04:57"),
                HeartRateZone::new("GA 2", "Hard", Some(157), "87 - 91 %", "04:56 - 04:31"),
                HeartRateZone::new("WSA", "Very hard", None, "92 - 100 %", "< 04:31"),
            ],
        }
    }
}

impl ZoneTable {
    /// Zone bounds must rise strictly and only the last zone may be open.
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(DashError::Configuration(
                "Zone table must contain at least one zone".to_string(),
            ));
        }

        let last = self.zones.len() - 1;
        let mut previous: Option<u16> = None;
        for (i, zone) in self.zones.iter().enumerate() {
            match zone.max_bpm {
                None if i != last => {
                    return Err(DashError::Configuration(format!(
                        "Zone '{}' has no upper bound but is not the highest zone",
                        zone.name
                    )))
                }
                Some(max) if previous.map_or(false, |p| max <= p) => {
                    return Err(DashError::Configuration(format!(
                        "Zone '{}' upper bound {} does not exceed the zone below",
                        zone.name, max
                    )))
                }
                _ => previous = zone.max_bpm,
            }
        }
        Ok(())
    }

    /// Lower bound of zone `index` (inclusive)
    pub fn min_bpm(&self, index: usize) -> Option<u16> {
        index
            .checked_sub(1)
            .and_then(|i| self.zones.get(i))
            .and_then(|z| z.max_bpm)
            .map(|max| max.saturating_add(1))
    }

    /// Bpm range text such as `< 133`, `133 - 138` or `> 157`
    pub fn range_text(&self, index: usize) -> String {
        let Some(zone) = self.zones.get(index) else {
            return String::new();
        };
        match (self.min_bpm(index), zone.max_bpm) {
            (None, Some(max)) => format!("< {}", max.saturating_add(1)),
            (Some(min), Some(max)) => format!("{} - {}", min, max),
            (Some(min), None) => format!("> {}", min.saturating_sub(1)),
            (None, None) => "any".to_string(),
        }
    }

    /// Index of the zone an average heart rate falls into
    pub fn classify(&self, heart_rate: f64) -> Option<usize> {
        if !heart_rate.is_finite() || heart_rate <= 0.0 {
            return None;
        }
        let bpm = heart_rate.round();
        self.zones
            .iter()
            .position(|z| z.max_bpm.map_or(true, |max| bpm <= max as f64))
    }

    /// Count runs per zone
    pub fn distribution(&self, samples: &[RunSample]) -> Vec<ZoneCount> {
        let mut counts = vec![0usize; self.zones.len()];
        for sample in samples {
            if let Some(idx) = self.classify(sample.heart_rate) {
                counts[idx] += 1;
            }
        }

        let total = samples.len();
        self.zones
            .iter()
            .zip(counts)
            .map(|(zone, sessions)| ZoneCount {
                zone: zone.name.clone(),
                sessions,
                percent: calculate_percentage(sessions, total),
            })
            .collect()
    }
}

/// Sessions in one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCount {
    pub zone: String,
    pub sessions: usize,
    pub percent: f64,
}

fn calculate_percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample(hr: f64) -> RunSample {
        RunSample {
            start_time: NaiveDateTime::parse_from_str("2024-09-01 07:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            heart_rate: hr,
            speed_kmh: 10.0,
        }
    }

    #[test]
    fn test_default_table_boundaries() {
        let table = ZoneTable::default();
        table.validate().unwrap();

        assert_eq!(table.classify(132.0), Some(0));
        assert_eq!(table.classify(133.0), Some(1));
        assert_eq!(table.classify(138.4), Some(1));
        assert_eq!(table.classify(148.0), Some(2));
        assert_eq!(table.classify(157.0), Some(3));
        assert_eq!(table.classify(158.0), Some(4));
        assert_eq!(table.classify(0.0), None);
    }

    #[test]
    fn test_range_text() {
        let table = ZoneTable::default();
        assert_eq!(table.range_text(0), "< 133");
        assert_eq!(table.range_text(1), "133 - 138");
        assert_eq!(table.range_text(4), "> 157");
    }

    #[test]
    fn test_range_text_at_bpm_limit() {
        let mut table = ZoneTable::default();
        table.zones[3].max_bpm = Some(u16::MAX);
        table.validate().unwrap();

        assert_eq!(table.min_bpm(4), Some(u16::MAX));
        assert_eq!(table.range_text(3), "149 - 65535");
        assert_eq!(table.range_text(4), "> 65534");

        table.zones.truncate(1);
        table.zones[0].max_bpm = Some(u16::MAX);
        assert_eq!(table.range_text(0), "< 65535");
    }

    #[test]
    fn test_distribution() {
        let table = ZoneTable::default();
        let dist = table.distribution(&[sample(130.0), sample(145.0), sample(146.0), sample(170.0)]);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[2].sessions, 2);
        assert_eq!(dist[2].percent, 50.0);
        assert_eq!(dist[3].sessions, 0);

        let empty = table.distribution(&[]);
        assert!(empty.iter().all(|z| z.percent == 0.0));
    }

    #[test]
    fn test_validate_rejects_unordered_zones() {
        let mut table = ZoneTable::default();
        table.zones[2].max_bpm = Some(135);
        assert!(table.validate().is_err());

        let mut table = ZoneTable::default();
        table.zones[1].max_bpm = None;
        assert!(table.validate().is_err());
    }
}
