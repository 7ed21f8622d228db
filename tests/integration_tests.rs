use chrono::NaiveDate;
use std::io::Write;
use tempfile::{Builder, NamedTempFile, TempDir};
use tridash::export::{self, ExportFormat};
use tridash::report::{DashboardReport, ReportOptions, Section};
use tridash::{analysis, calendar, units, ActivitySet, DateRange, Discipline, ImportManager, RaceBook};

/// End-to-end tests: activity file on disk through to the exported report

#[cfg(test)]
mod integration_tests {
    use super::*;

    const ACTIVITY_CSV: &str = "\
activityId,startTimeLocal,activityType,distance,duration,averageSpeed,averageHR,calories
1,2024-01-08 07:00:00,\"{'typeId': 1, 'typeKey': 'running', 'parentTypeId': 17, 'isHidden': False}\",8000.0,2880.0,2.78,142.0,520
2,2024-01-10 18:00:00,\"{'typeId': 2, 'typeKey': 'cycling', 'parentTypeId': 17, 'isHidden': False}\",30000.0,3600.0,8.33,128.0,700
3,2024-01-12 06:30:00,\"{'typeId': 27, 'typeKey': 'lap_swimming', 'parentTypeId': 26}\",1500.0,2100.0,0.71,,310
4,2024-01-15 07:00:00,\"{'typeId': 1, 'typeKey': 'running', 'parentTypeId': 17}\",10000.0,3300.0,3.03,148.0,640
5,2024-01-17 07:00:00,\"{'typeId': 1, 'typeKey': 'runn\",5000.0,1500.0,3.33,150.0,300
6,2024-01-22 07:00:00,\"{'typeId': 1, 'typeKey': 'running', 'parentTypeId': 17}\",12000.0,3840.0,3.13,151.0,780
7,2024-01-24 12:00:00,\"{'typeId': 9, 'typeKey': 'walking'}\",4000.0,2700.0,1.48,98.0,200
8,2024-01-29 07:00:00,\"{'typeId': 1, 'typeKey': 'running', 'parentTypeId': 17}\",14000.0,4200.0,3.33,155.0,900
9,not a timestamp,running,9000.0,2700.0,3.33,150.0,600
";

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn load_fixture() -> (NamedTempFile, ActivitySet) {
        let file = write_csv(ACTIVITY_CSV);
        let set = ImportManager::new().load(file.path()).unwrap();
        (file, set)
    }

    #[test]
    fn test_import_resolves_nested_type_literals() {
        let (_file, set) = load_fixture();

        // Row with the broken timestamp is dropped, the malformed literal is kept
        assert_eq!(set.len(), 8);
        assert_eq!(set.of_discipline(Discipline::Running).count(), 4);
        assert_eq!(set.of_discipline(Discipline::Unrecognized).count(), 2);
        assert_eq!(set.of_discipline(Discipline::LapSwimming).count(), 1);

        let bounds = set.date_bounds().unwrap();
        assert_eq!(bounds.start, date("2024-01-08"));
        assert_eq!(bounds.end, date("2024-01-29"));
    }

    #[test]
    fn test_missing_discipline_columns_abort() {
        let file = write_csv("startTimeLocal,distance,duration\n2024-01-08 07:00:00,8000,2880\n");
        let err = ImportManager::new().load(file.path()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_flattened_column_preferred_over_nested() {
        let file = write_csv(
            "startTimeLocal,activityType,activityTypeDTO.typeKey,distance,duration\n\
             2024-01-08 07:00:00,\"{'typeKey': 'cycling'}\",running,8000,2880\n",
        );
        let set = ImportManager::new().load(file.path()).unwrap();
        assert_eq!(set.activities()[0].discipline(), Discipline::Running);
    }

    #[test]
    fn test_full_report_over_fixture() {
        let (_file, set) = load_fixture();
        let range = set.date_bounds().unwrap();
        let book = RaceBook::builtin().unwrap();
        let report = DashboardReport::build(
            &set,
            Some(&book),
            range,
            date("2024-02-01"),
            &ReportOptions::default(),
        );

        let totals = report.totals.ready().unwrap();
        let run = totals.get(Discipline::Running).unwrap();
        assert_eq!(run.sessions, 4);
        assert!((run.distance_km - 44.0).abs() < 1e-9);
        assert_eq!(totals.get(Discipline::Cycling).unwrap().duration_text(), "01:00:00");

        let volume = report.volume.ready().unwrap();
        assert_eq!(volume.trailing.len(), 12);
        assert_eq!(volume.trailing[11].start, date("2024-01-01"));
        assert!((volume.trailing[11].distance_km - 44.0).abs() < 1e-9);
        assert!(volume.trailing[..11].iter().all(|b| b.distance_km == 0.0));

        let correlation = report.correlation.ready().unwrap();
        assert_eq!(correlation.samples, 4);
        assert!(correlation.coefficient > 0.0);

        let efficiency = report.efficiency.ready().unwrap();
        assert_eq!(efficiency.daily.len(), 4);
        assert!(efficiency.trend.is_some());

        let forecast = report.forecast.ready().unwrap();
        assert_eq!(forecast.observed.len(), 4);
        assert_eq!(forecast.projected.len(), 4);
        assert!(forecast.fit.slope > 0.0);

        assert_eq!(report.ready_sections(), 8);
    }

    #[test]
    fn test_narrow_range_degrades_sections_independently() {
        let (_file, set) = load_fixture();
        let range = DateRange::new(date("2024-01-08"), date("2024-01-12")).unwrap();
        let report =
            DashboardReport::build(&set, None, range, date("2024-02-01"), &ReportOptions::default());

        assert!(report.totals.is_ready());
        assert!(report.heart_rate_speed.is_ready());
        assert!(matches!(report.correlation, Section::Unavailable(_)));
        assert!(matches!(report.forecast, Section::Unavailable(_)));
        assert!(matches!(report.races, Section::Unavailable(_)));

        let efficiency = report.efficiency.ready().unwrap();
        assert!(efficiency.trend.is_none());
    }

    #[test]
    fn test_single_run_normalizes_to_midpoint() {
        let (_file, set) = load_fixture();
        let range = DateRange::new(date("2024-01-29"), date("2024-01-29")).unwrap();
        let samples = analysis::qualifying_runs(&set, range);
        let summary = analysis::summarize(&samples).unwrap();

        assert_eq!(summary.normalized.len(), 1);
        assert_eq!(summary.normalized[0].heart_rate, 0.5);
        assert_eq!(summary.normalized[0].speed, 0.5);
    }

    #[test]
    fn test_trailing_window_anchor() {
        let (_file, set) = load_fixture();
        let monthly = calendar::bucket_distance(
            set.of_discipline(Discipline::Running),
            calendar::Granularity::Month,
        );
        let trailing = calendar::trailing_months(&monthly, date("2024-06-30"), 12);

        assert_eq!(trailing[0].start, date("2023-07-01"));
        assert_eq!(trailing[6].start, date("2024-01-01"));
        assert!((trailing[6].distance_km - 44.0).abs() < 1e-9);
        assert_eq!(trailing[11].distance_km, 0.0);
    }

    #[test]
    fn test_export_all_formats() {
        let (_file, set) = load_fixture();
        let range = set.date_bounds().unwrap();
        let book = RaceBook::builtin().unwrap();
        let report = DashboardReport::build(
            &set,
            Some(&book),
            range,
            date("2024-02-01"),
            &ReportOptions::default(),
        );
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("report.json");
        export::export_report(&report, ExportFormat::Json, &json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["correlation"]["status"], "ready");
        assert_eq!(json["races"]["value"]["triathlon"][0]["category"], "Sprint");

        let csv_path = dir.path().join("report.csv");
        export::export_report(&report, ExportFormat::Csv, &csv_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("series,date,label,value"));
        assert!(csv.contains("volume_weekly_km"));

        let text_path = dir.path().join("report.txt");
        export::export_report(&report, ExportFormat::Text, &text_path).unwrap();
        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("TRAINING TOTALS"));
        assert!(text.contains("27. Willicher Triathlon"));
        assert!(text.contains("GA 1/2"));
    }

    #[test]
    fn test_unit_helpers_from_public_api() {
        assert_eq!(units::time_to_seconds("00:35:19"), Some(2119));
        assert_eq!(units::time_to_seconds("--:--:--"), None);
        assert_eq!(units::seconds_to_pace(None), "--:--");
        assert_eq!(units::seconds_to_pace(Some(125.0)), "02:05");
    }

    #[test]
    fn test_json_activity_list() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"startTimeLocal": "2024-01-08 07:00:00",
                 "activityType": {{"typeId": 1, "typeKey": "running"}},
                 "distance": 8000.0, "duration": 2880.0, "averageHR": 142.0}}]"#
        )
        .unwrap();

        let set = ImportManager::new().load(file.path()).unwrap();
        assert_eq!(set.activities()[0].discipline(), Discipline::Running);
        let speed = set.activities()[0].speed_kmh().unwrap();
        assert!((speed - 10.0).abs() < 1e-9);
    }
}
