//! Time, pace and speed conversions
//!
//! All helpers treat missing or degenerate input as "no value" and return
//! `None` (or a fixed placeholder string) instead of failing.

/// Placeholder shown for an absent pace
pub const PACE_PLACEHOLDER: &str = "--:--";

/// Placeholder shown for an absent speed or ratio
pub const VALUE_PLACEHOLDER: &str = "--";

/// Placeholder shown for an absent split time
pub const TIME_PLACEHOLDER: &str = "--:--:--";

/// Convert an `H:M:S` string to total seconds.
///
/// Strings containing `--` (the "no data" sentinel) or blank strings yield
/// `None`, as does anything that isn't three numeric fields.
pub fn time_to_seconds(time: &str) -> Option<u32> {
    let time = time.trim();
    if time.is_empty() || time.contains("--") {
        return None;
    }

    let mut parts = time.split(':').map(|p| p.trim().parse::<u32>());
    let (h, m, s) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) => (h, m, s),
        _ => return None,
    };

    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parse a signed delta such as `+ 00:00:57` or `- 00:01:03` into seconds
pub fn parse_signed_delta(delta: &str) -> Option<i64> {
    let delta = delta.trim();
    let (sign, rest) = match delta.chars().next()? {
        '+' => (1, &delta[1..]),
        '-' if !delta.starts_with("--") => (-1, &delta[1..]),
        _ => (1, delta),
    };
    time_to_seconds(rest).map(|secs| sign * i64::from(secs))
}

/// Format a signed delta back to `+ HH:MM:SS` / `- HH:MM:SS`
pub fn format_signed_delta(delta_seconds: i64) -> String {
    let sign = if delta_seconds < 0 { '-' } else { '+' };
    format!(
        "{} {}",
        sign,
        format_seconds(Some(delta_seconds.unsigned_abs() as f64))
    )
}

/// Format seconds per distance unit as `MM:SS`.
///
/// Fractional seconds are truncated, matching how watches display pace.
pub fn seconds_to_pace(seconds_per_unit: Option<f64>) -> String {
    match seconds_per_unit {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            let minutes = (secs / 60.0).floor() as u64;
            let seconds = (secs % 60.0).floor() as u64;
            format!("{:02}:{:02}", minutes, seconds)
        }
        _ => PACE_PLACEHOLDER.to_string(),
    }
}

/// Format a duration as `HH:MM:SS`; zero or absent gives `00:00:00`
pub fn format_seconds(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(secs) if secs.is_finite() && secs > 0.0 => secs as u64,
        _ => 0,
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Speed in km/h from meters and seconds
pub fn speed_kmh(distance_m: f64, duration_s: f64) -> Option<f64> {
    if !(duration_s > 0.0) || !(distance_m >= 0.0) {
        return None;
    }
    Some((distance_m / 1000.0) / (duration_s / 3600.0))
}

/// Seconds per distance unit, undefined for a non-positive distance
pub fn pace_per_unit(duration_s: f64, units: f64) -> Option<f64> {
    if !(units > 0.0) || !(duration_s > 0.0) {
        return None;
    }
    Some(duration_s / units)
}

/// Format an optional speed with one decimal
pub fn format_speed(speed_kmh: Option<f64>) -> String {
    speed_kmh
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| VALUE_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_time_to_seconds() {
        assert_eq!(time_to_seconds("00:35:19"), Some(2119));
        assert_eq!(time_to_seconds("01:15:44"), Some(4544));
        assert_eq!(time_to_seconds("6:09:57"), Some(22197));
    }

    #[test]
    fn test_time_to_seconds_placeholders() {
        assert_eq!(time_to_seconds("--:--:--"), None);
        assert_eq!(time_to_seconds(""), None);
        assert_eq!(time_to_seconds("   "), None);
        assert_eq!(time_to_seconds("12:34"), None);
        assert_eq!(time_to_seconds("aa:bb:cc"), None);
    }

    #[test]
    fn test_time_to_seconds_overflow() {
        assert_eq!(time_to_seconds("1200000:00:00"), None);
        assert_eq!(time_to_seconds("0:4294967295:00"), None);
        assert_eq!(time_to_seconds("1193046:28:15"), Some(u32::MAX));
    }

    #[test]
    fn test_seconds_to_pace() {
        assert_eq!(seconds_to_pace(None), "--:--");
        assert_eq!(seconds_to_pace(Some(125.0)), "02:05");
        assert_eq!(seconds_to_pace(Some(284.8)), "04:44");
        assert_eq!(seconds_to_pace(Some(f64::NAN)), "--:--");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(None), "00:00:00");
        assert_eq!(format_seconds(Some(0.0)), "00:00:00");
        assert_eq!(format_seconds(Some(4544.0)), "01:15:44");
        assert_eq!(format_seconds(Some(360_000.0)), "100:00:00");
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(parse_signed_delta("+ 00:00:57"), Some(57));
        assert_eq!(parse_signed_delta("- 00:01:03"), Some(-63));
        assert_eq!(parse_signed_delta(""), None);
        assert_eq!(parse_signed_delta("--:--:--"), None);
        assert_eq!(format_signed_delta(-63), "- 00:01:03");
        assert_eq!(format_signed_delta(189), "+ 00:03:09");
    }

    #[test]
    fn test_speed_and_pace_guards() {
        assert_eq!(speed_kmh(20000.0, 3600.0), Some(20.0));
        assert_eq!(speed_kmh(20000.0, 0.0), None);
        assert_eq!(pace_per_unit(1424.0, 0.0), None);
        assert_eq!(pace_per_unit(1424.0, 5.0), Some(284.8));
        assert_eq!(format_speed(None), "--");
        assert_eq!(format_speed(Some(31.84)), "31.8");
    }

    proptest! {
        #[test]
        fn test_time_round_trip_matches_manual(h in 0u32..10, m in 0u32..60, s in 0u32..60) {
            let text = format!("{:02}:{:02}:{:02}", h, m, s);
            let secs = time_to_seconds(&text).unwrap();
            prop_assert_eq!(secs, h * 3600 + m * 60 + s);
            prop_assert_eq!(format_seconds(Some(secs as f64)), text);
        }

        #[test]
        fn test_pace_is_mm_ss(secs in 0.0f64..5999.0) {
            let pace = seconds_to_pace(Some(secs));
            prop_assert_eq!(pace.len(), 5);
            let (m, s) = pace.split_once(':').unwrap();
            prop_assert_eq!(m.parse::<u64>().unwrap() * 60 + s.parse::<u64>().unwrap(), secs as u64);
        }
    }
}
