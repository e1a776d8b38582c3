//! Derived brew values: ratio, days off roast, brew-time text

use crate::journal::{Brew, BrewWithRatio, CoffeeRecord, CoffeeWithDaysOffRoast};
use chrono::{DateTime, NaiveDate, TimeZone};

const SECONDS_PER_DAY: i64 = 86_400;

/// Brew ratio as "1:X.X", or `None` when it cannot be computed
pub fn ratio(dose_g: Option<f64>, water_g: Option<f64>) -> Option<String> {
    let dose = dose_g?;
    let water = water_g?;
    if dose <= 0.0 || water == 0.0 {
        return None;
    }
    // Halves round up: 16.25 is "1:16.3"
    let rounded = round_half_up(water / dose * 10.0) as f64 / 10.0;
    Some(format!("1:{:.1}", rounded))
}

/// Cumulative water target for each pour after the bloom.
///
/// Every target is rounded from the cumulative formula on its own, so rounding
/// never compounds from one pour to the next and the last target is the full
/// water weight.
pub fn pour_targets(water_g: f64, bloom_water_g: f64, pour_count: u32) -> Vec<i64> {
    if pour_count == 0 {
        return Vec::new();
    }
    let pour_amount = (water_g - bloom_water_g) / f64::from(pour_count);
    (1..=pour_count)
        .map(|i| round_half_up(bloom_water_g + pour_amount * f64::from(i)))
        .collect()
}

// Math.round semantics: halves go towards positive infinity
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Whole days since the roast date, counted from local midnight of that date to now
pub fn days_off_roast(roast_date: Option<&str>) -> Option<i64> {
    days_off_roast_at(roast_date, &chrono::Local::now())
}

/// Same as [`days_off_roast`] against an explicit "now". The roast side is
/// normalized to midnight in `now`'s time zone; `now` keeps its time of day.
pub fn days_off_roast_at<Tz: TimeZone>(roast_date: Option<&str>, now: &DateTime<Tz>) -> Option<i64> {
    let date = parse_roast_date(roast_date?)?;
    let midnight = now
        .timezone()
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()?;
    let elapsed = now.clone().signed_duration_since(midnight);
    Some(elapsed.num_seconds().div_euclid(SECONDS_PER_DAY))
}

fn parse_roast_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

/// Format seconds as "M:SS"; `None` renders as "--:--"
pub fn format_brew_time(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
        None => "--:--".to_string(),
    }
}

/// Parse "M:SS" (any number of minute digits, exactly two second digits, seconds < 60)
pub fn parse_brew_time(text: &str) -> Option<u32> {
    let (mins, secs) = text.split_once(':')?;
    if mins.is_empty() || !mins.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if secs.len() != 2 || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mins: u32 = mins.parse().ok()?;
    let secs: u32 = secs.parse().ok()?;
    if secs >= 60 {
        return None;
    }
    mins.checked_mul(60)?.checked_add(secs)
}

/// Split free-text tasting notes on commas, dropping blanks
pub fn parse_tasting_notes(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn with_days_off_roast(coffee: CoffeeRecord) -> CoffeeWithDaysOffRoast {
    let days_off_roast = days_off_roast(coffee.roast_date.as_deref());
    CoffeeWithDaysOffRoast {
        coffee,
        days_off_roast,
    }
}

pub fn with_ratio(brew: Brew) -> BrewWithRatio {
    let ratio = ratio(brew.dose_g, brew.water_g);
    BrewWithRatio { brew, ratio }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use proptest::prelude::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(Some(15.0), Some(240.0)), Some("1:16.0".to_string()));
        assert_eq!(ratio(Some(18.0), Some(300.0)), Some("1:16.7".to_string()));
        assert_eq!(ratio(Some(16.0), Some(260.0)), Some("1:16.3".to_string()));
        assert_eq!(ratio(Some(20.0), Some(325.0)), Some("1:16.3".to_string()));
        assert_eq!(ratio(Some(12.0), Some(195.0)), Some("1:16.3".to_string()));
        assert_eq!(ratio(Some(0.0), Some(240.0)), None);
        assert_eq!(ratio(Some(-1.0), Some(240.0)), None);
        assert_eq!(ratio(Some(15.0), Some(0.0)), None);
        assert_eq!(ratio(None, Some(240.0)), None);
        assert_eq!(ratio(Some(15.0), None), None);
    }

    #[test]
    fn test_pour_targets_scenario() {
        assert_eq!(pour_targets(250.0, 30.0, 3), vec![103, 177, 250]);
    }

    #[test]
    fn test_pour_targets_single_pour() {
        assert_eq!(pour_targets(250.0, 30.0, 1), vec![250]);
        assert!(pour_targets(250.0, 30.0, 0).is_empty());
    }

    #[test]
    fn test_format_brew_time() {
        assert_eq!(format_brew_time(Some(185)), "3:05");
        assert_eq!(format_brew_time(Some(0)), "0:00");
        assert_eq!(format_brew_time(Some(600)), "10:00");
        assert_eq!(format_brew_time(None), "--:--");
    }

    #[test]
    fn test_parse_brew_time() {
        assert_eq!(parse_brew_time("3:05"), Some(185));
        assert_eq!(parse_brew_time("0:00"), Some(0));
        assert_eq!(parse_brew_time("12:59"), Some(779));
        assert_eq!(parse_brew_time("3:5"), None);
        assert_eq!(parse_brew_time("3:60"), None);
        assert_eq!(parse_brew_time(":05"), None);
        assert_eq!(parse_brew_time("3:055"), None);
        assert_eq!(parse_brew_time("a:05"), None);
        assert_eq!(parse_brew_time("3-05"), None);
        assert_eq!(parse_brew_time(""), None);
    }

    #[test]
    fn test_days_off_roast() {
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 9, 30, 0).unwrap();
        assert_eq!(days_off_roast_at(Some("2024-03-01"), &now), Some(10));
        assert_eq!(days_off_roast_at(Some("2024-03-11"), &now), Some(0));
        assert_eq!(days_off_roast_at(Some("2024-03-12"), &now), Some(-1));
        assert_eq!(days_off_roast_at(None, &now), None);
        assert_eq!(days_off_roast_at(Some("not a date"), &now), None);
    }

    #[test]
    fn test_days_off_roast_uses_local_midnight() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        // 00:30 local on the 11th is still a full ten days after the 1st
        let now = tz.with_ymd_and_hms(2024, 3, 11, 0, 30, 0).unwrap();
        assert_eq!(days_off_roast_at(Some("2024-03-01"), &now), Some(10));
        let just_before = tz.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(days_off_roast_at(Some("2024-03-01"), &just_before), Some(9));
    }

    #[test]
    fn test_days_off_roast_accepts_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap();
        assert_eq!(
            days_off_roast_at(Some("2024-03-04T15:00:00Z"), &now),
            Some(7)
        );
    }

    #[test]
    fn test_parse_tasting_notes() {
        assert_eq!(
            parse_tasting_notes(" frutal, chocolate ,, nuez,"),
            vec!["frutal", "chocolate", "nuez"]
        );
        assert!(parse_tasting_notes("  , ").is_empty());
    }

    proptest! {
        #[test]
        fn test_pour_targets_properties(
            pour_count in 1u32..=12,
            bloom in 0.0f64..100.0,
            extra in 1.0f64..900.0,
        ) {
            let water = bloom + extra;
            let targets = pour_targets(water, bloom, pour_count);
            prop_assert_eq!(targets.len(), pour_count as usize);
            prop_assert!(targets.windows(2).all(|w| w[0] <= w[1]));
            let last = *targets.last().unwrap();
            prop_assert!((last - water.round() as i64).abs() <= 1);
        }

        #[test]
        fn test_brew_time_round_trip(seconds in 0u32..1_000_000) {
            prop_assert_eq!(parse_brew_time(&format_brew_time(Some(seconds))), Some(seconds));
        }
    }
}
