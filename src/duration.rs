//! Turning Toggl's raw durations (milliseconds in reports, seconds elsewhere) into
//! weeks/days/hours/minutes/seconds and back.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

static DURATION_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(weeks|days|hours|minutes|seconds)").expect("invalid duration regex")
});

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DurationBreakdown {
    pub weeks: u64,
    /// 0-6
    pub days: u64,
    /// 0-23
    pub hours: u64,
    /// 0-59
    pub minutes: u64,
    /// 0-59
    pub seconds: u64,
}

impl DurationBreakdown {
    pub fn from_seconds(total: u64) -> Self {
        let (minutes, seconds) = (total / 60, total % 60);
        let (hours, minutes) = (minutes / 60, minutes % 60);
        let (days, hours) = (hours / 24, hours % 24);
        let (weeks, days) = (days / 7, days % 7);
        Self {
            weeks,
            days,
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.weeks * WEEK + self.days * DAY + self.hours * HOUR + self.minutes * MINUTE + self.seconds
    }

    /// `(weeks, days, hours, minutes, seconds)`
    pub fn as_tuple(&self) -> (u64, u64, u64, u64, u64) {
        (self.weeks, self.days, self.hours, self.minutes, self.seconds)
    }
}

impl From<(u64, u64, u64, u64, u64)> for DurationBreakdown {
    fn from((weeks, days, hours, minutes, seconds): (u64, u64, u64, u64, u64)) -> Self {
        Self {
            weeks,
            days,
            hours,
            minutes,
            seconds,
        }
    }
}

impl fmt::Display for DurationBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty_duration(self))
    }
}

/// Parses the `pretty_duration` form back, e.g. `"2 Days, 5 Seconds"`. Units may repeat and
/// come in any order; the result is normalized.
impl FromStr for DurationBreakdown {
    type Err = ApiError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut total = 0u64;
        let mut matched = false;
        for capture in DURATION_TOKEN_REGEX.captures_iter(input) {
            let value = capture[1]
                .parse::<u64>()
                .map_err(|_| ApiError::invalid(format!("invalid duration value in {:?}", input)))?;
            let unit = match capture[2].to_ascii_lowercase().as_str() {
                "weeks" => WEEK,
                "days" => DAY,
                "hours" => HOUR,
                "minutes" => MINUTE,
                _ => 1,
            };
            total = value
                .checked_mul(unit)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| ApiError::invalid(format!("duration too large: {:?}", input)))?;
            matched = true;
        }
        if !matched {
            return Err(ApiError::invalid(format!("not a duration: {:?}", input)));
        }
        Ok(Self::from_seconds(total))
    }
}

/// Breaks `value` down by successive floor division (60, 60, 24, 7). `value` is milliseconds
/// unless `milliseconds` is false, in which case it is seconds.
pub fn human_duration(value: i64, milliseconds: bool) -> ApiResult<DurationBreakdown> {
    if value < 0 {
        return Err(ApiError::invalid(format!(
            "duration can't be negative, got {}",
            value
        )));
    }
    let value = value as u64;
    let seconds = if milliseconds { value / 1000 } else { value };
    Ok(DurationBreakdown::from_seconds(seconds))
}

/// Same as `human_duration`, for a duration still sitting in decoded JSON. Floats are floored.
pub fn human_duration_value(value: &Value, milliseconds: bool) -> ApiResult<DurationBreakdown> {
    let number = match value {
        Value::Number(number) => number,
        other => {
            return Err(ApiError::invalid(format!(
                "duration must be a number, got {}",
                other
            )))
        }
    };
    if let Some(int) = number.as_i64() {
        return human_duration(int, milliseconds);
    }
    // u64 above i64::MAX lands here too
    match number.as_f64() {
        Some(float) if float.is_finite() && float >= 0.0 && float < i64::MAX as f64 => {
            human_duration(float.floor() as i64, milliseconds)
        }
        _ => Err(ApiError::invalid(format!(
            "duration must be a non-negative number below {}, got {}",
            i64::MAX,
            number
        ))),
    }
}

/// `"1 Weeks, 2 Days, 3 Hours, 4 Minutes, 5 Seconds"`. Zero weeks/days/hours/minutes are left
/// out, seconds never are.
pub fn pretty_duration(duration: &DurationBreakdown) -> String {
    let mut parts = Vec::with_capacity(5);
    for (amount, unit) in [
        (duration.weeks, "Weeks"),
        (duration.days, "Days"),
        (duration.hours, "Hours"),
        (duration.minutes, "Minutes"),
    ] {
        if amount != 0 {
            parts.push(format!("{} {}", amount, unit));
        }
    }
    parts.push(format!("{} Seconds", duration.seconds));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_zero() {
        assert_eq!(pretty_duration(&(0, 0, 0, 0, 0).into()), "0 Seconds");
    }

    #[test]
    fn pretty_all_units() {
        assert_eq!(
            pretty_duration(&(1, 2, 3, 4, 5).into()),
            "1 Weeks, 2 Days, 3 Hours, 4 Minutes, 5 Seconds"
        );
    }

    #[test]
    fn pretty_skips_zero_middle_units() {
        assert_eq!(pretty_duration(&(0, 0, 0, 0, 45).into()), "45 Seconds");
        assert_eq!(pretty_duration(&(0, 1, 0, 2, 0).into()), "1 Days, 2 Minutes, 0 Seconds");
    }

    #[test]
    fn milliseconds_by_default() {
        // 1w 2d 3h 4m 5s, plus 999ms that get floored away
        let ms = (WEEK + 2 * DAY + 3 * HOUR + 4 * MINUTE + 5) as i64 * 1000 + 999;
        let breakdown = human_duration(ms, true).unwrap();
        assert_eq!(breakdown.as_tuple(), (1, 2, 3, 4, 5));
    }

    #[test]
    fn raw_seconds() {
        assert_eq!(human_duration(3661, false).unwrap().as_tuple(), (0, 0, 1, 1, 1));
        assert_eq!(human_duration(0, false).unwrap().as_tuple(), (0, 0, 0, 0, 0));
    }

    #[test]
    fn breakdown_sums_back_to_input() {
        for t in [0i64, 1, 59, 60, 3599, 86_399, 604_800, 1_234_567, 98_765_432_109] {
            for &ms in &[true, false] {
                let b = human_duration(t, ms).unwrap();
                let expected = if ms { t as u64 / 1000 } else { t as u64 };
                assert_eq!(b.total_seconds(), expected);
                assert!(b.seconds < 60 && b.minutes < 60 && b.hours < 24 && b.days < 7);
            }
        }
    }

    #[test]
    fn negative_is_rejected() {
        assert!(matches!(
            human_duration(-1, true),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn json_values() {
        assert_eq!(
            human_duration_value(&json!(90_500.7), true).unwrap().as_tuple(),
            (0, 0, 0, 1, 30)
        );
        assert_eq!(
            human_duration_value(&json!(120), false).unwrap().as_tuple(),
            (0, 0, 0, 2, 0)
        );
        assert!(human_duration_value(&json!("120"), false).is_err());
        assert!(human_duration_value(&json!(-3.5), false).is_err());
        assert!(human_duration_value(&Value::Null, false).is_err());
    }

    #[test]
    fn json_values_out_of_range_are_rejected() {
        for value in [json!(u64::MAX), json!(1e300), json!(9.3e18)] {
            assert!(matches!(
                human_duration_value(&value, true),
                Err(ApiError::InvalidArgument(_))
            ));
        }
        let largest = human_duration_value(&json!(i64::MAX), false).unwrap();
        assert_eq!(largest.total_seconds(), i64::MAX as u64);
    }

    #[test]
    fn parse_pretty_form() {
        let parsed: DurationBreakdown = "1 Weeks, 2 Days, 3 Hours, 4 Minutes, 5 Seconds"
            .parse()
            .unwrap();
        assert_eq!(parsed.as_tuple(), (1, 2, 3, 4, 5));
        let parsed: DurationBreakdown = "90 minutes".parse().unwrap();
        assert_eq!(parsed.as_tuple(), (0, 0, 1, 30, 0));
        assert!("a while".parse::<DurationBreakdown>().is_err());
    }

    #[test]
    fn display_matches_pretty() {
        let b = human_duration(7_200_000, true).unwrap();
        assert_eq!(b.to_string(), "2 Hours, 0 Seconds");
        assert_eq!(b.to_string().parse::<DurationBreakdown>().unwrap(), b);
    }
}
