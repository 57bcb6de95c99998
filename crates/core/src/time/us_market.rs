use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::America::New_York;
use std::collections::HashSet;
use std::str::FromStr;

// Daily aggregates settle a little after the 16:00 ET close. Runs before this time use the
// previous session.
const CLOSE_CUTOFF_HOUR_ET: u32 = 16;
const CLOSE_CUTOFF_MINUTE_ET: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePolicy {
    /// Most recent completed weekday session, skipping configured holidays.
    #[default]
    Weekday,
    /// Calendar yesterday in New York, whatever day that is.
    Yesterday,
}

impl FromStr for DatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekday" | "most_recent_weekday" => Ok(Self::Weekday),
            "yesterday" => Ok(Self::Yesterday),
            other => anyhow::bail!("unknown trading date policy: {other}"),
        }
    }
}

pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    policy: DatePolicy,
    now_utc: DateTime<Utc>,
    holidays: &HashSet<NaiveDate>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?}, expected YYYY-MM-DD"));
    }

    let now_et = now_utc.with_timezone(&New_York);
    let today = now_et.date_naive();

    match policy {
        DatePolicy::Yesterday => Ok(today - Duration::days(1)),
        DatePolicy::Weekday => {
            let cutoff_reached =
                (now_et.hour(), now_et.minute()) >= (CLOSE_CUTOFF_HOUR_ET, CLOSE_CUTOFF_MINUTE_ET);
            let mut date = today;
            if !cutoff_reached {
                date = date - Duration::days(1);
            }

            while is_weekend(date) || is_market_holiday(date, holidays) {
                date = date - Duration::days(1);
            }

            Ok(date)
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

// New Year's Day, Juneteenth, Independence Day, Christmas.
const FIXED_DATE_HOLIDAYS: [(u32, u32); 4] = [(1, 1), (6, 19), (7, 4), (12, 25)];

/// Fixed-date holidays as the exchange observes them in `year`: a Saturday holiday closes the
/// Friday before, a Sunday holiday the Monday after. New Year's Day on a Saturday is not
/// observed, since the Friday before belongs to the previous year.
pub fn observed_fixed_holidays(year: i32) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(FIXED_DATE_HOLIDAYS.len());
    for (m, d) in FIXED_DATE_HOLIDAYS {
        let Some(date) = NaiveDate::from_ymd_opt(year, m, d) else {
            continue;
        };
        match date.weekday() {
            chrono::Weekday::Sat if (m, d) == (1, 1) => {}
            chrono::Weekday::Sat => out.push(date - Duration::days(1)),
            chrono::Weekday::Sun => out.push(date + Duration::days(1)),
            _ => out.push(date),
        }
    }
    out
}

/// True for an observed fixed-date holiday or any date in `extra`.
pub fn is_market_holiday(date: NaiveDate, extra: &HashSet<NaiveDate>) -> bool {
    extra.contains(&date) || observed_fixed_holidays(date.year()).contains(&date)
}

/// Extra closures from `MARKET_HOLIDAYS` (`YYYY-MM-DD,YYYY-MM-DD`), for the floating holidays
/// (Thanksgiving, Good Friday, ...) and one-off closures.
pub fn configured_holidays() -> HashSet<NaiveDate> {
    match std::env::var("MARKET_HOLIDAYS") {
        Ok(s) => parse_holiday_list(&s).into_iter().collect(),
        Err(_) => HashSet::new(),
    }
}

fn parse_holiday_list(s: &str) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
            Ok(d) => out.push(d),
            Err(err) => tracing::warn!(value = part, error = %err, "ignoring bad MARKET_HOLIDAYS entry"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_extra() -> HashSet<NaiveDate> {
        HashSet::new()
    }

    #[test]
    fn rolls_back_on_weekend() {
        // 2026-01-03 is Saturday; 15:00 UTC = 10:00 ET.
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 15, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 1, 2));
    }

    #[test]
    fn uses_previous_session_before_cutoff() {
        // 2026-01-05 (Monday) 20:00 UTC = 15:00 ET.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 1, 2));
    }

    #[test]
    fn uses_same_day_after_cutoff() {
        // 22:00 UTC = 17:00 ET.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 1, 5));
    }

    #[test]
    fn skips_holidays() {
        // 2026-01-02 09:00 ET: previous day is New Year's Day.
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 14, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2025, 12, 31));
    }

    #[test]
    fn skips_observed_independence_day() {
        // 2026-07-04 is Saturday, so the market closes Friday 07-03.
        // 2026-07-06 14:00 UTC = Monday 10:00 EDT, before the cutoff.
        let now = Utc.with_ymd_and_hms(2026, 7, 6, 14, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 7, 2));
    }

    #[test]
    fn skips_juneteenth() {
        // 2026-06-20 is Saturday; Friday 06-19 is Juneteenth.
        let now = Utc.with_ymd_and_hms(2026, 6, 20, 14, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 6, 18));
    }

    #[test]
    fn holidays_follow_the_date_year() {
        // 2031-12-25 is Thursday; Friday morning resolves past it.
        let now = Utc.with_ymd_and_hms(2031, 12, 26, 14, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2031, 12, 24));
    }

    #[test]
    fn weekend_holidays_move_to_adjacent_weekday() {
        let extra = no_extra();
        // Christmas 2022 was Sunday, observed Monday 12-26.
        assert!(is_market_holiday(ymd(2022, 12, 26), &extra));
        // Juneteenth 2027 is Saturday, observed Friday 06-18.
        assert!(is_market_holiday(ymd(2027, 6, 18), &extra));
        // New Year's Day 2034 is Sunday, observed Monday 01-02.
        assert!(is_market_holiday(ymd(2034, 1, 2), &extra));
        // New Year's Day 2028 is Saturday: Friday 2027-12-31 stays open.
        assert!(!is_market_holiday(ymd(2027, 12, 31), &extra));
        assert!(!is_market_holiday(ymd(2026, 7, 6), &extra));
    }

    #[test]
    fn extra_holidays_are_honored() {
        // Thanksgiving 2026 via MARKET_HOLIDAYS; Friday 11-27 09:00 ET.
        let extra: HashSet<_> = [ymd(2026, 11, 26)].into_iter().collect();
        let now = Utc.with_ymd_and_hms(2026, 11, 27, 14, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &extra).unwrap();
        assert_eq!(d, ymd(2026, 11, 25));
    }

    #[test]
    fn follows_daylight_saving() {
        // 2026-07-06 20:45 UTC = 16:45 EDT, past the cutoff.
        let now = Utc.with_ymd_and_hms(2026, 7, 6, 20, 45, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Weekday, now, &no_extra()).unwrap();
        assert_eq!(d, ymd(2026, 7, 6));
    }

    #[test]
    fn yesterday_policy_is_calendar_based() {
        // 2026-01-05 03:00 UTC is still Sunday evening in New York.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 3, 0, 0).unwrap();
        let d = resolve_as_of_date(None, DatePolicy::Yesterday, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 1, 3));
    }

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 3, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2025-11-28"), DatePolicy::Weekday, now, &HashSet::new())
            .unwrap();
        assert_eq!(d, ymd(2025, 11, 28));
        assert!(resolve_as_of_date(Some("11/28/2025"), DatePolicy::Weekday, now, &HashSet::new())
            .is_err());
    }

    #[test]
    fn parses_holiday_list_and_policy() {
        let list = parse_holiday_list("2026-04-03, bogus,,2026-11-26");
        assert_eq!(list, vec![ymd(2026, 4, 3), ymd(2026, 11, 26)]);
        assert_eq!("Yesterday".parse::<DatePolicy>().unwrap(), DatePolicy::Yesterday);
        assert!("monthly".parse::<DatePolicy>().is_err());
    }
}
