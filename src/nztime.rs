//! Factory-local time arithmetic.
//!
//! Every date filter in the API is expressed against UTC `created_at`
//! columns, while operators think in New Zealand civil time. This module is
//! the single place where civil days, ISO weeks, calendar months and shift
//! windows are converted into half-open UTC instant ranges. All conversions
//! go through the IANA zone database (`chrono-tz`); nothing here depends on
//! the host process time zone.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Civil time zone of the factory floor.
pub const FACTORY_TZ: Tz = chrono_tz::Pacific::Auckland;

/// Unit selector for local-time range filters.
///
/// Deserialized from query/body fields; anything outside the three accepted
/// values is a 400 at the boundary, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RangeUnit {
    #[serde(alias = "today")]
    Day,
    Week,
    Month,
}

/// Half-open UTC interval `[start, end)` covering exactly one civil unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LocalRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Resolves the UTC instant of local midnight on `date` in `tz`.
///
/// On a spring-forward day where 00:00 falls into the DST gap, the first
/// valid instant of the civil day is used; an ambiguous midnight (fall-back)
/// resolves to the earlier instant.
fn local_midnight_utc(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight: NaiveDateTime = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // Midnight was skipped by a DST gap; probe forward in 15-minute
            // steps until the zone yields a valid instant.
            let mut probe = midnight;
            for _ in 0..96 {
                probe += Duration::minutes(15);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            // No IANA zone skips an entire civil day.
            Utc.from_utc_datetime(&midnight)
        }
    }
}

/// Computes the `[start, end)` UTC range for the civil `unit` containing
/// `now`, evaluated in `tz`.
///
/// Day: local midnight to the next local midnight. Week: local midnight of
/// the ISO week's Monday, spanning seven civil days. Month: local midnight
/// of day 1 to day 1 of the following month. The elapsed UTC duration of a
/// "day" is 23, 24 or 25 hours across DST transitions.
pub fn range_utc(tz: Tz, unit: RangeUnit, now: DateTime<Utc>) -> LocalRange {
    let today = now.with_timezone(&tz).date_naive();
    let (first, next) = match unit {
        RangeUnit::Day => (today, today + Duration::days(1)),
        RangeUnit::Week => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (monday, monday + Duration::days(7))
        }
        RangeUnit::Month => {
            let first = today.with_day(1).unwrap_or(today);
            let next = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            }
            .unwrap_or(first);
            (first, next)
        }
    };
    LocalRange {
        start: local_midnight_utc(tz, first),
        end: local_midnight_utc(tz, next),
    }
}

/// Convenience wrapper for the factory zone and the current instant.
pub fn factory_range(unit: RangeUnit) -> LocalRange {
    range_utc(FACTORY_TZ, unit, Utc::now())
}

/// The `[start, end)` UTC range of a single civil day in `tz`.
pub fn day_range_utc(tz: Tz, date: NaiveDate) -> LocalRange {
    LocalRange {
        start: local_midnight_utc(tz, date),
        end: local_midnight_utc(tz, date + Duration::days(1)),
    }
}

/// The `[start, end)` UTC range spanning `first` through `last` inclusive.
pub fn days_range_utc(tz: Tz, first: NaiveDate, last: NaiveDate) -> LocalRange {
    LocalRange {
        start: local_midnight_utc(tz, first),
        end: local_midnight_utc(tz, last + Duration::days(1)),
    }
}

/// Local hour of day (0..=23) of a UTC instant, for hourly bucketing.
pub fn hour_in_zone(tz: Tz, instant: DateTime<Utc>) -> u32 {
    use chrono::Timelike;
    instant.with_timezone(&tz).hour()
}

/// Local civil date formatted `YYYY-MM-DD`, used for storage object prefixes.
pub fn date_folder(tz: Tz, now: DateTime<Utc>) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Local wall-clock time formatted `HHMMSS`, used in photo file names.
pub fn time_compact(tz: Tz, now: DateTime<Utc>) -> String {
    now.with_timezone(&tz).format("%H%M%S").to_string()
}

/// The three fixed daily work periods.
///
/// Stored on packets as a text column; the window boundaries are fixed in
/// factory-local wall-clock time (DS 06:00-14:30, TW 14:30-23:00, NS
/// 23:00-06:00 crossing midnight).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Shift {
    #[sea_orm(string_value = "DS")]
    #[serde(rename = "DS")]
    Day,
    #[sea_orm(string_value = "TW")]
    #[serde(rename = "TW")]
    Twilight,
    #[sea_orm(string_value = "NS")]
    #[serde(rename = "NS")]
    Night,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::Day => write!(f, "DS"),
            Shift::Twilight => write!(f, "TW"),
            Shift::Night => write!(f, "NS"),
        }
    }
}

impl Shift {
    pub fn code(&self) -> &'static str {
        match self {
            Shift::Day => "DS",
            Shift::Twilight => "TW",
            Shift::Night => "NS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Shift::Day => "Day Shift",
            Shift::Twilight => "Twilight",
            Shift::Night => "Night Shift",
        }
    }

    /// Combined packet target per shift across both thermoformers.
    pub fn target(&self) -> u64 {
        42
    }

    /// The shift in progress at `now`, judged by factory wall-clock time.
    pub fn at(tz: Tz, now: DateTime<Utc>) -> Shift {
        let local = now.with_timezone(&tz);
        let minutes = {
            use chrono::Timelike;
            local.hour() * 60 + local.minute()
        };
        match minutes {
            m if (6 * 60..14 * 60 + 30).contains(&m) => Shift::Day,
            m if (14 * 60 + 30..23 * 60).contains(&m) => Shift::Twilight,
            _ => Shift::Night,
        }
    }

    /// UTC instant at which the shift in progress at `now` began.
    ///
    /// A night shift observed before 06:00 local started at 23:00 on the
    /// previous civil day.
    pub fn start_utc(tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
        use chrono::Timelike;
        let local = now.with_timezone(&tz);
        let (date, h, m) = match Shift::at(tz, now) {
            Shift::Day => (local.date_naive(), 6, 0),
            Shift::Twilight => (local.date_naive(), 14, 30),
            Shift::Night => {
                if local.hour() < 6 {
                    (local.date_naive() - Duration::days(1), 23, 0)
                } else {
                    (local.date_naive(), 23, 0)
                }
            }
        };
        let naive = date
            .and_hms_opt(h, m, 0)
            .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap_or_default());
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => local_midnight_utc(tz, date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::Pacific::Auckland;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn day_range_plain() {
        // 2025-06-11 14:00 NZST (UTC+12) -> civil day 2025-06-11
        let now = utc(2025, 6, 11, 2, 0);
        let r = range_utc(Auckland, RangeUnit::Day, now);
        assert_eq!(r.start, utc(2025, 6, 10, 12, 0));
        assert_eq!(r.end, utc(2025, 6, 11, 12, 0));
        assert_eq!(r.end - r.start, Duration::hours(24));
    }

    #[test]
    fn day_range_nz_dst_end_is_25_hours() {
        // NZ clocks fall back on 2025-04-06 (03:00 NZDT -> 02:00 NZST).
        let now = utc(2025, 4, 5, 23, 0); // 2025-04-06 noon-ish NZ
        let r = range_utc(Auckland, RangeUnit::Day, now);
        assert_eq!(r.start, utc(2025, 4, 5, 11, 0)); // 00:00 NZDT (+13)
        assert_eq!(r.end, utc(2025, 4, 6, 12, 0)); // next 00:00 NZST (+12)
        assert_eq!(r.end - r.start, Duration::hours(25));
    }

    #[test]
    fn day_range_nz_dst_start_is_23_hours() {
        // NZ clocks spring forward on 2025-09-28 (02:00 -> 03:00).
        let now = utc(2025, 9, 28, 0, 30);
        let r = range_utc(Auckland, RangeUnit::Day, now);
        assert_eq!(r.start, utc(2025, 9, 27, 12, 0)); // 00:00 NZST (+12)
        assert_eq!(r.end, utc(2025, 9, 28, 11, 0)); // next 00:00 NZDT (+13)
        assert_eq!(r.end - r.start, Duration::hours(23));
    }

    #[test]
    fn day_range_us_spring_forward_evening_reference() {
        // 2025-03-09 23:30 America/New_York, the evening of the US
        // spring-forward day; the range still covers one civil day.
        let now = utc(2025, 3, 10, 3, 30); // 23:30 EDT
        let r = range_utc(New_York, RangeUnit::Day, now);
        assert_eq!(r.start, utc(2025, 3, 9, 5, 0)); // 00:00 EST (-5)
        assert_eq!(r.end, utc(2025, 3, 10, 4, 0)); // 00:00 EDT (-4)
        assert_eq!(r.end - r.start, Duration::hours(23));
        assert!(r.contains(now));
    }

    #[test]
    fn week_range_starts_monday_local_midnight() {
        // 2025-06-11 is a Wednesday in NZ.
        let now = utc(2025, 6, 11, 2, 0);
        let r = range_utc(Auckland, RangeUnit::Week, now);
        // Monday 2025-06-09 00:00 NZST
        assert_eq!(r.start, utc(2025, 6, 8, 12, 0));
        assert_eq!(r.end - r.start, Duration::days(7));
    }

    #[test]
    fn week_on_monday_starts_same_day() {
        // 2025-06-09 10:00 NZST is itself a Monday.
        let now = utc(2025, 6, 8, 22, 0);
        let r = range_utc(Auckland, RangeUnit::Week, now);
        assert_eq!(r.start, utc(2025, 6, 8, 12, 0));
    }

    #[test]
    fn month_range_spanning_dst_transition() {
        // April 2025 contains the NZ fall-back; the month still runs from
        // local midnight Apr 1 to local midnight May 1.
        let now = utc(2025, 4, 14, 0, 0);
        let r = range_utc(Auckland, RangeUnit::Month, now);
        assert_eq!(r.start, utc(2025, 3, 31, 11, 0)); // Apr 1 00:00 NZDT
        assert_eq!(r.end, utc(2025, 4, 30, 12, 0)); // May 1 00:00 NZST
    }

    #[test]
    fn december_month_rolls_into_next_year() {
        let now = utc(2025, 12, 10, 0, 0);
        let r = range_utc(Auckland, RangeUnit::Month, now);
        assert_eq!(r.start, utc(2025, 11, 30, 11, 0)); // Dec 1 00:00 NZDT
        assert_eq!(r.end, utc(2025, 12, 31, 11, 0)); // Jan 1 00:00 NZDT
    }

    #[test]
    fn range_is_independent_of_host_zone() {
        // Two different "host" views of the same instant agree because the
        // zone is an explicit parameter.
        let now = utc(2025, 4, 5, 23, 0);
        let a = range_utc(Auckland, RangeUnit::Day, now);
        let b = range_utc(Auckland, RangeUnit::Day, now.with_timezone(&New_York).with_timezone(&Utc));
        assert_eq!(a, b);
    }

    #[test]
    fn unit_selector_rejects_unknown_values() {
        assert!(serde_json::from_str::<RangeUnit>("\"fortnight\"").is_err());
        assert_eq!(
            serde_json::from_str::<RangeUnit>("\"today\"").unwrap(),
            RangeUnit::Day
        );
        assert_eq!(
            serde_json::from_str::<RangeUnit>("\"week\"").unwrap(),
            RangeUnit::Week
        );
    }

    #[test]
    fn shift_boundaries() {
        // 05:59 NZST -> night shift that began yesterday 23:00.
        let now = utc(2025, 6, 10, 17, 59);
        assert_eq!(Shift::at(Auckland, now), Shift::Night);
        assert_eq!(Shift::start_utc(Auckland, now), utc(2025, 6, 10, 11, 0));

        // 06:00 exactly -> day shift.
        let now = utc(2025, 6, 10, 18, 0);
        assert_eq!(Shift::at(Auckland, now), Shift::Day);
        assert_eq!(Shift::start_utc(Auckland, now), utc(2025, 6, 10, 18, 0));

        // 14:30 -> twilight.
        let now = utc(2025, 6, 11, 2, 30);
        assert_eq!(Shift::at(Auckland, now), Shift::Twilight);

        // 23:00 -> night shift of the same civil day.
        let now = utc(2025, 6, 11, 11, 0);
        assert_eq!(Shift::at(Auckland, now), Shift::Night);
        assert_eq!(Shift::start_utc(Auckland, now), utc(2025, 6, 11, 11, 0));
    }

    #[test]
    fn hour_bucketing_uses_local_clock() {
        // 2025-06-11 01:30 UTC is 13:30 NZST.
        assert_eq!(hour_in_zone(Auckland, utc(2025, 6, 11, 1, 30)), 13);
    }

    #[test]
    fn storage_prefixes_use_local_date() {
        let now = utc(2025, 9, 8, 13, 0); // 2025-09-09 01:00 NZST
        assert_eq!(date_folder(Auckland, now), "2025-09-09");
        assert_eq!(time_compact(Auckland, now), "010000");
    }
}
