use {
    crate::parameters::LeapDays,
    chrono::{Datelike, Duration, NaiveDate, NaiveDateTime},
};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of hourly timesteps in a full calendar year under the given leap-day policy
pub fn hours_in_year(year: i32, leap_days: LeapDays) -> usize {
    match (is_leap_year(year), leap_days) {
        (true, LeapDays::Keep) => 366 * 24,
        _ => 365 * 24,
    }
}

pub fn is_leap_day(month: u32, day: u32) -> bool {
    month == 2 && day == 29
}

/// Consecutive hourly timestamps starting at `start`, skipping February 29th when leap days are dropped
pub fn hourly_range(start: NaiveDateTime, count: usize, leap_days: LeapDays) -> Vec<NaiveDateTime> {
    let mut out = Vec::with_capacity(count);
    let mut t = start;

    while out.len() < count {
        if leap_days == LeapDays::Keep || !is_leap_day(t.month(), t.day()) {
            out.push(t);
        }
        t += Duration::hours(1);
    }

    out
}

pub fn timestamp(year: i32, month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
}
