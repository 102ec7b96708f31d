//! BCD helpers and the linear seconds representation used to move the calendar forward.
//!
//! Seconds count from 2000-01-01 00:00:00, which is BCD year `00`. The chip only stores a two
//! digit year, so every year divisible by 4 is a leap year and the calendar repeats every
//! 100 years.

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: u32 = 24 * SECONDS_PER_HOUR;
pub const DAYS_PER_CENTURY: u32 = 100 * 365 + 25;
pub const SECONDS_PER_CENTURY: u32 = DAYS_PER_CENTURY * SECONDS_PER_DAY;

/// 2000-01-01 was a Saturday. Sunday is 0.
pub const EPOCH_WEEKDAY: u8 = 6;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn from_bcd(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0xF)
}

pub fn to_bcd(value: u8) -> u8 {
    (value / 10) << 4 | value % 10
}

pub fn is_valid_bcd(value: u8) -> bool {
    value & 0xF <= 9 && value >> 4 <= 9
}

/// `year` is the binary two digit year. Checking divisibility by 4 is enough for 2000-2099.
pub fn is_leap_year(year: u8) -> bool {
    year & 0x3 == 0
}

/// `month` is binary 1-12, `year` binary 0-99.
pub fn days_in_month(month: u8, year: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        1 ..= 12 => DAYS_IN_MONTH[month as usize - 1],
        _ => 0,
    }
}

pub fn days_in_year(year: u8) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Days between the epoch and the given binary date. Days past the end of the month carry over
/// into the following month.
pub fn days_since_epoch(year: u8, month: u8, day: u8) -> u32 {
    let year_days = year as u32 * 365 + (year as u32 + 3) / 4;
    let month_days: u32 = (1..month).map(|month| days_in_month(month, year) as u32).sum();
    year_days + month_days + (day as u32).saturating_sub(1)
}

/// Splits a day count into a binary `(year, month, day)`. Wraps around after 100 years.
pub fn date_from_days(days: u32) -> (u8, u8, u8) {
    let mut days = days % DAYS_PER_CENTURY;
    let mut year = 0;
    while days >= days_in_year(year) {
        days -= days_in_year(year);
        year += 1;
    }
    let mut month = 1;
    while days >= days_in_month(month, year) as u32 {
        days -= days_in_month(month, year) as u32;
        month += 1;
    }
    (year, month, days as u8 + 1)
}

pub fn weekday_from_days(days: u32) -> u8 {
    ((days + EPOCH_WEEKDAY as u32) % 7) as u8
}

/// Weekday of a second count that may lie outside the century.
pub fn weekday_from_seconds(seconds: i64) -> u8 {
    (seconds.div_euclid(SECONDS_PER_DAY as i64) + EPOCH_WEEKDAY as i64).rem_euclid(7) as u8
}

/// Wraps a signed second count into the century covered by the calendar.
pub fn wrap_seconds(seconds: i64) -> u32 {
    seconds.rem_euclid(SECONDS_PER_CENTURY as i64) as u32
}
