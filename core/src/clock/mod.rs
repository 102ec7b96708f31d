pub mod ipc;


use std::cell::Cell;
use std::rc::Rc;

use chrono::{Datelike, Timelike};

use crate::io::gpio::rtc::calendar::{self, to_bcd};
use crate::io::gpio::rtc::DateTime;

/// Source of the host's wall clock, as seconds since 2000-01-01 00:00:00.
///
/// Queries are synchronous and may block.
pub trait ClockSource {
    fn seconds_since_epoch(&mut self) -> u32;
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<u32>>);

impl ManualClock {
    pub fn new(seconds: u32) -> ManualClock {
        ManualClock(Rc::new(Cell::new(seconds)))
    }

    pub fn get(&self) -> u32 { self.0.get() }
    pub fn set(&self, seconds: u32) { self.0.set(seconds) }
    pub fn advance(&self, seconds: u32) { self.0.set(self.0.get().wrapping_add(seconds)) }
}

impl ClockSource for ManualClock {
    fn seconds_since_epoch(&mut self) -> u32 { self.get() }
}

/// Reads the local wall clock of the process directly.
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn seconds_since_epoch(&mut self) -> u32 {
        date_time_from_chrono(&chrono::Local::now()).to_seconds(true)
    }
}

/// Converts a chrono timestamp into a 24 hour RTC record.
pub fn date_time_from_chrono<T>(now: &T) -> DateTime where T: Datelike + Timelike {
    let hour = now.hour() as u8;
    DateTime {
        year: to_bcd(now.year().rem_euclid(100) as u8),
        month: to_bcd(now.month() as u8),
        day: to_bcd(now.day() as u8),
        weekday: now.weekday().num_days_from_sunday() as u8,
        hour: to_bcd(hour) | if hour >= 12 { DateTime::PM_FLAG } else { 0 },
        minute: to_bcd(now.minute() as u8),
        // Leap seconds show up as 60
        second: to_bcd(now.second().min(59) as u8),
    }
}

/// Relates the emulated calendar to the host clock.
///
/// Date/time writes only mark the offset dirty. It is recomputed once the transfer ends, which
/// keeps the host query out of the per-bit path.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClockOffset {
    pub offset_seconds: i64,
    pub weekday_offset: i32,
    pub recompute_pending: bool,
}

impl ClockOffset {
    pub fn new() -> ClockOffset {
        ClockOffset::default()
    }

    pub fn mark_dirty(&mut self) {
        self.recompute_pending = true;
    }

    /// Stores how far `date_time` is from `host_seconds`. The weekday offset is a truncating
    /// remainder and can be negative.
    pub fn recompute(&mut self, date_time: &DateTime, is_24h: bool, host_seconds: u32) {
        let seconds = date_time.to_seconds(is_24h);
        let derived_weekday = calendar::weekday_from_days(seconds / calendar::SECONDS_PER_DAY);
        self.offset_seconds = seconds as i64 - host_seconds as i64;
        self.weekday_offset = (date_time.weekday as i32 - derived_weekday as i32) % 7;
        self.recompute_pending = false;
        debug!("RTC offset {}s, weekday offset {}", self.offset_seconds, self.weekday_offset);
    }

    pub fn apply(&self, host_seconds: u32, is_24h: bool) -> DateTime {
        let seconds = host_seconds as i64 + self.offset_seconds;
        let mut date_time = DateTime::from_seconds(calendar::wrap_seconds(seconds), is_24h);
        let weekday = (calendar::weekday_from_seconds(seconds) as i32 + self.weekday_offset) % 7;
        date_time.weekday = (if weekday < 0 { weekday + 7 } else { weekday }) as u8;
        date_time
    }
}
