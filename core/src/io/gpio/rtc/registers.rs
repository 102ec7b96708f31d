use std::fmt;

use crate::io::IORegister;
use super::calendar::{self, from_bcd, to_bcd, is_valid_bcd};

bitflags! {
    pub struct Status: u8 {
        const INTFE = 1 << 1;
        const INTME = 1 << 3;
        const INTAE = 1 << 5;
        const HOUR_24 = 1 << 6;
        const POWER = 1 << 7;
    }
}

impl Status {
    /// Bits the guest can change. POWER is only ever cleared by a reset.
    pub const WRITE_MASK: u8 = 0b0110_1010;

    pub fn is_24h(&self) -> bool { self.contains(Status::HOUR_24) }
}

impl IORegister for Status {
    fn read(&self, byte: u8) -> u8 {
        match byte {
            0 => self.bits(),
            _ => unreachable!(),
        }
    }

    fn write(&mut self, byte: u8, value: u8) {
        match byte {
            0 => *self = *self & Status::POWER | Status::from_bits_truncate(value & Status::WRITE_MASK),
            _ => unreachable!(),
        }
    }
}

/// Interrupt/alarm register. Only stored, never acted on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alarm(pub u16);

impl IORegister for Alarm {
    fn read(&self, byte: u8) -> u8 {
        match byte {
            0 => self.0 as u8,
            1 => (self.0 >> 8) as u8,
            _ => unreachable!(),
        }
    }

    fn write(&mut self, byte: u8, value: u8) {
        match byte {
            0 => self.0 = self.0 & !0x00FF | value as u16,
            1 => self.0 = self.0 & !0xFF00 | (value as u16) << 8,
            _ => unreachable!(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateTimeField {
    Year,
    Month,
    Day,
    Weekday,
    Hour,
    Minute,
    Second,
}

impl DateTimeField {
    /// Wire order of the full date/time record.
    pub const DATE_TIME: [DateTimeField; 7] = [
        DateTimeField::Year,
        DateTimeField::Month,
        DateTimeField::Day,
        DateTimeField::Weekday,
        DateTimeField::Hour,
        DateTimeField::Minute,
        DateTimeField::Second,
    ];
    /// Wire order of the time only record.
    pub const TIME: [DateTimeField; 3] = [
        DateTimeField::Hour,
        DateTimeField::Minute,
        DateTimeField::Second,
    ];
}

/// Date and time as stored by the chip. Every field holds valid BCD, hour carries the PM flag
/// in bit 7.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DateTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const PM_FLAG: u8 = 0x80;

    /// Registers right after power on.
    pub fn new() -> DateTime {
        DateTime {
            year: 0x24,
            month: 0x02,
            day: 0x10,
            weekday: 0x03,
            hour: 0x10,
            minute: 0x09,
            second: 0x30,
        }
    }

    /// Registers after a reset command.
    pub fn cleared() -> DateTime {
        DateTime {
            year: 0x00,
            month: 0x01,
            day: 0x01,
            weekday: 0x00,
            hour: 0x00,
            minute: 0x00,
            second: 0x00,
        }
    }

    /// Builds a record from raw bytes in wire order, validating each field like a guest write.
    pub fn from_bytes(bytes: [u8; 7], is_24h: bool) -> DateTime {
        let mut date_time = DateTime::cleared();
        for (field, value) in DateTimeField::DATE_TIME.iter().zip(bytes.iter()) {
            date_time.set(*field, *value, is_24h);
        }
        date_time
    }

    pub fn get(&self, field: DateTimeField) -> u8 {
        match field {
            DateTimeField::Year => self.year,
            DateTimeField::Month => self.month,
            DateTimeField::Day => self.day,
            DateTimeField::Weekday => self.weekday,
            DateTimeField::Hour => self.hour,
            DateTimeField::Minute => self.minute,
            DateTimeField::Second => self.second,
        }
    }

    pub fn set(&mut self, field: DateTimeField, value: u8, is_24h: bool) {
        match field {
            DateTimeField::Year => self.set_year(value),
            DateTimeField::Month => self.set_month(value),
            DateTimeField::Day => self.set_day(value),
            DateTimeField::Weekday => self.set_weekday(value),
            DateTimeField::Hour => self.set_hour(value, is_24h),
            DateTimeField::Minute => self.minute = DateTime::clamp_sexagesimal("minute", value),
            DateTimeField::Second => self.second = DateTime::clamp_sexagesimal("second", value),
        }
    }

    pub fn to_bytes(&self) -> [u8; 7] {
        let mut bytes = [0; 7];
        for (byte, field) in bytes.iter_mut().zip(DateTimeField::DATE_TIME.iter()) {
            *byte = self.get(*field);
        }
        bytes
    }

    pub fn time_bytes(&self) -> [u8; 3] {
        [self.hour, self.minute, self.second]
    }

    fn set_year(&mut self, value: u8) {
        self.year = if is_valid_bcd(value) { value } else {
            trace!("Clamping RTC year {:02X}", value);
            0
        };
    }

    fn set_month(&mut self, value: u8) {
        let value = value & 0x1F;
        self.month = match value {
            0 | 0x13 ..= 0x19 => 0x1,
            _ if value & 0xF > 9 => 0x1,
            _ => value,
        };
        if self.month != value { trace!("Clamping RTC month {:02X}", value) }
    }

    /// Checked against the month currently stored. A day past the end of the month starts the
    /// next month instead.
    fn set_day(&mut self, value: u8) {
        let mut value = value & 0x3F;
        if value == 0 || value & 0xF > 9 {
            trace!("Clamping RTC day {:02X}", value);
            value = 0x1;
        }

        let days_in_month = calendar::days_in_month(from_bcd(self.month), from_bcd(self.year));
        if from_bcd(value) > days_in_month {
            trace!("RTC day {:02X} past end of month {:02X}", value, self.month);
            value = 0x1;
            let month = from_bcd(self.month) % 12 + 1;
            self.month = to_bcd(month);
        }
        self.day = value;
    }

    fn set_weekday(&mut self, value: u8) {
        let value = value & 0x7;
        self.weekday = if value == 7 { 0 } else { value };
    }

    fn set_hour(&mut self, value: u8, is_24h: bool) {
        self.hour = if is_24h {
            let mut value = value & 0x3F;
            if value > 0x23 || value & 0xF > 9 {
                trace!("Clamping RTC hour {:02X}", value);
                value = 0;
            }
            if from_bcd(value) >= 12 { value | DateTime::PM_FLAG } else { value }
        } else {
            let value = value & 0xBF;
            if value & !DateTime::PM_FLAG > 0x11 || value & 0xF > 9 {
                trace!("Clamping RTC hour {:02X}", value);
                0
            } else { value }
        };
    }

    fn clamp_sexagesimal(name: &str, value: u8) -> u8 {
        let value = value & 0x7F;
        if (0x60 ..= 0x79).contains(&value) || value & 0xF > 9 {
            trace!("Clamping RTC {} {:02X}", name, value);
            0
        } else { value }
    }

    /// Binary hour of day 0-23.
    pub fn hour_of_day(&self, is_24h: bool) -> u8 {
        let hour = from_bcd(self.hour & 0x3F);
        if is_24h { hour }
        else if self.hour & DateTime::PM_FLAG != 0 { hour + 12 }
        else { hour }
    }

    pub fn to_seconds(&self, is_24h: bool) -> u32 {
        let days = calendar::days_since_epoch(from_bcd(self.year), from_bcd(self.month), from_bcd(self.day));
        days * calendar::SECONDS_PER_DAY +
        self.hour_of_day(is_24h) as u32 * calendar::SECONDS_PER_HOUR +
        from_bcd(self.minute) as u32 * calendar::SECONDS_PER_MINUTE +
        from_bcd(self.second) as u32
    }

    /// Inverse of `to_seconds`. The weekday is derived from the date.
    pub fn from_seconds(seconds: u32, is_24h: bool) -> DateTime {
        let days = seconds / calendar::SECONDS_PER_DAY;
        let time = seconds % calendar::SECONDS_PER_DAY;
        let (year, month, day) = calendar::date_from_days(days);
        let hour = (time / calendar::SECONDS_PER_HOUR) as u8;
        let pm_flag = if hour >= 12 { DateTime::PM_FLAG } else { 0 };
        DateTime {
            year: to_bcd(year),
            month: to_bcd(month),
            day: to_bcd(day),
            weekday: calendar::weekday_from_days(days),
            hour: (if is_24h { to_bcd(hour) } else { to_bcd(hour % 12) }) | pm_flag,
            minute: to_bcd((time % calendar::SECONDS_PER_HOUR / calendar::SECONDS_PER_MINUTE) as u8),
            second: to_bcd((time % calendar::SECONDS_PER_MINUTE) as u8),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}-{:02X}-{:02X} ({}) {:02X}:{:02X}:{:02X}", self.year, self.month, self.day, self.weekday,
            self.hour & !DateTime::PM_FLAG, self.minute, self.second)?;
        if self.hour & DateTime::PM_FLAG != 0 { write!(f, " PM") } else { Ok(()) }
    }
}

impl Default for DateTime {
    fn default() -> DateTime { DateTime::new() }
}

/// Bit `bit` of a byte stream sent LSB first. Reads past the end are low.
pub fn serial_bit(bytes: &[u8], bit: usize) -> bool {
    bytes.get(bit >> 3).map_or(false, |byte| byte >> (bit & 0x7) & 0x1 != 0)
}
