use crate::io::gpio::rtc::{DateTime, Status};

/// Start-up state of the RTC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RtcConfig {
    /// Raw status register, see `Status`.
    pub status: u8,
    /// Date/time to start from instead of the power on registers. With a host synced RTC this
    /// fixes the offset to the host clock.
    pub date_time: Option<DateTime>,
}

impl RtcConfig {
    pub fn new() -> RtcConfig {
        RtcConfig {
            status: Status::HOUR_24.bits(),
            date_time: None,
        }
    }

    pub fn with_date_time(mut self, date_time: DateTime) -> RtcConfig {
        self.date_time = Some(date_time);
        self
    }

    pub fn with_status(mut self, status: Status) -> RtcConfig {
        self.status = status.bits();
        self
    }
}

impl Default for RtcConfig {
    fn default() -> RtcConfig { RtcConfig::new() }
}
