//! Seiko S-3511 style real-time clock on the cartridge GPIO port.
//!
//! There is no free running clock here. The engine samples the pins once per GPIO register write
//! and reacts to SCK edges while CS is high. Commands are sent MSB first, data bytes LSB first.

pub mod calendar;
mod registers;


pub use registers::{Alarm, DateTime, DateTimeField, Status, serial_bit};

use super::{GpioDevice, Pin, RomGpio};
use crate::clock::{ClockOffset, ClockSource};
use crate::config::RtcConfig;
use crate::io::IORegister;

/// Where the date/time comes from.
pub enum TimeBase {
    /// Registers hold the date/time and only change when written.
    Standalone,
    /// Registers are re-derived from the host clock plus a stored offset.
    HostSynced {
        clock: Box<dyn ClockSource>,
        offset: ClockOffset,
    },
}

impl TimeBase {
    pub fn host_synced<C>(clock: C) -> TimeBase where C: ClockSource + 'static {
        TimeBase::HostSynced {
            clock: Box::new(clock),
            offset: ClockOffset::new(),
        }
    }

    pub fn is_host_synced(&self) -> bool {
        match self {
            TimeBase::Standalone => false,
            TimeBase::HostSynced { .. } => true,
        }
    }

    fn mark_dirty(&mut self) {
        if let TimeBase::HostSynced { offset, .. } = self { offset.mark_dirty() }
    }
}

pub struct RTC {
    // Transfer
    state: TransferState,
    shift_register: u8,
    bit_count: usize,
    byte_index: usize,
    command: Command,
    // Registers
    status: Status,
    alarm: Alarm,
    date_time: DateTime,
    time_base: TimeBase,
}

impl RTC {
    const COMMAND_CODE: u8 = 0b0110;

    pub fn new(config: &RtcConfig, time_base: TimeBase) -> RTC {
        let mut rtc = RTC {
            // Transfer
            state: TransferState::CommandWaitFallingEdge,
            shift_register: 0,
            bit_count: 0,
            byte_index: 0,
            command: Command::Reset,
            // Registers
            status: Status::from_bits_truncate(config.status),
            alarm: Alarm::default(),
            date_time: DateTime::new(),
            time_base,
        };
        if let Some(date_time) = config.date_time {
            rtc.date_time = DateTime::from_bytes(date_time.to_bytes(), rtc.status.is_24h());
            rtc.time_base.mark_dirty();
            rtc.apply_pending_offset();
        }
        rtc
    }

    pub fn standalone(config: &RtcConfig) -> RTC {
        RTC::new(config, TimeBase::Standalone)
    }

    pub fn state(&self) -> TransferState { self.state }
    pub fn status(&self) -> Status { self.status }
    pub fn alarm(&self) -> Alarm { self.alarm }
    pub fn date_time(&self) -> &DateTime { &self.date_time }
    pub fn time_base(&self) -> &TimeBase { &self.time_base }

    /// Aborts any transfer in flight.
    pub fn reset_transfer(&mut self) {
        self.state = TransferState::CommandWaitFallingEdge;
        self.shift_register = 0;
        self.bit_count = 0;
    }

    /// Recomputes the host clock offset if a date/time write is waiting for it.
    pub fn apply_pending_offset(&mut self) {
        let is_24h = self.status.is_24h();
        if let TimeBase::HostSynced { clock, offset } = &mut self.time_base {
            if offset.recompute_pending {
                offset.recompute(&self.date_time, is_24h, clock.seconds_since_epoch());
            }
        }
    }

    /// Brings the date/time registers up to the host clock.
    pub fn refresh_date_time(&mut self) {
        let is_24h = self.status.is_24h();
        if let TimeBase::HostSynced { clock, offset } = &mut self.time_base {
            self.date_time = offset.apply(clock.seconds_since_epoch(), is_24h);
        }
    }

    fn reset_registers(&mut self) {
        self.date_time = DateTime::cleared();
        self.status = Status::empty();
        self.alarm = Alarm::default();
        self.time_base.mark_dirty();
    }

    fn command_wait_rising_edge(&mut self, gpio: &RomGpio) {
        if !gpio.pin_state(Pin::SCK) { return }

        self.shift_register = self.shift_register << 1 | gpio.pin_state(Pin::SIO) as u8;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.exec_command();
        } else {
            self.state = TransferState::CommandWaitFallingEdge;
        }
    }

    fn exec_command(&mut self) {
        let command_byte = self.shift_register;
        if command_byte >> 4 != RTC::COMMAND_CODE {
            debug!("Ignoring RTC Command {:02X}", command_byte);
            self.state = TransferState::Done;
            return
        }

        self.command = Command::from(command_byte >> 1 & 0x7);
        let is_read = command_byte & 0x1 != 0;
        trace!("RTC Command {:?} {}", self.command, if is_read { "Read" } else { "Write" });
        self.state = match self.command {
            Command::Reset => {
                self.reset_registers();
                TransferState::Done
            },
            Command::TestStart | Command::TestEnd => TransferState::Done,
            _ => {
                // Partial writes land on top of the current host time too
                if self.command == Command::DateTime || self.command == Command::Time { self.refresh_date_time() }
                if is_read { TransferState::OutDataWaitFallingEdge } else { TransferState::InDataWaitFallingEdge }
            },
        };
        self.shift_register = 0;
        self.bit_count = 0;
        self.byte_index = 0;
    }

    fn in_data_wait_rising_edge(&mut self, gpio: &RomGpio) {
        if !gpio.pin_state(Pin::SCK) { return }

        self.shift_register |= (gpio.pin_state(Pin::SIO) as u8) << self.bit_count;
        self.state = TransferState::InDataWaitFallingEdge;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bit_count = 0;
            self.write_byte(self.shift_register);
            self.shift_register = 0;
        }
    }

    fn write_byte(&mut self, value: u8) {
        let is_24h = self.status.is_24h();
        let last_byte = match self.command {
            Command::Status => {
                self.status.write(0, value);
                // Status keeps accepting bytes until CS goes low
                false
            },
            Command::DateTime => self.write_date_time_byte(&DateTimeField::DATE_TIME, value, is_24h),
            Command::Time => self.write_date_time_byte(&DateTimeField::TIME, value, is_24h),
            Command::Alarm1 => {
                self.alarm.write(self.byte_index as u8, value);
                self.byte_index += 1;
                self.byte_index == 2
            },
            Command::Alarm2 => {
                self.alarm.write(1, value);
                true
            },
            Command::Reset | Command::TestStart | Command::TestEnd => true,
        };
        if last_byte { self.state = TransferState::Done }
    }

    fn write_date_time_byte(&mut self, fields: &[DateTimeField], value: u8, is_24h: bool) -> bool {
        if let Some(field) = fields.get(self.byte_index) {
            self.date_time.set(*field, value, is_24h);
            self.time_base.mark_dirty();
        }
        self.byte_index += 1;
        self.byte_index >= fields.len()
    }

    fn out_data_wait_falling_edge(&mut self, gpio: &mut RomGpio) {
        if gpio.pin_state(Pin::SCK) { return }

        self.state = TransferState::OutDataWaitRisingEdge;
        let (bytes, len) = self.output_bytes();
        let bit = serial_bit(&bytes[..len], self.bit_count);
        self.bit_count += 1;
        if self.bit_count >= len * 8 {
            self.state = TransferState::Done;
        }
        gpio.set_pin_state(Pin::SIO, bit);
    }

    /// Bytes shifted out for the current read command, in wire order.
    fn output_bytes(&self) -> ([u8; 7], usize) {
        let mut bytes = [0; 7];
        let len = match self.command {
            Command::Status => {
                bytes[0] = self.status.read(0);
                1
            },
            Command::DateTime => {
                bytes = self.date_time.to_bytes();
                7
            },
            Command::Time => {
                bytes[..3].copy_from_slice(&self.date_time.time_bytes());
                3
            },
            Command::Alarm1 => {
                bytes[0] = self.alarm.read(0);
                bytes[1] = self.alarm.read(1);
                2
            },
            Command::Alarm2 => {
                bytes[0] = self.alarm.read(1);
                1
            },
            Command::Reset | Command::TestStart | Command::TestEnd => 0,
        };
        (bytes, len)
    }
}

impl GpioDevice for RTC {
    fn update(&mut self, gpio: &mut RomGpio) {
        if !gpio.pin_state(Pin::CS) {
            self.reset_transfer();
            self.apply_pending_offset();
            return
        }

        match self.state {
            TransferState::CommandWaitFallingEdge => {
                if !gpio.pin_state(Pin::SCK) { self.state = TransferState::CommandWaitRisingEdge }
            },
            TransferState::CommandWaitRisingEdge => self.command_wait_rising_edge(gpio),
            TransferState::InDataWaitFallingEdge => {
                if !gpio.pin_state(Pin::SCK) { self.state = TransferState::InDataWaitRisingEdge }
            },
            TransferState::InDataWaitRisingEdge => self.in_data_wait_rising_edge(gpio),
            TransferState::OutDataWaitFallingEdge => self.out_data_wait_falling_edge(gpio),
            TransferState::OutDataWaitRisingEdge => {
                if gpio.pin_state(Pin::SCK) { self.state = TransferState::OutDataWaitFallingEdge }
            },
            TransferState::Done => (),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransferState {
    CommandWaitFallingEdge,
    CommandWaitRisingEdge,
    InDataWaitFallingEdge,
    InDataWaitRisingEdge,
    OutDataWaitFallingEdge,
    OutDataWaitRisingEdge,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Reset = 0,
    Status = 1,
    DateTime = 2,
    Time = 3,
    Alarm1 = 4,
    Alarm2 = 5,
    TestStart = 6,
    TestEnd = 7,
}

impl Command {
    pub fn from(value: u8) -> Command {
        match value & 0x7 {
            0 => Command::Reset,
            1 => Command::Status,
            2 => Command::DateTime,
            3 => Command::Time,
            4 => Command::Alarm1,
            5 => Command::Alarm2,
            6 => Command::TestStart,
            7 => Command::TestEnd,
            _ => unreachable!(),
        }
    }
}
