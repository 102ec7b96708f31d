//! Game side of the RTC serial protocol, bit-banged through the cartridge bus.

#[cfg(test)]
mod tests;

use anyhow::{ensure, Result};

use rtc_core::io::MemoryHandler;
use rtc_core::io::gpio::rtc::calendar::is_valid_bcd;
use rtc_core::{Cartridge, DateTime, Status};

const DATA: u32 = Cartridge::GPIO_ADDR;
const DIRECTION: u32 = Cartridge::GPIO_ADDR + 2;
const CONTROL: u32 = Cartridge::GPIO_ADDR + 4;

const SCK: u16 = 1 << 0;
const SIO: u16 = 1 << 1;
const CS: u16 = 1 << 2;

/// SIO is an input while receiving, SCK and CS are always driven.
const DIRECTION_READ: u16 = 0x5;
const DIRECTION_WRITE: u16 = 0x7;

/// Bits 0, 2 and 4 are never set by the chip.
const STATUS_UNUSED: u8 = 0b0001_0101;

#[derive(Clone, Copy, Debug)]
enum Command {
    Reset = 0x60,
    WriteStatus = 0x62,
    ReadStatus = 0x63,
    WriteDateTime = 0x64,
    ReadDateTime = 0x65,
    ReadTime = 0x67,
}

pub struct Probe<'a> {
    cart: &'a mut Cartridge,
}

impl<'a> Probe<'a> {
    pub fn new(cart: &'a mut Cartridge) -> Probe<'a> {
        cart.write16(CONTROL, 1);
        Probe { cart }
    }

    pub fn reset(&mut self) {
        self.begin(Command::Reset);
        self.end();
    }

    pub fn read_status(&mut self) -> Result<Status> {
        let status = self.read(Command::ReadStatus, 1)[0];
        ensure!(status & STATUS_UNUSED == 0, "Invalid RTC status {:02X}", status);
        Ok(Status::from_bits_truncate(status))
    }

    pub fn write_status(&mut self, status: Status) {
        self.write(Command::WriteStatus, &[status.bits()]);
    }

    pub fn read_date_time(&mut self) -> Result<DateTime> {
        let bytes = self.read(Command::ReadDateTime, 7);
        for &byte in bytes.iter() {
            ensure!(is_valid_bcd(byte & !DateTime::PM_FLAG), "Invalid RTC date/time {:02X?}", bytes);
        }
        Ok(DateTime {
            year: bytes[0],
            month: bytes[1],
            day: bytes[2],
            weekday: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
        })
    }

    pub fn read_time(&mut self) -> Result<[u8; 3]> {
        let bytes = self.read(Command::ReadTime, 3);
        for &byte in bytes.iter() {
            ensure!(is_valid_bcd(byte & !DateTime::PM_FLAG), "Invalid RTC time {:02X?}", bytes);
        }
        Ok([bytes[0], bytes[1], bytes[2]])
    }

    pub fn write_date_time(&mut self, date_time: &DateTime) {
        self.write(Command::WriteDateTime, &date_time.to_bytes());
    }

    fn begin(&mut self, command: Command) {
        self.cart.write16(DATA, SCK);
        self.cart.write16(DATA, CS | SCK);
        self.cart.write16(DIRECTION, DIRECTION_WRITE);
        for i in (0..8).rev() {
            let sio = (command as u16 >> i & 0x1) << 1;
            self.cart.write16(DATA, CS | sio);
            self.cart.write16(DATA, CS | SCK | sio);
        }
    }

    fn end(&mut self) {
        self.cart.write16(DATA, SCK);
        self.cart.write16(DIRECTION, DIRECTION_WRITE);
    }

    fn read(&mut self, command: Command, len: usize) -> Vec<u8> {
        self.begin(command);
        self.cart.write16(DIRECTION, DIRECTION_READ);
        let mut bytes = vec![0; len];
        for byte in bytes.iter_mut() {
            for i in 0..8 {
                self.cart.write16(DATA, CS);
                self.cart.write16(DATA, CS | SCK);
                *byte |= ((self.cart.read16(DATA) & SIO != 0) as u8) << i;
            }
        }
        self.end();
        trace!("RTC {:?} -> {:02X?}", command, bytes);
        bytes
    }

    fn write(&mut self, command: Command, bytes: &[u8]) {
        trace!("RTC {:?} <- {:02X?}", command, bytes);
        self.begin(command);
        for &byte in bytes.iter() {
            for i in 0..8 {
                let sio = (byte as u16 >> i & 0x1) << 1;
                self.cart.write16(DATA, CS | sio);
                self.cart.write16(DATA, CS | SCK | sio);
            }
        }
        self.end();
    }
}
