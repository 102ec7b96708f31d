#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

pub mod clock;
pub mod config;
pub mod io;

pub use config::RtcConfig;
pub use io::Cartridge;
pub use io::gpio::{RomGpio, GpioDevice, GpioRegisters, Pin};
pub use io::gpio::rtc::{RTC, DateTime, Status, TimeBase};
