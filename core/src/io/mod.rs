pub mod gpio;

#[cfg(test)]
mod tests;

use gpio::{GpioRegisters, RomGpio};
use gpio::rtc::RTC;

/// Game pak ROM with the GPIO port and its RTC mapped over it.
pub struct Cartridge {
    rom: Vec<u8>,
    gpio: RomGpio,
    rtc: RTC,
}

impl Cartridge {
    pub const ROM_ADDR: u32 = 0x08000000;
    pub const GPIO_ADDR: u32 = 0x080000C4;

    /// The GPIO block shows whatever the image holds at `0xC4..0xCA` until reads are enabled. Images too
    /// short to cover it read as zero there.
    pub fn new(rom: Vec<u8>, rtc: RTC) -> Cartridge {
        let start = (Cartridge::GPIO_ADDR - Cartridge::ROM_ADDR) as usize;
        let mut rom_registers = [0; GpioRegisters::SIZE];
        if let Some(bytes) = rom.get(start..start + GpioRegisters::SIZE) {
            rom_registers.copy_from_slice(bytes);
        }
        Cartridge {
            rom,
            gpio: RomGpio::new(GpioRegisters::from_bytes(&rom_registers)),
            rtc,
        }
    }

    pub fn reset(&mut self) {
        self.gpio.reset();
        self.rtc.reset_transfer();
    }

    pub fn gpio(&self) -> &RomGpio { &self.gpio }
    pub fn rtc(&self) -> &RTC { &self.rtc }
    pub fn rtc_mut(&mut self) -> &mut RTC { &mut self.rtc }

    fn read_rom(&self, addr: u32) -> u8 {
        match self.rom.get(addr.wrapping_sub(Cartridge::ROM_ADDR) as usize) {
            Some(byte) => *byte,
            None => { warn!("Returning Invalid ROM Read at 0x{:08X}", addr); 0 },
        }
    }

    fn gpio_offset(addr: u32) -> Option<u32> {
        let offset = addr.wrapping_sub(Cartridge::GPIO_ADDR);
        if (offset as usize) < GpioRegisters::SIZE { Some(offset) } else { None }
    }
}

impl MemoryHandler for Cartridge {
    fn read8(&self, addr: u32) -> u8 {
        match Cartridge::gpio_offset(addr) {
            Some(offset) => self.gpio.registers().read8(offset),
            None => self.read_rom(addr),
        }
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match Cartridge::gpio_offset(addr) {
            Some(offset) => {
                let current = self.gpio.register(offset);
                let value = if offset & 0x1 == 0 { current & !0x00FF | value as u16 }
                    else { current & !0xFF00 | (value as u16) << 8 };
                self.gpio.write_register(offset, value, &mut self.rtc);
            },
            None => trace!("Ignoring ROM Write 0x{:08X} = {:02X}", addr, value),
        }
    }

    fn write16(&mut self, addr: u32, value: u16) {
        let addr = addr & !0x1;
        match Cartridge::gpio_offset(addr) {
            Some(offset) => self.gpio.write_register(offset, value, &mut self.rtc),
            None => trace!("Ignoring ROM Write 0x{:08X} = {:04X}", addr, value),
        }
    }
}

pub trait MemoryHandler {
    fn read8(&self, addr: u32) -> u8;
    fn write8(&mut self, addr: u32, value: u8);

    fn read16(&self, addr: u32) -> u16 {
        (self.read8(addr + 0) as u16) << 0 |
        (self.read8(addr + 1) as u16) << 8
    }
    fn write16(&mut self, addr: u32, value: u16) {
        self.write8(addr + 0, (value >> 0) as u8);
        self.write8(addr + 1, (value >> 8) as u8);
    }
}

pub trait IORegister {
    fn read(&self, byte: u8) -> u8;
    fn write(&mut self, byte: u8, value: u8);
}
