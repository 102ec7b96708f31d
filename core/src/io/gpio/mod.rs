pub mod rtc;

#[cfg(test)]
mod tests;

/// A peripheral wired to the cartridge GPIO pins.
pub trait GpioDevice {
    /// Called on every register write, after the new internal state is stored and before the
    /// visible registers are recomputed.
    fn update(&mut self, gpio: &mut RomGpio);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pin {
    SCK = 0,
    SIO = 1,
    CS = 2,
}

bitflags! {
    pub struct GpioControl: u16 {
        const READ_ENABLE = 1 << 0;
    }
}

/// The three halfword registers as the guest sees them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GpioRegisters {
    pub data: u16,
    pub direction: u16,
    pub control: u16,
}

impl GpioRegisters {
    pub const SIZE: usize = 6;

    pub fn from_bytes(bytes: &[u8; GpioRegisters::SIZE]) -> GpioRegisters {
        GpioRegisters {
            data: u16::from_le_bytes([bytes[0], bytes[1]]),
            direction: u16::from_le_bytes([bytes[2], bytes[3]]),
            control: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn read8(&self, offset: u32) -> u8 {
        let value = match offset & !0x1 {
            0 => self.data,
            2 => self.direction,
            4 => self.control,
            _ => unreachable!(),
        };
        (value >> (offset & 0x1) * 8) as u8
    }
}

/// The cartridge GPIO port. Holds the internal pin state and keeps the guest visible register image
/// in sync with it.
pub struct RomGpio {
    registers: GpioRegisters,
    rom_registers: GpioRegisters,

    input_data: u16,
    output_data: u16,
    direction: u16,
    control: GpioControl,
}

impl RomGpio {
    pub const PIN_MASK: u16 = 0xF;
    pub const DATA: u32 = 0;
    pub const DIRECTION: u32 = 2;
    pub const CONTROL: u32 = 4;

    /// `rom_registers` is what the cartridge ROM holds behind the register block. It is shown
    /// whenever reading is disabled.
    pub fn new(rom_registers: GpioRegisters) -> RomGpio {
        let mut gpio = RomGpio {
            registers: rom_registers,
            rom_registers,

            input_data: 0,
            output_data: 0,
            direction: 0,
            control: GpioControl::empty(),
        };
        gpio.reset();
        gpio
    }

    pub fn reset(&mut self) {
        self.input_data = 0;
        self.output_data = 0;
        self.direction = 0;
        self.control = GpioControl::empty();
        self.update_rom_registers();
    }

    pub fn registers(&self) -> &GpioRegisters { &self.registers }
    pub fn rom_registers(&self) -> &GpioRegisters { &self.rom_registers }
    pub fn read_enabled(&self) -> bool { self.control.contains(GpioControl::READ_ENABLE) }

    /// Internal register value, regardless of what the guest can currently read.
    pub fn register(&self, offset: u32) -> u16 {
        match offset & !0x1 {
            RomGpio::DATA => self.output_data,
            RomGpio::DIRECTION => self.direction,
            RomGpio::CONTROL => self.control.bits(),
            _ => 0,
        }
    }

    pub fn write_register<D>(&mut self, offset: u32, value: u16, device: &mut D) where D: GpioDevice {
        match offset & !0x1 {
            RomGpio::DATA => self.write_data_register(value, device),
            RomGpio::DIRECTION => self.write_direction_register(value, device),
            RomGpio::CONTROL => self.write_control_register(value, device),
            _ => trace!("Ignoring GPIO Write at +{} = {:04X}", offset, value),
        }
    }

    pub fn write_data_register<D>(&mut self, value: u16, device: &mut D) where D: GpioDevice {
        self.output_data = value & RomGpio::PIN_MASK;
        device.update(self);
        self.update_rom_registers();
    }

    pub fn write_direction_register<D>(&mut self, value: u16, device: &mut D) where D: GpioDevice {
        self.direction = value & RomGpio::PIN_MASK;
        device.update(self);
        self.update_rom_registers();
    }

    pub fn write_control_register<D>(&mut self, value: u16, device: &mut D) where D: GpioDevice {
        self.control = GpioControl::from_bits_truncate(value);
        device.update(self);
        self.update_rom_registers();
    }

    /// Level of every pin: output data for pins driven by the guest, input data for the rest.
    pub fn gpio_state(&self) -> u16 {
        (self.input_data & !self.direction) | (self.output_data & self.direction)
    }

    pub fn pin_state(&self, pin: Pin) -> bool {
        self.gpio_state() >> pin as u16 & 0x1 != 0
    }

    /// Drives the input side of a pin. Only visible to the guest while the pin is an input.
    pub fn set_pin_state(&mut self, pin: Pin, is_high: bool) {
        let mask = (1u16 << pin as u16) & RomGpio::PIN_MASK;
        if is_high { self.input_data |= mask } else { self.input_data &= !mask }
        self.update_rom_registers();
    }

    fn update_rom_registers(&mut self) {
        self.registers = if self.read_enabled() {
            GpioRegisters {
                data: self.gpio_state(),
                direction: self.direction,
                control: GpioControl::READ_ENABLE.bits(),
            }
        } else { self.rom_registers };
    }
}
