use super::*;

const ROM_REGISTERS: GpioRegisters = GpioRegisters {
    data: 0x4E8B,
    direction: 0x1234,
    control: 0xFFFF,
};

struct NoDevice;

impl GpioDevice for NoDevice {
    fn update(&mut self, _gpio: &mut RomGpio) {}
}

/// Drives SIO high whenever SCK is low and records the pins it saw.
struct EchoDevice {
    seen: Vec<u16>,
}

impl GpioDevice for EchoDevice {
    fn update(&mut self, gpio: &mut RomGpio) {
        self.seen.push(gpio.gpio_state());
        let sck = gpio.pin_state(Pin::SCK);
        gpio.set_pin_state(Pin::SIO, !sck);
    }
}

#[test]
fn test_read_disable_shows_rom() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    assert_eq!(*gpio.registers(), ROM_REGISTERS);

    for value in 0..0x20 {
        gpio.write_direction_register(value, &mut NoDevice);
        gpio.write_data_register(!value, &mut NoDevice);
        gpio.set_pin_state(Pin::CS, value & 0x1 != 0);
        assert_eq!(*gpio.registers(), ROM_REGISTERS);
    }
}

#[test]
fn test_read_enable_shows_pins() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    gpio.write_control_register(1, &mut NoDevice);
    gpio.write_direction_register(0xFFF5, &mut NoDevice);
    gpio.write_data_register(0xFFF7, &mut NoDevice);
    assert_eq!(*gpio.registers(), GpioRegisters { data: 0x5, direction: 0x5, control: 1 });

    gpio.set_pin_state(Pin::SIO, true);
    assert_eq!(gpio.registers().data, 0x7);
}

#[test]
fn test_disable_hides_without_clearing() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    gpio.write_control_register(1, &mut NoDevice);
    gpio.write_direction_register(0x7, &mut NoDevice);
    gpio.write_data_register(0x5, &mut NoDevice);

    gpio.write_control_register(0, &mut NoDevice);
    assert_eq!(*gpio.registers(), ROM_REGISTERS);
    assert_eq!(gpio.register(RomGpio::DATA), 0x5);
    assert_eq!(gpio.register(RomGpio::DIRECTION), 0x7);

    gpio.write_control_register(0xFFFF, &mut NoDevice);
    assert_eq!(*gpio.registers(), GpioRegisters { data: 0x5, direction: 0x7, control: 1 });
}

#[test]
fn test_pin_state_composite() {
    let pins = [Pin::SCK, Pin::SIO, Pin::CS];
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    for direction in 0..0x10 {
        for output in 0..0x10 {
            for input in 0..0x10u16 {
                gpio.reset();
                gpio.write_direction_register(direction, &mut NoDevice);
                gpio.write_data_register(output, &mut NoDevice);
                for &pin in pins.iter() {
                    gpio.set_pin_state(pin, input >> pin as u16 & 0x1 != 0);
                }
                for &pin in pins.iter() {
                    let bit = pin as u16;
                    let expected = if direction >> bit & 0x1 != 0 { output >> bit & 0x1 } else { input >> bit & 0x1 };
                    assert_eq!(gpio.pin_state(pin), expected != 0);
                }
            }
        }
    }
}

#[test]
fn test_set_pin_state_only_touches_input() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    gpio.write_control_register(1, &mut NoDevice);
    gpio.write_direction_register(0x2, &mut NoDevice);
    gpio.write_data_register(0x0, &mut NoDevice);

    // SIO is an output, driving the input half is not visible
    gpio.set_pin_state(Pin::SIO, true);
    assert!(!gpio.pin_state(Pin::SIO));
    assert_eq!(gpio.register(RomGpio::DIRECTION), 0x2);
    assert_eq!(gpio.register(RomGpio::DATA), 0x0);

    gpio.write_direction_register(0x0, &mut NoDevice);
    assert!(gpio.pin_state(Pin::SIO));
    assert_eq!(gpio.registers().data, 0x2);
}

#[test]
fn test_reset() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    gpio.write_control_register(1, &mut NoDevice);
    gpio.write_direction_register(0x7, &mut NoDevice);
    gpio.write_data_register(0x7, &mut NoDevice);
    gpio.set_pin_state(Pin::CS, true);

    gpio.reset();
    assert!(!gpio.read_enabled());
    assert_eq!(gpio.gpio_state(), 0);
    assert_eq!(*gpio.registers(), ROM_REGISTERS);
}

#[test]
fn test_device_sees_write_and_drive_is_visible() {
    let mut gpio = RomGpio::new(ROM_REGISTERS);
    let mut device = EchoDevice { seen: Vec::new() };
    gpio.write_control_register(1, &mut device);
    gpio.write_direction_register(0x5, &mut device);
    gpio.write_data_register(0x5, &mut device);
    gpio.write_data_register(0x4, &mut device);

    assert_eq!(device.seen, vec![0x0, 0x2, 0x7, 0x4]);
    // SCK went low in the last write, the device drove SIO high within the same write
    assert_eq!(gpio.registers().data, 0x6);
}
