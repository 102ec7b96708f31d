use super::*;
use crate::config::RtcConfig;
use super::gpio::rtc::TransferState;

const DATA: u32 = Cartridge::GPIO_ADDR;
const DIRECTION: u32 = Cartridge::GPIO_ADDR + 2;
const CONTROL: u32 = Cartridge::GPIO_ADDR + 4;

const SCK: u16 = 1 << 0;
const SIO: u16 = 1 << 1;
const CS: u16 = 1 << 2;

fn cartridge() -> Cartridge {
    let rom = (0..0x200).map(|i| i as u8).collect();
    Cartridge::new(rom, RTC::standalone(&RtcConfig::new()))
}

fn send_byte(cart: &mut Cartridge, byte: u8, msb_first: bool) {
    for i in 0..8 {
        let bit = if msb_first { 7 - i } else { i };
        let sio = if byte >> bit & 0x1 != 0 { SIO } else { 0 };
        cart.write16(DATA, CS | sio);
        cart.write16(DATA, CS | SCK | sio);
    }
}

fn read_bytes(cart: &mut Cartridge, command: u8, len: usize) -> Vec<u8> {
    cart.write16(DATA, SCK);
    cart.write16(DATA, CS | SCK);
    send_byte(cart, command, true);
    cart.write16(DIRECTION, 0x5);
    let mut bytes = vec![0; len];
    for byte in bytes.iter_mut() {
        for bit in 0..8 {
            cart.write16(DATA, CS);
            *byte |= ((cart.read16(DATA) & SIO != 0) as u8) << bit;
            cart.write16(DATA, CS | SCK);
        }
    }
    cart.write16(DIRECTION, 0x7);
    cart.write16(DATA, SCK);
    bytes
}

#[test]
fn test_rom_reads() {
    let cart = cartridge();
    assert_eq!(cart.read8(Cartridge::ROM_ADDR), 0x00);
    assert_eq!(cart.read8(Cartridge::ROM_ADDR + 0x1FF), 0xFF);
    assert_eq!(cart.read16(Cartridge::ROM_ADDR + 0x10), 0x1110);
    // Past the end of the image
    assert_eq!(cart.read8(Cartridge::ROM_ADDR + 0x200), 0x00);
}

#[test]
fn test_gpio_reads_rom_until_enabled() {
    let mut cart = cartridge();
    assert_eq!(cart.read16(DATA), 0xC5C4);
    assert_eq!(cart.read16(DIRECTION), 0xC7C6);
    assert_eq!(cart.read16(CONTROL), 0xC9C8);
    assert_eq!(*cart.gpio().rom_registers(), GpioRegisters { data: 0xC5C4, direction: 0xC7C6, control: 0xC9C8 });

    cart.write16(DIRECTION, 0x7);
    cart.write16(DATA, 0x5);
    assert_eq!(cart.read16(DATA), 0xC5C4);

    cart.write16(CONTROL, 1);
    assert_eq!(cart.read16(DATA), 0x5);
    assert_eq!(cart.read16(DIRECTION), 0x7);
    assert_eq!(cart.read16(CONTROL), 0x1);
    // Bytes either side of the block are still ROM
    assert_eq!(cart.read8(DATA - 1), 0xC3);
    assert_eq!(cart.read8(CONTROL + 2), 0xCA);
}

#[test]
fn test_byte_writes_merge() {
    let mut cart = cartridge();
    cart.write8(DIRECTION, 0x05);
    cart.write8(DIRECTION + 1, 0xFF);
    assert_eq!(cart.gpio().register(RomGpio::DIRECTION), 0x5);

    cart.write8(CONTROL, 0x01);
    assert!(cart.gpio().read_enabled());
    cart.write8(DATA, 0x04);
    assert_eq!(cart.read8(DATA), 0x04);
    assert_eq!(cart.read8(DATA + 1), 0x00);
}

#[test]
fn test_unaligned_halfword_write() {
    let mut cart = cartridge();
    cart.write16(CONTROL + 1, 1);
    assert!(cart.gpio().read_enabled());
}

#[test]
fn test_rtc_over_bus() {
    let mut cart = cartridge();
    cart.write16(CONTROL, 1);
    cart.write16(DIRECTION, 0x7);
    assert_eq!(read_bytes(&mut cart, 0x63, 1), vec![0x40]);
    assert_eq!(read_bytes(&mut cart, 0x65, 7), vec![0x24, 0x02, 0x10, 0x03, 0x10, 0x09, 0x30]);

    // Time write, then read back through the full record
    cart.write16(DATA, SCK);
    cart.write16(DATA, CS | SCK);
    send_byte(&mut cart, 0x66, true);
    for &byte in [0x21, 0x45, 0x00].iter() { send_byte(&mut cart, byte, false) }
    cart.write16(DATA, SCK);
    assert_eq!(read_bytes(&mut cart, 0x65, 7), vec![0x24, 0x02, 0x10, 0x03, 0xA1, 0x45, 0x00]);
    assert_eq!(cart.rtc().date_time().hour, 0xA1);
}

#[test]
fn test_reset() {
    let mut cart = cartridge();
    cart.write16(CONTROL, 1);
    cart.write16(DIRECTION, 0x7);
    cart.write16(DATA, SCK);
    cart.write16(DATA, CS | SCK);
    send_byte(&mut cart, 0x60, false);
    assert_ne!(cart.rtc().state(), TransferState::CommandWaitFallingEdge);

    cart.reset();
    assert!(!cart.gpio().read_enabled());
    assert_eq!(cart.read16(DATA), 0xC5C4);
    assert_eq!(cart.rtc().state(), TransferState::CommandWaitFallingEdge);
}
