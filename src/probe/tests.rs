use super::*;
use rtc_core::clock::ManualClock;
use rtc_core::{RtcConfig, RTC, TimeBase};

fn cartridge(time_base: TimeBase) -> Cartridge {
    Cartridge::new(vec![0; 0x100], RTC::new(&RtcConfig::new(), time_base))
}

#[test]
fn test_read_power_on() {
    let mut cart = cartridge(TimeBase::Standalone);
    let mut probe = Probe::new(&mut cart);
    assert_eq!(probe.read_status().unwrap(), Status::HOUR_24);
    assert_eq!(probe.read_date_time().unwrap(), DateTime::new());
    assert_eq!(probe.read_time().unwrap(), [0x10, 0x09, 0x30]);
}

#[test]
fn test_write_then_read() {
    let mut cart = cartridge(TimeBase::Standalone);
    let mut probe = Probe::new(&mut cart);
    let date_time = DateTime { year: 0x21, month: 0x07, day: 0x04, weekday: 0x00, hour: 0x89, minute: 0x41, second: 0x27 };
    probe.write_date_time(&date_time);
    // 24 hour mode drops the PM flag from the guest
    assert_eq!(probe.read_date_time().unwrap(), DateTime { hour: 0x09, ..date_time });

    probe.write_status(Status::empty());
    probe.write_date_time(&date_time);
    assert_eq!(probe.read_status().unwrap(), Status::empty());
    assert_eq!(probe.read_time().unwrap(), [0x89, 0x41, 0x27]);

    probe.reset();
    assert_eq!(probe.read_date_time().unwrap(), DateTime::cleared());
    assert_eq!(cart.rtc().status(), Status::empty());
}

#[test]
fn test_host_synced() {
    let clock = ManualClock::new(0);
    let mut cart = cartridge(TimeBase::host_synced(clock.clone()));
    let mut probe = Probe::new(&mut cart);
    probe.write_date_time(&DateTime { year: 0x24, month: 0x02, day: 0x28, weekday: 0x03, hour: 0x23, minute: 0x59, second: 0x59 });
    clock.advance(2);
    let date_time = probe.read_date_time().unwrap();
    assert_eq!(date_time.to_string(), "24-02-29 (4) 00:00:01");
}
