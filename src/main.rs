#[macro_use]
extern crate log;

mod probe;

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use simplelog::{Config, LevelFilter, SimpleLogger};

use rtc_core::clock::ipc::{self, ChronoRtc, SharedMemory};
use rtc_core::{Cartridge, DateTime, RtcConfig, RTC, Status, TimeBase};
use probe::Probe;

/// Address of the date/time snapshot in the memory shared with the host RTC service
const SNAPSHOT_ADDR: u32 = 0x0;
const BLANK_ROM_SIZE: usize = 0x200;

/// Talks to an emulated cartridge RTC over its GPIO port the way game code does
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cartridge ROM image, a blank image is used when missing
    #[arg(short, long)]
    rom: Option<PathBuf>,

    /// Follow the host clock through the RTC IPC service
    #[arg(long)]
    host_synced: bool,

    /// Start in 12 hour mode
    #[arg(long)]
    twelve_hour: bool,

    /// Date/time to write before reading, as BCD digits "YY-MM-DD W HH:MM:SS"
    #[arg(short, long)]
    set: Option<String>,

    /// Number of date/time reads
    #[arg(short = 'n', long, default_value_t = 1)]
    samples: u32,

    /// Seconds between reads
    #[arg(long, default_value_t = 1)]
    interval: u64,

    /// Log more, repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_bcd_fields(text: &str, separator: char) -> Result<Vec<u8>> {
    text.split(separator)
        .map(|field| u8::from_str_radix(field, 16).with_context(|| format!("Invalid BCD field {:?}", field)))
        .collect()
}

fn parse_date_time(text: &str) -> Result<DateTime> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    anyhow::ensure!(parts.len() == 3, "Expected \"YY-MM-DD W HH:MM:SS\", got {:?}", text);
    let date = parse_bcd_fields(parts[0], '-')?;
    let weekday = parse_bcd_fields(parts[1], ' ')?;
    let time = parse_bcd_fields(parts[2], ':')?;
    anyhow::ensure!(date.len() == 3 && time.len() == 3, "Expected \"YY-MM-DD W HH:MM:SS\", got {:?}", text);
    Ok(DateTime {
        year: date[0],
        month: date[1],
        day: date[2],
        weekday: weekday[0],
        hour: time[0],
        minute: time[1],
        second: time[2],
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::init(level, Config::default())?;

    let rom = match &args.rom {
        Some(path) => fs::read(path).with_context(|| format!("Unable to read ROM {}", path.display()))?,
        None => vec![0; BLANK_ROM_SIZE],
    };

    let config = if args.twelve_hour { RtcConfig::new().with_status(Status::empty()) } else { RtcConfig::new() };
    let time_base = if args.host_synced {
        let (source, service) = ipc::connect(ChronoRtc, SharedMemory::new(SNAPSHOT_ADDR as usize + 8), SNAPSHOT_ADDR);
        service.spawn();
        TimeBase::host_synced(source)
    } else { TimeBase::Standalone };
    let mut cart = Cartridge::new(rom, RTC::new(&config, time_base));
    let mut probe = Probe::new(&mut cart);

    let status = probe.read_status()?;
    info!("RTC Status {:02X}", status.bits());
    if status.contains(Status::POWER) {
        warn!("RTC lost power, resetting");
        probe.reset();
    }

    if let Some(text) = &args.set {
        let date_time = parse_date_time(text)?;
        info!("Setting RTC to {}", date_time);
        probe.write_date_time(&date_time);
    }

    for sample in 0..args.samples {
        if sample != 0 { thread::sleep(Duration::from_secs(args.interval)) }
        println!("{}", probe.read_date_time()?);
    }
    Ok(())
}
