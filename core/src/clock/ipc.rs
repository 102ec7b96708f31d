//! Host clock query over a two party message channel.
//!
//! The requester sends one word holding a shared memory address on the RTC channel and blocks
//! until the host answers on the same channel. The answer carries no payload, the date/time is
//! read back from shared memory.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};

use super::{ClockSource, date_time_from_chrono};
use crate::io::gpio::rtc::DateTime;

pub const RTC_CHANNEL: u32 = 4;
const RESPONSE_DONE: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IpcMessage {
    pub channel: u32,
    pub data: u32,
}

/// Memory visible to both sides of the channel.
#[derive(Clone, Debug)]
pub struct SharedMemory(Arc<Mutex<Vec<u8>>>);

impl SharedMemory {
    pub fn new(size: usize) -> SharedMemory {
        SharedMemory(Arc::new(Mutex::new(vec![0; size])))
    }

    pub fn read(&self, addr: u32, buf: &mut [u8]) {
        let mem = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = addr as usize;
        match mem.get(start..start + buf.len()) {
            Some(bytes) => buf.copy_from_slice(bytes),
            None => warn!("Ignoring Shared Memory Read at 0x{:08X}", addr),
        }
    }

    pub fn write(&self, addr: u32, bytes: &[u8]) {
        let mut mem = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = addr as usize;
        match mem.get_mut(start..start + bytes.len()) {
            Some(dest) => dest.copy_from_slice(bytes),
            None => warn!("Ignoring Shared Memory Write at 0x{:08X}", addr),
        }
    }
}

/// The real-time clock of the host.
pub trait HostRtc {
    fn read_date_time(&mut self) -> DateTime;
}

/// Host RTC backed by the local wall clock.
pub struct ChronoRtc;

impl HostRtc for ChronoRtc {
    fn read_date_time(&mut self) -> DateTime {
        date_time_from_chrono(&chrono::Local::now())
    }
}

/// Requesting side. Each query blocks until the host has filled in the snapshot.
pub struct IpcClockSource {
    tx: Sender<IpcMessage>,
    rx: Receiver<IpcMessage>,
    memory: SharedMemory,
    addr: u32,
    snapshot: Option<[u8; 7]>,
    last_seconds: u32,
}

impl IpcClockSource {
    pub fn new(tx: Sender<IpcMessage>, rx: Receiver<IpcMessage>, memory: SharedMemory, addr: u32) -> IpcClockSource {
        assert_eq!(addr & 0x3, 0, "RTC snapshot must be word aligned");
        IpcClockSource {
            tx,
            rx,
            memory,
            addr,
            snapshot: None,
            last_seconds: 0,
        }
    }

    /// Date/time bytes from the last answered query.
    pub fn snapshot(&self) -> Option<[u8; 7]> { self.snapshot }

    fn wait_for_response(&self) -> bool {
        loop {
            match self.rx.recv() {
                Ok(IpcMessage { channel: RTC_CHANNEL, .. }) => return true,
                Ok(message) => trace!("Dropping IPC message on channel {} while waiting for RTC", message.channel),
                Err(_) => return false,
            }
        }
    }
}

impl ClockSource for IpcClockSource {
    fn seconds_since_epoch(&mut self) -> u32 {
        self.snapshot = None;
        let request = IpcMessage { channel: RTC_CHANNEL, data: self.addr >> 2 };
        if self.tx.send(request).is_err() || !self.wait_for_response() {
            error!("RTC IPC channel disconnected, reusing last host time");
            return self.last_seconds;
        }

        let mut bytes = [0; 7];
        self.memory.read(self.addr, &mut bytes);
        self.snapshot = Some(bytes);
        self.last_seconds = DateTime::from_bytes(bytes, true).to_seconds(true);
        self.last_seconds
    }
}

/// Answering side. Serves RTC requests until the requester goes away.
pub struct RtcIpcService<R> where R: HostRtc {
    rtc: R,
    memory: SharedMemory,
    tx: Sender<IpcMessage>,
    rx: Receiver<IpcMessage>,
}

impl<R> RtcIpcService<R> where R: HostRtc {
    pub fn new(rtc: R, memory: SharedMemory, tx: Sender<IpcMessage>, rx: Receiver<IpcMessage>) -> RtcIpcService<R> {
        RtcIpcService { rtc, memory, tx, rx }
    }

    pub fn handle_message(&mut self, data: u32) {
        let date_time = self.rtc.read_date_time();
        self.memory.write(data << 2, &date_time.to_bytes());
        if self.tx.send(IpcMessage { channel: RTC_CHANNEL, data: RESPONSE_DONE }).is_err() {
            warn!("RTC IPC requester gone before response");
        }
    }

    pub fn run(mut self) {
        while let Ok(message) = self.rx.recv() {
            if message.channel == RTC_CHANNEL { self.handle_message(message.data) }
            else { trace!("Ignoring IPC message on channel {}", message.channel) }
        }
        debug!("RTC IPC service stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> where R: Send + 'static {
        thread::spawn(move || self.run())
    }
}

/// Wires a requester and a host service together over a fresh channel pair. The snapshot lives
/// at `addr` in `memory`.
pub fn connect<R>(rtc: R, memory: SharedMemory, addr: u32) -> (IpcClockSource, RtcIpcService<R>) where R: HostRtc {
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();
    let source = IpcClockSource::new(request_tx, response_rx, memory.clone(), addr);
    let service = RtcIpcService::new(rtc, memory, response_tx, request_rx);
    (source, service)
}
