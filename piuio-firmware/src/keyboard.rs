//! Keyboard emulation: switches become keys of an NKRO keyboard.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use embassy_usb::driver::Driver;
use piuio_common::keycodes::{key_for, BITMAP_USAGE_MAX};

use crate::{bridge::PiuioState, hid::HidWriter, switch_scanner::SwitchStates, warn};

/// Pause before resending a key report that failed to go out.
pub const RETRY_DELAY: Duration = Duration::from_millis(8);

/// Modifier byte followed by one bit per usage `0..=0x7f`.
pub const KEYBOARD_REPORT_LEN: usize = 1 + (BITMAP_USAGE_MAX as usize + 1) / 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport([u8; KEYBOARD_REPORT_LEN]);

impl Default for KeyboardReport {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl KeyboardReport {
    pub const EMPTY: Self = Self([0; KEYBOARD_REPORT_LEN]);

    pub fn from_switches(states: &SwitchStates) -> Self {
        let mut report = Self::EMPTY;
        for id in states.pressed() {
            report.add_key(key_for(id));
        }
        report
    }

    /// Returns false if `usage` does not fit the bitmap or was already down.
    pub fn add_key(&mut self, usage: u8) -> bool {
        if usage > BITMAP_USAGE_MAX {
            crate::error!("invalid key! {}", usage);
            return false;
        }
        let keys = &mut self.0[1..];
        let i = (usage >> 3) as usize;
        let bp = 1 << (usage & 7);
        let old = keys[i];
        keys[i] |= bp;
        old & bp == 0
    }

    pub fn is_key_down(&self, usage: u8) -> bool {
        usage <= BITMAP_USAGE_MAX && self.0[1 + (usage >> 3) as usize] & (1 << (usage & 7)) != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

pub struct KeyboardReporter<'d, D: Driver<'d>> {
    hid_writer: HidWriter<'d, D, KEYBOARD_REPORT_LEN>,
    last: KeyboardReport,
}

impl<'d, D: Driver<'d>> KeyboardReporter<'d, D> {
    pub fn new(hid_writer: HidWriter<'d, D, KEYBOARD_REPORT_LEN>) -> Self {
        Self {
            hid_writer,
            last: KeyboardReport::EMPTY,
        }
    }

    /// Send `report` if it differs from the last one sent. Returns true if it was sent.
    pub async fn report(&mut self, report: KeyboardReport) -> bool {
        if report == self.last {
            return false;
        }
        match self.hid_writer.write(report.as_bytes()).await {
            Ok(()) => {
                self.last = report;
                true
            }
            Err(e) => {
                warn!("Failed to send report: {:?}", e);
                false
            }
        }
    }

    /// Send the next key report published in `state`. A failed send is retried until it goes
    /// out; a report published in the meantime replaces it.
    pub async fn forward<M: RawMutex>(&mut self, state: &PiuioState<M>) {
        let mut report = state.wait_keys().await;
        while report != self.last && !self.report(report).await {
            self.hid_writer.ready().await;
            Timer::after(RETRY_DELAY).await;
            if let Some(newer) = state.take_keys() {
                report = newer;
            }
        }
    }
}

#[cfg(test)]
#[path = "keyboard_test.rs"]
mod test;
