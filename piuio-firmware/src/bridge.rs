//! The PIUIO reports and the state shared between the USB handler and the IO loop.

use core::{
    cell::Cell,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

use embassy_sync::{blocking_mutex::raw::RawMutex, blocking_mutex::Mutex, signal::Signal};
use piuio_common::{
    lamps::OUTPUT_LAYOUT, switches::INPUT_LAYOUT, LampId, INPUT_REPORT_LEN, OUTPUT_REPORT_LEN,
};

use crate::{keyboard::KeyboardReport, status::LinkState, switch_scanner::SwitchStates};

/// The input report answered to the host. Active low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputReport(pub [u8; INPUT_REPORT_LEN]);

impl Default for InputReport {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl InputReport {
    /// Nothing pressed.
    pub const NEUTRAL: Self = Self([0xff; INPUT_REPORT_LEN]);

    pub fn from_switches(states: &SwitchStates) -> Self {
        let mut report = Self::NEUTRAL;
        for (id, pos) in INPUT_LAYOUT.iter() {
            if states.is_pressed(*id) {
                pos.set(&mut report.0, false);
            }
        }
        report
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Lamp states written by the host. Active high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputReport(pub [u8; OUTPUT_REPORT_LEN]);

impl OutputReport {
    /// A short `data` leaves the missing tail zero; anything past the report length is ignored.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut report = [0; OUTPUT_REPORT_LEN];
        let n = data.len().min(OUTPUT_REPORT_LEN);
        report[..n].copy_from_slice(&data[..n]);
        Self(report)
    }

    pub fn with_lamps(lamps: impl IntoIterator<Item = LampId>) -> Self {
        Self(piuio_common::lamps::output_report_with(lamps))
    }

    pub fn is_lit(&self, lamp: LampId) -> bool {
        lamp.output_pos().is_set(&self.0)
    }

    pub fn lit(&self) -> impl Iterator<Item = LampId> + '_ {
        OUTPUT_LAYOUT
            .iter()
            .filter(move |(_, pos)| pos.is_set(&self.0))
            .map(|(id, _)| *id)
    }
}

/// The bits shifted into a chain of `N` 8 bit latches. Position `p` is byte `p / 8`, bit `p % 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LatchFrame<const N: usize>(pub [u8; N]);

impl<const N: usize> Default for LatchFrame<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LatchFrame<N> {
    pub const BITS: u16 = (N * 8) as u16;

    pub const fn new() -> Self {
        Self([0; N])
    }

    /// Positions outside the chain are ignored.
    pub const fn with(mut self, pos: u16, on: bool) -> Self {
        if pos < Self::BITS {
            let mask = 1 << (pos % 8);
            let i = (pos / 8) as usize;
            if on {
                self.0[i] |= mask;
            } else {
                self.0[i] &= !mask;
            }
        }
        self
    }

    pub fn set(&mut self, pos: u16, on: bool) {
        *self = self.with(pos, on);
    }

    pub fn is_set(&self, pos: u16) -> bool {
        pos < Self::BITS && self.0[(pos / 8) as usize] & (1 << (pos % 8)) != 0
    }
}

/// Which latch output drives each lamp, and which outputs are always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampMap<const N: usize> {
    positions: [Option<u16>; LampId::COUNT],
    always_on: LatchFrame<N>,
}

impl<const N: usize> Default for LampMap<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LampMap<N> {
    pub const fn new() -> Self {
        Self {
            positions: [None; LampId::COUNT],
            always_on: LatchFrame::new(),
        }
    }

    pub const fn lamp(mut self, id: LampId, pos: u16) -> Self {
        self.positions[id as usize] = Some(pos);
        self
    }

    pub const fn always_on(mut self, pos: u16) -> Self {
        self.always_on = self.always_on.with(pos, true);
        self
    }

    pub fn position(&self, id: LampId) -> Option<u16> {
        self.positions[id.index()]
    }

    pub fn frame(&self, report: &OutputReport) -> LatchFrame<N> {
        let mut frame = self.always_on;
        for id in report.lit() {
            if let Some(pos) = self.position(id) {
                frame.set(pos, true);
            }
        }
        frame
    }
}

/// State shared by the USB control handler (reader of inputs, writer of outputs) and the IO
/// controller (writer of inputs, reader of outputs). Keyboard mode reports also pass through
/// here on their way to the HID endpoint.
pub struct PiuioState<M: RawMutex> {
    input: Mutex<M, Cell<InputReport>>,
    output: Signal<M, OutputReport>,
    keys: Signal<M, KeyboardReport>,
    link: AtomicU8,
    menu_active: AtomicBool,
}

impl<M: RawMutex> Default for PiuioState<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> PiuioState<M> {
    pub const fn new() -> Self {
        Self {
            input: Mutex::new(Cell::new(InputReport::NEUTRAL)),
            output: Signal::new(),
            keys: Signal::new(),
            link: AtomicU8::new(LinkState::NotMounted as u8),
            menu_active: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, report: InputReport) {
        self.input.lock(|c| c.set(report));
    }

    /// A copy of the whole report as last published.
    pub fn snapshot(&self) -> InputReport {
        self.input.lock(|c| c.get())
    }

    /// Replace any output report not yet taken.
    pub fn set_output(&self, report: OutputReport) {
        self.output.signal(report);
    }

    pub fn take_output(&self) -> Option<OutputReport> {
        self.output.try_take()
    }

    pub async fn wait_output(&self) -> OutputReport {
        self.output.wait().await
    }

    pub fn publish_keys(&self, report: KeyboardReport) {
        self.keys.signal(report);
    }

    /// The most recent keyboard report; older unsent ones are dropped.
    pub async fn wait_keys(&self) -> KeyboardReport {
        self.keys.wait().await
    }

    /// A key report published since the last wait, if any.
    pub fn take_keys(&self) -> Option<KeyboardReport> {
        self.keys.try_take()
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::from_u8(self.link.load(Ordering::Relaxed))
    }

    pub fn set_link_state(&self, state: LinkState) {
        self.link.store(state as u8, Ordering::Relaxed);
    }

    pub fn is_menu_active(&self) -> bool {
        self.menu_active.load(Ordering::Relaxed)
    }

    pub fn set_menu_active(&self, active: bool) {
        self.menu_active.store(active, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "bridge_test.rs"]
mod test;
