use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use piuio_common::SwitchId;

use crate::debounce::{DebounceConfig, Debouncer};

/// How long the multiplexer output needs to follow a change of the select lines.
pub const MUX_SETTLE: Duration = Duration::from_micros(10);

/// Where a switch is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchSource {
    /// Index into the scanner's direct input pins.
    Direct(u8),
    /// `channel` of the multiplexer whose output is on mux input pin `input`.
    Mux { input: u8, channel: u8 },
}

/// Compile time wiring table: switch identity to physical source. Unmapped switches never press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchMap {
    sources: [Option<SwitchSource>; SwitchId::COUNT],
}

impl Default for SwitchMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchMap {
    pub const fn new() -> Self {
        Self {
            sources: [None; SwitchId::COUNT],
        }
    }

    pub const fn with(mut self, id: SwitchId, source: SwitchSource) -> Self {
        self.sources[id as usize] = Some(source);
        self
    }

    pub const fn direct(self, id: SwitchId, pin: u8) -> Self {
        self.with(id, SwitchSource::Direct(pin))
    }

    pub const fn mux(self, id: SwitchId, input: u8, channel: u8) -> Self {
        self.with(id, SwitchSource::Mux { input, channel })
    }

    pub fn source(&self, id: SwitchId) -> Option<SwitchSource> {
        self.sources[id.index()]
    }

    /// Mapped switches in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (SwitchId, SwitchSource)> + '_ {
        SwitchId::ALL
            .into_iter()
            .zip(self.sources.iter())
            .filter_map(|(id, s)| s.map(|s| (id, s)))
    }

    pub fn uses_channel(&self, channel: u8) -> bool {
        self.iter()
            .any(|(_, s)| matches!(s, SwitchSource::Mux { channel: c, .. } if c == channel))
    }
}

/// Debounced state of every switch; one bit per [SwitchId].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchStates(u16);

impl SwitchStates {
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn is_pressed(&self, id: SwitchId) -> bool {
        self.0 & (1 << id.index()) != 0
    }

    pub fn set(&mut self, id: SwitchId, pressed: bool) {
        if pressed {
            self.0 |= 1 << id.index();
        } else {
            self.0 &= !(1 << id.index());
        }
    }

    pub fn all_pressed(&self, ids: &[SwitchId]) -> bool {
        ids.iter().all(|id| self.is_pressed(*id))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn pressed(&self) -> impl Iterator<Item = SwitchId> + '_ {
        SwitchId::ALL.into_iter().filter(move |id| self.is_pressed(*id))
    }

    /// Switches pressed in `self` but not in `prev`.
    pub fn pressed_since(&self, prev: &SwitchStates) -> SwitchStates {
        Self(self.0 & !prev.0)
    }
}

impl FromIterator<SwitchId> for SwitchStates {
    fn from_iter<T: IntoIterator<Item = SwitchId>>(iter: T) -> Self {
        let mut states = Self::empty();
        for id in iter {
            states.set(id, true);
        }
        states
    }
}

/// Samples direct inputs and up to `2^SEL` channels of multiplexed inputs, debouncing each switch.
///
/// Inputs are active low with pull-ups. Multiplexer select lines are driven in binary, with
/// `select[0]` the least significant bit.
pub struct SwitchScanner<
    I: InputPin,
    O: OutputPin,
    const DIRECT: usize,
    const MUX_IN: usize,
    const SEL: usize,
> {
    map: SwitchMap,
    direct: [I; DIRECT],
    mux_inputs: [I; MUX_IN],
    select: [O; SEL],
    debouncers: [Debouncer; SwitchId::COUNT],
    config: DebounceConfig,
    states: SwitchStates,
}

impl<I: InputPin, O: OutputPin, const DIRECT: usize, const MUX_IN: usize, const SEL: usize>
    SwitchScanner<I, O, DIRECT, MUX_IN, SEL>
{
    pub fn new(
        map: SwitchMap,
        direct: [I; DIRECT],
        mux_inputs: [I; MUX_IN],
        select: [O; SEL],
        config: DebounceConfig,
    ) -> Self {
        for (id, source) in map.iter() {
            let ok = match source {
                SwitchSource::Direct(pin) => (pin as usize) < DIRECT,
                SwitchSource::Mux { input, channel } => {
                    (input as usize) < MUX_IN && (channel as usize) < channel_count(SEL)
                }
            };
            if !ok {
                crate::warn!("switch {} is wired to a missing pin", id.name());
            }
        }
        Self {
            map,
            direct,
            mux_inputs,
            select,
            debouncers: [Debouncer::new(); SwitchId::COUNT],
            config,
            states: SwitchStates::empty(),
        }
    }

    pub fn states(&self) -> SwitchStates {
        self.states
    }

    /// Sample every switch once and return the debounced states.
    pub async fn scan(&mut self) -> SwitchStates {
        let now = Instant::now();
        let map = self.map;

        for (id, source) in map.iter() {
            if let SwitchSource::Direct(pin) = source {
                let raw = self.direct.get_mut(pin as usize).is_some_and(read_pressed);
                self.feed(id, raw, now);
            }
        }

        if MUX_IN > 0 {
            for channel in 0..channel_count(SEL) {
                let channel = channel as u8;
                if !self.map.uses_channel(channel) {
                    continue;
                }
                self.select_channel(channel);
                Timer::after(MUX_SETTLE).await;

                for (id, source) in map.iter() {
                    if let SwitchSource::Mux { input, channel: c } = source {
                        if c == channel {
                            let raw = self
                                .mux_inputs
                                .get_mut(input as usize)
                                .is_some_and(read_pressed);
                            self.feed(id, raw, now);
                        }
                    }
                }
            }
        }

        self.states
    }

    fn feed(&mut self, id: SwitchId, raw: bool, now: Instant) {
        let d = &mut self.debouncers[id.index()];
        if d.update(raw, now, &self.config) {
            self.states.set(id, d.is_pressed());
        }
    }

    fn select_channel(&mut self, channel: u8) {
        for (i, pin) in self.select.iter_mut().enumerate() {
            let high = i < 8 && (channel >> i) & 1 == 1;
            let _ = pin.set_state(PinState::from(high));
        }
    }
}

/// Channels `sel` select lines address, capped at the 256 a [SwitchSource::Mux] can name.
const fn channel_count(sel: usize) -> usize {
    if sel >= 8 {
        256
    } else {
        1 << sel
    }
}

/// A read error counts as released.
fn read_pressed<I: InputPin>(pin: &mut I) -> bool {
    pin.is_low().unwrap_or(false)
}

#[cfg(test)]
#[path = "switch_scanner_test.rs"]
mod test;
