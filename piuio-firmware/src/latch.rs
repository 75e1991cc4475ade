use embedded_hal::digital::{OutputPin, PinState};

use crate::bridge::LatchFrame;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LatchError {
    /// A latch control line could not be driven.
    Pin,
}

/// `N` daisy chained 74HC595 style shift registers.
///
/// Bits go out from position `8N - 1` down to 0 so that, once latched, position `p` is on output
/// `Q(p % 8)` of register `p / 8`, register 0 being the one wired to the MCU.
pub struct ShiftRegisterChain<O: OutputPin, const N: usize> {
    data: O,
    clock: O,
    latch: O,
    /// Output enable, active low.
    enable: Option<O>,
    /// Shift register clear, active low.
    reset: Option<O>,
    last: Option<LatchFrame<N>>,
}

impl<O: OutputPin, const N: usize> ShiftRegisterChain<O, N> {
    pub fn new(data: O, clock: O, latch: O, enable: Option<O>, reset: Option<O>) -> Self {
        Self {
            data,
            clock,
            latch,
            enable,
            reset,
            last: None,
        }
    }

    /// Put the control lines into their idle state, clear the chain and enable the outputs.
    pub fn init(&mut self) -> Result<(), LatchError> {
        set(&mut self.clock, false)?;
        set(&mut self.latch, false)?;
        if let Some(reset) = self.reset.as_mut() {
            set(reset, false)?;
            set(reset, true)?;
        }
        self.last = None;
        self.write(&LatchFrame::new())?;
        if let Some(enable) = self.enable.as_mut() {
            set(enable, false)?;
        }
        Ok(())
    }

    /// Shift `frame` out and latch it.
    pub fn write(&mut self, frame: &LatchFrame<N>) -> Result<(), LatchError> {
        for pos in (0..LatchFrame::<N>::BITS).rev() {
            set(&mut self.data, frame.is_set(pos))?;
            set(&mut self.clock, true)?;
            set(&mut self.clock, false)?;
        }
        set(&mut self.latch, true)?;
        set(&mut self.latch, false)?;
        self.last = Some(*frame);
        Ok(())
    }

    /// Like [Self::write] but does nothing when `frame` is already latched.
    pub fn update(&mut self, frame: &LatchFrame<N>) -> Result<bool, LatchError> {
        if self.last.as_ref() == Some(frame) {
            return Ok(false);
        }
        self.write(frame)?;
        Ok(true)
    }

    pub fn last(&self) -> Option<&LatchFrame<N>> {
        self.last.as_ref()
    }
}

fn set<O: OutputPin>(pin: &mut O, high: bool) -> Result<(), LatchError> {
    pin.set_state(PinState::from(high))
        .map_err(|_| LatchError::Pin)
}

#[cfg(test)]
#[path = "latch_test.rs"]
mod test;
