use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{OutputPin, PinState};

use crate::bridge::PiuioState;

/// USB link as last reported by the device stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LinkState {
    NotMounted,
    Mounted,
    Suspended,
}

impl LinkState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkState::Mounted,
            2 => LinkState::Suspended,
            _ => LinkState::NotMounted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkPattern {
    /// Toggle every `n` milliseconds.
    Periodic(u32),
    AlwaysOn,
    AlwaysOff,
}

impl BlinkPattern {
    pub const NOT_MOUNTED: Self = Self::Periodic(250);
    pub const MOUNTED: Self = Self::Periodic(1000);
    pub const SUSPENDED: Self = Self::Periodic(2500);
    pub const MENU: Self = Self::Periodic(200);

    pub fn for_state(link: LinkState, menu_active: bool) -> Self {
        if menu_active {
            return Self::MENU;
        }
        match link {
            LinkState::NotMounted => Self::NOT_MOUNTED,
            LinkState::Mounted => Self::MOUNTED,
            LinkState::Suspended => Self::SUSPENDED,
        }
    }
}

/// Blinks an LED. Toggles are scheduled from the previous toggle time, not from when
/// [StatusIndicator::poll] happened to run, so the period does not drift with polling jitter.
pub struct StatusIndicator<O: OutputPin> {
    led: O,
    pattern: BlinkPattern,
    start: Instant,
    on: bool,
}

impl<O: OutputPin> StatusIndicator<O> {
    const POLL: Duration = Duration::from_millis(10);

    pub fn new(led: O, now: Instant) -> Self {
        let mut me = Self {
            led,
            pattern: BlinkPattern::NOT_MOUNTED,
            start: now,
            on: false,
        };
        me.write();
        me
    }

    pub fn pattern(&self) -> BlinkPattern {
        self.pattern
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Switching to a new pattern restarts its period at `now`.
    pub fn set_pattern(&mut self, pattern: BlinkPattern, now: Instant) {
        if pattern == self.pattern {
            return;
        }
        self.pattern = pattern;
        self.start = now;
        match pattern {
            BlinkPattern::AlwaysOn => self.on = true,
            BlinkPattern::AlwaysOff => self.on = false,
            BlinkPattern::Periodic(_) => {}
        }
        self.write();
    }

    /// Returns true if the LED was toggled.
    pub fn poll(&mut self, now: Instant) -> bool {
        let BlinkPattern::Periodic(ms) = self.pattern else {
            return false;
        };
        let period = Duration::from_millis(ms as u64);
        if now.saturating_duration_since(self.start) >= period {
            self.start += period;
            self.on = !self.on;
            self.write();
            true
        } else {
            false
        }
    }

    pub async fn run<M: RawMutex>(&mut self, state: &PiuioState<M>) -> ! {
        loop {
            let now = Instant::now();
            self.set_pattern(
                BlinkPattern::for_state(state.link_state(), state.is_menu_active()),
                now,
            );
            self.poll(now);
            Timer::after(Self::POLL).await;
        }
    }

    fn write(&mut self) {
        let _ = self.led.set_state(PinState::from(self.on));
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod test;
