use embassy_time::{Duration, Instant};

/// How long a raw level must hold before it is accepted. Press and release are timed separately;
/// a zero duration accepts that edge immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceConfig {
    pub press: Duration,
    pub release: Duration,
}

impl DebounceConfig {
    pub const fn from_millis(press: u64, release: u64) -> Self {
        Self {
            press: Duration::from_millis(press),
            release: Duration::from_millis(release),
        }
    }

    pub const fn disabled() -> Self {
        Self::from_millis(0, 0)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::from_millis(15, 15)
    }
}

/// Debounce state of one switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Debouncer {
    stable: bool,
    /// When the raw signal first disagreed with `stable`.
    since: Option<Instant>,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            stable: false,
            since: None,
        }
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    #[inline]
    pub fn is_settling(&self) -> bool {
        self.since.is_some()
    }

    /// Feed one raw sample taken at `now`. Returns true when the committed state changed.
    pub fn update(&mut self, raw: bool, now: Instant, config: &DebounceConfig) -> bool {
        if raw == self.stable {
            self.since = None;
            return false;
        }

        let since = *self.since.get_or_insert(now);
        let hold = if raw { config.press } else { config.release };

        if now.saturating_duration_since(since) >= hold {
            self.stable = raw;
            self.since = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod test;
