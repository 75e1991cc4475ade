//! Service menu for choosing the input mode.
//!
//! Holding Service opens the menu. While it is open the player one pads navigate: up-left and
//! up-right step through the modes, tapping center on its own saves the selection and a second
//! press of Service leaves without saving. Holding all five player one pads asks for the USB
//! bootloader.

use embassy_time::{Duration, Instant};
use piuio_common::SwitchId;

use crate::{input_mode::InputMode, switch_scanner::SwitchStates};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuConfig {
    /// How long Service must be held to open the menu.
    pub settings_threshold: Duration,
    /// Accept the bootloader combo outside the menu too.
    pub always_bootloader: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            settings_threshold: Duration::from_millis(2000),
            always_bootloader: cfg!(feature = "always-bootloader"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuState {
    Idle,
    Holding {
        since: Instant,
    },
    Selecting {
        mode: InputMode,
        /// Service has been let go since the menu opened.
        service_released: bool,
        /// More than one pad was down since the pads were last all up.
        chord: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuEvent {
    None,
    Entered,
    Commit(InputMode),
    Cancel,
    Bootloader,
}

pub struct Menu {
    config: MenuConfig,
    state: MenuState,
    prev: SwitchStates,
    /// Service is still down from the gesture that closed the menu.
    service_held_over: bool,
}

impl Menu {
    pub fn new(config: MenuConfig) -> Self {
        Self {
            config,
            state: MenuState::Idle,
            prev: SwitchStates::empty(),
            service_held_over: false,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// True while gameplay input should be suppressed.
    pub fn is_selecting(&self) -> bool {
        matches!(self.state, MenuState::Selecting { .. })
    }

    pub fn selected_mode(&self) -> Option<InputMode> {
        match self.state {
            MenuState::Selecting { mode, .. } => Some(mode),
            _ => None,
        }
    }

    /// Watch for the bootloader combo alone, for builds without the menu. True on the tick the
    /// combo completes if `always_bootloader` is set.
    pub fn update_combo_only(&mut self, switches: &SwitchStates) -> bool {
        let prev = core::mem::replace(&mut self.prev, *switches);
        self.config.always_bootloader && combo_completed(switches, &prev)
    }

    /// Advance the menu with this tick's debounced switches. `current` is the effective mode,
    /// which the menu starts from when it opens.
    pub fn update(&mut self, switches: &SwitchStates, current: InputMode, now: Instant) -> MenuEvent {
        let prev = self.prev;
        self.prev = *switches;

        let pressed = switches.pressed_since(&prev);
        let released = prev.pressed_since(switches);
        let combo = combo_completed(switches, &prev);
        let service = switches.is_pressed(SwitchId::Service);

        match self.state {
            MenuState::Idle => {
                if combo && self.config.always_bootloader {
                    return MenuEvent::Bootloader;
                }
                self.service_held_over &= service;
                if service && !self.service_held_over {
                    self.state = MenuState::Holding { since: now };
                }
                MenuEvent::None
            }
            MenuState::Holding { since } => {
                if !service {
                    self.state = MenuState::Idle;
                    MenuEvent::None
                } else if now.saturating_duration_since(since) >= self.config.settings_threshold {
                    crate::info!("service menu");
                    self.state = MenuState::Selecting {
                        mode: current,
                        service_released: false,
                        chord: false,
                    };
                    MenuEvent::Entered
                } else {
                    MenuEvent::None
                }
            }
            MenuState::Selecting {
                mut mode,
                mut service_released,
                mut chord,
            } => {
                if combo {
                    self.close(service);
                    return MenuEvent::Bootloader;
                }
                if service_released && pressed.is_pressed(SwitchId::Service) {
                    self.close(service);
                    return MenuEvent::Cancel;
                }
                service_released |= !service;

                let pads_down = SwitchId::P1_PADS
                    .iter()
                    .filter(|id| switches.is_pressed(**id))
                    .count();
                chord |= pads_down > 1;

                let mut event = MenuEvent::None;
                if !chord {
                    if pressed.is_pressed(SwitchId::P1UpLeft) {
                        mode = mode.prev();
                    } else if pressed.is_pressed(SwitchId::P1UpRight) {
                        mode = mode.next();
                    } else if released.is_pressed(SwitchId::P1Center) {
                        event = MenuEvent::Commit(mode);
                    }
                }
                if pads_down == 0 {
                    chord = false;
                }

                if event == MenuEvent::None {
                    self.state = MenuState::Selecting {
                        mode,
                        service_released,
                        chord,
                    };
                } else {
                    self.close(service);
                }
                event
            }
        }
    }

    /// Back to idle. A Service press still down has to be let go before it can open the menu.
    fn close(&mut self, service: bool) {
        self.state = MenuState::Idle;
        self.service_held_over = service;
    }
}

/// All five player one pads are down and were not on the previous tick.
fn combo_completed(switches: &SwitchStates, prev: &SwitchStates) -> bool {
    switches.all_pressed(&SwitchId::P1_PADS) && !prev.all_pressed(&SwitchId::P1_PADS)
}

#[cfg(test)]
#[path = "menu_test.rs"]
mod test;
