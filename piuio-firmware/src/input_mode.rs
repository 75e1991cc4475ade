use embedded_storage::nor_flash::NorFlash;
use piuio_common::LampId;

use crate::mode_store::ModeStore;

/// How the switches are reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum InputMode {
    /// The PIUIO vendor request.
    Piuio = 0,
    /// A USB HID keyboard; the PIUIO report stays neutral.
    Keyboard = 1,
}

impl InputMode {
    pub const DEFAULT: Self = InputMode::Piuio;
    pub const ALL: [InputMode; 2] = [InputMode::Piuio, InputMode::Keyboard];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| *m as u8 == value)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The player one pad lamp lit while this mode is selected in the service menu.
    pub fn lamp(self) -> LampId {
        LampId::P1_PADS[self as usize]
    }
}

impl Default for InputMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The effective input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputModeState {
    mode: InputMode,
}

impl InputModeState {
    pub const fn new(mode: InputMode) -> Self {
        Self { mode }
    }

    /// The persisted mode, or [InputMode::DEFAULT] if there is none.
    pub fn boot<F: NorFlash>(store: &mut ModeStore<F>) -> Self {
        if cfg!(feature = "fixed-input-mode") {
            return Self::new(InputMode::DEFAULT);
        }
        match store.load() {
            Ok(Some(mode)) => {
                crate::info!("input mode {:?}", mode);
                Self::new(mode)
            }
            Ok(None) => {
                crate::info!("no saved input mode");
                Self::new(InputMode::DEFAULT)
            }
            Err(err) => {
                crate::warn!("failed to read input mode: {:?}", err);
                Self::new(InputMode::DEFAULT)
            }
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Persist `mode` and make it effective. The effective mode is unchanged if saving fails.
    pub fn commit<F: NorFlash>(
        &mut self,
        mode: InputMode,
        store: &mut ModeStore<F>,
    ) -> Result<(), crate::mode_store::ModeStoreError> {
        store.save(mode)?;
        self.mode = mode;
        Ok(())
    }
}

#[cfg(test)]
#[path = "input_mode_test.rs"]
mod test;
