//! Protocol vocabulary shared by the PIUIO firmware and the host tool.
//!
//! Everything in here describes the wire format: which vendor request is used, how long the
//! reports are and where every switch and lamp lives inside them.
#![no_std]

pub mod keycodes;
pub mod lamps;
pub mod switches;
pub mod usb_vendor_message;

pub use lamps::{LampId, OUTPUT_REPORT_LEN};
pub use switches::{SwitchId, INPUT_REPORT_LEN};

/// A position inside a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitPos {
    pub byte: u8,
    pub bit: u8,
}

impl BitPos {
    pub const fn new(byte: u8, bit: u8) -> Self {
        Self { byte, bit }
    }

    #[inline]
    pub const fn mask(&self) -> u8 {
        1 << self.bit
    }

    pub fn is_set(&self, report: &[u8]) -> bool {
        report
            .get(self.byte as usize)
            .is_some_and(|b| b & self.mask() != 0)
    }

    pub fn set(&self, report: &mut [u8], value: bool) {
        if let Some(b) = report.get_mut(self.byte as usize) {
            if value {
                *b |= self.mask();
            } else {
                *b &= !self.mask();
            }
        }
    }
}
