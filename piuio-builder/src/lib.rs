#![no_std]

#[cfg(feature = "rp")]
pub mod rp;

#[cfg(feature = "defmt")]
use defmt_rtt as _;

pub mod usb;

pub use embassy_sync::blocking_mutex::raw::NoopRawMutex;
pub use embassy_time::Instant;
pub use piuio_firmware::usb::{Configurator as UsbConfigurator, State as UsbState, UsbBuffers};
pub use piuio_firmware::*;
pub use static_cell::StaticCell;

/// Shared state of one PIUIO bridge. All tasks run on the thread mode executor.
pub type SharedState = bridge::PiuioState<NoopRawMutex>;
