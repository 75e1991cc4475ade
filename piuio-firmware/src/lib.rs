#![no_std]

#[macro_use]
mod macros;

pub mod bridge;
pub mod controller;
pub mod debounce;
pub mod firmware_functions;
pub mod hid;
pub mod input_mode;
pub mod keyboard;
pub mod latch;
pub mod menu;
pub mod mode_store;
pub mod status;
pub mod switch_scanner;
pub mod usb;

#[cfg(any(test, feature = "test-utils"))]
pub mod flash_test_stub;
#[cfg(any(test, feature = "test-utils"))]
pub mod switch_test_stub;
#[cfg(any(test, feature = "test-utils"))]
pub mod time_driver_test_stub;
#[cfg(any(test, feature = "test-utils"))]
pub mod usb_test_stub;

pub use piuio_common as common;

/// Flash offset of the input mode record. Two erase blocks from here are reserved.
pub const MODE_STORE_BASE: u32 = 0x100000;

/// Period of the IO controller loop.
pub const IO_TICK_MS: u64 = 1;

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
