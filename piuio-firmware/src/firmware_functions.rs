//! Chip specific actions the core can trigger but not implement.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

pub type BootFn = &'static (dyn Fn() + Sync);

struct Hooks {
    reset: Option<BootFn>,
    enter_bootloader: Option<BootFn>,
}

static HOOKS: CriticalSectionMutex<RefCell<Hooks>> = CriticalSectionMutex::new(RefCell::new(Hooks {
    reset: None,
    enter_bootloader: None,
}));

/// Restart the controller. Does nothing if no reset hook was registered.
pub fn reset() {
    if let Some(f) = HOOKS.lock(|h| h.borrow_mut().reset.take()) {
        f();
    }
}

/// Reboot into the chip's USB mass storage bootloader so new firmware can be copied on.
pub fn enter_bootloader() {
    if let Some(f) = HOOKS.lock(|h| h.borrow_mut().enter_bootloader.take()) {
        crate::info!("entering usb bootloader");
        f();
    }
}

/// Register the function [reset] calls.
///
/// ```
/// use piuio_firmware::firmware_functions::handle_reset;
/// # pub mod cortex_m { pub mod peripheral {pub mod SCB {pub fn sys_reset() {}}}}
///
/// fn myreset() {
///     cortex_m::peripheral::SCB::sys_reset();
/// }
///
/// handle_reset(Some(&myreset));
/// ```
pub fn handle_reset(value: Option<BootFn>) {
    HOOKS.lock(|h| h.borrow_mut().reset = value);
}

/// Register the function [enter_bootloader] calls.
pub fn handle_enter_bootloader(value: Option<BootFn>) {
    HOOKS.lock(|h| h.borrow_mut().enter_bootloader = value);
}

#[cfg(all(not(test), feature = "reset-on-panic", target_os = "none"))]
mod panic {
    #[panic_handler]
    fn panic(_info: &core::panic::PanicInfo) -> ! {
        super::reset();

        loop {}
    }
}
