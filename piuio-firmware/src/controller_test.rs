extern crate std;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::digital::OutputPin;
use piuio_common::{LampId, SwitchId};

use crate::{
    debounce::DebounceConfig,
    flash_test_stub::{Action, FlashStubError, NorFlashStub},
    menu::MenuState,
    switch_scanner::SwitchMap,
    hid::HidWriter,
    keyboard::{KeyboardReporter, KEYBOARD_REPORT_LEN},
    switch_test_stub::Pin,
    time_driver_test_stub::{advance, set_time},
    usb_test_stub::{MyDriver, MyEndpointIn},
};

use super::*;

const MAP: SwitchMap = SwitchMap::new()
    .direct(SwitchId::P1UpLeft, 0)
    .direct(SwitchId::P1UpRight, 1)
    .direct(SwitchId::P1Center, 2)
    .direct(SwitchId::P1DownLeft, 3)
    .direct(SwitchId::P1DownRight, 4)
    .direct(SwitchId::Service, 5)
    .direct(SwitchId::Test, 6);

const LAMPS: LampMap<2> = LampMap::new()
    .lamp(LampId::P1UpLeft, 0)
    .lamp(LampId::P1UpRight, 1)
    .lamp(LampId::P1Center, 2)
    .lamp(LampId::Neon, 9)
    .always_on(4);

type Flash<'f> = NorFlashStub<'f, 256>;
type Controller<'a, 'f> =
    IoController<'a, NoopRawMutex, Pin, Pin, &'a mut Flash<'f>, 7, 0, 0, 2>;

struct Board {
    switches: [Pin; 7],
}

impl Board {
    fn new() -> Self {
        Self {
            switches: core::array::from_fn(|i| Pin::pulled_up(i as u8)),
        }
    }

    fn pin(&self, id: SwitchId) -> Pin {
        let i = match MAP.source(id) {
            Some(crate::switch_scanner::SwitchSource::Direct(i)) => i,
            _ => panic!("{:?} not wired", id),
        };
        self.switches[i as usize].clone()
    }

    fn press(&self, id: SwitchId) {
        self.pin(id).set_low().unwrap();
    }

    fn release(&self, id: SwitchId) {
        self.pin(id).set_high().unwrap();
    }

    fn controller<'a, 'f>(
        &self,
        state: &'a PiuioState<NoopRawMutex>,
        flash: &'a mut Flash<'f>,
    ) -> Controller<'a, 'f> {
        self.controller_with(
            state,
            flash,
            MenuConfig {
                settings_threshold: Duration::from_millis(2000),
                always_bootloader: false,
            },
        )
    }

    fn controller_with<'a, 'f>(
        &self,
        state: &'a PiuioState<NoopRawMutex>,
        flash: &'a mut Flash<'f>,
        menu_config: MenuConfig,
    ) -> Controller<'a, 'f> {
        let scanner = SwitchScanner::new(
            MAP,
            self.switches.clone(),
            [],
            [],
            DebounceConfig::disabled(),
        );
        let latch = ShiftRegisterChain::new(
            Pin::new(9),
            Pin::new(8),
            Pin::new(18),
            Some(Pin::new(20)),
            Some(Pin::new(19)),
        );
        let mut ctl = IoController::new(
            state,
            scanner,
            latch,
            LAMPS,
            ModeStore::new(flash, 0),
            menu_config,
        );
        ctl.init();
        ctl
    }
}

fn tick(ctl: &mut Controller) {
    block_on(ctl.tick());
    advance(1000);
}

fn frame(positions: &[u16]) -> LatchFrame<2> {
    positions
        .iter()
        .fold(LatchFrame::new(), |f, p| f.with(*p, true))
}

#[cfg(not(feature = "fixed-input-mode"))]
fn open_menu(board: &Board, ctl: &mut Controller) {
    board.press(SwitchId::Service);
    tick(ctl);
    advance(2_000_000);
    tick(ctl);
    assert!(ctl.menu().is_selecting());
    board.release(SwitchId::Service);
    tick(ctl);
}

#[cfg(not(feature = "fixed-input-mode"))]
fn tap(board: &Board, ctl: &mut Controller, id: SwitchId) {
    board.press(id);
    tick(ctl);
    board.release(id);
    tick(ctl);
}

#[test]
fn init_lights_always_on() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let ctl = board.controller(&state, &mut flash);

    assert_eq!(ctl.mode(), InputMode::Piuio);
    assert_eq!(ctl.latched(), Some(&frame(&[4])));
}

#[test]
fn piuio_mode_publishes_switches() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller(&state, &mut flash);

    tick(&mut ctl);
    assert_eq!(state.snapshot(), InputReport::NEUTRAL);

    board.press(SwitchId::P1Center);
    board.press(SwitchId::Test);
    tick(&mut ctl);

    let expect: SwitchStates = [SwitchId::P1Center, SwitchId::Test].into_iter().collect();
    assert_eq!(state.snapshot(), InputReport::from_switches(&expect));
    assert!(!state.is_menu_active());
}

#[test]
fn host_output_drives_lamps() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller(&state, &mut flash);

    state.set_output(OutputReport::with_lamps([LampId::P1Center, LampId::Neon]));
    tick(&mut ctl);
    assert_eq!(ctl.latched(), Some(&frame(&[2, 4, 9])));

    // the last report stays latched until the host sends another
    tick(&mut ctl);
    assert_eq!(ctl.latched(), Some(&frame(&[2, 4, 9])));

    state.set_output(OutputReport::default());
    tick(&mut ctl);
    assert_eq!(ctl.latched(), Some(&frame(&[4])));
}

#[test]
fn short_service_press_is_forwarded() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller(&state, &mut flash);

    board.press(SwitchId::Service);
    tick(&mut ctl);
    advance(500_000);
    tick(&mut ctl);

    let service: SwitchStates = [SwitchId::Service].into_iter().collect();
    assert_eq!(state.snapshot(), InputReport::from_switches(&service));
    assert!(!ctl.menu().is_selecting());

    board.release(SwitchId::Service);
    tick(&mut ctl);
    assert_eq!(ctl.menu().state(), MenuState::Idle);
    assert_eq!(state.snapshot(), InputReport::NEUTRAL);
}

#[test]
#[cfg(not(feature = "fixed-input-mode"))]
fn menu_selects_keyboard_mode() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    {
        let mut ctl = board.controller(&state, &mut flash);
        state.set_output(OutputReport::with_lamps([LampId::Neon]));

        open_menu(&board, &mut ctl);
        assert!(state.is_menu_active());
        assert_eq!(state.snapshot(), InputReport::NEUTRAL);
        assert_eq!(ctl.latched(), Some(&frame(&[0, 4])));

        // gameplay input is held back while selecting
        board.press(SwitchId::Test);
        tick(&mut ctl);
        assert_eq!(state.snapshot(), InputReport::NEUTRAL);
        board.release(SwitchId::Test);

        tap(&board, &mut ctl, SwitchId::P1UpRight);
        assert_eq!(ctl.menu().selected_mode(), Some(InputMode::Keyboard));
        assert_eq!(ctl.latched(), Some(&frame(&[1, 4])));
        assert_eq!(ctl.mode(), InputMode::Piuio);

        tap(&board, &mut ctl, SwitchId::P1Center);
        assert_eq!(ctl.mode(), InputMode::Keyboard);
        assert!(!state.is_menu_active());
        // the host's lamps come back
        assert_eq!(ctl.latched(), Some(&frame(&[4, 9])));
    }

    // survives a reboot
    let ctl = board.controller(&state, &mut flash);
    assert_eq!(ctl.mode(), InputMode::Keyboard);
}

#[test]
#[cfg(not(feature = "fixed-input-mode"))]
fn menu_cancel_keeps_mode() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller(&state, &mut flash);

    open_menu(&board, &mut ctl);
    tap(&board, &mut ctl, SwitchId::P1UpLeft);
    assert_eq!(ctl.menu().selected_mode(), Some(InputMode::Keyboard));

    board.press(SwitchId::Service);
    tick(&mut ctl);
    assert_eq!(ctl.menu().state(), MenuState::Idle);
    assert_eq!(ctl.mode(), InputMode::Piuio);
    assert_eq!(ctl.into_store().load(), Ok(None));
}

#[test]
#[cfg(not(feature = "fixed-input-mode"))]
fn failed_save_keeps_mode() {
    set_time(1000);
    let fail = |_: Action, _: &mut [u8]| Err(FlashStubError::Unknown);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    flash.observer = Some(&fail);
    let mut ctl = board.controller(&state, &mut flash);

    open_menu(&board, &mut ctl);
    tap(&board, &mut ctl, SwitchId::P1UpRight);
    tap(&board, &mut ctl, SwitchId::P1Center);

    assert!(!ctl.menu().is_selecting());
    assert_eq!(ctl.mode(), InputMode::Piuio);
}

#[test]
fn keyboard_mode_sends_keys() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    ModeStore::new(&mut flash, 0)
        .save(InputMode::Keyboard)
        .unwrap();
    let mut ctl = board.controller(&state, &mut flash);
    if cfg!(feature = "fixed-input-mode") {
        assert_eq!(ctl.mode(), InputMode::Piuio);
        return;
    }
    assert_eq!(ctl.mode(), InputMode::Keyboard);

    board.press(SwitchId::P1UpLeft);
    tick(&mut ctl);
    assert_eq!(state.snapshot(), InputReport::NEUTRAL);

    let expect = KeyboardReport::from_switches(&[SwitchId::P1UpLeft].into_iter().collect());
    assert_eq!(block_on(state.wait_keys()), expect);

    board.release(SwitchId::P1UpLeft);
    tick(&mut ctl);
    assert_eq!(block_on(state.wait_keys()), KeyboardReport::EMPTY);
}

#[test]
#[cfg(not(feature = "fixed-input-mode"))]
fn held_key_survives_failed_send() {
    set_time(1000);
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    ModeStore::new(&mut flash, 0)
        .save(InputMode::Keyboard)
        .unwrap();
    let mut ctl = board.controller(&state, &mut flash);

    let ep = MyEndpointIn::default();
    let messages = ep.messages.clone();
    *ep.failures.lock().unwrap() = 1;
    let mut reporter =
        KeyboardReporter::new(HidWriter::<'_, MyDriver, KEYBOARD_REPORT_LEN>::new(ep));

    board.press(SwitchId::P1UpLeft);
    tick(&mut ctl);
    block_on(reporter.forward(&state));
    tick(&mut ctl);
    tick(&mut ctl);

    let held = KeyboardReport::from_switches(&[SwitchId::P1UpLeft].into_iter().collect());
    assert_eq!(messages.take(), std::vec![held.as_bytes().to_vec()]);
    assert_eq!(state.take_keys(), None);
}

static BOOTLOADER_CALLED: AtomicBool = AtomicBool::new(false);

fn bootloader() {
    BOOTLOADER_CALLED.store(true, Ordering::Relaxed);
}

#[test]
#[cfg(not(feature = "fixed-input-mode"))]
fn bootloader_combo_in_menu() {
    set_time(1000);
    firmware_functions::handle_enter_bootloader(Some(&bootloader));
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller(&state, &mut flash);

    for id in SwitchId::P1_PADS {
        board.press(id);
    }
    tick(&mut ctl);
    assert!(!BOOTLOADER_CALLED.load(Ordering::Relaxed));
    for id in SwitchId::P1_PADS {
        board.release(id);
    }
    tick(&mut ctl);

    open_menu(&board, &mut ctl);
    for id in SwitchId::P1_PADS {
        board.press(id);
    }
    tick(&mut ctl);
    assert!(BOOTLOADER_CALLED.load(Ordering::Relaxed));
}

#[test]
#[cfg(feature = "fixed-input-mode")]
fn bootloader_combo_without_menu() {
    set_time(1000);
    firmware_functions::handle_enter_bootloader(Some(&bootloader));
    let board = Board::new();
    let state = PiuioState::new();
    let mut flash = Flash::default();
    let mut ctl = board.controller_with(
        &state,
        &mut flash,
        MenuConfig {
            settings_threshold: Duration::from_millis(2000),
            always_bootloader: true,
        },
    );

    board.press(SwitchId::Service);
    tick(&mut ctl);
    advance(3_000_000);
    tick(&mut ctl);
    assert!(!ctl.menu().is_selecting());
    board.release(SwitchId::Service);

    for id in SwitchId::P1_PADS {
        board.press(id);
    }
    tick(&mut ctl);
    assert!(BOOTLOADER_CALLED.load(Ordering::Relaxed));
}
