//! The IO loop: scan the switches, run the service menu, publish reports and drive the lamps.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Ticker};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_storage::nor_flash::NorFlash;

use crate::{
    bridge::{InputReport, LampMap, LatchFrame, OutputReport, PiuioState},
    firmware_functions,
    input_mode::{InputMode, InputModeState},
    keyboard::KeyboardReport,
    latch::ShiftRegisterChain,
    menu::{Menu, MenuConfig, MenuEvent},
    mode_store::ModeStore,
    switch_scanner::{SwitchScanner, SwitchStates},
    IO_TICK_MS,
};

pub struct IoController<
    'a,
    M: RawMutex,
    I: InputPin,
    O: OutputPin,
    F: NorFlash,
    const DIRECT: usize,
    const MUX_IN: usize,
    const SEL: usize,
    const N: usize,
> {
    state: &'a PiuioState<M>,
    scanner: SwitchScanner<I, O, DIRECT, MUX_IN, SEL>,
    latch: ShiftRegisterChain<O, N>,
    lamps: LampMap<N>,
    menu: Menu,
    mode: InputModeState,
    store: ModeStore<F>,
    output: OutputReport,
    keys: KeyboardReport,
}

impl<
        'a,
        M: RawMutex,
        I: InputPin,
        O: OutputPin,
        F: NorFlash,
        const DIRECT: usize,
        const MUX_IN: usize,
        const SEL: usize,
        const N: usize,
    > IoController<'a, M, I, O, F, DIRECT, MUX_IN, SEL, N>
{
    /// Reads the persisted input mode from `store`.
    pub fn new(
        state: &'a PiuioState<M>,
        scanner: SwitchScanner<I, O, DIRECT, MUX_IN, SEL>,
        latch: ShiftRegisterChain<O, N>,
        lamps: LampMap<N>,
        mut store: ModeStore<F>,
        menu_config: MenuConfig,
    ) -> Self {
        let mode = InputModeState::boot(&mut store);
        Self {
            state,
            scanner,
            latch,
            lamps,
            menu: Menu::new(menu_config),
            mode,
            store,
            output: OutputReport::default(),
            keys: KeyboardReport::EMPTY,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode.mode()
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// The frame on the latch outputs.
    pub fn latched(&self) -> Option<&LatchFrame<N>> {
        self.latch.last()
    }

    pub fn into_store(self) -> ModeStore<F> {
        self.store
    }

    /// Bring the latch chain up dark, apart from the always on outputs.
    pub fn init(&mut self) {
        if let Err(err) = self.latch.init() {
            crate::warn!("latch init failed: {:?}", err);
        }
        self.update_lamps();
    }

    pub async fn run(&mut self) -> ! {
        self.init();
        let mut ticker = Ticker::every(Duration::from_millis(IO_TICK_MS));
        loop {
            self.tick().await;
            ticker.next().await;
        }
    }

    /// One pass of the loop.
    pub async fn tick(&mut self) {
        let switches = self.scanner.scan().await;
        self.update_menu(&switches, Instant::now());
        self.publish(&switches);
        self.update_lamps();
    }

    fn update_menu(&mut self, switches: &SwitchStates, now: Instant) {
        if cfg!(feature = "fixed-input-mode") {
            if self.menu.update_combo_only(switches) {
                firmware_functions::enter_bootloader();
            }
            return;
        }
        match self.menu.update(switches, self.mode.mode(), now) {
            MenuEvent::Bootloader => firmware_functions::enter_bootloader(),
            MenuEvent::Commit(mode) => match self.mode.commit(mode, &mut self.store) {
                Ok(()) => crate::info!("input mode now {:?}", mode),
                Err(err) => crate::warn!("failed to save input mode: {:?}", err),
            },
            MenuEvent::Cancel => crate::info!("menu cancelled"),
            MenuEvent::Entered | MenuEvent::None => {}
        }
        self.state.set_menu_active(self.menu.is_selecting());
    }

    fn publish(&mut self, switches: &SwitchStates) {
        let (input, keys) = if self.menu.is_selecting() {
            (InputReport::NEUTRAL, KeyboardReport::EMPTY)
        } else {
            match self.mode.mode() {
                InputMode::Piuio => (InputReport::from_switches(switches), KeyboardReport::EMPTY),
                InputMode::Keyboard => (
                    InputReport::NEUTRAL,
                    KeyboardReport::from_switches(switches),
                ),
            }
        };

        self.state.publish(input);
        if keys != self.keys {
            self.keys = keys;
            self.state.publish_keys(keys);
        }
    }

    fn update_lamps(&mut self) {
        if let Some(output) = self.state.take_output() {
            self.output = output;
        }
        let frame = match self.menu.selected_mode() {
            Some(mode) => self.lamps.frame(&OutputReport::with_lamps([mode.lamp()])),
            None => self.lamps.frame(&self.output),
        };
        if let Err(err) = self.latch.update(&frame) {
            crate::warn!("latch write failed: {:?}", err);
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod test;
