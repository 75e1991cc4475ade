pub use embassy_rp::*;

/// Create the switch, latch and LED pins of a multiplexed board.
///
/// Evaluates to `(direct, mux_inputs, select, mux_enable, latch, led)`. The multiplexers are
/// enabled (enable line low) and the latch outputs stay disabled until
/// [`ShiftRegisterChain::init`](crate::latch::ShiftRegisterChain::init) runs. Keep `mux_enable`
/// alive; dropping an `Output` releases the pin.
#[macro_export]
macro_rules! config_mux_pins_rp {
    (peripherals: $p:ident,
     direct: [$($direct:ident),*],
     mux_inputs: [$($mux_in:ident),*],
     select: [$($sel:ident),*],
     mux_enable: $mux_enable:ident,
     latch: {data: $data:ident, clock: $clock:ident, rclk: $rclk:ident,
             reset: $reset:ident, enable: $enable:ident},
     led: $led:ident) => {{
        use $crate::rp::gpio::{Input, Level, Output, Pull};
        let direct = [$(Input::new($p.$direct, Pull::Up)),*];
        let mux_inputs = [$(Input::new($p.$mux_in, Pull::Up)),*];
        let select = [$(Output::new($p.$sel, Level::Low)),*];
        let mux_enable = Output::new($p.$mux_enable, Level::Low);
        let latch = $crate::latch::ShiftRegisterChain::new(
            Output::new($p.$data, Level::Low),
            Output::new($p.$clock, Level::Low),
            Output::new($p.$rclk, Level::Low),
            Some(Output::new($p.$enable, Level::High)),
            Some(Output::new($p.$reset, Level::High)),
        );
        let led = Output::new($p.$led, Level::Low);
        (direct, mux_inputs, select, mux_enable, latch, led)
    }};
}

/// Build and run the PIUIO firmware on an RP2040.
///
/// The board crate supplies the wiring:
///
/// * `DIRECT_N`, `MUX_IN_N`, `SEL_N`: number of direct inputs, multiplexer outputs and select
///   lines.
/// * `LATCH_N`: number of shift registers in the lamp chain.
/// * `FLASH_SIZE`: size of the flash chip.
/// * `SWITCH_MAP: SwitchMap`, `LAMP_MAP: LampMap<LATCH_N>`, `DEBOUNCE: DebounceConfig`.
/// * `CONFIG_BUILDER: usb::ConfigBuilder`.
/// * a `config_pins!(peripherals: p)` macro evaluating to the tuple
///   [`config_mux_pins_rp`](crate::config_mux_pins_rp) returns.
///
/// # Example `main.rs`
///
/// ```rust
/// #![no_std]
/// #![no_main]
///
/// // consts and config_pins! ...
///
/// piuio_builder::rp_run_piuio! {}
/// ```
#[macro_export]
macro_rules! rp_run_piuio {
    () => {
        use piuio_builder::rp;
        use piuio_builder::{
            controller::IoController,
            menu::MenuConfig,
            mode_store::ModeStore,
            status::StatusIndicator,
            switch_scanner::SwitchScanner,
            usb::{KeyboardHidWriter, KeyboardTask},
            Instant, NoopRawMutex, SharedState, StaticCell, UsbBuffers, UsbConfigurator, UsbState,
        };
        use rp::gpio::{Input, Output};
        use rp::peripherals::{FLASH, USB};
        use rp::{
            bind_interrupts, flash,
            flash::Blocking,
            usb::{Driver, InterruptHandler},
        };

        type Flash = flash::Flash<'static, FLASH, Blocking, FLASH_SIZE>;
        type Controller = IoController<
            'static,
            NoopRawMutex,
            Input<'static>,
            Output<'static>,
            Flash,
            DIRECT_N,
            MUX_IN_N,
            SEL_N,
            LATCH_N,
        >;

        static PIUIO_STATE: StaticCell<SharedState> = StaticCell::new();

        static USB_BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
        static USB_CONFIG: StaticCell<UsbConfigurator> = StaticCell::new();
        static USB_STATE: StaticCell<UsbState<NoopRawMutex>> = StaticCell::new();

        bind_interrupts!(struct Irqs {
            USBCTRL_IRQ => InterruptHandler<USB>;
        });

        fn reset() {
            cortex_m::peripheral::SCB::sys_reset()
        }

        fn reset_to_usb_boot() {
            piuio_builder::rp::rom_data::reset_to_usb_boot(0, 0);
            #[allow(clippy::empty_loop)]
            loop {
                // Waiting for the reset to happen
            }
        }

        #[embassy_executor::task]
        async fn io_controller(mut controller: Controller) {
            controller.run().await;
        }

        #[embassy_executor::task]
        async fn keyboard(
            hid_writer: KeyboardHidWriter<'static, Driver<'static, USB>>,
            state: &'static SharedState,
        ) {
            KeyboardTask::new(hid_writer).run(state).await;
        }

        #[embassy_executor::task]
        async fn status_led(led: Output<'static>, state: &'static SharedState) {
            StatusIndicator::new(led, Instant::now()).run(state).await;
        }

        #[embassy_executor::main]
        async fn main(spawner: embassy_executor::Spawner) -> ! {
            let p = piuio_builder::rp::init(Default::default());
            let (direct, mux_inputs, select, _mux_enable, latch, led) =
                config_pins!(peripherals: p);

            let state: &'static SharedState = PIUIO_STATE.init(SharedState::new());

            let store = ModeStore::new(
                Flash::new_blocking(p.FLASH),
                piuio_builder::MODE_STORE_BASE,
            );
            let scanner = SwitchScanner::new(SWITCH_MAP, direct, mux_inputs, select, DEBOUNCE);
            let controller: Controller = IoController::new(
                state,
                scanner,
                latch,
                LAMP_MAP,
                store,
                MenuConfig::default(),
            );

            let driver = Driver::new(p.USB, Irqs);

            let usb_buffers: &'static mut UsbBuffers = USB_BUFFERS.init(UsbBuffers::default());
            let usb_config: &'static mut UsbConfigurator =
                USB_CONFIG.init(CONFIG_BUILDER.usb_configurator());

            let usb_builder = usb_config.usb_builder(driver, usb_buffers).unwrap();

            let usb_state: &'static mut UsbState<'static, NoopRawMutex> =
                USB_STATE.init(UsbState::new());
            let (hid_writer, usb_builder) =
                CONFIG_BUILDER.piuio_ifaces(usb_config, state, usb_state, usb_builder);

            let mut usb = usb_builder.build();

            piuio_builder::firmware_functions::handle_reset(Some(&reset));
            piuio_builder::firmware_functions::handle_enter_bootloader(Some(&reset_to_usb_boot));

            spawner.spawn(io_controller(controller)).unwrap();
            spawner.spawn(keyboard(hid_writer, state)).unwrap();
            spawner.spawn(status_led(led, state)).unwrap();

            usb.run().await
        }
    };
}
