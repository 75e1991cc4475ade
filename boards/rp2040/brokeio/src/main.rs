#![no_std]
#![no_main]

use piuio_builder::{
    bridge::LampMap, common::LampId, common::SwitchId, debounce::DebounceConfig,
    switch_scanner::SwitchMap, usb::ConfigBuilder,
};

// ---------------- Board Config ------------------

// Two 4067 multiplexers; switch `n` of the brokeIO numbering is on mux `n / 16`, channel `n % 16`.
const DIRECT_N: usize = 0;
const MUX_IN_N: usize = 2;
const SEL_N: usize = 4;

const SWITCH_MAP: SwitchMap = SwitchMap::new()
    .mux(SwitchId::P1UpLeft, 1, 7)
    .mux(SwitchId::P1UpRight, 1, 6)
    .mux(SwitchId::P1Center, 1, 5)
    .mux(SwitchId::P1DownLeft, 1, 4)
    .mux(SwitchId::P1DownRight, 1, 3)
    .mux(SwitchId::P2UpLeft, 0, 4)
    .mux(SwitchId::P2UpRight, 0, 3)
    .mux(SwitchId::P2Center, 0, 2)
    .mux(SwitchId::P2DownLeft, 0, 1)
    .mux(SwitchId::P2DownRight, 0, 0)
    .mux(SwitchId::P1Coin, 1, 13)
    .mux(SwitchId::P2Coin, 0, 10)
    .mux(SwitchId::Test, 1, 14)
    .mux(SwitchId::Service, 1, 9)
    .mux(SwitchId::Clear, 1, 8);

const DEBOUNCE: DebounceConfig = DebounceConfig::from_millis(15, 15);

// Four 74HC595 lamp drivers
const LATCH_N: usize = 4;

const LAMP_MAP: LampMap<LATCH_N> = LampMap::new()
    .lamp(LampId::P1UpLeft, 29)
    .lamp(LampId::P1UpRight, 28)
    .lamp(LampId::P1Center, 27)
    .lamp(LampId::P1DownLeft, 26)
    .lamp(LampId::P1DownRight, 25)
    .lamp(LampId::P2UpLeft, 13)
    .lamp(LampId::P2UpRight, 12)
    .lamp(LampId::P2Center, 11)
    .lamp(LampId::P2DownLeft, 10)
    .lamp(LampId::P2DownRight, 9)
    .lamp(LampId::P1SensorS0, 31)
    .lamp(LampId::P1SensorS1, 30)
    .lamp(LampId::P2SensorS0, 15)
    .lamp(LampId::P2SensorS1, 14)
    .lamp(LampId::Marquee1, 6)
    .lamp(LampId::Marquee2, 8)
    .lamp(LampId::Marquee3, 7)
    .lamp(LampId::Marquee4, 5)
    .lamp(LampId::Neon, 21)
    .lamp(LampId::CoinCounter, 3)
    .lamp(LampId::JammaLed, 20)
    .always_on(4);

// Flash; the input mode record lives at piuio_builder::MODE_STORE_BASE
const FLASH_SIZE: usize = 2 * 1024 * 1024;

// USB config
static CONFIG_BUILDER: ConfigBuilder = ConfigBuilder {
    vendor_id: piuio_builder::common::usb_vendor_message::VENDOR_ID,
    product_id: piuio_builder::common::usb_vendor_message::PRODUCT_ID,
    manufacturer: "Andamiro",
    product: "PIUIO",
    serial_number: "piuio:brokeio",
    max_power: 500,
};

// GPIO 25 is mux select S3 on this board so the status LED is moved to GPIO 28
macro_rules! config_pins {
    (peripherals: $p:ident) => {
        piuio_builder::config_mux_pins_rp!(peripherals: $p,
            direct: [],
            mux_inputs: [PIN_26, PIN_27],
            select: [PIN_22, PIN_23, PIN_24, PIN_25],
            mux_enable: PIN_21,
            latch: {data: PIN_9, clock: PIN_8, rclk: PIN_18, reset: PIN_19, enable: PIN_20},
            led: PIN_28)
    };
}

// ----------- End of board config ----------------

piuio_builder::rp_run_piuio! {}
