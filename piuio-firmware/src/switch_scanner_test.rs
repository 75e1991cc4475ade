extern crate std;

use embassy_futures::block_on;
use embedded_hal::digital::OutputPin;
use std::vec::Vec;

use super::*;

use crate::switch_test_stub::{Multiplexer, Pin};
use crate::time_driver_test_stub::{advance, set_time};

const MAP: SwitchMap = SwitchMap::new()
    .direct(SwitchId::P1Coin, 0)
    .direct(SwitchId::Test, 1)
    .mux(SwitchId::P1UpLeft, 0, 5)
    .mux(SwitchId::P2UpLeft, 1, 5)
    .mux(SwitchId::P1Center, 0, 9);

type TestScanner = SwitchScanner<Pin, Pin, 2, 2, 4>;

macro_rules! setup {
    ($direct:ident, $mux:ident, $scanner:ident: $config:expr; $b:block) => {
        block_on(async {
            let $direct = [Pin::pulled_up(1), Pin::pulled_up(2)];
            let mux_inputs = [Pin::new(26), Pin::new(27)];
            let select = [Pin::new(22), Pin::new(23), Pin::new(24), Pin::new(25)];
            let $mux = Multiplexer::new(Vec::from(&select), Vec::from(&mux_inputs));

            let mut $scanner = TestScanner::new(MAP, $direct.clone(), mux_inputs, select, $config);

            set_time(1000);

            $b
        })
    };
}

fn press(pin: &Pin) {
    pin.clone().set_low().unwrap();
}

fn release(pin: &Pin) {
    pin.clone().set_high().unwrap();
}

#[test]
fn switch_map() {
    assert_eq!(MAP.source(SwitchId::Test), Some(SwitchSource::Direct(1)));
    assert_eq!(
        MAP.source(SwitchId::P1Center),
        Some(SwitchSource::Mux {
            input: 0,
            channel: 9
        })
    );
    assert_eq!(MAP.source(SwitchId::Clear), None);
    assert!(MAP.uses_channel(5));
    assert!(!MAP.uses_channel(0));

    let ids: Vec<_> = MAP.iter().map(|(id, _)| id).collect();
    assert_eq!(
        ids,
        [
            SwitchId::P1UpLeft,
            SwitchId::P1Center,
            SwitchId::P2UpLeft,
            SwitchId::P1Coin,
            SwitchId::Test
        ]
    );
}

#[test]
fn switch_states() {
    let a: SwitchStates = [SwitchId::Service, SwitchId::P1Center].into_iter().collect();
    let b: SwitchStates = [SwitchId::Service].into_iter().collect();

    assert!(a.is_pressed(SwitchId::P1Center));
    assert!(!a.is_pressed(SwitchId::P2Center));
    assert!(a.all_pressed(&[SwitchId::Service, SwitchId::P1Center]));
    assert!(!b.all_pressed(&[SwitchId::Service, SwitchId::P1Center]));
    assert_eq!(a.pressed_since(&b), [SwitchId::P1Center].into_iter().collect());
    assert!(b.pressed_since(&a).is_empty());
    assert_eq!(a.pressed().collect::<Vec<_>>(), [SwitchId::P1Center, SwitchId::Service]);
}

#[test]
fn only_used_channels_are_selected() {
    setup!(_direct, mux, scanner: DebounceConfig::disabled(); {
        let start = Instant::now();
        scanner.scan().await;
        assert_eq!(mux.selected(), [5, 9]);
        // one settle delay per used channel
        assert_eq!(Instant::now() - start, MUX_SETTLE * 2);

        scanner.scan().await;
        assert_eq!(mux.selected(), [5, 9, 5, 9]);
    });
}

#[test]
fn direct_press_is_debounced() {
    setup!(direct, _mux, scanner: DebounceConfig::from_millis(5, 3); {
        assert!(scanner.scan().await.is_empty());

        press(&direct[0]);
        assert!(!scanner.scan().await.is_pressed(SwitchId::P1Coin));
        advance(4_000);
        assert!(!scanner.scan().await.is_pressed(SwitchId::P1Coin));
        advance(1_000);
        assert!(scanner.scan().await.is_pressed(SwitchId::P1Coin));

        release(&direct[0]);
        assert!(scanner.scan().await.is_pressed(SwitchId::P1Coin));
        advance(3_000);
        let states = scanner.scan().await;
        assert!(states.is_empty());
        assert_eq!(scanner.states(), states);
    });
}

#[test]
fn mux_channels() {
    setup!(_direct, mux, scanner: DebounceConfig::disabled(); {
        mux.down(0, 5);
        let states = scanner.scan().await;
        assert_eq!(states.pressed().collect::<Vec<_>>(), [SwitchId::P1UpLeft]);

        mux.down(1, 5);
        mux.down(0, 9);
        mux.up(0, 5);
        let states = scanner.scan().await;
        assert_eq!(
            states.pressed().collect::<Vec<_>>(),
            [SwitchId::P1Center, SwitchId::P2UpLeft]
        );

        // unmapped channel
        mux.down(1, 3);
        mux.up(1, 5);
        mux.up(0, 9);
        assert!(scanner.scan().await.is_empty());
    });
}

#[test]
fn read_error_is_released() {
    setup!(direct, _mux, scanner: DebounceConfig::disabled(); {
        press(&direct[1]);
        assert!(scanner.scan().await.is_pressed(SwitchId::Test));

        direct[1].set_failing(true);
        assert!(!scanner.scan().await.is_pressed(SwitchId::Test));
    });
}

#[test]
fn wide_select_bus() {
    block_on(async {
        set_time(1000);
        let map = SwitchMap::new().mux(SwitchId::Clear, 0, 200);
        let select: [Pin; 16] = core::array::from_fn(|i| Pin::new(i as u8));
        let mut scanner = SwitchScanner::<Pin, Pin, 0, 1, 16>::new(
            map,
            [],
            [Pin::pulled_up(20)],
            select.clone(),
            DebounceConfig::disabled(),
        );

        assert!(scanner.scan().await.is_empty());
        let levels: Vec<_> = select.iter().map(|p| p.get_state() == Some(true)).collect();
        let expect: Vec<_> = (0..16).map(|i| i < 8 && (200u8 >> i) & 1 == 1).collect();
        assert_eq!(levels, expect);
    });
}
