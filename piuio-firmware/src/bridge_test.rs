extern crate std;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use piuio_common::SwitchId;
use std::vec::Vec;

use super::*;

#[test]
fn input_report_from_switches() {
    assert_eq!(InputReport::from_switches(&SwitchStates::empty()), InputReport::NEUTRAL);

    let states: SwitchStates = [SwitchId::P1UpLeft, SwitchId::P2DownRight, SwitchId::Service]
        .into_iter()
        .collect();
    let report = InputReport::from_switches(&states);
    assert_eq!(
        report.as_bytes(),
        &[0xfe, 0xbf, 0xef, 0xff, 0xff, 0xff, 0xff, 0xff]
    );

    let all: SwitchStates = SwitchId::ALL.into_iter().collect();
    let report = InputReport::from_switches(&all);
    assert_eq!(
        report.as_bytes(),
        &[0xe0, 0x39, 0xe0, 0xfb, 0xff, 0xff, 0xff, 0xff]
    );

    let decoded: Vec<_> = piuio_common::switches::pressed_in(report.as_bytes()).collect();
    assert_eq!(decoded, SwitchId::ALL);
}

#[test]
fn output_report_from_bytes() {
    assert_eq!(OutputReport::from_bytes(&[]), OutputReport::default());
    assert_eq!(
        OutputReport::from_bytes(&[1, 2, 3]).0,
        [1, 2, 3, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        OutputReport::from_bytes(&[9; 12]).0,
        [9; OUTPUT_REPORT_LEN]
    );
}

#[test]
fn output_report_lamps() {
    assert_eq!(OutputReport::default().lit().count(), 0);
    assert_eq!(OutputReport([0xff; 8]).lit().collect::<Vec<_>>(), LampId::ALL);

    let report = OutputReport::with_lamps([LampId::P2Center, LampId::Marquee4]);
    assert_eq!(report.0, [0, 0, 0b1_0000, 0b100, 0, 0, 0, 0]);
    assert!(report.is_lit(LampId::P2Center));
    assert!(!report.is_lit(LampId::P1Center));
    assert_eq!(
        report.lit().collect::<Vec<_>>(),
        [LampId::P2Center, LampId::Marquee4]
    );
}

#[test]
fn latch_frame() {
    let frame = LatchFrame::<2>::new().with(0, true).with(9, true).with(16, true);
    assert_eq!(frame.0, [0b1, 0b10]);
    assert!(frame.is_set(9));
    assert!(!frame.is_set(8));
    assert!(!frame.is_set(16));

    let mut frame = frame;
    frame.set(0, false);
    assert_eq!(frame.0, [0, 0b10]);
}

const MAP: LampMap<2> = LampMap::new()
    .lamp(LampId::P1UpLeft, 15)
    .lamp(LampId::Neon, 0)
    .lamp(LampId::CoinCounter, 8)
    .always_on(4);

#[test]
fn lamp_map_frame() {
    assert_eq!(MAP.position(LampId::Neon), Some(0));
    assert_eq!(MAP.position(LampId::Marquee1), None);

    assert_eq!(MAP.frame(&OutputReport::default()).0, [0b1_0000, 0]);
    assert_eq!(
        MAP.frame(&OutputReport([0xff; 8])).0,
        [0b1_0001, 0b1000_0001]
    );
    // unmapped lamps are dropped
    assert_eq!(
        MAP.frame(&OutputReport::with_lamps([LampId::P1UpLeft, LampId::Marquee1])).0,
        [0b1_0000, 0b1000_0000]
    );
}

#[test]
fn state_input_snapshot() {
    let state = PiuioState::<NoopRawMutex>::new();
    assert_eq!(state.snapshot(), InputReport::NEUTRAL);

    let report = InputReport::from_switches(&[SwitchId::Test].into_iter().collect());
    state.publish(report);
    assert_eq!(state.snapshot(), report);
}

#[test]
fn state_output_latest_wins() {
    let state = PiuioState::<NoopRawMutex>::new();
    assert_eq!(state.take_output(), None);

    state.set_output(OutputReport([1; 8]));
    state.set_output(OutputReport([2; 8]));
    assert_eq!(state.take_output(), Some(OutputReport([2; 8])));
    assert_eq!(state.take_output(), None);

    state.set_output(OutputReport([3; 8]));
    assert_eq!(block_on(state.wait_output()), OutputReport([3; 8]));
}

#[test]
fn state_flags() {
    let state = PiuioState::<NoopRawMutex>::default();
    assert_eq!(state.link_state(), LinkState::NotMounted);
    state.set_link_state(LinkState::Suspended);
    assert_eq!(state.link_state(), LinkState::Suspended);

    assert!(!state.is_menu_active());
    state.set_menu_active(true);
    assert!(state.is_menu_active());
}

#[test]
fn state_keys_latest_wins() {
    let state = PiuioState::<NoopRawMutex>::new();
    let down = KeyboardReport::from_switches(&[SwitchId::P2UpLeft].into_iter().collect());

    state.publish_keys(down);
    state.publish_keys(KeyboardReport::EMPTY);
    assert_eq!(block_on(state.wait_keys()), KeyboardReport::EMPTY);

    state.publish_keys(down);
    assert_eq!(block_on(state.wait_keys()), down);
}
