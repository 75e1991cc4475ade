use crate::SwitchId;

/// HID keyboard usages (page 0x07) used by keyboard emulation mode.
pub mod usage {
    pub const C: u8 = 0x06;
    pub const E: u8 = 0x08;
    pub const Q: u8 = 0x14;
    pub const S: u8 = 0x16;
    pub const Z: u8 = 0x1d;
    pub const F1: u8 = 0x3a;
    pub const F2: u8 = 0x3b;
    pub const F5: u8 = 0x3e;
    pub const F6: u8 = 0x3f;
    pub const F9: u8 = 0x42;
    pub const KP1: u8 = 0x59;
    pub const KP3: u8 = 0x5b;
    pub const KP5: u8 = 0x5d;
    pub const KP7: u8 = 0x5f;
    pub const KP9: u8 = 0x61;
}

/// Highest usage the keyboard bitmap report can carry.
pub const BITMAP_USAGE_MAX: u8 = 0x7f;

/// The key each switch sends in keyboard emulation mode. Lane order is `zqsec` for player one and
/// `17593` on the keypad for player two.
pub const fn key_for(id: SwitchId) -> u8 {
    match id {
        SwitchId::P1UpLeft => usage::Q,
        SwitchId::P1UpRight => usage::E,
        SwitchId::P1Center => usage::S,
        SwitchId::P1DownLeft => usage::Z,
        SwitchId::P1DownRight => usage::C,
        SwitchId::P2UpLeft => usage::KP7,
        SwitchId::P2UpRight => usage::KP9,
        SwitchId::P2Center => usage::KP5,
        SwitchId::P2DownLeft => usage::KP1,
        SwitchId::P2DownRight => usage::KP3,
        SwitchId::P1Coin => usage::F5,
        SwitchId::P2Coin => usage::F6,
        SwitchId::Test => usage::F2,
        SwitchId::Service => usage::F9,
        SwitchId::Clear => usage::F1,
    }
}
