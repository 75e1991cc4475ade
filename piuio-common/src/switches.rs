use crate::BitPos;

/// Length of the input report served for [`crate::usb_vendor_message::PIUIO_REQUEST`].
pub const INPUT_REPORT_LEN: usize = 8;

/// Every logical switch the cabinet has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SwitchId {
    P1UpLeft,
    P1UpRight,
    P1Center,
    P1DownLeft,
    P1DownRight,
    P2UpLeft,
    P2UpRight,
    P2Center,
    P2DownLeft,
    P2DownRight,
    P1Coin,
    P2Coin,
    Test,
    Service,
    Clear,
}

impl SwitchId {
    pub const COUNT: usize = 15;

    pub const ALL: [SwitchId; Self::COUNT] = [
        SwitchId::P1UpLeft,
        SwitchId::P1UpRight,
        SwitchId::P1Center,
        SwitchId::P1DownLeft,
        SwitchId::P1DownRight,
        SwitchId::P2UpLeft,
        SwitchId::P2UpRight,
        SwitchId::P2Center,
        SwitchId::P2DownLeft,
        SwitchId::P2DownRight,
        SwitchId::P1Coin,
        SwitchId::P2Coin,
        SwitchId::Test,
        SwitchId::Service,
        SwitchId::Clear,
    ];

    /// The five pads of player one, in lane order.
    pub const P1_PADS: [SwitchId; 5] = [
        SwitchId::P1DownLeft,
        SwitchId::P1UpLeft,
        SwitchId::P1Center,
        SwitchId::P1UpRight,
        SwitchId::P1DownRight,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Where this switch lives in the input report.
    pub const fn input_pos(self) -> BitPos {
        INPUT_LAYOUT[self as usize].1
    }

    pub const fn name(self) -> &'static str {
        match self {
            SwitchId::P1UpLeft => "p1-upleft",
            SwitchId::P1UpRight => "p1-upright",
            SwitchId::P1Center => "p1-center",
            SwitchId::P1DownLeft => "p1-downleft",
            SwitchId::P1DownRight => "p1-downright",
            SwitchId::P2UpLeft => "p2-upleft",
            SwitchId::P2UpRight => "p2-upright",
            SwitchId::P2Center => "p2-center",
            SwitchId::P2DownLeft => "p2-downleft",
            SwitchId::P2DownRight => "p2-downright",
            SwitchId::P1Coin => "p1-coin",
            SwitchId::P2Coin => "p2-coin",
            SwitchId::Test => "test",
            SwitchId::Service => "service",
            SwitchId::Clear => "clear",
        }
    }
}

/// PIUIO input report layout. The report is active low: a pressed switch clears its bit and every
/// bit not listed here always reads 1.
///
/// Entries are in [`SwitchId`] order so a switch can be looked up by its index.
pub const INPUT_LAYOUT: [(SwitchId, BitPos); SwitchId::COUNT] = [
    (SwitchId::P1UpLeft, BitPos::new(0, 0)),
    (SwitchId::P1UpRight, BitPos::new(0, 1)),
    (SwitchId::P1Center, BitPos::new(0, 2)),
    (SwitchId::P1DownLeft, BitPos::new(0, 3)),
    (SwitchId::P1DownRight, BitPos::new(0, 4)),
    (SwitchId::P2UpLeft, BitPos::new(2, 0)),
    (SwitchId::P2UpRight, BitPos::new(2, 1)),
    (SwitchId::P2Center, BitPos::new(2, 2)),
    (SwitchId::P2DownLeft, BitPos::new(2, 3)),
    (SwitchId::P2DownRight, BitPos::new(2, 4)),
    (SwitchId::P1Coin, BitPos::new(1, 2)),
    (SwitchId::P2Coin, BitPos::new(3, 2)),
    (SwitchId::Test, BitPos::new(1, 1)),
    (SwitchId::Service, BitPos::new(1, 6)),
    (SwitchId::Clear, BitPos::new(1, 7)),
];

/// Decode which switches an input report shows as pressed.
pub fn pressed_in(report: &[u8]) -> impl Iterator<Item = SwitchId> + '_ {
    SwitchId::ALL
        .into_iter()
        .filter(move |id| report.len() > id.input_pos().byte as usize && !id.input_pos().is_set(report))
}

#[cfg(test)]
#[path = "switches_test.rs"]
mod test;
