use crate::BitPos;

/// Length of the output report the host writes with [`crate::usb_vendor_message::PIUIO_REQUEST`].
pub const OUTPUT_REPORT_LEN: usize = 8;

/// Every host controlled output of the cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LampId {
    P1SensorS0,
    P1SensorS1,
    P1UpLeft,
    P1UpRight,
    P1Center,
    P1DownLeft,
    P1DownRight,
    P2SensorS0,
    P2SensorS1,
    P2UpLeft,
    P2UpRight,
    P2Center,
    P2DownLeft,
    P2DownRight,
    Neon,
    JammaLed,
    Marquee1,
    Marquee2,
    Marquee3,
    Marquee4,
    CoinCounter,
}

impl LampId {
    pub const COUNT: usize = 21;

    pub const ALL: [LampId; Self::COUNT] = [
        LampId::P1SensorS0,
        LampId::P1SensorS1,
        LampId::P1UpLeft,
        LampId::P1UpRight,
        LampId::P1Center,
        LampId::P1DownLeft,
        LampId::P1DownRight,
        LampId::P2SensorS0,
        LampId::P2SensorS1,
        LampId::P2UpLeft,
        LampId::P2UpRight,
        LampId::P2Center,
        LampId::P2DownLeft,
        LampId::P2DownRight,
        LampId::Neon,
        LampId::JammaLed,
        LampId::Marquee1,
        LampId::Marquee2,
        LampId::Marquee3,
        LampId::Marquee4,
        LampId::CoinCounter,
    ];

    /// Player one pad lamps; the service menu uses these to show the selected mode.
    pub const P1_PADS: [LampId; 5] = [
        LampId::P1UpLeft,
        LampId::P1UpRight,
        LampId::P1Center,
        LampId::P1DownLeft,
        LampId::P1DownRight,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Where this output lives in the output report.
    pub const fn output_pos(self) -> BitPos {
        OUTPUT_LAYOUT[self as usize].1
    }

    pub const fn name(self) -> &'static str {
        match self {
            LampId::P1SensorS0 => "p1-s0",
            LampId::P1SensorS1 => "p1-s1",
            LampId::P1UpLeft => "p1-upleft",
            LampId::P1UpRight => "p1-upright",
            LampId::P1Center => "p1-center",
            LampId::P1DownLeft => "p1-downleft",
            LampId::P1DownRight => "p1-downright",
            LampId::P2SensorS0 => "p2-s0",
            LampId::P2SensorS1 => "p2-s1",
            LampId::P2UpLeft => "p2-upleft",
            LampId::P2UpRight => "p2-upright",
            LampId::P2Center => "p2-center",
            LampId::P2DownLeft => "p2-downleft",
            LampId::P2DownRight => "p2-downright",
            LampId::Neon => "neon",
            LampId::JammaLed => "jamma-led",
            LampId::Marquee1 => "marquee1",
            LampId::Marquee2 => "marquee2",
            LampId::Marquee3 => "marquee3",
            LampId::Marquee4 => "marquee4",
            LampId::CoinCounter => "coin-counter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name)
    }
}

/// PIUIO output report layout; a set bit turns the output on.
///
/// Entries are in [`LampId`] order.
pub const OUTPUT_LAYOUT: [(LampId, BitPos); LampId::COUNT] = [
    (LampId::P1SensorS0, BitPos::new(0, 0)),
    (LampId::P1SensorS1, BitPos::new(0, 1)),
    (LampId::P1UpLeft, BitPos::new(0, 2)),
    (LampId::P1UpRight, BitPos::new(0, 3)),
    (LampId::P1Center, BitPos::new(0, 4)),
    (LampId::P1DownLeft, BitPos::new(0, 5)),
    (LampId::P1DownRight, BitPos::new(0, 6)),
    (LampId::P2SensorS0, BitPos::new(2, 0)),
    (LampId::P2SensorS1, BitPos::new(2, 1)),
    (LampId::P2UpLeft, BitPos::new(2, 2)),
    (LampId::P2UpRight, BitPos::new(2, 3)),
    (LampId::P2Center, BitPos::new(2, 4)),
    (LampId::P2DownLeft, BitPos::new(2, 5)),
    (LampId::P2DownRight, BitPos::new(2, 6)),
    (LampId::Neon, BitPos::new(1, 2)),
    (LampId::JammaLed, BitPos::new(1, 3)),
    (LampId::Marquee1, BitPos::new(3, 1)),
    (LampId::Marquee2, BitPos::new(2, 7)),
    (LampId::Marquee3, BitPos::new(3, 0)),
    (LampId::Marquee4, BitPos::new(3, 2)),
    (LampId::CoinCounter, BitPos::new(3, 4)),
];

/// Build an output report with `lamps` switched on.
pub fn output_report_with(lamps: impl IntoIterator<Item = LampId>) -> [u8; OUTPUT_REPORT_LEN] {
    let mut report = [0; OUTPUT_REPORT_LEN];
    for lamp in lamps {
        lamp.output_pos().set(&mut report, true);
    }
    report
}

#[cfg(test)]
#[path = "lamps_test.rs"]
mod test;
