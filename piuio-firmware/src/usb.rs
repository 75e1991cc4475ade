use core::mem::MaybeUninit;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_usb::{
    control::{InResponse, OutResponse, Recipient, Request, RequestType},
    driver::Driver,
    types::InterfaceNumber,
    Builder, Config, Handler,
};
use piuio_common::{usb_vendor_message::PIUIO_REQUEST, INPUT_REPORT_LEN};

use crate::{
    bridge::{OutputReport, PiuioState},
    hid::HidWriter,
    keyboard::KEYBOARD_REPORT_LEN,
    status::LinkState,
};

// HID
const HID_DESC_DESCTYPE_HID: u8 = 0x21;
const HID_DESC_DESCTYPE_HID_REPORT: u8 = 0x22;
const HID_DESC_SPEC_1_11: [u8; 2] = [0x11, 0x01];
const HID_DESC_COUNTRY_UNSPEC: u8 = 0x00;

const HID_REQ_SET_IDLE: u8 = 0x0a;
const HID_REQ_GET_IDLE: u8 = 0x02;
const HID_REQ_GET_REPORT: u8 = 0x01;
const HID_REQ_GET_PROTOCOL: u8 = 0x03;
const HID_REQ_SET_PROTOCOL: u8 = 0x0b;

#[rustfmt::skip]
pub const KEYBOARD_REPORT_DESC: [u8; 39] = [
    0x05, 0x01, // (GLOBAL) USAGE_PAGE         0x0001 Generic Desktop Page
    0x09, 0x06, // (LOCAL)  USAGE              0x00010006 Keyboard (Application Collection)
    0xA1, 0x01, // (MAIN) COLLECTION 0x01 Application
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0xE0, //   (LOCAL)  USAGE_MINIMUM      0x000700E0 Keyboard LeftControl
    0x29, 0xE7, //   (LOCAL)  USAGE_MAXIMUM      0x000700E7 Keyboard Right GUI
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x25, 0x01, //   (GLOBAL) LOGICAL_MAXIMUM    0x01 (1)
    0x95, 0x08, //   (GLOBAL) REPORT_COUNT       0x08 (8) Number of fields
    0x75, 0x01, //   (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x81, 0x02, //   (MAIN) INPUT 0x00000002 (8 fields x 1 bit) 0=Data 1=Variable 0=Absolute
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0x00, //   (LOCAL)  USAGE_MINIMUM      0x00070000 Keyboard No event indicated
    0x29, 0x7F, //   (LOCAL)  USAGE_MAXIMUM      0x0007007F Keyboard Mute
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x25, 0x01, //   (GLOBAL) LOGICAL_MAXIMUM    0x01 (1)
    0x95, 0x80, //   (GLOBAL) REPORT_COUNT       0x80 (128) Number of fields
    0x75, 0x01, //   (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x81, 0x02, //   (MAIN) INPUT 0x00000002 (128 fields x 1 bit) 0=Data 1=Variable 0=Absolute
    0xC0,       // (MAIN)   END_COLLECTION     Application
];

const CONFIG_SIZE: usize = 128;
const BOS_SIZE: usize = 32;
const MSOS_SIZE: usize = 0;
const CONTROL_SIZE: usize = 64;

pub struct UsbBuffers {
    config_descriptor_buf: [u8; CONFIG_SIZE],
    bos_descriptor_buf: [u8; BOS_SIZE],
    msos_descriptor_buf: [u8; MSOS_SIZE],
    control_buf: [u8; CONTROL_SIZE],
}

impl Default for UsbBuffers {
    fn default() -> Self {
        Self {
            config_descriptor_buf: [0; CONFIG_SIZE],
            bos_descriptor_buf: [0; BOS_SIZE],
            msos_descriptor_buf: [0; MSOS_SIZE],
            control_buf: [0; CONTROL_SIZE],
        }
    }
}

/// Storage for the control handlers registered with the USB builder.
pub struct State<'d, M: RawMutex> {
    piuio: MaybeUninit<PiuioControl<'d, M>>,
    hid: MaybeUninit<HidControl<'d>>,
}
impl<M: RawMutex> Default for State<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}
impl<M: RawMutex> State<'_, M> {
    pub const fn new() -> Self {
        State {
            piuio: MaybeUninit::uninit(),
            hid: MaybeUninit::uninit(),
        }
    }
}

pub struct Configurator<'d> {
    device_config: Option<Config<'d>>,
    max_packet_size: u16,
    poll_ms: u8,
}

impl<'d> Configurator<'d> {
    pub fn new(device_config: Config<'d>) -> Self {
        Self {
            max_packet_size: device_config.max_packet_size_0 as u16,
            device_config: Some(device_config),
            poll_ms: 1,
        }
    }

    pub fn usb_builder<D: Driver<'d>>(
        &mut self,
        driver: D,
        buffers: &'d mut UsbBuffers,
    ) -> Option<Builder<'d, D>> {
        self.device_config.take().map(|device_config| {
            Builder::new(
                driver,
                device_config,
                &mut buffers.config_descriptor_buf,
                &mut buffers.bos_descriptor_buf,
                &mut buffers.msos_descriptor_buf,
                &mut buffers.control_buf,
            )
        })
    }

    /// A vendor class interface with no endpoints; PIUIO traffic is all on the control pipe.
    pub fn add_piuio_iface<D: Driver<'d>, M: RawMutex>(
        &self,
        builder: &mut Builder<'d, D>,
        piuio_state: &'d PiuioState<M>,
        control: &'d mut MaybeUninit<PiuioControl<'d, M>>,
    ) {
        let mut func = builder.function(0xFF, 0, 0);
        let mut iface = func.interface();
        let _alt = iface.alt_setting(0xFF, 0, 0, None);
        drop(func);

        let control = control.write(PiuioControl::new(piuio_state));
        builder.handler(control);
    }

    pub fn add_hid_iface<D: Driver<'d>, const WRITE_N: usize>(
        &self,
        builder: &mut Builder<'d, D>,
        descriptor: &'static [u8],
        subclass: u8,
        protocol: u8,
        control: &'d mut MaybeUninit<HidControl<'d>>,
    ) -> HidWriter<'d, D, WRITE_N> {
        let mut func = builder.function(3, subclass, protocol);
        let mut iface = func.interface();
        let if_num = iface.interface_number();
        let mut alt = iface.alt_setting(3, subclass, protocol, None);

        let len = descriptor.len();
        alt.descriptor(
            HID_DESC_DESCTYPE_HID,
            &[
                HID_DESC_SPEC_1_11[0],   // HID Class spec Version
                HID_DESC_SPEC_1_11[1],   //
                HID_DESC_COUNTRY_UNSPEC, // Country code not supported
                1,                       // Number of following descriptors
                HID_DESC_DESCTYPE_HID_REPORT,
                (len & 0xFF) as u8, // HID report descriptor size,
                (len >> 8 & 0xFF) as u8,
            ],
        );

        let ep_in = alt.endpoint_interrupt_in(self.max_packet_size, self.poll_ms);

        drop(func);

        let control = control.write(HidControl::new(if_num, descriptor));
        builder.handler(control);
        HidWriter::new(ep_in)
    }

    /// Add both interfaces. The keyboard is always present; it only sends reports in keyboard
    /// mode.
    pub fn add_ifaces<D: Driver<'d>, M: RawMutex>(
        &self,
        builder: &mut Builder<'d, D>,
        piuio_state: &'d PiuioState<M>,
        state: &'d mut State<'d, M>,
    ) -> HidWriter<'d, D, KEYBOARD_REPORT_LEN> {
        self.add_piuio_iface(builder, piuio_state, &mut state.piuio);
        self.add_hid_iface(builder, &KEYBOARD_REPORT_DESC, 0, 0, &mut state.hid)
    }
}

/// Answers the PIUIO vendor request and tracks the link state.
///
/// `bmRequestType 0xC0` returns the input report; `0x40` takes an output report from the data
/// stage. Any other vendor request is stalled.
pub struct PiuioControl<'d, M: RawMutex> {
    state: &'d PiuioState<M>,
    configured: bool,
}

impl<'d, M: RawMutex> PiuioControl<'d, M> {
    pub fn new(state: &'d PiuioState<M>) -> Self {
        Self {
            state,
            configured: false,
        }
    }

    fn is_piuio(req: &Request) -> bool {
        req.recipient == Recipient::Device && req.request == PIUIO_REQUEST
    }
}

impl<M: RawMutex> Handler for PiuioControl<'_, M> {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            self.configured = false;
            self.state.set_link_state(LinkState::NotMounted);
        }
    }

    fn reset(&mut self) {
        self.configured = false;
        self.state.set_link_state(LinkState::NotMounted);
    }

    fn configured(&mut self, configured: bool) {
        self.configured = configured;
        self.state.set_link_state(if configured {
            LinkState::Mounted
        } else {
            LinkState::NotMounted
        });
    }

    fn suspended(&mut self, suspended: bool) {
        self.state.set_link_state(match (suspended, self.configured) {
            (true, _) => LinkState::Suspended,
            (false, true) => LinkState::Mounted,
            (false, false) => LinkState::NotMounted,
        });
    }

    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        if req.request_type != RequestType::Vendor {
            return None;
        }
        if !Self::is_piuio(&req) {
            crate::debug!("stall vendor out {}", req.request);
            return Some(OutResponse::Rejected);
        }

        self.state.set_output(OutputReport::from_bytes(data));
        Some(OutResponse::Accepted)
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if req.request_type != RequestType::Vendor {
            return None;
        }
        if !Self::is_piuio(&req) {
            crate::debug!("stall vendor in {}", req.request);
            return Some(InResponse::Rejected);
        }

        let report = self.state.snapshot();
        let n = (req.length as usize).min(INPUT_REPORT_LEN).min(buf.len());
        buf[..n].copy_from_slice(&report.as_bytes()[..n]);
        Some(InResponse::Accepted(&buf[..n]))
    }
}

/// Class requests for the keyboard interface. Only the report protocol is supported.
pub struct HidControl<'d> {
    if_num: InterfaceNumber,
    report_descriptor: &'d [u8],
    hid_descriptor: [u8; 9],
    idle: u8,
}
impl<'d> HidControl<'d> {
    fn new(if_num: InterfaceNumber, report_descriptor: &'d [u8]) -> Self {
        HidControl {
            if_num,
            report_descriptor,
            idle: 0,
            hid_descriptor: [
                9,                                           // Length of buf inclusive of size prefix
                HID_DESC_DESCTYPE_HID,                       // Descriptor type
                HID_DESC_SPEC_1_11[0],                       // HID Class spec version
                HID_DESC_SPEC_1_11[1],                       //
                HID_DESC_COUNTRY_UNSPEC,                     // Country code not supported
                1,                                           // Number of following descriptors
                HID_DESC_DESCTYPE_HID_REPORT, // We have a HID report descriptor the host should read
                (report_descriptor.len() & 0xFF) as u8, // HID report descriptor size,
                (report_descriptor.len() >> 8 & 0xFF) as u8, //
            ],
        }
    }
}
impl Handler for HidControl<'_> {
    fn reset(&mut self) {
        self.idle = 0;
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        if (req.request_type, req.recipient, req.index)
            != (
                RequestType::Class,
                Recipient::Interface,
                self.if_num.0 as u16,
            )
        {
            return None;
        }

        match req.request {
            HID_REQ_SET_IDLE => {
                self.idle = (req.value >> 8) as u8;
                Some(OutResponse::Accepted)
            }
            HID_REQ_SET_PROTOCOL => {
                if req.value == 1 {
                    Some(OutResponse::Accepted)
                } else {
                    crate::warn!("HID Boot Protocol is unsupported.");
                    Some(OutResponse::Rejected) // UNSUPPORTED: Boot Protocol
                }
            }
            _ => Some(OutResponse::Rejected),
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if req.index != self.if_num.0 as u16 {
            return None;
        }

        match (req.request_type, req.recipient) {
            (RequestType::Standard, Recipient::Interface) => match req.request {
                Request::GET_DESCRIPTOR => match (req.value >> 8) as u8 {
                    HID_DESC_DESCTYPE_HID_REPORT => {
                        Some(InResponse::Accepted(self.report_descriptor))
                    }
                    HID_DESC_DESCTYPE_HID => Some(InResponse::Accepted(&self.hid_descriptor)),
                    _ => Some(InResponse::Rejected),
                },

                _ => Some(InResponse::Rejected),
            },
            (RequestType::Class, Recipient::Interface) => match req.request {
                HID_REQ_GET_IDLE => {
                    buf[0] = self.idle;
                    Some(InResponse::Accepted(&buf[0..1]))
                }
                HID_REQ_GET_PROTOCOL => {
                    // UNSUPPORTED: Boot Protocol
                    buf[0] = 1;
                    Some(InResponse::Accepted(&buf[0..1]))
                }
                HID_REQ_GET_REPORT => Some(InResponse::Rejected),
                _ => Some(InResponse::Rejected),
            },
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "usb_test.rs"]
mod test;
