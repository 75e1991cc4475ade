use std::time::Duration;

use anyhow::{Result, anyhow};
use nusb::transfer::{Control, ControlType, Recipient};
use piuio_common::{
    INPUT_REPORT_LEN, LampId, OUTPUT_REPORT_LEN, SwitchId,
    lamps::output_report_with,
    switches::pressed_in,
    usb_vendor_message::{PIUIO_REQUEST, TRANSFER_TIMEOUT_MS},
};

/// The two halves of the PIUIO vendor request.
pub trait PiuioInterface {
    fn control_in(&self, request: u8, len: usize) -> Result<Vec<u8>>;
    fn control_out(&self, request: u8, data: &[u8]) -> Result<()>;
}

fn control(request: u8) -> Control {
    Control {
        control_type: ControlType::Vendor,
        recipient: Recipient::Device,
        request,
        value: 0,
        index: 0,
    }
}

impl PiuioInterface for nusb::Interface {
    fn control_in(&self, request: u8, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        let n = self
            .control_in_blocking(
                control(request),
                &mut buf,
                Duration::from_millis(TRANSFER_TIMEOUT_MS),
            )
            .map_err(|err| anyhow!("USB comms error: {}", err))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn control_out(&self, request: u8, data: &[u8]) -> Result<()> {
        self.control_out_blocking(
            control(request),
            data,
            Duration::from_millis(TRANSFER_TIMEOUT_MS),
        )
        .map_err(|err| anyhow!("USB comms error: {}", err))?;
        Ok(())
    }
}

pub struct PiuioCtl<I: PiuioInterface> {
    intf: I,
}
impl<I: PiuioInterface> PiuioCtl<I> {
    pub fn new(intf: I) -> Self {
        Self { intf }
    }

    /// Claim the vendor class interface of `dev`.
    pub fn find_vendor_interface(dev: &nusb::Device) -> Result<PiuioCtl<nusb::Interface>> {
        let number = dev
            .configurations()
            .find_map(|c| {
                c.interfaces().find_map(|i| {
                    i.alt_settings()
                        .find(|a| a.class() == 255)
                        .map(|a| a.interface_number())
                })
            })
            .ok_or_else(|| anyhow!("PIUIO interface not found"))?;
        log::debug!("claiming interface {number}");
        let intf = dev.claim_interface(number)?;
        Ok(PiuioCtl::new(intf))
    }

    /// The raw input report. Active low.
    pub fn read_inputs(&self) -> Result<[u8; INPUT_REPORT_LEN]> {
        let data = self.intf.control_in(PIUIO_REQUEST, INPUT_REPORT_LEN)?;
        data.as_slice()
            .try_into()
            .map_err(|_| anyhow!("Short input report: {} bytes", data.len()))
    }

    pub fn pressed(&self) -> Result<Vec<SwitchId>> {
        let report = self.read_inputs()?;
        Ok(pressed_in(&report).collect())
    }

    pub fn write_lamps(&self, report: &[u8; OUTPUT_REPORT_LEN]) -> Result<()> {
        log::debug!("lamps {}", to_hex(report));
        self.intf.control_out(PIUIO_REQUEST, report)
    }

    pub fn set_lamps(&self, lamps: impl IntoIterator<Item = LampId>) -> Result<()> {
        self.write_lamps(&output_report_with(lamps))
    }
}

/// Parse an output report from hex bytes; missing trailing bytes are zero.
pub fn parse_report(bytes: &[String]) -> Result<[u8; OUTPUT_REPORT_LEN]> {
    if bytes.len() > OUTPUT_REPORT_LEN {
        return Err(anyhow!(
            "An output report is at most {OUTPUT_REPORT_LEN} bytes"
        ));
    }
    let mut report = [0; OUTPUT_REPORT_LEN];
    for (r, b) in report.iter_mut().zip(bytes) {
        let digits = b.strip_prefix("0x").unwrap_or(b);
        *r = u8::from_str_radix(digits, 16).map_err(|_| anyhow!("Invalid hex byte {b}"))?;
    }
    Ok(report)
}

pub fn parse_lamps(names: &[String]) -> Result<Vec<LampId>> {
    names
        .iter()
        .map(|n| {
            LampId::from_name(&n.to_lowercase()).ok_or_else(|| {
                anyhow!(
                    "Unknown lamp {n}; expected one of: {}",
                    LampId::ALL.map(|l| l.name()).join(", ")
                )
            })
        })
        .collect()
}

pub fn to_hex(report: &[u8]) -> String {
    report
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "vendor_coms_test.rs"]
mod test;
