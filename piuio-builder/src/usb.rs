use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_usb::{driver::Driver, Builder};
use piuio_firmware::{
    bridge::PiuioState,
    common::usb_vendor_message::{PRODUCT_ID, VENDOR_ID},
    hid::HidWriter,
    keyboard::{KeyboardReporter, KEYBOARD_REPORT_LEN},
    usb::{Configurator, State},
};

pub type KeyboardHidWriter<'d, D> = HidWriter<'d, D, KEYBOARD_REPORT_LEN>;

/// USB identity of the device. The vendor and product ids must stay those of a PIUIO for the
/// host driver to bind.
pub struct ConfigBuilder {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub serial_number: &'static str,
    pub max_power: u16,
}
impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            manufacturer: "Andamiro",
            product: "PIUIO",
            serial_number: "piuio:0001",
            max_power: 500,
        }
    }
}
impl ConfigBuilder {
    pub fn usb_configurator<'d>(&self) -> Configurator<'d> {
        let mut conf = embassy_usb::Config::new(self.vendor_id, self.product_id);
        conf.manufacturer = Some(self.manufacturer);
        conf.product = Some(self.product);
        conf.serial_number = Some(self.serial_number);
        conf.max_power = self.max_power;
        Configurator::new(conf)
    }

    /// Adds the PIUIO vendor interface and the keyboard interface.
    pub fn piuio_ifaces<'d, D: Driver<'d>, M: RawMutex>(
        &self,
        usb_config: &'d Configurator<'d>,
        piuio_state: &'d PiuioState<M>,
        usb_state: &'d mut State<'d, M>,
        mut usb_builder: Builder<'d, D>,
    ) -> (KeyboardHidWriter<'d, D>, Builder<'d, D>) {
        let hid_writer = usb_config.add_ifaces(&mut usb_builder, piuio_state, usb_state);
        (hid_writer, usb_builder)
    }
}

/// Forwards keyboard mode reports from the IO controller to the HID endpoint.
pub struct KeyboardTask<'d, D: Driver<'d>> {
    reporter: KeyboardReporter<'d, D>,
}
impl<'d, D: Driver<'d>> KeyboardTask<'d, D> {
    pub fn new(hid_writer: KeyboardHidWriter<'d, D>) -> Self {
        Self {
            reporter: KeyboardReporter::new(hid_writer),
        }
    }

    pub async fn run<M: RawMutex>(&mut self, state: &PiuioState<M>) -> ! {
        loop {
            self.reporter.forward(state).await;
        }
    }
}

#[cfg(test)]
#[path = "usb_test.rs"]
mod test;
