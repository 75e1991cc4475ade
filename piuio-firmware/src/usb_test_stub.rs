extern crate std;
use embassy_usb::driver::{
    Bus, ControlPipe, Driver, Endpoint, EndpointAddress, EndpointError, EndpointIn, EndpointInfo,
    EndpointOut, EndpointType,
};
use std::rc::Rc;
use std::sync::Mutex;
use std::vec::Vec;

/// Everything written to an endpoint, one entry per packet.
#[derive(Clone, Default)]
pub struct Messages(Rc<Mutex<Vec<Vec<u8>>>>);
impl Messages {
    pub fn take(&self) -> Vec<Vec<u8>> {
        core::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, msg: &[u8]) {
        self.0.lock().unwrap().push(Vec::from(msg));
    }
}

pub struct MyEndpointIn {
    pub messages: Messages,
    pub info: EndpointInfo,
    pub disabled: Rc<Mutex<bool>>,
    /// Number of upcoming writes that fail.
    pub failures: Rc<Mutex<usize>>,
}
impl Endpoint for MyEndpointIn {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    async fn wait_enabled(&mut self) {}
}
impl EndpointIn for MyEndpointIn {
    async fn write(&mut self, buf: &[u8]) -> Result<(), EndpointError> {
        if *self.disabled.lock().unwrap() {
            return Err(EndpointError::Disabled);
        }
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(EndpointError::Disabled);
            }
        }
        self.messages.push(buf);
        Ok(())
    }
}
impl MyEndpointIn {
    pub fn with_max_packet_size(max_packet_size: u16) -> Self {
        let mut me = Self::default();
        me.info.max_packet_size = max_packet_size;
        me
    }
}
impl Default for MyEndpointIn {
    fn default() -> Self {
        Self {
            messages: Messages::default(),
            disabled: Rc::new(Mutex::new(false)),
            failures: Rc::new(Mutex::new(0)),
            info: EndpointInfo {
                addr: EndpointAddress::from(0x81),
                ep_type: EndpointType::Interrupt,
                max_packet_size: 64,
                interval_ms: 1,
            },
        }
    }
}

pub struct MyEndpointOut;
impl Endpoint for MyEndpointOut {
    fn info(&self) -> &EndpointInfo {
        unimplemented!()
    }

    async fn wait_enabled(&mut self) {}
}
impl EndpointOut for MyEndpointOut {
    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, EndpointError> {
        unimplemented!()
    }
}

pub struct MyBus;
impl Bus for MyBus {
    async fn enable(&mut self) {}

    async fn disable(&mut self) {}

    async fn poll(&mut self) -> embassy_usb::driver::Event {
        unimplemented!()
    }

    fn endpoint_set_enabled(&mut self, _ep_addr: EndpointAddress, _enabled: bool) {
        unimplemented!()
    }

    fn endpoint_set_stalled(&mut self, _ep_addr: EndpointAddress, _stalled: bool) {
        unimplemented!()
    }

    fn endpoint_is_stalled(&mut self, _ep_addr: EndpointAddress) -> bool {
        unimplemented!()
    }

    async fn remote_wakeup(&mut self) -> Result<(), embassy_usb::driver::Unsupported> {
        unimplemented!()
    }
}

pub struct MyControlPipe;
impl ControlPipe for MyControlPipe {
    fn max_packet_size(&self) -> usize {
        unimplemented!()
    }

    async fn setup(&mut self) -> [u8; 8] {
        unimplemented!()
    }

    async fn data_out(
        &mut self,
        _buf: &mut [u8],
        _first: bool,
        _last: bool,
    ) -> Result<usize, EndpointError> {
        unimplemented!()
    }

    async fn data_in(&mut self, _data: &[u8], _first: bool, _last: bool) -> Result<(), EndpointError> {
        unimplemented!()
    }

    async fn accept(&mut self) {
        unimplemented!()
    }

    async fn reject(&mut self) {
        unimplemented!()
    }

    async fn accept_set_address(&mut self, _addr: u8) {
        unimplemented!()
    }
}

pub struct MyDriver;
impl Driver<'_> for MyDriver {
    type EndpointOut = MyEndpointOut;

    type EndpointIn = MyEndpointIn;

    type ControlPipe = MyControlPipe;

    type Bus = MyBus;

    fn alloc_endpoint_out(
        &mut self,
        _ep_type: EndpointType,
        _max_packet_size: u16,
        _interval_ms: u8,
    ) -> Result<Self::EndpointOut, embassy_usb::driver::EndpointAllocError> {
        unimplemented!()
    }

    fn alloc_endpoint_in(
        &mut self,
        _ep_type: EndpointType,
        _max_packet_size: u16,
        _interval_ms: u8,
    ) -> Result<Self::EndpointIn, embassy_usb::driver::EndpointAllocError> {
        unimplemented!()
    }

    fn start(self, _control_max_packet_size: u16) -> (Self::Bus, Self::ControlPipe) {
        unimplemented!()
    }
}
