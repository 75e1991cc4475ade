extern crate alloc;
extern crate std;

use alloc::vec;
use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};
use std::rc::Rc;
use std::sync::Mutex;
use std::vec::Vec;

pub trait Observer {
    fn update(&self, pin: Pin);

    fn read(&self, _pin: &Pin) {}
}

/// Every level written to an output pin, in order, as `(pin number, is_high)`.
#[derive(Clone, Default)]
pub struct EventLog(Rc<Mutex<Vec<(u8, bool)>>>);
impl EventLog {
    pub fn take(&self) -> Vec<(u8, bool)> {
        core::mem::take(&mut *self.0.lock().unwrap())
    }

    fn push(&self, n: u8, is_high: bool) {
        self.0.lock().unwrap().push((n, is_high));
    }
}

#[derive(Debug)]
struct MultiplexerInner {
    /// `pressed[output][channel]`
    pressed: Vec<Vec<bool>>,
    select: Vec<Pin>,
    outputs: Vec<Pin>,
    selected: Vec<u8>,
}

/// A bank of 16 channel analog multiplexers sharing select lines. Each output pin reads low while
/// the switch on the selected channel is pressed.
#[derive(Clone)]
pub struct Multiplexer {
    inner: Rc<Mutex<MultiplexerInner>>,
}
impl Multiplexer {
    pub fn new(select: Vec<Pin>, outputs: Vec<Pin>) -> Self {
        let me = Self {
            inner: Rc::new(Mutex::new(MultiplexerInner {
                pressed: vec![vec![false; 16]; outputs.len()],
                select,
                outputs,
                selected: Vec::new(),
            })),
        };

        {
            let inner = me.inner.lock().unwrap();
            for p in inner.select.iter().chain(inner.outputs.iter()) {
                p.add_observer(Rc::new(me.clone()))
            }
        }
        me.refresh();

        me
    }

    pub fn down(&self, output: usize, channel: u8) {
        self.set_switch(output, channel, true);
    }

    pub fn up(&self, output: usize, channel: u8) {
        self.set_switch(output, channel, false);
    }

    pub fn set_switch(&self, output: usize, channel: u8, is_down: bool) {
        self.inner.lock().unwrap().pressed[output][channel as usize] = is_down;
        self.refresh();
    }

    /// The channel each read of a multiplexer output saw, one entry per change of channel.
    pub fn selected(&self) -> Vec<u8> {
        self.inner.lock().unwrap().selected.clone()
    }

    pub fn channel(&self) -> u8 {
        Self::channel_of(&self.inner.lock().unwrap().select)
    }

    fn channel_of(select: &[Pin]) -> u8 {
        select
            .iter()
            .enumerate()
            .fold(0, |c, (i, p)| c | (u8::from(p.get_state() == Some(true)) << i))
    }

    fn refresh(&self) {
        let levels: Vec<(Pin, bool)> = {
            let inner = self.inner.lock().unwrap();
            let channel = Self::channel_of(&inner.select) as usize;
            inner
                .outputs
                .iter()
                .enumerate()
                .map(|(o, p)| (p.clone(), !inner.pressed[o][channel]))
                .collect()
        };
        for (mut p, is_high) in levels {
            if is_high {
                p.set_high().unwrap();
            } else {
                p.set_low().unwrap();
            }
        }
    }
}
impl Observer for Multiplexer {
    fn update(&self, pin: Pin) {
        let is_select = self
            .inner
            .lock()
            .unwrap()
            .select
            .iter()
            .any(|p| p.num() == pin.num());
        if is_select {
            self.refresh();
        }
    }

    fn read(&self, _pin: &Pin) {
        let mut inner = self.inner.lock().unwrap();
        let channel = Self::channel_of(&inner.select);
        if inner.selected.last() != Some(&channel) {
            inner.selected.push(channel);
        }
    }
}

#[derive(Debug)]
pub struct TestError;

#[derive(Clone)]
pub struct Pin(Rc<PinShared>);
impl core::fmt::Debug for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.get_state();

        f.debug_struct("Pin")
            .field("n", &self.0.n)
            .field("state", &state)
            .finish()
    }
}
impl Pin {
    pub fn new(n: u8) -> Self {
        Self(Rc::new(PinShared {
            n,
            observer: Mutex::new(None),
            log: Mutex::new(None),
            inner: Mutex::new(PinInner {
                is_high: None,
                failing: false,
            }),
        }))
    }

    /// A pin that starts high; how an input with a pull-up reads when nothing is pressed.
    pub fn pulled_up(n: u8) -> Self {
        let pin = Self::new(n);
        pin.0.lock().is_high = Some(true);
        pin
    }

    pub fn num(&self) -> u8 {
        self.0.n
    }

    pub fn get_state(&self) -> Option<bool> {
        self.0.lock().is_high
    }

    /// Make reads and writes return an error.
    pub fn set_failing(&self, failing: bool) {
        self.0.lock().failing = failing;
    }

    pub fn set_log(&self, log: &EventLog) {
        *self.0.log.lock().unwrap() = Some(log.clone());
    }

    fn add_observer(&self, observer: Rc<dyn Observer>) {
        *self.0.observer.lock().unwrap() = Some(observer);
    }

    fn read(&self) -> Result<Option<bool>, TestError> {
        if self.0.lock().failing {
            return Err(TestError);
        }
        let observer = self.0.observer.lock().unwrap().clone();
        if let Some(o) = observer {
            o.read(self);
        }
        Ok(self.0.get_state())
    }

    fn set_level(&mut self, is_high: bool) -> Result<(), TestError> {
        if self.0.lock().failing {
            return Err(TestError);
        }
        if let Some(log) = self.0.log.lock().unwrap().as_ref() {
            log.push(self.0.n, is_high);
        }
        if self.0.get_state() != Some(is_high) {
            self.0.lock().is_high = Some(is_high);
            let observer = self.0.observer.lock().unwrap().clone();
            if let Some(o) = observer {
                o.update(self.clone());
            }
        }
        Ok(())
    }
}

struct PinInner {
    is_high: Option<bool>,
    failing: bool,
}

struct PinShared {
    n: u8,
    observer: Mutex<Option<Rc<dyn Observer>>>,
    log: Mutex<Option<EventLog>>,
    inner: Mutex<PinInner>,
}
impl PinShared {
    fn get_state(&self) -> Option<bool> {
        self.lock().is_high
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PinInner> {
        self.inner.lock().unwrap()
    }
}

impl Error for TestError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for Pin {
    type Error = TestError;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|s| s == Some(true))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|s| s == Some(false))
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true)
    }
}
