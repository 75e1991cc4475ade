use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

extern crate std;

#[derive(Debug)]
pub enum FlashStubError {
    Unknown,
    OutOfBounds,
}

#[derive(Debug)]
pub enum Action {
    Erase(u32, u32),
    Write(u32, std::vec::Vec<u8>),
}

/// A RAM backed NOR flash. Writes can only clear bits, like the real thing. `observer` sees each
/// erase and write first and may fail it or tamper with the buffer.
pub struct NorFlashStub<'f, const FLASH_SIZE: usize> {
    pub buf: [u8; FLASH_SIZE],
    #[allow(clippy::type_complexity)]
    pub observer: Option<&'f dyn Fn(Action, &mut [u8]) -> Result<(), FlashStubError>>,
}
impl NorFlashError for FlashStubError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FlashStubError::Unknown => NorFlashErrorKind::Other,
            FlashStubError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
        }
    }
}
impl<const FLASH_SIZE: usize> NorFlashStub<'_, FLASH_SIZE> {
    fn check(offset: u32, len: usize) -> Result<core::ops::Range<usize>, FlashStubError> {
        let offset = offset as usize;
        if offset + len > FLASH_SIZE {
            Err(FlashStubError::OutOfBounds)
        } else {
            Ok(offset..offset + len)
        }
    }
}
impl<const FLASH_SIZE: usize> ErrorType for NorFlashStub<'_, FLASH_SIZE> {
    type Error = FlashStubError;
}
impl<const FLASH_SIZE: usize> ReadNorFlash for NorFlashStub<'_, FLASH_SIZE> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::check(offset, bytes.len())?;
        bytes.copy_from_slice(&self.buf[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}
impl<const FLASH_SIZE: usize> NorFlash for NorFlashStub<'_, FLASH_SIZE> {
    const WRITE_SIZE: usize = 1;

    const ERASE_SIZE: usize = 64;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let range = Self::check(from, to.saturating_sub(from) as usize)?;
        if let Some(observer) = self.observer {
            observer(Action::Erase(from, to), &mut self.buf)?;
        }
        for b in self.buf[range].iter_mut() {
            *b = 0xff;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = Self::check(offset, bytes.len())?;
        if let Some(observer) = self.observer {
            observer(Action::Write(offset, bytes.into()), &mut self.buf)?;
        }

        for (t, f) in self.buf[range].iter_mut().zip(bytes.iter()) {
            *t &= *f;
        }

        Ok(())
    }
}
impl<const FLASH_SIZE: usize> Default for NorFlashStub<'_, FLASH_SIZE> {
    /// Starts fully erased.
    fn default() -> Self {
        Self {
            buf: [0xff; FLASH_SIZE],
            observer: None,
        }
    }
}
