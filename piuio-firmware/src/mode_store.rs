//! Persists the [InputMode] in NOR flash.
//!
//! Two erase blocks at `base` and `base + ERASE_SIZE` each hold at most one record. A save always
//! goes to the block not holding the newest valid record, so a failed or interrupted save leaves
//! the previous record readable.

use embedded_storage::nor_flash::{self, NorFlash};

use crate::input_mode::InputMode;

const MAGIC: [u8; 4] = *b"PIUM";
const RECORD_LEN: usize = 12;
const MAX_WRITE_LEN: usize = 64;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeStoreError {
    NotAligned,
    OutOfBounds,
    /// Read back did not match what was written.
    Verify,
    Unknown,
}

fn map_flash_error(err: impl nor_flash::NorFlashError) -> ModeStoreError {
    match err.kind() {
        nor_flash::NorFlashErrorKind::NotAligned => ModeStoreError::NotAligned,
        nor_flash::NorFlashErrorKind::OutOfBounds => ModeStoreError::OutOfBounds,
        _ => ModeStoreError::Unknown,
    }
}

/// magic, sequence (u32 le), mode, !mode, checksum (u16 le).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Record {
    sequence: u32,
    mode: InputMode,
}

impl Record {
    fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0; RECORD_LEN];
        buf[..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.sequence.to_le_bytes());
        buf[8] = self.mode as u8;
        buf[9] = !(self.mode as u8);
        let sum = checksum(&buf[..10]);
        buf[10..].copy_from_slice(&sum.to_le_bytes());
        buf
    }

    fn decode(buf: &[u8; RECORD_LEN]) -> Option<Self> {
        if buf[..4] != MAGIC
            || buf[8] != !buf[9]
            || checksum(&buf[..10]).to_le_bytes() != buf[10..]
        {
            return None;
        }
        Some(Self {
            sequence: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            mode: InputMode::from_u8(buf[8])?,
        })
    }

    fn is_newer_than(&self, other: &Record) -> bool {
        (self.sequence.wrapping_sub(other.sequence) as i32) > 0
    }
}

/// Fletcher-16
fn checksum(data: &[u8]) -> u16 {
    let (a, b) = data.iter().fold((0u16, 0u16), |(a, b), d| {
        let a = (a + *d as u16) % 255;
        (a, (b + a) % 255)
    });
    (b << 8) | a
}

pub struct ModeStore<F: NorFlash> {
    flash: F,
    base: u32,
}

impl<F: NorFlash> ModeStore<F> {
    const SLOT_SIZE: u32 = F::ERASE_SIZE as u32;
    const WRITE_LEN: usize = RECORD_LEN.div_ceil(F::WRITE_SIZE) * F::WRITE_SIZE;

    /// `base` must be erase aligned.
    pub fn new(flash: F, base: u32) -> Self {
        Self { flash, base }
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    /// The mode of the newest valid record, if any.
    pub fn load(&mut self) -> Result<Option<InputMode>, ModeStoreError> {
        Ok(self.newest()?.map(|(_, r)| r.mode))
    }

    /// Write `mode` as a new record and check it reads back intact.
    pub fn save(&mut self, mode: InputMode) -> Result<(), ModeStoreError> {
        if Self::WRITE_LEN > MAX_WRITE_LEN {
            return Err(ModeStoreError::NotAligned);
        }
        let (slot, sequence) = match self.newest()? {
            Some((slot, r)) => (1 - slot, r.sequence.wrapping_add(1)),
            None => (0, 1),
        };
        let record = Record { sequence, mode };
        let offset = self.slot_offset(slot);

        self.flash
            .erase(offset, offset + Self::SLOT_SIZE)
            .map_err(map_flash_error)?;

        let mut buf = [0xff; MAX_WRITE_LEN];
        buf[..RECORD_LEN].copy_from_slice(&record.encode());
        self.flash
            .write(offset, &buf[..Self::WRITE_LEN])
            .map_err(map_flash_error)?;

        if self.read_slot(slot)? != Some(record) {
            crate::warn!("input mode record did not verify");
            return Err(ModeStoreError::Verify);
        }
        crate::debug!("saved input mode {:?} seq {}", mode, sequence);
        Ok(())
    }

    fn slot_offset(&self, slot: usize) -> u32 {
        self.base + slot as u32 * Self::SLOT_SIZE
    }

    fn read_slot(&mut self, slot: usize) -> Result<Option<Record>, ModeStoreError> {
        let mut buf = [0; RECORD_LEN];
        self.flash
            .read(self.slot_offset(slot), &mut buf)
            .map_err(map_flash_error)?;
        Ok(Record::decode(&buf))
    }

    fn newest(&mut self) -> Result<Option<(usize, Record)>, ModeStoreError> {
        let a = self.read_slot(0)?;
        let b = self.read_slot(1)?;
        Ok(match (a, b) {
            (Some(a), Some(b)) if b.is_newer_than(&a) => Some((1, b)),
            (Some(a), _) => Some((0, a)),
            (None, Some(b)) => Some((1, b)),
            (None, None) => None,
        })
    }
}

#[cfg(test)]
#[path = "mode_store_test.rs"]
mod test;
