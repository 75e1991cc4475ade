use crate::flash_test_stub::{Action, FlashStubError, NorFlashStub};

use super::*;

extern crate std;

const BASE: u32 = 128;
type Stub<'f> = NorFlashStub<'f, 512>;

#[test]
fn record_encoding() {
    let record = Record {
        sequence: 0x01020304,
        mode: InputMode::Keyboard,
    };
    let buf = record.encode();
    assert_eq!(&buf[..10], b"PIUM\x04\x03\x02\x01\x01\xfe");
    assert_eq!(Record::decode(&buf), Some(record));

    let mut bad = buf;
    bad[5] ^= 1;
    assert_eq!(Record::decode(&bad), None);

    let mut bad = buf;
    bad[9] = 0;
    assert_eq!(Record::decode(&bad), None);

    assert_eq!(Record::decode(&[0xff; RECORD_LEN]), None);
}

#[test]
fn unknown_mode_is_invalid() {
    let mut buf = Record {
        sequence: 1,
        mode: InputMode::Piuio,
    }
    .encode();
    buf[8] = 7;
    buf[9] = !7;
    let sum = checksum(&buf[..10]);
    buf[10..].copy_from_slice(&sum.to_le_bytes());

    assert_eq!(Record::decode(&buf), None);
}

#[test]
fn empty_flash_loads_nothing() {
    let mut store = ModeStore::new(Stub::default(), BASE);
    assert_eq!(store.load(), Ok(None));
}

#[test]
fn save_then_reboot() {
    let mut store = ModeStore::new(Stub::default(), BASE);
    store.save(InputMode::Keyboard).unwrap();
    assert_eq!(store.load(), Ok(Some(InputMode::Keyboard)));

    // simulated power cycle: a new store over the same flash
    let flash = store.into_inner();
    let mut store = ModeStore::new(flash, BASE);
    assert_eq!(store.load(), Ok(Some(InputMode::Keyboard)));

    store.save(InputMode::Piuio).unwrap();
    let mut store = ModeStore::new(store.into_inner(), BASE);
    assert_eq!(store.load(), Ok(Some(InputMode::Piuio)));
}

#[test]
fn saves_alternate_slots() {
    let mut store = ModeStore::new(Stub::default(), BASE);
    for (i, mode) in [InputMode::Keyboard, InputMode::Piuio, InputMode::Keyboard]
        .into_iter()
        .enumerate()
    {
        store.save(mode).unwrap();
        let slot = i % 2;
        let r = store.read_slot(slot).unwrap().unwrap();
        assert_eq!(r.sequence, i as u32 + 1);
        assert_eq!(r.mode, mode);
    }
    // nothing outside the two slots was touched
    let buf = &store.flash_mut().buf;
    assert!(buf[..BASE as usize].iter().all(|b| *b == 0xff));
    assert!(buf[BASE as usize + 128..].iter().all(|b| *b == 0xff));
}

#[test]
fn corrupt_newest_falls_back() {
    let mut store = ModeStore::new(Stub::default(), BASE);
    store.save(InputMode::Keyboard).unwrap();
    store.save(InputMode::Piuio).unwrap();

    // corrupt the record in slot 1
    store.flash_mut().buf[BASE as usize + 64 + 11] ^= 0x55;
    assert_eq!(store.load(), Ok(Some(InputMode::Keyboard)));

    // next save goes over the corrupt slot
    store.save(InputMode::Piuio).unwrap();
    assert_eq!(store.read_slot(1).unwrap().unwrap().sequence, 2);
    assert_eq!(store.load(), Ok(Some(InputMode::Piuio)));
}

#[test]
fn sequence_wraps() {
    let mut store = ModeStore::new(Stub::default(), BASE);
    let old = Record {
        sequence: u32::MAX,
        mode: InputMode::Piuio,
    };
    let new = Record {
        sequence: 0,
        mode: InputMode::Keyboard,
    };
    store.flash_mut().buf[BASE as usize..BASE as usize + RECORD_LEN].copy_from_slice(&old.encode());
    store.flash_mut().buf[BASE as usize + 64..BASE as usize + 64 + RECORD_LEN]
        .copy_from_slice(&new.encode());

    assert_eq!(store.load(), Ok(Some(InputMode::Keyboard)));
}

#[test]
fn failed_write_keeps_previous() {
    let fail_writes = |action: Action, _: &mut [u8]| match action {
        Action::Write(..) => Err(FlashStubError::Unknown),
        Action::Erase(..) => Ok(()),
    };

    let mut store = ModeStore::new(Stub::default(), BASE);
    store.save(InputMode::Keyboard).unwrap();

    store.flash_mut().observer = Some(&fail_writes);
    assert_eq!(store.save(InputMode::Piuio), Err(ModeStoreError::Unknown));
    assert_eq!(store.load(), Ok(Some(InputMode::Keyboard)));
}

#[test]
fn bad_read_back_is_reported() {
    let flip_bits = |action: Action, buf: &mut [u8]| {
        if let Action::Write(offset, _) = action {
            // stuck bit
            buf[offset as usize + 4] = 0;
        }
        Ok::<(), FlashStubError>(())
    };

    let mut store = ModeStore::new(Stub::default(), BASE);
    store.save(InputMode::Piuio).unwrap();

    store.flash_mut().observer = Some(&flip_bits);
    assert_eq!(store.save(InputMode::Keyboard), Err(ModeStoreError::Verify));
    assert_eq!(store.load(), Ok(Some(InputMode::Piuio)));
}

#[test]
fn out_of_bounds() {
    let mut store = ModeStore::new(Stub::default(), 480);
    assert_eq!(store.load(), Err(ModeStoreError::OutOfBounds));
    assert_eq!(store.save(InputMode::Piuio), Err(ModeStoreError::OutOfBounds));
}
