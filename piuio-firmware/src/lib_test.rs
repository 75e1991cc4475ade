extern crate std;

#[cfg(feature = "defmt")]
#[defmt::global_logger]
struct Logger;

#[cfg(feature = "defmt")]
unsafe impl defmt::Logger for Logger {
    fn acquire() {}

    unsafe fn release() {}

    unsafe fn write(_bytes: &[u8]) {}

    unsafe fn flush() {}
}

#[test]
fn mode_store_base_is_past_firmware() {
    // the rp2040 firmware image must fit below the record
    const { assert!(super::MODE_STORE_BASE >= 512 * 1024) };
    assert_eq!(super::MODE_STORE_BASE % 4096, 0);
}
