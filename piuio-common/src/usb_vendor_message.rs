/// The one vendor request the PIUIO protocol uses, in both directions.
pub const PIUIO_REQUEST: u8 = 0xAE;

/// `bmRequestType` for a host read of the input report (vendor, device, IN).
pub const REQUEST_TYPE_READ: u8 = 0xC0;
/// `bmRequestType` for a host write of the output report (vendor, device, OUT).
pub const REQUEST_TYPE_WRITE: u8 = 0x40;

/// Vendor/product id the original cabinet I/O board enumerates as.
pub const VENDOR_ID: u16 = 0x0547;
pub const PRODUCT_ID: u16 = 0x1002;

/// How long the host tool waits for a control transfer, in milliseconds.
pub const TRANSFER_TIMEOUT_MS: u64 = 100;
