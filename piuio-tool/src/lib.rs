pub mod vendor_coms;

/// Parse a hex number with an optional `0x` prefix.
pub fn parse_hex_u16(v: &str) -> anyhow::Result<u16> {
    let digits = v
        .strip_prefix("0x")
        .or_else(|| v.strip_prefix("0X"))
        .unwrap_or(v);
    u16::from_str_radix(digits, 16).map_err(|_| anyhow::anyhow!("Invalid hex number {v}"))
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
