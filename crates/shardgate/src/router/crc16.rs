//! CRC-16/XMODEM, the checksum cluster-mode caches use to assign hash slots.
//!
//! Polynomial `0x1021`, initial value `0`, no reflection, no final XOR. The
//! lookup table is built at compile time.

const POLY: u16 = 0x1021;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0_u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Computes the CRC-16/XMODEM checksum of `data`.
///
/// # Example
/// ```
/// use shardgate::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0x31C3);
/// ```
pub const fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0_u16;
    let mut i = 0;
    while i < data.len() {
        let idx = ((crc >> 8) as u8 ^ data[i]) as usize;
        crc = (crc << 8) ^ TABLE[idx];
        i += 1;
    }
    crc
}
