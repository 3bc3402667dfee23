//! Small helpers shared by the disk and filesystem code

/// Calculate CRC32 checksum of data.
///
/// Uses standard CRC32 algorithm with polynomial 0xEDB88320. Volume serials
/// and GPT identifiers are derived from it so builds are reproducible.
pub fn crc32(data: &[u8]) -> u32 {
    const POLYNOMIAL: u32 = 0xEDB88320;

    let mut crc: u32 = 0xFFFFFFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}
