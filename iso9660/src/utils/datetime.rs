//! Date/time encoding
//!
//! ISO9660 has two datetime formats: 7-byte (directory records) and 17-byte
//! (volume descriptors). Volumes written here carry no timestamps so that the
//! same inputs always produce the same image.

/// 7-byte directory record datetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTime7 {
    /// Years since 1900
    pub year: u8,

    /// Month (1-12, 0 when unset)
    pub month: u8,

    /// Day (1-31, 0 when unset)
    pub day: u8,

    /// Hour (0-23)
    pub hour: u8,

    /// Minute (0-59)
    pub minute: u8,

    /// Second (0-59)
    pub second: u8,

    /// GMT offset in 15-minute intervals (-48 to +52)
    pub gmt_offset: i8,
}

impl DateTime7 {
    /// Parse from 7-byte array
    pub fn from_bytes(bytes: &[u8; 7]) -> Self {
        Self {
            year: bytes[0],
            month: bytes[1],
            day: bytes[2],
            hour: bytes[3],
            minute: bytes[4],
            second: bytes[5],
            gmt_offset: bytes[6] as i8,
        }
    }

    /// Encode to 7-byte array
    pub fn to_bytes(&self) -> [u8; 7] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.gmt_offset as u8,
        ]
    }

    /// Get full year (1900 + year)
    pub fn full_year(&self) -> u16 {
        1900 + self.year as u16
    }
}

/// 17-byte "not specified" volume descriptor datetime
///
/// Sixteen ASCII zeros followed by a zero GMT offset byte.
pub const DATETIME17_UNSPECIFIED: [u8; 17] = *b"0000000000000000\0";

/// Whether a 17-byte datetime field is the "not specified" value
pub fn is_unspecified_17(bytes: &[u8]) -> bool {
    bytes.len() == 17 && bytes[..16].iter().all(|&b| b == b'0' || b == 0) && bytes[16] == 0
}
