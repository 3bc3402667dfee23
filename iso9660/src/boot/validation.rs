//! Boot catalog validation entry
//!
//! The validation entry verifies catalog integrity via checksum.

use crate::error::{Iso9660Error, Result};
use crate::types::BootPlatform;
use crate::utils::checksum;

/// Validation Entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationEntry {
    /// Platform ID
    pub platform: BootPlatform,

    /// Manufacturer/developer ID string (24 bytes)
    pub id_string: [u8; 24],
}

impl ValidationEntry {
    /// Header ID constant
    pub const HEADER_ID: u8 = 0x01;

    /// Key bytes constant
    pub const KEY_BYTES: [u8; 2] = [0x55, 0xAA];

    /// Entry size
    pub const SIZE: usize = 32;

    /// Validation entry for `platform` with an empty ID string
    pub fn new(platform: BootPlatform) -> Self {
        Self {
            platform,
            id_string: [0; 24],
        }
    }

    /// Encode with the checksum word that zeroes the 16-bit sum
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut entry = [0u8; Self::SIZE];
        entry[0] = Self::HEADER_ID;
        entry[1] = self.platform as u8;
        entry[4..28].copy_from_slice(&self.id_string);
        entry[30..32].copy_from_slice(&Self::KEY_BYTES);
        let word = checksum::calculate_complement_16(&entry);
        entry[28..30].copy_from_slice(&word.to_le_bytes());
        entry
    }

    /// Parse and validate an entry
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Iso9660Error::InvalidBootCatalog);
        }
        let entry = &data[..Self::SIZE];
        if entry[0] != Self::HEADER_ID || entry[30..32] != Self::KEY_BYTES {
            return Err(Iso9660Error::InvalidBootCatalog);
        }
        if !checksum::verify_checksum_16(entry) {
            return Err(Iso9660Error::ChecksumFailed);
        }

        let platform = BootPlatform::from_id(entry[1]).ok_or(Iso9660Error::InvalidBootCatalog)?;
        let mut id_string = [0u8; 24];
        id_string.copy_from_slice(&entry[4..28]);
        Ok(Self {
            platform,
            id_string,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_valid() {
        let bytes = ValidationEntry::new(BootPlatform::Efi).encode();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0xEF);
        assert_eq!(&bytes[30..], &[0x55, 0xAA]);
        assert!(checksum::verify_checksum_16(&bytes));

        let parsed = ValidationEntry::parse(&bytes).unwrap();
        assert_eq!(parsed.platform, BootPlatform::Efi);
    }

    #[test]
    fn test_corrupted_checksum() {
        let mut bytes = ValidationEntry::new(BootPlatform::Efi).encode();
        bytes[4] ^= 0xFF;
        assert_eq!(
            ValidationEntry::parse(&bytes).unwrap_err(),
            Iso9660Error::ChecksumFailed
        );
    }

    #[test]
    fn test_bad_key() {
        let mut bytes = ValidationEntry::new(BootPlatform::X86).encode();
        bytes[31] = 0;
        assert_eq!(
            ValidationEntry::parse(&bytes).unwrap_err(),
            Iso9660Error::InvalidBootCatalog
        );
    }
}
