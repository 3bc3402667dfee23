//! Boot catalog default entry

use crate::error::{Iso9660Error, Result};
use crate::types::BootMediaType;

/// Boot Catalog Entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootEntry {
    /// Boot indicator (0x88 = bootable, 0x00 = not bootable)
    pub boot_indicator: u8,

    /// Boot media type
    pub media_type: BootMediaType,

    /// Load segment (0 = default 0x7C0)
    pub load_segment: u16,

    /// System type (partition type from MBR)
    pub system_type: u8,

    /// Sector count (virtual sectors, 512 bytes each)
    pub sector_count: u16,

    /// Load RBA (ISO sector, 2048 bytes)
    pub load_rba: u32,
}

impl BootEntry {
    /// Bootable indicator
    pub const BOOTABLE: u8 = 0x88;

    /// Not bootable indicator
    pub const NOT_BOOTABLE: u8 = 0x00;

    /// Entry size
    pub const SIZE: usize = 32;

    /// Virtual sector size used by `sector_count`
    pub const VIRTUAL_SECTOR: u64 = 512;

    /// Bootable entry for an image of `image_len` bytes at `load_rba`
    ///
    /// The sector count saturates at 0xFFFF; firmware that boots no-emulation
    /// EFI images reads the whole file from the filesystem anyway.
    pub fn bootable(media_type: BootMediaType, load_rba: u32, image_len: u64) -> Self {
        let sectors = image_len.div_ceil(Self::VIRTUAL_SECTOR);
        Self {
            boot_indicator: Self::BOOTABLE,
            media_type,
            load_segment: 0,
            system_type: 0,
            sector_count: sectors.min(u16::MAX as u64) as u16,
            load_rba,
        }
    }

    /// Is this entry bootable?
    pub fn is_bootable(&self) -> bool {
        self.boot_indicator == Self::BOOTABLE
    }

    /// Get image size in bytes (sector_count * 512)
    pub fn image_size(&self) -> u32 {
        self.sector_count as u32 * Self::VIRTUAL_SECTOR as u32
    }

    /// Encode to 32 bytes
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut entry = [0u8; Self::SIZE];
        entry[0] = self.boot_indicator;
        entry[1] = self.media_type as u8;
        entry[2..4].copy_from_slice(&self.load_segment.to_le_bytes());
        entry[4] = self.system_type;
        entry[6..8].copy_from_slice(&self.sector_count.to_le_bytes());
        entry[8..12].copy_from_slice(&self.load_rba.to_le_bytes());
        entry
    }

    /// Parse from 32 bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Iso9660Error::InvalidBootEntry);
        }
        if data[0] != Self::BOOTABLE && data[0] != Self::NOT_BOOTABLE {
            return Err(Iso9660Error::InvalidBootEntry);
        }
        let media_type = BootMediaType::from_id(data[1]).ok_or(Iso9660Error::InvalidBootEntry)?;
        Ok(Self {
            boot_indicator: data[0],
            media_type,
            load_segment: u16::from_le_bytes([data[2], data[3]]),
            system_type: data[4],
            sector_count: u16::from_le_bytes([data[6], data[7]]),
            load_rba: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
        })
    }
}
