//! FAT32 formatting
//!
//! All sector numbers are relative to the block device handed in, which is
//! expected to be scoped to the volume (see [`crate::disk::PartitionIo`]).

pub(crate) mod format;
mod verify;

pub use format::{format_fat32, BootSector, Fat32Geometry};
pub use verify::verify_fat32;

/// Bytes per sector; FAT32 volumes are always laid out in 512-byte sectors here
pub const SECTOR_SIZE: usize = 512;
pub const RESERVED_SECTORS: u32 = 32;
pub const NUM_FATS: u32 = 2;
pub const ROOT_CLUSTER: u32 = 2;
pub const FSINFO_SECTOR: u32 = 1;
pub const BACKUP_BOOT_SECTOR: u32 = 6;

pub(crate) const OEM_NAME: &[u8; 8] = b"ISOGEN  ";
pub(crate) const MEDIA_FIXED: u8 = 0xF8;

pub(crate) const FSINFO_LEAD_SIG: u32 = 0x4161_5252;
pub(crate) const FSINFO_STRUC_SIG: u32 = 0x6141_7272;
pub(crate) const FSINFO_TRAIL_SIG: u32 = 0xAA55_0000;
