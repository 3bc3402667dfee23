//! Common types and constants for ISO9660

use alloc::string::String;

use crate::utils::string;

/// ISO9660 sector size (always 2048 bytes)
pub const SECTOR_SIZE: usize = 2048;

/// Volume descriptor set starts at sector 16
pub const VOLUME_DESCRIPTOR_START: u64 = 16;

/// Maximum path length
pub const MAX_PATH_LENGTH: usize = 255;

/// Maximum directory depth
pub const MAX_DIRECTORY_DEPTH: usize = 8;

/// Volume descriptor type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VolumeDescriptorType {
    /// Boot Record (El Torito)
    BootRecord = 0,
    /// Primary Volume Descriptor
    Primary = 1,
    /// Supplementary Volume Descriptor (Joliet)
    Supplementary = 2,
    /// Volume Partition Descriptor
    Partition = 3,
    /// Volume Descriptor Set Terminator
    Terminator = 255,
}

/// Parsed volume information
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    /// Volume identifier (32 chars)
    pub volume_id: [u8; 32],

    /// Volume set identifier (128 chars)
    pub volume_set_id: [u8; 128],

    /// Root directory extent location (LBA)
    pub root_extent_lba: u32,

    /// Root directory extent length (bytes)
    pub root_extent_len: u32,

    /// Logical block size (always 2048 for volumes written here)
    pub logical_block_size: u16,

    /// Volume space size (total sectors)
    pub volume_space_size: u32,

    /// El Torito boot catalog LBA (if present)
    pub boot_catalog_lba: Option<u32>,
}

impl VolumeInfo {
    /// Volume identifier without padding
    pub fn volume_id_str(&self) -> &str {
        string::achars_to_str(&self.volume_id).unwrap_or("")
    }

    /// Volume set identifier without padding
    pub fn volume_set_id_str(&self) -> &str {
        string::achars_to_str(&self.volume_set_id).unwrap_or("")
    }
}

/// File entry metadata
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File identifier with the version suffix stripped
    pub name: String,

    /// File size in bytes
    pub size: u64,

    /// Extent location (LBA)
    pub extent_lba: u32,

    /// Data length (bytes)
    pub data_length: u32,

    /// File flags
    pub flags: FileFlags,
}

/// File flags from directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileFlags {
    /// Hidden file
    pub hidden: bool,

    /// Directory (not a file)
    pub directory: bool,

    /// Associated file
    pub associated: bool,

    /// Not final directory record for this file
    pub not_final: bool,
}

impl FileFlags {
    /// Directory flag bit
    pub const DIRECTORY: u8 = 0x02;

    /// Decode from the directory record flag byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            hidden: byte & 0x01 != 0,
            directory: byte & 0x02 != 0,
            associated: byte & 0x04 != 0,
            not_final: byte & 0x80 != 0,
        }
    }
}

/// Boot image information (El Torito default entry)
#[derive(Debug, Clone)]
pub struct BootImage {
    /// Bootable flag
    pub bootable: bool,

    /// Boot media type
    pub media_type: BootMediaType,

    /// Load segment (x86)
    pub load_segment: u16,

    /// System type
    pub system_type: u8,

    /// Sector count (512-byte virtual sectors)
    pub sector_count: u16,

    /// LBA of the boot image
    pub load_rba: u32,

    /// Platform ID from the validation entry
    pub platform: BootPlatform,
}

/// Boot media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootMediaType {
    /// No emulation
    NoEmulation = 0,
    /// 1.2MB floppy
    Floppy12M = 1,
    /// 1.44MB floppy
    Floppy144M = 2,
    /// 2.88MB floppy
    Floppy288M = 3,
    /// Hard disk
    HardDisk = 4,
}

/// Boot platform ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootPlatform {
    /// x86 PC
    X86 = 0,
    /// PowerPC
    PowerPC = 1,
    /// Mac
    Mac = 2,
    /// EFI
    Efi = 0xEF,
}
