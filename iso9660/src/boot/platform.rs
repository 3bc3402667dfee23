//! Boot platform identifiers

use crate::types::{BootMediaType, BootPlatform};

impl BootPlatform {
    /// Parse from validation entry platform ID
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(BootPlatform::X86),
            0x01 => Some(BootPlatform::PowerPC),
            0x02 => Some(BootPlatform::Mac),
            0xEF => Some(BootPlatform::Efi),
            _ => None,
        }
    }
}

impl BootMediaType {
    /// Parse from the media byte of a boot entry (low nibble)
    pub fn from_id(id: u8) -> Option<Self> {
        match id & 0x0F {
            0 => Some(BootMediaType::NoEmulation),
            1 => Some(BootMediaType::Floppy12M),
            2 => Some(BootMediaType::Floppy144M),
            3 => Some(BootMediaType::Floppy288M),
            4 => Some(BootMediaType::HardDisk),
            _ => None,
        }
    }
}
