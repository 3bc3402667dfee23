// FAT32 directory entry types

pub const DIR_ENTRY_SIZE: usize = 32;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// Only the low 28 bits of a FAT32 entry are meaningful
pub const FAT_MASK: u32 = 0x0FFF_FFFF;
pub const END_OF_CHAIN: u32 = 0x0FFF_FFFF;
/// Entries at or above this value terminate a chain
pub const END_OF_CHAIN_MIN: u32 = 0x0FFF_FFF8;
pub const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

pub const ENTRY_FREE: u8 = 0xE5;
pub const ENTRY_END: u8 = 0x00;

/// 1980-01-01, the FAT epoch; images carry fixed timestamps
pub const FIXED_DATE: u16 = (1 << 5) | 1;

/// FAT32 short directory entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 11], // 8.3 filename, space padded
    pub attr: u8,
    pub cluster_high: u16,
    pub cluster_low: u16,
    pub file_size: u32,
}

impl DirEntry {
    pub fn empty() -> Self {
        Self {
            name: [0; 11],
            attr: 0,
            cluster_high: 0,
            cluster_low: 0,
            file_size: 0,
        }
    }

    pub fn new(name: [u8; 11], attr: u8, first_cluster: u32, file_size: u32) -> Self {
        let mut entry = Self {
            name,
            attr,
            file_size,
            ..Self::empty()
        };
        entry.set_first_cluster(first_cluster);
        entry
    }

    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    pub fn first_cluster(&self) -> u32 {
        ((self.cluster_high as u32) << 16) | (self.cluster_low as u32)
    }

    pub fn set_first_cluster(&mut self, cluster: u32) {
        self.cluster_high = (cluster >> 16) as u16;
        self.cluster_low = (cluster & 0xFFFF) as u16;
    }

    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0..11].copy_from_slice(&self.name);
        raw[11] = self.attr;
        // Creation, access and modification dates
        raw[16..18].copy_from_slice(&FIXED_DATE.to_le_bytes());
        raw[18..20].copy_from_slice(&FIXED_DATE.to_le_bytes());
        raw[20..22].copy_from_slice(&self.cluster_high.to_le_bytes());
        raw[24..26].copy_from_slice(&FIXED_DATE.to_le_bytes());
        raw[26..28].copy_from_slice(&self.cluster_low.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        raw
    }

    pub fn parse(raw: &[u8]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[0..11]);
        Self {
            name,
            attr: raw[11],
            cluster_high: u16::from_le_bytes([raw[20], raw[21]]),
            cluster_low: u16::from_le_bytes([raw[26], raw[27]]),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// `NAME.EXT` form of the short name
    pub fn short_name_string(&self) -> String {
        let base = String::from_utf8_lossy(&self.name[..8]).trim_end().to_string();
        let ext = String::from_utf8_lossy(&self.name[8..]).trim_end().to_string();
        if ext.is_empty() {
            base
        } else {
            format!("{base}.{ext}")
        }
    }
}
