//! Boot Record Volume Descriptor (El Torito)
//!
//! Sits in the descriptor set next to the PVD and points at the boot
//! catalog sector.

use crate::types::{VolumeDescriptorType, SECTOR_SIZE};
use crate::volume::VolumeDescriptorHeader;

/// Boot system identifier for El Torito
pub const EL_TORITO_ID: &[u8] = b"EL TORITO SPECIFICATION";

const BOOT_SYSTEM_ID: usize = 7;
const CATALOG_LBA: usize = 0x47;

/// Encode a boot record descriptor pointing at `catalog_lba`
pub fn encode(catalog_lba: u32) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    VolumeDescriptorHeader::new(VolumeDescriptorType::BootRecord).write(&mut sector);
    sector[BOOT_SYSTEM_ID..BOOT_SYSTEM_ID + EL_TORITO_ID.len()].copy_from_slice(EL_TORITO_ID);
    sector[CATALOG_LBA..CATALOG_LBA + 4].copy_from_slice(&catalog_lba.to_le_bytes());
    sector
}

/// Catalog location, if this boot record is an El Torito one
pub fn catalog_lba(sector: &[u8]) -> Option<u32> {
    if sector.len() < CATALOG_LBA + 4 {
        return None;
    }
    if &sector[BOOT_SYSTEM_ID..BOOT_SYSTEM_ID + EL_TORITO_ID.len()] != EL_TORITO_ID {
        return None;
    }
    Some(u32::from_le_bytes([
        sector[CATALOG_LBA],
        sector[CATALOG_LBA + 1],
        sector[CATALOG_LBA + 2],
        sector[CATALOG_LBA + 3],
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_record_roundtrip() {
        let sector = encode(37);
        assert_eq!(sector[0], 0);
        assert_eq!(catalog_lba(&sector), Some(37));
    }

    #[test]
    fn test_foreign_boot_record_ignored() {
        let mut sector = encode(37);
        sector[BOOT_SYSTEM_ID] = b'X';
        assert_eq!(catalog_lba(&sector), None);
    }
}
