//! El Torito boot support
//!
//! Encoding the boot catalog when a volume is finalized, and parsing it back
//! from a mounted volume.

pub mod catalog;
pub mod entry;
pub mod platform;
pub mod validation;

use crate::error::{Iso9660Error, Result};
use crate::types::{BootImage, VolumeInfo, SECTOR_SIZE};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Find boot image from El Torito boot catalog
///
/// Uses the catalog location recorded by [`crate::mount`] from the boot
/// record descriptor, validates the catalog and returns the default entry.
pub fn find_boot_image<B: BlockIo>(block_io: &mut B, volume: &VolumeInfo) -> Result<BootImage> {
    let catalog_lba = volume.boot_catalog_lba.ok_or(Iso9660Error::NoBootRecord)?;

    let mut sector = [0u8; SECTOR_SIZE];
    block_io
        .read_blocks(Lba(catalog_lba as u64), &mut sector)
        .map_err(|_| Iso9660Error::IoError)?;

    let catalog = catalog::BootCatalog::parse(&sector)?;
    let entry = catalog.initial;

    Ok(BootImage {
        bootable: entry.is_bootable(),
        media_type: entry.media_type,
        load_segment: entry.load_segment,
        system_type: entry.system_type,
        sector_count: entry.sector_count,
        load_rba: entry.load_rba,
        platform: catalog.validation.platform,
    })
}
