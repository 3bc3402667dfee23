//! El Torito finalization of ISO9660 filesystems

use gpt_disk_io::BlockIo;
use iso9660::{BootMediaType, BootPlatform, ElTorito, FinalizeOptions};
use log::{debug, info};

use crate::config::ImageConfig;
use crate::error::{Error, Result};
use crate::fs::{FilesystemHandle, FsError, FsResult};

/// The single boot entry of a finalized volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootCatalogEntry {
    pub platform: BootPlatform,
    pub emulation: BootMediaType,
    pub boot_file_path: String,
}

impl BootCatalogEntry {
    pub fn efi(boot_file_path: &str) -> Self {
        Self {
            platform: BootPlatform::Efi,
            emulation: BootMediaType::NoEmulation,
            boot_file_path: boot_file_path.to_string(),
        }
    }
}

/// Write the boot catalog at `catalog` pointing at `boot_file`, then seal
/// the volume and read the catalog back
///
/// Only ISO9660 handles carry a catalog; any other kind is a
/// [`Error::CapabilityMismatch`].
pub fn finalize<B: BlockIo>(
    handle: &mut FilesystemHandle<B>,
    catalog: &str,
    boot_file: &str,
    config: &ImageConfig,
) -> Result<BootCatalogEntry> {
    let kind = handle.kind();
    let index = handle.partition_index();
    let fs = handle
        .as_iso9660_mut()
        .ok_or(Error::CapabilityMismatch { kind })?;

    let entry = BootCatalogEntry::efi(boot_file);
    let options = FinalizeOptions::new(&config.volume_id)
        .with_volume_set_id(&config.volume_label)
        .with_el_torito(ElTorito {
            catalog_path: catalog.to_string(),
            boot_file: boot_file.to_string(),
            platform: entry.platform,
            media_type: entry.emulation,
        });

    let finalize_err = |source| Error::Finalize {
        catalog: catalog.to_string(),
        boot_file: boot_file.to_string(),
        source,
    };
    fs.finalize(&options).map_err(|err| match err {
        FsError::NoSpace { needed, available } => Error::CapacityExceeded {
            kind,
            index,
            needed,
            available,
        },
        other => finalize_err(other),
    })?;
    verify_catalog(fs.block_io_mut(), &entry).map_err(finalize_err)?;

    info!("finalized {} with boot catalog {} -> {}", kind, catalog, boot_file);
    Ok(entry)
}

/// The catalog must resolve to the boot file's extent
fn verify_catalog<B: BlockIo>(block_io: &mut B, entry: &BootCatalogEntry) -> FsResult<()> {
    let volume = iso9660::mount(block_io)?;
    let image = iso9660::find_boot_image(block_io, &volume)?;
    let file = iso9660::find_file(block_io, &volume, &entry.boot_file_path)?;

    if image.platform != entry.platform || image.media_type != entry.emulation {
        return Err(FsError::Verify(format!(
            "catalog entry is {:?}/{:?}",
            image.platform, image.media_type
        )));
    }
    if !image.bootable || image.load_rba != file.extent_lba {
        return Err(FsError::Verify(format!(
            "catalog loads sector {}, {} starts at {}",
            image.load_rba, entry.boot_file_path, file.extent_lba
        )));
    }
    debug!(
        "boot catalog verified: {} at sector {}, {} virtual sectors",
        entry.boot_file_path, image.load_rba, image.sector_count
    );
    Ok(())
}
