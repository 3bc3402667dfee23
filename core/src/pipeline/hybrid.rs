//! One disk, a GPT, an ISO9660 partition and an ESP with the same files

use std::fmt;

use log::info;

use super::Progress;
use crate::boot::{self, BootCatalogEntry};
use crate::config::ImageConfig;
use crate::disk::DiskBuilder;
use crate::error::{Error, Result};
use crate::fs::FilesystemKind;
use crate::input::{BootFile, BootImageSpec};
use crate::install::FileInstaller;
use crate::layout::{PartitionLayout, SizeCalculator};

const ISO_PARTITION: usize = 0;
const ESP_PARTITION: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridState {
    SizeComputed,
    DiskCreated,
    PartitionTableApplied,
    Iso9660Created,
    Fat32Created,
    FilesToIsoWritten,
    FilesToFatWritten,
    Iso9660Finalized,
}

impl fmt::Display for HybridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HybridState::SizeComputed => "SizeComputed",
            HybridState::DiskCreated => "DiskCreated",
            HybridState::PartitionTableApplied => "PartitionTableApplied",
            HybridState::Iso9660Created => "ISO9660Created",
            HybridState::Fat32Created => "FAT32Created",
            HybridState::FilesToIsoWritten => "FilesToISOWritten",
            HybridState::FilesToFatWritten => "FilesToFATWritten",
            HybridState::Iso9660Finalized => "ISO9660Finalized",
        })
    }
}

/// Outcome of a successful hybrid build
#[derive(Debug, Clone)]
pub struct HybridReport {
    pub layout: PartitionLayout,
    pub states: Vec<HybridState>,
    pub boot_entry: BootCatalogEntry,
}

/// Build the hybrid image at `spec.out`
pub fn build_hybrid(spec: &BootImageSpec, config: &ImageConfig) -> Result<HybridReport> {
    let mut progress = Progress::new("hybrid");
    match run(spec, config, &mut progress) {
        Ok((layout, boot_entry)) => {
            info!("hybrid image written to {}", spec.out.display());
            Ok(HybridReport {
                layout,
                states: progress.into_states(),
                boot_entry,
            })
        }
        Err(err) => Err(progress.abort(err)),
    }
}

fn run(
    spec: &BootImageSpec,
    config: &ImageConfig,
    progress: &mut Progress<HybridState>,
) -> Result<(PartitionLayout, BootCatalogEntry)> {
    let layout = SizeCalculator::new(config).hybrid_layout(spec)?;
    progress.reached(HybridState::SizeComputed);

    let builder = DiskBuilder::new(config);
    let disk = builder.create_disk(&spec.out, &layout, config.iso_block_size)?;
    progress.reached(HybridState::DiskCreated);

    builder.apply_partition_table(&disk, &layout)?;
    progress.reached(HybridState::PartitionTableApplied);

    let mut iso =
        builder.create_filesystem(&disk, &layout, ISO_PARTITION, FilesystemKind::Iso9660)?;
    progress.reached(HybridState::Iso9660Created);

    let mut esp =
        builder.create_filesystem(&disk, &layout, ESP_PARTITION, FilesystemKind::Fat32)?;
    progress.reached(HybridState::Fat32Created);

    let installer = FileInstaller::new(config);
    installer.install_boot_files(&mut iso, spec)?;
    progress.reached(HybridState::FilesToIsoWritten);

    installer.install_boot_files(&mut esp, spec)?;
    esp.flush().map_err(|source| Error::FilesystemCreate {
        kind: FilesystemKind::Fat32,
        index: ESP_PARTITION,
        source,
    })?;
    progress.reached(HybridState::FilesToFatWritten);

    let boot_file = BootFile::Shim.destination(config);
    let entry = boot::finalize(&mut iso, &config.hybrid_catalog, boot_file, config)?;
    progress.reached(HybridState::Iso9660Finalized);

    Ok((layout, entry))
}
