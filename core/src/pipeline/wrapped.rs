//! Two-stage build: a bare FAT32 ESP image, then an ISO9660 image that
//! boots it through El Torito

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;

use super::Progress;
use crate::boot::{self, BootCatalogEntry};
use crate::config::ImageConfig;
use crate::disk::DiskBuilder;
use crate::error::{Error, InstallStep, Result};
use crate::fs::{FilesystemKind, FsError};
use crate::input::BootImageSpec;
use crate::install::{install_file, FileInstaller};
use crate::layout::{PartitionLayout, SizeCalculator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EspState {
    SizeComputed,
    DiskCreated,
    FilesWritten,
}

impl fmt::Display for EspState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EspState::SizeComputed => "SizeComputed",
            EspState::DiskCreated => "DiskCreated",
            EspState::FilesWritten => "FilesWritten",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapState {
    SizeFromStage1Output,
    DiskCreated,
    EmbeddedFileWritten,
    Iso9660Finalized,
}

impl fmt::Display for WrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WrapState::SizeFromStage1Output => "SizeFromStage1Output",
            WrapState::DiskCreated => "DiskCreated",
            WrapState::EmbeddedFileWritten => "EmbeddedFileWritten",
            WrapState::Iso9660Finalized => "ISO9660Finalized",
        })
    }
}

#[derive(Debug, Clone)]
pub struct EspReport {
    pub layout: PartitionLayout,
    pub states: Vec<EspState>,
}

#[derive(Debug, Clone)]
pub struct WrapReport {
    pub layout: PartitionLayout,
    pub states: Vec<WrapState>,
    /// Path of the FAT32 image inside the ISO9660 volume
    pub embedded_path: String,
    pub boot_entry: BootCatalogEntry,
}

#[derive(Debug, Clone)]
pub struct WrappedReport {
    pub esp: EspReport,
    pub wrap: WrapReport,
}

/// Stage 1: a FAT32 volume spanning the whole of `stage1`, no partition table
pub fn build_esp(spec: &BootImageSpec, stage1: &Path, config: &ImageConfig) -> Result<EspReport> {
    let mut progress = Progress::new("wrapped stage 1");
    match run_esp(spec, stage1, config, &mut progress) {
        Ok(layout) => Ok(EspReport {
            layout,
            states: progress.into_states(),
        }),
        Err(err) => Err(progress.abort(err)),
    }
}

fn run_esp(
    spec: &BootImageSpec,
    stage1: &Path,
    config: &ImageConfig,
    progress: &mut Progress<EspState>,
) -> Result<PartitionLayout> {
    let layout = SizeCalculator::new(config).esp_layout(spec)?;
    progress.reached(EspState::SizeComputed);

    let builder = DiskBuilder::new(config);
    let disk = builder.create_disk(stage1, &layout, config.sector_size)?;
    builder.apply_partition_table(&disk, &layout)?;
    let mut esp = builder.create_filesystem(&disk, &layout, 0, FilesystemKind::Fat32)?;
    progress.reached(EspState::DiskCreated);

    FileInstaller::new(config).install_boot_files(&mut esp, spec)?;
    esp.flush().map_err(|source| Error::FilesystemCreate {
        kind: FilesystemKind::Fat32,
        index: 0,
        source,
    })?;
    progress.reached(EspState::FilesWritten);

    Ok(layout)
}

/// Stage 2: an ISO9660 image at `out` embedding `stage1` under the
/// embedded directory and booting it
pub fn wrap_esp(stage1: &Path, out: &Path, config: &ImageConfig) -> Result<WrapReport> {
    let mut progress = Progress::new("wrapped stage 2");
    match run_wrap(stage1, out, config, &mut progress) {
        Ok((layout, embedded_path, boot_entry)) => Ok(WrapReport {
            layout,
            states: progress.into_states(),
            embedded_path,
            boot_entry,
        }),
        Err(err) => Err(progress.abort(err)),
    }
}

fn run_wrap(
    stage1: &Path,
    out: &Path,
    config: &ImageConfig,
    progress: &mut Progress<WrapState>,
) -> Result<(PartitionLayout, String, BootCatalogEntry)> {
    let layout = SizeCalculator::new(config).wrap_layout(stage1)?;
    progress.reached(WrapState::SizeFromStage1Output);

    let builder = DiskBuilder::new(config);
    let disk = builder.create_disk(out, &layout, config.iso_block_size)?;
    builder.apply_partition_table(&disk, &layout)?;
    let mut iso = builder.create_filesystem(&disk, &layout, 0, FilesystemKind::Iso9660)?;
    progress.reached(WrapState::DiskCreated);

    let embedded_path = embedded_path(stage1, config)?;
    install_file(&mut iso, stage1, &embedded_path)?;
    progress.reached(WrapState::EmbeddedFileWritten);

    let entry = boot::finalize(&mut iso, &config.wrapped_catalog, &embedded_path, config)?;
    progress.reached(WrapState::Iso9660Finalized);

    Ok((layout, embedded_path, entry))
}

/// `<embedded dir>/<basename of stage1>`
fn embedded_path(stage1: &Path, config: &ImageConfig) -> Result<String> {
    let name = stage1
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Install {
            source_path: PathBuf::from(stage1),
            destination: config.embedded_dir.clone(),
            kind: FilesystemKind::Iso9660,
            step: InstallStep::Create,
            source: FsError::InvalidName(stage1.display().to_string()),
        })?;
    Ok(format!("{}/{}", config.embedded_dir.trim_end_matches('/'), name))
}

/// Both stages; `stage1` holds the intermediate image and is left to the
/// caller to remove
pub fn build_wrapped(
    spec: &BootImageSpec,
    stage1: &Path,
    config: &ImageConfig,
) -> Result<WrappedReport> {
    let esp = build_esp(spec, stage1, config)?;
    let wrap = wrap_esp(stage1, &spec.out, config)?;
    info!(
        "wrapped image written to {} ({} embedded)",
        spec.out.display(),
        wrap.embedded_path
    );
    Ok(WrappedReport { esp, wrap })
}
