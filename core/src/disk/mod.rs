//! Disk images: creation, partition tables and per-partition filesystems

pub mod block_io;
pub mod gpt;
pub mod partition;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, info};

pub use block_io::PartitionIo;
pub use partition::PartitionType;

use crate::config::ImageConfig;
use crate::error::{Error, Result};
use crate::fs::{Fat32Volume, FilesystemHandle, FilesystemKind, FsError, IsoFilesystem};
use crate::layout::{PartitionLayout, TableKind};

/// A raw disk image file owned by one build
///
/// The file is closed when the handle and every filesystem opened on it
/// are dropped.
#[derive(Debug)]
pub struct DiskImageHandle {
    path: PathBuf,
    file: File,
    total_size_bytes: u64,
    sector_size_bytes: u64,
    logical_block_size_bytes: u64,
}

impl DiskImageHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// Unit of all partition arithmetic, always 512
    pub fn sector_size_bytes(&self) -> u64 {
        self.sector_size_bytes
    }

    /// Block size ISO9660 filesystems on this disk are written with
    pub fn logical_block_size_bytes(&self) -> u64 {
        self.logical_block_size_bytes
    }

    /// A block device over `[offset, offset + len)` of the image
    fn window(&self, offset: u64, len: u64, block_size: u64) -> std::io::Result<PartitionIo> {
        PartitionIo::new(self.file.try_clone()?, offset, len, block_size as u32)
    }
}

/// Creates disk images and the filesystems on them
pub struct DiskBuilder<'a> {
    config: &'a ImageConfig,
}

impl<'a> DiskBuilder<'a> {
    pub fn new(config: &'a ImageConfig) -> Self {
        Self { config }
    }

    /// Create or overwrite `path`, sized exactly to the layout's disk size
    pub fn create_disk(
        &self,
        path: &Path,
        layout: &PartitionLayout,
        logical_block_size: u64,
    ) -> Result<DiskImageHandle> {
        let disk_create = |source| Error::DiskCreate {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(disk_create)?;
        file.set_len(layout.disk_size).map_err(disk_create)?;

        info!(
            "created disk image {} ({} bytes, {} byte blocks)",
            path.display(),
            layout.disk_size,
            logical_block_size
        );
        Ok(DiskImageHandle {
            path: path.to_path_buf(),
            file,
            total_size_bytes: layout.disk_size,
            sector_size_bytes: self.config.sector_size,
            logical_block_size_bytes: logical_block_size,
        })
    }

    /// Write the layout's partition table, if it has one
    pub fn apply_partition_table(
        &self,
        disk: &DiskImageHandle,
        layout: &PartitionLayout,
    ) -> Result<()> {
        match layout.table {
            TableKind::None => {
                debug!("{}: no partition table", disk.path.display());
                Ok(())
            }
            TableKind::Gpt => {
                let mut block_io = disk
                    .window(0, disk.total_size_bytes, disk.sector_size_bytes)
                    .map_err(|e| Error::PartitionTable {
                        reason: format!("open {}: {e}", disk.path.display()),
                    })?;
                gpt::write_gpt(&mut block_io, layout)?;
                info!(
                    "wrote GPT with {} partitions to {}",
                    layout.partitions.len(),
                    disk.path.display()
                );
                Ok(())
            }
        }
    }

    /// Instantiate a `kind` filesystem confined to partition `index`
    pub fn create_filesystem(
        &self,
        disk: &DiskImageHandle,
        layout: &PartitionLayout,
        index: usize,
        kind: FilesystemKind,
    ) -> Result<FilesystemHandle> {
        let fs_create = |source| Error::FilesystemCreate { kind, index, source };
        let partition = layout
            .partitions
            .get(index)
            .ok_or_else(|| fs_create(FsError::NotFound(format!("partition {index}"))))?;
        let offset = partition.offset_bytes(disk.sector_size_bytes);
        let len = partition.len_bytes(disk.sector_size_bytes);

        let handle = match kind {
            FilesystemKind::Iso9660 => {
                let block_io = disk
                    .window(offset, len, disk.logical_block_size_bytes)
                    .map_err(|e| fs_create(e.into()))?;
                FilesystemHandle::Iso9660 {
                    fs: IsoFilesystem::new(block_io).map_err(fs_create)?,
                    partition_index: index,
                }
            }
            FilesystemKind::Fat32 => {
                let block_io = disk
                    .window(offset, len, disk.sector_size_bytes)
                    .map_err(|e| fs_create(e.into()))?;
                let volume = Fat32Volume::format(
                    block_io,
                    partition.start_sector,
                    &self.config.volume_label,
                )
                .map_err(fs_create)?;
                FilesystemHandle::Fat32 {
                    volume,
                    partition_index: index,
                }
            }
        };

        info!(
            "created {} filesystem on partition {} ({} bytes at {})",
            kind, index, len, offset
        );
        Ok(handle)
    }
}
