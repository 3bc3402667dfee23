//! Filesystems the disk builder instantiates on partitions

mod error;
pub mod fat32_format;
pub mod fat32_ops;
pub mod iso;

use std::fmt;

use gpt_disk_io::BlockIo;

pub use error::{FsError, FsResult};
pub use fat32_format::{format_fat32, verify_fat32, Fat32Geometry};
pub use fat32_ops::Fat32Volume;
pub use iso::IsoFilesystem;

use crate::disk::PartitionIo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilesystemKind {
    Iso9660,
    Fat32,
}

impl fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilesystemKind::Iso9660 => "iso9660",
            FilesystemKind::Fat32 => "fat32",
        })
    }
}

/// A filesystem living on one partition of a disk image
///
/// Only the ISO9660 variant carries a boot catalog; see
/// [`crate::boot::finalize`].
pub enum FilesystemHandle<B: BlockIo = PartitionIo> {
    Iso9660 {
        fs: IsoFilesystem<B>,
        partition_index: usize,
    },
    Fat32 {
        volume: Fat32Volume<B>,
        partition_index: usize,
    },
}

impl<B: BlockIo> FilesystemHandle<B> {
    pub fn kind(&self) -> FilesystemKind {
        match self {
            FilesystemHandle::Iso9660 { .. } => FilesystemKind::Iso9660,
            FilesystemHandle::Fat32 { .. } => FilesystemKind::Fat32,
        }
    }

    pub fn partition_index(&self) -> usize {
        match self {
            FilesystemHandle::Iso9660 { partition_index, .. }
            | FilesystemHandle::Fat32 { partition_index, .. } => *partition_index,
        }
    }

    pub fn create_dir_all(&mut self, path: &str) -> FsResult<()> {
        match self {
            FilesystemHandle::Iso9660 { fs, .. } => fs.create_dir_all(path),
            FilesystemHandle::Fat32 { volume, .. } => volume.create_dir_all(path),
        }
    }

    /// Create an empty file, truncating an existing one
    pub fn create_file(&mut self, path: &str) -> FsResult<()> {
        match self {
            FilesystemHandle::Iso9660 { fs, .. } => fs.create_file(path),
            FilesystemHandle::Fat32 { volume, .. } => volume.create_file(path),
        }
    }

    /// Replace the whole content of a file
    pub fn write_file(&mut self, path: &str, data: Vec<u8>) -> FsResult<()> {
        match self {
            FilesystemHandle::Iso9660 { fs, .. } => fs.write_file(path, data),
            FilesystemHandle::Fat32 { volume, .. } => volume.write_file(path, &data),
        }
    }

    pub fn flush(&mut self) -> FsResult<()> {
        match self {
            // Written out in one pass on finalize
            FilesystemHandle::Iso9660 { .. } => Ok(()),
            FilesystemHandle::Fat32 { volume, .. } => volume.flush(),
        }
    }

    pub fn as_iso9660_mut(&mut self) -> Option<&mut IsoFilesystem<B>> {
        match self {
            FilesystemHandle::Iso9660 { fs, .. } => Some(fs),
            FilesystemHandle::Fat32 { .. } => None,
        }
    }

    pub fn as_fat32_mut(&mut self) -> Option<&mut Fat32Volume<B>> {
        match self {
            FilesystemHandle::Fat32 { volume, .. } => Some(volume),
            FilesystemHandle::Iso9660 { .. } => None,
        }
    }
}

impl<B: BlockIo> fmt::Debug for FilesystemHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesystemHandle")
            .field("kind", &self.kind())
            .field("partition_index", &self.partition_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block_io::MemoryDisk;

    #[test]
    fn test_same_calls_on_both_kinds() {
        let mut handles: Vec<FilesystemHandle<MemoryDisk>> = vec![
            FilesystemHandle::Iso9660 {
                fs: IsoFilesystem::new(MemoryDisk::new(64, 2048)).unwrap(),
                partition_index: 0,
            },
            FilesystemHandle::Fat32 {
                volume: Fat32Volume::format(MemoryDisk::new(2048, 512), 0, "IMMU").unwrap(),
                partition_index: 1,
            },
        ];
        for handle in &mut handles {
            handle.create_dir_all("/EFI/boot").unwrap();
            handle.create_file("/EFI/boot/bootx64.efi").unwrap();
            handle.write_file("/EFI/boot/bootx64.efi", vec![9; 700]).unwrap();
            handle.flush().unwrap();
        }

        assert_eq!(handles[0].kind(), FilesystemKind::Iso9660);
        assert!(handles[0].as_iso9660_mut().unwrap().contains("/EFI/boot/bootx64.efi"));
        assert_eq!(handles[1].partition_index(), 1);
        assert_eq!(
            handles[1]
                .as_fat32_mut()
                .unwrap()
                .read_file("/EFI/boot/bootx64.efi")
                .unwrap(),
            vec![9; 700]
        );
        assert!(handles[1].as_iso9660_mut().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FilesystemKind::Iso9660.to_string(), "iso9660");
        assert_eq!(FilesystemKind::Fat32.to_string(), "fat32");
    }
}
