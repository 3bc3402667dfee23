//! Fixtures and image readers shared by the integration tests

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use isogen_core::disk::PartitionIo;
use isogen_core::fs::Fat32Volume;
use isogen_core::{BootFile, BootImageSpec, PartitionDescriptor};
use tempfile::TempDir;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

/// Deterministic byte pattern of `len` bytes
pub fn pattern(len: u64, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// Scratch directory holding boot file fixtures and outputs
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a fixture file filled with `pattern(len, seed)`
    pub fn file(&self, name: &str, len: u64, seed: u8) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, pattern(len, seed)).expect("write fixture");
        path
    }

    /// shim 900 KiB, linuxboot 200 KiB, mmx 50 KiB
    pub fn scenario_a(&self) -> BootImageSpec {
        BootImageSpec::new(self.path("out.img"))
            .with_file(BootFile::Shim, self.file("shim.efi", 900 * KIB, 1))
            .with_file(BootFile::Linuxboot, self.file("linuxboot.efi", 200 * KIB, 2))
            .with_file(BootFile::Mmx, self.file("mmx.efi", 50 * KIB, 3))
    }
}

/// Block device over `[offset, offset + len)` of an image file
pub fn window(image: &Path, offset: u64, len: u64, block_size: u32) -> PartitionIo {
    let file = File::open(image).expect("open image");
    PartitionIo::new(file, offset, len, block_size).expect("partition window")
}

/// Block device over a partition of an image, in `block_size` blocks
pub fn partition_io(image: &Path, partition: &PartitionDescriptor, block_size: u32) -> PartitionIo {
    window(
        image,
        partition.offset_bytes(512),
        partition.len_bytes(512),
        block_size,
    )
}

/// Mount the FAT32 volume of a partition
pub fn mount_fat(image: &Path, partition: &PartitionDescriptor) -> Fat32Volume<PartitionIo> {
    Fat32Volume::open(partition_io(image, partition, 512)).expect("mount fat32")
}

/// Read a file from the ISO9660 volume on `block_io`
pub fn read_iso_file(block_io: &mut PartitionIo, path: &str) -> Vec<u8> {
    let volume = iso9660::mount(block_io).expect("mount iso9660");
    let file = iso9660::find_file(block_io, &volume, path).expect("find file");
    iso9660::read_file_vec(block_io, &file).expect("read file")
}
