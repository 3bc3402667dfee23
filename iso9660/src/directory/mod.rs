//! Directory record parsing and navigation

pub mod iterator;
pub mod path_table;
pub mod record;

use crate::error::{Iso9660Error, Result};
use crate::types::{FileEntry, FileFlags, VolumeInfo, MAX_DIRECTORY_DEPTH};
use crate::utils::string;
use alloc::string::String;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;

/// Find a file or directory by path
///
/// Navigates the directory tree from root to locate a file/directory.
/// Components are mapped the same way the writer maps them, and compared
/// case-insensitively, so `/EFI/boot/bootx64.efi` finds
/// `EFI/BOOT/BOOTX64.EFI;1`. Both `/` and `\` separate components.
///
/// # Example
/// ```ignore
/// use iso9660::{mount, find_file};
///
/// let volume = mount(&mut block_io)?;
/// let file = find_file(&mut block_io, &volume, "/EFI/boot/bootx64.efi")?;
/// println!("File size: {} bytes", file.size);
/// ```
pub fn find_file<B: BlockIo>(
    block_io: &mut B,
    volume: &VolumeInfo,
    path: &str,
) -> Result<FileEntry> {
    let components: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|c| !c.is_empty())
        .collect();

    if components.len() > MAX_DIRECTORY_DEPTH {
        return Err(Iso9660Error::PathTooLong);
    }

    if components.is_empty() {
        return Ok(FileEntry {
            name: String::from("/"),
            size: volume.root_extent_len as u64,
            extent_lba: volume.root_extent_lba,
            data_length: volume.root_extent_len,
            flags: FileFlags {
                directory: true,
                ..FileFlags::default()
            },
        });
    }

    let mut current_lba = volume.root_extent_lba;
    let mut current_len = volume.root_extent_len;

    for (depth, component) in components.iter().enumerate() {
        let is_last = depth == components.len() - 1;

        let mut found = None;
        for result in iterator::DirectoryIterator::new(block_io, current_lba, current_len) {
            let entry = result?;
            if string::identifier_matches(&entry.name, entry.flags.directory, component) {
                found = Some(entry);
                break;
            }
        }

        let entry = found.ok_or(Iso9660Error::NotFound)?;
        if is_last {
            return Ok(entry);
        }
        if !entry.flags.directory {
            return Err(Iso9660Error::NotADirectory);
        }
        current_lba = entry.extent_lba;
        current_len = entry.data_length;
    }

    Err(Iso9660Error::NotFound)
}

/// List the entries of a directory
pub fn list_dir<B: BlockIo>(block_io: &mut B, directory: &FileEntry) -> Result<Vec<FileEntry>> {
    if !directory.flags.directory {
        return Err(Iso9660Error::NotADirectory);
    }
    iterator::DirectoryIterator::new(block_io, directory.extent_lba, directory.data_length)
        .collect()
}
