//! File reading

use crate::error::{Iso9660Error, Result};
use crate::types::{FileEntry, SECTOR_SIZE};
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Read file contents into `buffer`
///
/// Returns the number of bytes read, which is the file size.
pub fn read_file<B: BlockIo>(
    block_io: &mut B,
    file: &FileEntry,
    buffer: &mut [u8],
) -> Result<usize> {
    if file.flags.directory {
        return Err(Iso9660Error::IsADirectory);
    }

    let file_size = file.size as usize;
    if buffer.len() < file_size {
        return Err(Iso9660Error::BufferTooSmall);
    }

    let full_sectors = file_size / SECTOR_SIZE;
    let start_lba = file.extent_lba as u64;

    if full_sectors > 0 {
        block_io
            .read_blocks(Lba(start_lba), &mut buffer[..full_sectors * SECTOR_SIZE])
            .map_err(|_| Iso9660Error::IoError)?;
    }

    let tail = file_size % SECTOR_SIZE;
    if tail > 0 {
        let mut sector = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(Lba(start_lba + full_sectors as u64), &mut sector)
            .map_err(|_| Iso9660Error::IoError)?;
        let offset = full_sectors * SECTOR_SIZE;
        buffer[offset..file_size].copy_from_slice(&sector[..tail]);
    }

    Ok(file_size)
}

/// Read file into new Vec
pub fn read_file_vec<B: BlockIo>(block_io: &mut B, file: &FileEntry) -> Result<Vec<u8>> {
    let mut buffer = alloc::vec![0u8; file.size as usize];
    read_file(block_io, file, &mut buffer)?;
    Ok(buffer)
}
