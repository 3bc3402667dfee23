//! Directory iteration
//!
//! Iterator for reading directory entries sequentially.

use crate::directory::record::DirectoryRecord;
use crate::error::{Iso9660Error, Result};
use crate::types::{FileEntry, SECTOR_SIZE};
use crate::utils::string;
use alloc::boxed::Box;
use alloc::string::String;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Directory iterator
///
/// Yields every record of a directory extent except "." and "..". Names keep
/// their on-disk spelling with the version suffix stripped.
pub struct DirectoryIterator<'a, B: BlockIo> {
    block_io: &'a mut B,
    extent_lba: u32,
    extent_len: u32,
    offset: usize,
    current_sector: Box<[u8; SECTOR_SIZE]>,
    current_sector_lba: Option<u64>,
}

impl<'a, B: BlockIo> DirectoryIterator<'a, B> {
    /// Create new directory iterator
    pub fn new(block_io: &'a mut B, extent_lba: u32, extent_len: u32) -> Self {
        Self {
            block_io,
            extent_lba,
            extent_len,
            offset: 0,
            current_sector: Box::new([0u8; SECTOR_SIZE]),
            current_sector_lba: None,
        }
    }
}

impl<B: BlockIo> Iterator for DirectoryIterator<'_, B> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.offset >= self.extent_len as usize {
                return None;
            }

            let sector_index = self.offset / SECTOR_SIZE;
            let lba = self.extent_lba as u64 + sector_index as u64;
            let offset_in_sector = self.offset % SECTOR_SIZE;

            if self.current_sector_lba != Some(lba) {
                if self
                    .block_io
                    .read_blocks(Lba(lba), self.current_sector.as_mut())
                    .is_err()
                {
                    return Some(Err(Iso9660Error::IoError));
                }
                self.current_sector_lba = Some(lba);
            }

            let sector_data = &self.current_sector[offset_in_sector..];

            // Records never cross sectors; zero fill pads the tail
            if sector_data.is_empty() || sector_data[0] == 0 {
                self.offset = (sector_index + 1) * SECTOR_SIZE;
                continue;
            }

            let record = match DirectoryRecord::parse(sector_data) {
                Ok(r) => r,
                Err(e) => return Some(Err(e)),
            };

            self.offset += record.length as usize;

            if record.is_special() {
                continue;
            }

            let name = match string::dchars_to_str(record.identifier) {
                Ok(s) => String::from(string::strip_version(s)),
                Err(_) => String::from_utf8_lossy(record.identifier).into_owned(),
            };

            return Some(Ok(FileEntry {
                name,
                size: record.data_length as u64,
                extent_lba: record.extent_lba,
                data_length: record.data_length,
                flags: record.flags(),
            }));
        }
    }
}
