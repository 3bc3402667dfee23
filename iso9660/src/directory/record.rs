//! Directory Record structure
//!
//! Directory records describe files and subdirectories. A record is 33 fixed
//! bytes, the file identifier, and a pad byte when the identifier length is
//! even so that every record starts on an even offset.

use crate::error::{Iso9660Error, Result};
use crate::types::FileFlags;
use crate::utils::datetime::DateTime7;
use crate::volume::primary::{BothEndian16, BothEndian32};

/// Size of the fixed part of a directory record
pub const FIXED_LENGTH: usize = 33;

/// Identifier byte of the "." record
pub const SELF_IDENTIFIER: u8 = 0x00;

/// Identifier byte of the ".." record
pub const PARENT_IDENTIFIER: u8 = 0x01;

/// Parsed directory record borrowing its identifier from the sector buffer
#[derive(Debug, Clone, Copy)]
pub struct DirectoryRecord<'a> {
    /// Length of directory record (BP 1)
    pub length: u8,

    /// Extent location (BP 3-10)
    pub extent_lba: u32,

    /// Data length (BP 11-18)
    pub data_length: u32,

    /// Recording date and time (BP 19-25)
    pub recorded: DateTime7,

    /// File flags (BP 26)
    pub file_flags: u8,

    /// File identifier bytes (BP 34 on)
    pub identifier: &'a [u8],
}

impl<'a> DirectoryRecord<'a> {
    /// Minimum record length
    pub const MIN_LENGTH: u8 = 34;

    /// Parse directory record from bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < Self::MIN_LENGTH as usize {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        let length = data[0];
        if length < Self::MIN_LENGTH || length as usize > data.len() {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        let id_len = data[32] as usize;
        if FIXED_LENGTH + id_len > length as usize {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        let mut recorded = [0u8; 7];
        recorded.copy_from_slice(&data[18..25]);

        Ok(Self {
            length,
            extent_lba: BothEndian32::read(&data[2..10]),
            data_length: BothEndian32::read(&data[10..18]),
            recorded: DateTime7::from_bytes(&recorded),
            file_flags: data[25],
            identifier: &data[FIXED_LENGTH..FIXED_LENGTH + id_len],
        })
    }

    /// Parse file flags
    pub fn flags(&self) -> FileFlags {
        FileFlags::from_byte(self.file_flags)
    }

    /// Is this a directory?
    pub fn is_directory(&self) -> bool {
        self.file_flags & FileFlags::DIRECTORY != 0
    }

    /// Is this the "." or ".." record?
    pub fn is_special(&self) -> bool {
        self.identifier == [SELF_IDENTIFIER] || self.identifier == [PARENT_IDENTIFIER]
    }
}

/// Encoded length of a record with an identifier of `id_len` bytes
pub const fn record_length(id_len: usize) -> usize {
    FIXED_LENGTH + id_len + (id_len + 1) % 2
}

/// Encode a directory record into `out`, returning the bytes used
///
/// `out` must hold at least `record_length(identifier.len())` bytes.
pub fn write_record(
    out: &mut [u8],
    extent_lba: u32,
    data_length: u32,
    file_flags: u8,
    identifier: &[u8],
) -> usize {
    let length = record_length(identifier.len());
    let record = &mut out[..length];
    record.fill(0);

    record[0] = length as u8;
    record[2..10].copy_from_slice(&BothEndian32::new(extent_lba).to_bytes());
    record[10..18].copy_from_slice(&BothEndian32::new(data_length).to_bytes());
    record[18..25].copy_from_slice(&DateTime7::default().to_bytes());
    record[25] = file_flags;
    record[28..32].copy_from_slice(&BothEndian16::new(1).to_bytes());
    record[32] = identifier.len() as u8;
    record[FIXED_LENGTH..FIXED_LENGTH + identifier.len()].copy_from_slice(identifier);

    length
}
