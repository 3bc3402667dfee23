//! Volume descriptor handling
//!
//! ISO9660 volume descriptors start at sector 16 and describe the filesystem
//! layout. Volumes written here carry a Primary descriptor, an optional El
//! Torito Boot Record and a Terminator.

pub mod boot_record;
pub mod primary;

use crate::directory::record::DirectoryRecord;
use crate::error::{Iso9660Error, Result};
use crate::types::{VolumeDescriptorType, VolumeInfo, SECTOR_SIZE, VOLUME_DESCRIPTOR_START};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Descriptors scanned before giving up on a terminator
const MAX_DESCRIPTORS: u64 = 64;

/// Mount an ISO9660 volume from a block device
///
/// Reads volume descriptors starting at sector 16 and builds VolumeInfo.
/// The block device must use 2048-byte blocks and start at the first
/// sector of the volume.
pub fn mount<B: BlockIo>(block_io: &mut B) -> Result<VolumeInfo> {
    if block_io.block_size().to_u64() != SECTOR_SIZE as u64 {
        return Err(Iso9660Error::InvalidBlockSize);
    }

    let mut buffer = [0u8; SECTOR_SIZE];
    let mut boot_catalog_lba: Option<u32> = None;
    let mut volume_info: Option<VolumeInfo> = None;

    for sector in VOLUME_DESCRIPTOR_START..VOLUME_DESCRIPTOR_START + MAX_DESCRIPTORS {
        block_io
            .read_blocks(Lba(sector), &mut buffer)
            .map_err(|_| Iso9660Error::IoError)?;

        let header = VolumeDescriptorHeader::parse(&buffer)?;

        match header.type_code {
            t if t == VolumeDescriptorType::BootRecord as u8 => {
                boot_catalog_lba = boot_record::catalog_lba(&buffer);
            }
            t if t == VolumeDescriptorType::Primary as u8 => {
                let pvd = primary::PrimaryVolumeDescriptor::parse(&buffer)?;
                let root = DirectoryRecord::parse(&pvd.root_directory_record)?;

                volume_info = Some(VolumeInfo {
                    volume_id: pvd.volume_id,
                    volume_set_id: pvd.volume_set_id,
                    root_extent_lba: root.extent_lba,
                    root_extent_len: root.data_length,
                    logical_block_size: pvd.logical_block_size,
                    volume_space_size: pvd.volume_space_size,
                    boot_catalog_lba: None,
                });
            }
            t if t == VolumeDescriptorType::Terminator as u8 => break,
            _ => {}
        }
    }

    let mut info = volume_info.ok_or(Iso9660Error::InvalidSignature)?;
    info.boot_catalog_lba = boot_catalog_lba;
    Ok(info)
}

/// Volume Descriptor header (first 7 bytes of each descriptor)
#[derive(Debug, Clone, Copy)]
pub struct VolumeDescriptorHeader {
    /// Type code (0=boot, 1=primary, 2=supplementary, 255=terminator)
    pub type_code: u8,

    /// Version (always 1)
    pub version: u8,
}

impl VolumeDescriptorHeader {
    /// CD001 magic bytes
    pub const MAGIC: &'static [u8; 5] = b"CD001";

    /// Header for a descriptor of the given type
    pub fn new(kind: VolumeDescriptorType) -> Self {
        Self {
            type_code: kind as u8,
            version: 1,
        }
    }

    /// Parse and validate a header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 7 || &data[1..6] != Self::MAGIC {
            return Err(Iso9660Error::InvalidSignature);
        }
        if data[6] != 1 {
            return Err(Iso9660Error::UnsupportedVersion);
        }
        Ok(Self {
            type_code: data[0],
            version: data[6],
        })
    }

    /// Write the header into the first 7 bytes of `sector`
    pub fn write(&self, sector: &mut [u8]) {
        sector[0] = self.type_code;
        sector[1..6].copy_from_slice(Self::MAGIC);
        sector[6] = self.version;
    }
}

/// Encode a Volume Descriptor Set Terminator
pub fn encode_terminator() -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    VolumeDescriptorHeader::new(VolumeDescriptorType::Terminator).write(&mut sector);
    sector
}
