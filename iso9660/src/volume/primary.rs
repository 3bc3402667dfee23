//! Primary Volume Descriptor encoding and parsing
//!
//! The Primary Volume Descriptor (PVD) is always present and describes
//! the basic ISO9660 filesystem structure. See ECMA-119 8.4 for the
//! field layout; offsets below are zero-based byte positions.

use crate::error::{Iso9660Error, Result};
use crate::types::{VolumeDescriptorType, SECTOR_SIZE};
use crate::utils::datetime::DATETIME17_UNSPECIFIED;
use crate::utils::string;
use crate::volume::VolumeDescriptorHeader;

const SYSTEM_ID: usize = 8;
const VOLUME_ID: usize = 40;
const VOLUME_SPACE_SIZE: usize = 80;
const VOLUME_SET_SIZE: usize = 120;
const VOLUME_SEQUENCE_NUMBER: usize = 124;
const LOGICAL_BLOCK_SIZE: usize = 128;
const PATH_TABLE_SIZE: usize = 132;
const TYPE_L_PATH_TABLE: usize = 140;
const TYPE_M_PATH_TABLE: usize = 148;
const ROOT_DIRECTORY_RECORD: usize = 156;
const VOLUME_SET_ID: usize = 190;
const PUBLISHER_ID: usize = 318;
const CREATION_DATE: usize = 813;
const FILE_STRUCTURE_VERSION: usize = 881;

/// Length of the root directory record embedded in the PVD
pub const ROOT_RECORD_LENGTH: usize = 34;

/// Both-endian 32-bit value (stored as LE then BE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BothEndian32(pub u32);

impl BothEndian32 {
    /// Wrap a value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get value (uses little-endian half)
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Read the little-endian half of an 8-byte field
    pub fn read(bytes: &[u8]) -> u32 {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Encode both halves
    pub fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.0.to_le_bytes());
        out[4..].copy_from_slice(&self.0.to_be_bytes());
        out
    }
}

/// Both-endian 16-bit value (stored as LE then BE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BothEndian16(pub u16);

impl BothEndian16 {
    /// Wrap a value
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get value (uses little-endian half)
    pub fn get(&self) -> u16 {
        self.0
    }

    /// Read the little-endian half of a 4-byte field
    pub fn read(bytes: &[u8]) -> u16 {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    /// Encode both halves
    pub fn to_bytes(self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[..2].copy_from_slice(&self.0.to_le_bytes());
        out[2..].copy_from_slice(&self.0.to_be_bytes());
        out
    }
}

/// Primary Volume Descriptor fields the writer fills and the reader returns
#[derive(Debug, Clone)]
pub struct PrimaryVolumeDescriptor {
    /// Volume identifier (32 characters)
    pub volume_id: [u8; 32],

    /// Volume set identifier (128 characters)
    pub volume_set_id: [u8; 128],

    /// Volume space size in logical blocks
    pub volume_space_size: u32,

    /// Logical block size (2048)
    pub logical_block_size: u16,

    /// Path table size in bytes
    pub path_table_size: u32,

    /// Type L path table location
    pub type_l_path_table: u32,

    /// Type M path table location
    pub type_m_path_table: u32,

    /// Root directory record
    pub root_directory_record: [u8; ROOT_RECORD_LENGTH],
}

impl PrimaryVolumeDescriptor {
    /// Build a descriptor with space padded identifiers
    pub fn new(volume_id: &str, volume_set_id: &str) -> Self {
        let mut pvd = Self {
            volume_id: [b' '; 32],
            volume_set_id: [b' '; 128],
            volume_space_size: 0,
            logical_block_size: SECTOR_SIZE as u16,
            path_table_size: 0,
            type_l_path_table: 0,
            type_m_path_table: 0,
            root_directory_record: [0; ROOT_RECORD_LENGTH],
        };
        string::write_padded(&mut pvd.volume_id, volume_id);
        string::write_padded(&mut pvd.volume_set_id, volume_set_id);
        pvd
    }

    /// Encode into a full descriptor sector
    pub fn encode(&self) -> [u8; SECTOR_SIZE] {
        let mut sector = [0u8; SECTOR_SIZE];
        VolumeDescriptorHeader::new(VolumeDescriptorType::Primary).write(&mut sector);

        sector[SYSTEM_ID..VOLUME_ID].fill(b' ');
        sector[VOLUME_ID..VOLUME_ID + 32].copy_from_slice(&self.volume_id);
        sector[VOLUME_SPACE_SIZE..VOLUME_SPACE_SIZE + 8]
            .copy_from_slice(&BothEndian32::new(self.volume_space_size).to_bytes());
        sector[VOLUME_SET_SIZE..VOLUME_SET_SIZE + 4]
            .copy_from_slice(&BothEndian16::new(1).to_bytes());
        sector[VOLUME_SEQUENCE_NUMBER..VOLUME_SEQUENCE_NUMBER + 4]
            .copy_from_slice(&BothEndian16::new(1).to_bytes());
        sector[LOGICAL_BLOCK_SIZE..LOGICAL_BLOCK_SIZE + 4]
            .copy_from_slice(&BothEndian16::new(self.logical_block_size).to_bytes());
        sector[PATH_TABLE_SIZE..PATH_TABLE_SIZE + 8]
            .copy_from_slice(&BothEndian32::new(self.path_table_size).to_bytes());
        sector[TYPE_L_PATH_TABLE..TYPE_L_PATH_TABLE + 4]
            .copy_from_slice(&self.type_l_path_table.to_le_bytes());
        sector[TYPE_M_PATH_TABLE..TYPE_M_PATH_TABLE + 4]
            .copy_from_slice(&self.type_m_path_table.to_be_bytes());
        sector[ROOT_DIRECTORY_RECORD..ROOT_DIRECTORY_RECORD + ROOT_RECORD_LENGTH]
            .copy_from_slice(&self.root_directory_record);
        sector[VOLUME_SET_ID..VOLUME_SET_ID + 128].copy_from_slice(&self.volume_set_id);

        // Publisher through bibliographic file identifiers stay blank
        sector[PUBLISHER_ID..CREATION_DATE].fill(b' ');

        for date in 0..4 {
            let start = CREATION_DATE + date * 17;
            sector[start..start + 17].copy_from_slice(&DATETIME17_UNSPECIFIED);
        }

        sector[FILE_STRUCTURE_VERSION] = 1;
        sector
    }

    /// Parse Primary Volume Descriptor from sector data
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < SECTOR_SIZE {
            return Err(Iso9660Error::InvalidSignature);
        }

        let header = VolumeDescriptorHeader::parse(data)?;
        if header.type_code != VolumeDescriptorType::Primary as u8 {
            return Err(Iso9660Error::InvalidSignature);
        }

        let mut volume_id = [0u8; 32];
        volume_id.copy_from_slice(&data[VOLUME_ID..VOLUME_ID + 32]);
        let mut volume_set_id = [0u8; 128];
        volume_set_id.copy_from_slice(&data[VOLUME_SET_ID..VOLUME_SET_ID + 128]);
        let mut root_directory_record = [0u8; ROOT_RECORD_LENGTH];
        root_directory_record.copy_from_slice(
            &data[ROOT_DIRECTORY_RECORD..ROOT_DIRECTORY_RECORD + ROOT_RECORD_LENGTH],
        );

        Ok(Self {
            volume_id,
            volume_set_id,
            volume_space_size: BothEndian32::read(&data[VOLUME_SPACE_SIZE..]),
            logical_block_size: BothEndian16::read(&data[LOGICAL_BLOCK_SIZE..]),
            path_table_size: BothEndian32::read(&data[PATH_TABLE_SIZE..]),
            type_l_path_table: u32::from_le_bytes([
                data[TYPE_L_PATH_TABLE],
                data[TYPE_L_PATH_TABLE + 1],
                data[TYPE_L_PATH_TABLE + 2],
                data[TYPE_L_PATH_TABLE + 3],
            ]),
            type_m_path_table: u32::from_be_bytes([
                data[TYPE_M_PATH_TABLE],
                data[TYPE_M_PATH_TABLE + 1],
                data[TYPE_M_PATH_TABLE + 2],
                data[TYPE_M_PATH_TABLE + 3],
            ]),
            root_directory_record,
        })
    }
}
