//! Boot catalog encoding and parsing
//!
//! The catalog is one sector: a validation entry, then the initial/default
//! entry. No section headers are written.

use crate::boot::entry::BootEntry;
use crate::boot::validation::ValidationEntry;
use crate::error::Result;
use crate::types::SECTOR_SIZE;

/// Boot Catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootCatalog {
    /// Validation entry
    pub validation: ValidationEntry,

    /// Initial/default boot entry
    pub initial: BootEntry,
}

impl BootCatalog {
    /// Catalog entry size (32 bytes)
    pub const ENTRY_SIZE: usize = 32;

    /// Encode into a catalog sector
    pub fn encode(&self) -> [u8; SECTOR_SIZE] {
        let mut sector = [0u8; SECTOR_SIZE];
        sector[..Self::ENTRY_SIZE].copy_from_slice(&self.validation.encode());
        sector[Self::ENTRY_SIZE..2 * Self::ENTRY_SIZE].copy_from_slice(&self.initial.encode());
        sector
    }

    /// Parse boot catalog from sector data
    pub fn parse(data: &[u8]) -> Result<Self> {
        let validation = ValidationEntry::parse(data)?;
        let initial = BootEntry::parse(data.get(Self::ENTRY_SIZE..).unwrap_or_default())?;
        Ok(Self {
            validation,
            initial,
        })
    }
}
