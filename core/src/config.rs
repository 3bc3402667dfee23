//! Image format constants
//!
//! Everything that shapes the produced image lives in one immutable
//! [`ImageConfig`] handed to each pipeline.

/// One mebibyte
pub const MIB: u64 = 1 << 20;

/// Whether the secondary loader (mmx) counts towards partition sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondaryLoader {
    /// Only shim and linuxboot are summed
    #[default]
    Excluded,
    /// mmx is summed as well
    Included,
}

/// Direction partition sizes are aligned in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Clear the bits below the alignment
    #[default]
    Down,
    /// Round up to the next alignment boundary
    Up,
}

/// How boot file sizes turn into a partition size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizingPolicy {
    pub secondary_loader: SecondaryLoader,
    pub rounding: Rounding,
}

impl SizingPolicy {
    /// mmx excluded, sizes rounded down
    pub const fn reference() -> Self {
        Self {
            secondary_loader: SecondaryLoader::Excluded,
            rounding: Rounding::Down,
        }
    }

    /// mmx included, sizes rounded up
    pub const fn conservative() -> Self {
        Self {
            secondary_loader: SecondaryLoader::Included,
            rounding: Rounding::Up,
        }
    }
}

/// Format constants for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// ISO9660 volume set identifier and FAT32 volume label
    pub volume_label: String,
    /// ISO9660 primary volume identifier
    pub volume_id: String,

    pub shim_destination: String,
    pub mmx_destination: String,
    pub linuxboot_destination: String,

    /// Boot catalog of the hybrid image
    pub hybrid_catalog: String,
    /// Boot catalog of the wrapped image
    pub wrapped_catalog: String,
    /// Directory holding the embedded FAT32 image in the wrapped image
    pub embedded_dir: String,

    /// Bytes added to the partition total for table and slack
    pub padding: u64,
    /// Partition size alignment, a power of two
    pub alignment: u64,
    /// First sector of the first partition
    pub first_partition_sector: u64,
    /// Physical sector size
    pub sector_size: u64,
    /// Logical block size of ISO9660-bearing images
    pub iso_block_size: u64,

    pub iso_partition_name: String,
    pub esp_partition_name: String,

    pub sizing: SizingPolicy,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            volume_label: "IMMU".into(),
            volume_id: "immu".into(),
            shim_destination: "/EFI/boot/bootx64.efi".into(),
            mmx_destination: "/EFI/boot/mmx64.efi".into(),
            linuxboot_destination: "/EFI/boot/linuxboot.efi".into(),
            hybrid_catalog: "/BOOT.CAT".into(),
            wrapped_catalog: "/boot.catalog".into(),
            embedded_dir: "/vfat".into(),
            padding: 5 * MIB,
            alignment: MIB,
            first_partition_sector: 2048,
            sector_size: 512,
            iso_block_size: 2048,
            iso_partition_name: "ISO9660".into(),
            esp_partition_name: "EFI System".into(),
            sizing: SizingPolicy::reference(),
        }
    }
}

impl ImageConfig {
    /// Same constants with a different sizing policy
    pub fn with_sizing(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference() {
        let config = ImageConfig::default();
        assert_eq!(config.sizing, SizingPolicy::reference());
        assert_eq!(config.padding, 5 * MIB);
        assert_eq!(config.first_partition_sector * config.sector_size, MIB);
    }

    #[test]
    fn conservative_policy() {
        let policy = SizingPolicy::conservative();
        assert_eq!(policy.secondary_loader, SecondaryLoader::Included);
        assert_eq!(policy.rounding, Rounding::Up);
        assert_eq!(SizingPolicy::default(), SizingPolicy::reference());
    }
}
