//! Partition sizing and geometry
//!
//! [`SizeCalculator`] turns boot file sizes into a [`PartitionLayout`]:
//! aligned partition sizes, back to back sector ranges and the disk size.
//! The disk padding is not left idle: whatever the partition table does not
//! need is handed to the partitions as room for filesystem metadata.
//! All sector numbers are 512-byte sectors.

use std::fs;
use std::path::Path;

use log::debug;

use crate::config::{ImageConfig, Rounding, SecondaryLoader};
use crate::disk::PartitionType;
use crate::error::{Error, Result};
use crate::input::{BootFile, BootImageSpec};

/// Partition table written to the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Protective MBR plus primary and backup GPT
    Gpt,
    /// The single filesystem spans the whole disk
    None,
}

/// One partition, sectors inclusive on both ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub start_sector: u64,
    pub end_sector: u64,
    pub partition_type: PartitionType,
    pub name: String,
}

impl PartitionDescriptor {
    pub fn sectors(&self) -> u64 {
        self.end_sector - self.start_sector + 1
    }

    pub fn offset_bytes(&self, sector_size: u64) -> u64 {
        self.start_sector * sector_size
    }

    pub fn len_bytes(&self, sector_size: u64) -> u64 {
        self.sectors() * sector_size
    }
}

/// Computed geometry of one disk image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    /// Ascending and non-overlapping
    pub partitions: Vec<PartitionDescriptor>,
    /// Aligned size derived from the inputs
    pub partition_size: u64,
    /// Padding bytes each partition gets on top of `partition_size`
    pub slack: u64,
    pub disk_size: u64,
    pub sector_size: u64,
    pub table: TableKind,
}

impl PartitionLayout {
    pub fn disk_sectors(&self) -> u64 {
        self.disk_size / self.sector_size
    }
}

/// Align `size` to `alignment`, a power of two
pub fn align(size: u64, alignment: u64, rounding: Rounding) -> u64 {
    let mask = alignment - 1;
    match rounding {
        Rounding::Down => size & !mask,
        Rounding::Up => size.saturating_add(mask) & !mask,
    }
}

/// `count` ranges of `sectors` each, back to back from `first`
pub fn back_to_back(first: u64, sectors: u64, count: usize) -> Vec<(u64, u64)> {
    (0..count as u64)
        .map(|i| {
            let start = first + i * sectors;
            (start, start + sectors - 1)
        })
        .collect()
}

pub struct SizeCalculator<'a> {
    config: &'a ImageConfig,
}

impl<'a> SizeCalculator<'a> {
    pub fn new(config: &'a ImageConfig) -> Self {
        Self { config }
    }

    fn counts_towards_size(&self, file: BootFile) -> bool {
        match file {
            BootFile::Mmx => self.config.sizing.secondary_loader == SecondaryLoader::Included,
            BootFile::Shim | BootFile::Linuxboot => true,
        }
    }

    /// Sum of the sizes of the present boot files the policy counts
    ///
    /// Every present file is stat'ed, counted or not, so a missing input
    /// fails here before anything is created.
    pub fn combined_size(&self, spec: &BootImageSpec) -> Result<u64> {
        let mut combined = 0u64;
        for (file, path) in spec.present() {
            let len = stat(path, &format!("{file} file"))?;
            if self.counts_towards_size(file) {
                debug!("{} {} counts {} bytes", file, path.display(), len);
                combined += len;
            }
        }
        Ok(combined)
    }

    fn aligned(&self, combined: u64) -> Result<u64> {
        let size = align(combined, self.config.alignment, self.config.sizing.rounding);
        if size == 0 {
            return Err(Error::DegenerateSize { combined });
        }
        Ok(size)
    }

    /// Aligned partition size for the boot files of `spec`
    pub fn partition_size(&self, spec: &BootImageSpec) -> Result<u64> {
        let combined = self.combined_size(spec)?;
        self.aligned(combined)
    }

    /// Padding share of each of `count` partitions under a GPT
    ///
    /// The lead-in before the first partition and one alignment unit at the
    /// end, which holds the backup GPT, stay out of the share.
    pub fn table_slack(&self, count: usize) -> u64 {
        let lead = self.config.first_partition_sector * self.config.sector_size;
        let spare = self
            .config
            .padding
            .saturating_sub(lead + self.config.alignment);
        align(spare / count.max(1) as u64, self.config.alignment, Rounding::Down)
    }

    /// ISO9660 and ESP partitions of equal size under a GPT
    pub fn hybrid_layout(&self, spec: &BootImageSpec) -> Result<PartitionLayout> {
        let partition_size = self.partition_size(spec)?;
        let kinds = [
            (PartitionType::BasicData, &self.config.iso_partition_name),
            (PartitionType::EfiSystem, &self.config.esp_partition_name),
        ];
        let slack = self.table_slack(kinds.len());
        let sectors = (partition_size + slack) / self.config.sector_size;

        let partitions = back_to_back(self.config.first_partition_sector, sectors, kinds.len())
            .into_iter()
            .zip(kinds)
            .map(|((start_sector, end_sector), (partition_type, name))| PartitionDescriptor {
                start_sector,
                end_sector,
                partition_type,
                name: name.clone(),
            })
            .collect::<Vec<_>>();

        let layout = PartitionLayout {
            disk_size: partition_size * partitions.len() as u64 + self.config.padding,
            partitions,
            partition_size,
            slack,
            sector_size: self.config.sector_size,
            table: TableKind::Gpt,
        };
        log_layout("hybrid", &layout);
        Ok(layout)
    }

    /// Bare FAT32 ESP image spanning the whole disk
    pub fn esp_layout(&self, spec: &BootImageSpec) -> Result<PartitionLayout> {
        let partition_size = self.partition_size(spec)?;
        let layout = self.whole_disk(
            partition_size,
            PartitionType::EfiSystem,
            &self.config.esp_partition_name,
        );
        log_layout("esp", &layout);
        Ok(layout)
    }

    /// ISO9660 image sized for the file at `embedded`
    pub fn wrap_layout(&self, embedded: &Path) -> Result<PartitionLayout> {
        let combined = stat(embedded, "embedded image")?;
        let partition_size = self.aligned(combined)?;
        let layout = self.whole_disk(
            partition_size,
            PartitionType::BasicData,
            &self.config.iso_partition_name,
        );
        log_layout("wrap", &layout);
        Ok(layout)
    }

    fn whole_disk(&self, partition_size: u64, partition_type: PartitionType, name: &str) -> PartitionLayout {
        let disk_size = partition_size + self.config.padding;
        PartitionLayout {
            partitions: vec![PartitionDescriptor {
                start_sector: 0,
                end_sector: disk_size / self.config.sector_size - 1,
                partition_type,
                name: name.to_string(),
            }],
            partition_size,
            slack: self.config.padding,
            disk_size,
            sector_size: self.config.sector_size,
            table: TableKind::None,
        }
    }
}

fn stat(path: &Path, what: &str) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| Error::Stat {
            what: what.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

fn log_layout(name: &str, layout: &PartitionLayout) {
    debug!(
        "{} layout: partition {} bytes + {} slack, disk {} bytes",
        name, layout.partition_size, layout.slack, layout.disk_size
    );
    for (index, p) in layout.partitions.iter().enumerate() {
        debug!(
            "  partition {}: {} sectors {}..={}",
            index, p.name, p.start_sector, p.end_sector
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SizingPolicy, MIB};
    use proptest::prelude::*;
    use std::fs::File;
    use tempfile::TempDir;

    const KIB: u64 = 1024;

    fn fixture(dir: &TempDir, name: &str, len: u64) -> std::path::PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().set_len(len).unwrap();
        path
    }

    /// shim 900 KiB, linuxboot 200 KiB, mmx 50 KiB
    fn scenario_a(dir: &TempDir) -> BootImageSpec {
        BootImageSpec::new(dir.path().join("out.img"))
            .with_file(BootFile::Shim, fixture(dir, "shim.efi", 900 * KIB))
            .with_file(BootFile::Linuxboot, fixture(dir, "linuxboot.efi", 200 * KIB))
            .with_file(BootFile::Mmx, fixture(dir, "mmx.efi", 50 * KIB))
    }

    #[test]
    fn test_scenario_a_reference_geometry() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);
        let spec = scenario_a(&dir);

        assert_eq!(calc.combined_size(&spec).unwrap(), 1100 * KIB);
        let layout = calc.hybrid_layout(&spec).unwrap();
        assert_eq!(layout.partition_size, MIB);
        assert_eq!(layout.slack, MIB);
        assert_eq!(layout.disk_size, 7 * MIB);
        assert_eq!(layout.table, TableKind::Gpt);

        // 1 MiB of content room plus 1 MiB of padding each; the last
        // 2 MiB of the disk keep the backup GPT
        let ranges: Vec<(u64, u64)> = layout
            .partitions
            .iter()
            .map(|p| (p.start_sector, p.end_sector))
            .collect();
        assert_eq!(ranges, vec![(2048, 6143), (6144, 10239)]);
        assert!(layout.partitions[1].end_sector < layout.disk_sectors() - 33);
        assert_eq!(layout.partitions[0].partition_type, PartitionType::BasicData);
        assert_eq!(layout.partitions[0].name, "ISO9660");
        assert_eq!(layout.partitions[1].partition_type, PartitionType::EfiSystem);
        assert_eq!(layout.partitions[1].name, "EFI System");
    }

    #[test]
    fn test_scenario_a_conservative_geometry() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default().with_sizing(SizingPolicy::conservative());
        let calc = SizeCalculator::new(&config);
        let spec = scenario_a(&dir);

        assert_eq!(calc.combined_size(&spec).unwrap(), 1150 * KIB);
        let layout = calc.hybrid_layout(&spec).unwrap();
        assert_eq!(layout.partition_size, 2 * MIB);
        assert_eq!(layout.disk_size, 9 * MIB);
        assert_eq!(layout.partitions[1].start_sector, 2048 + 6144);
    }

    #[test]
    fn test_sub_mib_total_depends_on_rounding() {
        let dir = TempDir::new().unwrap();
        let spec = BootImageSpec::new(dir.path().join("out.img"))
            .with_file(BootFile::Shim, fixture(&dir, "shim.efi", 300 * KIB));

        let reference = ImageConfig::default();
        assert!(matches!(
            SizeCalculator::new(&reference).hybrid_layout(&spec),
            Err(Error::DegenerateSize { combined }) if combined == 300 * KIB
        ));

        let conservative = ImageConfig::default().with_sizing(SizingPolicy::conservative());
        let layout = SizeCalculator::new(&conservative).hybrid_layout(&spec).unwrap();
        assert_eq!(layout.partition_size, MIB);
        assert_eq!(layout.disk_size, 7 * MIB);
    }

    #[test]
    fn test_table_slack_shares_the_padding() {
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);
        assert_eq!(calc.table_slack(2), MIB);
        assert_eq!(calc.table_slack(1), 3 * MIB);

        let tight = ImageConfig {
            padding: 2 * MIB,
            ..ImageConfig::default()
        };
        assert_eq!(SizeCalculator::new(&tight).table_slack(2), 0);
    }

    #[test]
    fn test_absent_files_add_nothing() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);
        let spec = BootImageSpec::new(dir.path().join("out.img"))
            .with_file(BootFile::Shim, fixture(&dir, "shim.efi", 3 * MIB + 5));

        assert_eq!(calc.combined_size(&spec).unwrap(), 3 * MIB + 5);
        assert_eq!(calc.partition_size(&spec).unwrap(), 3 * MIB);
    }

    #[test]
    fn test_degenerate_sizes() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);

        let empty = BootImageSpec::new(dir.path().join("out.img"));
        assert!(matches!(
            calc.hybrid_layout(&empty),
            Err(Error::DegenerateSize { combined: 0 })
        ));

        let small = BootImageSpec::new(dir.path().join("out.img"))
            .with_file(BootFile::Shim, fixture(&dir, "shim.efi", MIB - 1));
        assert!(matches!(
            calc.hybrid_layout(&small),
            Err(Error::DegenerateSize { .. })
        ));
    }

    #[test]
    fn test_missing_file_names_it() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);
        let missing = dir.path().join("nope.efi");
        let spec = BootImageSpec::new(dir.path().join("out.img")).with_file(BootFile::Mmx, &missing);

        // Stat'ed even though the reference policy does not count mmx
        match calc.combined_size(&spec) {
            Err(Error::Stat { what, path, .. }) => {
                assert_eq!(what, "mmx file");
                assert_eq!(path, missing);
            }
            other => panic!("expected Stat error, got {other:?}"),
        }
    }

    #[test]
    fn test_esp_and_wrap_layouts_span_the_disk() {
        let dir = TempDir::new().unwrap();
        let config = ImageConfig::default();
        let calc = SizeCalculator::new(&config);
        let spec = BootImageSpec::new(dir.path().join("out.img"))
            .with_file(BootFile::Shim, fixture(&dir, "shim.efi", 900 * KIB))
            .with_file(BootFile::Linuxboot, fixture(&dir, "linuxboot.efi", 200 * KIB));

        let esp = calc.esp_layout(&spec).unwrap();
        assert_eq!(esp.disk_size, 6 * MIB);
        assert_eq!(esp.table, TableKind::None);
        assert_eq!(esp.partitions.len(), 1);
        assert_eq!(esp.partitions[0].start_sector, 0);
        assert_eq!(esp.partitions[0].len_bytes(512), esp.disk_size);
        assert_eq!(esp.slack, 5 * MIB);

        let stage1 = fixture(&dir, "esp.img", esp.disk_size);
        let wrap = calc.wrap_layout(&stage1).unwrap();
        assert_eq!(wrap.partition_size, 6 * MIB);
        assert_eq!(wrap.disk_size, 11 * MIB);
        assert_eq!(wrap.partitions[0].partition_type, PartitionType::BasicData);
    }

    #[test]
    fn test_rounding_directions() {
        assert_eq!(align(MIB + 1, MIB, Rounding::Down), MIB);
        assert_eq!(align(MIB + 1, MIB, Rounding::Up), 2 * MIB);
        assert_eq!(align(MIB, MIB, Rounding::Up), MIB);
        assert_eq!(align(0, MIB, Rounding::Up), 0);
    }

    proptest! {
        #[test]
        fn prop_aligned_down_is_whole_mib_and_not_larger(size in 0u64..(1 << 40)) {
            let aligned = align(size, MIB, Rounding::Down);
            prop_assert_eq!(aligned % MIB, 0);
            prop_assert!(aligned <= size);
            prop_assert!(size - aligned < MIB);
        }

        #[test]
        fn prop_aligned_up_covers_input(size in 0u64..(1 << 40)) {
            let aligned = align(size, MIB, Rounding::Up);
            prop_assert_eq!(aligned % MIB, 0);
            prop_assert!(aligned >= size);
            prop_assert!(aligned - size < MIB);
        }

        #[test]
        fn prop_ranges_ascend_without_gaps(mib in 1u64..4096, count in 1usize..3) {
            let sectors = mib * MIB / 512;
            let ranges = back_to_back(2048, sectors, count);
            prop_assert_eq!(ranges.len(), count);
            prop_assert_eq!(ranges[0].0, 2048);
            for (start, end) in &ranges {
                prop_assert_eq!(end - start + 1, sectors);
            }
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[1].0, pair[0].1 + 1);
            }
        }
    }
}
