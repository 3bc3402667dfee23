// FAT32 filesystem formatter

use super::{
    BACKUP_BOOT_SECTOR, FSINFO_LEAD_SIG, FSINFO_SECTOR, FSINFO_STRUC_SIG, FSINFO_TRAIL_SIG,
    MEDIA_FIXED, NUM_FATS, OEM_NAME, RESERVED_SECTORS, ROOT_CLUSTER, SECTOR_SIZE,
};
use crate::util::crc32;
use crate::fs::fat32_ops::types::{DirEntry, ATTR_VOLUME_ID, END_OF_CHAIN};
use crate::fs::{FsError, FsResult};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::debug;

/// Largest single write issued while zeroing
const ZERO_CHUNK_SECTORS: u64 = 128;

/// Sizes derived from the volume length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fat32Geometry {
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    /// Sectors per FAT copy
    pub fat_size: u32,
    /// Data clusters, numbered from 2
    pub cluster_count: u32,
}

impl Fat32Geometry {
    pub fn for_volume(total_sectors: u64) -> FsResult<Self> {
        if total_sectors > u32::MAX as u64 {
            return Err(FsError::TooLarge);
        }
        let total_sectors = total_sectors as u32;
        let sectors_per_cluster = sectors_per_cluster(total_sectors);

        // Reserved area, both FATs and at least the root cluster plus one more
        if total_sectors < RESERVED_SECTORS + NUM_FATS + 2 * sectors_per_cluster as u32 {
            return Err(FsError::TooSmall);
        }
        let fat_size = fat_size(total_sectors, sectors_per_cluster);

        let data_sectors = total_sectors
            .checked_sub(RESERVED_SECTORS + NUM_FATS * fat_size)
            .ok_or(FsError::TooSmall)?;
        let cluster_count = data_sectors / sectors_per_cluster as u32;
        if cluster_count < 2 {
            return Err(FsError::TooSmall);
        }

        Ok(Self {
            total_sectors,
            sectors_per_cluster,
            fat_size,
            cluster_count,
        })
    }

    /// First sector of cluster 2
    pub fn data_start_sector(&self) -> u32 {
        RESERVED_SECTORS + NUM_FATS * self.fat_size
    }
}

/// Cluster size by volume size, following the Microsoft table
fn sectors_per_cluster(total_sectors: u32) -> u8 {
    match total_sectors {
        0..=532_480 => 1,
        532_481..=16_777_216 => 8,
        16_777_217..=33_554_432 => 16,
        33_554_433..=67_108_864 => 32,
        _ => 64,
    }
}

/// Microsoft FAT32 FAT size formula
fn fat_size(total_sectors: u32, sectors_per_cluster: u8) -> u32 {
    let tmp1 = (total_sectors - RESERVED_SECTORS) as u64;
    let tmp2 = (256 * sectors_per_cluster as u64 + NUM_FATS as u64) / 2;
    tmp1.div_ceil(tmp2) as u32
}

/// FAT32 boot sector (first 512 bytes of the volume)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSector {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub media_type: u8,
    pub hidden_sectors: u32,
    pub total_sectors: u32,
    pub fat_size: u32,
    pub root_cluster: u32,
    pub fs_info_sector: u16,
    pub backup_boot_sector: u16,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
}

impl BootSector {
    fn new(geometry: &Fat32Geometry, hidden_sectors: u32, label: [u8; 11]) -> Self {
        let mut seed = label.to_vec();
        seed.extend_from_slice(&geometry.total_sectors.to_le_bytes());
        seed.extend_from_slice(&hidden_sectors.to_le_bytes());

        Self {
            oem_name: *OEM_NAME,
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: geometry.sectors_per_cluster,
            reserved_sectors: RESERVED_SECTORS as u16,
            num_fats: NUM_FATS as u8,
            media_type: MEDIA_FIXED,
            hidden_sectors,
            total_sectors: geometry.total_sectors,
            fat_size: geometry.fat_size,
            root_cluster: ROOT_CLUSTER,
            fs_info_sector: FSINFO_SECTOR as u16,
            backup_boot_sector: BACKUP_BOOT_SECTOR as u16,
            volume_id: crc32(&seed),
            volume_label: label,
        }
    }

    pub fn encode(&self) -> [u8; SECTOR_SIZE] {
        let mut bs = [0u8; SECTOR_SIZE];
        bs[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]); // JMP short + NOP
        bs[3..11].copy_from_slice(&self.oem_name);
        bs[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        bs[13] = self.sectors_per_cluster;
        bs[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        bs[16] = self.num_fats;
        // Root entry count and 16-bit totals stay zero on FAT32
        bs[21] = self.media_type;
        bs[24..26].copy_from_slice(&63u16.to_le_bytes()); // sectors per track
        bs[26..28].copy_from_slice(&255u16.to_le_bytes()); // heads
        bs[28..32].copy_from_slice(&self.hidden_sectors.to_le_bytes());
        bs[32..36].copy_from_slice(&self.total_sectors.to_le_bytes());
        bs[36..40].copy_from_slice(&self.fat_size.to_le_bytes());
        bs[44..48].copy_from_slice(&self.root_cluster.to_le_bytes());
        bs[48..50].copy_from_slice(&self.fs_info_sector.to_le_bytes());
        bs[50..52].copy_from_slice(&self.backup_boot_sector.to_le_bytes());
        bs[64] = 0x80; // drive number
        bs[66] = 0x29; // extended boot signature
        bs[67..71].copy_from_slice(&self.volume_id.to_le_bytes());
        bs[71..82].copy_from_slice(&self.volume_label);
        bs[82..90].copy_from_slice(b"FAT32   ");
        // Not bootable: CLI; HLT; JMP back to HLT
        bs[90..94].copy_from_slice(&[0xFA, 0xF4, 0xEB, 0xFD]);
        bs[510] = 0x55;
        bs[511] = 0xAA;
        bs
    }

    pub fn parse(bs: &[u8]) -> FsResult<Self> {
        if bs.len() < SECTOR_SIZE || bs[510] != 0x55 || bs[511] != 0xAA {
            return Err(FsError::Corrupt("missing boot sector signature"));
        }
        if &bs[82..90] != b"FAT32   " {
            return Err(FsError::Corrupt("not a FAT32 boot sector"));
        }
        let u16_at = |o: usize| u16::from_le_bytes([bs[o], bs[o + 1]]);
        let u32_at = |o: usize| u32::from_le_bytes([bs[o], bs[o + 1], bs[o + 2], bs[o + 3]]);

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&bs[3..11]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&bs[71..82]);

        Ok(Self {
            oem_name,
            bytes_per_sector: u16_at(11),
            sectors_per_cluster: bs[13],
            reserved_sectors: u16_at(14),
            num_fats: bs[16],
            media_type: bs[21],
            hidden_sectors: u32_at(28),
            total_sectors: u32_at(32),
            fat_size: u32_at(36),
            root_cluster: u32_at(44),
            fs_info_sector: u16_at(48),
            backup_boot_sector: u16_at(50),
            volume_id: u32_at(67),
            volume_label,
        })
    }
}

/// FSInfo sector with the free cluster hint
pub(crate) fn encode_fsinfo(free_count: u32, next_free: u32) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    sector[0..4].copy_from_slice(&FSINFO_LEAD_SIG.to_le_bytes());
    sector[484..488].copy_from_slice(&FSINFO_STRUC_SIG.to_le_bytes());
    sector[488..492].copy_from_slice(&free_count.to_le_bytes());
    sector[492..496].copy_from_slice(&next_free.to_le_bytes());
    sector[508..512].copy_from_slice(&FSINFO_TRAIL_SIG.to_le_bytes());
    sector
}

/// Space padded, upper case 11 byte volume label
pub(crate) fn volume_label(label: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    for (dst, c) in out.iter_mut().zip(label.bytes()) {
        *dst = c.to_ascii_uppercase();
    }
    out
}

pub(crate) fn write_sectors<B: BlockIo>(block_io: &mut B, lba: u64, data: &[u8]) -> FsResult<()> {
    block_io
        .write_blocks(Lba(lba), data)
        .map_err(|e| FsError::Device(format!("write at sector {lba}: {e:?}")))
}

pub(crate) fn read_sectors<B: BlockIo>(block_io: &mut B, lba: u64, data: &mut [u8]) -> FsResult<()> {
    block_io
        .read_blocks(Lba(lba), data)
        .map_err(|e| FsError::Device(format!("read at sector {lba}: {e:?}")))
}

fn zero_sectors<B: BlockIo>(block_io: &mut B, start: u64, count: u64) -> FsResult<()> {
    let zeros = vec![0u8; (ZERO_CHUNK_SECTORS as usize) * SECTOR_SIZE];
    let mut lba = start;
    let end = start + count;
    while lba < end {
        let n = (end - lba).min(ZERO_CHUNK_SECTORS);
        write_sectors(block_io, lba, &zeros[..n as usize * SECTOR_SIZE])?;
        lba += n;
    }
    Ok(())
}

/// Format the whole block device as FAT32
///
/// `hidden_sectors` is the volume's offset on its disk, recorded in the boot
/// sector only. Returns the geometry that was written.
pub fn format_fat32<B: BlockIo>(
    block_io: &mut B,
    hidden_sectors: u64,
    label: &str,
) -> FsResult<Fat32Geometry> {
    if block_io.block_size().to_u64() != SECTOR_SIZE as u64 {
        return Err(FsError::Corrupt("FAT32 needs 512-byte blocks"));
    }
    let total = block_io
        .num_blocks()
        .map_err(|e| FsError::Device(format!("{e:?}")))?;
    let geometry = Fat32Geometry::for_volume(total)?;
    let hidden_sectors = u32::try_from(hidden_sectors).map_err(|_| FsError::TooLarge)?;
    let label = volume_label(label);

    debug!(
        "fat32: {} sectors, {} sectors/cluster, FAT {} sectors, {} clusters",
        geometry.total_sectors,
        geometry.sectors_per_cluster,
        geometry.fat_size,
        geometry.cluster_count
    );

    // Reserved area, both FATs and the root cluster start out zeroed
    let root_end = geometry.data_start_sector() as u64 + geometry.sectors_per_cluster as u64;
    zero_sectors(block_io, 0, root_end)?;

    let boot_bytes = BootSector::new(&geometry, hidden_sectors, label).encode();
    write_sectors(block_io, 0, &boot_bytes)?;
    write_sectors(block_io, BACKUP_BOOT_SECTOR as u64, &boot_bytes)?;

    // Root takes one cluster; allocation resumes after it
    let fsinfo = encode_fsinfo(geometry.cluster_count - 1, ROOT_CLUSTER + 1);
    write_sectors(block_io, FSINFO_SECTOR as u64, &fsinfo)?;
    write_sectors(block_io, BACKUP_BOOT_SECTOR as u64 + 1, &fsinfo)?;

    // Entries 0 and 1 are reserved, entry 2 ends the root chain
    let mut fat_sector = [0u8; SECTOR_SIZE];
    fat_sector[0..4].copy_from_slice(&(0x0FFF_FF00 | MEDIA_FIXED as u32).to_le_bytes());
    fat_sector[4..8].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    fat_sector[8..12].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    for copy in 0..NUM_FATS {
        let lba = RESERVED_SECTORS as u64 + (copy * geometry.fat_size) as u64;
        write_sectors(block_io, lba, &fat_sector)?;
    }

    // Volume label entry at the top of the root directory
    let mut root_sector = [0u8; SECTOR_SIZE];
    let mut label_entry = DirEntry::empty();
    label_entry.name = label;
    label_entry.attr = ATTR_VOLUME_ID;
    root_sector[..32].copy_from_slice(&label_entry.encode());
    write_sectors(block_io, geometry.data_start_sector() as u64, &root_sector)?;

    block_io
        .flush()
        .map_err(|e| FsError::Device(format!("{e:?}")))?;
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block_io::MemoryDisk;

    #[test]
    fn test_cluster_size_table() {
        assert_eq!(sectors_per_cluster(2048), 1);
        assert_eq!(sectors_per_cluster(532_480), 1);
        assert_eq!(sectors_per_cluster(532_481), 8);
        assert_eq!(sectors_per_cluster(16_777_216), 8);
        assert_eq!(sectors_per_cluster(33_554_432), 16);
        assert_eq!(sectors_per_cluster(67_108_864), 32);
        assert_eq!(sectors_per_cluster(u32::MAX), 64);
    }

    #[test]
    fn test_one_mib_volume_geometry() {
        let geometry = Fat32Geometry::for_volume(2048).unwrap();
        assert_eq!(geometry.sectors_per_cluster, 1);
        // ceil(2016 / 129)
        assert_eq!(geometry.fat_size, 16);
        assert_eq!(geometry.data_start_sector(), 64);
        assert_eq!(geometry.cluster_count, 1984);
        // Every cluster has a FAT entry
        assert!(geometry.fat_size * 128 >= geometry.cluster_count + 2);
    }

    #[test]
    fn test_fat_covers_clusters_at_larger_sizes() {
        for total in [12_288u64, 600_000, 2_097_152, 20_000_000] {
            let g = Fat32Geometry::for_volume(total).unwrap();
            assert!(g.fat_size as u64 * 128 >= g.cluster_count as u64 + 2, "{total}");
            assert!(g.data_start_sector() as u64 + g.cluster_count as u64 * g.sectors_per_cluster as u64 <= total);
        }
    }

    #[test]
    fn test_tiny_volume_rejected() {
        assert!(matches!(Fat32Geometry::for_volume(16), Err(FsError::TooSmall)));
        assert!(matches!(
            Fat32Geometry::for_volume(u32::MAX as u64 + 1),
            Err(FsError::TooLarge)
        ));
    }

    #[test]
    fn test_boot_sector_encoding() {
        let mut disk = MemoryDisk::new(2048, 512);
        let geometry = format_fat32(&mut disk, 4096, "immu").unwrap();

        let bs = BootSector::parse(disk.sector(0)).unwrap();
        assert_eq!(bs.total_sectors, 2048);
        assert_eq!(bs.fat_size, geometry.fat_size);
        assert_eq!(bs.hidden_sectors, 4096);
        assert_eq!(&bs.volume_label, b"IMMU       ");
        assert_eq!(disk.sector(0), disk.sector(6));
    }

    #[test]
    fn test_format_is_deterministic() {
        let mut a = MemoryDisk::new(4096, 512);
        let mut b = MemoryDisk::new(4096, 512);
        format_fat32(&mut a, 0, "IMMU").unwrap();
        format_fat32(&mut b, 0, "IMMU").unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_rejects_2048_byte_blocks() {
        let mut disk = MemoryDisk::new(512, 2048);
        assert!(format_fat32(&mut disk, 0, "IMMU").is_err());
    }
}
