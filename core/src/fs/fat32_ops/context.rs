// FAT32 filesystem context and FAT table I/O

use super::types::FAT_MASK;
use crate::fs::fat32_format::{
    format::{encode_fsinfo, read_sectors, write_sectors},
    BootSector, BACKUP_BOOT_SECTOR, FSINFO_SECTOR, SECTOR_SIZE,
};
use crate::fs::{FsError, FsResult};
use gpt_disk_io::BlockIo;

/// FAT32 filesystem context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fat32Context {
    pub sectors_per_cluster: u32,
    pub reserved_sectors: u32,
    pub fat_size: u32,
    pub num_fats: u32,
    pub root_cluster: u32,
    pub data_start_sector: u32,
    /// Highest valid cluster number plus one
    pub cluster_limit: u32,
}

impl Fat32Context {
    pub fn from_boot_sector<B: BlockIo>(block_io: &mut B) -> FsResult<Self> {
        let mut boot_sector = [0u8; SECTOR_SIZE];
        read_sectors(block_io, 0, &mut boot_sector)?;
        let bs = BootSector::parse(&boot_sector)?;

        if bs.bytes_per_sector as usize != SECTOR_SIZE {
            return Err(FsError::Corrupt("unsupported sector size"));
        }
        if bs.sectors_per_cluster == 0 || bs.num_fats == 0 || bs.fat_size == 0 {
            return Err(FsError::Corrupt("zero sized FAT geometry"));
        }

        let sectors_per_cluster = bs.sectors_per_cluster as u32;
        let data_start_sector = bs.reserved_sectors as u32 + bs.num_fats as u32 * bs.fat_size;
        let data_sectors = bs
            .total_sectors
            .checked_sub(data_start_sector)
            .ok_or(FsError::Corrupt("FAT area exceeds the volume"))?;
        let cluster_count = data_sectors / sectors_per_cluster;
        // Clusters without a FAT entry are unusable
        let cluster_limit = (cluster_count + 2).min(bs.fat_size * (SECTOR_SIZE as u32 / 4));

        if bs.root_cluster < 2 || bs.root_cluster >= cluster_limit {
            return Err(FsError::Corrupt("root cluster out of range"));
        }

        Ok(Self {
            sectors_per_cluster,
            reserved_sectors: bs.reserved_sectors as u32,
            fat_size: bs.fat_size,
            num_fats: bs.num_fats as u32,
            root_cluster: bs.root_cluster,
            data_start_sector,
            cluster_limit,
        })
    }

    pub fn cluster_to_sector(&self, cluster: u32) -> u64 {
        self.data_start_sector as u64 + (cluster as u64 - 2) * self.sectors_per_cluster as u64
    }

    pub fn cluster_bytes(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    /// Read the first FAT copy, one entry per cluster up to the limit
    pub fn load_fat<B: BlockIo>(&self, block_io: &mut B) -> FsResult<Vec<u32>> {
        let sectors = (self.cluster_limit as usize * 4).div_ceil(SECTOR_SIZE);
        let mut raw = vec![0u8; sectors * SECTOR_SIZE];
        read_sectors(block_io, self.reserved_sectors as u64, &mut raw)?;

        Ok(raw
            .chunks_exact(4)
            .take(self.cluster_limit as usize)
            .map(|e| u32::from_le_bytes([e[0], e[1], e[2], e[3]]) & FAT_MASK)
            .collect())
    }

    /// Write `fat` to every FAT copy
    pub fn store_fat<B: BlockIo>(&self, block_io: &mut B, fat: &[u32]) -> FsResult<()> {
        let sectors = (fat.len() * 4).div_ceil(SECTOR_SIZE);
        let mut raw = vec![0u8; sectors * SECTOR_SIZE];
        for (dst, entry) in raw.chunks_exact_mut(4).zip(fat) {
            dst.copy_from_slice(&entry.to_le_bytes());
        }

        for fat_num in 0..self.num_fats {
            let lba = self.reserved_sectors as u64 + (fat_num * self.fat_size) as u64;
            write_sectors(block_io, lba, &raw)?;
        }
        Ok(())
    }

    /// Refresh the FSInfo sector and its backup
    pub fn write_fsinfo<B: BlockIo>(
        &self,
        block_io: &mut B,
        free_count: u32,
        next_free: u32,
    ) -> FsResult<()> {
        let sector = encode_fsinfo(free_count, next_free);
        write_sectors(block_io, FSINFO_SECTOR as u64, &sector)?;
        write_sectors(block_io, BACKUP_BOOT_SECTOR as u64 + 1, &sector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block_io::MemoryDisk;
    use crate::fs::fat32_format::format_fat32;
    use crate::fs::fat32_ops::types::END_OF_CHAIN;

    #[test]
    fn test_context_matches_geometry() {
        let mut disk = MemoryDisk::new(2048, 512);
        let geometry = format_fat32(&mut disk, 0, "IMMU").unwrap();
        let ctx = Fat32Context::from_boot_sector(&mut disk).unwrap();

        assert_eq!(ctx.fat_size, geometry.fat_size);
        assert_eq!(ctx.data_start_sector, geometry.data_start_sector());
        assert_eq!(ctx.cluster_limit, geometry.cluster_count + 2);
        assert_eq!(ctx.cluster_to_sector(2), 64);
        assert_eq!(ctx.cluster_bytes(), 512);
    }

    #[test]
    fn test_fat_round_trip_updates_all_copies() {
        let mut disk = MemoryDisk::new(2048, 512);
        format_fat32(&mut disk, 0, "IMMU").unwrap();
        let ctx = Fat32Context::from_boot_sector(&mut disk).unwrap();

        let mut fat = ctx.load_fat(&mut disk).unwrap();
        assert_eq!(fat[2], END_OF_CHAIN);
        assert_eq!(fat[3], 0);

        fat[3] = END_OF_CHAIN;
        ctx.store_fat(&mut disk, &fat).unwrap();

        let second = (32 + ctx.fat_size as usize) * 512;
        assert_eq!(&disk.data[second + 12..second + 16], &END_OF_CHAIN.to_le_bytes());
        assert_eq!(ctx.load_fat(&mut disk).unwrap(), fat);
    }

    #[test]
    fn test_rejects_unformatted() {
        let mut disk = MemoryDisk::new(2048, 512);
        assert!(Fat32Context::from_boot_sector(&mut disk).is_err());
    }
}
