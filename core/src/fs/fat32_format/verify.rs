// FAT32 post-format verification

use super::format::{read_sectors, volume_label, BootSector, Fat32Geometry};
use super::{
    BACKUP_BOOT_SECTOR, FSINFO_LEAD_SIG, FSINFO_SECTOR, FSINFO_STRUC_SIG, FSINFO_TRAIL_SIG,
    MEDIA_FIXED, NUM_FATS, OEM_NAME, RESERVED_SECTORS, ROOT_CLUSTER, SECTOR_SIZE,
};
use crate::fs::fat32_ops::types::END_OF_CHAIN;
use crate::fs::{FsError, FsResult};
use gpt_disk_io::BlockIo;

fn check(ok: bool, what: &str) -> FsResult<()> {
    if ok {
        Ok(())
    } else {
        Err(FsError::Verify(what.to_string()))
    }
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Check the structures written by [`format_fat32`](super::format_fat32)
pub fn verify_fat32<B: BlockIo>(block_io: &mut B, label: &str) -> FsResult<()> {
    let mut primary = [0u8; SECTOR_SIZE];
    read_sectors(block_io, 0, &mut primary)?;
    let bs = BootSector::parse(&primary).map_err(|e| FsError::Verify(e.to_string()))?;

    check(&bs.oem_name == OEM_NAME, "OEM name")?;
    check(bs.bytes_per_sector as usize == SECTOR_SIZE, "bytes per sector")?;
    check(bs.reserved_sectors as u32 == RESERVED_SECTORS, "reserved sectors")?;
    check(bs.num_fats as u32 == NUM_FATS, "number of FATs")?;
    check(bs.root_cluster == ROOT_CLUSTER, "root cluster")?;
    check(bs.fs_info_sector as u32 == FSINFO_SECTOR, "FSInfo sector")?;
    check(bs.backup_boot_sector as u32 == BACKUP_BOOT_SECTOR, "backup boot sector")?;
    check(bs.volume_label == volume_label(label), "volume label")?;

    let total = block_io
        .num_blocks()
        .map_err(|e| FsError::Device(format!("{e:?}")))?;
    let geometry = Fat32Geometry::for_volume(total)?;
    check(bs.total_sectors == geometry.total_sectors, "total sectors")?;
    check(bs.fat_size == geometry.fat_size, "FAT size")?;
    check(
        bs.sectors_per_cluster == geometry.sectors_per_cluster,
        "sectors per cluster",
    )?;

    let mut backup = [0u8; SECTOR_SIZE];
    read_sectors(block_io, BACKUP_BOOT_SECTOR as u64, &mut backup)?;
    check(backup == primary, "backup boot sector differs")?;

    let mut fsinfo = [0u8; SECTOR_SIZE];
    read_sectors(block_io, FSINFO_SECTOR as u64, &mut fsinfo)?;
    check(u32_at(&fsinfo, 0) == FSINFO_LEAD_SIG, "FSInfo lead signature")?;
    check(u32_at(&fsinfo, 484) == FSINFO_STRUC_SIG, "FSInfo struct signature")?;
    check(u32_at(&fsinfo, 508) == FSINFO_TRAIL_SIG, "FSInfo trail signature")?;

    // Each FAT copy starts with the media entry and two end-of-chain markers
    let mut fat = [0u8; SECTOR_SIZE];
    for copy in 0..NUM_FATS {
        read_sectors(
            block_io,
            (RESERVED_SECTORS + copy * geometry.fat_size) as u64,
            &mut fat,
        )?;
        check(fat[0] == MEDIA_FIXED, "FAT media descriptor")?;
        check(u32_at(&fat, 4) & END_OF_CHAIN == END_OF_CHAIN, "FAT reserved entry")?;
        check(u32_at(&fat, 8) & END_OF_CHAIN == END_OF_CHAIN, "root cluster chain")?;
    }

    Ok(())
}
