//! FAT32 file operations
//!
//! [`Fat32Volume`] keeps the first FAT copy in memory and writes every copy
//! back, together with the FSInfo hint, at the end of each mutating call so
//! the on-disk volume is consistent between calls.

mod context;
mod directory;
mod file_ops;
pub mod filename;
pub mod types;

pub use context::Fat32Context;

use crate::fs::fat32_format::{self, format::read_sectors, FSINFO_SECTOR, SECTOR_SIZE};
use crate::fs::{FsError, FsResult};
use directory::{Directory, Found};
use filename::{generate_short_name, lfn_entries, needs_long_name, validate_long_name};
use gpt_disk_io::BlockIo;
use log::debug;
use types::{DirEntry, ATTR_ARCHIVE, ATTR_DIRECTORY, DIR_ENTRY_SIZE};

/// FAT directories hold at most 65536 entries
const MAX_DIRECTORY_BYTES: usize = 65_536 * DIR_ENTRY_SIZE;

/// A mounted FAT32 volume
pub struct Fat32Volume<B: BlockIo> {
    block_io: B,
    ctx: Fat32Context,
    fat: Vec<u32>,
    free: u32,
    next_free: u32,
}

impl<B: BlockIo> Fat32Volume<B> {
    /// Mount an existing volume
    pub fn open(mut block_io: B) -> FsResult<Self> {
        let ctx = Fat32Context::from_boot_sector(&mut block_io)?;
        let fat = ctx.load_fat(&mut block_io)?;
        let free = fat.iter().skip(2).filter(|e| **e == 0).count() as u32;

        let mut fsinfo = [0u8; SECTOR_SIZE];
        read_sectors(&mut block_io, FSINFO_SECTOR as u64, &mut fsinfo)?;
        let hint = u32::from_le_bytes([fsinfo[492], fsinfo[493], fsinfo[494], fsinfo[495]]);
        let next_free = if (2..ctx.cluster_limit).contains(&hint) {
            hint
        } else {
            2
        };

        Ok(Self {
            block_io,
            ctx,
            fat,
            free,
            next_free,
        })
    }

    /// Format the whole device, verify the result and mount it
    pub fn format(mut block_io: B, hidden_sectors: u64, label: &str) -> FsResult<Self> {
        fat32_format::format_fat32(&mut block_io, hidden_sectors, label)?;
        fat32_format::verify_fat32(&mut block_io, label)?;
        Self::open(block_io)
    }

    pub fn context(&self) -> &Fat32Context {
        &self.ctx
    }

    /// Bytes available for new clusters
    pub fn free_bytes(&self) -> u64 {
        self.free as u64 * self.ctx.cluster_bytes() as u64
    }

    /// Create a directory and any missing parents
    pub fn create_dir_all(&mut self, path: &str) -> FsResult<()> {
        let components = split_path(path)?;
        let mut cluster = self.ctx.root_cluster;
        for (depth, name) in components.iter().enumerate() {
            let mut dir = self.load_dir(cluster)?;
            cluster = match dir.find(name) {
                Some(found) if found.entry.is_directory() => found.entry.first_cluster(),
                Some(_) => return Err(FsError::NotADirectory(join(&components[..=depth]))),
                None => self.make_dir(&mut dir, cluster, name)?,
            };
        }
        self.commit()
    }

    /// Create an empty file, truncating an existing one
    pub fn create_file(&mut self, path: &str) -> FsResult<()> {
        self.write_file(path, &[])
    }

    /// Create or fully replace a file; the parent directory must exist
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> FsResult<()> {
        let size = u32::try_from(data.len()).map_err(|_| FsError::FileTooLarge(data.len() as u64))?;
        let components = split_path(path)?;
        let (name, parents) = components
            .split_last()
            .ok_or_else(|| FsError::InvalidName(path.to_string()))?;

        let dir_cluster = self.resolve_dir(parents)?;
        let mut dir = self.load_dir(dir_cluster)?;
        let existing = dir.find(name);
        if let Some(found) = &existing {
            if found.entry.is_directory() {
                return Err(FsError::IsADirectory(path.to_string()));
            }
        }

        let needed = data.len().div_ceil(self.ctx.cluster_bytes());
        let reclaimable = match &existing {
            Some(found) => self.chain(found.entry.first_cluster())?.len(),
            None => 0,
        };
        if needed > self.free as usize + reclaimable {
            let cluster_bytes = self.ctx.cluster_bytes() as u64;
            return Err(FsError::NoSpace {
                needed: data.len() as u64,
                available: (self.free as u64 + reclaimable as u64) * cluster_bytes,
            });
        }
        if let Some(found) = &existing {
            self.release(found.entry.first_cluster())?;
        }

        let chain = self.allocate(needed)?;
        self.write_chain(&chain, data)?;
        let first_cluster = chain.first().copied().unwrap_or(0);

        match existing {
            Some(found) => {
                let mut entry = found.entry;
                entry.set_first_cluster(first_cluster);
                entry.file_size = size;
                dir.put(found.slot, &entry.encode());
                self.store_dir(&dir)?;
            }
            None => self.add_entry(&mut dir, name, ATTR_ARCHIVE, first_cluster, size)?,
        }

        debug!("fat32: wrote {} ({} bytes, {} clusters)", path, data.len(), needed);
        self.commit()
    }

    pub fn read_file(&mut self, path: &str) -> FsResult<Vec<u8>> {
        let found = self.lookup(path)?;
        if found.entry.is_directory() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        let chain = self.chain(found.entry.first_cluster())?;
        let len = found.entry.file_size as usize;
        if len > chain.len() * self.ctx.cluster_bytes() {
            return Err(FsError::Corrupt("file size exceeds its cluster chain"));
        }
        self.read_chain(&chain, len)
    }

    pub fn exists(&mut self, path: &str) -> FsResult<bool> {
        match self.lookup(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Names in a directory, in on-disk order
    pub fn list_dir(&mut self, path: &str) -> FsResult<Vec<String>> {
        let components = split_path(path)?;
        let cluster = self.resolve_dir(&components)?;
        Ok(self
            .load_dir(cluster)?
            .entries()
            .into_iter()
            .map(|f| f.name)
            .collect())
    }

    /// Write back the FAT copies and the FSInfo hint, then flush the device
    pub fn flush(&mut self) -> FsResult<()> {
        self.commit()
    }

    pub fn into_inner(self) -> B {
        self.block_io
    }

    fn commit(&mut self) -> FsResult<()> {
        self.ctx.store_fat(&mut self.block_io, &self.fat)?;
        self.ctx
            .write_fsinfo(&mut self.block_io, self.free, self.next_free)?;
        self.block_io
            .flush()
            .map_err(|e| FsError::Device(format!("{e:?}")))
    }

    fn lookup(&mut self, path: &str) -> FsResult<Found> {
        let components = split_path(path)?;
        let (name, parents) = components
            .split_last()
            .ok_or_else(|| FsError::InvalidName(path.to_string()))?;
        let cluster = self.resolve_dir(parents)?;
        self.load_dir(cluster)?
            .find(name)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    /// First cluster of an existing directory
    fn resolve_dir(&mut self, components: &[&str]) -> FsResult<u32> {
        let mut cluster = self.ctx.root_cluster;
        for (depth, name) in components.iter().enumerate() {
            let found = self
                .load_dir(cluster)?
                .find(name)
                .ok_or_else(|| FsError::NotFound(join(&components[..=depth])))?;
            if !found.entry.is_directory() {
                return Err(FsError::NotADirectory(join(&components[..=depth])));
            }
            cluster = found.entry.first_cluster();
            if cluster == 0 {
                cluster = self.ctx.root_cluster;
            }
        }
        Ok(cluster)
    }

    fn load_dir(&mut self, first_cluster: u32) -> FsResult<Directory> {
        let chain = self.chain(first_cluster)?;
        let len = chain.len() * self.ctx.cluster_bytes();
        let data = self.read_chain(&chain, len)?;
        Ok(Directory { chain, data })
    }

    fn store_dir(&mut self, dir: &Directory) -> FsResult<()> {
        self.write_chain(&dir.chain, &dir.data)
    }

    /// New directory cluster with `.` and `..`, linked into `parent`
    fn make_dir(&mut self, parent: &mut Directory, parent_cluster: u32, name: &str) -> FsResult<u32> {
        validate_long_name(name)?;
        let cluster = self.allocate(1)?[0];

        // `..` of a top level directory points at cluster 0
        let dotdot = if parent_cluster == self.ctx.root_cluster {
            0
        } else {
            parent_cluster
        };
        let mut data = vec![0u8; self.ctx.cluster_bytes()];
        data[..DIR_ENTRY_SIZE]
            .copy_from_slice(&DirEntry::new(*b".          ", ATTR_DIRECTORY, cluster, 0).encode());
        data[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE]
            .copy_from_slice(&DirEntry::new(*b"..         ", ATTR_DIRECTORY, dotdot, 0).encode());
        self.write_chain(&[cluster], &data)?;

        self.add_entry(parent, name, ATTR_DIRECTORY, cluster, 0)?;
        debug!("fat32: created directory {} at cluster {}", name, cluster);
        Ok(cluster)
    }

    /// Insert long name and short entries, growing the directory if needed
    fn add_entry(
        &mut self,
        dir: &mut Directory,
        name: &str,
        attr: u8,
        first_cluster: u32,
        size: u32,
    ) -> FsResult<()> {
        validate_long_name(name)?;
        let short = generate_short_name(name, |s| dir.short_name_taken(s));
        let mut raws = if needs_long_name(name) {
            lfn_entries(name, &short)
        } else {
            Vec::new()
        };
        raws.push(DirEntry::new(short, attr, first_cluster, size).encode());

        let slot = loop {
            if let Some(slot) = dir.free_run(raws.len()) {
                break slot;
            }
            if dir.data.len() + self.ctx.cluster_bytes() > MAX_DIRECTORY_BYTES {
                return Err(FsError::NoSpace {
                    needed: (dir.data.len() + self.ctx.cluster_bytes()) as u64,
                    available: MAX_DIRECTORY_BYTES as u64,
                });
            }
            self.extend_chain(&mut dir.chain)?;
            dir.data.resize(dir.data.len() + self.ctx.cluster_bytes(), 0);
        };
        for (i, raw) in raws.iter().enumerate() {
            dir.put(slot + i, raw);
        }
        self.store_dir(dir)
    }
}

fn split_path(path: &str) -> FsResult<Vec<&str>> {
    let components: Vec<&str> = path.split(['/', '\\']).filter(|c| !c.is_empty()).collect();
    for component in &components {
        validate_long_name(component)?;
    }
    Ok(components)
}

fn join(components: &[&str]) -> String {
    format!("/{}", components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block_io::MemoryDisk;

    fn volume(sectors: usize) -> Fat32Volume<MemoryDisk> {
        Fat32Volume::format(MemoryDisk::new(sectors, 512), 0, "IMMU").unwrap()
    }

    #[test]
    fn test_write_and_read_back() {
        let mut vol = volume(4096);
        vol.create_dir_all("/EFI/boot").unwrap();
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
        vol.write_file("/EFI/boot/linuxboot.efi", &data).unwrap();

        assert_eq!(vol.read_file("/EFI/boot/linuxboot.efi").unwrap(), data);
        assert_eq!(vol.read_file("/efi/BOOT/LINUXBOOT.EFI").unwrap(), data);
        assert_eq!(vol.list_dir("/EFI/boot").unwrap(), vec!["linuxboot.efi"]);
        assert_eq!(vol.list_dir("/").unwrap(), vec!["EFI"]);
    }

    #[test]
    fn test_state_survives_remount() {
        let mut vol = volume(4096);
        vol.create_dir_all("/EFI/boot").unwrap();
        vol.write_file("/EFI/boot/bootx64.efi", b"shim").unwrap();
        let free = vol.free_bytes();

        let mut vol = Fat32Volume::open(vol.into_inner()).unwrap();
        assert_eq!(vol.read_file("/EFI/boot/bootx64.efi").unwrap(), b"shim");
        assert_eq!(vol.free_bytes(), free);
    }

    #[test]
    fn test_overwrite_releases_old_chain() {
        let mut vol = volume(4096);
        let free = vol.free_bytes();
        vol.write_file("/big.bin", &vec![1u8; 10 * 512]).unwrap();
        assert_eq!(vol.free_bytes(), free - 10 * 512);

        vol.write_file("/big.bin", &[2u8; 100]).unwrap();
        assert_eq!(vol.free_bytes(), free - 512);
        assert_eq!(vol.read_file("/big.bin").unwrap(), vec![2u8; 100]);
        assert_eq!(vol.list_dir("/").unwrap().len(), 1);
    }

    #[test]
    fn test_create_file_truncates() {
        let mut vol = volume(2048);
        vol.write_file("/a.txt", b"hello").unwrap();
        vol.create_file("/a.txt").unwrap();
        assert!(vol.read_file("/a.txt").unwrap().is_empty());
    }

    #[test]
    fn test_parent_must_exist() {
        let mut vol = volume(2048);
        assert!(matches!(
            vol.write_file("/EFI/boot/bootx64.efi", b"x"),
            Err(FsError::NotFound(_))
        ));
        assert!(!vol.exists("/EFI").unwrap());
    }

    #[test]
    fn test_file_blocks_directory() {
        let mut vol = volume(2048);
        vol.write_file("/EFI", b"x").unwrap();
        assert!(matches!(
            vol.create_dir_all("/EFI/boot"),
            Err(FsError::NotADirectory(_))
        ));
        vol.create_dir_all("/vfat").unwrap();
        assert!(matches!(
            vol.write_file("/vfat", b"x"),
            Err(FsError::IsADirectory(_))
        ));
    }

    #[test]
    fn test_directory_grows_past_one_cluster() {
        // 512-byte clusters hold 16 entries; long names take two slots each
        let mut vol = volume(2048);
        vol.create_dir_all("/many").unwrap();
        for i in 0..40 {
            vol.write_file(&format!("/many/file-{i:02}.bin"), &[i as u8]).unwrap();
        }
        let names = vol.list_dir("/many").unwrap();
        assert_eq!(names.len(), 40);
        for i in 0..40 {
            assert_eq!(
                vol.read_file(&format!("/many/file-{i:02}.bin")).unwrap(),
                vec![i as u8]
            );
        }
    }

    #[test]
    fn test_no_space_is_reported() {
        let mut vol = volume(2048);
        let too_big = vec![0u8; vol.free_bytes() as usize + 1];
        assert!(matches!(
            vol.write_file("/big.bin", &too_big),
            Err(FsError::NoSpace { .. })
        ));
        assert!(!vol.exists("/big.bin").unwrap());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut vol = volume(2048);
        assert!(matches!(
            vol.create_dir_all("/a:b"),
            Err(FsError::InvalidName(_))
        ));
        assert!(vol.write_file("/", b"x").is_err());
    }
}
