//! Sector planning and emission for [`IsoWriter`](super::IsoWriter)

use super::{Content, FinalizeOptions, Node};
use crate::boot::catalog::BootCatalog;
use crate::directory::path_table;
use crate::directory::record::{self, PARENT_IDENTIFIER, SELF_IDENTIFIER};
use crate::error::{Iso9660Error, Result};
use crate::types::{FileFlags, SECTOR_SIZE, VOLUME_DESCRIPTOR_START};
use crate::utils::{sector, string};
use crate::volume::{self, boot_record, primary::PrimaryVolumeDescriptor};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

enum Target {
    Dir(usize),
    File(usize),
}

struct PlannedEntry {
    identifier: String,
    target: Target,
}

struct PlannedDir {
    /// Empty for the root
    identifier: String,
    parent: usize,
    entries: Vec<PlannedEntry>,
    lba: u32,
    size: u32,
}

struct PlannedFile<'a> {
    content: &'a Content,
    lba: u32,
    len: u32,
}

/// Sector assignment for every structure of the volume
pub(super) struct Plan<'a> {
    dirs: Vec<PlannedDir>,
    files: Vec<PlannedFile<'a>>,
    boot_record: bool,
    path_table_size: u32,
    type_l_lba: u32,
    type_m_lba: u32,
    pub(super) total_sectors: u32,
}

/// Number the tree breadth first and assign extents
pub(super) fn plan(root: &BTreeMap<String, Node>, boot_record: bool) -> Result<Plan<'_>> {
    let mut dirs = vec![PlannedDir {
        identifier: String::new(),
        parent: 0,
        entries: Vec::new(),
        lba: 0,
        size: 0,
    }];
    let mut files = Vec::new();

    let mut queue = VecDeque::from([(0usize, root)]);
    while let Some((index, children)) = queue.pop_front() {
        for (identifier, node) in children {
            let target = match node {
                Node::Dir(grandchildren) => {
                    let child = dirs.len();
                    dirs.push(PlannedDir {
                        identifier: identifier.clone(),
                        parent: index,
                        entries: Vec::new(),
                        lba: 0,
                        size: 0,
                    });
                    queue.push_back((child, grandchildren));
                    Target::Dir(child)
                }
                Node::File(content) => {
                    files.push(PlannedFile {
                        content,
                        lba: 0,
                        len: u32::try_from(content.len()).map_err(|_| Iso9660Error::FileTooLarge)?,
                    });
                    Target::File(files.len() - 1)
                }
            };
            dirs[index].entries.push(PlannedEntry {
                identifier: identifier.clone(),
                target,
            });
        }
    }

    if dirs.len() > u16::MAX as usize {
        return Err(Iso9660Error::PathTooLong);
    }

    let path_table_size: usize = dirs
        .iter()
        .map(|d| path_table::entry_length(d.identifier.len().max(1)))
        .sum();
    let path_table_sectors = sector::sectors_for_bytes(path_table_size as u64) as u32;

    // PVD, optional boot record, terminator
    let descriptors = if boot_record { 3 } else { 2 };
    let mut next = VOLUME_DESCRIPTOR_START as u32 + descriptors;

    let type_l_lba = next;
    next += path_table_sectors;
    let type_m_lba = next;
    next += path_table_sectors;

    for dir in dirs.iter_mut() {
        dir.size = directory_extent_size(&dir.entries);
        dir.lba = next;
        next = next
            .checked_add(dir.size / SECTOR_SIZE as u32)
            .ok_or(Iso9660Error::VolumeFull)?;
    }

    for file in files.iter_mut() {
        if file.len == 0 {
            continue;
        }
        file.lba = next;
        next = next
            .checked_add(sector::sectors_for_bytes(file.len as u64) as u32)
            .ok_or(Iso9660Error::VolumeFull)?;
    }

    Ok(Plan {
        dirs,
        files,
        boot_record,
        path_table_size: path_table_size as u32,
        type_l_lba,
        type_m_lba,
        total_sectors: next,
    })
}

/// Bytes a directory extent needs; records never straddle a sector
fn directory_extent_size(entries: &[PlannedEntry]) -> u32 {
    let special = record::record_length(1);
    let lengths = [special, special]
        .into_iter()
        .chain(entries.iter().map(|e| record::record_length(e.identifier.len())));

    let mut sectors = 1u32;
    let mut used = 0usize;
    for len in lengths {
        if used + len > SECTOR_SIZE {
            sectors += 1;
            used = 0;
        }
        used += len;
    }
    sectors * SECTOR_SIZE as u32
}

impl Plan<'_> {
    /// Extent of the file at the given path components
    pub(super) fn file_extent(&self, components: &[&str]) -> Option<(u32, u32)> {
        let (name, parents) = components.split_last()?;
        let mut dir = &self.dirs[0];
        for component in parents {
            let wanted = string::dir_identifier(component);
            dir = dir.entries.iter().find_map(|e| match e.target {
                Target::Dir(index) if e.identifier == wanted => Some(&self.dirs[index]),
                _ => None,
            })?;
        }
        let wanted = string::file_identifier(name);
        dir.entries.iter().find_map(|e| match e.target {
            Target::File(index) if e.identifier == wanted => {
                Some((self.files[index].lba, self.files[index].len))
            }
            _ => None,
        })
    }

    fn catalog_lba(&self) -> Option<u32> {
        self.files
            .iter()
            .find(|f| matches!(f.content, Content::BootCatalog))
            .map(|f| f.lba)
    }

    fn root_record(&self) -> [u8; 34] {
        let mut out = [0u8; 34];
        let root = &self.dirs[0];
        record::write_record(
            &mut out,
            root.lba,
            root.size,
            FileFlags::DIRECTORY,
            &[SELF_IDENTIFIER],
        );
        out
    }

    fn path_table(&self, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.path_table_size as usize);
        for dir in &self.dirs {
            let identifier: &[u8] = if dir.identifier.is_empty() {
                &[SELF_IDENTIFIER]
            } else {
                dir.identifier.as_bytes()
            };
            path_table::push_entry(
                &mut out,
                identifier,
                dir.lba,
                dir.parent as u16 + 1,
                big_endian,
            );
        }
        out
    }

    fn directory_extent(&self, index: usize) -> Vec<u8> {
        let dir = &self.dirs[index];
        let parent = &self.dirs[dir.parent];
        let mut out = vec![0u8; dir.size as usize];
        let mut offset = 0usize;

        let mut push = |lba: u32, len: u32, flags: u8, identifier: &[u8]| {
            let needed = record::record_length(identifier.len());
            if offset % SECTOR_SIZE + needed > SECTOR_SIZE {
                offset = sector::align_to_sector(offset);
            }
            offset += record::write_record(&mut out[offset..], lba, len, flags, identifier);
        };

        push(dir.lba, dir.size, FileFlags::DIRECTORY, &[SELF_IDENTIFIER]);
        push(parent.lba, parent.size, FileFlags::DIRECTORY, &[PARENT_IDENTIFIER]);

        for entry in &dir.entries {
            match entry.target {
                Target::Dir(child) => {
                    let child = &self.dirs[child];
                    push(child.lba, child.size, FileFlags::DIRECTORY, entry.identifier.as_bytes());
                }
                Target::File(file) => {
                    let file = &self.files[file];
                    push(file.lba, file.len, 0, entry.identifier.as_bytes());
                }
            }
        }
        out
    }

    /// Write every sector of the volume
    pub(super) fn write<B: BlockIo>(
        &self,
        block_io: &mut B,
        options: &FinalizeOptions,
        catalog: Option<&BootCatalog>,
    ) -> Result<()> {
        let mut sink = SectorSink { block_io };

        sink.write(0, &[0u8; SECTOR_SIZE * VOLUME_DESCRIPTOR_START as usize])?;

        let mut pvd = PrimaryVolumeDescriptor::new(&options.volume_id, &options.volume_set_id);
        pvd.volume_space_size = self.total_sectors;
        pvd.path_table_size = self.path_table_size;
        pvd.type_l_path_table = self.type_l_lba;
        pvd.type_m_path_table = self.type_m_lba;
        pvd.root_directory_record = self.root_record();

        let mut next = VOLUME_DESCRIPTOR_START as u32;
        sink.write(next, &pvd.encode())?;
        next += 1;

        if self.boot_record {
            let catalog_lba = self.catalog_lba().ok_or(Iso9660Error::InternalError)?;
            sink.write(next, &boot_record::encode(catalog_lba))?;
            next += 1;
        }
        sink.write(next, &volume::encode_terminator())?;

        sink.write_padded(self.type_l_lba, &self.path_table(false))?;
        sink.write_padded(self.type_m_lba, &self.path_table(true))?;

        for (index, dir) in self.dirs.iter().enumerate() {
            sink.write(dir.lba, &self.directory_extent(index))?;
        }

        for file in &self.files {
            match file.content {
                Content::Data(bytes) if !bytes.is_empty() => sink.write_padded(file.lba, bytes)?,
                Content::Data(_) => {}
                Content::BootCatalog => {
                    let catalog = catalog.ok_or(Iso9660Error::InternalError)?;
                    sink.write(file.lba, &catalog.encode())?;
                }
            }
        }
        Ok(())
    }
}

struct SectorSink<'b, B: BlockIo> {
    block_io: &'b mut B,
}

impl<B: BlockIo> SectorSink<'_, B> {
    /// `data` must be a whole number of sectors
    fn write(&mut self, lba: u32, data: &[u8]) -> Result<()> {
        self.block_io
            .write_blocks(Lba(lba as u64), data)
            .map_err(|_| Iso9660Error::IoError)
    }

    /// Write `data`, zero filling the last sector
    fn write_padded(&mut self, lba: u32, data: &[u8]) -> Result<()> {
        let full = data.len() / SECTOR_SIZE * SECTOR_SIZE;
        if full > 0 {
            self.write(lba, &data[..full])?;
        }
        let tail = &data[full..];
        if !tail.is_empty() {
            let mut last = [0u8; SECTOR_SIZE];
            last[..tail.len()].copy_from_slice(tail);
            self.write(lba + (full / SECTOR_SIZE) as u32, &last)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> PlannedEntry {
        PlannedEntry {
            identifier: String::from(name),
            target: Target::File(0),
        }
    }

    #[test]
    fn test_small_directory_is_one_sector() {
        let entries = [entry("BOOTX64.EFI;1"), entry("MMX64.EFI;1")];
        assert_eq!(directory_extent_size(&entries), 2048);
    }

    #[test]
    fn test_directory_grows_without_splitting_records() {
        // 2 x 34 + 41 x 48 = 2036, the 42nd record starts a new sector
        assert_eq!(record::record_length(14), 48);
        let fits: Vec<PlannedEntry> = (0..41)
            .map(|i| entry(&alloc::format!("FILE{:04}.BIN;1", i)))
            .collect();
        assert_eq!(directory_extent_size(&fits), 2048);

        let spills: Vec<PlannedEntry> = (0..42)
            .map(|i| entry(&alloc::format!("FILE{:04}.BIN;1", i)))
            .collect();
        assert_eq!(directory_extent_size(&spills), 4096);
    }
}
