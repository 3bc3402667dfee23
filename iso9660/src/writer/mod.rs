//! ISO9660 image writer
//!
//! Files and directories are collected in memory and written out in a single
//! pass by [`IsoWriter::finalize`]. After finalizing, the writer is sealed
//! and rejects further changes.
//!
//! Sector layout of a finalized volume:
//!
//! | Sectors       | Content                                   |
//! |---------------|-------------------------------------------|
//! | 0-15          | System area (zero)                        |
//! | 16            | Primary Volume Descriptor                 |
//! | 17            | Boot Record (only with El Torito)         |
//! | next          | Volume Descriptor Set Terminator          |
//! | next          | Type L path table, then type M path table |
//! | next          | Directory extents, breadth first          |
//! | next          | File extents (boot catalog included)      |

mod layout;

use crate::boot::catalog::BootCatalog;
use crate::boot::entry::BootEntry;
use crate::boot::validation::ValidationEntry;
use crate::error::{Iso9660Error, Result};
use crate::types::{BootMediaType, BootPlatform, MAX_DIRECTORY_DEPTH, MAX_PATH_LENGTH};
use crate::utils::string;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;

/// El Torito boot settings applied when finalizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElTorito {
    /// Where the boot catalog file is placed
    pub catalog_path: String,

    /// File the default entry boots
    pub boot_file: String,

    /// Platform ID of the validation entry
    pub platform: BootPlatform,

    /// Emulation mode of the default entry
    pub media_type: BootMediaType,
}

impl ElTorito {
    /// No-emulation EFI boot of `boot_file`
    pub fn efi(catalog_path: &str, boot_file: &str) -> Self {
        Self {
            catalog_path: String::from(catalog_path),
            boot_file: String::from(boot_file),
            platform: BootPlatform::Efi,
            media_type: BootMediaType::NoEmulation,
        }
    }
}

/// Volume level settings applied when finalizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// Primary volume identifier
    pub volume_id: String,

    /// Volume set identifier
    pub volume_set_id: String,

    /// Boot catalog, if the volume is bootable
    pub el_torito: Option<ElTorito>,
}

impl FinalizeOptions {
    /// Options with the given volume identifier and nothing else
    pub fn new(volume_id: &str) -> Self {
        Self {
            volume_id: String::from(volume_id),
            volume_set_id: String::new(),
            el_torito: None,
        }
    }

    /// Set the volume set identifier
    pub fn with_volume_set_id(mut self, volume_set_id: &str) -> Self {
        self.volume_set_id = String::from(volume_set_id);
        self
    }

    /// Make the volume bootable
    pub fn with_el_torito(mut self, el_torito: ElTorito) -> Self {
        self.el_torito = Some(el_torito);
        self
    }
}

/// Contents of a file node
#[derive(Debug, Clone)]
pub(crate) enum Content {
    Data(Vec<u8>),
    BootCatalog,
}

impl Content {
    fn len(&self) -> u64 {
        match self {
            Content::Data(bytes) => bytes.len() as u64,
            Content::BootCatalog => crate::types::SECTOR_SIZE as u64,
        }
    }
}

/// Directory tree node, keyed by on-disk identifier
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Dir(BTreeMap<String, Node>),
    File(Content),
}

/// In-memory ISO9660 volume under construction
#[derive(Debug, Clone)]
pub struct IsoWriter {
    root: BTreeMap<String, Node>,
    sealed: bool,
}

impl Default for IsoWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl IsoWriter {
    /// Empty volume with only a root directory
    pub fn new() -> Self {
        Self {
            root: BTreeMap::new(),
            sealed: false,
        }
    }

    /// Whether [`finalize`](Self::finalize) has completed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Create a directory and any missing parents
    pub fn create_dir_all(&mut self, path: &str) -> Result<()> {
        self.ensure_writable()?;
        let components = split_path(path)?;
        self.dir_mut(&components)?;
        Ok(())
    }

    /// Create or replace a file; parent directories must exist
    pub fn write_file(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        self.ensure_writable()?;
        if data.len() as u64 > u32::MAX as u64 {
            return Err(Iso9660Error::FileTooLarge);
        }
        self.insert_file(path, Content::Data(data), false)
    }

    /// Whether a file or directory exists at `path`
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Size of the file at `path`, if it is a file
    pub fn file_len(&self, path: &str) -> Option<u64> {
        match self.lookup(path)? {
            Node::File(content) => Some(content.len()),
            Node::Dir(_) => None,
        }
    }

    /// Number of 2048-byte sectors the finalized volume occupies
    pub fn total_sectors(&self, options: &FinalizeOptions) -> Result<u64> {
        let mut staged = self.clone();
        staged.stage_catalog(options)?;
        Ok(layout::plan(&staged.root, options.el_torito.is_some())?.total_sectors as u64)
    }

    /// Lay out the volume and write it to `block_io`
    ///
    /// With El Torito options, the catalog file is added to the tree and the
    /// default entry points at the boot file, which must already exist.
    /// The volume is sealed on success.
    pub fn finalize<B: BlockIo>(&mut self, block_io: &mut B, options: &FinalizeOptions) -> Result<()> {
        self.ensure_writable()?;

        let boot = self.stage_catalog(options)?;
        let plan = layout::plan(&self.root, boot.is_some())?;

        if block_io.block_size().to_u64() != crate::types::SECTOR_SIZE as u64 {
            return Err(Iso9660Error::InvalidBlockSize);
        }
        if plan.total_sectors as u64 > block_io.num_blocks().map_err(|_| Iso9660Error::IoError)? {
            return Err(Iso9660Error::VolumeFull);
        }

        let catalog = match &boot {
            Some(el_torito) => {
                let components = split_path(&el_torito.boot_file)?;
                let (lba, len) = plan
                    .file_extent(&components)
                    .ok_or(Iso9660Error::BootFileNotFound)?;
                Some(BootCatalog {
                    validation: ValidationEntry::new(el_torito.platform),
                    initial: BootEntry::bootable(el_torito.media_type, lba, len as u64),
                })
            }
            None => None,
        };

        plan.write(block_io, options, catalog.as_ref())?;
        block_io.flush().map_err(|_| Iso9660Error::IoError)?;

        self.sealed = true;
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.sealed {
            Err(Iso9660Error::Sealed)
        } else {
            Ok(())
        }
    }

    /// Check the boot file and place the catalog node
    fn stage_catalog(&mut self, options: &FinalizeOptions) -> Result<Option<ElTorito>> {
        let Some(el_torito) = options.el_torito.clone() else {
            return Ok(None);
        };
        match self.lookup(&el_torito.boot_file) {
            Some(Node::File(Content::Data(_))) => {}
            _ => return Err(Iso9660Error::BootFileNotFound),
        }
        if let Some(parent) = parent_of(&el_torito.catalog_path) {
            self.create_dir_all(parent)?;
        }
        self.insert_file(&el_torito.catalog_path, Content::BootCatalog, true)?;
        Ok(Some(el_torito))
    }

    fn insert_file(&mut self, path: &str, content: Content, replace_any: bool) -> Result<()> {
        let components = split_path(path)?;
        let (name, parents) = components.split_last().ok_or(Iso9660Error::InvalidPath)?;

        let dir = self.existing_dir_mut(parents)?;
        if !replace_any && dir.contains_key(&string::dir_identifier(name)) {
            return Err(Iso9660Error::NameConflict);
        }
        dir.insert(string::file_identifier(name), Node::File(content));
        Ok(())
    }

    fn lookup(&self, path: &str) -> Option<&Node> {
        let components = split_path(path).ok()?;
        let (name, parents) = components.split_last()?;

        let mut dir = &self.root;
        for component in parents {
            match dir.get(&string::dir_identifier(component))? {
                Node::Dir(children) => dir = children,
                Node::File(_) => return None,
            }
        }
        dir.get(&string::file_identifier(name))
            .or_else(|| dir.get(&string::dir_identifier(name)))
    }

    fn existing_dir_mut(&mut self, components: &[&str]) -> Result<&mut BTreeMap<String, Node>> {
        let mut dir = &mut self.root;
        for component in components {
            dir = match dir.get_mut(&string::dir_identifier(component)) {
                Some(Node::Dir(children)) => children,
                Some(Node::File(_)) => return Err(Iso9660Error::NotADirectory),
                None => return Err(Iso9660Error::NotFound),
            };
        }
        Ok(dir)
    }

    fn dir_mut(&mut self, components: &[&str]) -> Result<&mut BTreeMap<String, Node>> {
        let mut dir = &mut self.root;
        for component in components {
            if dir.contains_key(&string::file_identifier(component)) {
                return Err(Iso9660Error::NotADirectory);
            }
            let node = dir
                .entry(string::dir_identifier(component))
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            dir = match node {
                Node::Dir(children) => children,
                Node::File(_) => return Err(Iso9660Error::NotADirectory),
            };
        }
        Ok(dir)
    }
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(Iso9660Error::PathTooLong);
    }
    let components: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|c| !c.is_empty())
        .collect();
    if components.len() > MAX_DIRECTORY_DEPTH {
        return Err(Iso9660Error::PathTooLong);
    }
    if components.iter().any(|c| *c == "." || *c == "..") {
        return Err(Iso9660Error::InvalidPath);
    }
    Ok(components)
}

fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let pos = trimmed.rfind('/')?;
    let parent = &trimmed[..pos];
    (!parent.is_empty()).then_some(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_write_requires_parent() {
        let mut writer = IsoWriter::new();
        assert_eq!(
            writer.write_file("/EFI/boot/bootx64.efi", vec![1]).unwrap_err(),
            Iso9660Error::NotFound
        );
        writer.create_dir_all("/EFI/boot").unwrap();
        writer.write_file("/EFI/boot/bootx64.efi", vec![1]).unwrap();
        assert!(writer.contains("/efi/BOOT/BOOTX64.EFI"));
        assert_eq!(writer.file_len("/EFI/boot/bootx64.efi"), Some(1));
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let mut writer = IsoWriter::new();
        writer.write_file("/a.bin", vec![1, 2, 3]).unwrap();
        writer.write_file("/a.bin", vec![9]).unwrap();
        assert_eq!(writer.file_len("/a.bin"), Some(1));
    }

    #[test]
    fn test_file_blocks_directory() {
        let mut writer = IsoWriter::new();
        writer.write_file("/boot", vec![0]).unwrap();
        assert_eq!(
            writer.create_dir_all("/boot/efi").unwrap_err(),
            Iso9660Error::NotADirectory
        );
    }

    #[test]
    fn test_directory_blocks_file() {
        let mut writer = IsoWriter::new();
        writer.create_dir_all("/vfat").unwrap();
        assert_eq!(
            writer.write_file("/vfat", vec![0]).unwrap_err(),
            Iso9660Error::NameConflict
        );
    }

    #[test]
    fn test_rejects_dot_components() {
        let mut writer = IsoWriter::new();
        assert_eq!(
            writer.create_dir_all("/EFI/../boot").unwrap_err(),
            Iso9660Error::InvalidPath
        );
    }

    #[test]
    fn test_total_sectors_empty_volume() {
        let writer = IsoWriter::new();
        // 16 system + PVD + terminator + 2 path tables + root
        assert_eq!(writer.total_sectors(&FinalizeOptions::new("x")).unwrap(), 21);
    }

    #[test]
    fn test_missing_boot_file() {
        let writer = IsoWriter::new();
        let options =
            FinalizeOptions::new("immu").with_el_torito(ElTorito::efi("/BOOT.CAT", "/nope.efi"));
        assert_eq!(
            writer.total_sectors(&options).unwrap_err(),
            Iso9660Error::BootFileNotFound
        );
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/BOOT.CAT"), None);
        assert_eq!(parent_of("/EFI/boot/bootx64.efi"), Some("/EFI/boot"));
    }
}
