//! Fixture builder producing finalized volumes on a memory device

use super::MemoryBlockDevice;
use iso9660::{ElTorito, FinalizeOptions, IsoWriter};

/// Builds a volume through [`IsoWriter`] and returns the device it landed on
pub struct IsoBuilder {
    writer: IsoWriter,
    options: FinalizeOptions,
    sectors: usize,
}

#[allow(dead_code)]
impl IsoBuilder {
    pub fn new() -> Self {
        Self {
            writer: IsoWriter::new(),
            options: FinalizeOptions::new("immu").with_volume_set_id("IMMU"),
            sectors: 512,
        }
    }

    /// Add a directory (and parents)
    pub fn add_dir(&mut self, path: &str) -> &mut Self {
        self.writer.create_dir_all(path).expect("create dir");
        self
    }

    /// Add a file, creating its parent directories
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> &mut Self {
        if let Some((parent, _)) = path.trim_start_matches('/').rsplit_once('/') {
            self.writer.create_dir_all(parent).expect("create parent");
        }
        self.writer
            .write_file(path, content.to_vec())
            .expect("write file");
        self
    }

    /// Boot `boot_file` through a catalog at `catalog_path`
    pub fn bootable(&mut self, catalog_path: &str, boot_file: &str) -> &mut Self {
        self.options.el_torito = Some(ElTorito::efi(catalog_path, boot_file));
        self
    }

    /// Device size in 2048-byte sectors
    pub fn sectors(&mut self, sectors: usize) -> &mut Self {
        self.sectors = sectors;
        self
    }

    pub fn build(&mut self) -> MemoryBlockDevice {
        let mut device = MemoryBlockDevice::new(self.sectors);
        self.writer
            .finalize(&mut device, &self.options)
            .expect("finalize");
        device
    }
}
