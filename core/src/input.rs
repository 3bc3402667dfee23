//! Boot files and the inputs of one build

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ImageConfig;

/// The boot loader binaries an image carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootFile {
    /// First stage loader, booted by firmware
    Shim,
    /// Secondary EFI loader
    Mmx,
    /// Kernel/loader payload
    Linuxboot,
}

impl BootFile {
    /// Installation order
    pub const ALL: [BootFile; 3] = [BootFile::Shim, BootFile::Mmx, BootFile::Linuxboot];

    pub fn name(self) -> &'static str {
        match self {
            BootFile::Shim => "shim",
            BootFile::Mmx => "mmx",
            BootFile::Linuxboot => "linuxboot",
        }
    }

    /// Canonical path inside the image
    pub fn destination(self, config: &ImageConfig) -> &str {
        match self {
            BootFile::Shim => &config.shim_destination,
            BootFile::Mmx => &config.mmx_destination,
            BootFile::Linuxboot => &config.linuxboot_destination,
        }
    }
}

impl fmt::Display for BootFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs of one build; absent files are skipped everywhere
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BootImageSpec {
    pub linuxboot: Option<PathBuf>,
    pub shim: Option<PathBuf>,
    pub mmx: Option<PathBuf>,
    pub out: PathBuf,
}

impl BootImageSpec {
    pub fn new(out: impl Into<PathBuf>) -> Self {
        Self {
            out: out.into(),
            ..Self::default()
        }
    }

    /// Build from raw strings, treating empty ones as absent
    pub fn from_args(linuxboot: &str, shim: &str, mmx: &str, out: &str) -> Self {
        let present = |s: &str| (!s.is_empty()).then(|| PathBuf::from(s));
        Self {
            linuxboot: present(linuxboot),
            shim: present(shim),
            mmx: present(mmx),
            out: PathBuf::from(out),
        }
    }

    pub fn with_file(mut self, file: BootFile, path: impl Into<PathBuf>) -> Self {
        let path = Some(path.into());
        match file {
            BootFile::Shim => self.shim = path,
            BootFile::Mmx => self.mmx = path,
            BootFile::Linuxboot => self.linuxboot = path,
        }
        self
    }

    pub fn source(&self, file: BootFile) -> Option<&Path> {
        match file {
            BootFile::Shim => self.shim.as_deref(),
            BootFile::Mmx => self.mmx.as_deref(),
            BootFile::Linuxboot => self.linuxboot.as_deref(),
        }
    }

    /// Present files in installation order
    pub fn present(&self) -> impl Iterator<Item = (BootFile, &Path)> + '_ {
        BootFile::ALL
            .into_iter()
            .filter_map(|file| self.source(file).map(|path| (file, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_are_absent() {
        let spec = BootImageSpec::from_args("", "shim.efi", "", "out.img");
        assert_eq!(spec.linuxboot, None);
        assert_eq!(spec.mmx, None);
        assert_eq!(spec.shim.as_deref(), Some(Path::new("shim.efi")));

        let present: Vec<BootFile> = spec.present().map(|(f, _)| f).collect();
        assert_eq!(present, [BootFile::Shim]);
    }

    #[test]
    fn installation_order() {
        let spec = BootImageSpec::new("out.img")
            .with_file(BootFile::Linuxboot, "l")
            .with_file(BootFile::Mmx, "m")
            .with_file(BootFile::Shim, "s");
        let order: Vec<BootFile> = spec.present().map(|(f, _)| f).collect();
        assert_eq!(order, BootFile::ALL);
    }

    #[test]
    fn canonical_destinations() {
        let config = ImageConfig::default();
        assert_eq!(BootFile::Shim.destination(&config), "/EFI/boot/bootx64.efi");
        assert_eq!(BootFile::Mmx.destination(&config), "/EFI/boot/mmx64.efi");
        assert_eq!(
            BootFile::Linuxboot.destination(&config),
            "/EFI/boot/linuxboot.efi"
        );
    }
}
