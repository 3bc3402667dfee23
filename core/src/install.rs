//! Copies boot files into filesystems at their canonical paths

use std::path::Path;

use gpt_disk_io::BlockIo;
use log::{debug, info};

use crate::config::ImageConfig;
use crate::error::{Error, InstallStep, Result};
use crate::fs::{FilesystemHandle, FsError};
use crate::input::BootImageSpec;

pub struct FileInstaller<'a> {
    config: &'a ImageConfig,
}

impl<'a> FileInstaller<'a> {
    pub fn new(config: &'a ImageConfig) -> Self {
        Self { config }
    }

    /// Install every present boot file of `spec`; absent ones are skipped
    pub fn install_boot_files<B: BlockIo>(
        &self,
        fs: &mut FilesystemHandle<B>,
        spec: &BootImageSpec,
    ) -> Result<()> {
        for (file, source) in spec.present() {
            let destination = file.destination(self.config);
            info!("installing {} to {} on the {} image", file, destination, fs.kind());
            install_file(fs, source, destination)?;
        }
        Ok(())
    }
}

/// Copy `source` to `destination`, creating parent directories and
/// replacing any existing file
pub fn install_file<B: BlockIo>(
    fs: &mut FilesystemHandle<B>,
    source: &Path,
    destination: &str,
) -> Result<()> {
    let fail = |fs: &FilesystemHandle<B>, step: InstallStep, err: FsError| match err {
        FsError::NoSpace { needed, available } => Error::CapacityExceeded {
            kind: fs.kind(),
            index: fs.partition_index(),
            needed,
            available,
        },
        err => Error::Install {
            source_path: source.to_path_buf(),
            destination: destination.to_string(),
            kind: fs.kind(),
            step,
            source: err,
        },
    };

    if let Some((parent, _)) = destination.rsplit_once('/') {
        if !parent.is_empty() {
            fs.create_dir_all(parent)
                .map_err(|e| fail(fs, InstallStep::MakeParent, e))?;
        }
    }
    fs.create_file(destination)
        .map_err(|e| fail(fs, InstallStep::Create, e))?;
    let data = std::fs::read(source).map_err(|e| fail(fs, InstallStep::ReadSource, e.into()))?;
    let len = data.len();
    fs.write_file(destination, data)
        .map_err(|e| fail(fs, InstallStep::Write, e))?;
    debug!("{} -> {} ({} bytes)", source.display(), destination, len);
    Ok(())
}
