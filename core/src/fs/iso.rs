//! ISO9660 filesystem on a partition

use gpt_disk_io::BlockIo;
use iso9660::{FinalizeOptions, IsoWriter};
use log::debug;

use super::{FsError, FsResult};

/// An ISO9660 volume collected in memory and written on finalize
pub struct IsoFilesystem<B: BlockIo> {
    writer: IsoWriter,
    block_io: B,
}

impl<B: BlockIo> IsoFilesystem<B> {
    /// The block device must use 2048-byte blocks
    pub fn new(block_io: B) -> FsResult<Self> {
        if block_io.block_size().to_u64() != iso9660::types::SECTOR_SIZE as u64 {
            return Err(FsError::Iso9660(iso9660::Iso9660Error::InvalidBlockSize));
        }
        Ok(Self {
            writer: IsoWriter::new(),
            block_io,
        })
    }

    pub fn is_sealed(&self) -> bool {
        self.writer.is_sealed()
    }

    pub fn create_dir_all(&mut self, path: &str) -> FsResult<()> {
        Ok(self.writer.create_dir_all(path)?)
    }

    pub fn create_file(&mut self, path: &str) -> FsResult<()> {
        Ok(self.writer.write_file(path, Vec::new())?)
    }

    pub fn write_file(&mut self, path: &str, data: Vec<u8>) -> FsResult<()> {
        let len = data.len() as u64;
        self.writer.write_file(path, data).map_err(|err| match err {
            iso9660::Iso9660Error::FileTooLarge => FsError::FileTooLarge(len),
            other => other.into(),
        })?;
        debug!("iso9660: staged {} ({} bytes)", path, len);
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.writer.contains(path)
    }

    /// Bytes the device can hold
    pub fn capacity(&mut self) -> FsResult<u64> {
        let blocks = self
            .block_io
            .num_blocks()
            .map_err(|e| FsError::Device(format!("{e:?}")))?;
        Ok(blocks * self.block_io.block_size().to_u64())
    }

    /// Write the volume out and seal it
    pub fn finalize(&mut self, options: &FinalizeOptions) -> FsResult<()> {
        if self.writer.is_sealed() {
            return Err(FsError::Sealed);
        }
        let needed = self.writer.total_sectors(options)? * iso9660::types::SECTOR_SIZE as u64;
        let available = self.capacity()?;
        if needed > available {
            return Err(FsError::NoSpace { needed, available });
        }
        debug!("iso9660: writing {} of {} bytes", needed, available);
        Ok(self.writer.finalize(&mut self.block_io, options)?)
    }

    /// Device access for reading the written volume back
    pub fn block_io_mut(&mut self) -> &mut B {
        &mut self.block_io
    }

    pub fn into_inner(self) -> B {
        self.block_io
    }
}
