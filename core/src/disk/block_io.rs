//! `BlockIo` over a byte window of a disk image file

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

/// Block device scoped to `[offset, offset + len)` of an image file
///
/// Block numbers are relative to the window, and access past its end fails,
/// so a filesystem cannot spill into a neighbouring partition.
#[derive(Debug)]
pub struct PartitionIo {
    file: File,
    offset: u64,
    len: u64,
    block_size: BlockSize,
}

impl PartitionIo {
    pub fn new(file: File, offset: u64, len: u64, block_size: u32) -> io::Result<Self> {
        let block_size = BlockSize::new(block_size).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid block size")
        })?;
        if offset % block_size.to_u64() != 0 || len % block_size.to_u64() != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("window {offset}+{len} is not aligned to {} byte blocks", block_size.to_u64()),
            ));
        }
        Ok(Self {
            file,
            offset,
            len,
            block_size,
        })
    }

    /// Byte offset of a transfer, checked against the window
    fn position(&self, start_lba: Lba, bytes: usize) -> io::Result<u64> {
        let block = self.block_size.to_u64();
        if bytes as u64 % block != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer is not a whole number of blocks",
            ));
        }
        let start = start_lba
            .0
            .checked_mul(block)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "block number overflow"))?;
        match start.checked_add(bytes as u64) {
            Some(end) if end <= self.len => Ok(self.offset + start),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "blocks {}+{} exceed the {} byte partition",
                    start_lba.0,
                    bytes as u64 / block,
                    self.len
                ),
            )),
        }
    }
}

impl BlockIo for PartitionIo {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        self.block_size
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.len / self.block_size.to_u64())
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let pos = self.position(start_lba, dst.len())?;
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.read_exact(dst)
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let pos = self.position(start_lba, src.len())?;
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(src)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.file.flush()
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryDisk;

#[cfg(test)]
mod memory {
    use super::*;

    /// In-memory block device for unit tests
    #[derive(Debug, Clone)]
    pub(crate) struct MemoryDisk {
        pub data: Vec<u8>,
        pub block_size: usize,
    }

    impl MemoryDisk {
        pub fn new(blocks: usize, block_size: usize) -> Self {
            Self {
                data: vec![0u8; blocks * block_size],
                block_size,
            }
        }

        pub fn sector(&self, lba: usize) -> &[u8] {
            &self.data[lba * self.block_size..(lba + 1) * self.block_size]
        }
    }

    impl BlockIo for MemoryDisk {
        type Error = io::Error;

        fn block_size(&self) -> BlockSize {
            BlockSize::new(self.block_size as u32).expect("valid block size")
        }

        fn num_blocks(&mut self) -> Result<u64, Self::Error> {
            Ok((self.data.len() / self.block_size) as u64)
        }

        fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
            let offset = start_lba.0 as usize * self.block_size;
            let src = self
                .data
                .get(offset..offset + dst.len())
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "read past end"))?;
            dst.copy_from_slice(src);
            Ok(())
        }

        fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
            let offset = start_lba.0 as usize * self.block_size;
            let dst = self
                .data
                .get_mut(offset..offset + src.len())
                .ok_or_else(|| io::Error::new(io::ErrorKind::WriteZero, "write past end"))?;
            dst.copy_from_slice(src);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(len: u64) -> File {
        let file = tempfile::tempfile().unwrap();
        file.set_len(len).unwrap();
        file
    }

    #[test]
    fn test_window_is_relative() {
        let file = image(8192);
        let mut io = PartitionIo::new(file.try_clone().unwrap(), 4096, 4096, 2048).unwrap();
        assert_eq!(io.num_blocks().unwrap(), 2);
        io.write_blocks(Lba(1), &[0xAB; 2048]).unwrap();

        let mut raw = file;
        let mut buf = vec![0u8; 8192];
        raw.seek(SeekFrom::Start(0)).unwrap();
        raw.read_exact(&mut buf).unwrap();
        assert!(buf[..6144].iter().all(|b| *b == 0));
        assert!(buf[6144..].iter().all(|b| *b == 0xAB));
    }

    #[test]
    fn test_access_past_window_fails() {
        let mut io = PartitionIo::new(image(8192), 0, 4096, 512).unwrap();
        assert!(io.write_blocks(Lba(7), &[0u8; 512]).is_ok());
        assert!(io.write_blocks(Lba(8), &[0u8; 512]).is_err());
        assert!(io.write_blocks(Lba(7), &[0u8; 1024]).is_err());
        let mut short = [0u8; 100];
        assert!(io.read_blocks(Lba(0), &mut short).is_err());
    }

    #[test]
    fn test_misaligned_window_rejected() {
        assert!(PartitionIo::new(image(8192), 512, 4096, 2048).is_err());
        assert!(PartitionIo::new(image(8192), 0, 4096, 1000).is_err());
    }
}
