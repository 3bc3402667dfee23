//! Filesystem level errors

use std::io;

use iso9660::Iso9660Error;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("block device I/O failed")]
    Io(#[from] io::Error),

    #[error("block device: {0}")]
    Device(String),

    #[error("iso9660: {0}")]
    Iso9660(Iso9660Error),

    #[error("volume is too small for the filesystem structures")]
    TooSmall,

    #[error("volume is too large for FAT32")]
    TooLarge,

    #[error("corrupt filesystem: {0}")]
    Corrupt(&'static str),

    #[error("no space left: {needed} bytes needed, {available} available")]
    NoSpace { needed: u64, available: u64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("{0} is a directory")]
    IsADirectory(String),

    #[error("invalid file name {0:?}")]
    InvalidName(String),

    #[error("filesystem is sealed")]
    Sealed,

    #[error("file of {0} bytes exceeds the filesystem limit")]
    FileTooLarge(u64),

    #[error("verification failed: {0}")]
    Verify(String),
}

impl From<Iso9660Error> for FsError {
    fn from(err: Iso9660Error) -> Self {
        match err {
            Iso9660Error::Sealed => FsError::Sealed,
            other => FsError::Iso9660(other),
        }
    }
}

pub type FsResult<T> = std::result::Result<T, FsError>;
