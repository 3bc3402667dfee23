//! Error types for ISO9660 operations

use core::fmt;

/// Result type for ISO9660 operations
pub type Result<T> = core::result::Result<T, Iso9660Error>;

/// Errors that can occur during ISO9660 operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iso9660Error {
    /// I/O error on the block device
    IoError,

    /// Block device does not use 2048-byte blocks
    InvalidBlockSize,

    /// Invalid volume descriptor signature
    InvalidSignature,

    /// Unsupported ISO9660 version
    UnsupportedVersion,

    /// Corrupted directory record
    InvalidDirectoryRecord,

    /// File or directory not found
    NotFound,

    /// Path component is not a directory
    NotADirectory,

    /// Expected a file but found a directory
    IsADirectory,

    /// Caller-supplied buffer is smaller than the file
    BufferTooSmall,

    /// A file and a directory map to the same identifier
    NameConflict,

    /// Path is too long or too deep
    PathTooLong,

    /// Invalid path format
    InvalidPath,

    /// File is larger than a single extent can describe
    FileTooLarge,

    /// Volume does not fit on the block device
    VolumeFull,

    /// Boot record not found
    NoBootRecord,

    /// No boot catalog found
    NoBootCatalog,

    /// Invalid boot catalog
    InvalidBootCatalog,

    /// Invalid boot entry
    InvalidBootEntry,

    /// Validation entry checksum failed
    ChecksumFailed,

    /// El Torito boot file is missing from the tree
    BootFileNotFound,

    /// Volume was already finalized and accepts no more changes
    Sealed,

    /// Internal error (should not occur)
    InternalError,
}

impl fmt::Display for Iso9660Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError => write!(f, "I/O error on block device"),
            Self::InvalidBlockSize => write!(f, "Block device is not 2048-byte addressed"),
            Self::InvalidSignature => write!(f, "Invalid volume descriptor signature"),
            Self::UnsupportedVersion => write!(f, "Unsupported ISO9660 version"),
            Self::InvalidDirectoryRecord => write!(f, "Corrupted directory record"),
            Self::NotFound => write!(f, "File or directory not found"),
            Self::NotADirectory => write!(f, "Path component is not a directory"),
            Self::IsADirectory => write!(f, "Path refers to a directory"),
            Self::BufferTooSmall => write!(f, "Buffer too small for file"),
            Self::NameConflict => write!(f, "File and directory share an identifier"),
            Self::PathTooLong => write!(f, "Path exceeds maximum length or depth"),
            Self::InvalidPath => write!(f, "Invalid path format"),
            Self::FileTooLarge => write!(f, "File exceeds the 4 GiB extent limit"),
            Self::VolumeFull => write!(f, "Volume does not fit on the block device"),
            Self::NoBootRecord => write!(f, "Boot record volume descriptor not found"),
            Self::NoBootCatalog => write!(f, "No boot catalog found"),
            Self::InvalidBootCatalog => write!(f, "Invalid El Torito boot catalog"),
            Self::InvalidBootEntry => write!(f, "Invalid boot entry"),
            Self::ChecksumFailed => write!(f, "Validation entry checksum failed"),
            Self::BootFileNotFound => write!(f, "Boot file not present in volume"),
            Self::Sealed => write!(f, "Volume already finalized"),
            Self::InternalError => write!(f, "Internal error"),
        }
    }
}
