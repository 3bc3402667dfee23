//! Error taxonomy of an image build

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::fs::{FilesystemKind, FsError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Step of a file installation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    MakeParent,
    Create,
    ReadSource,
    Write,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstallStep::MakeParent => "make the parent directory of",
            InstallStep::Create => "make",
            InstallStep::ReadSource => "read the source of",
            InstallStep::Write => "write",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to stat {what} {}", path.display())]
    Stat {
        what: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("boot files total {combined} bytes, which aligns to an empty partition")]
    DegenerateSize { combined: u64 },

    #[error("failed to create disk file {}", path.display())]
    DiskCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create partition table: {reason}")]
    PartitionTable { reason: String },

    #[error("failed to create {kind} filesystem on partition {index}")]
    FilesystemCreate {
        kind: FilesystemKind,
        index: usize,
        #[source]
        source: FsError,
    },

    #[error("{kind} filesystem on partition {index} needs {needed} bytes, partition holds {available}")]
    CapacityExceeded {
        kind: FilesystemKind,
        index: usize,
        needed: u64,
        available: u64,
    },

    #[error("failed to {step} {destination} on the {kind} image (from {})", source_path.display())]
    Install {
        source_path: PathBuf,
        destination: String,
        kind: FilesystemKind,
        step: InstallStep,
        #[source]
        source: FsError,
    },

    #[error("cannot finalize a {kind} filesystem, only iso9660 carries a boot catalog")]
    CapabilityMismatch { kind: FilesystemKind },

    #[error("failed to finalize boot catalog {catalog} for {boot_file}")]
    Finalize {
        catalog: String,
        boot_file: String,
        #[source]
        source: FsError,
    },

    #[error("{pipeline} build aborted after {completed}")]
    Aborted {
        pipeline: &'static str,
        completed: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The error underneath any pipeline wrapping
    pub fn root(&self) -> &Error {
        match self {
            Error::Aborted { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_unwraps_nested_aborts() {
        let inner = Error::DegenerateSize { combined: 12 };
        let err = Error::Aborted {
            pipeline: "wrapped",
            completed: "stage 1".into(),
            source: Box::new(Error::Aborted {
                pipeline: "hybrid",
                completed: "SizeComputed".into(),
                source: Box::new(inner),
            }),
        };
        assert!(matches!(err.root(), Error::DegenerateSize { combined: 12 }));
    }

    #[test]
    fn install_message_names_file_and_destination() {
        let err = Error::Install {
            source_path: "/tmp/shim.efi".into(),
            destination: "/EFI/boot/bootx64.efi".into(),
            kind: FilesystemKind::Fat32,
            step: InstallStep::Write,
            source: FsError::Sealed,
        };
        let message = err.to_string();
        assert!(message.contains("/EFI/boot/bootx64.efi"));
        assert!(message.contains("/tmp/shim.efi"));
        assert!(message.contains("fat32"));
    }
}
