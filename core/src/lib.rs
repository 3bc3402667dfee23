//! Isogen Core Library
//!
//! Builds bootable EFI disk images from a set of boot loader binaries.
//!
//! Two layouts are produced:
//! - **hybrid**: one disk with a GPT, an ISO9660 partition carrying an
//!   El Torito catalog and a FAT32 EFI System Partition, both holding the
//!   same boot files ([`pipeline::build_hybrid`])
//! - **wrapped**: a bare FAT32 ESP image embedded as a file in an
//!   ISO9660-only disk that boots it ([`pipeline::build_wrapped`])
//!
//! Format constants come from an [`ImageConfig`]; every failure is an
//! [`Error`] carrying the operation and paths involved.

#![allow(clippy::new_without_default)]

pub mod boot;
pub mod config;
pub mod disk;
pub mod error;
pub mod fs;
pub mod input;
pub mod install;
pub mod layout;
pub mod pipeline;
pub mod util;

pub use boot::{finalize, BootCatalogEntry};
pub use config::{ImageConfig, Rounding, SecondaryLoader, SizingPolicy};
pub use disk::{DiskBuilder, DiskImageHandle};
pub use error::{Error, InstallStep, Result};
pub use fs::{FilesystemHandle, FilesystemKind, FsError};
pub use input::{BootFile, BootImageSpec};
pub use install::{install_file, FileInstaller};
pub use layout::{PartitionDescriptor, PartitionLayout, SizeCalculator, TableKind};
pub use pipeline::{build_esp, build_hybrid, build_wrapped, wrap_esp};
