//! ISO9660 Image Writer and Reader
//!
//! A `no_std` implementation of the ISO9660 filesystem with El Torito boot
//! catalog support, sized for the small boot volumes built by `isogen`.
//!
//! # Overview
//!
//! - An in-memory directory tree ([`IsoWriter`]) that is laid out and written
//!   to a block device in one pass when the volume is finalized
//! - Volume descriptor encoding and parsing (Primary, Boot Record, Terminator)
//! - Type L and type M path tables
//! - El Torito boot catalog with a single no-emulation entry
//! - A reader used to verify written volumes: mount, path lookup, file
//!   reads and boot catalog parsing
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Volume layer** - Volume descriptors from sector 16 on
//! 2. **Directory layer** - Directory records, path tables and lookup
//! 3. **File layer** - Reads file data from extents
//! 4. **Boot layer** - El Torito catalog encoding and parsing
//! 5. **Writer** - Plans the sector layout and writes everything out
//!
//! All sector addresses are relative to the start of the block device the
//! volume lives on, so a volume can sit inside a GPT partition as long as the
//! block device handed in is scoped to that partition.
//!
//! # Usage
//!
//! ```ignore
//! use iso9660::{FinalizeOptions, IsoWriter, ElTorito};
//!
//! let mut writer = IsoWriter::new();
//! writer.create_dir_all("/EFI/boot")?;
//! writer.write_file("/EFI/boot/bootx64.efi", shim_bytes)?;
//!
//! let options = FinalizeOptions::new("immu")
//!     .with_el_torito(ElTorito::efi("/BOOT.CAT", "/EFI/boot/bootx64.efi"));
//! writer.finalize(&mut block_io, &options)?;
//!
//! // Read it back
//! let volume = iso9660::mount(&mut block_io)?;
//! let boot = iso9660::find_boot_image(&mut block_io, &volume)?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod boot;
pub mod directory;
pub mod error;
pub mod file;
pub mod types;
pub mod utils;
pub mod volume;
pub mod writer;

pub use error::{Iso9660Error, Result};
pub use types::{BootImage, BootMediaType, BootPlatform, FileEntry, FileFlags, VolumeInfo};

// High-level API exports
pub use boot::find_boot_image;
pub use directory::find_file;
pub use file::{read_file, read_file_vec};
pub use volume::mount;
pub use writer::{ElTorito, FinalizeOptions, IsoWriter};
