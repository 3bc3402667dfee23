//! Build a hybrid GPT image with an ISO9660 and a FAT32 EFI partition

use anyhow::Context;
use isogen_cli::{exit_with, init_logging, Args};

fn main() {
    let args = Args::parse_or_exit(3);
    init_logging();

    let result = isogen_core::build_hybrid(&args.spec(), &args.config())
        .context("failed to make efi bootloader iso");
    if let Err(err) = result {
        exit_with(err);
    }
}
