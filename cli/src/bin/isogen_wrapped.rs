//! Build a FAT32 ESP image and wrap it in a bootable ISO9660 image

use anyhow::{Context, Result};
use isogen_cli::{exit_with, init_logging, Args};
use log::debug;

fn run(args: &Args) -> Result<()> {
    // Removed when dropped, on success and failure alike
    let stage1 = tempfile::Builder::new()
        .prefix("isogen")
        .suffix(".img")
        .tempfile()
        .context("failed to create the intermediate esp image")?;
    debug!("intermediate esp image at {}", stage1.path().display());

    isogen_core::build_wrapped(&args.spec(), stage1.path(), &args.config())
        .context("failed to make efi bootloader iso")?;
    Ok(())
}

fn main() {
    let args = Args::parse_or_exit(4);
    init_logging();

    if let Err(err) = run(&args) {
        exit_with(err);
    }
}
