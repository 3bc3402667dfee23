//! Argument handling shared by the `isogen` binaries

use std::process;

use clap::Parser;
use isogen_core::{BootImageSpec, ImageConfig, Rounding, SecondaryLoader, SizingPolicy};
use log::info;

/// Exit status of every failure
pub const EXIT_FAILURE: i32 = -1;

#[derive(Parser, Debug)]
pub struct Args {
    /// Kernel/loader payload installed as /EFI/boot/linuxboot.efi
    #[arg(long, default_value = "")]
    pub linuxboot: String,
    /// First stage loader installed as /EFI/boot/bootx64.efi
    #[arg(long, default_value = "")]
    pub shim: String,
    /// Secondary loader installed as /EFI/boot/mmx64.efi
    #[arg(long, default_value = "")]
    pub mmx: String,
    /// Path of the image to write
    #[arg(long, default_value = "")]
    pub out: String,
    /// Count the mmx size when sizing partitions
    #[arg(long)]
    pub size_mmx: bool,
    /// Round partition sizes up to whole MiB instead of down
    #[arg(long)]
    pub round_up: bool,
}

impl Args {
    /// Parse the process arguments, exiting with [`EXIT_FAILURE`] when fewer
    /// than `min_args` are given or they do not parse
    pub fn parse_or_exit(min_args: usize) -> Self {
        let raw: Vec<String> = std::env::args().collect();
        if raw.len() <= min_args {
            println!(
                "{}: expected at least {} arguments, got {}",
                binary_name(&raw),
                min_args,
                raw.len().saturating_sub(1)
            );
            process::exit(EXIT_FAILURE);
        }
        match Args::try_parse_from(&raw) {
            Ok(args) => args,
            Err(err) => {
                println!("{err}");
                process::exit(EXIT_FAILURE);
            }
        }
    }

    pub fn spec(&self) -> BootImageSpec {
        BootImageSpec::from_args(&self.linuxboot, &self.shim, &self.mmx, &self.out)
    }

    pub fn config(&self) -> ImageConfig {
        let sizing = SizingPolicy {
            secondary_loader: if self.size_mmx {
                SecondaryLoader::Included
            } else {
                SecondaryLoader::Excluded
            },
            rounding: if self.round_up {
                Rounding::Up
            } else {
                Rounding::Down
            },
        };
        ImageConfig::default().with_sizing(sizing)
    }
}

fn binary_name(raw: &[String]) -> &str {
    raw.first().map(String::as_str).unwrap_or("isogen")
}

/// `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

/// Print the whole error chain and exit with [`EXIT_FAILURE`]
pub fn exit_with(err: anyhow::Error) -> ! {
    println!("{err:#}");
    process::exit(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_reference_policy_by_default() {
        let args = parse(&["isogen", "--shim", "s.efi", "--out", "o.img"]);
        assert_eq!(args.config().sizing, SizingPolicy::reference());

        let spec = args.spec();
        assert_eq!(spec.shim, Some(PathBuf::from("s.efi")));
        assert_eq!(spec.linuxboot, None);
        assert_eq!(spec.out, PathBuf::from("o.img"));
    }

    #[test]
    fn test_policy_flags() {
        let args = parse(&["isogen", "--out", "o.img", "--size-mmx", "--round-up"]);
        assert_eq!(args.config().sizing, SizingPolicy::conservative());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["isogen", "--kernel", "k"]).is_err());
    }
}
