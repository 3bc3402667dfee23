//! The binaries as a user runs them

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const KIB: usize = 1024;

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn binary")
}

fn fixture(dir: &TempDir, name: &str, len: usize) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, vec![0x5A; len]).unwrap();
    path.display().to_string()
}

fn failed(output: &Output) -> bool {
    // -1 as seen by the parent
    output.status.code().map_or(false, |code| code == -1 || code == 255)
}

#[test]
fn test_too_few_arguments() {
    let output = run(env!("CARGO_BIN_EXE_isogen"), &["--out", "x.img"]);
    assert!(failed(&output));
    assert!(!Path::new("x.img").exists());

    let output = run(
        env!("CARGO_BIN_EXE_isogen-wrapped"),
        &["--shim", "s.efi", "--out"],
    );
    assert!(failed(&output));
}

#[test]
fn test_hybrid_build() {
    let dir = TempDir::new().unwrap();
    let shim = fixture(&dir, "shim.efi", 900 * KIB);
    let linuxboot = fixture(&dir, "linuxboot.efi", 200 * KIB);
    let mmx = fixture(&dir, "mmx.efi", 50 * KIB);
    let out = dir.path().join("hybrid.img");

    let output = run(
        env!("CARGO_BIN_EXE_isogen"),
        &[
            "--shim",
            &shim,
            "--linuxboot",
            &linuxboot,
            "--mmx",
            &mmx,
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{output:?}");
    // Two 1 MiB partitions and the padding
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 7 << 20);
}

#[test]
fn test_hybrid_build_rounding_up() {
    let dir = TempDir::new().unwrap();
    let shim = fixture(&dir, "shim.efi", 900 * KIB);
    let linuxboot = fixture(&dir, "linuxboot.efi", 200 * KIB);
    let out = dir.path().join("hybrid.img");

    let output = run(
        env!("CARGO_BIN_EXE_isogen"),
        &[
            "--shim",
            &shim,
            "--linuxboot",
            &linuxboot,
            "--out",
            out.to_str().unwrap(),
            "--round-up",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 9 << 20);
}

#[test]
fn test_failure_prints_chain() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("hybrid.img");
    let missing = dir.path().join("missing.efi");

    let output = run(
        env!("CARGO_BIN_EXE_isogen"),
        &[
            "--shim",
            missing.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert!(failed(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed to make efi bootloader iso"), "{stdout}");
    assert!(stdout.contains("missing.efi"), "{stdout}");
    assert!(!out.exists());
}

#[test]
fn test_wrapped_build_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let shim = fixture(&dir, "shim.efi", 1100 * KIB);
    let out = dir.path().join("wrapped.img");

    let output = Command::new(env!("CARGO_BIN_EXE_isogen-wrapped"))
        .args(["--shim", &shim, "--out", out.to_str().unwrap(), "--mmx", ""])
        .env("RUST_LOG", "off")
        .env("TMPDIR", dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    // 1 MiB ESP plus padding, wrapped with padding again
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 11 << 20);

    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn test_wrapped_failure_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let shim = fixture(&dir, "shim.efi", 1100 * KIB);
    // Stage one succeeds, the final image cannot be created
    let out = dir.path().join("missing").join("wrapped.img");

    let output = Command::new(env!("CARGO_BIN_EXE_isogen-wrapped"))
        .args(["--shim", &shim, "--out", out.to_str().unwrap(), "--mmx", ""])
        .env("RUST_LOG", "off")
        .env("TMPDIR", dir.path())
        .output()
        .unwrap();
    assert!(failed(&output), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed to make efi bootloader iso"), "{stdout}");
    assert!(!out.exists());
    assert!(leftovers(dir.path()).is_empty());
}

/// Intermediate images left in `dir`
fn leftovers(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("isogen") && name.ends_with(".img"))
        .collect()
}
