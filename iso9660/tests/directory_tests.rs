//! Directory navigation tests

mod common;

use common::IsoBuilder;
use iso9660::directory::list_dir;
use iso9660::error::Iso9660Error;
use iso9660::{find_file, mount};

#[test]
fn test_find_nested_file_with_original_names() {
    let mut device = IsoBuilder::new()
        .add_file("/EFI/boot/bootx64.efi", b"shim")
        .build();
    let volume = mount(&mut device).expect("mount");

    let file = find_file(&mut device, &volume, "/EFI/boot/bootx64.efi").expect("find");
    assert_eq!(file.name, "BOOTX64.EFI");
    assert_eq!(file.size, 4);
    assert!(!file.flags.directory);
}

#[test]
fn test_find_is_case_insensitive() {
    let mut device = IsoBuilder::new()
        .add_file("/EFI/boot/linuxboot.efi", b"payload")
        .build();
    let volume = mount(&mut device).unwrap();

    for path in [
        "/EFI/BOOT/LINUXBOOT.EFI",
        "/efi/boot/linuxboot.efi",
        "\\EFI\\Boot\\LinuxBoot.efi",
    ] {
        assert!(find_file(&mut device, &volume, path).is_ok(), "{path}");
    }
}

#[test]
fn test_find_directory() {
    let mut device = IsoBuilder::new().add_dir("/vfat").build();
    let volume = mount(&mut device).unwrap();

    let dir = find_file(&mut device, &volume, "/vfat").unwrap();
    assert!(dir.flags.directory);
    assert_eq!(dir.name, "VFAT");
}

#[test]
fn test_not_found() {
    let mut device = IsoBuilder::new().add_file("/EFI/boot/bootx64.efi", b"x").build();
    let volume = mount(&mut device).unwrap();

    assert_eq!(
        find_file(&mut device, &volume, "/EFI/boot/mmx64.efi").unwrap_err(),
        Iso9660Error::NotFound
    );
    assert_eq!(
        find_file(&mut device, &volume, "/EFI/boot/bootx64.efi/x").unwrap_err(),
        Iso9660Error::NotADirectory
    );
}

#[test]
fn test_list_root_skips_dot_entries() {
    let mut device = IsoBuilder::new()
        .add_file("/B.BIN", b"b")
        .add_file("/A.BIN", b"a")
        .add_dir("/EFI")
        .build();
    let volume = mount(&mut device).unwrap();
    let root = find_file(&mut device, &volume, "/").unwrap();

    let names: Vec<String> = list_dir(&mut device, &root)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["A.BIN", "B.BIN", "EFI"]);
}

#[test]
fn test_large_directory_spans_sectors() {
    let mut builder = IsoBuilder::new();
    for i in 0..120 {
        builder.add_file(&format!("/many/file{i:03}.bin"), &[i as u8]);
    }
    let mut device = builder.build();
    let volume = mount(&mut device).unwrap();

    let dir = find_file(&mut device, &volume, "/many").unwrap();
    assert!(dir.data_length > 2048);
    assert_eq!(list_dir(&mut device, &dir).unwrap().len(), 120);

    let last = find_file(&mut device, &volume, "/many/file119.bin").unwrap();
    assert_eq!(last.size, 1);
}
