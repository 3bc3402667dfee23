//! Volume descriptor tests

mod common;

use common::{IsoBuilder, MemoryBlockDevice};
use iso9660::error::Iso9660Error;
use iso9660::{mount, FinalizeOptions, IsoWriter};

#[test]
fn test_mount_written_volume() {
    let mut device = IsoBuilder::new().add_file("/README", b"hi").build();

    let volume = mount(&mut device).expect("mount");
    assert_eq!(volume.volume_id_str(), "immu");
    assert_eq!(volume.volume_set_id_str(), "IMMU");
    assert_eq!(volume.logical_block_size, 2048);
    assert!(volume.boot_catalog_lba.is_none());
}

#[test]
fn test_volume_space_size_matches_plan() {
    let mut writer = IsoWriter::new();
    writer.create_dir_all("/EFI/boot").unwrap();
    writer
        .write_file("/EFI/boot/bootx64.efi", vec![7u8; 5000])
        .unwrap();
    let options = FinalizeOptions::new("immu");
    let expected = writer.total_sectors(&options).unwrap();

    let mut device = MemoryBlockDevice::new(128);
    writer.finalize(&mut device, &options).unwrap();

    let volume = mount(&mut device).unwrap();
    assert_eq!(volume.volume_space_size as u64, expected);
}

#[test]
fn test_system_area_is_zero() {
    let mut device = IsoBuilder::new().add_file("/A.BIN", &[0xFF; 4096]).build();
    assert!(device.data[..16 * 2048].iter().all(|&b| b == 0));
    assert_eq!(&device.sector(16)[1..6], b"CD001");
    let _ = mount(&mut device).unwrap();
}

#[test]
fn test_terminator_follows_primary() {
    let device = IsoBuilder::new().build();
    assert_eq!(device.sector(16)[0], 1);
    assert_eq!(device.sector(17)[0], 255);
    assert_eq!(&device.sector(17)[1..6], b"CD001");
}

#[test]
fn test_mount_blank_device_fails() {
    let mut device = MemoryBlockDevice::new(32);
    assert_eq!(mount(&mut device).unwrap_err(), Iso9660Error::InvalidSignature);
}

#[test]
fn test_mount_rejects_512_byte_blocks() {
    let mut device = MemoryBlockDevice::with_block_size(256, 512);
    assert_eq!(mount(&mut device).unwrap_err(), Iso9660Error::InvalidBlockSize);
}

#[test]
fn test_volume_full() {
    let mut writer = IsoWriter::new();
    writer.write_file("/BIG.BIN", vec![1u8; 64 * 2048]).unwrap();

    let mut device = MemoryBlockDevice::new(40);
    assert_eq!(
        writer
            .finalize(&mut device, &FinalizeOptions::new("immu"))
            .unwrap_err(),
        Iso9660Error::VolumeFull
    );
    assert!(!writer.is_sealed());
}

#[test]
fn test_identical_input_identical_image() {
    let build = || {
        IsoBuilder::new()
            .add_file("/EFI/boot/bootx64.efi", &common::pattern(3000, 1))
            .add_file("/EFI/boot/mmx64.efi", &common::pattern(100, 2))
            .bootable("/BOOT.CAT", "/EFI/boot/bootx64.efi")
            .build()
    };
    assert_eq!(build().data, build().data);
}
