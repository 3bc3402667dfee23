// GPT creation using gpt-disk-rs

use gpt_disk_io::{BlockIo, Disk};
use gpt_disk_types::{BlockSize, GptHeader, GptPartitionEntryArray, Lba, LbaLe, U32Le};
use log::debug;
use uguid::Guid;

use super::PartitionType;
use crate::error::{Error, Result};
use crate::layout::{PartitionDescriptor, PartitionLayout};
use crate::util::crc32;

const NUM_ENTRIES: u32 = 128;
const ENTRY_ARRAY_BYTES: usize = 128 * 128;
const ENTRY_ARRAY_SECTORS: u64 = (ENTRY_ARRAY_BYTES / 512) as u64;
/// Protective MBR, primary header and the entry array
const FIRST_USABLE_LBA: u64 = 2 + ENTRY_ARRAY_SECTORS;

/// Lets `Disk` work on a device the caller keeps
struct Borrowed<'a, B>(&'a mut B);

impl<B: BlockIo> BlockIo for Borrowed<'_, B> {
    type Error = B::Error;

    fn block_size(&self) -> BlockSize {
        self.0.block_size()
    }

    fn num_blocks(&mut self) -> std::result::Result<u64, Self::Error> {
        self.0.num_blocks()
    }

    fn read_blocks(
        &mut self,
        start_lba: Lba,
        dst: &mut [u8],
    ) -> std::result::Result<(), Self::Error> {
        self.0.read_blocks(start_lba, dst)
    }

    fn write_blocks(
        &mut self,
        start_lba: Lba,
        src: &[u8],
    ) -> std::result::Result<(), Self::Error> {
        self.0.write_blocks(start_lba, src)
    }

    fn flush(&mut self) -> std::result::Result<(), Self::Error> {
        self.0.flush()
    }
}

fn table_err(what: &str, err: impl core::fmt::Debug) -> Error {
    Error::PartitionTable {
        reason: format!("{what}: {err:?}"),
    }
}

/// Version 4 style GUID from a CRC32 stream over `seed`
///
/// The same layout always yields the same GUIDs, so images are reproducible.
fn derived_guid(seed: &[u8]) -> Guid {
    let mut bytes = [0u8; 16];
    for (i, chunk) in bytes.chunks_exact_mut(4).enumerate() {
        let mut input = seed.to_vec();
        input.push(i as u8);
        chunk.copy_from_slice(&crc32(&input).to_le_bytes());
    }
    Guid::from_random_bytes(bytes)
}

fn layout_seed(layout: &PartitionLayout) -> Vec<u8> {
    let mut seed = layout.disk_size.to_le_bytes().to_vec();
    for p in &layout.partitions {
        seed.extend_from_slice(p.name.as_bytes());
        seed.extend_from_slice(&p.start_sector.to_le_bytes());
        seed.extend_from_slice(&p.end_sector.to_le_bytes());
    }
    seed
}

/// Helper function to write both primary and secondary GPT headers and partition arrays.
/// This ensures both copies stay in sync to avoid CRC mismatch errors.
fn write_gpt_both<B: BlockIo>(
    disk: &mut Disk<B>,
    header: &GptHeader,
    entry_array: &GptPartitionEntryArray,
) -> Result<()> {
    disk.write_primary_gpt_header(header, &mut [0u8; 512])
        .map_err(|e| table_err("write primary header", e))?;
    disk.write_gpt_partition_entry_array(entry_array)
        .map_err(|e| table_err("write primary entries", e))?;

    // Secondary header: my/alternate swapped, entries right before it
    let mut secondary_header = header.clone();
    secondary_header.my_lba = header.alternate_lba;
    secondary_header.alternate_lba = header.my_lba;
    secondary_header.partition_entry_lba =
        LbaLe::from_u64(header.alternate_lba.to_u64() - ENTRY_ARRAY_SECTORS);
    secondary_header.update_header_crc32();

    disk.write_secondary_gpt_header(&secondary_header, &mut [0u8; 512])
        .map_err(|e| table_err("write secondary header", e))?;

    let secondary_layout = secondary_header
        .get_partition_entry_array_layout()
        .map_err(|e| table_err("secondary entry layout", e))?;
    let mut secondary_buf = [0u8; ENTRY_ARRAY_BYTES];
    secondary_buf.copy_from_slice(entry_array.storage());
    let secondary_entry_array =
        GptPartitionEntryArray::new(secondary_layout, BlockSize::BS_512, &mut secondary_buf)
            .map_err(|e| table_err("secondary entry array", e))?;
    disk.write_gpt_partition_entry_array(&secondary_entry_array)
        .map_err(|e| table_err("write secondary entries", e))?;

    disk.flush().map_err(|e| table_err("flush", e))
}

/// Write a protective MBR and primary plus backup GPT describing `layout`
///
/// `block_io` must cover the whole disk with 512-byte blocks.
pub fn write_gpt<B: BlockIo>(block_io: &mut B, layout: &PartitionLayout) -> Result<()> {
    let num_blocks = layout.disk_sectors();
    if num_blocks < 2 * FIRST_USABLE_LBA {
        return Err(Error::PartitionTable {
            reason: format!("disk of {num_blocks} sectors cannot hold a GPT"),
        });
    }
    let last_usable = num_blocks - FIRST_USABLE_LBA;
    if layout.partitions.len() > NUM_ENTRIES as usize {
        return Err(Error::PartitionTable {
            reason: format!("{} partitions exceed the entry array", layout.partitions.len()),
        });
    }
    for p in &layout.partitions {
        if p.start_sector < FIRST_USABLE_LBA
            || p.end_sector > last_usable
            || p.start_sector > p.end_sector
        {
            return Err(Error::PartitionTable {
                reason: format!(
                    "partition {} ({}..={}) outside usable sectors {}..={}",
                    p.name, p.start_sector, p.end_sector, FIRST_USABLE_LBA, last_usable
                ),
            });
        }
    }

    let mut disk = Disk::new(Borrowed(block_io)).map_err(|e| table_err("open disk", e))?;
    let seed = layout_seed(layout);

    let mut header = GptHeader {
        my_lba: LbaLe::from_u64(1),
        alternate_lba: LbaLe::from_u64(num_blocks - 1),
        first_usable_lba: LbaLe::from_u64(FIRST_USABLE_LBA),
        last_usable_lba: LbaLe::from_u64(last_usable),
        disk_guid: derived_guid(&seed),
        partition_entry_lba: LbaLe::from_u64(2),
        number_of_partition_entries: U32Le::from_u32(NUM_ENTRIES),
        ..Default::default()
    };

    disk.write_protective_mbr(&mut [0u8; 512])
        .map_err(|e| table_err("write protective MBR", e))?;

    let entry_layout = header
        .get_partition_entry_array_layout()
        .map_err(|e| table_err("entry layout", e))?;
    let mut entry_buf = [0u8; ENTRY_ARRAY_BYTES];
    let mut entry_array =
        GptPartitionEntryArray::new(entry_layout, BlockSize::BS_512, &mut entry_buf)
            .map_err(|e| table_err("entry array", e))?;

    for (index, p) in layout.partitions.iter().enumerate() {
        let entry = entry_array
            .get_partition_entry_mut(index as u32)
            .ok_or_else(|| table_err("entry slot", index))?;
        let mut partition_seed = seed.clone();
        partition_seed.extend_from_slice(&(index as u32).to_le_bytes());

        entry.partition_type_guid = p.partition_type.to_gpt_guid();
        entry.unique_partition_guid = derived_guid(&partition_seed);
        entry.starting_lba = LbaLe::from_u64(p.start_sector);
        entry.ending_lba = LbaLe::from_u64(p.end_sector);
        entry.attributes = Default::default();
        entry.name = p.name.parse().map_err(|e| table_err("partition name", e))?;
        debug!(
            "gpt entry {}: {} {} sectors {}..={}",
            index,
            p.name,
            p.partition_type.type_name(),
            p.start_sector,
            p.end_sector
        );
    }

    header.partition_entry_array_crc32 = entry_array.calculate_crc32();
    header.update_header_crc32();

    write_gpt_both(&mut disk, &header, &entry_array)
}

/// Read back the used entries of the primary GPT
pub fn read_gpt<B: BlockIo>(block_io: &mut B) -> Result<Vec<PartitionDescriptor>> {
    let mut disk = Disk::new(Borrowed(block_io)).map_err(|e| table_err("open disk", e))?;
    let header = disk
        .read_primary_gpt_header(&mut [0u8; 512])
        .map_err(|e| table_err("read primary header", e))?;
    if !header.is_signature_valid() {
        return Err(Error::PartitionTable {
            reason: "missing GPT signature".into(),
        });
    }

    let entry_layout = header
        .get_partition_entry_array_layout()
        .map_err(|e| table_err("entry layout", e))?;
    if entry_layout.num_entries > NUM_ENTRIES {
        return Err(table_err("entry count", entry_layout.num_entries));
    }
    let mut entry_buf = [0u8; ENTRY_ARRAY_BYTES];
    let entry_array = disk
        .read_gpt_partition_entry_array(entry_layout, &mut entry_buf)
        .map_err(|e| table_err("read entries", e))?;
    if entry_array.calculate_crc32() != header.partition_entry_array_crc32 {
        return Err(Error::PartitionTable {
            reason: "entry array CRC mismatch".into(),
        });
    }

    let mut partitions = Vec::new();
    for index in 0..entry_layout.num_entries {
        let Some(entry) = entry_array.get_partition_entry(index) else {
            break;
        };
        if !entry.is_used() {
            continue;
        }
        // Entries are packed; copy fields out before borrowing them
        let type_guid = entry.partition_type_guid;
        let starting_lba = entry.starting_lba;
        let ending_lba = entry.ending_lba;
        let name = entry.name;
        let partition_type = PartitionType::from_gpt_guid(&type_guid)
            .ok_or_else(|| table_err("unknown partition type", type_guid))?;
        partitions.push(PartitionDescriptor {
            start_sector: starting_lba.to_u64(),
            end_sector: ending_lba.to_u64(),
            partition_type,
            name: name.to_string(),
        });
    }
    Ok(partitions)
}
