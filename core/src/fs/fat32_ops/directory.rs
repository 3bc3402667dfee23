// FAT32 directory contents

use super::filename::{parse_lfn_entry, LFN_CHARS_PER_ENTRY, LFN_LAST_ENTRY};
use super::types::{
    DirEntry, ATTR_LONG_NAME, ATTR_VOLUME_ID, DIR_ENTRY_SIZE, ENTRY_END, ENTRY_FREE,
};

/// A directory read in full, across its whole cluster chain
#[derive(Debug, Clone)]
pub struct Directory {
    pub chain: Vec<u32>,
    pub data: Vec<u8>,
}

/// A named entry and the slot of its short entry
#[derive(Debug, Clone)]
pub struct Found {
    pub name: String,
    pub entry: DirEntry,
    pub slot: usize,
}

struct PendingLongName {
    checksum: u8,
    expected: u8,
    units: Vec<u16>,
}

pub fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_uppercase() == b.to_uppercase()
}

impl Directory {
    pub fn slots(&self) -> usize {
        self.data.len() / DIR_ENTRY_SIZE
    }

    fn raw(&self, slot: usize) -> &[u8] {
        &self.data[slot * DIR_ENTRY_SIZE..(slot + 1) * DIR_ENTRY_SIZE]
    }

    pub fn put(&mut self, slot: usize, raw: &[u8; DIR_ENTRY_SIZE]) {
        self.data[slot * DIR_ENTRY_SIZE..(slot + 1) * DIR_ENTRY_SIZE].copy_from_slice(raw);
    }

    /// Named entries, skipping `.`, `..`, the volume label and deleted slots
    pub fn entries(&self) -> Vec<Found> {
        let mut found = Vec::new();
        let mut pending: Option<PendingLongName> = None;

        for slot in 0..self.slots() {
            let raw = self.raw(slot);
            match raw[0] {
                ENTRY_END => break,
                ENTRY_FREE => {
                    pending = None;
                    continue;
                }
                _ => {}
            }

            if raw[11] & 0x3F == ATTR_LONG_NAME {
                let (ord, checksum, units) = parse_lfn_entry(raw);
                let seq = ord & !LFN_LAST_ENTRY;
                if ord & LFN_LAST_ENTRY != 0 {
                    if seq == 0 {
                        pending = None;
                        continue;
                    }
                    let mut all = vec![0xFFFFu16; seq as usize * LFN_CHARS_PER_ENTRY];
                    let start = (seq as usize - 1) * LFN_CHARS_PER_ENTRY;
                    all[start..start + LFN_CHARS_PER_ENTRY].copy_from_slice(&units);
                    pending = Some(PendingLongName {
                        checksum,
                        expected: seq - 1,
                        units: all,
                    });
                } else {
                    pending = match pending.take() {
                        Some(mut p) if p.checksum == checksum && seq == p.expected && seq > 0 => {
                            let start = (seq as usize - 1) * LFN_CHARS_PER_ENTRY;
                            p.units[start..start + LFN_CHARS_PER_ENTRY].copy_from_slice(&units);
                            p.expected -= 1;
                            Some(p)
                        }
                        _ => None,
                    };
                }
                continue;
            }

            let entry = DirEntry::parse(raw);
            let long = pending.take();
            if entry.attr & ATTR_VOLUME_ID != 0 || entry.name[0] == b'.' {
                continue;
            }

            let checksum = super::filename::lfn_checksum(&entry.name);
            let name = match long {
                Some(p) if p.expected == 0 && p.checksum == checksum => {
                    let end = p
                        .units
                        .iter()
                        .position(|u| *u == 0x0000 || *u == 0xFFFF)
                        .unwrap_or(p.units.len());
                    String::from_utf16_lossy(&p.units[..end])
                }
                _ => entry.short_name_string(),
            };
            found.push(Found { name, entry, slot });
        }
        found
    }

    /// Entry whose long or short name matches `name`
    pub fn find(&self, name: &str) -> Option<Found> {
        self.entries()
            .into_iter()
            .find(|f| names_equal(&f.name, name) || names_equal(&f.entry.short_name_string(), name))
    }

    pub fn short_name_taken(&self, short: &[u8; 11]) -> bool {
        self.entries().iter().any(|f| &f.entry.name == short)
    }

    /// First run of `count` free slots
    pub fn free_run(&self, count: usize) -> Option<usize> {
        let mut run = 0;
        for slot in 0..self.slots() {
            let first = self.raw(slot)[0];
            if first == ENTRY_END || first == ENTRY_FREE {
                run += 1;
                if run == count {
                    return Some(slot + 1 - count);
                }
            } else {
                run = 0;
            }
        }
        None
    }
}
