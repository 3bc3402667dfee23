//! FAT32 file names
//!
//! Short (8.3) names, VFAT long name entries and the `~N` aliases that tie
//! the two together.

use super::types::{ATTR_LONG_NAME, DIR_ENTRY_SIZE};
use crate::fs::{FsError, FsResult};

/// UTF-16 units stored per long name entry
pub const LFN_CHARS_PER_ENTRY: usize = 13;
pub const LFN_LAST_ENTRY: u8 = 0x40;
const MAX_LONG_NAME: usize = 255;

/// Byte offsets of the 13 name units inside a long name entry
const LFN_UNIT_OFFSETS: [usize; LFN_CHARS_PER_ENTRY] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

/// Reject names no FAT directory can hold
pub fn validate_long_name(name: &str) -> FsResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.ends_with(' ')
        || name.ends_with('.')
        || name.encode_utf16().count() > MAX_LONG_NAME
        || name
            .chars()
            .any(|c| (c as u32) < 0x20 || "\"*/:<>?\\|".contains(c));
    if invalid {
        Err(FsError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Upper-cased short name character, if it may appear in an 8.3 name
fn short_char(c: char) -> Option<u8> {
    let c = c.to_ascii_uppercase();
    match c {
        'A'..='Z' | '0'..='9' => Some(c as u8),
        '!' | '#' | '$' | '%' | '&' | '\'' | '(' | ')' | '-' | '@' | '^' | '_' | '`' | '{'
        | '}' | '~' => Some(c as u8),
        _ => None,
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(pos) => (&name[..pos], &name[pos + 1..]),
    }
}

/// The 8.3 form of `name` when the mapping loses nothing but case
pub fn exact_short_name(name: &str) -> Option<[u8; 11]> {
    let (base, ext) = split_extension(name);
    if base.is_empty() || base.len() > 8 || ext.len() > 3 || base.contains('.') {
        return None;
    }
    let mut short = [b' '; 11];
    for (dst, c) in short[..8].iter_mut().zip(base.chars()) {
        *dst = short_char(c)?;
    }
    for (dst, c) in short[8..].iter_mut().zip(ext.chars()) {
        *dst = short_char(c)?;
    }
    Some(short)
}

/// Whether `name` needs long name entries to survive a round trip
pub fn needs_long_name(name: &str) -> bool {
    exact_short_name(name).is_none() || name.chars().any(|c| c.is_ascii_lowercase())
}

/// Short name for `name`, adding a `~N` tail when the mapping is lossy or
/// the plain form is `taken`
pub fn generate_short_name(name: &str, taken: impl Fn(&[u8; 11]) -> bool) -> [u8; 11] {
    if let Some(short) = exact_short_name(name) {
        if !taken(&short) {
            return short;
        }
    }

    let trimmed = name.trim_start_matches(['.', ' ']);
    let (base, ext) = split_extension(trimmed);
    let map = |part: &str| -> Vec<u8> {
        part.chars()
            .filter(|c| *c != ' ' && *c != '.')
            .map(|c| short_char(c).unwrap_or(b'_'))
            .collect()
    };
    let mut base = map(base);
    if base.is_empty() {
        base.push(b'_');
    }
    let ext = map(ext);

    let mut short = [b' '; 11];
    for (dst, c) in short[8..].iter_mut().zip(ext.iter()) {
        *dst = *c;
    }

    for n in 1u32..=999_999 {
        let tail = format!("~{n}");
        let keep = base.len().min(8 - tail.len());
        short[..8].fill(b' ');
        short[..keep].copy_from_slice(&base[..keep]);
        short[keep..keep + tail.len()].copy_from_slice(tail.as_bytes());
        if !taken(&short) {
            break;
        }
    }
    short
}

/// Checksum of a short name stored in each of its long name entries
pub fn lfn_checksum(short: &[u8; 11]) -> u8 {
    short
        .iter()
        .fold(0u8, |sum, &c| ((sum & 1) << 7).wrapping_add(sum >> 1).wrapping_add(c))
}

/// Long name entries for `name`, in on-disk order (last fragment first)
pub fn lfn_entries(name: &str, short: &[u8; 11]) -> Vec<[u8; DIR_ENTRY_SIZE]> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let checksum = lfn_checksum(short);
    let count = units.len().div_ceil(LFN_CHARS_PER_ENTRY);

    let mut entries = Vec::with_capacity(count);
    for index in (0..count).rev() {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0] = (index + 1) as u8;
        if index == count - 1 {
            raw[0] |= LFN_LAST_ENTRY;
        }
        raw[11] = ATTR_LONG_NAME;
        raw[13] = checksum;

        let start = index * LFN_CHARS_PER_ENTRY;
        for (slot, offset) in LFN_UNIT_OFFSETS.iter().enumerate() {
            // NUL after the last unit, 0xFFFF padding after that
            let unit = match units.get(start + slot) {
                Some(unit) => *unit,
                None if start + slot == units.len() => 0x0000,
                None => 0xFFFF,
            };
            raw[*offset..*offset + 2].copy_from_slice(&unit.to_le_bytes());
        }
        entries.push(raw);
    }
    entries
}

/// Sequence number, checksum and name units of a long name entry
pub fn parse_lfn_entry(raw: &[u8]) -> (u8, u8, [u16; LFN_CHARS_PER_ENTRY]) {
    let mut units = [0u16; LFN_CHARS_PER_ENTRY];
    for (unit, offset) in units.iter_mut().zip(LFN_UNIT_OFFSETS) {
        *unit = u16::from_le_bytes([raw[offset], raw[offset + 1]]);
    }
    (raw[0], raw[13], units)
}
