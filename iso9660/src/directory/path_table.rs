//! Path table encoding
//!
//! Each directory gets one path table record, in the order directories are
//! numbered (breadth first, root is number 1). Type L tables store numbers
//! little-endian, type M tables big-endian.

use alloc::vec::Vec;

/// Encoded length of a path table record
pub const fn entry_length(id_len: usize) -> usize {
    8 + id_len + id_len % 2
}

/// Append one path table record to `out`
pub fn push_entry(
    out: &mut Vec<u8>,
    identifier: &[u8],
    extent_lba: u32,
    parent_number: u16,
    big_endian: bool,
) {
    out.push(identifier.len() as u8);
    out.push(0);
    if big_endian {
        out.extend_from_slice(&extent_lba.to_be_bytes());
        out.extend_from_slice(&parent_number.to_be_bytes());
    } else {
        out.extend_from_slice(&extent_lba.to_le_bytes());
        out.extend_from_slice(&parent_number.to_le_bytes());
    }
    out.extend_from_slice(identifier);
    if identifier.len() % 2 == 1 {
        out.push(0);
    }
}
