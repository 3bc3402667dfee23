//! String handling utilities
//!
//! ISO9660 uses various string encodings: ASCII, d-characters, a-characters.
//! Names handed to the writer are mapped onto d-characters (`A-Z 0-9 _`),
//! and lookups apply the same mapping so callers can keep using the
//! original mixed-case names.

use alloc::string::String;

/// Maximum directory identifier length (level 2)
pub const MAX_DIR_IDENTIFIER: usize = 31;

/// Maximum file identifier length without the `;1` version suffix
pub const MAX_FILE_IDENTIFIER: usize = 30;

const MAX_EXTENSION: usize = 8;

/// Trim trailing spaces from byte slice
pub fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b' ' || bytes[end - 1] == 0) {
        end -= 1;
    }
    &bytes[..end]
}

/// Convert ISO9660 d-characters to string
///
/// d-characters: A-Z, 0-9, _
pub fn dchars_to_str(bytes: &[u8]) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(trim_trailing_spaces(bytes))
}

/// Convert ISO9660 a-characters to string
pub fn achars_to_str(bytes: &[u8]) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(trim_trailing_spaces(bytes))
}

/// Copy `value` into a fixed a-character field, space padded
pub fn write_padded(field: &mut [u8], value: &str) {
    field.fill(b' ');
    for (dst, src) in field.iter_mut().zip(value.bytes()) {
        *dst = src;
    }
}

/// Strip version suffix from filename (e.g., "FILE.TXT;1" -> "FILE.TXT")
/// Also removes trailing dot if present (e.g., "FILE.;1" -> "FILE")
pub fn strip_version(name: &str) -> &str {
    let base = name.split(';').next().unwrap_or(name);
    base.strip_suffix('.').unwrap_or(base)
}

fn to_dchar(c: char) -> char {
    match c.to_ascii_uppercase() {
        upper @ ('A'..='Z' | '0'..='9' | '_') => upper,
        _ => '_',
    }
}

fn map_dchars(name: &str, limit: usize) -> String {
    name.chars().map(to_dchar).take(limit).collect()
}

/// Directory identifier for a path component
pub fn dir_identifier(name: &str) -> String {
    map_dchars(name, MAX_DIR_IDENTIFIER)
}

/// File identifier for a path component, without the version suffix
///
/// The last `.` separates the extension; any other dot becomes `_`.
/// A name without an extension keeps a trailing `.` as ISO9660 requires.
pub fn file_identifier_base(name: &str) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (name, ""),
    };
    let ext = map_dchars(ext, MAX_EXTENSION);
    let mut out = map_dchars(stem, MAX_FILE_IDENTIFIER - 1 - ext.len());
    out.push('.');
    out.push_str(&ext);
    out
}

/// Full file identifier (`NAME.EXT;1`) for a path component
pub fn file_identifier(name: &str) -> String {
    let mut out = file_identifier_base(name);
    out.push_str(";1");
    out
}

/// Whether an on-disk identifier is the one `component` maps to
pub fn identifier_matches(record_name: &str, is_directory: bool, component: &str) -> bool {
    if is_directory {
        strip_version(record_name).eq_ignore_ascii_case(&dir_identifier(component))
    } else {
        let wanted = file_identifier_base(component);
        strip_version(record_name).eq_ignore_ascii_case(strip_version(&wanted))
    }
}
