//! Shared helpers for sector math, checksums, strings and timestamps

pub mod checksum;
pub mod datetime;
pub mod sector;
pub mod string;
