//! Page Module
//!
//! One page is one file holding a bounded number of records of a single type.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (4 bytes)                                        │
//! │   Count: u32 little-endian                              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (variable)                                      │
//! │   [Record 1][Record 2] ... [Record Count]               │
//! │   (codec-encoded, self-delimiting, append order,        │
//! │    no framing between records)                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The page's capacity is not stored in the file; it is a property of the
//! table that owns the page.
//!
//! ## Consistency
//! Appending a record bumps the header first and writes the payload second.
//! A crash between the two leaves `count` ahead of the records actually on
//! disk. Readers trust the payload, not the header: they decode until the
//! data runs out.

mod file;

pub use file::Page;

/// Header size: Count (4) = 4 bytes
pub const HEADER_SIZE: u64 = 4;
