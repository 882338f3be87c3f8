//! This library handles reading from and creating **SARC** archives.
//!
//! # SARC Archive Format Documentation
//!
//! SARC bundles many named files into a single blob. Files are located through a table of
//! name hashes kept sorted so the engine can binary search it; literal names are stored in a
//! separate table and may be omitted entirely. Only the little endian layout is supported.
//!
//! ## File Structure
//!
//! A SARC file consists of the archive header, the SFAT file table, the SFNT name table and
//! finally the data section.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "SARC"                                            |
//! | 0x0004         | Header size            | 2 bytes: Always 0x14                                       |
//! | 0x0006         | Byte order mark        | 2 bytes: `FF FE` for little endian                         |
//! | 0x0008         | File size              | 4 bytes: Size of the whole archive                         |
//! | 0x000C         | Data offset            | 4 bytes: Absolute offset of the data section               |
//! | 0x0010         | Version                | 2 bytes: Always 0x0100                                     |
//! | 0x0012         | Reserved               | 2 bytes                                                    |
//!
//! ### File Table (SFAT)
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "SFAT"                                         |
//! | 0x0004         | Header size            | 2 bytes: Always 0x0C                                    |
//! | 0x0006         | File count             | 2 bytes: Number of entries that follow                  |
//! | 0x0008         | Hash key               | 4 bytes: Multiplier for the name hash, usually 0x65     |
//!
//! Each entry is 16 bytes, sorted ascending by name hash:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Name hash              | 4 bytes: See [`hash::NameHash`]                         |
//! | 0x0004         | Name attributes        | 4 bytes: `0x01000000 \| (name offset / 4)` or zero      |
//! | 0x0008         | Data begin             | 4 bytes: Relative to the data section                   |
//! | 0x000C         | Data end               | 4 bytes: Relative to the data section                   |
//!
//! ### Name Table (SFNT)
//!
//! An 8 byte header ("SFNT", size 0x08, reserved) followed by NUL terminated UTF-8 names,
//! each padded to a multiple of 4 bytes.
//!
//! ### Data
//!
//! Payloads are stored in file table order. Each begins at a multiple of the alignment its
//! extension requires, see [`alignment::AlignmentPolicy`].
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.sarc`, `.pack`, `.bars`, `.sbactorpack` and many more
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression**: Archives are frequently Yaz0 or zstd compressed; that is handled
//!   outside this crate
//!

pub mod alignment;
pub mod error;
pub mod hash;
pub mod read;
pub mod types;
pub mod write;

pub use alignment::AlignmentPolicy;
pub use hash::NameHash;
pub use read::SarcArchive;
pub use write::{FileName, SarcWriter};
