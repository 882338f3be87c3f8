//! Base types for structure of SARC file.

use binrw::{BinRead, BinWrite};

/// Size of [`SarcHeader`] on disk
pub const SARC_HEADER_SIZE: u16 = 0x14;

/// Size of [`SfatHeader`] on disk
pub const SFAT_HEADER_SIZE: u16 = 0x0C;

/// Size of a single [`SfatEntry`] on disk
pub const SFAT_ENTRY_SIZE: u32 = 0x10;

/// Size of [`SfntHeader`] on disk
pub const SFNT_HEADER_SIZE: u16 = 0x08;

/// Version written by every known producer
pub const SARC_VERSION: u16 = 0x0100;

/// Flag set in the top byte of [`SfatEntry::name_offset`] when the entry has a name
pub const NAME_FLAG: u32 = 0x0100_0000;

/// Byte order mark as read with little endian byte order
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ByteOrderMark {
    /// `FF FE` on disk
    Little,
    /// `FE FF` on disk
    Big,
}

impl ByteOrderMark {
    /// The value stored in [`SarcHeader::byte_order`]
    pub const fn value(self) -> u16 {
        match self {
            ByteOrderMark::Little => 0xFEFF,
            ByteOrderMark::Big => 0xFFFE,
        }
    }

    /// Interpret a raw header value
    pub const fn from_value(value: u16) -> Option<Self> {
        match value {
            0xFEFF => Some(ByteOrderMark::Little),
            0xFFFE => Some(ByteOrderMark::Big),
            _ => None,
        }
    }
}

/// SARC file header
///
/// Always starts with "SARC". Only the little endian layout is supported, a big endian byte
/// order mark is rejected by [`crate::read::SarcArchive::new`].
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"SARC", little)]
pub struct SarcHeader {
    /// Size of this header, always 0x14
    pub header_size: u16,

    /// The raw byte order mark, see [`ByteOrderMark`]
    pub byte_order: u16,

    /// Size of the whole archive
    pub file_size: u32,

    /// Absolute offset of the data section
    pub data_start: u32,

    /// Format version, always 0x0100
    pub version: u16,

    /// Unused
    #[allow(dead_code)]
    pub reserved: u16,
}

impl Default for SarcHeader {
    fn default() -> Self {
        Self {
            header_size: SARC_HEADER_SIZE,
            byte_order: ByteOrderMark::Little.value(),
            file_size: Default::default(),
            data_start: Default::default(),
            version: SARC_VERSION,
            reserved: Default::default(),
        }
    }
}

/// SFAT (file allocation table) header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"SFAT", little)]
pub struct SfatHeader {
    /// Size of this header, always 0x0C
    pub header_size: u16,

    /// Number of [`SfatEntry`] records following the header
    pub file_count: u16,

    /// Multiplier for [`crate::hash::NameHash`]
    pub hash_key: u32,
}

impl Default for SfatHeader {
    fn default() -> Self {
        Self {
            header_size: SFAT_HEADER_SIZE,
            file_count: Default::default(),
            hash_key: crate::hash::DEFAULT_HASH_KEY,
        }
    }
}

/// SFAT file record
///
/// Records are sorted by [`SfatEntry::name_hash`]. Data offsets are relative to
/// [`SarcHeader::data_start`].
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct SfatEntry {
    /// Hash of the file name
    pub name_hash: u32,

    /// [`NAME_FLAG`] plus the name offset in 4 byte units, or zero for unnamed files
    pub name_offset: u32,

    /// Start of the data relative to the data section
    pub data_begin: u32,

    /// End of the data relative to the data section
    pub data_end: u32,
}

impl SfatEntry {
    /// Byte offset of the name inside the name table, if the entry has one
    pub fn name_table_offset(&self) -> Option<usize> {
        if self.name_offset >> 24 == 0 {
            return None;
        }
        Some((self.name_offset & 0x00FF_FFFF) as usize * 4)
    }
}

/// SFNT (file name table) header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"SFNT", little)]
pub struct SfntHeader {
    /// Size of this header, always 0x08
    pub header_size: u16,

    /// Unused
    #[allow(dead_code)]
    pub reserved: u16,
}

impl Default for SfntHeader {
    fn default() -> Self {
        Self {
            header_size: SFNT_HEADER_SIZE,
            reserved: Default::default(),
        }
    }
}
