//! Base types for structure of BYML file.

use binrw::{BinRead, BinWrite};
use derive_more::derive::Display;

/// Magic of the little endian layout
pub const BYML_MAGIC: [u8; 2] = *b"YB";

/// Magic of the big endian layout, which is not supported
pub const BYML_BIG_ENDIAN_MAGIC: [u8; 2] = *b"BY";

/// Oldest version accepted by the reader and writer
pub const MIN_VERSION: u16 = 2;

/// Newest version accepted by the reader and writer
pub const MAX_VERSION: u16 = 4;

/// Version written when none is requested
pub const DEFAULT_VERSION: u16 = 2;

/// Deepest container nesting the reader follows
pub const MAX_DEPTH: usize = 256;

/// Size of [`BymlHeader`] on disk
pub const BYML_HEADER_SIZE: usize = 0x10;

/// BYML file header
///
/// Every offset is absolute from the start of the document; zero means the section is absent.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(magic = b"YB", little)]
pub struct BymlHeader {
    /// Format version
    pub version: u16,

    /// Offset of the sorted hash key table
    pub key_table_offset: u32,

    /// Offset of the sorted string value table
    pub string_table_offset: u32,

    /// Offset of the root container
    pub root_offset: u32,
}

/// The one byte type tag preceding every node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum NodeType {
    /// Index into the string value table
    #[display("string")]
    String = 0xA0,
    /// Ordered list of nodes
    #[display("array")]
    Array = 0xC0,
    /// Map from key table entries to nodes
    #[display("hash")]
    Hash = 0xC1,
    /// Table of strings, used for the key and value tables
    #[display("string table")]
    StringTable = 0xC2,
    #[display("bool")]
    Bool = 0xD0,
    #[display("int")]
    Int = 0xD1,
    #[display("float")]
    Float = 0xD2,
    #[display("uint")]
    UInt = 0xD3,
    #[display("int64")]
    Int64 = 0xD4,
    #[display("uint64")]
    UInt64 = 0xD5,
    #[display("double")]
    Double = 0xD6,
    #[display("null")]
    Null = 0xFF,
}

impl NodeType {
    /// Whether the value slot holds the offset of a container
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Array | NodeType::Hash | NodeType::StringTable
        )
    }

    /// Whether the value slot holds the offset of an 8 byte value
    pub const fn is_big_data(self) -> bool {
        matches!(self, NodeType::Int64 | NodeType::UInt64 | NodeType::Double)
    }
}

impl TryFrom<u8> for NodeType {
    type Error = nx_binary::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0xA0 => NodeType::String,
            0xC0 => NodeType::Array,
            0xC1 => NodeType::Hash,
            0xC2 => NodeType::StringTable,
            0xD0 => NodeType::Bool,
            0xD1 => NodeType::Int,
            0xD2 => NodeType::Float,
            0xD3 => NodeType::UInt,
            0xD4 => NodeType::Int64,
            0xD5 => NodeType::UInt64,
            0xD6 => NodeType::Double,
            0xFF => NodeType::Null,
            // Binary blobs and path tables of newer revisions
            0xA1 | 0xA2 | 0xC3 => {
                return Err(nx_binary::error::Error::unsupported(format!(
                    "node type {:#04x}",
                    value
                )))
            }
            _ => {
                return Err(nx_binary::error::Error::format(format!(
                    "unknown node type {:#04x}",
                    value
                )))
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::{BinRead, BinWrite};
    use nx_binary::error::Error as BinaryError;
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::types::{BymlHeader, NodeType};

    #[test]
    fn read_header() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x59, 0x42,
            0x03, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x24, 0x00, 0x00, 0x00,
        ]);

        let expected = BymlHeader {
            version: 3,
            key_table_offset: 0x10,
            string_table_offset: 0,
            root_offset: 0x24,
        };

        assert_eq!(BymlHeader::read(&mut input)?, expected);

        Ok(())
    }

    #[test]
    fn write_header() -> Result<()> {
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x59, 0x42,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let mut actual = Vec::new();
        BymlHeader {
            version: 2,
            ..Default::default()
        }
        .write(&mut Cursor::new(&mut actual))?;
        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn node_type_tags() {
        assert_eq!(NodeType::try_from(0xC1).ok(), Some(NodeType::Hash));
        assert_eq!(NodeType::Double as u8, 0xD6);
        assert!(NodeType::StringTable.is_container());
        assert!(NodeType::UInt64.is_big_data());
        assert!(!NodeType::UInt.is_big_data());
        assert_eq!(NodeType::StringTable.to_string(), "string table");

        assert!(matches!(
            NodeType::try_from(0x42),
            Err(BinaryError::Format(_))
        ));
        assert!(matches!(
            NodeType::try_from(0xA1),
            Err(BinaryError::UnsupportedFeature(_))
        ));
    }
}
