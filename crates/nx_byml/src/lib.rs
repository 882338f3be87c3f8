//! This library handles reading from and creating **BYML** documents.
//!
//! # BYML Format Documentation
//!
//! BYML is a binary, self describing tree of typed nodes, similar in spirit to JSON. Hash keys
//! and string values are deduplicated into two sorted tables at the start of the document and
//! referenced by index everywhere else. Only the little endian layout (`YB`) of versions 2
//! through 4 is supported.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 2 bytes: "YB"                                              |
//! | 0x0002         | Version                | 2 bytes: 2, 3 or 4                                         |
//! | 0x0004         | Key table offset       | 4 bytes: String table of every hash key, zero if absent    |
//! | 0x0008         | String table offset    | 4 bytes: String table of every string value, zero if absent|
//! | 0x000C         | Root offset            | 4 bytes: Array or hash at the root, zero if absent         |
//!
//! ### Nodes
//!
//! Every node has a one byte type tag. Scalars are stored inline in a 4 byte value slot of
//! their parent; containers and 8 byte values are stored elsewhere and the slot holds their
//! absolute offset.
//!
//! | Tag    | Type         | Value slot                                     |
//! |--------|--------------|------------------------------------------------|
//! | `0xA0` | String       | Index into the string table                    |
//! | `0xC0` | Array        | Offset of the array                            |
//! | `0xC1` | Hash         | Offset of the hash                             |
//! | `0xC2` | String table | Offset of the table                            |
//! | `0xD0` | Bool         | 0 or 1                                         |
//! | `0xD1` | Int          | Signed 32 bit integer                          |
//! | `0xD2` | Float        | 32 bit float                                   |
//! | `0xD3` | UInt         | Unsigned 32 bit integer                        |
//! | `0xD4` | Int64        | Offset of a signed 64 bit integer              |
//! | `0xD5` | UInt64       | Offset of an unsigned 64 bit integer           |
//! | `0xD6` | Double       | Offset of a 64 bit float                       |
//! | `0xFF` | Null         | Zero                                           |
//!
//! ### Containers
//!
//! Containers start with their tag followed by a 24 bit entry count.
//!
//! - **Array**: `count` type tags, padding to 4 bytes, then `count` value slots.
//! - **Hash**: `count` entries of a 24 bit key index, a type tag and a value slot, sorted by key.
//! - **String table**: `count + 1` offsets relative to the table, then the NUL terminated
//!   strings. String *i* spans from offset *i* to offset *i + 1*.
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.byml`, `.bgyml` and often packed inside SARC archives
//! - **Endianness**: Little-endian for all multi-byte integers
//!
//! ```
//! # fn doit() -> nx_byml::error::Result<()> {
//! use nx_byml::{Hash, Node};
//!
//! let mut root = Hash::new();
//! root.insert("Name", "Bokoblin");
//! root.insert("Life", 13);
//!
//! let bytes = nx_byml::to_bytes(&Node::Hash(root))?;
//! let mut parsed = nx_byml::from_bytes(&bytes)?;
//!
//! parsed.as_hash_mut()?.set_node("Life", Node::Int(20));
//! assert_eq!(parsed.get("Life")?.as_int()?, 20);
//! # Ok(())
//! # }
//! # doit().unwrap();
//! ```
//!

pub mod error;
pub mod node;
pub mod read;
#[cfg(feature = "serde")]
pub mod serde;
pub mod types;
pub mod write;

pub use node::{Array, BigData, Hash, Node};
pub use types::NodeType;

use error::Result;

/// A BYML document
#[derive(Debug, Clone, PartialEq)]
pub struct Byml {
    /// Format version, written back unchanged
    pub version: u16,

    /// The root node: an array, a hash or null
    pub root: Node,
}

impl Byml {
    /// Create a document with the default version
    pub fn new(root: Node) -> Self {
        Byml {
            version: types::DEFAULT_VERSION,
            root,
        }
    }
}

impl Default for Byml {
    fn default() -> Self {
        Byml::new(Node::Null)
    }
}

/// Parse a document and return its root node
pub fn from_bytes(data: &[u8]) -> Result<Node> {
    Ok(Byml::parse(data)?.root)
}

/// Serialize a root node as a version 2 document
pub fn to_bytes(root: &Node) -> Result<Vec<u8>> {
    write::encode(root, types::DEFAULT_VERSION)
}
