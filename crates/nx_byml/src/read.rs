//! Types for reading BYML documents
//!

use nx_binary::{BinaryReader, Endian, TextEncoding};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    node::{BigData, Hash, Node},
    types::{BymlHeader, NodeType, BYML_BIG_ENDIAN_MAGIC, MAX_DEPTH, MAX_VERSION, MIN_VERSION},
    Byml,
};

impl Byml {
    /// Parse a BYML document from its raw bytes.
    ///
    /// ```
    /// # fn doit() -> nx_byml::error::Result<()> {
    /// use nx_byml::{Byml, Node};
    ///
    /// let original = Byml::new(Node::Array(vec![Node::Int(7), Node::from("seven")]));
    /// let parsed = Byml::parse(&original.to_bytes()?)?;
    /// assert_eq!(parsed.root.as_array()?[1].as_str()?, "seven");
    /// # Ok(())
    /// # }
    /// # doit().unwrap();
    /// ```
    #[instrument(skip_all, err, fields(size = data.len()))]
    pub fn parse(data: &[u8]) -> Result<Byml> {
        let mut reader = BinaryReader::new(data, Endian::Little);

        let magic = reader.peek_at(0, |r| r.read_array::<2>())?;
        if magic == BYML_BIG_ENDIAN_MAGIC {
            return Err(Error::unsupported("big endian BYML documents"));
        }

        let header: BymlHeader = reader.read_struct()?;
        if !(MIN_VERSION..=MAX_VERSION).contains(&header.version) {
            return Err(Error::unsupported(format!(
                "BYML version {}",
                header.version
            )));
        }

        let parser = Parser {
            keys: read_string_table(&mut reader, header.key_table_offset)?,
            strings: read_string_table(&mut reader, header.string_table_offset)?,
        };
        debug!(
            version = header.version,
            keys = parser.keys.len(),
            strings = parser.strings.len(),
            root = header.root_offset,
            "read document tables"
        );

        let root = match header.root_offset {
            0 => Node::Null,
            offset => {
                let tag = reader.peek_at(offset as usize, |r| r.read_u8())?;
                match NodeType::try_from(tag)? {
                    NodeType::Array | NodeType::Hash => {
                        parser.read_container(&mut reader, offset, 0)?
                    }
                    other => return Err(Error::InvalidRoot(other)),
                }
            }
        };

        Ok(Byml {
            version: header.version,
            root,
        })
    }
}

/// Read a string table node at `offset`; an offset of zero is an empty table.
fn read_string_table(reader: &mut BinaryReader<'_>, offset: u32) -> Result<Vec<String>> {
    if offset == 0 {
        return Ok(Vec::new());
    }

    let start = offset as usize;
    reader.peek_at(start, |r| -> Result<Vec<String>> {
        let tag = r.read_u8()?;
        if tag != NodeType::StringTable as u8 {
            return Err(Error::format(format!(
                "expected a string table at {:#x}, found tag {:#04x}",
                start, tag
            )));
        }

        let count = r.read_u24()? as usize;
        let offsets = (0..=count)
            .map(|_| r.read_u32())
            .collect::<nx_binary::error::Result<Vec<_>>>()?;

        offsets
            .windows(2)
            .map(|pair| -> Result<String> {
                let (begin, end) = (pair[0] as usize, pair[1] as usize);
                if end < begin {
                    return Err(Error::format(format!(
                        "string table at {:#x} has decreasing offsets",
                        start
                    )));
                }
                Ok(r.peek_at(start + begin, |r| {
                    r.read_fixed_string(end - begin, TextEncoding::Utf8)
                })?)
            })
            .collect()
    })
}

/// Decoding state shared by every node of one document
struct Parser {
    keys: Vec<String>,
    strings: Vec<String>,
}

impl Parser {
    fn key(&self, index: u32) -> Result<String> {
        self.keys
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::format(format!("hash key index {} is out of range", index)))
    }

    fn string(&self, index: u32) -> Result<String> {
        self.strings
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::format(format!("string index {} is out of range", index)))
    }

    fn read_container(
        &self,
        reader: &mut BinaryReader<'_>,
        offset: u32,
        depth: usize,
    ) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(Error::format(format!(
                "container at {:#x} is nested deeper than {} levels",
                offset, MAX_DEPTH
            )));
        }

        reader.peek_at(offset as usize, |r| -> Result<Node> {
            let node_type = NodeType::try_from(r.read_u8()?)?;
            let count = r.read_u24()? as usize;
            match node_type {
                NodeType::Hash => self.read_hash(r, offset, count, depth),
                NodeType::Array => self.read_array(r, count, depth),
                other => Err(Error::format(format!(
                    "expected a container at {:#x}, found {}",
                    offset, other
                ))),
            }
        })
    }

    fn read_hash(
        &self,
        reader: &mut BinaryReader<'_>,
        offset: u32,
        count: usize,
        depth: usize,
    ) -> Result<Node> {
        let mut entries = Vec::new();
        for _ in 0..count {
            let key = self.key(reader.read_u24()?)?;
            let node_type = NodeType::try_from(reader.read_u8()?)?;
            let value = reader.read_u32()?;
            entries.push((key, self.read_value(reader, node_type, value, depth)?));
        }

        if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            warn!(offset, "hash entries are not sorted by key");
        }

        Ok(Node::Hash(Hash::from_stored(entries)))
    }

    fn read_array(
        &self,
        reader: &mut BinaryReader<'_>,
        count: usize,
        depth: usize,
    ) -> Result<Node> {
        let types = reader
            .read_bytes(count)?
            .iter()
            .map(|tag| NodeType::try_from(*tag))
            .collect::<nx_binary::error::Result<Vec<_>>>()?;
        reader.align(4)?;

        let mut items = Vec::with_capacity(types.len());
        for node_type in types {
            let value = reader.read_u32()?;
            items.push(self.read_value(reader, node_type, value, depth)?);
        }

        Ok(Node::Array(items))
    }

    fn read_value(
        &self,
        reader: &mut BinaryReader<'_>,
        node_type: NodeType,
        value: u32,
        depth: usize,
    ) -> Result<Node> {
        Ok(match node_type {
            NodeType::Null => Node::Null,
            NodeType::Bool => Node::Bool(value != 0),
            NodeType::Int => Node::Int(value as i32),
            NodeType::Float => Node::Float(f32::from_bits(value)),
            NodeType::UInt => Node::UInt(value),
            NodeType::String => Node::String(self.string(value)?),
            NodeType::Int64 => {
                Node::Int64(BigData::new(reader.peek_at(value as usize, |r| r.read_i64())?))
            }
            NodeType::UInt64 => {
                Node::UInt64(BigData::new(reader.peek_at(value as usize, |r| r.read_u64())?))
            }
            NodeType::Double => {
                Node::Double(BigData::new(reader.peek_at(value as usize, |r| r.read_f64())?))
            }
            NodeType::Array | NodeType::Hash => self.read_container(reader, value, depth + 1)?,
            NodeType::StringTable => Node::StringTable(read_string_table(reader, value)?),
        })
    }
}
