//! Types for writing BYML documents
//!

use nx_binary::{BinaryWriter, Endian, Placeholder, TextEncoding};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

use crate::{
    error::{Error, Result},
    node::Node,
    types::{NodeType, BYML_MAGIC, MAX_VERSION, MIN_VERSION},
    Byml,
};

impl Byml {
    /// Serialize the document
    ///
    /// The layout is the header, the key table, the string table and then every container
    /// depth first, each followed by its children in entry order.
    #[instrument(skip(self), err, fields(version = self.version))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(&self.root, self.version)
    }
}

pub(crate) fn encode(root: &Node, version: u16) -> Result<Vec<u8>> {
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(Error::unsupported(format!("BYML version {}", version)));
    }
    match root {
        Node::Null | Node::Array(_) | Node::Hash(_) => {}
        other => return Err(Error::InvalidRoot(other.node_type())),
    }

    let mut keys = BTreeSet::new();
    let mut strings = BTreeSet::new();
    collect_strings(root, &mut keys, &mut strings);
    let emitter = Emitter {
        keys: keys.into_iter().collect(),
        strings: strings.into_iter().collect(),
    };

    let mut writer = BinaryWriter::new(Endian::Little);
    writer.write_bytes(&BYML_MAGIC);
    writer.write_u16(version);
    let key_table = writer.reserve_u32();
    let string_table = writer.reserve_u32();
    let root_slot = writer.reserve_u32();

    let offset = emitter.write_table(&mut writer, &emitter.keys)?;
    writer.patch_u32(key_table, offset);
    let offset = emitter.write_table(&mut writer, &emitter.strings)?;
    writer.patch_u32(string_table, offset);

    if root.is_null() {
        writer.patch_u32(root_slot, 0);
    } else {
        writer.align(4);
        writer.patch_u32(root_slot, position(&writer)?);
        emitter.write_container(&mut writer, root)?;
    }
    writer.align(4);

    debug!(
        keys = emitter.keys.len(),
        strings = emitter.strings.len(),
        size = writer.position(),
        "wrote document"
    );

    Ok(writer.into_inner())
}

fn collect_strings<'a>(
    node: &'a Node,
    keys: &mut BTreeSet<&'a str>,
    strings: &mut BTreeSet<&'a str>,
) {
    match node {
        Node::String(value) => {
            strings.insert(value);
        }
        Node::Array(items) => {
            for item in items {
                collect_strings(item, keys, strings);
            }
        }
        Node::Hash(hash) => {
            for (key, value) in hash.iter() {
                keys.insert(key);
                collect_strings(value, keys, strings);
            }
        }
        _ => {}
    }
}

fn position(writer: &BinaryWriter) -> Result<u32> {
    to_u32(writer.position())
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::Binary(nx_binary::error::Error::Overflow {
            value: value as u64,
            bits: 32,
        })
    })
}

/// Encoding state shared by every node of one document
struct Emitter<'a> {
    keys: Vec<&'a str>,
    strings: Vec<&'a str>,
}

impl<'n> Emitter<'n> {
    fn key_index(&self, key: &str) -> Result<u32> {
        self.keys
            .binary_search(&key)
            .map(|i| i as u32)
            .map_err(|_| Error::KeyNotFound(key.to_owned()))
    }

    fn string_index(&self, value: &str) -> Result<u32> {
        self.strings
            .binary_search(&value)
            .map(|i| i as u32)
            .map_err(|_| Error::format(format!("string {:?} missing from the table", value)))
    }

    /// Write a shared table, returning its offset or zero when there is nothing to write
    fn write_table(&self, writer: &mut BinaryWriter, strings: &[&str]) -> Result<u32> {
        if strings.is_empty() {
            return Ok(0);
        }
        writer.align(4);
        let offset = position(writer)?;
        write_string_table(writer, strings)?;
        Ok(offset)
    }

    fn write_container(&self, writer: &mut BinaryWriter, node: &'n Node) -> Result<()> {
        let mut children = Vec::new();

        match node {
            Node::Hash(hash) => {
                writer.write_u8(NodeType::Hash as u8);
                writer.write_u24(to_u32(hash.len())?)?;
                for (key, value) in hash.iter() {
                    writer.write_u24(self.key_index(key)?)?;
                    writer.write_u8(value.node_type() as u8);
                    self.write_value(writer, value, &mut children)?;
                }
            }
            Node::Array(items) => {
                writer.write_u8(NodeType::Array as u8);
                writer.write_u24(to_u32(items.len())?)?;
                for item in items {
                    writer.write_u8(item.node_type() as u8);
                }
                writer.align(4);
                for item in items {
                    self.write_value(writer, item, &mut children)?;
                }
            }
            Node::StringTable(strings) => return write_string_table(writer, strings),
            other => {
                return Err(Error::format(format!(
                    "{} is not a container",
                    other.node_type()
                )))
            }
        }

        for (slot, child) in children {
            writer.align(4);
            let offset = position(writer)?;
            writer.patch_u32(slot, offset);
            trace!(node_type = %child.node_type(), offset, "placed child");

            match child {
                Node::Int64(value) => writer.write_i64(**value),
                Node::UInt64(value) => writer.write_u64(**value),
                Node::Double(value) => writer.write_f64(**value),
                container => self.write_container(writer, container)?,
            }
        }

        Ok(())
    }

    /// Write the inline value slot, deferring nodes stored behind an offset
    fn write_value(
        &self,
        writer: &mut BinaryWriter,
        node: &'n Node,
        children: &mut Vec<(Placeholder, &'n Node)>,
    ) -> Result<()> {
        let value = match node {
            Node::Null => 0,
            Node::Bool(value) => *value as u32,
            Node::Int(value) => *value as u32,
            Node::Float(value) => value.to_bits(),
            Node::UInt(value) => *value,
            Node::String(value) => self.string_index(value)?,
            _ => {
                children.push((writer.reserve_u32(), node));
                return Ok(());
            }
        };
        writer.write_u32(value);
        Ok(())
    }
}

fn write_string_table<S: AsRef<str>>(writer: &mut BinaryWriter, strings: &[S]) -> Result<()> {
    writer.write_u8(NodeType::StringTable as u8);
    writer.write_u24(to_u32(strings.len())?)?;

    let mut offset = 4 + 4 * (strings.len() + 1);
    for value in strings {
        writer.write_u32(to_u32(offset)?);
        offset += value.as_ref().len() + 1;
    }
    writer.write_u32(to_u32(offset)?);

    for value in strings {
        writer.write_null_string(value.as_ref(), TextEncoding::Utf8);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use nx_binary::error::Error as BinaryError;
    use pretty_assertions::{assert_eq, assert_str_eq};
    use tracing_test::traced_test;

    use crate::{
        error::{Error, Result},
        node::{BigData, Hash, Node},
        types::NodeType,
        Byml,
    };

    #[traced_test]
    #[test]
    fn write_small_hash() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x59, 0x42, 0x02, 0x00, 0x10, 0x00, 0x00, 0x00,
            0x24, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00, 0x00,
            // Keys
            0xC2, 0x02, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
            0x12, 0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00,
            0x61, 0x00, 0x62, 0x00,
            // Strings
            0xC2, 0x01, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00,
            0x0F, 0x00, 0x00, 0x00, 0x68, 0x69, 0x00, 0x00,
            // Root
            0xC1, 0x02, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xD1, 0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0xA0, 0x00, 0x00, 0x00, 0x00,
        ];

        let root: Hash = [("b", Node::from("hi")), ("a", Node::Int(1))]
            .into_iter()
            .collect();
        let result = Byml::new(Node::Hash(root)).to_bytes()?;
        assert_str_eq!(format!("{:02X?}", result), format!("{:02X?}", expected));

        Ok(())
    }

    #[test]
    fn write_null_root() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x59, 0x42, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let result = Byml {
            version: 3,
            root: Node::Null,
        }
        .to_bytes()?;
        assert_eq!(result, expected);

        Ok(())
    }

    #[test]
    fn write_children_depth_first() -> Result<()> {
        // [[1], 2u64, [3]] puts the first child array before the u64 and the second array
        let root = Node::Array(vec![
            Node::Array(vec![Node::Int(1)]),
            Node::from(2u64),
            Node::Array(vec![Node::Int(3)]),
        ]);
        let result = crate::to_bytes(&root)?;

        #[rustfmt::skip]
        let expected = vec![
            // Header, no tables
            0x59, 0x42, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
            // Root array
            0xC0, 0x03, 0x00, 0x00, 0xC0, 0xD5, 0xC0, 0x00,
            0x24, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00, 0x00,
            0x38, 0x00, 0x00, 0x00,
            // [1]
            0xC0, 0x01, 0x00, 0x00, 0xD1, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            // 2u64
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // [3]
            0xC0, 0x01, 0x00, 0x00, 0xD1, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00,
        ];

        assert_str_eq!(format!("{:02X?}", result), format!("{:02X?}", expected));
        assert_eq!(crate::from_bytes(&result)?, root);

        Ok(())
    }

    #[test]
    fn write_scalar_root_is_invalid() {
        assert!(matches!(
            crate::to_bytes(&Node::Int(1)),
            Err(Error::InvalidRoot(NodeType::Int))
        ));
        assert!(matches!(
            crate::to_bytes(&Node::StringTable(vec![])),
            Err(Error::InvalidRoot(NodeType::StringTable))
        ));
    }

    #[test]
    fn write_unsupported_version() {
        let byml = Byml {
            version: 7,
            root: Node::Hash(Hash::new()),
        };
        assert!(matches!(
            byml.to_bytes(),
            Err(Error::Binary(BinaryError::UnsupportedFeature(_)))
        ));
    }

    #[test]
    fn write_big_data_round_trip() -> Result<()> {
        let root: Hash = [
            ("Double", Node::Double(BigData::new(-0.25))),
            ("Int64", Node::from(i64::MIN)),
            ("UInt64", Node::from(u64::MAX)),
            ("After", Node::Int(9)),
        ]
        .into_iter()
        .collect();
        let root = Node::Hash(root);

        let parsed = crate::from_bytes(&crate::to_bytes(&root)?)?;
        assert_eq!(parsed, root);
        assert_eq!(parsed.get("UInt64")?.as_uint64()?, u64::MAX);

        Ok(())
    }
}
