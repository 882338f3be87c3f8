//! In-memory node tree of a BYML document

use derive_more::derive::{Constructor, Deref, DerefMut, From};
use std::slice;

use crate::{
    error::{Error, Result},
    types::NodeType,
};

/// An 8 byte value stored out of line, behind an offset in its parent container
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, Constructor, Deref, DerefMut)]
pub struct BigData<T>(T);

impl<T> BigData<T> {
    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Ordered list of nodes
pub type Array = Vec<Node>;

/// A single node of the tree
///
/// Strings are owned by the node. On disk they are indices into the document's string table,
/// which is recomputed when the tree is written.
#[derive(Debug, Default, Clone, PartialEq, From)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Float(f32),
    UInt(u32),
    Int64(BigData<i64>),
    UInt64(BigData<u64>),
    Double(BigData<f64>),
    String(String),
    Array(Array),
    Hash(Hash),
    StringTable(Vec<String>),
}

macro_rules! scalar_accessors {
    ($($(#[$doc:meta])* $name:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<$ty> {
                match self {
                    Node::$variant(value) => Ok(*value),
                    other => Err(other.mismatch(NodeType::$variant)),
                }
            }
        )*
    };
}

macro_rules! big_data_accessors {
    ($($(#[$doc:meta])* $name:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<$ty> {
                match self {
                    Node::$variant(value) => Ok(**value),
                    other => Err(other.mismatch(NodeType::$variant)),
                }
            }
        )*
    };
}

macro_rules! ref_accessors {
    ($($(#[$doc:meta])* $name:ident, $name_mut:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<&$ty> {
                match self {
                    Node::$variant(value) => Ok(value),
                    other => Err(other.mismatch(NodeType::$variant)),
                }
            }

            $(#[$doc])*
            pub fn $name_mut(&mut self) -> Result<&mut $ty> {
                match self {
                    Node::$variant(value) => Ok(value),
                    other => Err(other.mismatch(NodeType::$variant)),
                }
            }
        )*
    };
}

impl Node {
    /// The tag this node is written with
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Null => NodeType::Null,
            Node::Bool(_) => NodeType::Bool,
            Node::Int(_) => NodeType::Int,
            Node::Float(_) => NodeType::Float,
            Node::UInt(_) => NodeType::UInt,
            Node::Int64(_) => NodeType::Int64,
            Node::UInt64(_) => NodeType::UInt64,
            Node::Double(_) => NodeType::Double,
            Node::String(_) => NodeType::String,
            Node::Array(_) => NodeType::Array,
            Node::Hash(_) => NodeType::Hash,
            Node::StringTable(_) => NodeType::StringTable,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    fn mismatch(&self, expected: NodeType) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.node_type(),
        }
    }

    scalar_accessors! {
        as_bool => Bool, bool;
        as_int => Int, i32;
        as_float => Float, f32;
        as_uint => UInt, u32;
    }

    big_data_accessors! {
        as_int64 => Int64, i64;
        as_uint64 => UInt64, u64;
        as_double => Double, f64;
    }

    ref_accessors! {
        /// Access an array node
        as_array, as_array_mut => Array, Array;
        /// Access a hash node
        as_hash, as_hash_mut => Hash, Hash;
        /// Access a string table node
        as_string_table, as_string_table_mut => StringTable, Vec<String>;
        /// Access a string node
        as_string, as_string_mut => String, String;
    }

    /// Borrow a string node
    pub fn as_str(&self) -> Result<&str> {
        self.as_string().map(String::as_str)
    }

    /// Look up a key of a hash node
    pub fn get(&self, key: &str) -> Result<&Node> {
        self.as_hash()?.try_get(key)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_owned())
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Int64(BigData::new(value))
    }
}

impl From<u64> for Node {
    fn from(value: u64) -> Self {
        Node::UInt64(BigData::new(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Double(BigData::new(value))
    }
}

macro_rules! try_from_node {
    ($($ty:ty => $accessor:ident;)*) => {
        $(
            impl TryFrom<&Node> for $ty {
                type Error = Error;

                fn try_from(node: &Node) -> Result<Self> {
                    node.$accessor()
                }
            }
        )*
    };
}

try_from_node! {
    bool => as_bool;
    i32 => as_int;
    f32 => as_float;
    u32 => as_uint;
    i64 => as_int64;
    u64 => as_uint64;
    f64 => as_double;
}

impl TryFrom<Node> for String {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        match node {
            Node::String(value) => Ok(value),
            other => Err(other.mismatch(NodeType::String)),
        }
    }
}

impl TryFrom<Node> for Array {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        match node {
            Node::Array(value) => Ok(value),
            other => Err(other.mismatch(NodeType::Array)),
        }
    }
}

impl TryFrom<Node> for Hash {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        match node {
            Node::Hash(value) => Ok(value),
            other => Err(other.mismatch(NodeType::Hash)),
        }
    }
}

/// Map from string keys to nodes, kept sorted by key bytes
///
/// ```
/// use nx_byml::{Hash, Node};
///
/// let mut hash = Hash::new();
/// hash.insert("Speed", 1.5f32);
/// hash.insert("Name", "Lizalfos");
///
/// assert_eq!(hash.keys().collect::<Vec<_>>(), vec!["Name", "Speed"]);
///
/// // Only existing keys can be set
/// assert!(!hash.set_node("Health", Node::Int(8)));
/// assert!(hash.set_node("Speed", Node::Float(2.0)));
/// assert_eq!(hash.len(), 2);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Hash {
    entries: Vec<(String, Node)>,
}

impl Hash {
    pub fn new() -> Self {
        Hash::default()
    }

    /// Build from entries in the order they were stored, without sorting
    pub(crate) fn from_stored(entries: Vec<(String, Node)>) -> Self {
        Hash { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> core::result::Result<usize, usize> {
        self.entries
            .binary_search_by(|(existing, _)| existing.as_str().cmp(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.position(key).ok().map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.position(key).ok().map(|i| &mut self.entries[i].1)
    }

    /// Like [`Hash::get`], failing with [`Error::KeyNotFound`]
    pub fn try_get(&self, key: &str) -> Result<&Node> {
        self.get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        let key = key.into();
        match self.position(&key) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, value.into())),
            Err(i) => {
                self.entries.insert(i, (key, value.into()));
                None
            }
        }
    }

    /// Replace the value of an existing key.
    ///
    /// A missing key is left missing and `false` is returned; use [`Hash::insert`] to add keys.
    pub fn set_node(&mut self, key: &str, value: Node) -> bool {
        match self.get_mut(key) {
            Some(existing) => {
                *existing = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.position(key)
            .ok()
            .map(|i| self.entries.remove(i).1)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Hash {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut hash = Hash::new();
        for (key, value) in iter {
            hash.insert(key, value);
        }
        hash
    }
}

impl IntoIterator for Hash {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Hash {
    type Item = &'a (String, Node);
    type IntoIter = slice::Iter<'a, (String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
