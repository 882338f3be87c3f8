//! File name hashing used by the SARC file table.

/// Multiplier used by every retail archive unless the file table says otherwise
pub const DEFAULT_HASH_KEY: u32 = 0x65;

/// Polynomial rolling hash over the bytes of a file name
///
/// `hash = 0; for each byte: hash = hash * multiplier + byte`, all in wrapping 32 bit
/// arithmetic. The engine keeps its own table with the same evaluation order, so any change
/// here makes rebuilt archives unloadable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NameHash {
    multiplier: u32,
}

impl NameHash {
    /// Create a hasher with the archive's multiplier
    pub const fn new(multiplier: u32) -> Self {
        NameHash { multiplier }
    }

    /// The multiplier stored in the file table header
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Hash a name
    pub fn hash(&self, name: impl AsRef<[u8]>) -> u32 {
        name.as_ref().iter().fold(0u32, |hash, byte| {
            hash.wrapping_mul(self.multiplier)
                .wrapping_add(*byte as u32)
        })
    }
}

impl Default for NameHash {
    fn default() -> Self {
        NameHash::new(DEFAULT_HASH_KEY)
    }
}

/// Hash `name` with the given multiplier
pub fn hash_name(multiplier: u32, name: &str) -> u32 {
    NameHash::new(multiplier).hash(name)
}
