//! Types for reading SARC archives
//!

use nx_binary::{BinaryReader, Endian, TextEncoding};
use std::fmt::{self, Debug};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, FileNotFoundError, Result},
    hash::NameHash,
    types::{
        ByteOrderMark, SarcHeader, SfatEntry, SfatHeader, SfntHeader, SARC_HEADER_SIZE,
        SFAT_HEADER_SIZE, SFNT_HEADER_SIZE,
    },
};

/// A parsed file table entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    /// Hash of the name, as stored in the file table
    pub name_hash: u32,
    /// Name of the file, when the archive stores names
    pub name: Option<Box<str>>,
    /// Start of the data relative to the data section
    pub data_begin: u32,
    /// End of the data relative to the data section
    pub data_end: u32,
    /// Largest power of two the absolute data offset is a multiple of, capped at the
    /// alignment of the data section itself
    pub alignment: u32,
}

impl FileEntry {
    /// Size of the data in bytes
    pub fn size(&self) -> u32 {
        self.data_end.saturating_sub(self.data_begin)
    }
}

/// A borrowed view of a single file inside a [`SarcArchive`]
#[derive(Clone, Copy)]
pub struct SarcFile<'a> {
    entry: &'a FileEntry,
    data: &'a [u8],
}

impl Debug for SarcFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SarcFile({:#?})", self.entry)
    }
}

impl<'a> SarcFile<'a> {
    /// Get the name of the file, when the archive stores names
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). Carelessly writing to these paths
    /// allows an attacker to craft an archive that will overwrite critical
    /// files.
    ///
    pub fn name(&self) -> Option<&'a str> {
        self.entry.name.as_deref()
    }

    /// Get the stored hash of the name
    pub fn name_hash(&self) -> u32 {
        self.entry.name_hash
    }

    /// Get the contents of the file
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get the size of the file, in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the full table entry
    pub fn entry(&self) -> &'a FileEntry {
        self.entry
    }
}

/// SARC archive reader
///
/// Parsing validates every section header and slices each payload out of the input; the
/// archive keeps borrowing the input for the lifetime of the view.
///
/// ```no_run
/// fn list_sarc_contents(data: &[u8]) -> nx_sarc::error::Result<()> {
///     let sarc = nx_sarc::SarcArchive::new(data)?;
///
///     for file in sarc.files() {
///         println!("{:?}: {} bytes", file.name(), file.size());
///     }
///
///     Ok(())
/// }
/// ```
pub struct SarcArchive<'a> {
    data: &'a [u8],
    header: SarcHeader,
    hash_key: u32,
    entries: Vec<FileEntry>,
}

impl Debug for SarcArchive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SarcArchive")
            .field("header", &self.header)
            .field("hash_key", &self.hash_key)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<'a> SarcArchive<'a> {
    /// Parse a SARC archive from its raw bytes.
    #[instrument(skip_all, err, fields(size = data.len()))]
    pub fn new(data: &'a [u8]) -> Result<SarcArchive<'a>> {
        let mut reader = BinaryReader::new(data, Endian::Little);

        let header: SarcHeader = reader.read_struct()?;
        match ByteOrderMark::from_value(header.byte_order) {
            Some(ByteOrderMark::Little) => {}
            Some(ByteOrderMark::Big) => {
                return Err(Error::unsupported("big endian SARC archives"));
            }
            None => {
                return Err(Error::format(format!(
                    "invalid byte order mark {:#06x}",
                    header.byte_order
                )));
            }
        }
        if header.header_size != SARC_HEADER_SIZE {
            return Err(Error::format(format!(
                "unexpected SARC header size {:#x}",
                header.header_size
            )));
        }
        if header.file_size as usize != data.len() {
            warn!(
                declared = header.file_size,
                actual = data.len(),
                "archive size does not match header"
            );
        }

        reader.seek(header.header_size as usize)?;
        let sfat: SfatHeader = reader.read_struct()?;
        if sfat.header_size != SFAT_HEADER_SIZE {
            return Err(Error::format(format!(
                "unexpected SFAT header size {:#x}",
                sfat.header_size
            )));
        }

        let records = (0..sfat.file_count)
            .map(|_| reader.read_struct::<SfatEntry>())
            .collect::<nx_binary::error::Result<Vec<_>>>()?;

        let sfnt: SfntHeader = reader.read_struct()?;
        if sfnt.header_size != SFNT_HEADER_SIZE {
            return Err(Error::format(format!(
                "unexpected SFNT header size {:#x}",
                sfnt.header_size
            )));
        }

        let data_start = header.data_start as usize;
        let names_start = reader.position();
        if data_start < names_start || data_start > data.len() {
            return Err(Error::format(format!(
                "data section start {:#x} is outside the archive",
                data_start
            )));
        }
        debug!(
            files = sfat.file_count,
            hash_key = sfat.hash_key,
            names_start,
            data_start,
            "read archive tables"
        );

        let mut names = BinaryReader::new(
            reader.slice(names_start, data_start - names_start)?,
            Endian::Little,
        );

        let entries = records
            .iter()
            .map(|record| -> Result<FileEntry> {
                let name = match record.name_table_offset() {
                    Some(offset) => Some(
                        names
                            .peek_at(offset, |r| r.read_null_string(TextEncoding::Utf8))?
                            .into_boxed_str(),
                    ),
                    None => None,
                };

                if record.data_end < record.data_begin {
                    return Err(Error::format(format!(
                        "file data ends at {:#x} before it begins at {:#x}",
                        record.data_end, record.data_begin
                    )));
                }

                let absolute = data_start as u64 + record.data_begin as u64;
                reader.slice(
                    absolute as usize,
                    (record.data_end - record.data_begin) as usize,
                )?;

                Ok(FileEntry {
                    name_hash: record.name_hash,
                    name,
                    data_begin: record.data_begin,
                    data_end: record.data_end,
                    alignment: inferred_alignment(absolute)
                        .min(inferred_alignment(data_start as u64)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SarcArchive {
            data,
            header,
            hash_key: sfat.hash_key,
            entries,
        })
    }

    /// Number of entries contained in this archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Multiplier used to hash the names in this archive
    pub fn hash_key(&self) -> u32 {
        self.hash_key
    }

    /// Absolute offset of the data section
    pub fn data_start(&self) -> u32 {
        self.header.data_start
    }

    /// The parsed archive header
    pub fn header(&self) -> &SarcHeader {
        &self.header
    }

    /// The parsed file table, sorted by name hash
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Returns an iterator over all files, in file table order
    pub fn files(&self) -> impl Iterator<Item = SarcFile<'_>> {
        self.entries.iter().map(|entry| self.view(entry))
    }

    /// Returns an iterator over the names of all named files
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.name.as_deref())
    }

    /// Get a contained file by index
    pub fn by_index(&self, index: usize) -> Result<SarcFile<'_>> {
        self.entries
            .get(index)
            .map(|entry| self.view(entry))
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(index)))
    }

    /// Get a file whose stored hash equals `hash`
    ///
    /// Archives may contain several files with the same hash; which one is returned is
    /// unspecified. Use [`SarcArchive::by_name`] to pick a specific one.
    pub fn by_hash(&self, hash: u32) -> Result<SarcFile<'_>> {
        self.entries
            .binary_search_by_key(&hash, |e| e.name_hash)
            .map(|index| self.view(&self.entries[index]))
            .map_err(|_| Error::FileNotFound(FileNotFoundError::Hash(hash)))
    }

    /// Search for a file by name
    ///
    /// The name is hashed with the archive's key and binary searched; among entries sharing
    /// that hash the one with a matching name wins. An unnamed entry with the right hash is
    /// only returned when no named entry matches.
    pub fn by_name(&self, name: &str) -> Result<SarcFile<'_>> {
        let hash = NameHash::new(self.hash_key).hash(name);
        let not_found = || Error::FileNotFound(FileNotFoundError::Name(name.to_owned()));

        let found = self
            .entries
            .binary_search_by_key(&hash, |e| e.name_hash)
            .map_err(|_| not_found())?;

        let first = self.entries[..found]
            .iter()
            .rposition(|e| e.name_hash != hash)
            .map_or(0, |i| i + 1);
        let candidates = self.entries[first..]
            .iter()
            .take_while(|e| e.name_hash == hash);

        let mut unnamed = None;
        for entry in candidates {
            match entry.name.as_deref() {
                Some(n) if n == name => return Ok(self.view(entry)),
                None if unnamed.is_none() => unnamed = Some(entry),
                _ => {}
            }
        }

        unnamed.map(|entry| self.view(entry)).ok_or_else(not_found)
    }

    /// Get the index of a file entry by name, if it's present.
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        let file = self.by_name(name).ok()?;
        self.entries
            .iter()
            .position(|e| std::ptr::eq(e, file.entry()))
    }

    fn view<'s>(&'s self, entry: &'s FileEntry) -> SarcFile<'s> {
        let start = self.header.data_start as usize + entry.data_begin as usize;
        let end = self.header.data_start as usize + entry.data_end as usize;
        SarcFile {
            entry,
            data: &self.data[start..end],
        }
    }
}

fn inferred_alignment(offset: u64) -> u32 {
    if offset == 0 {
        return 1;
    }
    1u32 << offset.trailing_zeros().min(31)
}
