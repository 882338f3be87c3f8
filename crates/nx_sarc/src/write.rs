//! Types for writing SARC archives
//!

use bon::Builder;
use indexmap::IndexMap;
use nx_binary::{align_up, BinaryWriter, Endian};
use std::fmt::{self, Debug};
use std::io::Write;
use tracing::{debug, instrument, trace};

use crate::{
    alignment::AlignmentPolicy,
    error::{Error, Result},
    hash::{NameHash, DEFAULT_HASH_KEY},
    read::SarcArchive,
    types::{
        SarcHeader, SfatEntry, SfatHeader, SfntHeader, NAME_FLAG, SARC_HEADER_SIZE,
        SFAT_ENTRY_SIZE, SFAT_HEADER_SIZE, SFNT_HEADER_SIZE,
    },
};

/// Options for how the SARC file should be written
#[derive(Debug, Clone, Builder)]
pub struct SarcWriterOptions {
    /// Multiplier for the name hash, stored in the file table header
    #[builder(default = DEFAULT_HASH_KEY)]
    pub hash_key: u32,

    /// Alignment for each file's data, looked up by extension
    #[builder(default)]
    pub alignment: AlignmentPolicy,
}

impl Default for SarcWriterOptions {
    fn default() -> Self {
        SarcWriterOptions::builder().build()
    }
}

/// How a file is identified in the file table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileName {
    /// A named file, hashed with the archive's key when written
    Named(String),

    /// A file known only by a precomputed hash; no name is stored
    Hashed(u32),
}

impl FileName {
    /// The name, if this file has one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FileName::Named(name) => Some(name),
            FileName::Hashed(_) => None,
        }
    }

    fn hash(&self, hasher: &NameHash) -> u32 {
        match self {
            FileName::Named(name) => hasher.hash(name),
            FileName::Hashed(hash) => *hash,
        }
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileName::Named(name) => f.write_str(name),
            FileName::Hashed(hash) => write!(f, "{:08x}", hash),
        }
    }
}

impl From<&str> for FileName {
    fn from(value: &str) -> Self {
        FileName::Named(value.to_owned())
    }
}

impl From<String> for FileName {
    fn from(value: String) -> Self {
        FileName::Named(value)
    }
}

/// The position of a single file in a built archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    hash: u32,
    name_offset: Option<u32>,
    alignment: u32,
    begin: u32,
    end: u32,
}

/// The full layout of an archive, computed before anything is written
#[derive(Debug, Clone)]
struct Layout<'a> {
    files: Vec<(&'a FileName, &'a [u8], Placement)>,
    data_start: u32,
    file_size: u32,
}

/// SARC archive generator
///
/// Files keep their insertion order, which decides the order of entries whose name hashes
/// collide. Adding a file under an existing name replaces its data in place.
///
/// ```
/// # fn doit() -> nx_sarc::error::Result<()>
/// # {
/// use nx_sarc::alignment::AlignmentPolicy;
/// use nx_sarc::write::SarcWriterOptions;
/// use nx_sarc::{SarcArchive, SarcWriter};
///
/// let mut sarc = SarcWriter::new(
///     SarcWriterOptions::builder()
///         .alignment(AlignmentPolicy::new(4).with("bfres", 0x2000))
///         .build(),
/// );
///
/// sarc.add_file("hello_world.txt", b"Hello, World!".to_vec());
/// sarc.add_file("Model/Link.bfres", vec![0; 16]);
///
/// let built = sarc.build()?;
/// let archive = SarcArchive::new(&built)?;
/// assert_eq!(archive.by_name("hello_world.txt")?.data(), b"Hello, World!");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Clone)]
pub struct SarcWriter {
    options: SarcWriterOptions,
    files: IndexMap<FileKey, Vec<u8>>,
}

/// Unnamed files may share a hash, so each one also carries its occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileKey {
    name: FileName,
    occurrence: usize,
}

impl FileKey {
    fn named(name: &str) -> FileKey {
        FileKey {
            name: FileName::Named(name.to_owned()),
            occurrence: 0,
        }
    }
}

impl Debug for SarcWriter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SarcWriter")
            .field("options", &self.options)
            .field("files", &self.file_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SarcWriter {
    fn default() -> Self {
        SarcWriter::new(SarcWriterOptions::default())
    }
}

impl From<&SarcArchive<'_>> for SarcWriter {
    fn from(archive: &SarcArchive<'_>) -> Self {
        SarcWriter::from_archive(archive, AlignmentPolicy::default())
    }
}

impl SarcWriter {
    /// Create an empty archive
    pub fn new(options: SarcWriterOptions) -> SarcWriter {
        SarcWriter {
            options,
            files: IndexMap::new(),
        }
    }

    /// Copy every file of a parsed archive, keeping its hash key
    ///
    /// Unnamed entries are carried over as [`FileName::Hashed`].
    pub fn from_archive(archive: &SarcArchive<'_>, alignment: AlignmentPolicy) -> SarcWriter {
        let mut writer = SarcWriter::new(
            SarcWriterOptions::builder()
                .hash_key(archive.hash_key())
                .alignment(alignment)
                .build(),
        );
        for file in archive.files() {
            let data = file.data().to_vec();
            match file.name() {
                Some(name) => {
                    writer.add_file(name, data);
                }
                None => writer.add_hashed_file(file.name_hash(), data),
            }
        }
        writer
    }

    /// The options this archive is written with
    pub fn options(&self) -> &SarcWriterOptions {
        &self.options
    }

    /// Mutable access to the options
    pub fn options_mut(&mut self) -> &mut SarcWriterOptions {
        &mut self.options
    }

    /// Number of files in the archive
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the archive has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Names of all files in insertion order
    pub fn file_names(&self) -> impl Iterator<Item = &FileName> {
        self.files.keys().map(|k| &k.name)
    }

    /// All files in insertion order
    pub fn files(&self) -> impl Iterator<Item = (&FileName, &[u8])> {
        self.files.iter().map(|(k, v)| (&k.name, v.as_slice()))
    }

    /// Get the data of a named file
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(&FileKey::named(name)).map(|d| d.as_slice())
    }

    /// Get mutable access to the data of a named file
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.files.get_mut(&FileKey::named(name))
    }

    /// Insert a file, replacing the data of an existing file with the same name in place.
    ///
    /// Returns the previous data when a file was replaced. A [`FileName::Hashed`] name is
    /// always appended as a new file.
    pub fn add_file(&mut self, name: impl Into<FileName>, data: Vec<u8>) -> Option<Vec<u8>> {
        match name.into() {
            FileName::Named(name) => self.files.insert(
                FileKey {
                    name: FileName::Named(name),
                    occurrence: 0,
                },
                data,
            ),
            FileName::Hashed(hash) => {
                self.add_hashed_file(hash, data);
                None
            }
        }
    }

    /// Append a file known only by its hash
    ///
    /// Files sharing a hash are all kept, in the order they were added.
    pub fn add_hashed_file(&mut self, hash: u32, data: Vec<u8>) {
        let name = FileName::Hashed(hash);
        let occurrence = self.files.keys().filter(|k| k.name == name).count();
        self.files.insert(FileKey { name, occurrence }, data);
    }

    /// Replace the data of an existing file. Nothing is inserted when the name is unknown.
    ///
    /// Returns whether a file was replaced.
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> bool {
        match self.get_mut(name) {
            Some(existing) => {
                *existing = data;
                true
            }
            None => false,
        }
    }

    /// Remove a named file, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.shift_remove(&FileKey::named(name))
    }

    /// Serialize the archive
    #[instrument(skip(self), err, fields(files = self.files.len()))]
    pub fn build(&self) -> Result<Vec<u8>> {
        let layout = self.layout()?;
        let mut writer = BinaryWriter::with_capacity(Endian::Little, layout.file_size as usize);

        writer.write_struct(&SarcHeader {
            file_size: layout.file_size,
            data_start: layout.data_start,
            ..Default::default()
        })?;

        writer.write_struct(&SfatHeader {
            file_count: layout.files.len() as u16,
            hash_key: self.options.hash_key,
            ..Default::default()
        })?;
        for (_, _, placement) in &layout.files {
            writer.write_struct(&SfatEntry {
                name_hash: placement.hash,
                name_offset: placement
                    .name_offset
                    .map_or(0, |offset| NAME_FLAG | (offset / 4)),
                data_begin: placement.begin,
                data_end: placement.end,
            })?;
        }

        writer.write_struct(&SfntHeader::default())?;
        for (name, _, _) in &layout.files {
            if let Some(name) = name.as_str() {
                writer.write_bytes(name.as_bytes());
                writer.write_u8(0);
                writer.align(4);
            }
        }

        for (_, data, placement) in &layout.files {
            let target = (layout.data_start + placement.begin) as usize;
            writer.skip(target - writer.position());
            writer.write_bytes(data);
        }
        writer.skip(layout.file_size as usize - writer.position());

        Ok(writer.into_inner())
    }

    /// Serialize the archive into a writer
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(&self.build()?)?;
        Ok(())
    }

    fn layout(&self) -> Result<Layout<'_>> {
        if self.files.len() > u16::MAX as usize {
            return Err(Error::TooManyFiles(self.files.len()));
        }

        let hasher = NameHash::new(self.options.hash_key);
        let mut files = self
            .files
            .iter()
            .map(|(FileKey { name, .. }, data)| {
                let alignment = match name {
                    FileName::Named(n) => self.options.alignment.resolve(n),
                    FileName::Hashed(_) => self.options.alignment.default_alignment(),
                };
                let placement = Placement {
                    hash: name.hash(&hasher),
                    name_offset: None,
                    alignment,
                    begin: 0,
                    end: 0,
                };
                (name, data.as_slice(), placement)
            })
            .collect::<Vec<_>>();

        // Stable, so colliding hashes keep insertion order
        files.sort_by_key(|(_, _, placement)| placement.hash);

        let mut names_size = 0usize;
        for (name, _, placement) in files.iter_mut() {
            if let Some(name) = name.as_str() {
                placement.name_offset = Some(
                    u32::try_from(names_size)
                        .ok()
                        .filter(|offset| offset / 4 <= 0x00FF_FFFF)
                        .ok_or(Error::LayoutOverflow("name table offset"))?,
                );
                names_size += align_up(name.len() + 1, 4);
            }
        }

        let tables_end = SARC_HEADER_SIZE as usize
            + SFAT_HEADER_SIZE as usize
            + SFAT_ENTRY_SIZE as usize * files.len()
            + SFNT_HEADER_SIZE as usize
            + names_size;
        let first_alignment = files
            .first()
            .map_or(1, |(_, _, placement)| placement.alignment);
        let data_start = align_up(tables_end, first_alignment as usize);

        let mut offset = 0usize;
        for (name, data, placement) in files.iter_mut() {
            let begin = align_up(offset, placement.alignment as usize);
            let end = begin + data.len();
            placement.begin = u32::try_from(begin).map_err(|_| Error::LayoutOverflow("file data"))?;
            placement.end = u32::try_from(end).map_err(|_| Error::LayoutOverflow("file data"))?;
            trace!(
                name = %name,
                hash = placement.hash,
                alignment = placement.alignment,
                begin,
                end,
                "placed file"
            );
            offset = end;
        }

        let file_size = u32::try_from(data_start + offset)
            .map_err(|_| Error::LayoutOverflow("archive size"))?;
        debug!(names_size, data_start, file_size, "computed archive layout");

        Ok(Layout {
            files,
            data_start: data_start as u32,
            file_size,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_str_eq;
    use tracing_test::traced_test;

    use crate::alignment::AlignmentPolicy;
    use crate::error::Result;
    use crate::hash::hash_name;
    use crate::read::SarcArchive;
    use crate::write::{FileName, SarcWriter, SarcWriterOptions};

    fn writer(default_alignment: i64) -> SarcWriter {
        SarcWriter::new(
            SarcWriterOptions::builder()
                .alignment(AlignmentPolicy::new(default_alignment))
                .build(),
        )
    }

    #[traced_test]
    #[test]
    fn sarc_empty_write() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x53, 0x41, 0x52, 0x43,
            0x14, 0x00,
            0xFF, 0xFE,
            0x28, 0x00, 0x00, 0x00,
            0x28, 0x00, 0x00, 0x00,
            0x00, 0x01,
            0x00, 0x00,
            // SFAT
            0x53, 0x46, 0x41, 0x54,
            0x0C, 0x00,
            0x00, 0x00,
            0x65, 0x00, 0x00, 0x00,
            // SFNT
            0x53, 0x46, 0x4E, 0x54,
            0x08, 0x00,
            0x00, 0x00,
        ];

        let result = SarcWriter::default().build()?;
        assert_eq!(result.len(), expected.len());
        assert_str_eq!(format!("{:02X?}", result), format!("{:02X?}", expected));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn sarc_single_entry_write() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x53, 0x41, 0x52, 0x43, 0x14, 0x00, 0xFF, 0xFE,
            0x45, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00,
            0x00, 0x01, 0x00, 0x00,
            // SFAT
            0x53, 0x46, 0x41, 0x54, 0x0C, 0x00, 0x01, 0x00,
            0x65, 0x00, 0x00, 0x00,
            // Entries
            0xA7, 0x7A, 0x89, 0x5C, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00,
            // SFNT
            0x53, 0x46, 0x4E, 0x54, 0x08, 0x00, 0x00, 0x00,
            // Names
            0x61, 0x2E, 0x74, 0x78, 0x74, 0x00, 0x00, 0x00,
            // Data
            0x68, 0x65, 0x6C, 0x6C, 0x6F,
        ];

        let mut sarc = writer(0x40);
        sarc.add_file("a.txt", b"hello".to_vec());

        let result = sarc.build()?;
        assert_str_eq!(format!("{:02X?}", result), format!("{:02X?}", expected));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn sarc_entries_sorted_and_aligned() -> Result<()> {
        let mut sarc = SarcWriter::new(
            SarcWriterOptions::builder()
                .alignment(AlignmentPolicy::new(4).with("bfres", 0x100).with("txt", 8))
                .build(),
        );
        sarc.add_file("zeta.txt", vec![1; 3]);
        sarc.add_file("Model/Link.bfres", vec![2; 0x21]);
        sarc.add_file("alpha.bin", vec![3; 7]);
        sarc.add_file("beta.txt", vec![4; 9]);

        let result = sarc.build()?;
        let archive = SarcArchive::new(&result)?;
        assert_eq!(archive.len(), 4);
        assert_eq!(archive.header().file_size as usize, result.len());

        let entries = archive.entries();
        for pair in entries.windows(2) {
            assert!(pair[0].name_hash <= pair[1].name_hash);
            assert!(pair[0].data_end <= pair[1].data_begin);
        }

        let policy = sarc.options().alignment.clone();
        for entry in entries {
            let name = entry.name.as_deref().unwrap();
            assert_eq!(entry.data_begin % policy.resolve(name), 0, "{}", name);
        }

        assert_eq!(
            archive.data_start() % policy.resolve(entries[0].name.as_deref().unwrap()),
            0
        );

        Ok(())
    }

    #[test]
    fn sarc_collisions_keep_insertion_order() -> Result<()> {
        let mut sarc = writer(4);
        sarc.add_hashed_file(0x1234, b"second".to_vec());
        sarc.add_file("x", b"x".to_vec());
        sarc.add_hashed_file(hash_name(0x65, "x"), b"after x".to_vec());

        let result = sarc.build()?;
        let archive = SarcArchive::new(&result)?;
        let order = archive.files().map(|f| f.data()).collect::<Vec<_>>();

        let x_hash = hash_name(0x65, "x");
        let mut expected: Vec<(u32, &[u8])> = vec![
            (0x1234, b"second"),
            (x_hash, b"x"),
            (x_hash, b"after x"),
        ];
        expected.sort_by_key(|(hash, _)| *hash);
        assert_eq!(
            order,
            expected.iter().map(|(_, d)| *d).collect::<Vec<_>>()
        );

        // The named entry is picked among the colliding hashes
        assert_eq!(archive.by_name("x")?.data(), b"x");

        Ok(())
    }

    #[test]
    fn sarc_collisions_keep_reversed_insertion_order() -> Result<()> {
        let x_hash = hash_name(0x65, "x");

        let mut sarc = writer(4);
        sarc.add_hashed_file(x_hash, b"before x".to_vec());
        sarc.add_file("x", b"x".to_vec());

        let result = sarc.build()?;
        let archive = SarcArchive::new(&result)?;
        let order = archive
            .files()
            .map(|f| (f.name(), f.data()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![(None, b"before x".as_slice()), (Some("x"), b"x".as_slice())]
        );
        assert_eq!(archive.by_name("x")?.data(), b"x");

        Ok(())
    }

    #[traced_test]
    #[test]
    fn sarc_unnamed_collisions_survive_rebuild() -> Result<()> {
        let mut sarc = writer(4);
        sarc.add_hashed_file(0x1234, b"AAAA".to_vec());
        sarc.add_hashed_file(0x1234, b"BBBB".to_vec());
        sarc.add_file(FileName::Hashed(0x1234), b"CCCC".to_vec());
        assert_eq!(sarc.len(), 3);

        let built = sarc.build()?;
        let archive = SarcArchive::new(&built)?;
        assert_eq!(archive.len(), 3);

        let rebuilt = SarcWriter::from(&archive);
        assert_eq!(rebuilt.len(), 3);

        let result = rebuilt.build()?;
        let reparsed = SarcArchive::new(&result)?;
        let payloads = reparsed
            .files()
            .map(|f| (f.name_hash(), f.data()))
            .collect::<Vec<_>>();
        assert_eq!(
            payloads,
            vec![
                (0x1234, b"AAAA".as_slice()),
                (0x1234, b"BBBB".as_slice()),
                (0x1234, b"CCCC".as_slice()),
            ]
        );

        Ok(())
    }

    #[test]
    fn sarc_zero_alignment_is_one() -> Result<()> {
        let mut sarc = writer(0);
        sarc.add_file("a", vec![1]);
        sarc.add_file("b", vec![2]);

        let result = sarc.build()?;
        let archive = SarcArchive::new(&result)?;
        assert_eq!(archive.entries()[0].data_begin, 0);
        assert_eq!(archive.entries()[1].data_begin, 1);

        Ok(())
    }

    #[test]
    fn sarc_replace_and_remove() -> Result<()> {
        let mut sarc = writer(4);
        sarc.add_file("a.txt", b"one".to_vec());
        sarc.add_file("b.txt", b"two".to_vec());

        assert!(sarc.replace("a.txt", b"uno".to_vec()));
        assert!(!sarc.replace("c.txt", b"tres".to_vec()));
        assert_eq!(sarc.len(), 2);

        assert_eq!(sarc.add_file("b.txt", b"dos".to_vec()), Some(b"two".to_vec()));
        assert_eq!(
            sarc.file_names().cloned().collect::<Vec<_>>(),
            vec![FileName::from("a.txt"), FileName::from("b.txt")]
        );

        assert_eq!(sarc.remove("a.txt"), Some(b"uno".to_vec()));
        assert_eq!(sarc.get("b.txt"), Some(b"dos".as_slice()));
        assert!(sarc.get("a.txt").is_none());

        Ok(())
    }

    #[test]
    fn sarc_from_archive_round_trip() -> Result<()> {
        let mut sarc = writer(4);
        sarc.add_file("Actor/Pack/ActorObserverByActorTagTag.sbactorpack", vec![9; 40]);
        sarc.add_file("Map/MainField/A-1.smubin", vec![8; 13]);
        sarc.add_hashed_file(0xABCDEF01, vec![7; 3]);

        let first = sarc.build()?;
        let archive = SarcArchive::new(&first)?;
        let rebuilt = SarcWriter::from_archive(&archive, AlignmentPolicy::new(4)).build()?;

        assert_str_eq!(format!("{:02X?}", rebuilt), format!("{:02X?}", first));

        Ok(())
    }
}
