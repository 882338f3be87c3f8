//! Endian-aware binary cursors shared by the `nx_sarc` and `nx_byml` codecs.
//!
//! [`BinaryReader`] walks an in-memory buffer with bounds checked reads, alignment and a
//! scoped temporary seek ([`BinaryReader::peek_at`]). [`BinaryWriter`] appends into an owned
//! buffer and supports reserving slots that are back-patched once forward offsets are known.
//!
//! Both sides understand [`binrw`] structures, so fixed headers can be declared with derives
//! and mixed freely with hand-rolled variable-length data.

pub mod error;
pub mod read;
pub mod text;
pub mod write;

pub use binrw::Endian;
pub use read::BinaryReader;
pub use text::TextEncoding;
pub use write::{BinaryWriter, Placeholder};

/// Round `value` up to the next multiple of `alignment`. An alignment of zero is treated as one.
pub fn align_up(value: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}
