//! Types for writing binary data
//!

use binrw::{BinWrite, Endian};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::Cursor;

use crate::{
    align_up,
    error::{Error, Result},
    text::TextEncoding,
};

macro_rules! write_primitive {
    ($($(#[$doc:meta])* $name:ident => $ty:ty, $size:literal, $conv:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: $ty) {
                let mut bytes = [0u8; $size];
                match self.endian {
                    Endian::Little => LittleEndian::$conv(&mut bytes, value),
                    Endian::Big => BigEndian::$conv(&mut bytes, value),
                }
                self.buffer.extend_from_slice(&bytes);
            }
        )*
    };
}

/// A reserved 32 bit slot in a [`BinaryWriter`] waiting to be back-patched
///
/// Offsets that point forward are not known when the referencing structure is written. The
/// slot is reserved first, the rest of the data is serialized, and the slot is filled in once
/// the target position is known.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use = "a reserved slot should be patched"]
pub struct Placeholder(usize);

impl Placeholder {
    /// The absolute position of the reserved slot
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Append-only writer into an owned byte buffer
///
/// Everything is appended at the end; previously written bytes are only touched through
/// [`BinaryWriter::patch_u32`] and friends, so nothing ever seeks backwards mid-stream.
///
/// ```
/// use nx_binary::{BinaryWriter, Endian};
///
/// let mut writer = BinaryWriter::new(Endian::Little);
/// let slot = writer.reserve_u32();
/// writer.write_u16(0xBEEF);
/// writer.align(4);
/// writer.patch_u32(slot, writer.position() as u32);
/// assert_eq!(writer.into_inner(), vec![0x08, 0, 0, 0, 0xEF, 0xBE, 0, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
    endian: Endian,
    filler: u8,
}

impl BinaryWriter {
    /// Create an empty writer
    pub fn new(endian: Endian) -> Self {
        Self::with_capacity(endian, 0)
    }

    /// Create an empty writer with room for `capacity` bytes
    pub fn with_capacity(endian: Endian, capacity: usize) -> Self {
        BinaryWriter {
            buffer: Vec::with_capacity(capacity),
            endian,
            filler: 0,
        }
    }

    /// The byte order used for multi-byte values
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Byte used to pad when aligning, `0x00` by default
    pub fn set_filler(&mut self, filler: u8) {
        self.filler = filler;
    }

    /// Current absolute position, which is always the end of the buffer
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes written so far
    pub fn get_ref(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Append `count` filler bytes
    pub fn skip(&mut self, count: usize) {
        self.buffer
            .resize(self.buffer.len() + count, self.filler);
    }

    /// Pad with filler bytes up to the next multiple of `alignment`. Zero is treated as one.
    pub fn align(&mut self, alignment: usize) {
        let target = align_up(self.buffer.len(), alignment);
        self.buffer.resize(target, self.filler);
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a single byte
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Append a single signed byte
    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    /// Append a bool as a single byte
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(value as u8);
    }

    write_primitive! {
        /// Append a 16 bit unsigned integer
        write_u16 => u16, 2, write_u16;
        /// Append a 16 bit signed integer
        write_i16 => i16, 2, write_i16;
        /// Append a 32 bit unsigned integer
        write_u32 => u32, 4, write_u32;
        /// Append a 32 bit signed integer
        write_i32 => i32, 4, write_i32;
        /// Append a 64 bit unsigned integer
        write_u64 => u64, 8, write_u64;
        /// Append a 64 bit signed integer
        write_i64 => i64, 8, write_i64;
        /// Append a 32 bit float
        write_f32 => f32, 4, write_f32;
        /// Append a 64 bit float
        write_f64 => f64, 8, write_f64;
    }

    /// Append a 24 bit unsigned integer
    pub fn write_u24(&mut self, value: u32) -> Result<()> {
        if value > 0x00FF_FFFF {
            return Err(Error::Overflow {
                value: value as u64,
                bits: 24,
            });
        }
        let mut bytes = [0u8; 3];
        match self.endian {
            Endian::Little => LittleEndian::write_u24(&mut bytes, value),
            Endian::Big => BigEndian::write_u24(&mut bytes, value),
        }
        self.buffer.extend_from_slice(&bytes);
        Ok(())
    }

    /// Append a string followed by a NUL terminator in the given encoding
    pub fn write_null_string(&mut self, text: &str, encoding: TextEncoding) {
        let bytes = encoding.encode(text, self.endian);
        self.buffer.extend_from_slice(&bytes);
        self.skip_zeroes(encoding.unit_size());
    }

    /// Append a string padded or truncated to exactly `length` bytes
    pub fn write_fixed_string(&mut self, text: &str, length: usize, encoding: TextEncoding) {
        let mut bytes = encoding.encode(text, self.endian);
        bytes.resize(length, 0);
        self.buffer.extend_from_slice(&bytes);
    }

    /// Append a [`binrw`] structure with this writer's endianness
    pub fn write_struct<T>(&mut self, value: &T) -> Result<()>
    where
        T: BinWrite,
        for<'b> T::Args<'b>: Default,
    {
        let mut cursor = Cursor::new(&mut self.buffer);
        cursor.set_position(cursor.get_ref().len() as u64);
        value.write_options(&mut cursor, self.endian, Default::default())?;
        Ok(())
    }

    /// Reserve a 32 bit slot to be patched later
    pub fn reserve_u32(&mut self) -> Placeholder {
        let slot = Placeholder(self.buffer.len());
        self.skip_zeroes(4);
        slot
    }

    /// Fill in a slot previously returned by [`BinaryWriter::reserve_u32`]
    pub fn patch_u32(&mut self, slot: Placeholder, value: u32) {
        let bytes = &mut self.buffer[slot.0..slot.0 + 4];
        match self.endian {
            Endian::Little => LittleEndian::write_u32(bytes, value),
            Endian::Big => BigEndian::write_u32(bytes, value),
        }
    }

    /// Overwrite a 16 bit value at an absolute position that was already written
    pub fn patch_u16_at(&mut self, position: usize, value: u16) -> Result<()> {
        let endian = self.endian;
        let bytes = self.patch_range(position, 2)?;
        match endian {
            Endian::Little => LittleEndian::write_u16(bytes, value),
            Endian::Big => BigEndian::write_u16(bytes, value),
        }
        Ok(())
    }

    /// Overwrite a 32 bit value at an absolute position that was already written
    pub fn patch_u32_at(&mut self, position: usize, value: u32) -> Result<()> {
        let endian = self.endian;
        let bytes = self.patch_range(position, 4)?;
        match endian {
            Endian::Little => LittleEndian::write_u32(bytes, value),
            Endian::Big => BigEndian::write_u32(bytes, value),
        }
        Ok(())
    }

    fn patch_range(&mut self, position: usize, length: usize) -> Result<&mut [u8]> {
        let size = self.buffer.len() as u64;
        self.buffer
            .get_mut(position..position + length)
            .ok_or(Error::Bounds {
                offset: position as u64,
                length: length as u64,
                size,
            })
    }

    fn skip_zeroes(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }
}

#[cfg(test)]
mod test {
    use binrw::{BinWrite, Endian};
    use pretty_assertions::assert_eq;

    use crate::{error::Result, text::TextEncoding, write::BinaryWriter};

    #[derive(BinWrite)]
    #[bw(magic = b"TEST", little)]
    struct Header {
        size: u16,
        flags: u16,
    }

    #[test]
    fn write_primitives_little() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x01,
            0x02, 0x01,
            0x03, 0x02, 0x01,
            0x04, 0x03, 0x02, 0x01,
            0x00, 0x00, 0x80, 0x3F,
        ];

        let mut writer = BinaryWriter::new(Endian::Little);
        writer.write_u8(0x01);
        writer.write_u16(0x0102);
        writer.write_u24(0x010203)?;
        writer.write_u32(0x01020304);
        writer.write_f32(1.0);

        assert_eq!(writer.into_inner(), expected);

        Ok(())
    }

    #[test]
    fn write_u24_overflow() {
        let mut writer = BinaryWriter::new(Endian::Little);
        assert!(writer.write_u24(0x0100_0000).is_err());
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn align_uses_filler() {
        let mut writer = BinaryWriter::new(Endian::Little);
        writer.write_u8(0xAA);
        writer.set_filler(0xFF);
        writer.align(4);
        writer.align(0);
        assert_eq!(writer.into_inner(), vec![0xAA, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn reserve_and_patch() -> Result<()> {
        let mut writer = BinaryWriter::new(Endian::Big);
        let slot = writer.reserve_u32();
        writer.write_u16(0x1234);
        writer.patch_u32(slot, 0xCAFEBABE);
        writer.patch_u16_at(4, 0x5678)?;
        assert!(writer.patch_u32_at(4, 0).is_err());

        assert_eq!(
            writer.into_inner(),
            vec![0xCA, 0xFE, 0xBA, 0xBE, 0x56, 0x78]
        );

        Ok(())
    }

    #[test]
    fn write_strings() {
        let mut writer = BinaryWriter::new(Endian::Little);
        writer.write_null_string("abc", TextEncoding::Utf8);
        writer.write_null_string("hi", TextEncoding::Utf16);
        writer.write_fixed_string("xy", 4, TextEncoding::Utf8);

        #[rustfmt::skip]
        let expected = vec![
            b'a', b'b', b'c', 0x00,
            b'h', 0x00, b'i', 0x00, 0x00, 0x00,
            b'x', b'y', 0x00, 0x00,
        ];
        assert_eq!(writer.into_inner(), expected);
    }

    #[test]
    fn write_binrw_struct() -> Result<()> {
        let mut writer = BinaryWriter::new(Endian::Little);
        writer.write_u8(0xFF);
        writer.write_struct(&Header { size: 8, flags: 1 })?;

        assert_eq!(
            writer.into_inner(),
            vec![0xFF, b'T', b'E', b'S', b'T', 0x08, 0x00, 0x01, 0x00]
        );

        Ok(())
    }
}
