//! Types for reading binary data
//!

use binrw::{BinRead, Endian};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::Cursor;
use tracing::{debug, trace};

use crate::{
    align_up,
    error::{Error, Result},
    text::TextEncoding,
};

macro_rules! read_primitive {
    ($($(#[$doc:meta])* $name:ident => $ty:ty, $size:literal, $conv:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.read_bytes($size)?;
                Ok(match self.endian {
                    Endian::Little => LittleEndian::$conv(bytes),
                    Endian::Big => BigEndian::$conv(bytes),
                })
            }
        )*
    };
}

/// Sequential reader over an in-memory byte buffer
///
/// The position is always absolute from the start of the buffer. Every access is bounds
/// checked and a request past the end fails with [`Error::Bounds`] instead of truncating.
///
/// ```
/// # fn doit() -> nx_binary::error::Result<()> {
/// use nx_binary::{BinaryReader, Endian};
///
/// let mut reader = BinaryReader::new(&[0x01, 0x00, 0x02, 0x00], Endian::Little);
/// assert_eq!(reader.read_u16()?, 1);
/// let peeked = reader.peek_at(0, |r| r.read_u32())?;
/// assert_eq!(peeked, 0x0002_0001);
/// assert_eq!(reader.position(), 2);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        BinaryReader {
            data,
            position: 0,
            endian,
        }
    }

    /// The byte order used for multi-byte values
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Change the byte order used for subsequent reads
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Current absolute position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Size of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes between the current position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// The whole underlying buffer
    pub fn get_ref(&self) -> &'a [u8] {
        self.data
    }

    /// Move to an absolute offset. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(self.bounds(offset, 0));
        }
        self.position = offset;
        Ok(())
    }

    /// Advance the position by `count` bytes
    pub fn skip(&mut self, count: usize) -> Result<()> {
        let target = self
            .position
            .checked_add(count)
            .ok_or_else(|| self.bounds(self.position, count))?;
        if target > self.data.len() {
            return Err(self.bounds(self.position, count));
        }
        self.position = target;
        Ok(())
    }

    /// Advance to the next multiple of `alignment`. An alignment of zero is treated as one.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let target = align_up(self.position, alignment);
        self.skip(target - self.position)
    }

    /// Run `f` at `offset` and restore the current position afterwards.
    ///
    /// The position is restored whether `f` succeeds or fails, so nested lookups never leave
    /// the caller somewhere unexpected.
    pub fn peek_at<T, E>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Self) -> core::result::Result<T, E>,
    ) -> core::result::Result<T, E>
    where
        E: From<Error>,
    {
        let saved = self.position;
        self.seek(offset)?;
        trace!(offset, saved, "peeking");
        let result = f(self);
        self.position = saved;
        result
    }

    /// Borrow the `length` bytes starting at an absolute offset without moving
    pub fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| self.bounds(offset, length))?;
        self.data
            .get(offset..end)
            .ok_or_else(|| self.bounds(offset, length))
    }

    /// Read `length` raw bytes
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let bytes = self.slice(self.position, length)?;
        self.position += length;
        Ok(bytes)
    }

    /// Read a fixed number of raw bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a single signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a bool stored as a single byte
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_primitive! {
        /// Read a 16 bit unsigned integer
        read_u16 => u16, 2, read_u16;
        /// Read a 16 bit signed integer
        read_i16 => i16, 2, read_i16;
        /// Read a 24 bit unsigned integer
        read_u24 => u32, 3, read_u24;
        /// Read a 32 bit unsigned integer
        read_u32 => u32, 4, read_u32;
        /// Read a 32 bit signed integer
        read_i32 => i32, 4, read_i32;
        /// Read a 64 bit unsigned integer
        read_u64 => u64, 8, read_u64;
        /// Read a 64 bit signed integer
        read_i64 => i64, 8, read_i64;
        /// Read a 32 bit float
        read_f32 => f32, 4, read_f32;
        /// Read a 64 bit float
        read_f64 => f64, 8, read_f64;
    }

    /// Read a NUL terminated string. The terminator is consumed but not returned.
    pub fn read_null_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let unit = encoding.unit_size();
        let start = self.position;
        let tail = self.data.get(start..).unwrap_or_default();
        let length = tail
            .chunks_exact(unit)
            .position(|c| c.iter().all(|b| *b == 0))
            .map(|units| units * unit)
            .ok_or_else(|| self.bounds(start, tail.len() + unit))?;

        let bytes = self.read_bytes(length)?;
        self.skip(unit)?;
        encoding.decode(bytes, self.endian)
    }

    /// Read a string occupying exactly `length` bytes, trimming trailing NUL padding
    pub fn read_fixed_string(&mut self, length: usize, encoding: TextEncoding) -> Result<String> {
        let unit = encoding.unit_size();
        let mut bytes = self.read_bytes(length)?;
        while bytes.len() >= unit && bytes[bytes.len() - unit..].iter().all(|b| *b == 0) {
            bytes = &bytes[..bytes.len() - unit];
        }
        encoding.decode(bytes, self.endian)
    }

    /// Read a [`binrw`] structure at the current position.
    ///
    /// The reader's endianness is passed down; structures tagged with an explicit
    /// `#[brw(little)]` keep their own.
    pub fn read_struct<T>(&mut self) -> Result<T>
    where
        T: BinRead,
        for<'b> T::Args<'b>: Default,
    {
        let start = self.position;
        let mut cursor = Cursor::new(self.data);
        cursor.set_position(start as u64);
        let value = T::read_options(&mut cursor, self.endian, Default::default()).map_err(|e| {
            debug!(offset = start, "structure read failed: {}", e);
            Error::from_binrw(
                e,
                start as u64,
                self.data.len().saturating_sub(start) as u64 + 1,
                self.data.len() as u64,
            )
        })?;
        self.position = cursor.position() as usize;
        Ok(value)
    }

    fn bounds(&self, offset: usize, length: usize) -> Error {
        Error::Bounds {
            offset: offset as u64,
            length: length as u64,
            size: self.data.len() as u64,
        }
    }
}
