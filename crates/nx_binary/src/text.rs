//! Text encodings understood by the cursors

use binrw::Endian;
use widestring::U16String;

use crate::error::Result;

/// Encoding used for strings stored in a binary stream
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// One byte code units, NUL terminated by a single `0x00`
    #[default]
    Utf8,

    /// Two byte code units in the stream's byte order, NUL terminated by `0x0000`
    Utf16,
}

impl TextEncoding {
    /// Size of a single code unit in bytes
    pub const fn unit_size(self) -> usize {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16 => 2,
        }
    }

    pub(crate) fn decode(self, bytes: &[u8], endian: Endian) -> Result<String> {
        match self {
            TextEncoding::Utf8 => Ok(std::str::from_utf8(bytes)?.to_owned()),
            TextEncoding::Utf16 => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| match endian {
                        Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
                        Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
                    })
                    .collect::<Vec<_>>();
                Ok(U16String::from_vec(units).to_string()?)
            }
        }
    }

    pub(crate) fn encode(self, text: &str, endian: Endian) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16 => U16String::from_str(text)
                .into_vec()
                .into_iter()
                .flat_map(|unit| match endian {
                    Endian::Little => unit.to_le_bytes(),
                    Endian::Big => unit.to_be_bytes(),
                })
                .collect(),
        }
    }
}
