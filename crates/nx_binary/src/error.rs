//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`std::str::Utf8Error`]
    #[error(transparent)]
    UTF8Error(#[from] std::str::Utf8Error),

    /// Transparent warpper for [`widestring::error::Utf16Error`]
    #[error(transparent)]
    UTF16Error(#[from] widestring::error::Utf16Error),

    /// A read or seek went past the end of the buffer
    #[error("access of {length} bytes at offset {offset:#x} exceeds buffer of {size} bytes")]
    Bounds {
        /// Absolute offset the access started at
        offset: u64,
        /// Number of bytes requested
        length: u64,
        /// Size of the underlying buffer
        size: u64,
    },

    /// The data does not follow the expected layout (bad magic, header size, tag...)
    #[error("invalid format: {0}")]
    Format(String),

    /// The data uses a variant of the format this library refuses to handle
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A value does not fit in the width the format allots to it
    #[error("value {value} does not fit in {bits} bits")]
    Overflow {
        /// The offending value
        value: u64,
        /// Available width
        bits: u32,
    },
}

impl Error {
    /// Shorthand for [`Error::Format`]
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    /// Shorthand for [`Error::UnsupportedFeature`]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedFeature(message.into())
    }

    /// Translate a [`binrw::Error`] raised while reading a structure into the crate taxonomy.
    ///
    /// Bad magic becomes [`Error::Format`] and an unexpected end of input becomes [`Error::Bounds`].
    pub(crate) fn from_binrw(err: binrw::Error, offset: u64, length: u64, size: u64) -> Self {
        if err.is_eof() {
            return Error::Bounds {
                offset,
                length,
                size,
            };
        }

        match err {
            binrw::Error::BadMagic { pos, found } => {
                Error::Format(format!("bad magic {:?} at {:#x}", found, pos))
            }
            binrw::Error::Backtrace(backtrace) => {
                Error::from_binrw(*backtrace.error, offset, length, size)
            }
            other => Error::BinRWError(other),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
