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

    /// Transparent wrapper for [`nx_binary::error::Error`]
    ///
    /// Carries the format, bounds and unsupported feature failures raised while parsing.
    #[error(transparent)]
    Binary(#[from] nx_binary::error::Error),

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),

    /// The archive holds more files than the file table can count
    #[error("archive holds {0} files, the file table allows at most 65535")]
    TooManyFiles(usize),

    /// A computed offset or size does not fit in its on-disk field
    #[error("{0} does not fit in the archive layout")]
    LayoutOverflow(&'static str),

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

impl Error {
    /// Shorthand for a [`nx_binary::error::Error::Format`] failure
    pub fn format(message: impl Into<String>) -> Self {
        Error::Binary(nx_binary::error::Error::format(message))
    }

    /// Shorthand for a [`nx_binary::error::Error::UnsupportedFeature`] failure
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Binary(nx_binary::error::Error::unsupported(message))
    }
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),

    /// by hash {0:#010x}
    #[error("by hash {0:#010x}")]
    Hash(u32),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
