//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::NodeType;

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

    /// The document root must be an array, a hash or absent
    #[error("a {0} node cannot be the document root")]
    InvalidRoot(NodeType),

    /// A node was accessed as a different type than it holds
    #[error("expected a {expected} node, found {found}")]
    TypeMismatch {
        /// The requested type
        expected: NodeType,
        /// The type the node actually holds
        found: NodeType,
    },

    /// A required hash key is missing
    #[error("key {0:?} not found")]
    KeyNotFound(String),
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

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
