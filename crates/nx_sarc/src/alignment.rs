//! Extension based data alignment for archive entries.

use std::{collections::HashMap, str::FromStr};

use crate::error::Error;

/// Alignment used when nothing more specific is registered
pub const DEFAULT_ALIGNMENT: u32 = 4;

/// Maps file extensions to the byte alignment their data must start at
///
/// Extensions are matched case-insensitively and always stored with a leading dot. A name
/// with several dots tries every suffix from the left, so for `a.b.c` the policy looks up
/// `.b.c` before `.c`.
///
/// ```
/// use nx_sarc::alignment::AlignmentPolicy;
///
/// let policy = AlignmentPolicy::new(8).with("c", 16);
/// assert_eq!(policy.resolve("a.b.c"), 16);
/// assert_eq!(policy.resolve("a.b.x"), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentPolicy {
    default: u32,
    extensions: HashMap<String, u32>,
}

fn normalize_alignment(alignment: i64) -> u32 {
    match alignment.unsigned_abs() {
        0 => 1,
        value => u32::try_from(value).unwrap_or(u32::MAX),
    }
}

fn normalize_extension(extension: &str) -> String {
    let lower = extension.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

impl AlignmentPolicy {
    /// Create an empty policy. Zero is coerced to one and negative values use their magnitude.
    pub fn new(default: i64) -> Self {
        AlignmentPolicy {
            default: normalize_alignment(default),
            extensions: HashMap::new(),
        }
    }

    /// Builder style [`AlignmentPolicy::register`]
    pub fn with(mut self, extension: &str, alignment: i64) -> Self {
        self.register(extension, alignment);
        self
    }

    /// Register the alignment for an extension, replacing any previous value
    pub fn register(&mut self, extension: &str, alignment: i64) {
        self.extensions
            .insert(normalize_extension(extension), normalize_alignment(alignment));
    }

    /// Alignment used for names without a registered extension
    pub fn default_alignment(&self) -> u32 {
        self.default
    }

    /// Registered alignment for an exact extension, if any
    pub fn get(&self, extension: &str) -> Option<u32> {
        self.extensions.get(&normalize_extension(extension)).copied()
    }

    /// Look up the alignment for a file name
    pub fn resolve(&self, file_name: &str) -> u32 {
        let lower = file_name.to_lowercase();
        lower
            .match_indices('.')
            .find_map(|(index, _)| self.extensions.get(&lower[index..]).copied())
            .unwrap_or(self.default)
    }
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        AlignmentPolicy::new(DEFAULT_ALIGNMENT as i64)
    }
}

/// A single `extension=alignment` pair, as accepted on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRule {
    /// The extension, with or without the leading dot
    pub extension: String,
    /// The requested alignment
    pub alignment: i64,
}

impl FromStr for AlignmentRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (extension, alignment) = s
            .split_once('=')
            .ok_or_else(|| Error::CustomError(format!("expected ext=alignment, got {}", s)))?;

        let alignment = alignment.trim();
        let parsed = match alignment.strip_prefix("0x") {
            Some(hex) => i64::from_str_radix(hex, 16),
            None => alignment.parse::<i64>(),
        }
        .map_err(|_| Error::CustomError(format!("invalid alignment {}", alignment)))?;

        if extension.trim().is_empty() {
            return Err(Error::CustomError(format!("missing extension in {}", s)));
        }

        Ok(AlignmentRule {
            extension: extension.trim().to_owned(),
            alignment: parsed,
        })
    }
}

impl Extend<AlignmentRule> for AlignmentPolicy {
    fn extend<T: IntoIterator<Item = AlignmentRule>>(&mut self, iter: T) {
        for rule in iter {
            self.register(&rule.extension, rule.alignment);
        }
    }
}
