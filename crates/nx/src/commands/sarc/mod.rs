pub mod diff;
pub mod extract;
pub mod list;
pub mod pack;

use clap::Args;
use nx_sarc::alignment::{AlignmentPolicy, AlignmentRule, DEFAULT_ALIGNMENT};

#[derive(clap::Subcommand)]
pub enum SarcCommands {
    /// Compare two SARC archives
    Diff(diff::DiffArgs),
    /// Extract a SARC archive into a directory
    Extract(extract::ExtractArgs),
    /// List the files of a SARC archive
    List(list::ListArgs),
    /// Pack a directory into a SARC archive
    Pack(pack::PackArgs),
}

impl SarcCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            SarcCommands::Diff(diff) => diff.handle(),
            SarcCommands::Extract(extract) => extract.handle(),
            SarcCommands::List(list) => list.handle(),
            SarcCommands::Pack(pack) => pack.handle(),
        }
    }
}

/// Options controlling where file data is placed
#[derive(Args, Debug, Clone)]
pub struct AlignmentArgs {
    /// Alignment for an extension, e.g. `bfres=0x2000`. May be repeated
    #[arg(long = "align", value_name = "EXT=N")]
    rules: Vec<AlignmentRule>,

    /// Alignment for files without a matching extension
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ALIGNMENT as i64, allow_negative_numbers = true)]
    default_alignment: i64,
}

impl AlignmentArgs {
    pub fn policy(&self) -> AlignmentPolicy {
        let mut policy = AlignmentPolicy::new(self.default_alignment);
        policy.extend(self.rules.iter().cloned());
        policy
    }
}

/// Parse a decimal or `0x` prefixed hexadecimal number
pub(crate) fn parse_u32(value: &str) -> Result<u32, String> {
    match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    }
    .map_err(|e| format!("{}: {}", value, e))
}
