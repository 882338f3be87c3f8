pub mod byml;
pub mod sarc;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle SARC archives
    Sarc {
        #[command(subcommand)]
        command: sarc::SarcCommands,
    },
    /// Handle BYML documents
    Byml {
        #[command(subcommand)]
        command: byml::BymlCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Sarc { command } => command.handle(),
            Commands::Byml { command } => command.handle(),
        }
    }
}

use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::Path};

/// Read a whole input file
pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))
}

/// Create an output file, refusing to replace an existing one unless `overwrite` is set
pub(crate) fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    }
}
