pub mod dump;

#[derive(clap::Subcommand)]
pub enum BymlCommands {
    /// Print a BYML document as JSON
    Dump(dump::DumpArgs),
}

impl BymlCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BymlCommands::Dump(dump) => dump.handle(),
        }
    }
}
