use clap::Args;
use miette::Result;
use nx_sarc::SarcArchive;
use std::path::PathBuf;

use crate::commands::read_input;

#[derive(Args)]
pub struct ListArgs {
    /// An input SARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Also print hash, offsets and alignment of each file
    #[arg(short, long, default_value_t = false)]
    long: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;
        let sarc = SarcArchive::new(&data)?;

        if self.long {
            println!(
                "{} files, hash key {:#x}, data at {:#x}",
                sarc.len(),
                sarc.hash_key(),
                sarc.data_start()
            );
        }

        for file in sarc.files() {
            let name = file
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("<{:08x}>", file.name_hash()));

            if self.long {
                let entry = file.entry();
                println!(
                    "{:08x} {:>#10x} {:>10} {:>#8x} {}",
                    entry.name_hash,
                    entry.data_begin,
                    entry.size(),
                    entry.alignment,
                    name
                );
            } else {
                println!("{}", name);
            }
        }

        Ok(())
    }
}
