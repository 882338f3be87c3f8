use clap::Args;
use itertools::Itertools;
use miette::miette;
use miette::{Context, IntoDiagnostic, Result};
use nx_sarc::{hash::DEFAULT_HASH_KEY, write::SarcWriterOptions, SarcWriter};
use std::path::PathBuf;
use tracing::info;
use walkdir::WalkDir;

use crate::commands::{
    create_output,
    sarc::{parse_u32, AlignmentArgs},
};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target SARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Multiplier for the name hash
    #[arg(long, value_name = "KEY", value_parser = parse_u32, default_value_t = DEFAULT_HASH_KEY)]
    hash_key: u32,

    #[command(flatten)]
    alignment: AlignmentArgs,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let files = WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir())
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(miette!("directory is empty"));
        }

        let mut sarc = SarcWriter::new(
            SarcWriterOptions::builder()
                .hash_key(self.hash_key)
                .alignment(self.alignment.policy())
                .build(),
        );

        for file in files {
            let name = file
                .path()
                .strip_prefix(&self.directory)
                .into_diagnostic()?;
            let name = name
                .components()
                .map(|c| {
                    c.as_os_str()
                        .to_str()
                        .ok_or(miette!("unable to convert {} to a string", name.display()))
                })
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .join("/");
            info!("packing {}", name);

            let data = std::fs::read(file.path())
                .into_diagnostic()
                .context(format!("opening {}", file.path().display()))?;
            sarc.add_file(name, data);
        }

        let mut out = create_output(&self.file, self.overwrite)?;
        sarc.write_to(&mut out).context("finalizing sarc file")?;

        Ok(())
    }
}
