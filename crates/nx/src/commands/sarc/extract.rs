use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use nx_sarc::SarcArchive;
use std::{
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{info, warn};

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct ExtractArgs {
    /// An input SARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Reject names that would escape the target directory
fn enclosed_name(name: &str) -> Option<&Path> {
    let path = Path::new(name);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;
        let sarc = SarcArchive::new(&data)?;

        for file in sarc.files() {
            let relative = match file.name() {
                Some(name) => enclosed_name(name)
                    .ok_or_else(|| miette!("refusing to extract unsafe path {}", name))?
                    .to_path_buf(),
                None => {
                    warn!(hash = file.name_hash(), "file has no name, using its hash");
                    PathBuf::from(format!("{:08x}.bin", file.name_hash()))
                }
            };

            let p = self.directory.join(relative);
            info!("writing {}", p.display());

            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .context(format!("creating {}", parent.display()))?;
            }
            let mut out = create_output(&p, self.overwrite)?;
            out.write_all(file.data()).into_diagnostic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::enclosed_name;

    #[test]
    fn rejects_escaping_names() {
        assert_eq!(
            enclosed_name("Actor/Pack/Link.bactorpack"),
            Some(Path::new("Actor/Pack/Link.bactorpack"))
        );
        assert_eq!(enclosed_name("../runtime"), None);
        assert_eq!(enclosed_name("/etc/shadow"), None);
        assert_eq!(enclosed_name("a/./b"), Some(Path::new("a/./b")));
    }
}
