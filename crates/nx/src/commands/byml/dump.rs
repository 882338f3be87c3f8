use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nx_byml::{Byml, Node};
use std::{io::Write, path::PathBuf};
use tracing::info;

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct DumpArgs {
    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Write the JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the JSON on a single line
    #[arg(short, long, default_value_t = false)]
    compact: bool,

    /// Replace the output file if it exists
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

fn render(root: &Node, compact: bool) -> Result<String> {
    if compact {
        serde_json::to_string(root).into_diagnostic()
    } else {
        serde_json::to_string_pretty(root).into_diagnostic()
    }
}

impl DumpArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;
        let byml = Byml::parse(&data).context(format!("path: {}", self.file.display()))?;

        info!(
            version = byml.version,
            root = %byml.root.node_type(),
            "parsed {}",
            self.file.display()
        );

        let json = render(&byml.root, self.compact)?;

        match &self.output {
            Some(path) => {
                let mut out = create_output(path, self.overwrite)?;
                writeln!(out, "{}", json).into_diagnostic()?;
            }
            None => println!("{}", json),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use nx_byml::{Hash, Node};
    use pretty_assertions::assert_str_eq;

    use super::render;

    #[test]
    fn render_compact_and_pretty() -> miette::Result<()> {
        let root = Node::Hash([("Life", Node::Int(13))].into_iter().collect::<Hash>());

        assert_str_eq!(render(&root, true)?, r#"{"Life":13}"#);
        assert_str_eq!(render(&root, false)?, "{\n  \"Life\": 13\n}");

        Ok(())
    }
}
