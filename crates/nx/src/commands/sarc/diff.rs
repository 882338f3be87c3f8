use clap::{Args, ValueEnum};
use itertools::Itertools;
use miette::{miette, IntoDiagnostic, Result};
use nx_byml::Node;
use nx_sarc::{read::SarcFile, SarcArchive};
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::{cmp::Ordering, collections::BTreeMap, fmt::Display, path::PathBuf};
use tracing::debug;

use crate::commands::read_input;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// Compare BYML documents node by node
    #[default]
    Semantic,
    /// Also compare layout details and show text diffs of changed documents
    Full,
}

#[derive(Debug, Eq, PartialEq)]
enum Change {
    Added(String, String),
    Removed(String, String),
    Comparison(String, String, String),
    Context(Vec<String>),
    Modified(String, String, Vec<Change>, Vec<Change>),
}

impl Change {
    fn modified(section: &str, name: &str) -> Change {
        Change::Modified(section.into(), name.into(), Vec::new(), Vec::new())
    }

    pub fn with_children(&mut self, children: Vec<Change>) -> Result<()> {
        match self {
            Change::Modified(_, _, vec, _) => {
                vec.extend(children);
                vec.sort();
                Ok(())
            }
            _ => Err(miette!("tried to add children to an addition or removal")),
        }
    }

    pub fn with_related(&mut self, related: Vec<Change>) -> Result<()> {
        match self {
            Change::Modified(_, _, _, vec) => {
                vec.extend(related);
                vec.sort();
                Ok(())
            }
            _ => Err(miette!("tried to add related to an addition or removal")),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Change::Added(..) => 0,
            Change::Removed(..) => 1,
            Change::Modified(..) => 2,
            Change::Comparison(..) => 3,
            Change::Context(..) => 4,
        }
    }
}

impl Ord for Change {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Change::Added(key, value), Change::Added(other_key, other_value))
            | (Change::Removed(key, value), Change::Removed(other_key, other_value)) => {
                key.cmp(other_key).then_with(|| value.cmp(other_value))
            }
            (
                Change::Comparison(key, old, new),
                Change::Comparison(other_key, other_old, other_new),
            ) => key
                .cmp(other_key)
                .then_with(|| old.cmp(other_old))
                .then_with(|| new.cmp(other_new)),
            (Change::Context(lines), Change::Context(other_lines)) => lines.cmp(other_lines),
            (
                Change::Modified(key, value, children, related),
                Change::Modified(other_key, other_value, other_children, other_related),
            ) => key
                .cmp(other_key)
                .then_with(|| value.cmp(other_value))
                .then_with(|| children.cmp(other_children))
                .then_with(|| related.cmp(other_related)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Change {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.split('\n').map(|l| format!("{}{}", prefix, l)).join("\n")
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Added(_, v) => {
                writeln!(f, "✅ {}", v.green())
            }
            Change::Removed(_, v) => {
                writeln!(f, "❌ {}", v.red())
            }
            Change::Comparison(key, old, new) => {
                writeln!(f, "* {}: {} vs {}", key, old.red(), new.green())
            }
            Change::Context(values) => {
                writeln!(f, "{}", values.iter().map(|l| format!(" {}", l)).join("\n"))
            }
            Change::Modified(_, v, children, related) => {
                let mut body = related.iter().map(|c| c.to_string()).join("");

                // Children are sorted, so changes of one kind within a section are adjacent
                for ((kind, section), group) in &children.iter().chunk_by(|c| match c {
                    Change::Added(key, _) => ("added", key.as_str()),
                    Change::Removed(key, _) => ("removed", key.as_str()),
                    Change::Modified(key, _, _, _) => ("modified", key.as_str()),
                    _ => ("", ""),
                }) {
                    let text = group.map(|c| c.to_string()).join("");
                    if kind.is_empty() {
                        body.push_str(&text);
                    } else {
                        body.push_str(&format!("* {} {}:\n", section, kind));
                        body.push_str(&indent(&text, "  "));
                        body.push('\n');
                    }
                }

                writeln!(f, "🔃 {}", v.blue())?;
                writeln!(
                    f,
                    "{}",
                    body.split('\n')
                        .filter(|l| l.trim().len() > 1)
                        .map(|l| format!("  {}", l))
                        .join("\n")
                )
            }
        }
    }
}

/// Render a line diff with the changed parts of each line underlined
fn inline_diff(old: &str, new: &str) -> Option<Vec<String>> {
    let diff = TextDiff::from_lines(old, new);
    if diff.ratio() >= 1.0 {
        return None;
    }

    let mut lines = Vec::new();
    for op in diff.ops().iter() {
        for change in diff.iter_inline_changes(op) {
            let mut context = match change.tag() {
                ChangeTag::Insert => "+".green().to_string(),
                ChangeTag::Delete => "-".red().to_string(),
                ChangeTag::Equal => " ".to_string(),
            };
            for (emphasized, value) in change.iter_strings_lossy() {
                let value = value.trim_end_matches('\n');
                if emphasized {
                    if change.tag() == ChangeTag::Insert {
                        context.push_str(&format!("{}", value.green().underline()));
                    } else {
                        context.push_str(&format!("{}", value.red().underline()));
                    }
                } else {
                    context.push_str(&format!("{}", value.dimmed()));
                }
            }
            lines.push(context);
        }
    }
    Some(lines)
}

fn render(node: &Node) -> Result<String> {
    serde_json::to_string(node).into_diagnostic()
}

fn is_byml(name: &str) -> bool {
    let lower = name.to_lowercase();
    [".byml", ".bgyml", ".byaml"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

fn label(file: &SarcFile<'_>) -> String {
    file.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("<{:08x}>", file.name_hash()))
}

#[derive(Args)]
pub struct DiffArgs {
    /// An input SARC file
    #[arg(short, long, value_name = "FILE")]
    left: PathBuf,

    /// An input SARC file
    #[arg(short, long, value_name = "FILE")]
    right: PathBuf,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t = Mode::Semantic)]
    mode: Mode,
}

impl DiffArgs {
    fn compare_nodes(
        &self,
        path: &str,
        left: &Node,
        right: &Node,
        result: &mut Vec<Change>,
    ) -> Result<()> {
        match (left, right) {
            (Node::Hash(l), Node::Hash(r)) => {
                let keys = l.keys().chain(r.keys()).sorted().dedup();
                for key in keys {
                    let child = format!("{}/{}", path, key);
                    match (l.get(key), r.get(key)) {
                        (Some(old), Some(new)) => self.compare_nodes(&child, old, new, result)?,
                        (None, Some(_)) => result.push(Change::Added("keys".into(), child)),
                        (Some(_), None) => result.push(Change::Removed("keys".into(), child)),
                        (None, None) => {}
                    }
                }
            }
            (Node::Array(l), Node::Array(r)) => {
                for (i, pair) in l.iter().zip_longest(r.iter()).enumerate() {
                    let child = format!("{}[{}]", path, i);
                    match pair {
                        itertools::EitherOrBoth::Both(old, new) => {
                            self.compare_nodes(&child, old, new, result)?
                        }
                        itertools::EitherOrBoth::Right(_) => {
                            result.push(Change::Added("items".into(), child))
                        }
                        itertools::EitherOrBoth::Left(_) => {
                            result.push(Change::Removed("items".into(), child))
                        }
                    }
                }
            }
            (old, new) if old != new => result.push(Change::Comparison(
                if path.is_empty() { "/".into() } else { path.into() },
                render(old)?,
                render(new)?,
            )),
            _ => {}
        }
        Ok(())
    }

    fn handle_byml(&self, left: &[u8], right: &[u8]) -> Result<Option<(Vec<Change>, Vec<Change>)>> {
        let (Ok(left), Ok(right)) = (nx_byml::Byml::parse(left), nx_byml::Byml::parse(right))
        else {
            return Ok(None);
        };

        let mut children = Vec::new();
        self.compare_nodes("", &left.root, &right.root, &mut children)?;

        let mut related = Vec::new();
        if left.version != right.version {
            related.push(Change::Comparison(
                "version".into(),
                left.version.to_string(),
                right.version.to_string(),
            ));
        }
        if self.mode == Mode::Full {
            let old = serde_json::to_string_pretty(&left.root).into_diagnostic()?;
            let new = serde_json::to_string_pretty(&right.root).into_diagnostic()?;
            if let Some(lines) = inline_diff(&old, &new) {
                related.push(Change::Context(lines));
            }
        }

        Ok(Some((children, related)))
    }

    fn handle_file(&self, name: &str, left: &[u8], right: &[u8]) -> Result<Option<Change>> {
        if left == right {
            return Ok(None);
        }

        let mut result = Change::modified("files", name);

        if left.len() != right.len() {
            result.with_related(vec![Change::Comparison(
                "size".into(),
                left.len().to_string(),
                right.len().to_string(),
            )])?;
        }

        if left.starts_with(b"SARC") && right.starts_with(b"SARC") {
            let left = SarcArchive::new(left)?;
            let right = SarcArchive::new(right)?;
            if let Some(nested) = self.handle_sarc(name, &left, &right)? {
                result.with_children(vec![nested])?;
            }
        } else if is_byml(name) {
            match self.handle_byml(left, right)? {
                Some((children, related)) => {
                    result.with_children(children)?;
                    result.with_related(related)?;
                }
                None => debug!(name, "not a readable BYML document, comparing bytes"),
            }
        }

        if let Change::Modified(_, _, children, related) = &result {
            if children.is_empty() && related.is_empty() {
                result.with_related(vec![Change::Context(vec!["binary content differs".into()])])?;
            }
        }

        Ok(Some(result))
    }

    fn handle_sarc(
        &self,
        name: &str,
        left: &SarcArchive<'_>,
        right: &SarcArchive<'_>,
    ) -> Result<Option<Change>> {
        let mut result = Change::modified("sarc", name);

        if left.len() != right.len() {
            result.with_related(vec![Change::Comparison(
                "entries".into(),
                left.len().to_string(),
                right.len().to_string(),
            )])?;
        }

        if left.hash_key() != right.hash_key() {
            result.with_related(vec![Change::Comparison(
                "hash key".into(),
                format!("{:#x}", left.hash_key()),
                format!("{:#x}", right.hash_key()),
            )])?;
        }

        if self.mode == Mode::Full && left.data_start() != right.data_start() {
            result.with_related(vec![Change::Comparison(
                "data start".into(),
                format!("{:#x}", left.data_start()),
                format!("{:#x}", right.data_start()),
            )])?;
        }

        let left_files = left.files().map(|f| (label(&f), f)).collect::<BTreeMap<_, _>>();
        let right_files = right.files().map(|f| (label(&f), f)).collect::<BTreeMap<_, _>>();

        let files_added = right_files
            .keys()
            .filter(|k| !left_files.contains_key(*k))
            .map(|k| Change::Added("files".into(), k.clone()))
            .collect::<Vec<_>>();
        if !files_added.is_empty() {
            result.with_children(files_added)?;
        }

        let files_removed = left_files
            .keys()
            .filter(|k| !right_files.contains_key(*k))
            .map(|k| Change::Removed("files".into(), k.clone()))
            .collect::<Vec<_>>();
        if !files_removed.is_empty() {
            result.with_children(files_removed)?;
        }

        for (file, file_left) in &left_files {
            let Some(file_right) = right_files.get(file) else {
                continue;
            };

            if let Some(mut c) = self.handle_file(file, file_left.data(), file_right.data())? {
                if self.mode == Mode::Full
                    && file_left.entry().alignment != file_right.entry().alignment
                {
                    c.with_related(vec![Change::Comparison(
                        "alignment".into(),
                        format!("{:#x}", file_left.entry().alignment),
                        format!("{:#x}", file_right.entry().alignment),
                    )])?;
                }
                result.with_children(vec![c])?;
            }
        }

        match &result {
            Change::Modified(_, _, children, related) if children.is_empty() && related.is_empty() => {
                Ok(None)
            }
            _ => Ok(Some(result)),
        }
    }

    pub fn handle(&self) -> Result<()> {
        let l = read_input(&self.left)?;
        let left = SarcArchive::new(&l)?;

        let r = read_input(&self.right)?;
        let right = SarcArchive::new(&r)?;

        let difference = self.handle_sarc(&self.left.to_string_lossy(), &left, &right)?;

        match difference {
            Some(d) => println!("{}", d),
            None => println!("no differences"),
        }

        Ok(())
    }
}
