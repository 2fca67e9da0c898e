//! Markdown reference pages generated from the clap command tree.
//!
//! One page per visible command, named by its path (`release-cover_setcover.md`),
//! with the long help and links to the parent and child pages.

use anyhow::{Context, Result};
use clap::Command;
use std::fmt::Write;
use std::path::Path;

/// `(file name, contents)` for the command and every visible subcommand.
pub fn markdown_tree(root: &mut Command) -> Vec<(String, String)> {
    root.build();
    let mut pages = Vec::new();
    collect(root, &[], &mut pages);
    pages
}

/// Write the pages into `dir`, creating it when missing.
pub fn write_markdown_tree(root: &mut Command, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let pages = markdown_tree(root);
    for (name, contents) in &pages {
        let path = dir.join(name);
        std::fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    }
    Ok(pages.len())
}

fn visible(cmd: &Command) -> impl Iterator<Item = &Command> {
    cmd.get_subcommands()
        .filter(|s| !s.is_hide_set() && s.get_name() != "help")
}

fn page_name(path: &[String]) -> String {
    format!("{}.md", path.join("_"))
}

fn collect(cmd: &Command, parents: &[String], pages: &mut Vec<(String, String)>) {
    let mut path = parents.to_vec();
    path.push(cmd.get_name().to_string());
    pages.push((page_name(&path), render_page(cmd, &path)));
    for sub in visible(cmd) {
        collect(sub, &path, pages);
    }
}

fn render_page(cmd: &Command, path: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}\n", path.join(" "));
    if let Some(about) = cmd.get_about() {
        let _ = writeln!(out, "{}\n", about);
    }
    let _ = writeln!(out, "```");
    let _ = write!(out, "{}", cmd.clone().render_long_help());
    let _ = writeln!(out, "```");

    let parent = &path[..path.len() - 1];
    let children: Vec<&Command> = visible(cmd).collect();
    if !parent.is_empty() || !children.is_empty() {
        let _ = writeln!(out, "\n### SEE ALSO\n");
    }
    if !parent.is_empty() {
        let _ = writeln!(out, "* [{}]({})", parent.join(" "), page_name(parent));
    }
    for child in children {
        let mut child_path = path.to_vec();
        child_path.push(child.get_name().to_string());
        let about = child.get_about().map(|a| a.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "* [{}]({}) - {}",
            child_path.join(" "),
            page_name(&child_path),
            about
        );
    }
    out
}
