//! Finding the documents under a docs root.
//!
//! Walks directories recursively, skipping hidden entries, and keeps files whose extension is in
//! the configured list. Paths are reported relative to the root with `/` separators so they can
//! be handed straight back to the store.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A document available for annotation.
pub struct DocumentEntry {
    /// Path relative to the docs root, `/`-separated.
    pub path: String,
    /// Display title derived from the file name.
    pub title: String,
}

#[must_use]
/// Turns `my-first-doc.md` into `My First Doc`.
pub fn title_from_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().to_string());

    stem.split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn walk(
    root: &Path,
    dir: &Path,
    extensions: &[String],
    found: &mut Vec<DocumentEntry>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(root, &path, extensions, found)?;
        } else if matches_extension(&path, extensions) {
            found.push(DocumentEntry {
                path: relative_path(root, &path),
                title: title_from_file_name(&name),
            });
        }
    }
    Ok(())
}

/// Lists every matching document below `root`, sorted by path.
///
/// # Errors
///
/// Returns an error if the root or any directory below it cannot be read.
pub fn find_documents(root: &Path, extensions: &[String]) -> io::Result<Vec<DocumentEntry>> {
    let mut found = Vec::new();
    walk(root, root, extensions, &mut found)?;
    found.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), documents = found.len(), "listed documents");
    Ok(found)
}

#[cfg(test)]
#[path = "tests/input.rs"]
mod tests;
