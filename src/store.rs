//! Read and write collaborators for document bodies.
//!
//! The annotation core only ever sees whole bodies keyed by a path identifier. How those paths
//! resolve to bytes is up to a [`DocumentStore`]; [`FsStore`] keeps them as files under a docs
//! root.

use crate::error::{Error, Result};
use crate::input::{self, DocumentEntry};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Source and sink of full document bodies.
pub trait DocumentStore {
    /// Reads the full body of a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown documents, or the underlying failure.
    fn read(&self, path: &str) -> Result<String>;

    /// Replaces the full body of a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body could not be stored; the previous body is then still
    /// authoritative.
    fn write(&self, path: &str, body: &str) -> Result<()>;

    /// Lists the documents this store can serve.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be produced.
    fn list(&self) -> Result<Vec<DocumentEntry>>;
}

/// Documents stored as files below a root directory.
pub struct FsStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FsStore {
    #[must_use]
    /// Creates a store serving files with the given extensions below `root`.
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    #[must_use]
    /// Directory documents are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a document path onto the file system, refusing anything that leaves the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.trim().is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath(path.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

impl DocumentStore for FsStore {
    fn read(&self, path: &str) -> Result<String> {
        let file = self.resolve(path)?;
        fs::read_to_string(&file).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
            _ => Error::Io(e),
        })
    }

    fn write(&self, path: &str, body: &str) -> Result<()> {
        let file = self.resolve(path)?;
        // Saves rewrite existing documents; they never create new ones.
        if !file.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }
        fs::write(&file, body)?;
        tracing::info!(path, bytes = body.len(), "saved document");
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentEntry>> {
        Ok(input::find_documents(&self.root, &self.extensions)?)
    }
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
