//! Configuration to acknowledge user preferences as well as set defaults.
//!
//! We look for a marginalia.toml in the working directory and, if present, load settings from
//! it. This provides the docs root, the document extensions to list, and the author name written
//! on new comments.

use crate::error::{Error, Result};
use facet::Facet;
use std::fs;
use std::io;
use std::path::Path;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "marginalia.toml";

#[derive(Facet, Clone, Debug)]
/// User preferences loaded from marginalia.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "working-docs".to_string())]
    /// Directory holding the documents.
    pub docs_root: String,
    #[facet(default = vec!["md".to_string()])]
    /// File suffixes to match when listing documents.
    pub file_extensions: Vec<String>,
    #[facet(default = "You".to_string())]
    /// Author name recorded on new comments.
    pub author: String,
}

impl Config {
    /// Parses configuration text; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid configuration.
    pub fn parse(contents: &str) -> Result<Self> {
        facet_toml::from_str::<Self>(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads configuration from a file, using defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::parse(""),
            Err(e) => Err(e.into()),
        }
    }

    /// Load configuration from marginalia.toml if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
