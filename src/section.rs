//! Section representation for scanned documents.
//!
//! A section is one commentable unit of a document: a run of non-blank lines closed by a blank
//! line or by a line that starts a new block (heading, list item, bold label, `Label:`). Sections
//! are addressed by an id derived from the line they start on, and that id is what a comment
//! marker records as its target.

use crate::marker::Annotation;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Contiguous span of document lines together with the comments attached to it.
pub struct Section {
    /// Position of this section in scan order (0-based).
    pub index: usize,
    /// Stable join key `line-<N>`, N being the 1-based start line.
    pub section_id: String,
    /// Index of the first content line in the body.
    pub start_line: usize,
    /// Index of the last content line in the body (inclusive).
    pub end_line: usize,
    /// Lines belonging to the section, in order.
    pub content: Vec<String>,
    /// Comments attached to the section, in scan order.
    pub comments: Vec<Annotation>,
}

impl Section {
    #[must_use]
    /// Builds the section id for a section starting on the given 0-based line.
    pub fn id_for_line(start_line: usize) -> String {
        format!("line-{}", start_line + 1)
    }

    #[must_use]
    /// First content line with leading markup removed, for listings.
    pub fn title(&self) -> &str {
        self.content
            .first()
            .map_or("", |line| {
                line.trim_start_matches(['#', '*', '-', '+', ' '])
                    .trim_end_matches(['*', '\r', ' '])
            })
    }
}
