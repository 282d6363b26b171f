//! Single-pass scan of a document body into sections and their comments.
//!
//! The scanner is a small state machine over lines. It is either between sections (`Idle`),
//! accumulating a section (`InSection`), or collecting the lines of a comment marker
//! (`InMarker`). Marker lines never become section content. Decoded comments are resolved to
//! their owning section once the whole body has been seen, so a tag can point at any section.
//!
//! The result, [`ScannedDocument`], is derived data: it is rebuilt from the raw text after every
//! load and every save, and is never written back.

use crate::marker::{self, Annotation};
use crate::section::Section;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Where the scanner is within the body.
enum ScanState {
    /// Between sections; the next content line opens one.
    Idle,
    /// Accumulating the most recently opened section.
    InSection,
    /// Collecting a marker block.
    InMarker {
        /// Line holding the open token.
        start: usize,
        /// Whether a section was open when the marker began.
        within_section: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// A `<!--comment` block that did not decode and was left as plain text.
pub struct SkippedBlock {
    /// Line holding the open token.
    pub start_line: usize,
    /// Last line of the block (inclusive).
    pub end_line: usize,
}

/// A decoded marker waiting for its owner to be known.
struct PendingComment {
    annotation: Annotation,
    /// Most recent non-empty section at the marker's position.
    fallback: Option<usize>,
    line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Sections of one body paired with their comments.
pub struct ScannedDocument {
    /// Sections in scan order.
    pub sections: Vec<Section>,
    /// Marker blocks that failed to decode.
    pub skipped: Vec<SkippedBlock>,
    /// Comments that could not be attached to any section.
    pub dropped: usize,
    #[serde(skip)]
    line_index: Vec<Option<usize>>,
}

impl ScannedDocument {
    #[must_use]
    /// Scans a body. Equivalent to [`scan`].
    pub fn scan(body: &str) -> Self {
        scan(body)
    }

    #[must_use]
    /// The section owning a content line, if any.
    pub fn section_at_line(&self, line: usize) -> Option<&Section> {
        self.line_index
            .get(line)
            .copied()
            .flatten()
            .map(|index| &self.sections[index])
    }

    #[must_use]
    /// Looks a section up by its `line-<N>` id.
    pub fn section_by_id(&self, section_id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.section_id == section_id)
    }

    #[must_use]
    /// Finds a comment by id together with the section holding it.
    pub fn find_comment(&self, id: &str) -> Option<(&Section, &Annotation)> {
        self.sections.iter().find_map(|section| {
            section
                .comments
                .iter()
                .find(|comment| comment.id == id)
                .map(|comment| (section, comment))
        })
    }

    #[must_use]
    /// Total number of attached comments.
    pub fn comment_count(&self) -> usize {
        self.sections.iter().map(|section| section.comments.len()).sum()
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_list_item(line: &str) -> bool {
    if ["- ", "* ", "+ "].iter().any(|bullet| line.starts_with(bullet)) {
        return true;
    }
    let bytes = line.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    digits > 0
        && matches!(bytes.get(digits), Some(b'.' | b')'))
        && matches!(bytes.get(digits + 1), Some(b' ' | b'\t'))
}

fn is_label(line: &str) -> bool {
    let Some((word, rest)) = line.split_once(':') else {
        return false;
    };
    let mut chars = word.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && rest.chars().next().is_none_or(char::is_whitespace)
}

#[must_use]
/// True when a line closes the running section and opens a new one.
///
/// Headings, list items, `**bold**` leads and `Label:` prefixes all qualify.
pub fn starts_new_section(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("**") || is_list_item(line) || is_label(line)
}

/// Accumulates sections and comments as lines are fed in.
struct Scanner<'a> {
    lines: Vec<&'a str>,
    state: ScanState,
    sections: Vec<Section>,
    line_index: Vec<Option<usize>>,
    pending: Vec<PendingComment>,
    skipped: Vec<SkippedBlock>,
}

impl<'a> Scanner<'a> {
    fn new(body: &'a str) -> Self {
        let lines = marker::split_lines(body);
        let line_count = lines.len();
        Self {
            lines,
            state: ScanState::Idle,
            sections: Vec::new(),
            line_index: vec![None; line_count],
            pending: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn open_section(&mut self, line_no: usize) {
        let index = self.sections.len();
        self.sections.push(Section {
            index,
            section_id: Section::id_for_line(line_no),
            start_line: line_no,
            end_line: line_no,
            content: vec![self.lines[line_no].to_string()],
            comments: Vec::new(),
        });
        self.line_index[line_no] = Some(index);
    }

    fn extend_section(&mut self, line_no: usize) {
        let index = self.sections.len() - 1;
        let section = &mut self.sections[index];
        section.content.push(self.lines[line_no].to_string());
        section.end_line = line_no;
        self.line_index[line_no] = Some(index);
    }

    fn step(&mut self, line_no: usize) {
        let line = self.lines[line_no];
        let state = self.state;

        self.state = match state {
            ScanState::InMarker {
                start,
                within_section,
            } => {
                if line.contains(marker::CLOSE_TOKEN) {
                    self.finish_marker(start, line_no);
                    if within_section {
                        ScanState::InSection
                    } else {
                        ScanState::Idle
                    }
                } else {
                    state
                }
            }
            _ if marker::is_open_line(line) => {
                let within_section = state == ScanState::InSection;
                if line.contains(marker::CLOSE_TOKEN) {
                    self.finish_marker(line_no, line_no);
                    state
                } else {
                    ScanState::InMarker {
                        start: line_no,
                        within_section,
                    }
                }
            }
            _ if is_blank(line) => ScanState::Idle,
            ScanState::InSection if !starts_new_section(line) => {
                self.extend_section(line_no);
                ScanState::InSection
            }
            ScanState::Idle | ScanState::InSection => {
                self.open_section(line_no);
                ScanState::InSection
            }
        };
    }

    fn finish_marker(&mut self, start: usize, end: usize) {
        match marker::decode(&self.lines[start..=end]) {
            Some(annotation) => self.pending.push(PendingComment {
                annotation,
                fallback: self.sections.len().checked_sub(1),
                line: start,
            }),
            None => {
                tracing::debug!(line = start + 1, "skipping undecodable comment marker");
                self.skipped.push(SkippedBlock {
                    start_line: start,
                    end_line: end,
                });
            }
        }
    }

    fn finish(mut self) -> ScannedDocument {
        if let ScanState::InMarker { start, .. } = self.state {
            tracing::debug!(line = start + 1, "comment marker is never closed");
            self.skipped.push(SkippedBlock {
                start_line: start,
                end_line: self.lines.len() - 1,
            });
        }

        let by_id: HashMap<String, usize> = self
            .sections
            .iter()
            .map(|section| (section.section_id.clone(), section.index))
            .collect();

        let mut dropped = 0;
        for pending in self.pending {
            let tagged = pending
                .annotation
                .target_section_id
                .as_ref()
                .map(|section_id| by_id.get(section_id).copied());

            let owner = match tagged {
                Some(Some(index)) => Some(index),
                Some(None) => {
                    tracing::debug!(
                        line = pending.line + 1,
                        id = %pending.annotation.id,
                        "comment target no longer matches a section, attaching by position"
                    );
                    pending.fallback
                }
                None => pending.fallback,
            };

            if let Some(index) = owner {
                self.sections[index].comments.push(pending.annotation);
            } else {
                tracing::debug!(
                    line = pending.line + 1,
                    id = %pending.annotation.id,
                    "dropping comment with no preceding section"
                );
                dropped += 1;
            }
        }

        ScannedDocument {
            sections: self.sections,
            skipped: self.skipped,
            dropped,
            line_index: self.line_index,
        }
    }
}

#[must_use]
/// Partitions a body into sections and attaches every decodable comment marker.
///
/// Tagged markers join the section whose id they carry. Untagged markers, and tagged ones whose
/// section has drifted away, join the most recent non-empty section before them; a marker with
/// no section before it is dropped.
pub fn scan(body: &str) -> ScannedDocument {
    let mut scanner = Scanner::new(body);
    for line_no in 0..scanner.lines.len() {
        scanner.step(line_no);
    }

    let document = scanner.finish();
    tracing::debug!(
        sections = document.sections.len(),
        comments = document.comment_count(),
        skipped = document.skipped.len(),
        dropped = document.dropped,
        "scanned document"
    );
    document
}

#[cfg(test)]
#[path = "tests/scanner.rs"]
mod tests;
