//! The mutation engine turns one requested comment change into a rewritten document body.
//!
//! Every operation is a pure function of the current raw body and its arguments. Nothing here
//! reads the derived [`ScannedDocument`](crate::scanner::ScannedDocument) a caller may be holding:
//! sections are re-located in the text passed in, so a stale view can never steer an edit into
//! the wrong place. Lines outside the marker being added, rewritten or removed come through
//! byte-identical.

use crate::error::{Error, Result};
use crate::marker::{self, Annotation, CLOSE_TOKEN, DEFAULT_AUTHOR};
use crate::scanner;
use serde::{Deserialize, Serialize};

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "lowercase")]
/// One logical change to the comments of a document.
pub enum Mutation {
    /// Attach a new comment after a section.
    Add {
        /// Index of the section in a scan of the current body.
        section: usize,
        /// Comment text.
        content: String,
        /// Author recorded on the new comment.
        #[serde(default = "default_author")]
        author: String,
    },
    /// Replace the text of an existing comment.
    Edit {
        /// Id of the comment to rewrite.
        id: String,
        /// Replacement text.
        content: String,
    },
    /// Remove a comment.
    Delete {
        /// Id of the comment to remove.
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// New body produced by a mutation.
pub struct MutationOutcome {
    /// The full rewritten body.
    pub body: String,
    /// Number of marker blocks added, rewritten or removed.
    pub changed: usize,
    /// The comment as it now stands (or as it stood, for a delete).
    pub annotation: Option<Annotation>,
}

impl MutationOutcome {
    fn unchanged(body: &str) -> Self {
        Self {
            body: body.to_string(),
            changed: 0,
            annotation: None,
        }
    }
}

/// Applies a mutation to a body.
///
/// # Errors
///
/// See [`add_comment`] and [`edit_comment`]. A missing id is not an error here: the body comes
/// back unchanged with `changed == 0`.
pub fn apply(body: &str, mutation: &Mutation) -> Result<MutationOutcome> {
    match mutation {
        Mutation::Add {
            section,
            content,
            author,
        } => add_comment(body, *section, author, content),
        Mutation::Edit { id, content } => edit_comment(body, id, content),
        Mutation::Delete { id } => delete_comment(body, id),
    }
}

/// Appends `\r` to generated lines when the body being edited uses CRLF endings.
fn line_suffix(lines: &[&str]) -> &'static str {
    if lines.first().is_some_and(|line| line.ends_with('\r')) {
        "\r"
    } else {
        ""
    }
}

/// First blank line at or after `start` that is not inside a marker block, or the end of the body.
fn section_end(lines: &[&str], start: usize) -> usize {
    let mut i = start;
    while i < lines.len() {
        if marker::is_open_line(lines[i]) {
            i = marker::block_end(lines, i).0 + 1;
        } else if lines[i].trim().is_empty() {
            return i;
        } else {
            i += 1;
        }
    }
    lines.len()
}

/// Adds a new comment with a fresh id and timestamp after the given section.
///
/// # Errors
///
/// Returns [`Error::SectionOutOfRange`] for an index the body does not have,
/// [`Error::EmptyComment`] for blank text, [`Error::InvalidField`] for text the marker cannot
/// carry, and [`Error::MalformedMarker`] if the result would not validate.
pub fn add_comment(
    body: &str,
    section_index: usize,
    author: &str,
    text: &str,
) -> Result<MutationOutcome> {
    if text.trim().is_empty() {
        return Err(Error::EmptyComment);
    }
    insert_annotation(body, section_index, Annotation::new(author, text, None))
}

/// Inserts a prepared annotation after the given section, tagging it with the section's id.
///
/// The marker goes after the section's last non-blank line, preceded by one blank line, so the
/// section itself is closed before the marker starts.
///
/// # Errors
///
/// As [`add_comment`].
pub fn insert_annotation(
    body: &str,
    section_index: usize,
    mut annotation: Annotation,
) -> Result<MutationOutcome> {
    let document = scanner::scan(body);
    let section = document
        .sections
        .get(section_index)
        .ok_or(Error::SectionOutOfRange {
            index: section_index,
            count: document.sections.len(),
        })?;
    annotation.target_section_id = Some(section.section_id.clone());

    let lines = marker::split_lines(body);
    let suffix = line_suffix(&lines);
    let encoded = marker::encode(&annotation)?;
    let end = section_end(&lines, section.start_line);

    let mut new_lines: Vec<String> = Vec::with_capacity(lines.len() + encoded.len() + 1);
    new_lines.extend(lines[..end].iter().map(|line| (*line).to_string()));
    new_lines.push(suffix.to_string());
    new_lines.extend(encoded.into_iter().map(|line| line + suffix));
    new_lines.extend(lines[end..].iter().map(|line| (*line).to_string()));

    let new_body = new_lines.join("\n");
    marker::validate(&new_body)?;

    tracing::debug!(
        section = %section.section_id,
        id = %annotation.id,
        insert_at = end,
        "inserted comment marker"
    );

    Ok(MutationOutcome {
        body: new_body,
        changed: 1,
        annotation: Some(annotation),
    })
}

/// Rewrites every marker whose id matches, passing other lines through untouched.
///
/// `replace` returns the lines to put in place of a matched block; an empty vector removes it.
fn rewrite_matching<F>(body: &str, id: &str, mut replace: F) -> Result<MutationOutcome>
where
    F: FnMut(&Annotation, &str) -> Result<(Vec<String>, Annotation)>,
{
    let lines = marker::split_lines(body);
    let blocks: Vec<_> = marker::marker_blocks(&lines)
        .into_iter()
        .filter(|block| block.annotation.as_ref().is_some_and(|a| a.id == id))
        .collect();

    if blocks.is_empty() {
        tracing::debug!(id, "no comment marker with this id");
        return Ok(MutationOutcome::unchanged(body));
    }

    let suffix = line_suffix(&lines);
    let mut new_lines: Vec<String> = Vec::with_capacity(lines.len());
    let mut cursor = 0;
    let mut last = None;

    for block in &blocks {
        new_lines.extend(lines[cursor..block.start].iter().map(|line| (*line).to_string()));

        if let Some(annotation) = &block.annotation {
            // Anything after the close token on its line is document text, not marker.
            let close_line = lines[block.end];
            let trailing = close_line
                .find(CLOSE_TOKEN)
                .map_or("", |at| &close_line[at + CLOSE_TOKEN.len()..]);
            let (replacement, kept) = replace(annotation, trailing)?;
            new_lines.extend(replacement.into_iter().map(|line| line + suffix));
            last = Some(kept);
        }

        cursor = block.end + 1;
    }
    new_lines.extend(lines[cursor..].iter().map(|line| (*line).to_string()));

    Ok(MutationOutcome {
        body: new_lines.join("\n"),
        changed: blocks.len(),
        annotation: last,
    })
}

/// Replaces the text of the comment with this id, keeping its author, date, id and section tag.
///
/// # Errors
///
/// Returns [`Error::EmptyComment`] for blank text and [`Error::InvalidField`] for text the marker
/// cannot carry. An unknown id yields the body unchanged with `changed == 0`.
pub fn edit_comment(body: &str, id: &str, text: &str) -> Result<MutationOutcome> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::EmptyComment);
    }

    let outcome = rewrite_matching(body, id, |annotation, trailing| {
        let updated = Annotation {
            content: text.to_string(),
            ..annotation.clone()
        };
        let mut lines = marker::encode(&updated)?;
        if let Some(close) = lines.last_mut() {
            close.push_str(trailing.trim_end_matches('\r'));
        }
        Ok((lines, updated))
    })?;

    if outcome.changed > 0 {
        tracing::debug!(id, changed = outcome.changed, "rewrote comment marker");
    }
    Ok(outcome)
}

/// Removes the marker lines of the comment with this id.
///
/// Blank lines around the marker stay where they are, as does any text following the close
/// token on its line.
///
/// # Errors
///
/// Never fails for an unknown id; the body comes back unchanged with `changed == 0`.
pub fn delete_comment(body: &str, id: &str) -> Result<MutationOutcome> {
    let outcome = rewrite_matching(body, id, |annotation, trailing| {
        let trailing = trailing.trim_end_matches('\r');
        let kept = if trailing.trim().is_empty() {
            Vec::new()
        } else {
            vec![trailing.to_string()]
        };
        Ok((kept, annotation.clone()))
    })?;

    if outcome.changed > 0 {
        tracing::debug!(id, changed = outcome.changed, "removed comment marker");
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "tests/mutation.rs"]
mod tests;
