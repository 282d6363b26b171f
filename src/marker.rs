//! The inline comment marker: the only structured content embedded in a document.
//!
//! A marker is an HTML comment that markdown renderers hide, laid out one field per line:
//!
//! ```text
//! <!--comment:line-3
//! author: You
//! date: 2024-05-01T09:30:00.000Z
//! id: 0b6c1a9e-5a43-4f53-9d0e-2f3f6f1f4a11
//! The comment body, possibly
//! over several lines.
//! -->
//! ```
//!
//! The `:line-3` tag on the open token names the section the comment was written against.
//! Markers without it are the legacy form and get attached by position when scanned.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Literal that opens every marker block.
pub const OPEN_TOKEN: &str = "<!--comment";
/// Literal that closes a marker block.
pub const CLOSE_TOKEN: &str = "-->";
/// Author written on new comments when none is configured.
pub const DEFAULT_AUTHOR: &str = "You";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A user-authored note attached to a section, decoded from a marker.
pub struct Annotation {
    /// Free-text author name.
    pub author: String,
    /// ISO-8601 creation timestamp, kept verbatim so re-encoding is lossless.
    pub date: String,
    /// Unique token assigned at creation and never changed.
    pub id: String,
    /// Comment body; may span several lines.
    pub content: String,
    /// Section identifier captured when the comment was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_section_id: Option<String>,
}

impl Annotation {
    #[must_use]
    /// Creates a fresh annotation with a new UUID and the current UTC time.
    pub fn new(author: &str, content: &str, target_section_id: Option<String>) -> Self {
        Self {
            author: author.trim().to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            id: Uuid::new_v4().to_string(),
            content: content.trim().to_string(),
            target_section_id,
        }
    }

    #[must_use]
    /// Parses the stored date, if it is valid RFC 3339.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Line range of one `<!--comment` block within a body, with its decoded annotation.
pub struct MarkerBlock {
    /// Index of the open-token line.
    pub start: usize,
    /// Index of the line holding the close token (inclusive).
    ///
    /// For an unterminated block this is the last line of the body.
    pub end: usize,
    /// Whether a close token was found.
    pub terminated: bool,
    /// The decoded annotation, or `None` when the block does not match the grammar.
    pub annotation: Option<Annotation>,
}

#[must_use]
/// Splits a body into lines on `\n` only, so that joining with `\n` restores it exactly.
pub fn split_lines(body: &str) -> Vec<&str> {
    body.split('\n').collect()
}

#[must_use]
/// True when the line begins a marker block.
pub fn is_open_line(line: &str) -> bool {
    line.starts_with(OPEN_TOKEN)
}

/// Reads the optional section tag off an open line.
///
/// `Some(None)` is the legacy untagged form; `None` means the open line is not well formed.
fn parse_open(line: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix(OPEN_TOKEN)?.trim_end();
    if rest.is_empty() {
        return Some(None);
    }
    let section_id = rest.strip_prefix(':')?.trim();
    if section_id.is_empty() || section_id.contains(char::is_whitespace) {
        return None;
    }
    Some(Some(section_id.to_string()))
}

fn parse_field(line: &str, name: &str) -> Option<String> {
    if line.contains(CLOSE_TOKEN) {
        return None;
    }
    line.strip_prefix(name)
        .and_then(|value| value.strip_prefix(':'))
        .map(|value| value.trim().to_string())
}

/// Finds where the block opened at `start` ends.
///
/// Returns the index of the first line at or after `start` that contains the close token, and
/// whether one was found at all. Unterminated blocks run to the last line.
#[must_use]
pub fn block_end(lines: &[&str], start: usize) -> (usize, bool) {
    lines[start..]
        .iter()
        .position(|line| line.contains(CLOSE_TOKEN))
        .map_or((lines.len().saturating_sub(1), false), |offset| {
            (start + offset, true)
        })
}

#[must_use]
/// Decodes a complete block (open line through close line) into an annotation.
///
/// Returns `None` if the three fields are not present in `author`, `date`, `id` order before the
/// close token, if the id is blank, or if the open line carries anything but a section tag.
pub fn decode(block: &[&str]) -> Option<Annotation> {
    let (open, rest) = block.split_first()?;
    let target_section_id = parse_open(open)?;
    let [author, date, id, body @ ..] = rest else {
        return None;
    };
    let author = parse_field(author, "author")?;
    let date = parse_field(date, "date")?;
    let id = parse_field(id, "id")?;
    if id.is_empty() {
        return None;
    }

    let (close, middle) = body.split_last()?;
    let close_at = close.find(CLOSE_TOKEN)?;
    let mut content_lines = middle.to_vec();
    content_lines.push(&close[..close_at]);

    Some(Annotation {
        author,
        date,
        id,
        content: content_lines.join("\n").trim().to_string(),
        target_section_id,
    })
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') || value.contains(CLOSE_TOKEN) {
        return Err(Error::InvalidField(format!(
            "{name} must be a single line without `{CLOSE_TOKEN}`"
        )));
    }
    if value.trim() != value {
        return Err(Error::InvalidField(format!(
            "{name} must not start or end with whitespace"
        )));
    }
    Ok(())
}

/// Encodes an annotation as marker lines, fields in fixed order.
///
/// # Errors
///
/// Returns [`Error::EmptyComment`] for blank content and [`Error::InvalidField`] when a value
/// would break the grammar or not read back unchanged (multi-line fields, padded fields, a
/// blank id, or the close token anywhere).
pub fn encode(annotation: &Annotation) -> Result<Vec<String>> {
    check_field("author", &annotation.author)?;
    check_field("date", &annotation.date)?;
    check_field("id", &annotation.id)?;
    if annotation.id.trim().is_empty() {
        return Err(Error::InvalidField("id must not be blank".to_string()));
    }

    let open = match &annotation.target_section_id {
        Some(section_id) => {
            check_field("section id", section_id)?;
            if section_id.is_empty() || section_id.contains(char::is_whitespace) {
                return Err(Error::InvalidField(format!(
                    "section id {section_id:?} must be a single word"
                )));
            }
            format!("{OPEN_TOKEN}:{section_id}")
        }
        None => OPEN_TOKEN.to_string(),
    };

    let content = annotation.content.trim();
    if content.is_empty() {
        return Err(Error::EmptyComment);
    }
    if content.contains(CLOSE_TOKEN) {
        return Err(Error::InvalidField(format!(
            "comment text must not contain `{CLOSE_TOKEN}`"
        )));
    }

    let mut lines = vec![
        open,
        format!("author: {}", annotation.author),
        format!("date: {}", annotation.date),
        format!("id: {}", annotation.id),
    ];
    lines.extend(content.lines().map(str::to_string));
    lines.push(CLOSE_TOKEN.to_string());
    Ok(lines)
}

#[must_use]
/// Locates every `<!--comment` block in a line sequence, in order.
pub fn marker_blocks(lines: &[&str]) -> Vec<MarkerBlock> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_open_line(lines[i]) {
            let (end, terminated) = block_end(lines, i);
            let annotation = if terminated {
                decode(&lines[i..=end])
            } else {
                None
            };
            blocks.push(MarkerBlock {
                start: i,
                end,
                terminated,
                annotation,
            });
            i = end + 1;
        } else {
            i += 1;
        }
    }

    blocks
}

/// Rejects a body holding any `<!--comment` block that does not decode.
///
/// Plain HTML comments are left alone; only blocks that start with the marker's open token are
/// held to the grammar.
///
/// # Errors
///
/// Returns [`Error::MalformedMarker`] describing the first offending block.
pub fn validate(body: &str) -> Result<()> {
    let lines = split_lines(body);
    let malformed = marker_blocks(&lines)
        .into_iter()
        .find(|block| block.annotation.is_none());

    if let Some(block) = malformed {
        let text = lines[block.start..=block.end].join("\n");
        tracing::warn!(line = block.start + 1, "rejecting body with malformed comment marker");
        return Err(Error::MalformedMarker {
            line: block.start + 1,
            text,
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/marker.rs"]
mod tests;
