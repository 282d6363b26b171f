//! The session state bridging a persisted document and the comments shown for it.
//!
//! A front end needs a single source of truth that can be interrogated and mutated as the user
//! browses and comments. We get it by treating the raw body as authoritative: every change is
//! computed from the current body, validated, written through the store, and only once the
//! write succeeds do we adopt the new body and rescan it. A failed save leaves body, sections
//! and selection exactly as they were.
//!
//! Saves are last-write-wins at whole-document granularity. Two sessions saving the same
//! document race, and the later write silently discards the earlier one.

use crate::error::{Error, Result};
use crate::input::DocumentEntry;
use crate::marker::{self, Annotation};
use crate::mutation::{self, Mutation, MutationOutcome};
use crate::scanner::{self, ScannedDocument};
use crate::store::DocumentStore;

/// Open document, its scan, and what the user has selected in it.
pub struct AppState<S: DocumentStore> {
    store: S,
    /// Author recorded on comments added in this session.
    pub author: String,
    current_path: Option<String>,
    body: String,
    /// Sections and comments derived from the current body.
    pub document: ScannedDocument,
    /// Section whose comments are being viewed.
    pub selected_section: Option<usize>,
    /// Status feedback for the front end.
    pub message: Option<String>,
}

impl<S: DocumentStore> AppState<S> {
    #[must_use]
    /// Starts a session with no document open.
    pub fn new(store: S, author: impl Into<String>) -> Self {
        Self {
            store,
            author: author.into(),
            current_path: None,
            body: String::new(),
            document: scanner::scan(""),
            selected_section: None,
            message: None,
        }
    }

    #[must_use]
    /// The store documents are read from and saved to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists the documents available in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot list its documents.
    pub fn documents(&self) -> Result<Vec<DocumentEntry>> {
        self.store.list()
    }

    #[must_use]
    /// Path of the open document.
    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    #[must_use]
    /// The last body read or successfully saved.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Reads and scans a document, replacing whatever was open.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot read the document; the previous document stays open.
    pub fn open(&mut self, path: &str) -> Result<()> {
        let body = self.store.read(path)?;
        self.document = scanner::scan(&body);
        self.body = body;
        self.current_path = Some(path.to_string());
        self.selected_section = None;
        self.message = None;
        tracing::debug!(
            path,
            sections = self.document.sections.len(),
            comments = self.document.comment_count(),
            "opened document"
        );
        Ok(())
    }

    /// Re-reads the open document from the store, discarding nothing but the cached scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDocument`] if nothing is open, or the store's read error.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.current_path.clone().ok_or(Error::NoDocument)?;
        let selected = self.selected_section;
        self.open(&path)?;
        self.selected_section = selected.filter(|&index| index < self.document.sections.len());
        Ok(())
    }

    /// Selects the section whose comments are shown and which new comments attach to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionOutOfRange`] for an index the document does not have.
    pub fn select_section(&mut self, index: usize) -> Result<()> {
        let count = self.document.sections.len();
        if index >= count {
            return Err(Error::SectionOutOfRange { index, count });
        }
        self.selected_section = Some(index);
        Ok(())
    }

    #[must_use]
    /// Comments on the selected section, or none when nothing is selected.
    pub fn selected_comments(&self) -> &[Annotation] {
        self.selected_section
            .and_then(|index| self.document.sections.get(index))
            .map(|section| section.comments.as_slice())
            .unwrap_or(&[])
    }

    /// Adds a comment to the selected section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] when no section is selected, otherwise as
    /// [`AppState::add_comment_to`].
    pub fn add_comment(&mut self, text: &str) -> Result<Annotation> {
        let index = self.selected_section.ok_or(Error::NoSelection)?;
        self.add_comment_to(index, text)
    }

    /// Adds a comment to the section at `index` and saves the document.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for a bad index or unusable text, a validation error, or the
    /// store's write error. On any error nothing changes.
    pub fn add_comment_to(&mut self, index: usize, text: &str) -> Result<Annotation> {
        let mutation = Mutation::Add {
            section: index,
            content: text.to_string(),
            author: self.author.clone(),
        };
        self.perform(&mutation)
    }

    /// Replaces the text of a comment and saves the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommentNotFound`] if no marker carries this id, otherwise as
    /// [`AppState::add_comment_to`].
    pub fn edit_comment(&mut self, id: &str, text: &str) -> Result<Annotation> {
        self.perform(&Mutation::Edit {
            id: id.to_string(),
            content: text.to_string(),
        })
    }

    /// Removes a comment and saves the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommentNotFound`] if no marker carries this id, or the store's write
    /// error.
    pub fn delete_comment(&mut self, id: &str) -> Result<Annotation> {
        self.perform(&Mutation::Delete { id: id.to_string() })
    }

    /// Runs one mutation against the current body and commits it.
    ///
    /// # Errors
    ///
    /// As the specific operations above.
    pub fn perform(&mut self, mutation: &Mutation) -> Result<Annotation> {
        let result = self.try_perform(mutation);
        match &result {
            Ok(annotation) => {
                self.message = Some(match mutation {
                    Mutation::Add { .. } => "Comment added".to_string(),
                    Mutation::Edit { .. } => "Comment updated".to_string(),
                    Mutation::Delete { .. } => "Comment deleted".to_string(),
                });
                tracing::info!(id = %annotation.id, "comment change saved");
            }
            Err(e) => {
                self.message = Some(format!("Error saving: {e}"));
                tracing::warn!(error = %e, "comment change rejected");
            }
        }
        result
    }

    fn try_perform(&mut self, mutation: &Mutation) -> Result<Annotation> {
        let path = self.current_path.clone().ok_or(Error::NoDocument)?;
        let outcome = mutation::apply(&self.body, mutation)?;

        let Some(annotation) = outcome.annotation.clone().filter(|_| outcome.changed > 0) else {
            return Err(match mutation {
                Mutation::Edit { id, .. } | Mutation::Delete { id } => {
                    Error::CommentNotFound(id.clone())
                }
                Mutation::Add { section, .. } => Error::SectionOutOfRange {
                    index: *section,
                    count: self.document.sections.len(),
                },
            });
        };

        self.commit(&path, outcome)?;
        Ok(annotation)
    }

    /// Validates and persists a new body, then adopts it and rescans.
    fn commit(&mut self, path: &str, outcome: MutationOutcome) -> Result<()> {
        marker::validate(&outcome.body)?;
        self.store.write(path, &outcome.body)?;

        let selected_id = self
            .selected_section
            .and_then(|index| self.document.sections.get(index))
            .map(|section| section.section_id.clone());

        self.document = scanner::scan(&outcome.body);
        self.body = outcome.body;

        self.selected_section = selected_id
            .and_then(|id| self.document.section_by_id(&id).map(|section| section.index))
            .or(self
                .selected_section
                .filter(|&index| index < self.document.sections.len()));

        tracing::debug!(
            path,
            changed = outcome.changed,
            comments = self.document.comment_count(),
            "committed document body"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/app_state.rs"]
mod tests;
