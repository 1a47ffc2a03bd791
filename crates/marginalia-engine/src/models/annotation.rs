use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchoring::Selector;

/// Unique identifier for a note
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive, 1-indexed line span. Display-only; never used to anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "L{}", self.start)
        } else {
            write!(f, "L{}-{}", self.start, self.end)
        }
    }
}

/// A comment attached to a span of a document, or to the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: NoteId,
    /// Owning document, relative to the notes root
    pub document: RelativePathBuf,
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
    pub comment: String,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
    #[serde(default)]
    pub is_document_level: bool,
}

impl Annotation {
    /// Note on a span described by `selector`.
    pub fn for_selection(
        document: impl Into<RelativePathBuf>,
        selector: Selector,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: NoteId::new(),
            document: document.into(),
            selector,
            line_range: None,
            comment: comment.into(),
            created_at: now_millis(),
            is_document_level: false,
        }
    }

    /// Note on the whole document; never anchored or painted inline.
    pub fn for_document(
        document: impl Into<RelativePathBuf>,
        document_len: usize,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: NoteId::new(),
            document: document.into(),
            selector: Selector::document(document_len),
            line_range: None,
            comment: comment.into(),
            created_at: now_millis(),
            is_document_level: true,
        }
    }

    pub fn with_line_range(mut self, line_range: LineRange) -> Self {
        self.line_range = Some(line_range);
        self
    }

    pub fn belongs_to(&self, document: &RelativePath) -> bool {
        self.document.as_relative_path() == document
    }
}

/// All notes of one document, kept in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNotes {
    document: RelativePathBuf,
    notes: Vec<Annotation>,
}

impl DocumentNotes {
    pub fn new(document: impl Into<RelativePathBuf>) -> Self {
        Self {
            document: document.into(),
            notes: Vec::new(),
        }
    }

    /// Build from stored notes, dropping any that belong to other documents.
    pub fn from_notes(document: impl Into<RelativePathBuf>, notes: Vec<Annotation>) -> Self {
        let mut doc_notes = Self::new(document);
        for note in notes {
            if note.belongs_to(&doc_notes.document) {
                doc_notes.notes.push(note);
            }
        }
        doc_notes.sort();
        doc_notes
    }

    pub fn document(&self) -> &RelativePath {
        &self.document
    }

    pub fn notes(&self) -> &[Annotation] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<Annotation> {
        self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Annotation> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Add a note, re-homing it to this document if needed.
    pub fn add(&mut self, mut note: Annotation) -> NoteId {
        note.document = self.document.clone();
        let id = note.id;
        self.notes.retain(|n| n.id != id);
        self.notes.push(note);
        self.sort();
        id
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Annotation> {
        let pos = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(pos))
    }

    /// Replace the comment body. Returns false when no such note exists.
    pub fn update_comment(&mut self, id: NoteId, comment: impl Into<String>) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                note.comment = comment.into();
                true
            }
            None => false,
        }
    }

    fn sort(&mut self) {
        self.notes.sort_by_key(|n| (n.created_at, n.id));
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
