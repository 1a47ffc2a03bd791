//! Highlight lifecycle: which notes are currently painted, and where.
//!
//! Per note the state machine is `Unpainted -> Anchored -> Unpainted` (on
//! removal or a repaint that cannot re-anchor) or `Unpainted -> Failed`,
//! which sticks until the next [`HighlightManager::paint_all`]. Whole-document
//! notes sit in `DocumentLevel` and are never resolved.
//!
//! The manager never draws anything. Every call returns
//! [`PaintInstruction`]s for the rendering layer to apply.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::ops::Range;

use relative_path::RelativePathBuf;

use crate::anchoring::{AnchorError, ConcreteRange, Confidence, Resolver, TextIndex};
use crate::models::{Annotation, NoteId};

/// Anchoring state of one note in the current paint pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorState {
    Unpainted,
    Anchored(Confidence),
    /// Resolution found nothing usable; the note itself is kept.
    Failed,
    DocumentLevel,
}

/// The materialised decoration for one anchored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight<N> {
    pub note_id: NoteId,
    /// Flat char range in the current index
    pub range: Range<usize>,
    pub concrete: ConcreteRange<N>,
    pub confidence: Confidence,
}

/// What the rendering layer should do for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintInstruction<N> {
    Paint {
        note_id: NoteId,
        range: ConcreteRange<N>,
        confidence: Confidence,
    },
    Clear {
        note_id: NoteId,
    },
    /// Scroll into view and emphasise transiently.
    Focus {
        note_id: NoteId,
        range: ConcreteRange<N>,
    },
}

impl<N> PaintInstruction<N> {
    pub fn note_id(&self) -> NoteId {
        match self {
            PaintInstruction::Paint { note_id, .. }
            | PaintInstruction::Clear { note_id }
            | PaintInstruction::Focus { note_id, .. } => *note_id,
        }
    }

    /// The `(note, range | none)` view of the instruction.
    pub fn range(&self) -> Option<&ConcreteRange<N>> {
        match self {
            PaintInstruction::Paint { range, .. } | PaintInstruction::Focus { range, .. } => {
                Some(range)
            }
            PaintInstruction::Clear { .. } => None,
        }
    }
}

/// Outcome of a paint pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintReport<N> {
    /// Clears for every retired highlight, then paints in note order
    pub instructions: Vec<PaintInstruction<N>>,
    pub anchored: usize,
    pub failed: Vec<NoteId>,
    pub document_level: usize,
}

/// Owns the note id -> highlight mapping for the rendered document.
#[derive(Debug, Clone)]
pub struct HighlightManager<N> {
    resolver: Resolver,
    document: Option<RelativePathBuf>,
    highlights: HashMap<NoteId, Highlight<N>>,
    /// Paint order of `highlights`
    order: Vec<NoteId>,
    failed: HashSet<NoteId>,
    document_level: HashSet<NoteId>,
    focused: Option<NoteId>,
}

impl<N> Default for HighlightManager<N> {
    fn default() -> Self {
        Self::new(Resolver::default())
    }
}

impl<N> HighlightManager<N> {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            document: None,
            highlights: HashMap::new(),
            order: Vec::new(),
            failed: HashSet::new(),
            document_level: HashSet::new(),
            focused: None,
        }
    }

    /// Only paint notes belonging to `document`; others are ignored.
    pub fn for_document(mut self, document: impl Into<RelativePathBuf>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn state(&self, note_id: NoteId) -> AnchorState {
        if let Some(highlight) = self.highlights.get(&note_id) {
            AnchorState::Anchored(highlight.confidence)
        } else if self.failed.contains(&note_id) {
            AnchorState::Failed
        } else if self.document_level.contains(&note_id) {
            AnchorState::DocumentLevel
        } else {
            AnchorState::Unpainted
        }
    }

    pub fn highlight(&self, note_id: NoteId) -> Option<&Highlight<N>> {
        self.highlights.get(&note_id)
    }

    /// Live highlights in paint order.
    pub fn highlights(&self) -> impl Iterator<Item = &Highlight<N>> {
        self.order.iter().filter_map(|id| self.highlights.get(id))
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    pub fn focused(&self) -> Option<NoteId> {
        self.focused
    }

    /// Retire every highlight, e.g. before the document is re-rendered.
    pub fn retire_all(&mut self) -> Vec<PaintInstruction<N>> {
        let cleared = self
            .order
            .drain(..)
            .map(|note_id| PaintInstruction::Clear { note_id })
            .collect();
        self.highlights.clear();
        self.failed.clear();
        self.document_level.clear();
        self.focused = None;
        cleared
    }

    /// Forget `note_id`, retiring its highlight if one is painted.
    pub fn remove(&mut self, note_id: NoteId) -> Option<PaintInstruction<N>> {
        self.failed.remove(&note_id);
        self.document_level.remove(&note_id);
        if self.focused == Some(note_id) {
            self.focused = None;
        }
        self.highlights.remove(&note_id)?;
        self.order.retain(|id| *id != note_id);
        Some(PaintInstruction::Clear { note_id })
    }
}

impl<N: Copy + Eq + Debug> HighlightManager<N> {
    /// Repaint from a clean slate.
    ///
    /// Notes are resolved in `(created_at, id)` order so tie-breaks and
    /// stacking are reproducible. The new highlight set is built aside and
    /// swapped in at the end; a note id listed twice is painted once.
    pub fn paint_all(&mut self, annotations: &[Annotation], index: &TextIndex<N>) -> PaintReport<N> {
        let mut instructions = self.retire_all();

        let mut ordered: Vec<&Annotation> = annotations
            .iter()
            .filter(|note| match &self.document {
                Some(document) => note.belongs_to(document),
                None => true,
            })
            .collect();
        ordered.sort_by_key(|note| (note.created_at, note.id));

        let mut highlights = HashMap::new();
        let mut order = Vec::new();
        let mut failed = HashSet::new();
        let mut document_level = HashSet::new();
        let mut failed_ids = Vec::new();

        for note in ordered {
            let note_id = note.id;
            if highlights.contains_key(&note_id)
                || failed.contains(&note_id)
                || document_level.contains(&note_id)
            {
                log::debug!("note {note_id} listed more than once, painting it once");
                continue;
            }

            if note.is_document_level {
                document_level.insert(note_id);
                continue;
            }

            let resolved = self.resolver.resolve(&note.selector, index).and_then(|res| {
                index
                    .concrete_range(res.range())
                    .map(|concrete| (res, concrete))
                    .ok_or(AnchorError::NotFound)
            });

            match resolved {
                Ok((res, concrete)) => {
                    instructions.push(PaintInstruction::Paint {
                        note_id,
                        range: concrete,
                        confidence: res.confidence,
                    });
                    order.push(note_id);
                    highlights.insert(
                        note_id,
                        Highlight {
                            note_id,
                            range: res.range(),
                            concrete,
                            confidence: res.confidence,
                        },
                    );
                }
                Err(err) => {
                    log::warn!("Could not anchor note {note_id}: {err}");
                    failed.insert(note_id);
                    failed_ids.push(note_id);
                }
            }
        }

        log::info!(
            "paint pass: {} anchored, {} failed, {} document-level",
            order.len(),
            failed_ids.len(),
            document_level.len()
        );

        let report = PaintReport {
            instructions,
            anchored: order.len(),
            failed: failed_ids,
            document_level: document_level.len(),
        };

        self.highlights = highlights;
        self.order = order;
        self.failed = failed;
        self.document_level = document_level;
        report
    }

    /// Ask for `note_id` to be scrolled into view and emphasised.
    ///
    /// No-op for notes without a highlight (failed, document-level, unknown).
    pub fn focus(&mut self, note_id: NoteId) -> Option<PaintInstruction<N>> {
        let highlight = self.highlights.get(&note_id)?;
        self.focused = Some(note_id);
        Some(PaintInstruction::Focus {
            note_id,
            range: highlight.concrete,
        })
    }
}
