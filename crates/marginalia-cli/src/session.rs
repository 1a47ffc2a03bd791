use anyhow::{Context, Result};
use marginalia_engine::anchoring::{AnchorState, Highlight, HighlightManager, Resolver, TextIndex};
use marginalia_engine::content::{ContentTree, NodeId, markdown};
use marginalia_engine::io;
use marginalia_engine::models::{Annotation, DocumentNotes, NoteId};
use relative_path::RelativePathBuf;
use std::path::{Path, PathBuf};

/// One open document with its notes painted.
pub struct Session {
    document_path: PathBuf,
    notes_path: PathBuf,
    notes: DocumentNotes,
    /// Notes in the same sidecar that belong to other documents
    foreign: Vec<Annotation>,
    tree: ContentTree,
    index: TextIndex<NodeId>,
    manager: HighlightManager<NodeId>,
}

impl Session {
    pub fn open(document_path: PathBuf, notes_path: PathBuf, resolver: Resolver) -> Result<Self> {
        let document = document_key(&document_path)?;
        let tree = ContentTree::default();
        let index = TextIndex::build(&tree);

        let mut session = Self {
            document_path,
            notes_path,
            notes: DocumentNotes::new(document.clone()),
            foreign: Vec::new(),
            tree,
            index,
            manager: HighlightManager::new(resolver).for_document(document),
        };
        session.reload()?;
        Ok(session)
    }

    /// Re-read the document and its notes, then repaint from scratch.
    pub fn reload(&mut self) -> Result<()> {
        let source = io::read_document(&self.document_path)
            .with_context(|| format!("reading {}", self.document_path.display()))?;
        let all = io::load_notes(&self.notes_path)?;

        let document = self.notes.document().to_relative_path_buf();
        let (mine, foreign): (Vec<_>, Vec<_>) =
            all.into_iter().partition(|note| note.belongs_to(&document));

        self.notes = DocumentNotes::from_notes(document, mine);
        self.foreign = foreign;
        self.tree = markdown::render(&source);
        self.index = TextIndex::build(&self.tree);
        self.repaint();
        Ok(())
    }

    pub fn repaint(&mut self) {
        let report = self.manager.paint_all(self.notes.notes(), &self.index);
        log::info!(
            "{}: {} of {} notes anchored",
            self.document_path.display(),
            report.anchored,
            self.notes.len()
        );
    }

    /// Delete a note and persist the sidecar. Returns false for unknown ids.
    pub fn delete(&mut self, note_id: NoteId) -> Result<bool> {
        if self.notes.remove(note_id).is_none() {
            return Ok(false);
        }
        self.manager.remove(note_id);
        self.save()?;
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        let mut all = self.notes.notes().to_vec();
        all.extend(self.foreign.iter().cloned());
        io::save_notes(&self.notes_path, &all)
            .with_context(|| format!("saving {}", self.notes_path.display()))?;
        Ok(())
    }

    pub fn focus(&mut self, note_id: NoteId) -> bool {
        self.manager.focus(note_id).is_some()
    }

    pub fn notes(&self) -> &[Annotation] {
        self.notes.notes()
    }

    pub fn state(&self, note_id: NoteId) -> AnchorState {
        self.manager.state(note_id)
    }

    pub fn focused(&self) -> Option<NoteId> {
        self.manager.focused()
    }

    pub fn highlights(&self) -> Vec<Highlight<NodeId>> {
        self.manager.highlights().cloned().collect()
    }

    pub fn highlight(&self, note_id: NoteId) -> Option<&Highlight<NodeId>> {
        self.manager.highlight(note_id)
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn index(&self) -> &TextIndex<NodeId> {
        &self.index
    }

    pub fn notes_path(&self) -> &Path {
        &self.notes_path
    }

    /// `id state confidence range comment` for one note.
    pub fn report_line(&self, note: &Annotation) -> String {
        let (state, confidence) = state_labels(self.state(note.id));
        let range = match self.highlight(note.id) {
            Some(h) => format!(
                "{} ({}..{})",
                self.index.line_range(h.range.clone()),
                h.range.start,
                h.range.end
            ),
            None => "-".to_string(),
        };
        format!(
            "{}  {state:<9} {confidence:<8} {range:<20} {}",
            note.id,
            note.comment.replace('\n', " ")
        )
    }
}

/// Short state and confidence labels for display.
pub fn state_labels(state: AnchorState) -> (&'static str, String) {
    match state {
        AnchorState::Anchored(confidence) => ("anchored", confidence.to_string()),
        AnchorState::Failed => ("failed", "-".to_string()),
        AnchorState::DocumentLevel => ("document", "-".to_string()),
        AnchorState::Unpainted => ("unpainted", "-".to_string()),
    }
}

/// Notes are keyed by the document's file name inside its sidecar.
fn document_key(document_path: &Path) -> Result<RelativePathBuf> {
    let name = document_path
        .file_name()
        .with_context(|| format!("{} is not a file", document_path.display()))?;
    Ok(RelativePathBuf::from(name.to_string_lossy().into_owned()))
}
