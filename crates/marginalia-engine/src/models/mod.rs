pub mod annotation;

pub use annotation::{Annotation, DocumentNotes, LineRange, NoteId};
