use crate::models::Annotation;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to a document's file name to find its sidecar notes file.
pub const NOTES_SUFFIX: &str = ".notes.json";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes file {path}: {source}")]
    InvalidNotes {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Not a document path: {0}")]
    InvalidDocumentPath(PathBuf),
}

/// Read a document's source text.
pub fn read_document(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Sidecar path for `document`: `<notes_dir or document dir>/<file name>.notes.json`.
pub fn notes_path_for(document: &Path, notes_dir: Option<&Path>) -> Result<PathBuf, IoError> {
    let file_name = document
        .file_name()
        .ok_or_else(|| IoError::InvalidDocumentPath(document.to_path_buf()))?;

    let mut name = file_name.to_os_string();
    name.push(NOTES_SUFFIX);

    let dir = match notes_dir {
        Some(dir) => dir.to_path_buf(),
        None => document.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}

/// Load every note stored in a sidecar file. A missing file has no notes.
pub fn load_notes(path: &Path) -> Result<Vec<Annotation>, IoError> {
    if !path.exists() {
        log::debug!("no notes file at {}", path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(IoError::Io)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| IoError::InvalidNotes {
        path: path.to_path_buf(),
        source,
    })
}

/// Write notes as pretty-printed JSON, creating parent directories as needed.
pub fn save_notes(path: &Path, notes: &[Annotation]) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    let mut json = serde_json::to_string_pretty(notes).map_err(|source| IoError::InvalidNotes {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(IoError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{Selector, TextQuoteSelector};
    use crate::tests::{create_test_file, create_test_notes_dir};
    use pretty_assertions::assert_eq;

    fn sample_note() -> Annotation {
        let selector = Selector {
            quote: TextQuoteSelector {
                exact: "brown fox".to_string(),
                prefix: "The quick ".to_string(),
                suffix: " jumps".to_string(),
            },
            position: None,
        };
        Annotation::for_selection("story.md", selector, "a fox")
    }

    #[test]
    fn test_read_document() {
        let dir = create_test_notes_dir();
        let path = create_test_file(&dir, "story.md", "# Story\n");

        assert_eq!(read_document(&path).unwrap(), "# Story\n");
    }

    #[test]
    fn test_read_missing_document() {
        let dir = create_test_notes_dir();
        let result = read_document(&dir.path().join("missing.md"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_notes_path_defaults_to_document_dir() {
        let path = notes_path_for(Path::new("/docs/story.md"), None).unwrap();
        assert_eq!(path, PathBuf::from("/docs/story.md.notes.json"));
    }

    #[test]
    fn test_notes_path_in_notes_dir() {
        let path = notes_path_for(Path::new("/docs/story.md"), Some(Path::new("/notes"))).unwrap();
        assert_eq!(path, PathBuf::from("/notes/story.md.notes.json"));
    }

    #[test]
    fn test_notes_path_needs_a_file_name() {
        assert!(matches!(
            notes_path_for(Path::new("/"), None),
            Err(IoError::InvalidDocumentPath(_))
        ));
    }

    #[test]
    fn test_missing_notes_file_is_empty() {
        let dir = create_test_notes_dir();
        let notes = load_notes(&dir.path().join("none.notes.json")).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_save_then_load_notes() {
        let dir = create_test_notes_dir();
        let path = dir.path().join("nested").join("story.md.notes.json");
        let note = sample_note();

        save_notes(&path, std::slice::from_ref(&note)).unwrap();
        let loaded = load_notes(&path).unwrap();

        assert_eq!(loaded, vec![note]);
    }

    #[test]
    fn test_corrupt_notes_file() {
        let dir = create_test_notes_dir();
        let path = create_test_file(&dir, "bad.notes.json", "{ not json");

        let err = load_notes(&path).unwrap_err();
        assert!(matches!(err, IoError::InvalidNotes { .. }));
        assert!(err.to_string().contains("bad.notes.json"));
    }
}
