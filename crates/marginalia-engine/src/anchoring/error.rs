/// Failures while turning a live selection into a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Start and end of the selection coincide; there is nothing to quote.
    #[error("select some text first")]
    EmptySelection,
    #[error("offset {offset} is outside the indexed text (length {len})")]
    IndexOutOfRange { offset: usize, len: usize },
    /// The selection touches a node the index skipped or never saw.
    #[error("selection endpoint is not inside indexed text")]
    UnindexedLocation,
}

/// Failures while re-anchoring a selector against the current document.
///
/// These are expected outcomes rather than faults: the annotation stays
/// stored and simply goes unpainted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnchorError {
    #[error("no quote, fuzzy or positional match for the selector")]
    NotFound,
    #[error("position {start}..{end} does not fit indexed text of length {len}")]
    IndexOutOfRange { start: usize, end: usize, len: usize },
}

impl AnchorError {
    /// Both variants mean "do not paint"; this only distinguishes caller bugs in logs.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, AnchorError::IndexOutOfRange { .. })
    }
}
