use serde::{Deserialize, Serialize};

/// Quote stored in place of `exact` for annotations on the whole document.
pub const DOCUMENT_SENTINEL: &str = "[Entire Document]";

/// The verbatim selected text plus bounded surrounding context.
///
/// `prefix` and `suffix` only disambiguate repeated occurrences of `exact`;
/// they are never required to match for a quote to anchor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextQuoteSelector {
    pub exact: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// Character offsets into the flattened text at build time.
///
/// Offsets drift as the document changes, so this is only trusted once every
/// quote-based strategy has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPositionSelector {
    pub start: usize,
    pub end: usize,
}

impl TextPositionSelector {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the offsets describe a usable range inside a text of `len` chars.
    pub fn fits_within(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

/// Serializable descriptor of an anchored span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub quote: TextQuoteSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<TextPositionSelector>,
}

impl Selector {
    /// Selector covering a whole document of `len` flattened characters.
    pub fn document(len: usize) -> Self {
        Self {
            quote: TextQuoteSelector {
                exact: DOCUMENT_SENTINEL.to_string(),
                prefix: String::new(),
                suffix: String::new(),
            },
            position: Some(TextPositionSelector::new(0, len)),
        }
    }

    pub fn is_document_sentinel(&self) -> bool {
        self.quote.exact == DOCUMENT_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_selector_spans_whole_text() {
        let selector = Selector::document(42);
        assert!(selector.is_document_sentinel());
        assert_eq!(selector.position, Some(TextPositionSelector::new(0, 42)));
    }

    #[test]
    fn test_position_fits_within() {
        assert!(TextPositionSelector::new(3, 3).fits_within(3));
        assert!(TextPositionSelector::new(0, 10).fits_within(10));
        assert!(!TextPositionSelector::new(0, 11).fits_within(10));
        assert!(!TextPositionSelector::new(5, 4).fits_within(10));
    }

    #[test]
    fn test_missing_context_and_position_deserialize_to_defaults() {
        let selector: Selector = serde_json::from_str(r#"{"quote":{"exact":"fox"}}"#).unwrap();

        assert_eq!(selector.quote.exact, "fox");
        assert_eq!(selector.quote.prefix, "");
        assert_eq!(selector.quote.suffix, "");
        assert_eq!(selector.position, None);
    }

    #[test]
    fn test_selector_fields_survive_json() {
        let selector = Selector {
            quote: TextQuoteSelector {
                exact: "brown fox".to_string(),
                prefix: "The quick ".to_string(),
                suffix: " jumps".to_string(),
            },
            position: Some(TextPositionSelector::new(10, 19)),
        };

        let json = serde_json::to_string(&selector).unwrap();
        let back: Selector = serde_json::from_str(&json).unwrap();

        assert_eq!(back, selector);
    }
}
