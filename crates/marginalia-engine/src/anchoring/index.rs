//! Flattened, offset-addressable view of a document's visible text.
//!
//! A [`TextIndex`] concatenates every text-bearing node a [`TextSource`]
//! yields, in document order, and remembers which node each run of
//! characters came from. Offsets are counted in `char`s so that selectors
//! stay meaningful regardless of how the host encodes strings.

use std::fmt::Debug;
use std::ops::Range;

use crate::anchoring::SelectorError;
use crate::models::LineRange;

/// Adapter from a concrete content model to the indexer.
///
/// Implementations visit text-bearing nodes in reading order and must skip
/// anything the host marks as non-indexable.
pub trait TextSource {
    /// Handle identifying a text-bearing node of the content model.
    type Node: Copy + Eq + Debug;

    fn for_each_text(&self, visit: &mut dyn FnMut(Self::Node, &str));
}

/// A point inside a text-bearing node: `offset` chars from the node start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> Location<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A range expressed in content-model locations, ready to be painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcreteRange<N> {
    pub start: Location<N>,
    pub end: Location<N>,
}

/// A live selection. `anchor` and `focus` may be in either order.
pub type Selection<N> = ConcreteRange<N>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<N> {
    node: N,
    start: usize,
    len: usize,
}

impl<N> Segment<N> {
    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Immutable flattened text plus the map back to content-model nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextIndex<N> {
    text: String,
    chars: Vec<char>,
    segments: Vec<Segment<N>>,
}

impl<N: Copy + Eq + Debug> TextIndex<N> {
    /// Index `source` in one linear pass. Empty text nodes are ignored.
    pub fn build<S>(source: &S) -> Self
    where
        S: TextSource<Node = N> + ?Sized,
    {
        let mut text = String::new();
        let mut chars = Vec::new();
        let mut segments = Vec::new();

        source.for_each_text(&mut |node, content| {
            let before = chars.len();
            chars.extend(content.chars());
            let len = chars.len() - before;
            if len == 0 {
                return;
            }
            text.push_str(content);
            segments.push(Segment {
                node,
                start: before,
                len,
            });
        });

        Self {
            text,
            chars,
            segments,
        }
    }

    pub fn flat_text(&self) -> &str {
        &self.text
    }

    /// Length of the flattened text in chars.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of text-bearing nodes that contributed to the index.
    pub fn node_count(&self) -> usize {
        self.segments.len()
    }

    /// Copy out a char range, clamped to the indexed text.
    pub fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Map a flat offset to a node location.
    ///
    /// Offsets on a node boundary resolve to the start of the following node;
    /// `len()` resolves to the end of the last node. Returns `None` past the
    /// end or when nothing was indexed.
    pub fn locate(&self, offset: usize) -> Option<Location<N>> {
        let last = self.segments.last()?;
        if offset > self.len() {
            return None;
        }
        if offset == self.len() {
            return Some(Location::new(last.node, last.len));
        }
        let idx = self.segments.partition_point(|s| s.end() <= offset);
        let segment = &self.segments[idx];
        Some(Location::new(segment.node, offset - segment.start))
    }

    /// Like [`locate`](Self::locate) but biased towards the preceding node,
    /// so a range end stays inside the node holding its last character.
    pub fn locate_end(&self, offset: usize) -> Option<Location<N>> {
        if offset == 0 || offset > self.len() {
            return self.locate(offset);
        }
        let idx = self.segments.partition_point(|s| s.end() < offset);
        let segment = self.segments.get(idx)?;
        Some(Location::new(segment.node, offset - segment.start))
    }

    /// Concrete locations for a flat char range.
    pub fn concrete_range(&self, range: Range<usize>) -> Option<ConcreteRange<N>> {
        if range.start > range.end {
            return None;
        }
        let start = self.locate(range.start)?;
        let end = if range.is_empty() {
            start
        } else {
            self.locate_end(range.end)?
        };
        Some(ConcreteRange { start, end })
    }

    /// Inverse of [`locate`](Self::locate).
    pub fn offset_of(&self, location: &Location<N>) -> Result<usize, SelectorError> {
        let segment = self
            .segments
            .iter()
            .find(|s| s.node == location.node)
            .ok_or(SelectorError::UnindexedLocation)?;
        if location.offset > segment.len {
            return Err(SelectorError::IndexOutOfRange {
                offset: location.offset,
                len: segment.len,
            });
        }
        Ok(segment.start + location.offset)
    }

    /// 1-indexed lines of the flattened text covered by `range`.
    pub fn line_range(&self, range: Range<usize>) -> LineRange {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let newlines_before = |offset: usize| self.chars[..offset].iter().filter(|&&c| c == '\n').count();

        let start_line = newlines_before(start) + 1;
        let last_char = if end > start { end - 1 } else { start };
        let end_line = newlines_before(last_char) + 1;
        LineRange::new(start_line, end_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal source: each string is a node, identified by its position.
    struct Fragments(Vec<&'static str>);

    impl TextSource for Fragments {
        type Node = usize;

        fn for_each_text(&self, visit: &mut dyn FnMut(usize, &str)) {
            for (i, text) in self.0.iter().enumerate() {
                visit(i, text);
            }
        }
    }

    fn index(parts: &[&'static str]) -> TextIndex<usize> {
        TextIndex::build(&Fragments(parts.to_vec()))
    }

    #[test]
    fn test_flat_text_concatenates_in_order() {
        let idx = index(&["The ", "quick", " fox"]);
        assert_eq!(idx.flat_text(), "The quick fox");
        assert_eq!(idx.len(), 13);
        assert_eq!(idx.node_count(), 3);
    }

    #[test]
    fn test_build_is_idempotent() {
        let source = Fragments(vec!["a", "bc", "", "d"]);
        assert_eq!(TextIndex::build(&source), TextIndex::build(&source));
    }

    #[test]
    fn test_empty_nodes_are_skipped() {
        let idx = index(&["", "ab", ""]);
        assert_eq!(idx.node_count(), 1);
        assert_eq!(idx.locate(0), Some(Location::new(1, 0)));
    }

    #[test]
    fn test_locate_boundaries_prefer_next_node() {
        let idx = index(&["abc", "de"]);
        assert_eq!(idx.locate(0), Some(Location::new(0, 0)));
        assert_eq!(idx.locate(2), Some(Location::new(0, 2)));
        assert_eq!(idx.locate(3), Some(Location::new(1, 0)));
        assert_eq!(idx.locate(4), Some(Location::new(1, 1)));
    }

    #[test]
    fn test_locate_end_of_document_is_end_of_last_node() {
        let idx = index(&["abc", "de"]);
        assert_eq!(idx.locate(5), Some(Location::new(1, 2)));
        assert_eq!(idx.locate(6), None);
    }

    #[test]
    fn test_locate_is_total_over_valid_offsets() {
        let idx = index(&["ab", "c", "def"]);
        for offset in 0..=idx.len() {
            let location = idx.locate(offset).expect("offset in range");
            assert_eq!(idx.offset_of(&location).unwrap(), offset);
        }
    }

    #[test]
    fn test_locate_on_empty_index() {
        let idx = index(&[]);
        assert!(idx.is_empty());
        assert_eq!(idx.locate(0), None);
    }

    #[test]
    fn test_locate_end_prefers_previous_node() {
        let idx = index(&["abc", "de"]);
        assert_eq!(idx.locate_end(3), Some(Location::new(0, 3)));
        assert_eq!(idx.locate_end(0), Some(Location::new(0, 0)));
    }

    #[test]
    fn test_concrete_range_spans_nodes() {
        let idx = index(&["abc", "de"]);
        let range = idx.concrete_range(1..3).unwrap();
        assert_eq!(range.start, Location::new(0, 1));
        assert_eq!(range.end, Location::new(0, 3));

        let range = idx.concrete_range(2..5).unwrap();
        assert_eq!(range.start, Location::new(0, 2));
        assert_eq!(range.end, Location::new(1, 2));
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let idx = index(&["héllo ", "wörld"]);
        assert_eq!(idx.len(), 11);
        assert_eq!(idx.slice(6..11), "wörld");
        assert_eq!(idx.locate(7), Some(Location::new(1, 1)));
    }

    #[test]
    fn test_offset_of_unknown_node() {
        let idx = index(&["abc"]);
        assert_eq!(
            idx.offset_of(&Location::new(7, 0)),
            Err(SelectorError::UnindexedLocation)
        );
        assert_eq!(
            idx.offset_of(&Location::new(0, 4)),
            Err(SelectorError::IndexOutOfRange { offset: 4, len: 3 })
        );
    }

    #[test]
    fn test_line_range() {
        let idx = index(&["one\n", "two\n", "three"]);
        assert_eq!(idx.line_range(0..3), LineRange::new(1, 1));
        assert_eq!(idx.line_range(0..4), LineRange::new(1, 1));
        assert_eq!(idx.line_range(2..6), LineRange::new(1, 2));
        assert_eq!(idx.line_range(8..13), LineRange::new(3, 3));
        assert_eq!(idx.line_range(8..8), LineRange::new(3, 3));
    }
}
