use std::fmt::Debug;
use std::ops::Range;

use crate::anchoring::{
    Selection, Selector, SelectorError, TextIndex, TextPositionSelector, TextQuoteSelector,
};

/// Capture a selector for a live selection.
///
/// Backwards selections (focus before anchor) are normalised. Pure: reads the
/// index only.
pub fn build_selector<N>(
    selection: &Selection<N>,
    index: &TextIndex<N>,
    context_chars: usize,
) -> Result<Selector, SelectorError>
where
    N: Copy + Eq + Debug,
{
    let a = index.offset_of(&selection.start)?;
    let b = index.offset_of(&selection.end)?;
    build_selector_from_range(a.min(b)..a.max(b), index, context_chars)
}

/// Capture a selector for a flat char range of the index.
pub fn build_selector_from_range<N>(
    range: Range<usize>,
    index: &TextIndex<N>,
    context_chars: usize,
) -> Result<Selector, SelectorError>
where
    N: Copy + Eq + Debug,
{
    let len = index.len();
    for offset in [range.start, range.end] {
        if offset > len {
            return Err(SelectorError::IndexOutOfRange { offset, len });
        }
    }
    if range.start >= range.end {
        return Err(SelectorError::EmptySelection);
    }

    let Range { start, end } = range;
    let quote = TextQuoteSelector {
        exact: index.slice(start..end),
        prefix: index.slice(start.saturating_sub(context_chars)..start),
        suffix: index.slice(end..end.saturating_add(context_chars).min(len)),
    };

    Ok(Selector {
        quote,
        position: Some(TextPositionSelector::new(start, end)),
    })
}
