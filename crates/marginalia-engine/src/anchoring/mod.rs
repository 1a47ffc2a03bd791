/*!
 * # Anchoring
 *
 * Turns a user's selection into a durable [`Selector`], and later finds that
 * span again in a document that may have been edited, reformatted or
 * re-rendered since.
 *
 * ## Pipeline
 *
 * - **`index`**: [`TextIndex`] flattens any [`TextSource`] into one
 *   char-addressed string and maps offsets back to content-model locations.
 * - **`builder`**: [`build_selector`] captures quote, bounded context and
 *   position for a selection.
 * - **`resolver`**: [`Resolver`] re-anchors a selector (exact quote, fuzzy
 *   quote, raw position, or not found) and reports which stage answered.
 * - **`highlights`**: [`HighlightManager`] owns the note id -> highlight map
 *   and emits paint/clear/focus instructions for the rendering layer.
 *
 * ## Usage Pattern
 *
 * ```rust
 * use marginalia_engine::anchoring::*;
 * use marginalia_engine::content::PlainText;
 * use marginalia_engine::models::Annotation;
 *
 * let before = TextIndex::build(&PlainText::new("The quick brown fox jumps."));
 * let selector = build_selector_from_range(10..19, &before, 100).unwrap();
 * let note = Annotation::for_selection("fox.md", selector, "Nice fox");
 *
 * let after = TextIndex::build(&PlainText::new("The slow brown fox jumps."));
 * let mut manager = HighlightManager::default();
 * let report = manager.paint_all(&[note.clone()], &after);
 *
 * assert_eq!(report.anchored, 1);
 * assert_eq!(manager.highlight(note.id).unwrap().range, 9..18);
 * ```
 *
 * Nothing here persists state or touches a UI toolkit; callers own storage
 * and drawing.
 */

pub mod builder;
pub mod error;
pub mod highlights;
pub mod index;
pub mod resolver;
pub mod selector;
pub mod similarity;

pub use builder::{build_selector, build_selector_from_range};
pub use error::{AnchorError, SelectorError};
pub use highlights::{AnchorState, Highlight, HighlightManager, PaintInstruction, PaintReport};
pub use index::{ConcreteRange, Location, Selection, TextIndex, TextSource};
pub use resolver::{AnchorOptions, Confidence, Resolution, Resolver, resolve};
pub use selector::{DOCUMENT_SENTINEL, Selector, TextPositionSelector, TextQuoteSelector};
