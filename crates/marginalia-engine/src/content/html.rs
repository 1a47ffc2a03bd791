//! HTML output for a [`ContentTree`] with highlights applied.
//!
//! Highlights are given as flat char ranges of the index built from the same
//! tree. Text nodes are split at highlight boundaries and each piece is wrapped
//! in one `<mark>` per covering highlight, in paint order.

use std::fmt::Write;

use crate::anchoring::Highlight;
use crate::content::{ContentTree, NodeId, NodeKind};
use crate::models::NoteId;

pub const HIGHLIGHT_CLASS: &str = "marginalia-highlight";
pub const FOCUS_CLASS: &str = "marginalia-focus";

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

/// Serialise `tree` as HTML, wrapping highlighted text in `<mark>` elements.
pub fn render_html(
    tree: &ContentTree,
    highlights: &[Highlight<NodeId>],
    focused: Option<NoteId>,
) -> String {
    let mut writer = HtmlWriter {
        tree,
        highlights,
        focused,
        offset: 0,
        out: String::new(),
    };
    writer.node(tree.root(), true);
    writer.out
}

struct HtmlWriter<'a> {
    tree: &'a ContentTree,
    highlights: &'a [Highlight<NodeId>],
    focused: Option<NoteId>,
    /// Flat offset of the next indexable char
    offset: usize,
    out: String,
}

impl HtmlWriter<'_> {
    fn node(&mut self, id: NodeId, indexable: bool) {
        let Some(node) = self.tree.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) if indexable => self.indexed_text(text),
            NodeKind::Text(text) => self.out.push_str(&html_escape::encode_text(text)),
            NodeKind::Element {
                tag,
                attrs,
                indexable: own,
            } => {
                self.out.push('<');
                self.out.push_str(tag);
                for (name, value) in attrs {
                    if value.is_empty() {
                        let _ = write!(self.out, " {name}");
                    } else {
                        let _ = write!(
                            self.out,
                            " {name}=\"{}\"",
                            html_escape::encode_double_quoted_attribute(value)
                        );
                    }
                }
                self.out.push('>');

                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in &node.children {
                    self.node(*child, indexable && *own);
                }
                let _ = write!(self.out, "</{tag}>");
            }
        }
    }

    fn indexed_text(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let start = self.offset;
        let end = start + chars.len();
        self.offset = end;

        let mut cuts = vec![start, end];
        for highlight in self.highlights {
            for cut in [highlight.range.start, highlight.range.end] {
                if cut > start && cut < end {
                    cuts.push(cut);
                }
            }
        }
        cuts.sort_unstable();
        cuts.dedup();

        for pair in cuts.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let piece: String = chars[from - start..to - start].iter().collect();
            let covering: Vec<&Highlight<NodeId>> = self
                .highlights
                .iter()
                .filter(|h| h.range.start <= from && to <= h.range.end)
                .collect();

            if piece.chars().all(|c| c == '\n') {
                self.out.push_str(&piece);
                continue;
            }
            for highlight in &covering {
                self.open_mark(highlight.note_id);
            }
            self.out.push_str(&html_escape::encode_text(&piece));
            for _ in &covering {
                self.out.push_str("</mark>");
            }
        }
    }

    fn open_mark(&mut self, note_id: NoteId) {
        let class = if self.focused == Some(note_id) {
            format!("{HIGHLIGHT_CLASS} {FOCUS_CLASS}")
        } else {
            HIGHLIGHT_CLASS.to_string()
        };
        let _ = write!(
            self.out,
            "<mark class=\"{class}\" data-note-id=\"{note_id}\">"
        );
    }
}
