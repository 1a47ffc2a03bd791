use xi_rope::Rope;

use crate::anchoring::TextSource;

/// Raw text as an indexable source, one node per line.
///
/// Nodes are line numbers (0-based). Lines keep their trailing newline so
/// the flattened text equals the input.
#[derive(Debug, Clone)]
pub struct PlainText {
    rope: Rope,
    lines: Vec<String>,
}

impl PlainText {
    pub fn new(text: &str) -> Self {
        let rope = Rope::from(text);
        let lines = rope.lines_raw(..).map(|line| line.into_owned()).collect();
        Self { rope, lines }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn line(&self, number: usize) -> Option<&str> {
        self.lines.get(number).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl From<&str> for PlainText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl TextSource for PlainText {
    type Node = usize;

    fn for_each_text(&self, visit: &mut dyn FnMut(usize, &str)) {
        for (number, line) in self.lines.iter().enumerate() {
            visit(number, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{Location, TextIndex};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_keep_newlines() {
        let text = PlainText::new("one\ntwo\n\nfour");
        assert_eq!(text.line_count(), 4);
        assert_eq!(text.line(0), Some("one\n"));
        assert_eq!(text.line(2), Some("\n"));
        assert_eq!(text.line(3), Some("four"));
        assert_eq!(text.rope().len(), 13);
    }

    #[test]
    fn test_index_matches_input() {
        let input = "héllo\nwörld\n";
        let idx = TextIndex::build(&PlainText::new(input));

        assert_eq!(idx.flat_text(), input);
        assert_eq!(idx.len(), 12);
        assert_eq!(idx.locate(6), Some(Location::new(1, 0)));
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(TextIndex::build(&PlainText::new("")).is_empty());
    }
}
