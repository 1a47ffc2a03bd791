//! Markdown to [`ContentTree`] rendering.
//!
//! The tree mirrors what an HTML renderer would put in front of a reader, so
//! anchoring sees rendered text rather than markdown syntax. Block elements
//! are separated by `"\n"` text nodes; images, raw HTML and front matter are
//! kept in the tree but marked non-indexable.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use crate::content::{ContentTree, NodeId};

/// Render markdown into a content tree rooted at an `<article>`.
pub fn render(markdown: &str) -> ContentTree {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut renderer = TreeRenderer::new();

    for event in parser {
        renderer.process_event(event);
    }

    renderer.tree
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    options
}

struct OpenElement {
    id: NodeId,
    block: bool,
    indexable: bool,
}

struct ElementSpec {
    tag: String,
    attrs: Vec<(String, String)>,
    block: bool,
    indexable: bool,
}

impl ElementSpec {
    fn block(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            block: true,
            indexable: true,
        }
    }

    fn inline(tag: &str) -> Self {
        Self {
            block: false,
            ..Self::block(tag)
        }
    }

    fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    fn hidden(mut self) -> Self {
        self.indexable = false;
        self
    }
}

/// Turns the balanced start/end event stream into tree nodes.
struct TreeRenderer {
    tree: ContentTree,
    stack: Vec<OpenElement>,
    /// Depth of open non-indexable elements
    hidden: usize,
    /// Whether the visible text so far ends with a newline
    at_line_start: bool,
}

impl TreeRenderer {
    fn new() -> Self {
        Self {
            tree: ContentTree::new("article"),
            stack: Vec::new(),
            hidden: 0,
            at_line_start: true,
        }
    }

    fn parent(&self) -> NodeId {
        self.stack
            .last()
            .map(|open| open.id)
            .unwrap_or_else(|| self.tree.root())
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let parent = self.parent();
                let id = self.tree.append_element(parent, "code");
                self.tree.append_text(id, &code);
                self.saw_text(&code);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let parent = self.parent();
                let id = self.tree.append_element_with_attrs(
                    parent,
                    "span",
                    vec![("class".to_string(), "raw-html".to_string())],
                );
                self.tree.set_indexable(id, false);
                self.tree.append_text(id, &html);
            }
            Event::FootnoteReference(label) => {
                let parent = self.parent();
                let id = self.tree.append_element_with_attrs(
                    parent,
                    "sup",
                    vec![("class".to_string(), "footnote-reference".to_string())],
                );
                self.tree.append_text(id, &label);
                self.saw_text(&label);
            }
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => {
                let parent = self.parent();
                self.tree.append_element(parent, "br");
                self.text("\n");
            }
            Event::Rule => {
                self.ensure_newline();
                let parent = self.parent();
                self.tree.append_element(parent, "hr");
            }
            Event::TaskListMarker(checked) => {
                let parent = self.parent();
                let mut attrs = vec![
                    ("type".to_string(), "checkbox".to_string()),
                    ("disabled".to_string(), String::new()),
                ];
                if checked {
                    attrs.push(("checked".to_string(), String::new()));
                }
                let id = self.tree.append_element_with_attrs(parent, "input", attrs);
                self.tree.set_indexable(id, false);
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag) {
        let spec = element_for(tag);

        if spec.block {
            self.ensure_newline();
        }
        if spec.tag == "td" {
            self.separate_cell();
        }

        let parent = self.parent();
        let id = self
            .tree
            .append_element_with_attrs(parent, &spec.tag, spec.attrs);
        if !spec.indexable {
            self.tree.set_indexable(id, false);
            self.hidden += 1;
        }
        self.stack.push(OpenElement {
            id,
            block: spec.block,
            indexable: spec.indexable,
        });
    }

    fn close(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        if !open.indexable {
            self.hidden = self.hidden.saturating_sub(1);
        }
        if open.block {
            self.ensure_newline();
        }
    }

    fn text(&mut self, text: &str) {
        let parent = self.parent();
        self.tree.append_text(parent, text);
        self.saw_text(text);
    }

    fn saw_text(&mut self, text: &str) {
        if self.hidden == 0 && !text.is_empty() {
            self.at_line_start = text.ends_with('\n');
        }
    }

    fn ensure_newline(&mut self) {
        if self.hidden > 0 || self.at_line_start {
            return;
        }
        self.text("\n");
    }

    /// Cells of one row are tab separated in the flat text.
    fn separate_cell(&mut self) {
        let row = self.parent();
        if self.tree.children(row).is_empty() || self.hidden > 0 {
            return;
        }
        self.text("\t");
    }
}

fn element_for(tag: Tag) -> ElementSpec {
    match tag {
        Tag::Paragraph => ElementSpec::block("p"),
        Tag::Heading { level, .. } => ElementSpec::block(&format!("h{}", level as usize)),
        Tag::BlockQuote(_) => ElementSpec::block("blockquote"),
        Tag::CodeBlock(CodeBlockKind::Fenced(lang)) if !lang.is_empty() => {
            ElementSpec::block("pre").attr("data-lang", lang.to_string())
        }
        Tag::CodeBlock(_) => ElementSpec::block("pre"),
        Tag::HtmlBlock => ElementSpec::block("div").attr("class", "raw-html").hidden(),
        Tag::List(Some(start)) if start != 1 => {
            ElementSpec::block("ol").attr("start", start.to_string())
        }
        Tag::List(Some(_)) => ElementSpec::block("ol"),
        Tag::List(None) => ElementSpec::block("ul"),
        Tag::Item => ElementSpec::block("li"),
        Tag::FootnoteDefinition(label) => ElementSpec::block("div")
            .attr("class", "footnote-definition")
            .attr("id", label.to_string()),
        Tag::Table(_) => ElementSpec::block("table"),
        Tag::TableHead => ElementSpec::block("thead"),
        Tag::TableRow => ElementSpec::block("tr"),
        Tag::TableCell => ElementSpec::inline("td"),
        Tag::Emphasis => ElementSpec::inline("em"),
        Tag::Strong => ElementSpec::inline("strong"),
        Tag::Strikethrough => ElementSpec::inline("del"),
        Tag::Link {
            dest_url, title, ..
        } => {
            let spec = ElementSpec::inline("a").attr("href", dest_url.to_string());
            if title.is_empty() {
                spec
            } else {
                spec.attr("title", title.to_string())
            }
        }
        Tag::Image {
            dest_url, title, ..
        } => {
            let spec = ElementSpec::inline("img").attr("src", dest_url.to_string());
            let spec = if title.is_empty() {
                spec
            } else {
                spec.attr("title", title.to_string())
            };
            spec.hidden()
        }
        Tag::MetadataBlock(_) => ElementSpec::block("pre")
            .attr("class", "metadata")
            .hidden(),
        _ => ElementSpec::inline("span"),
    }
}
