//! Plain-text rendering of a styled element tree
//!
//! Follows the shape of the DOM `innerText` getter: hidden boxes contribute
//! nothing, block boxes are separated by one line break and paragraphs by
//! two, `<br>` is a newline, table cells in a row are separated by tabs and
//! whitespace collapses everywhere except inside `<pre>`.

use crate::node::Element;
use crate::style::{ComputedStyle, Display};
use crate::tree::StyleVisitor;

/// Accumulates text from a [`StyleVisitor`] walk
#[derive(Debug, Default)]
pub struct PlainTextRenderer {
    out: String,
    /// Collapsible whitespace seen since the last visible character
    pending_space: bool,
    /// Required line breaks owed before the next content
    pending_breaks: usize,
    at_line_start: bool,
    started: bool,
    preformatted: usize,
    cell_in_row: bool,
}

impl PlainTextRenderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        Self {
            at_line_start: true,
            ..Self::default()
        }
    }

    /// Return the rendered text
    pub fn finish(self) -> String {
        self.out
    }

    fn flush_breaks(&mut self) {
        if self.started {
            for _ in 0..self.pending_breaks {
                self.out.push('\n');
            }
        }
        self.pending_breaks = 0;
        self.started = true;
    }

    fn require_breaks(&mut self, count: usize) {
        self.pending_space = false;
        self.pending_breaks = self.pending_breaks.max(count);
        self.at_line_start = true;
    }

    fn push_collapsible(&mut self, text: &str) {
        for c in text.chars() {
            if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
                if !self.at_line_start {
                    self.pending_space = true;
                }
                continue;
            }
            self.flush_breaks();
            if self.pending_space {
                self.out.push(' ');
                self.pending_space = false;
            }
            self.out.push(c);
            self.at_line_start = false;
        }
    }

    fn push_preserved(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_breaks();
        if self.pending_space {
            self.out.push(' ');
            self.pending_space = false;
        }
        self.out.push_str(text);
        self.at_line_start = text.ends_with('\n');
    }
}

impl<'a> StyleVisitor<'a> for PlainTextRenderer {
    fn enter(&mut self, el: &'a Element, style: &ComputedStyle) -> bool {
        if style.display == Display::None {
            return false;
        }
        if el.is("br") {
            self.pending_space = false;
            self.push_preserved("\n");
            return false;
        }
        match style.display {
            Display::TableRow => self.cell_in_row = false,
            Display::TableCell => {
                if self.cell_in_row {
                    self.pending_space = false;
                    self.push_preserved("\t");
                    self.at_line_start = true;
                }
                self.cell_in_row = true;
            }
            _ => {}
        }
        if el.is("p") {
            self.require_breaks(2);
        } else if style.display.is_block_level() {
            self.require_breaks(1);
        }
        if el.is("pre") || el.is("textarea") {
            self.preformatted += 1;
        }
        true
    }

    fn text(&mut self, text: &'a str, _parent: &ComputedStyle) {
        if self.preformatted > 0 {
            self.push_preserved(text);
        } else {
            self.push_collapsible(text);
        }
    }

    fn leave(&mut self, el: &'a Element, style: &ComputedStyle) {
        if style.display == Display::None || el.is("br") {
            return;
        }
        if el.is("pre") || el.is("textarea") {
            self.preformatted = self.preformatted.saturating_sub(1);
        }
        if el.is("p") {
            self.require_breaks(2);
        } else if style.display.is_block_level() {
            self.require_breaks(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_element;
    use crate::style::StyleSheet;
    use crate::tree::RenderTree;

    fn text_of(markup: &str, css: &str) -> String {
        let root = parse_element(markup).unwrap();
        RenderTree::new(Some(root), StyleSheet::parse(css)).inner_text()
    }

    #[test]
    fn test_paragraphs_and_blocks() {
        let text = text_of(
            "<div><h1>Title</h1><p>First   line</p><p>Second</p><div>Third</div></div>",
            "",
        );
        assert_eq!(text, "Title\n\nFirst line\n\nSecond\n\nThird");
    }

    #[test]
    fn test_inline_whitespace_collapses_across_elements() {
        let text = text_of("<div>\n  <span>a </span> <b> b</b>\n</div>", "");
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_breaks_and_preformatted() {
        let text = text_of("<div>one<br>two<pre>  x\n  y</pre></div>", "");
        assert_eq!(text, "one\ntwo\n  x\n  y");
    }

    #[test]
    fn test_hidden_content_is_skipped() {
        let text = text_of(
            r#"<div><p>Shown</p><p hidden>Hidden</p><div class="menu">Menu</div><style>p{}</style></div>"#,
            ".menu { display: none }",
        );
        assert_eq!(text, "Shown");
    }

    #[test]
    fn test_table_cells_use_tabs() {
        let text = text_of(
            "<table><tbody><tr><td>a</td><td>b</td></tr><tr><th>c</th><td>d</td></tr></tbody></table>",
            "",
        );
        assert_eq!(text, "a\tb\nc\td");
    }
}
