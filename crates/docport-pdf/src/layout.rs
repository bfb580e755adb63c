//! Block-flow layout of the surface into SVG
//!
//! Layout happens in two passes. [`collect_blocks`] walks the styled surface
//! and produces a flat list of [`Block`]s; [`render_svg`] stacks those blocks
//! top to bottom, wrapping text greedily with estimated glyph advances.
//! Image bytes are resolved between the two passes.

use std::borrow::Cow;
use std::fmt::Write as _;

use docport_surface::{ComputedStyle, Display, Element, RenderTree, StyleVisitor, TextAlign};
use quick_xml::escape::escape;

/// Body font stack
pub const BODY_FONT: &str = "Inter, Arial, sans-serif";

/// Monospace font stack
pub const MONO_FONT: &str =
    "ui-monospace, SFMono-Regular, Menlo, Consolas, 'Liberation Mono', monospace";

const TEXT_COLOR: &str = "#222222";
const LINK_COLOR: &str = "#1a73e8";
const QUOTE_COLOR: &str = "#555555";
const RULE_COLOR: &str = "#dddddd";
const CODE_BACKGROUND: &str = "#1f1f1f";
const CODE_COLOR: &str = "#eeeeee";
const BODY_SIZE: f32 = 14.0;
const CODE_SIZE: f32 = 13.0;
const CODE_PADDING: f32 = 12.0;
const LIST_INDENT: f32 = 24.0;
const QUOTE_INDENT: f32 = 16.0;

/// Font size, weight and bottom margin of `h1`..`h6`
const HEADINGS: [(f32, u16, f32); 6] = [
    (32.0, 800, 12.0),
    (28.0, 700, 10.0),
    (24.0, 700, 8.0),
    (20.0, 600, 8.0),
    (18.0, 600, 8.0),
    (16.0, 600, 8.0),
];

/// Inline formatting of a run of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    /// `b`, `strong`
    pub bold: bool,
    /// `i`, `em`
    pub italic: bool,
    /// `u`, `ins`
    pub underline: bool,
    /// `s`, `del`, `strike`
    pub strike: bool,
    /// `code`, `kbd`, `samp`
    pub code: bool,
    /// `a`
    pub link: bool,
}

/// A wrappable piece of inline content
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A word, possibly preceded by collapsible whitespace
    Word {
        /// Word text without whitespace
        text: String,
        /// Inline formatting
        style: RunStyle,
        /// Whether whitespace separated it from the previous token
        space_before: bool,
    },
    /// Forced line break (`<br>`)
    Break,
}

/// Typographic role of a text block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Body paragraph
    Paragraph,
    /// Heading level 1..=6
    Heading(u8),
    /// List item with its marker
    ListItem {
        /// Bullet, number or checkbox
        marker: String,
        /// Nesting depth, starting at 1
        depth: usize,
    },
    /// Block quotation
    Quote,
}

/// A laid-out unit of the surface
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Wrapped inline text
    Text {
        /// Typographic role
        kind: BlockKind,
        /// Computed alignment
        align: TextAlign,
        /// Inline content
        tokens: Vec<Token>,
    },
    /// Preformatted code on a dark panel
    Code {
        /// Source lines
        lines: Vec<String>,
    },
    /// Embedded image
    Image {
        /// Image source as written
        src: String,
        /// Rendered width in CSS pixels, when known
        width: Option<f32>,
        /// Computed alignment
        align: TextAlign,
    },
    /// Horizontal rule
    Rule,
}

#[derive(Debug)]
struct OpenBlock {
    kind: BlockKind,
    align: TextAlign,
    tokens: Vec<Token>,
    pending_space: bool,
}

#[derive(Debug)]
struct ListState {
    ordered: bool,
    next: u32,
}

/// Walks a styled tree and collects [`Block`]s
#[derive(Debug, Default)]
pub struct BlockCollector {
    blocks: Vec<Block>,
    current: Option<OpenBlock>,
    styles: Vec<RunStyle>,
    lists: Vec<ListState>,
    code: Option<String>,
    pending_marker: Option<String>,
    numbered: u32,
}

impl BlockCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish and return the collected blocks
    pub fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }

    fn flush(&mut self) {
        if let Some(open) = self.current.take() {
            if !open.tokens.is_empty() {
                self.blocks.push(Block::Text {
                    kind: open.kind,
                    align: open.align,
                    tokens: open.tokens,
                });
            }
        }
    }

    fn begin(&mut self, kind: BlockKind, align: TextAlign) {
        if let Some(open) = &mut self.current {
            // An empty list item keeps its marker for the paragraph inside it
            if open.tokens.is_empty() && matches!(open.kind, BlockKind::ListItem { .. }) {
                open.align = align;
                return;
            }
        }
        self.flush();
        let kind = match (kind, self.pending_marker.take()) {
            (BlockKind::Paragraph, Some(marker)) => BlockKind::ListItem { marker, depth: 1 },
            (kind, _) => kind,
        };
        self.current = Some(OpenBlock {
            kind,
            align,
            tokens: Vec::new(),
            pending_space: false,
        });
    }

    fn open_block(&mut self, align: TextAlign) -> &mut OpenBlock {
        if self.current.is_none() {
            self.begin(BlockKind::Paragraph, align);
        }
        self.current.get_or_insert_with(|| OpenBlock {
            kind: BlockKind::Paragraph,
            align,
            tokens: Vec::new(),
            pending_space: false,
        })
    }

    fn push_text(&mut self, text: &str, align: TextAlign) {
        let style = self.styles.last().copied().unwrap_or_default();
        let block = self.open_block(align);
        for c in text.chars() {
            if c.is_whitespace() && c != '\u{a0}' {
                block.pending_space = true;
                continue;
            }
            let space_before = std::mem::take(&mut block.pending_space);
            let extends_last = !space_before
                && matches!(
                    block.tokens.last(),
                    Some(Token::Word { style: last, .. }) if *last == style
                );
            if extends_last {
                if let Some(Token::Word { text, .. }) = block.tokens.last_mut() {
                    text.push(c);
                }
            } else {
                block.tokens.push(Token::Word {
                    text: c.to_string(),
                    style,
                    space_before,
                });
            }
        }
    }

    fn enter_content_block(&mut self, el: &Element, content_type: &str) {
        self.flush();
        if content_type == "numberedListItem" {
            self.numbered += 1;
        } else {
            self.numbered = 0;
        }
        self.pending_marker = match content_type {
            "bulletListItem" => Some("\u{2022}".to_string()),
            "numberedListItem" => Some(format!("{}.", self.numbered)),
            "checkListItem" => {
                let checked = el.attr("data-checked") == Some("true")
                    || el
                        .find_named("input")
                        .map(|input| input.has_attr("checked"))
                        .unwrap_or(false);
                Some(if checked { "\u{2611}" } else { "\u{2610}" }.to_string())
            }
            _ => None,
        };
    }
}

impl<'a> StyleVisitor<'a> for BlockCollector {
    fn enter(&mut self, el: &'a Element, style: &ComputedStyle) -> bool {
        let mut run = self.styles.last().copied().unwrap_or_default();
        match el.name.as_str() {
            "b" | "strong" => run.bold = true,
            "i" | "em" => run.italic = true,
            "u" | "ins" => run.underline = true,
            "s" | "del" | "strike" => run.strike = true,
            "code" | "kbd" | "samp" => run.code = true,
            "a" => run.link = true,
            _ => {}
        }
        self.styles.push(run);

        if style.display == Display::None {
            return false;
        }

        if let Some(code) = &mut self.code {
            if el.is("br") {
                code.push('\n');
            }
            return true;
        }

        let align = style.text_align;
        match el.name.as_str() {
            "br" => {
                self.open_block(align).tokens.push(Token::Break);
                return false;
            }
            "img" => {
                self.flush();
                self.blocks.push(Block::Image {
                    src: el.attr("src").unwrap_or_default().to_string(),
                    width: style.width_px,
                    align,
                });
                return false;
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::Rule);
                return false;
            }
            "pre" => {
                self.flush();
                self.code = Some(String::new());
            }
            "ul" | "ol" => {
                self.flush();
                let start = el.attr("start").and_then(|s| s.parse().ok()).unwrap_or(1);
                self.lists.push(ListState {
                    ordered: el.is("ol"),
                    next: start,
                });
            }
            "li" => {
                let depth = self.lists.len().max(1);
                let marker = match self.lists.last_mut() {
                    Some(list) if list.ordered => {
                        let marker = format!("{}.", list.next);
                        list.next += 1;
                        marker
                    }
                    _ => "\u{2022}".to_string(),
                };
                self.flush();
                self.begin(BlockKind::ListItem { marker, depth }, align);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.name[1..].parse().unwrap_or(1);
                self.begin(BlockKind::Heading(level), align);
            }
            "p" => self.begin(BlockKind::Paragraph, align),
            "blockquote" => self.begin(BlockKind::Quote, align),
            _ => {
                if let Some(content_type) = el.attr("data-content-type") {
                    self.enter_content_block(el, content_type);
                } else if style.display == Display::TableCell {
                    if let Some(open) = &mut self.current {
                        open.pending_space = true;
                    }
                } else if style.display.is_block_level() {
                    self.flush();
                }
            }
        }
        true
    }

    fn text(&mut self, text: &'a str, parent: &ComputedStyle) {
        if let Some(code) = &mut self.code {
            code.push_str(text);
            return;
        }
        if self.current.is_none() && text.trim().is_empty() {
            return;
        }
        self.push_text(text, parent.text_align);
    }

    fn leave(&mut self, el: &'a Element, style: &ComputedStyle) {
        self.styles.pop();
        if style.display == Display::None {
            return;
        }
        if self.code.is_some() {
            if el.is("pre") {
                let text = self.code.take().unwrap_or_default();
                let text = text.strip_suffix('\n').unwrap_or(&text);
                self.blocks.push(Block::Code {
                    lines: text.split('\n').map(str::to_string).collect(),
                });
            }
            return;
        }
        if el.has_attr("data-content-type") {
            self.pending_marker = None;
        }
        match el.name.as_str() {
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "br" | "img" => {}
            _ if style.display == Display::TableCell => {
                if let Some(open) = &mut self.current {
                    open.pending_space = true;
                }
            }
            _ if style.display.is_block_level() => self.flush(),
            _ => {}
        }
    }
}

/// Collect the blocks of the surface mounted in `tree`
pub fn collect_blocks(tree: &RenderTree) -> Vec<Block> {
    let mut collector = BlockCollector::new();
    tree.visit_surface(&mut collector);
    collector.finish()
}

/// Image bytes resolved for an [`Block::Image`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// `data:` URI embedded in the SVG
    pub data_uri: String,
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

/// Page geometry of the layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Total width in CSS pixels
    pub viewport_width: f32,
    /// Padding on every side in CSS pixels
    pub padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            padding: 16.0,
        }
    }
}

impl LayoutConfig {
    fn content_width(&self) -> f32 {
        (self.viewport_width - 2.0 * self.padding).max(1.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Metrics {
    size: f32,
    weight: u16,
    line_height: f32,
    margin_after: f32,
    indent: f32,
    color: &'static str,
}

fn metrics(kind: &BlockKind) -> Metrics {
    let body = Metrics {
        size: BODY_SIZE,
        weight: 400,
        line_height: BODY_SIZE * 1.5,
        margin_after: 8.0,
        indent: 0.0,
        color: TEXT_COLOR,
    };
    match kind {
        BlockKind::Paragraph => body,
        BlockKind::Heading(level) => {
            let index = usize::from((*level).clamp(1, 6) - 1);
            let (size, weight, margin_after) = HEADINGS[index];
            Metrics {
                size,
                weight,
                line_height: size * 1.25,
                margin_after,
                ..body
            }
        }
        BlockKind::ListItem { depth, .. } => Metrics {
            indent: LIST_INDENT * *depth as f32,
            margin_after: 4.0,
            ..body
        },
        BlockKind::Quote => Metrics {
            indent: QUOTE_INDENT,
            color: QUOTE_COLOR,
            ..body
        },
    }
}

/// Estimated advance of `text` at `size`
fn text_width(text: &str, size: f32, style: RunStyle) -> f32 {
    let factor = if style.code { 0.6 } else { 0.52 };
    let bold = if style.bold { 1.06 } else { 1.0 };
    text.chars().count() as f32 * size * factor * bold
}

#[derive(Debug, Default)]
struct Line {
    pieces: Vec<(String, RunStyle)>,
    width: f32,
}

fn wrap(tokens: &[Token], size: f32, available: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();
    for token in tokens {
        match token {
            Token::Break => lines.push(std::mem::take(&mut line)),
            Token::Word {
                text,
                style,
                space_before,
            } => {
                let word = text_width(text, size, *style);
                let space = if *space_before && !line.pieces.is_empty() {
                    text_width(" ", size, *style)
                } else {
                    0.0
                };
                if !line.pieces.is_empty() && line.width + space + word > available {
                    lines.push(std::mem::take(&mut line));
                    line.pieces.push((text.clone(), *style));
                    line.width = word;
                    continue;
                }
                let piece = if space > 0.0 {
                    format!(" {text}")
                } else {
                    text.clone()
                };
                line.pieces.push((piece, *style));
                line.width += space + word;
            }
        }
    }
    if !line.pieces.is_empty() {
        lines.push(line);
    }
    lines
}

fn align_offset(align: TextAlign, available: f32, used: f32) -> f32 {
    let slack = (available - used).max(0.0);
    match align {
        TextAlign::Center => slack / 2.0,
        TextAlign::Right | TextAlign::End => slack,
        _ => 0.0,
    }
}

/// SVG document builder
struct SvgBuilder {
    body: String,
    config: LayoutConfig,
    y: f32,
}

impl SvgBuilder {
    fn new(config: LayoutConfig) -> Self {
        Self {
            body: String::new(),
            config,
            y: config.padding,
        }
    }

    fn text_block(&mut self, kind: &BlockKind, align: TextAlign, tokens: &[Token]) {
        let m = metrics(kind);
        let x0 = self.config.padding + m.indent;
        let available = (self.config.content_width() - m.indent).max(1.0);
        let lines = wrap(tokens, m.size, available);
        let top = self.y;

        if let BlockKind::ListItem { marker, .. } = kind {
            let baseline = top + baseline_offset(m.size, m.line_height);
            let _ = write!(
                self.body,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" text-anchor="end">{}</text>"#,
                x0 - 8.0,
                baseline,
                BODY_FONT,
                m.size,
                m.color,
                escape(marker.as_str())
            );
        }

        for (i, line) in lines.iter().enumerate() {
            let baseline = top + i as f32 * m.line_height + baseline_offset(m.size, m.line_height);
            let x = x0 + align_offset(align, available, line.width);
            let _ = write!(
                self.body,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}" xml:space="preserve">"#,
                x, baseline, BODY_FONT, m.size, m.weight, m.color
            );
            for (text, style) in &line.pieces {
                self.body.push_str("<tspan");
                self.push_run_attributes(*style, m.weight);
                self.body.push('>');
                self.body.push_str(&escape(text.as_str()));
                self.body.push_str("</tspan>");
            }
            self.body.push_str("</text>");
        }

        let height = lines.len().max(1) as f32 * m.line_height;
        if matches!(kind, BlockKind::Quote) {
            let _ = write!(
                self.body,
                r#"<rect x="{:.2}" y="{:.2}" width="3" height="{:.2}" fill="{}"/>"#,
                self.config.padding + 2.0,
                top,
                height,
                RULE_COLOR
            );
        }
        self.y += height + m.margin_after;
    }

    fn push_run_attributes(&mut self, style: RunStyle, base_weight: u16) {
        if style.bold && base_weight < 700 {
            self.body.push_str(r#" font-weight="700""#);
        }
        if style.italic {
            self.body.push_str(r#" font-style="italic""#);
        }
        if style.code {
            let _ = write!(self.body, r#" font-family="{}""#, MONO_FONT);
        }
        let decoration: Vec<&str> = [
            (style.underline || style.link, "underline"),
            (style.strike, "line-through"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        if !decoration.is_empty() {
            let _ = write!(self.body, r#" text-decoration="{}""#, decoration.join(" "));
        }
        if style.link {
            let _ = write!(self.body, r#" fill="{}""#, LINK_COLOR);
        }
    }

    fn code_block(&mut self, lines: &[String]) {
        let width = self.config.content_width();
        let line_height = CODE_SIZE * 1.5;
        let max_chars = (((width - 2.0 * CODE_PADDING) / (CODE_SIZE * 0.6)).floor() as usize).max(1);

        let mut wrapped: Vec<Cow<'_, str>> = Vec::new();
        for line in lines {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() <= max_chars {
                wrapped.push(Cow::Borrowed(line.as_str()));
            } else {
                for chunk in chars.chunks(max_chars) {
                    wrapped.push(Cow::Owned(chunk.iter().collect()));
                }
            }
        }

        let height = wrapped.len().max(1) as f32 * line_height + 2.0 * CODE_PADDING;
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="8" fill="{}"/>"#,
            self.config.padding, self.y, width, height, CODE_BACKGROUND
        );
        for (i, line) in wrapped.iter().enumerate() {
            let baseline = self.y
                + CODE_PADDING
                + i as f32 * line_height
                + baseline_offset(CODE_SIZE, line_height);
            let _ = write!(
                self.body,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" xml:space="preserve">{}</text>"#,
                self.config.padding + CODE_PADDING,
                baseline,
                MONO_FONT,
                CODE_SIZE,
                CODE_COLOR,
                escape(&**line)
            );
        }
        self.y += height + 8.0;
    }

    fn image(&mut self, width: Option<f32>, align: TextAlign, image: &ResolvedImage) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let available = self.config.content_width();
        let natural = image.width as f32;
        let target = width.filter(|w| *w > 0.0).unwrap_or(natural).min(available);
        let height = target * image.height as f32 / natural;
        let x = self.config.padding + align_offset(align, available, target);
        let _ = write!(
            self.body,
            r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="none" xlink:href="{}"/>"#,
            x,
            self.y,
            target,
            height,
            escape(image.data_uri.as_str())
        );
        self.y += height + 8.0;
    }

    fn rule(&mut self) {
        self.y += 8.0;
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="1" fill="{}"/>"#,
            self.config.padding,
            self.y,
            self.config.content_width(),
            RULE_COLOR
        );
        self.y += 9.0;
    }

    fn finish(self) -> String {
        let width = self.config.viewport_width;
        let height = (self.y + self.config.padding).ceil().max(1.0);
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = width,
            h = height,
            body = self.body
        )
    }
}

fn baseline_offset(size: f32, line_height: f32) -> f32 {
    (line_height - size) / 2.0 + size * 0.8
}

/// Lay out blocks top to bottom and return the SVG document.
///
/// `images` holds one entry per [`Block::Image`] in order; `None` entries
/// are skipped.
pub fn render_svg(blocks: &[Block], images: &[Option<ResolvedImage>], config: LayoutConfig) -> String {
    let mut svg = SvgBuilder::new(config);
    let mut images = images.iter();
    for block in blocks {
        match block {
            Block::Text {
                kind,
                align,
                tokens,
            } => svg.text_block(kind, *align, tokens),
            Block::Code { lines } => svg.code_block(lines),
            Block::Image { width, align, .. } => {
                if let Some(Some(image)) = images.next() {
                    svg.image(*width, *align, image);
                }
            }
            Block::Rule => svg.rule(),
        }
    }
    svg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docport_surface::{parse_element, StyleSheet};

    fn blocks_of(markup: &str, css: &str) -> Vec<Block> {
        let tree = RenderTree::new(Some(parse_element(markup).unwrap()), StyleSheet::parse(css));
        collect_blocks(&tree)
    }

    fn words(block: &Block) -> Vec<String> {
        match block {
            Block::Text { tokens, .. } => tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Word { text, .. } => Some(text.clone()),
                    Token::Break => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_collects_headings_paragraphs_and_alignment() {
        let blocks = blocks_of(
            r#"<div><h2>Title</h2><p class="c">Hello <b>bold</b> world</p><hr></div>"#,
            ".c { text-align: center }",
        );
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::Text { kind: BlockKind::Heading(2), .. }));
        assert!(matches!(
            &blocks[1],
            Block::Text {
                align: TextAlign::Center,
                ..
            }
        ));
        assert_eq!(words(&blocks[1]), vec!["Hello", "bold", "world"]);
        assert_eq!(blocks[2], Block::Rule);
    }

    #[test]
    fn test_inline_style_boundaries_without_spaces() {
        let blocks = blocks_of("<p>bo<b>ld</b> move</p>", "");
        let Block::Text { tokens, .. } = &blocks[0] else {
            panic!("expected text block");
        };
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[1], Token::Word { space_before: false, style, .. } if style.bold));
        assert!(matches!(&tokens[2], Token::Word { space_before: true, .. }));
    }

    #[test]
    fn test_blocknote_list_items_get_markers() {
        let blocks = blocks_of(
            r#"<div>
              <div class="bn-block-content" data-content-type="numberedListItem"><p>One</p></div>
              <div class="bn-block-content" data-content-type="numberedListItem"><p>Two</p></div>
              <div class="bn-block-content" data-content-type="bulletListItem"><p>Dot</p></div>
              <div class="bn-block-content" data-content-type="checkListItem" data-checked="true"><p>Done</p></div>
            </div>"#,
            "",
        );
        let markers: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Text {
                    kind: BlockKind::ListItem { marker, .. },
                    ..
                } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["1.", "2.", "\u{2022}", "\u{2611}"]);
    }

    #[test]
    fn test_html_lists_code_and_images() {
        let blocks = blocks_of(
            r#"<div><ol start="3"><li>Three</li><li><p>Four</p></li></ol>
            <pre><code>fn main() {
    run();
}
</code></pre><img src="a.png" width="120"><span style="display: none">gone</span></div>"#,
            "",
        );
        assert!(matches!(
            &blocks[0],
            Block::Text { kind: BlockKind::ListItem { marker, depth: 1 }, .. } if marker == "3."
        ));
        assert!(matches!(
            &blocks[1],
            Block::Text { kind: BlockKind::ListItem { marker, .. }, .. } if marker == "4."
        ));
        assert_eq!(
            blocks[2],
            Block::Code {
                lines: vec!["fn main() {".into(), "    run();".into(), "}".into()]
            }
        );
        assert_eq!(
            blocks[3],
            Block::Image {
                src: "a.png".into(),
                width: Some(120.0),
                align: TextAlign::Start
            }
        );
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn test_wrap_breaks_long_lines() {
        let tokens: Vec<Token> = (0..40)
            .map(|i| Token::Word {
                text: "word".into(),
                style: RunStyle::default(),
                space_before: i > 0,
            })
            .collect();
        let lines = wrap(&tokens, 14.0, 200.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 200.0));
        assert!(lines[1].pieces[0].0 == "word");
    }

    #[test]
    fn test_render_svg_height_grows_with_content() {
        let config = LayoutConfig::default();
        let short = render_svg(
            &blocks_of("<p>One</p>", ""),
            &[],
            config,
        );
        let long = render_svg(
            &blocks_of("<div><p>One</p><p>Two</p><pre>x\ny</pre></div>", ""),
            &[],
            config,
        );
        assert!(short.starts_with("<svg"));
        assert!(long.contains(CODE_BACKGROUND));
        let height = |svg: &str| -> f32 {
            let start = svg.find("height=\"").unwrap() + 8;
            let end = start + svg[start..].find('"').unwrap();
            svg[start..end].parse().unwrap()
        };
        assert!(height(&long) > height(&short));
    }

    #[test]
    fn test_render_svg_escapes_text() {
        let svg = render_svg(&blocks_of("<p>a &lt; b &amp; c</p>", ""), &[], LayoutConfig::default());
        assert!(svg.contains("&lt;"));
        assert!(svg.contains("&amp;"));
    }

    #[test]
    fn test_image_is_scaled_to_content_width() {
        let blocks = vec![Block::Image {
            src: "x".into(),
            width: None,
            align: TextAlign::Start,
        }];
        let image = ResolvedImage {
            data_uri: "data:image/png;base64,AAAA".into(),
            width: 2000,
            height: 1000,
        };
        let svg = render_svg(&blocks, &[Some(image)], LayoutConfig::default());
        assert!(svg.contains(r#"width="768.00" height="384.00""#));
    }
}
