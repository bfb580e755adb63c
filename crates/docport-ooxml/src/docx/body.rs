//! HTML flow to WordprocessingML body content
//!
//! Block elements become paragraphs and tables; inline elements become runs.
//! BlockNote markup is recognised through its `data-content-type` block
//! wrappers and `bn-block-group` nesting.

use std::collections::HashMap;

use docport_surface::{parse_px, Display, Element, Node, TextAlign};

use crate::docx::media::{display_size, px_to_emu, MediaImage};
use crate::docx::numbering::{indent_for, Numbering, BULLET_NUM_ID};
use crate::relationships::Relationships;
use crate::xml::escape_text;

const PICTURE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Elements that never contribute content
const SKIPPED: &[&str] = &["head", "style", "script", "template", "noscript", "title", "meta", "link"];

/// Elements laid out as blocks
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// A media part collected during conversion
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPart {
    /// Package path, under `word/media/`
    pub path: String,
    /// The decoded image
    pub image: MediaImage,
}

/// Layout settings for body conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLayout {
    /// Text area width in twips
    pub text_width_twips: u32,
    /// Mark table rows as non-splittable
    pub cant_split_rows: bool,
    /// Honor image `width`/`height` attributes
    pub honor_image_size: bool,
}

/// Result of converting a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyOutput {
    /// Block-level content of `w:body`, without `w:sectPr`
    pub xml: String,
    /// Embedded media in first-use order
    pub media: Vec<MediaPart>,
    /// Numbering instances used by lists
    pub numbering: Numbering,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunProps {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    code: bool,
    link: bool,
    superscript: bool,
    subscript: bool,
}

impl RunProps {
    /// Apply inline `font-weight`, `font-style` and `text-decoration`
    fn with_style(mut self, el: &Element) -> Self {
        let style = el.style();
        if let Some(weight) = style.get("font-weight") {
            self.bold = weight == "bold" || weight.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
        }
        if let Some(font_style) = style.get("font-style") {
            self.italic = font_style == "italic" || font_style == "oblique";
        }
        if let Some(decoration) = style.get("text-decoration") {
            self.underline |= decoration.contains("underline");
            self.strike |= decoration.contains("line-through");
        }
        self
    }

    fn to_xml(self) -> String {
        if self == Self::default() {
            return String::new();
        }
        let mut xml = String::from("<w:rPr>");
        if self.link {
            xml.push_str(r#"<w:rStyle w:val="Hyperlink"/>"#);
        } else if self.code {
            xml.push_str(r#"<w:rStyle w:val="CodeChar"/>"#);
        }
        if self.bold {
            xml.push_str("<w:b/>");
        }
        if self.italic {
            xml.push_str("<w:i/>");
        }
        if self.strike {
            xml.push_str("<w:strike/>");
        }
        if self.underline {
            xml.push_str(r#"<w:u w:val="single"/>"#);
        }
        if self.superscript {
            xml.push_str(r#"<w:vertAlign w:val="superscript"/>"#);
        } else if self.subscript {
            xml.push_str(r#"<w:vertAlign w:val="subscript"/>"#);
        }
        xml.push_str("</w:rPr>");
        xml
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ParagraphProps {
    style: Option<String>,
    numbering: Option<(u32, usize)>,
    indent: Option<u32>,
    align: Option<&'static str>,
}

impl ParagraphProps {
    fn to_xml(&self) -> String {
        let mut xml = String::new();
        if let Some(style) = &self.style {
            xml.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape_text(style)));
        }
        if let Some((num_id, level)) = self.numbering {
            xml.push_str(&format!(
                r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
                level, num_id
            ));
        }
        if let Some(left) = self.indent {
            xml.push_str(&format!(r#"<w:ind w:left="{}" w:hanging="360"/>"#, left));
        }
        if let Some(align) = self.align {
            xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, align));
        }
        if xml.is_empty() {
            xml
        } else {
            format!("<w:pPr>{}</w:pPr>", xml)
        }
    }
}

/// A paragraph being filled with runs
struct Paragraph {
    props: ParagraphProps,
    runs: String,
    at_line_start: bool,
    pending_space: bool,
    ends_in_space: bool,
}

impl Paragraph {
    fn new(props: ParagraphProps) -> Self {
        Self {
            props,
            runs: String::new(),
            at_line_start: true,
            pending_space: false,
            ends_in_space: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Append text with HTML whitespace collapsing
    fn text(&mut self, text: &str, props: RunProps) {
        let leading = text.starts_with(char::is_whitespace);
        let trailing = text.ends_with(char::is_whitespace);
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            if leading && !self.at_line_start {
                self.pending_space = true;
            }
            return;
        }

        let mut collapsed = String::new();
        if (leading || self.pending_space) && self.needs_space() {
            collapsed.push(' ');
        }
        collapsed.push_str(&words.join(" "));
        self.pending_space = trailing;
        self.run(&collapsed, props);
    }

    fn needs_space(&self) -> bool {
        !self.at_line_start && !self.ends_in_space
    }

    /// Append text exactly as given
    fn run(&mut self, text: &str, props: RunProps) {
        self.runs.push_str(&format!(
            r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
            props.to_xml(),
            escape_text(text)
        ));
        self.at_line_start = false;
        self.ends_in_space = text.ends_with(' ');
    }

    fn line_break(&mut self) {
        self.runs.push_str("<w:r><w:br/></w:r>");
        self.at_line_start = true;
        self.pending_space = false;
        self.ends_in_space = false;
    }

    /// Append a non-text run, writing any collapsed space before it
    fn object(&mut self, xml: &str, props: RunProps) {
        if self.pending_space && self.needs_space() {
            self.run(" ", props);
        }
        self.runs.push_str(xml);
        self.at_line_start = false;
        self.pending_space = false;
        self.ends_in_space = false;
    }

    fn to_xml(&self) -> String {
        format!("<w:p>{}{}</w:p>", self.props.to_xml(), self.runs)
    }
}

/// Inherited block state
#[derive(Debug, Clone, Default)]
struct BlockContext {
    align: Option<&'static str>,
    style: Option<&'static str>,
    run: RunProps,
    list_depth: usize,
    group_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastBlock {
    None,
    Paragraph,
    Table,
}

/// Converts an HTML body into WordprocessingML
pub struct BodyWriter<'r> {
    out: String,
    rels: &'r mut Relationships,
    layout: BodyLayout,
    media: Vec<MediaPart>,
    media_rels: HashMap<String, String>,
    numbering: Numbering,
    numbered_run: Option<u32>,
    next_drawing_id: u32,
    last_block: LastBlock,
}

impl<'r> BodyWriter<'r> {
    /// Create a writer adding hyperlink and image relationships to `rels`
    pub fn new(rels: &'r mut Relationships, layout: BodyLayout) -> Self {
        Self {
            out: String::new(),
            rels,
            layout,
            media: Vec::new(),
            media_rels: HashMap::new(),
            numbering: Numbering::new(),
            numbered_run: None,
            next_drawing_id: 1,
            last_block: LastBlock::None,
        }
    }

    /// Convert the children of a body element
    pub fn write_body(mut self, body: &Element) -> BodyOutput {
        self.flow(&body.children, &BlockContext::default());
        BodyOutput {
            xml: self.out,
            media: self.media,
            numbering: self.numbering,
        }
    }

    fn text_width_px(&self) -> f32 {
        self.layout.text_width_twips as f32 / 15.0
    }

    /// Lay out mixed content: runs of inline nodes become paragraphs
    fn flow(&mut self, nodes: &[Node], ctx: &BlockContext) {
        let mut para: Option<Paragraph> = None;
        for node in nodes {
            match node {
                Node::Element(el) if is_block(el) => {
                    if let Some(p) = para.take() {
                        self.finish_paragraph(p, false);
                    }
                    self.block(el, ctx);
                }
                Node::Element(el) => {
                    let p = para.get_or_insert_with(|| Paragraph::new(ctx_props(ctx)));
                    self.inline_element(p, el, ctx.run);
                }
                Node::Text(text) => {
                    if para.is_none() && text.trim().is_empty() {
                        continue;
                    }
                    let p = para.get_or_insert_with(|| Paragraph::new(ctx_props(ctx)));
                    p.text(text, ctx.run);
                }
                Node::Comment(_) => {}
            }
        }
        if let Some(p) = para {
            self.finish_paragraph(p, false);
        }
    }

    fn finish_paragraph(&mut self, para: Paragraph, keep_empty: bool) {
        if para.is_empty() && !keep_empty {
            return;
        }
        if para.props.numbering.is_none() && para.props.indent.is_none() {
            self.numbered_run = None;
        }
        self.out.push_str(&para.to_xml());
        self.last_block = LastBlock::Paragraph;
    }

    fn block(&mut self, el: &Element, ctx: &BlockContext) {
        if is_hidden(el) {
            return;
        }
        let align = alignment(el).or(ctx.align);
        let ctx = &BlockContext {
            align,
            ..ctx.clone()
        };

        match el.name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let style = format!("Heading{}", &el.name[1..]);
                self.paragraph(el, Some(style), ctx);
            }
            "p" => self.paragraph(el, ctx.style.map(str::to_string), ctx),
            "pre" => self.code_block(el, ctx),
            "ul" | "ol" => self.list(el, el.is("ol"), ctx),
            "li" => self.list_item(el, BULLET_NUM_ID, ctx),
            "table" => self.table(el, ctx),
            "hr" => {
                self.out.push_str(r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr></w:pPr></w:p>"#);
                self.numbered_run = None;
                self.last_block = LastBlock::Paragraph;
            }
            "blockquote" => {
                let quote = BlockContext {
                    style: Some("Quote"),
                    ..ctx.clone()
                };
                self.flow(&el.children, &quote);
            }
            _ => match el.attr("data-content-type") {
                Some("bulletListItem") => self.blocknote_item(el, ListKind::Bullet, ctx),
                Some("numberedListItem") => self.blocknote_item(el, ListKind::Numbered, ctx),
                Some("checkListItem") => self.blocknote_item(el, ListKind::Check, ctx),
                _ if el.has_class("bn-block-group") => {
                    let nested = BlockContext {
                        group_depth: ctx.group_depth + 1,
                        ..ctx.clone()
                    };
                    self.flow(&el.children, &nested);
                }
                _ => self.flow(&el.children, ctx),
            },
        }
    }

    fn paragraph(&mut self, el: &Element, style: Option<String>, ctx: &BlockContext) {
        let mut para = Paragraph::new(ParagraphProps {
            style,
            align: ctx.align,
            ..ParagraphProps::default()
        });
        self.inline_nodes(&mut para, &el.children, ctx.run);
        self.finish_paragraph(para, true);
    }

    fn code_block(&mut self, el: &Element, ctx: &BlockContext) {
        let text = el.text_content();
        let text = text.strip_suffix('\n').unwrap_or(&text);
        let mut para = Paragraph::new(ParagraphProps {
            style: Some("Code".to_string()),
            align: ctx.align,
            ..ParagraphProps::default()
        });
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                para.line_break();
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if !line.is_empty() {
                para.run(line, RunProps::default());
            }
        }
        self.finish_paragraph(para, true);
    }

    fn list(&mut self, el: &Element, ordered: bool, ctx: &BlockContext) {
        let num_id = if ordered {
            self.numbering.new_ordered()
        } else {
            BULLET_NUM_ID
        };
        for item in el.child_elements().filter(|c| c.is("li")) {
            if is_hidden(item) {
                continue;
            }
            let item_ctx = BlockContext {
                align: alignment(item).or(ctx.align),
                ..ctx.clone()
            };
            self.list_item(item, num_id, &item_ctx);
        }
    }

    fn list_item(&mut self, item: &Element, num_id: u32, ctx: &BlockContext) {
        let level = ctx.list_depth;
        let props = match checkbox_state(item) {
            Some(_) => ParagraphProps {
                style: Some("ListParagraph".to_string()),
                indent: Some(indent_for(level)),
                align: ctx.align,
                ..ParagraphProps::default()
            },
            None => ParagraphProps {
                style: Some("ListParagraph".to_string()),
                numbering: Some((num_id, level)),
                align: ctx.align,
                ..ParagraphProps::default()
            },
        };
        let prefix = checkbox_state(item).map(check_mark);
        let nested_ctx = BlockContext {
            list_depth: level + 1,
            ..ctx.clone()
        };
        self.list_paragraph(item, props, prefix, ctx.run, &nested_ctx);
    }

    fn blocknote_item(&mut self, el: &Element, kind: ListKind, ctx: &BlockContext) {
        let level = ctx.group_depth.saturating_sub(1);
        let mut props = ParagraphProps {
            style: Some("ListParagraph".to_string()),
            align: ctx.align,
            ..ParagraphProps::default()
        };
        let mut prefix = None;
        match kind {
            ListKind::Bullet => props.numbering = Some((BULLET_NUM_ID, level)),
            ListKind::Numbered => {
                let num_id = match self.numbered_run {
                    Some(id) => id,
                    None => self.numbering.new_ordered(),
                };
                self.numbered_run = Some(num_id);
                props.numbering = Some((num_id, level));
            }
            ListKind::Check => {
                props.indent = Some(indent_for(level));
                let checked = el.attr("data-checked") == Some("true")
                    || checkbox_state(el).unwrap_or(false);
                prefix = Some(check_mark(checked));
            }
        }
        let nested_ctx = BlockContext {
            list_depth: ctx.list_depth + 1,
            ..ctx.clone()
        };
        self.list_paragraph(el, props, prefix, ctx.run, &nested_ctx);
    }

    /// One paragraph for an item's inline content; nested lists and other
    /// blocks follow it
    fn list_paragraph(
        &mut self,
        item: &Element,
        props: ParagraphProps,
        prefix: Option<&str>,
        run: RunProps,
        nested_ctx: &BlockContext,
    ) {
        let mut para = Paragraph::new(props);
        if let Some(prefix) = prefix {
            para.run(prefix, run);
        }
        let mut nested = Vec::new();
        self.inline_flatten(&mut para, &item.children, run, &mut nested);
        self.finish_paragraph(para, true);
        for block in nested {
            self.block(block, nested_ctx);
        }
    }

    fn inline_flatten<'e>(
        &mut self,
        para: &mut Paragraph,
        nodes: &'e [Node],
        run: RunProps,
        nested: &mut Vec<&'e Element>,
    ) {
        for node in nodes {
            match node {
                Node::Text(text) => para.text(text, run),
                Node::Element(el) if is_hidden(el) => {}
                Node::Element(el) => match el.name.as_str() {
                    "ul" | "ol" | "table" | "pre" | "blockquote" | "hr" => nested.push(el),
                    _ if el.has_class("bn-block-group") => nested.push(el),
                    _ if is_block(el) => {
                        para.pending_space = true;
                        self.inline_flatten(para, &el.children, run.with_style(el), nested);
                    }
                    _ => self.inline_element(para, el, run),
                },
                Node::Comment(_) => {}
            }
        }
    }

    fn inline_nodes(&mut self, para: &mut Paragraph, nodes: &[Node], run: RunProps) {
        for node in nodes {
            match node {
                Node::Text(text) => para.text(text, run),
                Node::Element(el) => self.inline_element(para, el, run),
                Node::Comment(_) => {}
            }
        }
    }

    fn inline_element(&mut self, para: &mut Paragraph, el: &Element, run: RunProps) {
        if is_hidden(el) {
            return;
        }
        let mut run = run.with_style(el);
        match el.name.as_str() {
            "br" => {
                para.line_break();
                return;
            }
            "img" => {
                self.image(para, el, run);
                return;
            }
            "input" => return,
            "a" => {
                self.hyperlink(para, el, run);
                return;
            }
            "strong" | "b" | "th" => run.bold = true,
            "em" | "i" | "cite" | "var" => run.italic = true,
            "u" | "ins" => run.underline = true,
            "s" | "strike" | "del" => run.strike = true,
            "code" | "kbd" | "samp" => run.code = true,
            "sup" => run.superscript = true,
            "sub" => run.subscript = true,
            _ => {}
        }
        self.inline_nodes(para, &el.children, run);
    }

    fn hyperlink(&mut self, para: &mut Paragraph, el: &Element, run: RunProps) {
        let href = el.attr("href").map(str::trim).unwrap_or_default();
        if href.is_empty() {
            self.inline_nodes(para, &el.children, run);
            return;
        }
        let open = match href.strip_prefix('#') {
            Some(anchor) => format!(r#"<w:hyperlink w:anchor="{}">"#, escape_text(anchor)),
            None => {
                let id = self.rels.add_external(Relationships::TYPE_HYPERLINK, href);
                format!(r#"<w:hyperlink r:id="{}">"#, id)
            }
        };
        para.runs.push_str(&open);
        let link = RunProps { link: true, ..run };
        self.inline_nodes(para, &el.children, link);
        para.runs.push_str("</w:hyperlink>");
    }

    fn image(&mut self, para: &mut Paragraph, el: &Element, run: RunProps) {
        let Some(src) = el.attr("src").filter(|s| !s.is_empty()) else {
            return;
        };
        let Some(image) = MediaImage::from_data_uri(src) else {
            tracing::debug!("image source is not an embeddable data URI, skipped");
            return;
        };

        let style = el.style();
        let dimension = |name: &str| {
            el.attr(name)
                .and_then(parse_px)
                .or_else(|| style.get(name).and_then(parse_px))
                .filter(|v| *v > 0.0)
        };
        let (width, height) = display_size(
            (image.width, image.height),
            dimension("width"),
            dimension("height"),
            self.text_width_px(),
            self.layout.honor_image_size,
        );
        let (cx, cy) = (px_to_emu(width), px_to_emu(height));

        let rel_id = self.media_rel(image);
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let name = format!("Picture {}", id);
        let alt = el.attr("alt").unwrap_or_default();

        let drawing = format!(
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{id}" name="{name}" descr="{alt}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{uri}"><pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
            ),
            cx = cx,
            cy = cy,
            id = id,
            name = name,
            alt = escape_text(alt),
            uri = PICTURE_URI,
            rel = rel_id,
        );
        para.object(&drawing, run);
    }

    fn media_rel(&mut self, image: MediaImage) -> String {
        let file_name = image.file_name();
        if let Some(id) = self.media_rels.get(&file_name) {
            return id.clone();
        }
        let id = self
            .rels
            .add(Relationships::TYPE_IMAGE, format!("media/{}", file_name));
        self.media.push(MediaPart {
            path: format!("word/media/{}", file_name),
            image,
        });
        self.media_rels.insert(file_name, id.clone());
        id
    }

    fn table(&mut self, el: &Element, ctx: &BlockContext) {
        let rows = table_rows(el);
        let columns = rows
            .iter()
            .map(|(row, _)| {
                row.child_elements()
                    .filter(|c| c.is("td") || c.is("th"))
                    .map(col_span)
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }
        let col_width = self.layout.text_width_twips / columns;

        self.out.push_str(concat!(
            r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"</w:tblBorders><w:tblLook w:val="04A0"/></w:tblPr><w:tblGrid>"#,
        ));
        for _ in 0..columns {
            self.out
                .push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, col_width));
        }
        self.out.push_str("</w:tblGrid>");

        for (row, header) in rows {
            self.out.push_str("<w:tr>");
            if self.layout.cant_split_rows || header {
                self.out.push_str("<w:trPr>");
                if self.layout.cant_split_rows {
                    self.out.push_str("<w:cantSplit/>");
                }
                if header {
                    self.out.push_str("<w:tblHeader/>");
                }
                self.out.push_str("</w:trPr>");
            }
            for cell in row.child_elements().filter(|c| c.is("td") || c.is("th")) {
                let span = col_span(cell);
                self.out.push_str(&format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>"#,
                    col_width * span
                ));
                if span > 1 {
                    self.out
                        .push_str(&format!(r#"<w:gridSpan w:val="{}"/>"#, span));
                }
                self.out.push_str("</w:tcPr>");

                let cell_ctx = BlockContext {
                    align: alignment(cell).or(ctx.align),
                    style: None,
                    run: RunProps {
                        bold: cell.is("th") || ctx.run.bold,
                        ..ctx.run
                    },
                    list_depth: 0,
                    group_depth: ctx.group_depth,
                };
                self.last_block = LastBlock::None;
                self.flow(&cell.children, &cell_ctx);
                // A cell must end with a paragraph
                if self.last_block != LastBlock::Paragraph {
                    self.out.push_str("<w:p/>");
                }
                self.out.push_str("</w:tc>");
            }
            self.out.push_str("</w:tr>");
        }

        self.out.push_str("</w:tbl>");
        self.numbered_run = None;
        self.last_block = LastBlock::Table;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Numbered,
    Check,
}

fn ctx_props(ctx: &BlockContext) -> ParagraphProps {
    ParagraphProps {
        style: ctx.style.map(str::to_string),
        align: ctx.align,
        ..ParagraphProps::default()
    }
}

fn is_block(el: &Element) -> bool {
    BLOCK_TAGS.contains(&el.name.as_str()) || SKIPPED.contains(&el.name.as_str())
}

fn is_hidden(el: &Element) -> bool {
    SKIPPED.contains(&el.name.as_str())
        || el.has_attr("hidden")
        || el
            .style()
            .get("display")
            .and_then(Display::parse)
            .map(|d| matches!(d, Display::None))
            .unwrap_or(false)
}

/// Explicit alignment as a `w:jc` value
fn alignment(el: &Element) -> Option<&'static str> {
    let style = el.style();
    let value = style
        .get("text-align")
        .or_else(|| el.attr("align"))
        .or_else(|| el.attr("data-text-alignment"))?;
    match TextAlign::parse(value)? {
        TextAlign::Center => Some("center"),
        TextAlign::Right | TextAlign::End => Some("right"),
        TextAlign::Justify => Some("both"),
        TextAlign::Left | TextAlign::Start => Some("left"),
    }
}

/// Checkbox state of a task list item, if it has a checkbox
fn checkbox_state(el: &Element) -> Option<bool> {
    let mut state = None;
    el.for_each_descendant(&mut |d: &Element| {
        if state.is_none() && d.is("input") && d.attr("type") == Some("checkbox") {
            state = Some(d.has_attr("checked"));
        }
    });
    state
}

fn check_mark(checked: bool) -> &'static str {
    if checked {
        "\u{2611} "
    } else {
        "\u{2610} "
    }
}

fn col_span(cell: &Element) -> u32 {
    cell.attr("colspan")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1)
}

/// Rows of a table, flagged when they sit in `thead`
fn table_rows(table: &Element) -> Vec<(&Element, bool)> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.name.as_str() {
            "tr" => rows.push((child, false)),
            "thead" | "tbody" | "tfoot" => {
                let header = child.is("thead");
                rows.extend(child.child_elements().filter(|r| r.is("tr")).map(|r| (r, header)));
            }
            _ => {}
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use docport_surface::parse_element;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn layout() -> BodyLayout {
        BodyLayout {
            text_width_twips: 10466,
            cant_split_rows: true,
            honor_image_size: true,
        }
    }

    fn convert(markup: &str) -> (BodyOutput, Relationships) {
        let body = parse_element(&format!("<body>{}</body>", markup)).unwrap();
        let mut rels = Relationships::new();
        let output = BodyWriter::new(&mut rels, layout()).write_body(&body);
        (output, rels)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let (out, _) = convert("<h2>Title</h2><p>Hello <strong>bold</strong> <em>world</em></p>");
        assert!(out.xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(out.xml.contains(">Title</w:t>"));
        assert!(out.xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve"> bold</w:t>"#));
        assert!(out.xml.contains(r#"<w:rPr><w:i/></w:rPr><w:t xml:space="preserve"> world</w:t>"#));
    }

    #[test]
    fn test_whitespace_collapses() {
        let (out, _) = convert("<p>\n   Some \n  text   </p>");
        assert!(out.xml.contains(r#"<w:t xml:space="preserve">Some text</w:t>"#));
    }

    #[test]
    fn test_alignment_maps_to_jc() {
        let (out, _) = convert(
            r#"<p style="text-align: center">a</p><p style="text-align: justify">b</p><h1 style="text-align: right">c</h1>"#,
        );
        assert!(out.xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(out.xml.contains(r#"<w:jc w:val="both"/>"#));
        assert!(out.xml.contains(r#"<w:jc w:val="right"/>"#));
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let (out, _) = convert("<pre><code>fn main() {\n    run();\n}\n</code></pre>");
        assert!(out.xml.contains(r#"<w:pStyle w:val="Code"/>"#));
        assert!(out.xml.contains(r#"<w:t xml:space="preserve">    run();</w:t>"#));
        assert_eq!(out.xml.matches("<w:br/>").count(), 2);
    }

    #[test]
    fn test_inline_code_and_breaks() {
        let (out, _) = convert("<p>use <code>x</code><br>next</p>");
        assert!(out.xml.contains(r#"<w:rStyle w:val="CodeChar"/>"#));
        assert!(out.xml.contains("<w:r><w:br/></w:r><w:r><w:t xml:space=\"preserve\">next</w:t>"));
    }

    #[test]
    fn test_html_lists() {
        let (out, _) = convert("<ul><li>a<ul><li>nested</li></ul></li></ul><ol><li>one</li></ol><ol><li>again</li></ol>");
        assert!(out.xml.contains(r#"<w:ilvl w:val="0"/><w:numId w:val="1"/>"#));
        assert!(out.xml.contains(r#"<w:ilvl w:val="1"/><w:numId w:val="1"/>"#));
        assert!(out.xml.contains(r#"<w:numId w:val="2"/>"#));
        assert!(out.xml.contains(r#"<w:numId w:val="3"/>"#));
        assert_eq!(out.numbering.ordered_count(), 2);
    }

    #[test]
    fn test_blocknote_lists() {
        let markup = r#"<div class="bn-block-group">
          <div class="bn-block-outer"><div class="bn-block">
            <div class="bn-block-content" data-content-type="numberedListItem"><p class="bn-inline-content">One</p></div>
            <div class="bn-block-group">
              <div class="bn-block-outer"><div class="bn-block">
                <div class="bn-block-content" data-content-type="bulletListItem"><p class="bn-inline-content">Inner</p></div>
              </div></div>
            </div>
          </div></div>
          <div class="bn-block-outer"><div class="bn-block">
            <div class="bn-block-content" data-content-type="numberedListItem"><p class="bn-inline-content">Two</p></div>
          </div></div>
          <div class="bn-block-outer"><div class="bn-block">
            <div class="bn-block-content" data-content-type="checkListItem" data-checked="true"><div><input type="checkbox" checked></div><p class="bn-inline-content">Done</p></div>
          </div></div>
        </div>"#;
        let (out, _) = convert(markup);
        // both numbered items continue one list
        assert_eq!(out.numbering.ordered_count(), 1);
        assert_eq!(out.xml.matches(r#"<w:numId w:val="2"/>"#).count(), 2);
        assert!(out.xml.contains(r#"<w:ilvl w:val="1"/><w:numId w:val="1"/>"#));
        assert!(out.xml.contains("\u{2611} "));
        assert!(out.xml.contains(">Done</w:t>"));
    }

    #[test]
    fn test_table_rows_cannot_split() {
        let (out, _) = convert(
            "<table><thead><tr><th>H1</th><th>H2</th></tr></thead><tbody><tr><td colspan=\"2\">wide</td></tr><tr><td></td><td>x</td></tr></tbody></table>",
        );
        assert!(out.xml.contains("<w:tbl>"));
        assert_eq!(out.xml.matches("<w:cantSplit/>").count(), 3);
        assert_eq!(out.xml.matches("<w:tblHeader/>").count(), 1);
        assert!(out.xml.contains(r#"<w:gridSpan w:val="2"/>"#));
        assert!(out.xml.contains("<w:tc><w:tcPr><w:tcW w:w=\"5233\" w:type=\"dxa\"/></w:tcPr><w:p/></w:tc>"));
        assert!(out.xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">H1</w:t>"#));
    }

    #[test]
    fn test_external_and_internal_links() {
        let (out, rels) = convert(r##"<p><a href="https://example.com">site</a> and <a href="#top">top</a></p>"##);
        assert!(out.xml.contains(r#"<w:hyperlink r:id="rId1">"#));
        assert!(out.xml.contains(r#"<w:hyperlink w:anchor="top">"#));
        assert!(out.xml.contains(r#"<w:rStyle w:val="Hyperlink"/>"#));
        let rel = rels.get("rId1").unwrap();
        assert!(rel.external);
        assert_eq!(rel.target, "https://example.com");
    }

    #[test]
    fn test_images_are_embedded_once() {
        let markup = format!(
            r#"<p><img src="{0}" width="96"><img src="{0}" width="48"></p><p><img src="https://example.com/x.png"></p>"#,
            PIXEL
        );
        let (out, rels) = convert(&markup);
        assert_eq!(out.media.len(), 1);
        assert_eq!(rels.of_type(Relationships::TYPE_IMAGE).count(), 1);
        assert!(out.xml.contains(r#"<wp:extent cx="914400" cy="914400"/>"#));
        assert!(out.xml.contains(r#"<wp:extent cx="457200" cy="457200"/>"#));
        assert_eq!(out.xml.matches("<w:drawing>").count(), 2);
    }

    #[test]
    fn test_image_capped_at_text_width() {
        let markup = format!(r#"<img src="{}" width="2000" height="1000">"#, PIXEL);
        let (out, _) = convert(&markup);
        // 10466 twips is 697.7 px
        let cx = px_to_emu(10466.0 / 15.0);
        let cy = px_to_emu(10466.0 / 30.0);
        assert!(out.xml.contains(&format!(r#"<wp:extent cx="{}" cy="{}"/>"#, cx, cy)));
    }

    #[test]
    fn test_hidden_content_is_skipped() {
        let (out, _) = convert(r#"<p hidden>gone</p><div style="display: none">gone</div><p>kept</p>"#);
        assert!(!out.xml.contains("gone"));
        assert!(out.xml.contains("kept"));
    }

    #[test]
    fn test_rule_and_quote() {
        let (out, _) = convert("<blockquote><p>cited</p></blockquote><hr>");
        assert!(out.xml.contains(r#"<w:pStyle w:val="Quote"/>"#));
        assert!(out.xml.contains("<w:pBdr><w:bottom"));
    }
}
