//! Inline declarations, stylesheets and the computed properties docport reads
//!
//! Only the subset of CSS the export pipeline needs is modelled: rule sets
//! with compound selectors joined by descendant or child combinators, and the
//! `text-align`, `display` and `width` properties.

use std::fmt;

use crate::node::Element;

/// An ordered list of `property: value` declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    entries: Vec<(String, String)>,
}

impl Declarations {
    /// Parse a declaration block body (`color: red; text-align: center`)
    pub fn parse(input: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for decl in split_top_level(input, ';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if prop.is_empty() || value.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|(p, _)| *p == prop) {
                Some(existing) => existing.1 = value.to_string(),
                None => entries.push((prop, value.to_string())),
            }
        }
        Self { entries }
    }

    /// Get a property value
    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its position if already present
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(p, _)| *p == property) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.entries.push((property, value.to_string())),
        }
    }

    /// Remove a property
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let pos = self
            .entries
            .iter()
            .position(|(p, _)| p.eq_ignore_ascii_case(property))?;
        Some(self.entries.remove(pos).1)
    }

    /// Apply every declaration of `other` on top of this block
    pub fn merge(&mut self, other: &Declarations) {
        for (p, v) in &other.entries {
            self.set(p, v);
        }
    }

    /// Iterate declarations in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the block is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (p, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", p, v)?;
        }
        Ok(())
    }
}

/// Split on `sep` outside parentheses and quotes (keeps `url(data:...;base64,...)` whole)
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Horizontal text alignment as reported by computed style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// `start`, the initial value
    #[default]
    Start,
    /// `end`
    End,
    /// `left`
    Left,
    /// `right`
    Right,
    /// `center`
    Center,
    /// `justify`
    Justify,
}

impl TextAlign {
    /// Parse a CSS keyword; `inherit`/unknown values return `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" | "initial" => Some(TextAlign::Start),
            "end" => Some(TextAlign::End),
            "left" => Some(TextAlign::Left),
            "right" => Some(TextAlign::Right),
            "center" => Some(TextAlign::Center),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    /// CSS keyword
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Start => "start",
            TextAlign::End => "end",
            TextAlign::Left => "left",
            TextAlign::Right => "right",
            TextAlign::Center => "center",
            TextAlign::Justify => "justify",
        }
    }

    /// Alignments that differ from the implicit left/start default
    pub fn is_explicit(self) -> bool {
        matches!(self, TextAlign::Center | TextAlign::Right | TextAlign::Justify)
    }
}

/// Box generation for layout and plain-text rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// Not rendered
    None,
    /// Inline-level box
    #[default]
    Inline,
    /// Inline block
    InlineBlock,
    /// Block-level box
    Block,
    /// List item
    ListItem,
    /// Table
    Table,
    /// Table row
    TableRow,
    /// Table cell
    TableCell,
}

impl Display {
    /// Parse a CSS `display` value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let display = match value.as_str() {
            "none" => Display::None,
            "inline" | "contents" => Display::Inline,
            "inline-block" | "inline-flex" | "inline-grid" => Display::InlineBlock,
            "list-item" => Display::ListItem,
            "table" | "inline-table" => Display::Table,
            "table-row" => Display::TableRow,
            "table-cell" => Display::TableCell,
            "block" | "flex" | "grid" | "flow-root" | "table-row-group"
            | "table-header-group" | "table-footer-group" | "table-caption" => Display::Block,
            _ => return None,
        };
        Some(display)
    }

    /// User-agent default for a tag
    pub fn default_for(tag: &str) -> Self {
        match tag {
            "head" | "style" | "script" | "title" | "meta" | "link" | "template" | "noscript"
            | "base" => Display::None,
            "li" => Display::ListItem,
            "table" => Display::Table,
            "tr" => Display::TableRow,
            "td" | "th" => Display::TableCell,
            "address" | "article" | "aside" | "blockquote" | "body" | "caption" | "dd"
            | "details" | "dialog" | "div" | "dl" | "dt" | "fieldset" | "figcaption"
            | "figure" | "footer" | "form" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "header" | "hgroup" | "hr" | "html" | "main" | "nav" | "ol" | "p" | "pre"
            | "section" | "summary" | "tbody" | "thead" | "tfoot" | "ul" => Display::Block,
            "img" | "button" | "input" | "select" | "textarea" => Display::InlineBlock,
            _ => Display::Inline,
        }
    }

    /// Whether this box starts and ends a line in flow
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            Display::Block | Display::ListItem | Display::Table | Display::TableRow
        )
    }
}

/// Properties resolved for one element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComputedStyle {
    /// Inherited horizontal alignment
    pub text_align: TextAlign,
    /// Box type
    pub display: Display,
    /// Used width in CSS pixels when it is an absolute length
    pub width_px: Option<f32>,
}

impl ComputedStyle {
    /// Compute an element's style from its cascaded declarations and its
    /// parent's computed style
    pub fn resolve(el: &Element, cascaded: &Declarations, parent: &ComputedStyle) -> Self {
        let text_align = cascaded
            .get("text-align")
            .and_then(TextAlign::parse)
            .unwrap_or(parent.text_align);

        let mut display = Display::default_for(&el.name);
        if el.has_attr("hidden") {
            display = Display::None;
        }
        if let Some(d) = cascaded.get("display").and_then(Display::parse) {
            display = d;
        }

        let width_px = cascaded.get("width").and_then(parse_px);

        Self {
            text_align,
            display,
            width_px,
        }
    }
}

/// Parse an absolute pixel length (`120px`, `120`); percentages and other
/// units are unresolved and return `None`
pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// One attribute test inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

/// A compound selector (`div.block[data-x="1"]`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !el.is(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => el.has_attr(name),
            AttrTest::Equals(name, value) => el.attr(name) == Some(value.as_str()),
        })
    }

    fn specificity(&self) -> (u32, u32, u32) {
        (
            self.id.is_some() as u32,
            (self.classes.len() + self.attrs.len()) as u32,
            self.tag.is_some() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A complex selector: compounds joined by combinators, rightmost last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    /// Parse a single selector; unsupported syntax (pseudo-classes, sibling
    /// combinators, attribute operators other than `=`) yields `None`
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let mut pending = Combinator::Descendant;
        let spaced = input.replace('>', " > ");
        for token in spaced.split_ascii_whitespace() {
            if token == ">" {
                pending = Combinator::Child;
                continue;
            }
            parts.push((pending, parse_compound(token)?));
            pending = Combinator::Descendant;
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    /// Summed specificity
    pub fn specificity(&self) -> (u32, u32, u32) {
        self.parts.iter().fold((0, 0, 0), |acc, (_, c)| {
            let s = c.specificity();
            (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
        })
    }

    /// Match against an element whose ancestors are given outermost first
    pub fn matches(&self, el: &Element, ancestors: &[&Element]) -> bool {
        let Some(((_, last), rest)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(el) {
            return false;
        }
        let combinator = self.parts.last().map(|(c, _)| *c).unwrap_or(Combinator::Descendant);
        match_rest(rest, combinator, ancestors)
    }
}

/// Match remaining compounds (right to left) against the ancestor chain
fn match_rest(parts: &[(Combinator, Compound)], link: Combinator, ancestors: &[&Element]) -> bool {
    let Some(((next_link, compound), rest)) = parts.split_last() else {
        return true;
    };
    match link {
        Combinator::Child => match ancestors.split_last() {
            Some((parent, above)) => {
                compound.matches(parent) && match_rest(rest, *next_link, above)
            }
            None => false,
        },
        Combinator::Descendant => (0..ancestors.len()).rev().any(|i| {
            compound.matches(ancestors[i]) && match_rest(rest, *next_link, &ancestors[..i])
        }),
    }
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = token;

    let tag_end = rest.find(&['.', '#', '['][..]).unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if !tag.is_empty() && tag != "*" {
        if !is_ident(tag) {
            return None;
        }
        compound.tag = Some(tag.to_ascii_lowercase());
    }
    rest = &rest[tag_end..];

    while let Some(first) = rest.chars().next() {
        match first {
            '.' | '#' => {
                let body = &rest[1..];
                let end = body.find(&['.', '#', '['][..]).unwrap_or(body.len());
                let name = &body[..end];
                if !is_ident(name) {
                    return None;
                }
                if first == '.' {
                    compound.classes.push(name.to_string());
                } else {
                    compound.id = Some(name.to_string());
                }
                rest = &body[end..];
            }
            '[' => {
                let end = rest.find(']')?;
                let inner = &rest[1..end];
                let test = match inner.split_once('=') {
                    Some((name, value)) => {
                        let name = name.trim();
                        if !is_ident(name) {
                            return None;
                        }
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        AttrTest::Equals(name.to_ascii_lowercase(), value.to_string())
                    }
                    None => {
                        let name = inner.trim();
                        if !is_ident(name) {
                            return None;
                        }
                        AttrTest::Exists(name.to_ascii_lowercase())
                    }
                };
                compound.attrs.push(test);
                rest = &rest[end + 1..];
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A parsed rule: one selector and its declarations
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The selector
    pub selector: Selector,
    /// The declaration block
    pub declarations: Declarations,
    order: usize,
}

/// A stylesheet of simple rule sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    /// Create an empty stylesheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CSS text. At-rules and unsupported selectors are skipped
    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::new();
        sheet.append(css);
        sheet
    }

    /// Append the rules of another CSS source (later sources win ties)
    pub fn append(&mut self, css: &str) {
        let css = strip_comments(css);
        let mut rest = css.as_str();
        while let Some(open) = rest.find('{') {
            let prelude = rest[..open].trim();
            // Statement at-rules (`@import ...;`) end at a semicolon
            let prelude = match prelude.rfind(';') {
                Some(i) => prelude[i + 1..].trim(),
                None => prelude,
            };
            let Some(close_rel) = rest[open..].find('}') else {
                break;
            };
            let body = &rest[open + 1..open + close_rel];
            rest = &rest[open + close_rel + 1..];

            if prelude.starts_with('@') {
                // Nested at-rule blocks (`@media { a { } }`) are dropped whole
                if let Some(end) = rest.find('}') {
                    if body.contains('{') {
                        rest = &rest[end + 1..];
                    }
                }
                continue;
            }

            let declarations = Declarations::parse(body);
            if declarations.is_empty() {
                continue;
            }
            for selector in prelude.split(',').filter_map(Selector::parse) {
                let order = self.rules.len();
                self.rules.push(Rule {
                    selector,
                    declarations: declarations.clone(),
                    order,
                });
            }
        }
    }

    /// All rules in source order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the stylesheet has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Cascaded declarations for an element: presentational hints, then
    /// matching rules by (specificity, order), then the inline style
    pub fn cascade(&self, el: &Element, ancestors: &[&Element]) -> Declarations {
        let mut out = Declarations::default();
        if let Some(width) = el.attr("width") {
            out.set("width", width);
        }
        if let Some(align) = el.attr("align") {
            out.set("text-align", align);
        }

        let mut matching: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(el, ancestors))
            .collect();
        matching.sort_by_key(|r| (r.selector.specificity(), r.order));
        for rule in matching {
            out.merge(&rule.declarations);
        }

        out.merge(&el.style());
        out
    }

    /// Last value of `property` among rules matching a bare `tag` element
    pub fn first_value(&self, tag: &str, property: &str) -> Option<&str> {
        let sample = Element::new(tag);
        self.rules
            .iter()
            .filter(|r| r.selector.matches(&sample, &[]))
            .filter_map(|r| r.declarations.get(property))
            .last()
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}
