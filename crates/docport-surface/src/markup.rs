//! HTML markup reading and serialization
//!
//! The reader is a lenient tokenizer pass over `quick-xml` events: HTML void
//! elements need no end tag, stray or mismatched end tags close the nearest
//! matching open element, and HTML5 named entities are decoded. It is meant
//! for rendered editor markup (browser `outerHTML` dumps and the output of
//! [`inner_html`]), not for arbitrary tag soup.

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, SurfaceError};
use crate::node::{Attribute, Element, Node};

/// Elements that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is written without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Check whether a tag is an HTML void element
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse markup into a list of top-level nodes
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.trim_text(false);
    }

    // Stack of open elements; index 0 collects top-level nodes
    let mut stack: Vec<Element> = vec![Element::new("#fragment")];

    loop {
        let event = reader.read_event().map_err(|e| SurfaceError::Markup {
            position: reader.buffer_position(),
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let el = element_from_start(&start)?;
                if is_void(&el.name) {
                    push_child(&mut stack, Node::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Event::Empty(start) => {
                let el = element_from_start(&start)?;
                push_child(&mut stack, Node::Element(el));
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if is_void(&name) {
                    continue;
                }
                // Close up to the nearest matching element; ignore strays
                if let Some(pos) = stack.iter().rposition(|el| el.name == name) {
                    if pos > 0 {
                        while stack.len() > pos {
                            close_top(&mut stack);
                        }
                    }
                }
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                let in_raw_text = stack
                    .last()
                    .map(|el| RAW_TEXT_ELEMENTS.contains(&el.name.as_str()))
                    .unwrap_or(false);
                let value = if in_raw_text {
                    raw.into_owned()
                } else {
                    decode_entities(&raw)
                };
                if !value.is_empty() {
                    push_text(&mut stack, value);
                }
            }
            Event::CData(cdata) => {
                let value = String::from_utf8_lossy(&cdata).into_owned();
                push_text(&mut stack, value);
            }
            Event::Comment(comment) => {
                let value = String::from_utf8_lossy(&comment).into_owned();
                push_child(&mut stack, Node::Comment(value));
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

/// Parse markup and return its first top-level element
pub fn parse_element(markup: &str) -> Result<Element> {
    parse_fragment(markup)?
        .into_iter()
        .find_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
        .ok_or(SurfaceError::NoRootElement)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut el = Element::new(name);
    for attr in start.html_attributes().with_checks(false) {
        let attr = attr.map_err(|e| SurfaceError::Attribute {
            element: el.name.clone(),
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value);
        el.attrs.push(Attribute {
            name: key,
            value: decode_entities(&raw),
        });
    }
    Ok(el)
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn push_text(stack: &mut [Element], text: String) {
    if let Some(top) = stack.last_mut() {
        if let Some(Node::Text(prev)) = top.children.last_mut() {
            prev.push_str(&text);
            return;
        }
        top.children.push(Node::Text(text));
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(el) = stack.pop() {
        push_child(stack, Node::Element(el));
    }
}

/// Decode HTML entities, leaving unrecognised `&` sequences as written
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    match unescape_with(raw, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Serialize an element including its own tag
pub fn outer_html(el: &Element) -> String {
    let mut out = String::new();
    write_element(el, &mut out);
    out
}

/// Serialize an element's children
pub fn inner_html(el: &Element) -> String {
    let mut out = String::new();
    let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
    for child in &el.children {
        write_node(child, raw, &mut out);
    }
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        let escaped: Cow<'_, str> = escape(attr.value.as_str());
        out.push_str(&escaped);
        out.push('"');
    }
    out.push('>');
    if is_void(&el.name) {
        return;
    }
    out.push_str(&inner_html(el));
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}
