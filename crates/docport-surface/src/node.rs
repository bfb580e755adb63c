//! Render tree nodes
//!
//! The surface is a plain owned tree: elements with ordered attributes and
//! children, text and comments. Cloning an [`Element`] is a deep clone.

use crate::style::Declarations;

/// A single node in the render tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element with attributes and children
    Element(Element),
    /// A text node (already entity-decoded)
    Text(String),
    /// A comment
    Comment(String),
}

impl Node {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Borrow the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutably borrow the element if this node is one
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An attribute name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercase attribute name
    pub name: String,
    /// Decoded attribute value
    pub value: String,
}

/// An element node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Whether the tag name matches (case-insensitive)
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Check whether an attribute is present
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set or replace an attribute, keeping its original position
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// Element id
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Whitespace-separated class list
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Check for a class name
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Parsed inline `style` declarations
    pub fn style(&self) -> Declarations {
        Declarations::parse(self.attr("style").unwrap_or(""))
    }

    /// Set one inline style property, rewriting the `style` attribute
    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let mut style = self.style();
        style.set(property, value);
        self.set_attr("style", style.to_string());
    }

    /// Child elements (skipping text and comments)
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated descendant text, without any layout
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Remove every descendant element matching `pred`, at any depth.
    ///
    /// Returns the number of removed subtrees.
    pub fn remove_descendants<F>(&mut self, pred: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|child| match child {
            Node::Element(el) => !pred(el),
            _ => true,
        });
        let mut removed = before - self.children.len();
        for child in &mut self.children {
            if let Node::Element(el) = child {
                removed += el.remove_descendants(pred);
            }
        }
        removed
    }

    /// Visit every descendant element in document order
    pub fn for_each_descendant<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Element),
    {
        for child in &self.children {
            if let Node::Element(el) = child {
                f(el);
                el.for_each_descendant(f);
            }
        }
    }

    /// Visit every descendant element mutably in document order
    pub fn for_each_descendant_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in &mut self.children {
            if let Node::Element(el) = child {
                f(el);
                el.for_each_descendant_mut(f);
            }
        }
    }

    /// Collect descendant elements with the given tag name
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.for_each_descendant(&mut |el| {
            if el.is(name) {
                out.push(el);
            }
        });
        out
    }

    /// Mutable references to descendants with the given tag name.
    ///
    /// Matches are not searched for nested matches, so the references never
    /// overlap.
    pub fn descendants_named_mut<'a>(&'a mut self, name: &str) -> Vec<&'a mut Element> {
        let mut out = Vec::new();
        collect_named_mut(self, name, &mut out);
        out
    }

    /// Find the first element (self included) with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|el| el.find_by_id(id))
    }

    /// Find the first descendant element with the given tag name
    pub fn find_named(&self, name: &str) -> Option<&Element> {
        self.child_elements()
            .find_map(|el| if el.is(name) { Some(el) } else { el.find_named(name) })
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            Node::Comment(_) => {}
        }
    }
}

fn collect_named_mut<'a>(el: &'a mut Element, name: &str, out: &mut Vec<&'a mut Element>) {
    for child in el.children.iter_mut() {
        if let Node::Element(e) = child {
            if e.is(name) {
                out.push(e);
            } else {
                collect_named_mut(e, name, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div")
            .with_attr("id", "root")
            .with_child(Element::new("p").with_text("Hello"))
            .with_child(
                Element::new("div")
                    .with_attr("role", "toolbar")
                    .with_child(Element::new("button").with_text("B")),
            )
            .with_child(Element::new("img").with_attr("src", "a.png"))
    }

    #[test]
    fn test_attribute_roundtrip() {
        let mut el = Element::new("IMG");
        assert_eq!(el.name, "img");
        el.set_attr("SRC", "a.png");
        el.set_attr("alt", "x");
        el.set_attr("src", "b.png");
        assert_eq!(el.attr("src"), Some("b.png"));
        assert_eq!(el.attrs[0].name, "src");
        assert_eq!(el.remove_attr("alt"), Some("x".to_string()));
        assert!(!el.has_attr("alt"));
    }

    #[test]
    fn test_remove_descendants_counts_subtrees() {
        let mut root = sample();
        let removed = root.remove_descendants(&|el| el.attr("role") == Some("toolbar"));
        assert_eq!(removed, 1);
        assert!(root.descendants_named("button").is_empty());
        assert_eq!(root.text_content(), "Hello");
    }

    #[test]
    fn test_style_property_merge() {
        let mut el = Element::new("p").with_attr("style", "color: red");
        el.set_style_property("text-align", "center");
        assert_eq!(el.attr("style"), Some("color: red; text-align: center"));
        el.set_style_property("color", "blue");
        assert_eq!(el.style().get("color"), Some("blue"));
    }

    #[test]
    fn test_descendants_named_mut() {
        let mut root = sample();
        for img in root.descendants_named_mut("img") {
            img.set_attr("src", "data:,");
        }
        assert_eq!(root.descendants_named("img")[0].attr("src"), Some("data:,"));
        assert!(root.find_by_id("root").is_some());
    }
}
