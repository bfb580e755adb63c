//! The host render tree
//!
//! A [`RenderTree`] owns the mounted editor surface, the host page's
//! stylesheet and the registry of clones that are temporarily attached to
//! `<body>` so their computed style can be read. Attachments are scoped by
//! the [`Attachment`] guard; dropping it (on any path) detaches the clone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{Result, SurfaceError};
use crate::markup;
use crate::node::{Element, Node};
use crate::style::{ComputedStyle, StyleSheet};
use crate::text::PlainTextRenderer;

/// Receives elements and text in document order together with their
/// computed style
pub trait StyleVisitor<'a> {
    /// Called before an element's children. Return `false` to skip them.
    fn enter(&mut self, el: &'a Element, style: &ComputedStyle) -> bool;

    /// Called for each text node with its parent's computed style
    fn text(&mut self, _text: &'a str, _parent: &ComputedStyle) {}

    /// Called after an element's children (also when they were skipped)
    fn leave(&mut self, _el: &'a Element, _style: &ComputedStyle) {}
}

/// Walk `root` with the stylesheet cascade, given its ancestors outermost first
pub fn visit_styled<'a, V>(
    stylesheet: &StyleSheet,
    root: &'a Element,
    ancestors: &[&'a Element],
    visitor: &mut V,
) where
    V: StyleVisitor<'a>,
{
    let mut parent = ComputedStyle::default();
    for (i, ancestor) in ancestors.iter().enumerate() {
        let cascaded = stylesheet.cascade(ancestor, &ancestors[..i]);
        parent = ComputedStyle::resolve(ancestor, &cascaded, &parent);
    }
    let mut chain: Vec<&'a Element> = ancestors.to_vec();
    walk(stylesheet, root, &mut chain, &parent, visitor);
}

fn walk<'a, V>(
    stylesheet: &StyleSheet,
    el: &'a Element,
    chain: &mut Vec<&'a Element>,
    parent: &ComputedStyle,
    visitor: &mut V,
) where
    V: StyleVisitor<'a>,
{
    let cascaded = stylesheet.cascade(el, chain);
    let style = ComputedStyle::resolve(el, &cascaded, parent);
    if visitor.enter(el, &style) {
        chain.push(el);
        for child in &el.children {
            match child {
                Node::Element(child_el) => walk(stylesheet, child_el, chain, &style, visitor),
                Node::Text(text) => visitor.text(text, &style),
                Node::Comment(_) => {}
            }
        }
        chain.pop();
    }
    visitor.leave(el, &style);
}

/// Collects computed styles of every element in pre-order (root first)
#[derive(Default)]
struct StyleCollector {
    styles: Vec<ComputedStyle>,
}

impl<'a> StyleVisitor<'a> for StyleCollector {
    fn enter(&mut self, _el: &'a Element, style: &ComputedStyle) -> bool {
        self.styles.push(*style);
        true
    }
}

/// The rendered host page holding the editor surface
#[derive(Debug)]
pub struct RenderTree {
    stylesheet: StyleSheet,
    surface: Option<Element>,
    /// Childless copies of the surface's ancestors, outermost first
    surface_ancestors: Vec<Element>,
    /// Childless `<html>` and `<body>` that attached clones hang from
    html: Element,
    body: Element,
    /// Children `<body>` has independently of attachments
    base_body_children: usize,
    attached: Mutex<Vec<u64>>,
    next_attachment: AtomicU64,
}

impl RenderTree {
    /// Create a tree with the surface mounted directly under `<body>`
    pub fn new(surface: Option<Element>, stylesheet: StyleSheet) -> Self {
        let html = Element::new("html");
        let body = Element::new("body");
        let base_body_children = usize::from(surface.is_some());
        Self {
            stylesheet,
            surface,
            surface_ancestors: vec![html.clone(), body.clone()],
            html,
            body,
            base_body_children,
            attached: Mutex::new(Vec::new()),
            next_attachment: AtomicU64::new(1),
        }
    }

    /// A page with no surface mounted
    pub fn unmounted() -> Self {
        Self::new(None, StyleSheet::new())
    }

    /// Load a rendered page.
    ///
    /// Every `<style>` block in the page contributes to the host stylesheet.
    /// The surface root is the element with `root_id`, else the first element
    /// inside `<body>`, else the first top-level element.
    pub fn from_page(markup: &str, root_id: Option<&str>) -> Result<Self> {
        let nodes = markup::parse_fragment(markup)?;
        let mut page = Element::new("#document");
        page.children = nodes;

        let mut stylesheet = StyleSheet::new();
        for style in page.descendants_named("style") {
            stylesheet.append(&style.text_content());
        }

        let html = page
            .find_named("html")
            .map(shallow)
            .unwrap_or_else(|| Element::new("html"));
        let body_el = page.find_named("body");
        let body = body_el.map(shallow).unwrap_or_else(|| Element::new("body"));
        let base_body_children = body_el.map(|b| b.child_elements().count()).unwrap_or(1);

        let (surface, ancestors) = match root_id {
            Some(id) => {
                let mut path = Vec::new();
                if !path_to_id(&page, id, &mut path) {
                    return Err(SurfaceError::RootNotFound(id.to_string()));
                }
                let Some(found) = path.pop() else {
                    return Err(SurfaceError::RootNotFound(id.to_string()));
                };
                // Drop the synthetic document node
                let ancestors: Vec<Element> = path.into_iter().skip(1).map(shallow).collect();
                (found.clone(), ancestors)
            }
            None => match body_el.and_then(|b| b.child_elements().next()) {
                Some(first) => (first.clone(), vec![html.clone(), body.clone()]),
                None => {
                    let first = page
                        .child_elements()
                        .find(|el| !el.is("html"))
                        .or_else(|| page.child_elements().next())
                        .ok_or(SurfaceError::NoRootElement)?;
                    (first.clone(), vec![html.clone(), body.clone()])
                }
            },
        };

        tracing::debug!(
            rules = stylesheet.len(),
            root = %surface.name,
            "loaded render tree"
        );

        Ok(Self {
            stylesheet,
            surface: Some(surface),
            surface_ancestors: ancestors,
            html,
            body,
            base_body_children,
            attached: Mutex::new(Vec::new()),
            next_attachment: AtomicU64::new(1),
        })
    }

    /// Append extra CSS to the host stylesheet
    pub fn with_stylesheet(mut self, css: &str) -> Self {
        self.stylesheet.append(css);
        self
    }

    /// The mounted surface root, if any
    pub fn surface(&self) -> Option<&Element> {
        self.surface.as_ref()
    }

    /// The host stylesheet
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }

    /// Walk the mounted surface with computed styles
    pub fn visit_surface<'a, V>(&'a self, visitor: &mut V)
    where
        V: StyleVisitor<'a>,
    {
        if let Some(surface) = &self.surface {
            let ancestors: Vec<&Element> = self.surface_ancestors.iter().collect();
            visit_styled(&self.stylesheet, surface, &ancestors, visitor);
        }
    }

    /// Plain-text rendering of the surface (empty when nothing is mounted)
    pub fn inner_text(&self) -> String {
        let mut renderer = PlainTextRenderer::new();
        self.visit_surface(&mut renderer);
        renderer.finish()
    }

    /// Attach a detached clone under `<body>` until the guard goes away
    pub fn attach(&self, clone: Element) -> Attachment<'_> {
        let id = self.next_attachment.fetch_add(1, Ordering::Relaxed);
        self.attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(id);
        tracing::trace!(attachment = id, "attached clone");
        Attachment {
            tree: self,
            id,
            root: clone,
        }
    }

    /// Number of element children `<body>` currently has
    pub fn body_child_count(&self) -> usize {
        self.base_body_children + self.attached_count()
    }

    /// Number of clones currently attached
    pub fn attached_count(&self) -> usize {
        self.attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn detach_id(&self, id: u64) {
        let mut attached = self
            .attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        attached.retain(|a| *a != id);
        tracing::trace!(attachment = id, "detached clone");
    }
}

/// A clone attached offscreen to the render tree.
///
/// The clone is detached when the guard is dropped or [`Attachment::detach`]
/// is called.
#[derive(Debug)]
pub struct Attachment<'t> {
    tree: &'t RenderTree,
    id: u64,
    root: Element,
}

impl<'t> Attachment<'t> {
    /// The attached clone
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable access to the attached clone
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Computed style of every element of the clone in pre-order, root first
    pub fn computed_styles(&self) -> Vec<ComputedStyle> {
        let mut collector = StyleCollector::default();
        self.visit(&mut collector);
        collector.styles
    }

    /// Walk the clone with computed styles, as a child of `<body>`
    pub fn visit<'a, V>(&'a self, visitor: &mut V)
    where
        V: StyleVisitor<'a>,
    {
        let ancestors = [&self.tree.html, &self.tree.body];
        visit_styled(&self.tree.stylesheet, &self.root, &ancestors, visitor);
    }

    /// Detach and hand back the clone
    pub fn detach(mut self) -> Element {
        std::mem::take(&mut self.root)
    }
}

impl Drop for Attachment<'_> {
    fn drop(&mut self) {
        self.tree.detach_id(self.id);
    }
}

/// Copy an element without its children
fn shallow(el: &Element) -> Element {
    Element {
        name: el.name.clone(),
        attrs: el.attrs.clone(),
        children: Vec::new(),
    }
}

/// Record the element path from `el` down to the element with `id`
fn path_to_id<'a>(el: &'a Element, id: &str, path: &mut Vec<&'a Element>) -> bool {
    path.push(el);
    if el.id() == Some(id) {
        return true;
    }
    for child in el.child_elements() {
        if path_to_id(child, id, path) {
            return true;
        }
    }
    path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextAlign;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><style>
  .bn-block-content[data-text-alignment="center"] { text-align: center }
  body { text-align: left }
</style></head>
<body><div id="app"><div id="editor" class="bn-container"><p>Hi</p></div></div></body></html>"#;

    #[test]
    fn test_from_page_collects_styles_and_root() {
        let tree = RenderTree::from_page(PAGE, Some("editor")).unwrap();
        assert_eq!(tree.stylesheet().len(), 2);
        assert_eq!(tree.surface().unwrap().id(), Some("editor"));
        assert_eq!(tree.body_child_count(), 1);

        let default_root = RenderTree::from_page(PAGE, None).unwrap();
        assert_eq!(default_root.surface().unwrap().id(), Some("app"));
    }

    #[test]
    fn test_missing_root_id() {
        let err = RenderTree::from_page(PAGE, Some("nope")).unwrap_err();
        assert!(matches!(err, SurfaceError::RootNotFound(_)));
    }

    #[test]
    fn test_attachment_guard_restores_count() {
        let tree = RenderTree::from_page(PAGE, Some("editor")).unwrap();
        let baseline = tree.body_child_count();
        {
            let guard = tree.attach(tree.surface().unwrap().clone());
            assert_eq!(tree.body_child_count(), baseline + 1);
            let _second = tree.attach(Element::new("div"));
            assert_eq!(tree.attached_count(), 2);
            drop(guard);
            assert_eq!(tree.attached_count(), 1);
        }
        assert_eq!(tree.body_child_count(), baseline);

        let guard = tree.attach(Element::new("div").with_text("x"));
        let clone = guard.detach();
        assert_eq!(clone.text_content(), "x");
        assert_eq!(tree.body_child_count(), baseline);
    }

    #[test]
    fn test_attached_clone_computes_styles() {
        let tree = RenderTree::new(
            None,
            StyleSheet::parse(r#"[data-text-alignment="right"] { text-align: right }"#),
        );
        let clone = Element::new("div").with_child(
            Element::new("div")
                .with_attr("data-text-alignment", "right")
                .with_child(Element::new("p").with_text("x")),
        );
        let guard = tree.attach(clone);
        let styles = guard.computed_styles();
        assert_eq!(styles.len(), 3);
        assert_eq!(styles[0].text_align, TextAlign::Start);
        assert_eq!(styles[1].text_align, TextAlign::Right);
        assert_eq!(styles[2].text_align, TextAlign::Right);
    }

    #[test]
    fn test_unmounted_tree_has_no_text() {
        let tree = RenderTree::unmounted();
        assert!(tree.surface().is_none());
        assert_eq!(tree.inner_text(), "");
        assert_eq!(tree.body_child_count(), 0);
    }
}
