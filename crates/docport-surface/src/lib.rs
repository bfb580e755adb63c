//! # docport-surface
//!
//! The render tree that docport exports from.
//!
//! This crate provides:
//! - An element tree with attribute and inline-style helpers
//! - A lenient HTML reader and serializer for rendered editor markup
//! - A small CSS cascade that resolves `text-align`, `display` and `width`
//! - [`RenderTree`], the host page with the mounted editor surface, and
//!   scoped offscreen attachment of clones
//!
//! ## Example
//!
//! ```
//! use docport_surface::RenderTree;
//!
//! let page = r#"<html><head><style>.c { text-align: center }</style></head>
//! <body><div id="editor"><p class="c">Hello</p></div></body></html>"#;
//!
//! let tree = RenderTree::from_page(page, Some("editor"))?;
//! assert_eq!(tree.inner_text(), "Hello");
//! # Ok::<(), docport_surface::SurfaceError>(())
//! ```

pub mod error;
pub mod markup;
pub mod node;
pub mod style;
pub mod text;
pub mod tree;

pub use error::{Result, SurfaceError};
pub use markup::{inner_html, outer_html, parse_element, parse_fragment};
pub use node::{Attribute, Element, Node};
pub use style::{parse_px, ComputedStyle, Declarations, Display, Selector, StyleSheet, TextAlign};
pub use text::PlainTextRenderer;
pub use tree::{visit_styled, Attachment, RenderTree, StyleVisitor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
