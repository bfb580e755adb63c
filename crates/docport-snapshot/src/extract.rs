//! Sanitized snapshot extraction
//!
//! A snapshot is a detached copy of the live surface with editor chrome and
//! host styling removed, explicit alignment written inline and fetchable
//! images inlined as `data:` URIs. The live surface is never touched.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docport_surface::{inner_html, Attachment, Element, RenderTree};

use crate::fetch::{FetchedResource, ResourceFetcher};

/// Attribute carrying the host UI's colour scheme
pub const COLOR_SCHEME_ATTR: &str = "data-mantine-color-scheme";

/// Inline style that keeps an attached clone out of view
const OFFSCREEN_STYLE: [(&str, &str); 2] = [("position", "fixed"), ("left", "-10000px")];

const FALLBACK_MIME: &str = "application/octet-stream";

/// The markup of a sanitized, self-contained copy of the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSnapshot {
    /// Inner markup of the cleaned clone
    pub markup: String,
    /// Images whose source was replaced by a `data:` URI
    pub inlined_images: usize,
    /// Images that kept their original source because fetching failed
    pub retained_images: usize,
}

/// Produces [`SanitizedSnapshot`]s of a render tree's surface
#[derive(Debug, Clone)]
pub struct SnapshotExtractor<F> {
    fetcher: F,
}

impl<F: ResourceFetcher> SnapshotExtractor<F> {
    /// Create an extractor that fetches images through `fetcher`
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// The fetcher used for image sources
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Extract a snapshot of the mounted surface.
    ///
    /// Returns `None` when no surface is mounted. Image fetch failures are
    /// logged and leave the image source as written.
    pub async fn extract(&self, tree: &RenderTree) -> Option<SanitizedSnapshot> {
        let surface = tree.surface()?;

        let mut clone = surface.clone();
        let removed = sanitize(&mut clone);
        for (property, value) in OFFSCREEN_STYLE {
            clone.set_style_property(property, value);
        }

        let mut attachment = tree.attach(clone);
        let rendered_widths = materialize_alignment(&mut attachment);
        let (inlined_images, retained_images) = self
            .inline_images(attachment.root_mut(), &rendered_widths)
            .await;
        let root = attachment.detach();

        tracing::debug!(
            removed,
            inlined_images,
            retained_images,
            "extracted snapshot"
        );

        Some(SanitizedSnapshot {
            markup: inner_html(&root),
            inlined_images,
            retained_images,
        })
    }

    async fn inline_images(
        &self,
        root: &mut Element,
        rendered_widths: &[Option<f32>],
    ) -> (usize, usize) {
        let mut inlined = 0;
        let mut retained = 0;

        let images = root.descendants_named_mut("img");
        for (index, img) in images.into_iter().enumerate() {
            let Some(src) = img.attr("src").filter(|s| !s.is_empty()).map(str::to_string) else {
                continue;
            };

            let resource = match self.fetcher.fetch(&src).await {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::warn!(src = %short(&src), error = %e, "keeping original image source");
                    retained += 1;
                    continue;
                }
            };

            img.set_attr("src", to_data_uri(&resource));
            let width = rendered_widths
                .get(index)
                .copied()
                .flatten()
                .map(|w| w.round() as u32)
                .filter(|w| *w > 0)
                .or_else(|| natural_width(&resource.bytes));
            if let Some(width) = width.filter(|w| *w > 0) {
                img.set_attr("width", width.to_string());
                img.set_style_property("max-width", "100%");
            }
            inlined += 1;
        }

        (inlined, retained)
    }
}

/// Strip editor chrome and host styling from a detached clone.
///
/// Removes `button` elements, `[role="toolbar"]` nodes, `<style>` blocks
/// and `<link rel="stylesheet">` references below `root`, and drops colour
/// scheme markers. Returns the number of removed subtrees.
pub fn sanitize(root: &mut Element) -> usize {
    let removed = root.remove_descendants(&|el: &Element| {
        el.is("button")
            || el.attr("role") == Some("toolbar")
            || el.is("style")
            || (el.is("link") && el.attr("rel") == Some("stylesheet"))
    });
    root.remove_attr(COLOR_SCHEME_ATTR);
    root.for_each_descendant_mut(&mut |el: &mut Element| {
        el.remove_attr(COLOR_SCHEME_ATTR);
    });
    removed
}

/// Write non-default computed alignment inline on every descendant and
/// return the rendered width of each `img` in document order
fn materialize_alignment(attachment: &mut Attachment<'_>) -> Vec<Option<f32>> {
    let styles = attachment.computed_styles();
    let mut widths = Vec::new();
    // Index 0 is the clone root itself
    let mut index = 0;
    attachment
        .root_mut()
        .for_each_descendant_mut(&mut |el: &mut Element| {
            index += 1;
            let Some(style) = styles.get(index) else {
                return;
            };
            if style.text_align.is_explicit() {
                el.set_style_property("text-align", style.text_align.as_str());
            }
            if el.is("img") {
                widths.push(style.width_px);
            }
        });
    widths
}

/// Encode a fetched resource as a `data:` URI
pub fn to_data_uri(resource: &FetchedResource) -> String {
    format!(
        "data:{};base64,{}",
        mime_type(resource),
        STANDARD.encode(&resource.bytes)
    )
}

fn mime_type(resource: &FetchedResource) -> String {
    let declared = resource
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());
    if let Some(declared) = declared {
        return declared;
    }
    image::guess_format(&resource.bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME.to_string())
}

/// Intrinsic pixel width of encoded image bytes
fn natural_width(bytes: &[u8]) -> Option<u32> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
        .map(|(width, _)| width)
}

fn short(src: &str) -> String {
    if src.len() <= 96 {
        return src.to_string();
    }
    let cut = (0..=96).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
    format!("{}...", &src[..cut])
}
