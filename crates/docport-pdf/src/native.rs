//! Native surface rasterizer
//!
//! Lays the surface out as SVG (see [`crate::layout`]) and renders it with
//! `resvg` onto a `tiny-skia` pixmap. Images are fetched through the
//! configured [`ResourceFetcher`] and embedded as `data:` URIs.

use std::io::Cursor;
use std::sync::Arc;

use docport_snapshot::{to_data_uri, ResourceFetcher};
use docport_surface::RenderTree;

use crate::capture::{parse_color, CaptureOptions, Raster, Rasterizer};
use crate::error::{PdfError, Result};
use crate::layout::{collect_blocks, render_svg, Block, LayoutConfig, ResolvedImage};

/// Rasterizer built on `resvg`
///
/// # Example
///
/// ```no_run
/// use docport_pdf::{CaptureOptions, NativeRasterizer, Rasterizer};
/// use docport_snapshot::HttpFetcher;
/// use docport_surface::RenderTree;
///
/// # async fn run(tree: RenderTree) -> docport_pdf::Result<()> {
/// let rasterizer = NativeRasterizer::new(HttpFetcher::new());
/// let raster = rasterizer.capture(&tree, &CaptureOptions::default()).await?;
/// println!("{}x{}", raster.width, raster.height);
/// # Ok(())
/// # }
/// ```
pub struct NativeRasterizer<F> {
    fetcher: F,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl<F: ResourceFetcher> NativeRasterizer<F> {
    /// Create a rasterizer with system fonts loaded
    pub fn new(fetcher: F) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();

        if fontdb.is_empty() {
            tracing::warn!("No system fonts found, text rendering may be limited");
        }

        Self::with_fontdb(fetcher, Arc::new(fontdb))
    }

    /// Create a rasterizer sharing an existing font database
    pub fn with_fontdb(fetcher: F, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fetcher, fontdb }
    }

    /// Lay out the mounted surface and return the SVG that would be rendered
    pub async fn layout_svg(&self, tree: &RenderTree, options: &CaptureOptions) -> String {
        let blocks = collect_blocks(tree);
        let mut images = Vec::new();
        for block in &blocks {
            if let Block::Image { src, .. } = block {
                images.push(self.resolve_image(src, options).await);
            }
        }
        let config = LayoutConfig {
            viewport_width: options.viewport_width,
            padding: options.padding,
        };
        render_svg(&blocks, &images, config)
    }

    async fn resolve_image(&self, src: &str, options: &CaptureOptions) -> Option<ResolvedImage> {
        if src.is_empty() {
            return None;
        }
        if !options.allow_cross_origin && is_remote(src) {
            tracing::debug!(src, "skipping cross-origin image");
            return None;
        }
        let resource = match self.fetcher.fetch(src).await {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(src, error = %e, "image not drawn");
                return None;
            }
        };
        let dimensions = image::ImageReader::new(Cursor::new(&resource.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());
        let Some((width, height)) = dimensions else {
            tracing::warn!(src, "image format not recognised, not drawn");
            return None;
        };
        Some(ResolvedImage {
            data_uri: to_data_uri(&resource),
            width,
            height,
        })
    }
}

impl<F: ResourceFetcher> Rasterizer for NativeRasterizer<F> {
    async fn capture(&self, tree: &RenderTree, options: &CaptureOptions) -> Result<Raster> {
        options.validate()?;
        let background = parse_color(&options.background)
            .ok_or_else(|| PdfError::InvalidOptions(options.background.clone()))?;

        let svg = self.layout_svg(tree, options).await;
        let fontdb = Arc::clone(&self.fontdb);
        let scale = options.scale;

        tokio::task::spawn_blocking(move || svg_to_raster(&svg, fontdb, scale, background))
            .await
            .map_err(|e| PdfError::Capture(e.to_string()))?
    }
}

/// Render an SVG document to a straight-alpha RGBA raster
pub fn svg_to_raster(
    svg: &str,
    fontdb: Arc<usvg::fontdb::Database>,
    scale: f32,
    background: tiny_skia::Color,
) -> Result<Raster> {
    let tree = {
        let mut opts = usvg::Options::default();
        opts.fontdb = fontdb;
        usvg::Tree::from_str(svg, &opts).map_err(|e| PdfError::Svg(e.to_string()))?
    };

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(PdfError::Pixmap { width, height })?;
    pixmap.fill(background);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut pixels = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let color = px.demultiply();
        pixels.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    tracing::debug!(width, height, "rendered surface raster");
    Raster::new(width, height, pixels)
}

fn is_remote(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_fontdb() -> Arc<usvg::fontdb::Database> {
        Arc::new(usvg::fontdb::Database::new())
    }

    #[test]
    fn test_svg_to_raster_scales_and_fills() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5" viewBox="0 0 10 5"><rect x="5" y="0" width="5" height="5" fill="#000000"/></svg>"##;
        let raster = svg_to_raster(svg, empty_fontdb(), 2.0, tiny_skia::Color::WHITE).unwrap();
        assert_eq!((raster.width, raster.height), (20, 10));
        assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(15, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_invalid_svg_is_an_error() {
        assert!(matches!(
            svg_to_raster("<not svg", empty_fontdb(), 1.0, tiny_skia::Color::WHITE),
            Err(PdfError::Svg(_))
        ));
    }

    #[test]
    fn test_remote_sources() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("//cdn.example.com/a.png"));
        assert!(!is_remote("images/a.png"));
        assert!(!is_remote("data:image/png;base64,AAAA"));
    }
}
