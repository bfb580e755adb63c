//! Raster exporter: capture, paginate, assemble

use docport_surface::RenderTree;

use crate::capture::{CaptureOptions, Rasterizer};
use crate::document::{assemble, RasterDocument};
use crate::error::Result;
use crate::paginate::PageSize;

/// Produces paginated image PDFs of the mounted surface
#[derive(Debug, Clone)]
pub struct RasterExporter<R> {
    rasterizer: R,
    options: CaptureOptions,
    page: PageSize,
}

impl<R: Rasterizer> RasterExporter<R> {
    /// Create an exporter with the default capture options on A4 pages
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            options: CaptureOptions::default(),
            page: PageSize::A4,
        }
    }

    /// Override the capture options
    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the page size
    pub fn with_page_size(mut self, page: PageSize) -> Self {
        self.page = page;
        self
    }

    /// The capture engine
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Capture options in use
    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Capture the surface and write it across pages.
    ///
    /// Returns `Ok(None)` without capturing when no surface is mounted.
    pub async fn export(&self, tree: &RenderTree) -> Result<Option<RasterDocument>> {
        if tree.surface().is_none() {
            tracing::debug!("no surface mounted, skipping raster export");
            return Ok(None);
        }
        let raster = self.rasterizer.capture(tree, &self.options).await?;
        tracing::debug!(
            width = raster.width,
            height = raster.height,
            "captured surface"
        );
        assemble(&raster, self.page).map(Some)
    }
}
