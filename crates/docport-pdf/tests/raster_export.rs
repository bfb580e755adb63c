//! Raster export end to end

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docport_pdf::{
    CaptureOptions, NativeRasterizer, PageSize, PdfError, Raster, RasterExporter, Rasterizer,
};
use docport_snapshot::MapFetcher;
use docport_surface::RenderTree;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

const EDITOR: &str = r#"<html><body><div class="bn-editor">
  <div class="bn-block-content" data-content-type="heading"><h1>Report</h1></div>
  <div class="bn-block-content" data-content-type="paragraph"><p>Some text</p></div>
  <div class="bn-block-content" data-content-type="codeBlock"><pre><code>let x = 1;</code></pre></div>
  <div class="bn-block-content" data-content-type="image"><img src="red.png" width="100"></div>
</div></body></html>"#;

/// Returns a fixed-size raster and counts captures
struct FixedRasterizer {
    width: u32,
    height: u32,
    calls: AtomicUsize,
}

impl FixedRasterizer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Rasterizer for FixedRasterizer {
    async fn capture(
        &self,
        _tree: &RenderTree,
        _options: &CaptureOptions,
    ) -> Result<Raster, PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pixels = vec![255; (self.width * self.height * 4) as usize];
        Raster::new(self.width, self.height, pixels)
    }
}

fn red_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 25, Rgb([255, 0, 0])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn native() -> NativeRasterizer<MapFetcher> {
    let fetcher = MapFetcher::new().with("red.png", red_png(), Some("image/png"));
    NativeRasterizer::with_fontdb(fetcher, Arc::new(usvg::fontdb::Database::new()))
}

#[tokio::test]
async fn test_page_count_follows_raster_height() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    // 1000 px wide at A4 width: 297 mm per page is ~1414 px
    let exporter = RasterExporter::new(FixedRasterizer::new(1000, 5000));
    let document = exporter.export(&tree).await.unwrap().unwrap();

    assert_eq!(document.page_count(), 4);
    let offsets = &document.pagination.offsets_mm;
    for pair in offsets.windows(2) {
        assert_eq!(pair[0] - pair[1], PageSize::A4.height_mm);
    }
}

#[tokio::test]
async fn test_unmounted_surface_is_not_captured() {
    let rasterizer = FixedRasterizer::new(10, 10);
    let exporter = RasterExporter::new(rasterizer);
    let outcome = exporter.export(&RenderTree::unmounted()).await.unwrap();
    assert!(outcome.is_none());
    assert_eq!(exporter.rasterizer().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_capture_errors_propagate() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    let exporter = RasterExporter::new(FixedRasterizer::new(0, 0));
    assert!(matches!(
        exporter.export(&tree).await,
        Err(PdfError::EmptyRaster { .. })
    ));
}

#[tokio::test]
async fn test_native_capture_is_scaled_and_drawn() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    let options = CaptureOptions::default();
    let raster = native().capture(&tree, &options).await.unwrap();

    assert_eq!(raster.width, 1600);
    assert!(raster.height > 200);
    assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));

    let mut dark = 0;
    let mut red = 0;
    for px in raster.pixels.chunks_exact(4) {
        match px {
            [31, 31, 31, 255] => dark += 1,
            [255, 0, 0, 255] => red += 1,
            _ => {}
        }
    }
    assert!(dark > 0, "code panel should be painted");
    assert!(red > 0, "image should be painted");
}

#[tokio::test]
async fn test_native_capture_is_pixel_identical() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    let rasterizer = native();
    let options = CaptureOptions::default();
    let first = rasterizer.capture(&tree, &options).await.unwrap();
    let second = rasterizer.capture(&tree, &options).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_native_export_writes_pdf() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    let exporter = RasterExporter::new(native());
    let document = exporter.export(&tree).await.unwrap().unwrap();
    assert!(document.bytes.starts_with(b"%PDF-"));
    assert_eq!(document.page_count(), 1);
}

#[tokio::test]
async fn test_missing_images_do_not_fail_capture() {
    let tree = RenderTree::from_page(EDITOR, None).unwrap();
    let rasterizer =
        NativeRasterizer::with_fontdb(MapFetcher::new(), Arc::new(usvg::fontdb::Database::new()));
    let raster = rasterizer
        .capture(&tree, &CaptureOptions::default().with_scale(1.0))
        .await
        .unwrap();
    assert_eq!(raster.width, 800);
}
