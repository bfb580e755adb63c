//! PDF assembly with `pdf-writer`
//!
//! The raster is embedded once as a Flate-compressed RGB image XObject and
//! every page draws it at its pagination offset.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::capture::Raster;
use crate::error::{PdfError, Result};
use crate::paginate::{PageSize, Pagination, PT_PER_MM};

const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// A finished image PDF
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDocument {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    /// How the raster was spread across pages
    pub pagination: Pagination,
}

impl RasterDocument {
    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pagination.page_count()
    }
}

/// Write `raster` across pages of `page` size
pub fn assemble(raster: &Raster, page: PageSize) -> Result<RasterDocument> {
    if raster.width == 0 || raster.height == 0 {
        return Err(PdfError::EmptyRaster {
            width: raster.width,
            height: raster.height,
        });
    }

    let pagination = Pagination::for_raster(raster.width, raster.height, page);
    let page_count = pagination.page_count();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raster.to_rgb())?;
    let compressed = encoder.finish()?;

    // Object ids: catalog, page tree, info, image, then (page, content) pairs
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let info_id = Ref::new(3);
    let image_id = Ref::new(4);
    let page_ids: Vec<Ref> = (0..page_count)
        .map(|i| Ref::new(5 + 2 * i as i32))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);
    pdf.document_info(info_id).producer(TextStr("docport"));

    let mut image = pdf.image_xobject(image_id, &compressed);
    image.filter(Filter::FlateDecode);
    image.width(raster.width as i32);
    image.height(raster.height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    let page_width = page.width_pt() as f32;
    let page_height = page.height_pt() as f32;
    let image_width = (pagination.image_width_mm * PT_PER_MM) as f32;
    let image_height = (pagination.image_height_mm * PT_PER_MM) as f32;

    for (page_id, offset_mm) in page_ids.iter().zip(&pagination.offsets_mm) {
        let content_id = Ref::new(page_id.get() + 1);

        // Offsets are measured downward from the page top; PDF space grows up
        // from the bottom-left corner
        let top = page_height - (*offset_mm * PT_PER_MM) as f32;
        let bottom = top - image_height;

        let mut content = Content::new();
        content.save_state();
        content.transform([image_width, 0.0, 0.0, image_height, 0.0, bottom]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        let stream = content.finish();
        pdf.stream(content_id, &stream);

        let mut pdf_page = pdf.page(*page_id);
        pdf_page.media_box(Rect::new(0.0, 0.0, page_width, page_height));
        pdf_page.parent(page_tree_id);
        pdf_page.contents(content_id);
        pdf_page.resources().x_objects().pair(IMAGE_NAME, image_id);
        pdf_page.finish();
    }

    let bytes = pdf.finish();
    tracing::debug!(
        pages = page_count,
        bytes = bytes.len(),
        "assembled raster pdf"
    );

    Ok(RasterDocument { bytes, pagination })
}
