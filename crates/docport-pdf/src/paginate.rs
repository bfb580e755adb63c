//! Pagination of one tall image across fixed-size pages
//!
//! The captured raster is scaled to the page width and placed on every
//! page, shifted up by one page height per page, so each page shows the
//! next band of the image. Offsets are measured from the top of the page,
//! negative values moving the image up.

/// Points per millimetre
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Physical page dimensions in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in millimetres
    pub width_mm: f64,
    /// Page height in millimetres
    pub height_mm: f64,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    /// Width in PDF points
    pub fn width_pt(&self) -> f64 {
        self.width_mm * PT_PER_MM
    }

    /// Height in PDF points
    pub fn height_pt(&self) -> f64 {
        self.height_mm * PT_PER_MM
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Placement of one raster across pages
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Page the image is placed on
    pub page: PageSize,
    /// Placed image width in millimetres (the page width)
    pub image_width_mm: f64,
    /// Placed image height in millimetres
    pub image_height_mm: f64,
    /// Vertical offset of the image on each page, in millimetres
    pub offsets_mm: Vec<f64>,
}

impl Pagination {
    /// Lay out a raster of the given pixel size across pages
    pub fn for_raster(raster_width: u32, raster_height: u32, page: PageSize) -> Self {
        let image_width_mm = page.width_mm;
        let image_height_mm = if raster_width == 0 {
            0.0
        } else {
            f64::from(raster_height) * image_width_mm / f64::from(raster_width)
        };
        Self {
            page,
            image_width_mm,
            image_height_mm,
            offsets_mm: paginate(image_height_mm, page.height_mm),
        }
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Offsets at which an image of `image_height` is placed on successive
/// pages of `page_height`.
///
/// The first page always shows the image at offset 0. Further pages are
/// added, each one page height further up, until the pages emitted so far
/// reach the bottom of the image.
pub fn paginate(image_height: f64, page_height: f64) -> Vec<f64> {
    let mut offsets = vec![0.0];
    if page_height.is_nan() || page_height <= 0.0 || !image_height.is_finite() {
        return offsets;
    }
    let mut remaining = image_height - page_height;
    while remaining > 0.0 {
        offsets.push(-(offsets.len() as f64) * page_height);
        remaining = image_height - offsets.len() as f64 * page_height;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_a4_in_points() {
        let a4 = PageSize::A4;
        assert!((a4.width_pt() - 595.2756).abs() < 1e-3);
        assert!((a4.height_pt() - 841.8898).abs() < 1e-3);
    }

    #[test]
    fn test_single_page_when_image_fits() {
        assert_eq!(paginate(100.0, 297.0), vec![0.0]);
        assert_eq!(paginate(297.0, 297.0), vec![0.0]);
        assert_eq!(paginate(0.0, 297.0), vec![0.0]);
    }

    #[test]
    fn test_offsets_step_by_page_height() {
        assert_eq!(paginate(700.0, 297.0), vec![0.0, -297.0, -594.0]);
        assert_eq!(paginate(594.0, 297.0), vec![0.0, -297.0]);
        assert_eq!(paginate(594.5, 297.0).len(), 3);
    }

    #[test]
    fn test_pagination_for_raster() {
        // 1600 px wide, 8000 px tall -> 1050 mm tall at A4 width
        let pagination = Pagination::for_raster(1600, 8000, PageSize::A4);
        assert!((pagination.image_height_mm - 1050.0).abs() < 1e-9);
        assert_eq!(pagination.page_count(), 4);
        assert_eq!(pagination.offsets_mm[3], -891.0);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_image_exactly_once(
            image_height in 0.0f64..20_000.0,
            page_height in 1.0f64..1_000.0,
        ) {
            let offsets = paginate(image_height, page_height);
            let pages = offsets.len();

            // Every page but the last is fully covered by image
            prop_assert!((pages as f64 - 1.0) * page_height < image_height || pages == 1);
            // The pages together reach the bottom of the image
            prop_assert!(pages as f64 * page_height >= image_height);
            for (k, offset) in offsets.iter().enumerate() {
                prop_assert_eq!(*offset, -(k as f64) * page_height);
            }
        }

        #[test]
        fn prop_page_count_is_ceiling(bands in 1u32..200, fraction in 0.01f64..0.99) {
            let page_height = 297.0;
            let image_height = (f64::from(bands) - 1.0 + fraction) * page_height;
            prop_assert_eq!(paginate(image_height, page_height).len(), bands as usize);
        }
    }
}
