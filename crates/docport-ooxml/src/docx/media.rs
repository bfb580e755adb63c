//! Embedded images
//!
//! Only `data:` sources can be embedded; anything else was left unresolved by
//! the snapshot and is dropped from the document. Media parts are named by a
//! content hash so identical images share one part.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// EMUs per pixel at 96 DPI
pub const EMU_PER_PIXEL: u64 = 9525;

/// A decoded image ready to be stored in `word/media/`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// File extension used for the part name and content type
    pub extension: &'static str,
    /// MIME type
    pub content_type: &'static str,
    /// Natural width in px
    pub width: u32,
    /// Natural height in px
    pub height: u32,
}

impl MediaImage {
    /// Decode a base64 `data:` URI holding a known raster format
    pub fn from_data_uri(src: &str) -> Option<Self> {
        let rest = src.trim().strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mut params = header.split(';');
        let declared = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return None;
        }
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD.decode(compact.as_bytes()).ok()?;

        let format = image::guess_format(&bytes).ok();
        let (extension, content_type) = match (format, declared.as_str()) {
            (Some(image::ImageFormat::Png), _) | (None, "image/png") => ("png", "image/png"),
            (Some(image::ImageFormat::Jpeg), _) | (None, "image/jpeg") => ("jpeg", "image/jpeg"),
            (Some(image::ImageFormat::Gif), _) | (None, "image/gif") => ("gif", "image/gif"),
            (Some(image::ImageFormat::WebP), _) | (None, "image/webp") => ("webp", "image/webp"),
            _ => return None,
        };

        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok())?;

        Some(Self {
            bytes,
            extension,
            content_type,
            width,
            height,
        })
    }

    /// Content-addressed file name, e.g. `image-3f2a9c01d4e5b6a7.png`
    pub fn file_name(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        format!("image-{}.{}", hex, self.extension)
    }
}

/// Display size in px for an image.
///
/// Explicit `width`/`height` are honored when `honor_size` is set; a missing
/// side follows the natural aspect ratio. The result never exceeds
/// `max_width` and keeps the aspect ratio when shrunk.
pub fn display_size(
    natural: (u32, u32),
    width: Option<f32>,
    height: Option<f32>,
    max_width: f32,
    honor_size: bool,
) -> (f32, f32) {
    let (nw, nh) = (natural.0.max(1) as f32, natural.1.max(1) as f32);
    let (width, height) = if honor_size { (width, height) } else { (None, None) };

    let (mut w, mut h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * nh / nw),
        (None, Some(h)) => (h * nw / nh, h),
        (None, None) => (nw, nh),
    };

    if max_width > 0.0 && w > max_width {
        h *= max_width / w;
        w = max_width;
    }
    (w, h)
}

/// Convert px to EMUs
pub fn px_to_emu(px: f32) -> u64 {
    (px.max(0.0) as f64 * EMU_PER_PIXEL as f64).round() as u64
}
