//! Capture contract
//!
//! A [`Rasterizer`] turns the mounted surface into one continuous raster.
//! The raster exporter only depends on this trait.

use std::future::Future;

use docport_surface::RenderTree;

use crate::error::{PdfError, Result};

/// Settings for a surface capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Device pixels per CSS pixel
    pub scale: f32,
    /// Background colour painted under the surface (CSS colour)
    pub background: String,
    /// Whether images from other origins may be drawn
    pub allow_cross_origin: bool,
    /// Layout width in CSS pixels
    pub viewport_width: f32,
    /// Padding around the surface content in CSS pixels
    pub padding: f32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: "#ffffff".to_string(),
            allow_cross_origin: true,
            viewport_width: 800.0,
            padding: 16.0,
        }
    }
}

impl CaptureOptions {
    /// Create options with the default capture settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capture scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the background colour
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Allow or refuse cross-origin images
    pub fn with_cross_origin(mut self, allow: bool) -> Self {
        self.allow_cross_origin = allow;
        self
    }

    /// Set the layout width
    pub fn with_viewport_width(mut self, width: f32) -> Self {
        self.viewport_width = width;
        self
    }

    /// Check that the options describe a drawable capture
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(PdfError::InvalidOptions(format!("scale {}", self.scale)));
        }
        if !(self.viewport_width.is_finite() && self.viewport_width > 2.0 * self.padding) {
            return Err(PdfError::InvalidOptions(format!(
                "viewport width {} with padding {}",
                self.viewport_width, self.padding
            )));
        }
        if parse_color(&self.background).is_none() {
            return Err(PdfError::InvalidOptions(format!(
                "background colour {:?}",
                self.background
            )));
        }
        Ok(())
    }
}

/// A captured image in straight (non-premultiplied) RGBA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in device pixels
    pub width: u32,
    /// Height in device pixels
    pub height: u32,
    /// Row-major RGBA bytes
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Wrap an RGBA buffer, checking its length
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(PdfError::RasterSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// RGBA of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// RGB bytes with alpha composited over white
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixels.len() / 4 * 3);
        for px in self.pixels.chunks_exact(4) {
            let alpha = u32::from(px[3]);
            for channel in &px[..3] {
                let value = (u32::from(*channel) * alpha + 255 * (255 - alpha) + 127) / 255;
                rgb.push(value as u8);
            }
        }
        rgb
    }
}

/// Captures the mounted surface of a render tree into a raster
pub trait Rasterizer: Send + Sync {
    /// Capture the surface. Callers guarantee a surface is mounted.
    fn capture(
        &self,
        tree: &RenderTree,
        options: &CaptureOptions,
    ) -> impl Future<Output = Result<Raster>> + Send;
}

/// Parse a CSS colour string to a tiny-skia colour
pub fn parse_color(color: &str) -> Option<tiny_skia::Color> {
    let color = color.trim().to_lowercase();

    match color.as_str() {
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        "transparent" => return Some(tiny_skia::Color::TRANSPARENT),
        _ => {}
    }

    let hex = color.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let r = channel(&hex[0..1].repeat(2))?;
            let g = channel(&hex[1..2].repeat(2))?;
            let b = channel(&hex[2..3].repeat(2))?;
            Some(tiny_skia::Color::from_rgba8(r, g, b, 255))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some(tiny_skia::Color::from_rgba8(r, g, b, a))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_options() {
        let options = CaptureOptions::default();
        assert_eq!(options.scale, 2.0);
        assert!(options.allow_cross_origin);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        assert!(CaptureOptions::new().with_scale(0.0).validate().is_err());
        assert!(CaptureOptions::new().with_background("chartreuse-ish").validate().is_err());
        assert!(CaptureOptions::new().with_viewport_width(20.0).validate().is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("white"), Some(tiny_skia::Color::WHITE));
        assert_eq!(
            parse_color("#1f1f1f"),
            Some(tiny_skia::Color::from_rgba8(31, 31, 31, 255))
        );
        assert_eq!(
            parse_color("#fff"),
            Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255))
        );
        assert!(parse_color("#ff00ff80").is_some());
        assert!(parse_color("#gg0000").is_none());
        assert!(parse_color("rebeccapurple").is_none());
    }

    #[test]
    fn test_raster_to_rgb_composites_over_white() {
        let raster = Raster::new(2, 1, vec![10, 20, 30, 255, 0, 0, 0, 0]).unwrap();
        assert_eq!(raster.to_rgb(), vec![10, 20, 30, 255, 255, 255]);
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 0]));
        assert_eq!(raster.pixel(2, 0), None);
    }

    #[test]
    fn test_raster_size_is_checked() {
        assert!(matches!(
            Raster::new(2, 2, vec![0; 15]),
            Err(PdfError::RasterSize { expected: 16, actual: 15 })
        ));
    }
}
