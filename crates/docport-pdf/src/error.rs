//! Error types for capture and PDF assembly

use thiserror::Error;

/// Errors that can occur while capturing a surface or writing a PDF
#[derive(Error, Debug)]
pub enum PdfError {
    /// Generated layout SVG could not be parsed
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixel buffer could not be allocated
    #[error("Failed to create pixmap ({width}x{height})")]
    Pixmap {
        /// Requested width in device pixels
        width: u32,
        /// Requested height in device pixels
        height: u32,
    },

    /// Capture produced a raster with no area
    #[error("Capture produced an empty raster ({width}x{height})")]
    EmptyRaster {
        /// Raster width
        width: u32,
        /// Raster height
        height: u32,
    },

    /// Pixel buffer length does not match the raster dimensions
    #[error("Raster buffer holds {actual} bytes, expected {expected}")]
    RasterSize {
        /// `width * height * 4`
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Capture settings are unusable
    #[error("Invalid capture options: {0}")]
    InvalidOptions(String),

    /// Rendering task did not complete
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Image stream compression failed
    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// Result type for capture and PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
