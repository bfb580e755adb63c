//! Configuration settings
//!
//! Read from `docport.toml`. Every key is optional; missing keys keep the
//! built-in export defaults.
//!
//! ```toml
//! [export]
//! file_name = "Report"
//! output_dir = "exports"
//!
//! [capture]
//! scale = 2.0
//!
//! [docx]
//! margin_twips = 1440
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docport_core::DEFAULT_FILE_NAME;
use docport_ooxml::DocxOptions;
use docport_pdf::CaptureOptions;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "docport.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Artifact naming and placement
    pub export: ExportSettings,
    /// Raster capture settings
    pub capture: CaptureSettings,
    /// DOCX packaging settings
    pub docx: DocxSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `explicit` if given, else `docport.toml` in the working
    /// directory if present, else the defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "using local configuration");
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Capture options for the raster exporter
    pub fn capture_options(&self) -> CaptureOptions {
        let mut options = CaptureOptions::new()
            .with_scale(self.capture.scale)
            .with_background(self.capture.background.clone())
            .with_viewport_width(self.capture.viewport_width);
        options.padding = self.capture.padding;
        options
    }

    /// Packaging options for the DOCX packager
    pub fn docx_options(&self) -> DocxOptions {
        DocxOptions::default()
            .with_font(self.docx.font.clone())
            .with_margins(self.docx.margin_twips)
            .with_cant_split_rows(self.docx.cant_split_rows)
    }
}

/// `[export]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Base name of exported files
    pub file_name: String,
    /// Directory receiving exported files
    pub output_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// `[capture]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Device pixels per CSS pixel
    pub scale: f32,
    /// Layout width in CSS pixels
    pub viewport_width: f32,
    /// Background colour
    pub background: String,
    /// Padding around the content in CSS pixels
    pub padding: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        let options = CaptureOptions::default();
        Self {
            scale: options.scale,
            viewport_width: options.viewport_width,
            background: options.background,
            padding: options.padding,
        }
    }
}

/// `[docx]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocxSettings {
    /// Body font family list
    pub font: String,
    /// Margin on all four sides in twips
    pub margin_twips: u32,
    /// Keep table rows on one page
    pub cant_split_rows: bool,
}

impl Default for DocxSettings {
    fn default() -> Self {
        let options = DocxOptions::default();
        Self {
            font: options.font,
            margin_twips: options.margins.top,
            cant_split_rows: options.cant_split_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_exporters() {
        let settings = Settings::default();
        assert_eq!(settings.export.file_name, "MyDocument");
        assert_eq!(settings.capture_options(), CaptureOptions::default());
        assert_eq!(settings.docx_options(), DocxOptions::default());
    }

    #[test]
    fn test_partial_file() {
        let settings = Settings::from_toml_str(
            r#"
[export]
file_name = "Report"

[docx]
margin_twips = 1440
"#,
        )
        .unwrap();
        assert_eq!(settings.export.file_name, "Report");
        assert_eq!(settings.export.output_dir, PathBuf::from("."));
        assert_eq!(settings.docx.margin_twips, 1440);
        assert!(settings.docx.cant_split_rows);
        assert_eq!(settings.capture.scale, 2.0);
    }

    #[test]
    fn test_capture_table() {
        let settings = Settings::from_toml_str(
            "[capture]\nscale = 1.0\nbackground = \"#000000\"\npadding = 0.0\n",
        )
        .unwrap();
        let options = settings.capture_options();
        assert_eq!(options.scale, 1.0);
        assert_eq!(options.background, "#000000");
        assert_eq!(options.padding, 0.0);
        assert!(options.allow_cross_origin);
    }

    #[test]
    fn test_huge_margin_fails_validation() {
        let settings = Settings::from_toml_str("[docx]\nmargin_twips = 4294967295\n").unwrap();
        assert!(settings.docx_options().validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Settings::from_toml_str("[export]\nfile_name = 3").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Settings::discover(Some(Path::new("/nonexistent/docport.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
