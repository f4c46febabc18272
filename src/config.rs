//! Configuration for pdfdesk.
//!
//! [`Settings`] collects the tunables of every component: zoom bounds, layout
//! spacing, scroll units, the editor font and the rasterizer backend. All
//! fields carry defaults, so a settings file only needs the keys it changes.
//!
//! # Examples
//!
//! ```no_run
//! use pdfdesk::config::Settings;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(Some(Path::new("pdfdesk.json")))?;
//! println!("zoom step: {}", settings.zoom.step);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{PdfDeskError, Result};

/// Zoom bounds and step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Smallest zoom factor.
    pub min: f32,
    /// Largest zoom factor.
    pub max: f32,
    /// Zoom applied when a document is opened.
    pub default: f32,
    /// Increment used by zoom in/out.
    pub step: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: 0.40,
            max: 3.00,
            default: 1.00,
            step: 0.20,
        }
    }
}

/// Spacing used by the layout engine, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Space around the laid-out content.
    pub margin: f32,
    /// Vertical space between rows.
    pub row_gap: f32,
    /// Horizontal space between the two columns of a spread.
    pub column_gap: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            margin: 10.0,
            row_gap: 20.0,
            column_gap: 20.0,
        }
    }
}

/// Scroll units and the headless viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// One scroll unit as a fraction of the reference row height.
    pub scroll_unit_fraction: f32,
    /// Units moved per arrow key press.
    pub arrow_units: u32,
    /// Wheel delta that makes up one unit.
    pub wheel_delta_per_unit: i32,
    /// Viewport height used until a front end reports its own.
    pub viewport_height: f32,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            scroll_unit_fraction: 0.1,
            arrow_units: 3,
            wheel_delta_per_unit: 120,
            viewport_height: 800.0,
        }
    }
}

/// Font used when drawing replacement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Standard Type1 font name.
    pub font: String,
    /// Font size in points.
    pub font_size: f32,
    /// Line advance as a multiple of the font size.
    pub line_spacing: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            font_size: 11.0,
            line_spacing: 1.2,
        }
    }
}

/// Which rasterizer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    /// PDFium when compiled in and bindable, preview otherwise.
    #[default]
    Auto,
    /// PDFium only; fail if it cannot be bound.
    Pdfium,
    /// Page outlines only, no content.
    Preview,
}

impl FromStr for RenderBackend {
    type Err = PdfDeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "pdfium" => Ok(Self::Pdfium),
            "preview" => Ok(Self::Preview),
            _ => Err(PdfDeskError::invalid_config(format!(
                "Invalid render backend: {s}. Must be one of: auto, pdfium, preview"
            ))),
        }
    }
}

/// Rasterizer selection and cache size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Backend selection.
    pub backend: RenderBackend,
    /// Bitmaps kept per document session.
    pub cache_capacity: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            backend: RenderBackend::Auto,
            cache_capacity: 64,
        }
    }
}

/// All settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Zoom bounds.
    pub zoom: ZoomSettings,
    /// Layout spacing.
    pub layout: LayoutSettings,
    /// Scroll behaviour.
    pub navigation: NavigationSettings,
    /// Replacement text font.
    pub editor: EditorSettings,
    /// Rasterizer.
    pub render: RenderSettings,
    /// Default tracing filter.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: ZoomSettings::default(),
            layout: LayoutSettings::default(),
            navigation: NavigationSettings::default(),
            editor: EditorSettings::default(),
            render: RenderSettings::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`Settings::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(PdfDeskError::not_found(path));
        }

        let raw = std::fs::read_to_string(path).map_err(|e| PdfDeskError::io(path, e))?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| {
            PdfDeskError::invalid_config(format!("{}: {e}", path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        let zoom = &self.zoom;
        if zoom.min <= 0.0 {
            return Err(PdfDeskError::invalid_config("zoom.min must be positive"));
        }
        if zoom.min > zoom.max {
            return Err(PdfDeskError::invalid_config(format!(
                "zoom.min ({}) exceeds zoom.max ({})",
                zoom.min, zoom.max
            )));
        }
        if !(zoom.min..=zoom.max).contains(&zoom.default) {
            return Err(PdfDeskError::invalid_config(format!(
                "zoom.default ({}) outside [{}, {}]",
                zoom.default, zoom.min, zoom.max
            )));
        }
        if zoom.step <= 0.0 {
            return Err(PdfDeskError::invalid_config("zoom.step must be positive"));
        }

        let layout = &self.layout;
        if layout.margin < 0.0 || layout.row_gap < 0.0 || layout.column_gap < 0.0 {
            return Err(PdfDeskError::invalid_config(
                "layout spacing must not be negative",
            ));
        }

        let nav = &self.navigation;
        if nav.scroll_unit_fraction <= 0.0 || nav.wheel_delta_per_unit == 0 {
            return Err(PdfDeskError::invalid_config(
                "navigation scroll units must be positive",
            ));
        }
        if nav.viewport_height <= 0.0 {
            return Err(PdfDeskError::invalid_config(
                "navigation.viewport_height must be positive",
            ));
        }

        if self.editor.font.trim().is_empty() || self.editor.font_size <= 0.0 {
            return Err(PdfDeskError::invalid_config(
                "editor font and font_size are required",
            ));
        }

        if self.render.cache_capacity == 0 {
            return Err(PdfDeskError::invalid_config(
                "render.cache_capacity must be at least 1",
            ));
        }

        Ok(())
    }
}
