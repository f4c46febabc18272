//! Page rasterization.
//!
//! A [`PageRasterizer`] turns one page at one zoom into an RGBA bitmap of
//! `round(page size × zoom)` pixels. Two backends exist:
//!
//! - [`PreviewRasterizer`]: pure Rust, draws the page sheet only
//! - `PdfiumRasterizer` (feature `pdfium`): full rendering through a
//!   system PDFium library
//!
//! [`select_backend`] picks one according to [`RenderBackend`].

pub mod cache;
#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use cache::{RenderCache, RenderKey};
pub use image::RgbaImage;

use image::Rgba;
use tracing::warn;

use crate::config::RenderBackend;
use crate::document::PdfDocument;
use crate::error::{PdfDeskError, Result};
use crate::layout::Zoom;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EDGE: Rgba<u8> = Rgba([220, 220, 220, 255]);

/// Renders single pages to bitmaps.
pub trait PageRasterizer {
    /// Backend name for logs and status lines.
    fn name(&self) -> &str;

    /// Render the 0-based `page` of `doc` at `zoom`.
    ///
    /// # Errors
    ///
    /// `PageIndex` when `page` is out of range, `Render` on backend failure.
    fn render(&mut self, doc: &PdfDocument, page: usize, zoom: Zoom) -> Result<RgbaImage>;
}

/// Pixel dimensions of `page` at `zoom`, at least 1×1.
pub fn target_size(doc: &PdfDocument, page: usize, zoom: Zoom) -> Result<(u32, u32)> {
    let (width, height) = doc.page_size(page)?;
    Ok((
        zoom.scale(width).round().max(1.0) as u32,
        zoom.scale(height).round().max(1.0) as u32,
    ))
}

/// Draws a blank sheet with a light border at the page's exact size.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewRasterizer;

impl PageRasterizer for PreviewRasterizer {
    fn name(&self) -> &str {
        "preview"
    }

    fn render(&mut self, doc: &PdfDocument, page: usize, zoom: Zoom) -> Result<RgbaImage> {
        let (width, height) = target_size(doc, page, zoom)?;
        let mut image = RgbaImage::from_pixel(width, height, PAPER);

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, EDGE);
                image.put_pixel(x, height - 1, EDGE);
            }
            for y in 0..height {
                image.put_pixel(0, y, EDGE);
                image.put_pixel(width - 1, y, EDGE);
            }
        }

        Ok(image)
    }
}

/// Build the rasterizer `backend` asks for.
///
/// `Auto` prefers PDFium and falls back to the preview backend when PDFium is
/// not compiled in or cannot be bound.
///
/// # Errors
///
/// `Render` when `Pdfium` is requested explicitly and is unavailable.
pub fn select_backend(backend: RenderBackend) -> Result<Box<dyn PageRasterizer>> {
    match backend {
        RenderBackend::Preview => Ok(Box::new(PreviewRasterizer)),
        RenderBackend::Pdfium => pdfium_backend(),
        RenderBackend::Auto => Ok(pdfium_backend().unwrap_or_else(|err| {
            warn!(error = %err, "falling back to preview rasterizer");
            Box::new(PreviewRasterizer)
        })),
    }
}

#[cfg(feature = "pdfium")]
fn pdfium_backend() -> Result<Box<dyn PageRasterizer>> {
    Ok(Box::new(pdfium::PdfiumRasterizer::from_system_library()?))
}

#[cfg(not(feature = "pdfium"))]
fn pdfium_backend() -> Result<Box<dyn PageRasterizer>> {
    Err(PdfDeskError::render("built without the `pdfium` feature"))
}

/// Encode a bitmap as PNG at `path`.
pub fn save_png(image: &RgbaImage, path: &std::path::Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| match e {
            image::ImageError::IoError(io) => PdfDeskError::io(path, io),
            other => PdfDeskError::render(other.to_string()),
        })
}
