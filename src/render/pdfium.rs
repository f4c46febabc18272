//! Rendering through a system PDFium library.

use pdfium_render::prelude::*;
use tracing::debug;

use super::{PageRasterizer, RgbaImage, target_size};
use crate::document::PdfDocument;
use crate::error::{PdfDeskError, Result};
use crate::layout::Zoom;

/// PDFium-backed rasterizer.
///
/// PDFium parses bytes, not lopdf objects, so the in-memory document is
/// serialized once per revision and reused until the next edit.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    snapshot: Option<(u64, Vec<u8>)>,
}

impl PdfiumRasterizer {
    /// Bind the system PDFium library.
    ///
    /// # Errors
    ///
    /// `Render` if the library cannot be found or loaded.
    pub fn from_system_library() -> Result<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| PdfDeskError::render(format!("failed to bind pdfium system library: {e}")))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            snapshot: None,
        })
    }

    fn refresh_snapshot(&mut self, doc: &PdfDocument) -> Result<()> {
        let stale = self
            .snapshot
            .as_ref()
            .is_none_or(|(revision, _)| *revision != doc.revision());
        if stale {
            debug!(revision = doc.revision(), "serializing document for pdfium");
            self.snapshot = Some((doc.revision(), doc.to_bytes()?));
        }
        Ok(())
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn render(&mut self, doc: &PdfDocument, page: usize, zoom: Zoom) -> Result<RgbaImage> {
        let (width, height) = target_size(doc, page, zoom)?;
        let index = u16::try_from(page)
            .map_err(|_| PdfDeskError::render(format!("page {} beyond pdfium range", page + 1)))?;

        self.refresh_snapshot(doc)?;
        let bytes = self
            .snapshot
            .as_ref()
            .map(|(_, bytes)| bytes.as_slice())
            .unwrap_or_default();
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PdfDeskError::render(format!("pdfium could not open document: {e}")))?;
        let pdf_page = document
            .pages()
            .get(index)
            .map_err(|e| PdfDeskError::render(format!("pdfium could not load page {}: {e}", page + 1)))?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);
        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| PdfDeskError::render(e.to_string()))?;

        let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
        RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes().to_vec())
            .ok_or_else(|| PdfDeskError::render("bitmap size does not match its pixel data"))
    }
}
