use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::PdfDocument;
use crate::config::{LayoutSettings, Settings, ZoomSettings};
use crate::error::{PdfDeskError, Result};
use crate::io::WriteStatistics;
use crate::layout::{LayoutFlags, LayoutMode, PageLayout, Zoom};
use crate::navigation::{NavCommand, Navigator, Viewport};
use crate::render::{PageRasterizer, RenderCache, RgbaImage, select_backend};
use crate::text::{DocumentText, EditBuffer, PageText, TextEdit, TextEditor, TextExtractor};

/// What staging a replacement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The edit is pending for the page.
    Staged,
    /// The replacement matches the current text; nothing was staged.
    Unchanged,
}

/// One open document with its view state.
pub struct DocumentSession {
    document: PdfDocument,
    zoom: Zoom,
    flags: LayoutFlags,
    layout: PageLayout,
    navigator: Navigator,
    cache: RenderCache,
    rasterizer: Box<dyn PageRasterizer>,
    extractor: TextExtractor,
    editor: TextEditor,
    edits: EditBuffer,
    zoom_settings: ZoomSettings,
    layout_settings: LayoutSettings,
}

impl fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("source", &self.document.source())
            .field("zoom", &self.zoom)
            .field("mode", &self.flags.mode())
            .field("offset", &self.navigator.offset())
            .field("rasterizer", &self.rasterizer.name())
            .finish_non_exhaustive()
    }
}

impl DocumentSession {
    /// Open `path` with the configured rasterizer backend.
    pub fn open(path: &Path, settings: &Settings) -> Result<Self> {
        let document = PdfDocument::open(path)?;
        let rasterizer = select_backend(settings.render.backend)?;
        Ok(Self::new(document, settings, rasterizer))
    }

    pub fn new(
        document: PdfDocument,
        settings: &Settings,
        rasterizer: Box<dyn PageRasterizer>,
    ) -> Self {
        let zoom = Zoom::within(settings.zoom.default, &settings.zoom);
        let flags = LayoutFlags::default();
        let layout = PageLayout::compute(
            document.page_sizes(),
            flags.mode(),
            zoom,
            &settings.layout,
        );
        let mut cache = RenderCache::new(settings.render.cache_capacity);
        cache.sync(document.revision());

        debug!(
            source = %document.source().display(),
            rasterizer = rasterizer.name(),
            "session created"
        );
        Self {
            document,
            zoom,
            flags,
            layout,
            navigator: Navigator::new(settings.navigation),
            cache,
            rasterizer,
            extractor: TextExtractor::new(),
            editor: TextEditor::new(settings.editor.clone()),
            edits: EditBuffer::new(),
            zoom_settings: settings.zoom,
            layout_settings: settings.layout,
        }
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    pub fn mode(&self) -> LayoutMode {
        self.flags.mode()
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn offset(&self) -> f32 {
        self.navigator.offset()
    }

    pub fn viewport(&self) -> Viewport {
        self.navigator.viewport()
    }

    pub fn rasterizer_name(&self) -> &str {
        self.rasterizer.name()
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.apply_zoom(self.zoom.stepped(self.zoom_settings.step, &self.zoom_settings))
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.apply_zoom(self.zoom.stepped(-self.zoom_settings.step, &self.zoom_settings))
    }

    /// Set the zoom, clamped to the configured bounds.
    pub fn set_zoom(&mut self, value: f32) -> Zoom {
        self.apply_zoom(Zoom::within(value, &self.zoom_settings))
    }

    pub fn set_two_up(&mut self, on: bool) -> LayoutMode {
        self.flags.set_two_up(on);
        self.relayout();
        self.mode()
    }

    pub fn toggle_two_up(&mut self) -> LayoutMode {
        self.set_two_up(!self.flags.two_up())
    }

    pub fn set_facing(&mut self, on: bool) -> LayoutMode {
        self.flags.set_facing(on);
        self.relayout();
        self.mode()
    }

    /// Apply a navigation command, returning the new offset.
    pub fn navigate(&mut self, command: NavCommand) -> Result<f32> {
        self.navigator.apply(&self.layout, command)
    }

    pub fn resize(&mut self, viewport_height: f32) {
        self.navigator.resize(&self.layout, viewport_height);
    }

    /// 0-based page at the viewport top.
    pub fn current_page(&self) -> Option<usize> {
        self.navigator.top_page(&self.layout)
    }

    /// `Page X of N` for the page at the viewport top.
    pub fn page_indicator(&self) -> String {
        let current = self.current_page().map_or(0, |p| p + 1);
        format!("Page {current} of {}", self.page_count())
    }

    pub fn visible_pages(&self) -> Vec<usize> {
        self.navigator.visible_pages(&self.layout)
    }

    /// Bitmap of the 0-based `page` at the current zoom, cached.
    pub fn render_page(&mut self, page: usize) -> Result<&RgbaImage> {
        self.document.check_page(page)?;
        self.cache.sync(self.document.revision());

        let Self {
            cache,
            rasterizer,
            document,
            zoom,
            ..
        } = self;
        cache.get_or_render(page, *zoom, || rasterizer.render(document, page, *zoom))
    }

    /// Render every page intersecting the viewport; returns those pages.
    pub fn render_visible(&mut self) -> Result<Vec<usize>> {
        let pages = self.visible_pages();
        for &page in &pages {
            self.render_page(page)?;
        }
        debug!(?pages, cached = self.cache.len(), "rendered visible pages");
        Ok(pages)
    }

    pub fn page_text(&self, page: usize) -> Result<PageText> {
        self.extractor.page_text(&self.document, page)
    }

    pub fn document_text(&self) -> Result<DocumentText> {
        self.extractor.document_text(&self.document)
    }

    /// Stage a replacement for the first text block of `page`.
    ///
    /// # Errors
    ///
    /// `PageIndex` or `NoTextBlock`; nothing is staged in either case.
    pub fn stage_edit(&mut self, page: usize, replacement: &str) -> Result<StageOutcome> {
        let edit = self.editor.prepare(&self.document, page, replacement)?;
        if edit.is_unchanged() {
            self.edits.discard(page);
            return Ok(StageOutcome::Unchanged);
        }
        self.edits.stage(edit);
        Ok(StageOutcome::Staged)
    }

    pub fn pending_edit(&self, page: usize) -> Option<&TextEdit> {
        self.edits.pending(page)
    }

    pub fn discard_edit(&mut self, page: usize) -> Option<TextEdit> {
        self.edits.discard(page)
    }

    /// Forget unapplied edits of every page but `page`.
    pub fn discard_edits_except(&mut self, page: usize) -> usize {
        let dropped = self.edits.discard_except(page);
        if dropped > 0 {
            debug!(dropped, kept_page = page + 1, "discarded unapplied edits");
        }
        dropped
    }

    /// Apply the pending edit of `page` to the in-memory document.
    ///
    /// `Ok(None)` when nothing is pending. Cached bitmaps of the old revision
    /// are dropped.
    pub fn apply_edit(&mut self, page: usize) -> Result<Option<TextEdit>> {
        let applied = self.edits.apply(page, &mut self.document, &self.editor)?;
        if applied.is_some() {
            self.cache.sync(self.document.revision());
            self.relayout();
        }
        Ok(applied)
    }

    /// Stage and apply in one step.
    pub fn replace_text(&mut self, page: usize, replacement: &str) -> Result<Option<TextEdit>> {
        match self.stage_edit(page, replacement)? {
            StageOutcome::Staged => self.apply_edit(page),
            StageOutcome::Unchanged => Ok(None),
        }
    }

    /// Write the current revision to a new file.
    pub fn save_as(&self, path: &Path) -> Result<WriteStatistics> {
        if !self.edits.is_empty() {
            info!(
                pending = self.edits.len(),
                "saving with unapplied edits; they are not included"
            );
        }
        self.document.save_as(path)
    }

    /// `edited_<stem>.pdf` next to the source.
    pub fn suggested_output(&self) -> std::path::PathBuf {
        let source = self.document.source();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        source.with_file_name(format!("edited_{stem}.pdf"))
    }

    fn apply_zoom(&mut self, zoom: Zoom) -> Zoom {
        if zoom != self.zoom {
            self.zoom = zoom;
            self.relayout();
        }
        self.zoom
    }

    fn relayout(&mut self) {
        let layout = PageLayout::compute(
            self.document.page_sizes(),
            self.flags.mode(),
            self.zoom,
            &self.layout_settings,
        );
        self.navigator.reproject(&self.layout, &layout);
        self.layout = layout;
    }
}

/// A page-number argument from a front end, 1-based.
pub fn page_from_number(number: usize, page_count: usize) -> Result<usize> {
    if number == 0 || number > page_count {
        return Err(PdfDeskError::page_index(number, page_count));
    }
    Ok(number - 1)
}
