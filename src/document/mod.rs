//! An opened PDF and the state of viewing it.
//!
//! [`PdfDocument`] wraps the parsed document with the per-page facts the
//! rest of the crate needs (object ids, native sizes) and a revision number
//! that changes on every content mutation. [`DocumentSession`] adds zoom,
//! layout, scroll position, the render cache and pending edits.

mod session;

pub use session::{DocumentSession, StageOutcome, page_from_number};

use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PdfDeskError, Result};
use crate::io::{PdfReader, PdfWriter, WriteStatistics, same_file};
use crate::utils::page_size;
use crate::validation::Validator;

/// A parsed PDF held in memory.
#[derive(Debug)]
pub struct PdfDocument {
    inner: Document,
    source: PathBuf,
    page_ids: Vec<ObjectId>,
    page_sizes: Vec<(f32, f32)>,
    revision: u64,
}

impl PdfDocument {
    /// Validate and load `path`.
    ///
    /// # Errors
    ///
    /// Any validation error (`NotFound`, `NotAFile`, `InvalidPdf`, `Io`).
    pub fn open(path: &Path) -> Result<Self> {
        Validator::new().validate_file(path)?;
        let loaded = PdfReader::new().load(path)?;
        info!(path = %path.display(), pages = loaded.page_count, "opened document");
        Ok(Self::from_document(loaded.document, loaded.path))
    }

    /// Wrap an already-parsed document that came from `source`.
    pub fn from_document(inner: Document, source: PathBuf) -> Self {
        let mut doc = Self {
            inner,
            source,
            page_ids: Vec::new(),
            page_sizes: Vec::new(),
            revision: 0,
        };
        doc.refresh_pages();
        doc
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source, for status lines.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Native page sizes in points, rotation applied.
    pub fn page_sizes(&self) -> &[(f32, f32)] {
        &self.page_sizes
    }

    /// Size of the 0-based `index`.
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        self.check_page(index)?;
        Ok(self.page_sizes[index])
    }

    /// Object id of the 0-based `index`.
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.check_page(index)?;
        Ok(self.page_ids[index])
    }

    /// Fail with `PageIndex` (reported 1-based) unless `index` is a page.
    pub fn check_page(&self, index: usize) -> Result<()> {
        if index >= self.page_ids.len() {
            return Err(PdfDeskError::page_index(index + 1, self.page_ids.len()));
        }
        Ok(())
    }

    /// Content revision; bumped by every successful [`PdfDocument::modify`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mutate the document. The revision moves only if `f` succeeds.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut Document) -> Result<R>) -> Result<R> {
        let out = f(&mut self.inner)?;
        self.revision += 1;
        self.refresh_pages();
        debug!(revision = self.revision, "document modified");
        Ok(out)
    }

    /// Serialize the current revision.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.inner
            .clone()
            .save_to(&mut bytes)
            .map_err(|e| PdfDeskError::io(&self.source, std::io::Error::other(e.to_string())))?;
        Ok(bytes)
    }

    /// Write the current revision to a new file. The source is never overwritten.
    pub fn save_as(&self, path: &Path) -> Result<WriteStatistics> {
        if same_file(path, &self.source) {
            return Err(PdfDeskError::SourceOverwrite {
                path: path.to_path_buf(),
            });
        }
        let stats = PdfWriter::new().save(&self.inner, path)?;
        info!(path = %path.display(), bytes = stats.file_size, "saved document");
        Ok(stats)
    }

    fn refresh_pages(&mut self) {
        self.page_ids = self.inner.get_pages().into_values().collect();
        self.page_sizes = self
            .page_ids
            .iter()
            .map(|&id| page_size(&self.inner, id))
            .collect();
    }
}
