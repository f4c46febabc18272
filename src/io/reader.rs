//! PDF loading.

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{PdfDeskError, Result};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// Loads PDF documents from disk.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `NotAFile` when the path is missing or a directory
    /// - `Io` when the bytes cannot be read
    /// - `InvalidPdf` when the bytes do not parse
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        Self::check_path_exists(path)?;

        let start = Instant::now();
        let bytes = std::fs::read(path).map_err(|e| PdfDeskError::io(path, e))?;
        let file_size = bytes.len() as u64;

        if bytes.is_empty() {
            return Err(PdfDeskError::invalid_pdf(path, "file is empty"));
        }

        let document = Document::load_mem(&bytes)
            .map_err(|e| PdfDeskError::invalid_pdf(path, e.to_string()))?;
        let page_count = document.get_pages().len();
        let load_time = start.elapsed();

        debug!(path = %path.display(), page_count, ?load_time, "loaded pdf");

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            load_time,
            file_size,
        })
    }

    /// Fail with `NotFound` or `NotAFile` unless `path` is an existing file.
    pub fn check_path_exists(path: &Path) -> Result<()> {
        let exists = path.try_exists().map_err(|e| PdfDeskError::io(path, e))?;
        if !exists {
            return Err(PdfDeskError::not_found(path));
        }

        if path.is_dir() {
            return Err(PdfDeskError::not_a_file(path));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_pdf;

    #[test]
    fn test_load_valid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &[(612.0, 792.0), (612.0, 792.0)]);

        let loaded = PdfReader::new().load(&path).unwrap();
        assert_eq!(loaded.page_count, 2);
        assert!(loaded.file_size > 0);
        assert_eq!(loaded.path, path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PdfReader::new()
            .load(Path::new("/nonexistent/doc.pdf"))
            .unwrap_err();
        assert!(matches!(err, PdfDeskError::NotFound { .. }));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfReader::new().load(dir.path()).unwrap_err();
        assert!(matches!(err, PdfDeskError::NotAFile { .. }));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"just some text, not a pdf").unwrap();

        let err = PdfReader::new().load(&path).unwrap_err();
        assert!(matches!(err, PdfDeskError::InvalidPdf { .. }));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = PdfReader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, PdfDeskError::InvalidPdf { .. }));
    }
}
