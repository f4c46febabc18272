//! PDF validation.
//!
//! Every file passes through [`Validator::validate_file`] before it may enter
//! the merge list or be opened for reading and editing. Validation is a
//! read-only check: the parsed document is dropped before returning.
//!
//! # Examples
//!
//! ```no_run
//! use pdfdesk::validation::Validator;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = Validator::new().validate_file(Path::new("test.pdf"))?;
//! println!("PDF has {} pages", result.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{PdfDeskError, Result};
use crate::io::{PdfReader, format_file_size};
use crate::utils::page_size;

/// A file that opened as a PDF and has at least one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPdf {
    /// Path to the validated file.
    pub path: PathBuf,

    /// Number of pages in the PDF.
    pub page_count: usize,

    /// Size of the file in bytes.
    pub file_size: u64,

    /// PDF version (major, minor).
    pub version: Option<(u8, u8)>,

    /// First page dimensions (width, height) in points.
    pub first_page_size: Option<(f32, f32)>,
}

impl ValidatedPdf {
    fn from_document(path: PathBuf, doc: &Document, file_size: u64) -> Self {
        let pages = doc.get_pages();

        let version = doc.version.split_once('.').map(|(major, minor)| {
            (
                major.trim().parse::<u8>().unwrap_or_default(),
                minor.trim().parse::<u8>().unwrap_or_default(),
            )
        });

        let first_page_size = pages
            .values()
            .next()
            .map(|&page_id| page_size(doc, page_id));

        Self {
            path,
            page_count: pages.len(),
            file_size,
            version,
            first_page_size,
        }
    }
}

/// A path that failed validation, with its reason.
#[derive(Debug)]
pub struct Rejected {
    pub path: PathBuf,
    pub error: PdfDeskError,
}

/// Outcome of validating a batch of files.
#[derive(Debug, Default)]
pub struct ValidationSummary {
    /// Files that passed, in input order.
    pub accepted: Vec<ValidatedPdf>,

    /// Files that failed, in input order.
    pub rejected: Vec<Rejected>,

    /// Total pages across accepted files.
    pub total_pages: usize,

    /// Total size of accepted files in bytes.
    pub total_size: u64,
}

impl ValidationSummary {
    pub fn all_valid(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Format the total file size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Probes candidate files.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    reader: PdfReader,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a single PDF file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the path does not exist
    /// - `NotAFile` if it names a directory
    /// - `InvalidPdf` if it does not parse, or parses with zero pages
    /// - `Io` if it exists but cannot be read
    pub fn validate_file(&self, path: &Path) -> Result<ValidatedPdf> {
        let loaded = self.reader.load(path).inspect_err(|e| {
            debug!(path = %path.display(), error = %e, "validation failed");
        })?;

        if loaded.page_count == 0 {
            warn!(path = %path.display(), "document has no pages");
            return Err(PdfDeskError::invalid_pdf(path, "document has no pages"));
        }

        let result = ValidatedPdf::from_document(loaded.path, &loaded.document, loaded.file_size);
        debug!(path = %path.display(), pages = result.page_count, "validated");
        Ok(result)
    }

    /// Validate every path, collecting failures instead of stopping at the first.
    pub fn validate_many(&self, paths: &[PathBuf]) -> ValidationSummary {
        let mut summary = ValidationSummary::default();

        for path in paths {
            match self.validate_file(path) {
                Ok(result) => {
                    summary.total_pages += result.page_count;
                    summary.total_size += result.file_size;
                    summary.accepted.push(result);
                }
                Err(error) => summary.rejected.push(Rejected {
                    path: path.clone(),
                    error,
                }),
            }
        }

        summary
    }
}
