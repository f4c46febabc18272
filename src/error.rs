//! Error types for pdfdesk.
//!
//! Every fallible operation in the crate returns [`PdfDeskError`]. The
//! variants follow the failure points a user can actually hit:
//!
//! - **File errors**: missing path, directory instead of a file
//! - **PDF errors**: unparseable or page-less documents
//! - **Navigation errors**: page numbers outside the document
//! - **Merge/edit errors**: too few inputs, no text to replace
//! - **I/O errors**: read or write failures at load/save time

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfdesk operations.
pub type Result<T> = std::result::Result<T, PdfDeskError>;

/// Main error type for pdfdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfDeskError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Path exists but is a directory.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// File could not be parsed as a PDF, or holds no pages.
    #[error("Not a valid PDF: {}\n  Reason: {reason}", path.display())]
    InvalidPdf {
        /// Path to the rejected file.
        path: PathBuf,
        /// Parser or structural reason.
        reason: String,
    },

    /// Page number outside `1..=page_count`.
    #[error("Invalid page {page}: document has {page_count} page(s)")]
    PageIndex {
        /// Requested page, 1-based.
        page: usize,
        /// Pages in the document.
        page_count: usize,
    },

    /// Merge preconditions were not met.
    #[error("Merge operation failed: {reason}")]
    Merge {
        /// Description of what went wrong.
        reason: String,
    },

    /// The target page carries no extractable text block.
    #[error("No text found on page {page} to edit")]
    NoTextBlock {
        /// Page, 1-based.
        page: usize,
    },

    /// Read or write failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Index outside the ordered file list.
    #[error("No file at position {index} (list holds {len})")]
    ListIndex {
        /// Requested index, 0-based.
        index: usize,
        /// Current list length.
        len: usize,
    },

    /// Save target resolves to a source document.
    #[error("Refusing to overwrite source file: {}", path.display())]
    SourceOverwrite {
        /// Path that would have been overwritten.
        path: PathBuf,
    },

    /// Rasterizer backend failure.
    #[error("Rendering failed: {reason}")]
    Render {
        /// Backend message.
        reason: String,
    },

    /// Invalid settings or arguments.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },
}

impl From<lopdf::Error> for PdfDeskError {
    fn from(err: lopdf::Error) -> Self {
        Self::InvalidPdf {
            path: PathBuf::from("<memory>"),
            reason: err.to_string(),
        }
    }
}

impl From<io::Error> for PdfDeskError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl PdfDeskError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    /// Create an InvalidPdf error.
    pub fn invalid_pdf(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPdf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a PageIndex error from a 1-based page number.
    pub fn page_index(page: usize, page_count: usize) -> Self {
        Self::PageIndex { page, page_count }
    }

    /// Create a Merge error.
    pub fn merge(reason: impl Into<String>) -> Self {
        Self::Merge {
            reason: reason.into(),
        }
    }

    /// Create an Io error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Render error.
    pub fn render(reason: impl Into<String>) -> Self {
        Self::Render {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Errors a front end reports as a status line while keeping its state.
    ///
    /// Everything except internal render/config failures qualifies.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Render { .. } | Self::InvalidConfig { .. })
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::NotAFile { .. } => 2,
            Self::InvalidPdf { .. } => 3,
            Self::SourceOverwrite { .. } => 4,
            Self::Io { .. } => 5,
            Self::Merge { .. } | Self::NoTextBlock { .. } | Self::Render { .. } => 6,
            Self::PageIndex { .. } | Self::ListIndex { .. } | Self::InvalidConfig { .. } => 1,
        }
    }
}
