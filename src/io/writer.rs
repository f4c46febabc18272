//! PDF writing and saving operations.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! failed save never leaves a half-written file under the requested name.

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{PdfDeskError, Result};

/// How [`PdfWriter::save`] puts bytes on disk.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Go through a hidden sibling and rename into place.
    pub atomic: bool,
    /// Flate-compress streams first.
    pub compress: bool,
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            buffer_size: 8192,
        }
    }
}

/// What a finished save produced.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    pub write_time: Duration,
    /// Bytes on disk after the rename.
    pub file_size: u64,
    pub output_path: PathBuf,
    pub compressed: bool,
}

/// Serializes merged and edited documents.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Keep streams as they are; handy when inspecting output by hand.
    pub fn without_compression() -> Self {
        Self {
            options: WriteOptions {
                compress: false,
                ..Default::default()
            },
        }
    }

    /// Write `doc` to `path`. The in-memory document is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the output directory is missing, the file cannot be
    /// created, or serialization fails.
    pub fn save(&self, doc: &Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();
        let mut doc = doc.clone();

        if self.options.compress {
            doc.compress();
        }

        let write_path = if self.options.atomic {
            temp_path_for(path)
        } else {
            path.to_path_buf()
        };

        if let Err(err) = self.write_to(&mut doc, &write_path) {
            if self.options.atomic {
                let _ = std::fs::remove_file(&write_path);
            }
            return Err(err);
        }

        if self.options.atomic {
            std::fs::rename(&write_path, path).map_err(|e| {
                let _ = std::fs::remove_file(&write_path);
                PdfDeskError::io(path, e)
            })?;
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let write_time = start.elapsed();
        debug!(path = %path.display(), file_size, ?write_time, "wrote pdf");

        Ok(WriteStatistics {
            write_time,
            file_size,
            output_path: path.to_path_buf(),
            compressed: self.options.compress,
        })
    }

    fn write_to(&self, doc: &mut Document, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| PdfDeskError::io(path, e))?;
        let mut writer = std::io::BufWriter::with_capacity(self.options.buffer_size, file);

        doc.save_to(&mut writer).map_err(|e| {
            warn!(path = %path.display(), error = %e, "serialization failed");
            PdfDeskError::io(path, std::io::Error::other(e.to_string()))
        })?;

        writer.flush().map_err(|e| PdfDeskError::io(path, e))?;
        Ok(())
    }
}

/// Hidden sibling used for atomic writes, e.g. `out.pdf` → `.out.pdf.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
