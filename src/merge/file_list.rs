//! The ordered list of files queued for merging.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PdfDeskError, Result};
use crate::validation::{ValidatedPdf, Validator};

/// One queued file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfFileRef {
    pub path: PathBuf,
    pub page_count: usize,
    pub file_size: u64,
    /// Cleared when a later re-validation fails.
    pub valid: bool,
}

impl From<ValidatedPdf> for PdfFileRef {
    fn from(v: ValidatedPdf) -> Self {
        Self {
            path: v.path,
            page_count: v.page_count,
            file_size: v.file_size,
            valid: true,
        }
    }
}

impl PdfFileRef {
    /// File name for list display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of adding a batch of paths.
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: usize,
    pub skipped: Vec<(PathBuf, PdfDeskError)>,
}

/// Files in merge order. Only validated files are ever inserted.
#[derive(Debug, Clone, Default)]
pub struct OrderedFileList {
    files: Vec<PdfFileRef>,
    validator: Validator,
}

impl OrderedFileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `path` and append it.
    ///
    /// The list is unchanged when validation fails.
    pub fn add(&mut self, path: &Path) -> Result<&PdfFileRef> {
        let validated = self.validator.validate_file(path)?;
        debug!(path = %path.display(), pages = validated.page_count, "queued for merge");
        self.files.push(validated.into());
        let last = self.files.len() - 1;
        Ok(&self.files[last])
    }

    /// Add every path, keeping going past invalid ones.
    pub fn add_all<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.add(path) {
                Ok(_) => report.added += 1,
                Err(err) => report.skipped.push((path.to_path_buf(), err)),
            }
        }
        info!(
            added = report.added,
            skipped = report.skipped.len(),
            "files added to merge list"
        );
        report
    }

    /// Remove and return the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Result<PdfFileRef> {
        self.check_index(index)?;
        Ok(self.files.remove(index))
    }

    /// Swap the entry with its predecessor. Returns the entry's new index.
    pub fn move_up(&mut self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(0);
        }
        self.files.swap(index - 1, index);
        Ok(index - 1)
    }

    /// Swap the entry with its successor. Returns the entry's new index.
    pub fn move_down(&mut self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        if index + 1 == self.files.len() {
            return Ok(index);
        }
        self.files.swap(index, index + 1);
        Ok(index + 1)
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfFileRef> {
        self.files.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PdfFileRef> {
        self.files.iter()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn total_pages(&self) -> usize {
        self.files.iter().map(|f| f.page_count).sum()
    }

    /// At least two entries, all still valid.
    pub fn can_merge(&self) -> bool {
        self.files.len() >= 2 && self.files.iter().all(|f| f.valid)
    }

    /// Re-run validation on every entry, clearing `valid` on failures.
    ///
    /// Returns the number of entries that are now invalid.
    pub fn revalidate(&mut self) -> usize {
        let validator = self.validator.clone();
        let mut invalid = 0;
        for file in &mut self.files {
            match validator.validate_file(&file.path) {
                Ok(v) => {
                    file.page_count = v.page_count;
                    file.file_size = v.file_size;
                    file.valid = true;
                }
                Err(err) => {
                    debug!(path = %file.path.display(), error = %err, "entry no longer valid");
                    file.valid = false;
                    invalid += 1;
                }
            }
        }
        invalid
    }

    /// Status text for the list header.
    pub fn summary_label(&self) -> String {
        match self.files.len() {
            0 => "No files added".to_string(),
            1 => "1 file added".to_string(),
            n => format!("{n} files added"),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.files.len() {
            return Err(PdfDeskError::ListIndex {
                index,
                len: self.files.len(),
            });
        }
        Ok(())
    }
}
