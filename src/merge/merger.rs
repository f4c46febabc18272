use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{PdfDeskError, Result};
use crate::io::{PdfReader, PdfWriter, same_file};
use crate::utils::{INHERITABLE_KEYS, inherited_attribute};
use crate::validation::Validator;

/// Minimum number of inputs for a merge.
pub const MIN_MERGE_FILES: usize = 2;

/// Figures from a completed merge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    pub files_merged: usize,
    pub total_pages: usize,
    /// Pages contributed by each input, in merge order.
    pub pages_per_file: Vec<usize>,
    /// Zero until the result is written.
    pub bytes_written: u64,
    #[serde(skip)]
    pub duration: Duration,
}

/// A merged document not yet written anywhere.
#[derive(Debug)]
pub struct MergedDocument {
    pub document: Document,
    pub stats: MergeStats,
}

/// Concatenates whole documents, in list order, into one.
#[derive(Debug, Clone, Default)]
pub struct PdfMerger {
    validator: Validator,
    reader: PdfReader,
    writer: PdfWriter,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer(writer: PdfWriter) -> Self {
        Self {
            writer,
            ..Self::default()
        }
    }

    /// Merge `paths` into a new in-memory document.
    ///
    /// Every source is re-validated here, since it may have changed since it
    /// was queued. Page order in the output is the concatenation of each
    /// source's page order, sources taken in slice order.
    ///
    /// # Errors
    ///
    /// - `Merge` when fewer than two paths are given (nothing is read)
    /// - `Io` when a source vanished or became unreadable
    /// - `InvalidPdf` when a source no longer parses
    pub fn merge(&self, paths: &[PathBuf]) -> Result<MergedDocument> {
        if paths.len() < MIN_MERGE_FILES {
            return Err(PdfDeskError::merge(format!(
                "at least {MIN_MERGE_FILES} PDF files are required, got {}",
                paths.len()
            )));
        }

        let start = Instant::now();
        let mut merged: Option<Document> = None;
        let mut pages_per_file = Vec::with_capacity(paths.len());

        for (idx, path) in paths.iter().enumerate() {
            let mut doc = self.load_source(path)?;
            let page_count = doc.get_pages().len();
            pages_per_file.push(page_count);

            info!(
                "[{}/{}] {} ({page_count} pages)",
                idx + 1,
                paths.len(),
                path.display()
            );

            match merged.as_mut() {
                None => merged = Some(doc),
                Some(target) => {
                    // Avoid object id collisions by renumbering the incoming document
                    doc.renumber_objects_with(target.max_id + 1);
                    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
                    pin_inherited_attributes(&mut doc, &page_ids);

                    target.max_id = doc.max_id;
                    target.objects.extend(doc.objects);
                    append_pages_to_page_tree(target, &page_ids)?;
                }
            }
        }

        let Some(mut document) = merged else {
            return Err(PdfDeskError::merge("no documents loaded"));
        };

        // Later documents' catalogs and page-tree roots are now unreachable.
        let pruned = document.prune_objects();
        document.renumber_objects();
        debug!(pruned = pruned.len(), "pruned orphaned objects");

        let total_pages = document.get_pages().len();
        let stats = MergeStats {
            files_merged: paths.len(),
            total_pages,
            pages_per_file,
            bytes_written: 0,
            duration: start.elapsed(),
        };
        info!(files = stats.files_merged, total_pages, "merge complete");

        Ok(MergedDocument { document, stats })
    }

    /// Merge `paths` and write the result to `output`.
    ///
    /// `output` may not name any of the inputs.
    pub fn merge_to_file(&self, paths: &[PathBuf], output: &Path) -> Result<MergeStats> {
        if let Some(source) = paths.iter().find(|p| same_file(p, output)) {
            return Err(PdfDeskError::SourceOverwrite {
                path: source.clone(),
            });
        }

        let MergedDocument { document, mut stats } = self.merge(paths)?;
        let written = self.writer.save(&document, output)?;

        stats.bytes_written = written.file_size;
        stats.duration += written.write_time;
        Ok(stats)
    }

    fn load_source(&self, path: &Path) -> Result<Document> {
        self.validator.validate_file(path).map_err(|err| match err {
            PdfDeskError::NotFound { path } | PdfDeskError::NotAFile { path } => {
                PdfDeskError::io(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "source is no longer readable",
                    ),
                )
            }
            other => other,
        })?;

        Ok(self.reader.load(path)?.document)
    }
}

/// Copy inherited attributes onto each page so it survives re-parenting.
fn pin_inherited_attributes(doc: &mut Document, page_ids: &[ObjectId]) {
    for &page_id in page_ids {
        let missing: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| {
                doc.get_dictionary(page_id)
                    .map(|page| !page.has(key))
                    .unwrap_or(false)
            })
            .filter_map(|key| inherited_attribute(doc, page_id, key).map(|value| (*key, value)))
            .collect();

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in missing {
                page.set(key, value);
            }
        }
    }
}

/// Hang `page_ids` directly off the root page-tree node.
fn append_pages_to_page_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = merged.catalog()?.get(b"Pages")?.as_reference()?;

    for &page_id in page_ids {
        merged
            .get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));
    }

    let pages_dict = merged.get_dictionary_mut(pages_id)?;

    let kids_array = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
    kids_array.extend(page_ids.iter().map(|&id| Object::Reference(id)));

    let current_count = pages_dict.get(b"Count")?.as_i64()?;
    pages_dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

    Ok(())
}
