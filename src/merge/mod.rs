//! Merge list management and page concatenation.
//!
//! [`OrderedFileList`] holds validated inputs in the order the user arranged
//! them; [`PdfMerger`] turns that order into one output document.

pub mod file_list;
pub mod merger;

pub use file_list::{AddReport, OrderedFileList, PdfFileRef};
pub use merger::{MIN_MERGE_FILES, MergeStats, MergedDocument, PdfMerger};
