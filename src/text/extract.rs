//! Plain-text extraction with word and character counts.

use serde::Serialize;
use tracing::{debug, warn};

use super::blocks::{TextBlock, scan_page};
use crate::document::PdfDocument;
use crate::error::Result;

/// Word and character totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
        }
    }
}

impl std::ops::Add for TextStats {
    type Output = TextStats;

    fn add(self, rhs: TextStats) -> TextStats {
        TextStats {
            words: self.words + rhs.words,
            characters: self.characters + rhs.characters,
        }
    }
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// 1-based page number.
    pub page: usize,
    pub text: String,
    pub stats: TextStats,
}

/// Text of a whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentText {
    pub pages: Vec<PageText>,
    pub stats: TextStats,
}

impl DocumentText {
    /// All pages, each preceded by a `--- Page N ---` header line.
    pub fn combined(&self) -> String {
        self.pages
            .iter()
            .map(|p| format!("\n--- Page {} ---\n{}", p.page, p.text))
            .collect()
    }
}

/// Reads text from an opened document.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Text blocks of the 0-based `page`, in content order.
    pub fn blocks(&self, doc: &PdfDocument, page: usize) -> Result<Vec<TextBlock>> {
        scan_page(doc.inner(), doc.page_id(page)?)
    }

    /// First text block of the 0-based `page`, if any.
    pub fn first_block(&self, doc: &PdfDocument, page: usize) -> Result<Option<TextBlock>> {
        Ok(self.blocks(doc, page)?.into_iter().next())
    }

    /// Text of the 0-based `page`. Pages without text yield an empty string.
    ///
    /// # Errors
    ///
    /// `PageIndex` when `page` is out of range, `InvalidPdf` when its content
    /// stream cannot be decoded.
    pub fn page_text(&self, doc: &PdfDocument, page: usize) -> Result<PageText> {
        let blocks = self.blocks(doc, page)?;

        let text = if blocks.iter().any(|b| b.composite && b.text.is_empty()) {
            self.composite_fallback(doc, page, &blocks)
        } else {
            join_blocks(&blocks)
        };

        let stats = TextStats::of(&text);
        debug!(page = page + 1, words = stats.words, chars = stats.characters, "extracted page text");
        Ok(PageText {
            page: page + 1,
            text,
            stats,
        })
    }

    /// Text of every page.
    pub fn document_text(&self, doc: &PdfDocument) -> Result<DocumentText> {
        let pages = (0..doc.page_count())
            .map(|page| self.page_text(doc, page))
            .collect::<Result<Vec<_>>>()?;
        let stats = pages
            .iter()
            .fold(TextStats::default(), |acc, p| acc + p.stats);
        Ok(DocumentText { pages, stats })
    }

    /// A Type0 block decoded to nothing; let lopdf's page extraction try.
    fn composite_fallback(&self, doc: &PdfDocument, page: usize, blocks: &[TextBlock]) -> String {
        match doc.inner().extract_text(&[page as u32 + 1]) {
            Ok(text) => text.trim_end().to_string(),
            Err(err) => {
                warn!(page = page + 1, error = %err, "composite font text could not be decoded");
                join_blocks(blocks)
            }
        }
    }
}

fn join_blocks(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
