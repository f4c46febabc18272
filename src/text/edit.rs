//! Replacing the first text block of a page.
//!
//! The old text is not removed from the content stream. It is covered by an
//! opaque white rectangle and the replacement is drawn on top, in a content
//! stream appended to the page. The existing content is wrapped in `q … Q`
//! so its graphics state cannot leak into the overlay.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::blocks::TextBlock;
use super::extract::TextExtractor;
use crate::config::EditorSettings;
use crate::document::PdfDocument;
use crate::error::{PdfDeskError, Result};
use crate::utils::{inherited_attribute, resolve};

const MASK_PADDING: f32 = 1.0;
const FONT_PREFIX: &str = "PdfDeskF";

/// A replacement targeting one page's first text block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    /// 0-based page index.
    pub page: usize,
    pub target: TextBlock,
    pub replacement: String,
}

impl TextEdit {
    /// Whether the replacement reads the same as the text it covers.
    pub fn is_unchanged(&self) -> bool {
        self.replacement.trim_end() == self.target.text.trim_end()
    }
}

/// Builds and applies [`TextEdit`]s.
#[derive(Debug, Clone, Default)]
pub struct TextEditor {
    settings: EditorSettings,
    extractor: TextExtractor,
}

impl TextEditor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            extractor: TextExtractor::new(),
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Target the first text block of the 0-based `page`.
    ///
    /// # Errors
    ///
    /// `PageIndex` for a page outside the document, `NoTextBlock` when the
    /// page shows no text.
    pub fn prepare(&self, doc: &PdfDocument, page: usize, replacement: &str) -> Result<TextEdit> {
        let target = self
            .extractor
            .first_block(doc, page)?
            .ok_or(PdfDeskError::NoTextBlock { page: page + 1 })?;

        Ok(TextEdit {
            page,
            target,
            replacement: replacement.trim_end().to_string(),
        })
    }

    /// Mask the target and draw the replacement into the in-memory document.
    pub fn apply(&self, doc: &mut PdfDocument, edit: &TextEdit) -> Result<()> {
        let page_id = doc.page_id(edit.page)?;

        doc.modify(|inner| {
            let font = ensure_font(inner, page_id, &self.settings.font)?;
            let operations = self.overlay(edit, &font);
            append_overlay(inner, page_id, operations)
        })?;

        info!(
            page = edit.page + 1,
            chars = edit.replacement.chars().count(),
            "applied text edit"
        );
        Ok(())
    }

    /// Prepare and apply in one step.
    pub fn replace_first_block(
        &self,
        doc: &mut PdfDocument,
        page: usize,
        replacement: &str,
    ) -> Result<TextEdit> {
        let edit = self.prepare(doc, page, replacement)?;
        self.apply(doc, &edit)?;
        Ok(edit)
    }

    fn overlay(&self, edit: &TextEdit, font: &[u8]) -> Vec<Operation> {
        let mask = edit.target.bbox.padded(MASK_PADDING);
        let size = self.settings.font_size;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
            Operation::new(
                "re",
                vec![
                    mask.x0.into(),
                    mask.y0.into(),
                    mask.width().into(),
                    mask.height().into(),
                ],
            ),
            Operation::new("f", vec![]),
        ];

        if !edit.replacement.trim().is_empty() {
            let origin_x = edit.target.bbox.x0;
            let baseline = edit.target.bbox.y1 - size;

            ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![Object::Name(font.to_vec()), size.into()]));
            ops.push(Operation::new("TL", vec![(size * self.settings.line_spacing).into()]));
            ops.push(Operation::new("Td", vec![origin_x.into(), baseline.into()]));
            for (i, line) in edit.replacement.lines().enumerate() {
                if i > 0 {
                    ops.push(Operation::new("T*", vec![]));
                }
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
                ));
            }
            ops.push(Operation::new("ET", vec![]));
        }

        ops.push(Operation::new("Q", vec![]));
        ops
    }
}

/// Encode for a WinAnsi simple font. Unencodable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "Encoding" => "WinAnsiEncoding",
    };
    let Ok(encoding) = font.get_font_encoding(&Document::new()) else {
        return text.bytes().map(|b| if b.is_ascii() { b } else { b'?' }).collect();
    };

    let mut buf = [0_u8; 4];
    text.chars()
        .flat_map(|c| match Document::encode_text(&encoding, c.encode_utf8(&mut buf)).as_slice() {
            [byte] => vec![*byte],
            _ => vec![b'?'],
        })
        .collect()
}

/// Make the editor font visible to the page and return its resource name.
///
/// The page's effective resources are copied onto the page itself, so
/// resources shared with other pages are left untouched.
fn ensure_font(doc: &mut Document, page_id: ObjectId, base_font: &str) -> Result<Vec<u8>> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources")
        .as_ref()
        .and_then(|r| resolve(doc, r))
    {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font").ok().and_then(|f| resolve(doc, f)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let reusable = fonts
        .iter()
        .find(|(name, value)| {
            name.starts_with(FONT_PREFIX.as_bytes())
                && matches!(
                    resolve(doc, value),
                    Some(Object::Dictionary(font))
                        if font.get(b"BaseFont").and_then(Object::as_name).ok()
                            == Some(base_font.as_bytes())
                )
        })
        .map(|(name, _)| name.clone());
    if let Some(name) = reusable {
        return Ok(name);
    }

    let mut n = 1;
    let name = loop {
        let candidate = format!("{FONT_PREFIX}{n}").into_bytes();
        if !fonts.has(&candidate) {
            break candidate;
        }
        n += 1;
    };

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    });
    fonts.set(name.clone(), font_id);
    resources.set("Font", fonts);
    doc.get_dictionary_mut(page_id)?.set("Resources", resources);

    debug!(font = %String::from_utf8_lossy(&name), base_font, "added editor font to page");
    Ok(name)
}

fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<Operation>) -> Result<()> {
    let existing = existing_contents(doc, page_id);
    let mut contents = Vec::with_capacity(existing.len() + 2);

    let mut operations = overlay;
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        operations.insert(0, Operation::new("Q", vec![]));
    }

    // Streams are concatenated without a separator.
    let mut bytes = b"\n".to_vec();
    bytes.extend(Content { operations }.encode()?);
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, bytes));
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}

/// Pending edits, at most one per page.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    pending: BTreeMap<usize, TextEdit>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `edit`, returning the edit it replaces on the same page.
    pub fn stage(&mut self, edit: TextEdit) -> Option<TextEdit> {
        self.pending.insert(edit.page, edit)
    }

    pub fn discard(&mut self, page: usize) -> Option<TextEdit> {
        self.pending.remove(&page)
    }

    /// Drop pending edits of every page other than `page`.
    pub fn discard_except(&mut self, page: usize) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p, _| *p == page);
        before - self.pending.len()
    }

    pub fn pending(&self, page: usize) -> Option<&TextEdit> {
        self.pending.get(&page)
    }

    /// Pages holding a pending edit, ascending.
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply the pending edit of `page`. `Ok(None)` when nothing is staged.
    ///
    /// A failed edit stays pending.
    pub fn apply(
        &mut self,
        page: usize,
        doc: &mut PdfDocument,
        editor: &TextEditor,
    ) -> Result<Option<TextEdit>> {
        let Some(edit) = self.pending.remove(&page) else {
            return Ok(None);
        };
        match editor.apply(doc, &edit) {
            Ok(()) => Ok(Some(edit)),
            Err(err) => {
                self.pending.insert(page, edit);
                Err(err)
            }
        }
    }
}
