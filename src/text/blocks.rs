//! Content-stream scanning for positioned text blocks.
//!
//! Each `BT … ET` section that shows at least one glyph becomes a
//! [`TextBlock`]. Glyph boxes are built from the font's advance widths and
//! the text state (`Tc`, `Tw`, `Tz`), then mapped through the text matrix and
//! the current transformation matrix (`q`, `Q`, `cm`), so block boxes are in
//! default user space.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use std::collections::BTreeMap;

use super::fonts::{GLYPH_WIDTH_EM, PageFont, decode_pdf_string, page_fonts};
use crate::error::{PdfDeskError, Result};

const ASCENT_EM: f32 = 0.9;
const DESCENT_EM: f32 = 0.25;
/// Horizontal gap, in ems, read as a word break between shown strings.
const WORD_GAP_EM: f32 = 0.25;

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Smallest rectangle holding every point.
    pub fn bounding(points: [(f32, f32); 4]) -> Rect {
        let [(x, y), rest @ ..] = points;
        rest.iter().fold(
            Rect {
                x0: x,
                y0: y,
                x1: x,
                y1: y,
            },
            |r, &(x, y)| Rect {
                x0: r.x0.min(x),
                y0: r.y0.min(y),
                x1: r.x1.max(x),
                y1: r.y1.max(y),
            },
        )
    }

    /// Grow by `by` on every side.
    pub fn padded(&self, by: f32) -> Rect {
        Rect {
            x0: self.x0 - by,
            y0: self.y0 - by,
            x1: self.x1 + by,
            y1: self.y1 + by,
        }
    }
}

/// One `BT … ET` section that shows text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    /// Position among the page's blocks, in content order.
    pub index: usize,
    /// Decoded text; lines separated by `\n`. Strings of a composite font
    /// without a ToUnicode map contribute nothing.
    pub text: String,
    /// Resource name of the first font used.
    pub font: Option<String>,
    pub font_size: f32,
    /// Start of the first shown string, in user space.
    pub origin: (f32, f32),
    /// Extent of all shown glyphs in default user space.
    pub bbox: Rect,
    /// Shown with a Type0 font.
    pub composite: bool,
}

/// Decoded content of one page, empty when the page has no content.
pub fn page_operations(doc: &Document, page_id: ObjectId) -> Result<Vec<Operation>> {
    let Ok(bytes) = doc.get_page_content(page_id) else {
        return Ok(Vec::new());
    };
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let content = Content::decode(&bytes)
        .map_err(|e| PdfDeskError::invalid_pdf("<content stream>", e.to_string()))?;
    Ok(content.operations)
}

/// Scan a page for text blocks in content order.
pub fn scan_page(doc: &Document, page_id: ObjectId) -> Result<Vec<TextBlock>> {
    let operations = page_operations(doc, page_id)?;
    let fonts = page_fonts(doc, page_id);
    Ok(scan_operations(&operations, &fonts))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let values: Vec<f32> = operands.iter().filter_map(|o| o.as_float().ok()).collect();
        <[f32; 6]>::try_from(values).ok().map(Matrix)
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn translate(self, tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty]).then(self)
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn y_scale(self) -> f32 {
        self.0[2].hypot(self.0[3])
    }
}

/// Text state parameters; saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct BlockBuilder {
    text: String,
    font: Option<String>,
    font_size: f32,
    origin: Option<(f32, f32)>,
    bbox: Option<Rect>,
    last_y: Option<f32>,
    last_end_x: f32,
    glyphs: usize,
    composite: bool,
}

impl BlockBuilder {
    fn finish(self, index: usize) -> Option<TextBlock> {
        if self.glyphs == 0 {
            return None;
        }
        Some(TextBlock {
            index,
            text: self.text,
            font: self.font,
            font_size: self.font_size,
            origin: self.origin?,
            bbox: self.bbox?,
            composite: self.composite,
        })
    }
}

struct Scanner<'f, 'a> {
    fonts: &'f BTreeMap<Vec<u8>, PageFont<'a>>,
    ctm: Matrix,
    state: TextState,
    saved: Vec<(Matrix, TextState)>,
    tm: Matrix,
    tlm: Matrix,
    current: Option<BlockBuilder>,
    blocks: Vec<TextBlock>,
}

impl<'f, 'a> Scanner<'f, 'a> {
    fn new(fonts: &'f BTreeMap<Vec<u8>, PageFont<'a>>) -> Self {
        Self {
            fonts,
            ctm: Matrix::IDENTITY,
            state: TextState::default(),
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            current: None,
            blocks: Vec::new(),
        }
    }

    fn begin(&mut self) {
        self.flush();
        self.tm = Matrix::IDENTITY;
        self.tlm = Matrix::IDENTITY;
        self.current = Some(BlockBuilder::default());
    }

    fn flush(&mut self) {
        if let Some(block) = self.current.take()
            && let Some(block) = block.finish(self.blocks.len())
        {
            self.blocks.push(block);
        }
    }

    fn save(&mut self) {
        self.saved.push((self.ctm, self.state.clone()));
    }

    fn restore(&mut self) {
        if let Some((ctm, state)) = self.saved.pop() {
            self.ctm = ctm;
            self.state = state;
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.tlm = self.tlm.translate(tx, ty);
        self.tm = self.tlm;
    }

    /// Horizontal displacement of a shown string, in text space.
    fn advance(&self, font: Option<&PageFont<'_>>, codes: &[u32]) -> f32 {
        let TextState {
            size,
            char_spacing,
            word_spacing,
            horizontal_scale,
            ..
        } = self.state;
        let single_byte = font.is_none_or(|f| f.code_len() == 1);

        codes
            .iter()
            .map(|&code| {
                let w0 = font.map_or(GLYPH_WIDTH_EM * 1000.0, |f| f.width(code)) / 1000.0;
                let spacing = if single_byte && code == 32 {
                    char_spacing + word_spacing
                } else {
                    char_spacing
                };
                (w0 * size + spacing) * horizontal_scale
            })
            .sum()
    }

    fn show(&mut self, bytes: &[u8]) {
        let fonts = self.fonts;
        let font = self.state.font.as_ref().and_then(|f| fonts.get(f));
        let codes = match font {
            Some(font) => font.codes(bytes),
            None => bytes.iter().map(|&b| u32::from(b)).collect(),
        };
        if codes.is_empty() {
            return;
        }

        let size = self.state.size;
        let advance = self.advance(font, &codes);
        let (ascent, descent) = font.map_or((ASCENT_EM, DESCENT_EM), |f| (f.ascent(), f.descent()));

        let trm = self.tm.then(self.ctm);
        let shown = Rect::bounding([
            trm.apply(0.0, -descent * size),
            trm.apply(advance, -descent * size),
            trm.apply(advance, ascent * size),
            trm.apply(0.0, ascent * size),
        ]);
        let (x, y) = trm.apply(0.0, 0.0);
        let (end_x, _) = trm.apply(advance, 0.0);
        let em = size * trm.y_scale();

        let decoded = match font {
            Some(font) => font.decode(bytes),
            None => Some(decode_pdf_string(bytes)),
        };
        let composite = font.is_some_and(|f| f.code_len() == 2);
        let font_name = self.state.font.as_ref().map(|f| String::from_utf8_lossy(f).into_owned());
        let block = self.current.get_or_insert_with(BlockBuilder::default);

        if block.glyphs == 0 {
            block.font = font_name;
            block.font_size = size;
            block.origin = Some((x, y));
        } else if block.last_y.is_some_and(|ly| (y - ly).abs() > 0.3 * em.max(1.0)) {
            block.text.push('\n');
        } else if x > block.last_end_x + WORD_GAP_EM * em && !block.text.ends_with(' ') {
            block.text.push(' ');
        }

        block.composite |= composite;
        if let Some(text) = decoded {
            block.text.push_str(&text);
        }

        block.glyphs += codes.len();
        block.last_y = Some(y);
        block.last_end_x = end_x;
        block.bbox = Some(block.bbox.map_or(shown, |b| b.union(&shown)));

        self.tm = self.tm.translate(advance, 0.0);
    }

    fn operate(&mut self, op: &Operation) {
        let num = |i: usize| op.operands.get(i).and_then(|o| o.as_float().ok());

        match op.operator.as_str() {
            "q" => self.save(),
            "Q" => self.restore(),
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(&op.operands) {
                    self.ctm = matrix.then(self.ctm);
                }
            }
            "BT" => self.begin(),
            "ET" => self.flush(),
            "Tf" => {
                self.state.font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(<[u8]>::to_vec);
                self.state.size = num(1).unwrap_or(self.state.size);
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).map_or(1.0, |percent| percent / 100.0),
            "TL" => self.state.leading = num(0).unwrap_or(self.state.leading),
            "Td" => self.next_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.state.leading = -ty;
                self.next_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(&op.operands) {
                    self.tm = matrix;
                    self.tlm = matrix;
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Ok(adjust) = other.as_float() {
                                    let tx = -adjust / 1000.0
                                        * self.state.size
                                        * self.state.horizontal_scale;
                                    self.tm = self.tm.translate(tx, 0.0);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Scan already-decoded operations.
pub fn scan_operations(
    operations: &[Operation],
    fonts: &BTreeMap<Vec<u8>, PageFont<'_>>,
) -> Vec<TextBlock> {
    let mut scanner = Scanner::new(fonts);
    for op in operations {
        scanner.operate(op);
    }
    scanner.flush();
    scanner.blocks
}
