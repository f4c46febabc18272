//! Font resources of a page: how their strings decode and how wide their
//! glyphs are.
//!
//! Decoding goes through lopdf's font encodings (`/Encoding` names and
//! `/ToUnicode` CMaps). Simple fonts whose `/Encoding` is a dictionary with
//! `/Differences` and no ToUnicode map get a code table built on top of the
//! base encoding. Widths come from `/Widths`, the descendant font's `/W`, or
//! the standard-font AFM tables, in that order.

use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, StringFormat, dictionary};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::debug;

use super::standard_fonts::{is_standard, standard_width};
use crate::utils::resolve;

/// Average glyph advance as a fraction of the font size, used when a font
/// carries no metrics at all.
pub const GLYPH_WIDTH_EM: f32 = 0.5;
const ASCENT_EM: f32 = 0.9;
const DESCENT_EM: f32 = 0.25;
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// How a font resource encodes its strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// One byte per glyph.
    Simple,
    /// Type0: two bytes per glyph, meaning defined by a CMap.
    Composite,
}

#[derive(Debug)]
enum Decoder<'a> {
    Lopdf(Encoding<'a>),
    /// Base encoding with `/Differences` applied, indexed by code.
    Table(Vec<Option<char>>),
}

impl Decoder<'_> {
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Lopdf(encoding) => Document::decode_text(encoding, bytes).ok(),
            Self::Table(table) => Some(
                bytes
                    .iter()
                    .filter_map(|&code| table[usize::from(code)])
                    .collect(),
            ),
        }
    }
}

/// Advance widths in 1/1000 em.
#[derive(Debug, Clone, PartialEq)]
enum Widths {
    Listed {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    Standard(String),
    Cid {
        default: f32,
        ranges: Vec<(RangeInclusive<u32>, f32)>,
    },
    Estimated,
}

/// One entry of a page's `/Font` resources.
#[derive(Debug)]
pub struct PageFont<'a> {
    pub kind: FontKind,
    /// `/BaseFont` without a subset tag.
    pub base_font: Option<String>,
    decoder: Option<Decoder<'a>>,
    widths: Widths,
    /// Glyph-space scale of listed widths; differs from 1 only for Type3.
    width_scale: f32,
    ascent: f32,
    descent: f32,
}

impl<'a> PageFont<'a> {
    /// A one-byte font with no encoding or metrics.
    pub fn simple() -> Self {
        Self::bare(FontKind::Simple)
    }

    /// A Type0 font with no ToUnicode map or metrics.
    pub fn composite() -> Self {
        Self::bare(FontKind::Composite)
    }

    fn bare(kind: FontKind) -> Self {
        Self {
            kind,
            base_font: None,
            decoder: None,
            widths: Widths::Estimated,
            width_scale: 1.0,
            ascent: ASCENT_EM,
            descent: DESCENT_EM,
        }
    }

    /// Read a font dictionary.
    pub fn from_dictionary(doc: &'a Document, font: &'a Dictionary) -> Self {
        let subtype = font.get(b"Subtype").and_then(Object::as_name).ok();
        let kind = if subtype == Some(b"Type0".as_slice()) {
            FontKind::Composite
        } else {
            FontKind::Simple
        };
        let base_font = font
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .ok()
            .map(|name| strip_subset_tag(&String::from_utf8_lossy(name)).to_string());

        let metrics_dict = match kind {
            FontKind::Composite => descendant_font(doc, font).unwrap_or(font),
            FontKind::Simple => font,
        };
        let (ascent, descent) = vertical_metrics(doc, metrics_dict);

        let widths = match kind {
            FontKind::Composite => cid_widths(doc, metrics_dict),
            FontKind::Simple => simple_widths(doc, font, base_font.as_deref()),
        };
        let width_scale = if subtype == Some(b"Type3".as_slice()) {
            type3_scale(doc, font)
        } else {
            1.0
        };

        Self {
            kind,
            base_font,
            decoder: decoder(doc, font, kind),
            widths,
            width_scale,
            ascent,
            descent,
        }
    }

    /// Bytes consumed by one character code.
    pub fn code_len(&self) -> usize {
        match self.kind {
            FontKind::Simple => 1,
            FontKind::Composite => 2,
        }
    }

    /// Character codes of a shown string.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks(self.code_len())
            .map(|chunk| chunk.iter().fold(0_u32, |code, &b| (code << 8) | u32::from(b)))
            .collect()
    }

    /// Unicode text of a shown string. `None` when a composite font has no
    /// usable ToUnicode map.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        if let Some(text) = self.decoder.as_ref().and_then(|d| d.decode(bytes)) {
            return Some(text);
        }
        match self.kind {
            FontKind::Simple => Some(decode_pdf_string(bytes)),
            FontKind::Composite => None,
        }
    }

    /// Advance of `code` in 1/1000 em.
    pub fn width(&self, code: u32) -> f32 {
        let width = match &self.widths {
            Widths::Listed {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|index| widths.get(index as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Standard(name) => u8::try_from(code)
                .ok()
                .and_then(|code| standard_width(name, code))
                .map_or(0.0, f32::from),
            Widths::Cid { default, ranges } => ranges
                .iter()
                .find(|(range, _)| range.contains(&code))
                .map_or(*default, |(_, width)| *width),
            Widths::Estimated => GLYPH_WIDTH_EM * 1000.0,
        };
        width * self.width_scale
    }

    /// Height above the baseline, as a fraction of the font size.
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Depth below the baseline, as a positive fraction of the font size.
    pub fn descent(&self) -> f32 {
        self.descent
    }

    /// Whether real advance widths are known.
    pub fn has_metrics(&self) -> bool {
        self.widths != Widths::Estimated
    }
}

/// Font resources visible to a page, by resource name.
pub fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, PageFont<'_>> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(err) => {
            debug!(?page_id, error = %err, "page fonts unavailable");
            return BTreeMap::new();
        }
    };

    fonts
        .into_iter()
        .map(|(name, font)| (name, PageFont::from_dictionary(doc, font)))
        .collect()
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with a BOM, otherwise
/// PDFDocEncoding.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    lopdf::decode_text_string(&Object::String(bytes.to_vec(), StringFormat::Literal))
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

fn number(doc: &Document, object: &Object) -> Option<f32> {
    resolve(doc, object).and_then(|o| o.as_float().ok())
}

fn dict_at<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    match dict.get(key).ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(found)) => Some(found),
        _ => None,
    }
}

fn array_at<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    match dict.get(key).ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Array(found)) => Some(found),
        _ => None,
    }
}

fn descendant_font<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    match array_at(doc, font, b"DescendantFonts")?.first().and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(descendant)) => Some(descendant),
        _ => None,
    }
}

fn vertical_metrics(doc: &Document, font: &Dictionary) -> (f32, f32) {
    let Some(descriptor) = dict_at(doc, font, b"FontDescriptor") else {
        return (ASCENT_EM, DESCENT_EM);
    };
    let read = |key: &[u8]| {
        descriptor
            .get(key)
            .ok()
            .and_then(|o| number(doc, o))
            .filter(|v| *v != 0.0)
            .map(|v| v.abs() / 1000.0)
    };
    (
        read(b"Ascent").unwrap_or(ASCENT_EM),
        read(b"Descent").unwrap_or(DESCENT_EM),
    )
}

fn simple_widths(doc: &Document, font: &Dictionary, base_font: Option<&str>) -> Widths {
    if let Some(listed) = array_at(doc, font, b"Widths") {
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| number(doc, o))
            .map_or(0, |v| v as u32);
        let missing = dict_at(doc, font, b"FontDescriptor")
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| number(doc, o))
            .unwrap_or(0.0);
        return Widths::Listed {
            first_char,
            widths: listed.iter().map(|o| number(doc, o).unwrap_or(missing)).collect(),
            missing,
        };
    }

    match base_font {
        Some(name) if is_standard(name) => Widths::Standard(name.to_string()),
        _ => Widths::Estimated,
    }
}

/// `/DW` and `/W` of a CID font.
fn cid_widths(doc: &Document, descendant: &Dictionary) -> Widths {
    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(|o| number(doc, o))
        .unwrap_or(DEFAULT_CID_WIDTH);
    let mut ranges = Vec::new();

    // Entries are `c [w1 w2 …]` or `c_first c_last w`.
    let items: Vec<&Object> = array_at(doc, descendant, b"W")
        .map(|w| w.iter().filter_map(|o| resolve(doc, o)).collect())
        .unwrap_or_default();
    let mut items = items.into_iter();
    while let Some(first) = items.next() {
        let Ok(start) = first.as_i64() else { break };
        let start = start.max(0) as u32;
        match items.next() {
            Some(Object::Array(listed)) => {
                for (offset, width) in listed.iter().enumerate() {
                    if let Some(width) = number(doc, width) {
                        let cid = start + offset as u32;
                        ranges.push((cid..=cid, width));
                    }
                }
            }
            Some(last) => {
                let (Ok(last), Some(width)) = (last.as_i64(), items.next().and_then(|o| o.as_float().ok()))
                else {
                    break;
                };
                ranges.push((start..=last.max(0) as u32, width));
            }
            None => break,
        }
    }

    Widths::Cid { default, ranges }
}

/// Type3 widths are in glyph space; `/FontMatrix` maps them to text space.
fn type3_scale(doc: &Document, font: &Dictionary) -> f32 {
    array_at(doc, font, b"FontMatrix")
        .and_then(|m| m.first())
        .and_then(|o| number(doc, o))
        .map_or(1.0, |a| a * 1000.0)
}

fn decoder<'a>(doc: &'a Document, font: &'a Dictionary, kind: FontKind) -> Option<Decoder<'a>> {
    let encoding = font.get(b"Encoding").ok().and_then(|o| resolve(doc, o));
    if kind == FontKind::Simple
        && !font.has(b"ToUnicode")
        && let Some(Object::Dictionary(encoding)) = encoding
    {
        return Some(Decoder::Table(differences_table(doc, encoding)));
    }

    match font.get_font_encoding(doc) {
        Ok(encoding) => Some(Decoder::Lopdf(encoding)),
        Err(err) => {
            debug!(error = %err, "font encoding unavailable");
            None
        }
    }
}

/// Codes of the `/BaseEncoding`, overridden by `/Differences`.
fn differences_table(doc: &Document, encoding: &Dictionary) -> Vec<Option<char>> {
    let base = encoding
        .get(b"BaseEncoding")
        .and_then(Object::as_name)
        .unwrap_or(b"StandardEncoding".as_slice())
        .to_vec();
    let base_font = dictionary! {
        "Type" => "Font",
        "Encoding" => Object::Name(base),
    };

    let mut table = match base_font.get_font_encoding(doc) {
        Ok(base) => (0..=255_u8)
            .map(|code| {
                Document::decode_text(&base, &[code])
                    .ok()
                    .and_then(|s| s.chars().next())
            })
            .collect(),
        Err(_) => vec![None; 256],
    };

    let Some(differences) = array_at(doc, encoding, b"Differences") else {
        return table;
    };
    let mut code = 0_usize;
    for item in differences {
        match resolve(doc, item) {
            Some(Object::Integer(start)) => code = (*start).clamp(0, 255) as usize,
            Some(Object::Name(glyph)) => {
                if let Some(slot) = table.get_mut(code) {
                    *slot = glyph_char(glyph);
                }
                code += 1;
            }
            _ => {}
        }
    }
    table
}

/// Unicode character for an Adobe glyph name.
pub fn glyph_char(name: &[u8]) -> Option<char> {
    let name = std::str::from_utf8(name).ok()?;
    let name = name.split_once('.').map_or(name, |(base, _)| base);

    if let Some(hex) = name.strip_prefix("uni").filter(|h| h.len() == 4) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(hex) = name
        .strip_prefix('u')
        .filter(|h| (4..=6).contains(&h.len()) && h.bytes().all(|b| b.is_ascii_hexdigit()))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next())
        && c.is_ascii_alphabetic()
    {
        return Some(c);
    }

    GLYPH_NAMES
        .binary_search_by_key(&name, |&(glyph, _)| glyph)
        .ok()
        .map(|index| GLYPH_NAMES[index].1)
}

/// Common Adobe glyph names, sorted by name.
const GLYPH_NAMES: &[(&str, char)] = &[
    ("AE", 'Æ'),
    ("Aacute", 'Á'),
    ("Acircumflex", 'Â'),
    ("Adieresis", 'Ä'),
    ("Agrave", 'À'),
    ("Aring", 'Å'),
    ("Atilde", 'Ã'),
    ("Ccedilla", 'Ç'),
    ("Eacute", 'É'),
    ("Ecircumflex", 'Ê'),
    ("Edieresis", 'Ë'),
    ("Egrave", 'È'),
    ("Euro", '€'),
    ("Iacute", 'Í'),
    ("Ntilde", 'Ñ'),
    ("OE", 'Œ'),
    ("Oacute", 'Ó'),
    ("Odieresis", 'Ö'),
    ("Oslash", 'Ø'),
    ("Uacute", 'Ú'),
    ("Udieresis", 'Ü'),
    ("aacute", 'á'),
    ("acircumflex", 'â'),
    ("adieresis", 'ä'),
    ("ae", 'æ'),
    ("agrave", 'à'),
    ("ampersand", '&'),
    ("aring", 'å'),
    ("asciicircum", '^'),
    ("asciitilde", '~'),
    ("asterisk", '*'),
    ("at", '@'),
    ("atilde", 'ã'),
    ("backslash", '\\'),
    ("bar", '|'),
    ("braceleft", '{'),
    ("braceright", '}'),
    ("bracketleft", '['),
    ("bracketright", ']'),
    ("bullet", '•'),
    ("ccedilla", 'ç'),
    ("colon", ':'),
    ("comma", ','),
    ("copyright", '©'),
    ("dagger", '†'),
    ("degree", '°'),
    ("dollar", '$'),
    ("eacute", 'é'),
    ("ecircumflex", 'ê'),
    ("edieresis", 'ë'),
    ("egrave", 'è'),
    ("eight", '8'),
    ("ellipsis", '…'),
    ("emdash", '—'),
    ("endash", '–'),
    ("equal", '='),
    ("exclam", '!'),
    ("ff", 'ﬀ'),
    ("ffi", 'ﬃ'),
    ("ffl", 'ﬄ'),
    ("fi", 'ﬁ'),
    ("five", '5'),
    ("fl", 'ﬂ'),
    ("four", '4'),
    ("germandbls", 'ß'),
    ("grave", '`'),
    ("greater", '>'),
    ("guillemotleft", '«'),
    ("guillemotright", '»'),
    ("hyphen", '-'),
    ("iacute", 'í'),
    ("icircumflex", 'î'),
    ("idieresis", 'ï'),
    ("less", '<'),
    ("minus", '−'),
    ("nbspace", '\u{A0}'),
    ("nine", '9'),
    ("ntilde", 'ñ'),
    ("numbersign", '#'),
    ("oacute", 'ó'),
    ("ocircumflex", 'ô'),
    ("odieresis", 'ö'),
    ("oe", 'œ'),
    ("one", '1'),
    ("oslash", 'ø'),
    ("paragraph", '¶'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("percent", '%'),
    ("period", '.'),
    ("periodcentered", '·'),
    ("plus", '+'),
    ("question", '?'),
    ("quotedbl", '"'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesingle", '\''),
    ("registered", '®'),
    ("section", '§'),
    ("semicolon", ';'),
    ("seven", '7'),
    ("six", '6'),
    ("slash", '/'),
    ("space", ' '),
    ("sterling", '£'),
    ("three", '3'),
    ("trademark", '™'),
    ("two", '2'),
    ("uacute", 'ú'),
    ("udieresis", 'ü'),
    ("underscore", '_'),
    ("zero", '0'),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{HI_TO_UNICODE, build_page_with};
    use lopdf::Stream;
    use rstest::rstest;

    fn font<'a>(doc: &'a Document, name: &[u8]) -> PageFont<'a> {
        let page_id = doc.get_pages()[&1];
        page_fonts(doc, page_id).remove(name).unwrap()
    }

    #[rstest]
    #[case(b"A".as_slice(), Some('A'))]
    #[case(b"quoteright".as_slice(), Some('\u{2019}'))]
    #[case(b"uni20AC".as_slice(), Some('€'))]
    #[case(b"u1F600".as_slice(), Some('😀'))]
    #[case(b"fi".as_slice(), Some('ﬁ'))]
    #[case(b"a.sc".as_slice(), Some('a'))]
    #[case(b"g123".as_slice(), None)]
    fn test_glyph_char(#[case] name: &[u8], #[case] expected: Option<char>) {
        assert_eq!(glyph_char(name), expected);
    }

    #[test]
    fn test_glyph_names_sorted() {
        assert!(GLYPH_NAMES.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[rstest]
    #[case("ABCDEF+Calibri", "Calibri")]
    #[case("Helvetica", "Helvetica")]
    #[case("abc+Odd", "abc+Odd")]
    fn test_strip_subset_tag(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(strip_subset_tag(name), expected);
    }

    #[test]
    fn test_to_unicode_map_decodes_subset_truetype() {
        let mut doc = Document::with_version("1.5");
        let cmap = doc.add_object(Stream::new(dictionary! {}, HI_TO_UNICODE.to_vec()));
        let doc = build_page_with(
            doc,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => "ABCDEF+Calibri",
                "FirstChar" => 1,
                "LastChar" => 2,
                "Widths" => vec![600.into(), 500.into()],
                "ToUnicode" => cmap,
            },
            b"BT /T1 12 Tf 72 700 Td <0102> Tj ET".to_vec(),
        );

        let font = font(&doc, b"T1");
        assert_eq!(font.base_font.as_deref(), Some("Calibri"));
        assert_eq!(font.decode(&[1, 2]).as_deref(), Some("Hi"));
        assert_eq!(font.width(1), 600.0);
        assert_eq!(font.width(2), 500.0);
        assert_eq!(font.width(3), 0.0);
    }

    #[test]
    fn test_differences_override_base_encoding() {
        let doc = build_page_with(
            Document::with_version("1.5"),
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => dictionary! {
                    "Type" => "Encoding",
                    "BaseEncoding" => "WinAnsiEncoding",
                    "Differences" => vec![1.into(), "H".into(), "i".into(), 65.into(), "quoteright".into()],
                },
            },
            b"BT /T1 12 Tf (x) Tj ET".to_vec(),
        );

        let font = font(&doc, b"T1");
        assert_eq!(font.decode(&[1, 2, b' ', 0x41, b's']).as_deref(), Some("Hi \u{2019}s"));
        assert_eq!(font.decode(b"caf\xe9").as_deref(), Some("café"));
    }

    #[test]
    fn test_standard_font_widths_without_widths_array() {
        let doc = build_page_with(
            Document::with_version("1.5"),
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
            b"BT /T1 12 Tf (W) Tj ET".to_vec(),
        );

        let font = font(&doc, b"T1");
        assert!(font.has_metrics());
        assert_eq!(font.width(u32::from(b'W')), 944.0);
        assert_eq!(font.decode(b"\x93ok\x94").as_deref(), Some("\u{201C}ok\u{201D}"));
    }

    #[test]
    fn test_cid_widths_and_missing_to_unicode() {
        let mut doc = Document::with_version("1.5");
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "NotoSansCJK",
            "DW" => 900,
            "W" => vec![
                1.into(), Object::Array(vec![400.into(), 450.into()]),
                10.into(), 20.into(), 300.into(),
            ],
        });
        let doc = build_page_with(
            doc,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "NotoSansCJK",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![descendant.into()],
            },
            b"BT /T1 12 Tf <00010002> Tj ET".to_vec(),
        );

        let font = font(&doc, b"T1");
        assert_eq!(font.kind, FontKind::Composite);
        assert_eq!(font.codes(&[0, 1, 0, 2]), vec![1, 2]);
        assert_eq!(font.width(1), 400.0);
        assert_eq!(font.width(2), 450.0);
        assert_eq!(font.width(15), 300.0);
        assert_eq!(font.width(99), 900.0);
        assert!(font.decode(&[0, 1]).is_none());
    }

    #[test]
    fn test_bare_fonts_estimate() {
        assert!(!PageFont::simple().has_metrics());
        assert_eq!(PageFont::simple().width(65), GLYPH_WIDTH_EM * 1000.0);
        assert_eq!(PageFont::simple().decode(b"plain").as_deref(), Some("plain"));
        assert_eq!(
            PageFont::simple().decode(&[0xFE, 0xFF, 0x00, 0x48, 0x03, 0xA9]).as_deref(),
            Some("HΩ")
        );
        assert!(PageFont::composite().decode(&[0, 1]).is_none());
    }
}
