//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::path::Path;

/// One fixture page.
#[derive(Debug, Clone)]
pub(crate) struct FixturePage {
    pub width: f32,
    pub height: f32,
    /// Each entry becomes its own `BT … ET` block, top to bottom.
    pub blocks: Vec<String>,
    /// Draw a filled rectangle and nothing else.
    pub graphics_only: bool,
}

impl FixturePage {
    pub fn blank(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
            graphics_only: false,
        }
    }

    pub fn text(blocks: &[&str]) -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            graphics_only: false,
        }
    }

    pub fn graphics() -> Self {
        Self {
            graphics_only: true,
            ..Self::blank(612.0, 792.0)
        }
    }
}

fn page_content(page: &FixturePage) -> Vec<u8> {
    let mut operations = Vec::new();

    if page.graphics_only {
        operations.push(Operation::new("rg", vec![0.2.into(), 0.4.into(), 0.8.into()]));
        operations.push(Operation::new(
            "re",
            vec![72.into(), 72.into(), 200.into(), 300.into()],
        ));
        operations.push(Operation::new("f", vec![]));
    }

    let mut y = page.height - 72.0;
    for block in &page.blocks {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![72.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(block.as_str())]));
        operations.push(Operation::new("ET", vec![]));
        y -= 48.0;
    }

    Content { operations }.encode().unwrap()
}

/// Build a document from page specs.
pub(crate) fn build_pages(pages: &[FixturePage]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(page)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Blank pages of the given `(width, height)` sizes.
pub(crate) fn build_document(sizes: &[(f32, f32)]) -> Document {
    let pages: Vec<FixturePage> = sizes
        .iter()
        .map(|&(w, h)| FixturePage::blank(w, h))
        .collect();
    build_pages(&pages)
}

/// Save fixture pages to `path`.
pub(crate) fn write_pages(path: &Path, pages: &[FixturePage]) {
    let mut doc = build_pages(pages);
    doc.save(path).unwrap();
}

/// Save blank pages of the given sizes to `path`.
pub(crate) fn write_pdf(path: &Path, sizes: &[(f32, f32)]) {
    let mut doc = build_document(sizes);
    doc.save(path).unwrap();
}

/// One Letter page showing `content` with `font` registered as `/T1`.
///
/// `doc` may already hold objects the font refers to.
pub(crate) fn build_page_with(mut doc: Document, font: Dictionary, content: Vec<u8>) -> Document {
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! { "Font" => dictionary! { "T1" => font_id } },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// ToUnicode CMap mapping code 1 to `H` and code 2 to `i`.
pub(crate) const HI_TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<00> <FF>
endcodespacerange
2 beginbfchar
<01> <0048>
<02> <0069>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";
