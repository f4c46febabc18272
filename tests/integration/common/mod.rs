//! Fixture PDFs built on the fly with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A page of the given size with one text line per entry in `lines`.
pub struct Page<'a> {
    pub size: (f32, f32),
    pub lines: &'a [&'a str],
}

impl<'a> Page<'a> {
    pub fn letter(lines: &'a [&'a str]) -> Self {
        Self {
            size: (612.0, 792.0),
            lines,
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            size: (width, height),
            lines: &[],
        }
    }
}

fn content(page: &Page<'_>) -> Vec<u8> {
    let mut operations = Vec::new();
    let mut y = page.size.1 - 72.0;
    for line in page.lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![72.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
        y -= 48.0;
    }
    Content { operations }
        .encode()
        .expect("fixture content encodes")
}

/// Write a PDF made of `pages` to `path`.
pub fn write_pdf(path: &Path, pages: &[Page<'_>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|page| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content(page)));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.size.0.into(), page.size.1.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Contents" => content_id,
            });
            page_id.into()
        })
        .collect();

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
    doc.save(path).expect("fixture saves");
}

/// `count` blank letter pages.
pub fn write_blank(path: &Path, count: usize) {
    let pages: Vec<Page<'_>> = (0..count).map(|_| Page::sized(612.0, 792.0)).collect();
    write_pdf(path, &pages);
}

/// A scratch directory plus a helper for paths inside it.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Settings that never try to bind PDFium.
pub fn preview_settings() -> pdfdesk::config::Settings {
    let mut settings = pdfdesk::config::Settings::default();
    settings.render.backend = pdfdesk::config::RenderBackend::Preview;
    settings
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).expect("output loads").get_pages().len()
}
