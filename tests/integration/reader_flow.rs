//! Reader sessions: layout modes, navigation, rendering and extraction.

use pdfdesk::PdfDeskError;
use pdfdesk::document::DocumentSession;
use pdfdesk::layout::{Column, LayoutMode};
use pdfdesk::navigation::NavCommand;
use rstest::rstest;

use crate::common::{Page, Workspace, preview_settings, write_blank, write_pdf};

fn open(ws: &Workspace, pages: usize) -> DocumentSession {
    let path = ws.path("doc.pdf");
    write_blank(&path, pages);
    DocumentSession::open(&path, &preview_settings()).unwrap()
}

#[rstest]
#[case(false, false, LayoutMode::SingleColumn, 5)]
#[case(true, false, LayoutMode::TwoUp, 3)]
#[case(true, true, LayoutMode::FacingCoverRight, 3)]
#[case(false, true, LayoutMode::SingleColumn, 5)]
fn test_layout_modes(
    #[case] two_up: bool,
    #[case] facing: bool,
    #[case] mode: LayoutMode,
    #[case] rows: usize,
) {
    let ws = Workspace::new();
    let mut session = open(&ws, 5);
    session.set_two_up(two_up);
    session.set_facing(facing);

    assert_eq!(session.mode(), mode);
    assert_eq!(session.layout().rows().len(), rows);
    assert_eq!(session.layout().placements().len(), 5);
}

#[test]
fn test_facing_cover_sits_alone_on_the_right() {
    let ws = Workspace::new();
    let mut session = open(&ws, 4);
    session.set_two_up(true);
    session.set_facing(true);

    let layout = session.layout();
    assert_eq!(layout.rows()[0].pages, vec![0]);
    assert_eq!(layout.placement(0).unwrap().column, Column::Right);
    assert_eq!(layout.rows()[1].pages, vec![1, 2]);
    assert_eq!(layout.rows()[2].pages, vec![3]);
    assert_eq!(layout.placement(3).unwrap().column, Column::Left);
}

#[test]
fn test_navigation_stays_in_bounds() {
    let ws = Workspace::new();
    let mut session = open(&ws, 6);

    session.navigate(NavCommand::End).unwrap();
    let end = session.offset();
    assert!(end > 0.0);
    session.navigate(NavCommand::LineDown).unwrap();
    assert_eq!(session.offset(), end);

    session.navigate(NavCommand::Home).unwrap();
    assert_eq!(session.offset(), 0.0);
    session.navigate(NavCommand::Wheel(120)).unwrap();
    assert_eq!(session.offset(), 0.0);
}

#[test]
fn test_jump_and_page_down_align_rows() {
    let ws = Workspace::new();
    let mut session = open(&ws, 6);

    session.navigate(NavCommand::JumpToPage(4)).unwrap();
    assert_eq!(session.current_page(), Some(3));
    assert_eq!(session.page_indicator(), "Page 4 of 6");

    session.navigate(NavCommand::PageDown).unwrap();
    assert_eq!(session.current_page(), Some(4));

    session.navigate(NavCommand::PageUp).unwrap();
    assert_eq!(session.current_page(), Some(3));

    let err = session.navigate(NavCommand::JumpToPage(7)).unwrap_err();
    assert!(matches!(err, PdfDeskError::PageIndex { page: 7, page_count: 6 }));
    assert_eq!(session.current_page(), Some(3));
}

#[test]
fn test_zoom_keeps_reading_position() {
    let ws = Workspace::new();
    let mut session = open(&ws, 8);
    session.navigate(NavCommand::JumpToPage(5)).unwrap();

    session.zoom_in();
    session.zoom_in();
    assert_eq!(session.zoom().percent(), 140);
    assert_eq!(session.current_page(), Some(4));

    session.set_zoom(10.0);
    assert_eq!(session.zoom().percent(), 300);
}

#[test]
fn test_render_cache_reuses_bitmaps() {
    let ws = Workspace::new();
    let mut session = open(&ws, 2);

    let size = session.render_page(0).unwrap().dimensions();
    assert_eq!(size, (612, 792));
    session.render_page(0).unwrap();
    assert_eq!(session.cache().stats(), (1, 1));

    session.set_zoom(0.5);
    assert_eq!(session.render_page(0).unwrap().dimensions(), (306, 396));
    assert_eq!(session.rasterizer_name(), "preview");
}

#[test]
fn test_text_extraction_per_page_and_document() {
    let ws = Workspace::new();
    let path = ws.path("words.pdf");
    write_pdf(
        &path,
        &[Page::letter(&["one two", "three"]), Page::sized(612.0, 792.0)],
    );
    let session = DocumentSession::open(&path, &preview_settings()).unwrap();

    let first = session.page_text(0).unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.stats.words, 3);

    let blank = session.page_text(1).unwrap();
    assert!(blank.text.trim().is_empty());

    let all = session.document_text().unwrap();
    assert_eq!(all.stats.words, 3);
    assert!(all.combined().contains("--- Page 2 ---"));
}
