//! Merging through the file list, the merger and the merger view.

use pdfdesk::PdfDeskError;
use pdfdesk::app::{AppEvent, AppState, MergerEvent, StatusLevel, dispatch};
use pdfdesk::document::PdfDocument;
use pdfdesk::merge::{OrderedFileList, PdfMerger};

use crate::common::{Page, Workspace, page_count, preview_settings, write_blank, write_pdf};

#[test]
fn test_merge_follows_list_order() {
    let ws = Workspace::new();
    let big = ws.path("big.pdf");
    let small = ws.path("small.pdf");
    write_blank(&big, 3);
    write_pdf(&small, &[Page::sized(300.0, 400.0)]);

    let mut list = OrderedFileList::new();
    let report = list.add_all([&big, &small]);
    assert_eq!(report.added, 2);
    assert_eq!(list.move_up(1).unwrap(), 0);

    let output = ws.path("merged.pdf");
    let stats = PdfMerger::new()
        .merge_to_file(&list.paths(), &output)
        .unwrap();

    assert_eq!(stats.files_merged, 2);
    assert_eq!(stats.pages_per_file, vec![1, 3]);
    assert_eq!(stats.total_pages, 4);

    let merged = PdfDocument::open(&output).unwrap();
    assert_eq!(merged.page_count(), 4);
    assert_eq!(merged.page_size(0).unwrap(), (300.0, 400.0));
    assert_eq!(merged.page_size(1).unwrap(), (612.0, 792.0));
}

#[test]
fn test_merge_keeps_page_text() {
    let ws = Workspace::new();
    let a = ws.path("a.pdf");
    let b = ws.path("b.pdf");
    write_pdf(&a, &[Page::letter(&["alpha"])]);
    write_pdf(&b, &[Page::letter(&["beta"]), Page::letter(&["gamma"])]);

    let output = ws.path("ab.pdf");
    PdfMerger::new()
        .merge_to_file(&[a, b], &output)
        .unwrap();

    let doc = lopdf::Document::load(&output).unwrap();
    assert!(doc.extract_text(&[1]).unwrap().contains("alpha"));
    assert!(doc.extract_text(&[3]).unwrap().contains("gamma"));
}

#[test]
fn test_merge_refuses_to_overwrite_input() {
    let ws = Workspace::new();
    let a = ws.path("a.pdf");
    let b = ws.path("b.pdf");
    write_blank(&a, 1);
    write_blank(&b, 1);

    let err = PdfMerger::new()
        .merge_to_file(&[a.clone(), b], &a)
        .unwrap_err();
    assert!(matches!(err, PdfDeskError::SourceOverwrite { .. }));
    assert_eq!(page_count(&a), 1);
}

#[test]
fn test_merge_source_deleted_after_queueing() {
    let ws = Workspace::new();
    let a = ws.path("a.pdf");
    let b = ws.path("b.pdf");
    write_blank(&a, 1);
    write_blank(&b, 1);

    let mut list = OrderedFileList::new();
    list.add_all([&a, &b]);
    std::fs::remove_file(&b).unwrap();

    let output = ws.path("out.pdf");
    let err = PdfMerger::new()
        .merge_to_file(&list.paths(), &output)
        .unwrap_err();
    assert!(matches!(err, PdfDeskError::Io { .. }));
    assert!(!output.exists());
    assert_eq!(list.revalidate(), 1);
    assert!(!list.can_merge());
}

#[test]
fn test_merger_view_reports_failures_as_status() {
    let ws = Workspace::new();
    let a = ws.path("a.pdf");
    let b = ws.path("b.pdf");
    write_blank(&a, 2);
    write_blank(&b, 2);

    let mut state = AppState::new(preview_settings());
    dispatch(&mut state, AppEvent::Merger(MergerEvent::AddFiles(vec![a.clone(), b])));

    let status = dispatch(
        &mut state,
        AppEvent::Merger(MergerEvent::Merge { output: a.clone() }),
    );
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.message.starts_with("Failed to merge PDFs"));
    assert_eq!(state.merger.files.len(), 2);
    assert!(state.merger.last_merge.is_none());

    let output = ws.path("both.pdf");
    let status = dispatch(
        &mut state,
        AppEvent::Merger(MergerEvent::Merge { output: output.clone() }),
    );
    assert_eq!(status.level, StatusLevel::Success);
    assert_eq!(page_count(&output), 4);
    assert_eq!(state.merger.last_merge.as_ref().unwrap().total_pages, 4);
}
