//! Editing the first text block and saving a copy.

use pdfdesk::PdfDeskError;
use pdfdesk::app::{AppEvent, AppState, EditorEvent, View, dispatch};
use pdfdesk::document::{DocumentSession, StageOutcome};

use crate::common::{Page, Workspace, preview_settings, write_pdf};

#[test]
fn test_replace_and_save_copy() {
    let ws = Workspace::new();
    let source = ws.path("invoice.pdf");
    write_pdf(&source, &[Page::letter(&["Total: 100", "Thank you"])]);
    let before = std::fs::read(&source).unwrap();

    let mut session = DocumentSession::open(&source, &preview_settings()).unwrap();
    assert_eq!(
        session.stage_edit(0, "Total: 250").unwrap(),
        StageOutcome::Staged
    );
    assert!(session.apply_edit(0).unwrap().is_some());
    assert_eq!(session.document().revision(), 1);

    let output = session.suggested_output();
    assert_eq!(output, ws.path("edited_invoice.pdf"));
    session.save_as(&output).unwrap();

    let saved = lopdf::Document::load(&output).unwrap();
    let text = saved.extract_text(&[1]).unwrap();
    assert!(text.contains("Total: 250"));
    assert!(text.contains("Thank you"));
    assert_eq!(std::fs::read(&source).unwrap(), before);
}

#[test]
fn test_source_is_never_overwritten() {
    let ws = Workspace::new();
    let source = ws.path("note.pdf");
    write_pdf(&source, &[Page::letter(&["hi"])]);

    let mut session = DocumentSession::open(&source, &preview_settings()).unwrap();
    session.replace_text(0, "bye").unwrap();

    let err = session.save_as(&source).unwrap_err();
    assert!(matches!(err, PdfDeskError::SourceOverwrite { .. }));
}

#[test]
fn test_blank_page_has_nothing_to_edit() {
    let ws = Workspace::new();
    let source = ws.path("blank.pdf");
    write_pdf(&source, &[Page::sized(612.0, 792.0)]);

    let mut session = DocumentSession::open(&source, &preview_settings()).unwrap();
    let err = session.stage_edit(0, "text").unwrap_err();
    assert!(matches!(err, PdfDeskError::NoTextBlock { page: 1 }));
    assert!(session.pending_edit(0).is_none());
}

#[test]
fn test_editor_view_round() {
    let ws = Workspace::new();
    let source = ws.path("story.pdf");
    write_pdf(
        &source,
        &[Page::letter(&["Once upon"]), Page::letter(&["a time"])],
    );

    let mut state = AppState::new(preview_settings());
    dispatch(&mut state, AppEvent::SwitchView(View::Editor));
    dispatch(&mut state, AppEvent::Editor(EditorEvent::Open(source)));

    let loaded = dispatch(&mut state, AppEvent::Editor(EditorEvent::LoadPage(2)));
    assert_eq!(loaded.message, "Loaded page 2 - 6 characters");

    dispatch(&mut state, AppEvent::Editor(EditorEvent::Stage("long ago".into())));
    let applied = dispatch(&mut state, AppEvent::Editor(EditorEvent::Apply));
    assert_eq!(applied.message, "Changes applied to page 2 - Ready to save");

    let again = dispatch(&mut state, AppEvent::Editor(EditorEvent::Apply));
    assert_eq!(again.message, "No pending changes on page 2");

    let output = ws.path("retold.pdf");
    let saved = dispatch(
        &mut state,
        AppEvent::Editor(EditorEvent::SaveAs(Some(output.clone()))),
    );
    assert_eq!(saved.message, "Saved to: retold.pdf");

    let doc = lopdf::Document::load(&output).unwrap();
    assert!(doc.extract_text(&[2]).unwrap().contains("long ago"));
    assert!(doc.extract_text(&[1]).unwrap().contains("Once upon"));
}
