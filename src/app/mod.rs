//! Application state and event dispatch.
//!
//! A front end owns one [`AppState`] and feeds it [`AppEvent`]s. Each event
//! is handled by [`dispatch`], which returns a [`Status`] for the status bar.
//! Failures never escape as errors: they come back as `Warning`/`Error`
//! statuses and the state is left as it was before the event.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::document::{DocumentSession, StageOutcome, page_from_number};
use crate::error::PdfDeskError;
use crate::merge::{MergeStats, OrderedFileList, PdfMerger};
use crate::navigation::NavCommand;

/// The three top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Merger,
    Reader,
    Editor,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merger => "PDF Merger",
            Self::Reader => "PDF Reader",
            Self::Editor => "PDF Editor",
        })
    }
}

/// Severity of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Outcome of one event, worded for a status bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
    /// Long output such as extracted text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }

    fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.level, StatusLevel::Warning | StatusLevel::Error)
    }

    /// Report an error: recoverable ones as warnings, the rest as errors.
    fn from_error(context: &str, err: &PdfDeskError) -> Self {
        let message = format!("{context}: {err}");
        if err.is_recoverable() {
            Self::warning(message)
        } else {
            Self::error(message)
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergerEvent {
    AddFiles(Vec<PathBuf>),
    /// 0-based list index.
    Remove(usize),
    MoveUp(usize),
    MoveDown(usize),
    ClearAll,
    Merge { output: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    Open(PathBuf),
    Close,
    ZoomIn,
    ZoomOut,
    SetZoom(f32),
    ToggleTwoUp,
    SetFacing(bool),
    Navigate(NavCommand),
    Resize(f32),
    /// 1-based page, or the whole document.
    ExtractText { page: Option<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Open(PathBuf),
    /// 1-based page.
    LoadPage(usize),
    /// Replacement text for the loaded page.
    Stage(String),
    Apply,
    /// Drop the loaded page's staged replacement.
    Discard,
    /// Destination, or `edited_<stem>.pdf` beside the source.
    SaveAs(Option<PathBuf>),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SwitchView(View),
    Merger(MergerEvent),
    Reader(ReaderEvent),
    Editor(EditorEvent),
}

/// The merger view: the ordered list and the last merge result.
#[derive(Debug, Clone, Default)]
pub struct MergerState {
    pub files: OrderedFileList,
    pub merger: PdfMerger,
    pub last_merge: Option<MergeStats>,
}

/// The editor view: a session plus the page being edited.
#[derive(Debug)]
pub struct EditorState {
    pub session: DocumentSession,
    /// 0-based page.
    pub page: usize,
    /// Text shown for `page` when it was loaded.
    pub loaded_text: String,
}

/// Everything a front end needs to draw.
#[derive(Debug, Default)]
pub struct AppState {
    pub view: View,
    pub merger: MergerState,
    pub reader: Option<DocumentSession>,
    pub editor: Option<EditorState>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Move to `view`. Sessions of other views stay open.
    pub fn switch_to(self, view: View) -> Self {
        Self { view, ..self }
    }
}

/// Handle one event.
pub fn dispatch(state: &mut AppState, event: AppEvent) -> Status {
    debug!(?event, view = ?state.view, "dispatch");
    let status = match event {
        AppEvent::SwitchView(view) => {
            let current = std::mem::take(state);
            *state = current.switch_to(view);
            Status::info(view.to_string())
        }
        AppEvent::Merger(event) => merger_event(&mut state.merger, event),
        AppEvent::Reader(event) => reader_event(state, event),
        AppEvent::Editor(event) => editor_event(state, event),
    };
    if status.is_failure() {
        warn!(message = %status.message, "event failed");
    }
    status
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn merger_event(merger: &mut MergerState, event: MergerEvent) -> Status {
    let files = &mut merger.files;
    match event {
        MergerEvent::AddFiles(paths) => {
            let report = files.add_all(&paths);
            let skipped: Vec<String> = report
                .skipped
                .iter()
                .map(|(path, _)| file_name(path))
                .collect();

            match (report.added, skipped.is_empty()) {
                (0, true) => Status::info("No files selected"),
                (added, true) => Status::success(format!("Added {added} file(s)")),
                (0, false) => Status::warning(format!(
                    "Skipped: {} (Not a valid PDF)",
                    skipped.join(", ")
                )),
                (added, false) => Status::warning(format!(
                    "Added {added} file(s); skipped: {} (Not a valid PDF)",
                    skipped.join(", ")
                )),
            }
        }
        MergerEvent::Remove(index) => match files.remove(index) {
            Ok(_) => Status::info("File removed"),
            Err(err) => Status::from_error("Cannot remove", &err),
        },
        MergerEvent::MoveUp(index) => match files.move_up(index) {
            Ok(new) if new != index => Status::info("File moved up"),
            Ok(_) => Status::info("File is already first"),
            Err(err) => Status::from_error("Cannot move", &err),
        },
        MergerEvent::MoveDown(index) => match files.move_down(index) {
            Ok(new) if new != index => Status::info("File moved down"),
            Ok(_) => Status::info("File is already last"),
            Err(err) => Status::from_error("Cannot move", &err),
        },
        MergerEvent::ClearAll => {
            files.clear();
            Status::info("All files removed")
        }
        MergerEvent::Merge { output } => {
            if files.len() < 2 {
                return Status::warning("Please add at least 2 PDF files to merge.");
            }
            match merger.merger.merge_to_file(&files.paths(), &output) {
                Ok(stats) => {
                    let status = Status::success(format!(
                        "Success! Merged {} files ({} pages)",
                        stats.files_merged, stats.total_pages
                    ))
                    .with_detail(format!("Saved to: {}", file_name(&output)));
                    merger.last_merge = Some(stats);
                    status
                }
                Err(err) => Status::error(format!("Failed to merge PDFs: {err}")),
            }
        }
    }
}

fn reader_event(state: &mut AppState, event: ReaderEvent) -> Status {
    if let ReaderEvent::Open(path) = &event {
        return match DocumentSession::open(path, &state.settings) {
            Ok(session) => {
                let status = Status::success(format!(
                    "Opened: {} - {} pages",
                    file_name(path),
                    session.page_count()
                ));
                state.reader = Some(session);
                status
            }
            Err(err) => Status::from_error("Failed to open PDF", &err),
        };
    }

    let Some(session) = state.reader.as_mut() else {
        return Status::warning("Please open a PDF first.");
    };

    match event {
        ReaderEvent::Open(_) => Status::info("Open a PDF to begin"),
        ReaderEvent::Close => {
            let name = session.document().file_name();
            state.reader = None;
            Status::info(format!("Closed {name}"))
        }
        ReaderEvent::ZoomIn => Status::info(format!("Zoom: {}", session.zoom_in())),
        ReaderEvent::ZoomOut => Status::info(format!("Zoom: {}", session.zoom_out())),
        ReaderEvent::SetZoom(value) => Status::info(format!("Zoom: {}", session.set_zoom(value))),
        ReaderEvent::ToggleTwoUp => Status::info(format!("Layout: {}", session.toggle_two_up())),
        ReaderEvent::SetFacing(on) => {
            let mode = session.set_facing(on);
            if on && !session.flags().two_up() {
                Status::info(format!("Layout: {mode} (facing applies in two-up view)"))
            } else {
                Status::info(format!("Layout: {mode}"))
            }
        }
        ReaderEvent::Navigate(command) => match session.navigate(command) {
            Ok(_) => Status::info(session.page_indicator()),
            Err(PdfDeskError::PageIndex { page_count, .. }) => Status::warning(format!(
                "Please enter a page number between 1 and {page_count}"
            )),
            Err(err) => Status::from_error("Navigation failed", &err),
        },
        ReaderEvent::Resize(height) => {
            session.resize(height);
            Status::info(session.page_indicator())
        }
        ReaderEvent::ExtractText { page: Some(number) } => {
            let text = page_from_number(number, session.page_count())
                .and_then(|page| session.page_text(page));
            match text {
                Ok(page) if page.text.trim().is_empty() => {
                    Status::info(format!("No text found on page {number}."))
                }
                Ok(page) => Status::success(format!(
                    "Page {number}: {} words, {} characters",
                    page.stats.words, page.stats.characters
                ))
                .with_detail(page.text),
                Err(err) => Status::from_error("Failed to extract text", &err),
            }
        }
        ReaderEvent::ExtractText { page: None } => match session.document_text() {
            Ok(text) if text.pages.iter().all(|p| p.text.trim().is_empty()) => {
                Status::info("No text found in the PDF.")
            }
            Ok(text) => Status::success(format!(
                "Words: {} | Characters: {}",
                text.stats.words, text.stats.characters
            ))
            .with_detail(text.combined()),
            Err(err) => Status::from_error("Failed to extract text", &err),
        },
    }
}

fn editor_event(state: &mut AppState, event: EditorEvent) -> Status {
    if let EditorEvent::Open(path) = &event {
        let session = match DocumentSession::open(path, &state.settings) {
            Ok(session) => session,
            Err(err) => return Status::from_error("Failed to open PDF", &err),
        };
        let loaded_text = match session.page_text(0) {
            Ok(page) => page.text,
            Err(err) => return Status::from_error("Failed to load page", &err),
        };
        state.editor = Some(EditorState {
            session,
            page: 0,
            loaded_text,
        });
        return Status::success(format!("Editing: {}", file_name(path)));
    }

    let Some(editor) = state.editor.as_mut() else {
        return Status::warning("No PDF is open for editing.");
    };

    match event {
        EditorEvent::Open(_) => Status::info("No PDF loaded"),
        EditorEvent::LoadPage(number) => {
            let count = editor.session.page_count();
            let page = match page_from_number(number, count) {
                Ok(page) => page,
                Err(_) => return Status::warning(format!("Page must be between 1 and {count}")),
            };
            match editor.session.page_text(page) {
                Ok(text) => {
                    editor.session.discard_edits_except(page);
                    editor.page = page;
                    editor.loaded_text = text.text;
                    Status::info(format!(
                        "Loaded page {number} - {} characters",
                        editor.loaded_text.chars().count()
                    ))
                }
                Err(err) => Status::from_error("Failed to load page", &err),
            }
        }
        EditorEvent::Stage(text) => {
            if text.trim_end() == editor.loaded_text.trim_end() {
                return Status::info("No Changes: The text hasn't been modified.");
            }
            match editor.session.stage_edit(editor.page, &text) {
                Ok(StageOutcome::Staged) => {
                    Status::info(format!("Edit staged for page {}", editor.page + 1))
                }
                Ok(StageOutcome::Unchanged) => {
                    Status::info("No Changes: The text hasn't been modified.")
                }
                Err(PdfDeskError::NoTextBlock { .. }) => {
                    Status::warning("No text found on this page to edit.")
                }
                Err(err) => Status::from_error("Failed to apply changes", &err),
            }
        }
        EditorEvent::Apply => {
            let page = editor.page;
            match editor.session.apply_edit(page) {
                Ok(Some(_)) => {
                    if let Ok(text) = editor.session.page_text(page) {
                        editor.loaded_text = text.text;
                    }
                    Status::success(format!(
                        "Changes applied to page {} - Ready to save",
                        page + 1
                    ))
                }
                Ok(None) => Status::info(format!("No pending changes on page {}", page + 1)),
                Err(err) => Status::from_error("Failed to apply changes", &err),
            }
        }
        EditorEvent::Discard => match editor.session.discard_edit(editor.page) {
            Some(_) => Status::info(format!("Discarded pending changes on page {}", editor.page + 1)),
            None => Status::info(format!("No pending changes on page {}", editor.page + 1)),
        },
        EditorEvent::SaveAs(output) => {
            let output = output.unwrap_or_else(|| editor.session.suggested_output());
            match editor.session.save_as(&output) {
                Ok(_) => Status::success(format!("Saved to: {}", file_name(&output))),
                Err(err) => Status::from_error("Failed to save PDF", &err),
            }
        }
        EditorEvent::Close => {
            let name = editor.session.document().file_name();
            state.editor = None;
            Status::info(format!("Closed {name}"))
        }
    }
}
