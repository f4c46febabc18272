//! Subcommand implementations.
//!
//! Each handler opens what it needs, does one job and reports through the
//! [`OutputFormatter`]. Errors propagate so the binary can map them to an
//! exit code; interactive-style replays (`view`) go through [`dispatch`] and
//! report failures as status lines instead.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::{AppEvent, AppState, ReaderEvent, View, dispatch};
use crate::cli::{Command, ViewArgs};
use crate::config::Settings;
use crate::document::{DocumentSession, StageOutcome, page_from_number};
use crate::error::{PdfDeskError, Result};
use crate::io::format_file_size;
use crate::merge::{OrderedFileList, PdfMerger};
use crate::navigation::NavCommand;
use crate::output::{OutputFormatter, display_layout, display_validation_summary};
use crate::render::save_png;
use crate::utils::collect_paths_for_patterns;
use crate::validation::Validator;

/// Run one parsed subcommand.
pub fn execute(command: Command, settings: &Settings, out: &OutputFormatter) -> Result<()> {
    match command {
        Command::Merge {
            inputs,
            output,
            json,
        } => merge(&inputs, &output, json, out),
        Command::Info { files, json } => info(&files, json, out),
        Command::Text { file, page, json } => text(&file, page, json, settings, out),
        Command::Edit {
            file,
            page,
            text,
            output,
        } => edit(&file, page, &text, output, settings, out),
        Command::Render {
            file,
            page,
            zoom,
            output,
        } => render(&file, page, zoom, &output, settings, out),
        Command::Layout { file, view, json } => layout(&file, view, json, settings, out),
        Command::View {
            file, view, keys, ..
        } => replay(&file, view, &keys, settings, out),
    }
}

fn emit<T: Serialize>(out: &OutputFormatter, value: &T) -> Result<()> {
    out.json(value)
        .map_err(|e| PdfDeskError::io("<stdout>", e.into()))
}

pub fn merge(inputs: &[String], output: &Path, json: bool, out: &OutputFormatter) -> Result<()> {
    let paths = collect_paths_for_patterns(inputs)?;
    out.info(&format!("Merging {} PDF files...", paths.len()));

    let mut files = OrderedFileList::new();
    let report = files.add_all(&paths);
    for (path, err) in &report.skipped {
        out.warning(&format!("Skipped {}: {err}", path.display()));
    }
    for (i, file) in files.iter().enumerate() {
        out.list_item(i + 1, &format!("{} ({} pages)", file.display_name(), file.page_count));
    }

    if !files.can_merge() {
        return Err(PdfDeskError::merge(format!(
            "Please add at least 2 PDF files to merge (got {} valid)",
            files.len()
        )));
    }

    let stats = PdfMerger::new().merge_to_file(&files.paths(), output)?;
    info!(files = stats.files_merged, pages = stats.total_pages, "merge finished");

    if json {
        return emit(out, &stats);
    }
    out.success(&format!(
        "Success! Merged {} files ({} pages)",
        stats.files_merged, stats.total_pages
    ));
    out.info(&format!(
        "Saved to: {} ({})",
        output.display(),
        format_file_size(stats.bytes_written)
    ));
    out.detail("Duration", &format!("{:?}", stats.duration));
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoReport<'a> {
    accepted: &'a [crate::validation::ValidatedPdf],
    rejected: Vec<RejectedEntry>,
    total_pages: usize,
    total_size: u64,
}

#[derive(Serialize)]
struct RejectedEntry {
    path: PathBuf,
    error: String,
}

pub fn info(files: &[PathBuf], json: bool, out: &OutputFormatter) -> Result<()> {
    let summary = Validator::new().validate_many(files);

    if json {
        emit(
            out,
            &InfoReport {
                accepted: &summary.accepted,
                rejected: summary
                    .rejected
                    .iter()
                    .map(|r| RejectedEntry {
                        path: r.path.clone(),
                        error: r.error.to_string(),
                    })
                    .collect(),
                total_pages: summary.total_pages,
                total_size: summary.total_size,
            },
        )?;
    } else {
        display_validation_summary(out, &summary);
    }

    match summary.rejected.into_iter().next() {
        Some(rejected) => Err(rejected.error),
        None => Ok(()),
    }
}

pub fn text(
    file: &Path,
    page: Option<usize>,
    json: bool,
    settings: &Settings,
    out: &OutputFormatter,
) -> Result<()> {
    let session = DocumentSession::open(file, settings)?;
    let page = page
        .map(|number| page_from_number(number, session.page_count()).map(|_| number))
        .transpose()?;

    if json {
        return match page {
            Some(number) => emit(out, &session.page_text(number - 1)?),
            None => emit(out, &session.document_text()?),
        };
    }

    let mut state = AppState::new(settings.clone()).switch_to(View::Reader);
    state.reader = Some(session);
    let status = dispatch(&mut state, AppEvent::Reader(ReaderEvent::ExtractText { page }));
    out.status(&status);
    Ok(())
}

pub fn edit(
    file: &Path,
    page: usize,
    replacement: &str,
    output: Option<PathBuf>,
    settings: &Settings,
    out: &OutputFormatter,
) -> Result<()> {
    let mut session = DocumentSession::open(file, settings)?;
    let index = page_from_number(page, session.page_count())?;
    let replacement = replacement.replace("\\n", "\n");

    if session.stage_edit(index, &replacement)? == StageOutcome::Unchanged {
        out.warning("No Changes: The text hasn't been modified.");
        return Ok(());
    }
    if let Some(edit) = session.pending_edit(index) {
        out.detail("Replacing", edit.target.text.trim_end());
    }
    session.apply_edit(index)?;
    out.success(&format!("Changes applied to page {page}"));

    let output = output.unwrap_or_else(|| session.suggested_output());
    let stats = session.save_as(&output)?;
    out.success(&format!(
        "Saved to: {} ({})",
        output.display(),
        format_file_size(stats.file_size)
    ));
    Ok(())
}

pub fn render(
    file: &Path,
    page: usize,
    zoom: Option<f32>,
    output: &Path,
    settings: &Settings,
    out: &OutputFormatter,
) -> Result<()> {
    let mut session = DocumentSession::open(file, settings)?;
    let index = page_from_number(page, session.page_count())?;
    let zoom = match zoom {
        Some(value) => session.set_zoom(value),
        None => session.zoom(),
    };
    let backend = session.rasterizer_name().to_string();
    debug!(page, %zoom, %backend, "rendering");

    let image = session.render_page(index)?;
    let (width, height) = image.dimensions();
    save_png(image, output)?;

    out.success(&format!(
        "Rendered page {page} at {zoom} ({width} × {height} px) to {}",
        output.display()
    ));
    out.detail("Backend", &backend);
    Ok(())
}

fn apply_view(session: &mut DocumentSession, view: ViewArgs) {
    session.set_two_up(view.two_up);
    session.set_facing(view.facing);
    if let Some(zoom) = view.zoom {
        session.set_zoom(zoom);
    }
}

pub fn layout(
    file: &Path,
    view: ViewArgs,
    json: bool,
    settings: &Settings,
    out: &OutputFormatter,
) -> Result<()> {
    let mut session = DocumentSession::open(file, settings)?;
    apply_view(&mut session, view);

    if json {
        emit(out, session.layout())
    } else {
        display_layout(out, session.layout());
        Ok(())
    }
}

/// Feed navigation keys through the reader view as a front end would.
pub fn replay(
    file: &Path,
    view: ViewArgs,
    keys: &[String],
    settings: &Settings,
    out: &OutputFormatter,
) -> Result<()> {
    let commands = keys
        .iter()
        .map(|key| key.parse::<NavCommand>())
        .collect::<Result<Vec<_>>>()?;

    let mut session = DocumentSession::open(file, settings)?;
    apply_view(&mut session, view);

    let mut state = AppState::new(settings.clone()).switch_to(View::Reader);
    state.reader = Some(session);

    let report = |state: &AppState, label: &str, out: &OutputFormatter| {
        if let Some(session) = &state.reader {
            let visible: Vec<String> = session
                .visible_pages()
                .iter()
                .map(|p| (p + 1).to_string())
                .collect();
            out.line(&format!(
                "{label:<12} offset {:>9.1}  visible [{}]",
                session.offset(),
                visible.join(", ")
            ));
        }
    };

    if let Some(session) = &state.reader {
        out.info(&format!(
            "{} - {} pages, {} at {}",
            session.document().file_name(),
            session.page_count(),
            session.mode(),
            session.zoom()
        ));
    }
    report(&state, "start", out);

    for (key, command) in keys.iter().zip(commands) {
        let status = dispatch(&mut state, AppEvent::Reader(ReaderEvent::Navigate(command)));
        out.status(&status);
        report(&state, key, out);
    }
    Ok(())
}
