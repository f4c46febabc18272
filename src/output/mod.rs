//! User-facing console output.
//!
//! Diagnostics go through `tracing` to stderr; everything the user asked to
//! see goes through [`OutputFormatter`] to stdout.

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::io::format_file_size;
use crate::layout::PageLayout;
use crate::validation::ValidationSummary;

/// Report accepted and rejected files of a validation batch.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    for (i, pdf) in summary.accepted.iter().enumerate() {
        let version = pdf
            .version
            .map(|(major, minor)| format!("PDF {major}.{minor}"))
            .unwrap_or_else(|| "PDF".to_string());
        formatter.list_item(
            i + 1,
            &format!(
                "{} - {} page(s), {}, {version}",
                pdf.path.display(),
                pdf.page_count,
                format_file_size(pdf.file_size)
            ),
        );
        if let Some((w, h)) = pdf.first_page_size {
            formatter.detail("First page", &format!("{w} × {h} pt"));
        }
    }

    for rejected in &summary.rejected {
        formatter.warning(&format!("Skipped: {}", rejected.error));
    }

    formatter.info(&format!(
        "{} valid file(s), {} page(s), {} total",
        summary.accepted.len(),
        summary.total_pages,
        summary.format_total_size()
    ));
}

/// One line per layout row with its pages and position.
pub fn display_layout(formatter: &OutputFormatter, layout: &PageLayout) {
    let (width, height) = layout.content_size();
    formatter.info(&format!(
        "{} at {}: {} row(s), content {width:.0} × {height:.0} px",
        layout.mode(),
        layout.zoom(),
        layout.rows().len()
    ));

    for row in layout.rows() {
        let columns: Vec<String> = row
            .pages
            .iter()
            .filter_map(|&page| layout.placement(page))
            .map(|p| format!("{:?}@{:.0}", p.column, p.x).to_lowercase())
            .collect();
        formatter.line(&format!(
            "  row {:>3}  top {:>8.1}  height {:>7.1}  {:<14} {}",
            row.index,
            row.top,
            row.height,
            row.label(),
            columns.join(" ")
        ));
    }
}
