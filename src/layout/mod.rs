//! Continuous-scroll page layout.
//!
//! [`PageLayout::compute`] places every page of a document on one tall
//! canvas, grouped into rows. Three arrangements are supported:
//!
//! - **Single column**: one page per row, centred
//! - **Two-up**: pages `{2i, 2i+1}` side by side
//! - **Facing, cover right**: page 0 alone in the right column, then
//!   spreads `{2i-1, 2i}`
//!
//! A layout is a pure function of page sizes, mode, zoom and spacing. It is
//! rebuilt, never patched, whenever one of those changes.

mod zoom;

pub use zoom::Zoom;

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::LayoutSettings;

/// How pages are arranged into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    SingleColumn,
    TwoUp,
    FacingCoverRight,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleColumn => "single-column",
            Self::TwoUp => "two-up",
            Self::FacingCoverRight => "facing-cover-right",
        };
        f.write_str(name)
    }
}

/// The two view toggles behind [`LayoutMode`].
///
/// Facing is a refinement of two-up: turning two-up off clears it, while
/// requesting facing with two-up off is remembered but has no effect on
/// [`LayoutFlags::mode`] until two-up comes back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFlags {
    two_up: bool,
    facing: bool,
}

impl LayoutFlags {
    pub fn new(two_up: bool, facing: bool) -> Self {
        Self { two_up, facing }
    }

    pub fn two_up(&self) -> bool {
        self.two_up
    }

    pub fn facing(&self) -> bool {
        self.facing
    }

    pub fn set_two_up(&mut self, on: bool) {
        self.two_up = on;
        if !on {
            self.facing = false;
        }
    }

    pub fn toggle_two_up(&mut self) {
        self.set_two_up(!self.two_up);
    }

    pub fn set_facing(&mut self, on: bool) {
        self.facing = on;
    }

    /// The arrangement actually drawn.
    pub fn mode(&self) -> LayoutMode {
        match (self.two_up, self.facing) {
            (false, _) => LayoutMode::SingleColumn,
            (true, false) => LayoutMode::TwoUp,
            (true, true) => LayoutMode::FacingCoverRight,
        }
    }
}

/// Horizontal slot a page occupies within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Single,
    Left,
    Right,
}

/// Where one page sits on the canvas, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PagePlacement {
    pub page: usize,
    pub row: usize,
    pub column: Column,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A horizontal band of one or two pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub index: usize,
    pub pages: Vec<usize>,
    pub top: f32,
    pub height: f32,
}

impl Row {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Caption drawn beside the row, e.g. `Pages 2 / 3`.
    pub fn label(&self) -> String {
        match self.pages.as_slice() {
            [a, b] => format!("Pages {} / {}", a + 1, b + 1),
            [a] => format!("Page {}", a + 1),
            _ => String::new(),
        }
    }
}

/// Placement of every page of a document under one mode and zoom.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    mode: LayoutMode,
    zoom: Zoom,
    rows: Vec<Row>,
    placements: Vec<PagePlacement>,
    content_width: f32,
    content_height: f32,
}

impl PageLayout {
    /// Lay out pages of the given native sizes (points).
    pub fn compute(
        page_sizes: &[(f32, f32)],
        mode: LayoutMode,
        zoom: Zoom,
        spacing: &LayoutSettings,
    ) -> Self {
        let scaled: Vec<(f32, f32)> = page_sizes
            .iter()
            .map(|&(w, h)| (zoom.scale(w), zoom.scale(h)))
            .collect();
        let column_width = scaled.iter().map(|s| s.0).fold(0.0f32, f32::max);

        let left_x = spacing.margin;
        let right_x = spacing.margin + column_width + spacing.column_gap;

        let mut rows = Vec::new();
        let mut placements = Vec::with_capacity(scaled.len());
        let mut widest_row = 0.0f32;
        let mut y = spacing.margin;

        for (index, group) in group_rows(scaled.len(), mode).into_iter().enumerate() {
            if index > 0 {
                y += spacing.row_gap;
            }

            let mut height = 0.0f32;
            for (&page, column) in group.iter().zip(columns_for(mode, index, group.len())) {
                let (width, page_height) = scaled[page];
                let x = match column {
                    Column::Single => left_x + (column_width - width) / 2.0,
                    Column::Left => left_x,
                    Column::Right => right_x,
                };
                widest_row = widest_row.max(x + width - spacing.margin);
                height = height.max(page_height);
                placements.push(PagePlacement {
                    page,
                    row: index,
                    column,
                    x,
                    y,
                    width,
                    height: page_height,
                });
            }

            rows.push(Row {
                index,
                pages: group,
                top: y,
                height,
            });
            y += height;
        }

        placements.sort_by_key(|p| p.page);

        let layout = Self {
            mode,
            zoom,
            rows,
            placements,
            content_width: 2.0 * spacing.margin + widest_row,
            content_height: y + spacing.margin,
        };
        debug!(
            %mode,
            zoom = %zoom,
            rows = layout.rows.len(),
            height = layout.content_height,
            "layout recomputed"
        );
        layout
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn placements(&self) -> &[PagePlacement] {
        &self.placements
    }

    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// Total canvas size `(width, height)` for sizing the scroll region.
    pub fn content_size(&self) -> (f32, f32) {
        (self.content_width, self.content_height)
    }

    pub fn placement(&self, page: usize) -> Option<&PagePlacement> {
        self.placements.get(page)
    }

    pub fn row_of(&self, page: usize) -> Option<usize> {
        self.placement(page).map(|p| p.row)
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Row whose band contains `offset`. The gap under a row belongs to it;
    /// offsets above the first row map to row 0.
    pub fn row_at(&self, offset: f32) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        let after = self.rows.partition_point(|r| r.top <= offset);
        Some(after.saturating_sub(1))
    }

    /// Rows intersecting the half-open span `[top, bottom)`.
    pub fn rows_in(&self, top: f32, bottom: f32) -> impl Iterator<Item = &Row> {
        self.rows
            .iter()
            .filter(move |r| r.top < bottom && r.bottom() > top)
    }

    /// Pages intersecting `[top, bottom)`, in page order.
    pub fn pages_in(&self, top: f32, bottom: f32) -> Vec<usize> {
        let mut pages: Vec<usize> = self
            .rows_in(top, bottom)
            .flat_map(|r| r.pages.iter().copied())
            .collect();
        pages.sort_unstable();
        pages
    }

    /// Largest valid scroll offset for a viewport of the given height.
    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.content_height - viewport_height).max(0.0)
    }
}

fn group_rows(page_count: usize, mode: LayoutMode) -> Vec<Vec<usize>> {
    let pages: Vec<usize> = (0..page_count).collect();
    match mode {
        LayoutMode::SingleColumn => pages.into_iter().map(|p| vec![p]).collect(),
        LayoutMode::TwoUp => pages.chunks(2).map(<[usize]>::to_vec).collect(),
        LayoutMode::FacingCoverRight => {
            let Some((cover, rest)) = pages.split_first() else {
                return Vec::new();
            };
            std::iter::once(vec![*cover])
                .chain(rest.chunks(2).map(<[usize]>::to_vec))
                .collect()
        }
    }
}

fn columns_for(mode: LayoutMode, row: usize, len: usize) -> Vec<Column> {
    match mode {
        LayoutMode::SingleColumn => vec![Column::Single],
        LayoutMode::FacingCoverRight if row == 0 => vec![Column::Right],
        _ => [Column::Left, Column::Right].into_iter().take(len).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LETTER: (f32, f32) = (612.0, 792.0);

    fn spacing() -> LayoutSettings {
        LayoutSettings::default()
    }

    fn letter_pages(n: usize) -> Vec<(f32, f32)> {
        vec![LETTER; n]
    }

    fn row_pages(layout: &PageLayout) -> Vec<Vec<usize>> {
        layout.rows().iter().map(|r| r.pages.clone()).collect()
    }

    #[test]
    fn test_facing_cover_right_five_pages() {
        let layout = PageLayout::compute(
            &letter_pages(5),
            LayoutMode::FacingCoverRight,
            Zoom::default(),
            &spacing(),
        );

        assert_eq!(row_pages(&layout), vec![vec![0], vec![1, 2], vec![3, 4]]);

        let cover = layout.placement(0).unwrap();
        assert_eq!(cover.column, Column::Right);
        assert_eq!(cover.x, 10.0 + 612.0 + 20.0);

        assert_eq!(layout.placement(1).unwrap().column, Column::Left);
        assert_eq!(layout.placement(2).unwrap().column, Column::Right);
        assert_eq!(layout.placement(3).unwrap().column, Column::Left);
        assert_eq!(layout.placement(4).unwrap().column, Column::Right);
    }

    #[rstest]
    #[case(LayoutMode::SingleColumn, 5, vec![vec![0], vec![1], vec![2], vec![3], vec![4]])]
    #[case(LayoutMode::TwoUp, 5, vec![vec![0, 1], vec![2, 3], vec![4]])]
    #[case(LayoutMode::TwoUp, 4, vec![vec![0, 1], vec![2, 3]])]
    #[case(LayoutMode::FacingCoverRight, 4, vec![vec![0], vec![1, 2], vec![3]])]
    #[case(LayoutMode::FacingCoverRight, 1, vec![vec![0]])]
    #[case(LayoutMode::TwoUp, 0, vec![])]
    fn test_row_grouping(
        #[case] mode: LayoutMode,
        #[case] pages: usize,
        #[case] expected: Vec<Vec<usize>>,
    ) {
        let layout = PageLayout::compute(&letter_pages(pages), mode, Zoom::default(), &spacing());
        assert_eq!(row_pages(&layout), expected);
    }

    #[test]
    fn test_single_column_geometry() {
        let layout = PageLayout::compute(
            &[(600.0, 800.0), (300.0, 400.0)],
            LayoutMode::SingleColumn,
            Zoom::new(0.5),
            &spacing(),
        );

        let rows = layout.rows();
        assert_eq!(rows[0].top, 10.0);
        assert_eq!(rows[0].height, 400.0);
        assert_eq!(rows[1].top, 10.0 + 400.0 + 20.0);
        assert_eq!(rows[1].height, 200.0);

        // The narrow page is centred in the widest page's column.
        assert_eq!(layout.placement(0).unwrap().x, 10.0);
        assert_eq!(layout.placement(1).unwrap().x, 10.0 + 75.0);

        assert_eq!(layout.content_size(), (320.0, 10.0 + 400.0 + 20.0 + 200.0 + 10.0));
    }

    #[test]
    fn test_two_up_row_height_is_taller_page() {
        let layout = PageLayout::compute(
            &[(600.0, 800.0), (600.0, 900.0), (600.0, 700.0)],
            LayoutMode::TwoUp,
            Zoom::default(),
            &spacing(),
        );

        assert_eq!(layout.rows()[0].height, 900.0);
        assert_eq!(layout.rows()[1].top, 10.0 + 900.0 + 20.0);
        assert_eq!(layout.placement(1).unwrap().x, 10.0 + 600.0 + 20.0);
        assert_eq!(layout.content_size().0, 10.0 + 600.0 + 20.0 + 600.0 + 10.0);
    }

    #[test]
    fn test_row_at_assigns_gaps_to_row_above() {
        let layout = PageLayout::compute(
            &letter_pages(3),
            LayoutMode::SingleColumn,
            Zoom::default(),
            &spacing(),
        );

        assert_eq!(layout.row_at(0.0), Some(0));
        assert_eq!(layout.row_at(10.0), Some(0));
        assert_eq!(layout.row_at(10.0 + 792.0 + 5.0), Some(0));
        assert_eq!(layout.row_at(10.0 + 792.0 + 20.0), Some(1));
        assert_eq!(layout.row_at(1e9), Some(2));
    }

    #[test]
    fn test_pages_in_viewport() {
        let layout = PageLayout::compute(
            &letter_pages(6),
            LayoutMode::TwoUp,
            Zoom::default(),
            &spacing(),
        );

        assert_eq!(layout.pages_in(0.0, 800.0), vec![0, 1]);
        assert_eq!(layout.pages_in(0.0, 900.0), vec![0, 1, 2, 3]);
        // Entirely inside the first gap.
        assert!(layout.pages_in(803.0, 821.0).is_empty());
    }

    #[test]
    fn test_max_scroll() {
        let layout = PageLayout::compute(
            &letter_pages(2),
            LayoutMode::SingleColumn,
            Zoom::default(),
            &spacing(),
        );
        let (_, height) = layout.content_size();

        assert_eq!(layout.max_scroll(800.0), height - 800.0);
        assert_eq!(layout.max_scroll(height + 100.0), 0.0);
    }

    #[test]
    fn test_empty_document() {
        let layout = PageLayout::compute(&[], LayoutMode::SingleColumn, Zoom::default(), &spacing());
        assert_eq!(layout.content_size(), (20.0, 20.0));
        assert_eq!(layout.row_at(0.0), None);
    }

    #[test]
    fn test_row_labels() {
        let layout = PageLayout::compute(
            &letter_pages(3),
            LayoutMode::FacingCoverRight,
            Zoom::default(),
            &spacing(),
        );
        assert_eq!(layout.rows()[0].label(), "Page 1");
        assert_eq!(layout.rows()[1].label(), "Pages 2 / 3");
    }

    #[test]
    fn test_disabling_two_up_clears_facing() {
        let mut flags = LayoutFlags::new(true, true);
        assert_eq!(flags.mode(), LayoutMode::FacingCoverRight);

        flags.set_two_up(false);
        assert!(!flags.facing());
        assert_eq!(flags.mode(), LayoutMode::SingleColumn);

        flags.set_two_up(true);
        assert_eq!(flags.mode(), LayoutMode::TwoUp);
    }

    #[test]
    fn test_facing_without_two_up_has_no_effect_until_enabled() {
        let mut flags = LayoutFlags::default();
        flags.set_facing(true);
        assert!(flags.facing());
        assert_eq!(flags.mode(), LayoutMode::SingleColumn);

        flags.toggle_two_up();
        assert_eq!(flags.mode(), LayoutMode::FacingCoverRight);
    }
}
