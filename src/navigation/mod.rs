//! Scroll position and page-aligned navigation over a [`PageLayout`].
//!
//! The [`Navigator`] owns a single number, the scroll offset of the viewport
//! top in canvas pixels. Every command moves it and then clamps it into
//! `[0, max_scroll]`, so the offset is valid after any sequence of events.

use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::config::NavigationSettings;
use crate::error::{PdfDeskError, Result};
use crate::layout::PageLayout;

/// Rows closer than this to the viewport top count as "at" it.
const SNAP_TOLERANCE: f32 = 1.0;

/// A navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    /// Arrow up.
    LineUp,
    /// Arrow down.
    LineDown,
    /// Mouse wheel; positive deltas scroll towards the start.
    Wheel(i32),
    PageUp,
    PageDown,
    Home,
    End,
    /// 1-based page number.
    JumpToPage(usize),
}

impl FromStr for NavCommand {
    type Err = PdfDeskError;

    /// Parse the key names used by the `view` command, e.g. `pagedown` or `goto:4`.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        let bad = || PdfDeskError::invalid_config(format!("Unknown navigation key: {s}"));

        if let Some(delta) = key.strip_prefix("wheel:") {
            return delta.parse().map(Self::Wheel).map_err(|_| bad());
        }
        if let Some(page) = key.strip_prefix("goto:") {
            return page.parse().map(Self::JumpToPage).map_err(|_| bad());
        }

        match key.as_str() {
            "up" => Ok(Self::LineUp),
            "down" => Ok(Self::LineDown),
            "pageup" | "pgup" => Ok(Self::PageUp),
            "pagedown" | "pgdn" => Ok(Self::PageDown),
            "home" => Ok(Self::Home),
            "end" => Ok(Self::End),
            _ => Err(bad()),
        }
    }
}

/// The visible window onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub top: f32,
    pub height: f32,
}

impl Viewport {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Tracks and moves the scroll offset.
#[derive(Debug, Clone)]
pub struct Navigator {
    offset: f32,
    viewport_height: f32,
    settings: NavigationSettings,
}

impl Navigator {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            offset: 0.0,
            viewport_height: settings.viewport_height,
            settings,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            top: self.offset,
            height: self.viewport_height,
        }
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// `PageIndex` for a jump outside `1..=page_count`; the offset is left
    /// untouched in that case.
    pub fn apply(&mut self, layout: &PageLayout, command: NavCommand) -> Result<f32> {
        let target = match command {
            NavCommand::LineUp => self.offset - self.units(layout, self.settings.arrow_units as f32),
            NavCommand::LineDown => {
                self.offset + self.units(layout, self.settings.arrow_units as f32)
            }
            NavCommand::Wheel(delta) => {
                let per_unit = self.settings.wheel_delta_per_unit.max(1);
                let units = -delta.div_euclid(per_unit);
                self.offset + self.units(layout, units as f32)
            }
            NavCommand::PageUp => self.previous_row_top(layout),
            NavCommand::PageDown => self.next_row_top(layout),
            NavCommand::Home => 0.0,
            NavCommand::End => layout.max_scroll(self.viewport_height),
            NavCommand::JumpToPage(page) => {
                let count = layout.page_count();
                if page == 0 || page > count {
                    return Err(PdfDeskError::page_index(page, count));
                }
                layout
                    .row_of(page - 1)
                    .and_then(|r| layout.row(r))
                    .map_or(self.offset, |row| row.top)
            }
        };

        self.set_offset(layout, target);
        trace!(?command, offset = self.offset, "navigated");
        Ok(self.offset)
    }

    /// Move to `offset`, clamped into the scrollable range.
    pub fn set_offset(&mut self, layout: &PageLayout, offset: f32) {
        let max = layout.max_scroll(self.viewport_height);
        self.offset = if offset.is_finite() {
            offset.clamp(0.0, max)
        } else {
            0.0
        };
    }

    /// Change the viewport height, keeping the offset valid.
    pub fn resize(&mut self, layout: &PageLayout, viewport_height: f32) {
        self.viewport_height = viewport_height.max(1.0);
        self.set_offset(layout, self.offset);
    }

    /// First page of the row at the viewport top.
    pub fn top_page(&self, layout: &PageLayout) -> Option<usize> {
        layout
            .row_at(self.offset)
            .and_then(|r| layout.row(r))
            .and_then(|row| row.pages.first().copied())
    }

    /// Pages intersecting the viewport; the only ones worth rasterizing.
    pub fn visible_pages(&self, layout: &PageLayout) -> Vec<usize> {
        let view = self.viewport();
        layout.pages_in(view.top, view.bottom())
    }

    /// Carry the position from `old` to `new`, keeping the top page at the top
    /// at the same fraction of its row.
    pub fn reproject(&mut self, old: &PageLayout, new: &PageLayout) {
        let anchor = old.row_at(self.offset).and_then(|r| old.row(r)).and_then(|row| {
            if self.offset < row.top {
                return None;
            }
            let fraction = if row.height > 0.0 {
                ((self.offset - row.top) / row.height).clamp(0.0, 1.0)
            } else {
                0.0
            };
            row.pages.first().map(|&page| (page, fraction))
        });

        let target = anchor
            .and_then(|(page, fraction)| {
                let row = new.row(new.row_of(page)?)?;
                Some(row.top + fraction * row.height)
            })
            .unwrap_or(self.offset);

        self.set_offset(new, target);
        debug!(offset = self.offset, "scroll position re-projected");
    }

    fn units(&self, layout: &PageLayout, count: f32) -> f32 {
        let reference = layout.rows().first().map_or(0.0, |r| r.height);
        count * (reference * self.settings.scroll_unit_fraction)
    }

    fn next_row_top(&self, layout: &PageLayout) -> f32 {
        let Some(current) = layout.row_at(self.offset) else {
            return 0.0;
        };
        match layout.row(current + 1) {
            Some(next) => next.top,
            None => layout.max_scroll(self.viewport_height),
        }
    }

    fn previous_row_top(&self, layout: &PageLayout) -> f32 {
        let Some(current) = layout.row_at(self.offset) else {
            return 0.0;
        };
        let Some(row) = layout.row(current) else {
            return 0.0;
        };

        if self.offset > row.top + SNAP_TOLERANCE {
            row.top
        } else if current == 0 {
            0.0
        } else {
            layout.row(current - 1).map_or(0.0, |r| r.top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutSettings;
    use crate::layout::{LayoutMode, Zoom};
    use rstest::rstest;

    // Letter pages at zoom 1: rows 792 tall, tops at 10, 822, 1634, ...
    fn layout(pages: usize, mode: LayoutMode) -> PageLayout {
        PageLayout::compute(
            &vec![(612.0, 792.0); pages],
            mode,
            Zoom::default(),
            &LayoutSettings::default(),
        )
    }

    fn navigator() -> Navigator {
        Navigator::new(NavigationSettings::default())
    }

    #[test]
    fn test_arrow_keys_move_three_units() {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();

        let unit: f32 = 792.0 * 0.1;
        assert_eq!(nav.apply(&layout, NavCommand::LineDown).unwrap(), 3.0 * unit);
        assert_eq!(nav.apply(&layout, NavCommand::LineUp).unwrap(), 0.0);
        assert_eq!(nav.apply(&layout, NavCommand::LineUp).unwrap(), 0.0);
    }

    #[rstest]
    #[case(-120, 1.0)]
    #[case(-240, 2.0)]
    #[case(-60, 1.0)]
    #[case(60, 0.0)]
    fn test_wheel_units(#[case] delta: i32, #[case] units: f32) {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();

        let unit: f32 = 792.0 * 0.1;
        let offset = nav.apply(&layout, NavCommand::Wheel(delta)).unwrap();
        assert_eq!(offset, units * unit);
    }

    #[test]
    fn test_wheel_up_from_top_stays_at_zero() {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();
        assert_eq!(nav.apply(&layout, NavCommand::Wheel(480)).unwrap(), 0.0);
    }

    #[test]
    fn test_page_down_snaps_to_next_row_top() {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();

        assert_eq!(nav.apply(&layout, NavCommand::PageDown).unwrap(), 822.0);
        assert_eq!(nav.apply(&layout, NavCommand::PageDown).unwrap(), 1634.0);

        nav.set_offset(&layout, 1700.0);
        assert_eq!(nav.apply(&layout, NavCommand::PageDown).unwrap(), 2446.0);
    }

    #[test]
    fn test_page_up_snaps_to_current_then_previous_row() {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();

        nav.set_offset(&layout, 1700.0);
        assert_eq!(nav.apply(&layout, NavCommand::PageUp).unwrap(), 1634.0);
        assert_eq!(nav.apply(&layout, NavCommand::PageUp).unwrap(), 822.0);

        // Within tolerance of the row top counts as already there.
        nav.set_offset(&layout, 822.5);
        assert_eq!(nav.apply(&layout, NavCommand::PageUp).unwrap(), 10.0);
        assert_eq!(nav.apply(&layout, NavCommand::PageUp).unwrap(), 0.0);
    }

    #[test]
    fn test_page_down_on_last_row_goes_to_end() {
        let layout = layout(3, LayoutMode::SingleColumn);
        let mut nav = navigator();
        let end = layout.max_scroll(800.0);

        nav.apply(&layout, NavCommand::JumpToPage(3)).unwrap();
        assert_eq!(nav.apply(&layout, NavCommand::PageDown).unwrap(), end);
    }

    #[test]
    fn test_home_and_end() {
        let layout = layout(5, LayoutMode::TwoUp);
        let mut nav = navigator();

        let end = nav.apply(&layout, NavCommand::End).unwrap();
        assert_eq!(end, layout.max_scroll(800.0));
        assert_eq!(nav.apply(&layout, NavCommand::Home).unwrap(), 0.0);
    }

    #[rstest]
    #[case(LayoutMode::SingleColumn, 3, 1634.0)]
    #[case(LayoutMode::TwoUp, 4, 822.0)]
    #[case(LayoutMode::FacingCoverRight, 1, 10.0)]
    #[case(LayoutMode::FacingCoverRight, 2, 822.0)]
    #[case(LayoutMode::FacingCoverRight, 3, 822.0)]
    fn test_jump_to_page_lands_on_its_row(
        #[case] mode: LayoutMode,
        #[case] page: usize,
        #[case] expected: f32,
    ) {
        let layout = layout(7, mode);
        let mut nav = navigator();

        assert_eq!(nav.apply(&layout, NavCommand::JumpToPage(page)).unwrap(), expected);
        assert!(nav.visible_pages(&layout).contains(&(page - 1)));
    }

    #[test]
    fn test_jump_to_last_page_is_visible_after_clamping() {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();
        nav.resize(&layout, 1500.0);

        // Row 4 starts at 3258, beyond the largest offset.
        let offset = nav.apply(&layout, NavCommand::JumpToPage(5)).unwrap();
        assert_eq!(offset, layout.max_scroll(1500.0));
        assert!(nav.visible_pages(&layout).contains(&4));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(100)]
    fn test_jump_out_of_range_keeps_position(#[case] page: usize) {
        let layout = layout(5, LayoutMode::SingleColumn);
        let mut nav = navigator();
        nav.set_offset(&layout, 500.0);

        let err = nav.apply(&layout, NavCommand::JumpToPage(page)).unwrap_err();
        assert!(matches!(err, PdfDeskError::PageIndex { page_count: 5, .. }));
        assert_eq!(nav.offset(), 500.0);
    }

    #[test]
    fn test_visible_pages_and_top_page() {
        let layout = layout(6, LayoutMode::SingleColumn);
        let mut nav = navigator();

        assert_eq!(nav.visible_pages(&layout), vec![0]);
        assert_eq!(nav.top_page(&layout), Some(0));

        nav.set_offset(&layout, 500.0);
        assert_eq!(nav.visible_pages(&layout), vec![0, 1]);

        nav.apply(&layout, NavCommand::JumpToPage(4)).unwrap();
        assert_eq!(nav.top_page(&layout), Some(3));
        assert_eq!(nav.visible_pages(&layout), vec![3]);
    }

    #[test]
    fn test_reproject_keeps_top_page_and_fraction() {
        let single = layout(6, LayoutMode::SingleColumn);
        let mut nav = navigator();

        // Halfway through page 3 (row 2).
        nav.set_offset(&single, 1634.0 + 396.0);

        let two_up = layout(6, LayoutMode::TwoUp);
        nav.reproject(&single, &two_up);

        // Page 3 sits in row 1 of the two-up layout.
        assert_eq!(nav.offset(), 822.0 + 396.0);
        assert_eq!(nav.top_page(&two_up), Some(2));
    }

    #[test]
    fn test_reproject_across_zoom() {
        let settings = LayoutSettings::default();
        let sizes = vec![(612.0, 792.0); 4];
        let normal = PageLayout::compute(&sizes, LayoutMode::SingleColumn, Zoom::default(), &settings);
        let zoomed = PageLayout::compute(&sizes, LayoutMode::SingleColumn, Zoom::new(2.0), &settings);

        let mut nav = navigator();
        nav.apply(&normal, NavCommand::JumpToPage(2)).unwrap();
        nav.reproject(&normal, &zoomed);

        assert_eq!(nav.offset(), 10.0 + 1584.0 + 20.0);
        assert_eq!(nav.top_page(&zoomed), Some(1));
    }

    #[test]
    fn test_resize_reclamps() {
        let layout = layout(2, LayoutMode::SingleColumn);
        let mut nav = navigator();
        nav.apply(&layout, NavCommand::End).unwrap();

        nav.resize(&layout, 5000.0);
        assert_eq!(nav.offset(), 0.0);
    }

    #[rstest]
    #[case("up", NavCommand::LineUp)]
    #[case("PageDown", NavCommand::PageDown)]
    #[case("wheel:-120", NavCommand::Wheel(-120))]
    #[case("goto:7", NavCommand::JumpToPage(7))]
    #[case(" end ", NavCommand::End)]
    fn test_parse_keys(#[case] input: &str, #[case] expected: NavCommand) {
        assert_eq!(input.parse::<NavCommand>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_key() {
        assert!("sideways".parse::<NavCommand>().is_err());
        assert!("goto:x".parse::<NavCommand>().is_err());
    }
}
