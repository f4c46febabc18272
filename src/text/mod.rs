//! Text extraction and first-block replacement.
//!
//! - [`fonts`]: decoding and advance widths of a page's font resources
//! - [`blocks`]: scans content streams into positioned [`TextBlock`]s
//! - [`extract`]: page and document text with word/character counts
//! - [`edit`]: masks a page's first block and draws replacement text

pub mod blocks;
pub mod edit;
pub mod extract;
pub mod fonts;
mod standard_fonts;

pub use blocks::{Rect, TextBlock};
pub use edit::{EditBuffer, TextEdit, TextEditor};
pub use extract::{DocumentText, PageText, TextExtractor, TextStats};
