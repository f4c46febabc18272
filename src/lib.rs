//! pdfdesk: merge, read and lightly edit PDF documents.
//!
//! The crate is organised around three views that a front end drives through
//! [`app::dispatch`]:
//!
//! - **Merger**: an ordered list of validated files concatenated page by page
//! - **Reader**: layout, zoom and navigation over one document, with a render
//!   cache and text extraction
//! - **Editor**: replace the first text block of a page and save a copy
//!
//! The `pdfdesk` binary is a headless front end over the same pieces.

pub mod app;
pub mod cli;
pub mod config;
pub mod document;
mod error;
pub use error::*;
pub mod io;
pub mod layout;
pub mod logging;
pub mod merge;
pub mod navigation;
mod ops;
pub mod output;
pub mod render;
pub mod text;
pub(crate) mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use crate::{cli::Cli, output::OutputFormatter};

use clap::Parser;

/// Parse the command line and run the selected subcommand.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    let settings = cli.settings()?;

    logging::init(&cli.log_level(&settings), cli.quiet);
    tracing::debug!(?settings, "settings loaded");

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);
    ops::execute(cli.command, &settings, &formatter)
}
