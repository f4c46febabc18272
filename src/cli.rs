//! CLI argument parsing for pdfdesk.
//!
//! The binary is a headless front end over the same components a desktop
//! shell would drive: the merge list, the reader session and the editor.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use pdfdesk::cli::Cli;
//!
//! let cli = Cli::parse();
//! let settings = cli.settings().expect("invalid settings");
//! println!("zoom step {}", settings.zoom.step);
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{RenderBackend, Settings};
use crate::error::{PdfDeskError, Result};

/// Merge, read and lightly edit PDF documents.
#[derive(Parser, Debug)]
#[command(name = "pdfdesk")]
#[command(version)]
#[command(about = "Merge, read and lightly edit PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (JSON)
    ///
    /// Every key is optional; missing keys keep their defaults.
    #[arg(long, global = true, value_name = "FILE", env = "PDFDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show per-file details and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log filter for stderr diagnostics (overridden by RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Rasterizer backend
    #[arg(long, global = true, value_name = "BACKEND")]
    #[arg(value_parser = ["auto", "pdfium", "preview"])]
    pub backend: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge PDF files in the order given
    ///
    /// Examples:
    ///   pdfdesk merge a.pdf b.pdf -o both.pdf
    ///   pdfdesk merge "chapters/*.pdf" -o book.pdf
    Merge {
        /// Input files or glob patterns, in merge order
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Print merge statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate files and report page counts
    Info {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Extract plain text with word and character counts
    Text {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page to extract (1-based); the whole document when omitted
        #[arg(short, long, value_name = "N")]
        page: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Replace the first text block of a page and save as a new file
    Edit {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page to edit (1-based)
        #[arg(short, long, value_name = "N")]
        page: usize,

        /// Replacement text; `\n` separates lines
        #[arg(short, long, value_name = "TEXT")]
        text: String,

        /// Output path; defaults to edited_<name>.pdf beside the input
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Rasterize one page to PNG
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page to render (1-based)
        #[arg(short, long, value_name = "N", default_value_t = 1)]
        page: usize,

        /// Zoom factor, clamped to the configured bounds
        #[arg(short, long, value_name = "ZOOM")]
        zoom: Option<f32>,

        /// PNG output path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print row and column placements for a layout mode
    Layout {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        json: bool,
    },

    /// Replay navigation keys and report the position after each
    ///
    /// Keys: up, down, pageup, pagedown, home, end, wheel:<delta>, goto:<n>
    ///
    /// Example:
    ///   pdfdesk view book.pdf --two-up --keys pagedown,pagedown,goto:9,end
    View {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Comma-separated navigation keys
        #[arg(short, long, value_name = "KEYS", value_delimiter = ',')]
        keys: Vec<String>,

        /// Viewport height in pixels
        #[arg(long, value_name = "PX")]
        viewport: Option<f32>,
    },
}

/// Layout toggles shared by `layout` and `view`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ViewArgs {
    /// Two pages per row
    #[arg(long)]
    pub two_up: bool,

    /// Cover page alone on the right, then spreads (needs --two-up)
    #[arg(long)]
    pub facing: bool,

    /// Zoom factor
    #[arg(short, long, value_name = "ZOOM")]
    pub zoom: Option<f32>,
}

impl Cli {
    /// Load the settings file and apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is missing or malformed, the
    /// backend name is unknown, or the result fails validation.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;

        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(backend) = &self.backend {
            settings.render.backend = backend.parse::<RenderBackend>()?;
        }
        if let Command::View {
            viewport: Some(height),
            ..
        } = &self.command
        {
            settings.navigation.viewport_height = *height;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Effective stderr log level.
    pub fn log_level(&self, settings: &Settings) -> String {
        if self.verbose && self.log_level.is_none() {
            "debug".to_string()
        } else {
            settings.log_level.clone()
        }
    }

    /// Check arguments that clap cannot express.
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Edit { page: 0, .. } | Command::Render { page: 0, .. } => Err(
                PdfDeskError::invalid_config("page numbers start at 1"),
            ),
            Command::Text { page: Some(0), .. } => {
                Err(PdfDeskError::invalid_config("page numbers start at 1"))
            }
            Command::Layout { view, .. } | Command::View { view, .. }
                if view.facing && !view.two_up =>
            {
                Err(PdfDeskError::invalid_config("--facing requires --two-up"))
            }
            _ => Ok(()),
        }
    }
}
