//! Message formatting and display.
//!
//! # Examples
//!
//! ```
//! use pdfdesk::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Opening report.pdf");
//! formatter.success("Saved to: edited_report.pdf");
//! ```

use serde::Serialize;
use std::io::{self, IsTerminal};

use crate::app::{Status, StatusLevel};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl From<StatusLevel> for MessageLevel {
    fn from(level: StatusLevel) -> Self {
        match level {
            StatusLevel::Info => Self::Info,
            StatusLevel::Success => Self::Success,
            StatusLevel::Warning => Self::Warning,
            StatusLevel::Error => Self::Error,
        }
    }
}

/// Console output honouring `--quiet` and `--verbose`.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Only warnings and errors.
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Colour only when stdout is a terminal with `TERM` set.
    fn should_use_color() -> bool {
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Shown even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Shown even in quiet mode.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a dispatch result. The detail follows on its own lines.
    pub fn status(&self, status: &Status) {
        if let Some(text) = self.status_text(status) {
            println!("{text}");
        }
    }

    /// What [`status`](Self::status) prints; `None` when the level is hidden.
    fn status_text(&self, status: &Status) -> Option<String> {
        let level = MessageLevel::from(status.level);
        if !self.should_show(level) {
            return None;
        }
        let mut text = self.decorate(level, &status.message);
        if let Some(detail) = &status.detail {
            text.push('\n');
            text.push_str(detail);
        }
        Some(text)
    }

    /// Pretty JSON on stdout, regardless of quiet mode.
    pub fn json<T: Serialize>(&self, value: &T) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn should_show(&self, level: MessageLevel) -> bool {
        match level {
            MessageLevel::Warning | MessageLevel::Error => true,
            MessageLevel::Info | MessageLevel::Success => !self.quiet,
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        println!("{}", self.decorate(level, message));
    }

    fn decorate(&self, level: MessageLevel, message: &str) -> String {
        let (prefix, color_code) = Self::decoration(level);
        if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        }
    }

    fn decoration(level: MessageLevel) -> (&'static str, &'static str) {
        match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"),
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"),
            MessageLevel::Error => ("✗ ", "\x1b[31m"),
        }
    }

    /// `  label: value`, verbose only.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            println!("  {label}: {value}");
        }
    }

    /// Plain line, suppressed in quiet mode.
    pub fn line(&self, text: &str) {
        if !self.quiet {
            println!("{text}");
        }
    }

    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_quiet_and_verbose_flags() {
        assert!(OutputFormatter::quiet().is_quiet());
        assert!(!OutputFormatter::quiet().is_verbose());
        assert!(OutputFormatter::verbose().is_verbose());
    }

    #[rstest]
    #[case(MessageLevel::Info, false, false, true)]
    #[case(MessageLevel::Info, true, false, false)]
    #[case(MessageLevel::Success, true, false, false)]
    #[case(MessageLevel::Warning, true, false, true)]
    #[case(MessageLevel::Error, true, false, true)]
    #[case(MessageLevel::Success, false, true, true)]
    fn test_should_show(
        #[case] level: MessageLevel,
        #[case] quiet: bool,
        #[case] verbose: bool,
        #[case] shown: bool,
    ) {
        assert_eq!(OutputFormatter::new(quiet, verbose).should_show(level), shown);
    }

    #[test]
    fn test_status_levels_map_across() {
        assert_eq!(MessageLevel::from(StatusLevel::Warning), MessageLevel::Warning);
        assert_eq!(MessageLevel::from(StatusLevel::Success), MessageLevel::Success);
    }

    fn plain(quiet: bool) -> OutputFormatter {
        OutputFormatter {
            quiet,
            verbose: false,
            colored: false,
        }
    }

    #[test]
    fn test_status_text_with_detail() {
        let status = Status::success("Words: 2 | Characters: 11").with_detail("hello world");
        assert_eq!(
            plain(false).status_text(&status).as_deref(),
            Some("✓ Words: 2 | Characters: 11\nhello world")
        );
    }

    #[test]
    fn test_quiet_hides_info_status_but_not_warnings() {
        assert!(plain(true).status_text(&Status::info("Page 1 of 3")).is_none());
        assert_eq!(
            plain(true).status_text(&Status::warning("No changes made")).as_deref(),
            Some("⚠ No changes made")
        );
    }

    #[test]
    fn test_colour_wraps_prefix_and_message() {
        let formatter = OutputFormatter {
            colored: true,
            ..plain(false)
        };
        assert_eq!(
            formatter.decorate(MessageLevel::Error, "boom"),
            "\x1b[31m✗ boom\x1b[0m"
        );
        assert_eq!(formatter.decorate(MessageLevel::Info, "plain"), "plain");
    }
}
