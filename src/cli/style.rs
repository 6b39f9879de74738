//! Terminal styling helpers
//!
//! Centralizes color choices behind a small extension trait so command
//! code reads as intent (`.warn()`, `.accent()`) rather than colors.
//! Styling degrades to plain text when the stream is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream};

/// Checkmark glyph used in success lines.
pub const CHECK: &str = "✓";

/// Styling extensions for anything displayable.
pub trait Stylize: std::fmt::Display {
    /// De-emphasized secondary text.
    fn muted(&self) -> String;
    /// Bold text for key phrases.
    fn emphasis(&self) -> String;
    /// Highlighted names (branches, paths).
    fn accent(&self) -> String;
    /// Success messages.
    fn success(&self) -> String;
    /// Warnings.
    fn warn(&self) -> String;
    /// Fatal errors.
    fn error(&self) -> String;
}

impl<T: std::fmt::Display> Stylize for T {
    fn muted(&self) -> String {
        self.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string()
    }

    fn emphasis(&self) -> String {
        self.if_supports_color(Stream::Stdout, |t| t.bold()).to_string()
    }

    fn accent(&self) -> String {
        self.if_supports_color(Stream::Stdout, |t| t.cyan()).to_string()
    }

    fn success(&self) -> String {
        self.if_supports_color(Stream::Stdout, |t| t.green()).to_string()
    }

    fn warn(&self) -> String {
        self.if_supports_color(Stream::Stdout, |t| t.yellow()).to_string()
    }

    fn error(&self) -> String {
        self.if_supports_color(Stream::Stderr, |t| t.red()).to_string()
    }
}

/// Styled checkmark.
#[must_use]
pub fn check() -> String {
    CHECK.success()
}

/// Spinner style shared by long-running waits.
#[must_use]
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}").expect("static spinner template")
}
