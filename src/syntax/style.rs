//! Presentation types for styled output
//!
//! The engine itself only deals in `StyleCode`s; these types exist so a
//! front end can turn a run of codes into colours.

use std::ops::Range;

use super::tokens::StyleCode;

/// Terminal colors (ANSI 16-color palette for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of bytes sharing one style code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Absolute byte offset where this span starts (inclusive)
    pub start: usize,
    /// Absolute byte offset where this span ends (exclusive)
    pub end: usize,
    /// Style code shared by every byte of the span
    pub code: StyleCode,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, code: StyleCode) -> Self {
        Self { start, end, code }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Terminal style for the span's code
    pub fn style(&self) -> Style {
        self.code.default_style()
    }
}

/// Split a style array into maximal runs, offsetting by `base`
pub fn runs(base: usize, styles: &[u8]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for (i, &raw) in styles.iter().enumerate() {
        let code = StyleCode::from_u8(raw);
        let pos = base + i;
        match spans.last_mut() {
            Some(last) if last.code == code && last.end == pos => last.end = pos + 1,
            _ => spans.push(Span::new(pos, pos + 1, code)),
        }
    }
    spans
}
