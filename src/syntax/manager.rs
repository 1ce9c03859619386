//! Incremental styling driver
//!
//! This module provides the `SyntaxManager` that keeps a document's styles
//! and fold levels current. Edits lower the document's styled watermark;
//! the manager restyles from there up to whatever line is asked for.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use super::document::{Accessor, Document};
use super::fold;
use super::lexer::tokenize;
use super::style::{runs, Span};
use super::tokens::StyleCode;
use super::wordlist::KeywordSets;
use crate::error::FortfoldError;

/// Source layout of a Fortran file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// Column-oriented FORTRAN 77 layout
    Fixed,
    /// Fortran 90 and later
    #[default]
    Free,
}

const FIXED_EXTENSIONS: &[&str] = &["f", "for", "f77", "ftn"];
const FREE_EXTENSIONS: &[&str] = &["f90", "f95", "f03", "f08", "f18", "f2k", "f23"];

impl SourceFormat {
    /// Detect the layout from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if FIXED_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Fixed)
        } else if FREE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Free)
        } else {
            None
        }
    }

    /// Look up a layout by lexer name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "fixed" | "f77" => Some(Self::Fixed),
            "free" | "fortran" => Some(Self::Free),
            _ => None,
        }
    }

    pub fn is_fixed(self) -> bool {
        self == Self::Fixed
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Free => "free",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceFormat {
    type Err = FortfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FortfoldError::UnknownFormat(s.to_string()))
    }
}

/// One instantiation of the Fortran engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FortranLexer {
    format: SourceFormat,
}

impl FortranLexer {
    pub const fn new(format: SourceFormat) -> Self {
        Self { format }
    }

    pub const fn fixed() -> Self {
        Self::new(SourceFormat::Fixed)
    }

    pub const fn free() -> Self {
        Self::new(SourceFormat::Free)
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Style `start..start + length`
    pub fn lex<A: Accessor + ?Sized>(
        &self,
        start: usize,
        length: usize,
        init_style: StyleCode,
        words: &KeywordSets,
        styler: &mut A,
    ) {
        tokenize(start, length, init_style, words, styler, self.format);
    }

    /// Recompute fold levels for `start..start + length`
    pub fn fold<A: Accessor + ?Sized>(&self, start: usize, length: usize, init_style: StyleCode, styler: &mut A) {
        fold::fold(start, length, init_style, styler, self.format);
    }
}

/// Keeps documents styled and folded
pub struct SyntaxManager {
    lexer: FortranLexer,
    words: KeywordSets,
}

impl SyntaxManager {
    /// Create a manager with the built-in keyword lists
    pub fn new(format: SourceFormat) -> Self {
        Self::with_words(format, KeywordSets::fortran())
    }

    pub fn with_words(format: SourceFormat, words: KeywordSets) -> Self {
        Self {
            lexer: FortranLexer::new(format),
            words,
        }
    }

    /// Create a manager for a file, detecting the layout from its extension
    pub fn for_path(path: &Path) -> Self {
        Self::new(SourceFormat::from_path(path).unwrap_or_default())
    }

    pub fn format(&self) -> SourceFormat {
        self.lexer.format()
    }

    pub fn words(&self) -> &KeywordSets {
        &self.words
    }

    /// Switch layout. Everything styled so far is stale.
    pub fn set_format(&mut self, doc: &mut Document, format: SourceFormat) {
        if self.lexer.format() != format {
            self.lexer = FortranLexer::new(format);
            doc.set_end_styled(0);
        }
    }

    /// Make sure styles and levels are current through the end of the line
    /// containing `up_to`.
    pub fn ensure_styled(&self, doc: &mut Document, up_to: usize) {
        let target = doc.line_start(doc.line_from_position(up_to) + 1).min(doc.len());
        let start = doc.line_start(doc.line_from_position(doc.end_styled()));
        if start >= target {
            return;
        }
        let init_style = match start.checked_sub(1) {
            Some(prev) => doc.style_at(prev),
            None => StyleCode::Default,
        };
        debug!(start, target, format = %self.format(), "styling");

        self.lexer.lex(start, target - start, init_style, &self.words, doc);
        self.lexer.fold(start, target - start, init_style, doc);
        doc.set_end_styled(target);
    }

    /// Restyle and refold the whole document
    pub fn restyle_all(&self, doc: &mut Document) {
        doc.set_end_styled(0);
        let len = doc.len();
        self.ensure_styled(doc, len);
    }

    /// Style runs of `line`, styling up to it first if needed
    pub fn spans(&self, doc: &mut Document, line: usize) -> Vec<Span> {
        let range = doc.line_range(line);
        if range.is_empty() {
            return Vec::new();
        }
        self.ensure_styled(doc, range.start);
        runs(range.start, &doc.styles()[range])
    }
}

impl Default for SyntaxManager {
    fn default() -> Self {
        Self::new(SourceFormat::default())
    }
}
