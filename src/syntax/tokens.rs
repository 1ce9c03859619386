//! Style codes written by the tokenizer
//!
//! Every byte of a styled range carries exactly one of these codes. The
//! numeric values are what the document's style array stores, so they are
//! stable and must not be reordered.

use super::style::{Color, Style};

/// Lexical category of a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum StyleCode {
    /// Whitespace and anything no rule claims
    #[default]
    Default = 0,
    /// `!` comments, fixed-format column-0 comments, columns 72+
    Comment = 1,
    /// Numeric literals including kind suffixes and radix literals
    Number = 2,
    /// Single-quoted string
    String1 = 3,
    /// Double-quoted string
    String2 = 4,
    /// String left open at the end of its line
    StringEol = 5,
    /// Single-character operator
    Operator = 6,
    /// Identifier not found in any word list
    Identifier = 7,
    /// Primary keyword
    Word = 8,
    /// Intrinsic function
    Word2 = 9,
    /// Extended or user-defined function
    Word3 = 10,
    /// Compiler directives (`!dec$`, `!$`, `#...`)
    Preprocessor = 11,
    /// Dotted operators such as `.and.` or `.eq.`
    Operator2 = 12,
    /// Statement labels
    Label = 13,
    /// Line continuation marker
    Continuation = 14,
}

impl StyleCode {
    /// All codes, in numeric order
    pub const ALL: [StyleCode; 15] = [
        StyleCode::Default,
        StyleCode::Comment,
        StyleCode::Number,
        StyleCode::String1,
        StyleCode::String2,
        StyleCode::StringEol,
        StyleCode::Operator,
        StyleCode::Identifier,
        StyleCode::Word,
        StyleCode::Word2,
        StyleCode::Word3,
        StyleCode::Preprocessor,
        StyleCode::Operator2,
        StyleCode::Label,
        StyleCode::Continuation,
    ];

    /// Decode a stored style byte. Unknown values read as `Default`.
    pub fn from_u8(value: u8) -> Self {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(StyleCode::Default)
    }

    /// The byte stored in a document's style array
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the three keyword classes
    pub fn is_keyword(self) -> bool {
        matches!(self, StyleCode::Word | StyleCode::Word2 | StyleCode::Word3)
    }

    /// Get the terminal style used when rendering this code
    pub fn default_style(&self) -> Style {
        match self {
            StyleCode::Comment => Style::fg(Color::BrightBlack).with_italic(),
            StyleCode::Number => Style::fg(Color::Cyan),
            StyleCode::String1 | StyleCode::String2 => Style::fg(Color::Green),
            StyleCode::StringEol => Style::fg(Color::Green).with_underline(),
            StyleCode::Operator => Style::fg(Color::BrightWhite),
            StyleCode::Identifier => Style::default(),
            StyleCode::Word => Style::fg(Color::Magenta).with_bold(),
            StyleCode::Word2 => Style::fg(Color::Blue),
            StyleCode::Word3 => Style::fg(Color::BrightBlue),
            StyleCode::Preprocessor => Style::fg(Color::BrightMagenta),
            StyleCode::Operator2 => Style::fg(Color::Yellow),
            StyleCode::Label => Style::fg(Color::Yellow).with_underline(),
            StyleCode::Continuation => Style::fg(Color::BrightRed),
            StyleCode::Default => Style::default(),
        }
    }

    /// Get a human-readable name for this code
    pub fn name(&self) -> &'static str {
        match self {
            StyleCode::Default => "Default",
            StyleCode::Comment => "Comment",
            StyleCode::Number => "Number",
            StyleCode::String1 => "String1",
            StyleCode::String2 => "String2",
            StyleCode::StringEol => "StringEOL",
            StyleCode::Operator => "Operator",
            StyleCode::Identifier => "Identifier",
            StyleCode::Word => "Word",
            StyleCode::Word2 => "Word2",
            StyleCode::Word3 => "Word3",
            StyleCode::Preprocessor => "Preprocessor",
            StyleCode::Operator2 => "Operator2",
            StyleCode::Label => "Label",
            StyleCode::Continuation => "Continuation",
        }
    }

    /// Parse a code from its name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.name().eq_ignore_ascii_case(name))
    }
}
