//! Byte classification predicates
//!
//! The engine is byte oriented: anything at or above 0x80 is treated as an
//! opaque single byte that never belongs to a word.

/// Alphanumeric, `_` or `%`
#[inline]
pub fn is_word_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'%'
}

/// A byte that can start an identifier
#[inline]
pub fn is_word_start(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
}

/// Space, tab or vertical tab
#[inline]
pub fn is_blank(ch: u8) -> bool {
    ch == b' ' || ch == 0x09 || ch == 0x0b
}

#[inline]
pub fn is_line_end(ch: u8) -> bool {
    ch == b'\n' || ch == b'\r'
}

/// Space or any of the control characters 0x09..=0x0d
#[inline]
pub fn is_space(ch: u8) -> bool {
    ch == b' ' || (0x09..=0x0d).contains(&ch)
}

#[inline]
pub fn is_space_or_tab(ch: u8) -> bool {
    ch == b' ' || ch == b'\t'
}

#[inline]
pub fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

/// Single-character operator punctuation
pub fn is_operator(ch: u8) -> bool {
    matches!(
        ch,
        b'%' | b'^'
            | b'&'
            | b'*'
            | b'('
            | b')'
            | b'-'
            | b'+'
            | b'='
            | b'|'
            | b'{'
            | b'}'
            | b'['
            | b']'
            | b':'
            | b';'
            | b'<'
            | b'>'
            | b','
            | b'/'
            | b'?'
            | b'!'
            | b'.'
            | b'~'
    )
}

/// Word characters as seen by the folder when looking for the end of a keyword
#[inline]
pub fn is_fold_word_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'.' || ch == b'_'
}

#[inline]
pub fn fold_lower(ch: u8) -> u8 {
    ch.to_ascii_lowercase()
}
