//! Document access for the lexing engine
//!
//! The engine never owns text. It reads bytes and writes style codes and
//! fold levels through the `Accessor` trait, which the host implements over
//! its own buffer. `Document` is a self-contained implementation used by the
//! command-line front end and the tests.

use std::collections::HashMap;
use std::ops::Range;

use super::fold::FoldLevel;
use super::tokens::StyleCode;

/// What the engine needs from a document.
///
/// Reads are total: out-of-range positions and lines return a sentinel
/// rather than panicking, so the state machines never see undefined input.
pub trait Accessor {
    /// Document length in bytes
    fn length(&self) -> usize;

    /// Byte at `pos`, or `None` past the end
    fn char_at(&self, pos: usize) -> Option<u8>;

    /// Line containing `pos`. Positions past the end map to the last line.
    fn line_from_position(&self, pos: usize) -> usize;

    /// Offset of the first byte of `line`. Lines past the end map to `length()`.
    fn line_start(&self, line: usize) -> usize;

    /// Style code at `pos`; `Default` past the end
    fn style_at(&self, pos: usize) -> StyleCode;

    /// Set the style of every byte in `range`, clipped to the document
    fn set_style_range(&mut self, range: Range<usize>, code: StyleCode);

    /// Stored fold level of `line`; `FoldLevel::BASE` if never set
    fn level_at(&self, line: usize) -> FoldLevel;

    fn set_level(&mut self, line: usize, level: FoldLevel);

    /// Named integer property, or `default` if unset
    fn property_int(&self, key: &str, default: i32) -> i32;

    fn set_property(&mut self, key: &str, value: i32);

    /// Byte at `pos`, or `default` past the end
    fn safe_char_at(&self, pos: usize, default: u8) -> u8 {
        self.char_at(pos).unwrap_or(default)
    }

    /// Byte at `pos + delta`, or `default` when that falls outside the document
    fn relative_char_at(&self, pos: usize, delta: isize, default: u8) -> u8 {
        pos.checked_add_signed(delta)
            .and_then(|p| self.char_at(p))
            .unwrap_or(default)
    }

    /// Number of lines holding at least one byte (never zero)
    fn line_count(&self) -> usize {
        self.line_from_position(self.length().saturating_sub(1)) + 1
    }
}

/// An in-memory document with style and fold annotations
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: Vec<u8>,
    /// Offset of the first byte of each line; always starts with 0
    line_starts: Vec<usize>,
    styles: Vec<u8>,
    levels: Vec<FoldLevel>,
    properties: HashMap<String, i32>,
    /// Everything before this offset has up-to-date styles
    end_styled: usize,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    pub fn from_bytes(text: Vec<u8>) -> Self {
        let line_starts = compute_line_starts(&text);
        let styles = vec![StyleCode::Default.as_u8(); text.len()];
        let levels = vec![FoldLevel::BASE; line_starts.len()];
        Self {
            text,
            line_starts,
            styles,
            levels,
            properties: HashMap::new(),
            end_styled: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Total lines, counting an empty line after a trailing line end
    pub fn lines(&self) -> usize {
        self.line_starts.len()
    }

    /// Raw style bytes, one per text byte
    pub fn styles(&self) -> &[u8] {
        &self.styles
    }

    /// Decoded style codes for `range`
    pub fn style_codes(&self, range: Range<usize>) -> Vec<StyleCode> {
        let end = range.end.min(self.styles.len());
        let start = range.start.min(end);
        self.styles[start..end]
            .iter()
            .map(|&raw| StyleCode::from_u8(raw))
            .collect()
    }

    /// Fold levels, one per line
    pub fn levels(&self) -> &[FoldLevel] {
        &self.levels
    }

    /// Byte range of `line`, including its line end
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let start = self.line_start(line);
        let end = self.line_start(line + 1);
        start..end
    }

    /// Text of `line` without its line end
    pub fn line_text(&self, line: usize) -> String {
        let range = self.line_range(line);
        let bytes = &self.text[range];
        let trimmed = match bytes {
            [rest @ .., b'\r', b'\n'] => rest,
            [rest @ .., b'\n'] | [rest @ .., b'\r'] => rest,
            _ => bytes,
        };
        String::from_utf8_lossy(trimmed).into_owned()
    }

    pub fn end_styled(&self) -> usize {
        self.end_styled
    }

    pub fn set_end_styled(&mut self, pos: usize) {
        self.end_styled = pos.min(self.text.len());
    }

    /// Insert bytes at `pos` (clamped to the end)
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) {
        let pos = pos.min(self.text.len());
        let line = self.line_from_position(pos);
        self.text.splice(pos..pos, bytes.iter().copied());
        self.styles
            .splice(pos..pos, std::iter::repeat(StyleCode::Default.as_u8()).take(bytes.len()));
        self.relayout(line);
        self.end_styled = self.end_styled.min(pos);
    }

    /// Remove the bytes in `range` (clipped to the document)
    pub fn delete(&mut self, range: Range<usize>) {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        if start == end {
            return;
        }
        let line = self.line_from_position(start);
        self.text.drain(start..end);
        self.styles.drain(start..end);
        self.relayout(line);
        self.end_styled = self.end_styled.min(start);
    }

    /// Replace the bytes in `range` with `bytes`
    pub fn replace(&mut self, range: Range<usize>, bytes: &[u8]) {
        let start = range.start.min(self.text.len());
        self.delete(range);
        self.insert(start, bytes);
    }

    /// Rebuild line starts after an edit on `line`, keeping fold levels
    /// aligned: new lines copy the level of the edited line, removed lines
    /// drop theirs.
    fn relayout(&mut self, line: usize) {
        let old_lines = self.line_starts.len();
        self.line_starts = compute_line_starts(&self.text);
        let new_lines = self.line_starts.len();

        if new_lines > old_lines {
            let level = self.levels.get(line).copied().unwrap_or(FoldLevel::BASE);
            let at = (line + 1).min(self.levels.len());
            self.levels
                .splice(at..at, std::iter::repeat(level).take(new_lines - old_lines));
        } else if new_lines < old_lines {
            let at = (line + 1).min(self.levels.len());
            let end = (at + old_lines - new_lines).min(self.levels.len());
            self.levels.drain(at..end);
        }
        self.levels.resize(new_lines, FoldLevel::BASE);
    }
}

impl Accessor for Document {
    fn length(&self) -> usize {
        self.text.len()
    }

    fn char_at(&self, pos: usize) -> Option<u8> {
        self.text.get(pos).copied()
    }

    fn line_from_position(&self, pos: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= pos)
            .saturating_sub(1)
    }

    fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.text.len())
    }

    fn style_at(&self, pos: usize) -> StyleCode {
        self.styles
            .get(pos)
            .map_or(StyleCode::Default, |&raw| StyleCode::from_u8(raw))
    }

    fn set_style_range(&mut self, range: Range<usize>, code: StyleCode) {
        let end = range.end.min(self.styles.len());
        let start = range.start.min(end);
        self.styles[start..end].fill(code.as_u8());
    }

    fn level_at(&self, line: usize) -> FoldLevel {
        self.levels.get(line).copied().unwrap_or(FoldLevel::BASE)
    }

    fn set_level(&mut self, line: usize, level: FoldLevel) {
        if let Some(slot) = self.levels.get_mut(line) {
            *slot = level;
        }
    }

    fn property_int(&self, key: &str, default: i32) -> i32 {
        self.properties.get(key).copied().unwrap_or(default)
    }

    fn set_property(&mut self, key: &str, value: i32) {
        self.properties.insert(key.to_string(), value);
    }
}

/// Line starts for LF, CRLF and lone CR line ends
fn compute_line_starts(text: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    let mut i = 0;
    while i < text.len() {
        match text[i] {
            b'\n' => starts.push(i + 1),
            b'\r' if text.get(i + 1) != Some(&b'\n') => starts.push(i + 1),
            _ => {}
        }
        i += 1;
    }
    starts
}
