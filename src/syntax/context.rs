//! Streaming style cursor
//!
//! `StyleContext` walks a byte range one position at a time, remembers the
//! style that is "open", and paints the bytes it has passed whenever the
//! state changes. Painting is deferred to segment boundaries so a state can
//! be relabelled (`change_state`) after the fact, which is how identifiers
//! become keywords and open strings become `StringEol`.

use super::charclass::fold_lower;
use super::document::Accessor;
use super::tokens::StyleCode;
use super::wordlist::WordBuf;

pub struct StyleContext<'a, A: Accessor + ?Sized> {
    styler: &'a mut A,
    end_pos: usize,
    length_document: usize,
    /// First byte not yet painted
    start_seg: usize,
    current_line: usize,
    line_doc_end: usize,
    line_start_next: usize,
    pub current_pos: usize,
    pub at_line_start: bool,
    pub at_line_end: bool,
    pub state: StyleCode,
    pub ch_prev: u8,
    pub ch: u8,
    pub ch_next: u8,
}

impl<'a, A: Accessor + ?Sized> StyleContext<'a, A> {
    /// Start a cursor at `start` covering `length` bytes.
    ///
    /// A range that reaches the end of the document is extended by one
    /// position so the last token sees a terminator.
    pub fn new(start: usize, length: usize, init_style: StyleCode, styler: &'a mut A) -> Self {
        let length_document = styler.length();
        let mut end_pos = start + length;
        if end_pos == length_document {
            end_pos += 1;
        }
        let current_line = styler.line_from_position(start);
        let line_start_next = styler.line_start(current_line + 1);
        let line_doc_end = styler.line_from_position(length_document);
        let at_line_start = styler.line_start(current_line) == start;

        let mut sc = Self {
            styler,
            end_pos,
            length_document,
            start_seg: start,
            current_line,
            line_doc_end,
            line_start_next,
            current_pos: start,
            at_line_start,
            at_line_end: false,
            state: init_style,
            ch_prev: 0,
            ch: 0,
            ch_next: 0,
        };
        sc.ch = sc.styler.safe_char_at(start, 0);
        sc.get_next_char();
        sc
    }

    fn get_next_char(&mut self) {
        self.ch_next = self.styler.safe_char_at(self.current_pos + 1, 0);
        self.at_line_end = if self.current_line < self.line_doc_end {
            self.current_pos + 1 >= self.line_start_next
        } else {
            self.current_pos >= self.line_start_next
        };
    }

    /// Exclusive end of the segment ending just before the cursor
    fn segment_end(&self) -> usize {
        self.current_pos.min(self.length_document)
    }

    fn colour_to(&mut self, end: usize, state: StyleCode) {
        if end > self.start_seg {
            self.styler.set_style_range(self.start_seg..end, state);
            self.start_seg = end;
        }
    }

    pub fn more(&self) -> bool {
        self.current_pos < self.end_pos
    }

    pub fn forward(&mut self) {
        if self.current_pos < self.end_pos {
            self.at_line_start = self.at_line_end;
            if self.at_line_start {
                self.current_line += 1;
                self.line_start_next = self.styler.line_start(self.current_line + 1);
            }
            self.ch_prev = self.ch;
            self.current_pos += 1;
            self.ch = self.ch_next;
            self.get_next_char();
        } else {
            self.at_line_start = false;
            self.ch_prev = b' ';
            self.ch = b' ';
            self.ch_next = b' ';
            self.at_line_end = true;
        }
    }

    /// Paint everything before the cursor with the open state, then open `state`
    pub fn set_state(&mut self, state: StyleCode) {
        let end = self.segment_end();
        self.colour_to(end, self.state);
        self.state = state;
    }

    /// Step over the current byte, then `set_state`
    pub fn forward_set_state(&mut self, state: StyleCode) {
        self.forward();
        self.set_state(state);
    }

    /// Relabel the open segment without painting
    pub fn change_state(&mut self, state: StyleCode) {
        self.state = state;
    }

    /// Paint the final segment
    pub fn complete(&mut self) {
        let end = self.segment_end();
        self.colour_to(end, self.state);
    }

    /// Byte `n` positions from the cursor, 0 outside the document
    pub fn get_relative(&self, n: isize) -> u8 {
        self.styler.relative_char_at(self.current_pos, n, 0)
    }

    /// Case-insensitive match of a lowercase literal starting at the cursor
    pub fn match_ignore_case(&self, s: &str) -> bool {
        s.bytes().enumerate().all(|(n, expected)| {
            let actual = match n {
                0 => self.ch,
                1 => self.ch_next,
                _ => self.styler.safe_char_at(self.current_pos + n, 0),
            };
            fold_lower(actual) == expected
        })
    }

    /// Lowercased bytes of the open segment, truncated to `N`
    pub fn current_lowered<const N: usize>(&self) -> WordBuf<N> {
        let mut word = WordBuf::new();
        for pos in self.start_seg..self.current_pos {
            if !word.push(self.styler.safe_char_at(pos, 0)) {
                break;
            }
        }
        word
    }

    /// Column of the cursor within its line
    pub fn column(&self) -> usize {
        self.current_pos
            .saturating_sub(self.styler.line_start(self.current_line))
    }
}
