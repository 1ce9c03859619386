//! Tokenizer / styler
//!
//! Classifies every byte of a range into a `StyleCode` and writes the codes
//! back through the accessor. One engine serves both source layouts: fixed
//! format gives columns 0-5 and 72+ a positional meaning, free format uses
//! `&` for continuation instead.
//!
//! A pass may start anywhere; it backs up to a line that begins a statement
//! so that restyling a small edit gives the same result as restyling the
//! whole document.

use tracing::debug;

use super::charclass::{
    fold_lower, is_blank, is_digit, is_line_end, is_operator, is_space, is_space_or_tab,
    is_word_char, is_word_start,
};
use super::context::StyleContext;
use super::document::Accessor;
use super::manager::SourceFormat;
use super::tokens::StyleCode;
use super::wordlist::KeywordSets;

/// Capacity of the identifier buffer used for word-list lookup
const IDENT_LEN: usize = 99;

/// How far past a free-format `&` we look for a comment or line end
const CONTINUATION_LOOKAHEAD: isize = 132;

/// Upper bound on lines walked back over a continued statement
pub const MAX_CONTINUATION_LINES: usize = 255;

/// First column past the fixed-format statement field
const FIXED_COMMENT_COLUMN: usize = 72;

/// Fixed-format column holding the continuation mark
const FIXED_CONTINUATION_COLUMN: usize = 5;

/// Directive prefixes recognised after a fixed-format comment marker
const FIXED_DIRECTIVES: &[&str] = &[
    "cdec$", "*dec$", "!dec$", "cdir$", "*dir$", "!dir$", "cms$", "*ms$", "!ms$",
];

/// Directive prefixes recognised after `!`
const FREE_DIRECTIVES: &[&str] = &["!dec$", "!dir$", "!ms$"];

/// Style `start..start + length`.
///
/// `init_style` is the style in effect before `start`; it is re-derived
/// from the document once the pass has backed up to a statement start.
pub fn tokenize<A: Accessor + ?Sized>(
    start: usize,
    length: usize,
    init_style: StyleCode,
    words: &KeywordSets,
    styler: &mut A,
    format: SourceFormat,
) {
    let end = start.saturating_add(length).min(styler.length());
    let restart = restart_position(&*styler, start.min(end), format);
    let init_style = match restart.checked_sub(1) {
        Some(prev) => styler.style_at(prev),
        None => init_style,
    };
    debug!(start, length, restart, ?format, "tokenize pass");

    let mut sc = StyleContext::new(restart, end - restart, init_style, styler);
    let mut lexer = Tokenizer {
        format,
        words,
        non_blank: 0,
        prev_state: StyleCode::Default,
    };
    while sc.more() {
        lexer.step(&mut sc);
        sc.forward();
    }
    sc.complete();
}

/// Where a pass asked to start at `start` actually begins.
///
/// Backs up to the line of the nearest keyword, looking no further than the
/// start of the preceding line, then over any lines that continue an earlier
/// statement.
pub fn restart_position<A: Accessor + ?Sized>(styler: &A, start: usize, format: SourceFormat) -> usize {
    let start_line = styler.line_from_position(start);
    let floor = styler.line_start(start_line.saturating_sub(1));

    let mut pos = start;
    while pos > floor && styler.style_at(pos) != StyleCode::Word {
        pos -= 1;
    }
    let mut line = if styler.style_at(pos) == StyleCode::Word {
        styler.line_from_position(pos)
    } else {
        start_line
    };

    for _ in 0..MAX_CONTINUATION_LINES {
        let previous = match format {
            SourceFormat::Fixed => fixed_continued_from(styler, line),
            SourceFormat::Free => continued_from(styler, line),
        };
        match previous {
            Some(previous) => line = previous,
            None => break,
        }
    }
    styler.line_start(line)
}

/// For a fixed-format `line` that continues a statement, or that sits
/// inside one as a comment line, the line before it.
fn fixed_continued_from<A: Accessor + ?Sized>(styler: &A, line: usize) -> Option<usize> {
    let previous = line.checked_sub(1)?;
    let start = styler.line_start(line);
    (is_fixed_continuation_line(styler, start) || is_fixed_comment_line(styler, start)).then_some(previous)
}

/// True if the fixed-format line starting at `line_start` has no statement
/// field: a comment marker, or a line end before column 5.
fn is_fixed_comment_line<A: Accessor + ?Sized>(styler: &A, line_start: usize) -> bool {
    let first = styler.safe_char_at(line_start, b'\n');
    if fold_lower(first) == b'c' || first == b'*' {
        return true;
    }
    (0..FIXED_CONTINUATION_COLUMN).any(|col| {
        let ch = styler.safe_char_at(line_start + col, b'\n');
        ch == b'!' || is_line_end(ch)
    }) || styler.safe_char_at(line_start + FIXED_CONTINUATION_COLUMN, b'\n') == b'!'
}

/// True if the fixed-format line starting at `line_start` carries a
/// continuation mark in column 5 (and is not a comment line).
fn is_fixed_continuation_line<A: Accessor + ?Sized>(styler: &A, line_start: usize) -> bool {
    if line_start == 0 {
        return false;
    }
    let first = styler.safe_char_at(line_start, b'\n');
    if fold_lower(first) == b'c' || first == b'*' {
        return false;
    }
    for col in 0..FIXED_CONTINUATION_COLUMN {
        let ch = styler.safe_char_at(line_start + col, b'\n');
        if is_line_end(ch) || ch == b'!' {
            return false;
        }
    }
    let mark = styler.safe_char_at(line_start + FIXED_CONTINUATION_COLUMN, b'\n');
    !is_space(mark) && mark != b'0' && mark != b'!'
}

/// For a free-format `line`, the earlier line whose trailing `&` carries
/// on into it (skipping blank lines in between).
fn continued_from<A: Accessor + ?Sized>(styler: &A, line: usize) -> Option<usize> {
    let mut previous = line.checked_sub(1)?;
    loop {
        let start = styler.line_start(previous);
        let end = styler.line_start(previous + 1);
        let last = (start..end)
            .rev()
            .find(|&pos| !is_space(styler.safe_char_at(pos, b' ')));
        match last {
            Some(pos) => {
                let live = styler.safe_char_at(pos, b' ') == b'&' && styler.style_at(pos) != StyleCode::Comment;
                return live.then_some(previous);
            }
            None => previous = previous.checked_sub(1)?,
        }
    }
}

struct Tokenizer<'w> {
    format: SourceFormat,
    words: &'w KeywordSets,
    /// Non-blank bytes seen so far on the current line
    non_blank: usize,
    /// String state to resume after a fixed-format continuation mark
    prev_state: StyleCode,
}

impl Tokenizer<'_> {
    fn step<A: Accessor + ?Sized>(&mut self, sc: &mut StyleContext<'_, A>) {
        if sc.at_line_start {
            self.non_blank = 0;
            sc.set_state(StyleCode::Default);
        }
        if !is_space_or_tab(sc.ch) {
            self.non_blank += 1;
        }

        if self.format.is_fixed() {
            let column = sc.column();
            if column <= FIXED_CONTINUATION_COLUMN || column >= FIXED_COMMENT_COLUMN {
                self.fixed_columns(sc, column);
                return;
            }
        } else if sc.ch == b'&' && sc.state != StyleCode::Comment {
            self.free_continuation(sc);
        }

        if sc.ch == b'#' && self.non_blank == 1 {
            sc.set_state(StyleCode::Preprocessor);
            skip_to_line_end(sc);
        }

        self.finish_token(sc);
        if sc.state == StyleCode::Default {
            self.start_token(sc);
        }
    }

    /// Columns with a fixed meaning: comment markers, labels, the
    /// continuation column and the ignored tail past column 71.
    fn fixed_columns<A: Accessor + ?Sized>(&mut self, sc: &mut StyleContext<'_, A>, column: usize) {
        let ch = sc.ch;
        if (column == 0 && (fold_lower(ch) == b'c' || ch == b'*')) || ch == b'!' {
            let directive =
                FIXED_DIRECTIVES.iter().any(|d| sc.match_ignore_case(d)) || sc.ch_next == b'$';
            sc.set_state(if directive {
                StyleCode::Preprocessor
            } else {
                StyleCode::Comment
            });
            skip_to_line_end(sc);
        } else if column >= FIXED_COMMENT_COLUMN {
            sc.set_state(StyleCode::Comment);
            skip_to_line_end(sc);
        } else if column < FIXED_CONTINUATION_COLUMN {
            sc.set_state(if is_digit(ch) {
                StyleCode::Label
            } else {
                StyleCode::Default
            });
        } else if !is_line_end(ch) {
            sc.set_state(StyleCode::Continuation);
            if !is_space(ch) && ch != b'0' {
                sc.forward_set_state(self.prev_state);
            } else {
                // not a continuation line, so no string carries into it
                self.prev_state = StyleCode::Default;
            }
        } else {
            self.prev_state = StyleCode::Default;
            sc.set_state(StyleCode::Default);
        }
    }

    /// A free-format `&`: either a trailing continuation (followed only by
    /// blanks and a line end, or by a comment) or an ordinary operator.
    fn free_continuation<A: Accessor + ?Sized>(&mut self, sc: &mut StyleContext<'_, A>) {
        let mut ch_temp = b' ';
        let mut j = 1;
        while is_blank(ch_temp) && j < CONTINUATION_LOOKAHEAD {
            ch_temp = sc.get_relative(j);
            j += 1;
        }

        if ch_temp == b'!' {
            sc.set_state(StyleCode::Continuation);
            sc.forward_set_state(if sc.ch_next == b'!' {
                StyleCode::Comment
            } else {
                StyleCode::Default
            });
        } else if is_line_end(ch_temp) {
            let resume = sc.state;
            sc.set_state(StyleCode::Continuation);
            sc.forward_set_state(StyleCode::Default);
            while is_space(sc.ch) && sc.more() {
                sc.forward();
                if sc.at_line_start {
                    self.non_blank = 0;
                }
                if !is_space_or_tab(sc.ch) {
                    self.non_blank += 1;
                }
            }
            if sc.ch == b'&' {
                sc.set_state(StyleCode::Continuation);
                sc.forward();
            }
            sc.set_state(resume);
        }
    }

    /// Close the open token if the current byte ends it
    fn finish_token<A: Accessor + ?Sized>(&mut self, sc: &mut StyleContext<'_, A>) {
        match sc.state {
            StyleCode::Operator => sc.set_state(StyleCode::Default),
            StyleCode::Number => {
                if !(is_word_char(sc.ch) || sc.ch == b'\'' || sc.ch == b'"' || sc.ch == b'.') {
                    sc.set_state(StyleCode::Default);
                }
            }
            StyleCode::Identifier => {
                if !is_word_char(sc.ch) || sc.ch == b'%' {
                    let word = sc.current_lowered::<IDENT_LEN>();
                    if let Some(keyword) = self.words.classify(word.as_str()) {
                        sc.change_state(keyword);
                    }
                    sc.set_state(StyleCode::Default);
                }
            }
            StyleCode::Comment | StyleCode::Preprocessor => {
                if is_line_end(sc.ch) {
                    sc.set_state(StyleCode::Default);
                }
            }
            StyleCode::String1 => {
                self.prev_state = StyleCode::String1;
                if sc.ch == b'\'' {
                    if sc.ch_next == b'\'' {
                        sc.forward();
                    } else {
                        sc.forward_set_state(StyleCode::Default);
                        self.prev_state = StyleCode::Default;
                    }
                } else if sc.at_line_end {
                    // closed by the next line start
                    sc.change_state(StyleCode::StringEol);
                }
            }
            StyleCode::String2 => {
                self.prev_state = StyleCode::String2;
                if sc.at_line_end {
                    sc.change_state(StyleCode::StringEol);
                } else if sc.ch == b'"' {
                    if sc.ch_next == b'"' {
                        sc.forward();
                    } else {
                        sc.forward_set_state(StyleCode::Default);
                        self.prev_state = StyleCode::Default;
                    }
                }
            }
            StyleCode::Operator2 => {
                if sc.ch == b'.' {
                    sc.forward_set_state(StyleCode::Default);
                }
            }
            StyleCode::Continuation => sc.set_state(StyleCode::Default),
            StyleCode::Label => {
                let too_wide = if self.format.is_fixed() {
                    sc.column() > 4
                } else {
                    self.non_blank > 5
                };
                if !is_digit(sc.ch) || too_wide {
                    sc.set_state(StyleCode::Default);
                }
            }
            StyleCode::Default | StyleCode::StringEol | StyleCode::Word | StyleCode::Word2 | StyleCode::Word3 => {}
        }
    }

    /// Open a new token at the current byte
    fn start_token<A: Accessor + ?Sized>(&mut self, sc: &mut StyleContext<'_, A>) {
        let ch = sc.ch;
        let next = sc.ch_next;
        if ch == b'!' {
            let directive = FREE_DIRECTIVES.iter().any(|d| sc.match_ignore_case(d)) || next == b'$';
            sc.set_state(if directive {
                StyleCode::Preprocessor
            } else {
                StyleCode::Comment
            });
        } else if !self.format.is_fixed() && is_digit(ch) && self.non_blank == 1 {
            sc.set_state(StyleCode::Label);
        } else if is_digit(ch) || (ch == b'.' && is_digit(next)) {
            sc.set_state(StyleCode::Number);
        } else if matches!(fold_lower(ch), b'b' | b'o' | b'z') && (next == b'"' || next == b'\'') {
            // boz literal: b'1010', o"17", z'ff'
            sc.set_state(StyleCode::Number);
            sc.forward();
        } else if ch == b'.' && next.is_ascii_alphabetic() {
            sc.set_state(StyleCode::Operator2);
        } else if is_word_start(ch) {
            sc.set_state(StyleCode::Identifier);
        } else if ch == b'"' {
            sc.set_state(StyleCode::String2);
        } else if ch == b'\'' {
            sc.set_state(StyleCode::String1);
        } else if is_operator(ch) {
            sc.set_state(StyleCode::Operator);
        }
    }
}

fn skip_to_line_end<A: Accessor + ?Sized>(sc: &mut StyleContext<'_, A>) {
    while !sc.at_line_end && sc.more() {
        sc.forward();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::document::Document;
    use crate::syntax::wordlist::WordList;
    use StyleCode::*;

    fn lexed(text: &str, format: SourceFormat) -> Document {
        let mut doc = Document::from_text(text);
        let len = doc.len();
        tokenize(0, len, StyleCode::Default, &KeywordSets::fortran(), &mut doc, format);
        doc
    }

    /// Style of the byte at `pos`
    fn at(doc: &Document, pos: usize) -> StyleCode {
        doc.style_at(pos)
    }

    /// Style of every byte of the first occurrence of `needle`
    fn styles_of(doc: &Document, needle: &str) -> Vec<StyleCode> {
        let text = doc.as_bytes();
        let start = text
            .windows(needle.len())
            .position(|w| w == needle.as_bytes())
            .unwrap_or_else(|| panic!("{needle:?} not in document"));
        doc.style_codes(start..start + needle.len())
    }

    fn all(code: StyleCode, n: usize) -> Vec<StyleCode> {
        vec![code; n]
    }

    #[test]
    fn test_subroutine_styles() {
        let doc = lexed("subroutine foo()\n  x = 1\nend subroutine foo\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "subroutine"), all(Word, 10));
        assert_eq!(styles_of(&doc, "foo"), all(Identifier, 3));
        assert_eq!(styles_of(&doc, "()"), all(Operator, 2));
        assert_eq!(styles_of(&doc, "x"), all(Identifier, 1));
        assert_eq!(styles_of(&doc, "="), all(Operator, 1));
        assert_eq!(styles_of(&doc, "1"), all(Number, 1));
        assert_eq!(styles_of(&doc, "end"), all(Word, 3));
        assert_eq!(at(&doc, 10), Default);
    }

    #[test]
    fn test_keyword_classes() {
        let words = KeywordSets::new(
            WordList::from_text("call"),
            WordList::from_text("sqrt"),
            WordList::from_text("mylib"),
        );
        let mut doc = Document::from_text("CALL mylib(SQRT(x))\n");
        let len = doc.len();
        tokenize(0, len, Default, &words, &mut doc, SourceFormat::Free);
        assert_eq!(styles_of(&doc, "CALL"), all(Word, 4));
        assert_eq!(styles_of(&doc, "mylib"), all(Word3, 5));
        assert_eq!(styles_of(&doc, "SQRT"), all(Word2, 4));
        assert_eq!(styles_of(&doc, "x"), all(Identifier, 1));
    }

    #[test]
    fn test_doubled_quote_stays_in_string() {
        let doc = lexed("s = 'it''s'\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "'it''s'"), all(String1, 7));
        assert_eq!(at(&doc, 11), Default);

        let doc = lexed("s = \"say \"\"hi\"\"\"\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "\"say \"\"hi\"\"\""), all(String2, 12));
    }

    #[test]
    fn test_unterminated_string_resets_next_line() {
        let doc = lexed("s = 'open\nx = 1\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "'open\n"), all(StringEol, 6));
        assert_eq!(styles_of(&doc, "x"), all(Identifier, 1));
        assert_eq!(styles_of(&doc, "1"), all(Number, 1));
    }

    #[test]
    fn test_comments_and_directives() {
        let doc = lexed("x = 1 ! note\n!DEC$ ATTRIBUTES\n!$omp parallel\n#include 'a'\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "! note"), all(Comment, 6));
        assert_eq!(styles_of(&doc, "!DEC$ ATTRIBUTES"), all(Preprocessor, 16));
        assert_eq!(styles_of(&doc, "!$omp parallel"), all(Preprocessor, 14));
        assert_eq!(styles_of(&doc, "#include 'a'"), all(Preprocessor, 12));
    }

    #[test]
    fn test_numbers_and_dotted_operators() {
        let doc = lexed("y = 1.5e-3_dp + .5 + z'ff'\nif (a .and. b) x = 2\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "1.5e"), all(Number, 4));
        assert_eq!(styles_of(&doc, "3_dp"), all(Number, 4));
        assert_eq!(styles_of(&doc, ".5"), all(Number, 2));
        assert_eq!(styles_of(&doc, "z'ff'"), all(Number, 5));
        assert_eq!(styles_of(&doc, ".and."), all(Operator2, 5));
    }

    #[test]
    fn test_free_format_label() {
        let doc = lexed("100 continue\n  x = 100\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "100 "), vec![Label, Label, Label, Default]);
        assert_eq!(styles_of(&doc, "continue"), all(Word, 8));
        let second = doc.line_start(1);
        assert_eq!(doc.style_codes(second + 6..second + 9), all(Number, 3));
    }

    #[test]
    fn test_free_continuation() {
        let doc = lexed("x = a + &\n    b\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "&"), all(Continuation, 1));
        assert_eq!(styles_of(&doc, "b"), all(Identifier, 1));

        let doc = lexed("x = a + & ! why\n    b\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "&"), all(Continuation, 1));
        assert_eq!(styles_of(&doc, "! why"), all(Comment, 5));
    }

    #[test]
    fn test_free_continuation_inside_string() {
        let doc = lexed("s = 'abc&\n  &def'\ny = 1\n", SourceFormat::Free);
        assert_eq!(styles_of(&doc, "'abc"), all(String1, 4));
        assert_eq!(styles_of(&doc, "def'"), all(String1, 4));
        assert_eq!(styles_of(&doc, "y"), all(Identifier, 1));
    }

    #[test]
    fn test_fixed_format_columns() {
        let text = format!(
            "C     comment line\n  100 CONTINUE\n     &X = 1\n{:<72}TAIL\n",
            "      Y = 2"
        );
        let doc = lexed(&text, SourceFormat::Fixed);
        assert_eq!(styles_of(&doc, "C     comment line"), all(Comment, 18));
        assert_eq!(styles_of(&doc, "100"), all(Label, 3));
        assert_eq!(styles_of(&doc, "CONTINUE"), all(Word, 8));

        let third = doc.line_start(2);
        assert_eq!(at(&doc, third + 5), Continuation);

        let fourth = doc.line_start(3);
        assert_eq!(at(&doc, fourth + 5), Continuation);
        assert_eq!(doc.style_codes(fourth + 72..fourth + 76), all(Comment, 4));
        assert_eq!(styles_of(&doc, "Y"), all(Identifier, 1));
    }

    #[test]
    fn test_fixed_continuation_resumes_string() {
        let text = "      S = 'ABC\n     1DEF'\n      T = 1\n";
        let doc = lexed(text, SourceFormat::Fixed);
        let second = doc.line_start(1);
        assert_eq!(at(&doc, second + 5), Continuation);
        assert_eq!(doc.style_codes(second + 6..second + 10), all(String1, 4));
        assert_eq!(styles_of(&doc, "T"), all(Identifier, 1));
    }

    #[test]
    fn test_fixed_directives() {
        let doc = lexed("CDEC$ ATTRIBUTES DLLEXPORT :: F\n*$OMP PARALLEL\n", SourceFormat::Fixed);
        assert_eq!(doc.style_codes(0..31), all(Preprocessor, 31));
        let second = doc.line_start(1);
        assert_eq!(doc.style_codes(second..second + 14), all(Preprocessor, 14));
    }

    #[test]
    fn test_every_byte_gets_styled() {
        let mut doc = Document::from_text("x = 'a'\n");
        doc.set_style_range(0..8, Word3);
        let len = doc.len();
        tokenize(0, len, Default, &KeywordSets::fortran(), &mut doc, SourceFormat::Free);
        assert!(doc.style_codes(0..len).iter().all(|&c| c != Word3));
    }

    #[test]
    fn test_restart_backs_over_continued_lines() {
        let doc = lexed("x = 1 + &\n  2 + &\n  3\ny = 4\n", SourceFormat::Free);
        let third = doc.line_start(2);
        assert_eq!(restart_position(&doc, third + 1, SourceFormat::Free), 0);
        let fourth = doc.line_start(3);
        assert_eq!(restart_position(&doc, fourth, SourceFormat::Free), fourth);

        // a keyword on the line before pulls the restart back to it
        let doc = lexed("program p\n  x = 1\n", SourceFormat::Free);
        let second = doc.line_start(1);
        assert_eq!(restart_position(&doc, second + 4, SourceFormat::Free), 0);
        // but nothing further back than that line
        let doc = lexed("program p\n  x = 1\n  y = 2\n", SourceFormat::Free);
        let third = doc.line_start(2);
        assert_eq!(restart_position(&doc, third + 4, SourceFormat::Free), third);

        let doc = lexed("      X = 1 +\n     &    2\n      Y = 3\n", SourceFormat::Fixed);
        let second = doc.line_start(1);
        assert_eq!(restart_position(&doc, second + 8, SourceFormat::Fixed), 0);

        let doc = lexed("      S = 'A\nC note\n     1B'\n", SourceFormat::Fixed);
        let third = doc.line_start(2);
        assert_eq!(restart_position(&doc, third, SourceFormat::Fixed), 0);
        let second = doc.line_start(1);
        assert_eq!(restart_position(&doc, second, SourceFormat::Fixed), 0);
    }

    #[test]
    fn test_partial_restyle_matches_full() {
        let text = "program p\n  s = 'a&\n  &b'\n  x = 1 + &\n      2\n  call f(x)\nend program p\n";
        let full = lexed(text, SourceFormat::Free);

        let mut doc = Document::from_text(text);
        let len = doc.len();
        let words = KeywordSets::fortran();
        tokenize(0, len, Default, &words, &mut doc, SourceFormat::Free);
        doc.set_style_range(0..len, Default);
        let mid = doc.line_start(4) + 3;
        tokenize(0, mid, Default, &words, &mut doc, SourceFormat::Free);
        tokenize(mid, len - mid, Default, &words, &mut doc, SourceFormat::Free);
        assert_eq!(doc.styles(), full.styles());
    }
}
