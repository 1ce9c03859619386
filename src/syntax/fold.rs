//! Fold analyzer
//!
//! Runs after the tokenizer over the same range and turns keyword styles
//! into per-line fold levels. It is a heuristic over keyword pairs, not a
//! parser: anything it cannot make sense of simply contributes no level
//! change.

use bitflags::bitflags;
use tracing::{debug, trace};

use super::charclass::{is_blank, is_digit, is_fold_word_char, is_line_end, is_space};
use super::comments::CommentWindow;
use super::document::Accessor;
use super::manager::SourceFormat;
use super::tokens::StyleCode;
use super::wordlist::WordBuf;

bitflags! {
    /// Flags packed above the level number
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FoldFlags: i32 {
        /// Line has no visible characters
        const WHITE = 0x1000;
        /// Line opens a foldable block
        const HEADER = 0x2000;
    }
}

/// A line's fold level: nesting number in the low 12 bits plus `FoldFlags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldLevel(i32);

impl FoldLevel {
    /// Level of an unnested line
    pub const BASE: FoldLevel = FoldLevel(0x400);
    pub const NUMBER_MASK: i32 = 0x0FFF;

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Nesting number with the flags masked off
    pub const fn number(self) -> i32 {
        self.0 & Self::NUMBER_MASK
    }

    /// Nesting depth relative to `BASE`
    pub const fn depth(self) -> i32 {
        self.number() - Self::BASE.0
    }

    pub fn flags(self) -> FoldFlags {
        FoldFlags::from_bits_truncate(self.0)
    }

    pub fn is_header(self) -> bool {
        self.flags().contains(FoldFlags::HEADER)
    }

    pub fn is_white(self) -> bool {
        self.flags().contains(FoldFlags::WHITE)
    }

    pub fn with_flags(self, flags: FoldFlags) -> Self {
        Self(self.0 | flags.bits())
    }

    /// Same flags, number shifted by `delta`
    pub const fn plus(self, delta: i32) -> Self {
        Self(self.0 + delta)
    }
}

impl Default for FoldLevel {
    fn default() -> Self {
        Self::BASE
    }
}

/// Capacity of the folder's word buffers
const FOLD_WORD_LEN: usize = 31;

type FoldWord = WordBuf<FOLD_WORD_LEN>;

const BLOCK_OPENERS: &[&str] = &[
    "associate",
    "block",
    "blockdata",
    "select",
    "selecttype",
    "selectcase",
    "do",
    "enum",
    "function",
    "interface",
    "module",
    "program",
    "subroutine",
    "then",
    "critical",
    "submodule",
];

const BLOCK_CLOSERS: &[&str] = &[
    "endassociate",
    "endblock",
    "endblockdata",
    "endselect",
    "enddo",
    "endenum",
    "endif",
    "endforall",
    "endfunction",
    "endinterface",
    "endmodule",
    "endprogram",
    "endsubroutine",
    "endtype",
    "endwhere",
    "endcritical",
    "endsubmodule",
    "endteam",
];

/// Level change for keyword `word` following `prev` on the same statement.
/// `next` is the next non-blank byte after the word.
pub fn classify_fold_point(word: &str, prev: &str, next: u8) -> i32 {
    if prev == "module" && (word == "subroutine" || word == "function") {
        0
    } else if BLOCK_OPENERS.contains(&word) || (word == "type" && next != b'(') {
        if prev == "end" {
            0
        } else {
            1
        }
    } else if (word == "end" && next != b'=')
        || BLOCK_CLOSERS.contains(&word)
        || (prev == "module" && word == "procedure")
    {
        -1
    } else if prev == "end" && word == "if" {
        0
    } else if prev == "type" && word == "is" {
        -1
    } else if (prev == "end" && word == "procedure") || word == "endprocedure" {
        // module procedures in submodules are not folded
        1
    } else if prev == "change" && word == "team" {
        1
    } else {
        0
    }
}

/// Recompute fold levels for the lines of `start..start + length`.
///
/// The pass begins one line before `start` to pick up the nesting depth and
/// only writes levels that actually change.
pub fn fold<A: Accessor + ?Sized>(
    start: usize,
    length: usize,
    init_style: StyleCode,
    styler: &mut A,
    format: SourceFormat,
) {
    let end_pos = start.saturating_add(length).min(styler.length());
    let start_line = styler.line_from_position(start);
    let line = start_line.saturating_sub(1);
    let start_pos = styler.line_start(line);
    let init_style = match start_pos.checked_sub(1) {
        Some(prev) => styler.style_at(prev),
        None => init_style,
    };
    debug!(start, length, restart = start_pos, ?format, "fold pass");

    let mut folder = Folder::new(styler, format, line, start_line > 0, end_pos);
    folder.run(start_pos, init_style);
}

struct Folder<'a, A: Accessor + ?Sized> {
    styler: &'a mut A,
    format: SourceFormat,
    fold_comment: bool,
    fold_compact: bool,
    end_pos: usize,
    line_current: usize,
    level_current: i32,
    level_delta_next: i32,
    visible_chars: usize,
    /// Still on the context line before the requested range
    is_prev_line: bool,
    prev_word: FoldWord,
    window: CommentWindow,
}

impl<'a, A: Accessor + ?Sized> Folder<'a, A> {
    fn new(styler: &'a mut A, format: SourceFormat, line: usize, is_prev_line: bool, end_pos: usize) -> Self {
        let fold_comment = styler.property_int("fold.comment", 1) != 0;
        let fold_compact = styler.property_int("fold.compact", 1) != 0;

        let window = if fold_comment {
            let window = CommentWindow::cold_start(&*styler, format, line);
            window.check_back(&mut *styler, line);
            window
        } else {
            CommentWindow::default()
        };
        // a pass from the top must not inherit a level an earlier pass dedented
        let level_current = if is_prev_line {
            styler.level_at(line).number()
        } else {
            FoldLevel::BASE.number()
        };

        Self {
            styler,
            format,
            fold_comment,
            fold_compact,
            end_pos,
            line_current: line,
            level_current,
            level_delta_next: 0,
            visible_chars: 0,
            is_prev_line,
            prev_word: FoldWord::new(),
            window,
        }
    }

    fn char_at(&self, pos: usize) -> u8 {
        self.styler.safe_char_at(pos, b' ')
    }

    fn run(&mut self, start_pos: usize, init_style: StyleCode) {
        let mut ch_next = self.char_at(start_pos);
        let mut style_next = self.styler.style_at(start_pos);
        let mut style = init_style;
        let mut last_start = start_pos;

        for i in start_pos..self.end_pos {
            let ch = ch_next;
            ch_next = self.char_at(i + 1);

            let mut ch_next_non_blank = ch_next;
            let mut next_eol = is_line_end(ch_next_non_blank);
            let mut j = i + 1;
            while is_blank(ch_next_non_blank) && j < self.end_pos {
                j += 1;
                ch_next_non_blank = self.char_at(j);
                if is_line_end(ch_next_non_blank) {
                    next_eol = true;
                }
            }
            if !next_eol && j == self.end_pos {
                next_eol = true;
            }

            let style_prev = style;
            style = style_next;
            style_next = self.styler.style_at(i + 1);
            let at_eol = (ch == b'\r' && ch_next != b'\n') || ch == b'\n';

            let after_separator = (self.format.is_fixed() && style_prev == StyleCode::Continuation)
                || style_prev == StyleCode::Default
                || style_prev == StyleCode::Operator;
            if after_separator && (style == StyleCode::Word || style == StyleCode::Label) {
                last_start = i;
            }

            if style == StyleCode::Word && is_fold_word_char(ch) && !is_fold_word_char(ch_next) {
                let mut word = FoldWord::new();
                for pos in last_start..=i {
                    if !word.push(self.char_at(pos)) {
                        break;
                    }
                }
                self.on_word(&word, i, ch_next_non_blank, next_eol);
                self.prev_word = word;
            }

            if at_eol {
                self.end_line();
            }
            if !is_space(ch) {
                self.visible_chars += 1;
            }
        }
    }

    /// Apply the level rules for a keyword ending at `end`
    fn on_word(&mut self, word: &FoldWord, end: usize, next: u8, next_eol: bool) {
        let prev_word = self.prev_word;
        let w = word.as_str();
        let prev = prev_word.as_str();

        if w == "forall" || (w == "where" && prev != "else") {
            if prev != "end" && self.opens_block(end) {
                self.level_delta_next += 1;
            }
            return;
        }

        let delta = classify_fold_point(w, prev, next);
        self.level_delta_next += delta;

        if (w == "else" && (next_eol || next == b'!'))
            || (prev == "else" && w == "where")
            || w == "elsewhere"
        {
            self.dedent_current();
            self.level_delta_next += 1;
        } else if (prev == "else" && w == "if") || w == "elseif" {
            self.dedent_current();
        } else if (prev == "select" && (w == "case" || w == "type"))
            || w == "selectcase"
            || w == "selecttype"
        {
            self.level_delta_next += 2;
        } else if (w == "case" && next == b'(')
            || (prev == "case" && w == "default")
            || (prev == "type" && w == "is")
            || (prev == "class" && (w == "is" || w == "default"))
        {
            self.dedent_current();
            self.level_delta_next += 1;
        } else if (prev == "end" && w == "select") || w == "endselect" {
            self.level_delta_next -= 2;
        }

        // Labelled do loops ("do 100 i = 1, 10") would need label matching
        // to close reliably, so they do not fold.
        if w == "do" && is_digit(next) {
            self.level_delta_next -= delta;
        }
    }

    /// Put the current line itself one level out (else, case, ...)
    fn dedent_current(&mut self) {
        if !self.is_prev_line {
            self.level_current -= 1;
        }
    }

    /// For `forall`/`where` ending at `end`: true if the parenthesised
    /// control expression is followed only by a line end (block form),
    /// false if a statement body follows on the same logical line.
    fn opens_block(&mut self, end: usize) -> bool {
        let mut j = end + 1;
        let mut ch = self.char_at(j);
        while ch != b'(' && j < self.end_pos {
            j += 1;
            ch = self.char_at(j);
        }

        let brace_style = self.styler.style_at(j);
        let mut depth = 1;
        while j < self.end_pos {
            j += 1;
            if self.styler.style_at(j) == brace_style {
                match self.char_at(j) {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                if depth == 0 {
                    break;
                }
            }
        }

        let mut line = self.line_current;
        let last_line = self.styler.line_count() - 1;
        while j < self.end_pos {
            j += 1;
            let ch = self.char_at(j);
            let style = self.styler.style_at(j);
            if !is_line_end(ch) && (style == StyleCode::Comment || is_blank(ch)) {
                continue;
            }
            match self.format {
                SourceFormat::Fixed => {
                    if !is_line_end(ch) {
                        return false;
                    }
                    if line < last_line {
                        line += 1;
                        j = self.styler.line_start(line);
                        let mark = self.char_at(j + 5);
                        if self.styler.style_at(j + 5) == StyleCode::Continuation
                            && !is_blank(mark)
                            && mark != b'0'
                        {
                            j += 5;
                            continue;
                        }
                        return true;
                    }
                }
                SourceFormat::Free => {
                    if ch == b'&' && style == StyleCode::Continuation {
                        j = self.skip_continuation(j + 1);
                        continue;
                    }
                    return is_line_end(ch);
                }
            }
        }
        false
    }

    /// Position just before the first significant byte of the line that
    /// continues the one containing `pos` (after an optional leading `&`).
    fn skip_continuation(&self, mut pos: usize) -> usize {
        let len = self.styler.length();
        let at = |p: usize| self.char_at(p);
        while pos < len && !is_line_end(at(pos)) {
            pos += 1;
        }
        if pos < len && at(pos) == b'\r' {
            pos += 1;
        }
        if pos < len && at(pos) == b'\n' {
            pos += 1;
        }
        while pos < len && is_blank(at(pos)) {
            pos += 1;
        }
        if pos < len && at(pos) == b'&' {
            pos += 1;
            while pos < len && is_blank(at(pos)) {
                pos += 1;
            }
        }
        pos - 1
    }

    /// Emit the level of the line just finished and move to the next one
    fn end_line(&mut self) {
        if self.fold_comment {
            self.level_delta_next += self.window.level_delta();
        }

        let mut flags = FoldFlags::empty();
        if self.visible_chars == 0 && self.fold_compact {
            flags |= FoldFlags::WHITE;
        }
        if self.level_delta_next > 0 && self.visible_chars > 0 {
            flags |= FoldFlags::HEADER;
        }
        let lev = FoldLevel::from_raw(self.level_current).with_flags(flags);
        if lev != self.styler.level_at(self.line_current) {
            trace!(line = self.line_current, level = lev.raw(), "set fold level");
            self.styler.set_level(self.line_current, lev);
        }

        self.line_current += 1;
        self.level_current += self.level_delta_next;
        self.level_delta_next = 0;
        self.visible_chars = 0;
        self.prev_word.clear();
        self.is_prev_line = false;

        if self.fold_comment {
            self.window.advance(&*self.styler, self.format, self.line_current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::document::Document;
    use crate::syntax::lexer::tokenize;
    use crate::syntax::wordlist::KeywordSets;

    fn folded(text: &str, format: SourceFormat) -> Document {
        let mut doc = Document::from_text(text);
        let len = doc.len();
        let words = KeywordSets::fortran();
        tokenize(0, len, StyleCode::Default, &words, &mut doc, format);
        fold(0, len, StyleCode::Default, &mut doc, format);
        doc
    }

    fn depths(doc: &Document) -> Vec<i32> {
        doc.levels().iter().map(|l| l.depth()).collect()
    }

    fn headers(doc: &Document) -> Vec<bool> {
        doc.levels().iter().map(|l| l.is_header()).collect()
    }

    #[test]
    fn test_fold_level_packing() {
        let level = FoldLevel::BASE.plus(2).with_flags(FoldFlags::HEADER);
        assert_eq!(level.raw(), 0x2402);
        assert_eq!(level.number(), 0x402);
        assert_eq!(level.depth(), 2);
        assert!(level.is_header());
        assert!(!level.is_white());
        assert_eq!(FoldLevel::from_raw(-1).number(), 0x0FFF);
        assert_eq!(FoldLevel::default(), FoldLevel::BASE);
    }

    #[test]
    fn test_classify_fold_point() {
        assert_eq!(classify_fold_point("program", "", b'x'), 1);
        assert_eq!(classify_fold_point("program", "end", b'x'), 0);
        assert_eq!(classify_fold_point("end", "", b'\n'), -1);
        assert_eq!(classify_fold_point("end", "", b'='), 0);
        assert_eq!(classify_fold_point("endif", "", b'\n'), -1);
        assert_eq!(classify_fold_point("type", "", b'('), 0);
        assert_eq!(classify_fold_point("type", "", b'p'), 1);
        assert_eq!(classify_fold_point("subroutine", "module", b'f'), 0);
        assert_eq!(classify_fold_point("procedure", "module", b'f'), -1);
        assert_eq!(classify_fold_point("procedure", "end", b'\n'), 1);
        assert_eq!(classify_fold_point("team", "change", b'('), 1);
        assert_eq!(classify_fold_point("is", "type", b'('), -1);
        assert_eq!(classify_fold_point("if", "end", b'\n'), 0);
        assert_eq!(classify_fold_point("print", "", b'*'), 0);
    }

    #[test]
    fn test_program_block() {
        let doc = folded("program p\n  x = 1\nend program p\n", SourceFormat::Free);
        assert_eq!(depths(&doc)[..3], [0, 1, 1]);
        assert_eq!(headers(&doc)[..3], [true, false, false]);
        // the line after the block is back at the outer level
        assert_eq!(doc.levels()[3].depth(), 0);
    }

    #[test]
    fn test_if_else_block() {
        let text = "if (a) then\n  x = 1\nelse\n  x = 2\nend if\ny = 3\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(depths(&doc)[..6], [0, 1, 0, 1, 1, 0]);
        assert_eq!(headers(&doc)[..6], [true, false, true, false, false, false]);
    }

    #[test]
    fn test_else_if_stays_level() {
        let text = "if (a) then\n  x = 1\nelse if (b) then\n  x = 2\nendif\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(depths(&doc)[..5], [0, 1, 0, 1, 1]);
        assert!(doc.levels()[2].is_header());
    }

    #[test]
    fn test_select_case() {
        let text = "select case (n)\ncase (1)\n  x = 1\ncase default\n  x = 2\nend select\nz = 0\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(depths(&doc)[..7], [0, 2, 3, 2, 3, 3, 0]);
    }

    #[test]
    fn test_labelled_do_does_not_fold() {
        let text = "do 10 i = 1, 3\n  x = i\n10 continue\ny = 1\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(depths(&doc)[..4], [0, 0, 0, 0]);
        assert!(!doc.levels()[0].is_header());

        let doc = folded("do i = 1, 3\n  x = i\nend do\n", SourceFormat::Free);
        assert_eq!(depths(&doc)[..4], [0, 1, 1, 0]);
    }

    #[test]
    fn test_where_statement_vs_construct() {
        let doc = folded("where (a > 0) b = 1\nc = 2\n", SourceFormat::Free);
        assert_eq!(depths(&doc)[..2], [0, 0]);

        let doc = folded("where (a > 0)\n  b = 1\nend where\nc = 2\n", SourceFormat::Free);
        assert_eq!(depths(&doc)[..4], [0, 1, 1, 0]);
        assert!(doc.levels()[0].is_header());
    }

    #[test]
    fn test_forall_with_free_continuation() {
        let text = "forall (i = 1:n, &\n        j = 1:m)\n  a(i, j) = 0\nend forall\nb = 1\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(doc.levels()[0].depth(), 0);
        assert_eq!(doc.levels()[2].depth(), 1);
        assert_eq!(doc.levels()[4].depth(), 0);
    }

    #[test]
    fn test_comment_run_folds() {
        let text = "x = 1\n! one\n! two\n! three\ny = 2\n";
        let doc = folded(text, SourceFormat::Free);
        assert_eq!(depths(&doc)[..5], [0, 0, 1, 1, 0]);
        assert_eq!(headers(&doc)[..5], [false, true, false, false, false]);

        let doc = folded("x = 1\n! one\n! two\ny = 2\n", SourceFormat::Free);
        assert!(doc.levels().iter().all(|l| !l.is_header()));
    }

    #[test]
    fn test_fold_comment_property_disables_runs() {
        let mut doc = Document::from_text("x = 1\n! one\n! two\n! three\ny = 2\n");
        doc.set_property("fold.comment", 0);
        let len = doc.len();
        tokenize(0, len, StyleCode::Default, &KeywordSets::fortran(), &mut doc, SourceFormat::Free);
        fold(0, len, StyleCode::Default, &mut doc, SourceFormat::Free);
        assert!(doc.levels().iter().all(|l| !l.is_header()));
    }

    #[test]
    fn test_compact_marks_blank_lines() {
        let doc = folded("x = 1\n\ny = 2\n", SourceFormat::Free);
        assert!(doc.levels()[1].is_white());
        assert!(!doc.levels()[0].is_white());

        let mut doc = Document::from_text("x = 1\n\ny = 2\n");
        doc.set_property("fold.compact", 0);
        let len = doc.len();
        fold(0, len, StyleCode::Default, &mut doc, SourceFormat::Free);
        assert!(!doc.levels()[1].is_white());
    }

    #[test]
    fn test_fixed_format_blocks() {
        let text = "      PROGRAM P\n      IF (A) THEN\n        X = 1\n      ENDIF\n      END\n";
        let doc = folded(text, SourceFormat::Fixed);
        assert_eq!(depths(&doc)[..5], [0, 1, 2, 2, 1]);
        assert_eq!(doc.levels()[5].depth(), 0);
    }

    #[test]
    fn test_refold_is_stable() {
        let text = "module m\ncontains\n  subroutine s\n    call t\n  end subroutine s\nend module m\n";
        let mut doc = folded(text, SourceFormat::Free);
        let first = doc.levels().to_vec();
        let len = doc.len();
        fold(0, len, StyleCode::Default, &mut doc, SourceFormat::Free);
        assert_eq!(doc.levels(), &first[..]);
    }

    #[test]
    fn test_refold_from_dedented_first_line() {
        for (text, format) in [
            ("else\n  x = 1\nend if\n", SourceFormat::Free),
            ("case (1)\n  x = 1\n", SourceFormat::Free),
            ("  elsewhere\n", SourceFormat::Free),
            ("      ELSE\n      X=1\n", SourceFormat::Fixed),
        ] {
            let mut doc = folded(text, format);
            let first = doc.levels().to_vec();
            let len = doc.len();
            for _ in 0..2 {
                fold(0, len, StyleCode::Default, &mut doc, format);
                assert_eq!(doc.levels(), &first[..], "{:?}", text);
            }
        }
    }
}
