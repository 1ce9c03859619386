//! Comment-run window used by the folder
//!
//! A run of aligned comment lines becomes a fold block of its own. The
//! folder keeps a sliding window of the comment state of the three lines
//! before and after the current one, built once when a pass starts and then
//! shifted a line at a time.

use super::charclass::{fold_lower, is_blank, is_line_end};
use super::document::Accessor;
use super::fold::{FoldFlags, FoldLevel};
use super::manager::SourceFormat;

/// Lines kept on each side of the current line
pub const COMMENT_LINES: usize = 3;

/// Aligned comment lines needed before a run folds
pub const COMMENT_RUN_MIN: usize = 3;

const SLOTS: usize = 2 * COMMENT_LINES + 1;

/// Column of the comment marker if `line` is a whole-line comment.
///
/// Leading blanks are skipped; free format recognises `!`, fixed format
/// additionally `c`, `C` or `*` in column 0.
pub fn line_comment_column<A: Accessor + ?Sized>(
    styler: &A,
    format: SourceFormat,
    line: usize,
) -> Option<usize> {
    let len = styler.length();
    let mut pos = styler.line_start(line);
    let mut col = 0;
    while pos < len {
        let ch = styler.safe_char_at(pos, b' ');
        if ch == b'!' || (format.is_fixed() && col == 0 && (fold_lower(ch) == b'c' || ch == b'*')) {
            return Some(col);
        }
        if !is_blank(ch) || is_line_end(ch) {
            return None;
        }
        pos += 1;
        col += 1;
    }
    None
}

/// Ring of per-line comment columns centred on the current line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentWindow {
    slots: [Option<usize>; SLOTS],
    /// Slot holding the oldest line (offset -COMMENT_LINES)
    head: usize,
}

impl CommentWindow {
    /// Comment state at `offset` lines from the current one
    pub fn at(&self, offset: isize) -> Option<usize> {
        let k = offset + COMMENT_LINES as isize;
        if !(0..SLOTS as isize).contains(&k) {
            return None;
        }
        self.slots[(self.head + k as usize) % SLOTS]
    }

    pub fn current(&self) -> Option<usize> {
        self.at(0)
    }

    /// Drop the oldest line and append a new look-ahead line
    pub fn shift(&mut self, next: Option<usize>) {
        self.slots[self.head] = next;
        self.head = (self.head + 1) % SLOTS;
    }

    /// Build the window around `line` from scratch
    pub fn cold_start<A: Accessor + ?Sized>(styler: &A, format: SourceFormat, line: usize) -> Self {
        let total = styler.line_count();
        let mut window = Self::default();
        let mut set = |offset: isize, value: Option<usize>| {
            let k = (offset + COMMENT_LINES as isize) as usize;
            window.slots[k] = value;
        };

        for i in 1..=COMMENT_LINES {
            let Some(back) = line.checked_sub(i) else { break };
            let column = line_comment_column(styler, format, back);
            set(-(i as isize), column);
            if column.is_none() {
                break;
            }
        }
        for i in 1..=COMMENT_LINES {
            let ahead = line + i;
            if ahead >= total {
                break;
            }
            set(i as isize, line_comment_column(styler, format, ahead));
        }
        set(0, line_comment_column(styler, format, line));
        window
    }

    /// Slide forward so `line` becomes current
    pub fn advance<A: Accessor + ?Sized>(&mut self, styler: &A, format: SourceFormat, line: usize) {
        let total = styler.line_count();
        if line >= total {
            return;
        }
        let ahead = line + COMMENT_LINES;
        let next = if ahead < total {
            line_comment_column(styler, format, ahead)
        } else {
            None
        };
        self.shift(next);
    }

    /// Level change contributed at the end of the current line: +1 when a
    /// run starts here, -1 when one ends here.
    pub fn level_delta(&self) -> i32 {
        let Some(col) = self.current() else {
            return 0;
        };
        let aligned = |offset: isize| self.at(offset) == Some(col);
        let run = (COMMENT_RUN_MIN - 1) as isize;

        if !aligned(1) {
            if (1..=run).all(|i| aligned(-i)) {
                return -1;
            }
        } else if !aligned(-1) && (1..=run).all(aligned) {
            return 1;
        }
        0
    }

    /// Re-derive the levels of the lines leading up to `line` when a pass
    /// starts mid-document, so a comment run that straddles the restart
    /// point opens (or stops opening) a block.
    pub fn check_back<A: Accessor + ?Sized>(&self, styler: &mut A, line: usize) {
        let span = COMMENT_LINES as isize - 1;
        let mut lev_changed = false;
        let first = line.saturating_sub(span as usize);
        let mut lev = styler.level_at(first).number();

        for offset in -span..=0 {
            let Some(line_c) = line.checked_add_signed(offset) else {
                continue;
            };
            let col = self.at(offset);
            if col.is_some() && self.at(offset - 1) != col {
                let run = (COMMENT_RUN_MIN - 1) as isize;
                let increase = (1..=run).all(|j| self.at(offset + j) == col);
                lev = styler.level_at(line_c).number();
                if increase {
                    let header = FoldLevel::from_raw(lev).with_flags(FoldFlags::HEADER);
                    if header != styler.level_at(line_c) {
                        styler.set_level(line_c, header);
                    }
                    lev += 1;
                    for l in line_c + 1..=line {
                        if FoldLevel::from_raw(lev) != styler.level_at(l) {
                            styler.set_level(l, FoldLevel::from_raw(lev));
                        }
                    }
                    break;
                }
                if FoldLevel::from_raw(lev) != styler.level_at(line_c) {
                    styler.set_level(line_c, FoldLevel::from_raw(lev));
                }
                lev_changed = true;
            } else if lev_changed && col.is_some() && FoldLevel::from_raw(lev) != styler.level_at(line_c) {
                styler.set_level(line_c, FoldLevel::from_raw(lev));
            }
        }
    }
}
