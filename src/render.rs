//! Output rendering for the command line front end
//!
//! Three views of a styled document: highlighted source, per-line fold
//! levels, and raw style runs.

use std::io::Write;

use crossterm::queue;
use crossterm::style::{self as ct, Attribute, SetAttribute, SetForegroundColor};

use crate::error::Result;
use crate::syntax::{Accessor, Color, Document, Style, SyntaxManager};

/// Map a palette color onto crossterm's; `None` leaves the terminal default
fn to_crossterm(color: Color) -> Option<ct::Color> {
    let color = match color {
        Color::Default => return None,
        Color::Black => ct::Color::Black,
        Color::Red => ct::Color::DarkRed,
        Color::Green => ct::Color::DarkGreen,
        Color::Yellow => ct::Color::DarkYellow,
        Color::Blue => ct::Color::DarkBlue,
        Color::Magenta => ct::Color::DarkMagenta,
        Color::Cyan => ct::Color::DarkCyan,
        Color::White => ct::Color::Grey,
        Color::BrightBlack => ct::Color::DarkGrey,
        Color::BrightRed => ct::Color::Red,
        Color::BrightGreen => ct::Color::Green,
        Color::BrightYellow => ct::Color::Yellow,
        Color::BrightBlue => ct::Color::Blue,
        Color::BrightMagenta => ct::Color::Magenta,
        Color::BrightCyan => ct::Color::Cyan,
        Color::BrightWhite => ct::Color::White,
    };
    Some(color)
}

fn set_style<W: Write>(out: &mut W, style: Style) -> Result<()> {
    if let Some(color) = to_crossterm(style.fg) {
        queue!(out, SetForegroundColor(color))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    Ok(())
}

/// First position at or after `pos` that does not continue a UTF-8 sequence
fn char_boundary(bytes: &[u8], mut pos: usize, limit: usize) -> usize {
    while pos < limit && bytes[pos] & 0xC0 == 0x80 {
        pos += 1;
    }
    pos
}

/// Write the document with each style run coloured. With `color` off the
/// source is written unchanged.
pub fn highlighted<W: Write>(out: &mut W, doc: &mut Document, manager: &SyntaxManager, color: bool) -> Result<()> {
    let len = doc.len();
    manager.ensure_styled(doc, len);
    if !color {
        out.write_all(doc.as_bytes())?;
        return Ok(());
    }

    for line in 0..doc.lines() {
        let line_end = doc.line_range(line).end;
        for span in manager.spans(doc, line) {
            let bytes = doc.as_bytes();
            // a character split between two runs goes with the run it starts in
            let range = span.range();
            let start = char_boundary(bytes, range.start, line_end);
            let end = char_boundary(bytes, range.end, line_end);
            if start >= end {
                continue;
            }
            let style = span.style();
            if style.is_default() {
                out.write_all(&bytes[start..end])?;
            } else {
                set_style(out, style)?;
                out.write_all(&bytes[start..end])?;
                queue!(out, SetAttribute(Attribute::Reset))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// One line per source line: number, depth, flags, text
pub fn folds<W: Write>(out: &mut W, doc: &mut Document, manager: &SyntaxManager) -> Result<()> {
    let len = doc.len();
    manager.ensure_styled(doc, len);
    for line in 0..doc.line_count() {
        let level = doc.level_at(line);
        let mut flags = String::new();
        if level.is_header() {
            flags.push('H');
        }
        if level.is_white() {
            flags.push('W');
        }
        if flags.is_empty() {
            flags.push('-');
        }
        writeln!(
            out,
            "{:>5} {:#05x} {:<2} {}",
            line + 1,
            level.number(),
            flags,
            doc.line_text(line)
        )?;
    }
    Ok(())
}

/// One line per style run: byte range and style name
pub fn spans<W: Write>(out: &mut W, doc: &mut Document, manager: &SyntaxManager) -> Result<()> {
    for line in 0..doc.line_count() {
        for span in manager.spans(doc, line) {
            writeln!(out, "{}:{}..{} {}", line + 1, span.start, span.end, span.code.name())?;
        }
    }
    Ok(())
}
