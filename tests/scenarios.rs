//! End-to-end styling and folding of small Fortran sources

use pretty_assertions::assert_eq;

use fortfold::syntax::{Accessor, Document, FoldLevel, SourceFormat, StyleCode, SyntaxManager};
use fortfold::Config;

use StyleCode::*;

fn styled(text: &str, format: SourceFormat) -> Document {
    let mut doc = Document::from_text(text);
    SyntaxManager::new(format).restyle_all(&mut doc);
    doc
}

/// Style of each byte of `line`, without its line end
fn line_styles(doc: &Document, line: usize) -> Vec<StyleCode> {
    let start = doc.line_start(line);
    let end = start + doc.line_text(line).len();
    doc.style_codes(start..end)
}

fn depths(doc: &Document) -> Vec<i32> {
    (0..doc.line_count()).map(|line| doc.level_at(line).depth()).collect()
}

fn repeat(code: StyleCode, n: usize) -> Vec<StyleCode> {
    vec![code; n]
}

#[test]
fn subroutine_is_styled_and_folded() {
    let doc = styled("subroutine foo()\n  x = 1\nend subroutine foo\n", SourceFormat::Free);

    let mut first = repeat(Word, 10);
    first.push(Default);
    first.extend(repeat(Identifier, 3));
    first.extend(repeat(Operator, 2));
    assert_eq!(line_styles(&doc, 0), first);

    assert_eq!(
        line_styles(&doc, 1),
        vec![Default, Default, Identifier, Default, Operator, Default, Number]
    );

    let mut last = repeat(Word, 3);
    last.push(Default);
    last.extend(repeat(Word, 10));
    last.push(Default);
    last.extend(repeat(Identifier, 3));
    assert_eq!(line_styles(&doc, 2), last);

    let levels: Vec<FoldLevel> = (0..3).map(|line| doc.level_at(line)).collect();
    assert_eq!(levels[0], FoldLevel::BASE.with_flags(fortfold::FoldFlags::HEADER));
    assert_eq!(levels[1], FoldLevel::BASE.plus(1));
    assert_eq!(levels[2], FoldLevel::BASE.plus(1));
    // after the end line the nesting is back where it started
    assert_eq!(doc.level_at(3), FoldLevel::BASE);
}

#[test]
fn nested_blocks_return_to_outer_level() {
    let text = "\
module shapes
contains
  function area(r) result(a)
    real :: r, a
    a = 3.14 * r * r
  end function area
  subroutine show(r)
    print *, area(r)
  end subroutine show
end module shapes
";
    let doc = styled(text, SourceFormat::Free);
    assert_eq!(depths(&doc), vec![0, 1, 1, 2, 2, 2, 1, 2, 2, 1]);
    let headers: Vec<usize> = (0..doc.line_count())
        .filter(|&line| doc.level_at(line).is_header())
        .collect();
    assert_eq!(headers, vec![0, 2, 6]);
}

#[test]
fn comment_block_folds_once() {
    let text = "x = 1\n! one\n! two\n! three\n! four\ny = 2\n";
    let doc = styled(text, SourceFormat::Free);
    assert_eq!(depths(&doc), vec![0, 0, 1, 1, 1, 0]);
    let headers: Vec<bool> = (0..6).map(|line| doc.level_at(line).is_header()).collect();
    assert_eq!(headers, vec![false, true, false, false, false, false]);
}

#[test]
fn fixed_form_columns() {
    let text = format!(
        "C     HEADER COMMENT\n      PROGRAM MAIN\n      S = 'ABC\n     +DEF'\n{:<72}IGNORED\n      END\n",
        "      X = 1"
    );
    let doc = styled(&text, SourceFormat::Fixed);

    assert_eq!(line_styles(&doc, 0), repeat(Comment, 20));
    assert_eq!(&line_styles(&doc, 1)[6..13], &repeat(Word, 7)[..]);
    // continuation mark, then the string picks up where it left off
    assert_eq!(&line_styles(&doc, 3)[5..], &[Continuation, String1, String1, String1, String1][..]);
    assert_eq!(&line_styles(&doc, 4)[72..], &repeat(Comment, 7)[..]);
    assert_eq!(depths(&doc), vec![0, 0, 1, 1, 1, 1]);
}

#[test]
fn strings_with_quotes_and_open_ends() {
    let doc = styled("a = 'it''s'\nb = 'open\nc = \"x\"\n", SourceFormat::Free);
    assert_eq!(&line_styles(&doc, 0)[4..], &repeat(String1, 7)[..]);
    assert_eq!(&line_styles(&doc, 1)[4..], &repeat(StringEol, 5)[..]);
    assert_eq!(doc.style_at(doc.line_start(2) - 1), StringEol);
    assert_eq!(line_styles(&doc, 2)[0], Identifier);
    assert_eq!(&line_styles(&doc, 2)[4..], &repeat(String2, 3)[..]);
}

#[test]
fn editing_session_matches_fresh_styling() {
    let manager = SyntaxManager::new(SourceFormat::Free);
    let mut doc = Document::from_text("program p\n  x = 1\nend program p\n");
    manager.restyle_all(&mut doc);

    // open a loop, then close it a keystroke at a time
    let at = doc.line_start(2);
    doc.insert(at, b"  do i = 1, 3\n    x = x + i\n");
    let len = doc.len();
    manager.ensure_styled(&mut doc, len);

    let mut pos = doc.line_start(4);
    for &ch in b"  end do\n" {
        doc.insert(pos, &[ch]);
        pos += 1;
        let len = doc.len();
        manager.ensure_styled(&mut doc, len);
    }

    let fresh = styled(&String::from_utf8_lossy(doc.as_bytes()), SourceFormat::Free);
    assert_eq!(doc.styles(), fresh.styles());
    assert_eq!(doc.levels(), fresh.levels());
    assert_eq!(depths(&doc), vec![0, 1, 1, 2, 2, 1]);
}

#[test]
fn config_controls_folding_and_keywords() {
    let config = Config::parse("[fold]\ncomment = false\n[keywords]\nextended = \"mylib\"\n").unwrap();
    let manager = SyntaxManager::with_words(SourceFormat::Free, config.keyword_sets());

    let mut doc = Document::from_text("! a\n! b\n! c\n! d\ncall mylib()\n");
    config.apply_to(&mut doc);
    manager.restyle_all(&mut doc);

    assert!((0..doc.line_count()).all(|line| !doc.level_at(line).is_header()));
    assert_eq!(&line_styles(&doc, 4)[5..10], &repeat(Word3, 5)[..]);
}
