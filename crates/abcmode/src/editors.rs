//! Structural rewrites: region wrapping, bar alignment, chord skeletons.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use crate::classify::line_kind;
use crate::document::Document;
use crate::error::Result;

type PResult<T> = winnow::ModalResult<T>;

/// Paired markers placed around a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapKind {
    Slur,
    Crescendo,
    Diminuendo,
    Repeat,
}

impl WrapKind {
    pub fn markers(self) -> (&'static str, &'static str) {
        match self {
            WrapKind::Slur => ("(", ")"),
            WrapKind::Crescendo => ("!crescendo(!", "!crescendo)!"),
            WrapKind::Diminuendo => ("!diminuendo(!", "!diminuendo)!"),
            WrapKind::Repeat => ("|:", ":|"),
        }
    }
}

/// Replace `start..end` with `prefix + original + suffix`.
///
/// Endpoints may come in either order. Returns the range of the new text.
pub fn wrap_region(
    document: &mut Document,
    start: usize,
    end: usize,
    prefix: &str,
    suffix: &str,
) -> Result<Range<usize>> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    document.check_position(start)?;
    document.check_position(end)?;

    let wrapped = format!("{}{}{}", prefix, &document.text()[start..end], suffix);
    let len = wrapped.len();
    document.replace_range(start..end, &wrapped)?;
    Ok(start..start + len)
}

pub fn wrap_with(
    document: &mut Document,
    start: usize,
    end: usize,
    kind: WrapKind,
) -> Result<Range<usize>> {
    let (prefix, suffix) = kind.markers();
    wrap_region(document, start, end, prefix, suffix)
}

/// `"..."` chord annotation, quotes included.
fn chord_annotation<'a>(input: &mut &'a str) -> PResult<&'a str> {
    ('"', take_till(0.., '"'), '"').take().parse_next(input)
}

/// `!...!` decoration, bangs included.
fn decoration<'a>(input: &mut &'a str) -> PResult<&'a str> {
    ('!', take_till(0.., ['!', '\n']), '!').take().parse_next(input)
}

/// A bar token: `|`, `||`, `[|`, `|]`, `|:`, `:|`, `::|`, `|1`, `:|[2`, ...
fn bar_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    (
        opt('['),
        take_while(0.., ':'),
        '|',
        take_while(0.., ['|', ':']),
        opt(']'),
        opt((opt('['), take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SkeletonPiece<'a> {
    Keep(&'a str),
    Rest,
    Drop,
    Copy(char),
}

fn skeleton_piece<'a>(input: &mut &'a str) -> PResult<SkeletonPiece<'a>> {
    alt((
        chord_annotation.map(SkeletonPiece::Keep),
        one_of(('A'..='G', 'a'..='g')).value(SkeletonPiece::Rest),
        one_of(['\'', '-', '(', ')', '^', '_', '=', '[', ']']).value(SkeletonPiece::Drop),
        any.map(SkeletonPiece::Copy),
    ))
    .parse_next(input)
}

/// Reduce a music line to its chord and rhythm skeleton.
///
/// Quoted chords are copied verbatim, note letters become `x`, ties, slurs,
/// accidentals and brackets are dropped, everything else is copied.
pub fn extract_chord_skeleton(line: &str) -> String {
    let mut input = line;
    let mut output = String::with_capacity(line.len());
    while !input.is_empty() {
        match skeleton_piece.parse_next(&mut input) {
            Ok(SkeletonPiece::Keep(chord)) => output.push_str(chord),
            Ok(SkeletonPiece::Rest) => output.push('x'),
            Ok(SkeletonPiece::Drop) => {}
            Ok(SkeletonPiece::Copy(c)) => output.push(c),
            Err(_) => break,
        }
    }
    output
}

/// Rewrite the line containing `position` as its chord skeleton.
pub fn extract_chord_skeleton_at(document: &mut Document, position: usize) -> Result<bool> {
    document.check_position(position)?;
    let range = document.line_range(position);
    let line = &document.text()[range.clone()];
    let skeleton = extract_chord_skeleton(line);
    if skeleton == line {
        return Ok(false);
    }
    document.replace_range(range, &skeleton)?;
    Ok(true)
}

/// A music line split at its bar tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BarRow {
    /// Text before the first bar
    lead: String,
    /// (bar token, text up to the next bar)
    cells: Vec<(String, String)>,
    comment: Option<String>,
}

impl BarRow {
    fn parse(line: &str) -> BarRow {
        let mut row = BarRow::default();
        let mut text = String::new();
        let mut input = line;

        while let Some(c) = input.chars().next() {
            if c == '%' {
                row.comment = Some(input.to_string());
                break;
            }
            let mut ahead = input;
            if let Ok(bar) = bar_token.parse_next(&mut ahead) {
                row.push_text(std::mem::take(&mut text));
                row.cells.push((bar.to_string(), String::new()));
                input = ahead;
                continue;
            }
            let mut ahead = input;
            if let Ok(quoted) = alt((chord_annotation, decoration)).parse_next(&mut ahead) {
                text.push_str(quoted);
                input = ahead;
                continue;
            }
            text.push(c);
            input = &input[c.len_utf8()..];
        }
        row.push_text(text);
        row
    }

    fn push_text(&mut self, text: String) {
        match self.cells.last_mut() {
            Some((_, segment)) => *segment = text,
            None => self.lead = text,
        }
    }

    /// Pass one: one space each side of every bar, none at the line ends.
    fn normalized(&self) -> String {
        let mut out = self.lead.trim().to_string();
        for (bar, segment) in &self.cells {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(bar);
            let segment = segment.trim();
            if !segment.is_empty() {
                out.push(' ');
                out.push_str(segment);
            }
        }
        self.push_comment(&mut out);
        out
    }

    fn push_comment(&self, out: &mut String) {
        if let Some(comment) = &self.comment {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(comment);
        }
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad_to(out: &mut String, column: usize) {
    let current = width(out);
    if current < column {
        out.extend(std::iter::repeat(' ').take(column - current));
    }
}

/// Normalize the spacing around bar tokens on one line. Lines without bars
/// come back unchanged.
pub fn normalize_bar_spacing(line: &str) -> String {
    let row = BarRow::parse(line);
    if row.cells.is_empty() {
        return line.to_string();
    }
    row.normalized()
}

/// Pass two: pad normalized lines so the k-th bar, and the text right after
/// it, start in the same column on every line.
fn align_rows(lines: &[String]) -> Vec<String> {
    let rows: Vec<BarRow> = lines.iter().map(|line| BarRow::parse(line)).collect();
    let mut outs: Vec<String> = rows.iter().map(|row| row.lead.trim().to_string()).collect();
    let max_bars = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);

    for k in 0..max_bars {
        let bar_column = rows
            .iter()
            .zip(&outs)
            .filter(|(row, _)| row.cells.len() > k)
            .map(|(_, out)| width(out) + usize::from(!out.is_empty()))
            .max()
            .unwrap_or(0);
        for (row, out) in rows.iter().zip(outs.iter_mut()) {
            if let Some((bar, _)) = row.cells.get(k) {
                pad_to(out, bar_column);
                out.push_str(bar);
            }
        }

        let text_column = rows
            .iter()
            .zip(&outs)
            .filter(|(row, _)| row.cells.get(k).is_some_and(|(_, seg)| !seg.trim().is_empty()))
            .map(|(_, out)| width(out) + 1)
            .max()
            .unwrap_or(0);
        for (row, out) in rows.iter().zip(outs.iter_mut()) {
            if let Some((_, segment)) = row.cells.get(k) {
                let segment = segment.trim();
                if !segment.is_empty() {
                    pad_to(out, text_column);
                    out.push_str(segment);
                }
            }
        }
    }

    for (row, out) in rows.iter().zip(outs.iter_mut()) {
        row.push_comment(out);
    }
    outs
}

fn is_music_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('%') && line_kind(trimmed).is_none()
}

/// Normalize and column-align bar lines on every music line touching
/// `start..end`. Field, directive, lyric, comment and blank lines are left
/// alone. Returns the number of lines that changed.
pub fn align_bars(document: &mut Document, start: usize, end: usize) -> Result<usize> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    document.check_position(start)?;
    document.check_position(end)?;

    let region = document.line_range(start).start..document.line_range(end).end;
    let original = &document.text()[region.clone()];
    let raw_lines: Vec<&str> = original.split('\n').collect();

    let mut music: Vec<(usize, String, &str)> = Vec::new();
    for (i, raw) in raw_lines.iter().enumerate() {
        let (body, ending) = match raw.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (*raw, ""),
        };
        if is_music_line(body) && !BarRow::parse(body).cells.is_empty() {
            music.push((i, normalize_bar_spacing(body), ending));
        }
    }

    let normalized: Vec<String> = music.iter().map(|(_, line, _)| line.clone()).collect();
    let aligned = align_rows(&normalized);

    let mut lines: Vec<String> = raw_lines.iter().map(|s| s.to_string()).collect();
    let mut changed = 0;
    for ((i, _, ending), new_body) in music.iter().zip(aligned) {
        let new_line = format!("{}{}", new_body, ending);
        if lines[*i] != new_line {
            lines[*i] = new_line;
            changed += 1;
        }
    }

    if changed > 0 {
        let replacement = lines.join("\n");
        debug!(lines = changed, "aligned bar lines");
        document.replace_range(region, &replacement)?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_skeleton_example() {
        assert_eq!(extract_chord_skeleton("ABC|\"Cmaj\"def"), "xxx|\"Cmaj\"xxx");
    }

    #[test]
    fn test_skeleton_drops_markers() {
        assert_eq!(extract_chord_skeleton("(^c2 _B,)- [CEG]2 =f'"), "x2 x, xxx2 x");
        assert_eq!(extract_chord_skeleton("z2 \"G7\"G/2A/2 | Z4"), "z2 \"G7\"x/2x/2 | Z4");
    }

    #[test]
    fn test_skeleton_unclosed_quote_is_plain() {
        assert_eq!(extract_chord_skeleton("\"Am c"), "\"xm x");
    }

    #[test]
    fn test_skeleton_is_idempotent() {
        let once = extract_chord_skeleton("|:\"D\"d2fa \"A\"g2e2:|");
        assert_eq!(extract_chord_skeleton(&once), once);
    }

    #[test]
    fn test_skeleton_keeps_bars_digits_spaces() {
        let line = "|| 1 2 |: 34 :| ";
        assert_eq!(extract_chord_skeleton(line), line);
    }

    #[test]
    fn test_skeleton_at_rewrites_one_line() {
        let mut doc = Document::new("K:G\nGAB|\"D\"d\n");
        assert!(extract_chord_skeleton_at(&mut doc, 5).unwrap());
        // The K: line is outside the target line
        assert_eq!(doc.text(), "K:G\nxxx|\"D\"x\n");
        assert!(!extract_chord_skeleton_at(&mut doc, 5).unwrap());
    }

    #[test]
    fn test_wrap_region_slur() {
        let mut doc = Document::new("abc def");
        let range = wrap_with(&mut doc, 4, 7, WrapKind::Slur).unwrap();
        assert_eq!(doc.text(), "abc (def)");
        assert_eq!(range, 4..9);

        let wrapped = &doc.text()[range];
        assert_eq!(&wrapped[1..wrapped.len() - 1], "def");
    }

    #[test]
    fn test_wrap_region_swapped_endpoints() {
        let mut doc = Document::new("abcd");
        wrap_with(&mut doc, 3, 1, WrapKind::Crescendo).unwrap();
        assert_eq!(doc.text(), "a!crescendo(!bc!crescendo)!d");
    }

    #[test]
    fn test_wrap_region_repeat_and_diminuendo() {
        let mut doc = Document::new("GABc");
        wrap_with(&mut doc, 0, 4, WrapKind::Repeat).unwrap();
        assert_eq!(doc.text(), "|:GABc:|");
        wrap_with(&mut doc, 2, 6, WrapKind::Diminuendo).unwrap();
        assert_eq!(doc.text(), "|:!diminuendo(!GABc!diminuendo)!:|");
    }

    #[test]
    fn test_wrap_region_rejects_bad_positions() {
        let mut doc = Document::new("abc");
        assert!(wrap_region(&mut doc, 0, 10, "(", ")").is_err());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_bar_token_variants() {
        for token in ["|", "||", "[|", "|]", "|:", ":|", "::|", "|1", ":|2", ":|[2", "|:]"] {
            let mut input = token;
            assert_eq!(bar_token.parse_next(&mut input).unwrap(), token);
            assert!(input.is_empty(), "{token} left {input}");
        }
    }

    #[test]
    fn test_normalize_bar_spacing() {
        assert_eq!(normalize_bar_spacing("abc|de  |f|"), "abc | de | f |");
        assert_eq!(normalize_bar_spacing("|:abc   :|"), "|: abc :|");
        assert_eq!(normalize_bar_spacing("  [CEG]|\"G|7\"B"), "[CEG] | \"G|7\"B");
        assert_eq!(normalize_bar_spacing("ab|c %note"), "ab | c %note");
        assert_eq!(normalize_bar_spacing("no bars here "), "no bars here ");
    }

    #[test]
    fn test_align_bars_columns() {
        let mut doc = Document::new("X:1\nK:C\nabc|de|f|\na|bcdef|g|\n");
        let len = doc.len();
        let changed = align_bars(&mut doc, 0, len).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            doc.text(),
            "X:1\nK:C\nabc | de    | f |\na   | bcdef | g |\n"
        );
    }

    #[test]
    fn test_align_bars_is_idempotent() {
        let mut doc = Document::new("|:GABc|d2e2:|\n\"Am\"A|B|\nw:la|la\n");
        let len = doc.len();
        align_bars(&mut doc, 0, len).unwrap();
        let once = doc.text().to_string();
        let len = doc.len();
        assert_eq!(align_bars(&mut doc, 0, len).unwrap(), 0);
        assert_eq!(doc.text(), once);
        // Lyrics are skipped
        assert!(once.ends_with("w:la|la\n"));
    }

    fn assert_aligns_once(text: &str) -> String {
        let mut doc = Document::new(text);
        let len = doc.len();
        align_bars(&mut doc, 0, len).unwrap();
        let once = doc.text().to_string();
        let len = doc.len();
        assert_eq!(align_bars(&mut doc, 0, len).unwrap(), 0, "{once:?}");
        assert_eq!(doc.text(), once);
        once
    }

    #[test]
    fn test_align_bars_skips_indented_fields() {
        let once = assert_aligns_once("abc|def|\n  w:la|la la|\n");
        assert_eq!(once, "abc | def |\n  w:la|la la|\n");

        let once = assert_aligns_once("  K:G|\nab|c|\n\tW:x|y\n");
        assert_eq!(once, "  K:G|\nab | c |\n\tW:x|y\n");
    }

    #[test]
    fn test_align_bars_idempotent_with_indented_music() {
        let once = assert_aligns_once("   abc|d|\nab  |  cdef|\n");
        assert_eq!(once, "abc | d    |\nab  | cdef |\n");
    }

    #[test]
    fn test_align_bars_idempotent_with_leading_bar() {
        let once = assert_aligns_once("|:abc|d:|\nxyz|a|b|\n");
        assert_eq!(once, "    |: abc | d :|\nxyz |  a   | b |\n");
    }

    #[test]
    fn test_align_bars_idempotent_with_comments() {
        let once = assert_aligns_once("ab|c %note\nabcd|e|f\n");
        assert_eq!(once, "ab   | c %note\nabcd | e | f\n");
    }

    #[test]
    fn test_align_bars_only_touches_region() {
        let text = "a|b\nccc|d\n";
        let mut doc = Document::new(text);
        align_bars(&mut doc, 0, 1).unwrap();
        assert_eq!(doc.text(), "a | b\nccc|d\n");
    }
}
