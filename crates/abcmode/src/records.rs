//! Tunes ("records") in a multi-tune document.
//!
//! A record starts at a reference line (`X:<number>`) and runs until the next
//! one or the end of the document. Records are found by scanning on demand;
//! nothing is cached between calls.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use abcconf::SkeletonConfig;

use crate::document::Document;
use crate::error::{ModeError, Result};
use crate::tags::{FieldName, TagTable};

static REFERENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*X[ \t]*:[ \t]*([0-9]+)").unwrap_or_else(|e| panic!("{e}"))
});

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*T[ \t]*:[ \t]*([^%]*)").unwrap_or_else(|e| panic!("{e}"))
});

/// One tune, computed from the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line number of the reference line
    pub line: usize,
    /// Byte offset of the reference line
    pub offset: usize,
    /// Byte offset just past the record (next reference line or end of text)
    pub end: usize,
    pub reference: u64,
    pub title: Option<String>,
}

/// Reference number on a line, if it is a reference line.
///
/// Numbers too large for u64 saturate.
pub fn reference_number(line: &str) -> Option<u64> {
    REFERENCE_LINE
        .captures(line)
        .map(|caps| caps[1].parse().unwrap_or(u64::MAX))
}

/// Title text on a line, if it is a title line. A trailing `%` comment is
/// not part of the title.
pub fn title_text(line: &str) -> Option<&str> {
    TITLE_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end())
}

/// A line of the document with its position.
struct Line<'a> {
    number: usize,
    offset: usize,
    text: &'a str,
}

fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .enumerate()
        .map(move |(i, raw)| {
            let line = Line {
                number: i + 1,
                offset,
                text: raw.trim_end_matches(['\n', '\r']),
            };
            offset += raw.len();
            line
        })
}

/// Read-only record queries over a document's text.
#[derive(Debug, Clone, Copy)]
pub struct RecordIndex<'a> {
    text: &'a str,
}

impl<'a> RecordIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        RecordIndex { text }
    }

    pub fn of(document: &'a Document) -> Self {
        RecordIndex::new(document.text())
    }

    /// (offset, line number, reference) of every reference line.
    fn boundaries(&self) -> impl Iterator<Item = (usize, usize, u64)> + 'a {
        lines(self.text).filter_map(|line| {
            reference_number(line.text).map(|reference| (line.offset, line.number, reference))
        })
    }

    /// Every record in document order.
    pub fn records(&self) -> Vec<Record> {
        let starts: Vec<_> = self.boundaries().collect();
        starts
            .iter()
            .enumerate()
            .map(|(i, &(offset, line, reference))| {
                let end = starts.get(i + 1).map_or(self.text.len(), |next| next.0);
                let title = lines(&self.text[offset..end])
                    .find_map(|l| title_text(l.text))
                    .map(str::to_string);
                Record {
                    line,
                    offset,
                    end,
                    reference,
                    title,
                }
            })
            .collect()
    }

    /// The record containing `position`. A position anywhere on a reference
    /// line belongs to that line's record.
    pub fn record_at(&self, position: usize) -> Result<Record> {
        self.records()
            .into_iter()
            .take_while(|record| record.offset <= position)
            .last()
            .ok_or(ModeError::NoRecordFound)
    }

    /// Reference number of the record containing `position`.
    pub fn current_record_number(&self, position: usize) -> Result<u64> {
        self.boundaries()
            .take_while(|&(offset, _, _)| offset <= position)
            .last()
            .map(|(_, _, reference)| reference)
            .ok_or(ModeError::NoRecordFound)
    }

    /// Start of the first reference line that begins strictly after `position`.
    pub fn next_record_boundary(&self, position: usize) -> Option<usize> {
        self.boundaries()
            .map(|(offset, _, _)| offset)
            .find(|&offset| offset > position)
    }

    /// Start of the last reference line that begins strictly before `position`.
    pub fn previous_record_boundary(&self, position: usize) -> Option<usize> {
        self.boundaries()
            .map(|(offset, _, _)| offset)
            .take_while(|&offset| offset < position)
            .last()
    }

    /// First record carrying `reference`.
    pub fn find_record(&self, reference: u64) -> Option<Record> {
        self.records()
            .into_iter()
            .find(|record| record.reference == reference)
    }

    /// Every title line in document order, as (1-based line number, title).
    pub fn list_titles(&self) -> Vec<(usize, String)> {
        lines(self.text)
            .filter_map(|line| title_text(line.text).map(|title| (line.number, title.to_string())))
            .collect()
    }
}

/// Rewrite every reference line as `<reference marker><N>`, N counting from 1
/// in document order. All other lines, and all line endings, are kept.
///
/// Returns the number of records. The whole rewrite is one undo step and is
/// skipped when nothing would change.
pub fn renumber_all(document: &mut Document, tags: &TagTable) -> usize {
    let marker = tags.marker(FieldName::Reference);
    let mut output = String::with_capacity(document.len());
    let mut count = 0;

    for raw in document.text().split_inclusive('\n') {
        let body = raw.trim_end_matches(['\n', '\r']);
        if reference_number(body).is_some() {
            count += 1;
            output.push_str(marker);
            output.push_str(&count.to_string());
            output.push_str(&raw[body.len()..]);
        } else {
            output.push_str(raw);
        }
    }

    if output != document.text() {
        debug!(records = count, "renumbered tunes");
        document.replace_all(output);
    }
    count
}

/// Insert a new tune header at the cursor and return its reference number.
///
/// The number is one past the record the cursor is in, or 1 before the first
/// record. The cursor ends on the (empty) title line.
pub fn insert_tune_skeleton(
    document: &mut Document,
    tags: &TagTable,
    skeleton: &SkeletonConfig,
) -> Result<u64> {
    let reference = match RecordIndex::of(document).current_record_number(document.cursor()) {
        Ok(current) => current.saturating_add(1),
        Err(_) => 1,
    };

    let at_line_start = document.line_range(document.cursor()).start == document.cursor();
    let lead = if at_line_start { "" } else { "\n" };
    let head = format!(
        "{lead}{}{reference}\n{}",
        tags.marker(FieldName::Reference),
        tags.marker(FieldName::Title)
    );
    let tail = format!(
        "\n{}\n{}{}\n{}{}\n{}{}\n",
        tags.marker(FieldName::Composer),
        tags.marker(FieldName::Meter),
        skeleton.meter,
        tags.marker(FieldName::UnitLength),
        skeleton.unit_length,
        tags.marker(FieldName::Key),
        skeleton.key
    );

    let title_at = document.cursor() + head.len();
    document.insert(&format!("{head}{tail}"));
    document.set_cursor(title_at)?;
    debug!(reference, "inserted tune skeleton");
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOOK: &str = "% tunebook\nX:2\nT:First\nK:G\nabc|\n\nX: 5 % old\nT:Second\nT:Alt title\nK:D\ndef|\n";

    #[test]
    fn test_reference_number() {
        assert_eq!(reference_number("X:12"), Some(12));
        assert_eq!(reference_number("  X :\t7 extra"), Some(7));
        assert_eq!(reference_number("X:"), None);
        assert_eq!(reference_number("T:X:1"), None);
    }

    #[test]
    fn test_records() {
        let index = RecordIndex::new(BOOK);
        let records = index.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].reference, 2);
        assert_eq!(records[0].title.as_deref(), Some("First"));
        assert_eq!(records[1].reference, 5);
        assert_eq!(records[1].title.as_deref(), Some("Second"));
        assert_eq!(records[0].end, records[1].offset);
        assert_eq!(records[1].end, BOOK.len());
    }

    #[test]
    fn test_current_record_number() {
        let index = RecordIndex::new(BOOK);
        assert!(matches!(
            index.current_record_number(0),
            Err(ModeError::NoRecordFound)
        ));

        let first = BOOK.find("X:2").unwrap();
        assert_eq!(index.current_record_number(first).unwrap(), 2);
        assert_eq!(index.current_record_number(first + 2).unwrap(), 2);

        let second = BOOK.find("X: 5").unwrap();
        assert_eq!(index.current_record_number(second - 1).unwrap(), 2);
        assert_eq!(index.current_record_number(BOOK.len()).unwrap(), 5);
    }

    #[test]
    fn test_current_record_stable_on_next_line() {
        let index = RecordIndex::new(BOOK);
        for record in index.records() {
            let next_line = BOOK[record.offset..].find('\n').unwrap() + record.offset + 1;
            assert_eq!(
                index.current_record_number(next_line).unwrap(),
                index.current_record_number(record.offset).unwrap()
            );
        }
    }

    #[test]
    fn test_record_boundaries() {
        let index = RecordIndex::new(BOOK);
        let first = BOOK.find("X:2").unwrap();
        let second = BOOK.find("X: 5").unwrap();

        assert_eq!(index.next_record_boundary(0), Some(first));
        assert_eq!(index.next_record_boundary(first), Some(second));
        assert_eq!(index.next_record_boundary(second), None);

        assert_eq!(index.previous_record_boundary(BOOK.len()), Some(second));
        assert_eq!(index.previous_record_boundary(second), Some(first));
        assert_eq!(index.previous_record_boundary(first), None);
    }

    #[test]
    fn test_list_titles() {
        let index = RecordIndex::new(BOOK);
        assert_eq!(
            index.list_titles(),
            vec![
                (3, "First".to_string()),
                (8, "Second".to_string()),
                (9, "Alt title".to_string())
            ]
        );
    }

    #[test]
    fn test_title_stops_at_comment() {
        assert_eq!(title_text("T:Foo % old"), Some("Foo"));
        assert_eq!(title_text("T: The Kesh"), Some("The Kesh"));
        assert_eq!(title_text("T:%untitled"), Some(""));

        let index = RecordIndex::new("X:1\nT:Foo % old\nK:G\n");
        assert_eq!(index.list_titles(), vec![(2, "Foo".to_string())]);
        assert_eq!(index.records()[0].title.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_record_at() {
        let index = RecordIndex::new(BOOK);
        assert!(matches!(index.record_at(0), Err(ModeError::NoRecordFound)));

        let first = BOOK.find("X:2").unwrap();
        let record = index.record_at(first).unwrap();
        assert_eq!((record.line, record.reference), (2, 2));

        let second = BOOK.find("def").unwrap();
        let record = index.record_at(second).unwrap();
        assert_eq!(record.reference, 5);
        assert_eq!(record.title.as_deref(), Some("Second"));
        assert_eq!(record.end, BOOK.len());
    }

    #[test]
    fn test_find_record() {
        let index = RecordIndex::new(BOOK);
        assert_eq!(index.find_record(5).map(|r| r.line), Some(7));
        assert!(index.find_record(1).is_none());
    }

    #[test]
    fn test_renumber_two_records() {
        let mut doc = Document::new("X:2\nT:a\nX:5\nT:b\n");
        let count = renumber_all(&mut doc, &TagTable::default());
        assert_eq!(count, 2);
        assert_eq!(doc.text(), "X:1\nT:a\nX:2\nT:b\n");
    }

    #[test]
    fn test_renumber_keeps_other_lines_and_endings() {
        let mut doc = Document::new(BOOK.replace('\n', "\r\n"));
        renumber_all(&mut doc, &TagTable::default());
        let expected = BOOK
            .replace("X:2", "X:1")
            .replace("X: 5 % old", "X:2")
            .replace('\n', "\r\n");
        assert_eq!(doc.text(), expected);
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let mut doc = Document::new(BOOK);
        renumber_all(&mut doc, &TagTable::default());
        let once = doc.text().to_string();
        renumber_all(&mut doc, &TagTable::default());
        assert_eq!(doc.text(), once);

        let numbers: Vec<_> = RecordIndex::of(&doc)
            .records()
            .iter()
            .map(|r| r.reference)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_skeleton_in_empty_document() {
        let mut doc = Document::new("");
        let n = insert_tune_skeleton(&mut doc, &TagTable::default(), &SkeletonConfig::default())
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(doc.text(), "X:1\nT:\nC:\nM:4/4\nL:1/8\nK:C\n");
        assert_eq!(doc.cursor(), "X:1\nT:".len());
    }

    #[test]
    fn test_skeleton_follows_current_record() {
        let mut doc = Document::new("X:4\nT:a\nK:G\nabc");
        doc.set_cursor(doc.len()).unwrap();
        let skeleton = SkeletonConfig {
            meter: "6/8".to_string(),
            ..SkeletonConfig::default()
        };
        let n = insert_tune_skeleton(&mut doc, &TagTable::default(), &skeleton).unwrap();
        assert_eq!(n, 5);
        assert!(doc.text().ends_with("abc\nX:5\nT:\nC:\nM:6/8\nL:1/8\nK:C\n"));
    }

    #[test]
    fn test_renumber_is_one_undo_step() {
        let mut doc = Document::new(BOOK);
        renumber_all(&mut doc, &TagTable::default());
        assert!(doc.undo());
        assert_eq!(doc.text(), BOOK);
        assert!(!doc.can_undo());
    }
}
