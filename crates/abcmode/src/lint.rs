//! Advisory checks over a whole document.

use std::collections::HashMap;

use tracing::debug;

use crate::classify::{classify, Category};
use crate::diagnostics::{Diagnostic, DiagnosticCollector};
use crate::records::RecordIndex;

fn is_key_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    chars.next() == Some('K') && chars.as_str().trim_start_matches([' ', '\t']).starts_with(':')
}

/// Lint `text`:
/// - stacked accidentals are warnings
/// - a reference number used by an earlier record is a warning
/// - a record without a key line is info
pub fn lint(text: &str) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector::new();

    let mut offset = 0;
    for (i, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        for span in classify(line) {
            if span.category == Category::AccidentalWarning {
                let column = line[..span.start].chars().count() + 1;
                collector.push(
                    Diagnostic::warning(
                        format!("Stacked accidentals '{}'", span.text(line)),
                        i + 1,
                        column,
                    )
                    .with_span(offset + span.start, offset + span.end)
                    .with_suggestion("Keep a single accidental before the note"),
                );
            }
        }
        offset += raw.len();
    }

    let mut seen: HashMap<u64, usize> = HashMap::new();
    for record in RecordIndex::new(text).records() {
        if let Some(first_line) = seen.get(&record.reference) {
            collector.push(
                Diagnostic::warning(
                    format!(
                        "Reference number {} already used on line {}",
                        record.reference, first_line
                    ),
                    record.line,
                    1,
                )
                .with_span(record.offset, record.offset)
                .with_suggestion("Run renumber to number tunes 1..N"),
            );
        } else {
            seen.insert(record.reference, record.line);
        }

        let body = &text[record.offset..record.end];
        if !body.lines().any(is_key_line) {
            collector.push(Diagnostic::info(
                format!("Tune {} has no K: line", record.reference),
                record.line,
                1,
            ));
        }
    }

    let diagnostics = collector.into_diagnostics();
    debug!(count = diagnostics.len(), "linted document");
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLevel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_document() {
        assert!(lint("X:1\nT:Tune\nK:G\nabc|def|\n").is_empty());
    }

    #[test]
    fn test_stacked_accidental() {
        let text = "X:1\nK:C\nA^=Bc|\n";
        let diagnostics = lint(text);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.level, DiagnosticLevel::Warning);
        assert_eq!((d.line, d.column), (3, 2));
        let (start, end) = d.span.unwrap();
        assert_eq!(&text[start..end], "^=B");
    }

    #[test]
    fn test_duplicate_reference() {
        let text = "X:1\nK:C\nX:1\nK:D\n";
        let diagnostics = lint(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 3);
        assert!(diagnostics[0].suggestion.as_deref().unwrap().contains("renumber"));
    }

    #[test]
    fn test_missing_key_is_info() {
        let diagnostics = lint("X:1\nT:No key\nabc\nX:2\nK : D\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Info);
        assert_eq!(diagnostics[0].line, 1);
    }
}
