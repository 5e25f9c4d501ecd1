//! Line classification for highlighting and structural edits.
//!
//! Classification is an ordered list of (pattern, category) rules applied to
//! one line at a time. Every rule contributes spans on its own; a byte that an
//! earlier rule already claimed stays with that rule, and later spans are
//! clipped around it. The result is advisory and never rejects input.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a span of a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Generic `A:`..`Z:` field line, except K, T, V and W
    HeaderField,
    TitleField,
    KeyOrVoiceField,
    /// `%%` directive other than MIDI
    ExtendedDirective,
    MidiDirective,
    /// `!...!`
    Decoration,
    Lyrics,
    /// Stacked accidentals before a note, e.g. `^=C`
    AccidentalWarning,
    BarLine,
    PreprocessorDirective,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::HeaderField => "header-field",
            Category::TitleField => "title-field",
            Category::KeyOrVoiceField => "key-or-voice-field",
            Category::ExtendedDirective => "extended-directive",
            Category::MidiDirective => "midi-directive",
            Category::Decoration => "decoration",
            Category::Lyrics => "lyrics",
            Category::AccidentalWarning => "accidental-warning",
            Category::BarLine => "bar-line",
            Category::PreprocessorDirective => "preprocessor-directive",
        }
    }

    /// Categories that describe the whole line rather than a token in it.
    pub fn is_line_kind(self) -> bool {
        !matches!(
            self,
            Category::Decoration | Category::AccidentalWarning | Category::BarLine
        )
    }
}

/// A classified byte range of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub category: Category,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }
}

struct Rule {
    category: Category,
    pattern: Regex,
    /// Skip the line entirely when this matches
    unless: Option<Regex>,
    /// Field rules stop before the comment and drop the blanks in front of it
    trim_trailing_blanks: bool,
}

impl Rule {
    fn new(category: Category, pattern: &str) -> Self {
        Rule {
            category,
            pattern: compile(pattern),
            unless: None,
            trim_trailing_blanks: false,
        }
    }

    fn field(category: Category, pattern: &str) -> Self {
        Rule {
            trim_trailing_blanks: true,
            ..Rule::new(category, pattern)
        }
    }

    fn unless(mut self, pattern: &str) -> Self {
        self.unless = Some(compile(pattern));
        self
    }

    fn matches<'a>(&'a self, line: &'a str) -> impl Iterator<Item = Range<usize>> + 'a {
        let skip = self.unless.as_ref().is_some_and(|re| re.is_match(line));
        self.pattern
            .find_iter(line)
            .filter(move |_| !skip)
            .map(move |m| {
                let end = if self.trim_trailing_blanks {
                    m.start() + m.as_str().trim_end_matches([' ', '\t']).len()
                } else {
                    m.end()
                };
                m.start()..end
            })
            .filter(|range| !range.is_empty())
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

const MIDI_DIRECTIVE: &str = r"^%%[ \t]*(?i:midi)\b.*";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::field(Category::HeaderField, r"^[A-JL-SUX-Z][ \t]*:[^%]*"),
        Rule::field(Category::TitleField, r"^T[ \t]*:[^%]*"),
        Rule::field(Category::KeyOrVoiceField, r"^[KV][ \t]*:[^%]*"),
        Rule::new(Category::ExtendedDirective, r"^%%.*").unless(MIDI_DIRECTIVE),
        Rule::new(Category::MidiDirective, MIDI_DIRECTIVE),
        Rule::new(Category::Decoration, r"!.*?!"),
        Rule::new(Category::Lyrics, r"^[wW][ \t]*:.*"),
        Rule::new(Category::AccidentalWarning, r"[-(]?[\^_=][\^_=][A-Ga-g]"),
        // Longer variants first: alternation is leftmost-first
        Rule::new(
            Category::BarLine,
            r":\|\|:|:\|\]|:\|:|:\|\[?[1-9]|:\||::|\|\[?[1-9]|\|\||\|\]|\|:|\[\||\[[1-9]",
        ),
        Rule::new(
            Category::PreprocessorDirective,
            r"^#(?:define|ifdef|ifndef|endif|else|include|undefine|redefine)\b.*",
        ),
    ]
});

/// Classify one line. Text after a newline, and a trailing `\r`, are ignored.
///
/// Returned spans are sorted by start and never overlap.
pub fn classify(line: &str) -> Vec<Span> {
    let line = &line[..line.find('\n').unwrap_or(line.len())];
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut spans = Vec::new();

    for rule in RULES.iter() {
        let mut accepted = Vec::new();
        for range in rule.matches(line) {
            for piece in unclaimed_pieces(range, &claimed) {
                accepted.push(piece);
            }
        }
        for piece in accepted {
            spans.push(Span {
                start: piece.start,
                end: piece.end,
                category: rule.category,
            });
            claimed.push(piece);
        }
    }

    spans.sort_by_key(|span| span.start);
    spans
}

/// Parts of `range` not covered by any claimed range.
fn unclaimed_pieces(range: Range<usize>, claimed: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut pieces = vec![range];
    for taken in claimed {
        pieces = pieces
            .into_iter()
            .flat_map(|piece| {
                if taken.end <= piece.start || taken.start >= piece.end {
                    return vec![piece];
                }
                let mut rest = Vec::new();
                if piece.start < taken.start {
                    rest.push(piece.start..taken.start);
                }
                if taken.end < piece.end {
                    rest.push(taken.end..piece.end);
                }
                rest
            })
            .collect();
    }
    pieces
}

/// The category describing the line as a whole, if a line-level rule matched at column 0.
pub fn line_kind(line: &str) -> Option<Category> {
    classify(line)
        .into_iter()
        .find(|span| span.start == 0 && span.category.is_line_kind())
        .map(|span| span.category)
}

/// Classify every line of a document. Line numbers are 1-based.
pub fn classify_document(text: &str) -> Vec<(usize, Vec<Span>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, classify(line)))
        .collect()
}
