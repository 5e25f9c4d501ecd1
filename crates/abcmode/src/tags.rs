//! Field names and the line-prefix markers that introduce them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{ModeError, Result};

/// Every field the tag table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldName {
    Reference,
    Title,
    Composer,
    Lyricist,
    Meter,
    UnitLength,
    Tempo,
    Parts,
    Staves,
    Key,
    Area,
    Book,
    Discography,
    Filename,
    Group,
    History,
    Information,
    Notes,
    Origin,
    Rhythm,
    Source,
    User,
    WordsEnd,
    WordsInline,
    Transcription,
    AbcVersion,
    AbcCopyright,
    AbcCreator,
    AbcCharset,
    AbcInclude,
    AbcEditedBy,
}

impl FieldName {
    pub const ALL: [FieldName; 31] = [
        FieldName::Reference,
        FieldName::Title,
        FieldName::Composer,
        FieldName::Lyricist,
        FieldName::Meter,
        FieldName::UnitLength,
        FieldName::Tempo,
        FieldName::Parts,
        FieldName::Staves,
        FieldName::Key,
        FieldName::Area,
        FieldName::Book,
        FieldName::Discography,
        FieldName::Filename,
        FieldName::Group,
        FieldName::History,
        FieldName::Information,
        FieldName::Notes,
        FieldName::Origin,
        FieldName::Rhythm,
        FieldName::Source,
        FieldName::User,
        FieldName::WordsEnd,
        FieldName::WordsInline,
        FieldName::Transcription,
        FieldName::AbcVersion,
        FieldName::AbcCopyright,
        FieldName::AbcCreator,
        FieldName::AbcCharset,
        FieldName::AbcInclude,
        FieldName::AbcEditedBy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Reference => "reference",
            FieldName::Title => "title",
            FieldName::Composer => "composer",
            FieldName::Lyricist => "lyricist",
            FieldName::Meter => "meter",
            FieldName::UnitLength => "unit-length",
            FieldName::Tempo => "tempo",
            FieldName::Parts => "parts",
            FieldName::Staves => "staves",
            FieldName::Key => "key",
            FieldName::Area => "area",
            FieldName::Book => "book",
            FieldName::Discography => "discography",
            FieldName::Filename => "filename",
            FieldName::Group => "group",
            FieldName::History => "history",
            FieldName::Information => "information",
            FieldName::Notes => "notes",
            FieldName::Origin => "origin",
            FieldName::Rhythm => "rhythm",
            FieldName::Source => "source",
            FieldName::User => "user",
            FieldName::WordsEnd => "words-end",
            FieldName::WordsInline => "words-inline",
            FieldName::Transcription => "transcription",
            FieldName::AbcVersion => "abc-version",
            FieldName::AbcCopyright => "abc-copyright",
            FieldName::AbcCreator => "abc-creator",
            FieldName::AbcCharset => "abc-charset",
            FieldName::AbcInclude => "abc-include",
            FieldName::AbcEditedBy => "abc-edited-by",
        }
    }

    pub fn default_marker(self) -> &'static str {
        match self {
            FieldName::Reference => "X:",
            FieldName::Title => "T:",
            FieldName::Composer => "C:",
            FieldName::Lyricist => "A:",
            FieldName::Meter => "M:",
            FieldName::UnitLength => "L:",
            FieldName::Tempo => "Q:",
            FieldName::Parts => "P:",
            FieldName::Staves => "%%staves",
            FieldName::Key => "K:",
            FieldName::Area => "A:",
            FieldName::Book => "B:",
            FieldName::Discography => "D:",
            FieldName::Filename => "F:",
            FieldName::Group => "G:",
            FieldName::History => "H:",
            FieldName::Information => "I:",
            FieldName::Notes => "N:",
            FieldName::Origin => "O:",
            FieldName::Rhythm => "R:",
            FieldName::Source => "S:",
            FieldName::User => "U:",
            FieldName::WordsEnd => "W:",
            FieldName::WordsInline => "w:",
            FieldName::Transcription => "Z:",
            FieldName::AbcVersion => "%%abc-version",
            FieldName::AbcCopyright => "%%abc-copyright",
            FieldName::AbcCreator => "%%abc-creator",
            FieldName::AbcCharset => "%%abc-charset",
            FieldName::AbcInclude => "%%abc-include",
            FieldName::AbcEditedBy => "%%abc-edited-by",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = ModeError;

    /// Accepts the kebab-case name; `_` and case differences are tolerated.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        FieldName::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| ModeError::UnknownField(s.to_string()))
    }
}

/// Field name to marker mapping. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTable {
    markers: BTreeMap<FieldName, String>,
}

impl Default for TagTable {
    fn default() -> Self {
        TagTable {
            markers: FieldName::ALL
                .iter()
                .map(|&field| (field, field.default_marker().to_string()))
                .collect(),
        }
    }
}

impl TagTable {
    /// Defaults with `overrides` applied. Unknown names fail the whole build.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut table = TagTable::default();
        for (name, marker) in overrides {
            let field: FieldName = name.parse()?;
            table.markers.insert(field, marker.clone());
        }
        Ok(table)
    }

    /// Marker for a field given by name.
    pub fn lookup(&self, field_name: &str) -> Result<&str> {
        let field: FieldName = field_name.parse()?;
        Ok(self.marker(field))
    }

    /// Marker for a known field.
    pub fn marker(&self, field: FieldName) -> &str {
        self.markers
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_marker())
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.markers.iter().map(|(field, marker)| (*field, marker.as_str()))
    }
}

/// Insert a field marker at the cursor so that it begins a line.
pub fn insert_field(document: &mut Document, tags: &TagTable, field_name: &str) -> Result<()> {
    let marker = tags.lookup(field_name)?.to_string();
    let at_line_start = document.line_range(document.cursor()).start == document.cursor();
    if at_line_start {
        document.insert(&marker);
    } else {
        document.insert(&format!("\n{}", marker));
    }
    Ok(())
}
