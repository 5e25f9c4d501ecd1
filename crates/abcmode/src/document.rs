//! The editable text buffer commands operate on.
//!
//! Positions are byte offsets into the text and always sit on a `char`
//! boundary. Every mutation records one undo step first.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ModeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    text: String,
    cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    cursor: usize,
    path: Option<PathBuf>,
    undo_stack: Vec<Snapshot>,
    modified: bool,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Document {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Read a document from disk, remembering the path for `save`.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ModeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Document {
            text,
            path: Some(path.to_path_buf()),
            ..Default::default()
        })
    }

    /// Write the document back to its file if it has one.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.as_ref().ok_or(ModeError::NoFileName)?;
        std::fs::write(path, &self.text).map_err(|e| ModeError::Io {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), bytes = self.text.len(), "saved document");
        self.modified = false;
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Fail unless `position` is inside the text and on a char boundary.
    pub fn check_position(&self, position: usize) -> Result<usize> {
        if self.text.is_char_boundary(position) {
            Ok(position)
        } else {
            Err(ModeError::InvalidPosition { position })
        }
    }

    pub fn set_cursor(&mut self, position: usize) -> Result<()> {
        self.cursor = self.check_position(position)?;
        Ok(())
    }

    /// Byte range of the line containing `position`, without its line ending.
    pub fn line_range(&self, position: usize) -> Range<usize> {
        line_range_at(&self.text, position)
    }

    /// 1-based line number of `position`.
    pub fn line_number(&self, position: usize) -> usize {
        let position = position.min(self.text.len());
        self.text[..position].matches('\n').count() + 1
    }

    /// Byte offset where 1-based line `line` starts, if it exists.
    pub fn line_offset(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        if line == 1 {
            return Some(0);
        }
        self.text
            .match_indices('\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)
            .filter(|&offset| offset <= self.text.len())
    }

    fn record_undo(&mut self) {
        self.undo_stack.push(Snapshot {
            text: self.text.clone(),
            cursor: self.cursor,
        });
        self.modified = true;
    }

    /// Replace `range` with `replacement`. The cursor follows the edit when
    /// it sat after the replaced range.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) -> Result<()> {
        self.check_position(range.start)?;
        self.check_position(range.end)?;
        if range.start > range.end {
            return Err(ModeError::InvalidPosition {
                position: range.start,
            });
        }

        self.record_undo();
        let removed = range.end - range.start;
        if self.cursor >= range.end {
            self.cursor = self.cursor - removed + replacement.len();
        } else if self.cursor > range.start {
            self.cursor = range.start;
        }
        self.text.replace_range(range, replacement);
        Ok(())
    }

    /// Replace the whole text in one undo step, clamping the cursor.
    pub fn replace_all(&mut self, text: String) {
        self.record_undo();
        self.text = text;
        self.cursor = floor_char_boundary(&self.text, self.cursor);
    }

    /// Insert at the cursor and move the cursor past the insertion.
    pub fn insert(&mut self, s: &str) {
        self.record_undo();
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Delete the character before the cursor. Returns false at the start.
    pub fn delete_backward(&mut self) -> bool {
        let Some(c) = self.text[..self.cursor].chars().next_back() else {
            return false;
        };
        self.record_undo();
        let start = self.cursor - c.len_utf8();
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    /// Undo the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                self.text = snapshot.text;
                self.cursor = snapshot.cursor;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }
}

/// Byte range of the line containing `position` in `text`, without the line ending.
pub fn line_range_at(text: &str, position: usize) -> Range<usize> {
    let position = floor_char_boundary(text, position.min(text.len()));
    let start = text[..position].rfind('\n').map_or(0, |i| i + 1);
    let end = text[position..]
        .find('\n')
        .map_or(text.len(), |i| position + i);
    // Keep \r out of the line body
    let end = if end > start && text[..end].ends_with('\r') {
        end - 1
    } else {
        end
    };
    start..end
}

fn floor_char_boundary(text: &str, position: usize) -> usize {
    let mut position = position.min(text.len());
    while !text.is_char_boundary(position) {
        position -= 1;
    }
    position
}
