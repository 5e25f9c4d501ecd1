//! Clickable symbol pad.
//!
//! The pad is a fixed block of whitespace-separated tokens. Clicking a token
//! inserts it into the target document, except for a few reserved names that
//! trigger an editing action instead.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{ModeError, Result};

const LAYOUT: &[&str] = &[
    " |   ||   [|   |]   |:   :|   ::   |1   :|2   [1   [2 ",
    " (   )    -    ~    .    >    <    (3   z    x    Z  ",
    " ^   _    =    ^^   __   ,    '    /    2    3    4  ",
    " !trill!   !fermata!   !accent!   !staccato!   !upbow!   !downbow! ",
    " !p!   !mp!   !mf!   !f!   !ff!   !crescendo(!   !crescendo)! ",
    " \"C\"   \"G\"   \"D\"   \"A\"   \"E\"   \"F\"   \"Am\"   \"Em\"   \"Dm\" ",
    " del   space   newline   undo ",
];

/// Row and column (in characters) inside the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadPosition {
    pub row: usize,
    pub column: usize,
}

impl PadPosition {
    pub fn new(row: usize, column: usize) -> Self {
        PadPosition { row, column }
    }
}

/// What clicking a token does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PadAction {
    DeletePrevious,
    InsertSpace,
    InsertNewline,
    Undo,
    Insert(String),
}

impl PadAction {
    pub fn from_token(token: &str) -> PadAction {
        match token {
            "del" => PadAction::DeletePrevious,
            "space" => PadAction::InsertSpace,
            "newline" => PadAction::InsertNewline,
            "undo" => PadAction::Undo,
            other => PadAction::Insert(other.to_string()),
        }
    }
}

/// The pad layout and token lookup.
#[derive(Debug, Clone, Copy)]
pub struct SymbolPad {
    rows: &'static [&'static str],
}

impl Default for SymbolPad {
    fn default() -> Self {
        SymbolPad { rows: LAYOUT }
    }
}

impl SymbolPad {
    pub fn rows(&self) -> &'static [&'static str] {
        self.rows
    }

    /// The pad as it is displayed, one numbered row per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            out.push_str(&format!("{i}:{row}\n"));
        }
        out
    }

    /// The maximal whitespace-delimited token under `position`.
    ///
    /// Whitespace and positions outside the layout yield `NoSymbolAtPosition`.
    pub fn resolve_token(&self, position: PadPosition) -> Result<String> {
        let row: Vec<char> = self
            .rows
            .get(position.row)
            .ok_or(ModeError::NoSymbolAtPosition)?
            .chars()
            .collect();

        match row.get(position.column) {
            Some(c) if !c.is_whitespace() => {}
            _ => return Err(ModeError::NoSymbolAtPosition),
        }

        let start = row[..position.column]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |i| i + 1);
        let end = row[position.column..]
            .iter()
            .position(|c| c.is_whitespace())
            .map_or(row.len(), |i| position.column + i);

        Ok(row[start..end].iter().collect())
    }

    /// Every token on the pad, in reading order.
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rows.iter().copied().flat_map(str::split_whitespace)
    }
}

/// Apply a pad token to the document.
pub fn dispatch(document: &mut Document, token: &str) -> PadAction {
    let action = PadAction::from_token(token);
    match &action {
        PadAction::DeletePrevious => {
            document.delete_backward();
        }
        PadAction::InsertSpace => document.insert(" "),
        PadAction::InsertNewline => document.insert("\n"),
        PadAction::Undo => {
            document.undo();
        }
        PadAction::Insert(text) => document.insert(text),
    }
    action
}
