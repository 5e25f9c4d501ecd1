//! Named editing commands and their handlers.
//!
//! Every command takes the session explicitly. The registry is a plain table
//! from [`CommandId`] to handler function.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{classify_document, Span};
use crate::diagnostics::Diagnostic;
use crate::editors::{align_bars, extract_chord_skeleton_at, wrap_with, WrapKind};
use crate::error::{ModeError, Result};
use crate::external::ToolRun;
use crate::instruments::insert_instrument;
use crate::lint::lint;
use crate::records::{insert_tune_skeleton, renumber_all, RecordIndex};
use crate::session::Session;
use crate::symbol_pad::{dispatch, PadAction, PadPosition, SymbolPad};
use crate::tags::insert_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandId {
    Classify,
    Lint,
    CurrentRecord,
    NextRecord,
    PreviousRecord,
    Renumber,
    Titles,
    AlignBars,
    ChordSkeleton,
    WrapSlur,
    WrapCrescendo,
    WrapDiminuendo,
    WrapRepeat,
    InsertField,
    NewTune,
    Instrument,
    Pad,
    Undo,
    Render,
    Midi,
    Transpose,
}

impl CommandId {
    pub const ALL: [CommandId; 21] = [
        CommandId::Classify,
        CommandId::Lint,
        CommandId::CurrentRecord,
        CommandId::NextRecord,
        CommandId::PreviousRecord,
        CommandId::Renumber,
        CommandId::Titles,
        CommandId::AlignBars,
        CommandId::ChordSkeleton,
        CommandId::WrapSlur,
        CommandId::WrapCrescendo,
        CommandId::WrapDiminuendo,
        CommandId::WrapRepeat,
        CommandId::InsertField,
        CommandId::NewTune,
        CommandId::Instrument,
        CommandId::Pad,
        CommandId::Undo,
        CommandId::Render,
        CommandId::Midi,
        CommandId::Transpose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandId::Classify => "classify",
            CommandId::Lint => "lint",
            CommandId::CurrentRecord => "current-record",
            CommandId::NextRecord => "next-record",
            CommandId::PreviousRecord => "previous-record",
            CommandId::Renumber => "renumber",
            CommandId::Titles => "titles",
            CommandId::AlignBars => "align-bars",
            CommandId::ChordSkeleton => "chord-skeleton",
            CommandId::WrapSlur => "wrap-slur",
            CommandId::WrapCrescendo => "wrap-crescendo",
            CommandId::WrapDiminuendo => "wrap-diminuendo",
            CommandId::WrapRepeat => "wrap-repeat",
            CommandId::InsertField => "insert-field",
            CommandId::NewTune => "new-tune",
            CommandId::Instrument => "instrument",
            CommandId::Pad => "pad",
            CommandId::Undo => "undo",
            CommandId::Render => "render",
            CommandId::Midi => "midi",
            CommandId::Transpose => "transpose",
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandId {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self> {
        CommandId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ModeError::UnknownCommand(s.to_string()))
    }
}

/// Inputs a command may use. Unset positions fall back to the cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandArgs {
    pub position: Option<usize>,
    /// Region endpoints, in either order
    pub region: Option<(usize, usize)>,
    /// Field or instrument name
    pub name: Option<String>,
    pub pad: Option<PadPosition>,
    pub option_set: Option<String>,
    /// Restrict render/midi to the record under the cursor
    pub current_record_only: bool,
    pub semitones: Option<i32>,
}

impl CommandArgs {
    fn position(&self, session: &Session) -> Result<usize> {
        match self.position {
            Some(p) => session.document.check_position(p),
            None => Ok(session.document.cursor()),
        }
    }

    fn region(&self, command: CommandId) -> Result<(usize, usize)> {
        self.region.ok_or(ModeError::MissingArgument {
            command: command.as_str(),
            argument: "a region",
        })
    }

    fn name(&self, command: CommandId, argument: &'static str) -> Result<&str> {
        self.name.as_deref().ok_or(ModeError::MissingArgument {
            command: command.as_str(),
            argument,
        })
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Outcome {
    /// Nothing to do
    Nothing,
    /// The document changed
    Edited,
    /// The cursor moved to this offset
    Moved(usize),
    /// A reference number
    Record(u64),
    /// Number of lines or records rewritten
    Count(usize),
    /// Range of text a wrap produced
    Region(Range<usize>),
    Program(u8),
    Pad(PadAction),
    Annotations(Vec<(usize, Vec<Span>)>),
    Diagnostics(Vec<Diagnostic>),
    Titles(Vec<(usize, String)>),
    Tools(Vec<ToolRun>),
}

pub type Handler = fn(&mut Session, &CommandArgs) -> Result<Outcome>;

/// Table of commands.
pub struct CommandRegistry {
    handlers: HashMap<CommandId, Handler>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        CommandRegistry {
            handlers: HashMap::new(),
        }
    }

    /// Every built-in command.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(CommandId::Classify, classify_cmd);
        registry.register(CommandId::Lint, lint_cmd);
        registry.register(CommandId::CurrentRecord, current_record_cmd);
        registry.register(CommandId::NextRecord, next_record_cmd);
        registry.register(CommandId::PreviousRecord, previous_record_cmd);
        registry.register(CommandId::Renumber, renumber_cmd);
        registry.register(CommandId::Titles, titles_cmd);
        registry.register(CommandId::AlignBars, align_bars_cmd);
        registry.register(CommandId::ChordSkeleton, chord_skeleton_cmd);
        registry.register(CommandId::WrapSlur, |s, a| wrap_cmd(s, a, CommandId::WrapSlur, WrapKind::Slur));
        registry.register(CommandId::WrapCrescendo, |s, a| {
            wrap_cmd(s, a, CommandId::WrapCrescendo, WrapKind::Crescendo)
        });
        registry.register(CommandId::WrapDiminuendo, |s, a| {
            wrap_cmd(s, a, CommandId::WrapDiminuendo, WrapKind::Diminuendo)
        });
        registry.register(CommandId::WrapRepeat, |s, a| {
            wrap_cmd(s, a, CommandId::WrapRepeat, WrapKind::Repeat)
        });
        registry.register(CommandId::InsertField, insert_field_cmd);
        registry.register(CommandId::NewTune, new_tune_cmd);
        registry.register(CommandId::Instrument, instrument_cmd);
        registry.register(CommandId::Pad, pad_cmd);
        registry.register(CommandId::Undo, undo_cmd);
        registry.register(CommandId::Render, render_cmd);
        registry.register(CommandId::Midi, midi_cmd);
        registry.register(CommandId::Transpose, transpose_cmd);
        registry
    }

    pub fn register(&mut self, id: CommandId, handler: Handler) {
        self.handlers.insert(id, handler);
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn run(&self, id: CommandId, session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
        let handler = self
            .handlers
            .get(&id)
            .ok_or_else(|| ModeError::UnknownCommand(id.to_string()))?;
        debug!(command = %id, "running command");
        handler(session, args)
    }

    /// Look a command up by its name and run it.
    pub fn run_named(&self, name: &str, session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
        self.run(name.parse()?, session, args)
    }
}

fn classify_cmd(session: &mut Session, _args: &CommandArgs) -> Result<Outcome> {
    Ok(Outcome::Annotations(classify_document(session.document.text())))
}

fn lint_cmd(session: &mut Session, _args: &CommandArgs) -> Result<Outcome> {
    Ok(Outcome::Diagnostics(lint(session.document.text())))
}

fn current_record_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let position = args.position(session)?;
    let n = RecordIndex::of(&session.document).current_record_number(position)?;
    Ok(Outcome::Record(n))
}

fn move_to(session: &mut Session, target: Option<usize>) -> Result<Outcome> {
    match target {
        Some(offset) => {
            session.document.set_cursor(offset)?;
            Ok(Outcome::Moved(offset))
        }
        None => Ok(Outcome::Nothing),
    }
}

fn next_record_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let position = args.position(session)?;
    let target = RecordIndex::of(&session.document).next_record_boundary(position);
    move_to(session, target)
}

fn previous_record_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let position = args.position(session)?;
    let target = RecordIndex::of(&session.document).previous_record_boundary(position);
    move_to(session, target)
}

fn renumber_cmd(session: &mut Session, _args: &CommandArgs) -> Result<Outcome> {
    Ok(Outcome::Count(renumber_all(&mut session.document, &session.tags)))
}

fn titles_cmd(session: &mut Session, _args: &CommandArgs) -> Result<Outcome> {
    Ok(Outcome::Titles(RecordIndex::of(&session.document).list_titles()))
}

fn align_bars_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let (start, end) = match args.region {
        Some(region) => region,
        None => {
            let p = args.position(session)?;
            (p, p)
        }
    };
    Ok(Outcome::Count(align_bars(&mut session.document, start, end)?))
}

fn chord_skeleton_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let position = args.position(session)?;
    let changed = extract_chord_skeleton_at(&mut session.document, position)?;
    Ok(Outcome::Count(usize::from(changed)))
}

fn wrap_cmd(session: &mut Session, args: &CommandArgs, id: CommandId, kind: WrapKind) -> Result<Outcome> {
    let (start, end) = args.region(id)?;
    let range = wrap_with(&mut session.document, start, end, kind)?;
    Ok(Outcome::Region(range))
}

fn insert_field_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let name = args.name(CommandId::InsertField, "a field name")?;
    if let Some(p) = args.position {
        session.document.set_cursor(p)?;
    }
    insert_field(&mut session.document, &session.tags, name)?;
    Ok(Outcome::Edited)
}

fn new_tune_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    if let Some(p) = args.position {
        session.document.set_cursor(p)?;
    }
    let n = insert_tune_skeleton(&mut session.document, &session.tags, &session.config.skeleton)?;
    Ok(Outcome::Record(n))
}

fn instrument_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let name = args.name(CommandId::Instrument, "an instrument name")?;
    if let Some(p) = args.position {
        session.document.set_cursor(p)?;
    }
    Ok(Outcome::Program(insert_instrument(&mut session.document, name)?))
}

fn pad_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let at = args.pad.ok_or(ModeError::MissingArgument {
        command: CommandId::Pad.as_str(),
        argument: "a pad position",
    })?;
    if let Some(p) = args.position {
        session.document.set_cursor(p)?;
    }
    match SymbolPad::default().resolve_token(at) {
        Ok(token) => Ok(Outcome::Pad(dispatch(&mut session.document, &token))),
        Err(ModeError::NoSymbolAtPosition) => Ok(Outcome::Nothing),
        Err(e) => Err(e),
    }
}

fn undo_cmd(session: &mut Session, _args: &CommandArgs) -> Result<Outcome> {
    if session.document.undo() {
        Ok(Outcome::Edited)
    } else {
        Ok(Outcome::Nothing)
    }
}

fn record_scope(session: &Session, args: &CommandArgs) -> Result<Option<u64>> {
    if !args.current_record_only {
        return Ok(None);
    }
    let position = args.position(session)?;
    let record = RecordIndex::of(&session.document).record_at(position)?;
    debug!(
        reference = record.reference,
        line = record.line,
        title = record.title.as_deref().unwrap_or(""),
        "scoped to current tune"
    );
    Ok(Some(record.reference))
}

fn render_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let record = record_scope(session, args)?;
    Ok(Outcome::Tools(session.render(args.option_set.as_deref(), record)?))
}

fn midi_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let record = record_scope(session, args)?;
    Ok(Outcome::Tools(session.midi(record)?))
}

fn transpose_cmd(session: &mut Session, args: &CommandArgs) -> Result<Outcome> {
    let semitones = args.semitones.ok_or(ModeError::MissingArgument {
        command: CommandId::Transpose.as_str(),
        argument: "a number of semitones",
    })?;
    Ok(Outcome::Tools(session.transpose(semitones)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use abcconf::ModeConfig;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> Session {
        Session::new(Document::new(text), ModeConfig::default()).unwrap()
    }

    #[test]
    fn test_every_command_registered() {
        let registry = CommandRegistry::standard();
        for id in CommandId::ALL {
            assert!(registry.contains(id), "{id}");
            assert_eq!(id.as_str().parse::<CommandId>().unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_command_name() {
        let registry = CommandRegistry::standard();
        let mut s = session("");
        let err = registry
            .run_named("frobnicate", &mut s, &CommandArgs::default())
            .unwrap_err();
        assert!(matches!(err, ModeError::UnknownCommand(_)));
    }

    #[test]
    fn test_unregistered_command() {
        let registry = CommandRegistry::empty();
        let mut s = session("");
        assert!(registry
            .run(CommandId::Undo, &mut s, &CommandArgs::default())
            .is_err());
    }

    #[test]
    fn test_wrap_needs_region() {
        let registry = CommandRegistry::standard();
        let mut s = session("abc");
        let err = registry
            .run(CommandId::WrapSlur, &mut s, &CommandArgs::default())
            .unwrap_err();
        assert!(matches!(err, ModeError::MissingArgument { command: "wrap-slur", .. }));

        let args = CommandArgs {
            region: Some((3, 0)),
            ..CommandArgs::default()
        };
        assert_eq!(
            registry.run(CommandId::WrapSlur, &mut s, &args).unwrap(),
            Outcome::Region(0..5)
        );
        assert_eq!(s.document.text(), "(abc)");
    }

    #[test]
    fn test_navigation_moves_cursor() {
        let registry = CommandRegistry::standard();
        let mut s = session("X:1\nK:C\nX:2\nK:D\n");
        let outcome = registry
            .run(CommandId::NextRecord, &mut s, &CommandArgs::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Moved(8));
        assert_eq!(s.document.cursor(), 8);

        let outcome = registry
            .run(CommandId::NextRecord, &mut s, &CommandArgs::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Nothing);

        let outcome = registry
            .run(CommandId::CurrentRecord, &mut s, &CommandArgs::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Record(2));

        let outcome = registry
            .run(CommandId::PreviousRecord, &mut s, &CommandArgs::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Moved(0));
    }

    #[test]
    fn test_pad_on_whitespace_does_nothing() {
        let registry = CommandRegistry::standard();
        let mut s = session("ab");
        let args = CommandArgs {
            pad: Some(PadPosition::new(0, 0)),
            ..CommandArgs::default()
        };
        assert_eq!(registry.run(CommandId::Pad, &mut s, &args).unwrap(), Outcome::Nothing);
        assert_eq!(s.document.text(), "ab");
        assert!(!s.document.can_undo());
    }

    #[test]
    fn test_new_tune_then_undo() {
        let registry = CommandRegistry::standard();
        let mut s = session("");
        assert_eq!(
            registry
                .run(CommandId::NewTune, &mut s, &CommandArgs::default())
                .unwrap(),
            Outcome::Record(1)
        );
        assert!(s.document.text().starts_with("X:1\n"));
        assert_eq!(
            registry
                .run(CommandId::Undo, &mut s, &CommandArgs::default())
                .unwrap(),
            Outcome::Edited
        );
        assert_eq!(s.document.text(), "");
    }

    #[test]
    fn test_render_current_record_without_records() {
        let registry = CommandRegistry::standard();
        let mut s = session("abc\n");
        let args = CommandArgs {
            current_record_only: true,
            ..CommandArgs::default()
        };
        let err = registry.run(CommandId::Render, &mut s, &args).unwrap_err();
        assert!(matches!(err, ModeError::NoRecordFound));
    }
}
