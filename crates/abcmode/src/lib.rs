//! Editing core for ABC music notation.
//!
//! This crate classifies lines for highlighting, navigates and renumbers the
//! tunes of a multi-tune file, performs structural rewrites, and builds the
//! command lines for the external renderer and MIDI converter. Everything is
//! synchronous and runs against an explicit [`Session`].
//!
//! # Example
//!
//! ```
//! use abcmode::{CommandArgs, CommandId, CommandRegistry, Document, Outcome, Session};
//! use abcconf::ModeConfig;
//!
//! let doc = Document::new("X:2\nT:Kesh\nK:G\nX:5\nT:Banish Misfortune\nK:D\n");
//! let mut session = Session::new(doc, ModeConfig::default()).unwrap();
//! let registry = CommandRegistry::standard();
//!
//! let outcome = registry
//!     .run(CommandId::Renumber, &mut session, &CommandArgs::default())
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Count(2));
//! assert!(session.document.text().starts_with("X:1\n"));
//! ```

pub mod classify;
pub mod commands;
pub mod diagnostics;
pub mod document;
pub mod editors;
pub mod error;
pub mod external;
pub mod instruments;
pub mod lint;
pub mod records;
pub mod session;
pub mod symbol_pad;
pub mod tags;

pub use classify::{classify, classify_document, line_kind, Category, Span};
pub use commands::{CommandArgs, CommandId, CommandRegistry, Outcome};
pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use document::Document;
pub use editors::{align_bars, extract_chord_skeleton, wrap_region, WrapKind};
pub use error::{ModeError, Result};
pub use external::{
    DryRunner, Invocation, ProcessOutput, ProcessRunner, SystemRunner, ToolChain, ToolRun,
};
pub use instruments::{midi_program_directive, program_number};
pub use lint::lint;
pub use records::{insert_tune_skeleton, renumber_all, Record, RecordIndex};
pub use session::Session;
pub use symbol_pad::{dispatch, PadAction, PadPosition, SymbolPad};
pub use tags::{insert_field, FieldName, TagTable};
