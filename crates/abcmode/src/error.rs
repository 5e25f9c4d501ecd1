//! Errors surfaced by editing commands.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("No tune found before this position (missing X: line)")]
    NoRecordFound,

    #[error("No symbol at this position")]
    NoSymbolAtPosition,

    #[error("Unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("Unknown renderer option set '{0}'")]
    UnknownOptionSet(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Command '{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Position {position} is outside the document or not on a character boundary")]
    InvalidPosition { position: usize },

    #[error("Document has no file name")]
    NoFileName,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    Process {
        program: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModeError>;
