use std::path::{Path, PathBuf};

use abcconf::{ConfigSources, ModeConfig};
use abcmode::instruments::{instrument_names, program_name, program_number};
use abcmode::{
    CommandArgs, CommandId, CommandRegistry, Document, DryRunner, ModeError, PadPosition, Session,
    SymbolPad,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod output;

use output::Printer;

/// Structural editing for ABC music notation files.
#[derive(Parser, Debug)]
#[command(name = "abcmode", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./abcmode.toml
    #[arg(long, global = true, env = "ABCMODE_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// A file and an optional place in it.
#[derive(Args, Debug, Clone)]
struct Target {
    /// ABC file
    file: PathBuf,

    /// 1-based line to act on
    #[arg(long, conflicts_with = "pos")]
    line: Option<usize>,

    /// Byte offset to act on
    #[arg(long)]
    pos: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct WriteOpts {
    /// Print the edited text instead of writing the file back
    #[arg(long)]
    stdout: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum WrapArg {
    Slur,
    Crescendo,
    Diminuendo,
    Repeat,
}

impl WrapArg {
    fn command(self) -> CommandId {
        match self {
            WrapArg::Slur => CommandId::WrapSlur,
            WrapArg::Crescendo => CommandId::WrapCrescendo,
            WrapArg::Diminuendo => CommandId::WrapDiminuendo,
            WrapArg::Repeat => CommandId::WrapRepeat,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every line for highlighting
    Classify { file: PathBuf },

    /// Report stacked accidentals, duplicate tune numbers and tunes without a key
    Lint { file: PathBuf },

    /// List title lines
    Titles { file: PathBuf },

    /// Print the reference number of the tune at a position
    Record {
        #[command(flatten)]
        at: Target,
    },

    /// Print the line where the next tune starts
    Next {
        #[command(flatten)]
        at: Target,
    },

    /// Print the line where the previous tune starts
    Prev {
        #[command(flatten)]
        at: Target,
    },

    /// Renumber every tune 1..N in file order
    Renumber {
        file: PathBuf,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Normalize spacing around bar lines and align them in columns
    AlignBars {
        file: PathBuf,
        /// First line (default: first line of the file)
        #[arg(long)]
        from: Option<usize>,
        /// Last line (default: last line of the file)
        #[arg(long)]
        to: Option<usize>,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Reduce a line to its chords and rhythm
    Skeleton {
        #[command(flatten)]
        at: Target,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Wrap a byte range in paired markers
    Wrap {
        #[arg(value_enum)]
        kind: WrapArg,
        file: PathBuf,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Insert a field marker on its own line (default: end of file)
    Field {
        #[command(flatten)]
        at: Target,
        /// Field name, e.g. title, composer, unit-length
        name: String,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Insert a new tune header (default: end of file)
    NewTune {
        #[command(flatten)]
        at: Target,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Insert a %%MIDI program line for an instrument (default: end of file)
    Instrument {
        #[command(flatten)]
        at: Target,
        name: String,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// List General MIDI instruments
    Instruments {
        /// List every accepted name and alias with its program
        #[arg(long)]
        names: bool,
    },

    /// Show the symbol pad, or click it to edit a file
    Pad {
        file: Option<PathBuf>,
        #[arg(long, requires = "file", requires = "column")]
        row: Option<usize>,
        #[arg(long, requires = "file", requires = "row")]
        column: Option<usize>,
        /// 1-based line to insert at (default: end of file)
        #[arg(long)]
        line: Option<usize>,
        #[command(flatten)]
        write: WriteOpts,
    },

    /// Render the file (or one tune) with the configured renderer
    Render {
        #[command(flatten)]
        at: Target,
        /// Named option set from [tools.option_sets]
        #[arg(long)]
        option_set: Option<String>,
        /// Only the tune at --line/--pos
        #[arg(long)]
        tune: bool,
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert the file (or one tune) to MIDI
    Midi {
        #[command(flatten)]
        at: Target,
        #[arg(long)]
        tune: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Transpose with the configured transformer, result on stdout
    Transpose {
        file: PathBuf,
        #[arg(allow_hyphen_values = true, allow_negative_numbers = true)]
        semitones: i32,
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective configuration
    Config {
        /// Also list the files and variables it came from
        #[arg(long)]
        sources: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
    }
    let (config, sources) = ModeConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging.level);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    let printer = Printer::new(cli.json, cli.no_color);
    match run(cli.command, config, &sources, &printer) {
        Err(e) if matches!(e.downcast_ref::<ModeError>(), Some(ModeError::NoRecordFound)) => {
            eprintln!("{}", e);
            Ok(())
        }
        other => other,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open(file: &Path, config: &ModeConfig) -> Result<Session> {
    let document =
        Document::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    Ok(Session::new(document, config.clone())?)
}

/// Byte offset for `--line`/`--pos`, or `fallback` when neither is given.
fn locate(
    session: &Session,
    line: Option<usize>,
    pos: Option<usize>,
    fallback: usize,
) -> Result<usize> {
    match (line, pos) {
        (Some(line), _) => match session.document.line_offset(line) {
            Some(offset) => Ok(offset),
            None => bail!("Line {} is past the end of the file", line),
        },
        (None, Some(pos)) => Ok(session.document.check_position(pos)?),
        (None, None) => Ok(fallback),
    }
}

fn execute(session: &mut Session, id: CommandId, args: &CommandArgs, printer: &Printer) -> Result<()> {
    let outcome = CommandRegistry::standard().run(id, session, args)?;
    printer.outcome(id, &outcome, &session.document)
}

fn write_back(session: &mut Session, write: &WriteOpts) -> Result<()> {
    if write.stdout {
        print!("{}", session.document.text());
    } else if session.document.is_modified() {
        session.document.save()?;
        if let Some(path) = session.document.path() {
            info!(path = %path.display(), "wrote file");
        }
    }
    Ok(())
}

/// Query at a position; the default position is the start of the file.
fn query(at: &Target, id: CommandId, config: &ModeConfig, printer: &Printer) -> Result<()> {
    let mut session = open(&at.file, config)?;
    let args = CommandArgs {
        position: Some(locate(&session, at.line, at.pos, 0)?),
        ..CommandArgs::default()
    };
    execute(&mut session, id, &args, printer)
}

/// Insert at a position; the default position is the end of the file.
fn insert(
    at: &Target,
    id: CommandId,
    name: Option<String>,
    write: &WriteOpts,
    config: &ModeConfig,
    printer: &Printer,
) -> Result<()> {
    let mut session = open(&at.file, config)?;
    let end = session.document.len();
    let args = CommandArgs {
        position: Some(locate(&session, at.line, at.pos, end)?),
        name,
        ..CommandArgs::default()
    };
    execute(&mut session, id, &args, printer)?;
    write_back(&mut session, write)
}

fn whole_file(file: &Path, id: CommandId, config: &ModeConfig, printer: &Printer) -> Result<Session> {
    let mut session = open(file, config)?;
    execute(&mut session, id, &CommandArgs::default(), printer)?;
    Ok(session)
}

fn tools(
    at: &Target,
    id: CommandId,
    args: CommandArgs,
    tune: bool,
    dry_run: bool,
    config: &ModeConfig,
    printer: &Printer,
) -> Result<()> {
    let mut session = open(&at.file, config)?;
    if dry_run {
        session = session.with_runner(Box::new(DryRunner::default()));
    }
    let args = CommandArgs {
        position: Some(locate(&session, at.line, at.pos, 0)?),
        current_record_only: tune,
        ..args
    };
    execute(&mut session, id, &args, printer)
}

fn run(command: Commands, config: ModeConfig, sources: &ConfigSources, printer: &Printer) -> Result<()> {
    match command {
        Commands::Classify { file } => {
            whole_file(&file, CommandId::Classify, &config, printer)?;
        }
        Commands::Lint { file } => {
            whole_file(&file, CommandId::Lint, &config, printer)?;
        }
        Commands::Titles { file } => {
            whole_file(&file, CommandId::Titles, &config, printer)?;
        }
        Commands::Record { at } => query(&at, CommandId::CurrentRecord, &config, printer)?,
        Commands::Next { at } => query(&at, CommandId::NextRecord, &config, printer)?,
        Commands::Prev { at } => query(&at, CommandId::PreviousRecord, &config, printer)?,
        Commands::Renumber { file, write } => {
            let mut session = whole_file(&file, CommandId::Renumber, &config, printer)?;
            write_back(&mut session, &write)?;
        }
        Commands::AlignBars {
            file,
            from,
            to,
            write,
        } => {
            let mut session = open(&file, &config)?;
            let start = locate(&session, from, None, 0)?;
            let last = session.document.len();
            let end = match to {
                Some(line) => {
                    let offset = locate(&session, Some(line), None, last)?;
                    session.document.line_range(offset).end
                }
                None => last,
            };
            let args = CommandArgs {
                region: Some((start, end)),
                ..CommandArgs::default()
            };
            execute(&mut session, CommandId::AlignBars, &args, printer)?;
            write_back(&mut session, &write)?;
        }
        Commands::Skeleton { at, write } => {
            let mut session = open(&at.file, &config)?;
            let args = CommandArgs {
                position: Some(locate(&session, at.line, at.pos, 0)?),
                ..CommandArgs::default()
            };
            execute(&mut session, CommandId::ChordSkeleton, &args, printer)?;
            write_back(&mut session, &write)?;
        }
        Commands::Wrap {
            kind,
            file,
            start,
            end,
            write,
        } => {
            let mut session = open(&file, &config)?;
            let args = CommandArgs {
                region: Some((start, end)),
                ..CommandArgs::default()
            };
            execute(&mut session, kind.command(), &args, printer)?;
            write_back(&mut session, &write)?;
        }
        Commands::Field { at, name, write } => {
            insert(&at, CommandId::InsertField, Some(name), &write, &config, printer)?
        }
        Commands::NewTune { at, write } => {
            insert(&at, CommandId::NewTune, None, &write, &config, printer)?
        }
        Commands::Instrument { at, name, write } => {
            insert(&at, CommandId::Instrument, Some(name), &write, &config, printer)?
        }
        Commands::Instruments { names } => {
            let listing: Vec<(u8, &str)> = if names {
                instrument_names()
                    .into_iter()
                    .filter_map(|name| program_number(name).ok().map(|program| (program, name)))
                    .collect()
            } else {
                (0..=127)
                    .filter_map(|program| program_name(program).map(|name| (program, name)))
                    .collect()
            };
            if printer.is_json() {
                printer.json(&listing)?;
            } else {
                for (program, name) in listing {
                    println!("{:>3}  {}", program, name);
                }
            }
        }
        Commands::Pad {
            file,
            row,
            column,
            line,
            write,
        } => match (file, row, column) {
            (Some(file), Some(row), Some(column)) => {
                let mut session = open(&file, &config)?;
                let end = session.document.len();
                let args = CommandArgs {
                    position: Some(locate(&session, line, None, end)?),
                    pad: Some(PadPosition::new(row, column)),
                    ..CommandArgs::default()
                };
                execute(&mut session, CommandId::Pad, &args, printer)?;
                write_back(&mut session, &write)?;
            }
            _ => print!("{}", SymbolPad::default().render()),
        },
        Commands::Render {
            at,
            option_set,
            tune,
            dry_run,
        } => {
            let args = CommandArgs {
                option_set,
                ..CommandArgs::default()
            };
            tools(&at, CommandId::Render, args, tune, dry_run, &config, printer)?;
        }
        Commands::Midi { at, tune, dry_run } => {
            tools(&at, CommandId::Midi, CommandArgs::default(), tune, dry_run, &config, printer)?;
        }
        Commands::Transpose {
            file,
            semitones,
            dry_run,
        } => {
            let at = Target {
                file,
                line: None,
                pos: None,
            };
            let args = CommandArgs {
                semitones: Some(semitones),
                ..CommandArgs::default()
            };
            tools(&at, CommandId::Transpose, args, false, dry_run, &config, printer)?;
        }
        Commands::Config { sources: show_sources } => {
            if show_sources {
                if sources.files.is_empty() {
                    println!("# no config files found, using defaults");
                }
                for file in &sources.files {
                    println!("# file: {}", file.display());
                }
                for var in &sources.env_overrides {
                    println!("# env: {}", var);
                }
            }
            print!("{}", config.to_toml());
        }
    }
    Ok(())
}
