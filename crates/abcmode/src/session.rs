//! One editing session: a document plus everything commands need around it.

use std::path::PathBuf;

use abcconf::ModeConfig;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{ModeError, Result};
use crate::external::{run_plan, Invocation, ProcessRunner, SystemRunner, ToolChain, ToolRun};
use crate::records::RecordIndex;
use crate::tags::TagTable;

pub struct Session {
    pub document: Document,
    pub tags: TagTable,
    pub config: ModeConfig,
    runner: Box<dyn ProcessRunner>,
}

impl Session {
    /// Build a session; tag overrides from `config` are validated here.
    pub fn new(document: Document, config: ModeConfig) -> Result<Self> {
        let tags = TagTable::with_overrides(&config.tags)?;
        Ok(Session {
            document,
            tags,
            config,
            runner: Box::new(SystemRunner),
        })
    }

    pub fn with_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn tool_chain(&self) -> ToolChain<'_> {
        ToolChain::new(&self.config.tools)
    }

    /// Reference number of the record under the cursor.
    pub fn current_record(&self) -> Result<u64> {
        RecordIndex::of(&self.document).current_record_number(self.document.cursor())
    }

    /// Save, then return the file external tools should read.
    fn saved_file(&mut self) -> Result<PathBuf> {
        let path = self
            .document
            .path()
            .map(PathBuf::from)
            .ok_or(ModeError::NoFileName)?;
        self.document.save()?;
        Ok(path)
    }

    fn run(&mut self, plan: Vec<Invocation>) -> Result<Vec<ToolRun>> {
        let runs = run_plan(self.runner.as_mut(), plan)?;
        for run in &runs {
            match run.output.status {
                Some(0) | None => info!(program = %run.invocation.program, "tool finished"),
                Some(code) => warn!(program = %run.invocation.program, code, "tool exited non-zero"),
            }
        }
        Ok(runs)
    }

    /// Render the whole file, or only `record`.
    pub fn render(&mut self, option_set: Option<&str>, record: Option<u64>) -> Result<Vec<ToolRun>> {
        let file = self.saved_file()?;
        let plan = self.tool_chain().render_plan(&file, option_set, record)?;
        self.run(plan)
    }

    /// Convert the whole file, or only `record`, to MIDI.
    pub fn midi(&mut self, record: Option<u64>) -> Result<Vec<ToolRun>> {
        let file = self.saved_file()?;
        let plan = self.tool_chain().midi_plan(&file, record);
        self.run(plan)
    }

    /// Transpose by `semitones`. The transformer writes the result to stdout.
    pub fn transpose(&mut self, semitones: i32) -> Result<Vec<ToolRun>> {
        let file = self.saved_file()?;
        let plan = self.tool_chain().transpose_plan(&file, semitones);
        self.run(plan)
    }
}
