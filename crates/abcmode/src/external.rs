//! Invocation of the external renderer, converter, transformer and preprocessor.
//!
//! Commands are built as argument vectors, never shell strings. A plan is a
//! list of invocations run in order; the preprocessor step, when present,
//! writes `<file>.abc` and the following step reads that file instead.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use abcconf::ToolsConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ModeError, Result};

/// One program with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a free-form flag string, split on whitespace.
    pub fn flags(mut self, flags: &str) -> Self {
        self.args
            .extend(flags.split_whitespace().map(str::to_string));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Shell-style preview of the command, for display only.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| quote(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured result of running an invocation. The exit status is reported,
/// not judged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// None when the process was not run or was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// An invocation together with what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRun {
    pub invocation: Invocation,
    pub output: ProcessOutput,
}

/// Host process facility.
pub trait ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs invocations with `std::process::Command`, waiting for each.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput> {
        info!(command = %invocation, "running external tool");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|e| ModeError::Process {
                program: invocation.program.clone(),
                source: e,
            })?;
        debug!(status = ?output.status.code(), "external tool finished");
        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Records invocations without running anything.
#[derive(Debug, Default, Clone)]
pub struct DryRunner {
    pub seen: Vec<Invocation>,
}

impl ProcessRunner for DryRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput> {
        info!(command = %invocation, "dry run");
        self.seen.push(invocation.clone());
        Ok(ProcessOutput::default())
    }
}

/// Run every step of a plan in order. Later steps run even when an earlier
/// one exits non-zero; only a failure to start stops the plan.
pub fn run_plan(runner: &mut dyn ProcessRunner, plan: Vec<Invocation>) -> Result<Vec<ToolRun>> {
    let mut runs = Vec::with_capacity(plan.len());
    for invocation in plan {
        let output = runner.run(&invocation)?;
        runs.push(ToolRun { invocation, output });
    }
    Ok(runs)
}

/// Builds invocation plans from the tool configuration.
#[derive(Debug, Clone, Copy)]
pub struct ToolChain<'a> {
    tools: &'a ToolsConfig,
}

impl<'a> ToolChain<'a> {
    pub fn new(tools: &'a ToolsConfig) -> Self {
        ToolChain { tools }
    }

    fn wants_preprocessor(&self, file: &Path) -> bool {
        self.tools.has_preprocessor()
            && file
                .extension()
                .is_some_and(|ext| ext == self.tools.preprocessor_extension.as_str())
    }

    /// The preprocessor step for `file`, if it applies, and the file the
    /// next step should read.
    fn preprocess(&self, file: &Path, for_midi: bool) -> (Option<Invocation>, PathBuf) {
        if !self.wants_preprocessor(file) {
            return (None, file.to_path_buf());
        }

        let output = preprocessed_name(file);
        let mut step = Invocation::new(self.tools.preprocessor.trim()).flags(&self.tools.preprocessor_options);
        if for_midi {
            step = step.arg(&self.tools.midi_macro_flag);
        }
        let step = step.path_arg(file).path_arg(&output);
        (Some(step), output)
    }

    /// Arguments for a named renderer option set.
    pub fn option_set_args(&self, name: &str) -> Result<Vec<String>> {
        self.tools
            .option_sets
            .get(name)
            .map(|flags| flags.split_whitespace().map(str::to_string).collect())
            .ok_or_else(|| ModeError::UnknownOptionSet(name.to_string()))
    }

    /// `[pp] renderer <option set> <flags> <file> [<record flag> <n>]`
    pub fn render_plan(
        &self,
        file: &Path,
        option_set: Option<&str>,
        record: Option<u64>,
    ) -> Result<Vec<Invocation>> {
        let set = option_set.unwrap_or(&self.tools.default_option_set);
        let set_args = self.option_set_args(set)?;

        let (pre, input) = self.preprocess(file, false);
        let mut render = Invocation::new(&self.tools.renderer);
        render.args.extend(set_args);
        let mut render = render.flags(&self.tools.renderer_flags).path_arg(&input);
        if let Some(n) = record {
            render = render
                .arg(&self.tools.renderer_record_flag)
                .arg(n.to_string());
        }

        Ok(pre.into_iter().chain(std::iter::once(render)).collect())
    }

    /// `[pp <macro flag>] converter <file> <flags> [<n>]`
    pub fn midi_plan(&self, file: &Path, record: Option<u64>) -> Vec<Invocation> {
        let (pre, input) = self.preprocess(file, true);
        let mut convert = Invocation::new(&self.tools.converter)
            .path_arg(&input)
            .flags(&self.tools.converter_flags);
        if let Some(n) = record {
            convert = convert.arg(n.to_string());
        }
        pre.into_iter().chain(std::iter::once(convert)).collect()
    }

    /// `transformer <file> <flags> -t <semitones>`
    pub fn transpose_plan(&self, file: &Path, semitones: i32) -> Vec<Invocation> {
        vec![Invocation::new(&self.tools.transformer)
            .path_arg(file)
            .flags(&self.tools.transformer_flags)
            .arg("-t")
            .arg(semitones.to_string())]
    }
}

/// `<file>.abc`, next to the original.
pub fn preprocessed_name(file: &Path) -> PathBuf {
    let mut name: OsString = file.as_os_str().to_owned();
    name.push(".abc");
    PathBuf::from(name)
}
