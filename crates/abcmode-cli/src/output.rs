//! Human-readable and JSON rendering of command outcomes.

use std::io::IsTerminal;

use abcmode::{
    Category, CommandId, Diagnostic, DiagnosticLevel, Document, Outcome, PadAction, Span, ToolRun,
};
use anyhow::Result;
use owo_colors::OwoColorize;

pub struct Printer {
    color: bool,
    json: bool,
}

impl Printer {
    pub fn new(json: bool, no_color: bool) -> Self {
        let color = !no_color
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_terminal();
        Printer { color, json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    fn paint(&self, text: &str, category: Category) -> String {
        if !self.color {
            return text.to_string();
        }
        match category {
            Category::HeaderField => text.bright_blue().to_string(),
            Category::TitleField => text.bright_cyan().bold().to_string(),
            Category::KeyOrVoiceField => text.bright_magenta().to_string(),
            Category::ExtendedDirective => text.yellow().to_string(),
            Category::MidiDirective => text.bright_yellow().to_string(),
            Category::Decoration => text.green().to_string(),
            Category::Lyrics => text.italic().to_string(),
            Category::AccidentalWarning => text.bright_red().underline().to_string(),
            Category::BarLine => text.bold().to_string(),
            Category::PreprocessorDirective => text.bright_black().to_string(),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print what `command` did to `document`.
    pub fn outcome(&self, command: CommandId, outcome: &Outcome, document: &Document) -> Result<()> {
        if self.json {
            return self.json(outcome);
        }

        match outcome {
            Outcome::Nothing => match command {
                CommandId::NextRecord => eprintln!("No tune after this position"),
                CommandId::PreviousRecord => eprintln!("No tune before this position"),
                CommandId::Undo => eprintln!("Nothing to undo"),
                _ => {}
            },
            Outcome::Edited => {}
            Outcome::Moved(offset) => println!("{}", document.line_number(*offset)),
            Outcome::Record(n) => match command {
                CommandId::NewTune => eprintln!("Inserted tune {}", n),
                _ => println!("{}", n),
            },
            Outcome::Count(n) => match command {
                CommandId::Renumber => eprintln!("Renumbered {} tunes", n),
                CommandId::AlignBars => eprintln!("Aligned {} lines", n),
                _ => eprintln!("Changed {} lines", n),
            },
            Outcome::Region(range) => {
                eprintln!("Wrapped bytes {}..{}", range.start, range.end)
            }
            Outcome::Program(program) => eprintln!("Inserted %%MIDI program {}", program),
            Outcome::Pad(action) => {
                if let PadAction::Insert(token) = action {
                    eprintln!("Inserted {}", token);
                }
            }
            Outcome::Annotations(lines) => self.annotations(lines, document),
            Outcome::Diagnostics(diagnostics) => self.diagnostics(diagnostics, document),
            Outcome::Titles(titles) => {
                for (line, title) in titles {
                    println!("{:>5}  {}", self.dim(&line.to_string()), title);
                }
            }
            Outcome::Tools(runs) => self.tool_runs(runs),
        }
        Ok(())
    }

    fn annotations(&self, lines: &[(usize, Vec<Span>)], document: &Document) {
        let text: Vec<&str> = document.text().lines().collect();
        for (number, spans) in lines {
            if spans.is_empty() {
                continue;
            }
            let Some(line) = text.get(number - 1) else {
                continue;
            };
            let tags: Vec<String> = spans
                .iter()
                .map(|span| format!("{}={}", span.category.as_str(), self.paint(span.text(line), span.category)))
                .collect();
            println!("{:>5}  {}", self.dim(&number.to_string()), tags.join("  "));
        }
    }

    fn diagnostics(&self, diagnostics: &[Diagnostic], document: &Document) {
        let name = document
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string());
        for d in diagnostics {
            let level = match (d.level, self.color) {
                (DiagnosticLevel::Warning, true) => d.level.as_str().bright_yellow().to_string(),
                (DiagnosticLevel::Info, true) => d.level.as_str().bright_blue().to_string(),
                (level, false) => level.as_str().to_string(),
            };
            println!("{}:{}:{}: {}: {}", name, d.line, d.column, level, d.message);
            if let Some(suggestion) = &d.suggestion {
                println!("    {}", self.dim(&format!("hint: {}", suggestion)));
            }
        }
    }

    fn tool_runs(&self, runs: &[ToolRun]) {
        for run in runs {
            println!("{}", self.dim(&format!("$ {}", run.invocation.command_line())));
            print!("{}", run.output.stdout);
            eprint!("{}", run.output.stderr);
            if let Some(code) = run.output.status.filter(|&code| code != 0) {
                eprintln!("{} exited with status {}", run.invocation.program, code);
            }
        }
    }
}
