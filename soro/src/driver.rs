use std::error::Error;
use std::fmt::Write;
use std::io::Read;
use std::process::ExitCode;
use std::slice;

use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use soroc::CompileError;
use soroc::ast::Expr;
use soroc::eval::eval;
use soroc::lexer::Lexer;
use soroc::parser::Parser;
use sorospan::Spand;

use crate::cli::Cli;
use crate::editor::{Editor, EditorRead};
use crate::report::{Report, SimpleReport, plain_message};

/// Where an evaluation unit came from, for rendering its errors.
struct Source<'a> {
    name:   &'a str,
    /// full text the error spans index into once shifted by `offset`
    text:   &'a str,
    /// the evaluation unit itself
    line:   &'a str,
    offset: u32,
    row:    Option<usize>,
}

pub struct Driver {
    file:       Option<SimpleFile<String, String>>,
    max_errors: usize,
    quiet:      bool,
    plain:      bool,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(<Cli as clap::Parser>::parse())
    }

    fn read_stdin() -> String {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .expect("Should read input from stdin");
        input
    }

    #[must_use]
    fn from_config(cfg: Cli) -> Self {
        let file = if cfg.stdin {
            Some(SimpleFile::new("<stdin>".to_string(), Self::read_stdin()))
        } else {
            cfg.file.map(|path| {
                let source = std::fs::read_to_string(&path).expect("Should be valid file path");
                SimpleFile::new(path, source)
            })
        };
        Self {
            file,
            quiet: cfg.quiet,
            plain: cfg.plain,
            max_errors: cfg.max_errors,
        }
    }

    pub fn run(self) -> ExitCode {
        let Some(file) = &self.file else {
            return match self.repl() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        };

        let (seen, shown) = self.run_lines(file.name(), file.source());
        if seen == 0 {
            return ExitCode::SUCCESS;
        }

        self.summarize(seen, shown);
        ExitCode::FAILURE
    }

    /// Evaluates every non-blank line on its own, printing values to
    /// stdout and reporting failures against a shared error budget.
    /// Returns how many errors were found and how many were emitted.
    #[allow(clippy::cast_possible_truncation)]
    fn run_lines(&self, name: &str, text: &str) -> (usize, usize) {
        let mut seen = 0;
        let mut shown = 0;
        let mut offset = 0;

        for (row, raw) in text.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len();

            let line = raw.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            match compile(line) {
                Ok(expr) => println!("{}", eval(&expr)),
                Err(error) => {
                    let source = Source {
                        name,
                        text,
                        line,
                        offset: start as u32,
                        row: Some(row + 1),
                    };
                    let budget = self.max_errors.saturating_sub(shown);
                    let (found, emitted) = self.report_compile(&source, &error, budget);
                    seen += found;
                    shown += emitted;
                }
            }
        }

        (seen, shown)
    }

    fn report_compile(
        &self,
        source: &Source,
        error: &CompileError,
        budget: usize,
    ) -> (usize, usize) {
        match error {
            CompileError::Lex(error) => (1, self.emit(source, slice::from_ref(error), budget)),
            CompileError::Parse(errors) => (errors.len(), self.emit(source, errors, budget)),
        }
    }

    fn emit<T: Error + Copy>(&self, source: &Source, errors: &[Spand<T>], budget: usize) -> usize {
        if self.quiet || budget == 0 {
            return 0;
        }

        let mut shown = 0;

        if self.plain {
            for error in errors.iter().take(budget) {
                if let Some(row) = source.row {
                    eprintln!("{}:{row}:", source.name);
                }
                eprintln!("{}", plain_message(source.line, error));
                shown += 1;
            }
            return shown;
        }

        let file = SimpleFile::new(source.name.to_string(), source.text.to_string());
        let writer = StandardStream::stderr(ColorChoice::Always);
        let config = term::Config::default();

        let mut writer = writer.lock();
        for error in errors.iter().take(budget) {
            let report = error.shifted(source.offset).diagnose();
            let _ = term::emit(&mut writer, &config, &file, &report);
            shown += 1;
        }

        shown
    }

    fn summarize(&self, seen: usize, shown: usize) {
        if self.quiet {
            return;
        }

        let mut message = self.file.as_ref().map_or_else(
            || "could not evaluate".to_string(),
            |file| format!("could not evaluate {}", file.name()),
        );

        let _ = message.write_fmt(format_args!(
            " due to {} previous {} ({} emitted)",
            seen,
            if seen > 1 { "errors" } else { "error" },
            shown
        ));

        if self.plain {
            eprintln!("{message}");
            return;
        }

        let file = SimpleFile::new(String::new(), String::new());
        let report = SimpleReport::new(message).diagnose();
        let writer = StandardStream::stderr(ColorChoice::Always);
        let config = term::Config::default();
        let _ = term::emit(&mut writer.lock(), &config, &file, &report);
    }

    fn repl(&self) -> std::io::Result<()> {
        let mut editor = Editor::default();
        loop {
            let signal = editor.read()?;
            let input = match signal {
                EditorRead::Read(input) => input,
                EditorRead::Break => break,
                EditorRead::Continue => continue,
            };

            match compile(&input) {
                Ok(expr) => println!("{}", eval(&expr)),
                Err(error) => {
                    let source = Source {
                        name: "<stdin>",
                        text: &input,
                        line: &input,
                        offset: 0,
                        row: None,
                    };
                    let (seen, shown) = self.report_compile(&source, &error, self.max_errors);
                    self.summarize(seen, shown);
                }
            }
        }

        Ok(())
    }
}

fn compile(input: &str) -> Result<Expr, CompileError> {
    let tokens = Lexer::new(input).lex_all()?;
    Ok(Parser::new(tokens).parse()?)
}
