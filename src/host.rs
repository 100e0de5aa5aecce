//! Capabilities the interpreter borrows from whoever embeds it: writing one
//! line of program output, and reporting one diagnostic.

use log::debug;

use crate::error::LoxError;

pub trait Host {
    /// Emits one line produced by a `print` statement.
    fn print(&mut self, line: &str);

    /// Reports one lexical, syntax, resolution or runtime diagnostic.
    fn report(&mut self, diagnostic: &LoxError);
}

/// Program output to stdout, diagnostics to stderr.
#[derive(Debug, Default)]
pub struct Console;

impl Host for Console {
    fn print(&mut self, line: &str) {
        println!("{}", line);
    }

    fn report(&mut self, diagnostic: &LoxError) {
        eprintln!("{}", diagnostic);
    }
}

/// Records everything in memory; used by tests and other embedders that
/// want to inspect output after a run.
#[derive(Debug, Default)]
pub struct Capture {
    pub output: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl Host for Capture {
    fn print(&mut self, line: &str) {
        debug!("Captured output: {}", line);

        self.output.push(line.to_string());
    }

    fn report(&mut self, diagnostic: &LoxError) {
        self.diagnostics.push(diagnostic.to_string());
    }
}
