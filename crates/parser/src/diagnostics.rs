//! Reporting of failed parses.
//!
//! Parsing itself never prints. A [`Parser`](crate::Parser) hands every
//! failure to its [`Diagnostics`] sink, which decides where the echo of the
//! offending input goes. Sinks are shared between threads, so they must be
//! `Send + Sync`.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// One failed parse: the statement, where the parser stopped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub input: String,
    pub position: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self
            .input
            .get(..self.position)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(self.position);
        write!(
            f,
            "{}\n{}^\n{}",
            self.input,
            " ".repeat(column),
            self.message
        )
    }
}

pub trait Diagnostics: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Diagnostics for Silent {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Emits a `warn` event per failed parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::warn!(
            position = diagnostic.position,
            input = %diagnostic.input,
            "failed to parse statement\n{}",
            diagnostic
        );
    }
}

/// Writes the rendered diagnostic to a shared writer, one report at a time.
#[derive(Debug)]
pub struct WriterDiagnostics<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterDiagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WriterDiagnostics<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> Diagnostics for WriterDiagnostics<W> {
    fn report(&self, diagnostic: &Diagnostic) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "{}", diagnostic);
    }
}
