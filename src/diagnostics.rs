use std::fmt;

use thiserror::Error;

use crate::parser::ParseError;
use crate::scanner::ScanError;

/// A static (pre-execution) error: anything that stops a program from being run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::Scan(e) => e.line,
            Diagnostic::Parse(e) => e.token.line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Scan(e) => &e.message,
            Diagnostic::Parse(e) => &e.message,
        }
    }
}

/// Shared sink for scan and parse errors. The scanner and parser append to it,
/// the runner inspects it before deciding whether to interpret.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: impl Into<Diagnostic>) {
        let diagnostic = diagnostic.into();
        tracing::debug!(line = diagnostic.line(), "{}", diagnostic.message());
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn scan_errors(&self) -> impl Iterator<Item = &ScanError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Scan(e) => Some(e),
            Diagnostic::Parse(_) => None,
        })
    }

    pub fn parse_errors(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Parse(e) => Some(e),
            Diagnostic::Scan(_) => None,
        })
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// One report per line, in the order they were found.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, diagnostic) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
