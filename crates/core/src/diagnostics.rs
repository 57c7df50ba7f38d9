//! Source locations and the diagnostic reporter.
//!
//! A [`Location`] is carried by every AST node but can only be displayed:
//! no accessor exposes its file, line or column, so nothing outside this
//! module can make a semantic decision based on where a node came from.
//!
//! The [`Reporter`] is the single sink for user-facing errors. Non-fatal
//! reports bump its error counter and compilation continues; fatal reports
//! hand a [`Fatal`] value back to the caller, which must stop.

use crate::error::Fatal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ──────────────────────────────────────────────
// Location
// ──────────────────────────────────────────────

/// A (line, column) pair, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub line: u32,
    pub column: u32,
}

impl Point {
    pub fn new(line: u32, column: u32) -> Self {
        Point { line, column }
    }
}

/// File plus begin/end span of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    file: String,
    begin: Point,
    end: Point,
}

impl Location {
    pub fn new(file: impl Into<String>, begin: Point, end: Point) -> Self {
        Location {
            file: file.into(),
            begin,
            end,
        }
    }

    /// Placeholder location for synthesized nodes and tests.
    pub fn nowhere() -> Self {
        Location::new("nowhere", Point::new(0, 0), Point::new(0, 0))
    }

    /// Span from the start of `self` to the end of `other`.
    pub(crate) fn to(&self, other: &Location) -> Location {
        Location {
            file: self.file.clone(),
            begin: self.begin,
            end: other.end,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}-", self.file, self.begin.line, self.begin.column)?;
        if self.begin.line != self.end.line {
            write!(f, "{}.", self.end.line)?;
        }
        write!(f, "{}", self.end.column)
    }
}

/// Anything that has a location in a declaration file.
pub trait Locatable {
    fn location(&self) -> &Location;
}

// ──────────────────────────────────────────────
// Diagnostics
// ──────────────────────────────────────────────

/// Where a diagnostic points: a bare file, a node location, or nowhere.
#[derive(Debug, Clone)]
pub enum Site {
    File(String),
    Location(Location),
    Unplaced,
}

impl From<&Location> for Site {
    fn from(l: &Location) -> Self {
        Site::Location(l.clone())
    }
}

impl From<&str> for Site {
    fn from(file: &str) -> Self {
        Site::File(file.to_owned())
    }
}

impl From<&String> for Site {
    fn from(file: &String) -> Self {
        Site::File(file.clone())
    }
}

impl From<&Path> for Site {
    fn from(path: &Path) -> Self {
        Site::File(path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Fatal,
}

/// One emitted report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, site: Site, message: String) -> Self {
        let site = match site {
            Site::File(f) => Some(f),
            Site::Location(l) => Some(l.to_string()),
            Site::Unplaced => None,
        };
        Diagnostic {
            severity,
            site,
            message,
        }
    }

    /// The single output line for this report (without the newline).
    pub fn line(&self) -> String {
        match &self.site {
            Some(site) => format!("ERROR: {}: {}", site, self.message),
            None => format!("ERROR: {}", self.message),
        }
    }

    /// Serialize with every field present (null for a missing site).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "message":  self.message,
            "severity": self.severity,
            "site":     self.site,
        })
    }
}

/// Error counter plus line-oriented sink.
///
/// One reporter lives for a whole compilation unit; every driver and pass
/// writes to the same one so all errors of a run are surfaced together.
#[derive(Debug)]
pub struct Reporter {
    errors: usize,
    echo: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::new()
    }
}

impl Reporter {
    /// Reporter that writes every line to stderr as it is reported.
    pub fn new() -> Self {
        Reporter {
            errors: 0,
            echo: true,
            diagnostics: Vec::new(),
        }
    }

    /// Reporter that only records; used by tests and JSON output.
    pub fn silent() -> Self {
        Reporter {
            errors: 0,
            echo: false,
            diagnostics: Vec::new(),
        }
    }

    /// Report a non-fatal error. Compilation continues.
    pub fn error(&mut self, at: impl Into<Site>, message: impl Into<String>) {
        self.errors += 1;
        self.emit(Diagnostic::new(Severity::Error, at.into(), message.into()));
    }

    /// Report a non-fatal error that is not tied to any file.
    pub fn error_unplaced(&mut self, message: impl Into<String>) {
        self.error(Site::Unplaced, message);
    }

    /// Report an internal invariant break. The returned value must be
    /// propagated; the compilation cannot continue.
    #[must_use]
    pub fn fatal(&mut self, at: impl Into<Site>, message: impl Into<String>) -> Fatal {
        let message = message.into();
        self.errors += 1;
        self.emit(Diagnostic::new(
            Severity::Fatal,
            at.into(),
            message.clone(),
        ));
        Fatal { message }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn emit(&mut self, d: Diagnostic) {
        if self.echo {
            eprintln!("{}", d.line());
        }
        tracing::trace!(severity = ?d.severity, "diagnostic emitted");
        self.diagnostics.push(d);
    }
}
