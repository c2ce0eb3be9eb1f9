use std::{fmt, sync::Arc};

use thiserror::Error;

/// Location of a token in a named source, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub source_name: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(source_name: impl Into<Arc<str>>, line: usize, column: usize) -> Self {
        Self {
            source_name: source_name.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {},{}", self.source_name, self.line, self.column)
    }
}

/// Compile-time or run-time origin of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Raised by the lexer or parser; always aborts compilation.
    Syntax,
    /// Raised while a compiled program runs.
    Runtime,
}

/// A user-facing error: message, optional source position and notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub position: Option<SourcePosition>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            notes: Vec::new(),
        }
    }

    pub fn syntax(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, message).with_position(position)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Runtime, message)
    }

    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} error", self.kind)?;
        if let Some(position) = &self.position {
            write!(f, " at {position}")?;
        }
        write!(f, ": {}", self.message)?;
        for note in &self.notes {
            write!(f, " (note: {note})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Error returned by compilation, execution and source reading.
#[derive(Debug, Error)]
pub enum SolfegeError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolfegeError {
    /// Attaches `position` unless the error already carries one.
    pub fn or_position(self, position: &SourcePosition) -> Self {
        match self {
            SolfegeError::Diagnostic(diagnostic) if diagnostic.position.is_none() => {
                SolfegeError::Diagnostic(diagnostic.with_position(position.clone()))
            }
            other => other,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            SolfegeError::Diagnostic(diagnostic) => Some(diagnostic),
            SolfegeError::Io(_) => None,
        }
    }
}

/// Shorthand for a runtime failure without a position.
pub fn runtime_error(message: impl Into<String>) -> SolfegeError {
    SolfegeError::from(Diagnostic::runtime(message))
}

pub type Result<T> = std::result::Result<T, SolfegeError>;
