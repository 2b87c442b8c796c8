pub mod ansi;
pub mod json;
pub mod registry;

use serde::Serialize;

use crate::compiler::{CompileError, ErrorLocation};
use crate::source::Span;
use crate::vm::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[allow(dead_code)] // no warnings are produced yet
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

/// A renderable report: built from a compile or runtime error, then handed to
/// [`ansi::AnsiRenderer`] or [`json::render`].
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub line: Option<usize>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            line: None,
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: true });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(e: &CompileError) -> Self {
        let label = match &e.location {
            ErrorLocation::AtEnd => "at end of input".to_string(),
            ErrorLocation::AtLexeme(lexeme) => format!("at '{lexeme}'"),
            ErrorLocation::Bare => "here".to_string(),
        };
        let d = Diagnostic::error(&e.message)
            .with_code(e.code)
            .with_line(e.line)
            .with_span(e.span, label);
        match registry::lookup(e.code) {
            Some(entry) if !entry.hint.is_empty() => d.with_suggestion(entry.hint),
            _ => d,
        }
    }
}

impl From<&RuntimeError> for Diagnostic {
    fn from(e: &RuntimeError) -> Self {
        let d = Diagnostic::error(e.error.to_string())
            .with_line(e.line)
            .with_note("in script");
        match e.error.code() {
            Some(code) => d.with_code(code),
            None => d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Heap;
    use crate::vm::VmError;

    fn first_compile_error(source: &str) -> CompileError {
        let mut heap = Heap::new();
        crate::compiler::compile(source, &mut heap).unwrap_err().remove(0)
    }

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "something went wrong");
        assert!(d.labels.is_empty());
        assert!(d.code.is_none());
        assert!(d.line.is_none());
    }

    #[test]
    fn from_compile_error_carries_span_and_code() {
        let e = first_compile_error("print 1 +;");
        let d = Diagnostic::from(&e);
        assert_eq!(d.message, "Expect expression.");
        assert_eq!(d.code, Some("LOX-C001"));
        assert_eq!(d.line, Some(1));
        assert_eq!(d.labels[0].span, Span { start: 9, end: 10 });
        assert_eq!(d.labels[0].message, "at ';'");
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_compile_error_at_end() {
        let d = Diagnostic::from(&first_compile_error("print 1"));
        assert_eq!(d.labels[0].message, "at end of input");
    }

    #[test]
    fn from_runtime_error_has_line_but_no_span() {
        let e = RuntimeError { error: VmError::OperandNotNumber, line: 7 };
        let d = Diagnostic::from(&e);
        assert_eq!(d.message, "Operand must be a number.");
        assert_eq!(d.line, Some(7));
        assert_eq!(d.code, Some("LOX-R001"));
        assert!(d.labels.is_empty());
    }

    #[test]
    fn internal_runtime_errors_have_no_code() {
        let e = RuntimeError { error: VmError::StackUnderflow, line: 1 };
        assert!(Diagnostic::from(&e).code.is_none());
    }
}
