use crate::common::error::{ErrorInfo, UwuError};
use crate::interpreter::uwu_value::ValueRef;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("Could not find {0}")]
    UnknownIdentifier(String),
    #[error("Cwould not fwind {0}")]
    MissingCallee(String),
    #[error("Cannot cawl {0}")]
    NotCallable(&'static str),
    #[error("Expwected {expected} args, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("Cannot get possessive of {0}")]
    NoMembers(&'static str),
    #[error("Cannot set watashi!")]
    AssignWatashi,
    #[error("Object to extend must be CWASSDEF, got {0}")]
    ExtendNonClass(&'static str),
    #[error("Circuwar inhewitance")]
    CircularInheritance,
    #[error("Too much wecuwsion! Cawl depth went past {0}")]
    CallDepth(usize),
    #[error("Couwd not woad {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Consowe ewwow: {0}")]
    Console(String),
    #[error("Mawfowmed twee: {0}")]
    MalformedTree(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct CallSite {
    pub name: String,
    pub line: usize,
}

/// A failure during evaluation. `trace` lists the calls it unwound through, innermost first.
#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("Oh Nyo! Pwogwam ewwow on wine {line}! {kind}   ┐('～`;)┌{}", render_trace(.trace))]
pub struct RuntimeError {
    pub line: usize,
    pub kind: RuntimeErrorKind,
    pub trace: Vec<CallSite>,
}

fn render_trace(trace: &[CallSite]) -> String {
    trace.iter().map(|e| format!("\n    cawled at {} on wine {}", e.name, e.line)).collect()
}

impl RuntimeError {
    pub fn new(line: usize, kind: RuntimeErrorKind) -> Self {
        RuntimeError { line, kind, trace: Vec::new() }
    }

    pub fn called_at<S: Into<String>>(mut self, name: S, line: usize) -> Self {
        self.trace.push(CallSite { name: name.into(), line });
        self
    }
}

impl UwuError for RuntimeError {
    fn get_info(&self) -> ErrorInfo {
        ErrorInfo { line: self.line }
    }

    fn get_message(&self) -> String {
        self.kind.to_string()
    }
}

/// Non-error ways out of a block.
#[derive(Debug, Clone)]
pub enum Control {
    Give(ValueRef),
    /// Levels of enclosing `repeat` loops still to leave.
    Break(usize),
}

pub type InterpretResult<A> = Result<A, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_renders_innermost_first() {
        let error = RuntimeError::new(3, RuntimeErrorKind::UnknownIdentifier("x".into()))
            .called_at("inner", 7)
            .called_at("outer's method", 9);
        assert_eq!(
            error.to_string(),
            [
                "Oh Nyo! Pwogwam ewwow on wine 3! Could not find x   ┐('～`;)┌",
                "    cawled at inner on wine 7",
                "    cawled at outer's method on wine 9",
            ].join("\n"),
        );
        assert_eq!(error.get_info().line, 3);
        assert_eq!(error.get_message(), "Could not find x");
    }
}
