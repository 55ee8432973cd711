use std::fmt::Debug;

use crate::interpreter::result::RuntimeError;
use crate::lexer::TokenType;

pub trait UwuError: Debug {
    fn get_info(&self) -> ErrorInfo;
    fn get_message(&self) -> String;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ErrorInfo {
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("Oh nyo! Thewes a wittle oopsie-whoopsie on wine {line}: {cause}!!1!1!")]
pub struct SyntaxError {
    pub line: usize,
    pub cause: SyntaxCause,
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum SyntaxCause {
    #[error("{0}")]
    Malformed(String),
    #[error("Expwected {expected}, got {got}")]
    UnexpectedToken { expected: String, got: TokenType },
    #[error("couwd not wead the souwce: {0}")]
    Io(String),
}

impl SyntaxError {
    pub fn malformed<S: Into<String>>(line: usize, cause: S) -> Self {
        SyntaxError { line, cause: SyntaxCause::Malformed(cause.into()) }
    }

    pub fn unexpected<S: Into<String>>(line: usize, expected: S, got: TokenType) -> Self {
        SyntaxError { line, cause: SyntaxCause::UnexpectedToken { expected: expected.into(), got } }
    }

    /// True when the parse failed only because the input ended early, i.e. more lines could
    /// still complete it.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(&self.cause, SyntaxCause::UnexpectedToken { got: TokenType::Eof, .. })
    }
}

impl UwuError for SyntaxError {
    fn get_info(&self) -> ErrorInfo {
        ErrorInfo { line: self.line }
    }

    fn get_message(&self) -> String {
        self.cause.to_string()
    }
}

/// Everything a single parse + execute cycle can fail with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl UwuError for Error {
    fn get_info(&self) -> ErrorInfo {
        match self {
            Error::Syntax(e) => e.get_info(),
            Error::Runtime(e) => e.get_info(),
        }
    }

    fn get_message(&self) -> String {
        match self {
            Error::Syntax(e) => e.get_message(),
            Error::Runtime(e) => e.get_message(),
        }
    }
}

pub type UwuResult<A> = Result<A, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_is_distinguished_from_other_mismatches() {
        assert!(SyntaxError::unexpected(3, "onegaishimasu", TokenType::Eof).is_unexpected_eof());
        assert!(!SyntaxError::unexpected(3, "onegaishimasu", TokenType::Comma).is_unexpected_eof());
        assert!(!SyntaxError::malformed(3, "Unexpwected chawacter in numbwer").is_unexpected_eof());
    }

    #[test]
    fn message_carries_the_line() {
        let error = SyntaxError::malformed(7, "Expwected s after '");
        assert_eq!(error.get_info().line, 7);
        assert_eq!(
            error.to_string(),
            "Oh nyo! Thewes a wittle oopsie-whoopsie on wine 7: Expwected s after '!!1!1!",
        );
    }
}
