//! Error types for compilation and execution.
//!
//! Lex and parse failures are fatal for the whole compilation unit and are
//! reported as [`CompileError`] before any code runs. Everything that happens
//! during execution is a [`RunError`]: it carries the script-visible payload
//! value and unwinds to the innermost `try`, so every runtime error kind is
//! catchable from script code.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::{heap::Heap, value::Value};

/// Result type alias for operations that can raise a runtime error.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Classification of every error the runtime can report.
///
/// `LexError` and `ParseError` occur before execution and cannot be caught by
/// script code. The remaining kinds surface as catchable exceptions whose
/// payload is a String message, except `UserThrow` which preserves the thrown
/// value verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    /// Unknown character or unterminated string.
    LexError,
    /// Malformed syntax or a misplaced keyword.
    ParseError,
    /// Undeclared use, or redeclaration in the same scope.
    NameError,
    /// Wrong operand kind, non-callable call, invalid assignment target.
    TypeError,
    /// Division by zero.
    ArithmeticError,
    /// An index or precision argument outside its valid range.
    RangeError,
    /// Module resolution, read or compile failure.
    ModuleError,
    /// A failure reported by a host function.
    HostError,
    /// A script-level `throw`; the payload is the thrown value.
    UserThrow,
}

/// A runtime error in flight.
///
/// The payload is a real runtime value so `try/catch` can bind it directly.
/// For host-raised kinds the payload is a heap String of the form
/// `"TypeError: ..."`. Never stored in a scope or property; it only travels
/// through `Result` until a catch clause consumes it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunError {
    pub kind: ErrorKind,
    pub value: Value,
}

impl RunError {
    /// Builds an error whose payload is a formatted `"Kind: message"` string.
    pub fn msg(kind: ErrorKind, heap: &mut Heap, message: impl fmt::Display) -> Self {
        let value = heap.alloc_str(format!("{kind}: {message}"));
        Self { kind, value }
    }

    pub fn name_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::NameError, heap, message)
    }

    pub fn type_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::TypeError, heap, message)
    }

    pub fn arithmetic_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::ArithmeticError, heap, message)
    }

    pub fn range_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::RangeError, heap, message)
    }

    pub fn module_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::ModuleError, heap, message)
    }

    pub fn host_error(heap: &mut Heap, message: impl fmt::Display) -> Self {
        Self::msg(ErrorKind::HostError, heap, message)
    }

    /// Wraps a value raised by script `throw`, preserved verbatim.
    pub fn thrown(value: Value) -> Self {
        Self {
            kind: ErrorKind::UserThrow,
            value,
        }
    }
}

/// A fatal lexer or parser failure with position information.
///
/// Produced before any code executes; the whole compilation unit is rejected.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
    /// The offending lexeme, when one is available.
    pub lexeme: Option<String>,
}

impl CompileError {
    pub(crate) fn lex(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind: ErrorKind::LexError,
            message: message.into(),
            line,
            column,
            lexeme: None,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, line: u32, column: u32, lexeme: Option<String>) -> Self {
        Self {
            kind: ErrorKind::ParseError,
            message: message.into(),
            line,
            column,
            lexeme,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at line {}, column {}",
            self.kind, self.message, self.line, self.column
        )?;
        if let Some(lexeme) = &self.lexeme
            && !lexeme.is_empty()
        {
            write!(f, ", near '{lexeme}'")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Public form of an execution failure, detached from the heap.
///
/// The message is the display string of the payload value, which for
/// host-raised errors is already of the form `"TypeError: ..."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub kind: ErrorKind,
    pub message: String,
}

impl Exception {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            // UserThrow payloads are arbitrary values; prefix them so the
            // rendered form still names a kind.
            ErrorKind::UserThrow => write!(f, "uncaught: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Exception {}

impl From<CompileError> for Exception {
    fn from(err: CompileError) -> Self {
        Self::new(err.kind, err.to_string())
    }
}
