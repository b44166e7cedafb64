//! Centralised error hierarchy for the **Mython interpreter**.
//!
//! Each stage has its own failure family: [`LexError`] for the tokenizer and
//! the token cursor assertions, [`RuntimeError`] for evaluation, and parse
//! failures reported straight through [`MythonError::Parse`].  All of them
//! fold into [`MythonError`] so the driver can use a single `Result<T>`.
//!
//! The module **does not** print diagnostics itself; the driver does.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenKind};

/// Failures raised while turning source text into tokens, or while the parser
/// asserts on the shape of the token stream.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    /// Leading whitespace is not a multiple of two spaces.
    #[error("[line {line}] Error: bad indent of {width} spaces")]
    BadIndent { line: usize, width: usize },

    /// No recognizer accepts the character.
    #[error("[line {line}] Error: unrecognized character '{ch}'")]
    UnrecognizedToken { line: usize, ch: char },

    /// An integer literal that does not fit a signed 64-bit number.
    #[error("[line {line}] Error: number literal {literal} is out of range")]
    NumberOutOfRange { line: usize, literal: String },

    /// The cursor holds a token of the wrong kind.
    #[error("[line {line}] Error: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: TokenKind,
        found: Token,
    },

    /// The cursor holds a token of the right kind with the wrong payload.
    #[error("[line {line}] Error: expected {expected}, found {found}")]
    UnexpectedValue {
        line: usize,
        expected: Token,
        found: Token,
    },
}

/// Failures raised while executing the syntax tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("Runtime error: name '{0}' is not defined")]
    NameNotFound(String),

    #[error("Runtime error: class {class} has no method {method} taking {arity} argument(s)")]
    NoSuchMethod {
        class: String,
        method: String,
        arity: usize,
    },

    #[error("Runtime error: cannot compare {lhs} with {rhs}")]
    NoComparison {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Runtime error: cannot add {lhs} and {rhs}")]
    NoAddOperation {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Runtime error: operation '{op}' is not defined for {lhs} and {rhs}")]
    NoSuchOperation {
        op: char,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Runtime error: division by zero")]
    DivisionByZero,

    #[error("Runtime error: {context} requires a class instance, found {kind}")]
    NotAnInstance {
        context: String,
        kind: &'static str,
    },

    #[error("Runtime error: integer overflow in '{op}'")]
    IntegerOverflow { op: char },

    /// A borrowed `self` share outlived the instance it points at.
    #[error("Runtime error: instance is no longer alive")]
    DanglingInstance,

    /// A `return` escaped every method body.  Only a malformed tree does this.
    #[error("Runtime error: 'return' outside of a method body")]
    ReturnOutsideMethod,

    /// Writing to the output sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MythonError {
    /// Lexical error, including failed token assertions.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl MythonError {
    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        MythonError::Parse { message, line }
    }

    /// Process exit status the driver reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MythonError::Lex(_) | MythonError::Parse { .. } | MythonError::Utf8(_) => 65,
            MythonError::Runtime(_) | MythonError::Io(_) => 70,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, MythonError>;

/// Result alias used by the evaluator and the value model.
pub type ExecResult<T> = std::result::Result<T, RuntimeError>;
