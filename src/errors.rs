//! Error taxonomy for parsing, loading and running mdscript programs
//!
//! Every error is fatal to the run that raised it. Output produced before the
//! failure is kept by the VM (see [`crate::interpreter::executor::RunFailure`]).

use std::path::PathBuf;
use thiserror::Error;

/// Malformed expression text
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error in `{text}`: {message}")]
pub struct SyntaxError {
    /// The fragment that failed to parse
    pub text: String,
    pub message: String,
}

impl SyntaxError {
    pub fn new(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            message: message.into(),
        }
    }
}

/// A function or program that could not be found
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("entry function '{name}' is not declared")]
    UnknownEntry { name: String },

    #[error("function '{name}' is not declared")]
    UnknownFunction { name: String },

    #[error("function '{name}' is not declared in {}", path.display())]
    UnknownExternalFunction { name: String, path: PathBuf },

    #[error("cannot load program {}: {source}", path.display())]
    ProgramNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("calling '{callee}' inside an expression is not supported; use a link call instead")]
    CallInExpression { callee: String },

    #[error("cannot read property '{property}' of {target}")]
    PropertyOfNothing { property: String, target: String },
}

/// Failure while executing statements
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("call depth exceeded {limit} frames while calling '{function}'")]
    CallDepthExceeded { function: String, limit: usize },

    #[error("input was provided but the program is not waiting for input")]
    UnexpectedInput,

    #[error("program is waiting for input into '{variable}'")]
    InputRequired { variable: String },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

pub type Result<T> = std::result::Result<T, Error>;
