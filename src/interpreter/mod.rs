//! mdscript interpreter
//!
//! Source flows through three stages:
//! 1. [`crate::markdown`] turns text into a document tree
//! 2. [`transform`] turns the tree into a [`Program`], parsing the expression
//!    text it finds along the way with [`parser`]
//! 3. [`executor`] runs a function of the program

pub mod executor;
pub mod loader;
pub mod parser;
pub mod transform;
pub mod types;

use std::path::PathBuf;

pub use executor::{run, run_streaming, RunFailure, RunOptions, Step, VmOptions, VM};
pub use loader::ProgramCache;
pub use transform::transform;
pub use types::{FunctionDecl, Program, Val};

use crate::errors::SyntaxError;
use crate::markdown::parse_document;

/// Parse markdown source into a program
///
/// `base_dir` is where the program's external calls are resolved from.
pub fn parse_program(source: &str, base_dir: impl Into<PathBuf>) -> Result<Program, SyntaxError> {
    transform(&parse_document(source), base_dir)
}
