pub mod cli;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod markdown;

// Re-export main types
pub use errors::{Error, Result};
pub use interpreter::{
    parse_program, run, run_streaming, Program, ProgramCache, RunFailure, RunOptions, Val,
};
