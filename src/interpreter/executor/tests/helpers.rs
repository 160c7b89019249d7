//! Test helpers for executor tests
//!
//! Common utilities for parsing programs and building VMs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::interpreter::executor::{run_until_done, OutputSink, VM};
use crate::interpreter::parse_program;
use crate::interpreter::types::{Program, Val};

/// Parse a program, round-trip it through JSON, and share it
///
/// The round trip checks that everything the transform produces serializes.
pub fn parse_and_round_trip(source: &str, base_dir: &Path) -> Arc<Program> {
    let program = parse_program(source, base_dir).expect("Parse program failed");
    let json = serde_json::to_string(&program).expect("Program serialization failed");
    let program: Program = serde_json::from_str(&json).expect("Program deserialization failed");
    Arc::new(program)
}

/// Parse a program and build a VM starting at `main` with no arguments
pub fn build_vm(source: &str) -> VM {
    let program = parse_and_round_trip(source, Path::new("."));
    VM::new(program, "main", vec![]).expect("VM creation failed")
}

/// Run `main` of a program to completion and return what it printed
pub fn run_source(source: &str) -> Vec<Val> {
    let mut vm = build_vm(source);
    run_until_done(&mut vm).expect("Run failed");
    vm.output
}

/// Printed values as the user sees them
pub fn printed(output: &[Val]) -> Vec<String> {
    output.iter().map(Val::to_string).collect()
}

/// Write a program file below `dir`, creating parent directories
pub fn write_program(dir: &Path, relative: &str, source: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create program directory");
    }
    fs::write(&path, source).expect("write program");
    path
}

/// Sink that records every value it receives, rendered as text
pub fn recording_sink() -> (OutputSink, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: OutputSink = Box::new(move |value: &Val| {
        sink_seen.lock().unwrap().push(value.to_string());
    });
    (sink, seen)
}
