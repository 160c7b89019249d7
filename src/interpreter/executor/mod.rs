//! # Executor - Resumable Stack-Driven Interpreter
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: All state in `frames: Vec<Frame>`, no recursion
//! 2. **Statement-level execution**: Each frame has a cursor into its open blocks
//! 3. **Tail calls replace frames**: recursion in tail position runs in constant space
//! 4. **Pure executor**: No I/O and no async inside the VM - it runs until it
//!    needs input or completes, and drivers decide where input comes from
//!
//! Two disciplines share the same loop: [`run`] reads `Input` statements from
//! a pre-supplied buffer, [`run_streaming`] suspends on each of them and asks
//! an async provider.

pub mod exec_loop;
pub mod expressions;
pub mod statements;
pub mod vm;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::interpreter::loader::ProgramCache;
use crate::interpreter::types::{InputRequest, Program, Val};

// Re-export commonly used items
pub use exec_loop::{run_interactive, run_until_done, run_until_suspended, step};
pub use expressions::{apply_binary, eval_expr};
pub use vm::{InputSource, OutputSink, Step, VmOptions, VM};

/* ===================== Entry Contract ===================== */

/// Everything a run needs besides the program itself
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Function execution starts in
    pub entry: String,
    /// Values bound to the entry function's parameters
    pub args: Vec<Val>,
    /// Values consumed by `Input` statements in buffered runs
    pub inputs: Vec<Val>,
    pub vm: VmOptions,
    /// Cache for externally referenced programs; a fresh one when `None`
    pub cache: Option<Arc<ProgramCache>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            args: Vec::new(),
            inputs: Vec::new(),
            vm: VmOptions::default(),
            cache: None,
        }
    }
}

/// A failed run, with everything it printed before failing
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: Error,
    pub output: Vec<Val>,
}

impl From<Error> for RunFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            output: Vec::new(),
        }
    }
}

fn build_vm(program: Arc<Program>, options: RunOptions) -> Result<VM> {
    let RunOptions {
        entry,
        args,
        inputs,
        vm: vm_options,
        cache,
    } = options;

    let mut vm = VM::new(program, &entry, args)?
        .with_inputs(inputs)
        .with_options(vm_options);
    if let Some(cache) = cache {
        vm = vm.with_cache(cache);
    }
    debug!(entry = %entry, "starting run");
    Ok(vm)
}

fn finish(vm: VM, outcome: Result<()>) -> std::result::Result<Vec<Val>, RunFailure> {
    match outcome {
        Ok(()) => Ok(vm.output),
        Err(error) => {
            warn!(error = %error, printed = vm.output.len(), "run failed");
            Err(RunFailure {
                error,
                output: vm.output,
            })
        }
    }
}

/// Run `program` in buffered mode and return what it printed
///
/// `sink`, when given, also receives every printed value as it is produced.
pub fn run(
    program: Arc<Program>,
    options: RunOptions,
    sink: Option<OutputSink>,
) -> std::result::Result<Vec<Val>, RunFailure> {
    let mut vm = build_vm(program, options)?;
    if let Some(sink) = sink {
        vm = vm.with_sink(sink);
    }
    let outcome = run_until_done(&mut vm);
    finish(vm, outcome)
}

/// Run `program` in interactive mode
///
/// Every `Input` statement suspends the run until `provider` resolves;
/// `options.inputs` is ignored. Printed values go to `sink` as they are
/// produced and are also returned in order.
pub async fn run_streaming<F, Fut>(
    program: Arc<Program>,
    options: RunOptions,
    sink: OutputSink,
    provider: F,
) -> std::result::Result<Vec<Val>, RunFailure>
where
    F: FnMut(InputRequest) -> Fut,
    Fut: Future<Output = Val>,
{
    let mut vm = build_vm(program, options)?.interactive().with_sink(sink);
    let outcome = run_interactive(&mut vm, provider).await;
    finish(vm, outcome)
}
