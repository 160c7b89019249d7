//! Core execution loop
//!
//! This module contains the step() function - the heart of the interpreter.
//! Each step runs one statement of the current frame. Calls push (or, in
//! tail position, replace) frames instead of recursing, so host stack use
//! does not grow with the program's call depth.
//!
//! ## Function Organization
//! 1. run_until_done() / run_until_suspended() / run_interactive() - drivers
//! 2. step() - main execution loop (dispatches to statement handlers)

use std::future::Future;
use std::sync::Arc;
use tracing::trace;

use super::statements::{
    execute_assign, execute_break, execute_call, execute_if, execute_input, execute_print,
};
use super::vm::{Step, VM};
use crate::errors::{ExecError, Result};
use crate::interpreter::types::{block_at, Control, InputRequest, Stmt, Val};

/* ===================== Public API ===================== */

/// Run the VM until it completes
///
/// Buffered runs never suspend; an interactive VM that reaches an `Input`
/// statement fails with `InputRequired`.
pub fn run_until_done(vm: &mut VM) -> Result<()> {
    match run_until_suspended(vm)? {
        Step::Suspended(InputRequest { variable }) => {
            Err(ExecError::InputRequired { variable }.into())
        }
        _ => Ok(()),
    }
}

/// Run the VM until it completes or needs input
///
/// Returns `Step::Done` or `Step::Suspended`.
pub fn run_until_suspended(vm: &mut VM) -> Result<Step> {
    loop {
        match step(vm)? {
            Step::Continue => continue,
            other => return Ok(other),
        }
    }
}

/// Run the VM to completion, asking `provider` for every input value
///
/// The VM itself never awaits: it reports `Step::Suspended` and this driver
/// resolves the request and feeds the value back in.
pub async fn run_interactive<F, Fut>(vm: &mut VM, mut provider: F) -> Result<()>
where
    F: FnMut(InputRequest) -> Fut,
    Fut: Future<Output = Val>,
{
    loop {
        match run_until_suspended(vm)? {
            Step::Suspended(request) => {
                let value = provider(request).await;
                vm.provide_input(value)?;
            }
            _ => return Ok(()),
        }
    }
}

/// Execute one step of the VM
///
/// 1. Report a pending input request without doing anything
/// 2. Close every block of the current frame that has run out of statements;
///    a frame whose body is exhausted returns
/// 3. Move the cursor past the next statement and run it
pub fn step(vm: &mut VM) -> Result<Step> {
    if let Control::AwaitingInput(request) = &vm.control {
        return Ok(Step::Suspended(request.clone()));
    }

    // Get top frame (if any)
    let Some(frame) = vm.frames.last_mut() else {
        // No frames left - execution complete
        return Ok(Step::Done);
    };

    let function = Arc::clone(&frame.function);
    let (stmt, tail) = loop {
        let Some(depth) = frame.cursor.len().checked_sub(1) else {
            trace!(function = %function.name, "return");
            vm.frames.pop();
            return Ok(Step::Continue);
        };

        let idx = frame.cursor[depth];
        match block_at(&function.body, &frame.cursor, depth).get(idx) {
            Some(stmt) => {
                frame.cursor[depth] += 1;
                break (stmt, frame.at_tail());
            }
            None => {
                frame.cursor.pop();
            }
        }
    };

    // Dispatch to statement handler
    match stmt {
        Stmt::Print { expr } => execute_print(vm, expr),
        Stmt::Assign { name, op, value } => execute_assign(vm, name, *op, value),
        Stmt::If { test, .. } => execute_if(vm, test),
        Stmt::Break => execute_break(vm),
        Stmt::Input { name } => execute_input(vm, name),
        Stmt::Call {
            function,
            file,
            args,
        } => execute_call(vm, function, file.as_deref(), args, tail),
    }
}
