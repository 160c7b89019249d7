//! Statement execution handlers
//!
//! Each handler runs one statement against the current frame. The frame's
//! cursor has already moved past the statement when a handler runs.

use std::sync::Arc;
use tracing::trace;

use super::expressions::{apply_binary, eval_expr};
use super::vm::{Step, VM};
use crate::errors::{LookupError, Result};
use crate::interpreter::types::{AssignOp, CallKind, Control, Expr, Frame, InputRequest, Val};

/* ===================== Statement Handlers ===================== */

/// Execute Print statement
pub fn execute_print(vm: &mut VM, expr: &Expr) -> Result<Step> {
    let Some(frame) = vm.frames.last() else {
        return Ok(Step::Done);
    };
    let value = eval_expr(expr, frame)?;
    vm.emit(value);
    Ok(Step::Continue)
}

/// Execute Assign statement
///
/// A compound assignment to an unset variable starts from `0`, or from `""`
/// when the right-hand side is a string.
pub fn execute_assign(
    vm: &mut VM,
    name: &str,
    op: Option<AssignOp>,
    value: &Expr,
) -> Result<Step> {
    let Some(frame) = vm.frames.last_mut() else {
        return Ok(Step::Done);
    };
    let value = eval_expr(value, frame)?;

    let value = match op {
        None => value,
        Some(op) => {
            let current = match frame.get(name) {
                Val::Undefined if matches!(value, Val::Str(_)) => Val::Str(String::new()),
                Val::Undefined => Val::Num(0.0),
                current => current,
            };
            apply_binary(op.binary(), &current, &value)
        }
    };

    frame.set(name, value);
    Ok(Step::Continue)
}

/// Execute If statement: a true guard opens its body as the innermost block
pub fn execute_if(vm: &mut VM, test: &Expr) -> Result<Step> {
    let Some(frame) = vm.frames.last_mut() else {
        return Ok(Step::Done);
    };
    if eval_expr(test, frame)?.is_truthy() {
        frame.cursor.push(0);
    }
    Ok(Step::Continue)
}

/// Execute Break statement: the current activation ends here
pub fn execute_break(vm: &mut VM) -> Result<Step> {
    if let Some(frame) = vm.frames.pop() {
        trace!(function = %frame.function.name, "break");
    }
    Ok(Step::Continue)
}

/// Execute Input statement
///
/// Buffered input binds immediately; interactive input suspends the VM.
pub fn execute_input(vm: &mut VM, name: &str) -> Result<Step> {
    if let Some(value) = vm.read_buffered() {
        if let Some(frame) = vm.frames.last_mut() {
            frame.set(name, value);
        }
        return Ok(Step::Continue);
    }

    let request = InputRequest {
        variable: name.to_string(),
    };
    vm.control = Control::AwaitingInput(request.clone());
    Ok(Step::Suspended(request))
}

/// Execute Call statement
///
/// Arguments are evaluated in the caller's frame. `tail` is whether the call
/// was the last statement along every enclosing block of the caller.
pub fn execute_call(
    vm: &mut VM,
    function: &str,
    file: Option<&str>,
    args: &[Expr],
    tail: bool,
) -> Result<Step> {
    let Some(caller) = vm.frames.last() else {
        return Ok(Step::Done);
    };

    let args = args
        .iter()
        .map(|arg| eval_expr(arg, caller))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let caller_dir = caller.program.base_dir.clone();
    let program = match file {
        None => Arc::clone(&caller.program),
        Some(path) => vm.cache().load(&caller_dir, path)?,
    };

    let declaration = program.function(function).cloned().ok_or_else(|| match file {
        None => LookupError::UnknownFunction {
            name: function.to_string(),
        },
        Some(path) => LookupError::UnknownExternalFunction {
            name: function.to_string(),
            path: caller_dir.join(path),
        },
    })?;

    let kind = if tail && vm.options.tail_calls {
        CallKind::Tail
    } else {
        CallKind::Nested
    };
    vm.push_call(Frame::new(program, declaration, args), kind)?;
    Ok(Step::Continue)
}
