//! Control flow and execution frame types

use super::ast::{FunctionDecl, Program, Stmt};
use super::values::Val;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/* ===================== Control Flow ===================== */

/// Pending request for one line of input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRequest {
    /// Variable the value will be bound to
    pub variable: String,
}

/// Control flow state
///
/// When control is `AwaitingInput`, the VM stops and waits for
/// [`provide_input`](crate::interpreter::executor::VM::provide_input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Control {
    None,
    AwaitingInput(InputRequest),
}

/// Where a call will run, relative to the caller's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// The call replaces the caller's frame
    Tail,
    /// The call runs on top of the caller's frame
    Nested,
}

/* ===================== Frames ===================== */

/// One function activation
///
/// A frame only ever sees its own bindings: there is no global scope and no
/// access to the caller's variables.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Program the function was declared in, used to resolve its calls
    pub program: Arc<Program>,
    pub function: Arc<FunctionDecl>,
    pub vars: HashMap<String, Val>,
    /// Next statement index in each open block: `cursor[0]` walks the
    /// function body, `cursor[n]` walks the body of the `If` just before
    /// `cursor[n - 1]`.
    pub cursor: Vec<usize>,
}

impl Frame {
    pub fn new(program: Arc<Program>, function: Arc<FunctionDecl>, args: Vec<Val>) -> Self {
        let mut args = args.into_iter();
        let vars = function
            .params
            .iter()
            .map(|param| (param.clone(), args.next().unwrap_or_default()))
            .collect();

        Frame {
            program,
            function,
            vars,
            cursor: vec![0],
        }
    }

    /// Unbound names read as `Undefined`
    pub fn get(&self, name: &str) -> Val {
        self.vars.get(name).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, value: Val) {
        self.vars.insert(name.to_string(), value);
    }

    /// Block at `depth` of the cursor
    pub fn block(&self, depth: usize) -> &[Stmt] {
        block_at(&self.function.body, &self.cursor, depth)
    }

    /// True when nothing but a return or a break is left to run
    pub fn at_tail(&self) -> bool {
        (0..self.cursor.len())
            .rev()
            .find_map(|depth| self.block(depth).get(self.cursor[depth]))
            .map_or(true, |next| matches!(next, Stmt::Break))
    }
}

/// Walk `depth` levels of `cursor` down from a function body
pub fn block_at<'a>(body: &'a [Stmt], cursor: &[usize], depth: usize) -> &'a [Stmt] {
    let mut block = body;
    for &idx in &cursor[..depth] {
        match idx.checked_sub(1).and_then(|i| block.get(i)) {
            Some(Stmt::If { body, .. }) => block = body,
            _ => return &[],
        }
    }
    block
}
