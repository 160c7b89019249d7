//! Virtual Machine state
//!
//! The VM holds all execution state:
//! - frames: stack of function activations (last = current)
//! - control: whether the VM is waiting for input
//! - output: every printed value, in order
//! - input: pre-supplied values or an interactive source

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::errors::{ExecError, LookupError};
use crate::interpreter::loader::ProgramCache;
use crate::interpreter::types::{CallKind, Control, Frame, InputRequest, Program, Val};

/// Receives each printed value as soon as it is produced
pub type OutputSink = Box<dyn FnMut(&Val) + Send>;

/* ===================== Options ===================== */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmOptions {
    /// Largest number of simultaneous activations
    pub max_call_depth: usize,
    /// Run calls in tail position in the caller's frame
    pub tail_calls: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 10_000,
            tail_calls: true,
        }
    }
}

/// Where `Input` statements read from
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Values consumed front to back; reads past the end yield `Null`
    Buffered(VecDeque<Val>),
    /// Every read suspends the VM until [`VM::provide_input`]
    Interactive,
}

/* ===================== VM ===================== */

/// Virtual Machine state
///
/// One VM is one run. Runs never share a VM; they may share a
/// [`ProgramCache`].
pub struct VM {
    /// Stack of function activations
    pub frames: Vec<Frame>,

    /// Current control flow state
    pub control: Control,

    /// Printed values, in order
    pub output: Vec<Val>,

    pub options: VmOptions,

    input: InputSource,
    cache: Arc<ProgramCache>,
    sink: Option<OutputSink>,
}

impl VM {
    /// Create a VM that will start by calling `entry` in `program`
    pub fn new(program: Arc<Program>, entry: &str, args: Vec<Val>) -> Result<Self, LookupError> {
        let function = program
            .function(entry)
            .cloned()
            .ok_or_else(|| LookupError::UnknownEntry {
                name: entry.to_string(),
            })?;

        Ok(VM {
            frames: vec![Frame::new(program, function, args)],
            control: Control::None,
            output: Vec::new(),
            options: VmOptions::default(),
            input: InputSource::Buffered(VecDeque::new()),
            cache: Arc::new(ProgramCache::new()),
            sink: None,
        })
    }

    /// Pre-supply the values `Input` statements read
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Val>) -> Self {
        self.input = InputSource::Buffered(inputs.into_iter().collect());
        self
    }

    /// Suspend on every `Input` statement instead of reading a buffer
    pub fn interactive(mut self) -> Self {
        self.input = InputSource::Interactive;
        self
    }

    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_options(mut self, options: VmOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a program cache with other runs
    pub fn with_cache(mut self, cache: Arc<ProgramCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<ProgramCache> {
        &self.cache
    }

    pub fn is_done(&self) -> bool {
        self.frames.is_empty()
    }

    /// Record a printed value and forward it to the sink
    pub fn emit(&mut self, value: Val) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&value);
        }
        self.output.push(value);
    }

    /// Next buffered input, or `None` when input is interactive
    pub(crate) fn read_buffered(&mut self) -> Option<Val> {
        match &mut self.input {
            InputSource::Buffered(queue) => Some(queue.pop_front().unwrap_or(Val::Null)),
            InputSource::Interactive => None,
        }
    }

    /// Resume a VM suspended on an `Input` statement
    pub fn provide_input(&mut self, value: Val) -> Result<(), ExecError> {
        let Control::AwaitingInput(InputRequest { variable }) = &self.control else {
            return Err(ExecError::UnexpectedInput);
        };
        let frame = self.frames.last_mut().ok_or(ExecError::UnexpectedInput)?;
        frame.set(variable, value);
        self.control = Control::None;
        Ok(())
    }

    /// Start a new activation
    ///
    /// A tail call replaces the current frame, so tail recursion runs in
    /// constant space. Any other call is bounded by `max_call_depth`.
    pub fn push_call(&mut self, frame: Frame, kind: CallKind) -> Result<(), ExecError> {
        match kind {
            CallKind::Tail => {
                trace!(function = %frame.function.name, "tail call");
                self.frames.pop();
            }
            CallKind::Nested => {
                if self.frames.len() >= self.options.max_call_depth {
                    return Err(ExecError::CallDepthExceeded {
                        function: frame.function.name.clone(),
                        limit: self.options.max_call_depth,
                    });
                }
                trace!(function = %frame.function.name, depth = self.frames.len() + 1, "call");
            }
        }
        self.frames.push(frame);
        Ok(())
    }
}

impl fmt::Debug for VM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VM")
            .field("frames", &self.frames.len())
            .field("control", &self.control)
            .field("output", &self.output)
            .field("options", &self.options)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/* ===================== Step Result ===================== */

/// Result of executing one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Continue to next step
    Continue,
    /// Waiting for a value; resume with [`VM::provide_input`]
    Suspended(InputRequest),
    /// Execution complete
    Done,
}
