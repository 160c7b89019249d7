//! Type definitions for the interpreter
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Program, FunctionDecl, Stmt, Expr)
//! - Runtime values (Val)
//! - Control flow (Control, Frame)

pub mod ast;
pub mod control;
pub mod values;

// Re-export all types for convenient access
pub use ast::{
    AssignOp, BinaryOp, Expr, FunctionDecl, Program, Property, Stmt, TemplatePart, UnaryOp,
};
pub use control::{block_at, CallKind, Control, Frame, InputRequest};
pub use values::Val;
