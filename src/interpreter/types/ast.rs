//! Abstract Syntax Tree node types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/* ===================== Program ===================== */

/// A parsed document: function name -> declaration
///
/// `base_dir` is the directory relative references to other programs are
/// resolved against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: HashMap<String, Arc<FunctionDecl>>,
    pub base_dir: PathBuf,
}

impl Program {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            functions: HashMap::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Register a function, replacing any earlier declaration with the same name
    pub fn declare(&mut self, function: FunctionDecl) {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
    }

    pub fn function(&self, name: &str) -> Option<&Arc<FunctionDecl>> {
        self.functions.get(name)
    }
}

/// One level-1 heading and everything under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/* ===================== Statements ===================== */

/// Compound assignment operator (`+=`, `-=`, `*=`, `/=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(AssignOp::Add),
            "-" => Some(AssignOp::Sub),
            "*" => Some(AssignOp::Mul),
            "/" => Some(AssignOp::Div),
            _ => None,
        }
    }

    pub fn binary(self) -> BinaryOp {
        match self {
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
        }
    }
}

/// Statement AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    Print {
        expr: Expr,
    },
    Assign {
        name: String,
        op: Option<AssignOp>,
        value: Expr,
    },
    Call {
        function: String,
        /// Relative path of another program, when the link names one
        file: Option<String>,
        args: Vec<Expr>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Input {
        name: String,
    },
}

/* ===================== Expressions ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

/// Property of a member expression: `.name` or `[expr]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Property {
    Named { name: String },
    Computed { expr: Box<Expr> },
}

/// Piece of a string template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum TemplatePart {
    Text { v: String },
    Expr { expr: Expr },
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    LitBool {
        v: bool,
    },
    LitNum {
        v: f64,
    },
    LitStr {
        v: String,
    },
    Ident {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Template {
        parts: Vec<TemplatePart>,
    },
    Member {
        object: Box<Expr>,
        property: Property,
    },
    /// Parsed so it can be rejected at evaluation time
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}
