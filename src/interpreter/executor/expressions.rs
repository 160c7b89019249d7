//! Expression evaluation
//!
//! Pure function of an expression and the current frame: evaluation only
//! reads variables.

use std::cmp::Ordering;

use crate::errors::EvalError;
use crate::interpreter::types::{BinaryOp, Expr, Frame, Property, TemplatePart, UnaryOp, Val};

/// Evaluate an expression against the bindings of `frame`
pub fn eval_expr(expr: &Expr, frame: &Frame) -> Result<Val, EvalError> {
    match expr {
        Expr::LitBool { v } => Ok(Val::Bool(*v)),

        Expr::LitNum { v } => Ok(Val::Num(*v)),

        Expr::LitStr { v } => Ok(Val::Str(v.clone())),

        Expr::Ident { name } => Ok(frame.get(name)),

        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, frame)?;
            // && and || short-circuit and yield an operand
            match op {
                BinaryOp::Or if left.is_truthy() => Ok(left),
                BinaryOp::And if !left.is_truthy() => Ok(left),
                BinaryOp::Or | BinaryOp::And => eval_expr(right, frame),
                _ => Ok(apply_binary(*op, &left, &eval_expr(right, frame)?)),
            }
        }

        Expr::Unary { op, operand } => {
            let v = eval_expr(operand, frame)?;
            Ok(match op {
                UnaryOp::Not => Val::Bool(!v.is_truthy()),
                UnaryOp::Neg => Val::Num(-v.to_number()),
                UnaryOp::Plus => Val::Num(v.to_number()),
            })
        }

        Expr::Template { parts } => {
            let mut out = String::new();
            for part in parts {
                match part {
                    TemplatePart::Text { v } => out.push_str(v),
                    TemplatePart::Expr { expr } => out.push_str(&eval_expr(expr, frame)?.to_string()),
                }
            }
            Ok(Val::Str(out))
        }

        Expr::Member { object, property } => {
            let target = eval_expr(object, frame)?;
            let key = match property {
                Property::Named { name } => Val::Str(name.clone()),
                Property::Computed { expr } => eval_expr(expr, frame)?,
            };
            member(&target, &key)
        }

        Expr::Call { callee, .. } => {
            let callee = match callee.as_ref() {
                Expr::Ident { name } => name.clone(),
                _ => "expression".to_string(),
            };
            Err(EvalError::CallInExpression { callee })
        }
    }
}

/// Apply a binary operator to two evaluated operands
///
/// `&&` and `||` are applied without short-circuiting here.
pub fn apply_binary(op: BinaryOp, left: &Val, right: &Val) -> Val {
    let ordering = || left.compare(right);
    match op {
        BinaryOp::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
        BinaryOp::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::Eq => Val::Bool(left.loose_eq(right)),
        BinaryOp::Ne => Val::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Val::Bool(left.strict_eq(right)),
        BinaryOp::StrictNe => Val::Bool(!left.strict_eq(right)),
        BinaryOp::Lt => Val::Bool(ordering() == Some(Ordering::Less)),
        BinaryOp::Lte => Val::Bool(matches!(ordering(), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Val::Bool(ordering() == Some(Ordering::Greater)),
        BinaryOp::Gte => Val::Bool(matches!(
            ordering(),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => Val::Num(left.to_number() - right.to_number()),
        BinaryOp::Mul => Val::Num(left.to_number() * right.to_number()),
        BinaryOp::Div => Val::Num(left.to_number() / right.to_number()),
        BinaryOp::Mod => Val::Num(left.to_number() % right.to_number()),
    }
}

/// Property access: `length` and character indexing on strings
fn member(target: &Val, key: &Val) -> Result<Val, EvalError> {
    if target.is_nullish() {
        return Err(EvalError::PropertyOfNothing {
            property: key.to_string(),
            target: target.to_string(),
        });
    }

    match key {
        Val::Str(name) if name == "length" => Ok(target
            .length()
            .map(|n| Val::Num(n as f64))
            .unwrap_or_default()),
        _ => Ok(target.char_at(key)),
    }
}
