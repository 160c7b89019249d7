//! PEST-based parser for the textual pieces of a program
//!
//! Markdown structure is handled by the transform; this module parses what is
//! written *inside* it: guard expressions, assignment paragraphs, call
//! arguments and `{...}` segments of printed text.

use pest::Parser;
use pest_derive::Parser;

use super::types::{AssignOp, BinaryOp, Expr, Property, UnaryOp};
use crate::errors::SyntaxError;

pub mod template;


pub use template::{parse_print, split_template, Segment};

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/expression.pest"]
struct ExpressionParser;

pub type ParseResult<T> = Result<T, SyntaxError>;

fn syntax_error(text: &str, err: pest::error::Error<Rule>) -> SyntaxError {
    SyntaxError::new(text, err.variant.message().to_string())
}

fn build_error(text: &str, message: impl Into<String>) -> SyntaxError {
    SyntaxError::new(text, message)
}

/* ===================== Public API ===================== */

/// Parse an expression fragment
pub fn parse_expression(text: &str) -> ParseResult<Expr> {
    let text = text.trim();
    let mut pairs =
        ExpressionParser::parse(Rule::expression_input, text).map_err(|e| syntax_error(text, e))?;

    // expression_input = { SOI ~ expression ~ EOI }
    let input = pairs
        .next()
        .ok_or_else(|| build_error(text, "empty expression"))?;
    let expr_pair = input
        .into_inner()
        .next()
        .ok_or_else(|| build_error(text, "empty expression"))?;

    build_expression(expr_pair, text)
}

/// Assignment paragraph split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentParts {
    pub name: String,
    pub op: Option<AssignOp>,
    /// Right-hand side, not yet parsed
    pub value: String,
}

/// Match `name (op)?= rest`; `None` when the text has another shape
pub fn match_assignment(text: &str) -> Option<AssignmentParts> {
    let text = text.trim();
    let assignment = ExpressionParser::parse(Rule::assignment, text)
        .ok()?
        .next()?;

    let mut name = None;
    let mut op = None;
    let mut value = None;
    for pair in assignment.into_inner() {
        match pair.as_rule() {
            Rule::identifier => name = Some(pair.as_str().to_string()),
            Rule::assign_op => op = AssignOp::from_symbol(pair.as_str()),
            Rule::assign_value => value = Some(pair.as_str().trim().to_string()),
            _ => {}
        }
    }

    Some(AssignmentParts {
        name: name?,
        op,
        value: value?,
    })
}

/// Check that `text` is a single identifier and return it trimmed
pub fn parse_variable_name(text: &str) -> Option<String> {
    let text = text.trim();
    ExpressionParser::parse(Rule::variable_input, text).ok()?;
    Some(text.to_string())
}

/* ===================== AST Builder ===================== */

fn build_binary_expr(pair: pest::iterators::Pair<Rule>, text: &str) -> ParseResult<Expr> {
    let mut inner = pair.into_inner();

    let first = inner
        .next()
        .ok_or_else(|| build_error(text, "empty binary expression"))?;
    let mut left = build_expression(first, text)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_rule() {
            Rule::op_or => BinaryOp::Or,
            Rule::op_and => BinaryOp::And,
            Rule::op_eq => BinaryOp::Eq,
            Rule::op_ne => BinaryOp::Ne,
            Rule::op_strict_eq => BinaryOp::StrictEq,
            Rule::op_strict_ne => BinaryOp::StrictNe,
            Rule::op_lt => BinaryOp::Lt,
            Rule::op_lte => BinaryOp::Lte,
            Rule::op_gt => BinaryOp::Gt,
            Rule::op_gte => BinaryOp::Gte,
            Rule::op_add => BinaryOp::Add,
            Rule::op_sub => BinaryOp::Sub,
            Rule::op_mul => BinaryOp::Mul,
            Rule::op_div => BinaryOp::Div,
            Rule::op_mod => BinaryOp::Mod,
            other => {
                return Err(build_error(
                    text,
                    format!("expected operator, got {:?}", other),
                ))
            }
        };

        let right_pair = inner
            .next()
            .ok_or_else(|| build_error(text, "missing right operand after operator"))?;
        let right = build_expression(right_pair, text)?;

        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok(left)
}

fn build_postfix_expr(pair: pest::iterators::Pair<Rule>, text: &str) -> ParseResult<Expr> {
    let mut inner = pair.into_inner();
    let primary = inner
        .next()
        .ok_or_else(|| build_error(text, "missing operand"))?;
    let mut expr = build_expression(primary, text)?;

    for postfix in inner {
        expr = match postfix.as_rule() {
            Rule::member_access => {
                let name = postfix.into_inner().as_str().to_string();
                Expr::Member {
                    object: Box::new(expr),
                    property: Property::Named { name },
                }
            }
            Rule::index_access => {
                let index_pair = postfix
                    .into_inner()
                    .next()
                    .ok_or_else(|| build_error(text, "empty index"))?;
                Expr::Member {
                    object: Box::new(expr),
                    property: Property::Computed {
                        expr: Box::new(build_expression(index_pair, text)?),
                    },
                }
            }
            Rule::call_suffix => {
                let args = postfix
                    .into_inner()
                    .map(|arg| build_expression(arg, text))
                    .collect::<ParseResult<Vec<_>>>()?;
                Expr::Call {
                    callee: Box::new(expr),
                    args,
                }
            }
            other => {
                return Err(build_error(
                    text,
                    format!("unexpected postfix {:?}", other),
                ))
            }
        };
    }

    Ok(expr)
}

fn build_expression(pair: pest::iterators::Pair<Rule>, text: &str) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::expression => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| build_error(text, "empty expression"))?;
            build_expression(inner, text)
        }
        Rule::logical_or_expr
        | Rule::logical_and_expr
        | Rule::equality_expr
        | Rule::comparison_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr => build_binary_expr(pair, text),
        Rule::unary_expr => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| build_error(text, "empty unary expression"))?;

            let op = match first.as_rule() {
                Rule::op_not => UnaryOp::Not,
                Rule::op_neg => UnaryOp::Neg,
                Rule::op_plus => UnaryOp::Plus,
                _ => return build_expression(first, text),
            };
            let operand_pair = inner
                .next()
                .ok_or_else(|| build_error(text, "missing operand after unary operator"))?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(build_expression(operand_pair, text)?),
            })
        }
        Rule::postfix_expr => build_postfix_expr(pair, text),
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
        }),
        Rule::number => {
            let num_str = pair.as_str();
            let v = num_str.parse::<f64>().map_err(|e| {
                build_error(text, format!("failed to parse number '{}': {}", num_str, e))
            })?;
            Ok(Expr::LitNum { v })
        }
        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
        }),
        Rule::string => {
            // string = ${ quote ~ content ~ quote }
            let content = pair.into_inner().as_str();
            Ok(Expr::LitStr {
                v: unescape(content),
            })
        }
        other => Err(build_error(
            text,
            format!("unexpected expression rule: {:?}", other),
        )),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
