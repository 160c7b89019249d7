//! `{expr}` templates in printed text
//!
//! Braces are depth-counted, so an embedded expression may itself contain
//! braces. An unmatched `}` or an unclosed `{` is kept as literal text.

use super::{parse_expression, ParseResult};
use crate::interpreter::types::{Expr, TemplatePart};

/// Piece of raw template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Expr(&'a str),
}

/// Split text into literal and `{...}` segments, in order
pub fn split_template(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut expr_start = 0;
    let mut depth = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    if i > literal_start {
                        segments.push(Segment::Text(&text[literal_start..i]));
                    }
                    literal_start = i;
                    expr_start = i + 1;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    segments.push(Segment::Expr(&text[expr_start..i]));
                    literal_start = i + 1;
                }
            }
            _ => {}
        }
    }

    // unclosed brace: everything from the last literal start is text
    if literal_start < text.len() {
        segments.push(Segment::Text(&text[literal_start..]));
    }

    segments
}

/// Expression for the text of a bold paragraph
///
/// - exactly one `{...}` pair: the bare expression, so values keep their type
/// - any `{...}` pair mixed with text: a template, always a string
/// - no braces: the literal text
pub fn parse_print(text: &str) -> ParseResult<Expr> {
    let segments = split_template(text.trim());

    if let [Segment::Expr(inner)] = segments.as_slice() {
        return parse_expression(inner);
    }

    if !segments.iter().any(|s| matches!(s, Segment::Expr(_))) {
        return Ok(Expr::LitStr {
            v: text.to_string(),
        });
    }

    let parts = segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(v) => Ok(TemplatePart::Text { v: v.to_string() }),
            Segment::Expr(source) => Ok(TemplatePart::Expr {
                expr: parse_expression(source)?,
            }),
        })
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Expr::Template { parts })
}
