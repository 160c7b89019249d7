//! Markdown structure -> Program
//!
//! Walks the top-level blocks of a [`Document`] in order. Two pieces of state
//! drive it: the function being built, and the block new statements are
//! appended to (the function body or the body of an open conditional).
//! Blocks that mean nothing to the language are skipped, never rejected.

use std::path::PathBuf;
use tracing::debug;

use super::parser::{match_assignment, parse_expression, parse_print, parse_variable_name};
use super::types::{FunctionDecl, Program, Stmt};
use crate::errors::SyntaxError;
use crate::markdown::{
    find_emphasis, flatten_text, sole_inline, source_or_text, Block, Document, Inline,
};

/// Build a program from a document
///
/// Fails only when embedded expression text is malformed.
pub fn transform(document: &Document, base_dir: impl Into<PathBuf>) -> Result<Program, SyntaxError> {
    let mut state = Transform {
        program: Program::new(base_dir),
        current: None,
        open: Vec::new(),
    };

    for block in &document.blocks {
        state.visit(block)?;
    }

    Ok(state.finish())
}

struct Transform {
    program: Program,
    current: Option<FunctionDecl>,
    /// Indices of the open conditionals, from the function body inward
    open: Vec<usize>,
}

impl Transform {
    fn visit(&mut self, block: &Block) -> Result<(), SyntaxError> {
        match block {
            Block::Heading { level: 1, content } => self.start_function(content),
            Block::Heading { level: 2, content } => self.start_conditional(content)?,
            Block::List {
                ordered: false,
                items,
            } => self.add_params(items),
            Block::Paragraph { content, source } => self.visit_paragraph(content, source)?,
            Block::BlockQuote { blocks } => self.visit_quote(blocks),
            Block::ThematicBreak => {
                self.push(Stmt::Break);
                self.open.clear();
            }
            other => debug!(block = ?other, "ignoring block"),
        }
        Ok(())
    }

    fn start_function(&mut self, content: &[Inline]) {
        let name = flatten_text(content).trim().to_string();
        if let Some(previous) = self.current.take() {
            self.declare(previous);
        }
        debug!(function = %name, "declaring function");
        self.current = Some(FunctionDecl {
            name,
            params: Vec::new(),
            body: Vec::new(),
        });
        self.open.clear();
    }

    fn start_conditional(&mut self, content: &[Inline]) -> Result<(), SyntaxError> {
        let guard = find_emphasis(content)
            .map(|text| one_line(&text))
            .unwrap_or_default();
        if guard.is_empty() {
            debug!(heading = %flatten_text(content), "level-2 heading without a guard");
            return Ok(());
        }

        let test = parse_expression(&guard)?;
        let Some(block) = self.current_block() else {
            debug!(guard = %guard, "conditional outside of a function");
            return Ok(());
        };
        let idx = block.len();
        block.push(Stmt::If {
            test,
            body: Vec::new(),
        });
        self.open.push(idx);
        Ok(())
    }

    fn add_params(&mut self, items: &[Vec<Inline>]) {
        let Some(function) = self.current.as_mut() else {
            debug!("parameter list outside of a function");
            return;
        };
        function.params.extend(
            items
                .iter()
                .map(|item| flatten_text(item).trim().to_string())
                .filter(|name| !name.is_empty()),
        );
    }

    fn visit_paragraph(&mut self, content: &[Inline], source: &str) -> Result<(), SyntaxError> {
        let stmt = match sole_inline(content) {
            Some(Inline::Strong { content, source }) => Stmt::Print {
                expr: parse_print(&print_text(content, source))?,
            },
            Some(Inline::Link {
                url,
                content,
                source,
            }) => build_call(url, &one_line(&source_or_text(source, content)))?,
            _ => {
                let text = one_line(&source_or_text(source, content));
                let Some(parts) = match_assignment(&text) else {
                    debug!(text = %text, "ignoring paragraph");
                    return Ok(());
                };
                Stmt::Assign {
                    name: parts.name,
                    op: parts.op,
                    value: parse_expression(&parts.value)?,
                }
            }
        };
        self.push(stmt);
        Ok(())
    }

    fn visit_quote(&mut self, blocks: &[Block]) {
        let text = blocks
            .iter()
            .find_map(|block| match block {
                Block::Paragraph { content, .. } => Some(flatten_text(content)),
                _ => None,
            })
            .unwrap_or_default();

        match parse_variable_name(&text) {
            Some(name) => self.push(Stmt::Input { name }),
            None => debug!(text = %text, "block quote does not name a variable"),
        }
    }

    /* ===================== Helpers ===================== */

    fn current_block(&mut self) -> Option<&mut Vec<Stmt>> {
        let function = self.current.as_mut()?;
        let mut block = &mut function.body;
        for &idx in &self.open {
            block = match block.get_mut(idx) {
                Some(Stmt::If { body, .. }) => body,
                _ => return None,
            };
        }
        Some(block)
    }

    fn push(&mut self, stmt: Stmt) {
        match self.current_block() {
            Some(block) => block.push(stmt),
            None => debug!(statement = ?stmt, "statement outside of a function"),
        }
    }

    fn declare(&mut self, function: FunctionDecl) {
        if self.program.function(&function.name).is_some() {
            debug!(function = %function.name, "redeclaration replaces earlier function");
        }
        self.program.declare(function);
    }

    fn finish(mut self) -> Program {
        if let Some(function) = self.current.take() {
            self.declare(function);
        }
        self.program
    }
}

/// Text of a print: templates come from the raw source so that `*` stays an
/// operator, literal text keeps its markdown rendering
fn print_text(content: &[Inline], source: &str) -> String {
    if source.contains('{') {
        one_line(source)
    } else {
        flatten_text(content)
    }
}

/// Raw source with line breaks read as spaces
fn one_line(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

/// Link -> call statement
///
/// `#name` calls a local function, `path#name` a function of another file,
/// and a bare `name` is the older local form.
fn build_call(url: &str, text: &str) -> Result<Stmt, SyntaxError> {
    let args = if text.trim().is_empty() {
        Vec::new()
    } else {
        text.split(',')
            .map(parse_expression)
            .collect::<Result<Vec<_>, _>>()?
    };

    let (file, function) = match url.split_once('#') {
        Some(("", name)) => (None, name),
        Some((path, name)) => (Some(path.to_string()), name),
        None => (None, url),
    };

    Ok(Stmt::Call {
        function: function.to_string(),
        file,
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::{AssignOp, BinaryOp, Expr};
    use crate::markdown::parse_document;

    fn program(source: &str) -> Program {
        transform(&parse_document(source), ".").expect("transform failed")
    }

    fn body<'a>(program: &'a Program, name: &str) -> &'a [Stmt] {
        &program
            .function(name)
            .unwrap_or_else(|| panic!("function '{}' missing", name))
            .body
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_hello_world() {
        let program = program("# main\n\n**Hello, World!**\n");
        assert_eq!(
            body(&program, "main"),
            &[Stmt::Print {
                expr: Expr::LitStr {
                    v: "Hello, World!".to_string()
                }
            }]
        );
    }

    #[test]
    fn test_params_from_unordered_list() {
        let program = program("# add\n\n- a\n- b\n\n**{a + b}**\n");
        let add = program.function("add").unwrap();
        assert_eq!(add.params, vec!["a", "b"]);
        assert_eq!(add.body.len(), 1);
    }

    #[test]
    fn test_ordered_list_is_ignored() {
        let program = program("# f\n\n1. a\n2. b\n");
        assert!(program.function("f").unwrap().params.is_empty());
    }

    #[test]
    fn test_assignments() {
        let program = program("# main\n\ncount = 0\n\ncount += 1\n\nsome prose here\n");
        assert_eq!(
            body(&program, "main"),
            &[
                Stmt::Assign {
                    name: "count".to_string(),
                    op: None,
                    value: Expr::LitNum { v: 0.0 },
                },
                Stmt::Assign {
                    name: "count".to_string(),
                    op: Some(AssignOp::Add),
                    value: Expr::LitNum { v: 1.0 },
                },
            ]
        );
    }

    #[test]
    fn test_asterisk_is_multiplication_not_emphasis() {
        let source = "# main\n\nx = 2*3*4\n\n## _x*2 > 5_\n\n**{x*x*x}**\n\n[x*2, 3](#f)\n";
        let program = program(source);
        let main = body(&program, "main");

        let Stmt::Assign { value, .. } = &main[0] else {
            panic!("expected assignment, got {:?}", main);
        };
        assert!(matches!(value, Expr::Binary { op: BinaryOp::Mul, .. }));

        let Stmt::If { test, body } = &main[1] else {
            panic!("expected conditional, got {:?}", main);
        };
        assert!(matches!(test, Expr::Binary { op: BinaryOp::Gt, .. }));
        assert!(matches!(&body[0], Stmt::Print { expr: Expr::Binary { op: BinaryOp::Mul, .. } }));
        assert!(matches!(&body[1], Stmt::Call { args, .. } if args.len() == 2));
    }

    #[test]
    fn test_literal_print_drops_markdown() {
        let program = program("# main\n\n**Hello, *World*!**\n");
        assert_eq!(
            body(&program, "main"),
            &[Stmt::Print {
                expr: Expr::LitStr {
                    v: "Hello, World!".to_string()
                }
            }]
        );
    }

    #[test]
    fn test_conditional_collects_following_statements() {
        let program = program("# main\n\n## _x < 5_\n\n**{x}**\n\n[x](#main)\n");
        let [Stmt::If { test, body }] = body(&program, "main") else {
            panic!("expected one conditional");
        };
        assert!(matches!(test, Expr::Binary { op: BinaryOp::Lt, .. }));
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[1], Stmt::Call { function, file: None, args } if function == "main" && args == &[ident("x")]));
    }

    #[test]
    fn test_conditionals_nest_until_break() {
        let source = "# main\n\n## _a_\n\n## _b_\n\n**inner**\n\n---\n\n**after**\n";
        let program = program(source);
        let main = body(&program, "main");
        assert_eq!(main.len(), 2);

        let Stmt::If { body: outer, .. } = &main[0] else {
            panic!("expected conditional");
        };
        let [Stmt::If { body: inner, .. }] = outer.as_slice() else {
            panic!("expected nested conditional, got {:?}", outer);
        };
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[1], Stmt::Break);

        assert!(matches!(&main[1], Stmt::Print { .. }));
    }

    #[test]
    fn test_level_two_heading_without_emphasis_is_ignored() {
        let program = program("# main\n\n## Notes\n\n**x**\n");
        assert!(matches!(body(&program, "main"), [Stmt::Print { .. }]));
    }

    #[test]
    fn test_call_targets() {
        let program = program("# main\n\n[](#local)\n\n[1, \"a\"](lib/math.md#add)\n\n[](legacy)\n");
        assert_eq!(
            body(&program, "main"),
            &[
                Stmt::Call {
                    function: "local".to_string(),
                    file: None,
                    args: vec![],
                },
                Stmt::Call {
                    function: "add".to_string(),
                    file: Some("lib/math.md".to_string()),
                    args: vec![Expr::LitNum { v: 1.0 }, Expr::LitStr { v: "a".to_string() }],
                },
                Stmt::Call {
                    function: "legacy".to_string(),
                    file: None,
                    args: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_block_quote_is_input() {
        let program = program("# main\n\n> name\n\n> not a name\n");
        assert_eq!(
            body(&program, "main"),
            &[Stmt::Input {
                name: "name".to_string()
            }]
        );
    }

    #[test]
    fn test_statements_before_any_function_are_skipped() {
        let program = program("**orphan**\n\nx = 1\n\n# main\n\n**ok**\n");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(body(&program, "main").len(), 1);
    }

    #[test]
    fn test_redeclaration_last_wins() {
        let program = program("# f\n\n**one**\n\n# f\n\n**two**\n");
        assert_eq!(
            body(&program, "f"),
            &[Stmt::Print {
                expr: Expr::LitStr {
                    v: "two".to_string()
                }
            }]
        );
    }

    #[test]
    fn test_malformed_guard_is_syntax_error() {
        let err = transform(&parse_document("# main\n\n## _x <_\n"), ".").unwrap_err();
        assert_eq!(err.text, "x <");
    }

    #[test]
    fn test_hand_built_document() {
        let document = Document {
            blocks: vec![
                Block::Heading {
                    level: 1,
                    content: vec![Inline::text("main")],
                },
                Block::paragraph(vec![Inline::link("#other", vec![])]),
                Block::Other,
            ],
        };
        let program = transform(&document, "/tmp").unwrap();
        assert_eq!(program.base_dir, PathBuf::from("/tmp"));
        assert_eq!(body(&program, "main").len(), 1);
    }

    #[test]
    fn test_program_survives_json_round_trip() {
        let program = program("# main\n\n## _n > 0_\n\n**{n}**\n\n---\n\n> line\n");
        let json = serde_json::to_string(&program).expect("serialize");
        let restored: Program = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(
            restored.function("main").unwrap().as_ref(),
            program.function("main").unwrap().as_ref()
        );
    }
}
