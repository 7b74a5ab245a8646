//! Lowering of the tree-sitter concrete tree into `processor::ast`.
//
//  Statement kinds handled:
//
//      expression_statement   → Stmt::Expr / Stmt::Assign
//      class_definition       → Stmt::ClassDef
//      decorated_definition   → decorators + ClassDef / Block
//      if / for / while / try / with / def / match / case
//                             → Stmt::Block, one Clause per header
//      anything else          → Stmt::Verbatim
//
//  Comments are extras and are dropped, including those inside clause
//  headers and opaque text. Blank lines survive only as
//  `Module::spaced_lines`.

use crate::processor::ast::{Arg, Block, ClassDef, Clause, ClauseKind, Expr, Module, Pos, Stmt};
use anyhow::{Result, anyhow};
use std::collections::BTreeSet;
use tree_sitter::Node;

const BLOCK_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "try_statement",
    "with_statement",
    "function_definition",
    "match_statement",
    "case_clause",
];

/// Inner expressions written back without their parentheses.
const UNWRAPPABLE_KINDS: &[&str] = &[
    "identifier",
    "attribute",
    "call",
    "parenthesized_expression",
];

const CLAUSE_KINDS: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

pub struct Lowering<'s> {
    source: &'s str,
    lines: Vec<&'s str>,
    spaced: BTreeSet<usize>,
}

impl<'s> Lowering<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: source.lines().collect(),
            spaced: BTreeSet::new(),
        }
    }

    pub fn module(mut self, root: Node) -> Result<Module> {
        let body = self.body(root)?;
        Ok(Module {
            body,
            spaced_lines: self.spaced,
        })
    }

    fn body(&mut self, node: Node) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        for child in syntax_children(node) {
            let stmt = self.stmt(child)?;
            // keyed by the statement line, which skips decorators
            if let Some(line) = stmt.pos().line.filter(|_| self.follows_blank(child)) {
                self.spaced.insert(line);
            }
            body.push(stmt);
        }
        Ok(body)
    }

    fn follows_blank(&self, node: Node) -> bool {
        let row = node.start_position().row;
        row > 0
            && self
                .lines
                .get(row - 1)
                .is_some_and(|text| text.trim().is_empty())
    }

    fn stmt(&mut self, node: Node) -> Result<Stmt> {
        match node.kind() {
            "expression_statement" => self.expression_statement(node),
            "class_definition" => Ok(Stmt::ClassDef(self.class(node, Vec::new())?)),
            "decorated_definition" => self.decorated(node),
            kind if BLOCK_KINDS.contains(&kind) => Ok(Stmt::Block(self.block(node, Vec::new())?)),
            _ => self.verbatim(node),
        }
    }

    fn verbatim(&self, node: Node) -> Result<Stmt> {
        Ok(Stmt::Verbatim {
            text: self.code(node, node.end_byte())?,
            pos: pos(node),
        })
    }

    fn expression_statement(&self, node: Node) -> Result<Stmt> {
        let children = syntax_children(node);
        // `a, b` and friends stay verbatim
        let [child] = children.as_slice() else {
            return self.verbatim(node);
        };

        match child.kind() {
            "assignment" | "augmented_assignment" => self.assignment(node, *child),
            _ => Ok(Stmt::Expr {
                value: self.expr(*child)?,
                pos: pos(node),
            }),
        }
    }

    /// `a = b = value` keeps `a = b =` as the left-hand side.
    fn assignment(&self, stmt: Node, node: Node) -> Result<Stmt> {
        let mut targets = Vec::new();
        let mut value = node;
        loop {
            let op = match value.kind() {
                "assignment" => "=".to_string(),
                "augmented_assignment" => self.field_text(value, "operator")?,
                _ => break,
            };
            // bare annotation `x: int`
            let Some(right) = value.child_by_field_name("right") else {
                return self.verbatim(stmt);
            };

            let left = self.field_text(value, "left")?;
            match value.child_by_field_name("type") {
                Some(ty) => targets.push(format!("{left}: {} {op}", self.text(ty)?)),
                None => targets.push(format!("{left} {op}")),
            }
            value = right;
        }

        Ok(Stmt::Assign {
            lhs: targets.join(" "),
            value: self.expr(value)?,
            pos: pos(stmt),
        })
    }

    fn decorated(&mut self, node: Node) -> Result<Stmt> {
        let decorators = syntax_children(node)
            .into_iter()
            .filter(|child| child.kind() == "decorator")
            .map(|child| self.code(child, child.end_byte()))
            .collect::<Result<Vec<_>>>()?;

        let definition = self.field(node, "definition")?;
        match definition.kind() {
            "class_definition" => Ok(Stmt::ClassDef(self.class(definition, decorators)?)),
            _ => Ok(Stmt::Block(self.block(definition, decorators)?)),
        }
    }

    fn class(&mut self, node: Node, decorators: Vec<String>) -> Result<ClassDef> {
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|params| self.text(params).map(str::to_string))
            .transpose()?;
        let bases = node
            .child_by_field_name("superclasses")
            .map(|list| self.args(list))
            .transpose()?;

        Ok(ClassDef {
            decorators,
            name: self.field_text(node, "name")?,
            type_params,
            bases,
            body: self.body(self.field(node, "body")?)?,
            pos: pos(node),
        })
    }

    fn block(&mut self, node: Node, decorators: Vec<String>) -> Result<Block> {
        let mut clauses = vec![self.clause(node)?];
        for child in syntax_children(node) {
            if CLAUSE_KINDS.contains(&child.kind()) {
                clauses.push(self.clause(child)?);
            }
        }

        Ok(Block {
            decorators,
            clauses,
            pos: pos(node),
        })
    }

    /// Header is the source up to the clause's own indented block, minus comments.
    fn clause(&mut self, node: Node) -> Result<Clause> {
        let body = syntax_children(node)
            .into_iter()
            .find(|child| child.kind() == "block")
            .ok_or_else(|| anyhow!("`{}` at line {} has no body", node.kind(), line(node)))?;

        let kind = match node.kind() {
            "except_clause" | "except_group_clause" | "finally_clause" => ClauseKind::Handler,
            "match_statement" => ClauseKind::Match,
            _ => ClauseKind::Plain,
        };
        Ok(Clause {
            kind,
            header: self.code(node, body.start_byte())?,
            body: self.body(body)?,
            pos: Pos::new(line(node), end_line(body)),
        })
    }

    fn expr(&self, node: Node) -> Result<Expr> {
        let expr = match node.kind() {
            "identifier" => Expr::Name {
                id: self.text(node)?.to_string(),
                line: Some(line(node)),
            },
            "attribute" => Expr::Attribute {
                value: Box::new(self.expr(self.field(node, "object")?)?),
                attr: self.field_text(node, "attribute")?,
                line: Some(line(node)),
            },
            "call" => {
                let arguments = self.field(node, "arguments")?;
                let args = match arguments.kind() {
                    "argument_list" => self.args(arguments)?,
                    // f(x for x in xs)
                    _ => vec![Arg::Positional(self.raw(arguments)?)],
                };
                Expr::Call {
                    func: Box::new(self.expr(self.field(node, "function")?)?),
                    args,
                    line: Some(line(node)),
                }
            }
            "await" => match syntax_children(node).as_slice() {
                [value] => Expr::Await {
                    value: Box::new(self.expr(*value)?),
                    line: Some(line(node)),
                },
                _ => self.raw(node)?,
            },
            // parentheses only matter around text we keep as written
            "parenthesized_expression" => match syntax_children(node).as_slice() {
                [inner] if UNWRAPPABLE_KINDS.contains(&inner.kind()) => self.expr(*inner)?,
                _ => self.raw(node)?,
            },
            _ => self.raw(node)?,
        };
        Ok(expr)
    }

    fn raw(&self, node: Node) -> Result<Expr> {
        Ok(Expr::Raw {
            text: self.code(node, node.end_byte())?,
            line: Some(line(node)),
        })
    }

    /// Source of `node` up to `end`, comments cut out and trailing
    /// whitespace trimmed.
    fn code(&self, node: Node, end: usize) -> Result<String> {
        let mut comments = Vec::new();
        collect_comments(node, node.start_byte(), end, &mut comments);

        let mut code = String::new();
        let mut at = node.start_byte();
        for comment in comments {
            code.push_str(self.slice(at, comment.start_byte())?.trim_end_matches([' ', '\t']));
            at = comment.end_byte();
        }
        code.push_str(self.slice(at, end)?);
        Ok(code.trim_end().to_string())
    }

    fn args(&self, list: Node) -> Result<Vec<Arg>> {
        syntax_children(list)
            .into_iter()
            .map(|child| {
                let arg = match child.kind() {
                    "keyword_argument" => Arg::Keyword {
                        name: self.field_text(child, "name")?,
                        value: self.expr(self.field(child, "value")?)?,
                        line: Some(line(child)),
                    },
                    "list_splat" => Arg::Starred {
                        text: self.text(child)?.to_string(),
                        line: Some(line(child)),
                    },
                    "dictionary_splat" => Arg::KwStarred {
                        text: self.text(child)?.to_string(),
                        line: Some(line(child)),
                    },
                    _ => Arg::Positional(self.expr(child)?),
                };
                Ok(arg)
            })
            .collect()
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            anyhow!("`{}` at line {} has no `{}`", node.kind(), line(node), name)
        })
    }

    fn field_text(&self, node: Node, name: &str) -> Result<String> {
        Ok(self.text(self.field(node, name)?)?.to_string())
    }

    fn text(&self, node: Node) -> Result<&'s str> {
        node.utf8_text(self.source.as_bytes())
            .map_err(|e| anyhow!("non UTF-8 text at line {}: {e}", line(node)))
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'s str> {
        self.source
            .get(start..end)
            .ok_or_else(|| anyhow!("byte range {start}..{end} is outside the source"))
    }
}

/// Comment nodes of `node` lying inside `start..end`, in source order.
fn collect_comments<'t>(node: Node<'t>, start: usize, end: usize, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.end_byte() <= start || child.start_byte() >= end {
            continue;
        }
        if child.kind() == "comment" {
            out.push(child);
        } else {
            collect_comments(child, start, end, out);
        }
    }
}

/// Named children minus comments.
fn syntax_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn line(node: Node) -> usize {
    node.start_position().row + 1
}

/// Last line holding text of `node`; a trailing newline does not count.
fn end_line(node: Node) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    }
}

fn pos(node: Node) -> Pos {
    Pos::new(line(node), end_line(node))
}
