//! Gives every node a line before emission.
//!
//! Statements built by the rewriter have no position. Each one shares the
//! last line of its preceding sibling (or the line of its enclosing header),
//! so it never counts as following a blank line. Expressions without a
//! line take the line of the node that holds them.

use crate::processor::ast::{Arg, Expr, Module, Stmt};

pub fn backfill(module: &mut Module) {
    fill_body(&mut module.body, 1);
}

fn fill_body(body: &mut [Stmt], header_line: usize) {
    let mut last_end = header_line;
    for stmt in body {
        let pos = stmt.pos_mut();
        let line = *pos.line.get_or_insert(last_end);
        let end = *pos.end_line.get_or_insert(line);
        last_end = end.max(line);

        match stmt {
            Stmt::Expr { value, .. } | Stmt::Assign { value, .. } => fill_expr(value, line),
            Stmt::ClassDef(class) => {
                for base in class.bases.iter_mut().flatten() {
                    fill_arg(base, line);
                }
                fill_body(&mut class.body, line);
            }
            Stmt::Block(block) => {
                for clause in &mut block.clauses {
                    let clause_line = *clause.pos.line.get_or_insert(line);
                    clause.pos.end_line.get_or_insert(clause_line);
                    fill_body(&mut clause.body, clause_line);
                }
            }
            Stmt::Verbatim { .. } => {}
        }
    }
}

fn fill_expr(expr: &mut Expr, outer_line: usize) {
    let line = *expr.line_mut().get_or_insert(outer_line);
    match expr {
        Expr::Attribute { value, .. } | Expr::Await { value, .. } => fill_expr(value, line),
        Expr::Call { func, args, .. } => {
            fill_expr(func, line);
            for arg in args {
                fill_arg(arg, line);
            }
        }
        Expr::Name { .. } | Expr::Raw { .. } => {}
    }
}

fn fill_arg(arg: &mut Arg, outer_line: usize) {
    match arg {
        Arg::Positional(expr) => fill_expr(expr, outer_line),
        Arg::Keyword { value, line, .. } => {
            let line = *line.get_or_insert(outer_line);
            fill_expr(value, line);
        }
        Arg::Starred { line, .. } | Arg::KwStarred { line, .. } => {
            line.get_or_insert(outer_line);
        }
    }
}
