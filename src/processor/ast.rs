//! Tagged syntax tree for one scene script.
//!
//! Only the shapes the rewriter has to look into are modelled; everything
//! else is carried as source text (`Expr::Raw`, `Stmt::Verbatim`, clause
//! headers). Lines are 1-based and optional: nodes built by the rewriter
//! have none until `writer::positions::backfill` runs.

use std::collections::BTreeSet;

/// Source position of a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: Option<usize>,
    pub end_line: Option<usize>,
}

impl Pos {
    pub fn new(line: usize, end_line: usize) -> Self {
        Self {
            line: Some(line),
            end_line: Some(end_line),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    /// Lines of statements that had a blank line above them
    pub spaced_lines: BTreeSet<usize>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            body,
            spaced_lines: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `self.play(Create(c))`
    Expr { value: Expr, pos: Pos },

    /// `x = value`, `a = b = value`, `x += value`, `x: T = value`.
    /// `lhs` is everything before the value, operator included.
    Assign { lhs: String, value: Expr, pos: Pos },

    ClassDef(ClassDef),

    /// Compound statement other than `class`.
    Block(Block),

    /// Simple statement the rewriter never looks into (`import`, `return`, ...)
    Verbatim { text: String, pos: Pos },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub decorators: Vec<String>,
    pub name: String,
    /// `[T]` of `class A[T]:`
    pub type_params: Option<String>,
    /// `None` for `class A:`, `Some(vec![])` for `class A():`
    pub bases: Option<Vec<Arg>>,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}

/// `if`/`for`/`while`/`try`/`with`/`def`/`match`/`case`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub decorators: Vec<String>,
    pub clauses: Vec<Clause>,
    pub pos: Pos,
}

/// One `header:` plus its indented body (`elif x:`, `except E:`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub header: String,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Plain,
    /// `except ...:` / `finally:`
    Handler,
    /// `match subject:`; its body holds only `case` blocks
    Match,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name {
        id: String,
        line: Option<usize>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        line: Option<usize>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
        line: Option<usize>,
    },
    /// `await value`
    Await {
        value: Box<Expr>,
        line: Option<usize>,
    },
    Raw {
        text: String,
        line: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword {
        name: String,
        value: Expr,
        line: Option<usize>,
    },
    /// `*xs`, kept as written
    Starred { text: String, line: Option<usize> },
    /// `**kw`, kept as written
    KwStarred { text: String, line: Option<usize> },
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::Expr { pos, .. } | Stmt::Assign { pos, .. } | Stmt::Verbatim { pos, .. } => *pos,
            Stmt::ClassDef(class) => class.pos,
            Stmt::Block(block) => block.pos,
        }
    }

    pub fn pos_mut(&mut self) -> &mut Pos {
        match self {
            Stmt::Expr { pos, .. } | Stmt::Assign { pos, .. } | Stmt::Verbatim { pos, .. } => pos,
            Stmt::ClassDef(class) => &mut class.pos,
            Stmt::Block(block) => &mut block.pos,
        }
    }

    /// Expression statement with no position, as produced by rewriting.
    pub fn synthesized(value: Expr) -> Self {
        Stmt::Expr {
            value,
            pos: Pos::default(),
        }
    }
}

impl Expr {
    pub fn line(&self) -> Option<usize> {
        match self {
            Expr::Name { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Call { line, .. }
            | Expr::Await { line, .. }
            | Expr::Raw { line, .. } => *line,
        }
    }

    pub fn line_mut(&mut self) -> &mut Option<usize> {
        match self {
            Expr::Name { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Call { line, .. }
            | Expr::Await { line, .. }
            | Expr::Raw { line, .. } => line,
        }
    }

    pub fn name(id: &str) -> Self {
        Expr::Name {
            id: id.to_string(),
            line: None,
        }
    }

    pub fn attribute(value: Expr, attr: &str) -> Self {
        Expr::Attribute {
            value: Box::new(value),
            attr: attr.to_string(),
            line: None,
        }
    }

    pub fn call(func: Expr, args: Vec<Arg>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
            line: None,
        }
    }
}

impl Arg {
    pub fn line(&self) -> Option<usize> {
        match self {
            Arg::Positional(expr) => expr.line(),
            Arg::Keyword { line, .. } | Arg::Starred { line, .. } | Arg::KwStarred { line, .. } => {
                *line
            }
        }
    }
}
