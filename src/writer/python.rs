//! Emit the rewritten tree as Python source.
//!
//! Four spaces per nesting level, decorators on their own lines, one blank
//! line above each statement that had one in the original. Opaque text
//! (`Raw`, `Verbatim`, clause headers) is written exactly as parsed.
//! An emptied suite becomes `pass`; an emptied `match` gets a `case _:`
//! so it still parses.

use super::positions;
use crate::model::SlicedScript;
use crate::processor::ast::{Arg, ClauseKind, Expr, Module, Stmt};
use anyhow::{Context, Result, bail};
use log::info;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Write as _};
use std::fs;
use std::path::Path;

const INDENT: &str = "    ";

pub fn emit(script: SlicedScript, path: &Path) -> Result<()> {
    let source = render(script)?;
    fs::write(path, &source).with_context(|| format!("Writing {}", path.display()))?;
    info!("wrote {} bytes to {}", source.len(), path.display());
    Ok(())
}

/// Backfill positions, then serialize.
pub fn render(script: SlicedScript) -> Result<String> {
    let mut module = script.module;
    positions::backfill(&mut module);
    unparse(&module)
}

/// Serialize a tree whose statements all carry positions.
pub fn unparse(module: &Module) -> Result<String> {
    let mut emitter = Emitter {
        out: String::new(),
        spaced: &module.spaced_lines,
    };
    emitter.body(&module.body, 0)?;
    Ok(emitter.out)
}

struct Emitter<'m> {
    out: String,
    spaced: &'m BTreeSet<usize>,
}

impl Emitter<'_> {
    fn body(&mut self, body: &[Stmt], depth: usize) -> Result<()> {
        // a suite cannot be empty; the module can
        if body.is_empty() && depth > 0 {
            self.line(depth, "pass")?;
        }

        let mut previous_end: Option<usize> = None;
        for stmt in body {
            let pos = stmt.pos();
            let (Some(line), Some(end_line)) = (pos.line, pos.end_line) else {
                bail!("statement has no source position: {stmt:?}");
            };

            if previous_end.is_some_and(|end| line > end) && self.spaced.contains(&line) {
                self.out.push('\n');
            }
            self.stmt(stmt, depth)?;
            previous_end = Some(end_line);
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) -> Result<()> {
        match stmt {
            Stmt::Expr { value, .. } => self.line(depth, value)?,
            Stmt::Assign { lhs, value, .. } => self.line(depth, format_args!("{lhs} {value}"))?,
            Stmt::Verbatim { text, .. } => self.line(depth, text)?,
            Stmt::ClassDef(class) => {
                for decorator in &class.decorators {
                    self.line(depth, decorator)?;
                }
                let mut header = format!("class {}", class.name);
                if let Some(params) = &class.type_params {
                    header.push_str(params);
                }
                if let Some(bases) = &class.bases {
                    write!(header, "({})", Args(bases))?;
                }
                header.push(':');
                self.line(depth, header)?;
                self.body(&class.body, depth + 1)?;
            }
            Stmt::Block(block) => {
                for decorator in &block.decorators {
                    self.line(depth, decorator)?;
                }
                for clause in &block.clauses {
                    self.line(depth, &clause.header)?;
                    if clause.kind == ClauseKind::Match && clause.body.is_empty() {
                        self.line(depth + 1, "case _:")?;
                        self.line(depth + 2, "pass")?;
                    } else {
                        self.body(&clause.body, depth + 1)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn line(&mut self, depth: usize, text: impl Display) -> fmt::Result {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        writeln!(self.out, "{text}")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name { id, .. } => f.write_str(id),
            Expr::Attribute { value, attr, .. } => write!(f, "{value}.{attr}"),
            Expr::Call { func, args, .. } => write!(f, "{func}({})", Args(args)),
            Expr::Await { value, .. } => write!(f, "await {value}"),
            Expr::Raw { text, .. } => f.write_str(text),
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Positional(expr) => write!(f, "{expr}"),
            Arg::Keyword { name, value, .. } => write!(f, "{name}={value}"),
            Arg::Starred { text, .. } | Arg::KwStarred { text, .. } => f.write_str(text),
        }
    }
}

/// Comma-separated argument list.
struct Args<'a>(&'a [Arg]);

impl Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;
    use crate::processor::ast::{Block, ClassDef, Clause, Pos};
    use crate::processor::scene::SceneClass;

    fn round_trip(src: &str) -> String {
        unparse(&parse_script(src).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_normalizes_layout() {
        let test_cases = vec![
            ("x = 1\n", "x = 1\n"),
            ("x=f( a ,b=2 )\n", "x = f(a, b=2)\n"),
            ("self.play(\n    Create(c),\n)\n", "self.play(Create(c))\n"),
            ("a = b = c\n", "a = b = c\n"),
            ("import os  # why\n", "import os\n"),
            ("x = [1,\n  2]\n", "x = [1,\n  2]\n"),
            ("f(*args, **kw)\n", "f(*args, **kw)\n"),
            ("await  f(x)\n", "await f(x)\n"),
            ("x = ((g( a )))\n", "x = g(a)\n"),
            ("if ok:  # why\n    go()\n", "if ok:\n    go()\n"),
            ("t = '''\n  keep\n'''\n", "t = '''\n  keep\n'''\n"),
        ];

        for (src, expected) in test_cases {
            assert_eq!(round_trip(src), expected, "{src:?}");
        }
    }

    #[test]
    fn test_blocks_and_blank_lines() {
        let src = "\
from manim import *


@decorate
class Intro(Scene):
  def construct(self):
    if ready:
      go()
    else:
      stop()

    self.wait()
";
        let expected = "\
from manim import *

@decorate
class Intro(Scene):
    def construct(self):
        if ready:
            go()
        else:
            stop()

        self.wait()
";
        assert_eq!(round_trip(src), expected);
    }

    #[test]
    fn test_empty_suites_become_pass() {
        let module = Module::new(vec![
            Stmt::ClassDef(ClassDef {
                decorators: Vec::new(),
                name: "TempScene".into(),
                type_params: None,
                bases: Some(Vec::new()),
                body: Vec::new(),
                pos: Pos::new(1, 1),
            }),
            Stmt::Block(Block {
                decorators: Vec::new(),
                clauses: vec![Clause {
                    kind: ClauseKind::Plain,
                    header: "while True:".into(),
                    body: Vec::new(),
                    pos: Pos::new(2, 2),
                }],
                pos: Pos::new(2, 2),
            }),
        ]);
        assert_eq!(
            unparse(&module).unwrap(),
            "class TempScene():\n    pass\nwhile True:\n    pass\n"
        );
        assert_eq!(unparse(&Module::default()).unwrap(), "");
    }

    #[test]
    fn test_missing_position_is_an_error() {
        let module = Module::new(vec![Stmt::synthesized(Expr::name("x"))]);
        let err = unparse(&module).unwrap_err();
        assert!(err.to_string().contains("no source position"), "got: {err}");

        let rendered = render(SlicedScript {
            module,
            scene: SceneClass::Placeholder,
        })
        .unwrap();
        assert_eq!(rendered, "x\n");
    }

    #[test]
    fn test_emit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp_scene.py");
        let script = SlicedScript {
            module: parse_script("x = 1\n").unwrap(),
            scene: SceneClass::Placeholder,
        };

        emit(script, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1\n");
    }
}
