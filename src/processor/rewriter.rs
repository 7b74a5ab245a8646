//! Truncates a scene script at the target line and turns every earlier
//! animation into the instant call that leaves the scene in the same state.
//!
//! Nodes are visited in source order. The cut is a one-way [`Gate`]: it is
//! handed to every visit and handed back, closed until the first node past
//! the target line is seen and open for good afterwards. Every node visited
//! through an open gate is deleted.
//!
//! Calls to `self.play` / `self.wait`:
//!
//! - on the target line: kept untouched, arguments not visited;
//! - before it: `wait` is deleted, `play` is replaced by one statement per
//!   recognized animation argument (`self.add`, `self.remove`, or the direct
//!   call behind `.animate`). Unrecognized arguments are dropped; a `play`
//!   with nothing left is deleted.
//!
//! An `await` in front of such a call is looked through and does not
//! survive the rewrite.

use super::ast::{Arg, Block, Clause, ClauseKind, Expr, Module, Pos, Stmt};
use super::patterns::{self, Verb};
use crate::model::Vocabulary;
use log::debug;

/// One-way latch marking "past the target line".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gate {
    open: bool,
}

impl Gate {
    pub fn is_open(self) -> bool {
        self.open
    }

    /// Gate state after visiting a node on `line`.
    ///
    /// A node without a line never opens the gate; it is deleted only when
    /// the gate is already open.
    pub fn pass(self, line: Option<usize>, target: usize) -> Gate {
        Gate {
            open: self.open || line.is_some_and(|line| line > target),
        }
    }
}

/// What a visit did with a node; the parent splices accordingly.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit<T> {
    Keep(T),
    Splice(Vec<T>),
    Delete,
}

/// Outcome for one argument of an early `self.play(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// `Create(x)` → `self.add(x)`
    Add(Vec<Arg>),
    /// `FadeOut(x)` → `self.remove(x)`
    Remove(Vec<Arg>),
    /// `x.animate.m(a)` → `x.m(a)`
    Direct(Expr),
    /// Anything else; contributes nothing
    Dropped,
}

pub struct Rewriter<'v> {
    target: usize,
    vocabulary: &'v Vocabulary,
}

impl<'v> Rewriter<'v> {
    pub fn new(target: usize, vocabulary: &'v Vocabulary) -> Self {
        Self { target, vocabulary }
    }

    pub fn rewrite(&self, module: Module) -> Module {
        let (body, gate) = self.visit_body(module.body, Gate::default());
        if !gate.is_open() {
            debug!("script ends before line {}", self.target);
        }
        Module { body, ..module }
    }

    fn enter(&self, line: Option<usize>, gate: Gate) -> Gate {
        let next = gate.pass(line, self.target);
        if next.is_open() && !gate.is_open() {
            debug!("cut at line {:?} (target {})", line, self.target);
        }
        next
    }

    pub fn visit_body(&self, body: Vec<Stmt>, mut gate: Gate) -> (Vec<Stmt>, Gate) {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            let (visit, next) = self.visit_stmt(stmt, gate);
            gate = next;
            match visit {
                Visit::Keep(stmt) => out.push(stmt),
                Visit::Splice(stmts) => out.extend(stmts),
                Visit::Delete => {}
            }
        }
        (out, gate)
    }

    pub fn visit_stmt(&self, stmt: Stmt, gate: Gate) -> (Visit<Stmt>, Gate) {
        let gate = self.enter(stmt.pos().line, gate);
        if gate.is_open() {
            return (Visit::Delete, gate);
        }

        match stmt {
            Stmt::Expr { value, pos } => self.visit_expr_stmt(value, pos, gate),
            Stmt::Assign { lhs, value, pos } => {
                let (value, gate) = self.visit_expr(value, gate);
                let visit = match value {
                    Some(value) => Visit::Keep(Stmt::Assign { lhs, value, pos }),
                    None => Visit::Delete,
                };
                (visit, gate)
            }
            Stmt::ClassDef(mut class) => {
                let (body, gate) = self.visit_body(std::mem::take(&mut class.body), gate);
                class.body = body;
                (Visit::Keep(Stmt::ClassDef(class)), gate)
            }
            Stmt::Block(block) => {
                let (block, gate) = self.visit_block(block, gate);
                (Visit::Keep(Stmt::Block(block)), gate)
            }
            verbatim @ Stmt::Verbatim { .. } => (Visit::Keep(verbatim), gate),
        }
    }

    /// Clause headers are opaque. A clause reached through an open gate is
    /// dropped, except the first handler of a `try`, which a `try` cannot
    /// lose; its body is emptied like any other.
    fn visit_block(&self, block: Block, mut gate: Gate) -> (Block, Gate) {
        let mut clauses: Vec<Clause> = Vec::with_capacity(block.clauses.len());
        for (index, mut clause) in block.clauses.into_iter().enumerate() {
            gate = self.enter(clause.pos.line, gate);
            let required = is_handler(&clause) && !clauses.iter().any(is_handler);
            if gate.is_open() && index > 0 && !required {
                debug!("dropping clause `{}`", clause.header);
                continue;
            }

            let (body, next) = self.visit_body(std::mem::take(&mut clause.body), gate);
            gate = next;
            clause.body = body;
            clauses.push(clause);
        }

        (Block { clauses, ..block }, gate)
    }

    fn visit_expr_stmt(&self, value: Expr, pos: Pos, gate: Gate) -> (Visit<Stmt>, Gate) {
        if let Expr::Call { func, .. } = patterns::awaited(&value) {
            if let Some(verb) = patterns::scene_verb(func) {
                let gate = self.enter(value.line(), gate);
                if gate.is_open() {
                    return (Visit::Delete, gate);
                }
                return (self.scene_call(verb, value, pos), gate);
            }
        }

        let (value, gate) = self.visit_expr(value, gate);
        let visit = match value {
            Some(value) => Visit::Keep(Stmt::Expr { value, pos }),
            None => Visit::Delete,
        };
        (visit, gate)
    }

    /// `self.play(...)` / `self.wait(...)` standing as a statement,
    /// possibly awaited.
    fn scene_call(&self, verb: Verb, value: Expr, pos: Pos) -> Visit<Stmt> {
        let line = match patterns::awaited(&value).line() {
            Some(line) if line < self.target => line,
            // target line, or no line to compare
            _ => return Visit::Keep(Stmt::Expr { value, pos }),
        };

        let Expr::Call { args, .. } = patterns::into_awaited(value) else {
            return Visit::Delete;
        };
        if verb == Verb::Wait {
            debug!("line {line}: dropping self.wait");
            return Visit::Delete;
        }

        let replacements: Vec<Stmt> = args
            .iter()
            .filter_map(|arg| match self.classify(arg) {
                Classified::Add(args) => Some(self_call("add", args)),
                Classified::Remove(args) => Some(self_call("remove", args)),
                Classified::Direct(expr) => Some(Stmt::synthesized(expr)),
                Classified::Dropped => {
                    debug!("line {line}: no instant form for {arg:?}");
                    None
                }
            })
            .collect();

        if replacements.is_empty() {
            debug!("line {line}: self.play left nothing to keep");
            Visit::Delete
        } else {
            Visit::Splice(replacements)
        }
    }

    pub fn classify(&self, arg: &Arg) -> Classified {
        let Arg::Positional(call @ Expr::Call { func, args, .. }) = arg else {
            return Classified::Dropped;
        };

        if let Some(name) = patterns::callee_name(func) {
            if self.vocabulary.is_appearance(name) {
                return Classified::Add(patterns::positional_args(args));
            }
            if self.vocabulary.is_disappearance(name) {
                return Classified::Remove(patterns::positional_args(args));
            }
        }

        match patterns::strip_animate(call) {
            Some(direct) => Classified::Direct(direct),
            None => Classified::Dropped,
        }
    }

    /// Generic structural visit; `None` means the expression was deleted.
    pub fn visit_expr(&self, expr: Expr, gate: Gate) -> (Option<Expr>, Gate) {
        let gate = self.enter(expr.line(), gate);
        if gate.is_open() {
            return (None, gate);
        }

        match expr {
            Expr::Call { func, args, line } => {
                if let Some(verb) = patterns::scene_verb(&func) {
                    // cannot splice statements into an expression
                    if line.is_some_and(|line| line < self.target) {
                        debug!("line {line:?}: dropping {verb:?} used as a value");
                        return (None, gate);
                    }
                    return (Some(Expr::Call { func, args, line }), gate);
                }

                let (func, gate) = self.visit_expr(*func, gate);
                let Some(func) = func else {
                    return (None, gate);
                };
                let (args, gate) = self.visit_args(args, gate);
                let call = Expr::Call {
                    func: Box::new(func),
                    args,
                    line,
                };
                (Some(call), gate)
            }
            Expr::Attribute { value, attr, line } => {
                let (value, gate) = self.visit_expr(*value, gate);
                let attribute = value.map(|value| Expr::Attribute {
                    value: Box::new(value),
                    attr,
                    line,
                });
                (attribute, gate)
            }
            Expr::Await { value, line } => {
                let (value, gate) = self.visit_expr(*value, gate);
                let awaited = value.map(|value| Expr::Await {
                    value: Box::new(value),
                    line,
                });
                (awaited, gate)
            }
            leaf @ (Expr::Name { .. } | Expr::Raw { .. }) => (Some(leaf), gate),
        }
    }

    fn visit_args(&self, args: Vec<Arg>, mut gate: Gate) -> (Vec<Arg>, Gate) {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            let (kept, next) = match arg {
                Arg::Positional(expr) => {
                    let (expr, next) = self.visit_expr(expr, gate);
                    (expr.map(Arg::Positional), next)
                }
                Arg::Keyword { name, value, line } => {
                    let next = self.enter(line, gate);
                    if next.is_open() {
                        (None, next)
                    } else {
                        let (value, next) = self.visit_expr(value, next);
                        (value.map(|value| Arg::Keyword { name, value, line }), next)
                    }
                }
                splat => {
                    let next = self.enter(splat.line(), gate);
                    ((!next.is_open()).then_some(splat), next)
                }
            };
            gate = next;
            out.extend(kept);
        }
        (out, gate)
    }
}

fn is_handler(clause: &Clause) -> bool {
    clause.kind == ClauseKind::Handler
}

/// `self.<method>(args)` with no position yet.
fn self_call(method: &str, args: Vec<Arg>) -> Stmt {
    Stmt::synthesized(Expr::call(Expr::attribute(Expr::name("self"), method), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;
    use crate::writer::python::unparse;

    fn slice(src: &str, target: usize) -> String {
        let vocabulary = Vocabulary::default();
        let module = parse_script(src).expect("valid script");
        let mut module = Rewriter::new(target, &vocabulary).rewrite(module);
        crate::writer::positions::backfill(&mut module);
        unparse(&module).expect("emits")
    }

    fn stmt(value: Expr, line: Option<usize>) -> Stmt {
        Stmt::Expr {
            value,
            pos: Pos {
                line,
                end_line: line,
            },
        }
    }

    /* ------------------------------------------------------------------ */
    /*  Gate                                                              */
    /* ------------------------------------------------------------------ */

    #[test]
    fn test_gate_is_one_way() {
        let gate = Gate::default();
        assert!(!gate.pass(Some(3), 5).is_open());
        assert!(!gate.pass(Some(5), 5).is_open());
        assert!(!gate.pass(None, 5).is_open());

        let open = gate.pass(Some(6), 5);
        assert!(open.is_open());
        assert!(open.pass(Some(1), 5).is_open());
        assert!(open.pass(None, 5).is_open());
    }

    #[test]
    fn test_lineless_nodes_follow_the_gate() {
        let vocabulary = Vocabulary::default();
        let rewriter = Rewriter::new(5, &vocabulary);
        let module = Module::new(vec![
            stmt(Expr::name("before"), None),
            stmt(Expr::name("early"), Some(2)),
            stmt(Expr::name("late"), Some(9)),
            stmt(Expr::name("after"), None),
            stmt(Expr::name("earlier_again"), Some(1)),
        ]);

        let body = rewriter.rewrite(module).body;
        assert_eq!(
            body,
            vec![
                stmt(Expr::name("before"), None),
                stmt(Expr::name("early"), Some(2)),
            ]
        );
    }

    /* ------------------------------------------------------------------ */
    /*  Call rewriting                                                    */
    /* ------------------------------------------------------------------ */

    #[test]
    fn test_early_calls_become_instant() {
        let test_cases = vec![
            ("self.wait(1)\nx = 1\n", "x = 1\n"),
            ("self.play(Create(circle))\nx = 1\n", "self.add(circle)\nx = 1\n"),
            ("self.play(FadeOut(a, b))\nx = 1\n", "self.remove(a, b)\nx = 1\n"),
            (
                "self.play(FadeIn(sq, shift=UP), run_time=2)\nx = 1\n",
                "self.add(sq)\nx = 1\n",
            ),
            ("self.play(mob.animate.shift(LEFT))\nx = 1\n", "mob.shift(LEFT)\nx = 1\n"),
            (
                "self.play(group[0].animate.set_color(RED, family=True))\nx = 1\n",
                "group[0].set_color(RED, family=True)\nx = 1\n",
            ),
            ("self.play(Transform(a, b))\nx = 1\n", "x = 1\n"),
            ("self.play(*anims)\nx = 1\n", "x = 1\n"),
        ];

        for (src, expected) in test_cases {
            assert_eq!(slice(src, 2), expected, "{src:?}");
        }
    }

    #[test]
    fn test_play_with_several_animations_splices() {
        let src = "\
self.play(Create(a), Transform(b, c), d.animate.scale(2), Uncreate(e))
done = True
";
        assert_eq!(
            slice(src, 2),
            "self.add(a)\nd.scale(2)\nself.remove(e)\ndone = True\n"
        );
    }

    #[test]
    fn test_target_line_call_is_untouched() {
        let src = "\
self.play(Create(a))
self.play(Create(b), run_time=3)
self.wait()
";
        assert_eq!(slice(src, 2), "self.add(a)\nself.play(Create(b), run_time=3)\n");
        assert_eq!(slice("self.wait(2)\n", 1), "self.wait(2)\n");
    }

    #[test]
    fn test_removed_calls_leave_no_gap() {
        let src = "\
a = 1
self.wait()
b = 2

self.play(Transform(a, b))
c = 3

self.play(Create(d))
";
        assert_eq!(slice(src, 9), "a = 1\nb = 2\nc = 3\nself.add(d)\n");
    }

    #[test]
    fn test_awaited_and_parenthesized_calls() {
        let test_cases = vec![
            ("await self.play(Create(a))\nx = 1\n", 2, "self.add(a)\nx = 1\n"),
            ("await self.wait()\nx = 1\n", 2, "x = 1\n"),
            ("y = await self.wait()\nx = 1\n", 2, "x = 1\n"),
            ("y = (\n    self.wait()\n)\nx = 1\n", 4, "x = 1\n"),
            ("self.play((Create(a)))\nx = 1\n", 2, "self.add(a)\nx = 1\n"),
            ("await self.play(Create(a))\n", 1, "await self.play(Create(a))\n"),
        ];

        for (src, target, expected) in test_cases {
            assert_eq!(slice(src, target), expected, "{src:?}");
        }
    }

    #[test]
    fn test_multiline_target_call_keeps_every_argument() {
        let src = "\
self.play(
    Create(a),
    FadeIn(b),
)
self.wait()
";
        assert_eq!(slice(src, 1), "self.play(Create(a), FadeIn(b))\n");
    }

    #[test]
    fn test_scene_call_used_as_value_drops_statement() {
        let src = "\
result = self.wait(1)
other = self.play(Create(a))
kept = 1
";
        assert_eq!(slice(src, 5), "kept = 1\n");
    }

    #[test]
    fn test_other_calls_recurse_structurally() {
        let src = "\
circle = Circle(radius=1,
                color=BLUE)
self.add(circle)
";
        assert_eq!(slice(src, 1), "circle = Circle(radius=1)\n");
        assert_eq!(
            slice(src, 3),
            "circle = Circle(radius=1, color=BLUE)\nself.add(circle)\n"
        );
    }

    #[test]
    fn test_classify() {
        let vocabulary = Vocabulary::default();
        let rewriter = Rewriter::new(10, &vocabulary);
        let arg = |src: &str| -> Arg {
            let module = parse_script(&format!("f({src})")).unwrap();
            match module.body.into_iter().next() {
                Some(Stmt::Expr {
                    value: Expr::Call { mut args, .. },
                    ..
                }) => args.remove(0),
                other => panic!("unexpected {other:?}"),
            }
        };

        assert!(matches!(rewriter.classify(&arg("Create(c)")), Classified::Add(_)));
        assert!(matches!(rewriter.classify(&arg("Uncreate(c)")), Classified::Remove(_)));
        assert!(matches!(rewriter.classify(&arg("c.animate.shift(UP)")), Classified::Direct(_)));
        assert_eq!(rewriter.classify(&arg("ReplacementTransform(a, b)")), Classified::Dropped);
        assert_eq!(rewriter.classify(&arg("anim")), Classified::Dropped);
        assert_eq!(rewriter.classify(&arg("*anims")), Classified::Dropped);
    }

    /* ------------------------------------------------------------------ */
    /*  Truncation                                                        */
    /* ------------------------------------------------------------------ */

    #[test]
    fn test_everything_past_target_is_cut() {
        let src = "\
from manim import *

class Demo(Scene):
    def construct(self):
        c = Circle()
        self.play(Create(c))
        self.play(c.animate.shift(LEFT))
        self.wait()
        self.play(FadeOut(c))

def helper():
    return 1
";
        let expected = "\
from manim import *

class Demo(Scene):
    def construct(self):
        c = Circle()
        self.add(c)
        self.play(c.animate.shift(LEFT))
";
        assert_eq!(slice(src, 7), expected);
    }

    #[test]
    fn test_loop_body_past_target_is_emptied() {
        let src = "\
for i in range(3):
    self.play(Create(dots[i]))
";
        let vocabulary = Vocabulary::default();
        let module = parse_script(src).unwrap();
        let module = Rewriter::new(1, &vocabulary).rewrite(module);

        let Stmt::Block(block) = &module.body[0] else {
            panic!("expected loop, got {:?}", module.body);
        };
        assert_eq!(block.clauses.len(), 1);
        assert!(block.clauses[0].body.is_empty());

        assert_eq!(slice(src, 1), "for i in range(3):\n    pass\n");
    }

    #[test]
    fn test_emptied_match_keeps_a_case() {
        let src = "\
match k:
    case 1:
        self.play(Create(a))
    case _:
        self.wait()
";
        assert_eq!(slice(src, 1), "match k:\n    case _:\n        pass\n");
        assert_eq!(slice(src, 2), "match k:\n    case 1:\n        pass\n");
        assert_eq!(slice(src, 4), "match k:\n    case 1:\n        self.add(a)\n    case _:\n        pass\n");
    }

    #[test]
    fn test_trailing_clauses_past_target() {
        let src = "\
if flag:
    self.play(Create(a))
else:
    self.play(Create(b))
";
        assert_eq!(slice(src, 2), "if flag:\n    self.play(Create(a))\n");

        let src = "\
try:
    self.play(Create(a))
except ValueError:
    pass
finally:
    cleanup()
";
        assert_eq!(
            slice(src, 1),
            "try:\n    pass\nexcept ValueError:\n    pass\n"
        );
    }
}
