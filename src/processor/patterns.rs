//! Shape predicates over `ast` nodes.

use super::ast::{Arg, Expr};

/// Scene methods that advance animation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Play,
    Wait,
}

pub fn is_name(expr: &Expr, expected: &str) -> bool {
    matches!(expr, Expr::Name { id, .. } if id == expected)
}

/// `self.play` / `self.wait` as a callee.
pub fn scene_verb(func: &Expr) -> Option<Verb> {
    match func {
        Expr::Attribute { value, attr, .. } if is_name(value, "self") => match attr.as_str() {
            "play" => Some(Verb::Play),
            "wait" => Some(Verb::Wait),
            _ => None,
        },
        _ => None,
    }
}

/// `x` for `await x`, otherwise the expression itself.
pub fn awaited(expr: &Expr) -> &Expr {
    match expr {
        Expr::Await { value, .. } => value.as_ref(),
        other => other,
    }
}

pub fn into_awaited(expr: Expr) -> Expr {
    match expr {
        Expr::Await { value, .. } => *value,
        other => other,
    }
}

/// Plain-name callee, e.g. `Create` in `Create(circle)`.
pub fn callee_name(func: &Expr) -> Option<&str> {
    match func {
        Expr::Name { id, .. } => Some(id),
        _ => None,
    }
}

/// `obj.animate` or `obj.animate(...)`, yielding `obj`.
fn animate_proxy(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Attribute { value, attr, .. } if attr == "animate" => Some(value),
        Expr::Call { func, .. } => match func.as_ref() {
            Expr::Attribute { value, attr, .. } if attr == "animate" => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// Turns an animate-wrapped call into the direct call it animates.
///
/// ```text
/// mob.animate.shift(LEFT)                →  mob.shift(LEFT)
/// mob.animate(run_time=2).shift(LEFT)    →  mob.shift(LEFT)
/// mob.animate.shift(LEFT).scale(2)       →  mob.shift(LEFT).scale(2)
/// ```
///
/// The object is reused exactly as written. Nodes built here carry no line.
pub fn strip_animate(call: &Expr) -> Option<Expr> {
    let Expr::Call { func, args, .. } = call else {
        return None;
    };
    let Expr::Attribute {
        value: receiver,
        attr: method,
        ..
    } = func.as_ref()
    else {
        return None;
    };

    let object = match animate_proxy(receiver) {
        Some(object) => object.clone(),
        None => strip_animate(receiver)?,
    };

    Some(Expr::call(Expr::attribute(object, method), args.clone()))
}

/// Arguments that carry mobjects: positionals and `*` splats.
pub fn positional_args(args: &[Arg]) -> Vec<Arg> {
    args.iter()
        .filter(|arg| matches!(arg, Arg::Positional(_) | Arg::Starred { .. }))
        .cloned()
        .collect()
}
