//! Picks the class the renderer should draw and gives it the fixed name
//! the renderer is invoked with.

use super::ast::{Arg, ClassDef, Expr, Module, Pos, Stmt};
use crate::model::{CANONICAL_SCENE_NAME, PLACEHOLDER_BASE, Vocabulary};
use log::{debug, warn};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneClass {
    /// First class listing a scene base, e.g. `class Intro(Scene)`.
    Based(String),
    /// No class lists a scene base; first class of the script.
    BestGuess(String),
    /// The script defines no class; a minimal one is appended.
    Placeholder,
}

impl SceneClass {
    pub fn name(&self) -> &str {
        match self {
            SceneClass::Based(name) | SceneClass::BestGuess(name) => name,
            SceneClass::Placeholder => CANONICAL_SCENE_NAME,
        }
    }
}

/// Scan the *original* tree, level by level, for the scene class.
pub fn identify(module: &Module, vocabulary: &Vocabulary) -> SceneClass {
    let classes = classes(module);

    if let Some(class) = classes.iter().find(|class| derives_scene(class, vocabulary)) {
        debug!("scene class is `{}`", class.name);
        return SceneClass::Based(class.name.clone());
    }

    match classes.first() {
        Some(class) => {
            warn!("no class derives from {:?}; using `{}`", vocabulary.scene_bases, class.name);
            SceneClass::BestGuess(class.name.clone())
        }
        None => {
            warn!("script defines no class; adding `{CANONICAL_SCENE_NAME}`");
            SceneClass::Placeholder
        }
    }
}

/// Rename the scene class in the *rewritten* tree.
///
/// Returns whether some class now carries the canonical name. A scene
/// class removed by truncation leaves the tree as it is.
pub fn rename(module: &mut Module, scene: &SceneClass) -> bool {
    match scene {
        SceneClass::Based(name) | SceneClass::BestGuess(name) => {
            let renamed = rename_first(module, name, CANONICAL_SCENE_NAME);
            if !renamed {
                warn!("scene class `{name}` did not survive the cut");
            }
            renamed
        }
        SceneClass::Placeholder => {
            module.body.push(Stmt::ClassDef(placeholder()));
            true
        }
    }
}

fn derives_scene(class: &ClassDef, vocabulary: &Vocabulary) -> bool {
    class.bases.iter().flatten().any(|base| {
        matches!(base, Arg::Positional(Expr::Name { id, .. }) if vocabulary.is_scene_base(id))
    })
}

/// `class TempScene(Scene): pass`
fn placeholder() -> ClassDef {
    ClassDef {
        decorators: Vec::new(),
        name: CANONICAL_SCENE_NAME.to_string(),
        type_params: None,
        bases: Some(vec![Arg::Positional(Expr::name(PLACEHOLDER_BASE))]),
        body: Vec::new(),
        pos: Pos::default(),
    }
}

/// Every class definition, breadth-first.
fn classes(module: &Module) -> Vec<&ClassDef> {
    let mut found = Vec::new();
    let mut queue: VecDeque<&Vec<Stmt>> = VecDeque::from([&module.body]);
    while let Some(body) = queue.pop_front() {
        for stmt in body {
            match stmt {
                Stmt::ClassDef(class) => {
                    found.push(class);
                    queue.push_back(&class.body);
                }
                Stmt::Block(block) => queue.extend(block.clauses.iter().map(|c| &c.body)),
                _ => {}
            }
        }
    }
    found
}

fn rename_first(module: &mut Module, from: &str, to: &str) -> bool {
    let mut queue: VecDeque<&mut Vec<Stmt>> = VecDeque::from([&mut module.body]);
    while let Some(body) = queue.pop_front() {
        for stmt in body {
            match stmt {
                Stmt::ClassDef(class) if class.name == from => {
                    class.name = to.to_string();
                    return true;
                }
                Stmt::ClassDef(class) => queue.push_back(&mut class.body),
                Stmt::Block(block) => queue.extend(block.clauses.iter_mut().map(|c| &mut c.body)),
                _ => {}
            }
        }
    }
    false
}
