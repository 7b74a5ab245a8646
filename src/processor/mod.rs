//! The functional core: cut the tree at the target line, replay earlier
//! animations as instant calls, rename the scene class.
pub mod ast;
pub mod patterns;
pub mod rewriter;
pub mod scene;

use crate::model::{SlicedScript, Vocabulary};
use anyhow::Result;
use ast::Module;
use log::info;
use rewriter::Rewriter;

/// Runs every processing pass and returns a read-only structure for writers.
pub fn run(module: Module, target_line: usize, vocabulary: &Vocabulary) -> Result<SlicedScript> {
    // the scene is picked on the tree as written, before anything is cut
    let scene = scene::identify(&module, vocabulary);

    let before = module.body.len();
    let mut module = Rewriter::new(target_line, vocabulary).rewrite(module);
    info!(
        "cut at line {target_line}: {before} top-level statements in, {} out",
        module.body.len()
    );

    scene::rename(&mut module, &scene);

    Ok(SlicedScript { module, scene })
}
