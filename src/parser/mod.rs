//! Python front-end.
//!
//! tree-sitter does the actual parsing; `lower` turns its concrete tree
//! into the tagged tree of `processor::ast`.
mod lower;

use crate::processor::ast::Module;
use anyhow::{Result, anyhow, bail};
use log::debug;
use tree_sitter::{Node, Parser};

/// Parse a whole scene script.
///
/// tree-sitter recovers from bad input instead of failing, so the tree is
/// checked for `ERROR` / missing nodes and the first one is reported.
pub fn parse_script(source: &str) -> Result<Module> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| anyhow!("Failed to load Python grammar: {e}"))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("Failed to parse Python source"))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root)
            .map(|node| node.start_position().row + 1)
            .unwrap_or(1);
        bail!("invalid syntax at line {line}");
    }

    let module = lower::Lowering::new(source).module(root)?;
    debug!("parsed {} top-level statements", module.body.len());
    Ok(module)
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}
