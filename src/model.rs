// names the downstream renderer relies on
pub const CANONICAL_SCENE_NAME: &str = "TempScene";
pub const PLACEHOLDER_BASE: &str = "Scene";

use crate::processor::ast::Module;
use crate::processor::scene::SceneClass;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Closed set of callee names the rewriter understands.
///
/// Anything outside these lists is dropped when it shows up in a
/// `self.play(...)` before the target line. Missing JSON fields fall back
/// to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vocabulary {
    /// Animations whose end state is "mobject is on screen" → `self.add`
    pub appearance: Vec<String>,
    /// Animations whose end state is "mobject is gone" → `self.remove`
    pub disappearance: Vec<String>,
    /// Base class names that mark the renderable scene
    pub scene_bases: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            appearance: names(&[
                "Create",
                "FadeIn",
                "ShowCreation",
                "Write",
                "DrawBorderThenFill",
                "GrowFromCenter",
            ]),
            disappearance: names(&["FadeOut", "Uncreate", "Unwrite", "ShrinkToCenter"]),
            scene_bases: names(&["Scene"]),
        }
    }
}

impl Vocabulary {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_appearance(&self, name: &str) -> bool {
        self.appearance.iter().any(|n| n == name)
    }

    pub fn is_disappearance(&self, name: &str) -> bool {
        self.disappearance.iter().any(|n| n == name)
    }

    pub fn is_scene_base(&self, name: &str) -> bool {
        self.scene_bases.iter().any(|n| n == name)
    }
}

/// Fully processed output handed to `writer`.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicedScript {
    pub module: Module,
    pub scene: SceneClass,
}
