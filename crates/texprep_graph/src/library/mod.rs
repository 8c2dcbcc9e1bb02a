// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in compositing definitions and template resources.

mod compositing;
mod templates;

use crate::node::NodeRegistry;

/// Bitmap source
pub const BITMAP: &str = "bitmap";
/// Uniform color source
pub const UNIFORM_COLOR: &str = "uniform-color";
/// Gradient map filter
pub const GRADIENT: &str = "gradient";
/// Levels filter
pub const LEVELS: &str = "levels";
/// Placeholder 2D transform
pub const TRANSFORM_2D: &str = "transform-2d";
/// Output sink
pub const OUTPUT_SINK: &str = "output-sink";

/// Tiling-safe transform template
pub const SAFE_TRANSFORM: &str = "safe-transform";
/// Normal to height template
pub const NORMAL_TO_HEIGHT: &str = "normal-to-height";
/// Normal intensity template
pub const NORMAL_INTENSITY: &str = "normal-intensity";
/// Color match template
pub const COLOR_MATCH: &str = "color-match";

/// Structure type of a gradient key
pub const GRADIENT_KEY: &str = "gradient_key_rgba";

/// Create a registry holding every built-in definition and template
pub fn create_compositing_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for definition in compositing::compositing_nodes().into_iter().chain(templates::template_nodes()) {
        registry.register(definition);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCategory;

    #[test]
    fn test_registry_contents() {
        let registry = create_compositing_registry();
        for key in [BITMAP, UNIFORM_COLOR, GRADIENT, LEVELS, TRANSFORM_2D, OUTPUT_SINK] {
            assert!(registry.get(key).is_some(), "missing {key}");
        }
        let templates: Vec<_> = registry
            .definitions_in_category(NodeCategory::Instance)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(templates, [SAFE_TRANSFORM, NORMAL_TO_HEIGHT, NORMAL_INTENSITY, COLOR_MATCH]);
    }
}
