// SPDX-License-Identifier: MIT OR Apache-2.0
//! Template resources instantiated as single nodes.

use super::{COLOR_MATCH, NORMAL_INTENSITY, NORMAL_TO_HEIGHT, SAFE_TRANSFORM};
use crate::node::{NodeCategory, NodeDefinition};
use crate::property::{Property, PropertyValue, ValueType};

fn template(id: &str, name: &str, description: &str, inputs: Vec<Property>, output: &str) -> NodeDefinition {
    NodeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        category: NodeCategory::Instance,
        description: description.to_string(),
        inputs,
        outputs: vec![Property::output(output, ValueType::Image)],
        annotations: vec![Property::annotation("label", ValueType::String)],
    }
}

pub(super) fn template_nodes() -> Vec<NodeDefinition> {
    vec![
        template(
            SAFE_TRANSFORM,
            "Safe Transform",
            "Tiling-safe transform",
            vec![
                Property::input("input", ValueType::Image),
                Property::input("tile", ValueType::Int).with_default(PropertyValue::Int(1)),
            ],
            "output",
        ),
        template(
            NORMAL_TO_HEIGHT,
            "Normal to Height HQ",
            "Reconstructs a height map from a normal map",
            vec![
                Property::input("normal", ValueType::Image),
                Property::input("relief_balance", ValueType::Float).with_default(PropertyValue::Float(0.5)),
                Property::input("height_normalize", ValueType::Bool).with_default(PropertyValue::Bool(false)),
            ],
            "height",
        ),
        template(
            NORMAL_INTENSITY,
            "Normal Intensity",
            "Scales normal map strength",
            vec![
                Property::input("input", ValueType::Image),
                Property::input("intensity", ValueType::Float).with_default(PropertyValue::Float(1.0)),
            ],
            "output",
        ),
        template(
            COLOR_MATCH,
            "Color Match",
            "Shifts the input's average color to a target color",
            vec![
                Property::input("input", ValueType::Image),
                Property::input("input_target_color", ValueType::Image),
                Property::input("target_color_mode", ValueType::Int).with_default(PropertyValue::Int(0)),
                Property::input("use_mask", ValueType::Bool).with_default(PropertyValue::Bool(true)),
            ],
            "output",
        ),
    ]
}
