// SPDX-License-Identifier: MIT OR Apache-2.0
//! Atomic compositing nodes.

use super::{BITMAP, GRADIENT, GRADIENT_KEY, LEVELS, OUTPUT_SINK, TRANSFORM_2D, UNIFORM_COLOR};
use crate::node::{NodeCategory, NodeDefinition};
use crate::property::{Property, PropertyValue, Rgba, ValueType};

fn image_out() -> Property {
    Property::output("unique_filter_output", ValueType::Image)
}

fn label() -> Property {
    Property::annotation("label", ValueType::String)
}

fn filter(id: &str, name: &str, description: &str, extra: Vec<Property>) -> NodeDefinition {
    let mut inputs = vec![Property::input("input1", ValueType::Image)];
    inputs.extend(extra);
    NodeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        category: NodeCategory::Filter,
        description: description.to_string(),
        inputs,
        outputs: vec![image_out()],
        annotations: vec![label()],
    }
}

pub(super) fn compositing_nodes() -> Vec<NodeDefinition> {
    vec![
        // ====================================================================
        // Sources
        // ====================================================================
        NodeDefinition {
            id: BITMAP.to_string(),
            name: "Bitmap".to_string(),
            category: NodeCategory::Input,
            description: "Imported bitmap resource".to_string(),
            inputs: vec![
                // log2 of the output size, 12 = 4096 px
                Property::input("$outputsize", ValueType::Int2).with_default(PropertyValue::Int2([11, 11])),
                Property::input("colorswitch", ValueType::Bool).with_default(PropertyValue::Bool(true)),
                Property::input("resource_path", ValueType::String),
            ],
            outputs: vec![image_out()],
            annotations: vec![label()],
        },
        NodeDefinition {
            id: UNIFORM_COLOR.to_string(),
            name: "Uniform Color".to_string(),
            category: NodeCategory::Input,
            description: "Constant color fill".to_string(),
            inputs: vec![
                Property::input("outputcolor", ValueType::Color)
                    .with_default(PropertyValue::Color(Rgba::rgb(0.0, 0.0, 0.0))),
                Property::input("colorswitch", ValueType::Bool).with_default(PropertyValue::Bool(true)),
            ],
            outputs: vec![image_out()],
            annotations: vec![label()],
        },
        // ====================================================================
        // Filters
        // ====================================================================
        filter(
            GRADIENT,
            "Gradient Map",
            "Maps grayscale input onto a color gradient",
            vec![Property::input(
                "gradientrgba",
                ValueType::Array(Box::new(ValueType::Struct(GRADIENT_KEY.to_string()))),
            )],
        ),
        filter(LEVELS, "Levels", "Input/output range adjustment", Vec::new()),
        filter(
            TRANSFORM_2D,
            "Transformation 2D",
            "Affine transform left behind by scan exports",
            Vec::new(),
        ),
        // ====================================================================
        // Outputs
        // ====================================================================
        NodeDefinition {
            id: OUTPUT_SINK.to_string(),
            name: "Output".to_string(),
            category: NodeCategory::Output,
            description: "Exported material channel".to_string(),
            inputs: vec![Property::input("inputNodeOutput", ValueType::Image)],
            outputs: Vec::new(),
            annotations: vec![
                label(),
                Property::annotation("identifier", ValueType::String),
                Property::annotation("group", ValueType::String),
                Property::annotation("usages", ValueType::Array(Box::new(ValueType::Usage)))
                    .with_default(PropertyValue::Array(Vec::new())),
            ],
        },
    ]
}
