// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed node properties: inputs, outputs and annotations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyCategory {
    /// Input property (accepts at most one connection)
    Input,
    /// Output property (may fan out)
    Output,
    /// Non-functional metadata consumed by export tooling
    Annotation,
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

/// Declared value type of a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Pair of integers
    Int2,
    /// Floating point value
    Float,
    /// 2D float vector
    Float2,
    /// 3D float vector
    Float3,
    /// RGBA color
    Color,
    /// String value
    String,
    /// Image stream; connectable, carries no literal value
    Image,
    /// Named structure
    Struct(String),
    /// Homogeneous array
    Array(Box<ValueType>),
    /// Usage tag for export tooling
    Usage,
}

impl ValueType {
    /// Whether connections may carry this type
    pub fn is_connectable(&self) -> bool {
        matches!(self, Self::Image)
    }

    /// Check if an output of this type can feed an input of `other`
    pub fn can_connect_to(&self, other: &ValueType) -> bool {
        self.is_connectable() && self == other
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Int2 => f.write_str("int2"),
            Self::Float => f.write_str("float"),
            Self::Float2 => f.write_str("float2"),
            Self::Float3 => f.write_str("float3"),
            Self::Color => f.write_str("color"),
            Self::String => f.write_str("string"),
            Self::Image => f.write_str("image"),
            Self::Struct(name) => write!(f, "struct {name}"),
            Self::Array(element) => write!(f, "array<{element}>"),
            Self::Usage => f.write_str("usage"),
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Rgba {
    /// Create a color from all four channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// Usage tag marking an output's channel role for export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Channel role, e.g. `displacement`
    pub name: String,
    /// Components the role reads, e.g. `RGBA`
    pub components: String,
    /// Color space, empty for the default
    #[serde(default)]
    pub color_space: String,
}

impl Usage {
    /// Create a usage tag in the default color space
    pub fn new(name: impl Into<String>, components: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: components.into(),
            color_space: String::new(),
        }
    }
}

/// Value of a named structure type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructValue {
    /// Structure type name
    pub type_name: String,
    /// Field values in declaration order
    pub fields: IndexMap<String, PropertyValue>,
}

impl StructValue {
    /// Create an empty structure value
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field
    pub fn with_field(mut self, id: impl Into<String>, value: PropertyValue) -> Self {
        self.fields.insert(id.into(), value);
        self
    }
}

/// Value that can be stored in a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Pair of integers
    Int2([i32; 2]),
    /// Float
    Float(f32),
    /// 2D vector
    Float2([f32; 2]),
    /// 3D vector
    Float3([f32; 3]),
    /// Color
    Color(Rgba),
    /// String
    String(String),
    /// Structure
    Struct(StructValue),
    /// Array of values
    Array(Vec<PropertyValue>),
    /// Usage tag
    Usage(Usage),
}

impl PropertyValue {
    /// Check the value against a declared type
    pub fn matches(&self, value_type: &ValueType) -> bool {
        match (self, value_type) {
            (Self::Bool(_), ValueType::Bool)
            | (Self::Int(_), ValueType::Int)
            | (Self::Int2(_), ValueType::Int2)
            | (Self::Float(_), ValueType::Float)
            | (Self::Float2(_), ValueType::Float2)
            | (Self::Float3(_), ValueType::Float3)
            | (Self::Color(_), ValueType::Color)
            | (Self::String(_), ValueType::String)
            | (Self::Usage(_), ValueType::Usage) => true,
            (Self::Struct(value), ValueType::Struct(name)) => value.type_name == *name,
            (Self::Array(items), ValueType::Array(element)) => {
                items.iter().all(|item| item.matches(element))
            }
            _ => false,
        }
    }

    /// Short name of the value's kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int2(_) => "int2",
            Self::Float(_) => "float",
            Self::Float2(_) => "float2",
            Self::Float3(_) => "float3",
            Self::Color(_) => "color",
            Self::String(_) => "string",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
            Self::Usage(_) => "usage",
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer pair payload
    pub fn as_int2(&self) -> Option<[i32; 2]> {
        match self {
            Self::Int2(value) => Some(*value),
            _ => None,
        }
    }

    /// Color payload
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(value) => Some(*value),
            _ => None,
        }
    }

    /// Array payload
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// A property on a node: its schema entry plus its current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Identifier, unique within the node
    pub id: String,
    /// Category
    pub category: PropertyCategory,
    /// Declared type
    pub value_type: ValueType,
    /// Current value (`None` for unset values and image streams)
    pub value: Option<PropertyValue>,
}

impl Property {
    /// Create a new property
    pub fn new(id: impl Into<String>, category: PropertyCategory, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            category,
            value_type,
            value: None,
        }
    }

    /// Create an input property
    pub fn input(id: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(id, PropertyCategory::Input, value_type)
    }

    /// Create an output property
    pub fn output(id: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(id, PropertyCategory::Output, value_type)
    }

    /// Create an annotation property
    pub fn annotation(id: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(id, PropertyCategory::Annotation, value_type)
    }

    /// Set the initial value
    pub fn with_default(mut self, value: PropertyValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether connections may attach to this property
    pub fn is_connectable(&self) -> bool {
        self.category != PropertyCategory::Annotation && self.value_type.is_connectable()
    }

    /// Check if this property may feed `other`
    pub fn can_connect(&self, other: &Property) -> bool {
        self.category == PropertyCategory::Output
            && other.category == PropertyCategory::Input
            && self.value_type.can_connect_to(&other.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_matches_declared_type() {
        assert!(PropertyValue::Bool(true).matches(&ValueType::Bool));
        assert!(!PropertyValue::Int(4).matches(&ValueType::Float));

        let usages = ValueType::Array(Box::new(ValueType::Usage));
        let value = PropertyValue::Array(vec![PropertyValue::Usage(Usage::new("normal", "RGBA"))]);
        assert!(value.matches(&usages));
        assert!(!PropertyValue::Array(vec![PropertyValue::Int(1)]).matches(&usages));
        assert!(PropertyValue::Array(Vec::new()).matches(&usages));
    }

    #[test]
    fn test_struct_type_name_must_match() {
        let key = StructValue::new("gradient_key_rgba").with_field("position", PropertyValue::Float(0.0));
        let value = PropertyValue::Struct(key);
        assert!(value.matches(&ValueType::Struct("gradient_key_rgba".to_string())));
        assert!(!value.matches(&ValueType::Struct("other".to_string())));
    }

    #[test]
    fn test_only_images_connect() {
        let out = Property::output("out", ValueType::Image);
        let inp = Property::input("in", ValueType::Image);
        let tile = Property::input("tile", ValueType::Int);
        assert!(out.can_connect(&inp));
        assert!(!inp.can_connect(&out));
        assert!(!out.can_connect(&tile));
    }
}
