// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Every field has a default matching the source authoring templates, so a
//! partial RON file only needs to name what it changes.

use crate::replicator::ReplicationTemplate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use texprep_graph::library;
use texprep_graph::PropertyValue;

/// Pixels per physical unit used to derive the material's physical size
pub const DEFAULT_PIXELS_PER_UNIT: f32 = 236.22;

/// Configuration file looked up next to the graph
pub const CONFIG_FILE_NAME: &str = "texprep.ron";

/// Configuration for the cleanup, displacement, naming and replication passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output labels whose source chains are removed
    pub obsolete_outputs: Vec<String>,
    /// Obsolete output whose position anchors the displacement sink
    pub anchor_label: String,
    /// Label of the normal output driving displacement
    pub normal_label: String,
    /// Type key of placeholder transforms
    pub placeholder_type: String,
    /// Template replacing placeholder transforms
    pub safe_transform: String,
    /// Inputs written on each spliced safe transform
    pub safe_transform_settings: IndexMap<String, PropertyValue>,
    /// Type key of the adapter inserted for grayscale producers
    pub adapter_type: String,
    /// Boolean producer input deciding adapter insertion
    pub adapter_switch: String,
    /// Normal intensity template
    pub normal_intensity: String,
    /// Normal to height template
    pub normal_to_height: String,
    /// Inputs written on the normal to height node
    pub normal_to_height_settings: IndexMap<String, PropertyValue>,
    /// Tags applied to the displacement sink
    pub displacement: DisplacementTags,
    /// Channel label to export code
    pub channel_codes: IndexMap<String, String>,
    /// Pixels per physical unit
    pub pixels_per_unit: f32,
    /// Procedural spread constants
    pub spread: SpreadConfig,
    /// Replication strategy
    pub replication: ReplicationTemplate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            obsolete_outputs: vec![
                "Height".to_string(),
                "Specular Level".to_string(),
                "Ambient Occlusion".to_string(),
            ],
            anchor_label: "Height".to_string(),
            normal_label: "Normal".to_string(),
            placeholder_type: library::TRANSFORM_2D.to_string(),
            safe_transform: library::SAFE_TRANSFORM.to_string(),
            safe_transform_settings: IndexMap::from([("tile".to_string(), PropertyValue::Int(4))]),
            adapter_type: library::GRADIENT.to_string(),
            adapter_switch: "colorswitch".to_string(),
            normal_intensity: library::NORMAL_INTENSITY.to_string(),
            normal_to_height: library::NORMAL_TO_HEIGHT.to_string(),
            normal_to_height_settings: IndexMap::from([
                ("relief_balance".to_string(), PropertyValue::Float(1.0)),
                ("height_normalize".to_string(), PropertyValue::Bool(true)),
            ]),
            displacement: DisplacementTags::default(),
            channel_codes: default_channel_codes(),
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            spread: SpreadConfig::default(),
            replication: ReplicationTemplate::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Load `texprep.ron` from `dir`, or the defaults when there is none
    pub fn discover(dir: &Path) -> std::io::Result<Self> {
        let path = Self::config_file_path(dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Path of the configuration file in `dir`
    pub fn config_file_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}

/// Export codes for the standard material channels
pub fn default_channel_codes() -> IndexMap<String, String> {
    [
        ("Base Color", "BASE"),
        ("Metallic", "MTL"),
        ("Displacement", "DISP"),
        ("Normal", "NRM"),
        ("Roughness", "ROUGH"),
        ("Opacity", "ALPHA"),
    ]
    .into_iter()
    .map(|(label, code)| (label.to_string(), code.to_string()))
    .collect()
}

/// Annotations written on the generated displacement sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementTags {
    /// Label
    pub label: String,
    /// Export identifier
    pub identifier: String,
    /// Group
    pub group: String,
    /// Usage name
    pub usage: String,
    /// Usage components
    pub components: String,
}

impl Default for DisplacementTags {
    fn default() -> Self {
        Self {
            label: "Displacement".to_string(),
            identifier: "DISP".to_string(),
            group: "Material".to_string(),
            usage: "displacement".to_string(),
            components: "RGBA".to_string(),
        }
    }
}

/// Saturation and value of the procedural hue spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Saturation
    pub saturation: f64,
    /// Value
    pub value: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            saturation: 0.25,
            value: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EngineConfig = ron::from_str("(normal_label: \"Normal Map\", safe_transform_settings: { \"tile\": Int(2) })").unwrap();
        assert_eq!(config.normal_label, "Normal Map");
        assert_eq!(config.safe_transform_settings["tile"], PropertyValue::Int(2));
        assert_eq!(config.channel_codes["Roughness"], "ROUGH");
        assert_eq!(config.anchor_label, "Height");
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = std::env::temp_dir().join("texprep-config-missing");
        let config = EngineConfig::discover(&dir).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("texprep-config-{}.ron", std::process::id()));
        let mut config = EngineConfig::default();
        config.normal_label = "Normal Map".to_string();
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_round_trip() {
        let config = EngineConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: EngineConfig = ron::from_str(&text).unwrap();
        assert_eq!(loaded, config);
    }
}
