use glam::Vec3;
use serde::{Deserialize, Serialize};
use spiderscene_common::Rgb;
use spiderscene_input::OrbitConfig;
use spiderscene_render::MaterialSpec;
use std::path::{Path, PathBuf};

use crate::lifecycle::RevealTimings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {} (expected .yaml, .yml or .json)", .0.display())]
    UnknownFormat(PathBuf),
}

/// One posable spider: the model child it drives, its material and its spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiderConfig {
    /// Name of a direct child of the model root.
    pub node: String,
    /// Radians per second around Y.
    pub rotation_rate: f32,
    #[serde(flatten)]
    pub material: MaterialSpec,
}

impl SpiderConfig {
    fn defaults() -> Vec<SpiderConfig> {
        MaterialSpec::defaults()
            .into_iter()
            .zip([0.4, 0.3, 0.2])
            .enumerate()
            .map(|(i, (material, rotation_rate))| SpiderConfig {
                node: format!("Spider{}", i + 1),
                rotation_rate,
                material,
            })
            .collect()
    }
}

/// Everything the stage needs to set itself up. Every field has a default,
/// so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub model_path: PathBuf,
    /// Where a compressed-geometry decoder would live.
    pub decoder_path: PathBuf,
    /// Extra textures fetched alongside the model. They count towards load
    /// completion.
    pub textures: Vec<PathBuf>,
    pub model_scale: f32,
    /// Euler XYZ, radians.
    pub model_rotation: Vec3,
    pub clear_color: Rgb,
    pub camera: OrbitConfig,
    pub reveal: RevealTimings,
    pub spiders: Vec<SpiderConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("Model/spider.glb"),
            decoder_path: PathBuf::from("draco/"),
            textures: Vec::new(),
            model_scale: 1.0,
            model_rotation: Vec3::new(0.0, 0.5, 0.0),
            clear_color: Rgb::new(0x21 as f32 / 255.0, 0x2a as f32 / 255.0, 0x37 as f32 / 255.0),
            camera: OrbitConfig::default(),
            reveal: RevealTimings::default(),
            spiders: SpiderConfig::defaults(),
        }
    }
}

impl SceneConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match Format::of(path)? {
            Format::Yaml => Self::from_yaml(&text)?,
            Format::Json => serde_json::from_str(&text)?,
        };
        tracing::info!(path = %path.display(), spiders = config.spiders.len(), "loaded config");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match Format::of(path)? {
            Format::Yaml => self.to_yaml()?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document for a struct
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn materials(&self) -> Vec<MaterialSpec> {
        self.spiders.iter().map(|s| s.material.clone()).collect()
    }
}

enum Format {
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiderscene_render::ShaderProgram;

    #[test]
    fn defaults_match_the_shipped_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.model_path, PathBuf::from("Model/spider.glb"));
        assert_eq!(config.clear_color.to_hex(), "#212a37");
        assert_eq!(config.model_rotation, Vec3::new(0.0, 0.5, 0.0));

        let nodes: Vec<&str> = config.spiders.iter().map(|s| s.node.as_str()).collect();
        assert_eq!(nodes, vec!["Spider1", "Spider2", "Spider3"]);
        let rates: Vec<f32> = config.spiders.iter().map(|s| s.rotation_rate).collect();
        assert_eq!(rates, vec![0.4, 0.3, 0.2]);
        assert_eq!(config.spiders[0].material.program, ShaderProgram::Spider1);
        assert_eq!(config.spiders[2].material.program, ShaderProgram::Spider2);
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("Spider2"));
        assert_eq!(SceneConfig::from_yaml(&text).unwrap(), config);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = SceneConfig::from_yaml("model_scale: 2.5\nreveal:\n  panel_delay: 1.0\n").unwrap();
        assert_eq!(config.model_scale, 2.5);
        assert_eq!(config.reveal.panel_delay, 1.0);
        assert_eq!(config.reveal.fade_duration, 1.5);
        assert_eq!(config.spiders.len(), 3);
        assert_eq!(SceneConfig::from_yaml("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn spider_colors_are_hex_strings() {
        let yaml = r##"
spiders:
  - node: Legs
    rotation_rate: 1.0
    program: Spider2
    color: "#ffffff"
    shadow_color: "#000000"
    light_color: "#ff0000"
    shadow_repetitions: 10
    light_repetitions: 20
"##;
        let config = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.spiders.len(), 1);
        assert_eq!(config.spiders[0].node, "Legs");
        assert_eq!(config.spiders[0].material.light_color, Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SceneConfig::default();
        config.model_scale = 0.5;

        for name in ["scene.yaml", "scene.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(SceneConfig::load(&path).unwrap(), config);
        }

        let bad = dir.path().join("scene.toml");
        std::fs::write(&bad, "").unwrap();
        assert!(matches!(
            SceneConfig::load(&bad),
            Err(ConfigError::UnknownFormat(_))
        ));
    }
}
