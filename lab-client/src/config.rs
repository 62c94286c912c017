use std::path::{Path, PathBuf};

use bevy::prelude::{Resource, Vec3};
use lab_sim::set_piece::InteractionAction;
use lab_sim::{ConfigError, ControllerConfig, SetPieceConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub lab_scene: String,
    pub companion: String,
    pub tv_static: String,
    pub paper_print: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            lab_scene: "EDGEHOG ISLAND LABOLATORY.glb".to_string(),
            companion: "sonic_spinning/scene.gltf".to_string(),
            tv_static: "television.jpeg".to_string(),
            paper_print: "kertasprint.jpeg".to_string(),
        }
    }
}

/// Maps a picked scene object to what happens when it is used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionBinding {
    pub object: String,
    #[serde(flatten)]
    pub action: InteractionAction,
}

impl InteractionBinding {
    fn new(object: &str, action: InteractionAction) -> Self {
        Self {
            object: object.to_string(),
            action,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    pub model_scale: f32,
    pub spawn_anchor: String,
    pub fallback_spawn: [f32; 3],
    /// Objects whose world bounds enter the collision registry.
    pub collidable: Vec<String>,
    pub tv_screen: String,
    pub steam: String,
    pub paper: String,
    pub interactions: Vec<InteractionBinding>,
    pub companion_distance: f32,
    pub companion_scale: f32,
}

impl Default for SceneLayout {
    fn default() -> Self {
        let collidable = [
            "Object_13108",
            "Object_13105",
            "Object_22",
            "Object_23",
            "Object_14",
            "Object_15",
            "Object_16",
            "Object_18",
            "Object_6",
            "Object_20",
            "Object_25",
            "Object_24",
        ];
        Self {
            model_scale: 0.05,
            spawn_anchor: "Object_6".to_string(),
            fallback_spawn: [0.0, 0.9, 5.0],
            collidable: collidable.iter().map(|s| s.to_string()).collect(),
            tv_screen: "Object_13105".to_string(),
            steam: "Object_17".to_string(),
            paper: "Object_23045".to_string(),
            interactions: vec![
                InteractionBinding::new("Object_13108", InteractionAction::ToggleTv),
                InteractionBinding::new("Object_23", InteractionAction::TogglePaper),
                InteractionBinding::new("Object_23025", InteractionAction::TogglePaper),
                InteractionBinding::new("Object_18", InteractionAction::ToggleSteam),
                InteractionBinding::new(
                    "Object_24",
                    InteractionAction::DropProps {
                        props: vec!["Object_24".to_string()],
                    },
                ),
            ],
            companion_distance: 15.0,
            companion_scale: 5.0,
        }
    }
}

impl SceneLayout {
    pub fn fallback_spawn(&self) -> Vec3 {
        Vec3::from_array(self.fallback_spawn)
    }

    pub fn binding_for(&self, object: &str) -> Option<&InteractionBinding> {
        self.interactions.iter().find(|b| b.object == object)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("scene.model_scale", self.model_scale),
            ("scene.companion_scale", self.companion_scale),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.companion_distance < 0.0 || !self.companion_distance.is_finite() {
            return Err(ConfigError::Negative {
                field: "scene.companion_distance",
                value: self.companion_distance,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub assets: AssetPaths,
    pub scene: SceneLayout,
    pub controller: ControllerConfig,
    pub set_pieces: SetPieceConfig,
}

impl LabConfig {
    /// Defaults when `path` is `None`; otherwise the file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.set_pieces.validate()?;
        self.scene.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lab-client-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_load_without_file() {
        let config = LabConfig::load(None).unwrap();
        assert_eq!(config.scene.collidable.len(), 12);
        assert_eq!(config.scene.fallback_spawn(), Vec3::new(0.0, 0.9, 5.0));
        assert_eq!(
            config.scene.binding_for("Object_23025").map(|b| &b.action),
            Some(&InteractionAction::TogglePaper)
        );
        assert!(config.scene.binding_for("Object_17").is_none());
    }

    #[test]
    fn partial_file_overrides_nested_fields() {
        let path = write_temp(
            "partial.json",
            r#"{
                "controller": { "walk_speed": 6.0 },
                "scene": {
                    "spawn_anchor": "Object_99",
                    "interactions": [
                        { "object": "Object_1", "action": "toggle_steam" },
                        { "object": "Object_2", "action": "drop_props", "props": ["Object_3"] }
                    ]
                }
            }"#,
        );
        let config = LabConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.controller.walk_speed, 6.0);
        assert_eq!(config.controller.gravity, 20.0);
        assert_eq!(config.scene.spawn_anchor, "Object_99");
        assert_eq!(config.scene.model_scale, 0.05);
        assert_eq!(config.scene.interactions.len(), 2);
        assert_eq!(
            config.scene.binding_for("Object_2").map(|b| &b.action),
            Some(&InteractionAction::DropProps {
                props: vec!["Object_3".to_string()]
            })
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LabConfig::load(Some(Path::new("/nonexistent/lab.json"))).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/lab.json"));
    }

    #[test]
    fn malformed_json_reports_path() {
        let path = write_temp("broken.json", "{ \"controller\": ");
        let err = LabConfig::load(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = write_temp("invalid.json", r#"{ "scene": { "model_scale": 0.0 } }"#);
        let err = LabConfig::load(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigError::NonPositive {
                field: "scene.model_scale",
                ..
            })
        ));
    }
}
