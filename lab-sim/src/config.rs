use serde::{Deserialize, Serialize};

/// Fraction of the feet radius a ground hit may sit below the probe origin
/// and still count as support.
pub const GROUND_SNAP_TOLERANCE: f32 = 1.01;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error(
        "feet radius {feet_radius} never reaches a surface {resting_distance} below the ground probe origin"
    )]
    UnreachableGround {
        feet_radius: f32,
        resting_distance: f32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub gravity: f32,
    pub jump_impulse: f32,
    pub walk_speed: f32,
    pub sprint_multiplier: f32,
    pub ghost_speed_multiplier: f32,
    pub eye_height: f32,
    pub collision_height: f32,
    pub radius_buffer: f32,
    pub feet_radius: f32,
    pub max_step_height: f32,
    pub max_frame_dt: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            jump_impulse: 8.0,
            walk_speed: 8.0,
            sprint_multiplier: 1.5,
            ghost_speed_multiplier: 2.0,
            eye_height: 10.5,
            collision_height: 1.8,
            radius_buffer: 4.0,
            feet_radius: 3.2,
            max_step_height: 0.6,
            max_frame_dt: 0.05,
        }
    }
}

impl ControllerConfig {
    pub fn half_height(&self) -> f32 {
        self.collision_height * 0.5
    }

    /// Vertical offset from the collision volume centre to the eye.
    pub fn eye_offset(&self) -> f32 {
        self.eye_height - self.half_height()
    }

    pub fn clamp_frame_dt(&self, dt: f32) -> f32 {
        dt.clamp(0.0, self.max_frame_dt)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("gravity", self.gravity),
            ("walk_speed", self.walk_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("ghost_speed_multiplier", self.ghost_speed_multiplier),
            ("collision_height", self.collision_height),
            ("radius_buffer", self.radius_buffer),
            ("feet_radius", self.feet_radius),
            ("max_frame_dt", self.max_frame_dt),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("jump_impulse", self.jump_impulse),
            ("eye_height", self.eye_height),
            ("max_step_height", self.max_step_height),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }

        // The ground probe starts half a feet radius above the volume centre.
        let resting_distance = self.feet_radius * 0.5 + self.half_height();
        if resting_distance > self.feet_radius * GROUND_SNAP_TOLERANCE {
            return Err(ConfigError::UnreachableGround {
                feet_radius: self.feet_radius,
                resting_distance,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPieceConfig {
    pub interaction_distance: f32,
    pub tv_jitter: f32,
    pub steam_loop_duration: f32,
    pub steam_rise: f32,
    pub paper_fade_duration: f32,
    pub prop_gravity: f32,
    pub prop_restitution: f32,
    pub prop_rest_speed: f32,
    pub prop_max_drop: f32,
}

impl Default for SetPieceConfig {
    fn default() -> Self {
        Self {
            interaction_distance: 15.0,
            tv_jitter: 0.05,
            steam_loop_duration: 2.0,
            steam_rise: 10.0,
            paper_fade_duration: 1.0,
            prop_gravity: 20.0,
            prop_restitution: 0.25,
            prop_rest_speed: 0.5,
            prop_max_drop: 50.0,
        }
    }
}

impl SetPieceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("interaction_distance", self.interaction_distance),
            ("steam_loop_duration", self.steam_loop_duration),
            ("paper_fade_duration", self.paper_fade_duration),
            ("prop_gravity", self.prop_gravity),
            ("prop_max_drop", self.prop_max_drop),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("tv_jitter", self.tv_jitter),
            ("steam_rise", self.steam_rise),
            ("prop_restitution", self.prop_restitution),
            ("prop_rest_speed", self.prop_rest_speed),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ControllerConfig::default().validate(), Ok(()));
        assert_eq!(SetPieceConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{ "gravity": 9.81, "max_step_height": 0.4 }"#).unwrap();
        assert_eq!(config.gravity, 9.81);
        assert_eq!(config.max_step_height, 0.4);
        assert_eq!(config.jump_impulse, 8.0);
    }

    #[test]
    fn rejects_feet_radius_that_cannot_ground() {
        let config = ControllerConfig {
            feet_radius: 0.24,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnreachableGround { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_gravity() {
        let config = ControllerConfig {
            gravity: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "gravity",
                value: 0.0
            })
        );
    }

    #[test]
    fn frame_dt_is_capped() {
        let config = ControllerConfig::default();
        assert_eq!(config.clamp_frame_dt(0.5), 0.05);
        assert_eq!(config.clamp_frame_dt(0.016), 0.016);
        assert_eq!(config.clamp_frame_dt(-1.0), 0.0);
    }
}
