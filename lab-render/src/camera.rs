use bevy::prelude::*;

use crate::components::{LookAngles, Player, PlayerCamera};

#[derive(Resource, Debug, Clone)]
pub struct CameraSettings {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 20_000.0,
        }
    }
}

pub fn spawn_player(mut commands: Commands, settings: Res<CameraSettings>) {
    commands
        .spawn((
            Player,
            LookAngles::default(),
            Transform::default(),
            GlobalTransform::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                Camera3d::default(),
                PlayerCamera,
                Projection::from(PerspectiveProjection {
                    fov: settings.fov_deg.to_radians(),
                    near: settings.near,
                    far: settings.far,
                    ..default()
                }),
                Transform::default(),
            ));
        });
}
