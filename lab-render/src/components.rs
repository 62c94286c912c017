use bevy::prelude::*;

/// Root of the player rig. Its translation is the eye position and its
/// rotation carries the yaw.
#[derive(Component)]
pub struct Player;

/// Camera child of [`Player`]; its local rotation carries the pitch.
#[derive(Component)]
pub struct PlayerCamera;

#[derive(Component, Default, Clone, Copy)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
}
