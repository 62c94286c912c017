use bevy::prelude::Resource;
use lab_sim::{CollisionRegistry, FrameEvents, InputState, SimContext};

#[derive(Debug, Default, Resource)]
pub struct CurrentInput(pub InputState);

#[derive(Debug, Default, Resource)]
pub struct SimState {
    pub current: SimContext,
}

/// Set once the lab scene is indexed and the player has spawned.
#[derive(Debug, Default, Resource)]
pub struct SimReady(pub bool);

/// Static volumes the controller collides with.
#[derive(Debug, Default, Resource)]
pub struct CollisionWorld(pub CollisionRegistry);

/// Bounds of the objects the player can use, picked by the interact ray.
#[derive(Debug, Default, Resource)]
pub struct InteractiveWorld(pub CollisionRegistry);

#[derive(Debug, Default, Resource)]
pub struct LastFrameEvents(pub FrameEvents);

#[derive(Debug, Default, Resource)]
pub struct DebugStats {
    pub jumps: u32,
    pub landings: u32,
    pub step_ups: u32,
    pub blocked_frames: u32,
}

#[derive(Debug, Default, Resource)]
pub struct DebugUiState {
    pub open: bool,
}
