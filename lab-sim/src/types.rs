use bevy::prelude::Vec3;

/// Held state of every logical action for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump: bool,
    pub descend: bool,
    pub ghost_toggle: bool,
    pub interact: bool,
    pub yaw: f32,
    pub pitch: f32,
    /// False while the pointer is released.
    pub active: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerSimState {
    /// Centre of the collision volume.
    pub pos: Vec3,
    pub vel: Vec3,
    pub grounded: bool,
    pub can_jump: bool,
}

impl Default for PlayerSimState {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            grounded: false,
            can_jump: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimContext {
    pub player: PlayerSimState,
    pub ghost: bool,
    pub ghost_toggle_held: bool,
    /// Camera position written by the last step.
    pub eye: Vec3,
}

impl SimContext {
    pub fn new(player: PlayerSimState) -> Self {
        Self {
            player,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameEvents {
    pub jumped: bool,
    pub landed: bool,
    pub stepped_up: bool,
    pub blocked: bool,
    pub ghost_toggled: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SimFrame {
    pub state: SimContext,
    pub events: FrameEvents,
}
