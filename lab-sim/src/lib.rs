//! Player movement and collision for the lab walkthrough, plus the scripted
//! set-piece state machines. Renderer agnostic: geometry is reached only
//! through [`SceneQuery`].

pub mod collision;
pub mod config;
pub mod movement;
pub mod set_piece;
pub mod types;

pub use collision::{Aabb, CollisionRegistry, CollisionVolume, RayHit, RayTargets, SceneQuery};
pub use config::{ConfigError, ControllerConfig, SetPieceConfig};
pub use movement::{
    SpawnAnchor, eye_position, ground_probe_distance, movement_axes, simulate_frame, spawn_state,
};
pub use types::{FrameEvents, InputState, PlayerSimState, SimContext, SimFrame};
