use bevy::prelude::*;

mod camera;
mod components;
pub mod input;
mod world;

pub use camera::CameraSettings;
pub use components::{LookAngles, Player, PlayerCamera};
pub use input::ControlLock;
pub use world::SceneSettings;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<world::SceneSettings>()
            .init_resource::<camera::CameraSettings>()
            .init_resource::<input::ControlLock>()
            .add_systems(Startup, (world::setup_world, camera::spawn_player))
            .add_systems(
                Update,
                (input::update_control_lock, input::apply_cursor_lock).chain(),
            );
    }
}
