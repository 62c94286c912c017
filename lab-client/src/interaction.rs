use bevy::prelude::*;
use lab_render::ControlLock;
use lab_sim::set_piece::InteractionAction;
use lab_sim::{RayTargets, SceneQuery, movement_axes};
use tracing::{debug, info};

use crate::config::LabConfig;
use crate::sim::{CurrentInput, InteractiveWorld, SimReady, SimState};

#[derive(Event, Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub object: String,
    pub action: InteractionAction,
}

/// Resolves what the camera is looking at. Only the nearest interactive box
/// within reach counts.
pub fn pick_interaction<Q: SceneQuery>(
    world: &Q,
    eye: Vec3,
    yaw: f32,
    pitch: f32,
    reach: f32,
) -> Option<String> {
    let (look, _) = movement_axes(yaw, pitch, true);
    world
        .nearest_hit(eye, look, reach, RayTargets::All)
        .map(|hit| hit.object)
}

pub fn interaction_system(
    input: Res<CurrentInput>,
    lock: Res<ControlLock>,
    sim_ready: Res<SimReady>,
    sim_state: Res<SimState>,
    interactive: Res<InteractiveWorld>,
    config: Res<LabConfig>,
    mut events: EventWriter<InteractionEvent>,
) {
    if !input.0.interact || !lock.locked || !sim_ready.0 {
        return;
    }

    let Some(object) = pick_interaction(
        &interactive.0,
        sim_state.current.eye,
        input.0.yaw,
        input.0.pitch,
        config.set_pieces.interaction_distance,
    ) else {
        debug!("interact: nothing in reach");
        return;
    };
    let Some(binding) = config.scene.binding_for(&object) else {
        return;
    };

    info!(object = %object, action = ?binding.action, "interaction");
    events.write(InteractionEvent {
        object,
        action: binding.action.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_sim::{Aabb, CollisionRegistry};

    fn world() -> CollisionRegistry {
        let mut registry = CollisionRegistry::new();
        registry.insert(
            "tv",
            Aabb::new(Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -5.0)),
        );
        registry.insert(
            "paper",
            Aabb::new(Vec3::new(-1.0, -1.0, -12.0), Vec3::new(1.0, 1.0, -11.0)),
        );
        registry
    }

    #[test]
    fn picks_nearest_in_view() {
        assert_eq!(
            pick_interaction(&world(), Vec3::ZERO, 0.0, 0.0, 15.0).as_deref(),
            Some("tv")
        );
    }

    #[test]
    fn respects_reach_and_direction() {
        assert!(pick_interaction(&world(), Vec3::ZERO, 0.0, 0.0, 4.0).is_none());
        // Facing +Z.
        assert!(
            pick_interaction(&world(), Vec3::ZERO, std::f32::consts::PI, 0.0, 15.0).is_none()
        );
        // Looking straight up passes over both boxes.
        assert!(pick_interaction(&world(), Vec3::ZERO, 0.0, 1.54, 15.0).is_none());
    }
}
