use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;
use lab_sim::movement_axes;
use tracing::{debug, info, warn};

use crate::config::LabConfig;
use crate::sim::{CurrentInput, SimReady, SimState};

const FALLBACK_RADIUS: f32 = 2.0;
const FALLBACK_LIFT: f32 = 3.0;

#[derive(Component)]
pub struct Companion;

#[derive(Component, Clone)]
pub struct CompanionAnimation {
    graph: Handle<AnimationGraph>,
    node: AnimationNodeIndex,
}

#[derive(Resource, Default)]
pub struct CompanionState {
    pub gltf: Handle<Gltf>,
    pub spawned: bool,
}

/// In front of the eye along the flattened look axis, level with the
/// player's collision centre.
pub fn companion_position(eye: Vec3, player_pos: Vec3, yaw: f32, distance: f32) -> Vec3 {
    let (forward, _) = movement_axes(yaw, 0.0, false);
    let mut target = eye + forward * distance;
    target.y = player_pos.y;
    target
}

pub fn load_companion(
    asset_server: Res<AssetServer>,
    config: Res<LabConfig>,
    mut state: ResMut<CompanionState>,
) {
    info!(path = %config.assets.companion, "loading companion");
    state.gltf = asset_server.load(config.assets.companion.clone());
}

pub fn spawn_companion_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<LabConfig>,
    sim_ready: Res<SimReady>,
    sim_state: Res<SimState>,
    input: Res<CurrentInput>,
    gltfs: Res<Assets<Gltf>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut state: ResMut<CompanionState>,
) {
    if state.spawned || !sim_ready.0 {
        return;
    }
    let ctx = sim_state.current;
    let position = companion_position(
        ctx.eye,
        ctx.player.pos,
        input.0.yaw,
        config.scene.companion_distance,
    );

    let scene = match gltfs.get(&state.gltf) {
        Some(gltf) => gltf
            .default_scene
            .clone()
            .or_else(|| gltf.scenes.first().cloned())
            .map(|scene| (scene, gltf.animations.first().cloned())),
        None if matches!(asset_server.load_state(&state.gltf), LoadState::Failed(_)) => None,
        None => return,
    };
    state.spawned = true;

    let Some((scene, clip)) = scene else {
        warn!(path = %config.assets.companion, "companion unavailable, spawning fallback sphere");
        commands.spawn((
            Companion,
            Mesh3d(meshes.add(Sphere::new(FALLBACK_RADIUS))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb_u8(0x00, 0x00, 0xff),
                emissive: Color::srgb_u8(0x00, 0x00, 0x44).to_linear(),
                ..default()
            })),
            Transform::from_translation(position + Vec3::Y * FALLBACK_LIFT),
        ));
        return;
    };

    let mut companion = commands.spawn((
        Companion,
        SceneRoot(scene),
        Transform::from_translation(position)
            .with_scale(Vec3::splat(config.scene.companion_scale)),
    ));
    match clip {
        Some(clip) => {
            let (graph, node) = AnimationGraph::from_clip(clip);
            companion.insert(CompanionAnimation {
                graph: graphs.add(graph),
                node,
            });
            companion.observe(start_companion_animation);
        }
        None => debug!("companion has no animation clips"),
    }
    info!(pos = ?position, "companion spawned");
}

fn start_companion_animation(
    trigger: Trigger<SceneInstanceReady>,
    mut commands: Commands,
    animations: Query<&CompanionAnimation>,
    children: Query<&Children>,
    mut players: Query<&mut AnimationPlayer>,
) {
    let root = trigger.target();
    let Ok(animation) = animations.get(root) else {
        return;
    };
    for entity in children.iter_descendants(root) {
        if let Ok(mut player) = players.get_mut(entity) {
            player.play(animation.node).repeat();
            commands
                .entity(entity)
                .insert(AnimationGraphHandle(animation.graph.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_stands_ahead_at_player_height() {
        let eye = Vec3::new(1.0, 10.5, 2.0);
        let pos = Vec3::new(1.0, 0.9, 2.0);
        let at = companion_position(eye, pos, 0.0, 15.0);
        assert_eq!(at, Vec3::new(1.0, 0.9, -13.0));

        let quarter = companion_position(eye, pos, std::f32::consts::FRAC_PI_2, 15.0);
        assert!((quarter.x - -14.0).abs() < 1e-4);
        assert!((quarter.z - 2.0).abs() < 1e-4);
    }
}
