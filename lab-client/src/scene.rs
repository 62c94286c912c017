use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::gltf::{Gltf, GltfAssetLabel};
use bevy::prelude::*;
use bevy::render::primitives::Aabb as MeshAabb;
use bevy::scene::SceneInstanceReady;
use lab_sim::{Aabb, CollisionRegistry, SimContext, SpawnAnchor, eye_position, spawn_state};
use tracing::{debug, error, info, warn};

use crate::config::LabConfig;
use crate::sim::{CollisionWorld, InteractiveWorld, SimReady, SimState};

#[derive(Component)]
pub struct LabScene;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LabSceneStage {
    #[default]
    Loading,
    Spawned,
    Indexed,
}

#[derive(Resource, Default)]
pub struct LabSceneState {
    pub gltf: Handle<Gltf>,
    pub stage: LabSceneStage,
}

/// glTF node names under the lab scene. First match wins on duplicates.
#[derive(Resource, Default, Debug)]
pub struct NamedNodes(pub HashMap<String, Entity>);

impl NamedNodes {
    pub fn get(&self, name: &str) -> Option<Entity> {
        self.0.get(name).copied()
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LabSceneIndexed;

pub fn spawn_lab_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<LabConfig>,
    mut state: ResMut<LabSceneState>,
) {
    let path = config.assets.lab_scene.clone();
    info!(path = %path, "loading lab scene");
    state.gltf = asset_server.load(path.clone());

    commands
        .spawn((
            LabScene,
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(path))),
            Transform::from_scale(Vec3::splat(config.scene.model_scale)),
        ))
        .observe(on_lab_scene_ready);
}

fn on_lab_scene_ready(_trigger: Trigger<SceneInstanceReady>, mut state: ResMut<LabSceneState>) {
    debug!("lab scene instance ready");
    state.stage = LabSceneStage::Spawned;
}

/// Builds the collision and interaction registries and spawns the player once
/// the scene has world transforms and mesh bounds.
pub fn index_lab_scene(
    asset_server: Res<AssetServer>,
    config: Res<LabConfig>,
    mut state: ResMut<LabSceneState>,
    roots: Query<Entity, With<LabScene>>,
    children: Query<&Children>,
    names: Query<&Name>,
    meshes: Query<(), With<Mesh3d>>,
    bounds: Query<(&MeshAabb, &GlobalTransform)>,
    globals: Query<&GlobalTransform>,
    mut nodes: ResMut<NamedNodes>,
    mut collision: ResMut<CollisionWorld>,
    mut interactive: ResMut<InteractiveWorld>,
    mut sim_state: ResMut<SimState>,
    mut ready: ResMut<SimReady>,
    mut indexed: EventWriter<LabSceneIndexed>,
) {
    match state.stage {
        LabSceneStage::Indexed => return,
        LabSceneStage::Loading => {
            if let LoadState::Failed(err) = asset_server.load_state(&state.gltf) {
                error!(%err, "lab scene failed to load, starting at fallback spawn");
                start_simulation(&config, None, &mut sim_state, &mut ready);
                state.stage = LabSceneStage::Indexed;
                indexed.write(LabSceneIndexed);
            }
            return;
        }
        LabSceneStage::Spawned => {}
    }

    let Some(root) = roots.iter().next() else {
        return;
    };
    // Mesh bounds are computed in PostUpdate after the instance spawns.
    let pending = children
        .iter_descendants(root)
        .any(|e| meshes.contains(e) && !bounds.contains(e));
    if pending {
        return;
    }

    nodes.0.clear();
    for entity in children.iter_descendants(root) {
        if let Ok(name) = names.get(entity) {
            nodes.0.entry(name.as_str().to_string()).or_insert(entity);
        }
    }

    let world_bounds = |name: &str| {
        nodes
            .get(name)
            .map(|node| node_world_bounds(node, &children, &bounds))
    };

    collision.0 = build_registry(&config.scene.collidable, world_bounds);
    let interactive_names: Vec<String> = config
        .scene
        .interactions
        .iter()
        .map(|b| b.object.clone())
        .collect();
    interactive.0 = build_registry(&interactive_names, world_bounds);

    let anchor = nodes.get(&config.scene.spawn_anchor).and_then(|node| {
        let anchor_bounds = node_world_bounds(node, &children, &bounds);
        let global = globals.get(node).ok()?;
        (!anchor_bounds.is_empty()).then(|| SpawnAnchor {
            position: global.translation(),
            bounds: anchor_bounds,
        })
    });
    if anchor.is_none() {
        warn!(anchor = %config.scene.spawn_anchor, "spawn anchor not found, using fallback");
    }

    start_simulation(&config, anchor, &mut sim_state, &mut ready);
    info!(
        nodes = nodes.0.len(),
        collidable = collision.0.len(),
        interactive = interactive.0.len(),
        "lab scene indexed"
    );
    state.stage = LabSceneStage::Indexed;
    indexed.write(LabSceneIndexed);
}

fn start_simulation(
    config: &LabConfig,
    anchor: Option<SpawnAnchor>,
    sim_state: &mut SimState,
    ready: &mut SimReady,
) {
    let player = spawn_state(anchor, config.scene.fallback_spawn());
    let mut ctx = SimContext::new(player);
    ctx.eye = eye_position(player.pos, false, &config.controller);
    sim_state.current = ctx;
    ready.0 = true;
    info!(pos = ?player.pos, "player spawned");
}

/// Registry over `names` in order. Names without geometry are skipped.
pub fn build_registry<'a>(
    names: impl IntoIterator<Item = &'a String>,
    bounds_of: impl Fn(&str) -> Option<Aabb>,
) -> CollisionRegistry {
    let mut registry = CollisionRegistry::new();
    for name in names {
        match bounds_of(name) {
            Some(bounds) if !bounds.is_empty() => registry.insert(name.as_str(), bounds),
            Some(_) => warn!(object = %name, "object has no mesh bounds, skipped"),
            None => warn!(object = %name, "object not found in scene, skipped"),
        }
    }
    registry
}

/// World-space box around every mesh at or below `node`.
pub fn node_world_bounds(
    node: Entity,
    children: &Query<&Children>,
    bounds: &Query<(&MeshAabb, &GlobalTransform)>,
) -> Aabb {
    std::iter::once(node)
        .chain(children.iter_descendants(node))
        .filter_map(|e| bounds.get(e).ok())
        .fold(Aabb::EMPTY, |acc, (local, global)| {
            let local = Aabb::new(local.min().into(), local.max().into());
            acc.union(Aabb::from_points(
                local.corners().map(|c| global.transform_point(c)),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_sim::SceneQuery;

    #[test]
    fn registry_keeps_order_and_skips_missing() {
        let names: Vec<String> = ["a", "missing", "empty", "b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let registry = build_registry(&names, |name| match name {
            "a" => Some(Aabb::new(Vec3::ZERO, Vec3::ONE)),
            "b" => Some(Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0))),
            "empty" => Some(Aabb::EMPTY),
            _ => None,
        });

        let order: Vec<_> = registry.volumes().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn node_bounds_cover_transformed_children() {
        let mut world = World::new();
        let mesh = world
            .spawn((
                MeshAabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0)),
                GlobalTransform::from(
                    Transform::from_xyz(10.0, 0.0, 0.0).with_scale(Vec3::splat(0.5)),
                ),
            ))
            .id();
        let node = world
            .spawn(GlobalTransform::IDENTITY)
            .add_child(mesh)
            .id();

        let mut system_state: bevy::ecs::system::SystemState<(
            Query<&Children>,
            Query<(&MeshAabb, &GlobalTransform)>,
        )> = bevy::ecs::system::SystemState::new(&mut world);
        let (children, bounds) = system_state.get(&world);

        let aabb = node_world_bounds(node, &children, &bounds);
        assert_eq!(aabb.min, Vec3::new(9.5, -0.5, -0.5));
        assert_eq!(aabb.max, Vec3::new(10.5, 0.5, 0.5));
    }
}
