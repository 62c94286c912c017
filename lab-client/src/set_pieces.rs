use std::collections::HashSet;

use bevy::asset::LoadState;
use bevy::color::Alpha;
use bevy::image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use bevy::math::Affine2;
use bevy::prelude::*;
use lab_sim::set_piece::{
    FallingProp, InteractionAction, PaperMaterial, PaperReveal, SteamPlume, TvScreen,
};
use tracing::{debug, info, warn};

use crate::config::LabConfig;
use crate::interaction::InteractionEvent;
use crate::scene::{LabSceneIndexed, NamedNodes};
use crate::sim::{CollisionWorld, InteractiveWorld};

/// A mesh entity whose material a set piece swaps, with the handle to restore.
#[derive(Clone, Debug)]
pub struct MaterialSlot {
    pub entity: Entity,
    pub original: Handle<StandardMaterial>,
}

#[derive(Debug)]
pub struct SteamTarget {
    pub entity: Entity,
    pub base_translation: Vec3,
    /// Per-mesh copies made translucent, with their starting alpha.
    pub materials: Vec<(Handle<StandardMaterial>, f32)>,
}

#[derive(Resource, Default, Debug)]
pub struct SetPieceTargets {
    pub tv: Vec<MaterialSlot>,
    pub paper: Vec<MaterialSlot>,
    pub steam: Option<SteamTarget>,
}

#[derive(Resource)]
pub struct SetPieceMaterials {
    pub tv_texture: Handle<Image>,
    pub tv_static: Handle<StandardMaterial>,
    pub paper_texture: Handle<Image>,
    pub paper_print: Handle<StandardMaterial>,
    tv_fallback: bool,
    paper_fallback: bool,
}

pub struct FallingPropVisual {
    pub prop: FallingProp,
    pub entity: Option<Entity>,
    pub base_translation: Vec3,
    /// World +Y expressed in the node's parent space.
    pub world_up_local: Vec3,
}

#[derive(Resource, Default)]
pub struct SetPieceState {
    pub tv: TvScreen,
    pub steam: SteamPlume,
    pub paper: PaperReveal,
    pub falling: Vec<FallingPropVisual>,
    /// Trigger objects whose one-shot binding already ran.
    pub fired: HashSet<String>,
}

pub fn load_set_piece_assets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<LabConfig>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let tv_texture: Handle<Image> = asset_server.load_with_settings(
        config.assets.tv_static.clone(),
        |settings: &mut ImageLoaderSettings| {
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                address_mode_u: ImageAddressMode::Repeat,
                address_mode_v: ImageAddressMode::Repeat,
                ..default()
            });
        },
    );
    let paper_texture: Handle<Image> = asset_server.load(config.assets.paper_print.clone());

    let tv_static = materials.add(StandardMaterial {
        base_color_texture: Some(tv_texture.clone()),
        emissive_texture: Some(tv_texture.clone()),
        emissive: LinearRgba::rgb(0.5, 0.5, 0.5),
        ..default()
    });
    let paper_print = materials.add(StandardMaterial {
        base_color: Color::WHITE.with_alpha(0.0),
        base_color_texture: Some(paper_texture.clone()),
        perceptual_roughness: 0.8,
        metallic: 0.1,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    commands.insert_resource(SetPieceMaterials {
        tv_texture,
        tv_static,
        paper_texture,
        paper_print,
        tv_fallback: false,
        paper_fallback: false,
    });
}

/// Swaps in flat materials when a set-piece texture cannot be loaded.
pub fn texture_fallback_system(
    asset_server: Res<AssetServer>,
    mut set_materials: ResMut<SetPieceMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let set = &mut *set_materials;
    if !set.tv_fallback && matches!(asset_server.load_state(&set.tv_texture), LoadState::Failed(_))
    {
        warn!("tv static texture failed to load, using flat screen material");
        if let Some(material) = materials.get_mut(&set.tv_static) {
            material.base_color = Color::srgb_u8(0x88, 0x88, 0x88);
            material.base_color_texture = None;
            material.emissive = Color::srgb_u8(0x33, 0x33, 0x33).to_linear();
            material.emissive_texture = None;
        }
        set.tv_fallback = true;
    }
    if !set.paper_fallback
        && matches!(asset_server.load_state(&set.paper_texture), LoadState::Failed(_))
    {
        warn!("paper print texture failed to load, using plain paper material");
        if let Some(material) = materials.get_mut(&set.paper_print) {
            material.base_color_texture = None;
        }
        set.paper_fallback = true;
    }
}

fn material_slots(
    node: Option<Entity>,
    children: &Query<&Children>,
    mesh_materials: &Query<&mut MeshMaterial3d<StandardMaterial>>,
) -> Vec<MaterialSlot> {
    let Some(node) = node else {
        return Vec::new();
    };
    std::iter::once(node)
        .chain(children.iter_descendants(node))
        .filter_map(|entity| {
            mesh_materials.get(entity).ok().map(|material| MaterialSlot {
                entity,
                original: material.0.clone(),
            })
        })
        .collect()
}

fn swap_materials(
    slots: &[MaterialSlot],
    replacement: Option<&Handle<StandardMaterial>>,
    mesh_materials: &mut Query<&mut MeshMaterial3d<StandardMaterial>>,
) {
    for slot in slots {
        if let Ok(mut material) = mesh_materials.get_mut(slot.entity) {
            material.0 = replacement.unwrap_or(&slot.original).clone();
        }
    }
}

pub fn prepare_set_pieces(
    mut indexed: EventReader<LabSceneIndexed>,
    config: Res<LabConfig>,
    nodes: Res<NamedNodes>,
    children: Query<&Children>,
    mut mesh_materials: Query<&mut MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    transforms: Query<&Transform>,
    mut visibility: Query<&mut Visibility>,
    mut targets: ResMut<SetPieceTargets>,
) {
    if indexed.read().count() == 0 {
        return;
    }
    let layout = &config.scene;

    targets.tv = material_slots(nodes.get(&layout.tv_screen), &children, &mesh_materials);
    if targets.tv.is_empty() {
        warn!(object = %layout.tv_screen, "tv screen mesh not found");
    }
    targets.paper = material_slots(nodes.get(&layout.paper), &children, &mesh_materials);
    if targets.paper.is_empty() {
        warn!(object = %layout.paper, "paper mesh not found");
    }

    targets.steam = None;
    let Some(steam) = nodes.get(&layout.steam) else {
        warn!(object = %layout.steam, "steam mesh not found");
        return;
    };
    let base_translation = transforms
        .get(steam)
        .map(|t| t.translation)
        .unwrap_or_default();
    if let Ok(mut steam_visibility) = visibility.get_mut(steam) {
        *steam_visibility = Visibility::Hidden;
    }

    let mut steam_materials = Vec::new();
    for slot in material_slots(Some(steam), &children, &mesh_materials) {
        let Some(mut material) = materials.get(&slot.original).cloned() else {
            continue;
        };
        let base_alpha = material.base_color.alpha();
        material.alpha_mode = AlphaMode::Blend;
        let handle = materials.add(material);
        if let Ok(mut mesh_material) = mesh_materials.get_mut(slot.entity) {
            mesh_material.0 = handle.clone();
        }
        steam_materials.push((handle, base_alpha));
    }
    debug!(meshes = steam_materials.len(), "steam prepared");
    targets.steam = Some(SteamTarget {
        entity: steam,
        base_translation,
        materials: steam_materials,
    });
}

pub fn apply_interactions_system(
    mut events: EventReader<InteractionEvent>,
    config: Res<LabConfig>,
    nodes: Res<NamedNodes>,
    targets: Res<SetPieceTargets>,
    set_materials: Res<SetPieceMaterials>,
    mut state: ResMut<SetPieceState>,
    mut collision: ResMut<CollisionWorld>,
    mut interactive: ResMut<InteractiveWorld>,
    mut mesh_materials: Query<&mut MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut transforms: Query<&mut Transform>,
    mut visibility: Query<&mut Visibility>,
    parents: Query<&ChildOf>,
    globals: Query<&GlobalTransform>,
) {
    for event in events.read() {
        match &event.action {
            InteractionAction::ToggleTv => {
                if targets.tv.is_empty() {
                    continue;
                }
                let on = state.tv.toggle();
                let replacement = on.then_some(&set_materials.tv_static);
                swap_materials(&targets.tv, replacement, &mut mesh_materials);
                info!(on, "tv toggled");
            }
            InteractionAction::TogglePaper => {
                if targets.paper.is_empty() {
                    continue;
                }
                if !state.paper.toggle() {
                    debug!("paper fade still running");
                    continue;
                }
                if state.paper.visible {
                    if let Some(material) = materials.get_mut(&set_materials.paper_print) {
                        material.base_color.set_alpha(state.paper.opacity);
                    }
                    swap_materials(
                        &targets.paper,
                        Some(&set_materials.paper_print),
                        &mut mesh_materials,
                    );
                }
                info!(visible = state.paper.visible, "paper reveal");
            }
            InteractionAction::ToggleSteam => {
                let Some(steam) = &targets.steam else {
                    continue;
                };
                let active = state.steam.toggle();
                if let Ok(mut steam_visibility) = visibility.get_mut(steam.entity) {
                    *steam_visibility = if active {
                        Visibility::Inherited
                    } else {
                        Visibility::Hidden
                    };
                }
                if active {
                    if let Ok(mut transform) = transforms.get_mut(steam.entity) {
                        transform.translation = steam.base_translation;
                    }
                    for (handle, base_alpha) in &steam.materials {
                        if let Some(material) = materials.get_mut(handle) {
                            material.base_color.set_alpha(*base_alpha);
                        }
                    }
                }
                info!(active, "steam toggled");
            }
            InteractionAction::DropProps { props } => {
                if !state.fired.insert(event.object.clone()) {
                    continue;
                }
                interactive.0.remove(&event.object);
                for name in props {
                    if state.falling.iter().any(|f| &f.prop.name == name) {
                        continue;
                    }
                    let prop = FallingProp::release(name, &mut collision.0, &config.set_pieces);
                    let entity = nodes.get(name);
                    let base_translation = entity
                        .and_then(|e| transforms.get(e).ok())
                        .map(|t| t.translation)
                        .unwrap_or_default();
                    let world_up_local = entity
                        .and_then(|e| parents.get(e).ok())
                        .and_then(|child_of| globals.get(child_of.parent()).ok())
                        .map(|parent| parent.affine().inverse().transform_vector3(Vec3::Y))
                        .unwrap_or(Vec3::Y);
                    if entity.is_none() {
                        warn!(prop = %name, "falling prop has no scene node");
                    }
                    info!(prop = %name, drop = prop.drop, "prop released");
                    state.falling.push(FallingPropVisual {
                        prop,
                        entity,
                        base_translation,
                        world_up_local,
                    });
                }
            }
        }
    }
}

pub fn animate_set_pieces_system(
    time: Res<Time>,
    config: Res<LabConfig>,
    targets: Res<SetPieceTargets>,
    set_materials: Res<SetPieceMaterials>,
    mut state: ResMut<SetPieceState>,
    mut collision: ResMut<CollisionWorld>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut mesh_materials: Query<&mut MeshMaterial3d<StandardMaterial>>,
    mut transforms: Query<&mut Transform>,
) {
    let dt = config.controller.clamp_frame_dt(time.delta_secs());
    let pieces = &config.set_pieces;
    let state = &mut *state;

    if state.tv.on {
        state.tv.flicker(&mut rand::thread_rng(), pieces.tv_jitter);
        if let Some(material) = materials.get_mut(&set_materials.tv_static) {
            material.uv_transform = Affine2::from_translation(state.tv.uv_offset);
        }
    }

    if let Some(sample) = state.steam.advance(dt, pieces) {
        if let Some(steam) = &targets.steam {
            if let Ok(mut transform) = transforms.get_mut(steam.entity) {
                transform.translation = steam.base_translation + Vec3::Y * sample.rise;
            }
            for (handle, base_alpha) in &steam.materials {
                if let Some(material) = materials.get_mut(handle) {
                    material.base_color.set_alpha(base_alpha * sample.opacity_factor);
                }
            }
        }
    }

    if state.paper.fading {
        state.paper.advance(dt, pieces);
        if let Some(material) = materials.get_mut(&set_materials.paper_print) {
            material.base_color.set_alpha(state.paper.opacity);
        }
        if !state.paper.fading && state.paper.material == PaperMaterial::Original {
            swap_materials(&targets.paper, None, &mut mesh_materials);
        }
    }

    for falling in &mut state.falling {
        if falling.prop.resting {
            continue;
        }
        let rested = falling.prop.advance(dt, pieces);
        if let Some(entity) = falling.entity {
            if let Ok(mut transform) = transforms.get_mut(entity) {
                transform.translation =
                    falling.base_translation + falling.world_up_local * falling.prop.offset;
            }
        }
        if rested {
            if let Some(bounds) = falling.prop.current_bounds() {
                collision.0.insert(falling.prop.name.clone(), bounds);
            }
            info!(prop = %falling.prop.name, offset = falling.prop.offset, "prop came to rest");
        }
    }
}
