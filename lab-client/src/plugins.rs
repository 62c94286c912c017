use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};

use crate::companion;
use crate::config::LabConfig;
use crate::hud;
use crate::interaction;
use crate::scene;
use crate::set_pieces;
use crate::sim;
use crate::sim_systems;

pub struct ClientCorePlugin {
    config: LabConfig,
}

impl ClientCorePlugin {
    pub fn new(config: LabConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ClientCorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(sim::CurrentInput::default())
            .insert_resource(sim::SimState::default())
            .insert_resource(sim::SimReady::default())
            .insert_resource(sim::CollisionWorld::default())
            .insert_resource(sim::InteractiveWorld::default())
            .insert_resource(sim::LastFrameEvents::default())
            .insert_resource(sim::DebugStats::default())
            .insert_resource(sim::DebugUiState::default())
            .insert_resource(scene::LabSceneState::default())
            .insert_resource(scene::NamedNodes::default())
            .insert_resource(set_pieces::SetPieceTargets::default())
            .insert_resource(set_pieces::SetPieceState::default())
            .insert_resource(companion::CompanionState::default())
            .add_event::<scene::LabSceneIndexed>()
            .add_event::<interaction::InteractionEvent>();
    }
}

pub struct ClientScenePlugin;

impl Plugin for ClientScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, scene::spawn_lab_scene)
            .add_systems(Update, scene::index_lab_scene);
    }
}

pub struct ClientSimPlugin;

impl Plugin for ClientSimPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                sim_systems::debug_toggle_system,
                (
                    sim_systems::input_collect_system,
                    sim_systems::frame_sim_system,
                    sim_systems::apply_visual_transform_system,
                )
                    .chain()
                    .after(lab_render::input::update_control_lock)
                    .after(scene::index_lab_scene),
            ),
        )
        .add_systems(EguiPrimaryContextPass, sim_systems::debug_overlay_system);
    }
}

pub struct ClientSetPiecePlugin;

impl Plugin for ClientSetPiecePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, set_pieces::load_set_piece_assets)
            .add_systems(
                Update,
                (
                    set_pieces::texture_fallback_system,
                    set_pieces::prepare_set_pieces.after(scene::index_lab_scene),
                    interaction::interaction_system.after(sim_systems::frame_sim_system),
                    set_pieces::apply_interactions_system
                        .after(interaction::interaction_system)
                        .after(set_pieces::prepare_set_pieces),
                    set_pieces::animate_set_pieces_system
                        .after(set_pieces::apply_interactions_system),
                ),
            );
    }
}

pub struct ClientCompanionPlugin;

impl Plugin for ClientCompanionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, companion::load_companion).add_systems(
            Update,
            companion::spawn_companion_system.after(scene::index_lab_scene),
        );
    }
}

pub struct ClientUiPlugin;

impl Plugin for ClientUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_systems(EguiPrimaryContextPass, hud::instructions_overlay_system);
    }
}
