use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use lab_render::{ControlLock, LookAngles, Player, PlayerCamera};
use lab_sim::{SceneQuery, simulate_frame};
use tracing::debug;

use crate::companion::Companion;
use crate::config::LabConfig;
use crate::sim::{
    CollisionWorld, CurrentInput, DebugStats, DebugUiState, InteractiveWorld, LastFrameEvents,
    SimReady, SimState,
};

const MOUSE_SENSITIVITY: f32 = 0.002;
const PITCH_LIMIT: f32 = 1.54;

pub fn input_collect_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut motion_events: EventReader<MouseMotion>,
    lock: Res<ControlLock>,
    mut input: ResMut<CurrentInput>,
) {
    // Ghost toggle is edge-detected by the controller and works unlocked.
    input.0.ghost_toggle = keys.pressed(KeyCode::KeyG);
    input.0.active = lock.locked;

    if !lock.locked {
        motion_events.clear();
        input.0.forward = false;
        input.0.back = false;
        input.0.left = false;
        input.0.right = false;
        input.0.sprint = false;
        input.0.jump = false;
        input.0.descend = false;
        input.0.interact = false;
        return;
    }

    let mut look_delta = Vec2::ZERO;
    for ev in motion_events.read() {
        look_delta += ev.delta;
    }
    input.0.yaw -= look_delta.x * MOUSE_SENSITIVITY;
    input.0.pitch -= look_delta.y * MOUSE_SENSITIVITY;
    input.0.pitch = input.0.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

    input.0.forward = keys.pressed(KeyCode::KeyW);
    input.0.back = keys.pressed(KeyCode::KeyS);
    input.0.left = keys.pressed(KeyCode::KeyA);
    input.0.right = keys.pressed(KeyCode::KeyD);
    input.0.sprint = keys.pressed(KeyCode::ShiftLeft);
    input.0.jump = keys.pressed(KeyCode::Space);
    input.0.descend = keys.pressed(KeyCode::KeyQ);
    input.0.interact = keys.just_pressed(KeyCode::KeyE);
}

pub fn frame_sim_system(
    time: Res<Time>,
    config: Res<LabConfig>,
    world: Res<CollisionWorld>,
    input: Res<CurrentInput>,
    sim_ready: Res<SimReady>,
    mut sim_state: ResMut<SimState>,
    mut last_events: ResMut<LastFrameEvents>,
    mut stats: ResMut<DebugStats>,
) {
    if !sim_ready.0 {
        return;
    }
    let dt = config.controller.clamp_frame_dt(time.delta_secs());
    let frame = simulate_frame(&sim_state.current, &input.0, &world.0, &config.controller, dt);
    sim_state.current = frame.state;

    let events = frame.events;
    if events.jumped {
        stats.jumps += 1;
        debug!(y = frame.state.player.pos.y, "jump");
    }
    if events.landed {
        stats.landings += 1;
        debug!(y = frame.state.player.pos.y, "landed");
    }
    if events.stepped_up {
        stats.step_ups += 1;
    }
    if events.blocked {
        stats.blocked_frames += 1;
    }
    last_events.0 = events;
}

pub fn apply_visual_transform_system(
    input: Res<CurrentInput>,
    sim_state: Res<SimState>,
    sim_ready: Res<SimReady>,
    mut player_query: Query<(&mut Transform, &mut LookAngles), With<Player>>,
    mut camera_query: Query<&mut Transform, (With<PlayerCamera>, Without<Player>)>,
) {
    let Ok((mut player_transform, mut look)) = player_query.single_mut() else {
        return;
    };
    look.yaw = input.0.yaw;
    look.pitch = input.0.pitch;
    if sim_ready.0 {
        player_transform.translation = sim_state.current.eye;
    }
    player_transform.rotation = Quat::from_axis_angle(Vec3::Y, look.yaw);
    if let Ok(mut camera_transform) = camera_query.single_mut() {
        camera_transform.rotation = Quat::from_axis_angle(Vec3::X, look.pitch);
    }
}

pub fn debug_toggle_system(keys: Res<ButtonInput<KeyCode>>, mut debug_ui: ResMut<DebugUiState>) {
    if keys.just_pressed(KeyCode::KeyT) {
        debug_ui.open = !debug_ui.open;
    }
}

pub fn debug_overlay_system(
    mut contexts: EguiContexts,
    debug_ui: Res<DebugUiState>,
    sim_state: Res<SimState>,
    sim_ready: Res<SimReady>,
    last_events: Res<LastFrameEvents>,
    stats: Res<DebugStats>,
    collision: Res<CollisionWorld>,
    interactive: Res<InteractiveWorld>,
    companions: Query<&GlobalTransform, With<Companion>>,
) {
    if !debug_ui.open {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let ctx_state = sim_state.current;
    let player = ctx_state.player;
    egui::Window::new("Debug")
        .default_pos(egui::pos2(12.0, 12.0))
        .show(ctx, |ui| {
            if !sim_ready.0 {
                ui.label("scene loading...");
                return;
            }
            ui.label(format!(
                "pos: {:.3} {:.3} {:.3}",
                player.pos.x, player.pos.y, player.pos.z
            ));
            ui.label(format!(
                "vel: {:.3} {:.3} {:.3}",
                player.vel.x, player.vel.y, player.vel.z
            ));
            ui.label(format!(
                "eye: {:.3} {:.3} {:.3}",
                ctx_state.eye.x, ctx_state.eye.y, ctx_state.eye.z
            ));
            ui.label(format!("grounded: {}", player.grounded));
            ui.label(format!("ghost: {}", ctx_state.ghost));

            ui.separator();
            ui.label(format!(
                "collidable: {} interactive: {}",
                collision.0.volumes().len(),
                interactive.0.volumes().len()
            ));
            match companions.iter().next() {
                Some(companion) => ui.label(format!(
                    "companion distance: {:.2}",
                    companion.translation().distance(player.pos)
                )),
                None => ui.label("companion: none"),
            };

            ui.separator();
            let events = last_events.0;
            ui.label(format!(
                "frame: jump {} step-up {} blocked {}",
                events.jumped, events.stepped_up, events.blocked
            ));
            ui.label(format!(
                "totals: jumps {} landings {} step-ups {} blocked frames {}",
                stats.jumps, stats.landings, stats.step_ups, stats.blocked_frames
            ));
        });
}
