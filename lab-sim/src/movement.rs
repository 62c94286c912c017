use bevy::prelude::Vec3;
use tracing::{debug, trace};

use crate::collision::{Aabb, RayTargets, SceneQuery};
use crate::config::{ControllerConfig, GROUND_SNAP_TOLERANCE};
use crate::types::{FrameEvents, InputState, PlayerSimState, SimContext, SimFrame};

const MIN_PROBE_FACTOR: f32 = 1.1;
const HEAD_PROBE_INSET: f32 = 0.1;
const HEAD_PROBE_MARGIN: f32 = 0.2;
const STEP_CLEARANCE_MARGIN: f32 = 0.1;
const STEP_SURFACE_REACH: f32 = 1.5;
const STEP_DOWN_TOLERANCE: f32 = 0.01;
// Keeps a resting contact from registering as a horizontal overlap.
const CONTACT_EPS: f32 = 1e-3;

#[derive(Clone, Copy, Debug)]
pub struct SpawnAnchor {
    pub position: Vec3,
    pub bounds: Aabb,
}

/// Initial player state, on top of the anchor if the scene has one.
pub fn spawn_state(anchor: Option<SpawnAnchor>, fallback: Vec3) -> PlayerSimState {
    let pos = match anchor {
        Some(anchor) => Vec3::new(anchor.position.x, anchor.bounds.max.y, anchor.position.z),
        None => fallback,
    };
    PlayerSimState {
        pos,
        vel: Vec3::ZERO,
        grounded: true,
        can_jump: true,
    }
}

/// Ground probe reach; grows with fall speed so one step never skips the surface.
pub fn ground_probe_distance(vel_y: f32, dt: f32, config: &ControllerConfig) -> f32 {
    (config.feet_radius * MIN_PROBE_FACTOR).max((vel_y * dt).abs() + config.feet_radius)
}

pub fn eye_position(pos: Vec3, ghost: bool, config: &ControllerConfig) -> Vec3 {
    if ghost {
        pos
    } else {
        pos + Vec3::Y * config.eye_offset()
    }
}

pub fn player_aabb(center: Vec3, config: &ControllerConfig) -> Aabb {
    Aabb::from_center_half_extents(
        center,
        Vec3::new(
            config.radius_buffer,
            config.half_height(),
            config.radius_buffer,
        ),
    )
}

/// Forward and right axes for a yaw/pitch look. Forward stays flat unless
/// `free_look` is set.
pub fn movement_axes(yaw: f32, pitch: f32, free_look: bool) -> (Vec3, Vec3) {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let forward = if free_look {
        let (sin_pitch, cos_pitch) = pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    } else {
        Vec3::new(-sin_yaw, 0.0, -cos_yaw)
    };
    let right = Vec3::new(cos_yaw, 0.0, -sin_yaw);
    (forward, right)
}

fn wish_direction(input: &InputState, free_look: bool) -> Vec3 {
    let (forward, right) = movement_axes(input.yaw, input.pitch, free_look);
    let mut dir = Vec3::ZERO;
    if input.forward {
        dir += forward;
    }
    if input.back {
        dir -= forward;
    }
    if input.right {
        dir += right;
    }
    if input.left {
        dir -= right;
    }
    dir.normalize_or_zero()
}

fn move_speed(input: &InputState, ghost: bool, config: &ControllerConfig) -> f32 {
    let mut speed = config.walk_speed;
    if input.sprint {
        speed *= config.sprint_multiplier;
    }
    if ghost {
        speed *= config.ghost_speed_multiplier;
    }
    speed
}

/// Advances the player by one display frame. `dt` is expected to be clamped
/// by the caller (see [`ControllerConfig::clamp_frame_dt`]).
pub fn simulate_frame<Q: SceneQuery>(
    prev: &SimContext,
    input: &InputState,
    world: &Q,
    config: &ControllerConfig,
    dt: f32,
) -> SimFrame {
    let mut ctx = *prev;
    let mut events = FrameEvents::default();
    let was_grounded = ctx.player.grounded;

    if input.ghost_toggle && !ctx.ghost_toggle_held {
        ctx.ghost = !ctx.ghost;
        if ctx.ghost {
            ctx.player.vel.y = 0.0;
        }
        events.ghost_toggled = true;
        debug!(ghost = ctx.ghost, "ghost mode toggled");
    }
    ctx.ghost_toggle_held = input.ghost_toggle;

    if !input.active {
        settle_inactive(&mut ctx, world, config, dt);
    } else if ctx.ghost {
        fly(&mut ctx.player, input, config, dt);
    } else {
        walk(&mut ctx.player, input, world, config, dt, &mut events);
    }

    ctx.eye = eye_position(ctx.player.pos, ctx.ghost, config);
    events.landed = !was_grounded && ctx.player.grounded;
    SimFrame { state: ctx, events }
}

fn settle_inactive<Q: SceneQuery>(
    ctx: &mut SimContext,
    world: &Q,
    config: &ControllerConfig,
    dt: f32,
) {
    let player = &mut ctx.player;
    player.vel.x = 0.0;
    player.vel.z = 0.0;
    if ctx.ghost || player.grounded {
        return;
    }
    player.vel.y -= config.gravity * dt;
    player.pos.y += player.vel.y * dt;
    probe_ground(player, world, config, dt);
}

fn fly(player: &mut PlayerSimState, input: &InputState, config: &ControllerConfig, dt: f32) {
    let step = move_speed(input, true, config) * dt;
    player.vel.y = 0.0;
    player.pos += wish_direction(input, true) * step;
    if input.jump {
        player.pos.y += step;
    }
    if input.descend {
        player.pos.y -= step;
    }
    player.grounded = false;
}

fn walk<Q: SceneQuery>(
    player: &mut PlayerSimState,
    input: &InputState,
    world: &Q,
    config: &ControllerConfig,
    dt: f32,
    events: &mut FrameEvents,
) {
    if !player.grounded {
        player.vel.y -= config.gravity * dt;
    }

    if input.jump && player.grounded && player.can_jump {
        player.vel.y = config.jump_impulse;
        player.grounded = false;
        player.can_jump = false;
        events.jumped = true;
    }
    if !input.jump {
        player.can_jump = true;
    }

    probe_ground(player, world, config, dt);
    player.pos.y += player.vel.y * dt;
    if player.vel.y > 0.0 {
        probe_ceiling(player, world, config, dt);
    }

    let dir = wish_direction(input, false);
    let delta = dir * move_speed(input, false, config) * dt;
    resolve_horizontal(player, dir, delta, world, config, events);
}

fn probe_ground<Q: SceneQuery>(
    player: &mut PlayerSimState,
    world: &Q,
    config: &ControllerConfig,
    dt: f32,
) {
    player.grounded = false;
    if player.vel.y > 0.0 {
        return;
    }

    let origin = player.pos + Vec3::Y * (config.feet_radius * 0.5);
    let reach = ground_probe_distance(player.vel.y, dt, config);
    let Some(hit) = world.nearest_hit(origin, Vec3::NEG_Y, reach, RayTargets::All) else {
        return;
    };
    if hit.distance > config.feet_radius * GROUND_SNAP_TOLERANCE {
        return;
    }

    player.pos.y = hit.point.y + config.half_height();
    player.vel.y = 0.0;
    player.grounded = true;
}

fn probe_ceiling<Q: SceneQuery>(
    player: &mut PlayerSimState,
    world: &Q,
    config: &ControllerConfig,
    dt: f32,
) {
    let origin = player.pos + Vec3::Y * (config.half_height() - HEAD_PROBE_INSET);
    let reach = player.vel.y * dt + HEAD_PROBE_MARGIN;
    if let Some(hit) = world.nearest_hit(origin, Vec3::Y, reach, RayTargets::All) {
        player.pos.y = hit.point.y - config.half_height();
        player.vel.y = 0.0;
    }
}

/// Linear scan over the registry. The first overlapping volume that is not a
/// low edge decides the outcome: either a step-up consumes the move or the
/// move is dropped.
fn resolve_horizontal<Q: SceneQuery>(
    player: &mut PlayerSimState,
    dir: Vec3,
    delta: Vec3,
    world: &Q,
    config: &ControllerConfig,
    events: &mut FrameEvents,
) {
    if delta.x == 0.0 && delta.z == 0.0 {
        return;
    }

    let candidate = Vec3::new(player.pos.x + delta.x, player.pos.y, player.pos.z + delta.z);
    let body = player_aabb(candidate, config).contract(0.0, CONTACT_EPS, 0.0);

    for volume in world.volumes() {
        if volume.bounds.is_empty() || !body.intersects(&volume.bounds) {
            continue;
        }
        // The body is wider than the step probe, so it reaches a ledge's side
        // long before its centre is over the top. Probe where they meet.
        let contact = volume.bounds.clamp_xz(candidate);
        let centre_over = contact.x == candidate.x && contact.z == candidate.z;
        match step_up_surface(player, contact, dir, &volume.name, world, config) {
            Some(_) if !centre_over => {
                trace!(object = %volume.name, "walking onto low edge");
                continue;
            }
            Some(surface_y) => {
                player.pos = Vec3::new(candidate.x, surface_y + config.half_height(), candidate.z);
                player.grounded = true;
                player.vel.y = 0.0;
                events.stepped_up = true;
                trace!(object = %volume.name, surface_y, "stepped up");
            }
            None => {
                events.blocked = true;
                trace!(object = %volume.name, "horizontal move blocked");
            }
        }
        return;
    }

    player.pos.x = candidate.x;
    player.pos.z = candidate.z;
}

fn step_up_surface<Q: SceneQuery>(
    player: &PlayerSimState,
    probe_at: Vec3,
    dir: Vec3,
    object: &str,
    world: &Q,
    config: &ControllerConfig,
) -> Option<f32> {
    let mut clearance_origin = player.pos + dir * (config.radius_buffer * 0.5);
    clearance_origin.y = player.pos.y + config.max_step_height + STEP_CLEARANCE_MARGIN;
    if world
        .nearest_hit(
            clearance_origin,
            dir,
            config.radius_buffer,
            RayTargets::Only(object),
        )
        .is_some()
    {
        return None;
    }

    let surface_origin = Vec3::new(
        probe_at.x,
        player.pos.y + config.max_step_height + config.feet_radius,
        probe_at.z,
    );
    let reach = config.max_step_height + config.feet_radius * STEP_SURFACE_REACH;
    let hit = world.nearest_hit(
        surface_origin,
        Vec3::NEG_Y,
        reach,
        RayTargets::Only(object),
    )?;

    let rise = hit.point.y - (player.pos.y - config.half_height());
    (-STEP_DOWN_TOLERANCE..=config.max_step_height)
        .contains(&rise)
        .then_some(hit.point.y)
}
