//! Scripted scene props driven by interactions. Each piece is a small state
//! machine advanced once per frame; the client maps its outputs onto
//! materials and transforms.

use bevy::prelude::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collision::{Aabb, CollisionRegistry, RayTargets, SceneQuery};
use crate::config::SetPieceConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InteractionAction {
    ToggleTv,
    TogglePaper,
    ToggleSteam,
    DropProps { props: Vec<String> },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TvScreen {
    pub on: bool,
    pub uv_offset: Vec2,
}

impl TvScreen {
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }

    /// Random walk of the static texture offset, wrapped into [0, 1).
    pub fn flicker(&mut self, rng: &mut impl Rng, jitter: f32) {
        if !self.on {
            return;
        }
        if jitter > 0.0 {
            self.uv_offset.x += rng.gen_range(-jitter..jitter);
            self.uv_offset.y += rng.gen_range(-jitter..jitter);
        }
        self.uv_offset.x = wrap_unit(self.uv_offset.x);
        self.uv_offset.y = wrap_unit(self.uv_offset.y);
    }
}

fn wrap_unit(v: f32) -> f32 {
    let wrapped = v.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteamSample {
    pub rise: f32,
    pub opacity_factor: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SteamPlume {
    pub active: bool,
    pub elapsed: f32,
}

impl SteamPlume {
    /// Returns the new active state. Starting always restarts the loop.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if self.active {
            self.elapsed = 0.0;
        }
        self.active
    }

    pub fn advance(&mut self, dt: f32, config: &SetPieceConfig) -> Option<SteamSample> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        Some(self.sample(config))
    }

    pub fn sample(&self, config: &SetPieceConfig) -> SteamSample {
        let progress = (self.elapsed % config.steam_loop_duration) / config.steam_loop_duration;
        SteamSample {
            rise: progress * config.steam_rise,
            opacity_factor: 1.0 - progress,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperMaterial {
    Original,
    Print,
}

#[derive(Clone, Copy, Debug)]
pub struct PaperReveal {
    pub visible: bool,
    pub fading: bool,
    pub elapsed: f32,
    pub opacity: f32,
    pub target: f32,
    pub material: PaperMaterial,
}

impl Default for PaperReveal {
    fn default() -> Self {
        Self {
            visible: false,
            fading: false,
            elapsed: 0.0,
            opacity: 0.0,
            target: 0.0,
            material: PaperMaterial::Original,
        }
    }
}

impl PaperReveal {
    /// Flips the print visibility and starts a fade. Ignored mid-fade.
    pub fn toggle(&mut self) -> bool {
        if self.fading {
            return false;
        }
        self.visible = !self.visible;
        self.fading = true;
        self.elapsed = 0.0;
        if self.visible {
            self.opacity = 0.0;
            self.target = 1.0;
            self.material = PaperMaterial::Print;
        } else {
            self.opacity = 1.0;
            self.target = 0.0;
        }
        true
    }

    pub fn advance(&mut self, dt: f32, config: &SetPieceConfig) {
        if !self.fading {
            return;
        }
        self.elapsed += dt;
        let progress = (self.elapsed / config.paper_fade_duration).min(1.0);
        self.opacity += (self.target - self.opacity) * ease_in_out(progress);

        if progress >= 1.0 {
            self.fading = false;
            if self.target == 0.0 {
                self.material = PaperMaterial::Original;
            }
        }
    }
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// One prop of the falling-debris sequence, tracked as a vertical offset from
/// where it hung when triggered.
#[derive(Clone, Debug)]
pub struct FallingProp {
    pub name: String,
    pub bounds: Option<Aabb>,
    pub drop: f32,
    pub offset: f32,
    pub velocity: f32,
    pub resting: bool,
}

impl FallingProp {
    /// Detaches `name` from collision and measures the drop to the nearest
    /// surface underneath. Props unknown to the registry fall the max drop.
    pub fn release(name: &str, registry: &mut CollisionRegistry, config: &SetPieceConfig) -> Self {
        let bounds = registry.remove(name).filter(|b| !b.is_empty());
        // Cast from the top so a support the base sinks into is still seen.
        let drop = bounds.map_or(config.prop_max_drop, |b| {
            let height = b.max.y - b.min.y;
            let top = Vec3::new(b.center().x, b.max.y, b.center().z);
            registry
                .nearest_hit(
                    top,
                    Vec3::NEG_Y,
                    config.prop_max_drop + height,
                    RayTargets::All,
                )
                .map_or(config.prop_max_drop, |hit| (hit.distance - height).max(0.0))
        });

        Self {
            name: name.to_string(),
            bounds,
            drop,
            offset: 0.0,
            velocity: 0.0,
            resting: false,
        }
    }

    /// Returns true on the frame the prop comes to rest.
    pub fn advance(&mut self, dt: f32, config: &SetPieceConfig) -> bool {
        if self.resting {
            return false;
        }
        self.velocity -= config.prop_gravity * dt;
        self.offset += self.velocity * dt;

        if self.offset > -self.drop {
            return false;
        }
        self.offset = -self.drop;
        let rebound = -self.velocity * config.prop_restitution;
        if rebound < config.prop_rest_speed {
            self.velocity = 0.0;
            self.resting = true;
            return true;
        }
        self.velocity = rebound;
        false
    }

    /// Bounds at the current offset, for re-registering once at rest.
    pub fn current_bounds(&self) -> Option<Aabb> {
        self.bounds.map(|b| b.offset(Vec3::new(0.0, self.offset, 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn tv_offset_stays_in_unit_square() {
        let mut tv = TvScreen::default();
        let mut rng = StdRng::seed_from_u64(7);
        tv.flicker(&mut rng, 0.05);
        assert_eq!(tv.uv_offset, Vec2::ZERO);

        assert!(tv.toggle());
        for _ in 0..2000 {
            tv.flicker(&mut rng, 0.05);
            assert!((0.0..1.0).contains(&tv.uv_offset.x));
            assert!((0.0..1.0).contains(&tv.uv_offset.y));
        }
    }

    #[test]
    fn steam_loops_and_fades() {
        let config = SetPieceConfig::default();
        let mut steam = SteamPlume::default();
        assert!(steam.advance(0.1, &config).is_none());

        assert!(steam.toggle());
        let sample = steam.advance(0.5, &config).unwrap();
        assert!((sample.rise - 2.5).abs() < 1e-5);
        assert!((sample.opacity_factor - 0.75).abs() < 1e-5);

        let sample = steam.advance(2.0, &config).unwrap();
        assert!((sample.rise - 2.5).abs() < 1e-4);

        assert!(!steam.toggle());
        assert!(steam.toggle());
        assert_eq!(steam.elapsed, 0.0);
    }

    #[test]
    fn paper_fades_in_then_restores_original() {
        let config = SetPieceConfig::default();
        let mut paper = PaperReveal::default();

        assert!(paper.toggle());
        assert_eq!(paper.material, PaperMaterial::Print);
        assert!(!paper.toggle(), "toggle ignored while fading");

        for _ in 0..40 {
            if !paper.fading {
                break;
            }
            paper.advance(0.05, &config);
        }
        assert!(!paper.fading);
        assert!((paper.opacity - 1.0).abs() < 1e-6);

        assert!(paper.toggle());
        assert_eq!(paper.material, PaperMaterial::Print);
        for _ in 0..40 {
            if !paper.fading {
                break;
            }
            paper.advance(0.05, &config);
        }
        assert!(!paper.fading);
        assert!(paper.opacity.abs() < 1e-6);
        assert_eq!(paper.material, PaperMaterial::Original);
    }

    #[test]
    fn prop_falls_onto_surface_and_rejoins_collision() {
        let config = SetPieceConfig::default();
        let mut registry = CollisionRegistry::new();
        registry.insert(
            "floor",
            Aabb::new(Vec3::new(-5.0, -1.0, -5.0), Vec3::new(5.0, 0.0, 5.0)),
        );
        registry.insert(
            "crate",
            Aabb::new(Vec3::new(-0.5, 3.0, -0.5), Vec3::new(0.5, 4.0, 0.5)),
        );

        let mut prop = FallingProp::release("crate", &mut registry, &config);
        assert!(!registry.contains("crate"));
        assert!((prop.drop - 3.0).abs() < 1e-5);

        let mut rested = false;
        for _ in 0..400 {
            if prop.advance(0.016, &config) {
                rested = true;
                break;
            }
            assert!(prop.offset >= -prop.drop);
        }
        assert!(rested);
        let landed = prop.current_bounds().unwrap();
        assert!(landed.min.y.abs() < 1e-5);
    }

    #[test]
    fn prop_sunk_into_support_stays_on_it() {
        let config = SetPieceConfig::default();
        let mut registry = CollisionRegistry::new();
        registry.insert(
            "floor",
            Aabb::new(Vec3::new(-5.0, -1.0, -5.0), Vec3::new(5.0, 0.0, 5.0)),
        );
        registry.insert(
            "table",
            Aabb::new(Vec3::new(-1.0, 2.0, -1.0), Vec3::new(1.0, 3.0, 1.0)),
        );
        registry.insert(
            "beaker",
            Aabb::new(Vec3::new(-0.2, 2.95, -0.2), Vec3::new(0.2, 3.45, 0.2)),
        );

        let mut prop = FallingProp::release("beaker", &mut registry, &config);
        assert_eq!(prop.drop, 0.0);
        assert!(prop.advance(0.016, &config));
        let rested = prop.current_bounds().unwrap();
        assert!((rested.min.y - 2.95).abs() < 1e-5);
    }

    #[test]
    fn unknown_prop_uses_max_drop() {
        let config = SetPieceConfig::default();
        let mut registry = CollisionRegistry::new();
        let prop = FallingProp::release("ghost", &mut registry, &config);
        assert_eq!(prop.drop, config.prop_max_drop);
        assert!(prop.current_bounds().is_none());
    }

    #[test]
    fn bindings_parse_from_tagged_json() {
        let action: InteractionAction =
            serde_json::from_str(r#"{ "action": "drop_props", "props": ["Object_24"] }"#).unwrap();
        assert_eq!(
            action,
            InteractionAction::DropProps {
                props: vec!["Object_24".to_string()]
            }
        );
    }
}
