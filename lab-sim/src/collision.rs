use bevy::prelude::Vec3;

const AXIS_EPS: f32 = f32::EPSILON;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Inverted box; `union` with it is the identity.
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |acc, p| Self::new(acc.min.min(p), acc.max.max(p)))
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn union(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn offset(self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    pub fn contract(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            min: Vec3::new(self.min.x + x, self.min.y + y, self.min.z + z),
            max: Vec3::new(self.max.x - x, self.max.y - y, self.max.z - z),
        }
    }

    /// Closest point to `p` over this box's horizontal footprint, keeping `p.y`.
    pub fn clamp_xz(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y,
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Strict overlap: boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
            && self.max.z > other.min.z
            && self.min.z < other.max.z
    }

    /// Entry distance of a ray into this box, with the hit point snapped onto
    /// the entered face. Rays starting inside the box see no surface.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        if self.is_empty() {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut entry_axis = None;

        for axis in 0..3 {
            let (origin_axis, dir_axis, min_axis, max_axis) =
                (origin[axis], dir[axis], self.min[axis], self.max[axis]);

            if dir_axis.abs() <= AXIS_EPS {
                if origin_axis < min_axis || origin_axis > max_axis {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir_axis;
            let (mut t1, mut face1) = ((min_axis - origin_axis) * inv, min_axis);
            let (mut t2, mut face2) = ((max_axis - origin_axis) * inv, max_axis);
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                std::mem::swap(&mut face1, &mut face2);
            }

            if t1 > t_near {
                t_near = t1;
                entry_axis = Some((axis, face1));
            }
            t_far = t_far.min(t2);
            if t_far < t_near {
                return None;
            }
        }

        let (axis, face) = entry_axis?;
        if t_near < 0.0 || t_near > max_distance {
            return None;
        }

        let mut point = origin + dir * t_near;
        point[axis] = face;
        Some((t_near, point))
    }
}

#[derive(Clone, Debug)]
pub struct CollisionVolume {
    pub name: String,
    pub bounds: Aabb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub object: String,
}

#[derive(Clone, Copy, Debug)]
pub enum RayTargets<'a> {
    All,
    Only(&'a str),
}

impl RayTargets<'_> {
    fn accepts(&self, name: &str) -> bool {
        match self {
            RayTargets::All => true,
            RayTargets::Only(target) => *target == name,
        }
    }
}

/// Read-only geometry queries the controller runs against the scene.
pub trait SceneQuery {
    /// Hits sorted nearest first.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        targets: RayTargets<'_>,
    ) -> Vec<RayHit>;

    /// Static volumes considered by the horizontal sweep, in scan order.
    fn volumes(&self) -> &[CollisionVolume];

    fn nearest_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        targets: RayTargets<'_>,
    ) -> Option<RayHit> {
        self.cast_ray(origin, direction, max_distance, targets)
            .into_iter()
            .next()
    }
}

/// Named world-space boxes, scanned linearly in insertion order.
#[derive(Clone, Debug, Default)]
pub struct CollisionRegistry {
    volumes: Vec<CollisionVolume>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the bounds in place if `name` is already registered.
    pub fn insert(&mut self, name: impl Into<String>, bounds: Aabb) {
        let name = name.into();
        if let Some(existing) = self.volumes.iter_mut().find(|v| v.name == name) {
            existing.bounds = bounds;
            return;
        }
        self.volumes.push(CollisionVolume { name, bounds });
    }

    pub fn remove(&mut self, name: &str) -> Option<Aabb> {
        let idx = self.volumes.iter().position(|v| v.name == name)?;
        Some(self.volumes.remove(idx).bounds)
    }

    pub fn get(&self, name: &str) -> Option<&Aabb> {
        self.volumes
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.bounds)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl SceneQuery for CollisionRegistry {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        targets: RayTargets<'_>,
    ) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_distance <= 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<RayHit> = self
            .volumes
            .iter()
            .filter(|v| targets.accepts(&v.name))
            .filter_map(|v| {
                v.bounds
                    .ray_hit(origin, dir, max_distance)
                    .map(|(distance, point)| RayHit {
                        distance,
                        point,
                        object: v.name.clone(),
                    })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn volumes(&self) -> &[CollisionVolume] {
        &self.volumes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x, 0.0, -0.5), Vec3::new(x + 1.0, 1.0, 0.5))
    }

    #[test]
    fn ray_hits_are_sorted_and_filtered() {
        let mut registry = CollisionRegistry::new();
        registry.insert("far", unit_box_at(5.0));
        registry.insert("near", unit_box_at(2.0));

        let origin = Vec3::new(0.0, 0.5, 0.0);
        let hits = registry.cast_ray(origin, Vec3::X, 10.0, RayTargets::All);
        let names: Vec<_> = hits.iter().map(|h| h.object.as_str()).collect();
        assert_eq!(names, ["near", "far"]);
        assert!((hits[0].distance - 2.0).abs() < 1e-6);

        let only = registry.cast_ray(origin, Vec3::X, 10.0, RayTargets::Only("far"));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].object, "far");

        assert!(registry
            .cast_ray(origin, Vec3::X, 1.5, RayTargets::All)
            .is_empty());
    }

    #[test]
    fn hit_point_lies_exactly_on_entered_face() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.6, 1.0));
        let origin = Vec3::new(0.13, 4.7, -0.21);
        let (distance, point) = bounds.ray_hit(origin, Vec3::NEG_Y, 10.0).unwrap();
        assert_eq!(point.y, 0.6);
        assert!((distance - (4.7 - 0.6)).abs() < 1e-5);
    }

    #[test]
    fn ray_from_inside_sees_nothing() {
        let bounds = unit_box_at(0.0);
        assert!(bounds
            .ray_hit(Vec3::new(0.5, 0.5, 0.0), Vec3::NEG_Y, 5.0)
            .is_none());
    }

    #[test]
    fn empty_boxes_are_skipped() {
        let mut registry = CollisionRegistry::new();
        registry.insert("missing", Aabb::EMPTY);
        assert!(Aabb::EMPTY.is_empty());
        let hits = registry.cast_ray(Vec3::ZERO, Vec3::NEG_Y, 100.0, RayTargets::All);
        assert!(hits.is_empty());
        assert!(!Aabb::EMPTY.intersects(&unit_box_at(0.0)));
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let floor = Aabb::new(Vec3::new(-5.0, -1.0, -5.0), Vec3::new(5.0, 0.0, 5.0));
        let body = Aabb::new(Vec3::new(-0.3, 0.0, -0.3), Vec3::new(0.3, 1.8, 0.3));
        assert!(!body.intersects(&floor));
        assert!(body.offset(Vec3::new(0.0, -0.01, 0.0)).intersects(&floor));
    }

    #[test]
    fn insert_replaces_and_remove_detaches() {
        let mut registry = CollisionRegistry::new();
        registry.insert("a", unit_box_at(0.0));
        registry.insert("b", unit_box_at(3.0));
        registry.insert("a", unit_box_at(9.0));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.volumes()[0].name, "a");
        assert_eq!(registry.get("a").unwrap().min.x, 9.0);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(!registry.contains("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_points_and_union() {
        let bounds = Aabb::from_points([Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0)]);
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 5.0));
        assert_eq!(Aabb::EMPTY.union(bounds), bounds);
    }
}
