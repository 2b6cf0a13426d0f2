//! Hit-capsule shapes and ray intersection

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which combatant owns something
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Bot,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Bot,
            Side::Bot => Side::Player,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Player => f.write_str("player"),
            Side::Bot => f.write_str("bot"),
        }
    }
}

/// Stable identity of a collider registered with a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Name tag a scene reports alongside a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderTag {
    Body(Side),
    Head(Side),
    /// Floor, walls, cover
    World,
}

impl ColliderTag {
    pub fn owner(self) -> Option<Side> {
        match self {
            ColliderTag::Body(side) | ColliderTag::Head(side) => Some(side),
            ColliderTag::World => None,
        }
    }
}

/// Invisible collision volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    Sphere { radius: f32 },
    /// Axis-aligned box
    Box { half_extents: Vec3 },
}

impl HitShape {
    /// Distance along a normalized ray to the first surface of this shape
    /// centred at `center`. A ray starting inside reports zero.
    pub fn intersect(&self, center: Vec3, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            HitShape::Sphere { radius } => ray_sphere(origin, direction, center, radius),
            HitShape::Box { half_extents } => {
                ray_aabb(origin, direction, center - half_extents, center + half_extents)
            }
        }
    }
}

/// A shape placed in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitCapsule {
    pub id: ColliderId,
    pub tag: ColliderTag,
    pub shape: HitShape,
    pub center: Vec3,
}

impl HitCapsule {
    pub fn new(id: ColliderId, tag: ColliderTag, shape: HitShape, center: Vec3) -> Self {
        Self {
            id,
            tag,
            shape,
            center,
        }
    }

    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        self.shape.intersect(self.center, origin, direction)
    }
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let b = to_origin.dot(direction);
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Slab test
fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

/// Horizontal (xz) component of a vector
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit view direction for a yaw/pitch pair. Yaw zero looks down +z.
pub fn view_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
}

/// Horizontal forward vector for a yaw
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Horizontal right vector for a yaw
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Yaw that faces along a horizontal direction
pub fn yaw_towards(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}
