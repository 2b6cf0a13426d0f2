//! Raycast scene contract and the headless arena implementation

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{ColliderId, ColliderTag, HitCapsule, HitShape, Side};

/// A ray cast by one combatant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    pub origin: Vec3,
    /// Normalized
    pub direction: Vec3,
    /// Colliders owned by this side are ignored (the shooter's own capsules)
    pub ignore: Option<Side>,
}

impl RayQuery {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            ignore: None,
        }
    }

    pub fn ignoring(mut self, side: Side) -> Self {
        self.ignore = Some(side);
        self
    }
}

/// Nearest intersection reported by a scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub collider: ColliderId,
    pub tag: ColliderTag,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug, Error, PartialEq)]
pub enum CapabilityError {
    #[error("raycast queries are not available: {0}")]
    RaycastUnavailable(String),
}

/// Host-provided geometry the simulation shoots rays into
pub trait RaycastScene {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Verify the host can answer raycasts at all
    fn probe(&self) -> Result<(), CapabilityError>;

    /// Nearest hit along the ray, if any
    fn raycast(&self, query: &RayQuery) -> Option<RayHit>;

    /// Insert or move a collider
    fn upsert_collider(&mut self, capsule: &HitCapsule);

    /// Free a collider. Unknown ids are ignored.
    fn remove_collider(&mut self, id: ColliderId);
}

/// Half width of the square arena floor
pub const ARENA_HALF_SIZE: f32 = 30.0;
/// Combatants stay this far from the walls
pub const WALL_MARGIN: f32 = 1.0;
const WALL_HEIGHT: f32 = 6.0;
const WALL_THICKNESS: f32 = 0.5;

/// Ids at or above this value are static arena geometry
const STATIC_ID_BASE: u32 = 1000;

/// Analytic scene: floor, perimeter walls, cover pillars and whatever
/// combatant capsules have been registered.
#[derive(Debug, Clone)]
pub struct ArenaScene {
    statics: Vec<HitCapsule>,
    dynamic: Vec<HitCapsule>,
}

impl ArenaScene {
    pub fn new() -> Self {
        let mut scene = Self::empty();

        let floor = Vec3::new(ARENA_HALF_SIZE, 0.5, ARENA_HALF_SIZE);
        scene.add_static(Vec3::new(0.0, -0.5, 0.0), floor);

        let wall_x = Vec3::new(WALL_THICKNESS, WALL_HEIGHT / 2.0, ARENA_HALF_SIZE);
        let wall_z = Vec3::new(ARENA_HALF_SIZE, WALL_HEIGHT / 2.0, WALL_THICKNESS);
        let edge = ARENA_HALF_SIZE + WALL_THICKNESS;
        scene.add_static(Vec3::new(edge, WALL_HEIGHT / 2.0, 0.0), wall_x);
        scene.add_static(Vec3::new(-edge, WALL_HEIGHT / 2.0, 0.0), wall_x);
        scene.add_static(Vec3::new(0.0, WALL_HEIGHT / 2.0, edge), wall_z);
        scene.add_static(Vec3::new(0.0, WALL_HEIGHT / 2.0, -edge), wall_z);

        let pillar = Vec3::new(1.0, 2.0, 1.0);
        for (x, z) in [(-10.0, -8.0), (10.0, -8.0), (-10.0, 8.0), (10.0, 8.0)] {
            scene.add_static(Vec3::new(x, 2.0, z), pillar);
        }

        scene
    }

    /// A scene with no static geometry
    pub fn empty() -> Self {
        Self {
            statics: Vec::new(),
            dynamic: Vec::new(),
        }
    }

    /// Add an axis-aligned world box
    pub fn add_static(&mut self, center: Vec3, half_extents: Vec3) -> ColliderId {
        let id = ColliderId(STATIC_ID_BASE + self.statics.len() as u32);
        self.statics.push(HitCapsule::new(
            id,
            ColliderTag::World,
            HitShape::Box { half_extents },
            center,
        ));
        id
    }

    /// Registered combatant colliders
    pub fn colliders(&self) -> &[HitCapsule] {
        &self.dynamic
    }

    pub fn collider(&self, id: ColliderId) -> Option<&HitCapsule> {
        self.dynamic.iter().find(|c| c.id == id)
    }
}

impl Default for ArenaScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RaycastScene for ArenaScene {
    fn name(&self) -> &str {
        "arena"
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        Ok(())
    }

    fn raycast(&self, query: &RayQuery) -> Option<RayHit> {
        if query.direction == Vec3::ZERO {
            return None;
        }

        self.statics
            .iter()
            .chain(self.dynamic.iter())
            .filter(|c| query.ignore.is_none() || c.tag.owner() != query.ignore)
            .filter_map(|c| c.intersect(query.origin, query.direction).map(|t| (c, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, distance)| RayHit {
                collider: c.id,
                tag: c.tag,
                distance,
                point: query.origin + query.direction * distance,
            })
    }

    fn upsert_collider(&mut self, capsule: &HitCapsule) {
        match self.dynamic.iter_mut().find(|c| c.id == capsule.id) {
            Some(existing) => *existing = *capsule,
            None => self.dynamic.push(*capsule),
        }
    }

    fn remove_collider(&mut self, id: ColliderId) {
        self.dynamic.retain(|c| c.id != id);
    }
}

/// Clamp a position to the playable area
pub fn clamp_to_arena(position: Vec3) -> Vec3 {
    let limit = ARENA_HALF_SIZE - WALL_MARGIN;
    Vec3::new(
        position.x.clamp(-limit, limit),
        position.y,
        position.z.clamp(-limit, limit),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot_body(center: Vec3) -> HitCapsule {
        HitCapsule::new(
            ColliderId(2),
            ColliderTag::Body(Side::Bot),
            HitShape::Box {
                half_extents: Vec3::new(0.6, 1.5, 0.6),
            },
            center,
        )
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut scene = ArenaScene::new();
        scene.upsert_collider(&bot_body(Vec3::new(0.0, 1.5, 5.0)));

        let hit = scene
            .raycast(&RayQuery::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z))
            .unwrap();
        assert_eq!(hit.tag, ColliderTag::Body(Side::Bot));
        assert!((hit.distance - 4.4).abs() < 1e-4);
    }

    #[test]
    fn test_wall_hit_when_nothing_else() {
        let scene = ArenaScene::new();
        let hit = scene
            .raycast(&RayQuery::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z))
            .unwrap();
        assert_eq!(hit.tag, ColliderTag::World);
        assert!((hit.distance - ARENA_HALF_SIZE).abs() < 1e-4);
    }

    #[test]
    fn test_ignore_skips_own_colliders() {
        let mut scene = ArenaScene::empty();
        scene.upsert_collider(&bot_body(Vec3::ZERO));
        let query = RayQuery::new(Vec3::ZERO, Vec3::Z);
        assert!(scene.raycast(&query).is_some());
        assert!(scene.raycast(&query.ignoring(Side::Bot)).is_none());
    }

    #[test]
    fn test_upsert_moves_and_remove_frees() {
        let mut scene = ArenaScene::empty();
        scene.upsert_collider(&bot_body(Vec3::ZERO));
        scene.upsert_collider(&bot_body(Vec3::new(0.0, 0.0, 3.0)));
        assert_eq!(scene.colliders().len(), 1);
        assert_eq!(
            scene.collider(ColliderId(2)).map(|c| c.center),
            Some(Vec3::new(0.0, 0.0, 3.0))
        );

        scene.remove_collider(ColliderId(2));
        scene.remove_collider(ColliderId(2));
        assert!(scene.colliders().is_empty());
    }

    #[test]
    fn test_clamp_to_arena() {
        let clamped = clamp_to_arena(Vec3::new(100.0, 1.0, -100.0));
        assert_eq!(clamped, Vec3::new(29.0, 1.0, -29.0));
    }
}
