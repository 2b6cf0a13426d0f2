//! Hitscan weapon: fire-rate limiting and shot resolution

use std::time::Duration;

use glam::Vec3;
use tracing::debug;

use super::combatant::{Damageable, HeadExposure};
use super::geometry::{ColliderTag, Side};
use super::scene::{RayHit, RayQuery, RaycastScene};

/// Shots per second
pub const FIRE_RATE: f32 = 5.0;
/// Damage for a confirmed body hit
pub const BODY_DAMAGE: f32 = 20.0;
/// Damage for a confirmed headshot
pub const HEAD_DAMAGE: f32 = 30.0;
/// A body-tagged hit may be reclassified as a headshot when it lands within
/// this distance of the head...
pub const HEAD_DISTANCE_WINDOW: f32 = 0.3;
/// ...and not further than this beyond it
pub const HEAD_OVERSHOOT_LIMIT: f32 = 0.2;

/// Details of a confirmed hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReport {
    pub headshot: bool,
    pub damage: f32,
    pub killed: bool,
}

/// What a call to [`Weapon::fire`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotOutcome {
    /// Still cooling down, nothing happened
    NotReady,
    /// Fired with nobody to shoot at
    NoTarget,
    /// Fired; the ray hit nothing or something other than the target
    Miss,
    Hit(HitReport),
}

impl ShotOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ShotOutcome::Hit(_))
    }

    /// The cooldown was consumed
    pub fn fired(&self) -> bool {
        !matches!(self, ShotOutcome::NotReady)
    }
}

/// Infinite-ammo hitscan weapon owned by one combatant
#[derive(Debug, Clone)]
pub struct Weapon {
    owner: Side,
    fire_interval: Duration,
    last_fire: Option<Duration>,
}

impl Weapon {
    pub fn new(owner: Side) -> Self {
        Self::with_fire_rate(owner, FIRE_RATE)
    }

    pub fn with_fire_rate(owner: Side, shots_per_second: f32) -> Self {
        let interval_ms = (1000.0 / shots_per_second.max(f32::EPSILON)).round() as u64;
        Self {
            owner,
            fire_interval: Duration::from_millis(interval_ms),
            last_fire: None,
        }
    }

    pub fn owner(&self) -> Side {
        self.owner
    }

    pub fn fire_interval(&self) -> Duration {
        self.fire_interval
    }

    pub fn last_fire(&self) -> Option<Duration> {
        self.last_fire
    }

    pub fn can_fire(&self, now: Duration) -> bool {
        match self.last_fire {
            Some(last) => now.saturating_sub(last) >= self.fire_interval,
            None => true,
        }
    }

    /// Fire one shot from `origin` along `direction` at `target`.
    ///
    /// Any attempt that passes the cooldown check consumes it, including
    /// dry fire with no target or a miss.
    pub fn fire<S: RaycastScene + ?Sized>(
        &mut self,
        now: Duration,
        scene: &S,
        origin: Vec3,
        direction: Vec3,
        target: Option<&mut dyn Damageable>,
        on_hit: Option<&mut dyn FnMut(bool)>,
    ) -> ShotOutcome {
        if !self.can_fire(now) {
            return ShotOutcome::NotReady;
        }
        self.last_fire = Some(now);

        let Some(target) = target else {
            return ShotOutcome::NoTarget;
        };

        let query = RayQuery::new(origin, direction).ignoring(self.owner);
        let Some(hit) = scene.raycast(&query) else {
            return ShotOutcome::Miss;
        };

        let Some(headshot) = classify_hit(&hit, origin, &*target) else {
            debug!(shooter = %self.owner, tag = ?hit.tag, distance = hit.distance, "Shot missed target");
            return ShotOutcome::Miss;
        };

        let damage = if headshot { HEAD_DAMAGE } else { BODY_DAMAGE };
        let outcome = target.take_damage(damage, headshot);
        if let Some(callback) = on_hit {
            callback(headshot);
        }

        debug!(
            shooter = %self.owner,
            target = %target.side(),
            headshot,
            damage,
            killed = outcome.killed,
            "Shot hit"
        );

        ShotOutcome::Hit(HitReport {
            headshot,
            damage,
            killed: outcome.killed,
        })
    }

    /// Allow an immediate shot
    pub fn reset(&mut self) {
        self.last_fire = None;
    }
}

/// Decide whether a ray hit belongs to `target`.
/// Returns `Some(is_headshot)` on a confirmed hit, `None` otherwise.
fn classify_hit(hit: &RayHit, origin: Vec3, target: &dyn Damageable) -> Option<bool> {
    let head = target.head();

    if let HeadExposure::Exposed { collider, .. } = head {
        if hit.collider == collider {
            return Some(true);
        }
    }

    if hit.tag != ColliderTag::Body(target.side()) {
        return None;
    }
    let body_distance = origin.distance(target.position());
    if (hit.distance - body_distance).abs() > target.body_hit_tolerance() {
        return None;
    }

    // Grazing head hits that the head capsule did not catch
    if let HeadExposure::Exposed { position, .. } = head {
        let head_distance = origin.distance(position);
        let overshoot = hit.distance - head_distance;
        if overshoot.abs() <= HEAD_DISTANCE_WINDOW && overshoot <= HEAD_OVERSHOOT_LIMIT {
            return Some(true);
        }
    }

    Some(false)
}
