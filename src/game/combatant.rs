//! The two combatants: human-driven player and AI-driven bot

use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use glam::Vec3;

use crate::util::random::RandomSource;

use super::ai::{BotBrain, BotState};
use super::geometry::{
    forward_from_yaw, right_from_yaw, view_direction, ColliderId, ColliderTag, HitCapsule,
    HitShape, Side,
};
use super::health::{DamageOutcome, Health};
use super::input::InputState;
use super::scene::{clamp_to_arena, RayQuery, RaycastScene};
use super::weapon::Weapon;

pub const PLAYER_SPAWN: Vec3 = Vec3::new(0.0, 1.0, -20.0);
pub const BOT_SPAWN: Vec3 = Vec3::new(0.0, 1.5, 20.0);

/// Height of the player's body centre above the floor when standing
pub const PLAYER_STAND_HEIGHT: f32 = 1.0;
pub const PLAYER_HEAD_OFFSET: f32 = 0.5;
pub const PLAYER_HEAD_RADIUS: f32 = 0.25;
pub const PLAYER_BODY_HALF_EXTENTS: Vec3 = Vec3::splat(0.4);
/// Body hit confirmation tolerance when the player is the target
pub const PLAYER_BODY_TOLERANCE: f32 = 1.5;

pub const BOT_HEAD_OFFSET: f32 = 2.0;
pub const BOT_HEAD_RADIUS: f32 = 0.4;
pub const BOT_BODY_HALF_EXTENTS: Vec3 = Vec3::new(0.6, 1.5, 0.6);
/// Body hit confirmation tolerance when the bot is the target
pub const BOT_BODY_TOLERANCE: f32 = 2.0;

pub const PLAYER_MOVE_SPEED: f32 = 6.0;
/// Radians per unit of mouse delta
pub const MOUSE_SENSITIVITY: f32 = 0.002;
pub const JUMP_IMPULSE: f32 = 5.0;
pub const GRAVITY: f32 = 15.0;
/// Minimum time between downward ground probes
pub const GROUND_CHECK_INTERVAL: Duration = Duration::from_millis(50);
const GROUND_SNAP: f32 = 0.1;

const PLAYER_BODY_ID: ColliderId = ColliderId(1);
const PLAYER_HEAD_ID: ColliderId = ColliderId(2);
const BOT_BODY_ID: ColliderId = ColliderId(3);
const BOT_HEAD_ID: ColliderId = ColliderId(4);

/// Whether a target exposes a separate head volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadExposure {
    Exposed { position: Vec3, collider: ColliderId },
    Hidden,
}

/// Anything a weapon can damage
pub trait Damageable {
    fn side(&self) -> Side;

    /// Tracked position used for body hit confirmation
    fn position(&self) -> Vec3;

    fn take_damage(&mut self, amount: f32, is_headshot: bool) -> DamageOutcome;

    fn is_dead(&self) -> bool;

    fn head(&self) -> HeadExposure {
        HeadExposure::Hidden
    }

    /// How far a body-tagged hit may be from `position()` and still count
    fn body_hit_tolerance(&self) -> f32;
}

/// Body box plus head sphere that follow a combatant
#[derive(Debug, Clone, Copy)]
pub struct Hitbox {
    pub body: HitCapsule,
    pub head: HitCapsule,
    head_offset: f32,
}

impl Hitbox {
    fn new(
        side: Side,
        ids: (ColliderId, ColliderId),
        body_half_extents: Vec3,
        head_radius: f32,
        head_offset: f32,
        position: Vec3,
    ) -> Self {
        let mut hitbox = Self {
            body: HitCapsule::new(
                ids.0,
                ColliderTag::Body(side),
                HitShape::Box {
                    half_extents: body_half_extents,
                },
                position,
            ),
            head: HitCapsule::new(
                ids.1,
                ColliderTag::Head(side),
                HitShape::Sphere {
                    radius: head_radius,
                },
                position,
            ),
            head_offset,
        };
        hitbox.place(position);
        hitbox
    }

    /// Move both volumes to follow `position`
    pub fn place(&mut self, position: Vec3) {
        self.body.center = position;
        self.head.center = position + Vec3::Y * self.head_offset;
    }

    pub fn capsules(&self) -> [&HitCapsule; 2] {
        [&self.body, &self.head]
    }

    fn exposure(&self) -> HeadExposure {
        HeadExposure::Exposed {
            position: self.head.center,
            collider: self.head.id,
        }
    }
}

/// Human-controlled combatant
#[derive(Debug)]
pub struct Player {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    vertical_velocity: f32,
    grounded: bool,
    last_ground_check: Option<Duration>,
    controls_enabled: bool,
    hitbox: Hitbox,
    pub health: Health,
    pub weapon: Weapon,
}

impl Player {
    pub fn new() -> Self {
        Self {
            position: PLAYER_SPAWN,
            yaw: 0.0,
            pitch: 0.0,
            vertical_velocity: 0.0,
            grounded: true,
            last_ground_check: None,
            controls_enabled: true,
            hitbox: Hitbox::new(
                Side::Player,
                (PLAYER_BODY_ID, PLAYER_HEAD_ID),
                PLAYER_BODY_HALF_EXTENTS,
                PLAYER_HEAD_RADIUS,
                PLAYER_HEAD_OFFSET,
                PLAYER_SPAWN,
            ),
            health: Health::new(),
            weapon: Weapon::new(Side::Player),
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn hitbox(&self) -> &Hitbox {
        &self.hitbox
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    /// Eye position (shots start here)
    pub fn eye(&self) -> Vec3 {
        self.hitbox.head.center
    }

    pub fn view_direction(&self) -> Vec3 {
        view_direction(self.yaw, self.pitch)
    }

    /// Apply one tick of input. Look is applied unsmoothed.
    pub fn update<S: RaycastScene + ?Sized>(
        &mut self,
        now: Duration,
        dt: f32,
        input: &InputState,
        scene: &S,
    ) {
        if self.controls_enabled {
            self.apply_look(input.mouse_delta.0, input.mouse_delta.1);

            let (forward, strafe) = input.movement.axes();
            let wish = forward_from_yaw(self.yaw) * forward + right_from_yaw(self.yaw) * strafe;
            self.position += wish.normalize_or_zero() * PLAYER_MOVE_SPEED * dt;
        }

        self.check_ground(now, scene);
        if self.controls_enabled && input.actions.jump && self.grounded {
            self.vertical_velocity = JUMP_IMPULSE;
            self.grounded = false;
        }

        self.vertical_velocity -= GRAVITY * dt;
        self.position.y += self.vertical_velocity * dt;
        if self.position.y <= PLAYER_STAND_HEIGHT {
            self.position.y = PLAYER_STAND_HEIGHT;
            self.vertical_velocity = 0.0;
        }

        self.position = clamp_to_arena(self.position);
        self.hitbox.place(self.position);
    }

    fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    fn check_ground<S: RaycastScene + ?Sized>(&mut self, now: Duration, scene: &S) {
        let due = self
            .last_ground_check
            .map_or(true, |last| now.saturating_sub(last) >= GROUND_CHECK_INTERVAL);
        if !due {
            return;
        }
        self.last_ground_check = Some(now);

        let query = RayQuery::new(self.position, Vec3::NEG_Y).ignoring(Side::Player);
        self.grounded = scene
            .raycast(&query)
            .is_some_and(|hit| hit.distance <= PLAYER_STAND_HEIGHT + GROUND_SNAP);
    }

    /// Back to spawn with full health and a ready weapon
    pub fn respawn(&mut self) {
        self.position = PLAYER_SPAWN;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.vertical_velocity = 0.0;
        self.grounded = true;
        self.last_ground_check = None;
        self.hitbox.place(self.position);
        self.health.reset();
        self.weapon.reset();
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Damageable for Player {
    fn side(&self) -> Side {
        Side::Player
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn take_damage(&mut self, amount: f32, is_headshot: bool) -> DamageOutcome {
        self.health.take_damage(amount, is_headshot)
    }

    fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    fn head(&self) -> HeadExposure {
        self.hitbox.exposure()
    }

    fn body_hit_tolerance(&self) -> f32 {
        PLAYER_BODY_TOLERANCE
    }
}

/// AI-controlled combatant
#[derive(Debug)]
pub struct Bot {
    position: Vec3,
    yaw: f32,
    hitbox: Hitbox,
    brain: BotBrain,
    pub health: Health,
    pub weapon: Weapon,
}

impl Bot {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self::with_brain(BotBrain::new(rng))
    }

    pub fn with_brain(brain: BotBrain) -> Self {
        Self {
            position: BOT_SPAWN,
            yaw: std::f32::consts::PI,
            hitbox: Hitbox::new(
                Side::Bot,
                (BOT_BODY_ID, BOT_HEAD_ID),
                BOT_BODY_HALF_EXTENTS,
                BOT_HEAD_RADIUS,
                BOT_HEAD_OFFSET,
                BOT_SPAWN,
            ),
            brain,
            health: Health::new(),
            weapon: Weapon::new(Side::Bot),
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn state(&self) -> BotState {
        self.brain.state()
    }

    pub fn hitbox(&self) -> &Hitbox {
        &self.hitbox
    }

    pub fn eye(&self) -> Vec3 {
        self.hitbox.head.center
    }

    /// Run AI and movement for one tick. Returns `true` when the bot wants
    /// to shoot this tick. Dead bots do nothing.
    pub fn update(
        &mut self,
        now: Duration,
        dt: f32,
        since_match_start: Duration,
        player_position: Vec3,
    ) -> bool {
        if self.health.is_dead() {
            return false;
        }

        let decision = self.brain.think(
            now,
            since_match_start,
            self.position,
            player_position,
            self.weapon.can_fire(now),
        );

        self.yaw = decision.yaw;
        self.position = clamp_to_arena(self.position + decision.velocity * dt);
        self.hitbox.place(self.position);
        decision.fire
    }

    /// Origin and (possibly inaccurate) direction of a shot at `target`
    pub fn aim_at(&mut self, target: Vec3) -> (Vec3, Vec3) {
        let origin = self.eye();
        (origin, self.brain.aim(origin, target))
    }

    pub fn respawn(&mut self, now: Duration) {
        self.position = BOT_SPAWN;
        self.yaw = std::f32::consts::PI;
        self.hitbox.place(self.position);
        self.brain.reset(now);
        self.health.reset();
        self.weapon.reset();
    }
}

impl Damageable for Bot {
    fn side(&self) -> Side {
        Side::Bot
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn take_damage(&mut self, amount: f32, is_headshot: bool) -> DamageOutcome {
        self.health.take_damage(amount, is_headshot)
    }

    fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    fn head(&self) -> HeadExposure {
        self.hitbox.exposure()
    }

    fn body_hit_tolerance(&self) -> f32 {
        BOT_BODY_TOLERANCE
    }
}
