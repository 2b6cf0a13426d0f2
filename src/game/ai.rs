//! Bot decision making: chase vs. attack, strafing, shot timing and aim

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::util::random::RandomSource;

use super::geometry::{flatten, right_from_yaw, yaw_towards};

/// Within this range the bot stops approaching and engages
pub const CHASE_DISTANCE: f32 = 15.0;
/// Approach speed while chasing
pub const CHASE_SPEED: f32 = 3.5;
/// Lateral strafe speed range, drawn every tick
pub const STRAFE_SPEED_MIN: f32 = 1.0;
pub const STRAFE_SPEED_MAX: f32 = 3.0;
/// Minimum time between strafe direction flips
pub const CHASE_STRAFE_FLIP: Duration = Duration::from_millis(2000);
pub const ATTACK_STRAFE_FLIP: Duration = Duration::from_millis(1500);
/// Time between fire attempts while attacking
pub const REACTION_DELAY: Duration = Duration::from_millis(250);
/// No bot fire this soon after the match starts
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);
/// Probability that a shot is aimed true
pub const DEFAULT_ACCURACY: f32 = 0.4;
/// Maximum perpendicular aim offset for an inaccurate shot
pub const SPREAD_SCALE: f32 = 0.15;

/// Bot behaviour mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    #[default]
    Idle,
    Chasing,
    Attacking,
}

/// Output of one AI step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotDecision {
    /// Horizontal velocity to apply this tick
    pub velocity: Vec3,
    /// Facing
    pub yaw: f32,
    /// The bot wants to shoot this tick
    pub fire: bool,
}

/// Bot state machine
pub struct BotBrain {
    state: BotState,
    accuracy: f32,
    rng: Box<dyn RandomSource>,
    strafe_sign: f32,
    last_strafe_flip: Duration,
    last_fire_attempt: Option<Duration>,
}

impl BotBrain {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self::with_accuracy(rng, DEFAULT_ACCURACY)
    }

    pub fn with_accuracy(rng: Box<dyn RandomSource>, accuracy: f32) -> Self {
        Self {
            state: BotState::Idle,
            accuracy: accuracy.clamp(0.0, 1.0),
            rng,
            strafe_sign: 1.0,
            last_strafe_flip: Duration::ZERO,
            last_fire_attempt: None,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }

    /// Advance the state machine one tick.
    ///
    /// `since_match_start` gates the grace period and `weapon_ready` is the
    /// weapon's own cooldown check.
    pub fn think(
        &mut self,
        now: Duration,
        since_match_start: Duration,
        position: Vec3,
        player_position: Vec3,
        weapon_ready: bool,
    ) -> BotDecision {
        let distance = position.distance(player_position);
        let next = if distance <= CHASE_DISTANCE {
            BotState::Attacking
        } else {
            BotState::Chasing
        };
        if next != self.state {
            trace!(from = ?self.state, to = ?next, distance, "Bot state changed");
            self.state = next;
        }

        let to_player = flatten(player_position - position).normalize_or_zero();
        let yaw = if to_player == Vec3::ZERO {
            0.0
        } else {
            yaw_towards(to_player)
        };

        let flip_interval = match self.state {
            BotState::Attacking => ATTACK_STRAFE_FLIP,
            _ => CHASE_STRAFE_FLIP,
        };
        if now.saturating_sub(self.last_strafe_flip) >= flip_interval {
            if self.rng.chance(0.5) {
                self.strafe_sign = -self.strafe_sign;
            }
            self.last_strafe_flip = now;
        }

        let strafe_speed = self.rng.range(STRAFE_SPEED_MIN, STRAFE_SPEED_MAX);
        let mut velocity = right_from_yaw(yaw) * self.strafe_sign * strafe_speed;
        if self.state == BotState::Chasing {
            velocity += to_player * CHASE_SPEED;
        }

        let fire = self.state == BotState::Attacking
            && since_match_start >= GRACE_PERIOD
            && self.reaction_elapsed(now)
            && {
                self.last_fire_attempt = Some(now);
                weapon_ready
            };

        BotDecision {
            velocity,
            yaw,
            fire,
        }
    }

    fn reaction_elapsed(&self, now: Duration) -> bool {
        self.last_fire_attempt
            .map_or(true, |last| now.saturating_sub(last) >= REACTION_DELAY)
    }

    /// Shot direction from `from` towards `to`. With probability
    /// `1 - accuracy` the aim is pushed off-axis by up to `SPREAD_SCALE`.
    pub fn aim(&mut self, from: Vec3, to: Vec3) -> Vec3 {
        let direction = (to - from).normalize_or_zero();
        if direction == Vec3::ZERO || self.rng.chance(self.accuracy) {
            return direction;
        }

        let side = direction
            .cross(Vec3::Y)
            .try_normalize()
            .unwrap_or(Vec3::X);
        let up = side.cross(direction);
        let offset_side = (self.rng.next_f32() * 2.0 - 1.0) * SPREAD_SCALE;
        let offset_up = (self.rng.next_f32() * 2.0 - 1.0) * SPREAD_SCALE;

        (direction + side * offset_side + up * offset_up).normalize_or_zero()
    }

    /// Back to idle after a respawn
    pub fn reset(&mut self, now: Duration) {
        self.state = BotState::Idle;
        self.strafe_sign = 1.0;
        self.last_strafe_flip = now;
        self.last_fire_attempt = None;
    }
}

impl std::fmt::Debug for BotBrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotBrain")
            .field("state", &self.state)
            .field("accuracy", &self.accuracy)
            .field("strafe_sign", &self.strafe_sign)
            .finish()
    }
}
