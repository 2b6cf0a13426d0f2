//! Scripted stand-in for a human player, used by the headless driver

use std::f32::consts::{PI, TAU};

use crate::game::combatant::{Bot, Damageable, Player, MOUSE_SENSITIVITY};
use crate::game::geometry::{flatten, yaw_towards};
use crate::game::input::{ActionInput, InputState, MovementInput};

/// Produces the input a player aiming straight at the bot would give
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Walk towards the bot until within `preferred_range`
    pub approach: bool,
    pub fire: bool,
    pub preferred_range: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            approach: true,
            fire: true,
            preferred_range: 10.0,
        }
    }
}

impl Autopilot {
    /// Stand still and shoot
    pub fn turret() -> Self {
        Self {
            approach: false,
            ..Self::default()
        }
    }

    pub fn sample(&self, player: &Player, bot: &Bot) -> InputState {
        let to_bot = bot.position() - player.eye();
        let distance = to_bot.length();
        if distance <= f32::EPSILON {
            return InputState::default();
        }

        let yaw_error = wrap_angle(yaw_towards(flatten(to_bot)) - player.yaw());
        let pitch_error = (to_bot.y / distance).asin() - player.pitch();

        InputState {
            movement: MovementInput {
                forward: self.approach && flatten(to_bot).length() > self.preferred_range,
                ..Default::default()
            },
            mouse_delta: (
                yaw_error / MOUSE_SENSITIVITY,
                -pitch_error / MOUSE_SENSITIVITY,
            ),
            actions: ActionInput {
                fire: self.fire && !bot.is_dead(),
                ..Default::default()
            },
        }
    }
}

/// Wrap to `(-PI, PI]`
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
