//! Match statistics

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::geometry::Side;

/// Running totals for one match
#[derive(Debug, Clone, Default)]
pub struct MatchStats {
    pub player_kills: u32,
    pub bot_kills: u32,
    pub player_shots_fired: u32,
    pub player_shots_hit: u32,
    pub bot_shots_fired: u32,
    pub bot_shots_hit: u32,
    /// Player headshots on the bot
    pub headshots: u32,
    /// Completed player lives
    pub life_durations: Vec<Duration>,
}

impl MatchStats {
    pub fn kills(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_kills,
            Side::Bot => self.bot_kills,
        }
    }

    pub fn record_kill(&mut self, killer: Side) {
        match killer {
            Side::Player => self.player_kills += 1,
            Side::Bot => self.bot_kills += 1,
        }
    }

    pub fn record_shot(&mut self, shooter: Side, hit: bool) {
        let (fired, landed) = match shooter {
            Side::Player => (&mut self.player_shots_fired, &mut self.player_shots_hit),
            Side::Bot => (&mut self.bot_shots_fired, &mut self.bot_shots_hit),
        };
        *fired += 1;
        if hit {
            *landed += 1;
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            player_kills: self.player_kills,
            bot_kills: self.bot_kills,
            player_shots_fired: self.player_shots_fired,
            player_shots_hit: self.player_shots_hit,
            bot_shots_fired: self.bot_shots_fired,
            bot_shots_hit: self.bot_shots_hit,
            headshots: self.headshots,
            player_accuracy: percentage(self.player_shots_hit, self.player_shots_fired),
            bot_accuracy: percentage(self.bot_shots_hit, self.bot_shots_fired),
            headshot_rate: percentage(self.headshots, self.player_shots_hit),
            average_life_secs: average_secs(&self.life_durations),
            lives_recorded: self.life_durations.len() as u32,
        }
    }
}

/// Derived view published to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub player_kills: u32,
    pub bot_kills: u32,
    pub player_shots_fired: u32,
    pub player_shots_hit: u32,
    pub bot_shots_fired: u32,
    pub bot_shots_hit: u32,
    pub headshots: u32,
    /// Percent, 0 when no shots were fired
    pub player_accuracy: f32,
    pub bot_accuracy: f32,
    /// Percent of player hits that were headshots
    pub headshot_rate: f32,
    pub average_life_secs: f32,
    pub lives_recorded: u32,
}

fn percentage(part: u32, whole: u32) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32 * 100.0
    }
}

fn average_secs(durations: &[Duration]) -> f32 {
    if durations.is_empty() {
        return 0.0;
    }
    let total: Duration = durations.iter().sum();
    total.as_secs_f32() / durations.len() as f32
}
