//! Match simulation modules

pub mod ai;
pub mod combatant;
pub mod events;
pub mod focus;
pub mod geometry;
pub mod health;
pub mod input;
pub mod r#match;
pub mod scene;
pub mod stats;
pub mod weapon;

pub use ai::{BotBrain, BotState};
pub use combatant::{Bot, Damageable, HeadExposure, Player};
pub use focus::{FocusError, HeadlessFocus, InputFocus};
pub use geometry::Side;
pub use health::Health;
pub use input::{ActionInput, InputState, MovementInput};
pub use r#match::{MatchController, MatchEvent, MatchEventKind, MatchPhase, SessionError, Winner};
pub use scene::{ArenaScene, RayHit, RayQuery, RaycastScene};
pub use stats::StatsSnapshot;
pub use weapon::{ShotOutcome, Weapon};
