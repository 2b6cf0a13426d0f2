//! Match state machine and authoritative per-frame update

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::diagnostics::report_capabilities;
use crate::util::random::RandomSource;
use crate::util::time::{elapsed_between, Clock, FrameTimer};

use super::ai::{CHASE_DISTANCE, GRACE_PERIOD};
use super::combatant::{Bot, Damageable, Player};
use super::events::{Event, Observers};
use super::focus::{FocusError, InputFocus};
use super::geometry::Side;
use super::input::InputState;
use super::scene::{CapabilityError, RaycastScene};
use super::stats::{MatchStats, StatsSnapshot};
use super::weapon::ShotOutcome;

/// Length of a match
pub const MATCH_DURATION: Duration = Duration::from_secs(180);
/// Kills needed to win outright
pub const KILL_LIMIT: u32 = 10;
/// Time a dead combatant stays down
pub const RESPAWN_DELAY: Duration = Duration::from_secs(2);

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Waiting for the start action
    Waiting,
    /// Match in progress
    Playing,
    /// Suspended by the player
    Paused,
    /// One side is dead and waiting to respawn
    Respawning,
    /// Match ended
    Ended,
}

/// Outcome of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player,
    Bot,
    Tie,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Player => Winner::Player,
            Side::Bot => Winner::Bot,
        }
    }
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    StateChanged(MatchPhase),
    StatsChanged(StatsSnapshot),
    /// The player landed a shot
    HitScored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchEventKind {
    StateChanged,
    StatsChanged,
    HitScored,
}

impl Event for MatchEvent {
    type Kind = MatchEventKind;

    fn kind(&self) -> MatchEventKind {
        match self {
            MatchEvent::StateChanged(_) => MatchEventKind::StateChanged,
            MatchEvent::StatsChanged(_) => MatchEventKind::StatsChanged,
            MatchEvent::HitScored => MatchEventKind::HitScored,
        }
    }
}

/// Fatal session construction errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("scene '{scene}' is missing a required capability: {source}")]
    UnsupportedCapability {
        scene: String,
        #[source]
        source: CapabilityError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingRespawn {
    side: Side,
    at: Duration,
}

/// The authoritative match. Owns both combatants and drives them from
/// [`MatchController::tick`], once per rendered frame.
///
/// All timers run on a simulation clock: the injected clock minus time
/// spent paused.
pub struct MatchController<S: RaycastScene, F: InputFocus> {
    id: Uuid,
    scene: S,
    focus: F,
    clock: Box<dyn Clock>,
    phase: MatchPhase,
    player: Player,
    bot: Bot,
    stats: MatchStats,
    frame_timer: FrameTimer,
    match_started: Duration,
    life_started: Duration,
    time_remaining: Duration,
    paused_at: Option<Duration>,
    paused_total: Duration,
    respawn: Option<PendingRespawn>,
    winner: Option<Winner>,
    observers: Observers<MatchEvent>,
    disposed: bool,
}

impl<S: RaycastScene, F: InputFocus> MatchController<S, F> {
    /// Create a controller in `Waiting`. Fails before any simulation object
    /// exists if the scene cannot answer raycasts.
    pub fn new(
        mut scene: S,
        focus: F,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, SessionError> {
        scene
            .probe()
            .map_err(|source| SessionError::UnsupportedCapability {
                scene: scene.name().to_string(),
                source,
            })?;
        report_capabilities(scene.name());

        let player = Player::new();
        let bot = Bot::new(rng);
        for capsule in player.hitbox().capsules().into_iter().chain(bot.hitbox().capsules()) {
            scene.upsert_collider(capsule);
        }

        let id = Uuid::new_v4();
        info!(match_id = %id, scene = scene.name(), "Match controller created");

        Ok(Self {
            id,
            scene,
            focus,
            clock,
            phase: MatchPhase::Waiting,
            player,
            bot,
            stats: MatchStats::default(),
            frame_timer: FrameTimer::new(),
            match_started: Duration::ZERO,
            life_started: Duration::ZERO,
            time_remaining: MATCH_DURATION,
            paused_at: None,
            paused_total: Duration::ZERO,
            respawn: None,
            winner: None,
            observers: Observers::new(),
            disposed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == MatchPhase::Paused
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn kills(&self, side: Side) -> u32 {
        self.stats.kills(side)
    }

    pub fn player_health(&self) -> f32 {
        self.player.health.current()
    }

    pub fn bot_health(&self) -> f32 {
        self.bot.health.current()
    }

    /// Set once the match has ended
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Side waiting to respawn, if any
    pub fn respawning_side(&self) -> Option<Side> {
        self.respawn.map(|r| r.side)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn focus(&self) -> &F {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut F {
        &mut self.focus
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn subscribe(&mut self, kind: MatchEventKind, handler: impl FnMut(&MatchEvent) + 'static) {
        self.observers.subscribe(kind, handler);
    }

    /// `Waiting -> Playing`. Requires exclusive input focus; on denial the
    /// phase stays `Waiting` and the call may be retried.
    pub async fn start_game(&mut self) -> Result<(), FocusError> {
        if self.phase != MatchPhase::Waiting || self.disposed {
            debug!(match_id = %self.id, phase = ?self.phase, "Start ignored");
            return Ok(());
        }

        if let Err(err) = self.focus.acquire().await {
            warn!(match_id = %self.id, error = %err, "Could not start match");
            return Err(err);
        }

        let now = self.sim_now();
        self.match_started = now;
        self.life_started = now;
        self.time_remaining = MATCH_DURATION;
        self.player.respawn();
        self.player.set_controls_enabled(true);
        self.bot.respawn(now);
        self.sync_colliders();
        self.frame_timer.restart();

        info!(match_id = %self.id, "Match started");
        self.set_phase(MatchPhase::Playing);
        self.emit_stats();
        Ok(())
    }

    /// `Playing -> Paused`. Releases input focus and freezes all timers.
    pub fn pause(&mut self) {
        if self.phase != MatchPhase::Playing || self.disposed {
            return;
        }
        self.paused_at = Some(self.clock.now());
        self.focus.release();
        self.set_phase(MatchPhase::Paused);
    }

    /// `Paused -> Playing`. Re-acquires input focus; on denial stays paused.
    pub async fn unpause(&mut self) -> Result<(), FocusError> {
        if self.phase != MatchPhase::Paused {
            return Ok(());
        }

        if let Err(err) = self.focus.acquire().await {
            warn!(match_id = %self.id, error = %err, "Could not resume match");
            return Err(err);
        }

        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += elapsed_between(paused_at, self.clock.now());
        }
        self.frame_timer.restart();
        self.set_phase(MatchPhase::Playing);
        Ok(())
    }

    pub async fn toggle_pause(&mut self) -> Result<(), FocusError> {
        match self.phase {
            MatchPhase::Playing => {
                self.pause();
                Ok(())
            }
            MatchPhase::Paused => self.unpause().await,
            _ => Ok(()),
        }
    }

    /// `Ended -> Waiting`. Clears all match data and puts both combatants
    /// back on their spawns. Play resumes only after a new `start_game`.
    pub fn restart(&mut self) {
        if self.phase != MatchPhase::Ended || self.disposed {
            debug!(match_id = %self.id, phase = ?self.phase, "Restart ignored");
            return;
        }

        let now = self.sim_now();
        self.stats = MatchStats::default();
        self.winner = None;
        self.respawn = None;
        self.time_remaining = MATCH_DURATION;
        self.player.respawn();
        self.bot.respawn(now);
        self.sync_colliders();

        info!(match_id = %self.id, "Match reset");
        self.set_phase(MatchPhase::Waiting);
        self.emit_stats();
    }

    /// Free all colliders and focus. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for id in self
            .player
            .hitbox()
            .capsules()
            .into_iter()
            .chain(self.bot.hitbox().capsules())
            .map(|c| c.id)
            .collect::<Vec<_>>()
        {
            self.scene.remove_collider(id);
        }
        self.focus.release();
        self.observers.clear();
        self.disposed = true;
        info!(match_id = %self.id, "Match controller disposed");
    }

    /// Run one frame
    pub fn tick(&mut self, input: &InputState) {
        if self.disposed {
            return;
        }

        match self.phase {
            MatchPhase::Playing => {
                let now = self.sim_now();
                let dt = self.frame_timer.step(now);
                self.tick_playing(now, dt, input);
            }
            MatchPhase::Respawning => {
                let now = self.sim_now();
                self.frame_timer.step(now);
                self.advance_clock(now);
                if let Some(winner) = self.check_win() {
                    self.end_match(winner);
                    return;
                }
                self.advance_respawn(now);
            }
            MatchPhase::Waiting | MatchPhase::Paused | MatchPhase::Ended => {}
        }
    }

    fn tick_playing(&mut self, now: Duration, dt: f32, input: &InputState) {
        self.advance_clock(now);
        if let Some(winner) = self.check_win() {
            self.end_match(winner);
            return;
        }

        if input.actions.pause {
            self.pause();
            return;
        }

        let since_start = elapsed_between(self.match_started, now);
        self.player.update(now, dt, input, &self.scene);
        let bot_wants_fire = self
            .bot
            .update(now, dt, since_start, self.player.position());
        self.sync_colliders();

        self.player_fire(now, input);
        if self.phase == MatchPhase::Playing && bot_wants_fire {
            self.bot_fire(now, since_start);
        }

        self.emit_stats();
    }

    fn player_fire(&mut self, now: Duration, input: &InputState) {
        if !input.actions.fire
            || !self.player.controls_enabled()
            || self.player.is_dead()
            || !self.player.weapon.can_fire(now)
        {
            return;
        }

        let origin = self.player.eye();
        let direction = self.player.view_direction();
        let outcome = self.player.weapon.fire(
            now,
            &self.scene,
            origin,
            direction,
            Some(&mut self.bot),
            None,
        );

        self.stats.record_shot(Side::Player, outcome.is_hit());
        if let ShotOutcome::Hit(report) = outcome {
            if report.headshot {
                self.stats.headshots += 1;
            }
            self.observers.emit(&MatchEvent::HitScored);
            if report.killed {
                self.on_death(Side::Bot, now);
            }
        }
    }

    fn bot_fire(&mut self, now: Duration, since_start: Duration) {
        let in_range = self.bot.position().distance(self.player.position()) <= CHASE_DISTANCE;
        if since_start < GRACE_PERIOD
            || !in_range
            || self.bot.is_dead()
            || self.player.is_dead()
        {
            return;
        }

        let (origin, direction) = self.bot.aim_at(self.player.position());
        let outcome = self.bot.weapon.fire(
            now,
            &self.scene,
            origin,
            direction,
            Some(&mut self.player),
            None,
        );
        if !outcome.fired() {
            return;
        }

        self.stats.record_shot(Side::Bot, outcome.is_hit());
        if let ShotOutcome::Hit(report) = outcome {
            if report.killed {
                self.on_death(Side::Player, now);
            }
        }
    }

    fn on_death(&mut self, victim: Side, now: Duration) {
        let killer = victim.opponent();
        self.stats.record_kill(killer);

        if victim == Side::Player {
            let life = elapsed_between(self.life_started, now);
            self.stats.life_durations.push(life);
        }

        info!(
            match_id = %self.id,
            victim = %victim,
            player_kills = self.stats.player_kills,
            bot_kills = self.stats.bot_kills,
            "Kill"
        );

        if self.stats.kills(killer) >= KILL_LIMIT {
            self.end_match(killer.into());
            return;
        }

        self.respawn = Some(PendingRespawn {
            side: victim,
            at: now + RESPAWN_DELAY,
        });
        self.set_phase(MatchPhase::Respawning);
    }

    fn advance_respawn(&mut self, now: Duration) {
        let Some(pending) = self.respawn else {
            self.set_phase(MatchPhase::Playing);
            return;
        };
        if now < pending.at {
            return;
        }

        match pending.side {
            Side::Player => {
                self.player.respawn();
                self.life_started = now;
            }
            Side::Bot => self.bot.respawn(now),
        }
        self.sync_colliders();
        self.respawn = None;

        debug!(match_id = %self.id, side = %pending.side, "Respawned");
        self.set_phase(MatchPhase::Playing);
    }

    fn advance_clock(&mut self, now: Duration) {
        let elapsed = elapsed_between(self.match_started, now);
        self.time_remaining = MATCH_DURATION.saturating_sub(elapsed);
    }

    fn check_win(&self) -> Option<Winner> {
        if self.stats.player_kills >= KILL_LIMIT {
            return Some(Winner::Player);
        }
        if self.stats.bot_kills >= KILL_LIMIT {
            return Some(Winner::Bot);
        }
        if self.time_remaining.is_zero() {
            let winner = match self.stats.player_kills.cmp(&self.stats.bot_kills) {
                std::cmp::Ordering::Greater => Winner::Player,
                std::cmp::Ordering::Less => Winner::Bot,
                std::cmp::Ordering::Equal => Winner::Tie,
            };
            return Some(winner);
        }
        None
    }

    fn end_match(&mut self, winner: Winner) {
        self.winner = Some(winner);
        self.respawn = None;
        self.player.set_controls_enabled(false);
        self.focus.release();

        info!(
            match_id = %self.id,
            winner = ?winner,
            player_kills = self.stats.player_kills,
            bot_kills = self.stats.bot_kills,
            "Match ended"
        );
        self.set_phase(MatchPhase::Ended);
        self.emit_stats();
    }

    fn sim_now(&self) -> Duration {
        self.clock.now().saturating_sub(self.paused_total)
    }

    fn sync_colliders(&mut self) {
        for capsule in self.player.hitbox().capsules() {
            self.scene.upsert_collider(capsule);
        }
        for capsule in self.bot.hitbox().capsules() {
            self.scene.upsert_collider(capsule);
        }
    }

    fn set_phase(&mut self, phase: MatchPhase) {
        if self.phase == phase {
            return;
        }
        info!(match_id = %self.id, from = ?self.phase, to = ?phase, "Match phase changed");
        self.phase = phase;
        self.observers.emit(&MatchEvent::StateChanged(phase));
    }

    fn emit_stats(&mut self) {
        let snapshot = self.stats.snapshot();
        self.observers.emit(&MatchEvent::StatsChanged(snapshot));
    }
}

impl<S: RaycastScene, F: InputFocus> std::fmt::Debug for MatchController<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("time_remaining", &self.time_remaining)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::demo::Autopilot;
    use crate::game::ai::BotState;
    use crate::game::combatant::{BOT_SPAWN, PLAYER_SPAWN};
    use crate::game::focus::HeadlessFocus;
    use crate::game::geometry::{ColliderId, HitCapsule};
    use crate::game::input::{ActionInput, MovementInput};
    use crate::game::scene::{ArenaScene, RayHit, RayQuery, ARENA_HALF_SIZE};
    use crate::util::random::ScriptedRandom;
    use crate::util::time::ManualClock;

    type Controller = MatchController<ArenaScene, HeadlessFocus>;

    const FRAME_MS: u64 = 16;

    /// Floor only, so nothing blocks line of sight
    fn open_scene() -> ArenaScene {
        let mut scene = ArenaScene::empty();
        scene.add_static(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(ARENA_HALF_SIZE, 0.5, ARENA_HALF_SIZE),
        );
        scene
    }

    fn controller(rng_value: f32) -> (Controller, ManualClock) {
        let clock = ManualClock::new();
        let controller = MatchController::new(
            open_scene(),
            HeadlessFocus::new(),
            Box::new(clock.clone()),
            Box::new(ScriptedRandom::constant(rng_value)),
        )
        .unwrap();
        (controller, clock)
    }

    fn started(rng_value: f32) -> (Controller, ManualClock) {
        let (mut controller, clock) = controller(rng_value);
        tokio_test::block_on(controller.start_game()).unwrap();
        (controller, clock)
    }

    fn run_until_ended(
        controller: &mut Controller,
        clock: &ManualClock,
        mut input: impl FnMut(&Controller) -> InputState,
    ) {
        for _ in 0..50_000 {
            if controller.phase() == MatchPhase::Ended {
                return;
            }
            clock.advance_ms(FRAME_MS);
            let state = input(&*controller);
            controller.tick(&state);
        }
        panic!("match did not end: {:?}", controller);
    }

    fn record_phases(controller: &mut Controller) -> Rc<RefCell<Vec<MatchPhase>>> {
        let phases = Rc::new(RefCell::new(Vec::new()));
        let sink = phases.clone();
        controller.subscribe(MatchEventKind::StateChanged, move |event| {
            if let MatchEvent::StateChanged(phase) = event {
                sink.borrow_mut().push(*phase);
            }
        });
        phases
    }

    struct NoRaycast;

    impl RaycastScene for NoRaycast {
        fn name(&self) -> &str {
            "stub"
        }

        fn probe(&self) -> Result<(), CapabilityError> {
            Err(CapabilityError::RaycastUnavailable("no physics world".to_string()))
        }

        fn raycast(&self, _query: &RayQuery) -> Option<RayHit> {
            None
        }

        fn upsert_collider(&mut self, _capsule: &HitCapsule) {}

        fn remove_collider(&mut self, _id: ColliderId) {}
    }

    #[test]
    fn test_new_controller_is_waiting() {
        let (controller, _clock) = controller(0.5);
        assert_eq!(controller.phase(), MatchPhase::Waiting);
        assert_eq!(controller.time_remaining(), MATCH_DURATION);
        assert_eq!(controller.player_health(), 100.0);
        assert_eq!(controller.bot_health(), 100.0);
        assert_eq!(controller.scene().colliders().len(), 4);
        assert!(controller.winner().is_none());
    }

    #[test]
    fn test_missing_raycast_capability_fails_construction() {
        let result = MatchController::new(
            NoRaycast,
            HeadlessFocus::new(),
            Box::new(ManualClock::new()),
            Box::new(ScriptedRandom::constant(0.5)),
        );
        match result {
            Err(SessionError::UnsupportedCapability { scene, source }) => {
                assert_eq!(scene, "stub");
                assert!(matches!(source, CapabilityError::RaycastUnavailable(_)));
            }
            Ok(_) => panic!("construction should fail"),
        }
    }

    #[test]
    fn test_start_requires_focus_and_can_be_retried() {
        let (mut controller, _clock) = controller(0.5);
        controller.focus_mut().set_refuse(true);

        let err = tokio_test::block_on(controller.start_game()).unwrap_err();
        assert!(matches!(err, FocusError::Denied(_)));
        assert_eq!(controller.phase(), MatchPhase::Waiting);

        controller.focus_mut().set_refuse(false);
        tokio_test::block_on(controller.start_game()).unwrap();
        assert_eq!(controller.phase(), MatchPhase::Playing);
        assert!(controller.focus().is_held());
        assert!(controller.player().controls_enabled());
    }

    #[test]
    fn test_start_outside_waiting_is_ignored() {
        let (mut controller, _clock) = started(0.5);
        tokio_test::block_on(controller.start_game()).unwrap();
        assert_eq!(controller.focus().acquisitions(), 1);

        tokio_test::block_on(controller.unpause()).unwrap();
        assert_eq!(controller.phase(), MatchPhase::Playing);
    }

    #[test]
    fn test_pause_freezes_match_clock() {
        let (mut controller, clock) = started(0.5);
        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        assert_eq!(controller.time_remaining(), Duration::from_secs(179));

        let pause = InputState {
            actions: ActionInput {
                pause: true,
                ..Default::default()
            },
            ..Default::default()
        };
        clock.advance_ms(FRAME_MS);
        controller.tick(&pause);
        assert!(controller.is_paused());
        assert!(!controller.focus().is_held());

        let busy = InputState {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            mouse_delta: (120.0, 0.0),
            actions: ActionInput {
                fire: true,
                jump: true,
                ..Default::default()
            },
        };
        let player_at = controller.player().position();
        let player_yaw = controller.player().yaw();
        let bot_at = controller.bot().position();
        let stats = controller.stats();
        for _ in 0..10 {
            clock.advance(Duration::from_secs(3));
            controller.tick(&busy);
        }
        assert!(controller.is_paused());
        assert_eq!(controller.player().position(), player_at);
        assert_eq!(controller.player().yaw(), player_yaw);
        assert_eq!(controller.bot().position(), bot_at);
        assert_eq!(controller.stats(), stats);
        assert!(controller.bot.weapon.last_fire().is_none());

        tokio_test::block_on(controller.toggle_pause()).unwrap();
        assert_eq!(controller.phase(), MatchPhase::Playing);

        controller.tick(&InputState::default());
        assert_eq!(
            controller.time_remaining(),
            Duration::from_secs(179) - Duration::from_millis(FRAME_MS)
        );
    }

    #[test]
    fn test_denied_unpause_stays_paused() {
        let (mut controller, _clock) = started(0.5);
        controller.pause();
        controller.focus_mut().set_refuse(true);

        assert!(tokio_test::block_on(controller.unpause()).is_err());
        assert!(controller.is_paused());
    }

    #[test]
    fn test_kill_limit_checked_before_any_fire() {
        let (mut controller, clock) = started(0.5);
        controller.stats.bot_kills = KILL_LIMIT;

        let fire = InputState {
            actions: ActionInput {
                fire: true,
                ..Default::default()
            },
            ..Default::default()
        };
        clock.advance_ms(FRAME_MS);
        controller.tick(&fire);

        assert_eq!(controller.phase(), MatchPhase::Ended);
        assert_eq!(controller.winner(), Some(Winner::Bot));
        assert_eq!(controller.stats().player_shots_fired, 0);
        assert!(!controller.player().controls_enabled());
        assert!(!controller.focus().is_held());
    }

    #[test]
    fn test_timeout_with_equal_kills_is_a_tie() {
        let (mut controller, clock) = started(0.5);
        clock.advance(MATCH_DURATION);
        controller.tick(&InputState::default());

        assert_eq!(controller.phase(), MatchPhase::Ended);
        assert_eq!(controller.time_remaining(), Duration::ZERO);
        assert_eq!(controller.winner(), Some(Winner::Tie));
    }

    #[test]
    fn test_timeout_awards_the_leader() {
        let (mut controller, clock) = started(0.5);
        controller.stats.player_kills = 3;
        controller.stats.bot_kills = 2;
        clock.advance(MATCH_DURATION + Duration::from_secs(5));
        controller.tick(&InputState::default());
        assert_eq!(controller.winner(), Some(Winner::Player));
    }

    #[test]
    fn test_player_death_respawns_after_delay() {
        let (mut controller, clock) = started(0.5);
        let forward = InputState {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        };
        clock.advance(Duration::from_secs(1));
        controller.tick(&forward);
        clock.advance(Duration::from_secs(4));
        controller.tick(&forward);
        assert_ne!(controller.player().position(), PLAYER_SPAWN);

        let now = controller.sim_now();
        controller.player.take_damage(100.0, false);
        controller.on_death(Side::Player, now);

        assert_eq!(controller.phase(), MatchPhase::Respawning);
        assert_eq!(controller.respawning_side(), Some(Side::Player));
        assert_eq!(controller.kills(Side::Bot), 1);
        assert_eq!(controller.stats().lives_recorded, 1);
        assert_eq!(controller.stats().average_life_secs, 5.0);

        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        assert_eq!(controller.phase(), MatchPhase::Respawning);
        assert_eq!(controller.time_remaining(), Duration::from_secs(174));

        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        assert_eq!(controller.phase(), MatchPhase::Playing);
        assert_eq!(controller.player_health(), 100.0);
        assert_eq!(controller.player().position(), PLAYER_SPAWN);
        assert_eq!(controller.player().yaw(), 0.0);
        assert!(controller.respawning_side().is_none());
    }

    #[test]
    fn test_bot_death_respawns_idle_with_ready_weapon() {
        let (mut controller, clock) = started(0.5);
        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        assert_ne!(controller.bot().position(), BOT_SPAWN);
        assert_eq!(controller.bot().state(), BotState::Chasing);

        let now = controller.sim_now();
        let outcome = controller.bot.weapon.fire(
            now,
            &controller.scene,
            Vec3::ZERO,
            Vec3::Z,
            None,
            None,
        );
        assert_eq!(outcome, ShotOutcome::NoTarget);
        assert!(!controller.bot.weapon.can_fire(now));

        controller.bot.take_damage(100.0, false);
        controller.on_death(Side::Bot, now);
        assert_eq!(controller.respawning_side(), Some(Side::Bot));
        assert_eq!(controller.kills(Side::Player), 1);
        assert_eq!(controller.stats().lives_recorded, 0);

        clock.advance(RESPAWN_DELAY);
        controller.tick(&InputState::default());

        let now = controller.sim_now();
        assert_eq!(controller.phase(), MatchPhase::Playing);
        assert_eq!(controller.bot().position(), BOT_SPAWN);
        assert_eq!(controller.bot().state(), BotState::Idle);
        assert_eq!(controller.bot_health(), 100.0);
        assert!(controller.bot().weapon.can_fire(now));
    }

    #[test]
    fn test_time_out_during_respawn_ends_match() {
        let (mut controller, clock) = started(0.5);
        let phases = record_phases(&mut controller);
        clock.advance(MATCH_DURATION - Duration::from_millis(500));
        controller.tick(&InputState::default());

        let now = controller.sim_now();
        controller.player.take_damage(100.0, false);
        controller.on_death(Side::Player, now);
        assert_eq!(controller.phase(), MatchPhase::Respawning);

        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());

        assert_eq!(controller.phase(), MatchPhase::Ended);
        assert_eq!(controller.winner(), Some(Winner::Bot));
        assert_eq!(controller.time_remaining(), Duration::ZERO);
        assert!(controller.respawning_side().is_none());

        clock.advance(RESPAWN_DELAY);
        controller.tick(&InputState::default());
        assert_eq!(controller.phase(), MatchPhase::Ended);
        assert_eq!(
            *phases.borrow(),
            vec![MatchPhase::Respawning, MatchPhase::Ended]
        );
    }

    #[test]
    fn test_accurate_bot_wins_against_idle_player() {
        // 0.1: every aim roll lands, strafe flips on every interval
        let (mut controller, clock) = started(0.1);
        run_until_ended(&mut controller, &clock, |_| InputState::default());

        assert_eq!(controller.winner(), Some(Winner::Bot));
        assert_eq!(controller.kills(Side::Bot), KILL_LIMIT);
        assert_eq!(controller.kills(Side::Player), 0);

        let stats = controller.stats();
        assert_eq!(stats.lives_recorded, KILL_LIMIT);
        assert!(stats.bot_shots_hit >= KILL_LIMIT * 4);
        assert_eq!(stats.player_shots_fired, 0);
        assert!(controller.time_remaining() > Duration::ZERO);
    }

    #[test]
    fn test_player_turret_beats_inaccurate_bot() {
        // 0.9: every bot aim roll misses
        let (mut controller, clock) = started(0.9);
        let hits = Rc::new(RefCell::new(0u32));
        let sink = hits.clone();
        controller.subscribe(MatchEventKind::HitScored, move |_| *sink.borrow_mut() += 1);

        let autopilot = Autopilot::turret();
        run_until_ended(&mut controller, &clock, |c| {
            autopilot.sample(c.player(), c.bot())
        });

        assert_eq!(controller.winner(), Some(Winner::Player));
        assert_eq!(controller.kills(Side::Player), KILL_LIMIT);

        let stats = controller.stats();
        assert_eq!(stats.player_shots_hit, *hits.borrow());
        assert!(stats.player_accuracy > 50.0);
        assert_eq!(stats.bot_shots_hit, 0);
        assert_eq!(stats.lives_recorded, 0);
    }

    #[test]
    fn test_restart_only_from_ended() {
        let (mut controller, clock) = started(0.5);
        controller.restart();
        assert_eq!(controller.phase(), MatchPhase::Playing);

        controller.stats.player_kills = 4;
        clock.advance(MATCH_DURATION);
        controller.tick(&InputState::default());
        assert_eq!(controller.winner(), Some(Winner::Player));

        controller.restart();
        assert_eq!(controller.phase(), MatchPhase::Waiting);
        assert!(controller.winner().is_none());
        assert_eq!(controller.stats(), StatsSnapshot::default());
        assert_eq!(controller.time_remaining(), MATCH_DURATION);
        assert_eq!(controller.player().position(), PLAYER_SPAWN);

        tokio_test::block_on(controller.start_game()).unwrap();
        assert_eq!(controller.phase(), MatchPhase::Playing);
        clock.advance(Duration::from_secs(1));
        controller.tick(&InputState::default());
        assert_eq!(controller.time_remaining(), Duration::from_secs(179));
    }

    #[test]
    fn test_state_events_follow_transitions() {
        let (mut controller, clock) = controller(0.5);
        let phases = record_phases(&mut controller);

        tokio_test::block_on(controller.start_game()).unwrap();
        controller.pause();
        tokio_test::block_on(controller.unpause()).unwrap();
        clock.advance(MATCH_DURATION);
        controller.tick(&InputState::default());
        controller.restart();

        assert_eq!(
            *phases.borrow(),
            vec![
                MatchPhase::Playing,
                MatchPhase::Paused,
                MatchPhase::Playing,
                MatchPhase::Ended,
                MatchPhase::Waiting,
            ]
        );
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut controller, clock) = started(0.5);
        let phases = record_phases(&mut controller);

        controller.dispose();
        controller.dispose();
        assert!(controller.is_disposed());
        assert!(controller.scene().colliders().is_empty());
        assert!(!controller.focus().is_held());

        clock.advance(MATCH_DURATION);
        controller.tick(&InputState::default());
        assert_eq!(controller.phase(), MatchPhase::Playing);
        assert!(phases.borrow().is_empty());

        controller.pause();
        assert_eq!(controller.phase(), MatchPhase::Playing);
    }

    #[test]
    fn test_restart_after_dispose_keeps_scene_empty() {
        let (mut controller, clock) = started(0.5);
        clock.advance(MATCH_DURATION);
        controller.tick(&InputState::default());
        assert_eq!(controller.phase(), MatchPhase::Ended);

        controller.dispose();
        controller.restart();

        assert_eq!(controller.phase(), MatchPhase::Ended);
        assert!(controller.scene().colliders().is_empty());
        assert_eq!(controller.winner(), Some(Winner::Tie));
    }
}
