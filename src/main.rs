//! Arena Duel - headless match driver
//!
//! Runs one or more matches between the bot and a scripted stand-in for the
//! human player, logging match events and printing the final stats as JSON.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use arena_duel::config::Config;
use arena_duel::demo::Autopilot;
use arena_duel::game::{
    ArenaScene, HeadlessFocus, MatchController, MatchEvent, MatchEventKind, MatchPhase,
    StatsSnapshot, Winner,
};
use arena_duel::util::random::{RandomSource, SeededRandom};
use arena_duel::util::time::{Clock, ManualClock, SystemClock};

/// How the driver moves time forward between frames
enum Pacing {
    /// Advance a manual clock by one frame, as fast as possible
    FastForward { clock: ManualClock, frame: Duration },
    /// Wait for the next wall-clock frame
    Realtime(Interval),
}

impl Pacing {
    fn new(config: &Config) -> (Self, Box<dyn Clock>) {
        let frame = Duration::from_secs_f64(1.0 / f64::from(config.frame_rate));
        if config.realtime {
            let mut ticker = interval(frame);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            (Pacing::Realtime(ticker), Box::new(SystemClock::new()))
        } else {
            let clock = ManualClock::new();
            (
                Pacing::FastForward {
                    clock: clock.clone(),
                    frame,
                },
                Box::new(clock),
            )
        }
    }

    async fn next_frame(&mut self) {
        match self {
            Pacing::FastForward { clock, frame } => clock.advance(*frame),
            Pacing::Realtime(ticker) => {
                ticker.tick().await;
            }
        }
    }
}

/// Printed once per finished match
#[derive(Debug, Serialize)]
struct MatchReport {
    match_id: Uuid,
    round: u32,
    winner: Option<Winner>,
    stats: StatsSnapshot,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!(
        seed = ?config.seed,
        frame_rate = config.frame_rate,
        realtime = config.realtime,
        matches = config.max_matches,
        "Starting Arena Duel"
    );

    let rng: Box<dyn RandomSource> = match config.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    };
    let (mut pacing, clock) = Pacing::new(&config);

    let mut controller = MatchController::new(ArenaScene::new(), HeadlessFocus::new(), clock, rng)
        .context("failed to create match")?;

    let match_id = controller.id();
    controller.subscribe(MatchEventKind::StateChanged, move |event| {
        if let MatchEvent::StateChanged(phase) = event {
            debug!(%match_id, ?phase, "State changed");
        }
    });
    controller.subscribe(MatchEventKind::HitScored, move |_| {
        debug!(%match_id, "Player hit");
    });

    let autopilot = Autopilot::default();
    for round in 1..=config.max_matches {
        controller
            .start_game()
            .await
            .context("input focus was not granted")?;

        while controller.phase() != MatchPhase::Ended {
            pacing.next_frame().await;
            let input = autopilot.sample(controller.player(), controller.bot());
            controller.tick(&input);
        }

        let report = MatchReport {
            match_id,
            round,
            winner: controller.winner(),
            stats: controller.stats(),
        };
        info!(round, winner = ?report.winner, "Round finished");
        println!("{}", serde_json::to_string_pretty(&report)?);

        if round < config.max_matches {
            controller.restart();
        }
    }

    controller.dispose();
    info!("Driver finished");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
