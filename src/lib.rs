//! Arena Duel - authoritative match simulation for a one-on-one arena shooter
//!
//! The engine owns the per-frame update loop:
//! - player movement and look from sampled input
//! - bot decision making (chase / attack, strafing, aim error)
//! - hitscan weapon fire resolved against body and head hit volumes
//! - the match state machine (waiting, playing, paused, respawning, ended)
//!
//! Rendering, raw input capture and UI are host concerns; the host supplies a
//! [`game::RaycastScene`], an [`game::InputFocus`] and a [`util::time::Clock`].

pub mod config;
pub mod demo;
pub mod game;
pub mod util;
