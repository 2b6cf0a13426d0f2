//! Shared utilities

pub mod diagnostics;
pub mod random;
pub mod time;
