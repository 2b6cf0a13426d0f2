//! Exclusive input focus (pointer lock) contract

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FocusError {
    #[error("input focus denied: {0}")]
    Denied(String),
}

/// Host capability that grants the simulation exclusive mouse/keyboard focus
pub trait InputFocus {
    /// Request focus. May be refused by the host.
    fn acquire(&mut self) -> impl Future<Output = Result<(), FocusError>>;

    /// Give focus back. Releasing without holding focus is a no-op.
    fn release(&mut self);

    fn is_held(&self) -> bool;
}

/// Focus for headless runs: granted unless explicitly set to refuse
#[derive(Debug, Clone, Default)]
pub struct HeadlessFocus {
    held: bool,
    refuse: bool,
    acquisitions: u32,
}

impl HeadlessFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent acquisitions fail (or succeed again)
    pub fn set_refuse(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// Successful acquisitions so far
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }
}

impl InputFocus for HeadlessFocus {
    async fn acquire(&mut self) -> Result<(), FocusError> {
        if self.refuse {
            return Err(FocusError::Denied("host refused pointer lock".to_string()));
        }
        self.held = true;
        self.acquisitions += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}
