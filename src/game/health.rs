//! Hit-point tracking

use super::events::{Event, Observers};

/// Maximum (and starting) hit points for every combatant
pub const MAX_HEALTH: f32 = 100.0;

/// Notifications emitted by [`Health`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthEvent {
    /// Current value after damage or reset
    Changed(f32),
    /// Health reached zero (fires once per death)
    Died,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthEventKind {
    Changed,
    Died,
}

impl Event for HealthEvent {
    type Kind = HealthEventKind;

    fn kind(&self) -> HealthEventKind {
        match self {
            HealthEvent::Changed(_) => HealthEventKind::Changed,
            HealthEvent::Died => HealthEventKind::Died,
        }
    }
}

/// Result of a single `take_damage` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Hit points actually removed
    pub applied: f32,
    /// This call brought health to zero
    pub killed: bool,
}

impl DamageOutcome {
    pub const NONE: Self = Self {
        applied: 0.0,
        killed: false,
    };
}

/// Hit points in `[0, MAX_HEALTH]`
#[derive(Debug)]
pub struct Health {
    current: f32,
    max: f32,
    observers: Observers<HealthEvent>,
}

impl Health {
    pub fn new() -> Self {
        Self {
            current: MAX_HEALTH,
            max: MAX_HEALTH,
            observers: Observers::new(),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn subscribe(&mut self, kind: HealthEventKind, handler: impl FnMut(&HealthEvent) + 'static) {
        self.observers.subscribe(kind, handler);
    }

    /// Apply damage. No-op once dead; clamps at zero. `_is_headshot` is
    /// informational, the caller has already picked the damage amount.
    pub fn take_damage(&mut self, amount: f32, _is_headshot: bool) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::NONE;
        }

        let amount = amount.max(0.0);
        let before = self.current;
        self.current = (self.current - amount).clamp(0.0, self.max);
        self.observers.emit(&HealthEvent::Changed(self.current));

        let killed = self.current <= 0.0;
        if killed {
            self.observers.emit(&HealthEvent::Died);
        }

        DamageOutcome {
            applied: before - self.current,
            killed,
        }
    }

    /// Restore to full health
    pub fn reset(&mut self) {
        self.current = self.max;
        self.observers.emit(&HealthEvent::Changed(self.current));
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}
