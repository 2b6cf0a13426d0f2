//! Per-tick input sampled from the host

use serde::{Deserialize, Serialize};

/// Input for a single tick. Mouse delta is the amount accumulated since
/// the previous tick; the host resets it after sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub movement: MovementInput,
    pub mouse_delta: (f32, f32),
    pub actions: ActionInput,
}

/// Movement keys held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementInput {
    /// (forward, strafe) axes in `[-1, 1]`
    pub fn axes(&self) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        (
            axis(self.forward, self.backward),
            axis(self.right, self.left),
        )
    }
}

/// Action buttons held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub fire: bool,
    pub jump: bool,
    /// Pause toggle pressed this tick
    pub pause: bool,
}
