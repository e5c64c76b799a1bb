//! Player intent and carry state.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Seconds of continuous suction required before a grab completes.
pub const SUCTION_GRAB_TIME: f32 = 0.35;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerController {
    /// Move speed in world units per second.
    pub move_speed: f32,
    /// Entity currently held above the player's head, if any.
    #[serde(skip)]
    pub held: Option<EntityId>,
    /// Entity being dragged (static furniture and the like), if any.
    #[serde(skip)]
    pub dragging: Option<EntityId>,
    /// Distance from the player center to the hand anchor.
    pub hand_offset: f32,
    /// Seconds of suction accumulated on the current grab target.
    #[serde(default)]
    pub suction_time: f32,
    /// Facing remembered from the last nonzero movement, x sign only.
    #[serde(default)]
    pub facing_left: bool,
}

impl PlayerController {
    pub fn new(move_speed: f32) -> Self {
        Self {
            move_speed,
            held: None,
            dragging: None,
            hand_offset: 48.0,
            suction_time: 0.0,
            facing_left: false,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.held.is_some()
    }

    /// Drop all carry state; used on scene change and on throw.
    pub fn release(&mut self) {
        self.held = None;
        self.dragging = None;
        self.suction_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_clears_carry_state() {
        let mut pc = PlayerController::new(200.0);
        pc.suction_time = 0.2;
        pc.release();
        assert!(!pc.is_carrying());
        assert_eq!(pc.suction_time, 0.0);
    }
}
