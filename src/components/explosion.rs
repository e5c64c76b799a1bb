//! Timed radial blast.
//!
//! The countdown ticks every frame once armed. Reaching zero applies the
//! blast damage to everything with health inside the radius, exactly once
//! (the `has_exploded` latch). `shot_out` marks an explosion whose owner
//! was thrown as a projectile; the countdown is frozen mid-flight so the
//! blast happens on arrival, not in the player's hand.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    /// Seconds until detonation.
    pub countdown: f32,
    pub blast_radius: f32,
    pub damage: f32,
    /// True once the blast damage has been applied.
    #[serde(default)]
    pub has_exploded: bool,
    /// True while the owning entity is in projectile flight.
    #[serde(default)]
    pub shot_out: bool,
}

impl Explosion {
    pub fn new(countdown: f32, blast_radius: f32, damage: f32) -> Self {
        Self {
            countdown,
            blast_radius,
            damage,
            has_exploded: false,
            shot_out: false,
        }
    }

    /// Advance the countdown; returns true exactly once, on the frame the
    /// explosion fires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.has_exploded || self.shot_out {
            return false;
        }
        self.countdown -= dt;
        if self.countdown <= 0.0 {
            self.has_exploded = true;
            true
        } else {
            false
        }
    }
}
