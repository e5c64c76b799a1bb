//! Axis-aligned rigid body with linear velocity and knockback state.
//!
//! Velocity is integrated by [`integrate`](crate::systems::movement::integrate)
//! over the fixed sub-steps of the frame. The acceleration accumulator is
//! cleared after each frame's integration; gameplay code re-applies forces
//! every frame. Setting a knockback velocity raises the `in_knockback`
//! flag with a countdown during which input-driven motion is suppressed.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Minimum mass; anything lower is clamped to keep damage math finite.
pub const MIN_MASS: f32 = 1e-3;

fn default_mass() -> f32 {
    1.0
}

/// Linear-velocity rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Acceleration accumulator, cleared after integration each frame.
    #[serde(default)]
    pub acceleration: Vec2,
    /// Mass in abstract units; feeds the contact damage formulas.
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Velocity damping factor, applied as `v *= 1 - drag * dt` per sub-step.
    #[serde(default)]
    pub drag: f32,
    /// True while a knockback impulse is in effect.
    #[serde(default)]
    pub in_knockback: bool,
    /// Seconds of knockback remaining.
    #[serde(default)]
    pub knockback_remaining: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RigidBody {
    pub fn new(mass: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: mass.max(MIN_MASS),
            drag: 0.0,
            in_knockback: false,
            knockback_remaining: 0.0,
        }
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }

    /// Mass clamped to [`MIN_MASS`]; scene files may carry junk.
    pub fn mass(&self) -> f32 {
        self.mass.max(MIN_MASS)
    }

    /// Replace the velocity with a knockback impulse and start the
    /// refractory countdown. Input-driven motion must check
    /// [`in_knockback`](Self::in_knockback) and stand down.
    pub fn apply_knockback(&mut self, impulse: Vec2, duration: f32) {
        self.velocity = impulse;
        self.in_knockback = true;
        self.knockback_remaining = duration;
    }

    /// Advance the knockback countdown; clears the flag at zero.
    pub fn tick_knockback(&mut self, dt: f32) {
        if !self.in_knockback {
            return;
        }
        self.knockback_remaining -= dt;
        if self.knockback_remaining <= 0.0 {
            self.in_knockback = false;
            self.knockback_remaining = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_mass() {
        let rb = RigidBody::new(0.0);
        assert!(rb.mass() >= MIN_MASS);
    }

    #[test]
    fn knockback_sets_flag_and_velocity() {
        let mut rb = RigidBody::new(10.0);
        rb.apply_knockback(Vec2::new(100.0, 0.0), 0.3);
        assert!(rb.in_knockback);
        assert_eq!(rb.velocity, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn knockback_expires_after_duration() {
        let mut rb = RigidBody::new(10.0);
        rb.apply_knockback(Vec2::new(100.0, 0.0), 0.3);
        rb.tick_knockback(0.2);
        assert!(rb.in_knockback);
        rb.tick_knockback(0.2);
        assert!(!rb.in_knockback);
        assert_eq!(rb.knockback_remaining, 0.0);
    }

    #[test]
    fn tick_without_knockback_is_noop() {
        let mut rb = RigidBody::new(1.0);
        rb.tick_knockback(1.0);
        assert!(!rb.in_knockback);
        assert_eq!(rb.knockback_remaining, 0.0);
    }
}
