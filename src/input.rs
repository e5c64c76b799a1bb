//! Frame input snapshot.
//!
//! The engine consumes one [`InputSnapshot`] per frame, filled in by
//! whatever front end drives it. Keeping input a plain value keeps the
//! simulation deterministic and testable without a window.

use crate::math::Vec2;

/// Everything the simulation reads from the player in one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    /// Raw movement axis, each component in [-1, 1].
    pub move_axis: Vec2,
    /// World-space aim point, used for throws.
    pub aim: Vec2,
    /// Suction/grab button held this frame.
    pub grab: bool,
    /// Throw button pressed this frame.
    pub throw: bool,
    /// Pause toggle pressed this frame.
    pub pause: bool,
    /// Quit requested.
    pub exit: bool,
}

impl InputSnapshot {
    /// Movement direction, normalized so diagonals are not faster.
    pub fn move_dir(&self) -> Vec2 {
        let clamped = Vec2::new(
            self.move_axis.x.clamp(-1.0, 1.0),
            self.move_axis.y.clamp(-1.0, 1.0),
        );
        if clamped.length() > 1.0 {
            clamped.normalized()
        } else {
            clamped
        }
    }

    /// Throw direction from `from` toward the aim point; zero aim falls
    /// back to facing.
    pub fn throw_dir(&self, from: Vec2, facing_left: bool) -> Vec2 {
        let dir = (self.aim - from).normalized();
        if dir == Vec2::ZERO {
            if facing_left {
                Vec2::new(-1.0, 0.0)
            } else {
                Vec2::new(1.0, 0.0)
            }
        } else {
            dir
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_movement_is_normalized() {
        let input = InputSnapshot {
            move_axis: Vec2::new(1.0, 1.0),
            ..Default::default()
        };
        assert!((input.move_dir().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn throw_dir_falls_back_to_facing() {
        let input = InputSnapshot::default();
        assert_eq!(
            input.throw_dir(Vec2::ZERO, true),
            Vec2::new(-1.0, 0.0)
        );
        let aimed = InputSnapshot {
            aim: Vec2::new(0.0, 10.0),
            ..Default::default()
        };
        assert_eq!(aimed.throw_dir(Vec2::ZERO, false), Vec2::new(0.0, 1.0));
    }
}
