//! Fixed-timestep orchestrator.
//!
//! The wall-clock frame delta accumulates; while the accumulator exceeds
//! the fixed timestep one simulation step is scheduled, up to a per-frame
//! cap. Integrators must advance by `fixed_dt * current_steps` rather than
//! the raw frame delta, so identical step sequences reproduce identical
//! state.

/// Upper bound on simulation steps per frame; long stalls drop time
/// instead of spiraling.
pub const DEFAULT_MAX_STEPS_PER_FRAME: u32 = 8;

#[derive(Debug, Clone)]
pub struct WorldTime {
    /// Invariant simulation timestep in seconds.
    pub fixed_dt: f32,
    /// Steps scheduled for the current frame.
    pub current_steps: u32,
    /// Total simulated time in seconds.
    pub elapsed: f32,
    /// Frames observed since startup.
    pub frame_count: u64,
    /// Scales incoming wall-clock deltas; 1.0 = realtime.
    pub time_scale: f32,
    pub max_steps_per_frame: u32,
    accumulator: f32,
}

impl WorldTime {
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt,
            current_steps: 0,
            elapsed: 0.0,
            frame_count: 0,
            time_scale: 1.0,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
            accumulator: 0.0,
        }
    }

    pub fn from_target_fps(fps: u32) -> Self {
        Self::new(1.0 / fps.max(1) as f32)
    }

    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Consume one frame's wall-clock delta and schedule simulation
    /// steps. Returns the step count, also visible as `current_steps`.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.frame_count += 1;
        self.accumulator += frame_dt * self.time_scale;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_steps_per_frame {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        if steps == self.max_steps_per_frame {
            // Frame cap hit: drop whatever time is still owed.
            self.accumulator = self.accumulator.min(self.fixed_dt);
        }
        self.current_steps = steps;
        self.elapsed += self.fixed_dt * steps as f32;
        steps
    }

    /// Simulated seconds covered by this frame: `fixed_dt * current_steps`.
    pub fn step_dt(&self) -> f32 {
        self.fixed_dt * self.current_steps as f32
    }

    /// Freeze: zero pending steps without touching the accumulator, so
    /// resuming does not replay the paused span.
    pub fn freeze_frame(&mut self) {
        self.current_steps = 0;
        self.frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_frames_schedule_one_step() {
        let mut t = WorldTime::from_target_fps(60);
        for _ in 0..10 {
            assert_eq!(t.advance(1.0 / 60.0), 1);
        }
        assert!((t.elapsed - 10.0 / 60.0).abs() < 1e-4);
    }

    #[test]
    fn short_frames_accumulate() {
        let mut t = WorldTime::from_target_fps(60);
        assert_eq!(t.advance(1.0 / 120.0), 0);
        assert_eq!(t.advance(1.0 / 120.0), 1);
    }

    #[test]
    fn long_frames_schedule_multiple_steps() {
        let mut t = WorldTime::from_target_fps(60);
        assert_eq!(t.advance(3.5 / 60.0), 3);
        assert_eq!(t.current_steps, 3);
        assert!((t.step_dt() - 3.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn step_cap_drops_excess_time() {
        let mut t = WorldTime::from_target_fps(60);
        let steps = t.advance(100.0);
        assert_eq!(steps, DEFAULT_MAX_STEPS_PER_FRAME);
        // Next normal frame is not a catch-up avalanche.
        assert!(t.advance(1.0 / 60.0) <= 2);
    }

    #[test]
    fn time_scale_stretches_wall_clock() {
        let mut t = WorldTime::from_target_fps(60).with_time_scale(2.0);
        assert_eq!(t.advance(1.0 / 60.0), 2);
    }

    #[test]
    fn freeze_frame_schedules_nothing() {
        let mut t = WorldTime::from_target_fps(60);
        t.advance(1.0 / 60.0);
        t.freeze_frame();
        assert_eq!(t.current_steps, 0);
        assert_eq!(t.step_dt(), 0.0);
    }
}
