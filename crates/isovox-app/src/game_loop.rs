//! Fixed-timestep frame loop.
//!
//! Simulation runs in fixed steps drained from an accumulator; rendering runs
//! once per frame with the leftover fraction as interpolation alpha. Both
//! callbacks receive the same mutable state, so one owner can be updated and
//! drawn from a single loop.

use std::time::Instant;
use tracing::warn;

/// Fixed simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Longest frame the loop will simulate; slower frames are clamped so a stall
/// does not trigger a burst of catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct GameLoop {
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Runs one frame timed by the wall clock.
    ///
    /// See [`advance`](Self::advance) for the callback contract.
    pub fn tick<S, E>(
        &mut self,
        state: &mut S,
        update_fn: impl FnMut(&mut S, f64) -> Result<(), E>,
        render_fn: impl FnMut(&mut S, f64),
    ) -> Result<(), E> {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time, state, update_fn, render_fn)
    }

    /// Runs one frame of `frame_time` seconds.
    ///
    /// `update_fn(state, FIXED_DT)` runs zero or more times; the first error
    /// stops the frame before rendering. `render_fn(state, alpha)` then runs
    /// once with `alpha` in `[0, 1)`.
    pub fn advance<S, E>(
        &mut self,
        frame_time: f64,
        state: &mut S,
        mut update_fn: impl FnMut(&mut S, f64) -> Result<(), E>,
        mut render_fn: impl FnMut(&mut S, f64),
    ) -> Result<(), E> {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;
        while self.accumulator >= FIXED_DT {
            update_fn(state, FIXED_DT)?;
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
        }

        render_fn(state, self.alpha());
        self.frame_count += 1;
        Ok(())
    }

    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / FIXED_DT
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Counts {
        updates: u32,
        renders: u32,
        last_alpha: f64,
    }

    fn run(loop_: &mut GameLoop, counts: &mut Counts, frame_time: f64) {
        let result: Result<(), Infallible> = loop_.advance(
            frame_time,
            counts,
            |c, _| {
                c.updates += 1;
                Ok(())
            },
            |c, alpha| {
                c.renders += 1;
                c.last_alpha = alpha;
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_fixed_dt_value() {
        assert!((FIXED_DT - 1.0 / 60.0).abs() < f64::EPSILON * 10.0);
    }

    #[test]
    fn test_single_step() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        run(&mut loop_, &mut counts, FIXED_DT);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.renders, 1);
        assert!(loop_.accumulator.abs() < 1e-12);
    }

    #[test]
    fn test_partial_step_only_renders() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        run(&mut loop_, &mut counts, FIXED_DT * 0.5);
        assert_eq!(counts.updates, 0);
        assert_eq!(counts.renders, 1);
        assert!((counts.last_alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_accumulated_partials_trigger_update() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        run(&mut loop_, &mut counts, FIXED_DT * 0.6);
        run(&mut loop_, &mut counts, FIXED_DT * 0.6);
        assert_eq!(counts.updates, 1);
        assert_eq!(loop_.frame_count(), 2);
        assert!((loop_.alpha() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_max_frame_time_clamp() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        run(&mut loop_, &mut counts, 10.0);
        // 15 steps fit in the clamped frame, give or take float drift.
        assert!((14..=15).contains(&counts.updates));
        assert!((loop_.total_sim_time() - counts.updates as f64 * FIXED_DT).abs() < 1e-9);
    }

    #[test]
    fn test_negative_frame_time_is_ignored() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        run(&mut loop_, &mut counts, -1.0);
        assert_eq!(counts.updates, 0);
        assert_eq!(loop_.alpha(), 0.0);
    }

    #[test]
    fn test_update_error_skips_render() {
        let mut loop_ = GameLoop::new();
        let mut renders = 0u32;
        let result = loop_.advance(
            3.0 * FIXED_DT,
            &mut renders,
            |_, _| Err("boom"),
            |r, _| *r += 1,
        );
        assert_eq!(result, Err("boom"));
        assert_eq!(renders, 0);
        assert_eq!(loop_.update_count(), 0);
        assert_eq!(loop_.frame_count(), 0);
    }

    #[test]
    fn test_wall_clock_tick_renders_once() {
        let mut loop_ = GameLoop::new();
        let mut counts = Counts::default();
        let result: Result<(), Infallible> = loop_.tick(
            &mut counts,
            |c, _| {
                c.updates += 1;
                Ok(())
            },
            |c, _| c.renders += 1,
        );
        assert!(result.is_ok());
        assert_eq!(counts.renders, 1);
        assert_eq!(loop_.frame_count(), 1);
    }

    #[test]
    fn test_deterministic_sequence() {
        let frames = [0.016, 0.017, 0.033, 0.001, 0.05];
        let totals: Vec<u64> = (0..2)
            .map(|_| {
                let mut loop_ = GameLoop::new();
                let mut counts = Counts::default();
                for dt in frames {
                    run(&mut loop_, &mut counts, dt);
                }
                loop_.update_count()
            })
            .collect();
        assert_eq!(totals[0], totals[1]);
    }
}
