use std::time::{Duration, Instant};

use crate::frame::{FrameScheduler, Tick};

/// Source of "the display is ready for another frame" signals.
pub trait TickSource {
    /// Blocks until `deadline` (or the next refresh after it) and returns
    /// the time the frame should be stamped with. `None` ends the loop.
    fn wait_until(&mut self, deadline: Instant) -> Option<Instant>;
}

/// Deterministic ticks for offline rendering: a virtual refresh every
/// `step`, for at most `limit` frames, without sleeping.
#[derive(Debug, Clone)]
pub struct SimulatedTicks {
    now: Instant,
    step: Duration,
    remaining: usize,
    started: bool,
}

impl SimulatedTicks {
    pub fn new(start: Instant, step: Duration, limit: usize) -> Self {
        Self {
            now: start,
            step,
            remaining: limit,
            started: false,
        }
    }
}

impl TickSource for SimulatedTicks {
    fn wait_until(&mut self, deadline: Instant) -> Option<Instant> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.started {
            self.now += self.step;
        }
        self.started = true;
        // Refreshes land on the virtual vsync grid; a later deadline skips ahead.
        while self.now < deadline && !self.step.is_zero() {
            self.now += self.step;
        }
        Some(self.now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancellation flag was raised.
    Cancelled,
    /// Paused with nothing left to draw.
    Idle,
    /// The tick source ran dry.
    Exhausted,
}

/// Drives `draw` once per tick until cancelled, paused-and-idle, or the
/// source runs out. Cancellation is checked both before waiting and after
/// waking, so a teardown during the wait never draws.
pub fn run_loop<S, F, E>(
    scheduler: &mut FrameScheduler,
    source: &mut S,
    mut draw: F,
) -> Result<LoopExit, E>
where
    S: TickSource,
    F: FnMut(&Tick, &mut FrameScheduler) -> Result<(), E>,
{
    loop {
        if scheduler.is_cancelled() {
            return Ok(LoopExit::Cancelled);
        }
        let Some(deadline) = scheduler.next_deadline() else {
            return Ok(LoopExit::Idle);
        };
        let Some(now) = source.wait_until(deadline) else {
            return Ok(LoopExit::Exhausted);
        };
        if scheduler.is_cancelled() {
            return Ok(LoopExit::Cancelled);
        }
        let tick = scheduler.fire(now);
        draw(&tick, scheduler)?;
        scheduler.complete(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PlaybackState;

    #[test]
    fn simulated_ticks_follow_step() {
        let t0 = Instant::now();
        let mut ticks = SimulatedTicks::new(t0, Duration::from_millis(10), 3);
        assert_eq!(ticks.wait_until(t0), Some(t0));
        assert_eq!(ticks.wait_until(t0), Some(t0 + Duration::from_millis(10)));
        assert_eq!(
            ticks.wait_until(t0 + Duration::from_millis(35)),
            Some(t0 + Duration::from_millis(40))
        );
        assert_eq!(ticks.wait_until(t0), None);
    }

    #[test]
    fn loop_runs_until_source_exhausted() {
        let t0 = Instant::now();
        let step = Duration::from_millis(40);
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, Some(25.0), t0).unwrap();
        let mut ticks = SimulatedTicks::new(t0, step, 5);
        let mut seen = Vec::new();

        let exit = run_loop(&mut scheduler, &mut ticks, |tick, _| {
            seen.push(tick.seconds);
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(exit, LoopExit::Exhausted);
        assert_eq!(seen.len(), 5);
        for (index, seconds) in seen.iter().enumerate() {
            assert!((seconds - index as f64 * 0.04).abs() < 1e-9);
        }
    }

    #[test]
    fn pausing_inside_a_frame_ends_in_idle() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        let mut ticks = SimulatedTicks::new(t0, Duration::from_millis(16), 100);
        let mut frames = 0;

        let exit = run_loop(&mut scheduler, &mut ticks, |tick, scheduler| {
            frames += 1;
            if frames == 3 {
                scheduler.pause(tick.at);
            }
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(exit, LoopExit::Idle);
        assert_eq!(frames, 3);
    }

    #[test]
    fn cancellation_from_another_handle_stops_before_drawing() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        let token = scheduler.cancel_token();
        let mut ticks = SimulatedTicks::new(t0, Duration::from_millis(16), 100);
        let mut frames = 0;

        let exit = run_loop(&mut scheduler, &mut ticks, |_, _| {
            frames += 1;
            if frames == 2 {
                token.cancel();
            }
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(exit, LoopExit::Cancelled);
        assert_eq!(frames, 2);
    }

    #[test]
    fn draw_errors_propagate() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        let mut ticks = SimulatedTicks::new(t0, Duration::from_millis(16), 10);
        let result = run_loop(&mut scheduler, &mut ticks, |_, _| Err("gpu lost"));
        assert_eq!(result, Err("gpu lost"));
    }
}
