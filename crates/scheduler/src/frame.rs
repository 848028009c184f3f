use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Why a frame was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReason {
    /// Continuous playback.
    Animation,
    /// One-off redraw after a config change, resize or expose.
    Invalidated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub seq: u64,
    pub at: Instant,
    /// Animation clock reading for this frame. Frozen while paused.
    pub seconds: f64,
    pub reason: TickReason,
}

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Monotonic clock that only advances while running.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationClock {
    accumulated: Duration,
    resumed_at: Option<Instant>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(&mut self, now: Instant) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(started) = self.resumed_at.take() {
            self.accumulated += now.saturating_duration_since(started);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.resumed_at {
            Some(started) => self.accumulated + now.saturating_duration_since(started),
            None => self.accumulated,
        }
    }

    pub fn seconds(&self, now: Instant) -> f64 {
        self.elapsed(now).as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTick {
    reason: TickReason,
    not_before: Instant,
}

/// Decides when the next frame is due.
///
/// While playing there is always exactly one animation tick queued; it is
/// fired by [`fire`](Self::fire) and re-armed by [`complete`](Self::complete).
/// While paused the queue stays empty until [`invalidate`](Self::invalidate)
/// asks for a single redraw. At most one tick is ever pending.
#[derive(Debug)]
pub struct FrameScheduler {
    state: PlaybackState,
    pending: Option<PendingTick>,
    frame_interval: Option<Duration>,
    clock: AnimationClock,
    last_fired: Option<Instant>,
    seq: u64,
    cancel: CancelToken,
}

fn frame_interval(fps: Option<f32>) -> Result<Option<Duration>, SchedulerError> {
    match fps {
        None => Ok(None),
        Some(fps) if fps == 0.0 => Ok(None),
        Some(fps) if fps.is_finite() && fps > 0.0 => {
            Ok(Some(Duration::from_secs_f64(1.0 / f64::from(fps))))
        }
        Some(fps) => Err(SchedulerError::InvalidFps(fps)),
    }
}

impl FrameScheduler {
    /// `fps` of `None` or `0` means one frame per display refresh.
    pub fn new(state: PlaybackState, fps: Option<f32>, now: Instant) -> Result<Self, SchedulerError> {
        let mut scheduler = Self {
            state: PlaybackState::Paused,
            pending: None,
            frame_interval: frame_interval(fps)?,
            clock: AnimationClock::new(),
            last_fired: None,
            seq: 0,
            cancel: CancelToken::new(),
        };
        match state {
            PlaybackState::Playing => {
                scheduler.play(now);
            }
            // The first frame is still owed to a fresh surface.
            PlaybackState::Paused => scheduler.invalidate(now),
        }
        Ok(scheduler)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `false` when already playing.
    pub fn play(&mut self, now: Instant) -> bool {
        if self.is_cancelled() || self.state == PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Playing;
        self.clock.resume(now);
        self.arm(TickReason::Animation, now);
        tracing::debug!(seconds = self.clock.seconds(now), "playback resumed");
        true
    }

    /// Returns `false` when already paused. A queued tick that has not
    /// fired yet is withdrawn.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state == PlaybackState::Paused {
            return false;
        }
        self.state = PlaybackState::Paused;
        self.clock.pause(now);
        self.pending = None;
        tracing::debug!(seconds = self.clock.seconds(now), "playback paused");
        true
    }

    pub fn toggle(&mut self, now: Instant) -> PlaybackState {
        match self.state {
            PlaybackState::Playing => self.pause(now),
            PlaybackState::Paused => self.play(now),
        };
        self.state
    }

    /// Requests one redraw. Coalesces with whatever tick is already queued.
    pub fn invalidate(&mut self, now: Instant) {
        if self.is_cancelled() || self.pending.is_some() {
            return;
        }
        self.pending = Some(PendingTick {
            reason: TickReason::Invalidated,
            not_before: now,
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the queued tick becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.not_before)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.pending
            .is_some_and(|pending| now >= pending.not_before)
    }

    /// Consumes the queued tick (or an implicit expose redraw when nothing
    /// is queued) and stamps it with the animation clock.
    pub fn fire(&mut self, now: Instant) -> Tick {
        let reason = self
            .pending
            .take()
            .map(|pending| pending.reason)
            .unwrap_or(TickReason::Invalidated);
        self.seq += 1;
        self.last_fired = Some(now);
        let tick = Tick {
            seq: self.seq,
            at: now,
            seconds: self.clock.seconds(now),
            reason,
        };
        tracing::trace!(seq = tick.seq, seconds = tick.seconds, ?reason, "tick");
        tick
    }

    /// Marks the current frame as presented and, while playing, queues the
    /// next one.
    pub fn complete(&mut self, now: Instant) {
        if self.state == PlaybackState::Playing {
            self.arm(TickReason::Animation, now);
        }
    }

    /// Drops any queued tick and refuses further scheduling.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.pending = None;
    }

    fn arm(&mut self, reason: TickReason, now: Instant) {
        if self.is_cancelled() {
            return;
        }
        let not_before = match (self.frame_interval, self.last_fired) {
            (Some(interval), Some(last)) => (last + interval).max(now),
            _ => now,
        };
        match &mut self.pending {
            // An invalidation already queued is promoted rather than duplicated.
            Some(pending) => pending.reason = reason,
            None => self.pending = Some(PendingTick { reason, not_before }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn play_and_pause_are_idempotent() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Paused, None, t0).unwrap();
        assert!(scheduler.play(t0));
        assert!(!scheduler.play(t0 + ms(5)));
        assert!(scheduler.pause(t0 + ms(10)));
        assert!(!scheduler.pause(t0 + ms(15)));
        assert_eq!(scheduler.state(), PlaybackState::Paused);
    }

    #[test]
    fn paused_scheduler_draws_once_then_idles() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Paused, None, t0).unwrap();
        assert!(scheduler.is_due(t0));
        let tick = scheduler.fire(t0);
        assert_eq!(tick.reason, TickReason::Invalidated);
        scheduler.complete(t0);
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn invalidations_coalesce_into_one_tick() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Paused, None, t0).unwrap();
        scheduler.fire(t0);
        scheduler.complete(t0);

        scheduler.invalidate(t0 + ms(1));
        scheduler.invalidate(t0 + ms(2));
        scheduler.invalidate(t0 + ms(3));
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(1)));
        scheduler.fire(t0 + ms(4));
        scheduler.complete(t0 + ms(4));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn pausing_withdraws_scheduled_tick() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        assert!(scheduler.has_pending());
        scheduler.pause(t0 + ms(1));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn playing_rearms_after_each_frame() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        for frame in 0..5u64 {
            let now = t0 + ms(16 * frame);
            assert!(scheduler.is_due(now));
            let tick = scheduler.fire(now);
            assert_eq!(tick.seq, frame + 1);
            assert_eq!(tick.reason, TickReason::Animation);
            assert!(!scheduler.has_pending());
            scheduler.complete(now);
            assert!(scheduler.has_pending());
        }
    }

    #[test]
    fn invalidate_while_playing_does_not_double_queue() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        scheduler.invalidate(t0);
        let tick = scheduler.fire(t0);
        assert_eq!(tick.reason, TickReason::Animation);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn fps_cap_delays_next_tick() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, Some(10.0), t0).unwrap();
        scheduler.fire(t0);
        scheduler.complete(t0 + ms(5));
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(100)));
        assert!(!scheduler.is_due(t0 + ms(50)));
        assert!(scheduler.is_due(t0 + ms(100)));
    }

    #[test]
    fn clock_freezes_while_paused() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        let first = scheduler.fire(t0 + ms(500));
        assert!((first.seconds - 0.5).abs() < 1e-9);

        scheduler.pause(t0 + ms(1000));
        scheduler.invalidate(t0 + ms(3000));
        let frozen = scheduler.fire(t0 + ms(3000));
        assert!((frozen.seconds - 1.0).abs() < 1e-9);

        scheduler.play(t0 + ms(5000));
        let resumed = scheduler.fire(t0 + ms(5250));
        assert!((resumed.seconds - 1.25).abs() < 1e-9);
    }

    #[test]
    fn cancelled_scheduler_stays_idle() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        let token = scheduler.cancel_token();
        scheduler.cancel();
        assert!(token.is_cancelled());
        assert!(!scheduler.has_pending());

        scheduler.complete(t0);
        scheduler.invalidate(t0);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn rejects_bad_fps() {
        let t0 = Instant::now();
        assert!(matches!(
            FrameScheduler::new(PlaybackState::Playing, Some(-1.0), t0),
            Err(SchedulerError::InvalidFps(_))
        ));
        assert!(FrameScheduler::new(PlaybackState::Playing, Some(f32::NAN), t0).is_err());
        assert!(FrameScheduler::new(PlaybackState::Playing, Some(0.0), t0).is_ok());
    }
}
