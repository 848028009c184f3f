//! Frame pacing and anchor tracking for the glass renderer.
//!
//! [`FrameScheduler`] decides when a frame is owed, [`InteractionTracker`]
//! decides where the glass sits in it, and [`run_loop`] ties a
//! [`TickSource`] to a draw callback for windowless rendering.

mod frame;
mod ticks;
mod tracker;

pub use frame::{CancelToken, FrameScheduler, PlaybackState, Tick, TickReason};
pub use ticks::{run_loop, LoopExit, SimulatedTicks, TickSource};
pub use tracker::{
    auto_path, Anchor, InteractionTracker, TrackingMode, AUTO_PATH_PERIOD, COMPACT_WIDTH,
    DEFAULT_ANCHOR,
};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("fps must be a positive number or 0 for uncapped, got {0}")]
    InvalidFps(f32),
}
