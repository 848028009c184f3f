use std::f64::consts::PI;

/// Glass position in device-independent pixels, origin at the top-left of
/// the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the glass sits before any pointer input arrives.
pub const DEFAULT_ANCHOR: Anchor = Anchor::new(400.0, 300.0);

/// Both path components repeat after `20π` seconds: `lcm(4π, 20π/3)`.
pub const AUTO_PATH_PERIOD: f64 = 20.0 * PI;

/// Surfaces narrower than this (logical px) have no useful pointer and
/// default to the automatic path.
pub const COMPACT_WIDTH: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    Pointer,
    AutoPath,
}

/// Lissajous-style orbit around the surface centre, evaluated at
/// `seconds` of animation time.
pub fn auto_path(surface_width: f32, surface_height: f32, seconds: f64) -> Anchor {
    let width = f64::from(surface_width);
    let height = f64::from(surface_height);
    let radius_x = (width * 0.3).min(150.0);
    let radius_y = (height * 0.2).min(100.0);
    Anchor {
        x: (width / 2.0 + radius_x * (seconds * 0.5).cos()) as f32,
        y: (height / 2.0 + radius_y * (seconds * 0.3).sin()) as f32,
    }
}

/// Turns pointer/touch input, or the automatic path, into the anchor for
/// the next frame.
#[derive(Debug, Clone)]
pub struct InteractionTracker {
    mode: TrackingMode,
    /// Set once the mode was chosen by the caller rather than derived from
    /// the surface width.
    mode_pinned: bool,
    pointer: Anchor,
    surface: (f32, f32),
}

fn mode_for_width(width: f32) -> TrackingMode {
    if width < COMPACT_WIDTH {
        TrackingMode::AutoPath
    } else {
        TrackingMode::Pointer
    }
}

impl InteractionTracker {
    pub fn new(mode: TrackingMode, surface_width: f32, surface_height: f32) -> Self {
        Self {
            mode,
            mode_pinned: true,
            pointer: DEFAULT_ANCHOR,
            surface: (surface_width, surface_height),
        }
    }

    /// Picks [`TrackingMode::AutoPath`] for compact surfaces. The choice is
    /// revisited by [`set_surface`](Self::set_surface) until the mode is set
    /// explicitly.
    pub fn for_surface(surface_width: f32, surface_height: f32) -> Self {
        Self {
            mode_pinned: false,
            ..Self::new(mode_for_width(surface_width), surface_width, surface_height)
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TrackingMode) {
        self.mode_pinned = true;
        self.switch_mode(mode);
    }

    fn switch_mode(&mut self, mode: TrackingMode) {
        if self.mode != mode {
            tracing::debug!(?mode, "tracking mode changed");
            self.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) -> TrackingMode {
        let next = match self.mode {
            TrackingMode::Pointer => TrackingMode::AutoPath,
            TrackingMode::AutoPath => TrackingMode::Pointer,
        };
        self.set_mode(next);
        next
    }

    /// Stores the position verbatim; positions outside the surface are kept.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Anchor::new(x, y);
    }

    /// First touch point only.
    pub fn touch_moved(&mut self, x: f32, y: f32) {
        self.pointer_moved(x, y);
    }

    /// Returns `true` if the pointer position drives the anchor, i.e. a
    /// move should trigger a redraw.
    pub fn follows_pointer(&self) -> bool {
        self.mode == TrackingMode::Pointer
    }

    /// Crossing [`COMPACT_WIDTH`] switches between pointer and auto-path
    /// tracking unless the mode was set explicitly.
    pub fn set_surface(&mut self, width: f32, height: f32) {
        self.surface = (width, height);
        if !self.mode_pinned {
            self.switch_mode(mode_for_width(width));
        }
    }

    pub fn anchor_at(&self, seconds: f64) -> Anchor {
        match self.mode {
            TrackingMode::Pointer => self.pointer,
            TrackingMode::AutoPath => auto_path(self.surface.0, self.surface.1, seconds),
        }
    }
}
