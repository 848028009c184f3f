use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};

/// High-level behaviour requested by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Interactive session.
    Animate {
        /// Optional frames-per-second cap; `None` follows the display.
        target_fps: Option<f32>,
        /// Start paused (on-demand redraws only).
        paused: bool,
        /// Drive the anchor along the automatic path instead of the pointer.
        auto_path: bool,
    },
    /// Render offline and write the result to disk.
    Export {
        /// Destination of the still frame, or the naming base for a sequence.
        path: PathBuf,
        format: ExportFormat,
        /// When set, a frame sequence covering this much animation time.
        duration: Option<Duration>,
        /// Sequence frame rate.
        fps: f32,
        auto_path: bool,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate {
            target_fps: None,
            paused: false,
            auto_path: false,
        }
    }
}

/// File formats supported by the export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") | None => Ok(Self::Png),
            Some(other) => bail!("unsupported export format '.{other}'; only .png is available"),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
        }
    }
}

/// Number of frames needed to cover `duration` at `fps`, at least one.
pub fn frame_count(duration: Duration, fps: f32) -> usize {
    let frames = (duration.as_secs_f64() * f64::from(fps)).ceil();
    if frames.is_finite() && frames >= 1.0 {
        frames as usize
    } else {
        1
    }
}

/// `out/glass.png`, 7 -> `out/glass_0007.png`.
pub fn sequence_path(base: &Path, format: ExportFormat, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("frame");
    base.with_file_name(format!("{stem}_{index:04}.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a/b.PNG")).unwrap(),
            ExportFormat::Png
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("frame")).unwrap(),
            ExportFormat::Png
        );
        assert!(ExportFormat::from_path(Path::new("frame.exr")).is_err());
    }

    #[test]
    fn frame_count_rounds_up() {
        assert_eq!(frame_count(Duration::from_secs(2), 30.0), 60);
        assert_eq!(frame_count(Duration::from_millis(1010), 10.0), 11);
        assert_eq!(frame_count(Duration::ZERO, 30.0), 1);
    }

    #[test]
    fn sequence_names_are_numbered() {
        let path = sequence_path(Path::new("out/glass.png"), ExportFormat::Png, 7);
        assert_eq!(path, PathBuf::from("out/glass_0007.png"));
    }
}
