// ABOUTME: Maps a vertical drag on the resize handle onto the four size presets
// ABOUTME: Pure interpolation while dragging, nearest-preset snapping and a short snap animation on release

use crate::geometry::{Frame, Size};
use crate::preset::SizePreset;
use std::time::{Duration, Instant};

/// Pixels of vertical drag that move the popover by one preset.
pub const STEP: f64 = 80.0;

pub const SNAP_DURATION: Duration = Duration::from_millis(150);

/// Fractional preset index for a drag that started at `start` and has moved
/// `downward` points (negative when dragging up). Clamped to the preset range.
pub fn raw_index(start: SizePreset, downward: f64) -> f64 {
    let raw = start.index() as f64 + downward / STEP;
    if raw.is_nan() {
        return start.index() as f64;
    }
    raw.clamp(0.0, SizePreset::MAX_INDEX as f64)
}

/// Size between the two presets surrounding `raw`, each axis interpolated independently.
pub fn interpolated_size(raw: f64) -> Size {
    let raw = raw.clamp(0.0, SizePreset::MAX_INDEX as f64);
    let lower = raw.floor();
    let upper = raw.ceil();
    let t = raw - lower;

    let from = SizePreset::from_index(lower as i64).content_size();
    let to = SizePreset::from_index(upper as i64).content_size();
    from.lerp(to, t)
}

/// The preset a drag commits to when released at `downward`.
pub fn resolve_release(start: SizePreset, downward: f64) -> SizePreset {
    SizePreset::from_index(raw_index(start, downward).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutcome {
    /// What to draw right now while the pointer is still down.
    pub render_size: Size,
    /// What the popover settles on if the pointer is released here.
    pub committed: SizePreset,
}

pub fn map_drag(start: SizePreset, downward: f64) -> DragOutcome {
    DragOutcome {
        render_size: interpolated_size(raw_index(start, downward)),
        committed: resolve_release(start, downward),
    }
}

/// State captured when the pointer goes down on the resize handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub start_preset: SizePreset,
    pub start_frame: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub preset: SizePreset,
    /// Frame at the moment of release; the snap animation starts here.
    pub frame: Frame,
}

impl DragSession {
    pub fn begin(start_preset: SizePreset, start_frame: Frame) -> Self {
        Self {
            start_preset,
            start_frame,
        }
    }

    pub fn update(&self, downward: f64) -> Frame {
        let outcome = map_drag(self.start_preset, downward);
        self.start_frame.with_size(outcome.render_size)
    }

    /// Consumes the session; release and cancel both snap to the nearest preset.
    pub fn finish(self, downward: f64) -> Release {
        let outcome = map_drag(self.start_preset, downward);
        Release {
            preset: outcome.committed,
            frame: self.start_frame.with_size(outcome.render_size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapAnimation {
    pub from: Frame,
    pub to: Frame,
    pub started: Instant,
    pub duration: Duration,
}

impl SnapAnimation {
    pub fn new(from: Frame, to: Frame, started: Instant) -> Self {
        Self {
            from,
            to,
            started,
            duration: SNAP_DURATION,
        }
    }

    /// Frame at `now` and whether the animation has reached its target.
    /// The final sample is exactly `to`.
    pub fn sample(&self, now: Instant) -> (Frame, bool) {
        let elapsed = now.saturating_duration_since(self.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, true);
        }

        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - progress).powi(3);
        let size = self.from.size.lerp(self.to.size, eased);
        (self.to.with_size(size), false)
    }
}
