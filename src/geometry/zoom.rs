//! Pinch-gesture zoom stepping.

/// Current and maximum hardware zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoomState {
    /// Current zoom step, `0..=max`.
    pub current: u32,
    /// Device maximum zoom step. Zero means zoom is unsupported.
    pub max: u32,
}

impl ZoomState {
    /// Creates a zoom state, clamping `current` into range.
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }
}

/// Computes the zoom step reached after a gesture span of `span` pixels.
///
/// A fifth of `surface_height` spans the full zoom range. Returns `None`
/// if zoom is unsupported or the surface is empty.
pub fn zoom_step(surface_height: u32, state: ZoomState, span: f32) -> Option<u32> {
    if state.max == 0 || surface_height == 0 {
        return None;
    }

    let unit = surface_height as f32 / 5.0 / state.max as f32;
    let delta = (span / unit).trunc() as i64;
    let next = (state.current as i64 + delta).clamp(0, state.max as i64);
    Some(next as u32)
}

/// Applies a gesture span to `state`, returning whether the step changed.
///
/// An unchanged step needs no hardware write.
pub fn apply_zoom(surface_height: u32, state: &mut ZoomState, span: f32) -> bool {
    match zoom_step(surface_height, *state, span) {
        Some(next) if next != state.current => {
            tracing::debug!(from = state.current, to = next, max = state.max, "Zoom step changed");
            state.current = next;
            true
        }
        _ => false,
    }
}
