//! Touch point to hardware focus/metering region mapping.

use super::SurfaceTarget;
use crate::hardware::{CameraParameters, FocusMode};
use serde::{Deserialize, Serialize};

/// Half-extent of the hardware region space.
const REGION_BOUND: i32 = 1000;

/// Side of a focus region at coefficient 1.0, in region units.
const BASE_AREA_SIZE: f32 = 200.0;

/// Weight attached to every region sent to the hardware (valid range 1..=1000).
pub const REGION_WEIGHT: u32 = 800;

/// Area coefficient for autofocus regions.
pub const FOCUS_COEFFICIENT: f32 = 1.0;

/// Area coefficient for metering regions.
pub const METERING_COEFFICIENT: f32 = 1.5;

/// Rectangle in the `[-1000, 1000]²` hardware region space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl FocusRect {
    /// Returns true if every edge lies inside the region space.
    pub fn is_within_bounds(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| (-REGION_BOUND..=REGION_BOUND).contains(v))
    }
}

/// A weighted region sent to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRegion {
    /// Area in region space.
    pub rect: FocusRect,
    /// Relative weight, `1..=1000`.
    pub weight: u32,
}

/// Maps a touch at `(x, y)` on `surface` to a hardware region.
///
/// The region space is transposed relative to the view, so the
/// horizontal center is scaled by the sensor-frame height and the
/// vertical center by the sensor-frame width. Each edge is clamped
/// independently.
pub fn map_touch(surface: SurfaceTarget, x: f32, y: f32, coefficient: f32) -> FocusRect {
    let sensor = surface.sensor_frame();
    let side = (BASE_AREA_SIZE * coefficient) as i32;
    let half = side / 2;

    let center_x = (x / sensor.height as f32 * 2000.0 - 1000.0) as i32;
    let center_y = (y / sensor.width as f32 * 2000.0 - 1000.0) as i32;

    let clamp = |v: i32| v.clamp(-REGION_BOUND, REGION_BOUND);
    let rect = FocusRect {
        left: clamp(center_x - half),
        top: clamp(center_y - half),
        right: clamp(center_x + half),
        bottom: clamp(center_y + half),
    };

    tracing::debug!(x, y, coefficient, ?rect, "Mapped touch to region");
    rect
}

/// Points focus and metering at a touch and switches to single-shot
/// autofocus.
///
/// Each region is only written if the device supports at least one
/// area of that kind.
pub fn apply_touch_regions(surface: SurfaceTarget, params: &mut CameraParameters, x: f32, y: f32) {
    if surface.is_empty() {
        return;
    }

    if params.max_focus_areas > 0 {
        params.focus_areas = vec![FocusRegion {
            rect: map_touch(surface, x, y, FOCUS_COEFFICIENT),
            weight: REGION_WEIGHT,
        }];
    }

    if params.max_metering_areas > 0 {
        params.metering_areas = vec![FocusRegion {
            rect: map_touch(surface, x, y, METERING_COEFFICIENT),
            weight: REGION_WEIGHT,
        }];
    }

    params.focus_mode = Some(FocusMode::Auto);
}
