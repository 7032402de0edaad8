//! Preview and capture geometry.
//!
//! Pure functions that turn surface dimensions, touch points, gesture
//! spans and sensor orientation into the values the hardware expects.
//! Nothing in here touches a device; the session worker calls into these
//! while it holds the device handle.
//!
//! Two coordinate frames appear throughout:
//!
//! ```text
//! view frame    the rendering surface as the caller sees it (portrait)
//! sensor frame  the same surface transposed, matching landscape sensor sizes
//! ```

mod orientation;
mod region;
mod size;
mod zoom;

pub use orientation::{
    capture_transform, display_orientation, tilt_rotation, CaptureTransform, Facing, Rotation,
};
pub use region::{
    apply_touch_regions, map_touch, FocusRect, FocusRegion, FOCUS_COEFFICIENT,
    METERING_COEFFICIENT, REGION_WEIGHT,
};
pub use size::{negotiate_parameters, select_optimal_size};
pub use zoom::{apply_zoom, zoom_step, ZoomState};

use serde::{Deserialize, Serialize};

/// A width/height pair in pixels as reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Exact ratio equality, compared without floating point.
    #[inline]
    pub fn same_ratio(&self, other: &Resolution) -> bool {
        (self.width as u64) * (other.height as u64) == (other.width as u64) * (self.height as u64)
    }

    /// Returns true if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Dimensions of the rendering viewport, in view-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceTarget {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

impl SurfaceTarget {
    /// Creates a new surface target.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The surface expressed in the sensor frame (width and height swapped).
    ///
    /// Sensor sizes are reported landscape while the preview is portrait,
    /// so size selection and zoom scaling work on this transposed view.
    #[inline]
    pub fn sensor_frame(&self) -> Resolution {
        Resolution::new(self.height, self.width)
    }

    /// Returns true if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
