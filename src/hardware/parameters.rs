//! Camera parameter block.

use crate::geometry::{FocusRegion, Resolution};
use serde::{Deserialize, Serialize};

/// Autofocus behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusMode {
    /// Single-shot autofocus, triggered explicitly.
    Auto,
    /// Continuous autofocus tuned for stills.
    ContinuousPicture,
    /// Continuous autofocus tuned for video.
    ContinuousVideo,
    /// Lens cannot focus.
    Fixed,
    /// Focus locked at infinity.
    Infinity,
    /// Close-up focus.
    Macro,
}

/// Encoding of captured stills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PictureFormat {
    /// JPEG-encoded stills.
    Jpeg,
    /// Raw YUV 4:2:0 semi-planar.
    Nv21,
    /// Raw 16-bit RGB.
    Rgb565,
}

/// Capabilities reported by a device plus the settings currently selected.
///
/// Read with [`DeviceHandle::parameters`](super::DeviceHandle::parameters),
/// modified, and written back as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraParameters {
    /// Preview sizes, in the sensor frame.
    pub supported_preview_sizes: Vec<Resolution>,
    /// Still sizes, in the sensor frame.
    pub supported_picture_sizes: Vec<Resolution>,
    /// Focus modes the device accepts.
    pub supported_focus_modes: Vec<FocusMode>,
    /// Still encodings the device accepts.
    pub supported_picture_formats: Vec<PictureFormat>,
    /// Maximum number of focus areas; zero if unsupported.
    pub max_focus_areas: u32,
    /// Maximum number of metering areas; zero if unsupported.
    pub max_metering_areas: u32,
    /// Whether the device zooms at all.
    pub zoom_supported: bool,
    /// Highest zoom step.
    pub max_zoom: u32,

    /// Selected preview size.
    pub preview_size: Option<Resolution>,
    /// Selected still size.
    pub picture_size: Option<Resolution>,
    /// Selected focus mode.
    pub focus_mode: Option<FocusMode>,
    /// Selected still encoding.
    pub picture_format: Option<PictureFormat>,
    /// JPEG quality, `1..=100`.
    pub jpeg_quality: Option<u8>,
    /// Focus areas in region space.
    pub focus_areas: Vec<FocusRegion>,
    /// Metering areas in region space.
    pub metering_areas: Vec<FocusRegion>,
    /// Current zoom step.
    pub zoom: u32,
}

impl CameraParameters {
    /// Returns true if the device lists `mode`.
    pub fn supports_focus_mode(&self, mode: FocusMode) -> bool {
        self.supported_focus_modes.contains(&mode)
    }

    /// Maximum zoom step, or zero when zoom is unsupported.
    pub fn effective_max_zoom(&self) -> u32 {
        if self.zoom_supported {
            self.max_zoom
        } else {
            0
        }
    }
}
