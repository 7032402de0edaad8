//! Driver traits for camera hardware.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real platform drivers and mock implementations for
//! testing.

use super::CameraParameters;
use crate::geometry::{Facing, Rotation, SurfaceTarget};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a camera driver.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// No camera with the requested id.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The camera exists but could not be acquired.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// Parameters were rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// The still capture failed.
    #[error("failed to capture picture: {0}")]
    CaptureFailed(String),
    /// The camera went away while open.
    #[error("camera disconnected")]
    Disconnected,
}

/// Platform identifier of a physical camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "camera{}", self.0)
    }
}

/// Static description of a physical camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Platform identifier.
    pub id: DeviceId,
    /// Which way the camera faces.
    pub facing: Facing,
    /// Mount angle of the sensor relative to the device's natural orientation.
    pub sensor_orientation: Rotation,
}

/// Entry point to the platform camera stack.
pub trait CameraDriver: Send + 'static {
    /// Lists the physical cameras present.
    fn devices(&self) -> Result<Vec<DeviceInfo>, HardwareError>;

    /// Acquires exclusive access to a camera.
    fn open(&mut self, id: DeviceId) -> Result<Box<dyn DeviceHandle>, HardwareError>;
}

/// An open camera.
///
/// Dropping a handle without calling [`DeviceHandle::release`] leaks the
/// device on real hardware; the session always releases explicitly.
pub trait DeviceHandle: Send {
    /// Reads the current parameter block.
    fn parameters(&self) -> Result<CameraParameters, HardwareError>;

    /// Writes a parameter block back to the device.
    fn set_parameters(&mut self, params: &CameraParameters) -> Result<(), HardwareError>;

    /// Sets the clockwise rotation applied to preview frames.
    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), HardwareError>;

    /// Starts streaming preview frames to the surface.
    fn start_preview(&mut self, surface: SurfaceTarget) -> Result<(), HardwareError>;

    /// Stops the preview stream.
    fn stop_preview(&mut self) -> Result<(), HardwareError>;

    /// Cancels any autofocus run in progress.
    fn cancel_auto_focus(&mut self) -> Result<(), HardwareError>;

    /// Runs a single autofocus pass, blocking until it settles.
    fn auto_focus(&mut self) -> Result<bool, HardwareError>;

    /// Captures a still, blocking until the encoded bytes are available.
    ///
    /// `Ok(None)` means the hardware completed without image data.
    fn take_picture(&mut self) -> Result<Option<Vec<u8>>, HardwareError>;

    /// Releases the device.
    fn release(self: Box<Self>);
}
