//! Session error types.

use crate::config::ConfigError;
use crate::hardware::HardwareError;
use crate::metrics::MetricsError;
use thiserror::Error;

/// Errors returned synchronously to the caller.
///
/// These are contract violations: the command was never queued.
/// Hardware failures are never reported here; they surface as `false`
/// or `None` in the command's callback.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The caller context was dropped.
    #[error("caller context has been dropped")]
    ContextDropped,
    /// The worker thread is no longer receiving commands.
    #[error("camera worker has stopped")]
    WorkerStopped,
    /// The configuration failed validation.
    #[error("invalid session configuration: {0}")]
    Config(#[from] ConfigError),
    /// Session metrics could not be registered.
    #[error("failed to register session metrics: {0}")]
    Metrics(#[from] MetricsError),
    /// The worker thread could not be spawned.
    #[error("failed to spawn camera worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Failures inside the worker while executing a command.
///
/// Logged at the worker boundary and downgraded to a failed result.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No camera to open or operate on.
    #[error("no camera device available")]
    NoDevice,
    /// Open was attempted before a surface target was set.
    #[error("no surface target has been set")]
    NoSurface,
    /// Reading or writing parameters during open failed.
    #[error("parameter negotiation failed: {0}")]
    Configuration(#[source] HardwareError),
    /// The capture returned no bytes.
    #[error("capture completed without image data")]
    NoImageData,
    /// The captured bytes could not be decoded.
    #[error("failed to decode captured image: {0}")]
    Decode(#[from] image::ImageError),
    /// A driver call failed.
    #[error("hardware fault: {0}")]
    Hardware(#[from] HardwareError),
    /// A driver call panicked.
    #[error("driver panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    /// Returns true for failures raised by the device itself.
    pub fn is_hardware_fault(&self) -> bool {
        matches!(self, CommandError::Hardware(_) | CommandError::Panicked(_))
    }
}
