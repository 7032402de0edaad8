//! Prometheus metrics for camera sessions.
//!
//! Every session owns a [`MetricsRegistry`] that its worker updates as
//! commands execute. The registry can be read directly, encoded to the
//! Prometheus text format, or served over HTTP with the `metrics` feature.
//!
//! # Metrics Exposed
//!
//! - `camera_session_commands_total` - Commands executed by the worker
//! - `camera_session_open_success_total` - Opens/switches that succeeded
//! - `camera_session_open_failure_total` - Opens/switches that failed
//! - `camera_session_capture_success_total` - Captures that produced an image
//! - `camera_session_capture_failure_total` - Captures that produced nothing
//! - `camera_session_hardware_faults_total` - Device or driver failures
//! - `camera_session_state` - Current state (0=idle, 1=opened, 2=shooting)
//! - `camera_session_zoom_step` - Current zoom step

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
