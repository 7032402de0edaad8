//! Metrics collection and registry.

use crate::session::CameraState;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Commands executed by the worker.
    pub commands: u64,
    /// Opens (including switches) that left a camera open.
    pub opens_succeeded: u64,
    /// Opens (including switches) that failed.
    pub opens_failed: u64,
    /// Captures that produced an image.
    pub captures_succeeded: u64,
    /// Captures that produced nothing.
    pub captures_failed: u64,
    /// Failures raised by the device or driver.
    pub hardware_faults: u64,
}

/// Prometheus metrics registry for a camera session.
pub struct MetricsRegistry {
    registry: Registry,

    commands_total: IntCounter,
    open_success_total: IntCounter,
    open_failure_total: IntCounter,
    capture_success_total: IntCounter,
    capture_failure_total: IntCounter,
    hardware_faults_total: IntCounter,

    state: IntGauge,
    zoom_step: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all session metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let commands_total = IntCounter::new(
            "camera_session_commands_total",
            "Total number of commands executed by the worker",
        )?;
        let open_success_total = IntCounter::new(
            "camera_session_open_success_total",
            "Opens and switches that left a camera open",
        )?;
        let open_failure_total = IntCounter::new(
            "camera_session_open_failure_total",
            "Opens and switches that failed",
        )?;
        let capture_success_total = IntCounter::new(
            "camera_session_capture_success_total",
            "Captures that produced an image",
        )?;
        let capture_failure_total = IntCounter::new(
            "camera_session_capture_failure_total",
            "Captures that produced no image",
        )?;
        let hardware_faults_total = IntCounter::new(
            "camera_session_hardware_faults_total",
            "Failures raised by the camera device or driver",
        )?;
        let state = IntGauge::new(
            "camera_session_state",
            "Current camera state (0=idle, 1=opened, 2=shooting)",
        )?;
        let zoom_step = IntGauge::new("camera_session_zoom_step", "Current hardware zoom step")?;

        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(open_success_total.clone()))?;
        registry.register(Box::new(open_failure_total.clone()))?;
        registry.register(Box::new(capture_success_total.clone()))?;
        registry.register(Box::new(capture_failure_total.clone()))?;
        registry.register(Box::new(hardware_faults_total.clone()))?;
        registry.register(Box::new(state.clone()))?;
        registry.register(Box::new(zoom_step.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            open_success_total,
            open_failure_total,
            capture_success_total,
            capture_failure_total,
            hardware_faults_total,
            state,
            zoom_step,
        })
    }

    pub(crate) fn record_command(&self) {
        self.commands_total.inc();
    }

    pub(crate) fn record_open(&self, success: bool) {
        if success {
            self.open_success_total.inc();
        } else {
            self.open_failure_total.inc();
        }
    }

    pub(crate) fn record_capture(&self, success: bool) {
        if success {
            self.capture_success_total.inc();
        } else {
            self.capture_failure_total.inc();
        }
    }

    pub(crate) fn record_fault(&self) {
        self.hardware_faults_total.inc();
    }

    pub(crate) fn set_state(&self, state: CameraState) {
        self.state.set(state as i64);
    }

    pub(crate) fn set_zoom(&self, step: u32) {
        self.zoom_step.set(step as i64);
    }

    /// Reads the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands: self.commands_total.get(),
            opens_succeeded: self.open_success_total.get(),
            opens_failed: self.open_failure_total.get(),
            captures_succeeded: self.capture_success_total.get(),
            captures_failed: self.capture_failure_total.get(),
            hardware_faults: self.hardware_faults_total.get(),
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new().unwrap();
        assert_eq!(registry.registry().gather().len(), 8);
    }

    #[test]
    fn test_records_show_in_snapshot() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_command();
        registry.record_open(true);
        registry.record_open(false);
        registry.record_capture(false);
        registry.record_fault();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.commands, 1);
        assert_eq!(snapshot.opens_succeeded, 1);
        assert_eq!(snapshot.opens_failed, 1);
        assert_eq!(snapshot.captures_failed, 1);
        assert_eq!(snapshot.hardware_faults, 1);
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        registry.set_state(CameraState::Opened);
        registry.set_zoom(4);

        let output = registry.encode().unwrap();
        assert!(output.contains("camera_session_state 1"));
        assert!(output.contains("camera_session_zoom_step 4"));
        assert!(output.contains("camera_session_commands_total"));
    }
}
