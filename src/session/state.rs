//! Device state machine states.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the session's camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CameraState {
    /// No device is held.
    #[default]
    Idle = 0,
    /// A device is open and previewing.
    Opened = 1,
    /// A still capture is in flight; the device is released when it completes.
    Shooting = 2,
}

impl CameraState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CameraState::Opened,
            2 => CameraState::Shooting,
            _ => CameraState::Idle,
        }
    }

    /// Returns true if a device handle is held in this state.
    #[inline]
    pub fn holds_device(self) -> bool {
        self != CameraState::Idle
    }
}

impl std::fmt::Display for CameraState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraState::Idle => write!(f, "idle"),
            CameraState::Opened => write!(f, "opened"),
            CameraState::Shooting => write!(f, "shooting"),
        }
    }
}

/// State published by the worker for lock-free reads from the caller.
///
/// Only the worker stores; readers may see a value that is one
/// command stale.
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn load(&self) -> CameraState {
        CameraState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: CameraState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_round_trip() {
        let cell = StateCell::default();
        assert_eq!(cell.load(), CameraState::Idle);
        cell.store(CameraState::Shooting);
        assert_eq!(cell.load(), CameraState::Shooting);
        assert!(cell.load().holds_device());
    }
}
