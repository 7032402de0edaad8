//! Physical camera discovery.
//!
//! Run once when a session is constructed. The resulting directory is
//! immutable and shared between the caller (for `has_multiple_devices`)
//! and the worker (for picking which device to open).

use crate::geometry::Facing;
use crate::hardware::{CameraDriver, DeviceId, DeviceInfo};

/// Cameras found at startup, with the first back- and front-facing ids.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: Vec<DeviceInfo>,
    back: Option<DeviceId>,
    front: Option<DeviceId>,
}

impl DeviceDirectory {
    /// Builds a directory from an already enumerated device list.
    pub fn from_devices(devices: Vec<DeviceInfo>) -> Self {
        let first_facing = |facing: Facing| {
            devices
                .iter()
                .find(|d| d.facing == facing)
                .map(|d| d.id)
        };
        let back = first_facing(Facing::Back);
        let front = first_facing(Facing::Front);
        Self {
            devices,
            back,
            front,
        }
    }

    /// Enumerates devices through `driver`.
    ///
    /// An enumeration failure yields an empty directory; opening will then
    /// report that no camera was found.
    pub fn discover(driver: &dyn CameraDriver) -> Self {
        match driver.devices() {
            Ok(devices) => {
                let directory = Self::from_devices(devices);
                tracing::info!(
                    count = directory.len(),
                    back = ?directory.back,
                    front = ?directory.front,
                    "Discovered cameras"
                );
                directory
            }
            Err(e) => {
                tracing::warn!(error = %e, "Camera enumeration failed");
                Self::default()
            }
        }
    }

    /// Number of physical cameras.
    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no camera was found.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns true if at least two cameras exist.
    #[inline]
    pub fn has_multiple(&self) -> bool {
        self.devices.len() > 1
    }

    /// First camera with the given facing.
    pub fn by_facing(&self, facing: Facing) -> Option<DeviceId> {
        match facing {
            Facing::Back => self.back,
            Facing::Front => self.front,
        }
    }

    /// Looks up a camera by id.
    pub fn get(&self, id: DeviceId) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Camera to open when none has been chosen yet.
    ///
    /// Prefers `preferred`, then the opposite facing, then anything listed.
    pub fn default_device(&self, preferred: Facing) -> Option<DeviceId> {
        self.by_facing(preferred)
            .or_else(|| self.by_facing(preferred.opposite()))
            .or_else(|| self.devices.first().map(|d| d.id))
    }

    /// Camera to switch to from `current`.
    ///
    /// Picks the opposite-facing camera. When that facing is missing, or
    /// nothing is open yet, falls back to the back camera and then to the
    /// next camera in discovery order.
    pub fn switch_target(&self, current: Option<DeviceId>) -> Option<DeviceId> {
        let Some(current) = current.and_then(|id| self.get(id)) else {
            return self.default_device(Facing::Back);
        };

        self.by_facing(current.facing.opposite()).or_else(|| {
            let index = self.devices.iter().position(|d| d.id == current.id)?;
            let next = &self.devices[(index + 1) % self.devices.len()];
            (next.id != current.id).then_some(next.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;

    fn device(id: u32, facing: Facing) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(id),
            facing,
            sensor_orientation: Rotation::Deg90,
        }
    }

    #[test]
    fn test_front_and_back_ids() {
        let dir = DeviceDirectory::from_devices(vec![
            device(0, Facing::Back),
            device(1, Facing::Front),
            device(2, Facing::Back),
        ]);
        assert_eq!(dir.by_facing(Facing::Back), Some(DeviceId(0)));
        assert_eq!(dir.by_facing(Facing::Front), Some(DeviceId(1)));
        assert!(dir.has_multiple());
    }

    #[test]
    fn test_default_falls_back_to_other_facing() {
        let dir = DeviceDirectory::from_devices(vec![device(4, Facing::Front)]);
        assert_eq!(dir.default_device(Facing::Back), Some(DeviceId(4)));
        assert!(!dir.has_multiple());
    }

    #[test]
    fn test_switch_alternates_facing() {
        let dir =
            DeviceDirectory::from_devices(vec![device(0, Facing::Back), device(1, Facing::Front)]);
        assert_eq!(dir.switch_target(None), Some(DeviceId(0)));
        assert_eq!(dir.switch_target(Some(DeviceId(0))), Some(DeviceId(1)));
        assert_eq!(dir.switch_target(Some(DeviceId(1))), Some(DeviceId(0)));
    }

    #[test]
    fn test_switch_between_same_facing() {
        let dir =
            DeviceDirectory::from_devices(vec![device(0, Facing::Back), device(3, Facing::Back)]);
        assert_eq!(dir.switch_target(Some(DeviceId(0))), Some(DeviceId(3)));
        assert_eq!(dir.switch_target(Some(DeviceId(3))), Some(DeviceId(0)));
    }

    #[test]
    fn test_empty_directory() {
        let dir = DeviceDirectory::default();
        assert!(dir.is_empty());
        assert_eq!(dir.default_device(Facing::Back), None);
        assert_eq!(dir.switch_target(None), None);
    }
}
