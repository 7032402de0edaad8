//! Camera hardware seam.
//!
//! The session never talks to a platform camera API directly. It goes
//! through [`CameraDriver`] to enumerate and open devices, and through
//! [`DeviceHandle`] for everything done to an open device. Both are
//! blocking; the session calls them only from its worker thread.

mod driver;
mod mock;
mod parameters;

pub use driver::{CameraDriver, DeviceHandle, DeviceId, DeviceInfo, HardwareError};
pub use mock::{CallLog, DriverCall, MockDriver};
pub use parameters::{CameraParameters, FocusMode, PictureFormat};
