//! Recording mock driver.
//!
//! Every call made through the driver or one of its handles is appended
//! to a shared [`CallLog`], so tests can assert exactly what the session
//! did to the hardware and in which order. Pictures are real JPEG bytes.

use super::{
    CameraDriver, CameraParameters, DeviceHandle, DeviceId, DeviceInfo, FocusMode, HardwareError,
    PictureFormat,
};
use crate::geometry::{Facing, Resolution, Rotation, SurfaceTarget};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Size used for pictures when no picture size has been negotiated.
const FALLBACK_PICTURE_SIZE: Resolution = Resolution::new(64, 48);

/// One observed hardware call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// `CameraDriver::devices`.
    Devices,
    /// `CameraDriver::open`.
    Open(DeviceId),
    /// `DeviceHandle::parameters`.
    Parameters,
    /// `DeviceHandle::set_parameters`, with the block written.
    SetParameters(Box<CameraParameters>),
    /// `DeviceHandle::set_display_orientation`.
    SetDisplayOrientation(Rotation),
    /// `DeviceHandle::start_preview`.
    StartPreview(SurfaceTarget),
    /// `DeviceHandle::stop_preview`.
    StopPreview,
    /// `DeviceHandle::cancel_auto_focus`.
    CancelAutoFocus,
    /// `DeviceHandle::auto_focus`.
    AutoFocus,
    /// `DeviceHandle::take_picture`.
    TakePicture,
    /// `DeviceHandle::release`.
    Release,
}

/// Shared, append-only record of driver calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    /// Returns a copy of every call recorded so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Counts recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|c| pred(c))
            .count()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// What the mock does when asked for a picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PictureOutcome {
    #[default]
    Image,
    Empty,
    Error,
    Panic,
}

#[derive(Debug, Clone)]
struct Behavior {
    fail_open: bool,
    fail_configure: bool,
    auto_focus_result: bool,
    disconnect_on_focus: bool,
    panic_on_focus: bool,
    panic_on_release: bool,
    picture: PictureOutcome,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            fail_open: false,
            fail_configure: false,
            auto_focus_result: true,
            disconnect_on_focus: false,
            panic_on_focus: false,
            panic_on_release: false,
            picture: PictureOutcome::Image,
        }
    }
}

/// Mock camera driver for tests and the demo binary.
#[derive(Debug, Clone)]
pub struct MockDriver {
    devices: Vec<DeviceInfo>,
    parameters: CameraParameters,
    behavior: Behavior,
    log: CallLog,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// A phone-like driver: back camera mounted at 90°, front at 270°.
    pub fn new() -> Self {
        Self {
            devices: vec![
                DeviceInfo {
                    id: DeviceId(0),
                    facing: Facing::Back,
                    sensor_orientation: Rotation::Deg90,
                },
                DeviceInfo {
                    id: DeviceId(1),
                    facing: Facing::Front,
                    sensor_orientation: Rotation::Deg270,
                },
            ],
            parameters: Self::default_parameters(),
            behavior: Behavior::default(),
            log: CallLog::default(),
        }
    }

    /// Parameter block reported by default-constructed mocks.
    pub fn default_parameters() -> CameraParameters {
        CameraParameters {
            supported_preview_sizes: vec![
                Resolution::new(640, 480),
                Resolution::new(1280, 720),
                Resolution::new(1920, 1080),
            ],
            supported_picture_sizes: vec![Resolution::new(320, 240), Resolution::new(640, 360)],
            supported_focus_modes: vec![FocusMode::Auto, FocusMode::ContinuousPicture],
            supported_picture_formats: vec![PictureFormat::Jpeg, PictureFormat::Nv21],
            max_focus_areas: 1,
            max_metering_areas: 1,
            zoom_supported: true,
            max_zoom: 10,
            ..Default::default()
        }
    }

    /// Replaces the list of physical cameras.
    pub fn with_devices(mut self, devices: Vec<DeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    /// Replaces the parameter block every opened device starts from.
    pub fn with_parameters(mut self, parameters: CameraParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Makes every `open` fail.
    pub fn failing_open(mut self) -> Self {
        self.behavior.fail_open = true;
        self
    }

    /// Makes every `set_parameters` fail.
    pub fn failing_configure(mut self) -> Self {
        self.behavior.fail_configure = true;
        self
    }

    /// Sets the result every autofocus pass reports.
    pub fn auto_focus_result(mut self, success: bool) -> Self {
        self.behavior.auto_focus_result = success;
        self
    }

    /// Autofocus reports the device as disconnected.
    pub fn disconnecting_focus(mut self) -> Self {
        self.behavior.disconnect_on_focus = true;
        self
    }

    /// Autofocus panics inside the driver.
    pub fn panicking_focus(mut self) -> Self {
        self.behavior.panic_on_focus = true;
        self
    }

    /// Releasing a device panics inside the driver, after it is logged.
    pub fn panicking_release(mut self) -> Self {
        self.behavior.panic_on_release = true;
        self
    }

    /// Pictures complete without image data.
    pub fn empty_pictures(mut self) -> Self {
        self.behavior.picture = PictureOutcome::Empty;
        self
    }

    /// Pictures fail with a hardware error.
    pub fn failing_pictures(mut self) -> Self {
        self.behavior.picture = PictureOutcome::Error;
        self
    }

    /// Pictures panic inside the driver.
    pub fn panicking_pictures(mut self) -> Self {
        self.behavior.picture = PictureOutcome::Panic;
        self
    }

    /// Handle to the shared call log.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl CameraDriver for MockDriver {
    fn devices(&self) -> Result<Vec<DeviceInfo>, HardwareError> {
        self.log.push(DriverCall::Devices);
        Ok(self.devices.clone())
    }

    fn open(&mut self, id: DeviceId) -> Result<Box<dyn DeviceHandle>, HardwareError> {
        self.log.push(DriverCall::Open(id));
        if !self.devices.iter().any(|d| d.id == id) {
            return Err(HardwareError::DeviceNotFound(id.to_string()));
        }
        if self.behavior.fail_open {
            return Err(HardwareError::OpenFailed(format!("{id} is busy")));
        }

        tracing::info!(device = %id, "MockDriver opened device");
        Ok(Box::new(MockDevice {
            parameters: self.parameters.clone(),
            behavior: self.behavior.clone(),
            log: self.log.clone(),
        }))
    }
}

struct MockDevice {
    parameters: CameraParameters,
    behavior: Behavior,
    log: CallLog,
}

impl MockDevice {
    fn encode_picture(&self) -> Result<Vec<u8>, HardwareError> {
        let size = self.parameters.picture_size.unwrap_or(FALLBACK_PICTURE_SIZE);
        let pixels = image::RgbImage::from_fn(size.width, size.height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .map_err(|e| HardwareError::CaptureFailed(e.to_string()))?;
        Ok(bytes)
    }
}

impl DeviceHandle for MockDevice {
    fn parameters(&self) -> Result<CameraParameters, HardwareError> {
        self.log.push(DriverCall::Parameters);
        Ok(self.parameters.clone())
    }

    fn set_parameters(&mut self, params: &CameraParameters) -> Result<(), HardwareError> {
        self.log.push(DriverCall::SetParameters(Box::new(params.clone())));
        if self.behavior.fail_configure {
            return Err(HardwareError::ConfigFailed("parameters rejected".into()));
        }
        self.parameters = params.clone();
        Ok(())
    }

    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), HardwareError> {
        self.log.push(DriverCall::SetDisplayOrientation(rotation));
        Ok(())
    }

    fn start_preview(&mut self, surface: SurfaceTarget) -> Result<(), HardwareError> {
        self.log.push(DriverCall::StartPreview(surface));
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), HardwareError> {
        self.log.push(DriverCall::StopPreview);
        Ok(())
    }

    fn cancel_auto_focus(&mut self) -> Result<(), HardwareError> {
        self.log.push(DriverCall::CancelAutoFocus);
        Ok(())
    }

    fn auto_focus(&mut self) -> Result<bool, HardwareError> {
        self.log.push(DriverCall::AutoFocus);
        if self.behavior.panic_on_focus {
            panic!("mock driver panicked during autofocus");
        }
        if self.behavior.disconnect_on_focus {
            return Err(HardwareError::Disconnected);
        }
        Ok(self.behavior.auto_focus_result)
    }

    fn take_picture(&mut self) -> Result<Option<Vec<u8>>, HardwareError> {
        self.log.push(DriverCall::TakePicture);
        match self.behavior.picture {
            PictureOutcome::Image => self.encode_picture().map(Some),
            PictureOutcome::Empty => Ok(None),
            PictureOutcome::Error => Err(HardwareError::CaptureFailed("sensor timeout".into())),
            PictureOutcome::Panic => panic!("mock driver panicked during capture"),
        }
    }

    fn release(self: Box<Self>) {
        self.log.push(DriverCall::Release);
        if self.behavior.panic_on_release {
            panic!("mock driver panicked during release");
        }
        tracing::info!("MockDriver released device");
    }
}
