//! Hardware worker.
//!
//! The worker thread owns the driver, the open device and the state
//! machine. It executes commands one at a time in submission order and
//! posts results back to the caller's context. Nothing else touches the
//! device.

use super::capture::decode_capture;
use super::command::Command;
use super::context::ContextHandle;
use super::error::CommandError;
use super::state::{CameraState, StateCell};
use super::CaptureResult;
use crate::config::SessionConfig;
use crate::discovery::DeviceDirectory;
use crate::geometry::{
    apply_touch_regions, apply_zoom, capture_transform, display_orientation, negotiate_parameters,
    Rotation, SurfaceTarget, ZoomState,
};
use crate::hardware::{CameraDriver, DeviceHandle, DeviceId, DeviceInfo};
use crate::metrics::MetricsRegistry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// The device currently held, with everything fixed at open time.
struct ActiveDevice {
    handle: Box<dyn DeviceHandle>,
    info: DeviceInfo,
    /// Preview display orientation computed at open.
    orientation: Rotation,
    zoom: ZoomState,
}

pub(crate) struct Worker<D: CameraDriver> {
    driver: D,
    config: SessionConfig,
    directory: Arc<DeviceDirectory>,
    caller: ContextHandle,
    state: Arc<StateCell>,
    metrics: Arc<MetricsRegistry>,
    device: Option<ActiveDevice>,
    camera_id: Option<DeviceId>,
    surface: Option<SurfaceTarget>,
    display_rotation: Rotation,
    tilt: Rotation,
}

impl<D: CameraDriver> Worker<D> {
    pub(crate) fn new(
        driver: D,
        config: SessionConfig,
        directory: Arc<DeviceDirectory>,
        caller: ContextHandle,
        state: Arc<StateCell>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let display_rotation = config.display_rotation;
        Self {
            driver,
            config,
            directory,
            caller,
            state,
            metrics,
            device: None,
            camera_id: None,
            surface: None,
            display_rotation,
            tilt: Rotation::Deg0,
        }
    }

    /// Executes commands until shutdown or until every sender is gone.
    pub(crate) fn run(mut self, commands: Receiver<Command>) {
        debug!(worker = %self.config.worker_name, "Camera worker started");

        while let Ok(command) = commands.recv() {
            trace!(command = command.name(), state = %self.state.load(), "Executing command");
            self.metrics.record_command();
            if !self.execute(command) {
                break;
            }
        }

        self.guarded("shutdown", |w| {
            w.release_device();
            Ok(())
        });
        debug!(worker = %self.config.worker_name, "Camera worker stopped");
    }

    /// Returns false when the worker should stop.
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Open(reply) => {
                let opened = self.guarded("open", |w| w.open_device()).is_some();
                self.metrics.record_open(opened);
                self.post(move || reply(opened));
            }
            Command::SetSurface(surface) => {
                debug!(width = surface.width, height = surface.height, "Surface target set");
                self.surface = Some(surface);
            }
            Command::SetFocus { x, y, reply } => {
                if self.ignored("set_focus") {
                    return true;
                }
                let focused = self.guarded("set_focus", |w| w.focus(x, y)).unwrap_or(false);
                self.post(move || reply(focused));
            }
            Command::SetZoom(span) => {
                if !self.ignored("set_zoom") {
                    self.guarded("set_zoom", |w| w.zoom(span));
                }
            }
            Command::SetTilt(tilt) => {
                trace!(tilt = %tilt, "Device tilt updated");
                self.tilt = tilt;
            }
            Command::SetDisplayRotation(rotation) => {
                debug!(rotation = %rotation, "Display rotation updated");
                self.display_rotation = rotation;
            }
            Command::TakePicture(reply) => {
                if self.ignored("take_picture") {
                    return true;
                }
                self.transition(CameraState::Shooting);
                let result = self.guarded("take_picture", |w| w.capture());
                // Released whether or not the capture succeeded.
                self.guarded("release", |w| {
                    w.release_device();
                    Ok(())
                });
                self.metrics.record_capture(result.is_some());
                self.post(move || reply(result));
            }
            Command::Switch(reply) => {
                if !self.directory.has_multiple() {
                    debug!("Switch ignored: fewer than two cameras");
                    return true;
                }
                self.camera_id = self.directory.switch_target(self.camera_id);
                let opened = self.guarded("switch_camera", |w| w.open_device()).is_some();
                info!(device = ?self.camera_id, opened, "Switched camera");
                self.metrics.record_open(opened);
                self.post(move || reply(opened));
            }
            Command::Close => {
                self.guarded("close", |w| {
                    w.release_device();
                    Ok(())
                });
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => return false,
        }
        true
    }

    /// Logs and returns true if `op` does not apply in the current state.
    fn ignored(&self, op: &'static str) -> bool {
        let state = self.state.load();
        if state != CameraState::Opened {
            debug!(op, state = %state, "Command ignored outside opened state");
            return true;
        }
        false
    }

    /// Runs `f` at the worker boundary.
    ///
    /// Errors and driver panics are logged and turned into `None`. After a
    /// panic the device is still released before the worker carries on.
    fn guarded<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, CommandError>,
    ) -> Option<T> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(self)))
            .unwrap_or_else(|payload| Err(CommandError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(op, error = %e, "Camera command failed");
                if e.is_hardware_fault() {
                    self.metrics.record_fault();
                }
                if matches!(e, CommandError::Panicked(_)) {
                    self.release_after_panic();
                }
                None
            }
        }
    }

    fn open_device(&mut self) -> Result<(), CommandError> {
        self.release_device();

        let surface = self
            .surface
            .filter(|s| !s.is_empty())
            .ok_or(CommandError::NoSurface)?;
        let id = self
            .camera_id
            .or_else(|| self.directory.default_device(self.config.preferred_facing))
            .ok_or(CommandError::NoDevice)?;
        self.camera_id = Some(id);
        let info = *self.directory.get(id).ok_or(CommandError::NoDevice)?;

        let mut handle = self.driver.open(id)?;
        let configured = configure(
            handle.as_mut(),
            &info,
            surface,
            self.display_rotation,
            self.config.jpeg_quality,
        );
        let (orientation, zoom) = match configured {
            Ok(negotiated) => negotiated,
            Err(e) => {
                handle.release();
                return Err(e);
            }
        };

        self.device = Some(ActiveDevice {
            handle,
            info,
            orientation,
            zoom,
        });
        self.metrics.set_zoom(zoom.current);
        self.transition(CameraState::Opened);
        info!(
            device = %id,
            facing = %info.facing,
            orientation = %orientation,
            max_zoom = zoom.max,
            "Camera opened"
        );
        Ok(())
    }

    fn focus(&mut self, x: f32, y: f32) -> Result<bool, CommandError> {
        let surface = self.surface.ok_or(CommandError::NoSurface)?;
        let device = self.device.as_mut().ok_or(CommandError::NoDevice)?;

        device.handle.cancel_auto_focus()?;
        let mut params = device.handle.parameters()?;
        apply_touch_regions(surface, &mut params, x, y);
        device.handle.set_parameters(&params)?;
        let focused = device.handle.auto_focus()?;

        debug!(x, y, focused, "Autofocus finished");
        Ok(focused)
    }

    fn zoom(&mut self, span: f32) -> Result<(), CommandError> {
        let surface = self.surface.ok_or(CommandError::NoSurface)?;
        let device = self.device.as_mut().ok_or(CommandError::NoDevice)?;

        let mut next = device.zoom;
        if !apply_zoom(surface.sensor_frame().height, &mut next, span) {
            return Ok(());
        }

        let mut params = device.handle.parameters()?;
        params.zoom = next.current;
        device.handle.set_parameters(&params)?;
        device.zoom = next;
        self.metrics.set_zoom(next.current);
        Ok(())
    }

    fn capture(&mut self) -> Result<CaptureResult, CommandError> {
        let device = self.device.as_mut().ok_or(CommandError::NoDevice)?;
        let taken = device.handle.take_picture();
        let info = device.info;
        let orientation = device.orientation;
        self.release_device();

        let bytes = taken?
            .filter(|b| !b.is_empty())
            .ok_or(CommandError::NoImageData)?;
        let transform = capture_transform(orientation, self.tilt, info.facing);
        let image = decode_capture(&bytes, transform)?;

        info!(
            device = %info.id,
            rotation = %transform.rotation,
            mirrored = transform.mirrored,
            width = image.width(),
            height = image.height(),
            "Picture captured"
        );
        Ok(CaptureResult::new(image, transform, info.id, info.facing))
    }

    /// Stops preview and releases the device, if one is held. Idempotent.
    fn release_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            if let Err(e) = device.handle.stop_preview() {
                warn!(device = %device.info.id, error = %e, "Failed to stop preview");
            }
            device.handle.release();
            info!(device = %device.info.id, "Camera released");
        }
        self.transition(CameraState::Idle);
    }

    /// Releases the device after a driver panic.
    ///
    /// The release runs under its own unwind guard; if the driver panics
    /// again the handle is dropped and the device is given up.
    fn release_after_panic(&mut self) {
        if let Some(mut device) = self.device.take() {
            let id = device.info.id;
            warn!(device = %id, "Releasing camera after driver panic");
            let released = panic::catch_unwind(AssertUnwindSafe(move || {
                if let Err(e) = device.handle.stop_preview() {
                    warn!(device = %id, error = %e, "Failed to stop preview");
                }
                device.handle.release();
            }));
            if let Err(payload) = released {
                warn!(
                    device = %id,
                    panic = %panic_message(&*payload),
                    "Driver panicked again during release; camera abandoned"
                );
            }
        }
        self.transition(CameraState::Idle);
    }

    fn transition(&mut self, next: CameraState) {
        let current = self.state.load();
        if current != next {
            debug!(from = %current, to = %next, "Camera state transition");
            self.state.store(next);
            self.metrics.set_state(next);
        }
    }

    fn post(&self, task: impl FnOnce() + Send + 'static) {
        if !self.caller.post(task) {
            debug!("Caller context gone; result discarded");
        }
    }
}

/// Negotiates parameters, sets the preview orientation and starts preview.
fn configure(
    handle: &mut dyn DeviceHandle,
    info: &DeviceInfo,
    surface: SurfaceTarget,
    display_rotation: Rotation,
    jpeg_quality: u8,
) -> Result<(Rotation, ZoomState), CommandError> {
    let mut params = handle.parameters().map_err(CommandError::Configuration)?;
    negotiate_parameters(surface.sensor_frame(), &mut params, jpeg_quality);
    handle
        .set_parameters(&params)
        .map_err(CommandError::Configuration)?;

    let orientation = display_orientation(info.sensor_orientation, display_rotation, info.facing);
    handle.set_display_orientation(orientation)?;
    handle.start_preview(surface)?;

    Ok((
        orientation,
        ZoomState::new(params.zoom, params.effective_max_zoom()),
    ))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
