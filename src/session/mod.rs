//! Camera session: device state machine and command serializer.
//!
//! A [`CameraSession`] owns one dedicated worker thread. Every public
//! command is queued to that thread and executed strictly in submission
//! order; the thread is the only place the driver, the open device and
//! the [`CameraState`] are mutated. Results come back as typed callbacks
//! posted to the caller's [`CallerContext`] and run when the caller
//! dispatches them.
//!
//! ```text
//! caller ── command ──▶ worker (FIFO) ── driver calls ──▶ hardware
//!    ▲                       │
//!    └── CallerContext ◀─ result
//! ```
//!
//! # Example
//!
//! ```no_run
//! use camera_session::{CallerContext, CameraSession, MockDriver, SessionConfig};
//! use std::time::Duration;
//!
//! let context = CallerContext::new();
//! let session = CameraSession::new(MockDriver::new(), SessionConfig::default(), context.handle())
//!     .unwrap();
//!
//! session.set_surface_target(1080, 1920).unwrap();
//! session
//!     .open(|opened| println!("opened: {opened}"))
//!     .unwrap();
//! session
//!     .take_picture(|picture| println!("captured: {:?}", picture))
//!     .unwrap();
//!
//! while context.dispatch_timeout(Duration::from_secs(1)) {}
//! ```

mod capture;
mod command;
mod context;
mod error;
mod state;
mod worker;

pub use capture::CaptureResult;
pub use context::{CallerContext, ContextHandle};
pub use error::{CommandError, SessionError};
pub use state::CameraState;

use crate::config::SessionConfig;
use crate::discovery::DeviceDirectory;
use crate::geometry::{tilt_rotation, Rotation, SurfaceTarget};
use crate::hardware::CameraDriver;
use crate::metrics::MetricsRegistry;
use command::Command;
use state::StateCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use worker::Worker;

/// Handle to a single-camera session.
///
/// Commands never block on hardware; they only enqueue. Every command
/// returns `Err` synchronously, without queueing, if the caller context
/// has been dropped or the worker has stopped.
///
/// Dropping the session queues a shutdown behind all pending commands,
/// releases any open device and joins the worker.
pub struct CameraSession {
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    caller: ContextHandle,
    state: Arc<StateCell>,
    directory: Arc<DeviceDirectory>,
    metrics: Arc<MetricsRegistry>,
    /// Last tilt sent to the worker, in degrees.
    tilt: AtomicU32,
}

impl CameraSession {
    /// Discovers cameras through `driver` and starts the worker.
    ///
    /// Results of later commands are posted to `caller`.
    pub fn new<D: CameraDriver>(
        driver: D,
        config: SessionConfig,
        caller: ContextHandle,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if !caller.is_attached() {
            return Err(SessionError::ContextDropped);
        }

        let directory = Arc::new(DeviceDirectory::discover(&driver));
        let state = Arc::new(StateCell::default());
        let metrics = Arc::new(MetricsRegistry::new()?);

        let (commands, receiver) = mpsc::channel();
        let worker = Worker::new(
            driver,
            config.clone(),
            Arc::clone(&directory),
            caller.clone(),
            Arc::clone(&state),
            Arc::clone(&metrics),
        );
        let handle = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || worker.run(receiver))?;

        tracing::info!(
            worker = %config.worker_name,
            cameras = directory.len(),
            "Camera session started"
        );

        Ok(Self {
            commands,
            worker: Some(handle),
            caller,
            state,
            directory,
            metrics,
            tilt: AtomicU32::new(Rotation::Deg0.degrees()),
        })
    }

    fn submit(&self, command: Command) -> Result<(), SessionError> {
        if !self.caller.is_attached() {
            return Err(SessionError::ContextDropped);
        }
        self.commands
            .send(command)
            .map_err(|_| SessionError::WorkerStopped)
    }

    /// Opens the current (or default) camera and starts preview.
    ///
    /// Any device already held is released first. `on_done` receives
    /// whether the camera ended up open.
    pub fn open(&self, on_done: impl FnOnce(bool) + Send + 'static) -> Result<(), SessionError> {
        self.submit(Command::Open(Box::new(on_done)))
    }

    /// Sets the preview surface size used by the next open.
    pub fn set_surface_target(&self, width: u32, height: u32) -> Result<(), SessionError> {
        self.submit(Command::SetSurface(SurfaceTarget::new(width, height)))
    }

    /// Focuses and meters on a touch at `(x, y)` surface pixels.
    ///
    /// Only applies while a camera is open; otherwise the command is
    /// dropped and `on_done` is never called.
    pub fn set_focus(
        &self,
        x: f32,
        y: f32,
        on_done: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), SessionError> {
        self.submit(Command::SetFocus {
            x,
            y,
            reply: Box::new(on_done),
        })
    }

    /// Zooms by a pinch span delta in pixels. Ignored unless open.
    pub fn set_zoom(&self, span: f32) -> Result<(), SessionError> {
        self.submit(Command::SetZoom(span))
    }

    /// Sets the device tilt used to rotate the next capture.
    pub fn set_device_tilt_rotation(&self, tilt: Rotation) -> Result<(), SessionError> {
        self.submit(Command::SetTilt(tilt))?;
        self.tilt.store(tilt.degrees(), Ordering::Relaxed);
        Ok(())
    }

    /// Feeds raw accelerometer x/y readings.
    ///
    /// Returns the tilt the reading maps to, or `None` if it was too close
    /// to a diagonal to count. Only a tilt that differs from the last one
    /// sent is queued to the worker.
    pub fn feed_accelerometer(&self, x: f32, y: f32) -> Result<Option<Rotation>, SessionError> {
        let Some(tilt) = tilt_rotation(x, y) else {
            return Ok(None);
        };
        if tilt.degrees() != self.tilt.load(Ordering::Relaxed) {
            self.set_device_tilt_rotation(tilt)?;
        }
        Ok(Some(tilt))
    }

    /// Sets the display rotation used by the next open.
    pub fn set_display_rotation(&self, rotation: Rotation) -> Result<(), SessionError> {
        self.submit(Command::SetDisplayRotation(rotation))
    }

    /// Captures a still.
    ///
    /// The camera is released once the capture completes, successful or
    /// not; call [`open`](Self::open) again to resume preview. Dropped
    /// without calling `on_done` unless a camera is open.
    pub fn take_picture(
        &self,
        on_done: impl FnOnce(Option<CaptureResult>) + Send + 'static,
    ) -> Result<(), SessionError> {
        self.submit(Command::TakePicture(Box::new(on_done)))
    }

    /// Switches to the other camera and opens it.
    ///
    /// Dropped without calling `on_done` when fewer than two cameras exist.
    pub fn switch_camera(
        &self,
        on_done: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), SessionError> {
        self.submit(Command::Switch(Box::new(on_done)))
    }

    /// Releases the camera, if held. Idempotent.
    pub fn close(&self) -> Result<(), SessionError> {
        self.submit(Command::Close)
    }

    /// Blocks until every command queued before this call has executed.
    ///
    /// Returns false if `timeout` elapsed first. Results posted by those
    /// commands still need to be dispatched on the caller context.
    pub fn flush(&self, timeout: Duration) -> Result<bool, SessionError> {
        let (done, wait) = mpsc::channel();
        self.submit(Command::Flush(done))?;
        Ok(wait.recv_timeout(timeout).is_ok())
    }

    /// Whether a camera is held, as of the last completed command.
    pub fn is_opened(&self) -> bool {
        self.state.load().holds_device()
    }

    /// State as of the last completed command.
    pub fn state(&self) -> CameraState {
        self.state.load()
    }

    /// Whether at least two cameras were found at startup.
    pub fn has_multiple_devices(&self) -> bool {
        self.directory.has_multiple()
    }

    /// Cameras found at startup.
    pub fn devices(&self) -> &DeviceDirectory {
        &self.directory
    }

    /// Session metrics, updated by the worker.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Camera worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("state", &self.state.load())
            .field("cameras", &self.directory.len())
            .finish()
    }
}
