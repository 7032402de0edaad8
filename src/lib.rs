//! Camera Session Library
//!
//! Manages the lifecycle of a single physical camera: opening and
//! configuring it, focusing, zooming and capturing stills, with every
//! hardware call serialized onto one worker thread.
//!
//! # Architecture
//!
//! ```text
//! caller → CameraSession → worker thread → CameraDriver / DeviceHandle
//!                               ↓
//!           geometry (size selection, focus regions, zoom, orientation)
//! ```
//!
//! # Design Principles
//!
//! - **One owner**: only the worker touches the device and the state machine
//! - **Strict ordering**: commands execute in submission order, none are cancelled
//! - **Results on the caller's thread**: callbacks run when the caller dispatches them
//! - **Failures are values**: hardware problems surface as `false` or `None`
//!
//! # Example
//!
//! ```no_run
//! use camera_session::{CallerContext, CameraSession, MockDriver, SessionConfig};
//! use std::time::Duration;
//!
//! let context = CallerContext::new();
//! let session =
//!     CameraSession::new(MockDriver::new(), SessionConfig::default(), context.handle()).unwrap();
//!
//! session.set_surface_target(1080, 1920).unwrap();
//! session.open(|opened| assert!(opened)).unwrap();
//! session.set_focus(540.0, 960.0, |focused| println!("focused: {focused}")).unwrap();
//! session.set_zoom(120.0).unwrap();
//! session
//!     .take_picture(|picture| {
//!         if let Some(picture) = picture {
//!             println!("{}x{}", picture.image().width(), picture.image().height());
//!         }
//!     })
//!     .unwrap();
//!
//! while context.dispatch_timeout(Duration::from_millis(500)) {}
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod discovery;
pub mod geometry;
pub mod hardware;
pub mod metrics;
pub mod session;

// Re-export commonly used types at crate root
pub use config::{ConfigError, FileConfig, SessionConfig};
pub use discovery::DeviceDirectory;
pub use geometry::{CaptureTransform, Facing, Resolution, Rotation, SurfaceTarget};
pub use hardware::{CameraDriver, DeviceHandle, DeviceId, DeviceInfo, HardwareError, MockDriver};
pub use session::{CallerContext, CameraSession, CameraState, CaptureResult, SessionError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
