//! Messages sent from the session to its worker.

use super::CaptureResult;
use crate::geometry::{Rotation, SurfaceTarget};
use std::sync::mpsc::Sender;

pub(crate) type BoolCallback = Box<dyn FnOnce(bool) + Send>;
pub(crate) type CaptureCallback = Box<dyn FnOnce(Option<CaptureResult>) + Send>;

pub(crate) enum Command {
    Open(BoolCallback),
    SetSurface(SurfaceTarget),
    SetFocus { x: f32, y: f32, reply: BoolCallback },
    SetZoom(f32),
    SetTilt(Rotation),
    SetDisplayRotation(Rotation),
    TakePicture(CaptureCallback),
    Switch(BoolCallback),
    Close,
    Flush(Sender<()>),
    Shutdown,
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Open(_) => "open",
            Command::SetSurface(_) => "set_surface",
            Command::SetFocus { .. } => "set_focus",
            Command::SetZoom(_) => "set_zoom",
            Command::SetTilt(_) => "set_tilt",
            Command::SetDisplayRotation(_) => "set_display_rotation",
            Command::TakePicture(_) => "take_picture",
            Command::Switch(_) => "switch_camera",
            Command::Close => "close",
            Command::Flush(_) => "flush",
            Command::Shutdown => "shutdown",
        }
    }
}
