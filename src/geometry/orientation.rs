//! Preview orientation and capture rotation/mirror compensation.

use serde::{Deserialize, Serialize};

/// Tilt beyond this on one axis counts as a deliberate rotation.
const TILT_ENGAGE: f32 = 6.0;

/// The other axis must stay below this for the tilt to register.
const TILT_RELEASE: f32 = 4.0;

/// Which way a camera faces relative to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Facing away from the user.
    Back,
    /// Facing the user; preview is mirrored.
    Front,
}

impl Facing {
    /// The opposite facing.
    pub fn opposite(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
        }
    }
}

/// A rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// A quarter turn.
    Deg90,
    /// A half turn.
    Deg180,
    /// Three quarter turns.
    Deg270,
}

impl Rotation {
    /// Converts a multiple of 90 degrees; any other value is rejected.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Rotation in degrees, `0..360`.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    fn wrap(degrees: u32) -> Self {
        // Only sums and differences of quarter turns reach here.
        Self::from_degrees(degrees).unwrap_or_default()
    }
}

impl TryFrom<u32> for Rotation {
    type Error = String;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be a multiple of 90 degrees, got {degrees}"))
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> u32 {
        rotation.degrees()
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Rotation the preview must be displayed with.
///
/// Front cameras are mirrored, so their sensor angle is added and the
/// result reflected.
pub fn display_orientation(sensor: Rotation, display: Rotation, facing: Facing) -> Rotation {
    let s = sensor.degrees();
    let d = display.degrees();
    match facing {
        Facing::Back => Rotation::wrap((s + 360 - d) % 360),
        Facing::Front => Rotation::wrap((360 - (s + d) % 360) % 360),
    }
}

/// Transform applied to a captured still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTransform {
    /// Clockwise rotation applied to the decoded image.
    pub rotation: Rotation,
    /// Whether the image was flipped horizontally after rotating.
    pub mirrored: bool,
}

/// Rotation and mirroring for a still captured with the given preview
/// orientation and device tilt.
pub fn capture_transform(orientation: Rotation, tilt: Rotation, facing: Facing) -> CaptureTransform {
    let rotation = (orientation.degrees() + tilt.degrees()) % 360;
    match facing {
        Facing::Back => CaptureTransform {
            rotation: Rotation::wrap(rotation),
            mirrored: false,
        },
        Facing::Front => CaptureTransform {
            rotation: Rotation::wrap((360 - rotation) % 360),
            mirrored: true,
        },
    }
}

/// Device tilt derived from raw accelerometer x/y readings.
///
/// Returns `None` near diagonals, where neither axis clearly dominates,
/// so the previous tilt stays in effect.
pub fn tilt_rotation(x: f32, y: f32) -> Option<Rotation> {
    if x.abs() > TILT_ENGAGE && y.abs() < TILT_RELEASE {
        Some(if x > TILT_ENGAGE {
            Rotation::Deg270
        } else {
            Rotation::Deg90
        })
    } else if y.abs() > TILT_ENGAGE && x.abs() < TILT_RELEASE {
        Some(if y > TILT_ENGAGE {
            Rotation::Deg0
        } else {
            Rotation::Deg180
        })
    } else {
        None
    }
}
