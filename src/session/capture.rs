//! Captured still with the transform applied to it.

use crate::geometry::{CaptureTransform, Facing, Rotation};
use crate::hardware::DeviceId;
use chrono::{DateTime, Utc};
use image::DynamicImage;

/// A decoded still, oriented for display.
///
/// Produced once per successful capture; ownership passes to the caller,
/// which is responsible for encoding or storing it.
#[derive(Clone)]
pub struct CaptureResult {
    image: DynamicImage,
    transform: CaptureTransform,
    device: DeviceId,
    facing: Facing,
    captured_at: DateTime<Utc>,
}

impl CaptureResult {
    pub(crate) fn new(
        image: DynamicImage,
        transform: CaptureTransform,
        device: DeviceId,
        facing: Facing,
    ) -> Self {
        Self {
            image,
            transform,
            device,
            facing,
            captured_at: Utc::now(),
        }
    }

    /// The oriented image.
    #[inline]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Takes ownership of the oriented image.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Rotation and mirroring that were applied after decoding.
    #[inline]
    pub fn transform(&self) -> CaptureTransform {
        self.transform
    }

    /// Camera the still came from.
    #[inline]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Facing of the camera the still came from.
    #[inline]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Wall-clock time the still was decoded.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResult")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("transform", &self.transform)
            .field("device", &self.device)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Decodes encoded still bytes and applies `transform`.
///
/// Rotation is clockwise and happens before the horizontal flip.
pub(crate) fn decode_capture(
    bytes: &[u8],
    transform: CaptureTransform,
) -> Result<DynamicImage, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rotated = match transform.rotation {
        Rotation::Deg0 => decoded,
        Rotation::Deg90 => decoded.rotate90(),
        Rotation::Deg180 => decoded.rotate180(),
        Rotation::Deg270 => decoded.rotate270(),
    };
    Ok(if transform.mirrored {
        rotated.fliph()
    } else {
        rotated
    })
}
