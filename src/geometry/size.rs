//! Optimal preview and picture size selection.

use super::Resolution;
use crate::hardware::{CameraParameters, FocusMode, PictureFormat};

/// Picks the supported size that best fits `target`.
///
/// Sizes are grouped by exact aspect ratio. The group whose ratio is
/// closest to the target wins (first group on ties). Within the group,
/// the size with the smallest `|dw| + |dh|` whose height is at least the
/// target height is chosen; if none is tall enough the height floor is
/// dropped.
///
/// `target` must be in the sensor frame. Returns `None` for an empty
/// target or an empty size list.
pub fn select_optimal_size(target: Resolution, sizes: &[Resolution]) -> Option<Resolution> {
    if target.is_empty() {
        return None;
    }

    let mut groups: Vec<Vec<Resolution>> = Vec::new();
    for size in sizes.iter().filter(|s| !s.is_empty()) {
        match groups.iter_mut().find(|g| g[0].same_ratio(size)) {
            Some(group) => group.push(*size),
            None => groups.push(vec![*size]),
        }
    }

    let target_ratio = target.aspect_ratio();
    let mut best_group: Option<&Vec<Resolution>> = None;
    let mut best_diff = f64::MAX;
    for group in &groups {
        let diff = (group[0].aspect_ratio() - target_ratio).abs();
        if diff < best_diff {
            best_group = Some(group);
            best_diff = diff;
        }
    }
    let group = best_group?;

    let distance = |s: &Resolution| {
        (s.width as i64 - target.width as i64).abs() + (s.height as i64 - target.height as i64).abs()
    };

    closest(group.iter().filter(|s| s.height >= target.height), distance)
        .or_else(|| closest(group.iter(), distance))
}

/// First element with the strictly smallest distance.
fn closest<'a>(
    sizes: impl Iterator<Item = &'a Resolution>,
    distance: impl Fn(&Resolution) -> i64,
) -> Option<Resolution> {
    let mut best: Option<(Resolution, i64)> = None;
    for size in sizes {
        let d = distance(size);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((*size, d));
        }
    }
    best.map(|(size, _)| size)
}

/// Writes preview and picture sizes plus best-effort focus/encoding
/// settings into `params`.
///
/// Continuous-picture focus and JPEG encoding are only selected when the
/// hardware lists them; their absence is not an error.
pub fn negotiate_parameters(target: Resolution, params: &mut CameraParameters, jpeg_quality: u8) {
    if target.is_empty() {
        return;
    }

    if let Some(size) = select_optimal_size(target, &params.supported_preview_sizes) {
        params.preview_size = Some(size);
    }
    if let Some(size) = select_optimal_size(target, &params.supported_picture_sizes) {
        params.picture_size = Some(size);
    }

    if params.supports_focus_mode(FocusMode::ContinuousPicture) {
        params.focus_mode = Some(FocusMode::ContinuousPicture);
    }

    if params.supported_picture_formats.contains(&PictureFormat::Jpeg) {
        params.picture_format = Some(PictureFormat::Jpeg);
        params.jpeg_quality = Some(jpeg_quality);
    }

    tracing::debug!(
        target = %target,
        preview = ?params.preview_size,
        picture = ?params.picture_size,
        focus_mode = ?params.focus_mode,
        "Negotiated camera parameters"
    );
}
