//! Property tests for the pure geometry helpers.

use camera_session::geometry::{
    capture_transform, display_orientation, map_touch, select_optimal_size, zoom_step,
    FOCUS_COEFFICIENT, METERING_COEFFICIENT,
};
use camera_session::{Facing, Resolution, Rotation, SurfaceTarget};
use proptest::prelude::*;

fn rotation() -> impl Strategy<Value = Rotation> {
    prop_oneof![
        Just(Rotation::Deg0),
        Just(Rotation::Deg90),
        Just(Rotation::Deg180),
        Just(Rotation::Deg270),
    ]
}

fn facing() -> impl Strategy<Value = Facing> {
    prop_oneof![Just(Facing::Back), Just(Facing::Front)]
}

fn resolution() -> impl Strategy<Value = Resolution> {
    (1u32..4000, 1u32..4000).prop_map(|(w, h)| Resolution::new(w, h))
}

proptest! {
    #[test]
    fn touch_regions_stay_in_bounds(
        width in 1u32..4000,
        height in 1u32..4000,
        x in -500.0f32..5000.0,
        y in -500.0f32..5000.0,
        metering in any::<bool>(),
    ) {
        let coefficient = if metering { METERING_COEFFICIENT } else { FOCUS_COEFFICIENT };
        let rect = map_touch(SurfaceTarget::new(width, height), x, y, coefficient);
        prop_assert!(rect.is_within_bounds(), "{:?}", rect);
        prop_assert!(rect.left <= rect.right);
        prop_assert!(rect.top <= rect.bottom);
    }

    #[test]
    fn zoom_stays_in_range(
        height in 1u32..4000,
        max in 1u32..100,
        current in 0u32..100,
        span in -10_000.0f32..10_000.0,
    ) {
        let state = camera_session::geometry::ZoomState::new(current, max);
        if let Some(next) = zoom_step(height, state, span) {
            prop_assert!(next <= max);
        }
    }

    #[test]
    fn zero_span_never_zooms(height in 1u32..4000, max in 1u32..100, current in 0u32..100) {
        let state = camera_session::geometry::ZoomState::new(current, max);
        prop_assert_eq!(zoom_step(height, state, 0.0), Some(state.current));
    }

    #[test]
    fn selected_size_comes_from_candidates(
        target in resolution(),
        sizes in prop::collection::vec(resolution(), 0..12),
    ) {
        match select_optimal_size(target, &sizes) {
            Some(size) => prop_assert!(sizes.contains(&size)),
            None => prop_assert!(sizes.is_empty()),
        }
    }

    #[test]
    fn exact_match_is_always_selected(
        target in resolution(),
        sizes in prop::collection::vec(resolution(), 0..12),
    ) {
        let mut sizes = sizes;
        sizes.push(target);
        let selected = select_optimal_size(target, &sizes).unwrap();
        prop_assert!(selected.same_ratio(&target));
    }

    #[test]
    fn front_and_back_orientations_are_mirror_images(sensor in rotation(), display in rotation()) {
        let back = display_orientation(sensor, display, Facing::Back);
        let front = display_orientation(sensor, display, Facing::Front);
        // Back subtracts the display rotation; front adds it and mirrors.
        let expected_back = (sensor.degrees() + 360 - display.degrees()) % 360;
        let expected_front = (360 - (sensor.degrees() + display.degrees()) % 360) % 360;
        prop_assert_eq!(back.degrees(), expected_back);
        prop_assert_eq!(front.degrees(), expected_front);
    }

    #[test]
    fn capture_transform_mirrors_front_only(
        orientation in rotation(),
        tilt in rotation(),
        facing in facing(),
    ) {
        let transform = capture_transform(orientation, tilt, facing);
        prop_assert_eq!(transform.mirrored, facing == Facing::Front);

        let combined = (orientation.degrees() + tilt.degrees()) % 360;
        let expected = match facing {
            Facing::Back => combined,
            Facing::Front => (360 - combined) % 360,
        };
        prop_assert_eq!(transform.rotation.degrees(), expected);
    }
}
