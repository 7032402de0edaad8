//! Integration tests for the camera session state machine and worker.

use camera_session::geometry::{FocusRect, Rotation};
use camera_session::hardware::{CallLog, DriverCall, FocusMode};
use camera_session::{
    CallerContext, CameraSession, CameraState, CaptureResult, DeviceId, DeviceInfo, Facing,
    MockDriver, SessionConfig, SessionError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn start(driver: MockDriver, config: SessionConfig) -> (CallerContext, CameraSession, CallLog) {
    let log = driver.log();
    let context = CallerContext::new();
    let session = CameraSession::new(driver, config, context.handle()).unwrap();
    session.set_surface_target(1080, 1920).unwrap();
    (context, session, log)
}

fn start_default() -> (CallerContext, CameraSession, CallLog) {
    start(MockDriver::new(), SessionConfig::default())
}

/// Submits a command and dispatches until its callback has run.
fn wait<T: Send + 'static>(
    context: &CallerContext,
    submit: impl FnOnce(Box<dyn FnOnce(T) + Send>) -> Result<(), SessionError>,
) -> Option<T> {
    let (tx, rx) = mpsc::channel();
    submit(Box::new(move |value| {
        let _ = tx.send(value);
    }))
    .unwrap();
    while context.dispatch_timeout(TIMEOUT) {
        if let Ok(value) = rx.try_recv() {
            return Some(value);
        }
    }
    rx.try_recv().ok()
}

fn open(context: &CallerContext, session: &CameraSession) -> bool {
    wait::<bool>(context, |reply| session.open(reply)).unwrap()
}

fn take_picture(context: &CallerContext, session: &CameraSession) -> Option<CaptureResult> {
    wait::<Option<CaptureResult>>(context, |reply| session.take_picture(reply)).unwrap()
}

fn kind(call: &DriverCall) -> &'static str {
    match call {
        DriverCall::Devices => "devices",
        DriverCall::Open(_) => "open",
        DriverCall::Parameters => "parameters",
        DriverCall::SetParameters(_) => "set_parameters",
        DriverCall::SetDisplayOrientation(_) => "set_display_orientation",
        DriverCall::StartPreview(_) => "start_preview",
        DriverCall::StopPreview => "stop_preview",
        DriverCall::CancelAutoFocus => "cancel_auto_focus",
        DriverCall::AutoFocus => "auto_focus",
        DriverCall::TakePicture => "take_picture",
        DriverCall::Release => "release",
    }
}

fn kinds(log: &CallLog) -> Vec<&'static str> {
    log.calls().iter().map(kind).collect()
}

fn last_parameters(log: &CallLog) -> camera_session::hardware::CameraParameters {
    log.calls()
        .into_iter()
        .rev()
        .find_map(|call| match call {
            DriverCall::SetParameters(params) => Some(*params),
            _ => None,
        })
        .expect("no parameters were written")
}

#[test]
fn test_commands_reach_hardware_in_submission_order() {
    let (context, session, log) = start_default();

    session.open(|_| {}).unwrap();
    session.set_focus(540.0, 960.0, |_| {}).unwrap();
    session.set_zoom(200.0).unwrap();
    session.take_picture(|_| {}).unwrap();
    session.open(|_| {}).unwrap();
    session.close().unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    context.dispatch_pending();

    assert_eq!(
        kinds(&log),
        vec![
            "devices",
            // open
            "open",
            "parameters",
            "set_parameters",
            "set_display_orientation",
            "start_preview",
            // set_focus
            "cancel_auto_focus",
            "parameters",
            "set_parameters",
            "auto_focus",
            // set_zoom
            "parameters",
            "set_parameters",
            // take_picture
            "take_picture",
            "stop_preview",
            "release",
            // open
            "open",
            "parameters",
            "set_parameters",
            "set_display_orientation",
            "start_preview",
            // close
            "stop_preview",
            "release",
        ]
    );
}

#[test]
fn test_open_close_reopen() {
    let (context, session, _log) = start_default();
    assert!(!session.is_opened());

    assert!(open(&context, &session));
    assert!(session.is_opened());
    assert_eq!(session.state(), CameraState::Opened);

    session.close().unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    assert!(!session.is_opened());

    assert!(open(&context, &session));
    assert!(session.is_opened());
}

#[test]
fn test_close_is_idempotent() {
    let (_context, session, log) = start_default();
    session.close().unwrap();
    session.close().unwrap();
    assert!(session.flush(TIMEOUT).unwrap());

    assert!(!session.is_opened());
    assert_eq!(log.count(|c| matches!(c, DriverCall::Release)), 0);
}

#[test]
fn test_open_releases_previous_handle() {
    let (context, session, log) = start_default();
    assert!(open(&context, &session));
    assert!(open(&context, &session));

    assert_eq!(log.count(|c| matches!(c, DriverCall::Open(_))), 2);
    assert_eq!(log.count(|c| matches!(c, DriverCall::Release)), 1);
}

#[test]
fn test_capture_releases_device_and_rotates_back_camera() {
    let (context, session, log) = start_default();
    assert!(open(&context, &session));

    let picture = take_picture(&context, &session).expect("capture failed");
    assert!(!session.is_opened());
    assert_eq!(session.state(), CameraState::Idle);
    assert_eq!(log.calls().last(), Some(&DriverCall::Release));

    // Back camera mounted at 90°, display at 0°, device upright.
    assert_eq!(picture.transform().rotation, Rotation::Deg90);
    assert!(!picture.transform().mirrored);
    assert_eq!(picture.facing(), Facing::Back);
    // 640x360 negotiated for a 1920x1080 sensor-frame surface, then rotated.
    assert_eq!(
        (picture.image().width(), picture.image().height()),
        (360, 640)
    );
}

#[test]
fn test_front_camera_capture_is_mirrored() {
    let (context, session, _log) = start(
        MockDriver::new(),
        SessionConfig::with_facing(Facing::Front),
    );
    assert_eq!(
        session.feed_accelerometer(7.0, 1.0).unwrap(),
        Some(Rotation::Deg270)
    );
    assert!(open(&context, &session));

    let picture = take_picture(&context, &session).expect("capture failed");
    // Preview orientation 90°, tilt 270°: a full turn, mirrored.
    assert_eq!(picture.transform().rotation, Rotation::Deg0);
    assert!(picture.transform().mirrored);
    assert_eq!(picture.device(), DeviceId(1));
    assert_eq!(
        (picture.image().width(), picture.image().height()),
        (640, 360)
    );
}

#[test]
fn test_unchanged_tilt_is_not_requeued() {
    let (_context, session, _log) = start_default();

    // Upright matches the initial tilt.
    assert_eq!(
        session.feed_accelerometer(0.3, 9.7).unwrap(),
        Some(Rotation::Deg0)
    );
    for _ in 0..3 {
        assert_eq!(
            session.feed_accelerometer(7.0, 1.0).unwrap(),
            Some(Rotation::Deg270)
        );
    }
    assert!(session.flush(TIMEOUT).unwrap());

    // Surface target, one tilt change and the flush itself.
    assert_eq!(session.metrics().snapshot().commands, 3);
}

#[test]
fn test_diagonal_tilt_is_ignored() {
    let (_context, session, _log) = start_default();
    assert_eq!(session.feed_accelerometer(1.0, 1.0).unwrap(), None);
}

#[test]
fn test_close_after_capture_runs_after_it() {
    let (context, session, log) = start_default();
    assert!(open(&context, &session));

    let captured = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&captured);
    session
        .take_picture(move |picture| flag.store(picture.is_some(), Ordering::SeqCst))
        .unwrap();
    session.close().unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    context.dispatch_pending();

    assert!(captured.load(Ordering::SeqCst));
    assert_eq!(log.count(|c| matches!(c, DriverCall::Release)), 1);
}

#[test]
fn test_commands_outside_opened_are_dropped() {
    let (context, session, log) = start_default();

    let called = Arc::new(AtomicBool::new(false));
    let focus_flag = Arc::clone(&called);
    session
        .set_focus(10.0, 10.0, move |_| focus_flag.store(true, Ordering::SeqCst))
        .unwrap();
    session.set_zoom(500.0).unwrap();
    let picture_flag = Arc::clone(&called);
    session
        .take_picture(move |_| picture_flag.store(true, Ordering::SeqCst))
        .unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    context.dispatch_pending();

    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(kinds(&log), vec!["devices"]);
}

#[test]
fn test_focus_writes_regions_and_autofocuses() {
    let (context, session, log) = start(
        MockDriver::new().auto_focus_result(false),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));

    let focused = wait::<bool>(&context, |reply| session.set_focus(540.0, 960.0, reply));
    assert_eq!(focused, Some(false));

    let params = last_parameters(&log);
    assert_eq!(params.focus_mode, Some(FocusMode::Auto));
    assert_eq!(
        params.focus_areas[0].rect,
        FocusRect {
            left: -100,
            top: -100,
            right: 100,
            bottom: 100
        }
    );
    assert_eq!(params.metering_areas[0].rect.right, 150);
}

#[test]
fn test_zoom_skips_redundant_writes() {
    let (context, session, log) = start_default();
    assert!(open(&context, &session));
    let writes = || log.count(|c| matches!(c, DriverCall::SetParameters(_)));
    let after_open = writes();

    // Sensor-frame height 1080, max zoom 10: 21.6 px per step.
    session.set_zoom(200.0).unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    assert_eq!(writes(), after_open + 1);
    assert_eq!(last_parameters(&log).zoom, 9);

    session.set_zoom(5.0).unwrap();
    session.set_zoom(100.0).unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    assert_eq!(writes(), after_open + 2);
    assert_eq!(last_parameters(&log).zoom, 10);
}

#[test]
fn test_zoom_unsupported_is_noop() {
    let params = camera_session::hardware::CameraParameters {
        zoom_supported: false,
        ..MockDriver::default_parameters()
    };
    let (context, session, log) = start(
        MockDriver::new().with_parameters(params),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));
    let before = log.calls().len();

    session.set_zoom(400.0).unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    assert_eq!(log.calls().len(), before);
}

#[test]
fn test_switch_camera_alternates_devices() {
    let (context, session, log) = start_default();
    assert!(session.has_multiple_devices());
    assert!(open(&context, &session));

    let switched = wait::<bool>(&context, |reply| session.switch_camera(reply));
    assert_eq!(switched, Some(true));
    assert!(session.is_opened());

    let switched = wait::<bool>(&context, |reply| session.switch_camera(reply));
    assert_eq!(switched, Some(true));

    let opens: Vec<DeviceId> = log
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DriverCall::Open(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(opens, vec![DeviceId(0), DeviceId(1), DeviceId(0)]);
}

#[test]
fn test_switch_with_single_camera_is_noop() {
    let driver = MockDriver::new().with_devices(vec![DeviceInfo {
        id: DeviceId(0),
        facing: Facing::Back,
        sensor_orientation: Rotation::Deg90,
    }]);
    let (context, session, log) = start(driver, SessionConfig::default());
    assert!(!session.has_multiple_devices());

    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    session
        .switch_camera(move |_| flag.store(true, Ordering::SeqCst))
        .unwrap();
    assert!(session.flush(TIMEOUT).unwrap());
    context.dispatch_pending();

    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(log.count(|c| matches!(c, DriverCall::Open(_))), 0);
}

#[test]
fn test_open_fails_without_surface() {
    let context = CallerContext::new();
    let session =
        CameraSession::new(MockDriver::new(), SessionConfig::default(), context.handle()).unwrap();

    assert!(!open(&context, &session));
    assert!(!session.is_opened());
}

#[test]
fn test_open_fails_without_cameras() {
    let (context, session, _log) = start(
        MockDriver::new().with_devices(Vec::new()),
        SessionConfig::default(),
    );
    assert!(!session.has_multiple_devices());
    assert!(session.devices().is_empty());
    assert!(!open(&context, &session));
}

#[test]
fn test_open_failure_returns_to_idle() {
    let (context, session, _log) = start(MockDriver::new().failing_open(), SessionConfig::default());
    assert!(!open(&context, &session));
    assert_eq!(session.state(), CameraState::Idle);
    assert_eq!(session.metrics().snapshot().opens_failed, 1);
}

#[test]
fn test_negotiation_failure_releases_handle() {
    let (context, session, log) = start(
        MockDriver::new().failing_configure(),
        SessionConfig::default(),
    );
    assert!(!open(&context, &session));
    assert!(!session.is_opened());
    assert_eq!(log.calls().last(), Some(&DriverCall::Release));
}

#[test]
fn test_empty_capture_reports_none_and_releases() {
    let (context, session, log) = start(MockDriver::new().empty_pictures(), SessionConfig::default());
    assert!(open(&context, &session));

    assert!(take_picture(&context, &session).is_none());
    assert!(!session.is_opened());
    assert_eq!(log.calls().last(), Some(&DriverCall::Release));
}

#[test]
fn test_worker_survives_hardware_errors() {
    let (context, session, _log) = start(
        MockDriver::new().failing_pictures(),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));
    assert!(take_picture(&context, &session).is_none());
    assert!(!session.is_opened());

    assert!(open(&context, &session));
    let snapshot = session.metrics().snapshot();
    assert_eq!(snapshot.captures_failed, 1);
    assert_eq!(snapshot.hardware_faults, 1);
    assert_eq!(snapshot.opens_succeeded, 2);
}

fn opens_and_releases(log: &CallLog) -> (usize, usize) {
    (
        log.count(|c| matches!(c, DriverCall::Open(_))),
        log.count(|c| matches!(c, DriverCall::Release)),
    )
}

#[test]
fn test_worker_survives_driver_panic() {
    let (context, session, log) = start(
        MockDriver::new().panicking_pictures(),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));
    assert!(take_picture(&context, &session).is_none());
    assert!(session.flush(TIMEOUT).unwrap());
    assert_eq!(session.state(), CameraState::Idle);

    // The panicking capture must not leak the device.
    let (opens, releases) = opens_and_releases(&log);
    assert_eq!(releases, opens);

    assert!(open(&context, &session));
    assert!(session.is_opened());
}

#[test]
fn test_focus_panic_releases_device() {
    let (context, session, log) = start(MockDriver::new().panicking_focus(), SessionConfig::default());
    assert!(open(&context, &session));

    let focused = wait::<bool>(&context, |reply| session.set_focus(540.0, 960.0, reply));
    assert_eq!(focused, Some(false));
    assert!(!session.is_opened());
    assert_eq!(opens_and_releases(&log), (1, 1));
    assert_eq!(session.metrics().snapshot().hardware_faults, 1);

    assert!(open(&context, &session));
}

#[test]
fn test_panic_during_release_is_contained() {
    let (context, session, log) = start(
        MockDriver::new().panicking_pictures().panicking_release(),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));
    assert!(take_picture(&context, &session).is_none());
    assert_eq!(session.state(), CameraState::Idle);
    // Release was attempted even though the driver panicked again.
    assert_eq!(opens_and_releases(&log), (1, 1));

    assert!(open(&context, &session));
    assert!(session.is_opened());
}

#[test]
fn test_disconnect_during_focus_keeps_device() {
    let (context, session, log) = start(
        MockDriver::new().disconnecting_focus(),
        SessionConfig::default(),
    );
    assert!(open(&context, &session));
    log.clear();

    let focused = wait::<bool>(&context, |reply| session.set_focus(10.0, 10.0, reply));
    assert_eq!(focused, Some(false));
    assert!(session.is_opened());
    assert_eq!(session.metrics().snapshot().hardware_faults, 1);
    assert_eq!(log.count(|c| matches!(c, DriverCall::Release)), 0);
}

#[test]
fn test_display_rotation_applies_on_next_open() {
    let (context, session, log) = start_default();
    session.set_display_rotation(Rotation::Deg90).unwrap();
    assert!(open(&context, &session));

    assert!(log
        .calls()
        .contains(&DriverCall::SetDisplayOrientation(Rotation::Deg0)));
}

#[test]
fn test_results_run_on_caller_thread() {
    let (context, session, _log) = start_default();
    let caller = std::thread::current().id();

    let ran_on = wait::<std::thread::ThreadId>(&context, |reply| {
        session.open(move |_| reply(std::thread::current().id()))
    });
    assert_eq!(ran_on, Some(caller));
}

#[test]
fn test_commands_rejected_after_context_dropped() {
    let context = CallerContext::new();
    let session =
        CameraSession::new(MockDriver::new(), SessionConfig::default(), context.handle()).unwrap();
    drop(context);

    assert!(matches!(
        session.open(|_| {}),
        Err(SessionError::ContextDropped)
    ));
    assert!(matches!(session.close(), Err(SessionError::ContextDropped)));
}

#[test]
fn test_session_requires_live_context() {
    let context = CallerContext::new();
    let handle = context.handle();
    drop(context);

    let result = CameraSession::new(MockDriver::new(), SessionConfig::default(), handle);
    assert!(matches!(result, Err(SessionError::ContextDropped)));
}

#[test]
fn test_drop_releases_open_device() {
    let (context, session, log) = start_default();
    assert!(open(&context, &session));

    drop(session);
    assert_eq!(log.calls().last(), Some(&DriverCall::Release));
}
