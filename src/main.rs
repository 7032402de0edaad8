//! Camera Session CLI
//!
//! Command-line demo that drives a camera session against the mock
//! driver: open, tap-to-focus, pinch-zoom and capture, repeated.

use camera_session::{
    CallerContext, CameraSession, CaptureResult, Facing, FileConfig, MockDriver, SessionError,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing::{info, warn};

/// How long to wait for the worker to post a result.
const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pinch span applied before each capture, in pixels.
const DEMO_ZOOM_SPAN: f32 = 150.0;

#[derive(Debug, Parser)]
#[command(name = "camera-session", version, about = "Camera session demo on a mock device")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preview surface width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Preview surface height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Number of stills to capture.
    #[arg(short = 'n', long)]
    captures: Option<u32>,

    /// Start on the front camera.
    #[arg(long)]
    front: bool,

    /// Switch cameras before the first capture.
    #[arg(long)]
    switch: bool,

    /// Keep capturing until interrupted with Ctrl-C.
    #[arg(long)]
    continuous: bool,

    /// Serve Prometheus metrics on this port.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Camera Session v{}", camera_session::VERSION);
    info!("This is a demonstration using a mock camera driver");

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if args.front {
        config.session.preferred_facing = Facing::Front;
    }
    let width = args.width.unwrap_or(config.demo.surface_width);
    let height = args.height.unwrap_or(config.demo.surface_height);
    let captures = args.captures.unwrap_or(config.demo.captures);

    let context = CallerContext::new();
    let session = match CameraSession::new(MockDriver::new(), config.session, context.handle()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to start camera session: {}", e);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "metrics")]
    {
        let port = args.metrics_port.unwrap_or(config.demo.metrics_port);
        if port > 0 {
            spawn_metrics_server(port, Arc::clone(session.metrics()));
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    if args.continuous {
        let flag = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    if let Err(e) = run(&session, &context, &args, width, height, captures, &running) {
        eprintln!("Camera session error: {}", e);
        std::process::exit(1);
    }

    let snapshot = session.metrics().snapshot();
    info!(
        "Done. opens={} captures={} failed_captures={} faults={}",
        snapshot.opens_succeeded,
        snapshot.captures_succeeded,
        snapshot.captures_failed,
        snapshot.hardware_faults
    );
}

fn run(
    session: &CameraSession,
    context: &CallerContext,
    args: &Args,
    width: u32,
    height: u32,
    captures: u32,
    running: &AtomicBool,
) -> Result<(), SessionError> {
    session.set_surface_target(width, height)?;
    // Device held upright.
    session.feed_accelerometer(0.3, 9.7)?;

    info!(
        cameras = session.devices().len(),
        multiple = session.has_multiple_devices(),
        "Surface {}x{}",
        width,
        height
    );

    if args.switch && session.has_multiple_devices() {
        let switched = await_result::<bool>(context, |reply| session.switch_camera(reply))?;
        info!("Switch camera: {:?}", switched);
    }

    let mut taken = 0;
    while running.load(Ordering::SeqCst) && (args.continuous || taken < captures) {
        let opened = await_result::<bool>(context, |reply| session.open(reply))?;
        if opened != Some(true) {
            warn!("Camera failed to open");
            break;
        }

        let focused = await_result::<bool>(context, |reply| {
            session.set_focus(width as f32 / 2.0, height as f32 / 2.0, reply)
        })?;
        info!("Focus: {:?}", focused);
        session.set_zoom(DEMO_ZOOM_SPAN)?;

        let picture =
            await_result::<Option<CaptureResult>>(context, |reply| session.take_picture(reply))?;
        match picture.flatten() {
            Some(picture) => info!(
                "Captured {}x{} from {} ({} {}) at {}",
                picture.image().width(),
                picture.image().height(),
                picture.device(),
                picture.transform().rotation,
                if picture.transform().mirrored {
                    "mirrored"
                } else {
                    "unmirrored"
                },
                picture.captured_at().to_rfc3339()
            ),
            None => warn!("Capture produced no image"),
        }
        taken += 1;
    }

    session.close()?;
    Ok(())
}

/// Submits a command and dispatches results until its callback fires.
fn await_result<T: Send + 'static>(
    context: &CallerContext,
    submit: impl FnOnce(Box<dyn FnOnce(T) + Send>) -> Result<(), SessionError>,
) -> Result<Option<T>, SessionError> {
    let (tx, rx) = mpsc::channel();
    submit(Box::new(move |value| {
        let _ = tx.send(value);
    }))?;

    while context.dispatch_timeout(RESULT_TIMEOUT) {
        if let Ok(value) = rx.try_recv() {
            return Ok(Some(value));
        }
    }
    Ok(rx.try_recv().ok())
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, registry: Arc<camera_session::metrics::MetricsRegistry>) {
    use camera_session::metrics::{MetricsServer, MetricsServerConfig};

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}
