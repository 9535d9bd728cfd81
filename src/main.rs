//! camera-pilot - game camera operator
//!
//! Entry point for the dry-run binary. Runs the full pipeline against the
//! in-memory simulation backend.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use camera_pilot::capture::ScreenCapture;
use camera_pilot::config::Config;
use camera_pilot::controller::CameraController;
use camera_pilot::cursor::{CursorIo, PointerDriver};
use camera_pilot::geometry::Point;
use camera_pilot::macro_state::MacroStateSource;
use camera_pilot::sim::{SimScene, VirtualCursor};
use camera_pilot::state::SharedFrameState;
use camera_pilot::supervisor::Supervisor;
use camera_pilot::vision::VisionMatcher;

/// Command-line arguments for camera-pilot
#[derive(Parser, Debug)]
#[command(name = "camera-pilot")]
#[command(version, about = "Game camera operator", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CAMERA_PILOT_CONFIG", default_value = "camera-pilot.toml")]
    pub config: PathBuf,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Stop after this many producer cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Screen width override
    #[arg(long)]
    pub screen_width: Option<u32>,

    /// Screen height override
    #[arg(long)]
    pub screen_height: Option<u32>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logging settings live in the config, so load it first and report
    // problems once logging is up
    let loaded = Config::load(&args.config);
    let (config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default_config(), Some(e)),
    };

    // Override config with CLI args
    let config = config.with_overrides(args.screen_width, args.screen_height);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let _log_guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  camera-pilot v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    match load_error {
        None => info!("Configuration loaded from {}", args.config.display()),
        Some(e) => warn!("Failed to load config: {:#}, using defaults", e),
    }
    debug!("Config: {:?}", config);

    if let Err(e) = run(&config, args.cycles) {
        eprintln!("camera-pilot stopped: {:#}", e);
        return Err(e);
    }

    info!("camera-pilot shut down");
    Ok(())
}

fn run(config: &Config, cycles: Option<u64>) -> Result<()> {
    let screen = config.screen.geometry();
    let cursor = Arc::new(VirtualCursor::new(Point::new(
        screen.width as i32 / 2,
        screen.height as i32 / 2,
    )));
    let scene = Arc::new(
        SimScene::demo(screen, Arc::clone(&cursor)).with_label(config.producer.target_label.clone()),
    );
    info!("Using simulated capture, vision, and cursor ({}x{})", screen.width, screen.height);

    let state = Arc::new(SharedFrameState::new());

    let driver = PointerDriver::new(
        Arc::clone(&cursor) as Arc<dyn CursorIo>,
        screen,
        config.trajectory.clone(),
    )
    .with_vertical_clamp(config.screen.clamp_vertical);

    let controller = CameraController::new(
        config.controller.clone(),
        Arc::clone(&state),
        Arc::clone(&scene) as Arc<dyn VisionMatcher>,
        driver,
    )
    .with_idle_policy(config.idle.build()?);

    let handle = controller.spawn().context("Failed to start camera controller")?;

    let mut supervisor = Supervisor::new(
        config.producer.clone(),
        state,
        Arc::clone(&scene) as Arc<dyn ScreenCapture>,
        Arc::clone(&scene) as Arc<dyn VisionMatcher>,
        scene as Arc<dyn MacroStateSource>,
    );
    supervisor.add_worker(Box::new(handle));

    let summary = supervisor.run(cycles).inspect_err(|e| {
        if e.is_resource_unavailable() {
            error!("Game window or input device went away: {}", e);
        } else {
            error!("Pipeline failed: {}", e);
        }
    })?;
    info!(
        "Run complete: {} producer cycles, {} pointer events, cursor at {:?}",
        summary.cycles,
        cursor.event_count(),
        cursor.current()
    );
    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// One fmt layer in the requested format. Files get the single-line full
/// format instead of pretty.
fn fmt_layer<W>(format: &str, writer: W, to_file: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(!to_file);
    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ if to_file => layer.boxed(),
        _ => layer.pretty().boxed(),
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("camera_pilot={},warn", log_level))
    });

    let log_format = args
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    let log_file = args.log_file.clone().or_else(|| config.logging.file.clone());

    let mut layers = vec![fmt_layer(&log_format, std::io::stdout, false)];
    let mut guard = None;

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &log_file {
        let file = std::fs::File::create(log_file_path)
            .with_context(|| format!("Failed to create log file: {}", log_file_path.display()))?;
        let (writer, file_guard) = tracing_appender::non_blocking(file);
        layers.push(fmt_layer(&log_format, writer, true));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(log_file_path) = &log_file {
        info!("Logging to file: {}", log_file_path.display());
    }
    Ok(guard)
}
