// src/main.rs - Cement Measure Entry Point

use std::io::{IsTerminal, Read};
use std::process;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use cement_measure::{
    backend::{
        self, run_live_loop, types::format_points, Annotator, ExitReason, FrameSource,
        LineDetector, LiveOptions, MeasurementStore, StillImageSource,
    },
    cli::{Args, Command, ConfigArgs, LiveArgs, MeasureArgs, ShellArgs},
    config::{ConfigSource, MeasureConfig},
    error::{ErrorReporter, MeasureError, MeasureResult, ResultExt},
    frontend::{MeasureApp, Shell},
    init_logging, BUILD_INFO,
};

/// Exit code when detection finds no line in `measure --detect`
const EXIT_NO_LINE: i32 = 2;

/// Main entry point for Cement Measure
#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = init_logging(args.effective_log_level(), args.log_file.as_deref()) {
        eprintln!("❌ Failed to setup logging: {}", e);
        process::exit(1);
    }

    if matches!(args.command, Command::Shell(_)) {
        print_startup_banner();
    }
    debug!("🔧 {}", BUILD_INFO.formatted());

    // Validate arguments
    if let Err(e) = args.validate() {
        let e = MeasureError::validation(e);
        error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("   {}", e.suggested_action());
        process::exit(1);
    }

    if args.verbose {
        args.print_summary();
    }

    // Structured report only when logging to a file
    let reporter = ErrorReporter::new(args.log_file.is_some());
    let code = match run_application(args) {
        Ok(code) => code,
        Err(e) => {
            reporter.report(&e);
            eprintln!("❌ {}", e.user_message());
            eprintln!("   {}", e.suggested_action());
            1
        }
    };

    process::exit(code);
}

/// Print startup banner
fn print_startup_banner() {
    println!();
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║                                                           ║");
    println!("║     📏 Cement Measure - pixel distance measurement        ║");
    println!("║                                                           ║");
    println!("║     Version {:<10} type 'help' for controls            ║", BUILD_INFO.version);
    println!("║                                                           ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
}

/// Load settings and apply command line overrides
fn load_config(args: &Args) -> MeasureResult<MeasureConfig> {
    let (mut config, source) = MeasureConfig::load(args.config.as_deref())?;
    match &source {
        ConfigSource::Explicit(path) | ConfigSource::UserDefault(path) => {
            info!("⚙️ Using configuration {}", path.display())
        }
        ConfigSource::BuiltIn => debug!("⚙️ Using built-in configuration"),
    }
    if let Some(dir) = args.output_dir() {
        config.store.output_dir = dir.clone();
    }
    Ok(config)
}

/// Dispatch the subcommand and return the process exit code
fn run_application(args: Args) -> MeasureResult<i32> {
    match &args.command {
        Command::Config(c) => run_config(&args, c),
        Command::Measure(m) => {
            let config = load_config(&args)?;
            tokio::task::block_in_place(|| run_measure(m, &config))
        }
        Command::Shell(s) => {
            let config = load_config(&args)?;
            tokio::task::block_in_place(|| run_shell(s, &config))
        }
        Command::Live(l) => {
            let config = load_config(&args)?;
            run_live(l, &config)
        }
    }
}

/// One-shot measurement
fn run_measure(args: &MeasureArgs, config: &MeasureConfig) -> MeasureResult<i32> {
    let mut app = MeasureApp::new(config);
    app.load_path(&args.image)
        .with_context_lazy(|| format!("loading {}", args.image.display()))?;

    if args.detect {
        match app.detect()? {
            Some(segment) => println!("Detected line: {} -> {}", segment.start, segment.end),
            None => {
                eprintln!("⚠️ No line detected - select points manually");
                return Ok(EXIT_NO_LINE);
            }
        }
    } else {
        for point in &args.points {
            app.click(*point)?;
        }
    }

    let measurement = app.calculate()?;
    println!("Points: {}", format_points(&measurement.points()));
    println!("Distance: {}", measurement.label());

    if args.save {
        let saved = app.save()?;
        println!("Saved {}", saved.text_path.display());
        println!("Saved {}", saved.image_path.display());
        if let Some(json) = saved.json_path {
            println!("Saved {}", json.display());
        }
    }

    Ok(0)
}

/// Interactive shell over stdin/stdout
fn run_shell(args: &ShellArgs, config: &MeasureConfig) -> MeasureResult<i32> {
    let mut app = MeasureApp::new(config);
    if let Some(ref image) = args.image {
        let frame = app
            .load_path(image)
            .with_context_lazy(|| format!("loading {}", image.display()))?;
        println!("Loaded {} image from {}", frame.resolution_string(), image.display());
    }

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let summary = Shell::new(&mut app, stdin.lock(), std::io::stdout().lock())
        .with_prompt(interactive)
        .run(&CancellationToken::new())?;

    Ok(if summary.errors > 0 && !interactive { 1 } else { 0 })
}

/// Live capture loop with Ctrl+C / Enter cancellation
fn run_live(args: &LiveArgs, config: &MeasureConfig) -> MeasureResult<i32> {
    let source: Box<dyn FrameSource> = if args.frames.is_empty() {
        backend::open_camera(args.camera.unwrap_or(config.camera_index))?
    } else {
        Box::new(StillImageSource::new(args.frames.clone())?.looping(args.loop_frames))
    };

    let mut options = LiveOptions::from_settings(&config.live);
    options.max_frames = args.max_frames;
    options.preview_path = args.preview.clone();
    if let Some(ms) = args.interval_ms {
        options.frame_interval = std::time::Duration::from_millis(ms);
    }

    let cancel = CancellationToken::new();
    spawn_stop_watchers(&cancel);

    let detector = LineDetector::new(config.detection.clone());
    let annotator = Annotator::new(config.annotation.clone());
    let outcome =
        tokio::task::block_in_place(|| run_live_loop(source, &detector, &annotator, &options, &cancel));
    cancel.cancel();

    println!(
        "Frames: {}  Detections: {}  Average FPS: {:.1}  Processing: {:.1} ms  Detection: {:.1} ms",
        outcome.frames,
        outcome.detections,
        outcome.average_fps,
        outcome.average_processing.as_secs_f64() * 1000.0,
        detector.stats().average_duration().as_secs_f64() * 1000.0
    );

    let last = outcome.last_measurement();
    match &last {
        Some(m) => {
            println!("Points: {}", format_points(&m.points()));
            println!("Distance: {}", m.label());
        }
        None => println!("No line detected"),
    }

    if args.save {
        match (last, &outcome.detected_frame) {
            (Some(measurement), Some(frame)) => {
                let annotated = annotator.annotate(frame, &measurement);
                let saved = MeasurementStore::new(&config.store)
                    .save(&measurement, &annotated, Some(&frame.origin))
                    .with_context("saving live measurement")?;
                println!("Saved {}", saved.text_path.display());
                println!("Saved {}", saved.image_path.display());
            }
            _ => warn!("⚠️ Nothing to save: no line was detected during the live session"),
        }
    }

    match outcome.exit {
        ExitReason::ReadFailed(reason) => {
            eprintln!("❌ Live capture stopped: {}", reason);
            Ok(1)
        }
        _ => Ok(0),
    }
}

/// Cancel on Ctrl+C, and on Enter when attached to a terminal
fn spawn_stop_watchers(cancel: &CancellationToken) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("📡 Received Ctrl+C, stopping");
                    token.cancel();
                }
            }
            _ = token.cancelled() => {}
        }
    });

    if std::io::stdin().is_terminal() {
        println!("Press Enter or Ctrl+C to stop");
        let token = cancel.clone();
        std::thread::spawn(move || {
            let mut byte = [0u8; 1];
            if std::io::stdin().read(&mut byte).is_ok() {
                token.cancel();
            }
        });
    }
}

/// Show the effective configuration or write the defaults
fn run_config(args: &Args, config_args: &ConfigArgs) -> MeasureResult<i32> {
    if config_args.write_default {
        let path = args
            .config
            .clone()
            .or_else(MeasureConfig::default_path)
            .ok_or_else(|| MeasureError::config("No config directory available; pass --config PATH"))?;
        MeasureConfig::default().save(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(0);
    }

    let (config, source) = MeasureConfig::load(args.config.as_deref())?;
    match source {
        ConfigSource::Explicit(path) | ConfigSource::UserDefault(path) => {
            println!("# {}", path.display())
        }
        ConfigSource::BuiltIn => println!("# built-in defaults"),
    }
    println!("{}", config.to_json()?);
    Ok(0)
}
