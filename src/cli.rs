// src/cli.rs - Command Line Interface for Cement Measure

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::backend::types::Point;

/// Cement Measure - pixel distance measurement on images and camera frames
#[derive(Parser, Debug, Clone)]
#[command(name = "cement-measure")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Measure pixel distances between two points on an image")]
#[command(long_about = r#"
Cement Measure

Loads a JPEG/PNG image or grabs a camera frame, takes two points (typed in,
or found by line detection), reports the Euclidean distance in pixels and
saves an annotated copy next to a text record.

EXAMPLES:
  # Distance between two known points
  cement-measure measure --image sample.jpg --point 120,40 --point 480,40

  # Let line detection pick the points and save the result
  cement-measure measure --image sample.jpg --detect --save --output-dir results

  # Interactive session
  cement-measure shell --image sample.jpg

  # Live detection on camera 0, preview written every few frames
  cement-measure live --camera 0 --preview preview.png
"#)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(long, global = true)]
    #[arg(help = "Load configuration from file (default: user config dir)")]
    pub config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    #[arg(value_enum)]
    #[arg(help = "Logging level (error, warn, info, debug, trace)")]
    pub log_level: LogLevel,

    /// Log file path
    #[arg(long, global = true)]
    #[arg(help = "Write logs to file instead of the terminal")]
    pub log_file: Option<PathBuf>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Measure once and exit
    Measure(MeasureArgs),
    /// Interactive measurement shell
    Shell(ShellArgs),
    /// Continuous capture with line detection
    Live(LiveArgs),
    /// Show or write the configuration
    Config(ConfigArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MeasureArgs {
    /// Image to measure
    #[arg(short = 'i', long)]
    pub image: PathBuf,

    /// A point as X,Y; give exactly two
    #[arg(short = 'p', long = "point", value_name = "X,Y", conflicts_with = "detect")]
    pub points: Vec<Point>,

    /// Find the points with line detection
    #[arg(short = 'd', long, default_value_t = false)]
    pub detect: bool,

    /// Save the record and annotated image
    #[arg(short = 's', long, default_value_t = false)]
    pub save: bool,

    /// Output directory for saved artifacts
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShellArgs {
    /// Image to load before the first prompt
    #[arg(short = 'i', long)]
    pub image: Option<PathBuf>,

    /// Output directory for saved artifacts
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LiveArgs {
    /// Camera device index (default from config)
    #[arg(short = 'c', long, conflicts_with = "frames")]
    pub camera: Option<u32>,

    /// Replay image files instead of a camera
    #[arg(long, num_args = 1.., value_name = "PATH")]
    pub frames: Vec<PathBuf>,

    /// Replay `--frames` in a loop until stopped
    #[arg(long = "loop", default_value_t = false, requires = "frames")]
    pub loop_frames: bool,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    pub max_frames: Option<u64>,

    /// Write the annotated preview to this file
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Minimum milliseconds between frames (default from config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Save the last detected measurement on exit
    #[arg(short = 's', long, default_value_t = false)]
    pub save: bool,

    /// Output directory for saved artifacts
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ConfigArgs {
    /// Write the default configuration to --config or the user config dir
    #[arg(long, default_value_t = false)]
    pub write_default: bool,
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    /// All log levels (most verbose)
    Trace,
    /// Debug and above levels
    Debug,
    /// Info, warning, and error levels
    Info,
    /// Warning and error levels
    Warn,
    /// Error level only
    Error,
}

impl LogLevel {
    /// Directive string for `EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref config_file) = self.config {
            // `config --write-default` may create it
            let writing = matches!(&self.command, Command::Config(c) if c.write_default);
            if !writing && !config_file.exists() {
                return Err(format!("Configuration file does not exist: {}", config_file.display()));
            }
        }

        match &self.command {
            Command::Measure(m) => {
                require_file(&m.image, "Image")?;
                if !m.detect && m.points.len() != 2 {
                    return Err(format!(
                        "Give exactly two --point X,Y values or use --detect ({} given)",
                        m.points.len()
                    ));
                }
                check_output_dir(m.output_dir.as_ref())?;
            }
            Command::Shell(s) => {
                if let Some(ref image) = s.image {
                    require_file(image, "Image")?;
                }
                check_output_dir(s.output_dir.as_ref())?;
            }
            Command::Live(l) => {
                for frame in &l.frames {
                    require_file(frame, "Frame")?;
                }
                if l.max_frames == Some(0) {
                    return Err("Max frames must be greater than 0".to_string());
                }
                if l.interval_ms.is_some_and(|ms| ms > 60_000) {
                    return Err("Frame interval too long (max 60 seconds)".to_string());
                }
                check_output_dir(l.output_dir.as_ref())?;
            }
            Command::Config(_) => {}
        }

        Ok(())
    }

    /// Log level after applying `--verbose`
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            self.log_level.min(LogLevel::Debug)
        } else {
            self.log_level
        }
    }

    /// Output directory override for the active subcommand
    pub fn output_dir(&self) -> Option<&PathBuf> {
        match &self.command {
            Command::Measure(m) => m.output_dir.as_ref(),
            Command::Shell(s) => s.output_dir.as_ref(),
            Command::Live(l) => l.output_dir.as_ref(),
            Command::Config(_) => None,
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("📋 Configuration Summary:");
        match &self.command {
            Command::Measure(m) => {
                println!("   🖼️ Image: {}", m.image.display());
                if m.detect {
                    println!("   🔍 Points: line detection");
                } else {
                    let points: Vec<String> = m.points.iter().map(|p| p.to_string()).collect();
                    println!("   📍 Points: {}", points.join(" "));
                }
                println!("   💾 Save: {}", m.save);
            }
            Command::Shell(s) => {
                if let Some(ref image) = s.image {
                    println!("   🖼️ Image: {}", image.display());
                }
            }
            Command::Live(l) => {
                if l.frames.is_empty() {
                    match l.camera {
                        Some(index) => println!("   📷 Camera: {}", index),
                        None => println!("   📷 Camera: from config"),
                    }
                } else {
                    println!("   🎞️ Frames: {} file(s), loop: {}", l.frames.len(), l.loop_frames);
                }
                if let Some(max) = l.max_frames {
                    println!("   🔢 Max frames: {}", max);
                }
                if let Some(ref preview) = l.preview {
                    println!("   👁️ Preview: {}", preview.display());
                }
            }
            Command::Config(_) => {}
        }
        if let Some(dir) = self.output_dir() {
            println!("   📁 Output: {}", dir.display());
        }
        println!("   📝 Log level: {:?}", self.effective_log_level());
    }
}

fn require_file(path: &PathBuf, what: &str) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("{} file does not exist: {}", what, path.display()));
    }
    Ok(())
}

fn check_output_dir(dir: Option<&PathBuf>) -> Result<(), String> {
    match dir {
        Some(dir) if dir.exists() && !dir.is_dir() => {
            Err(format!("Output path is not a directory: {}", dir.display()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_parsing() {
        let args = Args::try_parse_from([
            "cement-measure",
            "measure",
            "--image",
            "sample.png",
            "--point",
            "2,3",
            "-p",
            "8,3",
            "--save",
            "--verbose",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.effective_log_level(), LogLevel::Debug);
        match args.command {
            Command::Measure(m) => {
                assert_eq!(m.image, PathBuf::from("sample.png"));
                assert_eq!(m.points, vec![Point::new(2, 3), Point::new(8, 3)]);
                assert!(m.save);
                assert!(!m.detect);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_point_and_detect_conflict() {
        let result = Args::try_parse_from([
            "cement-measure",
            "measure",
            "--image",
            "x.png",
            "--point",
            "1,1",
            "--detect",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_point_is_rejected() {
        let result = Args::try_parse_from(["cement-measure", "measure", "-i", "x.png", "-p", "1;1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_live_parsing() {
        let args = Args::try_parse_from([
            "cement-measure",
            "--log-level",
            "warn",
            "live",
            "--frames",
            "a.png",
            "b.png",
            "--max-frames",
            "10",
        ])
        .unwrap();

        assert_eq!(args.effective_log_level(), LogLevel::Warn);
        match args.command {
            Command::Live(l) => {
                assert_eq!(l.frames.len(), 2);
                assert_eq!(l.max_frames, Some(10));
                assert!(l.camera.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["cement-measure", "live", "--camera", "1", "--frames", "a.png"]).is_err());
    }

    #[test]
    fn test_args_validation() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("sample.png");
        std::fs::write(&image, b"placeholder").unwrap();
        let image = image.to_string_lossy().to_string();

        let one_point = Args::try_parse_from(["cement-measure", "measure", "-i", &image, "-p", "1,1"]).unwrap();
        assert!(one_point.validate().is_err());

        let detect = Args::try_parse_from(["cement-measure", "measure", "-i", &image, "--detect"]).unwrap();
        assert!(detect.validate().is_ok());

        let missing = Args::try_parse_from(["cement-measure", "measure", "-i", "/nonexistent.png", "--detect"]).unwrap();
        assert!(missing.validate().is_err());

        let zero = Args::try_parse_from(["cement-measure", "live", "--max-frames", "0"]).unwrap();
        assert!(zero.validate().is_err());

        let no_config = Args::try_parse_from(["cement-measure", "--config", "/nonexistent.json", "shell"]).unwrap();
        assert!(no_config.validate().is_err());

        let write_config = Args::try_parse_from([
            "cement-measure",
            "--config",
            "/nonexistent.json",
            "config",
            "--write-default",
        ])
        .unwrap();
        assert!(write_config.validate().is_ok());
    }
}
