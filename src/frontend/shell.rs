// src/frontend/shell.rs - Interactive request/response loop

use std::io::{self, BufRead, Write};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::types::format_points;
use crate::frontend::app::MeasureApp;
use crate::frontend::controls::{Control, HELP_TEXT};
use crate::frontend::session::PointOutcome;
use crate::frontend::FrontendError;

const PROMPT: &str = "measure> ";

/// How the shell ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    EndOfInput,
    Cancelled,
}

/// Counters reported when the shell exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellSummary {
    pub exit: ShellExit,
    pub commands: u64,
    pub errors: u64,
}

enum Flow {
    Continue,
    Quit,
}

/// Reads one control per line and answers on `output`
pub struct Shell<'a, R, W> {
    app: &'a mut MeasureApp,
    input: R,
    output: W,
    show_prompt: bool,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(app: &'a mut MeasureApp, input: R, output: W) -> Self {
        Self {
            app,
            input,
            output,
            show_prompt: true,
        }
    }

    /// Print a prompt before each line (off for scripted input)
    pub fn with_prompt(mut self, show_prompt: bool) -> Self {
        self.show_prompt = show_prompt;
        self
    }

    /// Run until `quit`, end of input, or cancellation
    pub fn run(&mut self, cancel: &CancellationToken) -> io::Result<ShellSummary> {
        let mut commands = 0u64;
        let mut errors = 0u64;
        let mut line = String::new();

        let exit = loop {
            if cancel.is_cancelled() {
                break ShellExit::Cancelled;
            }
            if self.show_prompt {
                write!(self.output, "{}", PROMPT)?;
                self.output.flush()?;
            }

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break ShellExit::EndOfInput;
            }
            if line.trim().is_empty() {
                continue;
            }

            let control = match line.parse::<Control>() {
                Ok(control) => control,
                Err(e) => {
                    errors += 1;
                    writeln!(self.output, "error: {}", e)?;
                    continue;
                }
            };

            commands += 1;
            debug!("⌨️ Control: {:?}", control);
            match self.execute(control) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break ShellExit::Quit,
                Err(e) => {
                    errors += 1;
                    writeln!(self.output, "error: {}", e)?;
                }
            }
        };

        info!("👋 Shell finished ({:?}, {} commands, {} errors)", exit, commands, errors);
        Ok(ShellSummary { exit, commands, errors })
    }

    fn execute(&mut self, control: Control) -> Result<Flow, FrontendError> {
        match control {
            Control::Load(path) => {
                let frame = self.app.load_path(&path)?;
                let resolution = frame.resolution_string();
                writeln!(self.output, "Loaded {} image from {}", resolution, path.display())?;
            }
            Control::Capture => {
                let frame = self.app.capture()?;
                let resolution = frame.resolution_string();
                writeln!(self.output, "Captured {} frame", resolution)?;
            }
            Control::Click(point) => match self.app.click(point)? {
                PointOutcome::Accepted { index } => {
                    writeln!(self.output, "Point {}: {}", index + 1, point)?;
                }
                PointOutcome::Ignored => {
                    writeln!(self.output, "Two points already selected; reset to choose again")?;
                }
            },
            Control::Detect => match self.app.detect()? {
                Some(segment) => writeln!(
                    self.output,
                    "Detected line: {} -> {}",
                    segment.start, segment.end
                )?,
                None => writeln!(self.output, "No line detected - select points manually")?,
            },
            Control::Calculate => {
                let measurement = self.app.calculate()?;
                writeln!(self.output, "Distance: {}", measurement.label())?;
            }
            Control::Save => {
                let saved = self.app.save()?;
                writeln!(
                    self.output,
                    "Saved {} and {}",
                    saved.text_path.display(),
                    saved.image_path.display()
                )?;
                if let Some(json) = saved.json_path {
                    writeln!(self.output, "Saved {}", json.display())?;
                }
            }
            Control::Points => {
                let points = format_points(self.app.session().points());
                writeln!(self.output, "Points: {}", points)?;
            }
            Control::Status => {
                let status = self.app.session().status_line();
                writeln!(self.output, "{}", status)?;
            }
            Control::Reset => {
                self.app.reset();
                writeln!(self.output, "Points cleared")?;
            }
            Control::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Control::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasureConfig;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn run_script(app: &mut MeasureApp, script: &str) -> (ShellSummary, String) {
        let mut output = Vec::new();
        let summary = Shell::new(app, Cursor::new(script.as_bytes()), &mut output)
            .with_prompt(false)
            .run(&CancellationToken::new())
            .unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_scripted_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("sample.png");
        RgbImage::from_pixel(30, 30, Rgb([60, 60, 60])).save(&image_path).unwrap();

        let mut config = MeasureConfig::default();
        config.store.output_dir = dir.path().join("out");
        let mut app = MeasureApp::new(&config);

        let script = format!(
            "load {}\nclick 2 3\n\nclick 8 3\nclick 9 9\npoints\ncalc\nsave\nquit\nclick 1 1\n",
            image_path.display()
        );
        let (summary, output) = run_script(&mut app, &script);

        assert_eq!(summary.exit, ShellExit::Quit);
        assert_eq!(summary.errors, 0);
        assert!(output.contains("Loaded 30x30 image"));
        assert!(output.contains("Point 2: (8, 3)"));
        assert!(output.contains("Two points already selected"));
        assert!(output.contains("Points: [(2, 3), (8, 3)]"));
        assert!(output.contains("Distance: 6.00 pixels"));
        assert!(output.contains("measurement_"));
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 2);
    }

    #[test]
    fn test_errors_do_not_stop_the_shell() {
        let mut app = MeasureApp::new(&MeasureConfig::default());
        let (summary, output) = run_script(&mut app, "click 1 1\nfly\ncalc\nsave\nstatus\nhelp\n");

        assert_eq!(summary.exit, ShellExit::EndOfInput);
        assert_eq!(summary.errors, 4);
        assert!(output.contains("error: No image loaded"));
        assert!(output.contains("error: unknown control 'fly'"));
        assert!(output.contains("no image"));
        assert!(output.contains("Controls:"));
    }

    #[test]
    fn test_cancelled_shell_reads_nothing() {
        let mut app = MeasureApp::new(&MeasureConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut output = Vec::new();
        let summary = Shell::new(&mut app, Cursor::new(b"help\n".as_slice()), &mut output)
            .run(&cancel)
            .unwrap();
        assert_eq!(summary.exit, ShellExit::Cancelled);
        assert_eq!(summary.commands, 0);
        assert!(output.is_empty());
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_capture_failure_reported_once() {
        let mut app = MeasureApp::new(&MeasureConfig::default());
        let (summary, output) = run_script(&mut app, "capture
status
");

        assert_eq!(summary.errors, 1);
        assert_eq!(output.matches("Camera 0 unavailable").count(), 1);
        assert!(output.contains("no image"));
    }
}
