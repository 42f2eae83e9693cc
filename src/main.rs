//! Daylight Matrix
//!
//! Drives a 64x32 LED matrix with a swirling pattern whose palette and
//! shapes follow the time of day: dawn, morning, midday, evening, night.
//!
//! ## Usage
//! ```sh
//! # Demo each time of day for 4 seconds, then follow the real clock
//! sudo ./target/release/daylight-matrix run
//!
//! # Render a single frame to PNG without touching hardware
//! ./target/release/daylight-matrix preview --hour 14 --out midday.png
//!
//! # Print a frame's palette and indices as JSON
//! ./target/release/daylight-matrix dump --hour 22 --frame 5
//! ```

use clap::{Args, Parser, Subcommand};
use daylight_matrix::compose::build_group;
use daylight_matrix::pattern::get_time_display;
use daylight_matrix::preview::{self, FrameSnapshot};
use daylight_matrix::schedule::{self, LocalClock, ScheduleConfig};
use daylight_matrix::MatrixOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Time-of-day swirl animation for an RGB LED matrix
#[derive(Parser)]
#[command(name = "daylight-matrix")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the LED matrix: demo hours first, then the real clock
    Run(RunArgs),
    /// Render one frame to a PNG file
    Preview(PreviewArgs),
    /// Print one frame as JSON
    Dump(FrameArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Hours to demo before following the clock, comma separated
    #[arg(long, value_delimiter = ',', default_value = "6,10,14,18,22")]
    demo_hours: Vec<i64>,

    /// How long each demo hour is shown, in milliseconds
    #[arg(long, default_value = "4000")]
    hour_duration_ms: u64,

    /// Delay between frames, in milliseconds
    #[arg(long, default_value = "100")]
    frame_interval_ms: u64,

    /// Go straight to the real clock
    #[arg(long)]
    skip_demo: bool,

    /// Display brightness (0-100)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    brightness: u8,

    /// rpi-rgb-led-matrix hardware mapping
    #[arg(long, default_value = "adafruit-hat")]
    hardware_mapping: String,

    /// GPIO slowdown (2 for Pi Zero 2 W)
    #[arg(long, default_value = "2")]
    gpio_slowdown: u32,

    /// PWM bits (color depth per channel)
    #[arg(long, default_value = "4")]
    pwm_bits: u8,
}

impl RunArgs {
    fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            demo_hours: if self.skip_demo {
                Vec::new()
            } else {
                self.demo_hours.clone()
            },
            hour_duration: Duration::from_millis(self.hour_duration_ms),
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        }
    }

    #[cfg_attr(not(feature = "hardware"), allow(dead_code))]
    fn matrix_options(&self) -> MatrixOptions {
        MatrixOptions {
            hardware_mapping: self.hardware_mapping.clone(),
            pwm_bits: self.pwm_bits,
            gpio_slowdown: self.gpio_slowdown,
            brightness: self.brightness,
        }
    }
}

#[derive(Args)]
struct FrameArgs {
    /// Animation frame (0-59 is one cycle)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    frame: i64,

    /// Hour of day to render; defaults to the current local hour
    #[arg(long, allow_negative_numbers = true)]
    hour: Option<i64>,
}

#[derive(Args)]
struct PreviewArgs {
    #[command(flatten)]
    frame: FrameArgs,

    /// Output PNG path
    #[arg(long, default_value = "preview.png")]
    out: PathBuf,

    /// Pixel upscale factor
    #[arg(long, default_value = "8")]
    scale: u32,
}

fn main() {
    init_logging();

    // The local offset must be read before the Ctrl+C handler thread exists.
    let clock = LocalClock::new();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(&args, &clock),
        Command::Preview(args) => run_preview(&args, &clock),
        Command::Dump(args) => run_dump(&args, &clock),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Install the log subscriber. Spawns no threads, so it can run before
/// the local-offset lookup and that lookup's warning still gets logged.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();
}

/// Shown by `run` when the binary was built without the matrix driver.
#[cfg(not(feature = "hardware"))]
const NO_HARDWARE_HINT: &str = "`run` requires the 'hardware' feature (rpi-led-matrix). \
Build with: cargo build --release. \
Without hardware, try `preview --hour 14` or `dump --hour 22`.";

fn run(args: &RunArgs, clock: &LocalClock) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.schedule_config();

    tracing::info!("Daylight Matrix v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Demo hours: {:?}", config.demo_hours);
    tracing::info!("Frame interval: {}ms", config.frame_interval.as_millis());

    drive_panel(args, &config, clock)
}

/// Drive the panel until Ctrl+C.
#[cfg(feature = "hardware")]
fn drive_panel(
    args: &RunArgs,
    config: &ScheduleConfig,
    clock: &LocalClock,
) -> Result<(), Box<dyn std::error::Error>> {
    use daylight_matrix::render::MatrixDisplay;
    use daylight_matrix::setup_signal_handler;

    let mut panel = MatrixDisplay::new(&args.matrix_options())?;
    let running = setup_signal_handler();
    schedule::run(&mut panel, config, clock, &running)?;

    panel.clear();
    let frames = panel.frames_shown();
    tracing::info!("Shutting down after {} frames", frames);
    Ok(())
}

/// Without the matrix driver there is nothing to animate.
///
/// # Rust concept: #[cfg] on items
/// Exactly one `drive_panel` is compiled, picked by the `hardware`
/// feature, so callers never need to know which build they are in.
#[cfg(not(feature = "hardware"))]
fn drive_panel(
    _args: &RunArgs,
    _config: &ScheduleConfig,
    _clock: &LocalClock,
) -> Result<(), Box<dyn std::error::Error>> {
    Err(NO_HARDWARE_HINT.into())
}

fn run_preview(args: &PreviewArgs, clock: &LocalClock) -> Result<(), Box<dyn std::error::Error>> {
    let hour = args.frame.hour.unwrap_or_else(|| clock.hour());
    let generated = get_time_display(args.frame.frame, hour);
    let group = build_group(&generated.palette, &generated.pixels)?;
    preview::save_png(&group, &args.out, args.scale)
}

fn run_dump(args: &FrameArgs, clock: &LocalClock) -> Result<(), Box<dyn std::error::Error>> {
    let hour = args.hour.unwrap_or_else(|| clock.hour());
    println!("{}", FrameSnapshot::capture(args.frame, hour).to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse_run(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        match cli.command {
            Command::Run(run) => run,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_schedule_defaults() {
        let args = parse_run(&["daylight-matrix", "run"]);
        assert_eq!(args.schedule_config(), ScheduleConfig::default());
        assert_eq!(args.matrix_options(), MatrixOptions::default());
    }

    #[test]
    fn skip_demo_clears_hours() {
        let args = parse_run(&["daylight-matrix", "run", "--skip-demo"]);
        assert!(args.schedule_config().demo_hours.is_empty());
    }

    #[test]
    fn custom_demo_hours() {
        let args = parse_run(&[
            "daylight-matrix",
            "run",
            "--demo-hours",
            "22,6",
            "--hour-duration-ms",
            "500",
        ]);
        let config = args.schedule_config();
        assert_eq!(config.demo_hours, vec![22, 6]);
        assert_eq!(config.hour_duration, Duration::from_millis(500));
    }

    #[test]
    fn brightness_above_100_is_rejected() {
        assert!(Cli::try_parse_from(["daylight-matrix", "run", "--brightness", "150"]).is_err());
    }

    #[test]
    fn dump_accepts_out_of_range_hour() {
        let cli = Cli::try_parse_from(["daylight-matrix", "dump", "--hour", "-3", "--frame", "7"])
            .unwrap();
        match cli.command {
            Command::Dump(args) => {
                assert_eq!(args.hour, Some(-3));
                assert_eq!(args.frame, 7);
            }
            _ => panic!("expected dump"),
        }
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn run_without_hardware_exits_with_hint() {
        let args = parse_run(&["daylight-matrix", "run", "--skip-demo"]);
        let clock = LocalClock::with_offset(time::UtcOffset::UTC);
        let err = run(&args, &clock).unwrap_err().to_string();
        assert!(err.contains("'hardware' feature"), "{err}");
        assert!(err.contains("preview"), "{err}");
    }

    #[test]
    fn run_args_build_matrix_options() {
        let args = parse_run(&[
            "daylight-matrix",
            "run",
            "--brightness",
            "40",
            "--pwm-bits",
            "8",
            "--hardware-mapping",
            "regular",
        ]);
        let options = args.matrix_options();
        assert_eq!(options.brightness, 40);
        assert_eq!(options.pwm_bits, 8);
        assert_eq!(options.hardware_mapping, "regular");
    }
}
