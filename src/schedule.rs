//! Outer frame loop: a short demo that holds a fixed list of hours,
//! then the steady state driven by the real local hour.
//!
//! Each tick generates one frame, composes it onto the display and
//! sleeps for the frame interval. The loops stop when the `running`
//! flag is cleared (Ctrl+C) or when the composer rejects a frame.

use crate::compose::{ComposeError, DisplayHandle, compose_frame};
use crate::pattern::{TimeBucket, get_time_display};
use crate::{FrameCounter, is_running};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};

/// Pacing and demo settings for the frame loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Hours shown in order before switching to the real clock
    pub demo_hours: Vec<i64>,
    /// How long each demo hour is held
    pub hour_duration: Duration,
    /// Sleep between frames
    pub frame_interval: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            demo_hours: vec![6, 10, 14, 18, 22],
            hour_duration: Duration::from_secs(4),
            frame_interval: Duration::from_millis(100),
        }
    }
}

/// Source of the current local hour.
///
/// The UTC offset is looked up once, when the clock is created, because
/// the lookup is unreliable once other threads exist.
#[derive(Clone, Copy, Debug)]
pub struct LocalClock {
    offset: UtcOffset,
}

impl LocalClock {
    /// Must be called before spawning threads (including the Ctrl+C handler).
    pub fn new() -> Self {
        Self::resolve(UtcOffset::current_local_offset().ok())
    }

    /// Use the looked-up offset, or UTC (with a warning) when the lookup failed.
    pub fn resolve(offset: Option<UtcOffset>) -> Self {
        let offset = offset.unwrap_or_else(|| {
            tracing::warn!("Local UTC offset unavailable, using UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn hour(&self) -> i64 {
        i64::from(OffsetDateTime::now_utc().to_offset(self.offset).hour())
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate and publish one frame.
pub fn tick(
    display: &mut impl DisplayHandle,
    frame: FrameCounter,
    hour: i64,
) -> Result<(), ComposeError> {
    let generated = get_time_display(i64::from(frame.value()), hour);
    compose_frame(&generated, display)
}

/// Hold each demo hour for `hour_duration`, at least one frame each.
pub fn run_demo(
    display: &mut impl DisplayHandle,
    config: &ScheduleConfig,
    running: &AtomicBool,
) -> Result<(), ComposeError> {
    let mut frame = FrameCounter::new();

    for &hour in &config.demo_hours {
        if !is_running(running) {
            break;
        }
        tracing::info!("Demo hour {} ({:?})", hour, TimeBucket::from_hour(hour));

        let start = Instant::now();
        loop {
            tick(display, frame, hour)?;
            frame.advance();
            thread::sleep(config.frame_interval);

            if start.elapsed() >= config.hour_duration || !is_running(running) {
                break;
            }
        }
    }

    Ok(())
}

/// Follow the real clock until `running` is cleared.
pub fn run_live(
    display: &mut impl DisplayHandle,
    config: &ScheduleConfig,
    clock: &LocalClock,
    running: &AtomicBool,
) -> Result<(), ComposeError> {
    let mut frame = FrameCounter::new();
    let mut last_bucket = None;

    while is_running(running) {
        let hour = clock.hour();
        let bucket = TimeBucket::from_hour(hour);
        if last_bucket != Some(bucket) {
            tracing::info!("Hour {}: showing {:?}", hour, bucket);
            last_bucket = Some(bucket);
        }

        tick(display, frame, hour)?;
        frame.advance();
        thread::sleep(config.frame_interval);
    }

    Ok(())
}

/// Demo first, then the live clock.
pub fn run(
    display: &mut impl DisplayHandle,
    config: &ScheduleConfig,
    clock: &LocalClock,
    running: &AtomicBool,
) -> Result<(), ComposeError> {
    run_demo(display, config, running)?;
    run_live(display, config, clock, running)
}
