//! Pattern generator: time-of-day buckets, the swirl field, and the
//! fallback checkerboard.
//!
//! Every call produces a fresh [`Frame`] (a 16-entry palette plus one
//! palette index per pixel). Nothing is cached between frames; the only
//! input that changes from frame to frame is the counter the caller
//! hands in.

use crate::{Color, HEIGHT, PALETTE_SIZE, PIXEL_COUNT, WIDTH};
use serde::Serialize;
use std::fmt;

/// Fixed-size color table indexed by pixel values.
pub type Palette = [Color; PALETTE_SIZE];

/// Row-major palette indices, one per pixel (`index = y * WIDTH + x`).
pub type PixelIndexGrid = Vec<u8>;

/// One generated animation frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub palette: Palette,
    pub pixels: PixelIndexGrid,
}

impl Frame {
    /// Palette index at `(x, y)`.
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * WIDTH + x]
    }
}

// ── Palettes ─────────────────────────────────────────────────────────

/// Four meaningful colors followed by a repeated filler.
///
/// # Rust concept: const fn
/// A `const fn` can run at compile time, so every palette below is baked
/// into the binary as a plain array. `for` loops are not allowed in const
/// context yet, hence the `while`.
const fn palette_of(lead: [u32; 4], filler: u32) -> Palette {
    let mut palette = [Color::from_packed(filler); PALETTE_SIZE];
    let mut i = 0;
    while i < lead.len() {
        palette[i] = Color::from_packed(lead[i]);
        i += 1;
    }
    palette
}

const DAWN_PALETTE: Palette = palette_of([0xFF8844, 0xFFAA00, 0xFF5500, 0xFFCC88], 0xFF9966);
const MORNING_PALETTE: Palette = palette_of([0x66CCFF, 0xFFFF00, 0xFFFFFF, 0x99DDFF], 0x77CCFF);
const MIDDAY_PALETTE: Palette = palette_of([0x0088FF, 0xFFFF00, 0xFFFFFF, 0x00AAFF], 0x0099FF);
const EVENING_PALETTE: Palette = palette_of([0xFF5500, 0xFF8800, 0xFFAA00, 0xFF6622], 0xFF7733);
const NIGHT_PALETTE: Palette = palette_of([0x000066, 0x0000AA, 0xFFFFFF, 0x000088], 0x000077);

/// Black, white, then black to the end.
pub const FALLBACK_PALETTE: Palette = {
    let mut palette = [Color::BLACK; PALETTE_SIZE];
    palette[1] = Color::WHITE;
    palette
};

// ── Time buckets ─────────────────────────────────────────────────────

/// Hour-of-day category driving palette and pattern choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Dawn,
    Morning,
    Midday,
    Evening,
    Night,
}

impl TimeBucket {
    /// Classify an hour. Anything outside the four daytime ranges,
    /// including hours outside 0-23, is night.
    pub fn from_hour(hour: i64) -> Self {
        match hour {
            5..8 => Self::Dawn,
            8..12 => Self::Morning,
            12..17 => Self::Midday,
            17..20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Dawn => DAWN_PALETTE,
            Self::Morning => MORNING_PALETTE,
            Self::Midday => MIDDAY_PALETTE,
            Self::Evening => EVENING_PALETTE,
            Self::Night => NIGHT_PALETTE,
        }
    }

    /// Multiplier applied to the frame counter before it feeds the swirl.
    pub fn frame_rate(self) -> f64 {
        match self {
            Self::Dawn => 1.0,
            Self::Morning => 0.8,
            Self::Midday => 0.5,
            Self::Evening => 0.7,
            Self::Night => 0.3,
        }
    }

    /// Palette index for one pixel given its swirl value.
    ///
    /// All thresholds are strict: a swirl exactly on a threshold takes
    /// the lower branch.
    pub fn index_for(self, x: usize, y: usize, frame: i64, swirl: f64) -> u8 {
        match self {
            // Horizon split at half height
            Self::Dawn => {
                if y < HEIGHT / 2 {
                    if swirl > 0.6 { 1 } else { 0 }
                } else if swirl > 0.5 {
                    3
                } else {
                    2
                }
            }
            Self::Morning => {
                if swirl > 0.7 {
                    1
                } else if swirl > 0.5 {
                    2
                } else {
                    0
                }
            }
            Self::Midday => {
                if in_sun_disc(x, y) {
                    1
                } else if swirl > 0.6 {
                    2
                } else {
                    0
                }
            }
            Self::Evening => {
                if y as f64 > HEIGHT as f64 * 2.0 / 3.0 {
                    3
                } else if swirl > 0.6 {
                    1
                } else if swirl > 0.4 {
                    2
                } else {
                    0
                }
            }
            Self::Night => {
                if is_star_candidate(x, y, frame) && swirl > 0.7 {
                    2
                } else if swirl > 0.5 {
                    1
                } else {
                    0
                }
            }
        }
    }
}

const SUN_RADIUS: f64 = 6.0;

/// Sun disc centred at (W/2, H/3).
fn in_sun_disc(x: usize, y: usize) -> bool {
    let dx = x as f64 - WIDTH as f64 / 2.0;
    let dy = y as f64 - HEIGHT as f64 / 3.0;
    (dx * dx + dy * dy).sqrt() < SUN_RADIUS
}

/// `(x*y + 3*frame) mod 29 < 2`, reduced first so any frame is safe.
///
/// # Rust concept: rem_euclid
/// `%` keeps the sign of the left operand (`-1 % 29 == -1`), while
/// `rem_euclid` always lands in `0..29`. Reducing `frame` before
/// multiplying also keeps `3 * frame` from overflowing `i64`.
pub fn is_star_candidate(x: usize, y: usize, frame: i64) -> bool {
    let xy = (x * y) as i64;
    (xy + frame.rem_euclid(29) * 3).rem_euclid(29) < 2
}

// ── Swirl field ──────────────────────────────────────────────────────

/// Rotating spiral field in `[0, 1]`.
///
/// Polar coordinates around the grid midpoint; the angle advances with
/// `frame` and twists with distance from the centre.
pub fn swirl(x: usize, y: usize, frame: f64) -> f64 {
    let cx = x as f64 - WIDTH as f64 / 2.0;
    let cy = y as f64 - HEIGHT as f64 / 2.0;
    let dist = (cx * cx + cy * cy).sqrt();
    let angle = cy.atan2(cx) + frame * 0.1 + dist * 0.1;
    (angle + dist * 0.2).sin() * 0.5 + 0.5
}

// ── Generation ───────────────────────────────────────────────────────

/// Why a frame could not be generated.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternError {
    /// The swirl field produced NaN or infinity at this pixel.
    NonFiniteField { x: usize, y: usize, frame: i64 },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteField { x, y, frame } => {
                write!(f, "swirl field is not finite at ({x}, {y}) on frame {frame}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Generate the frame for `frame` at `hour`.
pub fn generate(frame: i64, hour: i64) -> Result<Frame, PatternError> {
    let bucket = TimeBucket::from_hour(hour);
    let t = frame as f64 * bucket.frame_rate();

    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let value = swirl(x, y, t);
            if !value.is_finite() {
                return Err(PatternError::NonFiniteField { x, y, frame });
            }
            pixels.push(bucket.index_for(x, y, frame, value));
        }
    }

    Ok(Frame {
        palette: bucket.palette(),
        pixels,
    })
}

/// Something that can produce frames, so the fallback path can be
/// driven by any generator.
///
/// # Rust concept: traits as seams
/// [`get_display`] takes `&impl PatternSource` instead of calling
/// [`generate`] directly. Tests pass a source that always fails; the
/// compiler monomorphizes each use, so the real path costs nothing extra.
pub trait PatternSource {
    fn generate(&self, frame: i64, hour: i64) -> Result<Frame, PatternError>;
}

/// The time-of-day swirl generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimePattern;

impl PatternSource for TimePattern {
    fn generate(&self, frame: i64, hour: i64) -> Result<Frame, PatternError> {
        generate(frame, hour)
    }
}

/// Two-color checkerboard shown when generation fails.
///
/// Pixel is 1 when `(x + y + frame)` is odd.
pub fn fallback_frame(frame: i64) -> Frame {
    let phase = frame.rem_euclid(2);
    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let parity = ((x + y) as i64 + phase) % 2;
            pixels.push(parity as u8);
        }
    }
    Frame {
        palette: FALLBACK_PALETTE,
        pixels,
    }
}

/// Generate a frame, substituting the checkerboard on failure.
///
/// # Rust concept: matching on Result
/// Failure is an ordinary value here, not an exception. Matching on it
/// makes the recovery explicit, and the fallback itself cannot fail.
pub fn get_display(source: &impl PatternSource, frame: i64, hour: i64) -> Frame {
    match source.generate(frame, hour) {
        Ok(generated) => generated,
        Err(e) => {
            tracing::error!("Error generating time pattern: {}", e);
            fallback_frame(frame)
        }
    }
}

/// [`get_display`] with the time-of-day generator.
pub fn get_time_display(frame: i64, hour: i64) -> Frame {
    get_display(&TimePattern, frame, hour)
}
