//! Time-of-day swirl animation for a 64x32 RGB LED matrix.
//!
//! This crate provides:
//! - The fixed panel geometry and palette size the animation is tuned for
//! - A color type decoupled from the hardware crate
//! - The frame counter that drives the animation cycle
//! - Matrix initialization and signal handling for the binary
//!
//! The pattern generator lives in [`pattern`], the bitmap composer in
//! [`compose`], the outer frame loop in [`schedule`] and off-hardware
//! previews in [`preview`].

pub mod compose;
pub mod pattern;
pub mod preview;
#[cfg(feature = "hardware")]
pub mod render;
pub mod schedule;

#[cfg(feature = "hardware")]
use rpi_led_matrix::{LedMatrix, LedMatrixOptions, LedRuntimeOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Panel geometry ─────────────────────────────────────────────────

/// Panel width in pixels.
pub const WIDTH: usize = 64;
/// Panel height in pixels.
pub const HEIGHT: usize = 32;
/// Number of pixels on the panel.
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;
/// Number of entries in every palette (and the bitmap color depth).
pub const PALETTE_SIZE: usize = 16;
/// Frames in one animation cycle.
pub const FRAME_CYCLE: u32 = 60;

// ── Color ──────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware crate.
///
/// Palettes are written as packed `0xRRGGBB` values; at the hardware
/// boundary we convert via `Into<LedColor>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack a 24-bit `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_packed(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    /// Pack back into `0xRRGGBB`.
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// `#RRGGBB` form, used in JSON snapshots.
    pub fn to_hex(self) -> String {
        format!("#{:06X}", self.packed())
    }

    /// Apply brightness scaling (0-100) to this color.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        Self {
            r: ((self.r as u16 * brightness as u16) / 100) as u8,
            g: ((self.g as u16 * brightness as u16) / 100) as u8,
            b: ((self.b as u16 * brightness as u16) / 100) as u8,
        }
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Frame counter ──────────────────────────────────────────────────

/// Animation frame counter, wrapping every [`FRAME_CYCLE`] frames.
///
/// Owned by the outer loop and handed to the generator by value.
///
/// # Rust concept: newtypes
/// Wrapping the `u32` means the only way to move forward is `advance()`,
/// so the counter can never leave `0..60`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter(u32);

impl FrameCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Step to the next frame, wrapping at the end of the cycle.
    pub fn advance(&mut self) {
        self.0 = (self.0 + 1) % FRAME_CYCLE;
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

// ── Matrix initialization ──────────────────────────────────────────

/// Electrical settings for the matrix driver.
///
/// The panel size is not configurable: the animation only targets 64x32.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixOptions {
    pub hardware_mapping: String,
    pub pwm_bits: u8,
    pub gpio_slowdown: u32,
    /// Brightness applied while painting (0-100)
    pub brightness: u8,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            hardware_mapping: "adafruit-hat".to_string(),
            pwm_bits: 4,
            gpio_slowdown: 2,
            brightness: 100,
        }
    }
}

/// Create a matrix configured for a single 64x32 panel.
///
/// Fails if not running as root or if GPIO is unavailable.
#[cfg(feature = "hardware")]
pub fn create_matrix(opts: &MatrixOptions) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(HEIGHT as u32);
    options.set_cols(WIDTH as u32);
    options.set_hardware_mapping(&opts.hardware_mapping);
    options.set_pwm_bits(opts.pwm_bits)?;

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(opts.gpio_slowdown);

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

/// Set up a Ctrl+C handler that sets `running` to false.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    running
}

/// Check if the frame loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn geometry_constants() {
        assert_eq!(WIDTH, 64);
        assert_eq!(HEIGHT, 32);
        assert_eq!(PIXEL_COUNT, 2048);
        assert_eq!(PALETTE_SIZE, 16);
    }

    // ── Color tests ────────────────────────────────────────────────

    #[rstest]
    #[case(0xFF8844, 0xFF, 0x88, 0x44)]
    #[case(0x000066, 0x00, 0x00, 0x66)]
    #[case(0xFFFFFF, 0xFF, 0xFF, 0xFF)]
    #[case(0x000000, 0x00, 0x00, 0x00)]
    fn test_from_packed(#[case] rgb: u32, #[case] r: u8, #[case] g: u8, #[case] b: u8) {
        let c = Color::from_packed(rgb);
        assert_eq!(c, Color::new(r, g, b));
        assert_eq!(c.packed(), rgb);
    }

    #[test]
    fn from_packed_ignores_high_bits() {
        assert_eq!(Color::from_packed(0xAB_123456), Color::from_packed(0x123456));
    }

    #[test]
    fn to_hex_is_uppercase_and_padded() {
        assert_eq!(Color::from_packed(0x0088FF).to_hex(), "#0088FF");
        assert_eq!(Color::BLACK.to_hex(), "#000000");
    }

    #[test]
    fn apply_brightness_100_is_identity() {
        let c = Color::new(100, 200, 50);
        assert_eq!(c.apply_brightness(100), c);
    }

    #[test]
    fn apply_brightness_0_is_black() {
        assert_eq!(Color::WHITE.apply_brightness(0), Color::BLACK);
    }

    #[test]
    fn apply_brightness_50_halves() {
        let c = Color::new(200, 100, 50);
        assert_eq!(c.apply_brightness(50), Color::new(100, 50, 25));
    }

    // ── FrameCounter tests ─────────────────────────────────────────

    #[test]
    fn frame_counter_wraps_after_cycle() {
        let mut counter = FrameCounter::new();
        for _ in 0..FRAME_CYCLE - 1 {
            counter.advance();
        }
        assert_eq!(counter.value(), 59);
        counter.advance();
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn frame_counter_reset() {
        let mut counter = FrameCounter::new();
        counter.advance();
        counter.advance();
        counter.reset();
        assert_eq!(counter, FrameCounter::default());
    }

    #[test]
    fn matrix_options_default_matches_panel_wiring() {
        let opts = MatrixOptions::default();
        assert_eq!(opts.hardware_mapping, "adafruit-hat");
        assert_eq!(opts.pwm_bits, 4);
        assert_eq!(opts.brightness, 100);
    }
}
