//! Hardware display: paints composed groups onto the LED matrix.
//!
//! The `rpi-led-matrix` C library is not thread-safe, so the matrix is
//! owned by whoever owns the `MatrixDisplay` and is only touched from
//! that thread. Frames are drawn into the offscreen canvas and then
//! swapped in, so the panel never shows a half-drawn frame.

use crate::compose::{DisplayHandle, Group};
use crate::{Color, HEIGHT, MatrixOptions, WIDTH, create_matrix};
use rpi_led_matrix::{LedCanvas, LedMatrix};

/// [`DisplayHandle`] backed by a physical 64x32 panel.
///
/// # Rust concept: Option::take for moved values
/// `matrix.swap` consumes the canvas and hands back the other buffer.
/// Keeping the canvas in an `Option` lets us move it out of `&mut self`
/// with `take()` and put the returned one back.
pub struct MatrixDisplay {
    matrix: LedMatrix,
    canvas: Option<LedCanvas>,
    brightness: u8,
    frames_shown: u64,
}

impl MatrixDisplay {
    /// Bring up the matrix. Fails without root or GPIO access.
    pub fn new(opts: &MatrixOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let matrix = create_matrix(opts)?;
        let canvas = matrix.offscreen_canvas();
        tracing::info!(
            "LED matrix ready: {}x{} ({}, pwm bits {}, brightness {})",
            WIDTH,
            HEIGHT,
            opts.hardware_mapping,
            opts.pwm_bits,
            opts.brightness
        );
        Ok(Self {
            matrix,
            canvas: Some(canvas),
            brightness: opts.brightness.min(100),
            frames_shown: 0,
        })
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Blank the panel, e.g. on shutdown.
    pub fn clear(&mut self) {
        let mut canvas = self
            .canvas
            .take()
            .unwrap_or_else(|| self.matrix.offscreen_canvas());
        canvas.clear();
        self.canvas = Some(self.matrix.swap(canvas));
    }
}

/// Paint every pixel of the group into the canvas.
fn draw_group(canvas: &mut LedCanvas, group: &Group, brightness: u8) {
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let c = group
                .color_at(x, y)
                .unwrap_or(Color::BLACK)
                .apply_brightness(brightness);
            canvas.set(x as i32, y as i32, &c.into());
        }
    }
}

impl DisplayHandle for MatrixDisplay {
    fn set_root_group(&mut self, group: Group) {
        let mut canvas = self
            .canvas
            .take()
            .unwrap_or_else(|| self.matrix.offscreen_canvas());
        draw_group(&mut canvas, &group, self.brightness);
        self.canvas = Some(self.matrix.swap(canvas));
        self.frames_shown += 1;
    }
}
