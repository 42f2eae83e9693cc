//! Bitmap composer: turns a palette and a flat index grid into the
//! bitmap / palette / tile grid / group structures a display shows,
//! then publishes the group as the display's new root.
//!
//! The display only ever sees a complete group. Everything is built and
//! validated off to the side first, so a rejected frame leaves the
//! previous one on screen.

use crate::pattern::{Frame, Palette};
use crate::{Color, HEIGHT, PALETTE_SIZE, PIXEL_COUNT, WIDTH};
use std::fmt;

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeError {
    /// Pixel grid is not exactly WIDTH * HEIGHT long.
    LengthMismatch { expected: usize, actual: usize },
    /// A palette index does not fit the bitmap's color depth.
    ValueOutOfRange {
        x: usize,
        y: usize,
        value: u8,
        depth: usize,
    },
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "pixel grid length {actual} does not match {WIDTH}x{HEIGHT} ({expected})"
            ),
            Self::ValueOutOfRange { x, y, value, depth } => write!(
                f,
                "palette index {value} at ({x}, {y}) exceeds bitmap depth {depth}"
            ),
        }
    }
}

impl std::error::Error for ComposeError {}

// ── Display primitives ───────────────────────────────────────────────

/// Indexed bitmap: one palette index per pixel, bounded by `value_count`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    value_count: usize,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize, value_count: usize) -> Self {
        Self {
            width,
            height,
            value_count,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Write one index. Coordinates must be in bounds; values must be
    /// below the color depth.
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> Result<(), ComposeError> {
        if value as usize >= self.value_count {
            return Err(ComposeError::ValueOutOfRange {
                x,
                y,
                value,
                depth: self.value_count,
            });
        }
        self.data[y * self.width + x] = value;
        Ok(())
    }
}

/// Color table the bitmap's indices resolve through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<Color>,
}

impl ColorPalette {
    /// All entries start black.
    pub fn new(len: usize) -> Self {
        Self {
            colors: vec![Color::BLACK; len],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn set(&mut self, index: usize, color: Color) {
        self.colors[index] = color;
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }
}

/// A bitmap bound to the palette that colors it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub bitmap: Bitmap,
    pub pixel_shader: ColorPalette,
}

impl TileGrid {
    pub fn new(bitmap: Bitmap, pixel_shader: ColorPalette) -> Self {
        Self {
            bitmap,
            pixel_shader,
        }
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        let index = self.bitmap.get(x, y)?;
        self.pixel_shader.get(index as usize)
    }
}

/// Stack of layers; the last one appended is drawn on top.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    layers: Vec<TileGrid>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, layer: TileGrid) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[TileGrid] {
        &self.layers
    }

    /// Final color of a pixel, looking through layers from the top.
    pub fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        self.layers.iter().rev().find_map(|layer| layer.color_at(x, y))
    }
}

// ── Display handle ───────────────────────────────────────────────────

/// Whatever owns the physical (or simulated) display.
///
/// Publishing replaces the whole root at once; the old root stays on
/// screen until then.
pub trait DisplayHandle {
    fn set_root_group(&mut self, group: Group);
}

/// Display that just keeps the last published group.
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    root: Option<Group>,
    publish_count: u64,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Group> {
        self.root.as_ref()
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }
}

impl DisplayHandle for MemoryDisplay {
    fn set_root_group(&mut self, group: Group) {
        self.root = Some(group);
        self.publish_count += 1;
    }
}

// ── Composition ──────────────────────────────────────────────────────

/// Build a group from `palette` and `pixels` without touching a display.
pub fn build_group(palette: &Palette, pixels: &[u8]) -> Result<Group, ComposeError> {
    if pixels.len() != PIXEL_COUNT {
        return Err(ComposeError::LengthMismatch {
            expected: PIXEL_COUNT,
            actual: pixels.len(),
        });
    }

    let mut bitmap = Bitmap::new(WIDTH, HEIGHT, PALETTE_SIZE);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            bitmap.set(x, y, pixels[y * WIDTH + x])?;
        }
    }

    let mut shader = ColorPalette::new(PALETTE_SIZE);
    for (i, color) in palette.iter().enumerate() {
        shader.set(i, *color);
    }

    let mut group = Group::new();
    group.append(TileGrid::new(bitmap, shader));
    Ok(group)
}

/// Compose a frame and publish it as the display's current root.
pub fn compose(
    palette: &Palette,
    pixels: &[u8],
    display: &mut impl DisplayHandle,
) -> Result<(), ComposeError> {
    let group = build_group(palette, pixels)?;
    display.set_root_group(group);
    Ok(())
}

/// [`compose`] for a generated [`Frame`].
pub fn compose_frame(frame: &Frame, display: &mut impl DisplayHandle) -> Result<(), ComposeError> {
    compose(&frame.palette, &frame.pixels, display)
}
