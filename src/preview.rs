//! Off-hardware previews of composed frames: PNG images and JSON
//! snapshots. Useful for checking a pattern on a laptop before it goes
//! near the panel.

use crate::compose::Group;
use crate::pattern::{self, Frame, TimeBucket};
use crate::{Color, HEIGHT, WIDTH};
use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use std::path::Path;

/// Render a group to an RGB image, each panel pixel upscaled to a
/// `scale` x `scale` block.
pub fn group_to_image(group: &Group, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    RgbImage::from_fn(WIDTH as u32 * scale, HEIGHT as u32 * scale, |px, py| {
        let c = group
            .color_at((px / scale) as usize, (py / scale) as usize)
            .unwrap_or(Color::BLACK);
        Rgb([c.r, c.g, c.b])
    })
}

/// Write a PNG preview of `group` to `path`.
pub fn save_png(group: &Group, path: &Path, scale: u32) -> Result<(), Box<dyn std::error::Error>> {
    group_to_image(group, scale).save_with_format(path, ImageFormat::Png)?;
    tracing::info!("Wrote preview: {}", path.display());
    Ok(())
}

/// Everything needed to reproduce one frame, in JSON-friendly form.
#[derive(Serialize)]
pub struct FrameSnapshot {
    /// `None` when generation failed and the checkerboard was used
    pub bucket: Option<TimeBucket>,
    pub frame: i64,
    pub hour: i64,
    /// `#RRGGBB` strings, 16 entries
    pub palette: Vec<String>,
    pub pixels: Vec<u8>,
}

impl FrameSnapshot {
    pub fn capture(frame: i64, hour: i64) -> Self {
        let (bucket, generated) = match pattern::generate(frame, hour) {
            Ok(generated) => (Some(TimeBucket::from_hour(hour)), generated),
            Err(e) => {
                tracing::warn!("Snapshot using fallback pattern: {}", e);
                (None, pattern::fallback_frame(frame))
            }
        };
        Self::from_frame(bucket, frame, hour, &generated)
    }

    fn from_frame(bucket: Option<TimeBucket>, frame: i64, hour: i64, generated: &Frame) -> Self {
        Self {
            bucket,
            frame,
            hour,
            palette: generated.palette.iter().map(|c| c.to_hex()).collect(),
            pixels: generated.pixels.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::build_group;
    use crate::{PALETTE_SIZE, PIXEL_COUNT};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn midday_group() -> Group {
        let frame = pattern::generate(0, 14).unwrap();
        build_group(&frame.palette, &frame.pixels).unwrap()
    }

    #[test]
    fn image_matches_panel_size() {
        let img = group_to_image(&midday_group(), 1);
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(img.get_pixel(32, 10), &Rgb([0xFF, 0xFF, 0x00]));
    }

    #[test]
    fn image_upscales_blocks() {
        let img = group_to_image(&midday_group(), 4);
        assert_eq!(img.dimensions(), (256, 128));
        assert_eq!(img.get_pixel(32 * 4 + 3, 10 * 4 + 3), &Rgb([0xFF, 0xFF, 0x00]));
    }

    #[test]
    fn zero_scale_is_treated_as_one() {
        assert_eq!(group_to_image(&midday_group(), 0).dimensions(), (64, 32));
    }

    #[test]
    fn empty_group_renders_black() {
        let img = group_to_image(&Group::new(), 1);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn save_png_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("midday.png");
        save_png(&midday_group(), &path, 2).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (128, 64));
        assert_eq!(loaded.get_pixel(64, 20), &Rgb([0xFF, 0xFF, 0x00]));
    }

    #[test]
    fn snapshot_json_describes_frame() {
        let snapshot = FrameSnapshot::capture(0, 14);
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(json["bucket"], "midday");
        assert_eq!(json["hour"], 14);
        assert_eq!(json["palette"].as_array().unwrap().len(), PALETTE_SIZE);
        assert_eq!(json["palette"][1], "#FFFF00");
        assert_eq!(json["pixels"].as_array().unwrap().len(), PIXEL_COUNT);
    }

    #[test]
    fn snapshot_of_out_of_range_hour_is_night() {
        let snapshot = FrameSnapshot::capture(5, 99);
        assert_eq!(snapshot.bucket, Some(TimeBucket::Night));
        assert_eq!(snapshot.palette[2], "#FFFFFF");
    }
}
