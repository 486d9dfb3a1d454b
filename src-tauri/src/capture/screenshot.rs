//! Virtual-desktop capture using the `xcap` crate.
//!
//! This is the infrastructure layer; it talks to the OS.
//! Everything above it only sees the [`ScreenGrabber`] trait.

use super::Bitmap;
use image::{imageops, DynamicImage, RgbaImage};
use xcap::Monitor;

/// Source of full-desktop frames.
pub trait ScreenGrabber: Send + Sync {
    /// Captures the bounding box of every attached display in one frame.
    fn grab_virtual_desktop(&self) -> Result<Bitmap, GrabError>;
}

/// Grabs every monitor through `xcap` and stitches them together.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapGrabber;

impl ScreenGrabber for XcapGrabber {
    fn grab_virtual_desktop(&self) -> Result<Bitmap, GrabError> {
        let monitors =
            Monitor::all().map_err(|e| GrabError::MonitorEnumeration(e.to_string()))?;

        let mut captured = Vec::with_capacity(monitors.len());
        for monitor in monitors {
            let x = monitor
                .x()
                .map_err(|e| GrabError::MonitorEnumeration(e.to_string()))?;
            let y = monitor
                .y()
                .map_err(|e| GrabError::MonitorEnumeration(e.to_string()))?;
            let scale = monitor.scale_factor().unwrap_or(1.0);
            let image = monitor
                .capture_image()
                .map_err(|e| GrabError::CaptureFailed(e.to_string()))?;
            captured.push((x, y, scale, image));
        }

        // macOS reports origins in points, frames in pixels.
        let origin_scale = if ORIGINS_IN_POINTS {
            max_scale_factor(captured.iter().map(|(_, _, scale, _)| *scale))
        } else {
            1.0
        };

        let tiles = captured
            .into_iter()
            .map(|(x, y, _, image)| {
                let (x, y) = scale_origin(x, y, origin_scale);
                MonitorTile { x, y, image }
            })
            .collect();

        compose_virtual_desktop(tiles)
    }
}

const ORIGINS_IN_POINTS: bool = cfg!(target_os = "macos");

/// Largest backing scale among the monitors, never below 1.
///
/// Multiplying every point-space origin by it keeps the tiles disjoint:
/// no monitor is wider in pixels than its logical width times this factor.
fn max_scale_factor(scales: impl IntoIterator<Item = f32>) -> f32 {
    scales
        .into_iter()
        .filter(|s| s.is_finite())
        .fold(1.0, f32::max)
}

fn scale_origin(x: i32, y: i32, scale: f32) -> (i32, i32) {
    let scale = f64::from(scale);
    (
        (f64::from(x) * scale).round() as i32,
        (f64::from(y) * scale).round() as i32,
    )
}

/// One monitor's frame and its origin on the virtual desktop.
pub struct MonitorTile {
    pub x: i32,
    pub y: i32,
    pub image: RgbaImage,
}

/// Pastes monitor frames onto a canvas covering their union bounding box.
///
/// Gaps between monitors stay black. Alpha is dropped.
pub fn compose_virtual_desktop(tiles: Vec<MonitorTile>) -> Result<Bitmap, GrabError> {
    let min_x = tiles.iter().map(|t| i64::from(t.x)).min();
    let min_y = tiles.iter().map(|t| i64::from(t.y)).min();
    let max_x = tiles
        .iter()
        .map(|t| i64::from(t.x) + i64::from(t.image.width()))
        .max();
    let max_y = tiles
        .iter()
        .map(|t| i64::from(t.y) + i64::from(t.image.height()))
        .max();

    let (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) = (min_x, min_y, max_x, max_y)
    else {
        return Err(GrabError::NoMonitors);
    };

    let width = u32::try_from(max_x - min_x).unwrap_or(0);
    let height = u32::try_from(max_y - min_y).unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(GrabError::CaptureFailed(format!(
            "virtual desktop has no area ({}x{})",
            width, height
        )));
    }

    let mut canvas = Bitmap::new(width, height);
    for tile in tiles {
        let x = i64::from(tile.x) - min_x;
        let y = i64::from(tile.y) - min_y;
        let rgb = DynamicImage::ImageRgba8(tile.image).to_rgb8();
        imageops::replace(&mut canvas, &rgb, x, y);
    }

    log::debug!("[CAPTURE] Composed virtual desktop {}x{}", width, height);
    Ok(canvas)
}

#[derive(Debug, thiserror::Error)]
pub enum GrabError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitors attached")]
    NoMonitors,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 128]))
    }

    #[test]
    fn single_monitor_is_passed_through_as_rgb() {
        let tiles = vec![MonitorTile { x: 0, y: 0, image: solid(4, 3, 200) }];
        let desktop = compose_virtual_desktop(tiles).unwrap();
        assert_eq!(desktop.dimensions(), (4, 3));
        assert_eq!(*desktop.get_pixel(3, 2), Rgb([200, 200, 200]));
    }

    #[test]
    fn side_by_side_monitors_span_the_union() {
        let tiles = vec![
            MonitorTile { x: 0, y: 0, image: solid(10, 8, 50) },
            MonitorTile { x: 10, y: 2, image: solid(6, 4, 90) },
        ];
        let desktop = compose_virtual_desktop(tiles).unwrap();
        assert_eq!(desktop.dimensions(), (16, 8));
        assert_eq!(*desktop.get_pixel(12, 3), Rgb([90, 90, 90]));
        // Gap below the short monitor stays black.
        assert_eq!(*desktop.get_pixel(12, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn negative_origins_shift_onto_the_canvas() {
        let tiles = vec![
            MonitorTile { x: -5, y: -5, image: solid(5, 5, 30) },
            MonitorTile { x: 0, y: 0, image: solid(5, 5, 60) },
        ];
        let desktop = compose_virtual_desktop(tiles).unwrap();
        assert_eq!(desktop.dimensions(), (10, 10));
        assert_eq!(*desktop.get_pixel(0, 0), Rgb([30, 30, 30]));
        assert_eq!(*desktop.get_pixel(9, 9), Rgb([60, 60, 60]));
    }

    #[test]
    fn no_monitors_is_an_error() {
        let result = compose_virtual_desktop(Vec::new());
        assert!(matches!(result, Err(GrabError::NoMonitors)));
    }

    #[test]
    fn hidpi_primary_is_not_overwritten_by_its_neighbour() {
        // 2x primary, 1440x900 points; 1x neighbour placed right of it.
        let scale = max_scale_factor([2.0, 1.0]);
        assert_eq!(scale, 2.0);

        let (px, py) = scale_origin(0, 0, scale);
        let (nx, ny) = scale_origin(1440, 0, scale);
        assert_eq!((nx, ny), (2880, 0));

        let tiles = vec![
            MonitorTile { x: px, y: py, image: solid(2880, 1800, 70) },
            MonitorTile { x: nx, y: ny, image: solid(1920, 1080, 140) },
        ];
        let desktop = compose_virtual_desktop(tiles).unwrap();

        assert_eq!(desktop.dimensions(), (4800, 1800));
        assert_eq!(*desktop.get_pixel(2000, 100), Rgb([70, 70, 70]));
        assert_eq!(*desktop.get_pixel(2879, 1799), Rgb([70, 70, 70]));
        assert_eq!(*desktop.get_pixel(3000, 100), Rgb([140, 140, 140]));
    }

    #[test]
    fn scale_factor_never_drops_below_one() {
        assert_eq!(max_scale_factor([]), 1.0);
        assert_eq!(max_scale_factor([0.5, f32::NAN]), 1.0);
        assert_eq!(scale_origin(-1440, 300, 1.5), (-2160, 450));
    }
}
