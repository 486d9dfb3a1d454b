//! Scale-to-fit geometry between the overlay surface and the frozen frame.

use serde::Serialize;

/// A rectangle in overlay (display) coordinates.
///
/// Corners are stored as given; call [`DisplayRect::normalized`] before
/// treating `(x0, y0)` as the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl DisplayRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Swaps corners so that `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(&self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }
}

/// Uniform scale and centring offsets that fit a source frame on a surface.
///
/// One scale factor is used for both axes, so the displayed image is never
/// distorted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFit {
    pub scale: f64,
    pub offset_x: i32,
    pub offset_y: i32,
    pub display_width: u32,
    pub display_height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl ScaleFit {
    /// Computes the fit, or `None` when either side has no area.
    pub fn compute(
        surface_width: u32,
        surface_height: u32,
        source_width: u32,
        source_height: u32,
    ) -> Option<Self> {
        if surface_width == 0 || surface_height == 0 || source_width == 0 || source_height == 0 {
            return None;
        }

        let scale = (f64::from(surface_width) / f64::from(source_width))
            .min(f64::from(surface_height) / f64::from(source_height));

        // Truncation keeps the image inside the surface even when the float
        // product lands a hair above it.
        let display_width = ((f64::from(source_width) * scale) as u32).clamp(1, surface_width);
        let display_height = ((f64::from(source_height) * scale) as u32).clamp(1, surface_height);

        Some(Self {
            scale,
            offset_x: ((surface_width - display_width) / 2) as i32,
            offset_y: ((surface_height - display_height) / 2) as i32,
            display_width,
            display_height,
            source_width,
            source_height,
        })
    }

    /// The area of the surface covered by the displayed image.
    pub fn display_bounds(&self) -> DisplayRect {
        let left = f64::from(self.offset_x);
        let top = f64::from(self.offset_y);
        DisplayRect::new(
            left,
            top,
            left + f64::from(self.display_width),
            top + f64::from(self.display_height),
        )
    }

    /// Pins a surface point onto the displayed image.
    pub fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
        let bounds = self.display_bounds();
        (x.clamp(bounds.x0, bounds.x1), y.clamp(bounds.y0, bounds.y1))
    }

    /// Clamps both corners of a drag onto the displayed image.
    pub fn clamp_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> DisplayRect {
        let (x0, y0) = self.clamp_point(x0, y0);
        let (x1, y1) = self.clamp_point(x1, y1);
        DisplayRect::new(x0, y0, x1, y1)
    }

    /// Maps a surface point back to source pixels, truncating and clamping
    /// into `[0, source_width] x [0, source_height]`.
    pub fn to_source(&self, x: f64, y: f64) -> (u32, u32) {
        let sx = ((x - f64::from(self.offset_x)) / self.scale) as i64;
        let sy = ((y - f64::from(self.offset_y)) / self.scale) as i64;
        (
            sx.clamp(0, i64::from(self.source_width)) as u32,
            sy.clamp(0, i64::from(self.source_height)) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_source_is_letterboxed() {
        let fit = ScaleFit::compute(1000, 1000, 2000, 1000).unwrap();
        assert_eq!(fit.scale, 0.5);
        assert_eq!((fit.display_width, fit.display_height), (1000, 500));
        assert_eq!((fit.offset_x, fit.offset_y), (0, 250));
    }

    #[test]
    fn tall_source_is_pillarboxed() {
        let fit = ScaleFit::compute(1920, 1080, 1080, 1920).unwrap();
        assert_eq!(fit.scale, 1080.0 / 1920.0);
        assert_eq!(fit.display_height, 1080);
        assert_eq!(fit.display_width, 607);
        assert_eq!(fit.offset_x, (1920 - 607) / 2);
        assert_eq!(fit.offset_y, 0);
    }

    #[test]
    fn smaller_source_is_scaled_up() {
        let fit = ScaleFit::compute(800, 600, 400, 300).unwrap();
        assert_eq!(fit.scale, 2.0);
        assert_eq!((fit.display_width, fit.display_height), (800, 600));
    }

    #[test]
    fn scale_is_the_smaller_ratio_and_image_fits() {
        let surfaces = [(1920, 1080), (1366, 768), (800, 1280), (3, 7), (1, 1)];
        let sources = [(3840, 1080), (1920, 1080), (1080, 1920), (17, 5), (1, 9999)];

        for &(sw, sh) in &surfaces {
            for &(iw, ih) in &sources {
                let fit = ScaleFit::compute(sw, sh, iw, ih).unwrap();
                let expected = (f64::from(sw) / f64::from(iw)).min(f64::from(sh) / f64::from(ih));
                assert_eq!(fit.scale, expected);
                assert!(fit.offset_x >= 0 && fit.offset_y >= 0);
                assert!(fit.offset_x as u32 + fit.display_width <= sw, "{sw}x{sh} <- {iw}x{ih}");
                assert!(fit.offset_y as u32 + fit.display_height <= sh, "{sw}x{sh} <- {iw}x{ih}");
            }
        }
    }

    #[test]
    fn zero_sized_inputs_have_no_fit() {
        assert!(ScaleFit::compute(0, 100, 10, 10).is_none());
        assert!(ScaleFit::compute(100, 100, 10, 0).is_none());
    }

    #[test]
    fn to_source_removes_offset_and_scale() {
        let fit = ScaleFit::compute(1000, 1000, 2000, 1000).unwrap();
        assert_eq!(fit.to_source(0.0, 250.0), (0, 0));
        assert_eq!(fit.to_source(500.0, 500.0), (1000, 500));
        assert_eq!(fit.to_source(1000.0, 750.0), (2000, 1000));
    }

    #[test]
    fn to_source_clamps_outside_points() {
        let fit = ScaleFit::compute(1000, 1000, 2000, 1000).unwrap();
        assert_eq!(fit.to_source(-40.0, 0.0), (0, 0));
        assert_eq!(fit.to_source(5000.0, 5000.0), (2000, 1000));
    }

    #[test]
    fn clamp_rect_stays_on_image() {
        let fit = ScaleFit::compute(1000, 1000, 2000, 1000).unwrap();
        let rect = fit.clamp_rect(-10.0, 100.0, 1200.0, 900.0);
        assert_eq!(rect, DisplayRect::new(0.0, 250.0, 1000.0, 750.0));
    }

    #[test]
    fn normalized_orders_corners() {
        let rect = DisplayRect::new(30.0, 40.0, 10.0, 5.0).normalized();
        assert_eq!(rect, DisplayRect::new(10.0, 5.0, 30.0, 40.0));
    }
}
