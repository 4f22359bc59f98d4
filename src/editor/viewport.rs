// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewport transform between screen and image coordinates.
//!
//! This module computes the scale factor that fits an image's native pixel
//! dimensions into a bounded canvas area and converts pointer coordinates
//! between the two spaces.

/// Maximum on-screen canvas size the image is fitted into.
pub const MAX_CANVAS_WIDTH: f64 = 960.0;
pub const MAX_CANVAS_HEIGHT: f64 = 640.0;

/// Minimum accepted box edge, in screen pixels.
pub const MIN_BOX_SCREEN_PX: f64 = 4.0;

/// Uniform scale mapping image pixels onto the canvas.
///
/// Computed once per image and held constant for every gesture on that
/// image, so converting a pointer position and converting it back is exact
/// and order-independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    scale: f64,
}

impl ViewportTransform {
    /// Largest scale that fits `image_w x image_h` within `max_w x max_h`
    /// on both axes. Exceeds 1.0 for images smaller than the canvas.
    pub fn fit(image_w: f64, image_h: f64, max_w: f64, max_h: f64) -> Self {
        Self {
            scale: (max_w / image_w).min(max_h / image_h),
        }
    }

    /// Fit against the default canvas bounds.
    pub fn fit_default(image_w: f64, image_h: f64) -> Self {
        Self::fit(image_w, image_h, MAX_CANVAS_WIDTH, MAX_CANVAS_HEIGHT)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// On-screen size of the scaled image.
    pub fn canvas_size(&self, image_w: f64, image_h: f64) -> (f64, f64) {
        (image_w * self.scale, image_h * self.scale)
    }

    pub fn to_image(&self, screen: (f64, f64)) -> (f64, f64) {
        (screen.0 / self.scale, screen.1 / self.scale)
    }

    pub fn to_screen(&self, image: (f64, f64)) -> (f64, f64) {
        (image.0 * self.scale, image.1 * self.scale)
    }

    /// Minimum accepted box edge in image pixels.
    pub fn min_box_size(&self) -> f64 {
        MIN_BOX_SCREEN_PX / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_picks_the_tighter_axis() {
        let vt = ViewportTransform::fit(800.0, 600.0, 400.0, 300.0);
        assert_eq!(vt.scale(), 0.5);

        // Wide image: width is the constraint.
        let wide = ViewportTransform::fit(2000.0, 500.0, 400.0, 300.0);
        assert_eq!(wide.scale(), 0.2);

        // Small image scales up.
        let small = ViewportTransform::fit(100.0, 100.0, 400.0, 300.0);
        assert_eq!(small.scale(), 3.0);
    }

    #[test]
    fn pointer_mapping_matches_scale() {
        let vt = ViewportTransform::fit(800.0, 600.0, 400.0, 300.0);
        assert_eq!(vt.to_image((100.0, 100.0)), (200.0, 200.0));
        assert_eq!(vt.to_image((300.0, 250.0)), (600.0, 500.0));
        assert_eq!(vt.to_screen((600.0, 500.0)), (300.0, 250.0));
    }

    #[test]
    fn roundtrip_is_exact_for_representable_points() {
        let vt = ViewportTransform::fit(800.0, 600.0, 400.0, 300.0);
        for p in [(0.0, 0.0), (128.0, 64.0), (399.5, 299.25)] {
            assert_eq!(vt.to_screen(vt.to_image(p)), p);
        }
    }

    #[test]
    fn min_box_size_converts_through_scale() {
        let vt = ViewportTransform::fit(800.0, 600.0, 400.0, 300.0);
        assert_eq!(vt.min_box_size(), 8.0);
    }

    #[test]
    fn canvas_size_fits_bounds() {
        let vt = ViewportTransform::fit(1920.0, 1080.0, 960.0, 640.0);
        let (w, h) = vt.canvas_size(1920.0, 1080.0);
        assert!(w <= 960.0 && h <= 640.0);
        assert_eq!(w, 960.0);
    }
}
