// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the core data structures for representing
//! bounding-box annotations and their geometry in image-pixel space.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in image pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxGeometry {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanned by two opposite corners, in either drag direction.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            w: (bx - ax).abs(),
            h: (by - ay).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Clamp into `[0, image_w] x [0, image_h]`.
    ///
    /// Position is clamped first; width/height are then capped against the
    /// *new* top-left, so an over-long edge is shortened rather than the
    /// box repositioned.
    pub fn clamp_to_image(&self, image_w: f64, image_h: f64) -> Self {
        let x = self.x.max(0.0).min(image_w);
        let y = self.y.max(0.0).min(image_h);
        Self {
            x,
            y,
            w: self.w.min(image_w - x),
            h: self.h.min(image_h - y),
        }
    }

    /// Translate by (dx, dy), keeping the full box inside the image.
    pub fn translated_within(&self, dx: f64, dy: f64, image_w: f64, image_h: f64) -> Self {
        Self {
            x: (self.x + dx).clamp(0.0, (image_w - self.w).max(0.0)),
            y: (self.y + dy).clamp(0.0, (image_h - self.h).max(0.0)),
            ..*self
        }
    }

    pub fn meets_min_size(&self, min: f64) -> bool {
        self.w >= min && self.h >= min
    }
}

/// A single bounding-box annotation.
///
/// Shape matches the store's wire format: `id` is absent until the box has
/// been persisted, `confidence` is only ever produced by automated
/// annotation sources, and `attributes` is free-form metadata the editor
/// round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub class_id: i64,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl BoxAnnotation {
    /// A freshly drawn, not-yet-persisted box.
    pub fn new_draft(class_id: i64, geometry: BoxGeometry) -> Self {
        Self {
            id: None,
            class_id,
            x: geometry.x,
            y: geometry.y,
            w: geometry.w,
            h: geometry.h,
            confidence: None,
            approved: false,
            attributes: None,
        }
    }

    pub fn geometry(&self) -> BoxGeometry {
        BoxGeometry::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_geometry(&mut self, geometry: BoxGeometry) {
        self.x = geometry.x;
        self.y = geometry.y;
        self.w = geometry.w;
        self.h = geometry.h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_is_direction_independent() {
        let a = BoxGeometry::from_corners(10.0, 20.0, 110.0, 70.0);
        let b = BoxGeometry::from_corners(110.0, 70.0, 10.0, 20.0);
        assert_eq!(a, b);
        assert_eq!(a, BoxGeometry::new(10.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn clamp_caps_size_against_new_origin() {
        let g = BoxGeometry::new(-10.0, 550.0, 300.0, 100.0).clamp_to_image(800.0, 600.0);
        assert_eq!(g.x, 0.0);
        assert_eq!(g.y, 550.0);
        assert_eq!(g.w, 300.0);
        assert_eq!(g.h, 50.0);
    }

    #[test]
    fn translate_never_leaves_image() {
        let g = BoxGeometry::new(700.0, 10.0, 80.0, 40.0);
        let moved = g.translated_within(100.0, -50.0, 800.0, 600.0);
        assert_eq!(moved.x, 720.0);
        assert_eq!(moved.y, 0.0);
        assert_eq!(moved.w, 80.0);
        assert_eq!(moved.h, 40.0);
    }

    #[test]
    fn wire_format_defaults() {
        let json = r#"{"class_id": 3, "x": 1.0, "y": 2.0, "w": 10.0, "h": 20.0}"#;
        let ann: BoxAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.id, None);
        assert_eq!(ann.confidence, None);
        assert!(!ann.approved);
        assert_eq!(ann.attributes, None);

        let out = serde_json::to_string(&ann).unwrap();
        assert!(!out.contains("\"id\""));
        assert!(!out.contains("confidence"));
    }
}
