// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing session for one image: the pointer-gesture state machine.
//!
//! An [`EditorSession`] exclusively owns the in-memory annotation list,
//! the selection, and any gesture in flight (drawing a new box or
//! transforming an existing one). All coordinates entering this module are
//! already in image space; the host canvas converts pointer positions
//! through the session's [`ViewportTransform`] first.
//!
//! Geometry invariants enforced here: a committed box always lies inside
//! `[0, image_w] x [0, image_h]` and both its edges measure at least the
//! minimum size (a screen-pixel threshold converted through the viewport
//! scale). Edits that would violate them are silently rejected and the
//! last valid geometry kept.

use crate::editor::viewport::ViewportTransform;
use crate::models::annotation::{BoxAnnotation, BoxGeometry};

/// Resize handle on a selected box: four corners and four edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::North,
        Handle::NorthEast,
        Handle::East,
        Handle::SouthEast,
        Handle::South,
        Handle::SouthWest,
        Handle::West,
    ];

    /// Position of this handle on `geometry`, in image space.
    pub fn position(&self, geometry: &BoxGeometry) -> (f64, f64) {
        let cx = geometry.x + geometry.w / 2.0;
        let cy = geometry.y + geometry.h / 2.0;
        match self {
            Handle::NorthWest => (geometry.x, geometry.y),
            Handle::North => (cx, geometry.y),
            Handle::NorthEast => (geometry.right(), geometry.y),
            Handle::East => (geometry.right(), cy),
            Handle::SouthEast => (geometry.right(), geometry.bottom()),
            Handle::South => (cx, geometry.bottom()),
            Handle::SouthWest => (geometry.x, geometry.bottom()),
            Handle::West => (geometry.x, cy),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TransformMode {
    Move,
    Resize(Handle),
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Drawing {
        anchor: (f64, f64),
        draft: BoxGeometry,
    },
    Transforming {
        index: usize,
        mode: TransformMode,
        original: BoxGeometry,
        proposed: BoxGeometry,
    },
}

/// Editing state for the currently active image item.
///
/// Created fresh on every navigation; the annotation list it owns is
/// replaced wholesale when a load completes.
pub struct EditorSession {
    image_w: f64,
    image_h: f64,
    viewport: ViewportTransform,
    annotations: Vec<BoxAnnotation>,
    selected: Option<usize>,
    gesture: Gesture,
    active_class: i64,
    dirty: bool,
}

impl EditorSession {
    /// Session for an item, fitted to the default canvas bounds.
    pub fn new(image_w: f64, image_h: f64) -> Self {
        Self::with_viewport(
            image_w,
            image_h,
            ViewportTransform::fit_default(image_w, image_h),
        )
    }

    pub fn with_viewport(image_w: f64, image_h: f64, viewport: ViewportTransform) -> Self {
        Self {
            image_w,
            image_h,
            viewport,
            annotations: Vec::new(),
            selected: None,
            gesture: Gesture::Idle,
            active_class: 0,
            dirty: false,
        }
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn image_size(&self) -> (f64, f64) {
        (self.image_w, self.image_h)
    }

    pub fn annotations(&self) -> &[BoxAnnotation] {
        &self.annotations
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn active_class(&self) -> i64 {
        self.active_class
    }

    pub fn set_active_class(&mut self, class_id: i64) {
        self.active_class = class_id;
    }

    /// Unsaved edits since the last load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the list wholesale (load path). Clears selection and any
    /// gesture in flight.
    pub fn replace_annotations(&mut self, annotations: Vec<BoxAnnotation>) {
        self.annotations = annotations;
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.dirty = false;
    }

    /// Draft rectangle of an in-flight draw gesture, for rendering.
    pub fn draft(&self) -> Option<BoxGeometry> {
        match &self.gesture {
            Gesture::Drawing { draft, .. } => Some(*draft),
            _ => None,
        }
    }

    /// Geometry to render for a box: the live proposal while that box is
    /// being transformed, its committed geometry otherwise.
    pub fn displayed_geometry(&self, index: usize) -> Option<BoxGeometry> {
        match &self.gesture {
            Gesture::Transforming {
                index: i, proposed, ..
            } if *i == index => Some(*proposed),
            _ => self.annotations.get(index).map(|a| a.geometry()),
        }
    }

    // ---- create ----------------------------------------------------------

    /// Pointer down on empty canvas: clear selection, anchor a 1x1 draft
    /// with the active class.
    pub fn begin_draw(&mut self, pt: (f64, f64)) {
        self.selected = None;
        self.gesture = Gesture::Drawing {
            anchor: pt,
            draft: BoxGeometry::new(pt.0, pt.1, 1.0, 1.0),
        };
    }

    /// Pointer move while drawing: the draft spans anchor and pointer, so
    /// drag direction is irrelevant.
    pub fn update_draw(&mut self, pt: (f64, f64)) {
        if let Gesture::Drawing { anchor, draft } = &mut self.gesture {
            *draft = BoxGeometry::from_corners(anchor.0, anchor.1, pt.0, pt.1);
        }
    }

    /// Pointer up: discard an undersized draft, otherwise clamp and append
    /// as a new unsaved annotation. The new box is not auto-selected.
    pub fn finish_draw(&mut self) -> bool {
        let Gesture::Drawing { draft, .. } =
            std::mem::replace(&mut self.gesture, Gesture::Idle)
        else {
            return false;
        };

        if !draft.meets_min_size(self.viewport.min_box_size()) {
            log::debug!(
                "discarding draft below minimum size ({:.1}x{:.1})",
                draft.w,
                draft.h
            );
            return false;
        }

        let clamped = draft.clamp_to_image(self.image_w, self.image_h);
        self.annotations
            .push(BoxAnnotation::new_draft(self.active_class, clamped));
        self.dirty = true;
        log::info!("added box, total: {}", self.annotations.len());
        true
    }

    // ---- select ----------------------------------------------------------

    /// Select a box (or clear the selection). Discards any draft.
    pub fn select(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            if i >= self.annotations.len() {
                return;
            }
        }
        if matches!(self.gesture, Gesture::Drawing { .. }) {
            self.gesture = Gesture::Idle;
        }
        self.selected = index;
    }

    // ---- transform -------------------------------------------------------

    /// Start dragging the selected box's body.
    pub fn begin_move(&mut self, index: usize) {
        let Some(original) = self.annotations.get(index).map(|a| a.geometry()) else {
            return;
        };
        self.selected = Some(index);
        self.gesture = Gesture::Transforming {
            index,
            mode: TransformMode::Move,
            original,
            proposed: original,
        };
    }

    /// Start dragging a resize handle of the selected box.
    pub fn begin_resize(&mut self, index: usize, handle: Handle) {
        let Some(original) = self.annotations.get(index).map(|a| a.geometry()) else {
            return;
        };
        self.selected = Some(index);
        self.gesture = Gesture::Transforming {
            index,
            mode: TransformMode::Resize(handle),
            original,
            proposed: original,
        };
    }

    /// Pointer moved by an image-space delta during a move drag. The
    /// proposal is clamped live so the box never leaves the image.
    pub fn update_move(&mut self, delta: (f64, f64)) {
        let (image_w, image_h) = (self.image_w, self.image_h);
        if let Gesture::Transforming {
            mode: TransformMode::Move,
            proposed,
            ..
        } = &mut self.gesture
        {
            *proposed = proposed.translated_within(delta.0, delta.1, image_w, image_h);
        }
    }

    /// Pointer at `pt` during a resize drag. The side opposite the grabbed
    /// handle stays fixed; crossing it flips the rectangle.
    pub fn update_resize(&mut self, pt: (f64, f64)) {
        if let Gesture::Transforming {
            mode: TransformMode::Resize(handle),
            original,
            proposed,
            ..
        } = &mut self.gesture
        {
            *proposed = resize_from_handle(original, *handle, pt);
        }
    }

    /// Pointer up after a move/resize drag: clamp the proposal to the
    /// image, re-assert minimum size, and either commit it or restore the
    /// previous geometry.
    pub fn finish_transform(&mut self) -> bool {
        let Gesture::Transforming {
            index, proposed, ..
        } = std::mem::replace(&mut self.gesture, Gesture::Idle)
        else {
            return false;
        };

        let clamped = proposed.clamp_to_image(self.image_w, self.image_h);
        if !clamped.meets_min_size(self.viewport.min_box_size()) {
            log::debug!("rejecting transform below minimum size");
            return false;
        }
        let Some(annotation) = self.annotations.get_mut(index) else {
            return false;
        };
        if annotation.geometry() == clamped {
            return false;
        }
        annotation.set_geometry(clamped);
        self.dirty = true;
        true
    }

    /// Route a pointer move to whatever gesture is in flight. Draw and
    /// resize track the absolute position; move tracks the delta.
    pub fn pointer_moved(&mut self, pos: (f64, f64), delta: (f64, f64)) {
        match &self.gesture {
            Gesture::Drawing { .. } => self.update_draw(pos),
            Gesture::Transforming {
                mode: TransformMode::Move,
                ..
            } => self.update_move(delta),
            Gesture::Transforming {
                mode: TransformMode::Resize(_),
                ..
            } => self.update_resize(pos),
            Gesture::Idle => {}
        }
    }

    /// Route a pointer release: commit the draw or transform in flight.
    pub fn pointer_released(&mut self) -> bool {
        match self.gesture {
            Gesture::Drawing { .. } => self.finish_draw(),
            Gesture::Transforming { .. } => self.finish_transform(),
            Gesture::Idle => false,
        }
    }

    /// Abandon any gesture in flight without committing it.
    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    // ---- list edits ------------------------------------------------------

    /// Remove the selected box; later indices shift down by one. No-op
    /// without a selection.
    pub fn delete_selected(&mut self) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        if index >= self.annotations.len() {
            self.selected = None;
            return false;
        }
        self.annotations.remove(index);
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.dirty = true;
        log::info!("deleted box, total: {}", self.annotations.len());
        true
    }

    /// Reassign a box's class. Leaves selection and gesture untouched.
    pub fn set_class(&mut self, index: usize, class_id: i64) {
        if let Some(annotation) = self.annotations.get_mut(index) {
            if annotation.class_id != class_id {
                annotation.class_id = class_id;
                self.dirty = true;
            }
        }
    }

    /// Flip a box's approved flag. Leaves selection and gesture untouched.
    pub fn set_approved(&mut self, index: usize, approved: bool) {
        if let Some(annotation) = self.annotations.get_mut(index) {
            if annotation.approved != approved {
                annotation.approved = approved;
                self.dirty = true;
            }
        }
    }
}

/// Proposed rectangle for a resize drag: the handle's opposite corner or
/// edge is the fixed anchor, and min/abs arithmetic makes crossing it
/// flip cleanly.
fn resize_from_handle(original: &BoxGeometry, handle: Handle, pt: (f64, f64)) -> BoxGeometry {
    let (px, py) = pt;
    match handle {
        Handle::NorthWest => BoxGeometry::from_corners(original.right(), original.bottom(), px, py),
        Handle::NorthEast => BoxGeometry::from_corners(original.x, original.bottom(), px, py),
        Handle::SouthWest => BoxGeometry::from_corners(original.right(), original.y, px, py),
        Handle::SouthEast => BoxGeometry::from_corners(original.x, original.y, px, py),
        Handle::North => BoxGeometry {
            x: original.x,
            y: py.min(original.bottom()),
            w: original.w,
            h: (original.bottom() - py).abs(),
        },
        Handle::South => BoxGeometry {
            x: original.x,
            y: py.min(original.y),
            w: original.w,
            h: (py - original.y).abs(),
        },
        Handle::West => BoxGeometry {
            x: px.min(original.right()),
            y: original.y,
            w: (original.right() - px).abs(),
            h: original.h,
        },
        Handle::East => BoxGeometry {
            x: px.min(original.x),
            y: original.y,
            w: (px - original.x).abs(),
            h: original.h,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 800x600 image in a 400x300 canvas: scale 0.5, min box size 8 image px.
    fn session() -> EditorSession {
        let mut s = EditorSession::with_viewport(
            800.0,
            600.0,
            ViewportTransform::fit(800.0, 600.0, 400.0, 300.0),
        );
        s.set_active_class(1);
        s
    }

    fn session_with_boxes(geoms: &[(f64, f64, f64, f64)]) -> EditorSession {
        let mut s = session();
        let list = geoms
            .iter()
            .map(|&(x, y, w, h)| BoxAnnotation {
                id: Some(1),
                class_id: 1,
                x,
                y,
                w,
                h,
                confidence: None,
                approved: false,
                attributes: None,
            })
            .collect();
        s.replace_annotations(list);
        s
    }

    fn img(s: &EditorSession, screen: (f64, f64)) -> (f64, f64) {
        s.viewport().to_image(screen)
    }

    #[test]
    fn screen_drag_yields_expected_box() {
        let mut s = session();
        let a = img(&s, (100.0, 100.0));
        let b = img(&s, (300.0, 250.0));
        s.begin_draw(a);
        s.update_draw(b);
        assert!(s.finish_draw());

        let ann = &s.annotations()[0];
        assert_eq!(
            (ann.x, ann.y, ann.w, ann.h),
            (200.0, 200.0, 400.0, 300.0)
        );
        assert_eq!(ann.id, None);
        assert_eq!(ann.class_id, 1);
        assert!(s.is_dirty());
        // The gesture ends without auto-selecting the new box.
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn drag_direction_is_irrelevant() {
        let a = (120.0, 340.0);
        let b = (420.0, 80.0);

        let mut fwd = session();
        fwd.begin_draw(a);
        fwd.update_draw(b);
        fwd.finish_draw();

        let mut rev = session();
        rev.begin_draw(b);
        rev.update_draw(a);
        rev.finish_draw();

        assert_eq!(fwd.annotations()[0].geometry(), rev.annotations()[0].geometry());
    }

    #[test]
    fn undersized_draft_is_discarded() {
        let mut s = session();
        // 3 screen px = 6 image px, below the 8 image-px minimum.
        s.begin_draw((100.0, 100.0));
        s.update_draw((106.0, 200.0));
        assert!(!s.finish_draw());
        assert!(s.annotations().is_empty());
        assert!(!s.is_dirty());
    }

    #[test]
    fn click_without_drag_adds_nothing() {
        let mut s = session();
        s.begin_draw((100.0, 100.0));
        assert!(!s.finish_draw());
        assert!(s.annotations().is_empty());
    }

    #[test]
    fn draft_beyond_bounds_is_clamped_on_commit() {
        let mut s = session();
        s.begin_draw((700.0, 500.0));
        s.update_draw((900.0, 700.0));
        assert!(s.finish_draw());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (700.0, 500.0, 100.0, 100.0));
    }

    #[test]
    fn begin_draw_clears_selection_and_select_clears_draft() {
        let mut s = session_with_boxes(&[(10.0, 10.0, 50.0, 50.0)]);
        s.select(Some(0));
        s.begin_draw((200.0, 200.0));
        assert_eq!(s.selected(), None);
        assert!(s.draft().is_some());

        s.select(Some(0));
        assert!(s.draft().is_none());
        assert_eq!(s.selected(), Some(0));
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut s = session_with_boxes(&[(10.0, 10.0, 50.0, 50.0)]);
        s.select(Some(5));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn move_clamps_live_and_commits() {
        let mut s = session_with_boxes(&[(700.0, 10.0, 80.0, 40.0)]);
        s.begin_move(0);
        s.update_move((100.0, -50.0));
        // Live proposal already clamped.
        let live = s.displayed_geometry(0).unwrap();
        assert_eq!((live.x, live.y), (720.0, 0.0));
        assert!(s.finish_transform());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (720.0, 0.0, 80.0, 40.0));
    }

    #[test]
    fn move_accumulates_deltas() {
        let mut s = session_with_boxes(&[(100.0, 100.0, 50.0, 50.0)]);
        s.begin_move(0);
        s.update_move((10.0, 0.0));
        s.update_move((0.0, 20.0));
        s.finish_transform();

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y), (110.0, 120.0));
    }

    #[test]
    fn resize_from_corner_flips_across_anchor() {
        let mut s = session_with_boxes(&[(100.0, 100.0, 50.0, 50.0)]);
        s.begin_resize(0, Handle::SouthEast);
        // Drag the south-east handle past the north-west corner.
        s.update_resize((60.0, 40.0));
        assert!(s.finish_transform());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (60.0, 40.0, 40.0, 60.0));
    }

    #[test]
    fn resize_edge_keeps_other_axis() {
        let mut s = session_with_boxes(&[(100.0, 100.0, 50.0, 50.0)]);
        s.begin_resize(0, Handle::East);
        s.update_resize((300.0, 999.0));
        assert!(s.finish_transform());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (100.0, 100.0, 200.0, 50.0));
    }

    #[test]
    fn resize_below_min_is_rejected_entirely() {
        let mut s = session_with_boxes(&[(100.0, 100.0, 50.0, 50.0)]);
        s.begin_resize(0, Handle::East);
        // Would leave a 2 image-px wide box; minimum is 8.
        s.update_resize((102.0, 125.0));
        assert!(!s.finish_transform());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (100.0, 100.0, 50.0, 50.0));
        assert!(!s.is_dirty());
    }

    #[test]
    fn resize_past_right_bound_caps_width_without_repositioning() {
        let mut s = session_with_boxes(&[(600.0, 100.0, 100.0, 100.0)]);
        s.begin_resize(0, Handle::East);
        s.update_resize((1000.0, 150.0));
        assert!(s.finish_transform());

        let g = s.annotations()[0].geometry();
        assert_eq!((g.x, g.y, g.w, g.h), (600.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn delete_reindexes_and_clears_selection() {
        let mut s = session_with_boxes(&[
            (0.0, 0.0, 10.0, 10.0),
            (20.0, 0.0, 10.0, 10.0),
            (40.0, 0.0, 10.0, 10.0),
            (60.0, 0.0, 10.0, 10.0),
            (80.0, 0.0, 10.0, 10.0),
        ]);
        s.select(Some(2));
        assert!(s.delete_selected());

        assert_eq!(s.annotations().len(), 4);
        // Former index 3 now sits at index 2.
        assert_eq!(s.annotations()[2].x, 60.0);
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn delete_without_selection_is_a_noop() {
        let mut s = session_with_boxes(&[(0.0, 0.0, 10.0, 10.0)]);
        assert!(!s.delete_selected());
        assert_eq!(s.annotations().len(), 1);
    }

    #[test]
    fn field_edits_do_not_touch_selection() {
        let mut s = session_with_boxes(&[(0.0, 0.0, 10.0, 10.0), (20.0, 0.0, 10.0, 10.0)]);
        s.select(Some(1));
        s.set_class(0, 7);
        s.set_approved(0, true);

        assert_eq!(s.annotations()[0].class_id, 7);
        assert!(s.annotations()[0].approved);
        assert_eq!(s.selected(), Some(1));
        assert!(s.is_dirty());
    }

    #[test]
    fn replace_annotations_resets_session_state() {
        let mut s = session_with_boxes(&[(0.0, 0.0, 10.0, 10.0)]);
        s.select(Some(0));
        s.set_approved(0, true);
        assert!(s.is_dirty());

        s.replace_annotations(Vec::new());
        assert!(s.annotations().is_empty());
        assert_eq!(s.selected(), None);
        assert!(!s.is_dirty());
        assert!(s.draft().is_none());
    }

    #[test]
    fn handle_positions_cover_the_box() {
        let g = BoxGeometry::new(10.0, 20.0, 100.0, 60.0);
        assert_eq!(Handle::NorthWest.position(&g), (10.0, 20.0));
        assert_eq!(Handle::SouthEast.position(&g), (110.0, 80.0));
        assert_eq!(Handle::North.position(&g), (60.0, 20.0));
        assert_eq!(Handle::West.position(&g), (10.0, 50.0));
    }
}
