// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and box annotation.
//!
//! Renders the scaled image, the committed boxes, the live draft or
//! transform proposal, and the resize handles of the selected box. Pointer
//! activity is reported back as a [`CanvasAction`]; the canvas itself
//! never mutates the session.

use crate::editor::session::{EditorSession, Handle};
use crate::models::workspace::Workspace;

/// Half-size of a rendered handle square, in screen pixels.
const HANDLE_HALF: f32 = 3.5;
/// Pointer distance at which a handle wins the hit test.
const HANDLE_HIT_RADIUS: f32 = 6.0;

/// Result of canvas interaction, in image-space coordinates.
pub enum CanvasAction {
    None,
    /// Primary button pressed over empty image area.
    PressEmpty { image_pos: (f64, f64) },
    /// Primary button pressed inside an existing box.
    PressBox { index: usize },
    /// Primary button pressed on a resize handle of the selected box.
    PressHandle { handle: Handle },
    /// Pointer moved while the primary button is held.
    Drag {
        image_pos: (f64, f64),
        image_delta: (f64, f64),
    },
    /// Primary button released.
    Release,
}

/// Display the canvas and translate pointer events.
///
/// Returns the pointer actions for this frame in order. A drag that
/// begins reports the press (at the press origin, not the position where
/// the drag threshold was crossed) followed by the first move; a plain
/// click reports a press immediately followed by a release.
pub fn show(
    ui: &mut egui::Ui,
    session: Option<&EditorSession>,
    workspace: Option<&Workspace>,
    texture: Option<&egui::TextureHandle>,
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        let available = ui.available_size();
        let (response, painter) =
            ui.allocate_painter(available, egui::Sense::click_and_drag());

        painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(40));

        let Some(session) = session else {
            show_welcome(&painter, response.rect);
            return;
        };

        let (image_w, image_h) = session.image_size();
        let (canvas_w, canvas_h) = session.viewport().canvas_size(image_w, image_h);
        let canvas_size = egui::vec2(canvas_w as f32, canvas_h as f32);

        // Center the scaled image in the available area.
        let offset = (response.rect.size() - canvas_size) / 2.0;
        let image_rect = egui::Rect::from_min_size(
            response.rect.min + egui::vec2(offset.x.max(0.0), offset.y.max(0.0)),
            canvas_size,
        );

        match texture {
            Some(texture) => painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            ),
            // Declared dimensions still define the editing area while the
            // bitmap is loading or failed to decode.
            None => painter.rect_filled(image_rect, 0.0, egui::Color32::from_gray(60)),
        };

        draw_boxes(&painter, session, workspace, &image_rect);

        let scale = session.viewport().scale();
        let to_image = |pos: egui::Pos2| {
            session.viewport().to_image((
                (pos.x - image_rect.min.x) as f64,
                (pos.y - image_rect.min.y) as f64,
            ))
        };

        if let Some(hover) = response.hover_pos() {
            update_cursor(ui, session, &image_rect, hover);
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = ui
                .ctx()
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(origin) = origin {
                actions.push(classify_press(session, &image_rect, origin, to_image(origin)));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let delta = response.drag_delta();
                actions.push(CanvasAction::Drag {
                    image_pos: to_image(pos),
                    image_delta: ((delta.x as f64) / scale, (delta.y as f64) / scale),
                });
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            actions.push(CanvasAction::Release);
        }

        // A plain click never crosses the drag threshold: deliver it as an
        // immediate press/release pair (selects a box, or clears the
        // selection via a draft that dies below minimum size).
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                actions.push(classify_press(session, &image_rect, pos, to_image(pos)));
                actions.push(CanvasAction::Release);
            }
        }
    });

    actions
}

/// Decide what a press landed on: a handle of the selected box, an
/// existing box (topmost first), or empty image area.
fn classify_press(
    session: &EditorSession,
    image_rect: &egui::Rect,
    screen_pos: egui::Pos2,
    image_pos: (f64, f64),
) -> CanvasAction {
    if let Some(handle) = handle_at(session, image_rect, screen_pos) {
        return CanvasAction::PressHandle { handle };
    }
    for index in (0..session.annotations().len()).rev() {
        if let Some(geometry) = session.displayed_geometry(index) {
            if geometry.contains(image_pos.0, image_pos.1) {
                return CanvasAction::PressBox { index };
            }
        }
    }
    if image_rect.contains(screen_pos) {
        return CanvasAction::PressEmpty { image_pos };
    }
    CanvasAction::None
}

/// Resize handle of the selected box under the pointer, if any. Handles
/// are attached to the selected box only.
fn handle_at(
    session: &EditorSession,
    image_rect: &egui::Rect,
    screen_pos: egui::Pos2,
) -> Option<Handle> {
    let selected = session.selected()?;
    let geometry = session.displayed_geometry(selected)?;
    for handle in Handle::ALL {
        let (ix, iy) = handle.position(&geometry);
        let (sx, sy) = session.viewport().to_screen((ix, iy));
        let center = image_rect.min + egui::vec2(sx as f32, sy as f32);
        if center.distance(screen_pos) <= HANDLE_HIT_RADIUS {
            return Some(handle);
        }
    }
    None
}

fn update_cursor(
    ui: &egui::Ui,
    session: &EditorSession,
    image_rect: &egui::Rect,
    hover: egui::Pos2,
) {
    let icon = if let Some(handle) = handle_at(session, image_rect, hover) {
        match handle {
            Handle::NorthWest | Handle::SouthEast => egui::CursorIcon::ResizeNwSe,
            Handle::NorthEast | Handle::SouthWest => egui::CursorIcon::ResizeNeSw,
            Handle::North | Handle::South => egui::CursorIcon::ResizeVertical,
            Handle::East | Handle::West => egui::CursorIcon::ResizeHorizontal,
        }
    } else if image_rect.contains(hover) {
        egui::CursorIcon::Crosshair
    } else {
        egui::CursorIcon::Default
    };
    ui.ctx().output_mut(|o| o.cursor_icon = icon);
}

fn draw_boxes(
    painter: &egui::Painter,
    session: &EditorSession,
    workspace: Option<&Workspace>,
    image_rect: &egui::Rect,
) {
    let to_screen_rect = |g: &crate::models::annotation::BoxGeometry| {
        let (min_x, min_y) = session.viewport().to_screen((g.x, g.y));
        let (max_x, max_y) = session.viewport().to_screen((g.right(), g.bottom()));
        egui::Rect::from_min_max(
            image_rect.min + egui::vec2(min_x as f32, min_y as f32),
            image_rect.min + egui::vec2(max_x as f32, max_y as f32),
        )
    };

    for (index, annotation) in session.annotations().iter().enumerate() {
        let Some(geometry) = session.displayed_geometry(index) else {
            continue;
        };
        let rect = to_screen_rect(&geometry);
        let class = workspace.and_then(|w| w.class_by_id(annotation.class_id));
        let color = class
            .map(|c| parse_hex_color(&c.color))
            .unwrap_or(egui::Color32::YELLOW);
        let is_selected = session.selected() == Some(index);

        let stroke_width = if is_selected { 2.5 } else { 1.5 };
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(stroke_width, color));
        if annotation.approved {
            painter.rect_filled(rect, 0.0, color.gamma_multiply(0.12));
        }

        let mut label = class
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("class {}", annotation.class_id));
        if let Some(confidence) = annotation.confidence {
            label = format!("{label} {confidence:.2}");
        }
        painter.text(
            rect.min + egui::vec2(2.0, -2.0),
            egui::Align2::LEFT_BOTTOM,
            label,
            egui::FontId::proportional(12.0),
            color,
        );

        if is_selected {
            draw_handles(painter, session, image_rect, &geometry);
        }
    }

    // Draft under construction.
    if let Some(draft) = session.draft() {
        let rect = to_screen_rect(&draft);
        let color = workspace
            .and_then(|w| w.class_by_id(session.active_class()))
            .map(|c| parse_hex_color(&c.color))
            .unwrap_or(egui::Color32::LIGHT_BLUE);
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.5, color));
        painter.rect_filled(rect, 0.0, color.gamma_multiply(0.15));
    }
}

fn draw_handles(
    painter: &egui::Painter,
    session: &EditorSession,
    image_rect: &egui::Rect,
    geometry: &crate::models::annotation::BoxGeometry,
) {
    for handle in Handle::ALL {
        let (ix, iy) = handle.position(geometry);
        let (sx, sy) = session.viewport().to_screen((ix, iy));
        let center = image_rect.min + egui::vec2(sx as f32, sy as f32);
        let rect = egui::Rect::from_center_size(center, egui::vec2(HANDLE_HALF * 2.0, HANDLE_HALF * 2.0));
        painter.rect_filled(rect, 1.0, egui::Color32::WHITE);
        painter.rect_stroke(rect, 1.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
    }
}

fn show_welcome(painter: &egui::Painter, rect: egui::Rect) {
    painter.text(
        rect.center() - egui::vec2(0.0, 24.0),
        egui::Align2::CENTER_CENTER,
        "BOXBENCH",
        egui::FontId::proportional(32.0),
        egui::Color32::from_gray(200),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 8.0),
        egui::Align2::CENTER_CENTER,
        "Bounding-box annotation workstation",
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(150),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 32.0),
        egui::Align2::CENTER_CENTER,
        "File → Open Workspace... to begin",
        egui::FontId::proportional(13.0),
        egui::Color32::from_gray(130),
    );
}

/// Parse a `#rrggbb` class color, falling back to the default green the
/// catalog uses for unspecified classes.
pub fn parse_hex_color(hex: &str) -> egui::Color32 {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return egui::Color32::from_rgb(r, g, b);
        }
    }
    egui::Color32::from_rgb(0x22, 0xc5, 0x5e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_colors() {
        assert_eq!(parse_hex_color("#ff0000"), egui::Color32::from_rgb(255, 0, 0));
        assert_eq!(parse_hex_color("22c55e"), egui::Color32::from_rgb(0x22, 0xc5, 0x5e));
        // Malformed input falls back instead of panicking.
        assert_eq!(parse_hex_color("#zzz"), egui::Color32::from_rgb(0x22, 0xc5, 0x5e));
    }
}
