// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box list panel.
//!
//! Lists every box on the current item and exposes the per-box edits that
//! bypass the gesture state machine: class reassignment, the approved
//! flag, and deletion. Edits apply to the in-memory list immediately.

use crate::editor::session::EditorSession;
use crate::models::workspace::Workspace;
use crate::ui::canvas::parse_hex_color;

/// Result of interacting with the panel.
pub enum PropertiesAction {
    None,
    Select(usize),
    SetClass(usize, i64),
    SetApproved(usize, bool),
    Delete(usize),
}

pub fn show(
    ui: &mut egui::Ui,
    session: Option<&EditorSession>,
    workspace: Option<&Workspace>,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Boxes");
    ui.separator();

    let Some(session) = session else {
        ui.label(egui::RichText::new("No item loaded").weak());
        return action;
    };

    if session.annotations().is_empty() {
        ui.label(egui::RichText::new("No boxes yet — drag on the image to draw one").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, annotation) in session.annotations().iter().enumerate() {
            let selected = session.selected() == Some(index);
            let class = workspace.and_then(|w| w.class_by_id(annotation.class_id));
            let color = class
                .map(|c| parse_hex_color(&c.color))
                .unwrap_or(egui::Color32::YELLOW);

            let title = format!(
                "#{index} {}",
                class.map(|c| c.name.as_str()).unwrap_or("?")
            );
            let header = ui.selectable_label(
                selected,
                egui::RichText::new(title).color(color).strong(),
            );
            if header.clicked() {
                action = PropertiesAction::Select(index);
            }

            ui.horizontal(|ui| {
                let mut class_id = annotation.class_id;
                egui::ComboBox::from_id_source(("box_class", index))
                    .selected_text(class.map(|c| c.name.clone()).unwrap_or_else(|| {
                        format!("class {}", annotation.class_id)
                    }))
                    .show_ui(ui, |ui| {
                        if let Some(workspace) = workspace {
                            for class in workspace.sorted_classes() {
                                ui.selectable_value(&mut class_id, class.id, &class.name);
                            }
                        }
                    });
                if class_id != annotation.class_id {
                    action = PropertiesAction::SetClass(index, class_id);
                }

                let mut approved = annotation.approved;
                if ui.checkbox(&mut approved, "approved").changed() {
                    action = PropertiesAction::SetApproved(index, approved);
                }

                if ui.button("🗑").clicked() {
                    action = PropertiesAction::Delete(index);
                }
            });

            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!(
                        "x {:.0}  y {:.0}  w {:.0}  h {:.0}",
                        annotation.x, annotation.y, annotation.w, annotation.h
                    ))
                    .weak()
                    .small(),
                );
                if let Some(confidence) = annotation.confidence {
                    ui.label(
                        egui::RichText::new(format!("conf {confidence:.2}"))
                            .weak()
                            .small(),
                    );
                }
            });

            ui.separator();
        }
    });

    action
}
