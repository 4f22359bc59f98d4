// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: dataset/annotation-set selection, item navigation, active
//! class, and the explicit save control.

use crate::models::workspace::Workspace;
use crate::ui::canvas::parse_hex_color;

/// Toolbar interactions the app has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    SelectDataset(i64),
    SelectSet(i64),
    PrevItem,
    NextItem,
    Save,
}

pub fn show(
    ui: &mut egui::Ui,
    workspace: &Workspace,
    current_dataset: Option<i64>,
    current_set: Option<i64>,
    item_position: Option<(usize, usize)>,
    active_class: &mut i64,
    dirty: bool,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Dataset:");
        let dataset_name = current_dataset
            .and_then(|id| workspace.dataset_by_id(id))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "—".to_string());
        egui::ComboBox::from_id_source("dataset_select")
            .selected_text(dataset_name)
            .show_ui(ui, |ui| {
                for dataset in &workspace.datasets {
                    if ui
                        .selectable_label(current_dataset == Some(dataset.id), &dataset.name)
                        .clicked()
                    {
                        action = ToolbarAction::SelectDataset(dataset.id);
                    }
                }
            });

        ui.label("Set:");
        let set_name = current_set
            .and_then(|id| workspace.annotation_sets.iter().find(|s| s.id == id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "—".to_string());
        egui::ComboBox::from_id_source("set_select")
            .selected_text(set_name)
            .show_ui(ui, |ui| {
                for set in &workspace.annotation_sets {
                    let label = format!("{} ({})", set.name, set.source);
                    if ui
                        .selectable_label(current_set == Some(set.id), label)
                        .clicked()
                    {
                        action = ToolbarAction::SelectSet(set.id);
                    }
                }
            });

        ui.separator();

        if ui.button("◀").clicked() {
            action = ToolbarAction::PrevItem;
        }
        match item_position {
            Some((index, count)) => ui.label(format!("{} / {}", index + 1, count)),
            None => ui.label("– / –"),
        };
        if ui.button("▶").clicked() {
            action = ToolbarAction::NextItem;
        }

        ui.separator();

        ui.label("Class:");
        let class_name = workspace
            .class_by_id(*active_class)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "—".to_string());
        egui::ComboBox::from_id_source("active_class_select")
            .selected_text(class_name)
            .show_ui(ui, |ui| {
                for class in workspace.sorted_classes() {
                    let text = egui::RichText::new(&class.name).color(parse_hex_color(&class.color));
                    if ui.selectable_label(*active_class == class.id, text).clicked() {
                        *active_class = class.id;
                    }
                }
            });

        ui.separator();

        if ui.button("Save (Ctrl+S)").clicked() {
            action = ToolbarAction::Save;
        }
        if dirty {
            ui.label(egui::RichText::new("unsaved changes").italics().weak());
        }
    });

    action
}
