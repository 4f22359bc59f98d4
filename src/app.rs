// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait, coordinating the workspace catalog, the editor
//! session for the active item, and background load/save against the
//! annotation store.

use crate::editor::session::EditorSession;
use crate::io::media::LoadedImage;
use crate::io::store::{self, AnnotationStore, JsonStore};
use crate::models::annotation::BoxAnnotation;
use crate::models::workspace::{DatasetItem, Workspace};
use crate::ui::{canvas, properties, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Result of a background store round-trip.
///
/// Every event carries the navigation generation it was issued under;
/// events from a superseded generation are discarded, so the displayed
/// list always matches the currently selected (item, set) pair.
enum IoEvent {
    Loaded {
        generation: u64,
        image: Result<LoadedImage, String>,
        annotations: Result<Vec<BoxAnnotation>, String>,
    },
    Saved {
        generation: u64,
        result: Result<(), String>,
    },
}

/// Main application state.
pub struct BoxbenchApp {
    /// Workspace catalog (projects, classes, sets, datasets)
    workspace: Option<Workspace>,

    /// Annotation store for the open workspace
    store: Option<Arc<JsonStore>>,

    /// Currently selected dataset / annotation set / item index
    current_dataset: Option<i64>,
    current_set: Option<i64>,
    current_item: Option<usize>,

    /// Editing state for the active item
    session: Option<EditorSession>,

    /// Class assigned to newly drawn boxes
    active_class: i64,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Background I/O plumbing
    io_tx: Sender<IoEvent>,
    io_rx: Receiver<IoEvent>,
    generation: u64,
    loading: bool,
    saving: bool,

    /// Status line message (errors and confirmations)
    status: Option<String>,
}

impl Default for BoxbenchApp {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxbenchApp {
    pub fn new() -> Self {
        let (io_tx, io_rx) = channel();
        Self {
            workspace: None,
            store: None,
            current_dataset: None,
            current_set: None,
            current_item: None,
            session: None,
            active_class: 0,
            image_texture: None,
            io_tx,
            io_rx,
            generation: 0,
            loading: false,
            saving: false,
            status: None,
        }
    }

    /// Open a workspace directory and activate its first item.
    pub fn open_workspace(&mut self, root: PathBuf) {
        match store::load_workspace(&root) {
            Ok(workspace) => {
                log::info!(
                    "opened workspace '{}' ({} classes, {} datasets)",
                    workspace.project.name,
                    workspace.classes.len(),
                    workspace.datasets.len()
                );
                self.store = Some(Arc::new(JsonStore::new(root, &workspace)));
                self.active_class = workspace
                    .sorted_classes()
                    .first()
                    .map(|c| c.id)
                    .unwrap_or(0);
                self.current_dataset = workspace.datasets.first().map(|d| d.id);
                self.current_set = workspace.annotation_sets.first().map(|s| s.id);
                self.workspace = Some(workspace);
                self.current_item = None;
                self.status = None;
                self.goto_item(0);
            }
            Err(e) => {
                log::error!("failed to open workspace: {e:#}");
                self.status = Some(format!("Failed to open workspace: {e:#}"));
            }
        }
    }

    fn current_items(&self) -> Option<&Vec<DatasetItem>> {
        let workspace = self.workspace.as_ref()?;
        let dataset = workspace.dataset_by_id(self.current_dataset?)?;
        Some(&dataset.items)
    }

    fn current_item_descriptor(&self) -> Option<&DatasetItem> {
        self.current_items()?.get(self.current_item?)
    }

    /// Navigate to an item index in the current dataset. Any draft,
    /// selection, and unsaved edits are discarded; the annotation list is
    /// reloaded for the new (item, set) pair.
    fn goto_item(&mut self, index: usize) {
        let Some(items) = self.current_items() else {
            return;
        };
        let Some(item) = items.get(index).cloned() else {
            return;
        };
        let Some(set_id) = self.current_set else {
            self.status = Some("Workspace defines no annotation sets".to_string());
            return;
        };
        let Some(store) = self.store.clone() else {
            return;
        };

        self.current_item = Some(index);
        self.generation += 1;
        self.loading = true;
        self.image_texture = None;
        self.status = None;

        let mut session = EditorSession::new(item.width as f64, item.height as f64);
        session.set_active_class(self.active_class);
        self.session = Some(session);

        let generation = self.generation;
        let image_path = store.image_path(&item.file_name);
        let tx = self.io_tx.clone();
        std::thread::spawn(move || {
            let annotations = store
                .load_annotations(item.id, set_id)
                .map_err(|e| e.to_string());
            let image = crate::io::media::load_image(&image_path).map_err(|e| format!("{e:#}"));
            let _ = tx.send(IoEvent::Loaded {
                generation,
                image,
                annotations,
            });
        });
    }

    fn step_item(&mut self, forward: bool) {
        let Some(index) = self.current_item else {
            return;
        };
        let count = self.current_items().map(|i| i.len()).unwrap_or(0);
        // Clamped stepping, no wraparound.
        if forward && index + 1 < count {
            self.goto_item(index + 1);
        } else if !forward && index > 0 {
            self.goto_item(index - 1);
        }
    }

    fn select_dataset(&mut self, dataset_id: i64) {
        if self.current_dataset == Some(dataset_id) {
            return;
        }
        self.current_dataset = Some(dataset_id);
        // Invalidate the previous item even if the new dataset is empty.
        self.current_item = None;
        self.session = None;
        self.image_texture = None;
        self.generation += 1;
        self.goto_item(0);
    }

    fn select_set(&mut self, set_id: i64) {
        if self.current_set == Some(set_id) {
            return;
        }
        self.current_set = Some(set_id);
        // Same item, different annotation set: reload.
        if let Some(index) = self.current_item {
            self.goto_item(index);
        }
    }

    /// Push the entire in-memory list to the store. Explicit only; a
    /// successful save triggers a fresh load so assigned ids land locally.
    fn save_current(&mut self) {
        if self.loading {
            // The list is being replaced; saving now would push a stale
            // (possibly empty) list for the pair.
            log::warn!("ignoring save while a load is in flight");
            return;
        }
        let (Some(session), Some(store), Some(item), Some(set_id)) = (
            self.session.as_ref(),
            self.store.clone(),
            self.current_item_descriptor(),
            self.current_set,
        ) else {
            return;
        };

        let annotations = session.annotations().to_vec();
        let item_id = item.id;
        let generation = self.generation;
        let tx = self.io_tx.clone();
        self.saving = true;
        self.status = None;

        std::thread::spawn(move || {
            let result = store
                .save_annotations(item_id, set_id, &annotations)
                .map_err(|e| e.to_string());
            let _ = tx.send(IoEvent::Saved { generation, result });
        });
    }

    fn process_io_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.io_rx.try_recv() {
            match event {
                IoEvent::Loaded {
                    generation,
                    image,
                    annotations,
                } => {
                    if generation != self.generation {
                        log::debug!("discarding stale load (generation {generation})");
                        continue;
                    }
                    self.loading = false;

                    match image {
                        Ok(loaded) => {
                            let size = [loaded.width as usize, loaded.height as usize];
                            let color_image =
                                egui::ColorImage::from_rgba_unmultiplied(size, &loaded.pixels);
                            self.image_texture = Some(ctx.load_texture(
                                "item_image",
                                color_image,
                                egui::TextureOptions::LINEAR,
                            ));
                        }
                        Err(e) => {
                            log::error!("image load failed: {e}");
                            self.status = Some(format!("Image load failed: {e}"));
                        }
                    }

                    match annotations {
                        Ok(list) => {
                            if let Some(session) = self.session.as_mut() {
                                log::info!("loaded {} annotations", list.len());
                                session.replace_annotations(list);
                            }
                        }
                        Err(e) => {
                            // Previous list stays untouched.
                            log::error!("annotation load failed: {e}");
                            self.status = Some(e);
                        }
                    }
                }
                IoEvent::Saved { generation, result } => {
                    self.saving = false;
                    match result {
                        Ok(()) => {
                            // Reconcile assigned ids, but only if the user
                            // hasn't navigated away in the meantime.
                            if generation == self.generation {
                                if let Some(index) = self.current_item {
                                    self.goto_item(index);
                                }
                            }
                            self.status = Some("Saved".to_string());
                        }
                        Err(e) => {
                            // In-memory edits stay untouched; no retry.
                            log::error!("save failed: {e}");
                            self.status = Some(e);
                        }
                    }
                }
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Save accelerator works from any state and must suppress the
        // host's default handling for the combination.
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::S)) {
            self.save_current();
        }

        // Only process when no text field is focused.
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.step_item(true);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.step_item(false);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            if let Some(session) = self.session.as_mut() {
                session.delete_selected();
            }
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if let Some(session) = self.session.as_mut() {
                session.cancel_gesture();
                session.select(None);
            }
        }
    }

    fn apply_canvas_actions(&mut self, actions: Vec<canvas::CanvasAction>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for action in actions {
            match action {
                canvas::CanvasAction::PressEmpty { image_pos } => session.begin_draw(image_pos),
                canvas::CanvasAction::PressBox { index } => {
                    if session.selected() == Some(index) {
                        session.begin_move(index);
                    } else {
                        session.select(Some(index));
                    }
                }
                canvas::CanvasAction::PressHandle { handle } => {
                    if let Some(selected) = session.selected() {
                        session.begin_resize(selected, handle);
                    }
                }
                canvas::CanvasAction::Drag {
                    image_pos,
                    image_delta,
                } => session.pointer_moved(image_pos, image_delta),
                canvas::CanvasAction::Release => {
                    session.pointer_released();
                }
                canvas::CanvasAction::None => {}
            }
        }
    }

    fn apply_properties_action(&mut self, action: properties::PropertiesAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            properties::PropertiesAction::Select(index) => session.select(Some(index)),
            properties::PropertiesAction::SetClass(index, class_id) => {
                session.set_class(index, class_id)
            }
            properties::PropertiesAction::SetApproved(index, approved) => {
                session.set_approved(index, approved)
            }
            properties::PropertiesAction::Delete(index) => {
                session.select(Some(index));
                session.delete_selected();
            }
            properties::PropertiesAction::None => {}
        }
    }

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(workspace) = &self.workspace {
                ui.label(
                    egui::RichText::new(format!(
                        "{} ({})",
                        workspace.project.name, workspace.project.task_type
                    ))
                    .strong(),
                );
                ui.separator();
            }
            match self.current_item_descriptor() {
                Some(item) => {
                    ui.label(&item.file_name);
                    ui.separator();
                    ui.label(format!("{}×{}", item.width, item.height));
                    ui.separator();
                    ui.label(&item.split);
                }
                None => {
                    ui.label("No item");
                }
            }
            if let Some(session) = &self.session {
                ui.separator();
                ui.label(format!("{} boxes", session.annotations().len()));
            }
            if self.loading {
                ui.separator();
                ui.spinner();
                ui.label("Loading…");
            }
            if self.saving {
                ui.separator();
                ui.spinner();
                ui.label("Saving…");
            }
            if let Some(status) = &self.status {
                ui.separator();
                let text = if status == "Saved" {
                    egui::RichText::new(status).color(egui::Color32::LIGHT_GREEN)
                } else {
                    egui::RichText::new(status).color(egui::Color32::LIGHT_RED)
                };
                ui.label(text);
            }
        });
    }
}

impl eframe::App for BoxbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_io_events(ctx);

        if self.loading || self.saving {
            ctx.request_repaint();
        }

        self.handle_keyboard(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Workspace...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.open_workspace(path);
                        }
                        ui.close_menu();
                    }
                    let can_save = self.session.is_some();
                    if ui
                        .add_enabled(can_save, egui::Button::new("Save Annotations (Ctrl+S)"))
                        .clicked()
                    {
                        self.save_current();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let has_selection = self
                        .session
                        .as_ref()
                        .and_then(|s| s.selected())
                        .is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        if let Some(session) = self.session.as_mut() {
                            session.delete_selected();
                        }
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        if let Some(workspace) = self.workspace.clone() {
            let item_position = self
                .current_item
                .and_then(|i| self.current_items().map(|items| (i, items.len())));
            let mut active_class = self.active_class;
            let action = egui::TopBottomPanel::top("toolbar")
                .show(ctx, |ui| {
                    toolbar::show(
                        ui,
                        &workspace,
                        self.current_dataset,
                        self.current_set,
                        item_position,
                        &mut active_class,
                        self.session.as_ref().is_some_and(|s| s.is_dirty()),
                    )
                })
                .inner;

            if active_class != self.active_class {
                self.active_class = active_class;
                if let Some(session) = self.session.as_mut() {
                    session.set_active_class(active_class);
                }
            }

            match action {
                toolbar::ToolbarAction::SelectDataset(id) => self.select_dataset(id),
                toolbar::ToolbarAction::SelectSet(id) => self.select_set(id),
                toolbar::ToolbarAction::PrevItem => self.step_item(false),
                toolbar::ToolbarAction::NextItem => self.step_item(true),
                toolbar::ToolbarAction::Save => self.save_current(),
                toolbar::ToolbarAction::None => {}
            }
        }

        // Box list panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| {
                properties::show(ui, self.session.as_ref(), self.workspace.as_ref())
            })
            .inner;
        self.apply_properties_action(properties_action);

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status_bar(ui);
        });

        // Main canvas (center)
        let canvas_actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    self.session.as_ref(),
                    self.workspace.as_ref(),
                    self.image_texture.as_ref(),
                )
            })
            .inner;
        self.apply_canvas_actions(canvas_actions);
    }
}
