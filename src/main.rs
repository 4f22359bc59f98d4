// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! BOXBENCH - Bounding-Box Annotation Workstation
//!
//! A cross-platform desktop application for browsing dataset images and
//! drawing, classifying, and approving rectangular bounding-box
//! annotations, persisted per image and annotation set.

mod app;
mod editor;
mod io;
mod models;
mod ui;

use anyhow::Result;
use app::BoxbenchApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("BOXBENCH - Bounding-Box Annotation Workstation"),
        ..Default::default()
    };

    // Optional workspace directory on the command line
    let workspace_arg = std::env::args().nth(1).map(std::path::PathBuf::from);

    // Run the application
    eframe::run_native(
        "BOXBENCH",
        options,
        Box::new(move |_cc| {
            let mut app = BoxbenchApp::new();
            if let Some(path) = workspace_arg {
                app.open_workspace(path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
