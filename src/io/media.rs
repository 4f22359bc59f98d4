// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading.
//!
//! Decodes an item's image file into RGBA pixels suitable for an egui
//! texture. The decoded size is only used for display; clamping always
//! uses the item's declared dimensions from the manifest.

use anyhow::{Context, Result};
use std::path::Path;

/// A decoded bitmap ready for texture upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgba8();
    Ok(LoadedImage {
        width: img.width(),
        height: img.height(),
        pixels: img.into_raw(),
    })
}
