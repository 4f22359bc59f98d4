// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Workspace catalog descriptors.
//!
//! This module describes everything the workstation browses but does not
//! edit: the project, its label classes, annotation sets, and the datasets
//! with their image items. The whole catalog is loaded from a single
//! manifest at the workspace root.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default = "default_task_type")]
    pub task_type: String,
}

fn default_task_type() -> String {
    "detection".to_string()
}

/// A label class: supplies the display color and name for a box's
/// `class_id`. The editor never validates `class_id` membership; the store
/// does that on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelClass {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_class_color")]
    pub color: String,
    #[serde(default)]
    pub order_index: i64,
}

fn default_class_color() -> String {
    "#22c55e".to_string()
}

/// A named collection of annotations for a project, distinguishing e.g.
/// manual labeling from model-produced predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_set_source")]
    pub source: String,
}

fn default_set_source() -> String {
    "manual".to_string()
}

/// One image in a dataset. `width`/`height` are the declared image-space
/// bounds used for all clamping, even when the decoded bitmap disagrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetItem {
    pub id: i64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_split")]
    pub split: String,
}

fn default_split() -> String {
    "train".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub items: Vec<DatasetItem>,
}

/// Complete workspace manifest (`workspace.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub project: ProjectInfo,
    #[serde(default)]
    pub classes: Vec<LabelClass>,
    #[serde(default)]
    pub annotation_sets: Vec<AnnotationSet>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

impl Workspace {
    pub fn class_by_id(&self, class_id: i64) -> Option<&LabelClass> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    pub fn dataset_by_id(&self, dataset_id: i64) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == dataset_id)
    }

    /// Classes in display order.
    pub fn sorted_classes(&self) -> Vec<&LabelClass> {
        let mut classes: Vec<&LabelClass> = self.classes.iter().collect();
        classes.sort_by_key(|c| c.order_index);
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_with_defaults() {
        let yaml = r##"
project:
  name: traffic-cams
classes:
  - id: 1
    name: car
    color: "#ef4444"
  - id: 2
    name: pedestrian
    order_index: -1
annotation_sets:
  - id: 10
    name: ground-truth
datasets:
  - id: 5
    name: highway
    items:
      - id: 100
        file_name: frame_0001.jpg
        width: 1920
        height: 1080
"##;
        let ws: Workspace = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ws.project.task_type, "detection");
        assert_eq!(ws.classes[1].color, "#22c55e");
        assert_eq!(ws.annotation_sets[0].source, "manual");
        assert_eq!(ws.datasets[0].items[0].split, "train");

        let ordered = ws.sorted_classes();
        assert_eq!(ordered[0].name, "pedestrian");
        assert_eq!(ws.class_by_id(1).unwrap().name, "car");
    }
}
