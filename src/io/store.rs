// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation persistence.
//!
//! The editor talks to storage through the [`AnnotationStore`] trait:
//! load the committed list for an (item, annotation-set) pair, or replace
//! it wholesale. [`JsonStore`] implements it over a workspace directory,
//! one JSON document per pair, assigning ids to never-saved boxes the way
//! a database autoincrement would.

use crate::models::annotation::BoxAnnotation;
use crate::models::workspace::Workspace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a store round-trip failed. A load failure leaves the caller's
/// previous list untouched; a save failure leaves the in-memory edits
/// untouched. Neither is retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load annotations for item {item_id} in set {set_id}: {source}")]
    LoadFailure {
        item_id: i64,
        set_id: i64,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to save annotations for item {item_id} in set {set_id}: {source}")]
    SaveFailure {
        item_id: i64,
        set_id: i64,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("cannot save: class id {0} is not defined in this workspace")]
    UnknownClass(i64),
}

/// Gateway to the authoritative annotation lists, keyed by
/// (item, annotation-set). Save replaces the stored list entirely; it is
/// never a diff.
pub trait AnnotationStore: Send + Sync {
    fn load_annotations(&self, item_id: i64, set_id: i64)
        -> Result<Vec<BoxAnnotation>, StoreError>;

    fn save_annotations(
        &self,
        item_id: i64,
        set_id: i64,
        annotations: &[BoxAnnotation],
    ) -> Result<(), StoreError>;
}

/// Read the workspace manifest from `<root>/workspace.yaml`.
pub fn load_workspace(root: &Path) -> Result<Workspace> {
    let path = root.join("workspace.yaml");
    let yaml = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let workspace: Workspace =
        serde_yaml::from_str(&yaml).with_context(|| format!("parsing {}", path.display()))?;
    Ok(workspace)
}

/// On-disk document for one (item, set) pair. `next_id` persists the id
/// counter so ids are never reused, even after deletes.
#[derive(Debug, Serialize, Deserialize)]
struct PairDocument {
    next_id: i64,
    annotations: Vec<BoxAnnotation>,
}

impl Default for PairDocument {
    fn default() -> Self {
        Self {
            next_id: 1,
            annotations: Vec::new(),
        }
    }
}

/// File-backed store over a workspace directory:
///
/// ```text
/// <root>/workspace.yaml
/// <root>/images/<file_name>
/// <root>/annotations/set_<set>/item_<item>.json
/// ```
pub struct JsonStore {
    root: PathBuf,
    known_classes: HashSet<i64>,
}

impl JsonStore {
    pub fn new(root: PathBuf, workspace: &Workspace) -> Self {
        Self {
            root,
            known_classes: workspace.classes.iter().map(|c| c.id).collect(),
        }
    }

    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.root.join("images").join(file_name)
    }

    fn pair_path(&self, item_id: i64, set_id: i64) -> PathBuf {
        self.root
            .join("annotations")
            .join(format!("set_{set_id}"))
            .join(format!("item_{item_id}.json"))
    }

    fn read_pair(&self, item_id: i64, set_id: i64) -> Result<PairDocument> {
        let path = self.pair_path(item_id, set_id);
        if !path.exists() {
            return Ok(PairDocument::default());
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let doc = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(doc)
    }
}

impl AnnotationStore for JsonStore {
    fn load_annotations(
        &self,
        item_id: i64,
        set_id: i64,
    ) -> Result<Vec<BoxAnnotation>, StoreError> {
        self.read_pair(item_id, set_id)
            .map(|doc| doc.annotations)
            .map_err(|e| StoreError::LoadFailure {
                item_id,
                set_id,
                source: e.into(),
            })
    }

    fn save_annotations(
        &self,
        item_id: i64,
        set_id: i64,
        annotations: &[BoxAnnotation],
    ) -> Result<(), StoreError> {
        for annotation in annotations {
            if !self.known_classes.contains(&annotation.class_id) {
                return Err(StoreError::UnknownClass(annotation.class_id));
            }
        }

        let save_err = |e: anyhow::Error| StoreError::SaveFailure {
            item_id,
            set_id,
            source: e.into(),
        };

        let mut doc = self.read_pair(item_id, set_id).map_err(&save_err)?;
        let mut next_id = doc.next_id;
        doc.annotations = annotations
            .iter()
            .map(|a| {
                let mut saved = a.clone();
                saved.id = Some(a.id.unwrap_or_else(|| {
                    let id = next_id;
                    next_id += 1;
                    id
                }));
                saved
            })
            .collect();
        doc.next_id = next_id;

        let path = self.pair_path(item_id, set_id);
        let write = || -> Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let json = serde_json::to_string_pretty(&doc)?;
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            Ok(())
        };
        write().map_err(&save_err)?;

        log::info!(
            "saved {} annotations for item {item_id} in set {set_id}",
            doc.annotations.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::BoxGeometry;
    use crate::models::workspace::{LabelClass, ProjectInfo};

    fn scratch_store(test: &str) -> JsonStore {
        let root = std::env::temp_dir()
            .join("boxbench-store-tests")
            .join(format!("{}-{}", test, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();

        let workspace = Workspace {
            project: ProjectInfo {
                name: "test".into(),
                task_type: "detection".into(),
            },
            classes: vec![
                LabelClass {
                    id: 1,
                    name: "car".into(),
                    color: "#ef4444".into(),
                    order_index: 0,
                },
                LabelClass {
                    id: 2,
                    name: "truck".into(),
                    color: "#3b82f6".into(),
                    order_index: 1,
                },
            ],
            annotation_sets: Vec::new(),
            datasets: Vec::new(),
        };
        JsonStore::new(root, &workspace)
    }

    fn draft(class_id: i64, x: f64) -> BoxAnnotation {
        BoxAnnotation::new_draft(class_id, BoxGeometry::new(x, 10.0, 50.0, 40.0))
    }

    #[test]
    fn missing_pair_loads_empty() {
        let store = scratch_store("missing-pair");
        assert!(store.load_annotations(1, 1).unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrips_with_assigned_ids() {
        let store = scratch_store("roundtrip");
        store
            .save_annotations(7, 3, &[draft(1, 10.0), draft(2, 100.0)])
            .unwrap();

        let loaded = store.load_annotations(7, 3).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, Some(1));
        assert_eq!(loaded[1].id, Some(2));
        assert_eq!(loaded[0].geometry(), BoxGeometry::new(10.0, 10.0, 50.0, 40.0));
        assert_eq!(loaded[1].class_id, 2);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = scratch_store("id-reuse");
        store.save_annotations(1, 1, &[draft(1, 0.0)]).unwrap();
        let first = store.load_annotations(1, 1).unwrap();
        assert_eq!(first[0].id, Some(1));

        // Drop the saved box, add a new one: it must get a fresh id.
        store.save_annotations(1, 1, &[draft(1, 50.0)]).unwrap();
        let second = store.load_annotations(1, 1).unwrap();
        assert_eq!(second[0].id, Some(2));
    }

    #[test]
    fn save_replaces_wholesale() {
        let store = scratch_store("wholesale");
        store
            .save_annotations(1, 1, &[draft(1, 0.0), draft(1, 60.0), draft(1, 120.0)])
            .unwrap();
        let saved = store.load_annotations(1, 1).unwrap();

        store.save_annotations(1, 1, &saved[..1]).unwrap();
        let after = store.load_annotations(1, 1).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, saved[0].id);
    }

    #[test]
    fn pairs_are_independent() {
        let store = scratch_store("pairs");
        store.save_annotations(1, 1, &[draft(1, 0.0)]).unwrap();
        store
            .save_annotations(1, 2, &[draft(1, 0.0), draft(1, 60.0)])
            .unwrap();

        assert_eq!(store.load_annotations(1, 1).unwrap().len(), 1);
        assert_eq!(store.load_annotations(1, 2).unwrap().len(), 2);
        assert_eq!(store.load_annotations(2, 1).unwrap().len(), 0);
    }

    #[test]
    fn unknown_class_rejects_save_and_keeps_stored_list() {
        let store = scratch_store("unknown-class");
        store.save_annotations(1, 1, &[draft(1, 0.0)]).unwrap();

        let err = store
            .save_annotations(1, 1, &[draft(99, 0.0)])
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownClass(99)));

        // The failed save must not have touched the stored list.
        let kept = store.load_annotations(1, 1).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].class_id, 1);
    }

    #[test]
    fn corrupt_pair_file_is_a_load_failure() {
        let store = scratch_store("corrupt");
        let path = store.pair_path(1, 1);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = store.load_annotations(1, 1).unwrap_err();
        assert!(matches!(err, StoreError::LoadFailure { item_id: 1, set_id: 1, .. }));
    }
}
