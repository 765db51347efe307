//! Last-saved labels and notes, used to detect unsaved changes.

use std::collections::BTreeMap;

use crate::model::{Label, RoiId, RoiStore};

/// Snapshot of the reportable labels and notes of a region.
///
/// Unconfirmed point ROIs are left out: they are never submitted, so adding
/// or dropping one is not a change worth warning about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSnapshot {
    entries: BTreeMap<RoiId, (Label, Option<String>)>,
}

impl LabelSnapshot {
    /// Capture the current labels and notes.
    pub fn capture(rois: &RoiStore, notes: &BTreeMap<RoiId, String>) -> Self {
        let entries = rois
            .iter()
            .filter(|roi| !roi.is_unconfirmed_point())
            .map(|roi| (roi.id.clone(), (roi.label, notes.get(&roi.id).cloned())))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the ROI sets differ in size or any ROI's label or note differs.
    pub fn differs_from(&self, other: &LabelSnapshot) -> bool {
        if self.entries.len() != other.entries.len() {
            return true;
        }
        self.entries
            .iter()
            .any(|(id, entry)| other.entries.get(id) != Some(entry))
    }
}
